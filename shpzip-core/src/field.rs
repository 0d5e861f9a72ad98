//! Attribute-table column descriptors.

/// dBase column types.
///
/// Unknown type bytes are preserved so callers can still read the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    /// `C`: fixed-width text.
    Character,
    /// `N`: decimal number stored as text.
    Numeric,
    /// `F`: floating-point number stored as text.
    Float,
    /// `D`: date stored as `YYYYMMDD`.
    Date,
    /// `L`: logical flag (`T`, `F`, `Y`, `N` or `?`).
    Logical,
    /// `M`: memo block reference.
    Memo,
    /// Any other type byte.
    Other(u8),
}

impl FieldType {
    /// Map a dBase descriptor type byte to a [`FieldType`].
    ///
    /// # Examples
    /// ```
    /// use shpzip_core::FieldType;
    ///
    /// assert_eq!(FieldType::from_byte(b'N'), FieldType::Numeric);
    /// assert_eq!(FieldType::from_byte(b'@'), FieldType::Other(b'@'));
    /// ```
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            b'C' => Self::Character,
            b'N' => Self::Numeric,
            b'F' => Self::Float,
            b'D' => Self::Date,
            b'L' => Self::Logical,
            b'M' => Self::Memo,
            other => Self::Other(other),
        }
    }

    /// Descriptor type byte for this column type.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Character => b'C',
            Self::Numeric => b'N',
            Self::Float => b'F',
            Self::Date => b'D',
            Self::Logical => b'L',
            Self::Memo => b'M',
            Self::Other(byte) => byte,
        }
    }
}

/// One column of an attribute table.
///
/// The schema is fixed for the lifetime of a reader and does not depend on
/// cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    /// Column name with padding removed (at most 10 characters in dBase III).
    pub name: String,
    /// Column type.
    pub field_type: FieldType,
    /// Width of the column in bytes.
    pub length: u8,
    /// Digits after the decimal point for numeric columns.
    pub decimals: u8,
}

impl Field {
    /// Construct a field descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType, length: u8, decimals: u8) -> Self {
        Self {
            name: name.into(),
            field_type,
            length,
            decimals,
        }
    }
}
