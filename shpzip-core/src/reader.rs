//! Cursor protocol shared by every reader of paired geometry and attribute
//! streams.

use crate::{CloseError, Field, ReadError, Shape};

/// Outcome of opening the optional attribute companion.
///
/// Absence is a normal outcome rather than an error: attribute data is
/// optional context and never required for geometry access. Consumers match
/// on both arms instead of checking for a null handle.
///
/// # Examples
/// ```
/// use shpzip_core::Companion;
///
/// let absent: Companion<Vec<u8>> = Companion::Absent;
/// assert!(!absent.is_present());
/// let present = Companion::Present(vec![1_u8]).map(|bytes| bytes.len());
/// assert_eq!(present, Companion::Present(1));
/// assert_eq!(present.as_ref(), Companion::Present(&1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Companion<T> {
    /// The companion was found and opened.
    Present(T),
    /// The companion is missing or could not be opened.
    Absent,
}

impl<T> Companion<T> {
    /// Whether the companion was opened.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Transform the contained value, keeping absence as is.
    pub fn map<U, F>(self, f: F) -> Companion<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Present(value) => Companion::Present(f(value)),
            Self::Absent => Companion::Absent,
        }
    }

    /// Borrow the contained value.
    #[must_use]
    pub const fn as_ref(&self) -> Companion<&T> {
        match self {
            Self::Present(value) => Companion::Present(value),
            Self::Absent => Companion::Absent,
        }
    }
}

/// Lockstep reader over a geometry stream and its optional attribute stream.
///
/// Each call to [`advance`](Self::advance) moves to the next record; the
/// accessors then expose the record's index, geometry and attribute row.
/// Implementations keep the cursor state internally and mutate it only in
/// `advance`.
///
/// Exhaustion is sticky: once `advance` returns `false` every later call
/// returns `false` and leaves [`error`](Self::error) unchanged.
///
/// # Examples
///
/// ```rust
/// use shpzip_core::{CloseError, Field, ReadError, SequentialReader, Shape};
///
/// struct Empty;
///
/// impl SequentialReader for Empty {
///     fn advance(&mut self) -> bool {
///         false
///     }
///     fn shape(&self) -> Option<(usize, &Shape)> {
///         None
///     }
///     fn attribute(&self, _field: usize) -> &str {
///         ""
///     }
///     fn fields(&self) -> &[Field] {
///         &[]
///     }
///     fn error(&self) -> Option<&ReadError> {
///         None
///     }
///     fn close(&mut self) -> Result<(), CloseError> {
///         Ok(())
///     }
/// }
///
/// let mut reader = Empty;
/// assert!(!reader.advance());
/// assert!(reader.error().is_none());
/// ```
pub trait SequentialReader {
    /// Move to the next record.
    ///
    /// Returns `false` at the end of the geometry stream or after a decode
    /// fault; inspect [`error`](Self::error) to tell the two apart.
    fn advance(&mut self) -> bool;

    /// Zero-based index and geometry of the current record.
    ///
    /// `None` before the first successful `advance` and after exhaustion.
    fn shape(&self) -> Option<(usize, &Shape)>;

    /// Text value of column `field` for the current record.
    ///
    /// Returns an empty string when no attribute stream was supplied, the
    /// column does not exist, or a fault has occurred.
    fn attribute(&self, field: usize) -> &str;

    /// Attribute-table schema; empty when no attribute stream was supplied.
    fn fields(&self) -> &[Field];

    /// The fault that stopped iteration, if any.
    fn error(&self) -> Option<&ReadError>;

    /// Release both wrapped streams.
    ///
    /// Calling `close` again after it has run is a no-op returning `Ok`.
    fn close(&mut self) -> Result<(), CloseError>;
}
