//! Naming convention tying a geometry entry to its attribute companion.

/// Extensions used to recognise geometry entries and derive companion names.
///
/// Matching is case-sensitive and follows archive entry names verbatim:
/// forward-slash separated, relative, without drive letters.
///
/// # Examples
/// ```
/// use shpzip_core::EntryNaming;
///
/// let naming = EntryNaming::default();
/// assert!(naming.is_shape_entry("roads/roads.shp"));
/// assert_eq!(naming.companion_name("roads/roads.shp"), "roads/roads.dbf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EntryNaming {
    shape_extension: String,
    attribute_extension: String,
}

impl EntryNaming {
    /// Extension of geometry entries.
    pub const DEFAULT_SHAPE_EXTENSION: &'static str = ".shp";
    /// Extension of attribute-table entries.
    pub const DEFAULT_ATTRIBUTE_EXTENSION: &'static str = ".dbf";

    /// Construct a naming convention from two extensions.
    ///
    /// A leading dot is added when missing, so `"shp"` and `".shp"` are
    /// equivalent.
    #[must_use]
    pub fn new(shape_extension: impl Into<String>, attribute_extension: impl Into<String>) -> Self {
        Self {
            shape_extension: with_leading_dot(shape_extension.into()),
            attribute_extension: with_leading_dot(attribute_extension.into()),
        }
    }

    /// Extension identifying geometry entries, including the dot.
    #[must_use]
    pub fn shape_extension(&self) -> &str {
        &self.shape_extension
    }

    /// Extension of the attribute companion, including the dot.
    #[must_use]
    pub fn attribute_extension(&self) -> &str {
        &self.attribute_extension
    }

    /// Whether `name` ends with the geometry extension.
    #[must_use]
    pub fn is_shape_entry(&self, name: &str) -> bool {
        name.ends_with(self.shape_extension.as_str())
    }

    /// Derive the companion entry name for `primary`.
    ///
    /// The extension of the final path segment (text from its last dot) is
    /// replaced by the attribute extension. Names without an extension have
    /// the attribute extension appended.
    #[must_use]
    pub fn companion_name(&self, primary: &str) -> String {
        let (directory, base) = primary
            .rsplit_once('/')
            .map_or((None, primary), |(parent, file)| (Some(parent), file));
        let stem = base.rsplit_once('.').map_or(base, |(head, _)| head);
        directory.map_or_else(
            || format!("{stem}{}", self.attribute_extension),
            |parent| format!("{parent}/{stem}{}", self.attribute_extension),
        )
    }
}

impl Default for EntryNaming {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_SHAPE_EXTENSION,
            Self::DEFAULT_ATTRIBUTE_EXTENSION,
        )
    }
}

fn with_leading_dot(extension: String) -> String {
    if extension.starts_with('.') {
        extension
    } else {
        format!(".{extension}")
    }
}
