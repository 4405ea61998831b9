//! Header column classification.
//!
//! Every header cell is classified exactly once; the row loop only ever
//! looks at the resulting [`ColumnKind`] for each column index.

use std::fmt;

use super::item::FieldName;

/// What a column's values turn into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Content-file reference, copied into the item directory
    File,

    /// Collection membership, listed in `collections`
    Collection,

    /// Metadata value for a schema-qualified field
    Metadata(FieldName),
}

impl ColumnKind {
    /// Classify a header cell. Returns `None` for names that match no
    /// known pattern.
    pub fn classify(name: &str) -> Option<Self> {
        let name = name.trim();
        match name.to_ascii_lowercase().as_str() {
            "file" | "files" => Some(ColumnKind::File),
            "collection" | "collections" => Some(ColumnKind::Collection),
            _ => FieldName::parse(name).map(ColumnKind::Metadata),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::File => write!(f, "file"),
            ColumnKind::Collection => write!(f, "collection"),
            ColumnKind::Metadata(field) => write!(f, "{}", field),
        }
    }
}
