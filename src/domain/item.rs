//! Items parsed from the input sheet.
//!
//! An item is one row's worth of metadata values, content-file references
//! and collection memberships. Items are built once by the item factory and
//! never mutated afterwards.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Schema name that is written to `dublin_core.xml` instead of
/// `metadata_<schema>.xml`.
pub const DUBLIN_CORE_SCHEMA: &str = "dc";

/// Schema-qualified metadata field (`dc.contributor.author[en]`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldName {
    /// Metadata schema (namespace), e.g. `dc`
    pub schema: String,

    /// Element within the schema, e.g. `title`
    pub element: String,

    /// Optional refinement of the element, e.g. `author`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,

    /// Optional language tag, e.g. `en`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl FieldName {
    /// Create an unqualified field without a language
    pub fn new(schema: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            element: element.into(),
            qualifier: None,
            language: None,
        }
    }

    /// Add a qualifier
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Add a language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Parse a column name of the form `schema.element[.qualifier][[lang]]`.
    ///
    /// Returns `None` when the name does not follow that pattern.
    pub fn parse(name: &str) -> Option<Self> {
        let (path, language) = match name.find('[') {
            Some(open) => {
                let language = name[open + 1..].strip_suffix(']')?;
                if !is_identifier(language) {
                    return None;
                }
                (&name[..open], Some(language.to_string()))
            }
            None => (name, None),
        };

        let parts: Vec<&str> = path.split('.').collect();
        if !parts.iter().all(|part| is_identifier(part)) {
            return None;
        }

        let field = match parts.as_slice() {
            [schema, element] => Self::new(*schema, *element),
            [schema, element, qualifier] => {
                Self::new(*schema, *element).with_qualifier(*qualifier)
            }
            _ => return None,
        };

        Some(Self { language, ..field })
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.element)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, ".{}", qualifier)?;
        }
        if let Some(language) = &self.language {
            write!(f, "[{}]", language)?;
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A single metadata value bound to its field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataValue {
    pub field: FieldName,
    pub value: String,
}

impl MetadataValue {
    pub fn new(field: FieldName, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// One row of the input sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    metadata: Vec<MetadataValue>,
    files: Vec<String>,
    collections: Vec<String>,
}

impl Item {
    /// Create an item from its parsed parts
    pub fn new(
        metadata: Vec<MetadataValue>,
        files: Vec<String>,
        collections: Vec<String>,
    ) -> Self {
        Self {
            metadata,
            files,
            collections,
        }
    }

    /// Metadata values in column order
    pub fn metadata(&self) -> &[MetadataValue] {
        &self.metadata
    }

    /// Content-file references, relative to the archive's base directory
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Collection names
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Base names of the content-file references, as listed in `contents`
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|reference| file_name(reference))
            .collect()
    }

    /// Schemas used by this item, in order of first appearance
    pub fn used_schemas(&self) -> Vec<&str> {
        let mut schemas: Vec<&str> = Vec::new();
        for value in &self.metadata {
            if !schemas.contains(&value.field.schema.as_str()) {
                schemas.push(&value.field.schema);
            }
        }
        schemas
    }

    /// Metadata values belonging to one schema, in column order
    pub fn metadata_for<'a>(&'a self, schema: &'a str) -> impl Iterator<Item = &'a MetadataValue> {
        self.metadata
            .iter()
            .filter(move |value| value.field.schema == schema)
    }
}

/// Base name of a file reference, if it has one
pub fn file_name(reference: &str) -> Option<String> {
    Path::new(reference)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_names() {
        assert_eq!(FieldName::parse("dc.title"), Some(FieldName::new("dc", "title")));
        assert_eq!(
            FieldName::parse("dc.contributor.author"),
            Some(FieldName::new("dc", "contributor").with_qualifier("author"))
        );
        assert_eq!(
            FieldName::parse("local.note[en_US]"),
            Some(FieldName::new("local", "note").with_language("en_US"))
        );
    }

    #[test]
    fn test_reject_malformed_field_names() {
        for name in ["title", "dc.", ".title", "dc.a.b.c", "dc.title[", "dc.title[]", "dc title", ""] {
            assert!(FieldName::parse(name).is_none(), "accepted {:?}", name);
        }
    }

    #[test]
    fn test_field_name_display() {
        let field = FieldName::new("dc", "title")
            .with_qualifier("alternative")
            .with_language("fr");
        assert_eq!(field.to_string(), "dc.title.alternative[fr]");
        assert_eq!(FieldName::parse(&field.to_string()), Some(field));
    }

    #[test]
    fn test_used_schemas_first_appearance_order() {
        let item = Item::new(
            vec![
                MetadataValue::new(FieldName::new("local", "note"), "n"),
                MetadataValue::new(FieldName::new("dc", "title"), "t"),
                MetadataValue::new(FieldName::new("local", "id"), "1"),
            ],
            vec![],
            vec![],
        );

        assert_eq!(item.used_schemas(), vec!["local", "dc"]);
        assert_eq!(item.metadata_for("local").count(), 2);
        assert_eq!(item.metadata_for("thesis").count(), 0);
    }

    #[test]
    fn test_file_names_strip_directories() {
        let item = Item::new(
            vec![],
            vec!["figures/fig1.png".to_string(), "report.pdf".to_string()],
            vec![],
        );

        assert_eq!(item.file_names(), vec!["fig1.png", "report.pdf"]);
    }
}
