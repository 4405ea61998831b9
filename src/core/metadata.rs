//! Metadata documents in the DSpace Simple Archive layout.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <dublin_core schema="dc">
//!   <dcvalue element="contributor" qualifier="author" language="en">Alice</dcvalue>
//! </dublin_core>
//! ```
//!
//! The root element is `dublin_core` for every schema; the `schema`
//! attribute names the namespace.

use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::domain::{FieldName, MetadataValue, DUBLIN_CORE_SCHEMA};

const ROOT: &str = "dublin_core";
const VALUE: &str = "dcvalue";
const NO_QUALIFIER: &str = "none";

/// Errors producing or reading a metadata document
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Malformed metadata document: {0}")]
    Malformed(String),

    #[error("Value of {field} contains U+{code:04X}, which XML 1.0 does not allow")]
    InvalidCharacter { field: String, code: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn malformed(err: impl std::fmt::Display) -> MetadataError {
    MetadataError::Malformed(err.to_string())
}

/// File name of the metadata document for a schema
pub fn metadata_filename(schema: &str) -> String {
    if schema == DUBLIN_CORE_SCHEMA {
        "dublin_core.xml".to_string()
    } else {
        format!("metadata_{}.xml", schema)
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

/// Reject values that cannot appear in an XML 1.0 document
pub fn check_value(value: &MetadataValue) -> Result<(), MetadataError> {
    match value.value.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(MetadataError::InvalidCharacter {
            field: value.field.to_string(),
            code: c as u32,
        }),
        None => Ok(()),
    }
}

/// A metadata document read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    pub schema: String,
    pub values: Vec<MetadataValue>,
}

/// Serialize the values of one schema, in the order given
pub fn to_xml<'a, I>(schema: &str, values: I) -> Result<String, MetadataError>
where
    I: IntoIterator<Item = &'a MetadataValue>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new(ROOT).with_attributes([("schema", schema)]),
    ))?;

    for value in values {
        check_value(value)?;
        let field = &value.field;
        let mut element = BytesStart::new(VALUE);
        element.push_attribute(("element", field.element.as_str()));
        element.push_attribute((
            "qualifier",
            field.qualifier.as_deref().unwrap_or(NO_QUALIFIER),
        ));
        if let Some(language) = &field.language {
            element.push_attribute(("language", language.as_str()));
        }

        writer.write_event(Event::Start(element))?;
        writer.write_event(Event::Text(BytesText::new(&value.value)))?;
        writer.write_event(Event::End(BytesEnd::new(VALUE)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(malformed)
}

/// Read a metadata document back into its schema and values
pub fn parse_metadata(xml: &str) -> Result<MetadataDocument, MetadataError> {
    let mut reader = Reader::from_str(xml);

    let mut schema: Option<String> = None;
    let mut values = Vec::new();
    let mut current: Option<FieldName> = None;
    let mut text: Vec<u8> = Vec::new();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == ROOT.as_bytes() => {
                schema = Some(
                    attribute(e, "schema")?
                        .ok_or_else(|| malformed("root element has no schema attribute"))?,
                );
            }
            Event::Start(ref e) if e.name().as_ref() == VALUE.as_bytes() => {
                let schema = schema
                    .clone()
                    .ok_or_else(|| malformed("value outside of the root element"))?;
                let element = attribute(e, "element")?
                    .ok_or_else(|| malformed("value has no element attribute"))?;
                let qualifier = attribute(e, "qualifier")?.filter(|q| q != NO_QUALIFIER);
                let language = attribute(e, "language")?;

                current = Some(FieldName {
                    schema,
                    element,
                    qualifier,
                    language,
                });
                text.clear();
            }
            Event::Text(ref t) if current.is_some() => text.extend_from_slice(t),
            Event::GeneralRef(ref r) if current.is_some() => {
                text.push(b'&');
                text.extend_from_slice(r);
                text.push(b';');
            }
            Event::End(ref e) if e.name().as_ref() == VALUE.as_bytes() => {
                let field = current
                    .take()
                    .ok_or_else(|| malformed("unbalanced value element"))?;
                let raw = std::str::from_utf8(&text).map_err(malformed)?;
                let value = unescape(raw).map_err(malformed)?;
                values.push(MetadataValue::new(field, value.into_owned()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let schema = schema.ok_or_else(|| malformed("missing dublin_core root element"))?;
    Ok(MetadataDocument { schema, values })
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, MetadataError> {
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.as_ref() == name.as_bytes() {
            let raw = std::str::from_utf8(&attr.value).map_err(malformed)?;
            return Ok(Some(unescape(raw).map_err(malformed)?.into_owned()));
        }
    }
    Ok(None)
}
