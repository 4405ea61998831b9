//! Domain types for the converter.
//!
//! This module contains the core data structures:
//! - Item: One parsed row (metadata, content files, collections)
//! - FieldName: Schema-qualified metadata field
//! - ColumnKind: Classification of a header column

pub mod column;
pub mod item;

// Re-export commonly used types
pub use column::ColumnKind;
pub use item::{FieldName, Item, MetadataValue, DUBLIN_CORE_SCHEMA};
