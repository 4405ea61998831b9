//! csv2saf - Delimited item sheets to DSpace Simple Archive Format
//!
//! Reads a delimited text file where every row describes one item
//! (metadata, content-file references, collection memberships) and writes
//! one directory per item in the Simple Archive layout.
//!
//! # Output Layout
//!
//! ```text
//! archive/
//! └── item_001/
//!     ├── contents            # content file names, one per line
//!     ├── collections         # collection names, one per line
//!     ├── fig1.png            # copied content files
//!     ├── dublin_core.xml     # values of the `dc` schema
//!     └── metadata_local.xml  # values of any other schema
//! ```
//!
//! # Modules
//!
//! - `config`: Config file loading and resolved settings
//! - `core`: Reading, item construction, writing, packaging
//! - `domain`: Data structures (Item, FieldName, ColumnKind)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Convert a sheet into ./archive and zip it
//! csv2saf convert items.csv --output archive --zip archive.zip
//!
//! # Show how rows are parsed
//! csv2saf inspect items.csv
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use config::{LayoutSettings, ManifestNewline, ParseSettings, ResolvedConfig};
pub use core::{Archive, ParseError, WriteError, WriteSummary};
pub use domain::{ColumnKind, FieldName, Item, MetadataValue};
