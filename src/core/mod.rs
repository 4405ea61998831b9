//! Core conversion logic.
//!
//! This module contains:
//! - Reader: Comment stripping and CSV parsing
//! - Factory: Header classification and row-to-item mapping
//! - Archive: Ordered items and the write pass
//! - Writer: Per-item directories, manifests and content copies
//! - Metadata: Metadata XML documents
//! - Package: Zip packaging of the output tree

pub mod archive;
pub mod factory;
pub mod metadata;
pub mod package;
pub mod reader;
pub mod writer;

// Re-export commonly used types
pub use archive::{Archive, WriteSummary};
pub use factory::{ItemFactory, ParseError};
pub use metadata::{
    check_value, metadata_filename, parse_metadata, to_xml, MetadataDocument, MetadataError,
};
pub use package::{zip_directory, PackageError};
pub use reader::{read_items, strip_comments, StrippedInput};
pub use writer::{
    check_item_files, create_dir_if_absent, is_reserved_name, write_manifest, ItemReport,
    ItemWriter, WriteError, COLLECTIONS_FILE, CONTENTS_FILE,
};
