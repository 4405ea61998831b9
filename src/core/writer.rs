//! Per-item output: one directory holding the manifests, copied content
//! files and metadata documents.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::metadata::{metadata_filename, to_xml, MetadataError};
use crate::config::{LayoutSettings, ManifestNewline};
use crate::domain::item::file_name;
use crate::domain::{Item, DUBLIN_CORE_SCHEMA};

/// Name of the content-file manifest
pub const CONTENTS_FILE: &str = "contents";

/// Name of the collection manifest
pub const COLLECTIONS_FILE: &str = "collections";

/// Errors raised while writing the archive
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Content file not found: {reference} (looked for {})", .path.display())]
    MissingContentFile { reference: String, path: PathBuf },

    #[error("Content file {reference} would overwrite the generated file {name}")]
    ReservedFileName { reference: String, name: String },

    #[error("Content file {reference} has the same name as another file of the item: {name}")]
    DuplicateFileName { reference: String, name: String },

    #[error("Failed to build metadata for schema '{schema}': {source}")]
    Metadata {
        schema: String,
        #[source]
        source: MetadataError,
    },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    fn io(path: &Path, source: io::Error) -> Self {
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What was written for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub dir: PathBuf,
    pub files_copied: usize,
    pub metadata_files: Vec<String>,
}

/// Create a directory unless it already exists. Existing contents are
/// left alone.
pub fn create_dir_if_absent(path: &Path) -> Result<(), WriteError> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| WriteError::io(path, e))?;
    }
    Ok(())
}

/// Write one entry per line. The handle is closed when this returns,
/// on success and on error.
pub fn write_manifest<S: AsRef<str>>(
    path: &Path,
    lines: &[S],
    newline: ManifestNewline,
) -> Result<(), WriteError> {
    let write = || -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (index, line) in lines.iter().enumerate() {
            out.write_all(line.as_ref().as_bytes())?;
            let last = index + 1 == lines.len();
            if !last || newline == ManifestNewline::Terminated {
                out.write_all(b"\n")?;
            }
        }
        out.flush()
    };

    write().map_err(|e| WriteError::io(path, e))?;
    debug!(path = %path.display(), lines = lines.len(), "Wrote manifest");
    Ok(())
}

/// Resolve a content-file reference against the base directory. Fails if
/// the source is missing or the reference has no file name.
pub fn resolve_content_file(base_dir: &Path, reference: &str) -> Result<PathBuf, WriteError> {
    let path = base_dir.join(reference);
    if file_name(reference).is_none() || !path.is_file() {
        return Err(WriteError::MissingContentFile {
            reference: reference.to_string(),
            path,
        });
    }
    Ok(path)
}

/// Check whether a content file name collides with a file the writer
/// generates itself
pub fn is_reserved_name(name: &str) -> bool {
    name == CONTENTS_FILE
        || name == COLLECTIONS_FILE
        || name == metadata_filename(DUBLIN_CORE_SCHEMA)
        || (name.starts_with("metadata_") && name.ends_with(".xml"))
}

/// Resolve every content file of an item. Fails on missing sources, on
/// names the writer generates itself and on two files sharing a base name.
pub fn check_item_files(base_dir: &Path, item: &Item) -> Result<Vec<PathBuf>, WriteError> {
    let mut names = HashSet::new();
    let mut sources = Vec::with_capacity(item.files().len());

    for reference in item.files() {
        let source = resolve_content_file(base_dir, reference)?;
        let name = file_name(reference).unwrap_or_default();

        if is_reserved_name(&name) {
            return Err(WriteError::ReservedFileName {
                reference: reference.clone(),
                name,
            });
        }
        if !names.insert(name.clone()) {
            return Err(WriteError::DuplicateFileName {
                reference: reference.clone(),
                name,
            });
        }

        sources.push(source);
    }

    Ok(sources)
}

/// Writes items below an output root
#[derive(Debug, Clone)]
pub struct ItemWriter<'a> {
    base_dir: &'a Path,
    layout: &'a LayoutSettings,
}

impl<'a> ItemWriter<'a> {
    pub fn new(base_dir: &'a Path, layout: &'a LayoutSettings) -> Self {
        Self { base_dir, layout }
    }

    /// Directory name for the item at a 0-based position
    pub fn item_dir_name(&self, index: usize) -> String {
        format!(
            "{}{:0width$}",
            self.layout.item_prefix,
            index + 1,
            width = self.layout.index_width
        )
    }

    /// Write the item at `index` below `root`
    pub fn write_item(&self, root: &Path, index: usize, item: &Item) -> Result<ItemReport, WriteError> {
        let dir = root.join(self.item_dir_name(index));
        check_item_files(self.base_dir, item)?;
        create_dir_if_absent(&dir)?;
        info!(item = %dir.display(), "Writing item");

        write_manifest(
            &dir.join(CONTENTS_FILE),
            &item.file_names(),
            self.layout.manifest_newline,
        )?;
        write_manifest(
            &dir.join(COLLECTIONS_FILE),
            item.collections(),
            self.layout.manifest_newline,
        )?;

        let files_copied = self.copy_files(item, &dir)?;
        let metadata_files = self.write_metadata(item, &dir)?;

        Ok(ItemReport {
            dir,
            files_copied,
            metadata_files,
        })
    }

    fn copy_files(&self, item: &Item, dir: &Path) -> Result<usize, WriteError> {
        let sources = check_item_files(self.base_dir, item)?;

        for (reference, source) in item.files().iter().zip(&sources) {
            let target = match source.file_name() {
                Some(name) => dir.join(name),
                None => {
                    return Err(WriteError::MissingContentFile {
                        reference: reference.clone(),
                        path: source.clone(),
                    })
                }
            };

            fs::copy(source, &target).map_err(|e| WriteError::io(&target, e))?;
            debug!(from = %source.display(), to = %target.display(), "Copied content file");
        }

        Ok(sources.len())
    }

    fn write_metadata(&self, item: &Item, dir: &Path) -> Result<Vec<String>, WriteError> {
        let mut written = Vec::new();

        for schema in item.used_schemas() {
            let xml = to_xml(schema, item.metadata_for(schema)).map_err(|source| {
                WriteError::Metadata {
                    schema: schema.to_string(),
                    source,
                }
            })?;

            let filename = metadata_filename(schema);
            let path = dir.join(&filename);
            fs::write(&path, xml).map_err(|e| WriteError::io(&path, e))?;
            debug!(path = %path.display(), schema, "Wrote metadata");

            written.push(filename);
        }

        Ok(written)
    }
}
