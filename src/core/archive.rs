//! The archive: ordered items plus the directory their file references are
//! relative to.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::factory::ParseError;
use super::metadata::check_value;
use super::package::{zip_directory, PackageError};
use super::reader::read_items;
use super::writer::{check_item_files, create_dir_if_absent, ItemWriter, WriteError};
use crate::config::{LayoutSettings, ParseSettings};
use crate::domain::Item;

/// Result of writing an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Output root holding the item directories
    pub root: PathBuf,
    /// Number of item directories written
    pub items: usize,
    /// Number of content files copied
    pub files_copied: usize,
}

/// Items in input order, resolved against `base_dir`
#[derive(Debug, Clone, Default)]
pub struct Archive {
    items: Vec<Item>,
    base_dir: PathBuf,
}

impl Archive {
    /// Create an empty archive
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            items: Vec::new(),
            base_dir: base_dir.into(),
        }
    }

    /// Read an input sheet. File references resolve against the sheet's
    /// directory.
    pub fn from_path(path: &Path, settings: &ParseSettings) -> Result<Self> {
        let input = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input: {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let archive = Self::parse(&input, base_dir, settings)
            .with_context(|| format!("Failed to parse input: {}", path.display()))?;
        info!(input = %path.display(), items = archive.len(), "Parsed input");

        Ok(archive)
    }

    /// Parse input text that is already in memory
    pub fn parse(
        input: &str,
        base_dir: impl Into<PathBuf>,
        settings: &ParseSettings,
    ) -> Result<Self, ParseError> {
        let mut archive = Self::new(base_dir);
        for item in read_items(input, settings)? {
            archive.add_item(item);
        }
        Ok(archive)
    }

    /// Append an item
    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Get an item by 0-based position
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// All items in input order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Directory file references are relative to
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the archive is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check that every referenced content file exists and can be copied
    /// without clobbering another file of its item
    pub fn verify_files(&self) -> Result<(), WriteError> {
        for item in &self.items {
            check_item_files(&self.base_dir, item)?;
        }
        Ok(())
    }

    /// Check that every metadata value can be written as XML
    pub fn verify_metadata(&self) -> Result<(), WriteError> {
        for value in self.items.iter().flat_map(|item| item.metadata()) {
            check_value(value).map_err(|source| WriteError::Metadata {
                schema: value.field.schema.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write one directory per item below `root`.
    ///
    /// Content files and metadata values are checked before anything is
    /// written. Existing directories are reused and same-named files
    /// overwritten; nothing is deleted. A failure stops the loop and leaves
    /// what was already written in place.
    pub fn write(&self, root: &Path, layout: &LayoutSettings) -> Result<WriteSummary, WriteError> {
        self.verify_files()?;
        self.verify_metadata()?;
        create_dir_if_absent(root)?;

        let writer = ItemWriter::new(&self.base_dir, layout);
        let mut summary = WriteSummary {
            root: root.to_path_buf(),
            items: 0,
            files_copied: 0,
        };

        for (index, item) in self.items.iter().enumerate() {
            let report = writer.write_item(root, index, item)?;
            summary.items += 1;
            summary.files_copied += report.files_copied;
        }

        info!(
            root = %root.display(),
            items = summary.items,
            files = summary.files_copied,
            "Archive written"
        );
        Ok(summary)
    }

    /// Write into a staging directory next to `root` and rename it into
    /// place once every item is written. `root` must not exist yet.
    pub fn write_atomic(&self, root: &Path, layout: &LayoutSettings) -> Result<WriteSummary> {
        if root.exists() {
            anyhow::bail!("Output directory already exists: {}", root.display());
        }

        let parent = match root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(".csv2saf-")
            .tempdir_in(parent)
            .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;

        let mut summary = self.write(staging.path(), layout)?;

        fs::rename(staging.path(), root).with_context(|| {
            format!(
                "Failed to move {} to {}",
                staging.path().display(),
                root.display()
            )
        })?;
        summary.root = root.to_path_buf();

        Ok(summary)
    }

    /// Compress a written archive tree into a single zip file
    pub fn zip(&self, output: &Path, source: &Path) -> Result<usize, PackageError> {
        zip_directory(source, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldName, MetadataValue};
    use tempfile::TempDir;

    fn titled(title: &str, files: &[&str]) -> Item {
        Item::new(
            vec![MetadataValue::new(FieldName::new("dc", "title"), title)],
            files.iter().map(|f| f.to_string()).collect(),
            vec![],
        )
    }

    #[test]
    fn test_add_and_get_items() {
        let mut archive = Archive::new("/data");
        assert!(archive.is_empty());

        archive.add_item(titled("One", &[]));
        archive.add_item(titled("Two", &[]));

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.item(1).unwrap().metadata()[0].value, "Two");
        assert!(archive.item(2).is_none());
        assert_eq!(archive.base_dir(), Path::new("/data"));
    }

    #[test]
    fn test_missing_file_aborts_before_writing() {
        let input = TempDir::new().unwrap();
        fs::write(input.path().join("present.pdf"), b"x").unwrap();

        let mut archive = Archive::new(input.path());
        archive.add_item(titled("One", &["present.pdf"]));
        archive.add_item(titled("Two", &["absent.pdf"]));

        let output = TempDir::new().unwrap();
        let root = output.path().join("saf");
        let err = archive.write(&root, &LayoutSettings::default()).unwrap_err();

        assert!(matches!(err, WriteError::MissingContentFile { .. }));
        assert!(!root.join("item_001").exists());
    }

    #[test]
    fn test_file_name_collisions_abort_before_writing() {
        let input = TempDir::new().unwrap();
        for dir in ["a", "b"] {
            fs::create_dir_all(input.path().join(dir)).unwrap();
            fs::write(input.path().join(dir).join("fig.png"), dir).unwrap();
        }
        fs::write(input.path().join("a/collections"), "payload").unwrap();

        let output = TempDir::new().unwrap();
        let root = output.path().join("saf");

        let mut archive = Archive::new(input.path());
        archive.add_item(titled("One", &[]));
        archive.add_item(titled("Two", &["a/fig.png", "b/fig.png"]));
        let err = archive.write(&root, &LayoutSettings::default()).unwrap_err();
        assert!(matches!(err, WriteError::DuplicateFileName { .. }));

        let mut archive = Archive::new(input.path());
        archive.add_item(titled("One", &["a/collections"]));
        let err = archive.write(&root, &LayoutSettings::default()).unwrap_err();
        assert!(matches!(err, WriteError::ReservedFileName { .. }));

        assert!(!root.exists());
    }

    #[test]
    fn test_invalid_metadata_aborts_before_writing() {
        let mut archive = Archive::new(".");
        archive.add_item(titled("Fine", &[]));
        archive.add_item(titled("Bell\u{07}", &[]));

        let output = TempDir::new().unwrap();
        let root = output.path().join("saf");
        let err = archive.write(&root, &LayoutSettings::default()).unwrap_err();

        assert!(matches!(err, WriteError::Metadata { ref schema, .. } if schema == "dc"));
        assert!(!root.exists());
    }

    #[test]
    fn test_write_atomic_refuses_existing_root() {
        let output = TempDir::new().unwrap();
        let archive = Archive::new(output.path());

        assert!(archive
            .write_atomic(output.path(), &LayoutSettings::default())
            .is_err());
    }

    #[test]
    fn test_write_atomic_leaves_nothing_on_failure() {
        let input = TempDir::new().unwrap();
        let mut archive = Archive::new(input.path());
        archive.add_item(titled("One", &["absent.pdf"]));

        let output = TempDir::new().unwrap();
        let root = output.path().join("saf");
        assert!(archive.write_atomic(&root, &LayoutSettings::default()).is_err());

        assert!(!root.exists());
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_atomic() {
        let input = TempDir::new().unwrap();
        let mut archive = Archive::new(input.path());
        archive.add_item(titled("One", &[]));

        let output = TempDir::new().unwrap();
        let root = output.path().join("saf");
        let summary = archive.write_atomic(&root, &LayoutSettings::default()).unwrap();

        assert_eq!(summary.root, root);
        assert_eq!(summary.items, 1);
        assert!(root.join("item_001/dublin_core.xml").exists());
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 1);
    }
}
