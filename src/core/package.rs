//! Zip packaging of a written archive tree.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// Errors raised while packaging
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Source directory does not exist: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Invalid zip output path: {}", .0.display())]
    InvalidOutput(PathBuf),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Compress the whole `source` tree into a zip file at `output`.
///
/// Entries are stored relative to `source` with `/` separators, in sorted
/// order. The archive is assembled in a temporary file next to `output`
/// and renamed into place, so `output` never holds a partial archive.
/// Returns the number of entries written.
pub fn zip_directory(source: &Path, output: &Path) -> Result<usize, PackageError> {
    if !source.is_dir() {
        return Err(PackageError::MissingSource(source.to_path_buf()));
    }
    let source = source.canonicalize()?;

    let output_name = output
        .file_name()
        .ok_or_else(|| PackageError::InvalidOutput(output.to_path_buf()))?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&output_dir)?;
    let output_dir = output_dir.canonicalize()?;
    let output_abs = output_dir.join(output_name);

    let mut staging = tempfile::Builder::new()
        .prefix(".csv2saf-")
        .suffix(".zip")
        .tempfile_in(&output_dir)?;
    let staging_abs = staging.path().to_path_buf();

    let mut entries = 0;
    {
        let mut zip = ZipWriter::new(BufWriter::new(staging.as_file_mut()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in WalkDir::new(&source).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if path == output_abs || path == staging_abs {
                continue;
            }

            let name = entry_name(path.strip_prefix(&source).unwrap_or(path));
            if entry.file_type().is_dir() {
                zip.add_directory(format!("{}/", name), options)?;
            } else {
                zip.start_file(name.as_str(), options)?;
                let mut file = File::open(path)?;
                io::copy(&mut file, &mut zip)?;
            }
            debug!(entry = %name, "Added zip entry");
            entries += 1;
        }

        let mut inner = zip.finish()?;
        inner.flush()?;
    }

    staging.persist(&output_abs).map_err(|e| e.error)?;
    info!(output = %output_abs.display(), entries, "Created zip archive");

    Ok(entries)
}

/// Zip entry name for a relative path
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
