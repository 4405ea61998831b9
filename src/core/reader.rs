//! Input sheet reading.
//!
//! Comment stripping runs over the raw text before the CSV reader sees the
//! header, so a commented-out first line never becomes the header.

use tracing::{debug, warn};

use super::factory::{ItemFactory, ParseError};
use crate::config::ParseSettings;
use crate::domain::Item;

/// Input text with comments and blank lines removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedInput {
    /// Remaining lines joined with `\n`
    pub text: String,
    /// Original 1-based line number of every remaining line
    lines: Vec<usize>,
}

impl StrippedInput {
    /// Map a 1-based line of the stripped text back to the input
    pub fn original_line(&self, stripped_line: u64) -> usize {
        usize::try_from(stripped_line)
            .ok()
            .and_then(|line| line.checked_sub(1))
            .and_then(|index| self.lines.get(index).copied())
            .unwrap_or(0)
    }

    /// Number of remaining lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Truncate every line at the comment marker and drop lines that end up
/// blank. The marker is not quote-aware.
pub fn strip_comments(input: &str, marker: Option<&str>) -> StrippedInput {
    let mut text = String::with_capacity(input.len());
    let mut lines = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let kept = match marker {
            Some(marker) => line.split(marker).next().unwrap_or(""),
            None => line,
        };
        let kept = kept.trim();
        if kept.is_empty() {
            continue;
        }

        if !lines.is_empty() {
            text.push('\n');
        }
        text.push_str(kept);
        lines.push(index + 1);
    }

    StrippedInput { text, lines }
}

/// Parse the whole input into items, in input order
pub fn read_items(input: &str, settings: &ParseSettings) -> Result<Vec<Item>, ParseError> {
    let stripped = strip_comments(input, settings.comment_marker.as_deref());
    debug!(lines = stripped.line_count(), "Stripped comments from input");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(settings.delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(stripped.text.as_bytes());

    let mut records = reader.records();
    let header = records.next().ok_or(ParseError::MissingHeader)??;
    let factory = ItemFactory::new(header.iter(), settings.value_separator.clone())?;

    let mut items = Vec::new();
    for record in records {
        let record = record?;
        let line = stripped.original_line(record.position().map_or(0, |pos| pos.line()));

        if record.iter().all(|field| field.trim().is_empty()) {
            warn!(line, "Skipping blank row");
            continue;
        }

        let fields: Vec<&str> = record.iter().collect();
        items.push(factory.new_item(&fields, line)?);
    }

    Ok(items)
}
