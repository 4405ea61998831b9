//! Item factory: turns header + rows into items.

use thiserror::Error;

use crate::domain::{ColumnKind, Item, MetadataValue};

/// Errors raised while reading the input sheet
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Input has no header row")]
    MissingHeader,

    #[error("Unrecognized column {column} in header: {name:?}")]
    UnknownColumn { column: usize, name: String },

    #[error("Row at line {line} has {found} fields, header has {expected}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds items from rows using the column layout of a header
#[derive(Debug, Clone)]
pub struct ItemFactory {
    columns: Vec<ColumnKind>,
    value_separator: Option<String>,
}

impl ItemFactory {
    /// Classify every header column. Fails on the first column that
    /// matches no known pattern.
    pub fn new<I, S>(header: I, value_separator: Option<String>) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = header
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let name = name.as_ref();
                ColumnKind::classify(name).ok_or_else(|| ParseError::UnknownColumn {
                    column: index + 1,
                    name: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let value_separator = value_separator.filter(|sep| !sep.is_empty());

        Ok(Self {
            columns,
            value_separator,
        })
    }

    /// Column classification, one entry per header column
    pub fn columns(&self) -> &[ColumnKind] {
        &self.columns
    }

    /// Build one item from a data row. `line` is only used for error
    /// reporting. Extra fields past the header are accepted only when they
    /// are all blank, as left behind by a trailing delimiter.
    pub fn new_item<S: AsRef<str>>(&self, row: &[S], line: usize) -> Result<Item, ParseError> {
        let extra_blank = row.len() > self.columns.len()
            && row[self.columns.len()..]
                .iter()
                .all(|cell| cell.as_ref().trim().is_empty());
        let row = if extra_blank {
            &row[..self.columns.len()]
        } else {
            row
        };

        if row.len() != self.columns.len() {
            return Err(ParseError::RowLength {
                line,
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        let mut metadata = Vec::new();
        let mut files = Vec::new();
        let mut collections = Vec::new();

        for (kind, cell) in self.columns.iter().zip(row) {
            for value in self.split_values(cell.as_ref()) {
                match kind {
                    ColumnKind::File => files.push(value.to_string()),
                    ColumnKind::Collection => collections.push(value.to_string()),
                    ColumnKind::Metadata(field) => {
                        metadata.push(MetadataValue::new(field.clone(), value))
                    }
                }
            }
        }

        Ok(Item::new(metadata, files, collections))
    }

    fn split_values<'a>(&self, cell: &'a str) -> Vec<&'a str> {
        match &self.value_separator {
            Some(separator) => cell
                .split(separator.as_str())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .collect(),
            None => {
                let value = cell.trim();
                if value.is_empty() {
                    Vec::new()
                } else {
                    vec![value]
                }
            }
        }
    }
}
