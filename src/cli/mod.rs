//! Command-line interface for csv2saf.
//!
//! Provides commands for converting an item sheet into an archive tree,
//! inspecting how a sheet is parsed, and showing the resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{load_config, ResolvedConfig};
use crate::core::Archive;

/// csv2saf - Delimited item sheets to DSpace Simple Archive Format
#[derive(Parser, Debug)]
#[command(name = "csv2saf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .csv2saf/config.yaml in the current
    /// directory or a parent)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an item sheet into an archive directory tree
    Convert {
        /// Input sheet
        input: PathBuf,

        /// Output root for the item directories
        #[arg(short, long, default_value = "archive")]
        output: PathBuf,

        /// Also compress the output tree into this zip file
        #[arg(long)]
        zip: Option<PathBuf>,

        /// Write into a staging directory and rename on success
        /// (the output root must not exist)
        #[arg(long)]
        atomic: bool,

        #[command(flatten)]
        input_options: InputOptions,
    },

    /// Parse an item sheet and print the items as JSON
    Inspect {
        /// Input sheet
        input: PathBuf,

        #[command(flatten)]
        input_options: InputOptions,
    },

    /// Show resolved configuration
    Config,
}

/// Overrides for how the input sheet is read
#[derive(Args, Debug, Default)]
pub struct InputOptions {
    /// Field delimiter
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Comment marker (empty string disables comments)
    #[arg(long)]
    pub comment_marker: Option<String>,
}

impl InputOptions {
    fn apply(&self, config: &mut ResolvedConfig) -> Result<()> {
        if let Some(delimiter) = self.delimiter {
            config.parse.set_delimiter(delimiter)?;
        }
        if let Some(marker) = &self.comment_marker {
            config.parse.set_comment_marker(marker);
        }
        Ok(())
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let mut config = load_config(self.config.as_deref())?;

        match self.command {
            Commands::Convert {
                input,
                output,
                zip,
                atomic,
                input_options,
            } => {
                input_options.apply(&mut config)?;
                convert(&config, &input, &output, zip.as_deref(), atomic)
            }
            Commands::Inspect {
                input,
                input_options,
            } => {
                input_options.apply(&mut config)?;
                inspect(&config, &input)
            }
            Commands::Config => {
                show_config(&config);
                Ok(())
            }
        }
    }
}

/// Parse, write and optionally zip
fn convert(
    config: &ResolvedConfig,
    input: &Path,
    output: &Path,
    zip: Option<&Path>,
    atomic: bool,
) -> Result<()> {
    let archive = Archive::from_path(input, &config.parse)?;

    let summary = if atomic {
        archive.write_atomic(output, &config.layout)?
    } else {
        archive
            .write(output, &config.layout)
            .with_context(|| format!("Failed to write archive: {}", output.display()))?
    };

    println!(
        "Wrote {} item(s), {} content file(s) to {}",
        summary.items,
        summary.files_copied,
        summary.root.display()
    );

    if let Some(zip_path) = zip {
        archive
            .zip(zip_path, &summary.root)
            .with_context(|| format!("Failed to create zip: {}", zip_path.display()))?;
        println!("Packaged archive: {}", zip_path.display());
    }

    Ok(())
}

/// Print parsed items as JSON
fn inspect(config: &ResolvedConfig, input: &Path) -> Result<()> {
    println!("{}", items_json(config, input)?);
    Ok(())
}

fn items_json(config: &ResolvedConfig, input: &Path) -> Result<String> {
    let archive = Archive::from_path(input, &config.parse)?;
    Ok(serde_json::to_string_pretty(archive.items())?)
}

fn show_config(config: &ResolvedConfig) {
    println!("csv2saf Configuration");
    println!("=====================\n");

    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }

    println!("\nInput:");
    println!("  delimiter:       {:?}", config.parse.delimiter as char);
    println!(
        "  comment_marker:  {}",
        config.parse.comment_marker.as_deref().unwrap_or("(disabled)")
    );
    println!(
        "  value_separator: {}",
        config.parse.value_separator.as_deref().unwrap_or("(disabled)")
    );

    println!("\nOutput:");
    println!("  item_prefix:      {}", config.layout.item_prefix);
    println!("  index_width:      {}", config.layout.index_width);
    println!("  manifest_newline: {:?}", config.layout.manifest_newline);
}
