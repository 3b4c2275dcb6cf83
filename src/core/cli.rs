//! Command line interface for bezy-project
//!
//! Handles parsing command line arguments. Settings not given on the
//! command line come from the user config file.

use crate::model::Property;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bezy-project CLI arguments
///
/// Examples:
///   bezy-project init                           # New project in the current directory
///   bezy-project -p MyFont create-master bold   # Master with its own skeleton layer
///   bezy-project create-master light --skeleton public.default --property weight=300
///   bezy-project import upload.zip --prefix v2- # Import the first UFO of an upload
///   bezy-project open bold                      # Print resolved properties
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "bezy-project",
    version,
    about = "Manage the masters of a multi-master font project",
    long_about = "bezy-project creates, imports and inspects the masters of a font project: their skeleton glyph layers, rule files and property databases."
)]
pub struct CliArgs {
    /// Project directory
    #[clap(long = "project", short = 'p', default_value = ".")]
    pub project: PathBuf,

    /// Log level (overrides settings.json; RUST_LOG overrides both)
    #[clap(long = "log-level")]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create the layout of an empty project
    Init,
    /// List registered masters
    Masters,
    /// Register a new master
    CreateMaster {
        name: String,
        /// Rule file, relative to the rules directory
        #[clap(long = "cps")]
        cps_file: Option<String>,
        /// Skeleton layer; defaults to a new `skeleton.<name>` layer
        #[clap(long)]
        skeleton: Option<String>,
        /// Initial master property, as name=value
        #[clap(long = "property", value_parser = parse_property)]
        properties: Vec<Property>,
    },
    /// Remove a master and its files
    DeleteMaster { name: String },
    /// Open a master and print its resolved properties
    Open { name: String },
    /// Import the first UFO source of a zip archive as a new master
    Import {
        archive: PathBuf,
        /// Prefix for the generated master name
        #[clap(long, default_value = "")]
        prefix: String,
    },
    /// List glyph layers
    Layers,
    /// Watch the rules directory and re-resolve masters on change
    Watch {
        /// Open these masters before watching
        masters: Vec<String>,
        #[clap(long = "debounce-ms")]
        debounce_ms: Option<u64>,
    },
    /// Initialize the user config directory with a settings file
    NewConfig,
}

/// Parse a `name=value` pair
pub fn parse_property(input: &str) -> Result<Property, String> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok(Property::new(name.trim(), value)),
        _ => Err(format!("expected name=value, got '{input}'")),
    }
}
