//! Core application functionality
//!
//! This module contains:
//! - Error types shared by the library
//! - Settings and CLI handling
//! - The command runner used by the binary

pub mod cli;
pub mod config_file;
pub mod errors;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use errors::{ProjectError, ProjectResult};
pub use runner::run_app;
