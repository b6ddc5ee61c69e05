//! MapGPS - file handling and command-line front end for the editing core
//!
//! This crate provides:
//! - GeoJSON file loading and dated export naming
//! - JSON editor configuration files
//! - The edits behind the `mapgps` subcommands

// Re-export the editing core
pub use mapgps_core::*;

// Errors for file and command handling
pub mod error;
pub use error::{MapGpsError, Result};

// Configuration file
pub mod config;
pub use config::load_config;

// Document input/output
pub mod fileio;
pub use fileio::{export_file_name, export_session, open_document, ExportTarget};

// Subcommand edits
pub mod commands;

/// Initialize logging from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    // A second call (tests, embedding) keeps the first logger
    let _ = env_logger::Builder::from_env(env).try_init();
}
