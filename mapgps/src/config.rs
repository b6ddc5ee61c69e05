//! Editor configuration file.
//!
//! A JSON object with any of the `EditorConfig` fields; missing fields keep
//! their defaults.

use std::fs;
use std::path::Path;

use log::debug;
use mapgps_core::EditorConfig;

use crate::error::{MapGpsError, Result};

/// Read the configuration at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|e| MapGpsError::io(path, e))?;
    let config: EditorConfig =
        serde_json::from_str(&text).map_err(|e| MapGpsError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!("[config] Loaded {}", path.display());
    Ok(config)
}
