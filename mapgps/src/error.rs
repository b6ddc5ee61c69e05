use std::path::PathBuf;

use mapgps_core::EditError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapGpsError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Unknown route '{0}'")]
    UnknownRoute(String),

    #[error("No spot named '{0}'")]
    UnknownSpot(String),
}

impl MapGpsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapGpsError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapGpsError>;
