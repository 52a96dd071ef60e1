//! Error types for plate recognition.
//!
//! "Nothing found" is not an error anywhere in this crate: a missing plate or
//! an empty character sequence is reported through empty results. The
//! variants below cover input that cannot be read, configuration that cannot
//! be parsed or is inconsistent, and classifier failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlateError {
    /// The image bytes could not be decoded.
    #[error("failed to decode image")]
    ImageLoad(#[from] image::ImageError),

    /// A file could not be opened, read or written.
    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration or model file is not valid JSON for its type.
    #[error("malformed json")]
    Config(#[from] serde_json::Error),

    /// Configuration values violate an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The classifier cannot be trained, loaded or queried.
    #[error("classifier error: {0}")]
    Model(String),
}

impl PlateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PlateError>;
