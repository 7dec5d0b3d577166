//! Error handling for vidgrab

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vidgrab
#[derive(Debug, Error)]
pub enum VidgrabError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch video info: {0}")]
    InfoFetch(String),

    #[error("No downloadable format available")]
    EmptySelection,

    #[error("No audio stream available to merge with the selected video")]
    NoAudioAvailable,

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to merge video and audio: {0}")]
    Merge(String),

    #[error("{0} not found. Please install it or pass its path explicitly")]
    ToolNotFound(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VidgrabError {
    /// Errors that end the interactive loop instead of being reported and skipped
    pub fn is_fatal(&self) -> bool {
        matches!(self, VidgrabError::Prompt(_) | VidgrabError::ToolNotFound(_))
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VidgrabError::Write {
            path: path.into(),
            source,
        }
    }
}

impl From<dialoguer::Error> for VidgrabError {
    fn from(err: dialoguer::Error) -> Self {
        VidgrabError::Prompt(err.to_string())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, VidgrabError>;
