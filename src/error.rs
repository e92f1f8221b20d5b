//! Error types for watermark rendering.
//!
//! Font resolution problems never show up here: a missing or broken font
//! file degrades to the embedded font. Unknown position and color
//! names are normalised to their defaults instead of being rejected.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatermarkError {
    /// Source media could not be opened or parsed
    #[error("Failed to decode media {}: {message}", path.display())]
    MediaDecode { path: PathBuf, message: String },

    /// Output media could not be encoded or written
    #[error("Failed to encode media {}: {message}", path.display())]
    MediaEncode { path: PathBuf, message: String },

    /// Settings violate an invariant (empty text, zero font size)
    #[error("Invalid watermark settings: {0}")]
    InvalidSettings(String),

    /// The path is neither a supported image nor a supported video
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Invalid or unreadable engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background render worker failed to complete
    #[error("Render worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatermarkError {
    pub fn decode(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        WatermarkError::MediaDecode {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn encode(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        WatermarkError::MediaEncode {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// True for failures caused by the source media itself.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, WatermarkError::MediaDecode { .. })
    }
}
