//! Error types module
//!
//! Everything the media engine can fail with is unified under the
//! [`MediaError`] enum so callers always receive a specific error kind
//! together with the offending path, filename, or tool name.

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use crate::constants::MAX_CHAIN_DEPTH;

/// Result type alias for media engine operations
pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Path outside the configured storage root, or a link string without
    /// the recognized storage marker.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Extension is in neither the recognized image nor video sets.
    #[error("Unsupported media extension: {extension}")]
    UnsupportedMedia { extension: String },

    /// Prober output that cannot be turned into stream records.
    #[error("Probe parse error: {0}")]
    ProbeParse(String),

    /// External tool reported a non-zero exit status.
    #[error("{tool} failed with {status}: {detail}")]
    ProcessFailed {
        tool: String,
        status: ExitStatus,
        detail: String,
    },

    /// External tool exceeded the configured wait and was terminated.
    #[error("{tool} timed out after {} seconds", elapsed.as_secs())]
    ProcessTimeout { tool: String, elapsed: Duration },

    /// Linking would grow an artifact chain past the maximum tier count.
    #[error("Artifact chain would reach {depth} tiers, max is {}", MAX_CHAIN_DEPTH)]
    ChainTooDeep { depth: usize },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MediaError {
    pub fn invalid_path(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        MediaError::InvalidPath {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_media(extension: impl Into<String>) -> Self {
        MediaError::UnsupportedMedia {
            extension: extension.into(),
        }
    }

    pub fn probe_parse(message: impl Into<String>) -> Self {
        MediaError::ProbeParse(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        MediaError::Config(message.into())
    }
}
