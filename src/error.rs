//! Error types for shufflebox
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Only [`Error::InvalidFolder`] and [`Error::Exhausted`] ever surface to a
//! front end; every other playback-time condition is absorbed inside the
//! transport (auto-skip, restart fallback, or filename-derived display text).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for shufflebox
#[derive(Error, Debug)]
pub enum Error {
    /// The shuffle folder is not a readable directory (or file)
    #[error("{0} is not accessible")]
    InvalidFolder(PathBuf),

    /// The shuffled track list has been played through to the end
    #[error("track list has been exhausted")]
    Exhausted,

    /// The cursor is already at the first track
    #[error("already at the start of the track list")]
    AtStart,

    /// No track has been drawn from the sequencer yet
    #[error("playback has not started")]
    NotStarted,

    /// The playback engine refused to load a resource
    #[error("playback engine rejected {path}: {reason}")]
    EngineRejected { path: PathBuf, reason: String },

    /// Tag lookup could not establish usable audio properties
    #[error("no usable metadata for {path}: {reason}")]
    MetadataUnavailable { path: PathBuf, reason: String },

    /// Audio output device errors
    #[error("audio output error: {0}")]
    AudioOutput(String),

    /// Configuration file loading errors
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Terminal front end errors
    #[error("terminal error: {0}")]
    Terminal(String),

    /// File I/O errors
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for conditions the transport absorbs by skipping to the next
    /// candidate track instead of failing the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::EngineRejected { .. } | Error::MetadataUnavailable { .. } | Error::AtStart
        )
    }
}

/// Convenience Result type using shufflebox Error
pub type Result<T> = std::result::Result<T, Error>;
