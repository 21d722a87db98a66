//! Error types shared by the library.
//!
//! The recognizer itself never fails: these cover configuration, frame
//! validation and the detection sources that feed the loop.

use std::path::PathBuf;
use thiserror::Error;

/// Rejected configuration or signature definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("presence window capacity must be at least {minimum}, got {requested}")]
    WindowTooSmall { requested: usize, minimum: usize },

    #[error("position history capacity must be at least 1")]
    EmptyHistory,

    #[error("signature `{0}` is already registered")]
    DuplicateSignature(String),

    #[error("signature `{name}` must have exactly {expected} flags, got {found}")]
    SignatureLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid presence flag {0:?} (expected P, A, 1 or 0)")]
    InvalidFlag(char),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A frame handed to the blob detector did not match its declared size.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Failures of a detection source. These end the stepping loop and are
/// returned to the caller; they never reach the matcher.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("capture failed: {0}")]
    Capture(String),
}
