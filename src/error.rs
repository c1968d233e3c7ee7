//! Error types for the band, the device seam and configuration loading.
//!
//! Re-binding the band with different parameters is not here on purpose:
//! the first binding wins and later requests are dropped with a log line.

use std::io;
use std::path::PathBuf;

/// Failure reported by a `DeviceSink` while pushing a frame out.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device transport failed: {0}")]
    Transport(String),
    #[error("device I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors returned by band operations.
#[derive(Debug, thiserror::Error)]
pub enum BandError {
    #[error("pixel index {index} is out of range for a band of {len} pixels")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("a band of {count} pixels exceeds the limit of {max}")]
    TooManyPixels { count: usize, max: usize },
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Errors from reading a `ControllerConfig` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("pixel count {count} exceeds the limit of {max}")]
    TooManyPixels { count: usize, max: usize },
}
