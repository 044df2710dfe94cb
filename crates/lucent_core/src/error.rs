//! Core error types

use thiserror::Error;

/// Errors raised while building configuration or geometry
#[derive(Error, Debug)]
pub enum Error {
    /// Settings file could not be parsed
    #[error("Invalid settings: {0}")]
    Config(#[from] toml::de::Error),

    /// A pixel size with a zero dimension was requested
    #[error("Invalid size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
