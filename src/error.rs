//! Error types for trueno-plot operations.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or resolving a plot.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// Invalid plot specification, detected before anything is drawn.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A variable binding references a column the data source does not have.
    #[error("Could not interpret value `{key}` for `{var}`: no such column in data")]
    MissingVariable {
        /// Semantic variable being bound.
        var: String,
        /// Column key that was not found.
        key: String,
    },

    /// A bound vector or joined frame does not line up with the shared rows.
    #[error("Length mismatch for `{var}`: expected {expected} rows, found {found}")]
    LengthMismatch {
        /// Variable whose data does not line up.
        var: String,
        /// Expected number of rows.
        expected: usize,
        /// Number of rows found.
        found: usize,
    },

    /// Feature that is declared but not supported.
    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),

    /// Invalid dimensions for framebuffer or figure.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Scale domain error (e.g., log of non-positive value).
    #[error("Scale domain error: {0}")]
    ScaleDomain(String),

    /// Color parsing error.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Rendering error.
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// Configuration file parsing error with line number.
    #[error("Config parse error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// Configuration file not found.
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),
}

impl Error {
    /// Shorthand for a [`Error::Configuration`] error.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
