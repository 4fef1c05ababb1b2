//! Error types for phonoscope.
//!
//! Errors only arise at the construction and I/O boundary: building a
//! [`Signal`](crate::Signal), reading a WAV file, or parsing an
//! [`AnalysisConfig`](crate::AnalysisConfig). The analysis pipelines
//! themselves never fail; insufficient or silent input degrades to an empty
//! point array or to default formants.
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.

use thiserror::Error;

/// Result type alias using phonoscope's Error type.
///
/// # Example
///
/// ```no_run
/// use phonoscope::{Result, Signal};
///
/// fn load(path: &str) -> Result<Signal> {
///     let signal = Signal::from_file(path)?;
///     Ok(signal)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing an analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// Error reading audio file.
    ///
    /// This wraps errors from the `hound` WAV library (file not found,
    /// not a WAV file, truncated data).
    #[error("Failed to read audio file: {0}")]
    AudioRead(#[from] hound::Error),

    /// Error with I/O operations.
    ///
    /// General file system errors, e.g. reading or writing a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter value.
    ///
    /// Returned when a constructor receives a value outside its valid
    /// domain, such as a zero sample rate or non-finite samples.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be parsed or serialized.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
