//! Error types for ozimap
//!
//! Every failure of the map build is reported through [`Error`]. None of them
//! are retried internally; the caller decides what to do with them.

use std::fmt;
use std::path::PathBuf;

/// Quantity the region resolver was unable to derive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Region size in projection units
    Size,
    /// Zoom level of the rendered image
    Zoom,
    /// Region center
    Center,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Size => write!(f, "size"),
            Quantity::Zoom => write!(f, "zoom"),
            Quantity::Center => write!(f, "center"),
        }
    }
}

/// Main error type for ozimap operations
#[derive(Debug)]
pub enum Error {
    /// Latitude/longitude text that is malformed or out of range
    InvalidCoordinate(String),

    /// The supplied region parameters do not determine the given quantity
    InsufficientParameters(Quantity),

    /// Resolved region has no area or wraps around the antimeridian
    DegenerateRegion(String),

    /// A single tile could not be fetched or decoded
    TileFetchFailed {
        row: u32,
        column: u32,
        message: String,
    },

    /// Calibration template does not exist
    TemplateFileMissing(PathBuf),

    /// An output file could not be written
    OutputWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// HTTP-specific error
    HttpError(String),

    /// Network connectivity issues
    NetworkError(String),

    /// Tile decoding or mosaic encoding failure
    ImageError(String),

    /// File I/O error
    IoError(std::io::Error),

    /// Invalid configuration or parameters
    InvalidInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCoordinate(msg) => {
                write!(f, "Invalid coordinate: {}", msg)
            }
            Error::InsufficientParameters(quantity) => {
                write!(f, "Not enough parameters to calculate region {}", quantity)
            }
            Error::DegenerateRegion(msg) => {
                write!(f, "Unsupported region: {}", msg)
            }
            Error::TileFetchFailed {
                row,
                column,
                message,
            } => {
                write!(f, "Tile at row {}, column {} failed: {}", row, column, message)
            }
            Error::TemplateFileMissing(path) => {
                write!(f, "Template file not found: {}", path.display())
            }
            Error::OutputWriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {}", msg)
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::ImageError(msg) => {
                write!(f, "Image error: {}", msg)
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            Error::OutputWriteFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err.to_string())
    }
}

/// Suggest the closest known name for a misspelled one
///
/// Returns `None` for exact (case-insensitive) matches and for names that are
/// too far from every candidate to be a plausible typo.
pub fn suggest_correction(input: &str, candidates: &[&str]) -> Option<String> {
    let input_lower = input.to_lowercase();

    // About a third of the word, at least 1 and at most 3 edits
    let max_distance = (input.len() / 3).clamp(1, 3);

    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for candidate in candidates {
        let distance = strsim::levenshtein(&input_lower, candidate);
        if distance == 0 {
            return None;
        }
        if distance <= max_distance && distance < best_distance {
            best_distance = distance;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Build an "unknown value" error, with a suggestion when one is close enough
pub fn unknown_value(kind: &str, value: &str, candidates: &[&str]) -> Error {
    match suggest_correction(value, candidates) {
        Some(suggestion) => Error::InvalidInput(format!(
            "Unknown {kind} '{value}'. Did you mean '{suggestion}'?"
        )),
        None => Error::InvalidInput(format!(
            "Unknown {kind} '{value}'. Expected one of: {}",
            candidates.join(", ")
        )),
    }
}

/// Convenience result type for ozimap operations
pub type Result<T> = std::result::Result<T, Error>;
