//! Error types for peak extraction

use std::fmt;
use std::io;

/// Errors that can occur while decoding PCM data or aggregating peaks
#[derive(Debug)]
pub enum PeaksError {
    /// Invalid construction parameters (zero channels, zero buckets, zero step, ...)
    InvalidConfig(String),

    /// Sample batches delivered in a shape the aggregator cannot accept
    SequenceViolation(String),

    /// Read error from the upstream byte source, passed through unchanged
    Io(io::Error),
}

impl fmt::Display for PeaksError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeaksError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            PeaksError::SequenceViolation(msg) => write!(f, "Sequence violation: {}", msg),
            PeaksError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for PeaksError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PeaksError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PeaksError {
    fn from(err: io::Error) -> Self {
        PeaksError::Io(err)
    }
}
