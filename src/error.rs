//! Error types for the eyewear try-on tracking core.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// The landmark detector could not be loaded; fatal to the session
    #[error("Detector initialization failed: {0}")]
    DetectorInit(String),

    /// A single detection call failed; recovered as "no face" for that frame
    #[error("Detection error: {0}")]
    Detection(String),

    /// Landmark configuration produced a zero-length axis or non-finite value
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A landmark index outside the landmark set was requested
    #[error("Landmark index {index} out of range for a set of {len} points")]
    LandmarkIndex {
        /// Requested index
        index: usize,
        /// Number of points in the set
        len: usize,
    },

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the current session state
    #[error("Session state error: {0}")]
    SessionState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "absent.yaml").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: absent.yaml");
    }

    #[test]
    fn test_landmark_index_message() {
        let err = Error::LandmarkIndex { index: 500, len: 468 };
        assert_eq!(err.to_string(), "Landmark index 500 out of range for a set of 468 points");
    }
}
