// src/utils/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in the Lepton encoder library.
#[derive(Error, Debug)]
pub enum LeptonError {
    /// An error occurred while reading from or writing to a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The diagnostic model export target could not be opened or written.
    #[error("error writing to {}: {source}", path.display())]
    ModelExport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The finished arithmetic-coded stream does not fit the 32-bit length field.
    #[error("Encoded stream of {0} bytes does not fit a 32-bit length")]
    StreamTooLarge(usize),

    /// A chunk being decoded is malformed.
    #[error("Stream error: {0}")]
    Stream(String),

    /// An invalid argument was provided to a function.
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
}

/// A specialized `Result` type for Lepton operations.
pub type Result<T> = std::result::Result<T, LeptonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: LeptonError = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short").into();
        assert!(matches!(err, LeptonError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_model_export_message_names_path() {
        let err = LeptonError::ModelExport {
            path: PathBuf::from("/nowhere/model.bin"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "error writing to /nowhere/model.bin: missing");
    }
}
