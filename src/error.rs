//! Error types for the MangaPDF library

use std::path::PathBuf;
use thiserror::Error;

use crate::sequence::{ImageId, SequenceId};

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the MangaPDF library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Extension is not one of the supported image formats
    #[error("Unsupported image format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A supported file that the decoder could not read
    #[error("Failed to load image {}: {message}", .path.display())]
    ImageLoad { path: PathBuf, message: String },

    /// A PDF was readable but its page tree is not what we expect
    #[error("Invalid PDF structure: {0}")]
    InvalidPdf(String),

    /// Nothing to put into a PDF
    #[error("No images to convert")]
    NoImages,

    /// Workspace already holds the maximum number of sequences
    #[error("At most {0} sequences can exist at once")]
    SequenceLimit(usize),

    /// Removing the only remaining sequence
    #[error("At least one sequence must remain")]
    LastSequence,

    /// Unknown sequence id
    #[error("Sequence {0} does not exist")]
    SequenceNotFound(SequenceId),

    /// Unknown image id
    #[error("Image {0} is not in this sequence")]
    ImageNotFound(ImageId),

    /// Reorder index outside the sequence
    #[error("Position {index} is out of range for a sequence of {len} images")]
    IndexOutOfRange { index: usize, len: usize },

    /// Settings file could not be (de)serialized
    #[error("Config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_names_the_file() {
        let err = Error::UnsupportedFormat(PathBuf::from("scan.tiff"));
        assert_eq!(err.to_string(), "Unsupported image format: scan.tiff");
    }

    #[test]
    fn io_error_converts() {
        let err: Error = std::io::Error::other("disk full").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn sequence_limit_mentions_max() {
        assert_eq!(
            Error::SequenceLimit(5).to_string(),
            "At most 5 sequences can exist at once"
        );
    }
}
