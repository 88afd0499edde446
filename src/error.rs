use thiserror::Error;

/// Main error type for the exporter.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A chapter entry lacks the required shape (not an object, or
    /// missing both `number` and `title`).
    #[error("Malformed chapter at index {index}: {reason}")]
    MalformedChapter {
        /// Position of the offending entry in the `chapters` array.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The top-level record is not a JSON object.
    #[error("Malformed ebook record: {0}")]
    MalformedRecord(String),

    /// Unknown or unsupported export format name.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// I/O error while writing the output buffer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error (EPUB and DOCX packaging).
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// PDF construction error.
    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Result type alias for the exporter.
pub type Result<T> = std::result::Result<T, ExportError>;
