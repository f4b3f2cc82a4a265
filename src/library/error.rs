use crate::peaks::PeakCodecError;

/// Errors that can occur reading or writing a library-DB file
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Peak blobs could not be decoded
    #[error("Peak decode error: {0}")]
    PeakCodecError(#[from] PeakCodecError),

    /// A required table is absent
    #[error("Not a spectral library: missing table {0}")]
    MissingTable(String),

    /// A spectrum has no row in the peaks table
    #[error("Spectrum {0} has no peaks")]
    MissingPeaks(i64),

    /// A stored value is unusable
    #[error("Invalid {column} for spectrum {id}: {message}")]
    InvalidValue {
        /// Spectrum id
        id: i64,
        /// Column name
        column: &'static str,
        /// What was wrong
        message: String,
    },
}
