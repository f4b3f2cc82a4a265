/// Errors that can occur reading spectral-text entries
#[derive(Debug, thiserror::Error)]
pub enum MspError {
    /// I/O error while reading or writing
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A header line could not be interpreted
    #[error("Malformed header at line {line}: {message}")]
    MalformedHeader {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// A peak line did not start with two numbers
    #[error("Malformed peak line {line}: {content:?}")]
    MalformedPeakLine {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// The `Name:` value has no usable sequence or charge
    #[error("Invalid entry name {0:?}")]
    InvalidName(String),

    /// No precursor m/z could be determined
    #[error("Entry {0:?} has no precursor m/z or MW")]
    MissingPrecursor(String),

    /// The modification annotation could not be parsed
    #[error("Entry {name:?}: {source}")]
    Modifications {
        /// Entry name
        name: String,
        /// Underlying parse error
        #[source]
        source: crate::modifications::ModParseError,
    },
}
