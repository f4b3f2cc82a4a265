use std::path::PathBuf;

/// Errors that can occur while building a peptide-to-protein map
#[derive(Debug, thiserror::Error)]
pub enum ProteinMapError {
    /// I/O error reading FASTA or cache files
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Cache file could not be serialized or parsed
    #[error("Cache JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The FASTA location is not a directory
    #[error("Not a FASTA directory: {0}")]
    NotADirectory(PathBuf),
}
