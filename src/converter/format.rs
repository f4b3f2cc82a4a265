use std::fmt;
use std::path::{Path, PathBuf};

/// On-disk representation of a spectral library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryFormat {
    /// SQLite library-DB
    Library,
    /// Spectral-text (MSP)
    Text,
}

impl LibraryFormat {
    /// Infer the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "blib" | "db" | "sqlite" => Some(Self::Library),
            "msp" | "sptxt" | "txt" => Some(Self::Text),
            _ => None,
        }
    }

    /// Canonical extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Library => "blib",
            Self::Text => "msp",
        }
    }

    /// The format a file of this format converts to
    pub fn counterpart(&self) -> Self {
        match self {
            Self::Library => Self::Text,
            Self::Text => Self::Library,
        }
    }

    /// `input` with its extension swapped for the counterpart's
    pub fn default_output(&self, input: &Path) -> PathBuf {
        input.with_extension(self.counterpart().extension())
    }
}

impl fmt::Display for LibraryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "library-DB"),
            Self::Text => write!(f, "spectral-text"),
        }
    }
}
