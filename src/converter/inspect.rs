use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{ConversionError, LibraryFormat};
use crate::library::{LibraryInfo, LibraryReader};
use crate::msp::{MspError, MspReader};

/// Short description of a library file
#[derive(Debug, Clone, PartialEq)]
pub enum FileSummary {
    /// A library-DB file
    Library {
        /// Spectrum rows
        spectra: usize,
        /// Distinct protein accessions
        proteins: usize,
        /// Score type names in use
        score_types: Vec<String>,
        /// The metadata row, if present
        info: Option<LibraryInfo>,
    },
    /// A spectral-text file
    Text {
        /// Well-formed entries
        entries: usize,
        /// Entries that failed to parse
        malformed: usize,
        /// Peaks across all entries
        peaks: usize,
    },
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSummary::Library {
                spectra,
                proteins,
                score_types,
                info,
            } => {
                writeln!(f, "Format: library-DB")?;
                if let Some(info) = info {
                    writeln!(f, "LSID: {}", info.lsid)?;
                    writeln!(f, "Created: {}", info.create_time)?;
                    writeln!(
                        f,
                        "Schema version: {}.{}",
                        info.major_version, info.minor_version
                    )?;
                }
                writeln!(f, "Spectra: {}", spectra)?;
                writeln!(f, "Proteins: {}", proteins)?;
                write!(f, "Score types: {}", score_types.join(", "))
            }
            FileSummary::Text {
                entries,
                malformed,
                peaks,
            } => {
                writeln!(f, "Format: spectral-text")?;
                writeln!(f, "Entries: {}", entries)?;
                writeln!(f, "Malformed entries: {}", malformed)?;
                write!(f, "Peaks: {}", peaks)
            }
        }
    }
}

/// Summarise a library file without converting it
pub fn inspect<P: AsRef<Path>>(path: P) -> Result<FileSummary, ConversionError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ConversionError::InputNotFound(path.to_path_buf()));
    }
    match LibraryFormat::from_path(path) {
        Some(LibraryFormat::Library) => {
            let reader = LibraryReader::open(path)?;
            let mut score_types = reader.used_score_types()?;
            score_types.sort();
            Ok(FileSummary::Library {
                spectra: reader.spectrum_count()?,
                proteins: reader.protein_count()?,
                score_types,
                info: reader.info().cloned(),
            })
        }
        Some(LibraryFormat::Text) => {
            let mut entries = 0;
            let mut malformed = 0;
            let mut peaks = 0;
            for entry in MspReader::new(BufReader::new(File::open(path)?)) {
                match entry {
                    Ok(entry) => {
                        entries += 1;
                        peaks += entry.peaks.len();
                    }
                    Err(MspError::IoError(e)) => return Err(e.into()),
                    Err(_) => malformed += 1,
                }
            }
            Ok(FileSummary::Text {
                entries,
                malformed,
                peaks,
            })
        }
        None => Err(ConversionError::UnknownFormat(path.to_path_buf())),
    }
}
