//! # Conversion orchestration
//!
//! Drives one pass over a source library, converting each spectrum to the
//! other format. Direction is inferred from the input's extension.
//!
//! ```rust,no_run
//! use speclib::converter::{ConversionConfig, SpectralLibraryConverter};
//!
//! let config = ConversionConfig {
//!     min_peaks: 3,
//!     ..Default::default()
//! };
//! let stats = SpectralLibraryConverter::with_config(config).convert("lib.blib", None)?;
//! println!("{}", stats);
//! # Ok::<(), speclib::converter::ConversionError>(())
//! ```
//!
//! Per-spectrum problems (undecodable peaks, too few peaks, unparseable
//! entries) are counted as skipped and never abort the run. Only I/O and
//! database failures are returned as errors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use crate::library::LibraryError;
use crate::modifications::ModificationTally;
use crate::msp::MspError;
use crate::proteins::{build_or_load_map, PeptideProteinMap, ProteinMapError};
#[cfg(feature = "unimod-xml")]
use crate::unimod::UnimodXml;
use crate::spectrum::{strip_modifications, Spectrum};
use crate::unimod::{ModificationDatabase, ModificationDbError};

mod format;
mod inspect;
mod library_to_text;
mod text_to_library;

pub use format::LibraryFormat;
pub use inspect::{inspect, FileSummary};

/// Errors that can occur during conversion
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The input file does not exist
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// The format of a file cannot be inferred from its extension
    #[error("Cannot determine library format of {0}")]
    UnknownFormat(PathBuf),

    /// Input and output have the same format
    #[error("{input} and {output} are both {format} files")]
    SameFormat {
        /// Input path
        input: PathBuf,
        /// Output path
        output: PathBuf,
        /// The shared format
        format: LibraryFormat,
    },

    /// The output location cannot be written
    #[error("Cannot write output {path}: {source}")]
    OutputNotWritable {
        /// Output path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Error reading or writing the library-DB
    #[error("Library error: {0}")]
    LibraryError(#[from] LibraryError),

    /// Error reading or writing spectral-text
    #[error("Spectral-text error: {0}")]
    MspError(#[from] MspError),

    /// Error building the protein map
    #[error("Protein mapping error: {0}")]
    ProteinMapError(#[from] ProteinMapError),

    /// Error loading the modification database
    #[error("Modification database error: {0}")]
    ModificationDbError(#[from] ModificationDbError),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Configuration for a conversion
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Spectra with fewer peaks are skipped
    pub min_peaks: usize,

    /// Stop after writing this many spectra
    pub limit: Option<usize>,

    /// Directory of FASTA files for protein mapping; mapping is off when unset
    pub fasta_dir: Option<PathBuf>,

    /// Library rows per transaction
    pub commit_interval: usize,

    /// Log progress every this many spectra
    pub progress_interval: usize,

    /// Shard protein search across worker threads
    pub parallel_search: bool,

    /// unimod.xml to load instead of the built-in modification table
    pub unimod_xml: Option<PathBuf>,

    /// Library identifier; defaults to the output file stem
    pub library_id: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            min_peaks: 1,
            limit: None,
            fasta_dir: None,
            commit_interval: 1000,
            progress_interval: 1000,
            parallel_search: true,
            unimod_xml: None,
            library_id: None,
        }
    }
}

/// Statistics from a conversion
#[derive(Debug, Clone, Default)]
pub struct ConversionStats {
    /// Spectra read from the source
    pub seen: usize,
    /// Spectra written to the output
    pub written: usize,
    /// Spectra skipped (too few peaks, undecodable, unparseable)
    pub skipped: usize,
    /// Peaks written
    pub peaks_written: usize,
    /// Written spectra with at least one protein
    pub with_protein_matches: usize,
    /// Written spectra with exactly one protein
    pub with_unique_protein_match: usize,
    /// Wall-clock duration of the pass
    pub duration: Duration,
    /// Modifications seen on written spectra
    pub modifications: ModificationTally,
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} of {} spectra ({} skipped, {} peaks) in {:.2}s",
            self.written,
            self.seen,
            self.skipped,
            self.peaks_written,
            self.duration.as_secs_f64()
        )?;
        writeln!(
            f,
            "Protein matches: {} spectra, {} unique",
            self.with_protein_matches, self.with_unique_protein_match
        )?;
        write!(f, "{}", self.modifications)
    }
}

/// State shared by one conversion run
pub struct ConversionContext {
    /// Modification lookup table
    pub db: ModificationDatabase,
    /// Modifications seen so far
    pub tally: ModificationTally,
    /// Peptide-protein map, when mapping is enabled
    pub protein_map: Option<PeptideProteinMap>,
}

impl ConversionContext {
    /// Context over a loaded database, without protein mapping
    pub fn new(db: ModificationDatabase) -> Self {
        Self {
            db,
            tally: ModificationTally::default(),
            protein_map: None,
        }
    }

    /// Load the modification database named by `config`
    pub fn from_config(config: &ConversionConfig) -> Result<Self, ConversionError> {
        let db = match &config.unimod_xml {
            #[cfg(feature = "unimod-xml")]
            Some(path) => {
                if !path.exists() {
                    return Err(ConversionError::InputNotFound(path.clone()));
                }
                ModificationDatabase::load(&UnimodXml::new(path))?
            }
            #[cfg(not(feature = "unimod-xml"))]
            Some(path) => {
                warn!(
                    "Built without unimod-xml support; ignoring {} and using built-in modifications",
                    path.display()
                );
                ModificationDatabase::builtin()
            }
            None => ModificationDatabase::builtin(),
        };
        Ok(Self::new(db))
    }

    /// Build or load the protein map for `sequences` when a FASTA directory
    /// is configured
    pub fn prepare_proteins(
        &mut self,
        config: &ConversionConfig,
        sequences: impl IntoIterator<Item = String>,
    ) -> Result<(), ConversionError> {
        let Some(fasta_dir) = &config.fasta_dir else {
            return Ok(());
        };
        let mut peptides: Vec<String> = sequences
            .into_iter()
            .map(|s| strip_modifications(&s))
            .collect();
        peptides.sort_unstable();
        peptides.dedup();
        info!(
            "Mapping {} peptides to proteins from {}",
            peptides.len(),
            fasta_dir.display()
        );
        self.protein_map = Some(build_or_load_map(
            fasta_dir,
            &peptides,
            config.parallel_search,
        )?);
        Ok(())
    }

    /// Replace a spectrum's accessions with the mapped ones and count matches.
    ///
    /// Without a protein map the source accessions are kept.
    pub fn annotate_proteins(&self, spectrum: &mut Spectrum, stats: &mut ConversionStats) {
        if let Some(map) = &self.protein_map {
            spectrum.proteins = map.get(&spectrum.sequence).to_vec();
            if spectrum.proteins.is_empty() {
                log::debug!("No protein contains {}", spectrum.sequence);
            }
        }
        match spectrum.proteins.len() {
            0 => {}
            1 => {
                stats.with_protein_matches += 1;
                stats.with_unique_protein_match += 1;
            }
            _ => stats.with_protein_matches += 1,
        }
    }
}

/// Converter between library-DB and spectral-text files
#[derive(Debug, Clone, Default)]
pub struct SpectralLibraryConverter {
    config: ConversionConfig,
}

/// Checked input and output of a conversion
struct Plan {
    input: PathBuf,
    output: PathBuf,
    input_format: LibraryFormat,
}

impl SpectralLibraryConverter {
    /// Converter with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter with a custom configuration
    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn plan(&self, input: &Path, output: Option<&Path>) -> Result<Plan, ConversionError> {
        if !input.is_file() {
            return Err(ConversionError::InputNotFound(input.to_path_buf()));
        }
        let input_format = LibraryFormat::from_path(input)
            .ok_or_else(|| ConversionError::UnknownFormat(input.to_path_buf()))?;

        let output = match output {
            Some(output) => output.to_path_buf(),
            None => input_format.default_output(input),
        };
        let output_format = LibraryFormat::from_path(&output)
            .ok_or_else(|| ConversionError::UnknownFormat(output.clone()))?;
        if output_format == input_format {
            return Err(ConversionError::SameFormat {
                input: input.to_path_buf(),
                output,
                format: input_format,
            });
        }

        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            return Err(ConversionError::OutputNotWritable {
                path: output,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("directory {} does not exist", parent.display()),
                ),
            });
        }
        if output.is_dir() {
            return Err(ConversionError::OutputNotWritable {
                path: output,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "output is a directory",
                ),
            });
        }

        Ok(Plan {
            input: input.to_path_buf(),
            output,
            input_format,
        })
    }

    fn library_id(&self, output: &Path) -> String {
        self.config
            .library_id
            .clone()
            .or_else(|| {
                output
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "speclib".to_string())
    }

    /// Convert `input`, writing to `output` or to the input path with the
    /// extension swapped.
    ///
    /// All pre-flight checks (input exists, both formats known, output
    /// directory exists, modification database loads) run before the output
    /// file is created.
    pub fn convert<P: AsRef<Path>>(
        &self,
        input: P,
        output: Option<&Path>,
    ) -> Result<ConversionStats, ConversionError> {
        let plan = self.plan(input.as_ref(), output)?;
        let mut context = ConversionContext::from_config(&self.config)?;

        info!(
            "Converting {} {} to {}",
            plan.input_format,
            plan.input.display(),
            plan.output.display()
        );

        let started = std::time::Instant::now();
        let mut stats = match plan.input_format {
            LibraryFormat::Library => self.library_to_text(&plan, &mut context)?,
            LibraryFormat::Text => self.text_to_library(&plan, &mut context)?,
        };
        stats.duration = started.elapsed();
        stats.modifications = std::mem::take(&mut context.tally);

        if stats.written == 0 {
            warn!("No spectra written to {}", plan.output.display());
        }
        for line in stats.to_string().lines() {
            info!("{}", line);
        }
        Ok(stats)
    }

    fn log_progress(&self, stats: &ConversionStats, total: Option<usize>) {
        let interval = self.config.progress_interval.max(1);
        if stats.seen % interval != 0 {
            return;
        }
        match total {
            Some(total) if total > 0 => info!(
                "Progress: {}/{} spectra ({:.1}%)",
                stats.seen,
                total,
                stats.seen as f64 / total as f64 * 100.0
            ),
            _ => info!("Progress: {} spectra", stats.seen),
        }
    }

    fn reached_limit(&self, stats: &ConversionStats) -> bool {
        self.config.limit.is_some_and(|limit| stats.written >= limit)
    }
}

#[cfg(test)]
mod tests;
