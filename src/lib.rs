//! # speclib - Spectral Library Conversion
//!
//! `speclib` converts peptide spectral libraries between two representations:
//!
//! - **library-DB**: a BiblioSpec-style SQLite file (`.blib`, `.sqlite`, `.db`)
//!   with peaks stored as packed, optionally zlib-compressed blobs.
//! - **spectral-text**: the NIST MSP text format (`.msp`, `.sptxt`).
//!
//! Conversion in either direction keeps peaks, charge, precursor m/z,
//! retention time, scores, flanking residues and modifications. Modification
//! names in text are reconciled against a modification database (built-in or
//! loaded from `unimod.xml`). Peptides can optionally be re-annotated with the
//! proteins that contain them, searched from a directory of FASTA files.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use speclib::converter::{ConversionConfig, SpectralLibraryConverter};
//!
//! let config = ConversionConfig {
//!     fasta_dir: Some("fasta/".into()),
//!     ..Default::default()
//! };
//! let converter = SpectralLibraryConverter::with_config(config);
//!
//! // library-DB to spectral-text
//! let stats = converter.convert("library.blib", None)?;
//! println!("{}", stats);
//!
//! // and back
//! converter.convert("library.msp", Some("roundtrip.blib".as_ref()))?;
//! # Ok::<(), speclib::converter::ConversionError>(())
//! ```
//!
//! ## Lower-level access
//!
//! ```rust,no_run
//! use speclib::library::LibraryReader;
//! use speclib::modifications::Reconciler;
//! use speclib::msp::format_entry;
//! use speclib::unimod::ModificationDatabase;
//!
//! let db = ModificationDatabase::builtin();
//! let reconciler = Reconciler::new(&db);
//! let mut tally = Default::default();
//!
//! let reader = LibraryReader::open("library.blib")?;
//! for record in reader.spectra() {
//!     let spectrum = record?.decode()?;
//!     let tags = reconciler.tags_for(&spectrum, &mut tally);
//!     print!("{}", format_entry(&spectrum, &tags));
//! }
//! # Ok::<(), speclib::library::LibraryError>(())
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): shard protein search across a rayon pool.
//! - `aho-corasick` (default): multi-pattern automaton for peptide search.
//! - `unimod-xml` (default): load modifications from a `unimod.xml` file.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]

pub mod converter;
pub mod library;
pub mod modifications;
pub mod msp;
pub mod peaks;
pub mod proteins;
pub mod spectrum;
pub mod unimod;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::converter::{
        inspect, ConversionConfig, ConversionError, ConversionStats, FileSummary, LibraryFormat,
        SpectralLibraryConverter,
    };
    pub use crate::library::{
        LibraryError, LibraryReader, LibraryRecord, LibraryWriter, LibraryWriterConfig,
    };
    pub use crate::modifications::{ModTag, ModificationTally, Reconciler};
    pub use crate::msp::{MspError, MspReader, MspWriter, RawEntry};
    pub use crate::peaks::{PeakBlobs, PeakCodec};
    pub use crate::proteins::{build_or_load_map, PeptideProteinMap, ProteinSequenceIndex};
    pub use crate::spectrum::{Modification, Peak, PeakList, Spectrum, SpectrumBuilder};
    pub use crate::unimod::{ModificationDatabase, ModificationRecord};
}
