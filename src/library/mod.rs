//! # Library-DB codec
//!
//! Reads and writes BiblioSpec-style SQLite spectral libraries.
//!
//! The schema has a spectrum table (`RefSpectra`), a peaks table holding two
//! blobs per spectrum, a modifications table keyed by spectrum id, a score-type
//! lookup table and the protein tables. Files written by other tools differ
//! in which optional spectrum columns they carry, so the reader probes the
//! schema once into a [`SchemaProfile`] and only selects what is present.
//!
//! ## Writing
//!
//! ```rust,no_run
//! use speclib::library::{LibraryWriter, LibraryWriterConfig};
//! use speclib::spectrum::SpectrumBuilder;
//!
//! let mut writer = LibraryWriter::create("out.blib", LibraryWriterConfig::default())?;
//! let spectrum = SpectrumBuilder::new("IQVR", 251.16, 2)
//!     .add_peak(175.119, 100.0)
//!     .build();
//! writer.write(&spectrum)?;
//! let stats = writer.finish()?;
//! println!("{}", stats);
//! # Ok::<(), speclib::library::LibraryError>(())
//! ```

mod error;
mod reader;
mod schema;
mod writer;

pub use error::LibraryError;
pub use reader::{LibraryReader, LibraryRecord, SpectrumIter};
pub use schema::{
    create_schema, finalize, library_lsid, read_library_info, LibraryInfo, SchemaProfile,
    MAJOR_VERSION, MINOR_VERSION, SCORE_TYPES,
};
pub use writer::{LibraryStats, LibraryWriter, LibraryWriterConfig};
