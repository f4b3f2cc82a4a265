//! # Peptide-to-protein mapping
//!
//! Indexes FASTA files found under a directory and maps peptide sequences to
//! the accessions of the proteins containing them.
//!
//! Building the map for a full proteome is the slowest step of a conversion,
//! so results are cached in the FASTA directory under a key derived from the
//! FASTA files (path, size, modification time) and the peptide set. A changed
//! input gives a new key and the map is rebuilt.
//!
//! ```rust,no_run
//! use speclib::proteins::build_or_load_map;
//!
//! let peptides = vec!["IQVRLGEHNIDVLEGNEQFINAAK".to_string()];
//! let map = build_or_load_map("fasta/".as_ref(), &peptides, true)?;
//! println!("{:?}", map.get("IQVRLGEHNIDVLEGNEQFINAAK"));
//! # Ok::<(), speclib::proteins::ProteinMapError>(())
//! ```

use std::path::Path;

use log::{info, warn};

mod cache;
mod error;
mod fasta;
mod search;

pub use cache::{cache_key, cache_path, load_cache, save_cache, CACHE_PREFIX};
pub use error::ProteinMapError;
pub use fasta::{
    accession_from_header, build_index, find_fasta_files, is_fasta_path, read_fasta,
    ProteinSequenceIndex, FASTA_EXTENSIONS,
};
pub use search::{map_peptides, search, PeptideProteinMap, MIN_PEPTIDE_LENGTH};

/// Index every FASTA file under `fasta_dir`.
///
/// A missing or unreadable directory gives an empty index.
pub fn index_directory(fasta_dir: &Path) -> ProteinSequenceIndex {
    let result = find_fasta_files(fasta_dir).and_then(|files| build_index(&files));
    match result {
        Ok(index) => index,
        Err(e) => {
            warn!("Protein mapping disabled: {}", e);
            ProteinSequenceIndex::new()
        }
    }
}

/// Load the peptide-protein map for `peptides` from the cache in
/// `fasta_dir`, building and caching it on a miss.
///
/// A missing directory or one without FASTA files gives an empty map. Cache
/// write failures are logged and otherwise ignored.
pub fn build_or_load_map(
    fasta_dir: &Path,
    peptides: &[String],
    parallel: bool,
) -> Result<PeptideProteinMap, ProteinMapError> {
    let files = match find_fasta_files(fasta_dir) {
        Ok(files) => files,
        Err(ProteinMapError::NotADirectory(dir)) => {
            warn!("{} is not a directory; protein mapping disabled", dir.display());
            return Ok(PeptideProteinMap::new());
        }
        Err(e) => return Err(e),
    };
    if files.is_empty() {
        warn!("No FASTA files under {}", fasta_dir.display());
        return Ok(PeptideProteinMap::new());
    }

    let key = cache_key(&files, peptides)?;
    let path = cache_path(fasta_dir, &key);
    if let Some(map) = load_cache(&path, &key) {
        info!("Loaded {} peptide mappings from {}", map.len(), path.display());
        return Ok(map);
    }

    let index = build_index(&files)?;
    let map = map_peptides(peptides, &index, parallel);
    match save_cache(&path, &key, &map) {
        Ok(()) => info!("Cached peptide mappings in {}", path.display()),
        Err(e) => warn!("Could not write protein cache {}: {}", path.display(), e),
    }
    Ok(map)
}

#[cfg(test)]
mod tests;
