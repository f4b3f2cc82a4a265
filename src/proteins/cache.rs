//! Content-addressed disk cache for peptide-protein maps

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{PeptideProteinMap, ProteinMapError};

/// Cache file name prefix
pub const CACHE_PREFIX: &str = "peptide_protein_cache_";

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    key: String,
    created: String,
    peptides: PeptideProteinMap,
}

/// Hash of the FASTA files' identities and the sorted, de-duplicated peptides.
///
/// Any change to a file's path, size or modification time, or to the peptide
/// set, gives a different key.
pub fn cache_key(fasta_files: &[PathBuf], peptides: &[String]) -> Result<String, ProteinMapError> {
    let mut files: Vec<&PathBuf> = fasta_files.iter().collect();
    files.sort();

    let mut material = String::new();
    for path in files {
        let metadata = std::fs::metadata(path)?;
        let mtime = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        material.push_str(&format!("{}\t{}\t{}\n", path.display(), mtime, metadata.len()));
    }

    let mut sorted: Vec<&str> = peptides.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let peptide_digest = md5::compute(sorted.join("\n").as_bytes());
    material.push_str(&format!("{:x}", peptide_digest));

    Ok(format!("{:x}", md5::compute(material.as_bytes())))
}

/// Location of the cache entry for `key` inside `fasta_dir`
pub fn cache_path(fasta_dir: &Path, key: &str) -> PathBuf {
    fasta_dir.join(format!("{}{}.json", CACHE_PREFIX, key))
}

/// Load a cache entry; a missing, corrupt or mismatched file is a miss
pub fn load_cache(path: &Path, key: &str) -> Option<PeptideProteinMap> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            debug!("No protein cache at {}", path.display());
            return None;
        }
    };
    match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
        Ok(cache) if cache.key == key => {
            debug!("Protein cache created {}", cache.created);
            Some(cache.peptides)
        }
        Ok(cache) => {
            warn!(
                "Protein cache {} has key {}, expected {}; rebuilding",
                path.display(),
                cache.key,
                key
            );
            None
        }
        Err(e) => {
            warn!("Ignoring unreadable protein cache {}: {}", path.display(), e);
            None
        }
    }
}

/// Write a cache entry
pub fn save_cache(path: &Path, key: &str, map: &PeptideProteinMap) -> Result<(), ProteinMapError> {
    let cache = CacheFile {
        key: key.to_string(),
        created: Utc::now().to_rfc3339(),
        peptides: map.clone(),
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &cache)?;
    writer.flush()?;
    Ok(())
}
