//! FASTA discovery and indexing

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::{debug, info, warn};

use super::ProteinMapError;

/// Extensions recognised as FASTA, optionally followed by `.gz`
pub const FASTA_EXTENSIONS: &[&str] = &["fasta", "fa", "faa", "fas"];

/// Protein accession to residue sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProteinSequenceIndex {
    proteins: BTreeMap<String, String>,
}

impl ProteinSequenceIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a protein
    pub fn insert(&mut self, accession: impl Into<String>, sequence: impl Into<String>) {
        self.proteins.insert(accession.into(), sequence.into());
    }

    /// Sequence for an accession
    pub fn get(&self, accession: &str) -> Option<&str> {
        self.proteins.get(accession).map(String::as_str)
    }

    /// Number of proteins
    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    /// Whether the index has no proteins
    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    /// Proteins in accession order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.proteins.iter().map(|(a, s)| (a.as_str(), s.as_str()))
    }
}

/// Whether a path looks like a (possibly gzipped) FASTA file
pub fn is_fasta_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rsplit_once('.') {
        Some((_, ext)) => FASTA_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// FASTA files under `dir`, recursively, in sorted order
pub fn find_fasta_files(dir: &Path) -> Result<Vec<PathBuf>, ProteinMapError> {
    if !dir.is_dir() {
        return Err(ProteinMapError::NotADirectory(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_fasta_path(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    debug!("Found {} FASTA files under {}", files.len(), dir.display());
    Ok(files)
}

/// Accession from a header line (with or without the leading `>`).
///
/// `>sp|P00761|TRYP_PIG Trypsin` gives `P00761`; `>TRYP_PIG Trypsin` gives
/// `TRYP_PIG`.
pub fn accession_from_header(header: &str) -> Option<String> {
    let token = header.trim_start_matches('>').split_whitespace().next()?;
    let accession = if token.contains('|') {
        let parts: Vec<&str> = token.split('|').collect();
        match parts.get(1) {
            Some(accession) if !accession.is_empty() => *accession,
            _ => parts[0],
        }
    } else {
        token
    };
    (!accession.is_empty()).then(|| accession.to_string())
}

/// Add every record from a FASTA stream to `index`, returning the count read
pub fn read_fasta<R: BufRead>(
    source: R,
    index: &mut ProteinSequenceIndex,
) -> Result<usize, ProteinMapError> {
    let mut count = 0;
    let mut current: Option<(String, String)> = None;

    for line in source.lines() {
        let line = line?;
        let line = line.trim();
        if let Some(header) = line.strip_prefix('>') {
            if let Some((accession, sequence)) = current.take() {
                index.insert(accession, sequence);
                count += 1;
            }
            current = accession_from_header(header).map(|a| (a, String::new()));
            if current.is_none() {
                warn!("Skipping FASTA record with empty header");
            }
        } else if let Some((_, sequence)) = current.as_mut() {
            sequence.extend(
                line.chars()
                    .filter(|c| c.is_ascii_alphabetic())
                    .map(|c| c.to_ascii_uppercase()),
            );
        }
    }
    if let Some((accession, sequence)) = current {
        index.insert(accession, sequence);
        count += 1;
    }
    Ok(count)
}

fn open_fasta(path: &Path) -> Result<Box<dyn BufRead>, ProteinMapError> {
    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));
    let reader: Box<dyn Read> = if is_gzip {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Index every protein in the given FASTA files
pub fn build_index(paths: &[PathBuf]) -> Result<ProteinSequenceIndex, ProteinMapError> {
    let mut index = ProteinSequenceIndex::new();
    for path in paths {
        let count = read_fasta(open_fasta(path)?, &mut index)?;
        debug!("Indexed {} proteins from {}", count, path.display());
    }
    info!("Indexed {} proteins from {} FASTA files", index.len(), paths.len());
    Ok(index)
}
