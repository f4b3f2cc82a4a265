//! Peptide search over indexed protein sequences

use std::collections::BTreeMap;

#[cfg(feature = "aho-corasick")]
use aho_corasick::{AhoCorasick, MatchKind};
use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::ProteinSequenceIndex;

/// Peptides shorter than this are not mapped
pub const MIN_PEPTIDE_LENGTH: usize = 5;

/// Proteins per worker shard
const SHARD_SIZE: usize = 256;

/// Peptide sequence to the accessions of proteins containing it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeptideProteinMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl PeptideProteinMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Accessions for a peptide; empty when it matched nothing
    pub fn get(&self, peptide: &str) -> &[String] {
        self.entries.get(peptide).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record a match, skipping duplicate accessions
    pub fn add(&mut self, peptide: &str, accession: &str) {
        let accessions = self.entries.entry(peptide.to_string()).or_default();
        if !accessions.iter().any(|a| a == accession) {
            accessions.push(accession.to_string());
        }
    }

    /// Merge another partial map into this one
    pub fn merge(&mut self, other: PeptideProteinMap) {
        for (peptide, accessions) in other.entries {
            for accession in accessions {
                self.add(&peptide, &accession);
            }
        }
    }

    /// Number of peptides with at least one match
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no peptide matched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in peptide order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(p, a)| (p.as_str(), a.as_slice()))
    }
}

/// Accessions of every protein whose sequence contains `peptide`
pub fn search(peptide: &str, index: &ProteinSequenceIndex) -> Vec<String> {
    if peptide.is_empty() {
        return Vec::new();
    }
    index
        .iter()
        .filter(|(_, sequence)| sequence.contains(peptide))
        .map(|(accession, _)| accession.to_string())
        .collect()
}

enum Matcher {
    #[cfg(feature = "aho-corasick")]
    Automaton(AhoCorasick),
    Naive,
}

impl Matcher {
    fn new(patterns: &[String]) -> Self {
        #[cfg(feature = "aho-corasick")]
        {
            match AhoCorasick::builder()
                .match_kind(MatchKind::Standard)
                .build(patterns)
            {
                Ok(automaton) => return Matcher::Automaton(automaton),
                Err(e) => log::warn!("Falling back to substring scan: {}", e),
            }
        }
        #[cfg(not(feature = "aho-corasick"))]
        let _ = patterns;
        Matcher::Naive
    }

    /// Indices of the patterns occurring in `sequence`, ascending
    fn matches(&self, patterns: &[String], sequence: &str) -> Vec<usize> {
        match self {
            #[cfg(feature = "aho-corasick")]
            Matcher::Automaton(automaton) => {
                let mut found: Vec<usize> = automaton
                    .find_overlapping_iter(sequence)
                    .map(|m| m.pattern().as_usize())
                    .collect();
                found.sort_unstable();
                found.dedup();
                found
            }
            Matcher::Naive => patterns
                .iter()
                .enumerate()
                .filter(|(_, p)| sequence.contains(p.as_str()))
                .map(|(i, _)| i)
                .collect(),
        }
    }
}

fn scan_shard(
    shard: &[(&str, &str)],
    matcher: &Matcher,
    patterns: &[String],
) -> PeptideProteinMap {
    let mut partial = PeptideProteinMap::new();
    for (accession, sequence) in shard {
        for i in matcher.matches(patterns, sequence) {
            partial.add(&patterns[i], accession);
        }
    }
    partial
}

/// Map every peptide of at least [`MIN_PEPTIDE_LENGTH`] residues to the
/// proteins containing it.
///
/// With `parallel`, proteins are split into shards scanned on the rayon pool;
/// the partial maps are merged afterwards on the calling thread.
pub fn map_peptides(
    peptides: &[String],
    index: &ProteinSequenceIndex,
    parallel: bool,
) -> PeptideProteinMap {
    let mut patterns: Vec<String> = peptides
        .iter()
        .filter(|p| p.len() >= MIN_PEPTIDE_LENGTH)
        .cloned()
        .collect();
    patterns.sort();
    patterns.dedup();
    if patterns.is_empty() || index.is_empty() {
        return PeptideProteinMap::new();
    }

    let matcher = Matcher::new(&patterns);
    let proteins: Vec<(&str, &str)> = index.iter().collect();
    debug!(
        "Searching {} peptides in {} proteins",
        patterns.len(),
        proteins.len()
    );

    let partials: Vec<PeptideProteinMap> = if parallel {
        #[cfg(feature = "parallel")]
        {
            proteins
                .par_chunks(SHARD_SIZE)
                .map(|shard| scan_shard(shard, &matcher, &patterns))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            proteins
                .chunks(SHARD_SIZE)
                .map(|shard| scan_shard(shard, &matcher, &patterns))
                .collect()
        }
    } else {
        vec![scan_shard(&proteins, &matcher, &patterns)]
    };

    let mut map = PeptideProteinMap::new();
    for partial in partials {
        map.merge(partial);
    }
    info!(
        "Mapped {} of {} peptides to proteins",
        map.len(),
        patterns.len()
    );
    map
}
