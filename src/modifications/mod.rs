//! # Modification reconciliation
//!
//! Maps between library-side modifications (1-based position + delta mass)
//! and text-side annotations (0-based position + name or formatted mass).
//!
//! Grammar handling lives in [`grammar`]; both grammars parse into the same
//! [`ModTag`] entries, so nothing downstream depends on which one was read.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::spectrum::{fold_shared_positions, residue_at, Modification, Spectrum};
use crate::unimod::ModificationDatabase;

mod grammar;
mod tally;

pub use grammar::{
    format_annotation, format_legacy_annotation, ModAnnotation, ModParseError, ModTag,
};
pub use tally::{ModificationTally, TallyEntry};

/// Historical text-side names and their database equivalents
const NAME_ALIASES: &[(&str, &str)] = &[
    ("CAM", "Carbamidomethyl"),
    ("Deamidation", "Deamidated"),
    ("Phosphorylation", "Phospho"),
    ("Acetylation", "Acetyl"),
    ("Methylation", "Methyl"),
    ("Dimethylation", "Dimethyl"),
    ("Pyro-glu", "Gln->pyro-Glu"),
    ("Pyro_glu", "Gln->pyro-Glu"),
    ("iTRAQ", "iTRAQ4plex"),
];

/// Translates modifications between their library and text forms
pub struct Reconciler<'db> {
    db: &'db ModificationDatabase,
}

impl<'db> Reconciler<'db> {
    /// Create a reconciler over a loaded database
    pub fn new(db: &'db ModificationDatabase) -> Self {
        Self { db }
    }

    /// Text-side entries for a spectrum's modifications.
    ///
    /// Masses are named through the database where possible; every entry is
    /// counted in `tally`, unresolved masses in its unknown section.
    pub fn tags_for(&self, spectrum: &Spectrum, tally: &mut ModificationTally) -> Vec<ModTag> {
        let mut modifications: Vec<&Modification> = spectrum.modifications.iter().collect();
        modifications.sort_by_key(|m| m.position);

        modifications
            .into_iter()
            .map(|modification| {
                let residue = modification
                    .residue
                    .or_else(|| residue_at(&spectrum.sequence, modification.position))
                    .unwrap_or('X');
                let name = modification
                    .name
                    .as_deref()
                    .or_else(|| self.db.lookup_name_by_mass(modification.mass));
                let tag = match name {
                    Some(name) => {
                        tally.record_known(name, modification.mass, residue);
                        name.to_string()
                    }
                    None => {
                        tally.record_unknown(modification.mass, residue);
                        format!("{:.4}", modification.mass)
                    }
                };
                ModTag::new(modification.position.saturating_sub(1), residue, tag)
            })
            .collect()
    }

    /// Library-side modifications for text entries.
    ///
    /// Entries whose tag cannot be resolved to a mass, or whose position lies
    /// outside `sequence`, are dropped with a warning.
    pub fn resolve(&self, tags: &[ModTag], sequence: &str) -> Vec<Modification> {
        let mut modifications = Vec::with_capacity(tags.len());
        for tag in tags {
            let Some(position) = tag.position.checked_add(1) else {
                warn!(
                    "Modification {} has unusable position {} on {}, dropping",
                    tag.tag, tag.position, sequence
                );
                continue;
            };
            let residue = match residue_at(sequence, position) {
                Some(residue) => residue,
                None => {
                    warn!(
                        "Modification {} at position {} is outside {}, dropping",
                        tag.tag, tag.position, sequence
                    );
                    continue;
                }
            };
            if residue != tag.residue {
                debug!(
                    "Modification {} at position {} names residue {} but {} has {}",
                    tag.tag, tag.position, tag.residue, sequence, residue
                );
            }

            let Some(mass) = self.mass_for_tag(&tag.tag) else {
                warn!("Unknown modification {:?} on {}, dropping", tag.tag, sequence);
                continue;
            };

            let name = match parse_mass(&tag.tag) {
                Some(_) => self.db.lookup_name_by_mass(mass).map(str::to_string),
                None => Some(self.canonical_name(&tag.tag)),
            };

            modifications.push(Modification {
                position,
                residue: Some(residue),
                mass,
                name,
            });
        }
        let folded = fold_shared_positions(&mut modifications);
        if folded > 0 {
            warn!(
                "{} modifications on {} share a position, summing their masses",
                folded, sequence
            );
        }
        modifications
    }

    /// Mass for a tag: a literal number, a database name, or a known alias
    pub fn mass_for_tag(&self, tag: &str) -> Option<f64> {
        let tag = tag.trim();
        if let Some(mass) = parse_mass(tag) {
            return Some(mass);
        }
        self.db
            .lookup_mass_by_name(tag)
            .or_else(|| alias(tag).and_then(|name| self.db.lookup_mass_by_name(name)))
            .or_else(|| {
                strip_residue_suffix(tag).and_then(|base| {
                    self.db
                        .lookup_mass_by_name(base)
                        .or_else(|| alias(base).and_then(|name| self.db.lookup_mass_by_name(name)))
                })
            })
    }

    fn canonical_name(&self, tag: &str) -> String {
        let tag = tag.trim();
        if self.db.lookup_mass_by_name(tag).is_some() {
            return tag.to_string();
        }
        let base = strip_residue_suffix(tag).unwrap_or(tag);
        alias(base).unwrap_or(base).to_string()
    }
}

fn parse_mass(tag: &str) -> Option<f64> {
    tag.trim().parse::<f64>().ok().filter(|m| m.is_finite())
}

fn alias(name: &str) -> Option<&'static str> {
    NAME_ALIASES
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(name))
        .map(|&(_, to)| to)
}

/// `Oxidation_M` -> `Oxidation`
fn strip_residue_suffix(name: &str) -> Option<&str> {
    let (base, suffix) = name.rsplit_once('_')?;
    let mut chars = suffix.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() && !base.is_empty() => Some(base),
        _ => None,
    }
}

/// Merge two annotation sources for the same spectrum, keyed by position.
///
/// Entries from `primary` (the one embedded in the entry name) win over
/// entries from `secondary` at the same position.
pub fn merge_tags(primary: Vec<ModTag>, secondary: Vec<ModTag>) -> Vec<ModTag> {
    let mut merged: BTreeMap<usize, ModTag> = BTreeMap::new();
    for tag in secondary {
        merged.insert(tag.position, tag);
    }
    for tag in primary {
        if let Some(previous) = merged.insert(tag.position, tag) {
            debug!(
                "Name annotation overrides {} at position {}",
                previous.tag, previous.position
            );
        }
    }
    merged.into_values().collect()
}
