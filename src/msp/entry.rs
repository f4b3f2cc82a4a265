//! Interpretation of raw entries as spectra

use log::debug;

use super::comment::parse_proteins;
use super::{MspError, RawEntry};
use crate::modifications::{merge_tags, ModAnnotation, ModTag, Reconciler};
use crate::spectrum::{
    annotate_sequence, precursor_mz_from_mass, strip_modifications, Spectrum, NO_FLANKING_RESIDUE,
};

/// Comment keys interpreted by [`RawEntry::into_spectrum`]
pub const KNOWN_COMMENT_KEYS: &[&str] = &[
    "Parent",
    "Mods",
    "Protein",
    "MultiProtein",
    "RetentionTime",
    "Score",
    "ScoreType",
    "TIC",
    "CCS",
    "IonMobility",
    "SpecIDinFile",
    "Fullname",
    "Charge",
];

/// Parts of a `Name:` value: `SEQ/charge[_annotation]`
#[derive(Debug, Clone, PartialEq)]
pub struct EntryName {
    /// Sequence as written
    pub sequence: String,
    /// Charge, if present
    pub charge: Option<u32>,
    /// Embedded modification annotation
    pub annotation: Option<String>,
}

impl EntryName {
    /// Split a `Name:` value
    pub fn parse(name: &str) -> Result<Self, MspError> {
        let name = name.trim();
        let (sequence, rest) = match name.split_once('/') {
            Some((sequence, rest)) => (sequence, Some(rest)),
            None => (name, None),
        };
        if sequence.is_empty() {
            return Err(MspError::InvalidName(name.to_string()));
        }

        let (charge, annotation) = match rest {
            None => (None, None),
            Some(rest) => {
                let (charge, annotation) = match rest.split_once('_') {
                    Some((charge, annotation)) => (charge, Some(annotation.to_string())),
                    None => (rest, None),
                };
                let charge = charge
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| MspError::InvalidName(name.to_string()))?;
                (Some(charge), annotation.filter(|a| !a.is_empty()))
            }
        };

        Ok(Self {
            sequence: sequence.to_string(),
            charge,
            annotation,
        })
    }
}

fn parse_number(entry: &RawEntry, key: &str) -> Option<f64> {
    let value = entry.comment_value(key)?;
    // `RetentionTime=12.3,11.9,12.8` style lists use the first value
    let first = value.split(',').next().unwrap_or(value).trim();
    match first.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!("Ignoring {}={:?} on {:?}", key, value, entry.name);
            None
        }
    }
}

fn parse_tags(entry: &RawEntry, annotation: &str) -> Result<Vec<ModTag>, MspError> {
    ModAnnotation::parse(annotation)
        .map(ModAnnotation::into_tags)
        .map_err(|source| MspError::Modifications {
            name: entry.name.clone(),
            source,
        })
}

/// `K.IQVR.A/2` -> (`K`, `A`)
fn parse_fullname(value: &str) -> Option<(char, char)> {
    let value = value.split('/').next()?;
    let mut parts = value.split('.');
    let prev = parts.next()?;
    let _sequence = parts.next()?;
    let next = parts.next()?;
    let flank = |s: &str| s.chars().next().unwrap_or(NO_FLANKING_RESIDUE);
    Some((flank(prev), flank(next)))
}

impl RawEntry {
    /// Interpret the entry as a spectrum.
    ///
    /// The charge in `Name:` overrides any other charge. Modifications from
    /// the name and from `Mods=` are merged by position, the name winning.
    /// Precursor m/z comes from `Parent=`, a `PrecursorMZ:` header, or is
    /// back-derived from `MW:`.
    pub fn into_spectrum(self, reconciler: &Reconciler<'_>) -> Result<Spectrum, MspError> {
        let name = EntryName::parse(&self.name)?;
        let sequence = strip_modifications(&name.sequence);
        if sequence.is_empty() {
            return Err(MspError::InvalidName(self.name.clone()));
        }

        let charge = name
            .charge
            .or_else(|| {
                self.comment_value("Charge")
                    .or_else(|| self.header_value("Charge"))
                    .and_then(|c| c.trim().trim_end_matches('+').parse::<u32>().ok())
            })
            .filter(|&c| c > 0)
            .ok_or_else(|| MspError::InvalidName(self.name.clone()))?;

        let precursor_mz = parse_number(&self, "Parent")
            .or_else(|| {
                self.header_value("PrecursorMZ")
                    .and_then(|v| v.parse::<f64>().ok())
            })
            .filter(|&mz| mz > 0.0)
            .or_else(|| self.mw.and_then(|mw| precursor_mz_from_mass(mw, charge)))
            .ok_or_else(|| MspError::MissingPrecursor(self.name.clone()))?;

        let name_tags = match &name.annotation {
            Some(annotation) => parse_tags(&self, annotation)?,
            None => Vec::new(),
        };
        let field_tags = match self.comment_value("Mods") {
            Some(annotation) => parse_tags(&self, annotation)?,
            None => Vec::new(),
        };
        let tags = merge_tags(name_tags, field_tags);
        let modifications = reconciler.resolve(&tags, &sequence);

        let (prev_aa, next_aa) = self
            .comment_value("Fullname")
            .and_then(parse_fullname)
            .unwrap_or((NO_FLANKING_RESIDUE, NO_FLANKING_RESIDUE));

        let retention_time = parse_number(&self, "RetentionTime").map(|seconds| seconds / 60.0);
        let score = parse_number(&self, "Score");
        let total_ion_current = parse_number(&self, "TIC");
        let collisional_cross_section = parse_number(&self, "CCS");
        let ion_mobility = parse_number(&self, "IonMobility");
        let score_type = self
            .comment_value("ScoreType")
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let spec_id_in_file = self
            .comment_value("SpecIDinFile")
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let proteins = self
            .comment_value("Protein")
            .map(parse_proteins)
            .unwrap_or_default();

        let extra: Vec<(String, String)> = self
            .comment
            .iter()
            .filter(|(key, _)| !KNOWN_COMMENT_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();

        let modified_sequence = if modifications.is_empty() {
            sequence.clone()
        } else {
            annotate_sequence(&sequence, &modifications)
        };

        let mut spectrum = Spectrum {
            sequence,
            modified_sequence,
            precursor_mz,
            charge,
            retention_time,
            score,
            score_type,
            total_ion_current,
            ion_mobility,
            collisional_cross_section,
            spec_id_in_file,
            prev_aa,
            next_aa,
            copies: 1,
            modifications,
            proteins,
            peaks: self.peaks,
            extra,
        };
        spectrum.normalize_modifications();
        Ok(spectrum)
    }
}
