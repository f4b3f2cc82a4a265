//! # Modification database
//!
//! Mass-to-name and name-to-mass lookup over a set of [`ModificationRecord`]s
//! obtained from a [`ModificationProvider`].
//!
//! Masses are bucketed by rounding to 4 decimal places. Many records may share
//! a bucket (e.g. `Oxidation` and the `Ala->Ser` substitution), so one canonical
//! name is chosen per bucket:
//!
//! 1. a preferred name for well-known ambiguous masses, if present
//! 2. approved records before unapproved ones
//! 3. case-insensitive alphabetical order
//!
//! Mass lookup falls back to a ±0.001 Da scan (nearest wins) when the exact
//! bucket is empty.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};

mod builtin;
mod error;
#[cfg(feature = "unimod-xml")]
mod xml;

pub use builtin::BuiltinModifications;
pub use error::ModificationDbError;
#[cfg(feature = "unimod-xml")]
pub use xml::{parse_unimod, UnimodXml};

/// Tolerance for the fallback mass scan, in Daltons
pub const MASS_TOLERANCE: f64 = 0.001;

const BUCKET_SCALE: f64 = 10_000.0;

/// Canonical names for masses shared by several records
const PREFERRED_NAMES: &[(f64, &str)] = &[
    (15.9949, "Oxidation"),
    (57.0215, "Carbamidomethyl"),
    (42.0106, "Acetyl"),
    (79.9663, "Phospho"),
    (0.9840, "Deamidated"),
    (28.0313, "Dimethyl"),
    (14.0157, "Methyl"),
    (27.9949, "Formyl"),
    (-17.0265, "Gln->pyro-Glu"),
    (-18.0106, "Glu->pyro-Glu"),
    (229.1629, "TMT6plex"),
    (304.2071, "TMTpro"),
    (144.1021, "iTRAQ4plex"),
    (304.2054, "iTRAQ8plex"),
    (8.0142, "Label:13C(6)15N(2)"),
    (10.0083, "Label:13C(6)15N(4)"),
];

/// One record from a modification provider
#[derive(Debug, Clone, PartialEq)]
pub struct ModificationRecord {
    /// Modification name
    pub name: String,
    /// Monoisotopic delta mass
    pub mono_mass: f64,
    /// Whether the record is approved
    pub approved: bool,
}

impl ModificationRecord {
    /// Create a record
    pub fn new(name: impl Into<String>, mono_mass: f64, approved: bool) -> Self {
        Self {
            name: name.into(),
            mono_mass,
            approved,
        }
    }
}

/// Source of modification records
pub trait ModificationProvider {
    /// Load all records
    fn records(&self) -> Result<Vec<ModificationRecord>, ModificationDbError>;

    /// Human-readable description of the source, for logging
    fn describe(&self) -> String;
}

/// Bucket key for a mass; `None` when the scaled mass does not fit an `i64`
fn bucket(mass: f64) -> Option<i64> {
    let scaled = (mass * BUCKET_SCALE).round();
    (scaled.is_finite() && scaled.abs() < i64::MAX as f64).then_some(scaled as i64)
}

/// Bidirectional modification lookup table
#[derive(Debug, Clone, Default)]
pub struct ModificationDatabase {
    by_mass: BTreeMap<i64, String>,
    by_name: HashMap<String, f64>,
    by_name_folded: HashMap<String, f64>,
    record_count: usize,
}

impl ModificationDatabase {
    /// Load from a provider
    pub fn load<P: ModificationProvider + ?Sized>(provider: &P) -> Result<Self, ModificationDbError> {
        let records = provider.records()?;
        let db = Self::from_records(records);
        info!(
            "Loaded {} modification records ({} distinct masses) from {}",
            db.record_count,
            db.by_mass.len(),
            provider.describe()
        );
        Ok(db)
    }

    /// Load the built-in table
    pub fn builtin() -> Self {
        Self::from_records(builtin_records())
    }

    /// Build the lookup tables from raw records
    pub fn from_records(records: Vec<ModificationRecord>) -> Self {
        let record_count = records.len();
        let mut buckets: BTreeMap<i64, Vec<ModificationRecord>> = BTreeMap::new();
        for record in records {
            if record.name.is_empty() {
                continue;
            }
            let Some(key) = bucket(record.mono_mass) else {
                continue;
            };
            buckets.entry(key).or_default().push(record);
        }

        let preferred: HashMap<i64, &str> = PREFERRED_NAMES
            .iter()
            .filter_map(|&(mass, name)| bucket(mass).map(|key| (key, name)))
            .collect();

        let mut db = Self {
            record_count,
            ..Default::default()
        };

        for (key, mut candidates) in buckets {
            candidates.sort_by(|a, b| {
                b.approved
                    .cmp(&a.approved)
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            });

            let canonical = preferred
                .get(&key)
                .and_then(|name| candidates.iter().find(|c| c.name == *name))
                .unwrap_or(&candidates[0]);

            if candidates.len() > 1 {
                debug!(
                    "Mass {:.4} shared by {} records, using {}",
                    key as f64 / BUCKET_SCALE,
                    candidates.len(),
                    canonical.name
                );
            }
            db.by_mass.insert(key, canonical.name.clone());

            for candidate in &candidates {
                db.by_name
                    .entry(candidate.name.clone())
                    .or_insert(candidate.mono_mass);
                db.by_name_folded
                    .entry(candidate.name.to_lowercase())
                    .or_insert(candidate.mono_mass);
            }
        }

        db
    }

    /// True if no records have been loaded
    pub fn is_empty(&self) -> bool {
        self.by_mass.is_empty()
    }

    /// Number of distinct mass buckets
    pub fn len(&self) -> usize {
        self.by_mass.len()
    }

    /// Canonical name for a mass, exact bucket first then nearest within tolerance
    pub fn lookup_name_by_mass(&self, mass: f64) -> Option<&str> {
        if self.by_mass.is_empty() {
            return None;
        }

        let key = bucket(mass)?;
        if let Some(name) = self.by_mass.get(&key) {
            return Some(name.as_str());
        }

        let span = (MASS_TOLERANCE * BUCKET_SCALE).round() as i64;
        self.by_mass
            .range(key.saturating_sub(span)..=key.saturating_add(span))
            .map(|(&k, name)| ((k as f64 / BUCKET_SCALE - mass).abs(), name))
            .filter(|(delta, _)| *delta <= MASS_TOLERANCE + f64::EPSILON)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, name)| name.as_str())
    }

    /// Mass for a name, case-sensitive first then case-insensitive
    pub fn lookup_mass_by_name(&self, name: &str) -> Option<f64> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.by_name
            .get(name)
            .or_else(|| self.by_name_folded.get(&name.to_lowercase()))
            .copied()
    }
}

fn builtin_records() -> Vec<ModificationRecord> {
    BuiltinModifications.records().unwrap_or_default()
}
