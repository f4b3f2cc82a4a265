use std::collections::HashMap;
use std::fmt;

/// Running counts of modifications seen during a conversion
#[derive(Debug, Clone, Default)]
pub struct ModificationTally {
    known: HashMap<(String, char), (f64, usize)>,
    unknown: HashMap<(String, char), usize>,
}

/// One row of a tally summary
#[derive(Debug, Clone, PartialEq)]
pub struct TallyEntry {
    /// Modification name, or formatted mass for unknown entries
    pub label: String,
    /// Delta mass
    pub mass: f64,
    /// Residue the modification was seen on
    pub site: char,
    /// Number of occurrences
    pub count: usize,
}

impl ModificationTally {
    /// Count a modification resolved to a database name
    pub fn record_known(&mut self, name: &str, mass: f64, site: char) {
        self.known
            .entry((name.to_string(), site))
            .or_insert((mass, 0))
            .1 += 1;
    }

    /// Count a modification whose mass is not in the database
    pub fn record_unknown(&mut self, mass: f64, site: char) {
        *self.unknown.entry((format!("{:.4}", mass), site)).or_insert(0) += 1;
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.unknown.is_empty()
    }

    /// Total number of known occurrences
    pub fn known_total(&self) -> usize {
        self.known.values().map(|(_, count)| count).sum()
    }

    /// Total number of unknown occurrences
    pub fn unknown_total(&self) -> usize {
        self.unknown.values().sum()
    }

    /// Known modifications, most frequent first
    pub fn known_summary(&self) -> Vec<TallyEntry> {
        let entries = self
            .known
            .iter()
            .map(|((name, site), &(mass, count))| TallyEntry {
                label: name.clone(),
                mass,
                site: *site,
                count,
            })
            .collect();
        sort_entries(entries)
    }

    /// Unknown masses, most frequent first
    pub fn unknown_summary(&self) -> Vec<TallyEntry> {
        let entries = self
            .unknown
            .iter()
            .map(|((mass, site), &count)| TallyEntry {
                label: mass.clone(),
                mass: mass.parse().unwrap_or(0.0),
                site: *site,
                count,
            })
            .collect();
        sort_entries(entries)
    }

    /// Fold another tally into this one
    pub fn merge(&mut self, other: ModificationTally) {
        for (key, (mass, count)) in other.known {
            self.known.entry(key).or_insert((mass, 0)).1 += count;
        }
        for (key, count) in other.unknown {
            *self.unknown.entry(key).or_insert(0) += count;
        }
    }
}

fn sort_entries(mut entries: Vec<TallyEntry>) -> Vec<TallyEntry> {
    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.site.cmp(&b.site))
    });
    entries
}

impl fmt::Display for ModificationTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Modifications ({} occurrences):", self.known_total())?;
        for entry in self.known_summary() {
            writeln!(
                f,
                "  {:<24} {:>10.4} on {}: {}",
                entry.label, entry.mass, entry.site, entry.count
            )?;
        }
        if !self.unknown.is_empty() {
            writeln!(f, "Unknown modification masses ({} occurrences):", self.unknown_total())?;
            for entry in self.unknown_summary() {
                writeln!(f, "  {:>10} on {}: {}", entry.label, entry.site, entry.count)?;
            }
        }
        Ok(())
    }
}
