//! # Spectrum data model
//!
//! The format-neutral representation every codec reads into and writes out of.
//! A [`Spectrum`] is one library entry: a peptide precursor at a given charge
//! and modification state, together with its fragment peak list.
//!
//! Positions inside [`Modification`] are 1-based with respect to the
//! unmodified sequence, matching the library-DB convention.

use std::fmt;

/// Mass of a proton in Daltons
pub const PROTON_MASS: f64 = 1.007276;

/// Sentinel written for a missing flanking residue
pub const NO_FLANKING_RESIDUE: char = '-';

/// A single fragment peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Mass-to-charge ratio
    pub mz: f64,
    /// Signal intensity
    pub intensity: f32,
}

/// Peak list stored as parallel arrays.
///
/// Both arrays always have the same length; constructors that receive
/// mismatched input truncate to the shorter one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakList {
    /// m/z values
    pub mz: Vec<f64>,
    /// Intensity values
    pub intensity: Vec<f32>,
}

impl PeakList {
    /// Create a peak list from parallel arrays, truncating to the shorter one
    pub fn new(mut mz: Vec<f64>, mut intensity: Vec<f32>) -> Self {
        let len = mz.len().min(intensity.len());
        mz.truncate(len);
        intensity.truncate(len);
        Self { mz, intensity }
    }

    /// Create a peak list with room for `capacity` peaks
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mz: Vec::with_capacity(capacity),
            intensity: Vec::with_capacity(capacity),
        }
    }

    /// Append a peak
    pub fn push(&mut self, mz: f64, intensity: f32) {
        self.mz.push(mz);
        self.intensity.push(intensity);
    }

    /// Number of peaks
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// True if there are no peaks
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Iterate over the peaks in storage order
    pub fn iter(&self) -> impl Iterator<Item = Peak> + '_ {
        self.mz
            .iter()
            .zip(self.intensity.iter())
            .map(|(&mz, &intensity)| Peak { mz, intensity })
    }

    /// Sort peaks ascending by m/z
    pub fn sort_by_mz(&mut self) {
        if self.mz.windows(2).all(|w| w[0] <= w[1]) {
            return;
        }
        let mut peaks: Vec<Peak> = self.iter().collect();
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        self.mz = peaks.iter().map(|p| p.mz).collect();
        self.intensity = peaks.iter().map(|p| p.intensity).collect();
    }

    /// Sum of all intensities
    pub fn total_ion_current(&self) -> f64 {
        self.intensity.iter().map(|&i| i as f64).sum()
    }
}

impl FromIterator<Peak> for PeakList {
    fn from_iter<T: IntoIterator<Item = Peak>>(iter: T) -> Self {
        let mut list = PeakList::default();
        for peak in iter {
            list.push(peak.mz, peak.intensity);
        }
        list
    }
}

/// A mass delta attached to one residue of a peptide
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    /// 1-based position within the unmodified sequence
    pub position: usize,
    /// Residue at `position`, when known
    pub residue: Option<char>,
    /// Monoisotopic delta mass in Daltons
    pub mass: f64,
    /// Resolved modification name
    pub name: Option<String>,
}

impl Modification {
    /// Create a modification from a position and mass
    pub fn new(position: usize, mass: f64) -> Self {
        Self {
            position,
            residue: None,
            mass,
            name: None,
        }
    }

    /// Set the resolved name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the residue
    pub fn with_residue(mut self, residue: char) -> Self {
        self.residue = Some(residue);
        self
    }
}

/// One library entry
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Unmodified peptide sequence (letters only)
    pub sequence: String,
    /// Sequence with embedded modification markup
    pub modified_sequence: String,
    /// Precursor m/z
    pub precursor_mz: f64,
    /// Precursor charge
    pub charge: u32,
    /// Retention time in minutes
    pub retention_time: Option<f64>,
    /// Identification score
    pub score: Option<f64>,
    /// Name of the score type
    pub score_type: Option<String>,
    /// Total ion current
    pub total_ion_current: Option<f64>,
    /// Ion mobility value
    pub ion_mobility: Option<f64>,
    /// Collision cross-section in square Angstrom
    pub collisional_cross_section: Option<f64>,
    /// Identifier of the spectrum in its source file
    pub spec_id_in_file: Option<String>,
    /// Residue preceding the peptide in the protein
    pub prev_aa: char,
    /// Residue following the peptide in the protein
    pub next_aa: char,
    /// Number of spectra this entry was built from
    pub copies: u32,
    /// Modifications, ascending by position
    pub modifications: Vec<Modification>,
    /// Protein accessions containing this peptide
    pub proteins: Vec<String>,
    /// Fragment peaks
    pub peaks: PeakList,
    /// Unrecognised text-side attributes, preserved in order
    pub extra: Vec<(String, String)>,
}

impl Spectrum {
    /// Number of peaks
    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    /// Neutral mass derived from precursor m/z and charge
    pub fn neutral_mass(&self) -> f64 {
        neutral_mass(self.precursor_mz, self.charge)
    }

    /// Sort modifications by position, folding entries that share a position
    /// into one whose mass is their sum.
    ///
    /// Returns the number of entries folded away. A folded entry loses its
    /// name, since the summed delta no longer names a single modification.
    pub fn normalize_modifications(&mut self) -> usize {
        let folded = fold_shared_positions(&mut self.modifications);
        for modification in &mut self.modifications {
            if let Some(residue) = residue_at(&self.sequence, modification.position) {
                modification.residue = Some(residue);
            }
        }
        folded
    }
}

impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (m/z {:.4}, {} mods, {} peaks)",
            self.sequence,
            self.charge,
            self.precursor_mz,
            self.modifications.len(),
            self.peaks.len()
        )
    }
}

/// Sort by position and sum the masses of entries sharing a position.
///
/// Returns how many entries were folded away; a folded entry loses its name.
pub fn fold_shared_positions(modifications: &mut Vec<Modification>) -> usize {
    modifications.sort_by_key(|m| m.position);
    let before = modifications.len();
    modifications.dedup_by(|later, kept| {
        if later.position != kept.position {
            return false;
        }
        kept.mass += later.mass;
        kept.name = None;
        true
    });
    before - modifications.len()
}

/// Residue at a 1-based position
pub fn residue_at(sequence: &str, position: usize) -> Option<char> {
    if position == 0 {
        return None;
    }
    sequence.chars().nth(position - 1)
}

/// `MW = mz * z - z * proton`
pub fn neutral_mass(precursor_mz: f64, charge: u32) -> f64 {
    let z = charge as f64;
    precursor_mz * z - z * PROTON_MASS
}

/// Inverse of [`neutral_mass`]
pub fn precursor_mz_from_mass(mass: f64, charge: u32) -> Option<f64> {
    if charge == 0 {
        return None;
    }
    let z = charge as f64;
    Some((mass + z * PROTON_MASS) / z)
}

/// Strip modification markup, keeping only uppercase residue letters.
///
/// Bracketed and parenthesised annotations are removed with their contents,
/// so `M[+16.0]LQGR` and `M(ox)LQGR` both become `MLQGR`. Terminal markers
/// (`n[+42.0]PEPTIDE`, `PEPTIDEc[-1.0]`) go with their annotation.
pub fn strip_modifications(sequence: &str) -> String {
    let mut out = String::with_capacity(sequence.len());
    let mut depth = 0usize;
    let mut chars = sequence.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let marker = depth == 0 && chars.peek().map(|&(_, next)| next) == Some('[');
        match c {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            'n' if marker && i == 0 => {}
            'c' if marker && !has_residue_after(&sequence[i + 1..]) => {}
            c if depth == 0 && c.is_ascii_alphabetic() => out.push(c.to_ascii_uppercase()),
            _ => {}
        }
    }
    out
}

/// Whether any unbracketed residue letter appears in `rest`
fn has_residue_after(rest: &str) -> bool {
    let mut depth = 0usize;
    rest.chars().any(|c| match c {
        '[' | '(' | '{' => {
            depth += 1;
            false
        }
        ']' | ')' | '}' => {
            depth = depth.saturating_sub(1);
            false
        }
        c => depth == 0 && c.is_ascii_alphabetic(),
    })
}

/// Build the bracketed-delta annotated sequence, e.g. `M[+16.0]LQGR`
pub fn annotate_sequence(sequence: &str, modifications: &[Modification]) -> String {
    let mut out = String::with_capacity(sequence.len() + modifications.len() * 8);
    for (i, residue) in sequence.chars().enumerate() {
        out.push(residue);
        for modification in modifications.iter().filter(|m| m.position == i + 1) {
            out.push_str(&format!("[{:+.1}]", modification.mass));
        }
    }
    out
}

/// Builder for [`Spectrum`]
pub struct SpectrumBuilder {
    spectrum: Spectrum,
}

impl SpectrumBuilder {
    /// Start a spectrum with the required sequence, precursor m/z and charge
    pub fn new(sequence: impl Into<String>, precursor_mz: f64, charge: u32) -> Self {
        let sequence = sequence.into();
        Self {
            spectrum: Spectrum {
                modified_sequence: sequence.clone(),
                sequence,
                precursor_mz,
                charge,
                retention_time: None,
                score: None,
                score_type: None,
                total_ion_current: None,
                ion_mobility: None,
                collisional_cross_section: None,
                spec_id_in_file: None,
                prev_aa: NO_FLANKING_RESIDUE,
                next_aa: NO_FLANKING_RESIDUE,
                copies: 1,
                modifications: Vec::new(),
                proteins: Vec::new(),
                peaks: PeakList::default(),
                extra: Vec::new(),
            },
        }
    }

    /// Set the annotated sequence
    pub fn modified_sequence(mut self, modified: impl Into<String>) -> Self {
        self.spectrum.modified_sequence = modified.into();
        self
    }

    /// Set the retention time in minutes
    pub fn retention_time(mut self, minutes: f64) -> Self {
        self.spectrum.retention_time = Some(minutes);
        self
    }

    /// Set the score and its type name
    pub fn score(mut self, score: f64, score_type: impl Into<String>) -> Self {
        self.spectrum.score = Some(score);
        self.spectrum.score_type = Some(score_type.into());
        self
    }

    /// Set the total ion current
    pub fn total_ion_current(mut self, tic: f64) -> Self {
        self.spectrum.total_ion_current = Some(tic);
        self
    }

    /// Set the flanking residues
    pub fn flanking(mut self, prev_aa: char, next_aa: char) -> Self {
        self.spectrum.prev_aa = prev_aa;
        self.spectrum.next_aa = next_aa;
        self
    }

    /// Add a modification
    pub fn modification(mut self, modification: Modification) -> Self {
        self.spectrum.modifications.push(modification);
        self
    }

    /// Add a protein accession
    pub fn protein(mut self, accession: impl Into<String>) -> Self {
        self.spectrum.proteins.push(accession.into());
        self
    }

    /// Add a single peak
    pub fn add_peak(mut self, mz: f64, intensity: f32) -> Self {
        self.spectrum.peaks.push(mz, intensity);
        self
    }

    /// Replace the peak list
    pub fn peaks(mut self, peaks: PeakList) -> Self {
        self.spectrum.peaks = peaks;
        self
    }

    /// Finish the spectrum; modifications are sorted and the annotated
    /// sequence is derived if none was given
    pub fn build(mut self) -> Spectrum {
        self.spectrum.normalize_modifications();
        if self.spectrum.modified_sequence == self.spectrum.sequence
            && !self.spectrum.modifications.is_empty()
        {
            self.spectrum.modified_sequence =
                annotate_sequence(&self.spectrum.sequence, &self.spectrum.modifications);
        }
        self.spectrum
    }
}
