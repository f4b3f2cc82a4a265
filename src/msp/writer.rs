//! Spectral-text entry formatting

use std::fmt::Write as _;
use std::io::Write;

use super::comment::{format_pair, format_proteins, format_quoted_pair};
use super::entry::KNOWN_COMMENT_KEYS;
use crate::modifications::{format_annotation, ModTag};
use crate::spectrum::Spectrum;

/// Format one entry, including its terminating blank line.
///
/// `tags` are the text-side modification entries for `spectrum` (0-based
/// positions), as produced by [`Reconciler::tags_for`](crate::modifications::Reconciler::tags_for).
pub fn format_entry(spectrum: &Spectrum, tags: &[ModTag]) -> String {
    let annotation = format_annotation(tags);
    let mut out = String::with_capacity(256 + spectrum.peaks.len() * 24);

    let _ = write!(out, "Name: {}/{}", spectrum.sequence, spectrum.charge);
    if !tags.is_empty() {
        let _ = write!(out, "_{}", annotation);
    }
    out.push('\n');
    let _ = writeln!(out, "MW: {:.4}", spectrum.neutral_mass());

    let mut comment = vec![
        format_pair("Parent", &format!("{:.5}", spectrum.precursor_mz)),
        format_pair("Mods", &annotation),
        format_pair(
            "Fullname",
            &format!(
                "{}.{}.{}/{}",
                spectrum.prev_aa, spectrum.sequence, spectrum.next_aa, spectrum.charge
            ),
        ),
    ];
    if let Some(rt) = spectrum.retention_time {
        comment.push(format_pair("RetentionTime", &format!("{:.4}", rt * 60.0)));
    }
    if let Some(score) = spectrum.score {
        comment.push(format_pair("Score", &score.to_string()));
    }
    if let Some(score_type) = &spectrum.score_type {
        comment.push(format_quoted_pair("ScoreType", score_type));
    }
    if let Some(tic) = spectrum.total_ion_current {
        comment.push(format_pair("TIC", &tic.to_string()));
    }
    if let Some(ccs) = spectrum.collisional_cross_section {
        comment.push(format_pair("CCS", &format!("{:.4}", ccs)));
    }
    if let Some(im) = spectrum.ion_mobility {
        comment.push(format_pair("IonMobility", &format!("{:.4}", im)));
    }
    if let Some(spec_id) = &spectrum.spec_id_in_file {
        comment.push(format_pair("SpecIDinFile", spec_id));
    }
    if !spectrum.proteins.is_empty() {
        comment.push(format_pair("Protein", &format_proteins(&spectrum.proteins)));
        if spectrum.proteins.len() > 1 {
            comment.push("MultiProtein=1".to_string());
        }
    }
    for (key, value) in &spectrum.extra {
        if !KNOWN_COMMENT_KEYS.contains(&key.as_str()) {
            comment.push(format_pair(key, value));
        }
    }
    let _ = writeln!(out, "Comment: {}", comment.join(" "));

    let mut peaks = spectrum.peaks.clone();
    peaks.sort_by_mz();
    let _ = writeln!(out, "Num peaks: {}", peaks.len());
    for peak in peaks.iter() {
        let _ = writeln!(out, "{:.5}\t{}", peak.mz, peak.intensity);
    }
    out.push('\n');
    out
}

/// Writer of spectral-text entries
pub struct MspWriter<W: Write> {
    sink: W,
    entries_written: usize,
}

impl<W: Write> MspWriter<W> {
    /// Wrap a sink
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            entries_written: 0,
        }
    }

    /// Write one entry
    pub fn write_spectrum(&mut self, spectrum: &Spectrum, tags: &[ModTag]) -> std::io::Result<()> {
        self.sink.write_all(format_entry(spectrum, tags).as_bytes())?;
        self.entries_written += 1;
        Ok(())
    }

    /// Entries written so far
    pub fn entries_written(&self) -> usize {
        self.entries_written
    }

    /// Flush and return the sink
    pub fn finish(mut self) -> std::io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
