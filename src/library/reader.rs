//! Paged reading of library-DB spectra

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use log::{debug, warn};
use rusqlite::{params, Connection, OpenFlags, Row};

use super::schema::{read_library_info, LibraryInfo, SchemaProfile};
use super::LibraryError;
use crate::peaks::{PeakBlobs, PeakCodec};
use crate::spectrum::{Modification, PeakList, Spectrum, NO_FLANKING_RESIDUE};

/// Spectra fetched per query
const PAGE_SIZE: i64 = 500;

/// One spectrum row with its peaks still encoded
#[derive(Debug, Clone)]
pub struct LibraryRecord {
    /// Spectrum id
    pub id: i64,
    /// Spectrum with an empty peak list
    pub spectrum: Spectrum,
    /// Declared peak count
    pub num_peaks: usize,
    /// Encoded peaks, if the spectrum has a peaks row
    pub peak_blobs: Option<PeakBlobs>,
    /// Source file id
    pub file_id: Option<i64>,
}

impl LibraryRecord {
    /// Decode the peaks into the spectrum
    pub fn decode(mut self) -> Result<Spectrum, LibraryError> {
        let blobs = self.peak_blobs.take().ok_or(LibraryError::MissingPeaks(self.id))?;
        let peaks = PeakCodec::decode(&blobs.mz, &blobs.intensity, self.num_peaks)?;
        if peaks.len() != self.num_peaks {
            warn!(
                "Spectrum {} declares {} peaks but {} were decoded",
                self.id,
                self.num_peaks,
                peaks.len()
            );
        }
        self.spectrum.peaks = peaks;
        Ok(self.spectrum)
    }
}

/// Reader over an existing library-DB file
pub struct LibraryReader {
    conn: Connection,
    profile: SchemaProfile,
    score_types: HashMap<i64, String>,
    info: Option<LibraryInfo>,
}

impl LibraryReader {
    /// Open a library file read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LibraryError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::from_connection(conn)
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection) -> Result<Self, LibraryError> {
        let profile = SchemaProfile::probe(&conn)?;

        let score_types = if profile.has_score_types_table {
            let mut stmt = conn.prepare("SELECT id, scoreType FROM ScoreTypes")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter()
                .filter_map(|(id, name)| name.map(|n| (id, n)))
                .collect()
        } else {
            HashMap::new()
        };

        let info = if profile.has_lib_info {
            read_library_info(&conn)?
        } else {
            None
        };

        let reader = Self {
            conn,
            profile,
            score_types,
            info,
        };

        if let Some(info) = &reader.info {
            let actual = reader.spectrum_count()?;
            if info.num_specs != actual as i64 {
                warn!(
                    "Library declares {} spectra but contains {}",
                    info.num_specs, actual
                );
            }
        }
        Ok(reader)
    }

    /// Schema capabilities of this file
    pub fn profile(&self) -> &SchemaProfile {
        &self.profile
    }

    /// The `LibInfo` row, if present
    pub fn info(&self) -> Option<&LibraryInfo> {
        self.info.as_ref()
    }

    /// Score type names by id
    pub fn score_types(&self) -> &HashMap<i64, String> {
        &self.score_types
    }

    /// Number of spectrum rows
    pub fn spectrum_count(&self) -> Result<usize, LibraryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM RefSpectra", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of distinct protein accessions
    pub fn protein_count(&self) -> Result<usize, LibraryError> {
        if !self.profile.has_proteins {
            return Ok(0);
        }
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Proteins", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Names of the score types referenced by at least one spectrum
    pub fn used_score_types(&self) -> Result<Vec<String>, LibraryError> {
        if !self.profile.has_score_type {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT scoreType FROM RefSpectra WHERE scoreType IS NOT NULL")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids
            .into_iter()
            .map(|id| {
                self.score_types
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", id))
            })
            .collect())
    }

    /// Distinct unmodified peptide sequences
    pub fn peptide_sequences(&self) -> Result<Vec<String>, LibraryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT peptideSeq FROM RefSpectra WHERE peptideSeq IS NOT NULL")?;
        let sequences = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sequences)
    }

    /// Iterate over all spectra in id order
    pub fn spectra(&self) -> SpectrumIter<'_> {
        SpectrumIter::new(self)
    }

    /// Read every spectrum into memory
    pub fn read_all(&self) -> Result<Vec<LibraryRecord>, LibraryError> {
        self.spectra().collect()
    }

    fn spectrum_sql(&self) -> String {
        let columns: Vec<String> = self
            .profile
            .spectrum_columns()
            .iter()
            .map(|c| format!("r.{c} AS {c}"))
            .collect();
        format!(
            "SELECT {}, p.peakMZ AS peakMZ, p.peakIntensity AS peakIntensity
             FROM RefSpectra r LEFT JOIN RefSpectraPeaks p ON p.RefSpectraID = r.id
             WHERE r.id > ?1 ORDER BY r.id LIMIT ?2",
            columns.join(", ")
        )
    }

    fn record_from_row(&self, row: &Row<'_>) -> Result<LibraryRecord, rusqlite::Error> {
        let id: i64 = row.get("id")?;
        let profile = &self.profile;

        let optional_f64 = |present: bool, column: &str| -> Result<Option<f64>, rusqlite::Error> {
            if present {
                row.get::<_, Option<f64>>(column)
            } else {
                Ok(None)
            }
        };

        let sequence: String = row.get::<_, Option<String>>("peptideSeq")?.unwrap_or_default();
        let modified_sequence = row
            .get::<_, Option<String>>("peptideModSeq")?
            .unwrap_or_else(|| sequence.clone());

        let score_type = if profile.has_score_type {
            row.get::<_, Option<i64>>("scoreType")?
                .filter(|&id| id != 0)
                .and_then(|id| self.score_types.get(&id).cloned())
        } else {
            None
        };

        let spec_id_in_file = if profile.has_spec_id_in_file {
            // Stored as text by some writers and as an integer by others
            row.get::<_, Option<rusqlite::types::Value>>("SpecIDinFile")?
                .and_then(|value| match value {
                    rusqlite::types::Value::Text(s) if !s.is_empty() => Some(s),
                    rusqlite::types::Value::Integer(i) => Some(i.to_string()),
                    rusqlite::types::Value::Real(f) => Some(f.to_string()),
                    _ => None,
                })
        } else {
            None
        };

        let spectrum = Spectrum {
            modified_sequence,
            precursor_mz: row.get::<_, Option<f64>>("precursorMZ")?.unwrap_or_default(),
            charge: row
                .get::<_, Option<i64>>("precursorCharge")?
                .unwrap_or_default()
                .max(0) as u32,
            retention_time: optional_f64(profile.has_retention_time, "retentionTime")?,
            score: optional_f64(profile.has_score, "score")?,
            score_type,
            total_ion_current: optional_f64(profile.has_tic, "totalIonCurrent")?,
            ion_mobility: optional_f64(profile.has_ion_mobility, "ionMobility")?
                .filter(|&v| v != 0.0),
            collisional_cross_section: optional_f64(profile.has_ccs, "collisionalCrossSectionSqA")?
                .filter(|&v| v != 0.0),
            spec_id_in_file,
            prev_aa: flanking(row.get::<_, Option<String>>("prevAA")?),
            next_aa: flanking(row.get::<_, Option<String>>("nextAA")?),
            copies: row.get::<_, Option<i64>>("copies")?.unwrap_or(1).max(0) as u32,
            modifications: Vec::new(),
            proteins: Vec::new(),
            peaks: PeakList::default(),
            extra: Vec::new(),
            sequence,
        };

        let mz: Option<Vec<u8>> = row.get("peakMZ")?;
        let intensity: Option<Vec<u8>> = row.get("peakIntensity")?;
        let peak_blobs = match (mz, intensity) {
            (Some(mz), Some(intensity)) => Some(PeakBlobs { mz, intensity }),
            _ => None,
        };

        Ok(LibraryRecord {
            id,
            spectrum,
            num_peaks: row.get::<_, Option<i64>>("numPeaks")?.unwrap_or_default().max(0) as usize,
            peak_blobs,
            file_id: if profile.has_file_id {
                row.get::<_, Option<i64>>("fileID")?
            } else {
                None
            },
        })
    }

    fn read_page(&self, after_id: i64) -> Result<Vec<LibraryRecord>, LibraryError> {
        let mut stmt = self.conn.prepare_cached(&self.spectrum_sql())?;
        let mut records = stmt
            .query_map(params![after_id, PAGE_SIZE], |row| self.record_from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        let (first_id, last_id) = match (records.first(), records.last()) {
            (Some(first), Some(last)) => (first.id, last.id),
            _ => return Ok(records),
        };

        let mut modifications: HashMap<i64, Vec<Modification>> = HashMap::new();
        let mut stmt = self.conn.prepare_cached(
            "SELECT RefSpectraID, position, mass FROM Modifications
             WHERE RefSpectraID BETWEEN ?1 AND ?2 ORDER BY RefSpectraID, position",
        )?;
        let rows = stmt.query_map(params![first_id, last_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;
        for row in rows {
            match row? {
                (spectrum_id, Some(position), Some(mass)) if position > 0 => {
                    modifications
                        .entry(spectrum_id)
                        .or_default()
                        .push(Modification::new(position as usize, mass));
                }
                (spectrum_id, position, mass) => {
                    warn!(
                        "Ignoring modification on spectrum {} with position {:?} and mass {:?}",
                        spectrum_id, position, mass
                    );
                }
            }
        }

        let mut proteins: HashMap<i64, Vec<String>> = HashMap::new();
        if self.profile.has_proteins {
            let mut stmt = self.conn.prepare_cached(
                "SELECT rp.RefSpectraId, pr.accession FROM RefSpectraProteins rp
                 JOIN Proteins pr ON pr.id = rp.ProteinId
                 WHERE rp.RefSpectraId BETWEEN ?1 AND ?2 ORDER BY rp.RefSpectraId, pr.id",
            )?;
            let rows = stmt.query_map(params![first_id, last_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
            for row in rows {
                if let (spectrum_id, Some(accession)) = row? {
                    proteins.entry(spectrum_id).or_default().push(accession);
                }
            }
        }

        for record in &mut records {
            if let Some(mods) = modifications.remove(&record.id) {
                record.spectrum.modifications = mods;
                let folded = record.spectrum.normalize_modifications();
                if folded > 0 {
                    warn!(
                        "Spectrum {} has {} modification rows sharing a position, summing their masses",
                        record.id, folded
                    );
                }
            }
            if let Some(accessions) = proteins.remove(&record.id) {
                record.spectrum.proteins = accessions;
            }
        }

        debug!("Read spectra {}..={}", first_id, last_id);
        Ok(records)
    }
}

fn flanking(value: Option<String>) -> char {
    value
        .and_then(|s| s.chars().next())
        .unwrap_or(NO_FLANKING_RESIDUE)
}

/// Iterator over library spectra, fetching a page at a time
pub struct SpectrumIter<'r> {
    reader: &'r LibraryReader,
    buffer: VecDeque<LibraryRecord>,
    last_id: i64,
    done: bool,
}

impl<'r> SpectrumIter<'r> {
    fn new(reader: &'r LibraryReader) -> Self {
        Self {
            reader,
            buffer: VecDeque::new(),
            last_id: i64::MIN,
            done: false,
        }
    }
}

impl Iterator for SpectrumIter<'_> {
    type Item = Result<LibraryRecord, LibraryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            match self.reader.read_page(self.last_id) {
                Ok(page) => {
                    if (page.len() as i64) < PAGE_SIZE {
                        self.done = true;
                    }
                    if let Some(last) = page.last() {
                        self.last_id = last.id;
                    }
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
