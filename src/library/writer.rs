//! Batched writing of library-DB files

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::{params, Connection};

use super::schema::{create_schema, finalize};
use super::LibraryError;
use crate::peaks::PeakCodec;
use crate::spectrum::{annotate_sequence, Spectrum};

/// Configuration for [`LibraryWriter`]
#[derive(Debug, Clone)]
pub struct LibraryWriterConfig {
    /// Rows per transaction
    pub commit_interval: usize,
    /// Identifier embedded in the library LSID
    pub library_id: String,
}

impl Default for LibraryWriterConfig {
    fn default() -> Self {
        Self {
            commit_interval: 1000,
            library_id: "speclib".to_string(),
        }
    }
}

/// Statistics from a completed library write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryStats {
    /// Spectrum rows written
    pub spectra_written: usize,
    /// Peaks written across all spectra
    pub peaks_written: usize,
    /// Modification rows written
    pub modifications_written: usize,
    /// Distinct protein accessions
    pub proteins_written: usize,
    /// Spectrum-to-protein links
    pub protein_links_written: usize,
    /// Transactions committed
    pub batches_committed: usize,
}

impl fmt::Display for LibraryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} spectra ({} peaks, {} modifications, {} proteins) in {} batches",
            self.spectra_written,
            self.peaks_written,
            self.modifications_written,
            self.proteins_written,
            self.batches_committed
        )
    }
}

/// Writer for a new library-DB file.
///
/// Rows are written inside a transaction that is committed every
/// `commit_interval` spectra; [`finish`](Self::finish) commits the remainder
/// and writes the metadata row.
pub struct LibraryWriter {
    conn: Connection,
    config: LibraryWriterConfig,
    score_types: HashMap<String, i64>,
    proteins: HashMap<String, i64>,
    file_id: Option<i64>,
    pending: usize,
    in_transaction: bool,
    stats: LibraryStats,
}

impl LibraryWriter {
    /// Create a library file, replacing any existing file at `path`
    pub fn create<P: AsRef<Path>>(path: P, config: LibraryWriterConfig) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        if path.exists() {
            debug!("Removing existing library {}", path.display());
            std::fs::remove_file(path)?;
        }
        for suffix in ["-wal", "-shm"] {
            let mut journal = path.as_os_str().to_os_string();
            journal.push(suffix);
            let journal = PathBuf::from(journal);
            if journal.exists() {
                debug!("Removing stale journal {}", journal.display());
                std::fs::remove_file(&journal)?;
            }
        }
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::with_connection(conn, config)
    }

    /// Create the schema on an empty connection
    pub fn with_connection(conn: Connection, config: LibraryWriterConfig) -> Result<Self, LibraryError> {
        create_schema(&conn)?;

        let score_types = {
            let mut stmt = conn.prepare("SELECT id, scoreType FROM ScoreTypes")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?)))?
                .collect::<Result<HashMap<_, _>, _>>()?;
            rows
        };

        Ok(Self {
            conn,
            config,
            score_types,
            proteins: HashMap::new(),
            file_id: None,
            pending: 0,
            in_transaction: false,
            stats: LibraryStats::default(),
        })
    }

    /// Record the source file; subsequent spectra reference it
    pub fn set_source_file(&mut self, file_name: &str) -> Result<i64, LibraryError> {
        self.conn.execute(
            "INSERT INTO SpectrumSourceFiles (fileName, idFileName, cutoffScore) VALUES (?1, ?1, 0.0)",
            params![file_name],
        )?;
        let id = self.conn.last_insert_rowid();
        self.file_id = Some(id);
        Ok(id)
    }

    /// Statistics so far
    pub fn stats(&self) -> &LibraryStats {
        &self.stats
    }

    /// Write one spectrum and return its assigned id
    pub fn write(&mut self, spectrum: &Spectrum) -> Result<i64, LibraryError> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN")?;
            self.in_transaction = true;
        }

        let score_type = match &spectrum.score_type {
            Some(name) => self.score_type_id(name)?,
            None => 0,
        };
        let modified_sequence = if spectrum.modifications.is_empty() {
            spectrum.sequence.clone()
        } else {
            annotate_sequence(&spectrum.sequence, &spectrum.modifications)
        };

        self.conn
            .prepare_cached(
                "INSERT INTO RefSpectra (
                    peptideSeq, precursorMZ, precursorCharge, peptideModSeq, prevAA, nextAA,
                    copies, numPeaks, ionMobility, collisionalCrossSectionSqA,
                    ionMobilityHighEnergyOffset, ionMobilityType, retentionTime,
                    totalIonCurrent, fileID, SpecIDinFile, score, scoreType
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?
            .execute(params![
                spectrum.sequence,
                spectrum.precursor_mz,
                spectrum.charge as i64,
                modified_sequence,
                spectrum.prev_aa.to_string(),
                spectrum.next_aa.to_string(),
                spectrum.copies.max(1) as i64,
                spectrum.peaks.len() as i64,
                spectrum.ion_mobility.unwrap_or(0.0),
                spectrum.collisional_cross_section.unwrap_or(0.0),
                if spectrum.ion_mobility.is_some() { 1i64 } else { 0 },
                spectrum.retention_time,
                spectrum.total_ion_current.unwrap_or_else(|| spectrum.peaks.total_ion_current()),
                self.file_id,
                spectrum.spec_id_in_file,
                spectrum.score,
                score_type,
            ])?;
        let id = self.conn.last_insert_rowid();

        let blobs = PeakCodec::encode_peaks(&spectrum.peaks)?;
        self.conn
            .prepare_cached(
                "INSERT INTO RefSpectraPeaks (RefSpectraID, peakMZ, peakIntensity) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![id, blobs.mz, blobs.intensity])?;

        for modification in &spectrum.modifications {
            self.conn
                .prepare_cached(
                    "INSERT INTO Modifications (RefSpectraID, position, mass) VALUES (?1, ?2, ?3)",
                )?
                .execute(params![id, modification.position as i64, modification.mass])?;
        }

        let mut linked = Vec::with_capacity(spectrum.proteins.len());
        for accession in &spectrum.proteins {
            let protein_id = self.protein_id(accession)?;
            if linked.contains(&protein_id) {
                continue;
            }
            linked.push(protein_id);
            self.conn
                .prepare_cached(
                    "INSERT INTO RefSpectraProteins (RefSpectraId, ProteinId) VALUES (?1, ?2)",
                )?
                .execute(params![id, protein_id])?;
        }

        self.stats.spectra_written += 1;
        self.stats.peaks_written += spectrum.peaks.len();
        self.stats.modifications_written += spectrum.modifications.len();
        self.stats.protein_links_written += linked.len();

        self.pending += 1;
        if self.pending >= self.config.commit_interval.max(1) {
            self.commit()?;
        }
        Ok(id)
    }

    /// Commit outstanding rows, write the metadata row and close the file
    pub fn finish(mut self) -> Result<LibraryStats, LibraryError> {
        self.commit()?;
        finalize(&self.conn, &self.config.library_id, self.stats.spectra_written)?;
        let _mode: String =
            self.conn
                .pragma_update_and_check(None, "journal_mode", "DELETE", |row| row.get(0))?;
        self.stats.proteins_written = self.proteins.len();
        info!("{}", self.stats);
        Ok(self.stats)
    }

    fn commit(&mut self) -> Result<(), LibraryError> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
            self.stats.batches_committed += 1;
            debug!(
                "Committed batch of {} spectra ({} total)",
                self.pending, self.stats.spectra_written
            );
        }
        self.pending = 0;
        Ok(())
    }

    fn score_type_id(&mut self, name: &str) -> Result<i64, LibraryError> {
        if let Some(&id) = self.score_types.get(name) {
            return Ok(id);
        }
        let next: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM ScoreTypes", [], |row| row.get(0))?;
        self.conn.execute(
            "INSERT INTO ScoreTypes (id, scoreType, probabilityType) VALUES (?1, ?2, 'NOT_A_PROBABILITY_VALUE')",
            params![next, name],
        )?;
        debug!("Added score type {} as {}", name, next);
        self.score_types.insert(name.to_string(), next);
        Ok(next)
    }

    fn protein_id(&mut self, accession: &str) -> Result<i64, LibraryError> {
        if let Some(&id) = self.proteins.get(accession) {
            return Ok(id);
        }
        self.conn
            .prepare_cached("INSERT INTO Proteins (accession) VALUES (?1)")?
            .execute(params![accession])?;
        let id = self.conn.last_insert_rowid();
        self.proteins.insert(accession.to_string(), id);
        Ok(id)
    }
}
