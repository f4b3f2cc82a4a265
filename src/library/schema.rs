//! Library-DB schema creation and probing

use std::collections::HashSet;

use chrono::Local;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::LibraryError;

/// Schema version written to `LibInfo`
pub const MAJOR_VERSION: i64 = 1;
/// Schema minor version written to `LibInfo`
pub const MINOR_VERSION: i64 = 10;

/// Spectrum table name
const SPECTRA_TABLE: &str = "RefSpectra";
/// Peaks table name
const PEAKS_TABLE: &str = "RefSpectraPeaks";
/// Score type lookup table name
const SCORE_TYPES_TABLE: &str = "ScoreTypes";
/// Protein table name
const PROTEINS_TABLE: &str = "Proteins";
/// Spectrum-to-protein join table name
const SPECTRUM_PROTEINS_TABLE: &str = "RefSpectraProteins";

const SCHEMA_SQL: &str = "
CREATE TABLE LibInfo (
    libLSID TEXT,
    createTime TEXT,
    numSpecs INTEGER,
    majorVersion INTEGER,
    minorVersion INTEGER
);
CREATE TABLE RefSpectra (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    peptideSeq VARCHAR(150),
    precursorMZ REAL,
    precursorCharge INTEGER,
    peptideModSeq VARCHAR(200),
    prevAA CHAR(1),
    nextAA CHAR(1),
    copies INTEGER,
    numPeaks INTEGER,
    ionMobility REAL,
    collisionalCrossSectionSqA REAL,
    ionMobilityHighEnergyOffset REAL,
    ionMobilityType TINYINT,
    retentionTime REAL,
    startTime REAL,
    endTime REAL,
    totalIonCurrent REAL,
    moleculeName VARCHAR(128),
    chemicalFormula VARCHAR(128),
    precursorAdduct VARCHAR(128),
    inchiKey VARCHAR(128),
    otherKeys VARCHAR(128),
    fileID INTEGER,
    SpecIDinFile VARCHAR(256),
    score REAL,
    scoreType TINYINT
);
CREATE TABLE RefSpectraPeaks (
    RefSpectraID INTEGER,
    peakMZ BLOB,
    peakIntensity BLOB
);
CREATE TABLE Modifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    RefSpectraID INTEGER,
    position INTEGER,
    mass REAL
);
CREATE TABLE ScoreTypes (
    id INTEGER PRIMARY KEY,
    scoreType VARCHAR(128),
    probabilityType VARCHAR(128)
);
CREATE TABLE SpectrumSourceFiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    fileName VARCHAR(512),
    idFileName VARCHAR(512),
    cutoffScore REAL
);
CREATE TABLE IonMobilityTypes (
    id INTEGER PRIMARY KEY,
    ionMobilityType VARCHAR(128)
);
CREATE TABLE Proteins (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    accession VARCHAR(200)
);
CREATE TABLE RefSpectraProteins (
    RefSpectraId INTEGER,
    ProteinId INTEGER
);
CREATE INDEX idxPeptide ON RefSpectra (peptideSeq, precursorCharge);
CREATE INDEX idxPeptideMod ON RefSpectra (peptideModSeq, precursorCharge);
CREATE INDEX idxRefIdPeaks ON RefSpectraPeaks (RefSpectraID);
CREATE INDEX idxModRefId ON Modifications (RefSpectraID);
CREATE INDEX idxRefSpectraProteins ON RefSpectraProteins (RefSpectraId);
";

/// Standard score types; id 0 is the unknown sentinel
pub const SCORE_TYPES: &[(i64, &str, &str)] = &[
    (0, "UNKNOWN", "NOT_A_PROBABILITY_VALUE"),
    (1, "PERCOLATOR QVALUE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (2, "PEPTIDE PROPHET SOMETHING", "PROBABILITY_THAT_IDENTIFICATION_IS_CORRECT"),
    (3, "SPECTRUM MILL", "NOT_A_PROBABILITY_VALUE"),
    (4, "IDPICKER FDR", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (5, "MASCOT IONS SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (6, "TANDEM EXPECTATION VALUE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (7, "PROTEIN PILOT CONFIDENCE", "PROBABILITY_THAT_IDENTIFICATION_IS_CORRECT"),
    (8, "SCAFFOLD SOMETHING", "PROBABILITY_THAT_IDENTIFICATION_IS_CORRECT"),
    (9, "WATERS MSE PEPTIDE SCORE", "NOT_A_PROBABILITY_VALUE"),
    (10, "OMSSA EXPECTATION SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (11, "PROTEIN PROSPECTOR EXPECTATION SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (12, "SEQUEST XCORR", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (13, "MAXQUANT SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (14, "MORPHEUS SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (15, "MSGF+ SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (16, "PEAKS CONFIDENCE SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (17, "BYONIC SCORE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
    (18, "PEPTIDE SHAKER CONFIDENCE", "PROBABILITY_THAT_IDENTIFICATION_IS_CORRECT"),
    (19, "GENERIC Q-VALUE", "PROBABILITY_THAT_IDENTIFICATION_IS_INCORRECT"),
];

const ION_MOBILITY_TYPES: &[(i64, &str)] = &[
    (0, "none"),
    (1, "driftTime(msec)"),
    (2, "inverseK0(Vsec/cm^2)"),
    (3, "compensation(V)"),
];

/// Create all tables and seed the lookup tables
pub fn create_schema(conn: &Connection) -> Result<(), LibraryError> {
    conn.execute_batch(SCHEMA_SQL)?;

    let mut stmt = conn.prepare(
        "INSERT INTO ScoreTypes (id, scoreType, probabilityType) VALUES (?1, ?2, ?3)",
    )?;
    for (id, name, probability) in SCORE_TYPES {
        stmt.execute(params![id, name, probability])?;
    }

    let mut stmt = conn.prepare("INSERT INTO IonMobilityTypes (id, ionMobilityType) VALUES (?1, ?2)")?;
    for (id, name) in ION_MOBILITY_TYPES {
        stmt.execute(params![id, name])?;
    }

    debug!("Created library schema v{}.{}", MAJOR_VERSION, MINOR_VERSION);
    Ok(())
}

/// Library identifier in LSID form
pub fn library_lsid(library_id: &str) -> String {
    format!(
        "urn:lsid:proteome.gs.washington.edu:spectral_library:bibliospec:nr:{}",
        library_id
    )
}

/// Write the single metadata row once the final count is known
pub fn finalize(conn: &Connection, library_id: &str, total_count: usize) -> Result<(), LibraryError> {
    conn.execute("DELETE FROM LibInfo", [])?;
    conn.execute(
        "INSERT INTO LibInfo (libLSID, createTime, numSpecs, majorVersion, minorVersion)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            library_lsid(library_id),
            Local::now().format("%a %b %e %H:%M:%S %Y").to_string(),
            total_count as i64,
            MAJOR_VERSION,
            MINOR_VERSION
        ],
    )?;
    Ok(())
}

/// Contents of the `LibInfo` row
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryInfo {
    /// Library LSID
    pub lsid: String,
    /// Creation timestamp as stored
    pub create_time: String,
    /// Declared spectrum count
    pub num_specs: i64,
    /// Schema major version
    pub major_version: i64,
    /// Schema minor version
    pub minor_version: i64,
}

/// Read the metadata row, if any
pub fn read_library_info(conn: &Connection) -> Result<Option<LibraryInfo>, LibraryError> {
    let info = conn
        .query_row(
            "SELECT libLSID, createTime, numSpecs, majorVersion, minorVersion FROM LibInfo LIMIT 1",
            [],
            |row| {
                Ok(LibraryInfo {
                    lsid: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    create_time: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    num_specs: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                    major_version: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                    minor_version: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
                })
            },
        )
        .optional()?;
    Ok(info)
}

/// Optional parts of the schema present in a library file.
///
/// Resolved once when a library is opened; older and newer files differ in
/// which spectrum columns and auxiliary tables they carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaProfile {
    /// `ionMobility` column
    pub has_ion_mobility: bool,
    /// `collisionalCrossSectionSqA` column
    pub has_ccs: bool,
    /// `retentionTime` column
    pub has_retention_time: bool,
    /// `totalIonCurrent` column
    pub has_tic: bool,
    /// `fileID` column
    pub has_file_id: bool,
    /// `SpecIDinFile` column
    pub has_spec_id_in_file: bool,
    /// `score` column
    pub has_score: bool,
    /// `scoreType` column
    pub has_score_type: bool,
    /// `ScoreTypes` table
    pub has_score_types_table: bool,
    /// `Proteins` and `RefSpectraProteins` tables
    pub has_proteins: bool,
    /// `LibInfo` table
    pub has_lib_info: bool,
}

/// Columns every library has
const CORE_COLUMNS: &[&str] = &[
    "id",
    "peptideSeq",
    "precursorMZ",
    "precursorCharge",
    "peptideModSeq",
    "prevAA",
    "nextAA",
    "copies",
    "numPeaks",
];

impl SchemaProfile {
    /// Inspect an open connection
    pub fn probe(conn: &Connection) -> Result<Self, LibraryError> {
        let tables = table_names(conn)?;
        if !tables.contains(SPECTRA_TABLE) {
            return Err(LibraryError::MissingTable(SPECTRA_TABLE.to_string()));
        }
        if !tables.contains(PEAKS_TABLE) {
            return Err(LibraryError::MissingTable(PEAKS_TABLE.to_string()));
        }

        let columns = column_names(conn, SPECTRA_TABLE)?;
        for core in CORE_COLUMNS {
            if !columns.contains(*core) {
                return Err(LibraryError::MissingTable(format!("{}.{}", SPECTRA_TABLE, core)));
            }
        }

        let profile = Self {
            has_ion_mobility: columns.contains("ionMobility"),
            has_ccs: columns.contains("collisionalCrossSectionSqA"),
            has_retention_time: columns.contains("retentionTime"),
            has_tic: columns.contains("totalIonCurrent"),
            has_file_id: columns.contains("fileID"),
            has_spec_id_in_file: columns.contains("SpecIDinFile"),
            has_score: columns.contains("score"),
            has_score_type: columns.contains("scoreType"),
            has_score_types_table: tables.contains(SCORE_TYPES_TABLE),
            has_proteins: tables.contains(PROTEINS_TABLE)
                && tables.contains(SPECTRUM_PROTEINS_TABLE),
            has_lib_info: tables.contains("LibInfo"),
        };
        debug!("Library schema profile: {:?}", profile);
        Ok(profile)
    }

    /// Spectrum columns to select, core columns first
    pub fn spectrum_columns(&self) -> Vec<&'static str> {
        let mut columns = CORE_COLUMNS.to_vec();
        let optional = [
            (self.has_ion_mobility, "ionMobility"),
            (self.has_ccs, "collisionalCrossSectionSqA"),
            (self.has_retention_time, "retentionTime"),
            (self.has_tic, "totalIonCurrent"),
            (self.has_file_id, "fileID"),
            (self.has_spec_id_in_file, "SpecIDinFile"),
            (self.has_score, "score"),
            (self.has_score_type, "scoreType"),
        ];
        columns.extend(optional.iter().filter(|(present, _)| *present).map(|(_, c)| *c));
        columns
    }
}

fn table_names(conn: &Connection) -> Result<HashSet<String>, LibraryError> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}

fn column_names(conn: &Connection, table: &str) -> Result<HashSet<String>, LibraryError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}
