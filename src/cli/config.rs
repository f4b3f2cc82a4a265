//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation can live in
//! a config file. Flags given on the command line win over the file:
//!
//! ```toml
//! # speclib.toml
//! [conversion]
//! min_peaks = 5
//! fasta_dir = "/data/fasta"
//! commit_interval = 5000
//! parallel_search = true
//! unimod_xml = "/data/unimod.xml"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use speclib::converter::ConversionConfig;

/// Root configuration structure for speclib.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Conversion settings; missing keys keep their defaults.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
