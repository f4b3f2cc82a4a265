use anyhow::{Context, Result};
use clap::Args;
use log::info;
use std::path::PathBuf;

use speclib::converter::{ConversionConfig, SpectralLibraryConverter};

use super::Config;

/// Arguments of the convert subcommand
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input library (.blib/.sqlite/.db or .msp/.sptxt)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path (defaults to the input with the other format's extension)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Skip spectra with fewer peaks
    #[arg(short = 'm', long)]
    pub min_peaks: Option<usize>,

    /// Stop after writing this many spectra
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Directory of FASTA files used to re-annotate proteins
    #[arg(short = 'f', long, value_name = "DIR")]
    pub fasta_dir: Option<PathBuf>,

    /// unimod.xml to use instead of the built-in modification table
    #[arg(long, value_name = "FILE")]
    pub unimod: Option<PathBuf>,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Search proteins on a single thread
    #[arg(long)]
    pub no_parallel: bool,

    // === Advanced tuning flags (hidden from --help) ===
    /// Library rows per transaction
    #[arg(long, hide = true)]
    pub commit_interval: Option<usize>,

    /// Library identifier recorded in the LSID
    #[arg(long, hide = true)]
    pub library_id: Option<String>,
}

impl ConvertArgs {
    /// Resolve flags over the config file over defaults
    pub fn resolve(&self) -> Result<ConversionConfig> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?.conversion,
            None => ConversionConfig::default(),
        };
        if let Some(min_peaks) = self.min_peaks {
            config.min_peaks = min_peaks;
        }
        if self.limit.is_some() {
            config.limit = self.limit;
        }
        if self.fasta_dir.is_some() {
            config.fasta_dir = self.fasta_dir.clone();
        }
        if self.unimod.is_some() {
            config.unimod_xml = self.unimod.clone();
        }
        if self.no_parallel {
            config.parallel_search = false;
        }
        if let Some(commit_interval) = self.commit_interval {
            config.commit_interval = commit_interval.max(1);
        }
        if self.library_id.is_some() {
            config.library_id = self.library_id.clone();
        }
        Ok(config)
    }
}

/// Convert between library-DB and spectral-text
pub fn run(args: ConvertArgs) -> Result<()> {
    let config = args.resolve()?;

    info!("speclib converter");
    info!("=================");
    info!("Input:  {}", args.input.display());
    if let Some(output) = &args.output {
        info!("Output: {}", output.display());
    }
    info!("Minimum peaks: {}", config.min_peaks);
    if let Some(limit) = config.limit {
        info!("Limit: {} spectra", limit);
    }
    if let Some(dir) = &config.fasta_dir {
        info!("FASTA directory: {}", dir.display());
    }

    let converter = SpectralLibraryConverter::with_config(config);
    let stats = converter
        .convert(&args.input, args.output.as_deref())
        .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

    println!("{}", stats);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ConvertArgs,
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speclib.toml");
        std::fs::write(
            &path,
            "[conversion]\nmin_peaks = 4\nlimit = 7\nparallel_search = true\n",
        )
        .unwrap();

        let harness = Harness::parse_from([
            "speclib-convert",
            "lib.blib",
            "--config",
            path.to_str().unwrap(),
            "--min-peaks",
            "2",
            "--no-parallel",
        ]);
        let config = harness.args.resolve().unwrap();
        assert_eq!(config.min_peaks, 2);
        assert_eq!(config.limit, Some(7));
        assert!(!config.parallel_search);
    }

    #[test]
    fn test_defaults_without_flags() {
        let harness = Harness::parse_from(["speclib-convert", "lib.msp", "out.blib"]);
        assert_eq!(harness.args.output, Some(PathBuf::from("out.blib")));
        let config = harness.args.resolve().unwrap();
        assert_eq!(config.min_peaks, 1);
        assert!(config.parallel_search);
        assert!(config.fasta_dir.is_none());
    }
}
