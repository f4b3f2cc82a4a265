//! # speclib converter
//!
//! Command-line front end for converting peptide spectral libraries between
//! the SQLite library-DB format and NIST MSP spectral-text.
//!
//! ## Usage
//!
//! ```bash
//! # library-DB to spectral-text (writes library.msp)
//! speclib-convert convert library.blib
//!
//! # spectral-text to library-DB, re-annotating proteins from FASTA
//! speclib-convert -v convert library.msp out.blib --fasta-dir fasta/
//!
//! # Summarise a file
//! speclib-convert info library.blib
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
