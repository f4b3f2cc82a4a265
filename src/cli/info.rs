use anyhow::{Context, Result};
use std::path::PathBuf;

use speclib::converter::inspect;

/// Display information about a library file
pub fn run(file: PathBuf) -> Result<()> {
    let summary =
        inspect(&file).with_context(|| format!("Failed to inspect {}", file.display()))?;

    println!("File: {}", file.display());
    println!("{}", summary);
    Ok(())
}
