use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod convert;
mod info;

pub use config::Config;
pub use convert::ConvertArgs;

/// speclib - Spectral library converter (library-DB <-> spectral-text)
#[derive(Parser)]
#[command(name = "speclib-convert")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a library; direction follows the input extension
    Convert(ConvertArgs),

    /// Display information about a library file
    Info {
        /// Library-DB or spectral-text file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    /// Requested verbosity (count of -v flags)
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

/// Install env_logger with a default filter derived from the -v count.
///
/// `RUST_LOG` still takes precedence when set.
pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// Run the selected subcommand
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert(args) => convert::run(args),
        Commands::Info { file } => info::run(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["speclib-convert", "convert", "in.blib", "-v"]).unwrap();
        assert_eq!(cli.verbosity(), 1);

        let cli = Cli::try_parse_from(["speclib-convert", "-v", "info", "lib.blib", "-v"]).unwrap();
        assert_eq!(cli.verbosity(), 2);
        assert!(matches!(cli.command, Commands::Info { .. }));

        let cli = Cli::try_parse_from(["speclib-convert", "info", "lib.blib"]).unwrap();
        assert_eq!(cli.verbosity(), 0);
    }
}
