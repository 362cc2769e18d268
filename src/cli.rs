use crate::config::{CliOverrides, Config};
use crate::error::{Result, UserFriendlyError};
use crate::extractor::AmbiguityPolicy;
use crate::fetcher::parse_base_url;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "enron-prep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download the Enron-Spam corpus and build a labeled email dataset")]
#[command(
    long_about = "enron-prep downloads the six preprocessed Enron-Spam archives into \
                  ~/Downloads/Enron emails, labels every message by its ham/ or spam/ \
                  folder and saves the result as ~/Downloads/emails.pickle. Steps whose \
                  output already exists are skipped."
)]
#[command(after_help = "EXAMPLES:\n  \
    enron-prep\n  \
    enron-prep --downloads-dir /srv/corpora --verify-archives\n  \
    enron-prep --on-ambiguous both -v\n  \
    enron-prep --dry-run\n  \
    enron-prep --generate-config --config enron-prep.toml")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Directory holding the archive folder and the dataset (defaults to ~/Downloads)
    #[arg(short, long)]
    pub downloads_dir: Option<PathBuf>,

    /// Remote directory the archives are fetched from
    #[arg(long, value_parser = validate_base_url)]
    pub base_url: Option<String>,

    /// How to label entries whose path contains both ham and spam
    #[arg(long, value_enum)]
    pub on_ambiguous: Option<AmbiguityPolicy>,

    /// Check that present archives decompress, downloading corrupt ones again
    #[arg(long)]
    pub verify_archives: bool,

    /// Per-archive download timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Show the detected state and plan without downloading or writing")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        // The flag can only switch verification on; the config file decides otherwise.
        let verify_archives = if self.verify_archives { Some(true) } else { None };

        CliOverrides::new()
            .with_downloads_dir(self.downloads_dir.clone())
            .with_base_url(self.base_url.clone())
            .with_on_ambiguous(self.on_ambiguous)
            .with_verify_archives(verify_archives)
            .with_timeout(self.timeout)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

pub fn validate_base_url(s: &str) -> std::result::Result<String, String> {
    parse_base_url(s)
        .map(|url| url.to_string())
        .map_err(|e| e.user_message())
}
