pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod layout;
pub mod state;
pub mod ui;

#[cfg(test)]
mod test_support;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config};
pub use error::{PrepError, Result, UserFriendlyError};

// Core functionality re-exports
pub use dataset::{Aggregator, BuildOutcome, BuildSummary, Dataset, Label, LabeledRecord};
pub use extractor::{extract_labeled_records, AmbiguityPolicy, ArchiveReader};
pub use fetcher::{ArchiveFetcher, ArchiveSource, FetchSummary, HttpSource};
pub use layout::{ArchiveRef, Layout};
pub use state::PipelineState;
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use serde::Serialize;
use std::path::Path;

/// What a full run found and did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state_before: PipelineState,
    pub fetch: FetchSummary,
    pub build: BuildOutcome,
    pub state_after: PipelineState,
}

/// Main library interface: fetch the archives, then build the dataset.
pub struct EnronPrep {
    config: Config,
    layout: Layout,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl EnronPrep {
    /// Create a new instance and install the Ctrl+C handler.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Self::with_shutdown(config, output_mode, verbose, quiet, shutdown)
    }

    /// Create an instance for testing (no signal handler conflicts)
    #[cfg(test)]
    pub(crate) fn new_for_test(config: Config) -> Result<Self> {
        Self::with_shutdown(
            config,
            OutputMode::Plain,
            0,
            true,
            GracefulShutdown::new_for_test(),
        )
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Result<Self> {
        let layout = Layout::from_config(&config)?;
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Ok(Self {
            config,
            layout,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create an instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Run the whole pipeline against the configured HTTP source.
    pub fn run(&self) -> Result<RunReport> {
        let source = HttpSource::new(self.config.timeout_duration())?;
        self.run_with(source)
    }

    /// Run the whole pipeline against any archive source.
    pub fn run_with<S: ArchiveSource>(&self, source: S) -> Result<RunReport> {
        let state_before = self.state();
        tracing::debug!(state = %state_before, "detected pipeline state");
        self.output_formatter
            .debug(&format!("Archive directory: {}", self.layout.archive_dir.display()));

        let fetch = self.ensure_local_copies_with(source)?;
        self.shutdown.check_shutdown()?;

        let build = self.build_dataset_if_absent()?;

        Ok(RunReport {
            state_before,
            fetch,
            build,
            state_after: self.state(),
        })
    }

    /// Make sure every archive is present locally, downloading the missing ones.
    pub fn ensure_local_copies(&self) -> Result<FetchSummary> {
        let source = HttpSource::new(self.config.timeout_duration())?;
        self.ensure_local_copies_with(source)
    }

    pub fn ensure_local_copies_with<S: ArchiveSource>(&self, source: S) -> Result<FetchSummary> {
        let fetcher = ArchiveFetcher::new(source, &self.config.source.base_url)?
            .with_verification(self.config.fetch.verify_archives)
            .with_shutdown(self.shutdown.clone());

        let missing = state::missing_archives(&self.layout).len();
        if missing == 0 && !self.config.fetch.verify_archives {
            return fetcher.ensure_local_copies(&self.layout, None);
        }

        self.output_formatter
            .info(&format!("{} of {} archives to download", missing, self.layout.archives.len()));

        let download_progress = self.progress_manager.create_download_progress();
        let progress_callback = {
            let pb = download_progress.clone();
            move |progress: &fetcher::DownloadProgress| {
                ui::progress::update_download_progress(&pb, progress);
            }
        };

        let summary = match fetcher.ensure_local_copies(&self.layout, Some(&progress_callback)) {
            Ok(summary) => summary,
            Err(e) => {
                download_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &download_progress,
            &format!("Downloaded {} archives", summary.retrievals()),
            summary.duration,
        );

        for name in &summary.replaced {
            self.output_formatter
                .warning(&format!("{} failed verification and was downloaded again", name));
        }

        Ok(summary)
    }

    /// Build `emails.pickle` from the archives unless it already exists.
    pub fn build_dataset_if_absent(&self) -> Result<BuildOutcome> {
        let aggregator =
            Aggregator::new(self.config.labels.on_ambiguous).with_shutdown(self.shutdown.clone());

        if state::dataset_present(&self.layout) {
            return aggregator.build_dataset_if_absent(&self.layout, None);
        }

        let archive_progress = self
            .progress_manager
            .create_archive_progress(self.layout.archives.len() as u64);
        let progress_callback = {
            let pb = archive_progress.clone();
            move |progress: &dataset::AggregationProgress| {
                ui::progress::update_archive_progress(&pb, progress);
            }
        };

        let outcome = match aggregator.build_dataset_if_absent(&self.layout, Some(&progress_callback)) {
            Ok(outcome) => outcome,
            Err(e) => {
                archive_progress.abandon();
                return Err(e);
            }
        };

        if let BuildOutcome::Built(ref summary) = outcome {
            ui::progress::finish_progress_with_summary(
                &archive_progress,
                &format!("Collected {} records", summary.total_records),
                summary.duration,
            );
        }

        Ok(outcome)
    }

    /// Current pipeline state, read from the filesystem.
    pub fn state(&self) -> PipelineState {
        PipelineState::detect(&self.layout)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &PrepError) {
        self.progress_manager.clear();
        self.output_formatter.print_user_friendly_error(error);
    }
}
