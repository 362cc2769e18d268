use crate::dataset::{Dataset, Label};
use crate::error::Result;
use crate::extractor::{extract_labeled_records, AmbiguityPolicy};
use crate::layout::{ArchiveRef, Layout};
use crate::state;
use crate::ui::GracefulShutdown;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub name: String,
    pub ham: usize,
    pub spam: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub output_path: PathBuf,
    pub archives: Vec<ArchiveSummary>,
    pub total_records: usize,
    pub ham: usize,
    pub spam: usize,
    pub bytes: u64,
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Skipped { path: PathBuf },
    Built(BuildSummary),
}

#[derive(Debug, Clone)]
pub struct AggregationProgress {
    pub archives_processed: usize,
    pub total_archives: usize,
    pub current_archive: Option<String>,
    pub records: usize,
}

pub struct Aggregator {
    policy: AmbiguityPolicy,
    shutdown: Option<GracefulShutdown>,
}

impl Aggregator {
    pub fn new(policy: AmbiguityPolicy) -> Self {
        Self {
            policy,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Builds and saves the dataset unless the output file already exists.
    ///
    /// An existing output is never inspected, refreshed or appended to. On any
    /// failure no output file is written.
    pub fn build_dataset_if_absent(
        &self,
        layout: &Layout,
        progress_callback: Option<&dyn Fn(&AggregationProgress)>,
    ) -> Result<BuildOutcome> {
        if state::dataset_present(layout) {
            info!(path = %layout.dataset_path.display(), "dataset already present, skipping build");
            return Ok(BuildOutcome::Skipped {
                path: layout.dataset_path.clone(),
            });
        }

        let start_time = Instant::now();
        let (dataset, archives) = self.aggregate(&layout.archives, progress_callback)?;

        dataset.save_atomic(&layout.dataset_path)?;
        info!(
            path = %layout.dataset_path.display(),
            records = dataset.len(),
            "dataset written"
        );

        Ok(BuildOutcome::Built(BuildSummary {
            output_path: layout.dataset_path.clone(),
            archives,
            total_records: dataset.len(),
            ham: dataset.count(Label::Ham),
            spam: dataset.count(Label::Spam),
            bytes: dataset.total_bytes(),
            duration: start_time.elapsed(),
        }))
    }

    /// Extracts each archive in order and concatenates the records.
    pub fn aggregate(
        &self,
        archives: &[ArchiveRef],
        progress_callback: Option<&dyn Fn(&AggregationProgress)>,
    ) -> Result<(Dataset, Vec<ArchiveSummary>)> {
        let mut dataset = Dataset::new();
        let mut summaries = Vec::with_capacity(archives.len());
        let mut progress = AggregationProgress {
            archives_processed: 0,
            total_archives: archives.len(),
            current_archive: None,
            records: 0,
        };

        for archive in archives {
            if let Some(ref shutdown) = self.shutdown {
                shutdown.check_shutdown()?;
            }

            progress.current_archive = Some(archive.name.clone());
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let records = extract_labeled_records(&archive.path, self.policy)?;
            let summary = ArchiveSummary {
                name: archive.name.clone(),
                ham: records.iter().filter(|r| r.class == Label::Ham).count(),
                spam: records.iter().filter(|r| r.class == Label::Spam).count(),
                bytes: records.iter().map(|r| r.message.len() as u64).sum(),
            };
            debug!(
                archive = %archive.name,
                ham = summary.ham,
                spam = summary.spam,
                "archive extracted"
            );

            progress.records += records.len();
            progress.archives_processed += 1;
            dataset.append(records);
            summaries.push(summary);
        }

        progress.current_archive = None;
        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok((dataset, summaries))
    }
}
