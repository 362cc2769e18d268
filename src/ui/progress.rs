use crate::dataset::AggregationProgress;
use crate::fetcher::DownloadProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_download_progress(&self) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes:>7}/{total_bytes:7} {msg}"
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        );
        pb.set_message("Checking archives...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn create_archive_progress(&self, total_archives: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_archives));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>2}/{len:2} archives {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Extracting...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn clear(&self) {
        if self.enabled {
            self.multi_progress.clear().ok();
        }
    }
}

pub fn update_download_progress(pb: &ProgressBar, progress: &DownloadProgress) {
    match progress.total_bytes {
        Some(total) => pb.set_length(total),
        None => pb.set_length(progress.received_bytes),
    }
    pb.set_position(progress.received_bytes);
    pb.set_message(format!("Downloading {}", progress.name));
}

pub fn update_archive_progress(pb: &ProgressBar, progress: &AggregationProgress) {
    pb.set_position(progress.archives_processed as u64);

    match progress.current_archive {
        Some(ref name) => pb.set_message(format!("{} ({} records so far)", name, progress.records)),
        None => pb.set_message(format!("{} records", progress.records)),
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
