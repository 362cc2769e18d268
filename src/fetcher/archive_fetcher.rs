use crate::error::{PrepError, Result};
use crate::extractor::verify_archive;
use crate::fetcher::{ArchiveSource, DownloadProgress};
use crate::layout::{ArchiveRef, Layout};
use crate::state;
use crate::ui::GracefulShutdown;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchSummary {
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    pub replaced: Vec<String>,
    pub bytes_downloaded: u64,
    pub duration: Duration,
}

impl FetchSummary {
    pub fn retrievals(&self) -> usize {
        self.downloaded.len() + self.replaced.len()
    }
}

pub struct ArchiveFetcher<S: ArchiveSource> {
    source: S,
    base_url: Url,
    verify_archives: bool,
    shutdown: Option<GracefulShutdown>,
}

impl<S: ArchiveSource> ArchiveFetcher<S> {
    pub fn new(source: S, base_url: &str) -> Result<Self> {
        Ok(Self {
            source,
            base_url: parse_base_url(base_url)?,
            verify_archives: false,
            shutdown: None,
        })
    }

    /// Re-download present archives that cannot be opened and walked.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_archives = verify;
        self
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn archive_url(&self, name: &str) -> Result<Url> {
        Ok(self.base_url.join(name)?)
    }

    /// Makes sure every archive in the layout exists locally, retrieving the
    /// missing ones in list order.
    pub fn ensure_local_copies(
        &self,
        layout: &Layout,
        progress_callback: Option<&dyn Fn(&DownloadProgress)>,
    ) -> Result<FetchSummary> {
        let start_time = Instant::now();
        let mut summary = FetchSummary::default();

        fs::create_dir_all(&layout.archive_dir)?;

        for archive in &layout.archives {
            if let Some(ref shutdown) = self.shutdown {
                shutdown.check_shutdown()?;
            }

            if state::archive_present(&archive.path) {
                if !self.verify_archives {
                    summary.skipped.push(archive.name.clone());
                    continue;
                }

                match verify_archive(&archive.path) {
                    Ok(_) => {
                        summary.skipped.push(archive.name.clone());
                        continue;
                    }
                    Err(e) => {
                        warn!(archive = %archive.name, error = %e, "archive failed verification, downloading again");
                        fs::remove_file(&archive.path)?;
                        summary.bytes_downloaded += self.download(archive, layout, progress_callback)?;
                        summary.replaced.push(archive.name.clone());
                        continue;
                    }
                }
            }

            summary.bytes_downloaded += self.download(archive, layout, progress_callback)?;
            summary.downloaded.push(archive.name.clone());
        }

        summary.duration = start_time.elapsed();
        Ok(summary)
    }

    /// Streams into a temporary file in the archive directory and renames it
    /// into place once the transfer is complete.
    fn download(
        &self,
        archive: &ArchiveRef,
        layout: &Layout,
        progress_callback: Option<&dyn Fn(&DownloadProgress)>,
    ) -> Result<u64> {
        let url = self.archive_url(&archive.name)?;
        info!(archive = %archive.name, %url, "downloading archive");

        let mut staged = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".part")
            .tempfile_in(&layout.archive_dir)?;

        let bytes = {
            let mut writer = BufWriter::new(staged.as_file_mut());
            let bytes = self.source.retrieve(&url, &mut writer, progress_callback)?;
            writer.flush()?;
            bytes
        };
        staged.as_file().sync_all()?;

        staged
            .persist(&archive.path)
            .map_err(|e| PrepError::Io(e.error))?;

        info!(archive = %archive.name, bytes, "archive saved");
        Ok(bytes)
    }
}

/// Parses the remote base and makes sure file names join beneath it.
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|_| PrepError::InvalidUrl {
        url: base_url.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(PrepError::InvalidUrl {
            url: base_url.to_string(),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
