//! Pipeline progress as encoded by the filesystem.
//!
//! Nothing else is persisted: an archive counts as fetched when a file exists
//! at its path (whatever its size), and the dataset counts as built when the
//! output file exists. The fetcher and the aggregator make their skip
//! decisions through these functions only.

use crate::layout::{ArchiveRef, Layout};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    NotStarted,
    ArchivesFetched,
    DatasetBuilt,
}

impl PipelineState {
    pub fn detect(layout: &Layout) -> Self {
        if dataset_present(layout) {
            PipelineState::DatasetBuilt
        } else if missing_archives(layout).is_empty() {
            PipelineState::ArchivesFetched
        } else {
            PipelineState::NotStarted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::NotStarted => "not started",
            PipelineState::ArchivesFetched => "archives fetched",
            PipelineState::DatasetBuilt => "dataset built",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn archive_present(path: &Path) -> bool {
    path.exists()
}

pub fn dataset_present(layout: &Layout) -> bool {
    layout.dataset_path.exists()
}

pub fn missing_archives(layout: &Layout) -> Vec<&ArchiveRef> {
    layout
        .archives
        .iter()
        .filter(|archive| !archive_present(&archive.path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout_in(dir: &Path) -> Layout {
        Layout::new(
            dir.to_path_buf(),
            "Enron emails",
            &["enron1.tar.gz", "enron2.tar.gz"],
            "emails.pickle",
        )
    }

    #[test]
    fn test_state_transitions() {
        let temp_dir = TempDir::new().unwrap();
        let layout = layout_in(temp_dir.path());
        assert_eq!(PipelineState::detect(&layout), PipelineState::NotStarted);
        assert_eq!(missing_archives(&layout).len(), 2);

        fs::create_dir_all(&layout.archive_dir).unwrap();
        fs::write(&layout.archives[0].path, b"x").unwrap();
        assert_eq!(PipelineState::detect(&layout), PipelineState::NotStarted);
        assert_eq!(missing_archives(&layout)[0].name, "enron2.tar.gz");

        fs::write(&layout.archives[1].path, b"x").unwrap();
        assert_eq!(PipelineState::detect(&layout), PipelineState::ArchivesFetched);

        fs::write(&layout.dataset_path, b"x").unwrap();
        assert_eq!(PipelineState::detect(&layout), PipelineState::DatasetBuilt);
    }

    #[test]
    fn test_zero_byte_stub_counts_as_present() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("enron1.tar.gz");
        fs::File::create(&path).unwrap();

        assert!(archive_present(&path));
    }

    #[test]
    fn test_dataset_wins_over_missing_archives() {
        let temp_dir = TempDir::new().unwrap();
        let layout = layout_in(temp_dir.path());
        fs::write(&layout.dataset_path, b"x").unwrap();

        assert_eq!(PipelineState::detect(&layout), PipelineState::DatasetBuilt);
    }

    #[test]
    fn test_display() {
        assert_eq!(PipelineState::ArchivesFetched.to_string(), "archives fetched");
    }
}
