use crate::config::Config;
use crate::error::{PrepError, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One of the corpus archives, by file name and local path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveRef {
    pub name: String,
    pub path: PathBuf,
}

/// Every filesystem location the pipeline touches, resolved once at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub downloads_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub archives: Vec<ArchiveRef>,
    pub dataset_path: PathBuf,
}

impl Layout {
    pub fn new<S: AsRef<str>>(
        downloads_dir: PathBuf,
        archive_dir_name: &str,
        archive_names: &[S],
        dataset_file_name: &str,
    ) -> Self {
        let archive_dir = downloads_dir.join(archive_dir_name);
        let archives = archive_names
            .iter()
            .map(|name| ArchiveRef {
                name: name.as_ref().to_string(),
                path: archive_dir.join(name.as_ref()),
            })
            .collect();
        let dataset_path = downloads_dir.join(dataset_file_name);

        Self {
            downloads_dir,
            archive_dir,
            archives,
            dataset_path,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let downloads_dir = match config.paths.downloads_dir {
            Some(ref dir) => dir.clone(),
            None => downloads_dir_from(std::env::var_os("HOME"))?,
        };

        Ok(Self::new(
            downloads_dir,
            &config.paths.archive_dir_name,
            config.source.archives.as_slice(),
            &config.paths.dataset_file_name,
        ))
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }
}

/// `$HOME/Downloads`.
pub fn downloads_dir_from(home: Option<OsString>) -> Result<PathBuf> {
    match home {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home).join("Downloads")),
        _ => Err(PrepError::HomeNotSet),
    }
}
