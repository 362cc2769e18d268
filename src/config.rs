use crate::error::{PrepError, Result};
use crate::extractor::AmbiguityPolicy;
use crate::fetcher::parse_base_url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://www.aueb.gr/users/ion/data/enron-spam/preprocessed/";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub source: SourceConfig,
    pub labels: LabelConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Defaults to `$HOME/Downloads` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
    pub archive_dir_name: String,
    pub dataset_file_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub archives: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelConfig {
    pub on_ambiguous: AmbiguityPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout: u64,
    pub verify_archives: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: None,
            archive_dir_name: "Enron emails".to_string(),
            dataset_file_name: "emails.pickle".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            archives: (1..=6).map(|i| format!("enron{}.tar.gz", i)).collect(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 600, // 10 minutes per archive
            verify_archives: false,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PrepError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PrepError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| PrepError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["enron-prep.toml", ".enron-prep.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref downloads_dir) = cli_args.downloads_dir {
            self.paths.downloads_dir = Some(downloads_dir.clone());
        }

        if let Some(ref base_url) = cli_args.base_url {
            self.source.base_url = base_url.clone();
        }

        if let Some(policy) = cli_args.on_ambiguous {
            self.labels.on_ambiguous = policy;
        }

        if let Some(verify) = cli_args.verify_archives {
            self.fetch.verify_archives = verify;
        }

        if let Some(timeout) = cli_args.timeout {
            self.fetch.timeout = timeout;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| PrepError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| PrepError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.archives.is_empty() {
            return Err(PrepError::Config {
                message: "At least one archive must be listed".to_string(),
            });
        }

        for name in &self.source.archives {
            if !is_plain_file_name(name) {
                return Err(PrepError::Config {
                    message: format!("Archive name must be a plain file name: {}", name),
                });
            }
        }

        if !is_plain_file_name(&self.paths.dataset_file_name) {
            return Err(PrepError::Config {
                message: format!(
                    "Dataset file name must be a plain file name: {}",
                    self.paths.dataset_file_name
                ),
            });
        }

        if !is_plain_file_name(&self.paths.archive_dir_name) {
            return Err(PrepError::Config {
                message: format!(
                    "Archive directory name must be a plain directory name: {}",
                    self.paths.archive_dir_name
                ),
            });
        }

        if self.fetch.timeout == 0 {
            return Err(PrepError::Config {
                message: "Download timeout must be greater than 0".to_string(),
            });
        }

        parse_base_url(&self.source.base_url)?;

        Ok(())
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub downloads_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub on_ambiguous: Option<AmbiguityPolicy>,
    pub verify_archives: Option<bool>,
    pub timeout: Option<u64>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_downloads_dir(mut self, downloads_dir: Option<PathBuf>) -> Self {
        self.downloads_dir = downloads_dir;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_on_ambiguous(mut self, policy: Option<AmbiguityPolicy>) -> Self {
        self.on_ambiguous = policy;
        self
    }

    pub fn with_verify_archives(mut self, verify: Option<bool>) -> Self {
        self.verify_archives = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.archives.len(), 6);
        assert_eq!(config.source.archives[0], "enron1.tar.gz");
        assert_eq!(config.source.archives[5], "enron6.tar.gz");
        assert_eq!(config.source.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.paths.archive_dir_name, "Enron emails");
        assert_eq!(config.paths.dataset_file_name, "emails.pickle");
        assert!(config.paths.downloads_dir.is_none());
        assert!(!config.fetch.verify_archives);
        assert_eq!(config.labels.on_ambiguous, AmbiguityPolicy::Error);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.source.archives.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.source.archives.push("../escape.tar.gz".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.source.base_url = "ftp://example.com/".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.paths.downloads_dir = Some(PathBuf::from("/srv/corpora"));
        config.labels.on_ambiguous = AmbiguityPolicy::Both;
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.fetch.timeout, config.fetch.timeout);
        assert_eq!(loaded_config.paths.downloads_dir, config.paths.downloads_dir);
        assert_eq!(loaded_config.labels.on_ambiguous, AmbiguityPolicy::Both);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [labels]
            on_ambiguous = "spam"
            "#,
        )
        .unwrap();

        assert_eq!(config.labels.on_ambiguous, AmbiguityPolicy::Spam);
        assert_eq!(config.source.archives.len(), 6);
        assert_eq!(config.fetch.timeout, 600);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::load_from_file("/nonexistent/enron-prep.toml");
        assert!(matches!(result, Err(PrepError::Config { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_timeout(Some(30))
            .with_verify_archives(Some(true))
            .with_on_ambiguous(Some(AmbiguityPolicy::Ham))
            .with_base_url(Some("https://mirror.example.org/enron/".to_string()));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.fetch.timeout, 30);
        assert!(config.fetch.verify_archives);
        assert_eq!(config.labels.on_ambiguous, AmbiguityPolicy::Ham);
        assert_eq!(config.source.base_url, "https://mirror.example.org/enron/");
        assert!(config.paths.downloads_dir.is_none());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_file = NamedTempFile::new().unwrap();
        Config::default().save_to_file(temp_file.path()).unwrap();
        let sample = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(!sample.is_empty());
        assert!(sample.contains("[paths]"));
        assert!(sample.contains("[source]"));
        assert!(sample.contains("[labels]"));
        assert!(sample.contains("[fetch]"));
        assert!(sample.contains("on_ambiguous = \"error\""));
    }
}
