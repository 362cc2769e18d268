use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error while retrieving {url}: {message}")]
    Network { url: String, message: String },

    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Failed to read archive {path}")]
    Archive {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Entry {entry} in {archive} matches both ham and spam")]
    AmbiguousLabel { archive: String, entry: String },

    #[error("Dataset serialization failed: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("HOME is not set; cannot locate the Downloads folder")]
    HomeNotSet,

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl PrepError {
    pub fn archive<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        PrepError::Archive {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for PrepError {
    fn user_message(&self) -> String {
        match self {
            PrepError::Network { url, message } => {
                format!("Could not download {}: {}", url, message)
            }
            PrepError::HttpStatus { url, status } => {
                format!("Download of {} failed with HTTP status {}", url, status)
            }
            PrepError::Timeout { url } => {
                format!("Download of {} timed out", url)
            }
            PrepError::Archive { path, source } => {
                format!("Archive {} could not be read: {}", path, source)
            }
            PrepError::AmbiguousLabel { archive, entry } => {
                format!(
                    "Entry '{}' in {} matches both 'ham' and 'spam'",
                    entry, archive
                )
            }
            PrepError::Serialization { message } => {
                format!("Could not write the dataset: {}", message)
            }
            PrepError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            PrepError::InvalidUrl { url } => {
                format!("Invalid URL: {}", url)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            PrepError::Network { .. } | PrepError::Timeout { .. } => Some(
                "Check your internet connection and try again. Archives that were already downloaded are kept.".to_string()
            ),
            PrepError::HttpStatus { .. } => Some(
                "The corpus server may have moved. Point --base-url at a mirror that serves enron1.tar.gz ... enron6.tar.gz.".to_string()
            ),
            PrepError::Archive { .. } => Some(
                "The archive may be truncated. Delete it and run again, or pass --verify-archives to re-download damaged archives.".to_string()
            ),
            PrepError::AmbiguousLabel { .. } => Some(
                "Choose how to label such entries with --on-ambiguous ham|spam|both.".to_string()
            ),
            PrepError::Config { .. } => Some(
                "Check your configuration file syntax. Run with --generate-config to see every available setting.".to_string()
            ),
            PrepError::HomeNotSet => Some(
                "Set HOME or pass --downloads-dir to choose where files are stored.".to_string()
            ),
            PrepError::InvalidUrl { .. } => Some(
                "The base URL must be an http:// or https:// URL.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PrepError {
    fn from(error: reqwest::Error) -> Self {
        let url = error
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown URL".to_string());

        if error.is_timeout() {
            return PrepError::Timeout { url };
        }

        if let Some(status) = error.status() {
            return PrepError::HttpStatus {
                url,
                status: status.as_u16(),
            };
        }

        PrepError::Network {
            url,
            message: error.to_string(),
        }
    }
}

impl From<url::ParseError> for PrepError {
    fn from(error: url::ParseError) -> Self {
        PrepError::InvalidUrl {
            url: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for PrepError {
    fn from(error: toml::de::Error) -> Self {
        PrepError::Config {
            message: error.to_string(),
        }
    }
}

impl From<serde_pickle::Error> for PrepError {
    fn from(error: serde_pickle::Error) -> Self {
        PrepError::Serialization {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = PrepError::HttpStatus {
            url: "http://example.com/enron1.tar.gz".to_string(),
            status: 404,
        };
        assert!(error.user_message().contains("404"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_ambiguous_label_message_names_entry() {
        let error = PrepError::AmbiguousLabel {
            archive: "enron1.tar.gz".to_string(),
            entry: "spamham/0001.txt".to_string(),
        };
        assert!(error.user_message().contains("spamham/0001.txt"));
        assert!(error.suggestion().unwrap().contains("--on-ambiguous"));
    }

    #[test]
    fn test_archive_error_keeps_source() {
        use std::error::Error as _;

        let error = PrepError::archive(
            "/tmp/enron1.tar.gz",
            std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid gzip header"),
        );
        assert!(error.to_string().contains("/tmp/enron1.tar.gz"));
        assert!(error.source().is_some());
        assert!(error.user_message().contains("invalid gzip header"));
    }

    #[test]
    fn test_cancelled_has_no_suggestion() {
        assert!(PrepError::Cancelled.suggestion().is_none());
        assert_eq!(
            PrepError::Cancelled.user_message(),
            "Operation was cancelled by user"
        );
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("not = = valid").unwrap_err();
        let error = PrepError::from(toml_error);
        assert!(matches!(error, PrepError::Config { .. }));
    }
}
