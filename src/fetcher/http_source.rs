use crate::error::{PrepError, Result};
use reqwest::blocking::{Client, ClientBuilder};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub name: String,
    pub received_bytes: u64,
    pub total_bytes: Option<u64>,
}

/// Where missing archives are retrieved from.
pub trait ArchiveSource {
    /// Streams the resource at `url` into `sink` and returns the byte count.
    fn retrieve(
        &self,
        url: &Url,
        sink: &mut dyn Write,
        progress_callback: Option<&dyn Fn(&DownloadProgress)>,
    ) -> Result<u64>;
}

impl<S: ArchiveSource + ?Sized> ArchiveSource for &S {
    fn retrieve(
        &self,
        url: &Url,
        sink: &mut dyn Write,
        progress_callback: Option<&dyn Fn(&DownloadProgress)>,
    ) -> Result<u64> {
        (**self).retrieve(url, sink, progress_callback)
    }
}

const CHUNK_SIZE: usize = 64 * 1024;

/// Plain HTTP GET with a blocking client.
pub struct HttpSource {
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::from_builder(Client::builder(), timeout)
    }

    fn from_builder(builder: ClientBuilder, timeout: Duration) -> Result<Self> {
        let client = builder
            .timeout(timeout)
            .user_agent(concat!("enron-prep/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ArchiveSource for HttpSource {
    fn retrieve(
        &self,
        url: &Url,
        sink: &mut dyn Write,
        progress_callback: Option<&dyn Fn(&DownloadProgress)>,
    ) -> Result<u64> {
        debug!(%url, "requesting archive");
        let mut response = self.client.get(url.clone()).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrepError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut progress = DownloadProgress {
            name: file_name(url),
            received_bytes: 0,
            total_bytes: response.content_length(),
        };

        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let bytes_read = response.read(&mut buffer).map_err(|e| PrepError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            if bytes_read == 0 {
                break;
            }

            sink.write_all(&buffer[..bytes_read])?;
            progress.received_bytes += bytes_read as u64;

            if let Some(callback) = progress_callback {
                callback(&progress);
            }
        }

        sink.flush()?;
        Ok(progress.received_bytes)
    }
}

fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .unwrap_or(url.as_str())
        .to_string()
}
