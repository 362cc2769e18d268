pub mod archive_fetcher;
pub mod http_source;

pub use archive_fetcher::{parse_base_url, ArchiveFetcher, FetchSummary};
pub use http_source::{ArchiveSource, DownloadProgress, HttpSource};
