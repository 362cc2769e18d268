pub mod archive_reader;
pub mod labeler;

pub use archive_reader::{ArchiveReader, LabeledRecords};
pub use labeler::{AmbiguityPolicy, LabelMatch, Resolution};

use crate::dataset::LabeledRecord;
use crate::error::Result;
use std::path::Path;

/// Extracts every labeled record from one archive, in member order.
pub fn extract_labeled_records<P: AsRef<Path>>(
    archive_path: P,
    policy: AmbiguityPolicy,
) -> Result<Vec<LabeledRecord>> {
    let mut reader = ArchiveReader::open(archive_path)?;
    let records: Result<Vec<_>> = reader.labeled_records(policy)?.collect();
    records
}

/// Returns `Ok` if the archive can be decompressed and every header parsed.
pub fn verify_archive<P: AsRef<Path>>(archive_path: P) -> Result<usize> {
    ArchiveReader::open(archive_path)?.verify()
}
