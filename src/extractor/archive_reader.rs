use crate::dataset::LabeledRecord;
use crate::error::{PrepError, Result};
use crate::extractor::labeler::{AmbiguityPolicy, LabelMatch, Resolution};
use flate2::read::GzDecoder;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tar::{Archive, Entries, Entry};
use tracing::{debug, trace};

type ArchiveStream = GzDecoder<BufReader<File>>;

const MAX_PREALLOCATION: u64 = 1 << 20;

/// A `.tar.gz` archive opened for a single streaming pass.
pub struct ArchiveReader {
    path: PathBuf,
    archive: Archive<ArchiveStream>,
}

impl ArchiveReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| PrepError::archive(&path, e))?;
        let archive = Archive::new(GzDecoder::new(BufReader::new(file)));

        Ok(Self { path, archive })
    }

    /// Lazily yields labeled records in member order. Entries are read from
    /// the compressed stream one at a time and only matching regular files
    /// have their content loaded. The sequence cannot be restarted.
    pub fn labeled_records(&mut self, policy: AmbiguityPolicy) -> Result<LabeledRecords<'_>> {
        let archive_name = display_name(&self.path);
        let entries = self
            .archive
            .entries()
            .map_err(|e| PrepError::archive(&self.path, e))?;

        Ok(LabeledRecords {
            path: &self.path,
            archive_name,
            entries,
            policy,
            pending: VecDeque::new(),
            done: false,
        })
    }

    /// Walks every entry header without materializing content and returns
    /// the number of members. Fails on any decompression or format error.
    pub fn verify(&mut self) -> Result<usize> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| PrepError::archive(&self.path, e))?;

        let mut count = 0;
        for entry in entries {
            entry.map_err(|e| PrepError::archive(&self.path, e))?;
            count += 1;
        }

        Ok(count)
    }
}

pub struct LabeledRecords<'a> {
    path: &'a Path,
    archive_name: String,
    entries: Entries<'a, ArchiveStream>,
    policy: AmbiguityPolicy,
    pending: VecDeque<LabeledRecord>,
    done: bool,
}

impl<'a> LabeledRecords<'a> {
    fn process(&mut self, mut entry: Entry<'a, ArchiveStream>) -> Result<()> {
        let entry_path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let matched = LabelMatch::from_path(&entry_path);

        if matched == LabelMatch::Neither {
            return Ok(());
        }

        if !entry.header().entry_type().is_file() {
            trace!(entry = %entry_path, "skipping non-regular entry");
            return Ok(());
        }

        let labels = match self.policy.resolve(matched) {
            Resolution::Labels(labels) => labels,
            Resolution::Reject => {
                return Err(PrepError::AmbiguousLabel {
                    archive: self.archive_name.clone(),
                    entry: entry_path,
                });
            }
        };

        // The header size is untrusted, so it only seeds the buffer up to a cap.
        let declared_size = entry.size();
        let mut message = Vec::with_capacity(declared_size.min(MAX_PREALLOCATION) as usize);
        entry
            .read_to_end(&mut message)
            .map_err(|e| PrepError::archive(self.path, e))?;

        if (message.len() as u64) != declared_size {
            return Err(PrepError::archive(
                self.path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "entry {} declares {} bytes but holds {}",
                        entry_path,
                        declared_size,
                        message.len()
                    ),
                ),
            ));
        }

        if let Some((last, rest)) = labels.split_last() {
            for label in rest {
                self.pending.push_back(LabeledRecord::new(message.clone(), *label));
            }
            self.pending.push_back(LabeledRecord::new(message, *last));
        }

        Ok(())
    }
}

impl Iterator for LabeledRecords<'_> {
    type Item = Result<LabeledRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }

            if self.done {
                return None;
            }

            let entry = match self.entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(PrepError::archive(self.path, e)));
                }
                None => {
                    debug!(archive = %self.archive_name, "reached end of archive");
                    self.done = true;
                    return None;
                }
            };

            if let Err(e) = self.process(entry) {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
