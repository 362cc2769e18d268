use crate::dataset::{Label, LabeledRecord};
use crate::error::{PrepError, Result};
use serde_pickle::{DeOptions, HashableValue, SerOptions, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MESSAGE_COLUMN: &str = "message";
const CLASS_COLUMN: &str = "class";

/// Ordered collection of labeled records.
///
/// On disk the dataset is a pickled column table, a dict with a `message`
/// list of `bytes` and a `class` list of `str` of equal length, so that
/// `pandas.DataFrame(pickle.load(f))` rebuilds the frame directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<LabeledRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, records: Vec<LabeledRecord>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    pub fn count(&self, label: Label) -> usize {
        self.records.iter().filter(|r| r.class == label).count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.message.len() as u64).sum()
    }

    pub fn to_pickle_value(&self) -> Value {
        let messages = self
            .records
            .iter()
            .map(|r| Value::Bytes(r.message.clone()))
            .collect();
        let classes = self
            .records
            .iter()
            .map(|r| Value::String(r.class.as_str().to_string()))
            .collect();

        let mut columns = BTreeMap::new();
        columns.insert(
            HashableValue::String(MESSAGE_COLUMN.to_string()),
            Value::List(messages),
        );
        columns.insert(
            HashableValue::String(CLASS_COLUMN.to_string()),
            Value::List(classes),
        );
        Value::Dict(columns)
    }

    pub fn write_pickle<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_pickle::value_to_writer(writer, &self.to_pickle_value(), SerOptions::new())?;
        Ok(())
    }

    /// Serializes the whole dataset to a sibling temporary file and renames it
    /// onto `path`, so the output either appears complete or not at all.
    pub fn save_atomic<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".emails-")
            .suffix(".tmp")
            .tempfile_in(parent)?;

        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            self.write_pickle(&mut writer)?;
            writer.flush()?;
        }
        staged.as_file().sync_all()?;

        staged
            .persist(path)
            .map_err(|e| PrepError::Io(e.error))?;
        Ok(())
    }

    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        let value = serde_pickle::value_from_reader(reader, DeOptions::new())?;
        Self::from_pickle_value(value)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::load_from_reader(BufReader::new(file))
    }

    fn from_pickle_value(value: Value) -> Result<Self> {
        let mut columns = match value {
            Value::Dict(columns) => columns,
            _ => return Err(malformed("top-level object is not a dict")),
        };

        let messages = take_list(&mut columns, MESSAGE_COLUMN)?;
        let classes = take_list(&mut columns, CLASS_COLUMN)?;

        if messages.len() != classes.len() {
            return Err(malformed(&format!(
                "{} messages but {} classes",
                messages.len(),
                classes.len()
            )));
        }

        let mut records = Vec::with_capacity(messages.len());
        for (message, class) in messages.into_iter().zip(classes) {
            let message = match message {
                Value::Bytes(bytes) => bytes,
                _ => return Err(malformed("message values must be bytes")),
            };
            let class = match class {
                Value::String(s) => s.parse::<Label>().map_err(|e| malformed(&e))?,
                _ => return Err(malformed("class values must be str")),
            };
            records.push(LabeledRecord { message, class });
        }

        Ok(Self { records })
    }
}

impl FromIterator<LabeledRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = LabeledRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

fn take_list(columns: &mut BTreeMap<HashableValue, Value>, name: &str) -> Result<Vec<Value>> {
    match columns.remove(&HashableValue::String(name.to_string())) {
        Some(Value::List(values)) => Ok(values),
        Some(_) => Err(malformed(&format!("column '{}' is not a list", name))),
        None => Err(malformed(&format!("missing column '{}'", name))),
    }
}

fn malformed(reason: &str) -> PrepError {
    PrepError::Serialization {
        message: format!("malformed dataset: {}", reason),
    }
}
