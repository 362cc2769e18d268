pub mod aggregator;
pub mod record;
pub mod table;

pub use aggregator::{AggregationProgress, Aggregator, ArchiveSummary, BuildOutcome, BuildSummary};
pub use record::{Label, LabeledRecord};
pub use table::Dataset;
