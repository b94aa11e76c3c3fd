//! Loading and cleaning the raw accident table.

mod normalize;

pub use normalize::{
    load_and_normalize, normalize, normalize_record, read_records, read_source, CategorySummary,
    DropReason, NormalizeReport, NormalizedData, RawRecord, RowDrop, RowOutcome, AGGREGATE_KIND,
    LAST_MODELED_YEAR, SOURCE_COLUMNS,
};
