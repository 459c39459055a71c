//! Record collection for one load.

use crate::error::{AggregateError, RowError};

use super::expand::{ExpandedRow, ExpansionMode};

/// Outcome of a load: the records built so far plus every per-row error.
#[derive(Debug)]
pub struct LoadReport<R> {
    /// Records in source order.
    pub records: Vec<R>,
    /// Per-row errors in source order.
    pub errors: Vec<RowError>,
    /// Data rows read, header excluded.
    pub rows_read: u64,
    /// Rows whose records were discarded.
    pub rows_dropped: u64,
    pub mode: ExpansionMode,
    /// Delimiter the source was read with.
    pub delimiter: u8,
    /// Encoding the source was decoded from.
    pub encoding: String,
}

impl<R> LoadReport<R> {
    pub fn new(mode: ExpansionMode, delimiter: u8, encoding: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
            rows_read: 0,
            rows_dropped: 0,
            mode,
            delimiter,
            encoding: encoding.into(),
        }
    }

    /// Add the output of one row.
    pub fn push_row(&mut self, row: ExpandedRow<R>) {
        self.rows_read += 1;
        if row.errors.iter().any(RowError::drops_row) {
            self.rows_dropped += 1;
        }
        self.records.extend(row.records);
        self.errors.extend(row.errors);
    }

    /// Check if the load completed without row errors
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Loaded: {} records from {} rows, {} errors, {} rows dropped",
            self.records.len(),
            self.rows_read,
            self.errors.len(),
            self.rows_dropped
        )
    }

    /// Row errors as one error value, if there were any.
    pub fn aggregate(&self) -> Option<AggregateError> {
        (!self.errors.is_empty()).then(|| AggregateError {
            errors: self.errors.clone(),
        })
    }

    /// Move the records out together with the aggregated errors.
    pub fn into_parts(self) -> (Vec<R>, Option<AggregateError>) {
        let errors = (!self.errors.is_empty()).then_some(AggregateError { errors: self.errors });
        (self.records, errors)
    }
}
