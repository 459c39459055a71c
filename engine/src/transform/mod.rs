//! Row-to-record transformation.
//!
//! - Columns: header row resolution
//! - Expand: one row into one or more records
//! - Collect: records and per-row errors of a load
//! - Pipeline: the load entry points

pub mod collect;
pub mod columns;
pub mod expand;
pub mod pipeline;

pub use collect::LoadReport;
pub use columns::{resolve_columns, ColumnResolution};
pub use expand::{Branch, ExpandedRow, ExpansionMode, RowExpander};
pub use pipeline::{load, load_file, load_records};
