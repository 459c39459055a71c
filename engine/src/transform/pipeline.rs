//! High-level load API: delimited source in, records out.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvmelt::{load, LoadConfig};
//! use std::fs::File;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut file = File::open("apples.csv")?;
//!     let report = load::<Apple, _>(&mut file, b';', &LoadConfig::default())?;
//!     println!("{}", report.summary());
//!     let (apples, errors) = report.into_parts();
//!     Ok(())
//! }
//! ```

use csv::ByteRecord;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::cache::DIRECTIVE_CACHE;
use crate::coerce::valid_utf8;
use crate::config::LoadConfig;
use crate::error::{CsvError, LoadResult, RowError};
use crate::logs::{log_error, log_info, log_row_warning, log_success, log_warning};
use crate::parser::{csv_reader, display_delimiter, guess_separator, transcode};
use crate::schema::{Record, Schema};
use crate::tag::FieldDirective;

use super::collect::LoadReport;
use super::columns::{resolve_columns, ColumnResolution};
use super::expand::{ExpansionMode, RowExpander};

/// Rows between progress lines.
const PROGRESS_EVERY: u64 = 1000;

/// Load every row of `source` into records described by `schema`.
///
/// The source is rewound first and read to the end. Per-row problems are
/// collected in the report; malformed tags, an out-of-range column mapping,
/// an unsupported field type and unreadable input abort the load.
pub fn load_records<R, S: Read + Seek>(
    source: &mut S,
    delimiter: u8,
    schema: &Schema<R>,
    config: &LoadConfig,
) -> LoadResult<LoadReport<R>> {
    log_info(format!(
        "Loading '{}' ({} fields), separator {}",
        schema.name(),
        schema.fields().len(),
        display_delimiter(delimiter)
    ));

    let directives: Vec<FieldDirective> = DIRECTIVE_CACHE
        .directives_for(schema)?
        .iter()
        .map(|d| FieldDirective::clone(d))
        .collect();

    let (input, encoding): (Box<dyn Read + '_>, String) = match config.encoding.as_deref() {
        Some(label) => {
            let (decoded, used) = transcode(source, label)?;
            log_info(format!("Decoding from {used}"));
            (Box::new(decoded) as Box<dyn Read + '_>, used)
        }
        None => {
            source.rewind().map_err(CsvError::from)?;
            (Box::new(&mut *source) as Box<dyn Read + '_>, "utf-8".to_string())
        }
    };

    let mut reader = csv_reader(input, delimiter, true, config.trim_cells);
    let mut row = ByteRecord::new();
    let mut row_number: u64 = 0;

    let (resolution, mode) = if config.first_row_is_data {
        if directives.iter().any(|d| d.uses_intcols() || d.uses_melt()) {
            log_warning("First row is data: no headers to expand, intcols and melt fields stay empty");
        }
        (ColumnResolution::default(), ExpansionMode::Plain)
    } else {
        if !reader.read_byte_record(&mut row).map_err(CsvError::from)? {
            return Err(CsvError::NoHeaders.into());
        }
        row_number += 1;
        let headers: Vec<String> = row.iter().map(valid_utf8).collect();
        log_info(format!("{} headers", headers.len()));

        let resolution = resolve_columns(&headers, &directives, &config.column_map);
        (resolution, ExpansionMode::detect(&directives))
    };

    let expander = RowExpander::new(schema, &directives, &resolution, config, mode);
    log_info(format!(
        "Expansion: {} ({} record(s) per row)",
        mode,
        expander.branch_count()
    ));
    if expander.branch_count() == 0 {
        log_warning(format!("No columns to expand for {mode} mode, rows will produce no records"));
    }

    let mut report = LoadReport::new(mode, delimiter, encoding);
    let mut reported_columns: HashSet<String> = HashSet::new();

    while reader.read_byte_record(&mut row).map_err(CsvError::from)? {
        row_number += 1;
        if report.rows_read % PROGRESS_EVERY == 0 && report.rows_read > 0 {
            log_info(format!("Processing row {}", report.rows_read));
        }

        let expanded = match expander.expand_row(&row, row_number) {
            Ok(expanded) => expanded,
            Err(e) => {
                log_error(format!("Load aborted: {e}"));
                return Err(e);
            }
        };
        for err in &expanded.errors {
            match err {
                RowError::MissingColumn { column, .. } => {
                    if reported_columns.insert(column.clone()) {
                        log_warning(format!("Could not find column header '{column}'"));
                    }
                }
                other => log_row_warning(other.row(), other.to_string()),
            }
        }
        report.push_row(expanded);
    }

    if report.is_ok() {
        log_success(report.summary());
    } else {
        log_warning(report.summary());
    }
    Ok(report)
}

/// [`load_records`] for a type with a static schema.
pub fn load<R: Record, S: Read + Seek>(source: &mut S, delimiter: u8, config: &LoadConfig) -> LoadResult<LoadReport<R>> {
    load_records(source, delimiter, &R::schema(), config)
}

/// Open a file and load it, guessing the separator when none is given.
pub fn load_file<R>(
    path: &Path,
    delimiter: Option<u8>,
    schema: &Schema<R>,
    config: &LoadConfig,
) -> LoadResult<LoadReport<R>> {
    let mut file = File::open(path).map_err(CsvError::from)?;
    let delimiter = match delimiter {
        Some(d) => d,
        None => {
            let guessed = guess_separator(&mut file, &config.separator_bytes()?, config.sniff_lines)?;
            log_info(format!("Guessed separator {}", display_delimiter(guessed)));
            guessed
        }
    };
    load_records(&mut file, delimiter, schema, config)
}
