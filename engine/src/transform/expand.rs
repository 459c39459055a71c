//! Row expansion: one source row into one or more records.
//!
//! A row of a wide table such as
//!
//! ```text
//! Name;1998;1999
//! Cox;12;15
//! ```
//!
//! becomes one record per integer-headed column (`IntOnly`), per melt
//! column (`MeltOnly`), per pair of both (`Cross`), or a single record
//! (`Plain`).

use csv::ByteRecord;
use serde::Serialize;
use std::fmt;

use crate::coerce::coerce_cell;
use crate::config::LoadConfig;
use crate::error::{ConvertError, LoadError, LoadResult, RowError};
use crate::schema::{FieldDef, Schema};
use crate::tag::{FieldDirective, FieldRole};

use super::columns::ColumnResolution;

/// How each row fans out, fixed for the whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    Plain,
    IntOnly,
    MeltOnly,
    /// Integer columns outer, melt columns inner.
    Cross,
}

impl ExpansionMode {
    pub fn detect(directives: &[FieldDirective]) -> Self {
        let int = directives.iter().any(FieldDirective::uses_intcols);
        let melt = directives.iter().any(FieldDirective::uses_melt);
        match (int, melt) {
            (false, false) => Self::Plain,
            (true, false) => Self::IntOnly,
            (false, true) => Self::MeltOnly,
            (true, true) => Self::Cross,
        }
    }
}

impl fmt::Display for ExpansionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plain => "plain",
            Self::IntOnly => "integer columns",
            Self::MeltOnly => "melt",
            Self::Cross => "integer columns x melt",
        };
        f.write_str(name)
    }
}

/// Headers a single output record is built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Branch<'a> {
    pub int_header: Option<&'a str>,
    pub melt_header: Option<&'a str>,
}

/// All branches of a row, in output order.
pub fn branches(mode: ExpansionMode, resolution: &ColumnResolution) -> Vec<Branch<'_>> {
    let ints = resolution.integer_headed.iter().map(String::as_str);
    let melts = resolution.melt_candidates.iter().map(String::as_str);

    match mode {
        ExpansionMode::Plain => vec![Branch::default()],
        ExpansionMode::IntOnly => ints
            .map(|h| Branch { int_header: Some(h), melt_header: None })
            .collect(),
        ExpansionMode::MeltOnly => melts
            .map(|h| Branch { int_header: None, melt_header: Some(h) })
            .collect(),
        ExpansionMode::Cross => ints
            .flat_map(|i| {
                melts.clone().map(move |m| Branch {
                    int_header: Some(i),
                    melt_header: Some(m),
                })
            })
            .collect(),
    }
}

/// Records and errors produced by one row.
#[derive(Debug)]
pub struct ExpandedRow<R> {
    pub records: Vec<R>,
    pub errors: Vec<RowError>,
}

/// Where a field's text comes from for one branch.
enum Cell<'r> {
    Text(&'r [u8]),
    /// Leave the zero value.
    Zero,
    /// Leave the zero value and report.
    Missing(RowError),
    /// Discard the whole row.
    Drop(RowError),
}

/// Turns rows into records for one load.
pub struct RowExpander<'a, R> {
    schema: &'a Schema<R>,
    directives: &'a [FieldDirective],
    resolution: &'a ColumnResolution,
    config: &'a LoadConfig,
    branches: Vec<Branch<'a>>,
}

impl<'a, R> RowExpander<'a, R> {
    /// `directives` must be in the schema's field order.
    pub fn new(
        schema: &'a Schema<R>,
        directives: &'a [FieldDirective],
        resolution: &'a ColumnResolution,
        config: &'a LoadConfig,
        mode: ExpansionMode,
    ) -> Self {
        Self {
            schema,
            directives,
            resolution,
            config,
            branches: branches(mode, resolution),
        }
    }

    /// Records each row fans out to.
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Expand one data row. `row_number` is the 1-based source row.
    ///
    /// A conversion failure or missing constant empties `records`; a
    /// missing column is reported once per row and the records are kept.
    pub fn expand_row(&self, row: &ByteRecord, row_number: u64) -> LoadResult<ExpandedRow<R>> {
        let mut out = ExpandedRow {
            records: Vec::with_capacity(self.branches.len()),
            errors: Vec::new(),
        };

        for (n, branch) in self.branches.iter().enumerate() {
            match self.build_record(row, row_number, branch, n == 0, &mut out.errors)? {
                Some(record) => out.records.push(record),
                None => {
                    out.records.clear();
                    break;
                }
            }
        }
        Ok(out)
    }

    fn build_record(
        &self,
        row: &ByteRecord,
        row_number: u64,
        branch: &Branch<'a>,
        report_missing: bool,
        errors: &mut Vec<RowError>,
    ) -> LoadResult<Option<R>> {
        let mut record = self.schema.new_record();

        for (field, directive) in self.schema.fields().iter().zip(self.directives) {
            let text = match self.source_cell(field, directive, row, row_number, branch)? {
                Cell::Text(text) => text,
                Cell::Zero => continue,
                Cell::Missing(err) => {
                    if report_missing {
                        errors.push(err);
                    }
                    continue;
                }
                Cell::Drop(err) => {
                    errors.push(err);
                    return Ok(None);
                }
            };

            let value = match coerce_cell(text, &field.field_type, self.config.fail_on_unparseable_number) {
                Ok(value) => value,
                Err(ConvertError::UnsupportedFieldType(type_name)) => {
                    return Err(LoadError::UnsupportedFieldType {
                        field: field.name.clone(),
                        type_name,
                    });
                }
                Err(source) => {
                    errors.push(conversion(row_number, field, source));
                    return Ok(None);
                }
            };
            if let Err(source) = field.set(&mut record, value) {
                errors.push(conversion(row_number, field, source));
                return Ok(None);
            }
        }

        Ok(Some(record))
    }

    fn source_cell<'r>(
        &'r self,
        field: &FieldDef<R>,
        directive: &'r FieldDirective,
        row: &'r ByteRecord,
        row_number: u64,
        branch: &Branch<'a>,
    ) -> LoadResult<Cell<'r>> {
        if let Some(index) = self.config.mapped_column(&field.name) {
            return match row.get(index - 1) {
                Some(text) => Ok(Cell::Text(text)),
                None => Err(LoadError::Configuration {
                    row: row_number,
                    field: field.name.clone(),
                    index,
                    row_len: row.len(),
                }),
            };
        }

        let cell = match directive.role() {
            Some(FieldRole::Constant(key)) => match self.config.constants.get(key) {
                Some(value) if !value.is_empty() => Cell::Text(value.as_bytes()),
                _ if field.field_type.is_string() => Cell::Text(b""),
                _ => Cell::Drop(RowError::MissingConstant {
                    row: row_number,
                    field: field.name.clone(),
                    key: key.to_string(),
                }),
            },
            Some(FieldRole::IntHeader) => header_text(branch.int_header),
            Some(FieldRole::IntValue) => self.cell_under(branch.int_header, row),
            Some(FieldRole::MeltHeader) => header_text(branch.melt_header),
            Some(FieldRole::MeltValue) => self.cell_under(branch.melt_header, row),
            Some(FieldRole::Column(name)) => match self.resolution.index_of(name) {
                Some(index) => Cell::Text(row.get(index - 1).unwrap_or(b"")),
                None => Cell::Missing(RowError::MissingColumn {
                    row: row_number,
                    field: field.name.clone(),
                    column: name.to_string(),
                }),
            },
            None => Cell::Zero,
        };
        Ok(cell)
    }

    fn cell_under<'r>(&self, header: Option<&str>, row: &'r ByteRecord) -> Cell<'r> {
        match header.and_then(|h| self.resolution.index_of(h)) {
            Some(index) => Cell::Text(row.get(index - 1).unwrap_or(b"")),
            None => Cell::Zero,
        }
    }
}

fn header_text<'r>(header: Option<&'r str>) -> Cell<'r> {
    header.map_or(Cell::Zero, |h| Cell::Text(h.as_bytes()))
}

fn conversion<R>(row: u64, field: &FieldDef<R>, source: ConvertError) -> RowError {
    RowError::Conversion {
        row,
        field: field.name.clone(),
        source,
    }
}
