//! Error types for the csvmelt loader.
//!
//! The hierarchy mirrors the stages of a load:
//!
//! - [`CsvError`] - reading the delimited source (separator, headers, encoding)
//! - [`DirectiveError`] - malformed field tags, found at schema discovery
//! - [`ConvertError`] - a single cell that could not be coerced
//! - [`RowError`] - per-row problems, aggregated into [`AggregateError`]
//! - [`LoadError`] - fatal conditions that abort the whole load
//! - [`ExcelError`] - spreadsheet column id arithmetic
//! - [`ConfigError`] - loading a [`crate::config::LoadConfig`]
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;

use thiserror::Error;

// =============================================================================
// CSV Source Errors
// =============================================================================

/// Errors while reading or sniffing the delimited source.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or rewind the source.
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// The csv reader rejected a record.
    #[error("Invalid CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// The source holds no bytes at all.
    #[error("CSV source is empty")]
    EmptyFile,

    /// The first row could not be read as a header row.
    #[error("No header row found in CSV")]
    NoHeaders,

    /// None of the separator candidates produced a consistent table.
    #[error("None of the separators tried were valid: {candidates}")]
    NoSeparator { candidates: String },

    /// The requested encoding is unknown.
    #[error("Unknown encoding: {0}")]
    Encoding(String),
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(io) => CsvError::Io(io),
            kind => CsvError::Parse {
                line,
                message: format!("{kind:?}"),
            },
        }
    }
}

// =============================================================================
// Directive Errors
// =============================================================================

/// A field tag that cannot be turned into a directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// `col`, `mapConst`, `intcols` or `melt` without its parameter.
    #[error("{directive} parameter missing for field '{field}', should be in the form {expected}")]
    MissingParameter {
        field: String,
        directive: String,
        expected: String,
    },

    /// Two fields of one schema claim the same int/melt role.
    #[error("fields '{first}' and '{second}' both declare the {role} role")]
    DuplicateRole {
        role: String,
        first: String,
        second: String,
    },
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// A cell that could not be coerced into its field type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Integer parse failure (bad digits, overflow, empty text).
    #[error("could not convert '{value}' to {target}")]
    InvalidInteger { value: String, target: String },

    /// Float parse failure with `fail_on_unparseable_number` set.
    #[error("could not convert '{value}' to {target}")]
    InvalidFloat { value: String, target: String },

    /// The field type has no coercion.
    #[error("cannot convert text to unsupported field type '{0}'")]
    UnsupportedFieldType(String),

    /// A setter received a value of the wrong kind.
    #[error("expected a {expected} value, got {found}")]
    TypeMismatch { expected: String, found: String },
}

// =============================================================================
// Row Errors (aggregated)
// =============================================================================

/// A problem confined to one data row.
///
/// Rows are numbered from 1 as they appear in the source, header included.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// A `col` directive names a header that is not in the file.
    /// The field keeps its zero value and the record is still emitted.
    #[error("row {row}: could not find column header '{column}' for field '{field}'")]
    MissingColumn {
        row: u64,
        field: String,
        column: String,
    },

    /// A constant is missing or empty for a non-string field.
    /// The row is dropped.
    #[error("row {row}: constant '{key}' missing for field '{field}'")]
    MissingConstant { row: u64, field: String, key: String },

    /// A cell could not be coerced. The row is dropped.
    #[error("row {row}, field '{field}': {source}")]
    Conversion {
        row: u64,
        field: String,
        #[source]
        source: ConvertError,
    },
}

impl RowError {
    /// Source row the error belongs to.
    pub fn row(&self) -> u64 {
        match self {
            RowError::MissingColumn { row, .. }
            | RowError::MissingConstant { row, .. }
            | RowError::Conversion { row, .. } => *row,
        }
    }

    /// Whether the row's records were discarded.
    pub fn drops_row(&self) -> bool {
        !matches!(self, RowError::MissingColumn { .. })
    }
}

/// All per-row errors of one load, returned next to the partial records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    pub errors: Vec<RowError>,
}

impl AggregateError {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) during load", self.errors.len())?;
        for err in self.errors.iter().take(5) {
            write!(f, "\n  - {err}")?;
        }
        if self.errors.len() > 5 {
            write!(f, "\n  ... and {} more", self.errors.len() - 5)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

// =============================================================================
// Load Errors (fatal)
// =============================================================================

/// Conditions that abort a load outright.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading the source failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// A field tag is malformed.
    #[error("Malformed directive: {0}")]
    Directive(#[from] DirectiveError),

    /// A caller-mapped column index lies beyond the row.
    #[error("row {row}: column {index} mapped to field '{field}' is out of range, the row has {row_len} fields")]
    Configuration {
        row: u64,
        field: String,
        index: usize,
        row_len: usize,
    },

    /// A field type the engine cannot coerce.
    #[error("field '{field}' has unsupported type '{type_name}'")]
    UnsupportedFieldType { field: String, type_name: String },

    /// The load configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Excel Column Errors
// =============================================================================

/// Errors converting spreadsheet column ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExcelError {
    /// Not 1 to 3 letters once trimmed.
    #[error("'{0}' is not a column id, should be in the form A, AB or ABC")]
    InvalidColumnId(String),

    /// Column number below 1 or above the configured maximum.
    #[error("column number {number} out of range, must be between 1 and {max}")]
    ColumnOutOfRange { number: i64, max: u32 },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors loading a load configuration or schema descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for the expected shape.
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimiters must be a single ASCII character.
    #[error("Invalid delimiter '{0}', must be a single ASCII character")]
    InvalidDelimiter(char),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source reading operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for tag parsing.
pub type DirectiveResult<T> = Result<T, DirectiveError>;

/// Result type for cell coercion.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for loads.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for column id arithmetic.
pub type ExcelResult<T> = Result<T, ExcelError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
