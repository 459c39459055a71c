//! # csvmelt - tag-driven CSV to record loading
//!
//! csvmelt maps the rows of a delimited text file onto a record type, guided
//! by a short tag on each field, and reshapes wide tables (one column per
//! year, one column per category) into long ones on the way.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│    Sink     │
//! │ (any enc.)  │     │ (sep, enc.) │     │ (tags, melt)│     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csvmelt::{load, LoadConfig, Record, Schema};
//!
//! #[derive(Default)]
//! struct Harvest { farm: String, year: u16, tonnes: f64 }
//!
//! impl Record for Harvest {
//!     fn schema() -> Schema<Self> {
//!         Schema::builder()
//!             .field("Farm", "col:Farm", |h: &mut Harvest, v: String| h.farm = v)
//!             .field("Year", "intcols:colname", |h: &mut Harvest, v: u16| h.year = v)
//!             .field("Tonnes", "intcols:value", |h: &mut Harvest, v: f64| h.tonnes = v)
//!             .build()
//!     }
//! }
//!
//! let mut file = std::fs::File::open("harvest.csv")?;
//! let (harvests, errors) = load::<Harvest, _>(&mut file, b';', &LoadConfig::default())?.into_parts();
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`tag`] - Field tag grammar
//! - [`schema`] - Record schemas, typed and JSON-described
//! - [`coerce`] - Text cell to typed value
//! - [`cache`] - Parsed directive cache
//! - [`transform`] - Column resolution, row expansion and the load pipeline
//! - [`parser`] - Separator sniffing, header reading, encodings
//! - [`excel`] - Spreadsheet column ids
//! - [`sink`] - Record persistence
//! - [`config`] - Load configuration
//! - [`logs`] - Load progress logging

// Core modules
pub mod error;
pub mod tag;
pub mod schema;
pub mod coerce;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Caching
pub mod cache;

// Collaborators
pub mod excel;
pub mod sink;
pub mod config;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregateError,
    ConfigError,
    ConvertError,
    CsvError,
    DirectiveError,
    ExcelError,
    LoadError,
    RowError,
};

// =============================================================================
// Re-exports - Schema & Tags
// =============================================================================

pub use schema::{
    FieldDef,
    FieldDescriptor,
    FieldType,
    FromValue,
    JsonRecord,
    Record,
    Schema,
    SchemaBuilder,
    SchemaDescriptor,
    Value,
};

pub use tag::{check_unique_roles, parse_directive, FieldDirective, FieldRole};

pub use coerce::coerce_cell;

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use transform::{
    load,
    load_file,
    load_records,
    resolve_columns,
    ColumnResolution,
    ExpansionMode,
    LoadReport,
};

pub use config::LoadConfig;

pub use cache::{DirectiveCache, DIRECTIVE_CACHE};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_encoding,
    guess_separator,
    read_headers,
};

// =============================================================================
// Re-exports - Collaborators
// =============================================================================

pub use excel::{column_id_to_number, column_number_to_id, ExcelColumns};

pub use sink::{JsonSink, RecordSink};

pub use logs::{log_error, log_info, log_success, log_warning, LOG_BROADCASTER};
