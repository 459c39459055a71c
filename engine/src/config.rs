//! Load configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!   "column_map": { "Name": 1, "Diameter": 2 },
//!   "constants": { "country": "DE" },
//!   "fail_on_unparseable_number": true,
//!   "encoding": "auto"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Separator candidates, in the order they are tried.
pub const DEFAULT_SEPARATORS: [char; 4] = [',', '\t', ';', ' '];

/// Number of records read when checking a separator candidate.
pub const DEFAULT_SNIFF_LINES: usize = 100;

/// Options for one load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Field name to 1-based column number. 0 means unmapped.
    /// Overrides the field's tag.
    pub column_map: HashMap<String, usize>,

    /// Values for `mapConst:<key>` fields.
    pub constants: HashMap<String, String>,

    /// The first row is data, not headers.
    pub first_row_is_data: bool,

    /// Fail the row on an unparseable float instead of storing NaN.
    pub fail_on_unparseable_number: bool,

    /// Trim whitespace around every cell.
    pub trim_cells: bool,

    /// Source encoding: `None` for UTF-8, `"auto"` to detect, or a label
    /// such as `"windows-1252"`.
    pub encoding: Option<String>,

    /// Separators tried by [`crate::parser::guess_separator`].
    pub separator_candidates: Vec<char>,

    /// Records read per separator candidate.
    pub sniff_lines: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            column_map: HashMap::new(),
            constants: HashMap::new(),
            first_row_is_data: false,
            fail_on_unparseable_number: false,
            trim_cells: false,
            encoding: None,
            separator_candidates: DEFAULT_SEPARATORS.to_vec(),
            sniff_lines: DEFAULT_SNIFF_LINES,
        }
    }
}

impl LoadConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Map a field to a 1-based column.
    pub fn with_column(mut self, field: &str, column: usize) -> Self {
        self.column_map.insert(field.to_string(), column);
        self
    }

    pub fn with_constant(mut self, key: &str, value: &str) -> Self {
        self.constants.insert(key.to_string(), value.to_string());
        self
    }

    /// Column mapped to `field`, if any. Zero counts as unmapped.
    pub fn mapped_column(&self, field: &str) -> Option<usize> {
        self.column_map.get(field).copied().filter(|&c| c > 0)
    }

    /// Separator candidates as bytes.
    pub fn separator_bytes(&self) -> ConfigResult<Vec<u8>> {
        self.separator_candidates.iter().map(|&c| delimiter_byte(c)).collect()
    }
}

/// A delimiter must be one ASCII character.
pub fn delimiter_byte(c: char) -> ConfigResult<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(ConfigError::InvalidDelimiter(c))
}
