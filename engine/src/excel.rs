//! Spreadsheet column ids: `A` is 1, `Z` is 26, `AA` is 27, `XFD` is 16384.

use serde::{Deserialize, Serialize};

use crate::error::{ExcelError, ExcelResult};

/// Last column of a modern spreadsheet (`XFD`).
pub const DEFAULT_MAX_COLUMN: u32 = 16384;

/// Characters stripped from both ends of a column id, so `"B2"` or
/// `" C: "` are read as `B` and `C`.
const ID_TRIM: &[char] = &[' ', ',', ';', '.', ':', '|', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Column id arithmetic with a configurable last column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcelColumns {
    pub max_column: u32,
}

impl Default for ExcelColumns {
    fn default() -> Self {
        Self { max_column: DEFAULT_MAX_COLUMN }
    }
}

impl ExcelColumns {
    pub fn new(max_column: u32) -> Self {
        Self { max_column }
    }

    /// Column number of a letter id such as `"AB"`.
    pub fn id_to_number(&self, id: &str) -> ExcelResult<u32> {
        let letters = id.trim_matches(ID_TRIM).to_uppercase();
        let well_formed = regex::Regex::new(r"^[A-Z]{1,3}$")
            .ok()
            .is_some_and(|re| re.is_match(&letters));
        if !well_formed {
            return Err(ExcelError::InvalidColumnId(id.to_string()));
        }

        let number = letters
            .bytes()
            .fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1));
        self.check(i64::from(number))?;
        Ok(number)
    }

    /// Letter id of a column number.
    pub fn number_to_id(&self, number: i64) -> ExcelResult<String> {
        self.check(number)?;

        let mut rest = number;
        let mut letters = Vec::new();
        while rest > 0 {
            let digit = ((rest - 1) % 26) as u8;
            letters.push(char::from(b'A' + digit));
            rest = (rest - 1) / 26;
        }
        Ok(letters.into_iter().rev().collect())
    }

    fn check(&self, number: i64) -> ExcelResult<()> {
        if number < 1 || number > i64::from(self.max_column) {
            return Err(ExcelError::ColumnOutOfRange {
                number,
                max: self.max_column,
            });
        }
        Ok(())
    }
}

/// [`ExcelColumns::id_to_number`] with the default maximum.
pub fn column_id_to_number(id: &str) -> ExcelResult<u32> {
    ExcelColumns::default().id_to_number(id)
}

/// [`ExcelColumns::number_to_id`] with the default maximum.
pub fn column_number_to_id(number: i64) -> ExcelResult<String> {
    ExcelColumns::default().number_to_id(number)
}
