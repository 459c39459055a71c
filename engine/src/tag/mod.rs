//! Field tag grammar.
//!
//! A tag tells the loader where a field's value comes from:
//!
//! ```text
//! col:<header>             value of the column with this header
//! mapConst:<key>           constant taken from the load configuration
//! intcols:colname          header text of each integer-headed column
//! intcols:value            cell under each integer-headed column
//! melt:colname             header text of each remaining (melt) column
//! melt:value               cell under each melt column
//! ignore:<a;b;c>           headers never considered for melt
//! ```
//!
//! Clauses are comma separated, e.g. `col:Name,ignore:Notes;Id`.
//! Unknown clause names are ignored.

use serde::Serialize;

use crate::error::{DirectiveError, DirectiveResult};

/// Parsed form of one field's tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldDirective {
    /// A non-empty tag was present.
    pub has_direct_directive: bool,
    pub target_column: Option<String>,
    pub is_constant: bool,
    pub constant_key: Option<String>,
    pub is_int_header: bool,
    pub is_int_value: bool,
    pub is_melt_header: bool,
    pub is_melt_value: bool,
    pub ignored_headers: Vec<String>,
}

/// Where a field gets its value when the caller did not map it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole<'a> {
    Constant(&'a str),
    IntHeader,
    IntValue,
    MeltHeader,
    MeltValue,
    Column(&'a str),
}

impl FieldDirective {
    /// The active role. A tag declaring several roles resolves as
    /// constant, int header, int value, melt header, melt value, col.
    pub fn role(&self) -> Option<FieldRole<'_>> {
        if let (true, Some(key)) = (self.is_constant, self.constant_key.as_deref()) {
            return Some(FieldRole::Constant(key));
        }
        if self.is_int_header {
            return Some(FieldRole::IntHeader);
        }
        if self.is_int_value {
            return Some(FieldRole::IntValue);
        }
        if self.is_melt_header {
            return Some(FieldRole::MeltHeader);
        }
        if self.is_melt_value {
            return Some(FieldRole::MeltValue);
        }
        self.target_column.as_deref().map(FieldRole::Column)
    }

    pub fn uses_intcols(&self) -> bool {
        self.is_int_header || self.is_int_value
    }

    pub fn uses_melt(&self) -> bool {
        self.is_melt_header || self.is_melt_value
    }
}

/// Parse a field tag. `None` or an empty tag yields an empty directive.
pub fn parse_directive(tag: Option<&str>, field: &str) -> DirectiveResult<FieldDirective> {
    let mut directive = FieldDirective::default();

    let tag = match tag {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Ok(directive),
    };
    directive.has_direct_directive = true;

    for clause in tag.split(',') {
        let clause = clause.trim();
        let (name, param) = match clause.split_once(':') {
            Some((name, param)) => (name.trim(), Some(param.trim()).filter(|p| !p.is_empty())),
            None => (clause, None),
        };

        match name {
            "col" => {
                let colname = require(param, field, "col", "col:<colname>")?;
                directive.target_column = Some(colname.to_string());
            }
            "mapConst" => {
                let key = require(param, field, "mapConst", "mapConst:<mapkey>")?;
                directive.is_constant = true;
                directive.constant_key = Some(key.to_string());
            }
            "intcols" => {
                let role = require(param, field, "intcols", "intcols:colname or intcols:value")?;
                let header = role.eq_ignore_ascii_case("colname");
                directive.is_int_header = header;
                directive.is_int_value = !header;
            }
            "melt" => {
                let role = require(param, field, "melt", "melt:colname or melt:value")?;
                let header = role.eq_ignore_ascii_case("colname");
                directive.is_melt_header = header;
                directive.is_melt_value = !header;
            }
            "ignore" => {
                if let Some(list) = param {
                    directive.ignored_headers.extend(
                        list.split(';')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string),
                    );
                }
            }
            _ => {}
        }
    }

    Ok(directive)
}

fn require<'a>(
    param: Option<&'a str>,
    field: &str,
    directive: &str,
    expected: &str,
) -> DirectiveResult<&'a str> {
    param.ok_or_else(|| DirectiveError::MissingParameter {
        field: field.to_string(),
        directive: directive.to_string(),
        expected: expected.to_string(),
    })
}

/// Check that each int/melt role is held by at most one field.
pub fn check_unique_roles<'a>(
    directives: impl IntoIterator<Item = (&'a str, &'a FieldDirective)>,
) -> DirectiveResult<()> {
    let mut holders: [Option<&str>; 4] = [None; 4];
    const ROLES: [&str; 4] = ["intcols:colname", "intcols:value", "melt:colname", "melt:value"];

    for (field, directive) in directives {
        let flags = [
            directive.is_int_header,
            directive.is_int_value,
            directive.is_melt_header,
            directive.is_melt_value,
        ];
        for (slot, (holder, set)) in holders.iter_mut().zip(flags).enumerate() {
            if !set {
                continue;
            }
            if let Some(first) = holder {
                return Err(DirectiveError::DuplicateRole {
                    role: ROLES[slot].to_string(),
                    first: first.to_string(),
                    second: field.to_string(),
                });
            }
            *holder = Some(field);
        }
    }
    Ok(())
}
