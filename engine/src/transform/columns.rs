//! Header row resolution.
//!
//! Runs once per file and decides which headers are plain columns, which
//! are integer-headed (`1998`, `1999`, ...) and which are melt candidates.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::tag::FieldDirective;

/// What the header row tells the expansion engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnResolution {
    /// Header text to 1-based column. Later duplicates win.
    pub header_to_index: HashMap<String, usize>,
    /// Headers that parse as integers, left to right.
    pub integer_headed: Vec<String>,
    /// Headers left over for melt expansion, left to right.
    pub melt_candidates: Vec<String>,
}

impl ColumnResolution {
    /// 1-based column of a header.
    pub fn index_of(&self, header: &str) -> Option<usize> {
        self.header_to_index.get(header).copied()
    }
}

/// Resolve the header row against the schema's directives.
///
/// `column_map` is the caller's field to 1-based column mapping; headers at
/// mapped positions are never melt candidates.
pub fn resolve_columns(
    headers: &[String],
    directives: &[FieldDirective],
    column_map: &HashMap<String, usize>,
) -> ColumnResolution {
    let header_to_index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty())
        .map(|(i, h)| (h.clone(), i + 1))
        .collect();

    let integer_headed: Vec<String> = headers
        .iter()
        .filter(|h| !h.is_empty() && h.parse::<i64>().is_ok())
        .cloned()
        .collect();

    let int_active = directives.iter().any(FieldDirective::uses_intcols);

    let mut excluded: HashSet<&str> = HashSet::new();
    for &index in column_map.values() {
        if let Some(header) = index.checked_sub(1).and_then(|i| headers.get(i)) {
            excluded.insert(header.as_str());
        }
    }
    for directive in directives {
        excluded.extend(directive.target_column.as_deref());
        excluded.extend(directive.constant_key.as_deref().filter(|_| directive.is_constant));
        excluded.extend(directive.ignored_headers.iter().map(String::as_str));
    }
    if int_active {
        excluded.extend(integer_headed.iter().map(String::as_str));
    }

    let melt_candidates = headers
        .iter()
        .filter(|h| !h.is_empty() && !excluded.contains(h.as_str()))
        .cloned()
        .collect();

    ColumnResolution {
        header_to_index,
        integer_headed,
        melt_candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::parse_directive;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn directives(tags: &[&str]) -> Vec<FieldDirective> {
        tags.iter()
            .map(|t| parse_directive(Some(t), "field").unwrap())
            .collect()
    }

    #[test]
    fn test_duplicate_headers_last_wins() {
        let res = resolve_columns(&headers(&["A", "B", "A"]), &[], &HashMap::new());
        assert_eq!(res.header_to_index.len(), 2);
        assert_eq!(res.index_of("A"), Some(3));
        assert_eq!(res.index_of("B"), Some(2));
    }

    #[test]
    fn test_empty_headers_skipped() {
        let res = resolve_columns(&headers(&["", "Name", ""]), &[], &HashMap::new());
        assert_eq!(res.index_of(""), None);
        assert_eq!(res.melt_candidates, vec!["Name"]);
    }

    #[test]
    fn test_integer_headed() {
        let res = resolve_columns(
            &headers(&["Name", "1998", "x1", "-5", "1999"]),
            &directives(&["col:Name", "intcols:colname", "intcols:value"]),
            &HashMap::new(),
        );
        assert_eq!(res.integer_headed, vec!["1998", "-5", "1999"]);
        // int expansion active, so integer headers are not melt candidates
        assert_eq!(res.melt_candidates, vec!["x1"]);
    }

    #[test]
    fn test_integer_headers_melt_without_intcols() {
        let res = resolve_columns(
            &headers(&["Name", "1998", "1999"]),
            &directives(&["col:Name", "melt:colname", "melt:value"]),
            &HashMap::new(),
        );
        assert_eq!(res.integer_headed, vec!["1998", "1999"]);
        assert_eq!(res.melt_candidates, vec!["1998", "1999"]);
    }

    #[test]
    fn test_melt_exclusions() {
        let hdrs = headers(&["Id", "Name", "Country", "Notes", "Red", "Green", "Blue"]);
        let dirs = directives(&[
            "col:Name",
            "mapConst:Country",
            "melt:colname,ignore:Notes",
            "melt:value",
        ]);
        let column_map = HashMap::from([("Key".to_string(), 1), ("Unmapped".to_string(), 0)]);

        let res = resolve_columns(&hdrs, &dirs, &column_map);
        assert_eq!(res.melt_candidates, vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn test_mapped_index_past_headers() {
        let column_map = HashMap::from([("Key".to_string(), 9)]);
        let res = resolve_columns(&headers(&["A", "B"]), &[], &column_map);
        assert_eq!(res.melt_candidates, vec!["A", "B"]);
    }
}
