//! Directive cache - parse each field tag once per process
//!
//! Directives depend only on the tag text, so they are shared read-only
//! between loads. Entries are keyed by schema name, field name and tag, which
//! keeps two schemas reusing a name from seeing each other's directives.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::DirectiveResult;
use crate::schema::Schema;
use crate::tag::{check_unique_roles, parse_directive, FieldDirective};

/// Process-wide cache used by the loader
pub static DIRECTIVE_CACHE: Lazy<DirectiveCache> = Lazy::new(DirectiveCache::new);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    schema: String,
    field: String,
    tag: Option<String>,
}

/// Cache of parsed field directives
#[derive(Debug, Default)]
pub struct DirectiveCache {
    entries: RwLock<HashMap<CacheKey, Arc<FieldDirective>>>,
}

impl DirectiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directive for one field, parsed on first use
    pub fn get_or_parse(&self, schema: &str, field: &str, tag: Option<&str>) -> DirectiveResult<Arc<FieldDirective>> {
        let key = CacheKey {
            schema: schema.to_string(),
            field: field.to_string(),
            tag: tag.map(str::to_string),
        };

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(found) = entries.get(&key) {
                return Ok(Arc::clone(found));
            }
        }

        // errors are not cached, the tag is reported again on the next load
        let directive = Arc::new(parse_directive(tag, field)?);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(entries.entry(key).or_insert(directive)))
    }

    /// Directives for every field of a schema, in field order
    ///
    /// Also checks that each int/melt role has a single holder.
    pub fn directives_for<R>(&self, schema: &Schema<R>) -> DirectiveResult<Vec<Arc<FieldDirective>>> {
        let directives = schema
            .fields()
            .iter()
            .map(|f| self.get_or_parse(schema.name(), &f.name, f.tag.as_deref()))
            .collect::<DirectiveResult<Vec<_>>>()?;

        check_unique_roles(
            schema
                .fields()
                .iter()
                .map(|f| f.name.as_str())
                .zip(directives.iter().map(|d| d.as_ref())),
        )?;
        Ok(directives)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Reading {
        sensor: String,
        value: f64,
    }

    #[test]
    fn test_parse_once() {
        let cache = DirectiveCache::new();
        let a = cache.get_or_parse("Apple", "Name", Some("col:Name")).unwrap();
        let b = cache.get_or_parse("Apple", "Name", Some("col:Name")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keyed_by_tag() {
        let cache = DirectiveCache::new();
        let a = cache.get_or_parse("record", "Name", Some("col:Name")).unwrap();
        let b = cache.get_or_parse("record", "Name", Some("col:Title")).unwrap();
        assert_eq!(a.target_column.as_deref(), Some("Name"));
        assert_eq!(b.target_column.as_deref(), Some("Title"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_not_cached() {
        let cache = DirectiveCache::new();
        assert!(cache.get_or_parse("Apple", "Name", Some("col")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_directives_for_schema() {
        let schema = Schema::<Reading>::builder()
            .field("Sensor", "melt:colname", |r: &mut Reading, v: String| r.sensor = v)
            .field("Value", "melt:value", |r: &mut Reading, v: f64| r.value = v)
            .build();
        let cache = DirectiveCache::new();
        let directives = cache.directives_for(&schema).unwrap();
        assert_eq!(directives.len(), 2);
        assert!(directives[0].is_melt_header);
        assert!(directives[1].is_melt_value);

        let clash = Schema::<Reading>::builder()
            .name("Clash")
            .field("Sensor", "melt:value", |r: &mut Reading, v: String| r.sensor = v)
            .field("Value", "melt:value", |r: &mut Reading, v: f64| r.value = v)
            .build();
        assert!(cache.directives_for(&clash).is_err());
    }
}
