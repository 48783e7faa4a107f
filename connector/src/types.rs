use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::NaiveDateTime;

/// Owned result-cell value produced by a driver binding.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
}

/// Column families a custom parser can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    Int,
    Float,
    Decimal,
    String,
    Binary,
    DateTime,
    Guid,
    Other,
}

pub type TypeParser = dyn Fn(&str) -> SqlValue + Send + Sync;

/// Process-scoped registry of custom result-value parsers.
///
/// Constructed once at startup and shared by reference with every adapter
/// that needs it; there is deliberately no hidden global instance. The
/// registry starts empty and drivers fall back to their built-in conversion
/// for any type without a registered parser.
///
/// `refresh` and `clear` are safe to call concurrently with in-flight
/// connects: parsers are looked up per value read, so a change affects only
/// subsequently-read result values.
#[derive(Default)]
pub struct TypeParserRegistry {
    parsers: RwLock<HashMap<SqlType, Arc<TypeParser>>>,
}

impl TypeParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the parser for one column family.
    pub fn refresh<F>(&self, sql_type: SqlType, parser: F)
    where
        F: Fn(&str) -> SqlValue + Send + Sync + 'static,
    {
        let mut parsers = self.parsers.write().expect("parser registry lock poisoned");
        parsers.insert(sql_type, Arc::new(parser));
    }

    /// Drop all registered parsers, restoring built-in conversion everywhere.
    pub fn clear(&self) {
        let mut parsers = self.parsers.write().expect("parser registry lock poisoned");
        parsers.clear();
    }

    /// Snapshot lookup; the returned parser stays valid across a later
    /// `refresh` or `clear`.
    pub fn parser_for(&self, sql_type: SqlType) -> Option<Arc<TypeParser>> {
        let parsers = self.parsers.read().expect("parser registry lock poisoned");
        parsers.get(&sql_type).cloned()
    }

    /// Apply the registered parser to a raw textual value, if one exists.
    pub fn parse(&self, sql_type: SqlType, raw: &str) -> Option<SqlValue> {
        self.parser_for(sql_type).map(|parser| parser(raw))
    }

    pub fn is_empty(&self) -> bool {
        let parsers = self.parsers.read().expect("parser registry lock poisoned");
        parsers.is_empty()
    }
}

impl fmt::Debug for TypeParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parsers = self.parsers.read().expect("parser registry lock poisoned");
        f.debug_struct("TypeParserRegistry")
            .field("registered", &parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_empty() {
        let registry = TypeParserRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.parser_for(SqlType::Int).is_none());
        assert_eq!(registry.parse(SqlType::Int, "42"), None);
    }

    #[test]
    fn test_refresh_replaces_parser() {
        let registry = TypeParserRegistry::new();

        registry.refresh(SqlType::Int, |raw| SqlValue::String(raw.to_owned()));
        assert_eq!(
            registry.parse(SqlType::Int, "42"),
            Some(SqlValue::String("42".to_owned()))
        );

        registry.refresh(SqlType::Int, |raw| {
            SqlValue::Int(raw.parse().unwrap_or_default())
        });
        assert_eq!(registry.parse(SqlType::Int, "42"), Some(SqlValue::Int(42)));
    }

    #[test]
    fn test_clear_removes_all_parsers() {
        let registry = TypeParserRegistry::new();
        registry.refresh(SqlType::Int, |_| SqlValue::Null);
        registry.refresh(SqlType::Guid, |raw| SqlValue::String(raw.to_owned()));

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.parser_for(SqlType::Guid).is_none());
    }

    #[test]
    fn test_snapshot_survives_refresh() {
        let registry = TypeParserRegistry::new();
        registry.refresh(SqlType::Decimal, |_| SqlValue::Int(1));

        let snapshot = registry.parser_for(SqlType::Decimal).expect("registered");
        registry.refresh(SqlType::Decimal, |_| SqlValue::Int(2));

        // the earlier snapshot keeps returning the value it was taken with
        assert_eq!(snapshot("x"), SqlValue::Int(1));
        assert_eq!(registry.parse(SqlType::Decimal, "x"), Some(SqlValue::Int(2)));
    }

    #[test]
    fn test_concurrent_refresh_and_parse() {
        let registry = Arc::new(TypeParserRegistry::new());
        registry.refresh(SqlType::Int, |_| SqlValue::Int(0));

        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for i in 0..100i64 {
                    registry.refresh(SqlType::Int, move |_| SqlValue::Int(i));
                }
            })
        };

        for _ in 0..100 {
            let value = registry.parse(SqlType::Int, "x").expect("parser registered");
            assert!(matches!(value, SqlValue::Int(_)));
        }

        writer.join().expect("writer thread");
    }
}
