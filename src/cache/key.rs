//! Deterministic cache key construction.
//!
//! Parameterized queries need keys that are stable across call sites, so
//! parameters are sorted by name before rendering: two callers passing the
//! same parameters in different order get the same key. Keys look like
//! `prefix:a:1|b:2026-08-07|c:null`, which also makes whole families of
//! keys removable with `PersistentCache::invalidate_prefix`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

/// A parameter value usable in a cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    /// Rendered as the literal `null`, so "no filter" and "filter absent"
    /// produce the same key.
    Null,
}

impl fmt::Display for KeyParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyParam::Text(s) => f.write_str(s),
            KeyParam::Int(n) => write!(f, "{}", n),
            KeyParam::Float(x) => write!(f, "{}", x),
            KeyParam::Bool(b) => write!(f, "{}", b),
            KeyParam::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            KeyParam::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for KeyParam {
    fn from(value: &str) -> Self {
        KeyParam::Text(value.to_string())
    }
}

impl From<String> for KeyParam {
    fn from(value: String) -> Self {
        KeyParam::Text(value)
    }
}

impl From<i64> for KeyParam {
    fn from(value: i64) -> Self {
        KeyParam::Int(value)
    }
}

impl From<i32> for KeyParam {
    fn from(value: i32) -> Self {
        KeyParam::Int(value as i64)
    }
}

impl From<f64> for KeyParam {
    fn from(value: f64) -> Self {
        KeyParam::Float(value)
    }
}

impl From<bool> for KeyParam {
    fn from(value: bool) -> Self {
        KeyParam::Bool(value)
    }
}

impl From<NaiveDate> for KeyParam {
    fn from(value: NaiveDate) -> Self {
        KeyParam::Date(value)
    }
}

impl From<DateTime<Utc>> for KeyParam {
    fn from(value: DateTime<Utc>) -> Self {
        KeyParam::Date(value.date_naive())
    }
}

impl<T: Into<KeyParam>> From<Option<T>> for KeyParam {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => KeyParam::Null,
        }
    }
}

/// Build a deterministic cache key from a prefix and named parameters.
///
/// Parameters are sorted by name, rendered as `name:value`, joined with
/// `|`, and prefixed with `prefix:`. Iteration order of the input never
/// affects the result.
pub fn cache_key<I, K, V>(prefix: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<KeyParam>,
{
    let sorted: BTreeMap<String, KeyParam> = params
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect();

    let parts: Vec<String> = sorted
        .iter()
        .map(|(name, value)| format!("{}:{}", name, value))
        .collect();

    format!("{}:{}", prefix, parts.join("|"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = cache_key("iteration-logs", [("client", "Acme")]);
        let b = cache_key("iteration-logs", [("client", "Acme")]);
        assert_eq!(a, b);
        assert_eq!(a, "iteration-logs:client:Acme");
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = cache_key("q", [("a", KeyParam::Int(1)), ("b", KeyParam::Int(2))]);
        let b = cache_key("q", [("b", KeyParam::Int(2)), ("a", KeyParam::Int(1))]);
        assert_eq!(a, b);
        assert_eq!(a, "q:a:1|b:2");
    }

    #[test]
    fn test_different_params_differ() {
        let a = cache_key("iteration-logs", [("client", "Acme")]);
        let b = cache_key("iteration-logs", [("client", "Other")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_date_renders_as_ymd() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let key = cache_key("orders", [("since", date)]);
        assert_eq!(key, "orders:since:2026-08-07");
    }

    #[test]
    fn test_none_renders_as_null() {
        let key = cache_key("orders", [("client", Option::<&str>::None)]);
        assert_eq!(key, "orders:client:null");
    }

    #[test]
    fn test_mixed_param_types() {
        let key = cache_key(
            "report",
            [
                ("page", KeyParam::Int(3)),
                ("archived", KeyParam::Bool(false)),
                ("client", KeyParam::Text("Acme".to_string())),
            ],
        );
        assert_eq!(key, "report:archived:false|client:Acme|page:3");
    }

    #[test]
    fn test_empty_params() {
        let key = cache_key("clients", std::iter::empty::<(String, KeyParam)>());
        assert_eq!(key, "clients:");
    }
}
