// src/engine/types.rs
use std::fmt;

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use serde_json::{Number, Value};

/// Leaf value of a flattened document.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Leaf conversion. Objects and arrays are not scalars.
    pub fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Self::from_number(n)),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            Scalar::Int(i)
        } else if n.is_u64() {
            // beyond i64::MAX, keep every digit
            Scalar::Text(n.to_string())
        } else {
            Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text is lower-cased for case-insensitive LIKE search: SQLite's
    /// NOCASE collation only folds ASCII. Everything else passes through.
    pub fn normalized(self) -> Self {
        match self {
            Scalar::Text(s) => Scalar::Text(s.to_lowercase()),
            other => other,
        }
    }

    /// Key form used when the value is reported in errors.
    pub fn as_key(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(t) => t.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self { Scalar::Text(s.to_string()) }
}
impl From<String> for Scalar {
    fn from(s: String) -> Self { Scalar::Text(s) }
}
impl From<i64> for Scalar {
    fn from(i: i64) -> Self { Scalar::Int(i) }
}
impl From<i32> for Scalar {
    fn from(i: i32) -> Self { Scalar::Int(i64::from(i)) }
}

impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Null => ToSqlOutput::Owned(SqlValue::Null),
            Scalar::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Scalar::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Scalar::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Scalar::Text(t) => ToSqlOutput::from(t.as_str()),
        })
    }
}

/// One flattened `(qualified_key, value)` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatField {
    pub key: String,
    pub value: Scalar,
}

impl FlatField {
    pub fn new(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Ordered column -> value mapping. Writing an existing column replaces its
/// value in place, so the last sibling wins and column order stays stable.
/// Column names match ASCII case-insensitively (one SQL column); the first
/// spelling is kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, key: impl Into<String>, value: Scalar) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.fields.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool { self.get(key).is_some() }
    pub fn len(&self) -> usize { self.fields.len() }
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when at least one of `keys` holds a non-null value.
    pub fn any_present(&self, keys: &[String]) -> bool {
        keys.iter().any(|k| self.get(k).is_some_and(|v| !v.is_null()))
    }
}

impl<K: Into<String>> FromIterator<(K, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Scalar)>>(iter: I) -> Self {
        let mut r = Record::new();
        for (k, v) in iter {
            r.insert(k, v);
        }
        r
    }
}
