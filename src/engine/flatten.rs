// src/engine/flatten.rs
//
// Depth-first flattening of nested JSON into (key, scalar) pairs.
//
// Arrays add no index segment: siblings share one key namespace, which is
// what lets the assembler see a repeated identity key as a record boundary.

use serde_json::Value;

use crate::engine::types::{FlatField, Scalar};
use crate::error::{Error, Result};

pub const KEY_SEP: &str = "_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyStyle {
    /// `employer` + `name` -> `employer_name`
    Qualified,
    /// Only the leaf key is kept (areas: nested children reuse `id`).
    Leaf,
}

/// Lazy depth-first walk over a JSON document. Restartable by calling
/// [`flatten`] again on the same value.
pub struct Flattener<'a> {
    style: KeyStyle,
    stack: Vec<Frame<'a>>,
}

enum Frame<'a> {
    Object { prefix: String, iter: serde_json::map::Iter<'a> },
    Array { prefix: String, iter: std::slice::Iter<'a, Value> },
}

/// Starts flattening `value`. Fails when the top level is not an object or array.
pub fn flatten(value: &Value, style: KeyStyle) -> Result<Flattener<'_>> {
    let root = match value {
        Value::Object(map) => Frame::Object { prefix: String::new(), iter: map.iter() },
        Value::Array(items) => Frame::Array { prefix: String::new(), iter: items.iter() },
        other => return Err(Error::UnsupportedShape { found: shape_name(other) }),
    };
    Ok(Flattener { style, stack: vec![root] })
}

fn shape_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Flattener<'_> {
    fn key_for(&self, prefix: &str, key: &str) -> String {
        match self.style {
            KeyStyle::Leaf => key.to_string(),
            KeyStyle::Qualified if prefix.is_empty() => key.to_string(),
            KeyStyle::Qualified => format!("{prefix}{KEY_SEP}{key}"),
        }
    }
}

impl Iterator for Flattener<'_> {
    type Item = FlatField;

    fn next(&mut self) -> Option<FlatField> {
        loop {
            let top = self.stack.last_mut()?;
            let (prefix, next) = match top {
                Frame::Object { prefix, iter } => match iter.next() {
                    Some((k, v)) => (prefix.clone(), Some((Some(k.as_str()), v))),
                    None => (String::new(), None),
                },
                Frame::Array { prefix, iter } => match iter.next() {
                    Some(v) => (prefix.clone(), Some((None, v))),
                    None => (String::new(), None),
                },
            };

            let Some((key, value)) = next else {
                self.stack.pop();
                continue;
            };

            // Array items keep the array's own prefix
            let path = match key {
                Some(k) => self.key_for(&prefix, k),
                None => prefix,
            };

            match value {
                Value::Object(map) => {
                    self.stack.push(Frame::Object { prefix: path, iter: map.iter() });
                }
                Value::Array(items) => {
                    self.stack.push(Frame::Array { prefix: path, iter: items.iter() });
                }
                leaf => {
                    let value = Scalar::from_json(leaf).unwrap_or(Scalar::Null);
                    return Some(FlatField { key: path, value });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(v: &Value, style: KeyStyle) -> Vec<String> {
        flatten(v, style).unwrap().map(|f| f.key).collect()
    }

    #[test]
    fn qualified_keys_join_with_underscore() {
        let v = json!({
            "id": "1",
            "employer": { "name": "Acme", "logo_urls": { "90": "x" } },
            "salary": null
        });
        assert_eq!(
            keys(&v, KeyStyle::Qualified),
            vec!["id", "employer_name", "employer_logo_urls_90", "salary"]
        );
    }

    #[test]
    fn array_items_share_prefix() {
        let v = json!({
            "address": { "metro_stations": [
                { "station_id": "1" },
                { "station_id": "2" }
            ]}
        });
        assert_eq!(
            keys(&v, KeyStyle::Qualified),
            vec!["address_metro_stations_station_id", "address_metro_stations_station_id"]
        );
    }

    #[test]
    fn leaf_style_drops_prefix() {
        let v = json!([
            { "id": "113", "parent_id": null, "name": "Россия", "areas": [
                { "id": "1", "parent_id": "113", "name": "Москва", "areas": [] }
            ]}
        ]);
        assert_eq!(
            keys(&v, KeyStyle::Leaf),
            vec!["id", "parent_id", "name", "id", "parent_id", "name"]
        );
    }

    #[test]
    fn count_matches_scalar_leaves_in_dfs_order() {
        let v = json!({ "a": [1, [2, 3], { "b": 4 }], "c": { "d": [] , "e": 5 }, "f": 6 });
        let values: Vec<Scalar> = flatten(&v, KeyStyle::Qualified).unwrap().map(|f| f.value).collect();
        assert_eq!(
            values,
            (1..=6).map(Scalar::Int).collect::<Vec<_>>()
        );
    }

    #[test]
    fn scalar_top_level_is_rejected() {
        assert!(matches!(
            flatten(&json!(42), KeyStyle::Qualified),
            Err(Error::UnsupportedShape { found: "number" })
        ));
        assert!(matches!(
            flatten(&Value::Null, KeyStyle::Leaf),
            Err(Error::UnsupportedShape { found: "null" })
        ));
    }

    #[test]
    fn restartable_on_reinvocation() {
        let v = json!({ "x": { "y": 1 } });
        let a: Vec<_> = flatten(&v, KeyStyle::Qualified).unwrap().collect();
        let b: Vec<_> = flatten(&v, KeyStyle::Qualified).unwrap().collect();
        assert_eq!(a, b);
    }
}
