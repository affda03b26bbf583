//! dataset::query
//!
//! Metadata filters for [`crate::DataSet::find_items`].
//!
//! # Matching
//!
//! A query is a set of `key = value` conditions, all of which must hold:
//!
//! - A missing key never matches
//! - A scalar or object value matches by equality
//! - A list value matches an equal list, or any single member of the list
//!
//! Numbers compare by value, so `1` matches `1.0`.
//!
//! # Example
//!
//! ```
//! use jbof::Query;
//! use serde_json::json;
//!
//! let query = Query::new().equals("speaker", "ann").one_of("take", [1, 2]);
//! let meta = json!({"speaker": "ann", "take": 2, "noise": true});
//! assert!(query.matches(meta.as_object().unwrap()));
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::metadata::Metadata;

/// Conjunction of metadata conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: BTreeMap<String, Value>,
}

impl Query {
    /// A query that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`. A list `value` also accepts any of
    /// its members.
    pub fn equals(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// Require `key` to be one of `values`.
    pub fn one_of<V: Into<Value>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let list = values.into_iter().map(Into::into).collect();
        self.conditions.insert(key.into(), Value::Array(list));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `metadata` satisfies every condition.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions.iter().all(|(key, wanted)| {
            let Some(actual) = metadata.get(key) else {
                return false;
            };
            match wanted {
                Value::Array(list) => {
                    values_equal(actual, wanted) || list.iter().any(|v| values_equal(actual, v))
                }
                _ => values_equal(actual, wanted),
            }
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Query::new(), |query, (k, v)| query.equals(k, v))
    }
}

impl From<Metadata> for Query {
    fn from(metadata: Metadata) -> Self {
        metadata.into_iter().collect()
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}
