// ABOUTME: Column value representation shared by the store trait and the engine
// ABOUTME: Provides the hashable coercion used to build primary-key tuples

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A single column value, as returned by the relational store.
///
/// Opaque to the engine except where primary-key tuples must be hashable
/// (`Row::pk_tuple`) — arrays are the one place that bites, since a `Vec` is
/// not `Hash`/`Eq` and Postgres array columns show up as array values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Hashable coercion of a [`Value`], used as the element type of a
/// primary-key tuple. Floats are bit-cast so `PkValue` can implement `Eq`
/// and `Hash`; arrays recurse into `PkValue::Tuple`, matching the "lists
/// must be converted recursively to tuples" rule for composite/array keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PkValue {
    Null,
    Bool(bool),
    Int(i64),
    FloatBits(u64),
    Text(String),
    Bytes(Vec<u8>),
    Json(String),
    Tuple(Vec<PkValue>),
}

impl From<&Value> for PkValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => PkValue::Null,
            Value::Bool(b) => PkValue::Bool(*b),
            Value::Int(i) => PkValue::Int(*i),
            Value::Float(f) => PkValue::FloatBits(f.to_bits()),
            Value::Text(s) => PkValue::Text(s.clone()),
            Value::Bytes(b) => PkValue::Bytes(b.clone()),
            Value::Json(j) => PkValue::Json(canonical_json(j)),
            Value::Array(items) => PkValue::Tuple(items.iter().map(PkValue::from).collect()),
        }
    }
}

/// A stable string encoding of a JSON value, used only to make JSON values
/// participate in a hashable primary-key tuple. Object keys are sorted so
/// the encoding doesn't depend on field order.
fn canonical_json(v: &serde_json::Value) -> String {
    fn sort(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Object(map) => {
                let sorted: BTreeMap<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), sort(v)))
                    .collect();
                serde_json::Value::Object(sorted.into_iter().collect())
            }
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(sort).collect())
            }
            other => other.clone(),
        }
    }
    sort(v).to_string()
}

impl PartialOrd for PkValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PkValue {
    fn cmp(&self, other: &Self) -> Ordering {
        format!("{:?}", self).cmp(&format!("{:?}", other))
    }
}
