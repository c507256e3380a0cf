//! Deep diff between an update payload and the stored document.
//!
//! The diff is driven by the new object: keys only present in the stored document are never
//! reported. Nested objects are diffed recursively; arrays count as changed only when the
//! new array holds an element the old one lacks.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiffResult {
    pub new: Map<String, Value>,
    pub old: Map<String, Value>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.old.is_empty()
    }
}

pub fn diff(new: &Map<String, Value>, old: &Map<String, Value>) -> DiffResult {
    let mut out = DiffResult::default();
    for (key, new_value) in new {
        let Some(old_value) = old.get(key) else {
            out.new.insert(key.clone(), new_value.clone());
            continue;
        };
        if same_value(new_value, old_value) {
            continue;
        }
        match (new_value, old_value) {
            (Value::Array(n), Value::Array(o)) => {
                if n.iter().any(|item| !o.iter().any(|prev| same_value(item, prev))) {
                    out.new.insert(key.clone(), new_value.clone());
                    out.old.insert(key.clone(), old_value.clone());
                }
            }
            (Value::Object(n), Value::Object(o)) => {
                let nested = diff(n, o);
                if !nested.new.is_empty() {
                    out.new.insert(key.clone(), Value::Object(nested.new));
                }
                if !nested.old.is_empty() {
                    out.old.insert(key.clone(), Value::Object(nested.old));
                }
            }
            _ => {
                out.new.insert(key.clone(), new_value.clone());
                out.old.insert(key.clone(), old_value.clone());
            }
        }
    }
    out
}

/// Structural equality; numbers compare by value so `1` equals `1.0`.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| same_value(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).map(|w| same_value(v, w)).unwrap_or(false))
        }
        _ => a == b,
    }
}
