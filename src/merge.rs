//! Deep assignment used to apply partial updates.

use serde_json::{Map, Value};

/// Applies `patch` onto `target`. Nested objects present on both sides are merged key by
/// key; anything else (arrays included) replaces the target value with a copy.
pub fn assign_deep<'a>(target: &'a mut Map<String, Value>, patch: &Map<String, Value>) -> &'a mut Map<String, Value> {
    for (key, value) in patch {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (target.get_mut(key), value) {
            assign_deep(existing, nested);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
    target
}
