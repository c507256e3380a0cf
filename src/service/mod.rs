//! Orchestration between the HTTP layer, the query pipeline and the document store.

mod crud;
mod query;

pub use crud::{CrudService, UpdateOutcome};
pub use query::{ListPage, QueryService};

use crate::entities::EntityDef;
use crate::query::{Filter, FilterSet};
use serde_json::Value;

/// Names requested through the `fields` parameter, if any non-empty name was given.
pub(crate) fn requested_fields(filters: &FilterSet) -> Option<Vec<String>> {
    let names: Vec<String> = match filters.get("fields")? {
        Filter::Scalar(s) => vec![s.clone()],
        Filter::List(items) => items.clone(),
        Filter::Range(_) => return None,
    };
    let names: Vec<String> = names.into_iter().filter(|n| !n.is_empty()).collect();
    (!names.is_empty()).then_some(names)
}

/// Removes keys that must never leave the service.
pub(crate) fn strip_hidden(entity: &EntityDef, doc: &mut Value) {
    if let Value::Object(map) = doc {
        for key in entity.hidden {
            map.remove(*key);
        }
    }
}
