//! Storage collaborator: a document store queried with normalized filter sets.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgDocumentStore};

use crate::entities::EntityDef;
use crate::error::AppError;
use crate::query::FilterSet;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One window of results. Stores fetch `limit + 1` rows; the extra row only sets `has_more`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageResult {
    pub results: Vec<Value>,
    pub has_more: bool,
}

impl PageResult {
    pub fn from_window(mut rows: Vec<Value>, limit: u32) -> Self {
        let limit = limit as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        PageResult { results: rows, has_more }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Idempotent creation of backing tables.
    async fn ensure_tables(&self, entities: &[&'static EntityDef]) -> Result<(), AppError>;

    async fn ping(&self) -> Result<(), AppError>;

    /// Applies equality, list and range filters on schema fields (other keys are ignored),
    /// sorts by the pagination sort field and returns the requested window.
    async fn query(
        &self,
        entity: &EntityDef,
        filters: &FilterSet,
        projection: Option<&[&str]>,
    ) -> Result<PageResult, AppError>;

    async fn find_by_id(
        &self,
        entity: &EntityDef,
        id: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Value>, AppError>;

    /// Stores a new document under a fresh UUID, written to its `id` key.
    async fn insert(&self, entity: &EntityDef, doc: Map<String, Value>) -> Result<Value, AppError>;

    async fn replace(
        &self,
        entity: &EntityDef,
        id: &str,
        doc: Map<String, Value>,
    ) -> Result<Option<Value>, AppError>;

    async fn delete(&self, entity: &EntityDef, id: &str) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_row_sets_has_more_and_is_dropped() {
        let page = PageResult::from_window(vec![json!(1), json!(2), json!(3)], 2);
        assert!(page.has_more);
        assert_eq!(page.results, vec![json!(1), json!(2)]);
    }

    #[test]
    fn short_window_has_no_more() {
        let page = PageResult::from_window(vec![json!(1), json!(2)], 2);
        assert!(!page.has_more);
        assert_eq!(page.results.len(), 2);
    }
}
