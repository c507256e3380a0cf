//! Single-document operations: read, create, update with diff, delete.

use crate::diff::diff;
use crate::entities::EntityDef;
use crate::error::AppError;
use crate::merge::assign_deep;
use crate::service::strip_hidden;
use crate::store::DocumentStore;
use serde::Serialize;
use serde_json::{Map, Value};

/// Body of a successful update: what changed, before and after.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub id: String,
    pub new: Map<String, Value>,
    pub old: Map<String, Value>,
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::missing("body must be a JSON object")),
    }
}

fn not_found(entity: &EntityDef, id: &str) -> AppError {
    AppError::NotFound(format!("{} {}", entity.path_segment, id))
}

pub struct CrudService;

impl CrudService {
    /// Fetch one document, optionally reduced to `fields` (plus `id`).
    pub async fn read(
        store: &dyn DocumentStore,
        entity: &EntityDef,
        id: &str,
        fields: Option<&[String]>,
    ) -> Result<Value, AppError> {
        let projection = fields.map(|names| entity.project(names));
        let mut doc = store
            .find_by_id(entity, id, projection.as_deref())
            .await?
            .ok_or_else(|| not_found(entity, id))?;
        strip_hidden(entity, &mut doc);
        Ok(doc)
    }

    /// Insert a new document. A client-supplied `id` is ignored.
    pub async fn create(store: &dyn DocumentStore, entity: &EntityDef, body: Value) -> Result<Value, AppError> {
        let mut doc = body_to_map(body)?;
        doc.remove("id");
        let mut created = store.insert(entity, doc).await?;
        let id = created.get("id").and_then(|v| v.as_str()).unwrap_or_default();
        tracing::info!(entity = entity.path_segment, id, "created");
        strip_hidden(entity, &mut created);
        Ok(created)
    }

    /// Diff the patch against the stored document, deep-merge it and store the result.
    pub async fn update(
        store: &dyn DocumentStore,
        entity: &EntityDef,
        id: &str,
        body: Value,
    ) -> Result<UpdateOutcome, AppError> {
        let mut patch = body_to_map(body)?;
        patch.remove("id");
        let current = match store.find_by_id(entity, id, None).await? {
            Some(Value::Object(doc)) => doc,
            Some(_) => {
                return Err(AppError::Internal(format!(
                    "{} {} is not a JSON object",
                    entity.path_segment, id
                )))
            }
            None => return Err(not_found(entity, id)),
        };

        let mut changes = diff(&patch, &current);
        let mut merged = current;
        assign_deep(&mut merged, &patch);
        store
            .replace(entity, id, merged)
            .await?
            .ok_or_else(|| not_found(entity, id))?;

        for key in entity.hidden {
            changes.new.remove(*key);
            changes.old.remove(*key);
        }
        tracing::info!(entity = entity.path_segment, id, changed = changes.new.len(), "updated");
        Ok(UpdateOutcome {
            id: id.to_string(),
            new: changes.new,
            old: changes.old,
        })
    }

    pub async fn delete(store: &dyn DocumentStore, entity: &EntityDef, id: &str) -> Result<(), AppError> {
        if store.delete(entity, id).await? {
            tracing::info!(entity = entity.path_segment, id, "deleted");
            Ok(())
        } else {
            Err(not_found(entity, id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{SCHOOLS, USERS};
    use crate::store::MemoryStore;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn created(store: &MemoryStore, body: Value) -> String {
        let doc = CrudService::create(store, &SCHOOLS, body).await.unwrap();
        doc["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_assigns_fresh_id() {
        let store = MemoryStore::new();
        let doc = CrudService::create(&store, &SCHOOLS, json!({"id": "mine", "name": "Oak"}))
            .await
            .unwrap();
        assert_ne!(doc["id"], json!("mine"));
        assert!(uuid::Uuid::parse_str(doc["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn create_rejects_non_objects() {
        let store = MemoryStore::new();
        let err = CrudService::create(&store, &SCHOOLS, json!([1, 2])).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_reports_diff_and_merges_nested() {
        let store = MemoryStore::new();
        let id = created(
            &store,
            json!({"name": "Oak", "address": {"city": "A", "zip": "1"}, "areas": ["math"]}),
        )
        .await;

        let outcome = CrudService::update(
            &store,
            &SCHOOLS,
            &id,
            json!({"name": "Oak", "address": {"city": "B"}, "areas": ["math", "art"]}),
        )
        .await
        .unwrap();
        assert_eq!(outcome.id, id);
        assert_eq!(
            Value::Object(outcome.new),
            json!({"address": {"city": "B"}, "areas": ["math", "art"]})
        );
        assert_eq!(
            Value::Object(outcome.old),
            json!({"address": {"city": "A"}, "areas": ["math"]})
        );

        let stored = CrudService::read(&store, &SCHOOLS, &id, None).await.unwrap();
        assert_eq!(stored["address"], json!({"city": "B", "zip": "1"}));
        assert_eq!(stored["areas"], json!(["math", "art"]));
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = CrudService::update(&store, &SCHOOLS, &uuid::Uuid::new_v4().to_string(), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn read_projects_requested_fields() {
        let store = MemoryStore::new();
        let id = created(&store, json!({"name": "Oak", "students": 10})).await;
        let doc = CrudService::read(&store, &SCHOOLS, &id, Some(&["students".to_string()][..]))
            .await
            .unwrap();
        assert_eq!(doc, json!({"id": id, "students": 10}));
    }

    #[tokio::test]
    async fn hidden_keys_are_stripped() {
        let store = MemoryStore::new();
        let doc = CrudService::create(&store, &USERS, json!({"name": "Ana", "password": "x"}))
            .await
            .unwrap();
        assert!(doc.get("password").is_none());
        let id = doc["id"].as_str().unwrap().to_string();
        let outcome = CrudService::update(&store, &USERS, &id, json!({"password": "y"}))
            .await
            .unwrap();
        assert!(outcome.new.is_empty());
        assert!(outcome.old.is_empty());
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let store = MemoryStore::new();
        let id = created(&store, json!({"name": "Oak"})).await;
        CrudService::delete(&store, &SCHOOLS, &id).await.unwrap();
        let err = CrudService::delete(&store, &SCHOOLS, &id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
