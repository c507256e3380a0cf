//! Shared application state for all routes.

use crate::auth::AccessPolicy;
use crate::entities::{EntityDef, EntityRegistry};
use crate::error::AppError;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub registry: Arc<EntityRegistry>,
    pub policy: Arc<dyn AccessPolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, policy: Arc<dyn AccessPolicy>) -> Self {
        AppState {
            store,
            registry: Arc::new(EntityRegistry::default()),
            policy,
        }
    }

    pub fn entity(&self, path_segment: &str) -> Result<&'static EntityDef, AppError> {
        self.registry
            .entity_by_path(path_segment)
            .ok_or_else(|| AppError::NotFound(format!("entity {}", path_segment)))
    }
}
