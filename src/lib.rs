//! Education directory backend: query normalization, deep diff/merge and a REST surface
//! over schools, programs, areas, users, faculty and regions.

pub mod auth;
pub mod config;
pub mod diff;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod merge;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use auth::{AccessPolicy, Caller, Gate, Role, StaticTokenPolicy};
pub use config::{Settings, StoreKind};
pub use diff::{diff, DiffResult};
pub use entities::{EntityDef, EntityRegistry};
pub use error::{AppError, ConfigError};
pub use merge::assign_deep;
pub use routes::{app, common_routes_with_ready, entity_routes, API_PREFIX};
pub use service::{CrudService, ListPage, QueryService, UpdateOutcome};
pub use state::AppState;
pub use store::{ensure_database_exists, DocumentStore, MemoryStore, PageResult, PgDocumentStore};
