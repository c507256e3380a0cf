//! HTTP handlers for entity endpoints.

pub mod entity;
pub use entity::*;
