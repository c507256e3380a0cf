//! Entity handlers: list, read, create, update, delete.

use crate::auth::MaybeCaller;
use crate::error::AppError;
use crate::query::{format_lists, parse_query_string, FilterSet};
use crate::response;
use crate::routes::API_PREFIX;
use crate::service::{requested_fields, CrudService, QueryService};
use crate::state::AppState;
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// Parses the raw query string. The leading `?` keeps the host heuristic out of the way.
fn query_filters(raw: Option<String>) -> FilterSet {
    parse_query_string(&format!("?{}", raw.unwrap_or_default()))
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.entity(&path_segment)?;
    let endpoint = format!("{}/{}", API_PREFIX, entity.path_segment);
    let page = QueryService::list(state.store.as_ref(), entity, query_filters(raw), &endpoint).await?;
    response::listed(page.results, &page.link)
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.entity(&path_segment)?;
    let filters = format_lists(query_filters(raw), &["fields"]);
    let fields = requested_fields(&filters);
    let doc = CrudService::read(state.store.as_ref(), entity, &id, fields.as_deref()).await?;
    Ok(response::ok(doc))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    MaybeCaller(caller): MaybeCaller,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.entity(&path_segment)?;
    entity.write_gate.check(caller.as_ref())?;
    let doc = CrudService::create(state.store.as_ref(), entity, body).await?;
    Ok(response::created(doc))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
    MaybeCaller(caller): MaybeCaller,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.entity(&path_segment)?;
    entity.write_gate.check(caller.as_ref())?;
    let outcome = CrudService::update(state.store.as_ref(), entity, &id, body).await?;
    Ok(response::ok(outcome))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
    MaybeCaller(caller): MaybeCaller,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.entity(&path_segment)?;
    entity.delete_gate.check(caller.as_ref())?;
    CrudService::delete(state.store.as_ref(), entity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
