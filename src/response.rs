//! Response helpers. Bodies are bare JSON documents; list pagination travels in the `Link` header.

use crate::error::AppError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

/// 200 with a JSON array body and the `Link` header.
pub fn listed<T: Serialize>(data: Vec<T>, link: &str) -> Result<Response, AppError> {
    let link = HeaderValue::from_str(link)
        .map_err(|e| AppError::Internal(format!("link header: {}", e)))?;
    Ok((StatusCode::OK, [(header::LINK, link)], Json(data)).into_response())
}
