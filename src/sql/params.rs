//! Typed bind values for document-store queries.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryScalar;

/// A value bound to a `$n` placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(String),
    Float(f64),
    TextArray(Vec<String>),
    Uuid(uuid::Uuid),
    Json(Value),
}

/// Binds `params` in order.
pub fn bind_all<'q, O: Send + Unpin>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &'q [BindValue],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for p in params {
        query = match p {
            BindValue::Text(s) => query.bind(s.as_str()),
            BindValue::Float(f) => query.bind(*f),
            BindValue::TextArray(items) => query.bind(items.clone()),
            BindValue::Uuid(u) => query.bind(*u),
            BindValue::Json(v) => query.bind(sqlx::types::Json(v)),
        };
    }
    query
}
