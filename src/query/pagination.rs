//! Pagination normalizer: validates and defaults `start`, `limit`, `sort` and `order`.

use crate::error::AppError;
use crate::query::filter::{Filter, FilterSet};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;
pub const DEFAULT_SORT: &str = "name";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window into a sorted result set. `start` is 0-based; clients see it 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub start: u64,
    pub limit: u32,
    pub sort: String,
    pub order: SortOrder,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            start: 0,
            limit: DEFAULT_LIMIT,
            sort: DEFAULT_SORT.to_string(),
            order: SortOrder::Asc,
        }
    }
}

/// Allow-list of sortable fields for one endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationConfig {
    pub sortable_fields: Vec<String>,
}

impl PaginationConfig {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        PaginationConfig {
            sortable_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable_fields.iter().any(|f| f == field)
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig::new([DEFAULT_SORT])
    }
}

/// Moves the four pagination keys out of the filter set into a typed `Pagination`.
///
/// Each key is checked in the order start, limit, sort, order; the first invalid one
/// fails with a 422 `Invalid <key>: <value>`.
pub fn format_pagination(mut filters: FilterSet, config: &PaginationConfig) -> Result<FilterSet, AppError> {
    let start = filters.remove("start");
    let limit = filters.remove("limit");
    let sort = filters.remove("sort");
    let order = filters.remove("order");

    let start = match start {
        None => 0,
        Some(raw) => {
            let value = raw.raw();
            match raw.as_scalar().and_then(|s| s.trim().parse::<i64>().ok()) {
                Some(n) if n >= 1 => (n - 1) as u64,
                _ => return Err(AppError::invalid("start", value)),
            }
        }
    };

    let limit = match limit {
        None => DEFAULT_LIMIT,
        Some(raw) => {
            let value = raw.raw();
            match raw.as_scalar().and_then(|s| s.trim().parse::<i64>().ok()) {
                Some(n) if (1..=MAX_LIMIT as i64).contains(&n) => n as u32,
                _ => return Err(AppError::invalid("limit", value)),
            }
        }
    };

    let sort = match sort {
        None => DEFAULT_SORT.to_string(),
        Some(Filter::Scalar(s)) if config.is_sortable(&s) => s,
        Some(raw) => return Err(AppError::invalid("sort", raw.raw())),
    };

    let order = match order.as_ref().map(|o| (o, o.as_scalar())) {
        None => SortOrder::Asc,
        Some((_, Some("asc"))) => SortOrder::Asc,
        Some((_, Some("desc"))) => SortOrder::Desc,
        Some((raw, _)) => return Err(AppError::invalid("order", raw.raw())),
    };

    let pagination = Pagination { start, limit, sort, order };
    tracing::debug!(?pagination, "pagination normalized");
    Ok(filters.with_pagination(pagination))
}
