//! List orchestration: normalize the raw query, query the store, compose the Link header.

use crate::entities::EntityDef;
use crate::error::AppError;
use crate::query::{compose_links, format_lists, format_pagination, format_ranges, FilterSet};
use crate::service::{requested_fields, strip_hidden};
use crate::store::DocumentStore;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct ListPage {
    pub results: Vec<Value>,
    /// Value for the `Link` response header.
    pub link: String,
}

pub struct QueryService;

impl QueryService {
    /// Runs pagination, list and range normalization, then the entity's own shaping step.
    pub fn normalize(entity: &EntityDef, raw: FilterSet) -> Result<FilterSet, AppError> {
        let filters = format_pagination(raw, &entity.pagination_config())?;
        let filters = format_lists(filters, entity.list_fields);
        let filters = format_ranges(filters, entity.ranges)?;
        match entity.shape {
            Some(shape) => shape(filters),
            None => Ok(filters),
        }
    }

    pub async fn list(
        store: &dyn DocumentStore,
        entity: &EntityDef,
        raw: FilterSet,
        endpoint: &str,
    ) -> Result<ListPage, AppError> {
        let filters = Self::normalize(entity, raw)?;
        let requested = requested_fields(&filters);
        let projection = requested.as_deref().map(|names| entity.project(names));
        let page = store
            .query(entity, &filters.without(&["fields"]), projection.as_deref())
            .await?;
        tracing::debug!(
            entity = entity.path_segment,
            count = page.results.len(),
            has_more = page.has_more,
            "list"
        );
        let link = compose_links(&filters, endpoint, page.has_more);
        let mut results = page.results;
        for doc in &mut results {
            strip_hidden(entity, doc);
        }
        Ok(ListPage { results, link })
    }
}
