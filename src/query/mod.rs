//! Query-string compiler shared by every list endpoint.
//!
//! A request's raw parameters flow through pure stages, each taking and returning a
//! `FilterSet`: `format_pagination` → `format_lists` → `format_ranges`. The result
//! drives both the storage query and `compose_links`.

pub mod filter;
pub mod links;
pub mod lists;
pub mod pagination;
pub mod ranges;
pub mod uri;

pub use filter::{Filter, FilterSet, RangeCondition, RangeValue, LIST_DELIMITER};
pub use links::{compose_links, encode_component};
pub use lists::format_lists;
pub use pagination::{format_pagination, Pagination, PaginationConfig, SortOrder};
pub use ranges::{format_ranges, RangeField, RangeParser};
pub use uri::{parse, parse_query_string, Uri};
