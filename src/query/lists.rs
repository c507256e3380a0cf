//! List-field normalizer.

use crate::query::filter::{Filter, FilterSet, LIST_DELIMITER};

/// Turns scalar values of the named fields into lists split on `||`.
/// Absent fields stay absent.
pub fn format_lists(mut filters: FilterSet, fields: &[&str]) -> FilterSet {
    for field in fields {
        let split = match filters.get(field) {
            Some(Filter::Scalar(s)) => s.split(LIST_DELIMITER).map(str::to_string).collect(),
            _ => continue,
        };
        filters.insert(*field, Filter::List(split));
    }
    filters
}
