//! Link header composition for paginated list responses.

use crate::query::filter::{Filter, FilterSet, LIST_DELIMITER};
use crate::query::pagination::Pagination;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Query string (with trailing `&`) that reproduces every filter except pagination.
fn filter_query(filters: &FilterSet) -> String {
    let mut out = String::new();
    for (key, filter) in filters.iter() {
        let key = encode_component(key);
        match filter {
            Filter::Scalar(value) => {
                out.push_str(&format!("{}={}&", key, encode_component(value)));
            }
            Filter::List(items) => {
                out.push_str(&format!("{}={}&", key, encode_component(&items.join(LIST_DELIMITER))));
            }
            Filter::Range(range) => {
                for (op, value) in range.link_bounds() {
                    out.push_str(&format!("{}.{}={}&", key, op, encode_component(&value.to_string())));
                }
            }
        }
    }
    out
}

/// Builds the `Link` header value with prev, self and next relations.
///
/// `prev` is only present past the first row and `next` only when the store reported
/// more rows. `start` in each link is 1-based.
pub fn compose_links(filters: &FilterSet, endpoint: &str, has_more: bool) -> String {
    let default_pagination = Pagination::default();
    let pagination = filters.pagination().unwrap_or(&default_pagination);
    let base = format!("{}?{}", endpoint, filter_query(filters));
    let suffix = format!(
        "limit={}&sort={}&order={}",
        pagination.limit,
        encode_component(&pagination.sort),
        pagination.order
    );

    // Saturating: `start` may be any u64 the normalizer accepted.
    let start = pagination.start;
    let limit = u64::from(pagination.limit);
    let self_start = start.saturating_add(1);
    let next_start = start.saturating_add(limit).saturating_add(1);
    let prev_start = start.saturating_sub(limit).saturating_add(1);

    let link = |n: u64, rel: &str| format!("<{}start={}&{}>; rel=\"{}\"", base, n, suffix, rel);

    let mut links = Vec::with_capacity(3);
    if self_start > 1 {
        links.push(link(prev_start, "prev"));
    }
    links.push(link(self_start, "self"));
    if has_more {
        links.push(link(next_start, "next"));
    }
    links.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{RangeCondition, RangeValue};
    use crate::query::pagination::{format_pagination, PaginationConfig, SortOrder};

    fn page(start: u64, limit: u32) -> Pagination {
        Pagination {
            start,
            limit,
            sort: "name".into(),
            order: SortOrder::Asc,
        }
    }

    #[test]
    fn middle_page_has_prev_self_next() {
        let filters = FilterSet::new().with_pagination(page(1, 3));
        let header = compose_links(&filters, "foo", true);
        assert_eq!(
            header,
            "<foo?start=1&limit=3&sort=name&order=asc>; rel=\"prev\", \
             <foo?start=2&limit=3&sort=name&order=asc>; rel=\"self\", \
             <foo?start=5&limit=3&sort=name&order=asc>; rel=\"next\""
        );
    }

    #[test]
    fn first_page_without_more_has_only_self() {
        let filters = FilterSet::new().with_pagination(page(0, 10));
        let header = compose_links(&filters, "/api/v1/schools", false);
        assert_eq!(
            header,
            "</api/v1/schools?start=1&limit=10&sort=name&order=asc>; rel=\"self\""
        );
    }

    #[test]
    fn prev_steps_back_one_full_page() {
        let filters = FilterSet::new().with_pagination(page(20, 10));
        let header = compose_links(&filters, "e", false);
        assert!(header.starts_with("<e?start=11&limit=10&sort=name&order=asc>; rel=\"prev\""));
    }

    #[test]
    fn filters_are_encoded_before_pagination() {
        let mut filters = FilterSet::new();
        filters.insert("name", Filter::Scalar("John Doe".into()));
        filters.insert("areas", Filter::List(vec!["math".into(), "art & design".into()]));
        filters.insert(
            "students",
            Filter::Range(RangeCondition {
                gt: Some(RangeValue::Int(5)),
                le: Some(RangeValue::Int(100)),
                ..Default::default()
            }),
        );
        let filters = filters.with_pagination(page(0, 10));
        let header = compose_links(&filters, "s", false);
        assert_eq!(
            header,
            "<s?name=John%20Doe&areas=math%7C%7Cart%20%26%20design&students.le=100&students.gt=5&\
             start=1&limit=10&sort=name&order=asc>; rel=\"self\""
        );
    }

    #[test]
    fn missing_pagination_falls_back_to_defaults() {
        let header = compose_links(&FilterSet::new(), "x", true);
        assert!(header.contains("rel=\"self\""));
        assert!(header.contains("<x?start=11&limit=10&sort=name&order=asc>; rel=\"next\""));
    }

    #[test]
    fn huge_start_does_not_overflow() {
        let set = format_pagination(
            FilterSet::from_pairs([("start", "9223372036854775807")]),
            &PaginationConfig::default(),
        )
        .unwrap();
        let header = compose_links(&set, "x", true);
        assert!(header.contains("start=9223372036854775807&limit=10&sort=name&order=asc>; rel=\"self\""));
        assert!(header.contains("start=9223372036854775817&limit=10&sort=name&order=asc>; rel=\"next\""));
        assert!(header.contains("start=9223372036854775797&limit=10&sort=name&order=asc>; rel=\"prev\""));

        let set = FilterSet::new().with_pagination(Pagination {
            start: u64::MAX,
            ..Pagination::default()
        });
        assert!(compose_links(&set, "x", true).contains(&format!("start={}&", u64::MAX)));
    }
}
