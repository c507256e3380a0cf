//! Range-condition compiler: folds `field.gt|ge|lt|le` keys into one `Filter::Range`.

use crate::error::AppError;
use crate::query::filter::{Filter, FilterSet, RangeCondition, RangeValue};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Parses a raw bound; `None` rejects the value.
pub type RangeParser = fn(&str) -> Option<RangeValue>;

/// A field that accepts range bounds.
#[derive(Clone, Copy, Debug)]
pub struct RangeField {
    pub name: &'static str,
    pub parser: Option<RangeParser>,
}

impl RangeField {
    pub const fn new(name: &'static str, parser: RangeParser) -> Self {
        RangeField { name, parser: Some(parser) }
    }

    pub const fn text(name: &'static str) -> Self {
        RangeField { name, parser: None }
    }

    fn parse(&self, raw: &str) -> Option<RangeValue> {
        self.parser.unwrap_or(identity)(raw)
    }
}

pub fn identity(raw: &str) -> Option<RangeValue> {
    Some(RangeValue::Text(raw.to_string()))
}

pub fn number(raw: &str) -> Option<RangeValue> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(RangeValue::Int(n));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(RangeValue::Float)
}

/// Accepts `YYYY-MM-DD` or RFC 3339; yields an ISO string that sorts chronologically.
pub fn date(raw: &str) -> Option<RangeValue> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(RangeValue::Text(d.format("%Y-%m-%d").to_string()));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| RangeValue::Text(d.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true)))
}

const OPS: [&str; 4] = ["gt", "ge", "lt", "le"];

/// Compiles range keys for each field. The tighter of `gt`/`ge` and of `lt`/`le` survives;
/// on a tie the exclusive bound is kept. Consumed dotted keys are removed, and the
/// canonical key is only written when a bound survived.
pub fn format_ranges(mut filters: FilterSet, fields: &[RangeField]) -> Result<FilterSet, AppError> {
    for field in fields {
        let mut range = RangeCondition::default();
        for op in OPS {
            let key = format!("{}.{}", field.name, op);
            let Some(raw) = filters.remove(&key) else { continue };
            let value = raw
                .as_scalar()
                .and_then(|s| field.parse(s))
                .ok_or_else(|| AppError::invalid(&key, raw.raw()))?;
            match op {
                "gt" => range.gt = Some(value),
                "ge" => range.ge = Some(value),
                "lt" => range.lt = Some(value),
                _ => range.le = Some(value),
            }
        }

        if let (Some(gt), Some(ge)) = (&range.gt, &range.ge) {
            if gt >= ge {
                range.ge = None;
            } else {
                range.gt = None;
            }
        }
        if let (Some(lt), Some(le)) = (&range.lt, &range.le) {
            if lt <= le {
                range.le = None;
            } else {
                range.lt = None;
            }
        }

        if !range.is_empty() {
            tracing::debug!(field = field.name, ?range, "range compiled");
            filters.insert(field.name, Filter::Range(range));
        }
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pairs: &[(&str, &str)], field: RangeField) -> FilterSet {
        format_ranges(FilterSet::from_pairs(pairs.iter().copied()), &[field]).unwrap()
    }

    fn range_of(set: &FilterSet, name: &str) -> RangeCondition {
        match set.get(name) {
            Some(Filter::Range(r)) => r.clone(),
            other => panic!("expected range, got {:?}", other),
        }
    }

    #[test]
    fn tighter_lower_bound_wins() {
        let set = compile(&[("x.gt", "5"), ("x.ge", "10")], RangeField::new("x", number));
        assert_eq!(
            range_of(&set, "x"),
            RangeCondition { ge: Some(RangeValue::Int(10)), ..Default::default() }
        );
    }

    #[test]
    fn tighter_upper_bound_wins() {
        let set = compile(&[("x.lt", "20"), ("x.le", "15")], RangeField::new("x", number));
        assert_eq!(
            range_of(&set, "x"),
            RangeCondition { le: Some(RangeValue::Int(15)), ..Default::default() }
        );
    }

    #[test]
    fn exclusive_bound_kept_on_tie() {
        let set = compile(&[("x.gt", "3"), ("x.ge", "3")], RangeField::new("x", number));
        assert_eq!(
            range_of(&set, "x"),
            RangeCondition { gt: Some(RangeValue::Int(3)), ..Default::default() }
        );
    }

    #[test]
    fn identity_parser_compares_text() {
        let set = compile(&[("x.gt", "5"), ("x.ge", "7")], RangeField::text("x"));
        assert_eq!(
            range_of(&set, "x"),
            RangeCondition { ge: Some(RangeValue::Text("7".into())), ..Default::default() }
        );
    }

    #[test]
    fn dates_compare_chronologically() {
        let set = compile(
            &[("d.ge", "2020-01-01"), ("d.gt", "2021-06-30"), ("d.le", "2022-01-01")],
            RangeField::new("d", date),
        );
        let r = range_of(&set, "d");
        assert_eq!(r.gt, Some(RangeValue::Text("2021-06-30".into())));
        assert_eq!(r.ge, None);
        assert_eq!(r.le, Some(RangeValue::Text("2022-01-01".into())));
    }

    #[test]
    fn dotted_keys_are_stripped() {
        let set = compile(&[("x.lt", "4"), ("name", "a")], RangeField::new("x", number));
        assert!(!set.contains_key("x.lt"));
        assert!(set.contains_key("name"));
        assert!(set.contains_key("x"));
    }

    #[test]
    fn no_bounds_no_key() {
        let set = compile(&[("name", "a")], RangeField::new("x", number));
        assert!(!set.contains_key("x"));
    }

    #[test]
    fn unparsable_bound_is_rejected() {
        let err = format_ranges(
            FilterSet::from_pairs([("x.gt", "abc")]),
            &[RangeField::new("x", number)],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid x.gt: abc");
    }

    #[test]
    fn number_parser_accepts_floats() {
        assert_eq!(number("2.5"), Some(RangeValue::Float(2.5)));
        assert_eq!(number("nan"), None);
        assert_eq!(date("yesterday"), None);
        assert_eq!(
            date("2020-05-01T10:00:00+02:00"),
            Some(RangeValue::Text("2020-05-01T08:00:00.000Z".into()))
        );
    }
}
