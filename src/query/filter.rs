//! FilterSet: the ordered, typed mapping of query parameters carried through a list request.

use crate::query::pagination::Pagination;
use std::cmp::Ordering;
use std::fmt;

/// Reserved delimiter for list-valued parameters. Values containing it cannot be expressed.
pub const LIST_DELIMITER: &str = "||";

/// A comparable bound produced by a range parser.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeValue {
    Int(i64),
    Float(f64),
    /// Text compared lexicographically; ISO-8601 dates sort chronologically.
    Text(String),
}

impl RangeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RangeValue::Int(n) => Some(*n as f64),
            RangeValue::Float(f) => Some(*f),
            RangeValue::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, RangeValue::Text(_))
    }
}

impl PartialOrd for RangeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (RangeValue::Int(a), RangeValue::Int(b)) => a.partial_cmp(b),
            (RangeValue::Text(a), RangeValue::Text(b)) => a.partial_cmp(b),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeValue::Int(n) => write!(f, "{}", n),
            RangeValue::Float(x) => write!(f, "{}", x),
            RangeValue::Text(s) => f.write_str(s),
        }
    }
}

/// Up to four bounds on a single field. Built by `format_ranges`, which keeps at most
/// one lower and one upper bound.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeCondition {
    pub gt: Option<RangeValue>,
    pub ge: Option<RangeValue>,
    pub lt: Option<RangeValue>,
    pub le: Option<RangeValue>,
}

impl RangeCondition {
    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.ge.is_none() && self.lt.is_none() && self.le.is_none()
    }

    /// Present bounds in link order: le, ge, lt, gt.
    pub fn link_bounds(&self) -> impl Iterator<Item = (&'static str, &RangeValue)> {
        [
            ("le", self.le.as_ref()),
            ("ge", self.ge.as_ref()),
            ("lt", self.lt.as_ref()),
            ("gt", self.gt.as_ref()),
        ]
        .into_iter()
        .filter_map(|(op, v)| v.map(|v| (op, v)))
    }

    /// Whether `value` satisfies every present bound. Incomparable values never match.
    pub fn contains(&self, value: &RangeValue) -> bool {
        let check = |bound: &Option<RangeValue>, ok: fn(Ordering) -> bool| {
            bound
                .as_ref()
                .map(|b| value.partial_cmp(b).map(ok).unwrap_or(false))
                .unwrap_or(true)
        };
        check(&self.gt, |o| o == Ordering::Greater)
            && check(&self.ge, |o| o != Ordering::Less)
            && check(&self.lt, |o| o == Ordering::Less)
            && check(&self.le, |o| o != Ordering::Greater)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Scalar(String),
    List(Vec<String>),
    Range(RangeCondition),
}

impl Filter {
    /// Parses a raw query value: `a||b` becomes a list, anything else a scalar.
    pub fn from_raw(value: &str) -> Self {
        if value.contains(LIST_DELIMITER) {
            Filter::List(value.split(LIST_DELIMITER).map(str::to_string).collect())
        } else {
            Filter::Scalar(value.to_string())
        }
    }

    /// The value as the client sent it, for error messages.
    pub fn raw(&self) -> String {
        match self {
            Filter::Scalar(s) => s.clone(),
            Filter::List(items) => items.join(LIST_DELIMITER),
            Filter::Range(r) => r
                .link_bounds()
                .map(|(op, v)| format!("{}:{}", op, v))
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Filter::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// Insertion-ordered filters plus the normalized pagination once `format_pagination` ran.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<(String, Filter)>,
    pagination: Option<Pagination>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut set = FilterSet::new();
        for (k, v) in pairs {
            set.insert(k, Filter::Scalar(v.as_ref().to_string()));
        }
        set
    }

    /// Inserts or replaces `key`, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, filter: Filter) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = filter,
            None => self.entries.push((key, filter)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Filter> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Filter> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.entries.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Copy without the given keys; pagination is kept.
    pub fn without(&self, keys: &[&str]) -> FilterSet {
        FilterSet {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .cloned()
                .collect(),
            pagination: self.pagination.clone(),
        }
    }
}
