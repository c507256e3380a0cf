//! In-process document store with the same matching and ordering rules as the SQL builder.

use crate::entities::{EntityDef, FieldKind};
use crate::error::AppError;
use crate::query::{Filter, FilterSet, Pagination, RangeCondition, RangeValue, SortOrder};
use crate::store::{DocumentStore, PageResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use uuid::Uuid;

type Table = BTreeMap<Uuid, Map<String, Value>>;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Internal("memory store lock poisoned".into())
}

/// Text form of a stored value, as PostgreSQL's `->>` renders it.
fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn number_of(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn tags_of(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn range_matches(kind: FieldKind, range: &RangeCondition, value: Option<&Value>) -> bool {
    let numeric = kind == FieldKind::Number && range.link_bounds().all(|(_, b)| b.is_numeric());
    let subject = if numeric {
        number_of(value).map(RangeValue::Float)
    } else {
        text_of(value).map(RangeValue::Text)
    };
    let Some(subject) = subject else { return false };
    if numeric {
        range.contains(&subject)
    } else {
        // Bounds compare as text when the field is not numeric.
        let as_text = RangeCondition {
            gt: range.gt.as_ref().map(|b| RangeValue::Text(b.to_string())),
            ge: range.ge.as_ref().map(|b| RangeValue::Text(b.to_string())),
            lt: range.lt.as_ref().map(|b| RangeValue::Text(b.to_string())),
            le: range.le.as_ref().map(|b| RangeValue::Text(b.to_string())),
        };
        as_text.contains(&subject)
    }
}

fn matches(entity: &EntityDef, filters: &FilterSet, doc: &Map<String, Value>) -> bool {
    filters.iter().all(|(key, filter)| {
        let Some(field) = entity.field(key) else { return true };
        let value = doc.get(key);
        match (field.kind, filter) {
            (FieldKind::Object, _) => true,
            (FieldKind::Tags, Filter::Scalar(v)) => tags_of(value).contains(&v.as_str()),
            (FieldKind::Tags, Filter::List(items)) => {
                tags_of(value).iter().any(|t| items.iter().any(|i| i == t))
            }
            (_, Filter::Scalar(v)) => text_of(value).as_deref() == Some(v.as_str()),
            (_, Filter::List(items)) => text_of(value).map(|t| items.contains(&t)).unwrap_or(false),
            (kind, Filter::Range(range)) => range_matches(kind, range, value),
        }
    })
}

/// Ascending comparison with missing values last in both directions.
fn compare(entity: &EntityDef, pagination: &Pagination, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    let sort = pagination.sort.as_str();
    let ord = match entity.field(sort).map(|f| f.kind) {
        Some(FieldKind::Number) => {
            let (x, y) = (number_of(a.get(sort)), number_of(b.get(sort)));
            match (x, y) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
        _ => match (text_of(a.get(sort)), text_of(b.get(sort))) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    match pagination.order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

fn project(doc: &Map<String, Value>, projection: Option<&[&str]>) -> Value {
    match projection {
        None => Value::Object(doc.clone()),
        Some(fields) => Value::Object(
            doc.iter()
                .filter(|(k, _)| fields.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_tables(&self, entities: &[&'static EntityDef]) -> Result<(), AppError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        for entity in entities {
            tables.entry(entity.table).or_default();
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn query(
        &self,
        entity: &EntityDef,
        filters: &FilterSet,
        projection: Option<&[&str]>,
    ) -> Result<PageResult, AppError> {
        let default_pagination = Pagination::default();
        let pagination = filters.pagination().unwrap_or(&default_pagination);
        let tables = self.tables.read().map_err(poisoned)?;
        let Some(table) = tables.get(entity.table) else {
            return Ok(PageResult::default());
        };
        // BTreeMap iteration yields ids ascending, so the stable sort keeps id as tiebreaker.
        let mut rows: Vec<&Map<String, Value>> = table
            .values()
            .filter(|doc| matches(entity, filters, doc))
            .collect();
        rows.sort_by(|a, b| compare(entity, pagination, a, b));
        let window = rows
            .into_iter()
            .skip(pagination.start as usize)
            .take(pagination.limit as usize + 1)
            .map(|doc| project(doc, projection))
            .collect();
        Ok(PageResult::from_window(window, pagination.limit))
    }

    async fn find_by_id(
        &self,
        entity: &EntityDef,
        id: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Value>, AppError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(None) };
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .get(entity.table)
            .and_then(|t| t.get(&id))
            .map(|doc| project(doc, projection)))
    }

    async fn insert(&self, entity: &EntityDef, mut doc: Map<String, Value>) -> Result<Value, AppError> {
        let id = Uuid::new_v4();
        doc.insert("id".into(), Value::String(id.to_string()));
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.entry(entity.table).or_default().insert(id, doc.clone());
        Ok(Value::Object(doc))
    }

    async fn replace(
        &self,
        entity: &EntityDef,
        id: &str,
        mut doc: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(None) };
        let mut tables = self.tables.write().map_err(poisoned)?;
        let Some(slot) = tables.get_mut(entity.table).and_then(|t| t.get_mut(&id)) else {
            return Ok(None);
        };
        doc.insert("id".into(), Value::String(id.to_string()));
        *slot = doc.clone();
        Ok(Some(Value::Object(doc)))
    }

    async fn delete(&self, entity: &EntityDef, id: &str) -> Result<bool, AppError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(false) };
        let mut tables = self.tables.write().map_err(poisoned)?;
        Ok(tables
            .get_mut(entity.table)
            .map(|t| t.remove(&id).is_some())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{PROGRAMS, SCHOOLS};
    use crate::query::{format_lists, format_pagination, format_ranges};
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn normalized(entity: &EntityDef, pairs: &[(&str, &str)]) -> FilterSet {
        let set = FilterSet::from_pairs(pairs.iter().copied());
        let set = format_pagination(set, &entity.pagination_config()).unwrap();
        let set = format_lists(set, entity.list_fields);
        format_ranges(set, entity.ranges).unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (name, students, areas) in [
            ("Cedar", 300, json!(["math"])),
            ("Alder", 100, json!(["art", "math"])),
            ("Birch", 200, json!(["art"])),
            ("Dogwood", 400, json!([])),
        ] {
            store
                .insert(&SCHOOLS, obj(json!({"name": name, "students": students, "areas": areas})))
                .await
                .unwrap();
        }
        store
    }

    fn names(page: &PageResult) -> Vec<&str> {
        page.results.iter().map(|d| d["name"].as_str().unwrap_or("")).collect()
    }

    #[tokio::test]
    async fn windows_and_detects_more() {
        let store = seeded().await;
        let page = store
            .query(&SCHOOLS, &normalized(&SCHOOLS, &[("limit", "3")]), None)
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["Alder", "Birch", "Cedar"]);
        assert!(page.has_more);

        let page = store
            .query(&SCHOOLS, &normalized(&SCHOOLS, &[("limit", "3"), ("start", "4")]), None)
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["Dogwood"]);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn numeric_sort_and_range() {
        let store = seeded().await;
        let set = normalized(
            &SCHOOLS,
            &[("sort", "students"), ("order", "desc"), ("students.gt", "100"), ("students.le", "300")],
        );
        let page = store.query(&SCHOOLS, &set, None).await.unwrap();
        assert_eq!(names(&page), vec!["Cedar", "Birch"]);
    }

    #[tokio::test]
    async fn tag_membership_and_projection() {
        let store = seeded().await;
        let set = normalized(&SCHOOLS, &[("areas", "art")]);
        let page = store.query(&SCHOOLS, &set, Some(&["id", "name"][..])).await.unwrap();
        assert_eq!(names(&page), vec!["Alder", "Birch"]);
        let mut keys: Vec<_> = page.results[0].as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["id".to_string(), "name".to_string()]);
    }

    #[tokio::test]
    async fn unknown_filter_keys_are_ignored() {
        let store = seeded().await;
        let page = store
            .query(&SCHOOLS, &normalized(&SCHOOLS, &[("bogus", "x")]), None)
            .await
            .unwrap();
        assert_eq!(page.results.len(), 4);
    }

    #[tokio::test]
    async fn date_ranges_compare_as_text() {
        let store = MemoryStore::new();
        for (name, starts) in [("A", "2024-01-15"), ("B", "2024-09-01"), ("C", "2025-01-10")] {
            store.insert(&PROGRAMS, obj(json!({"name": name, "starts": starts}))).await.unwrap();
        }
        let set = normalized(&PROGRAMS, &[("starts.ge", "2024-02-01"), ("starts.lt", "2025-01-10")]);
        let page = store.query(&PROGRAMS, &set, None).await.unwrap();
        assert_eq!(names(&page), vec!["B"]);
    }

    #[tokio::test]
    async fn crud_by_id() {
        let store = MemoryStore::new();
        let doc = store.insert(&SCHOOLS, obj(json!({"name": "Oak"}))).await.unwrap();
        let id = doc["id"].as_str().unwrap().to_string();
        assert_eq!(store.find_by_id(&SCHOOLS, &id, None).await.unwrap(), Some(doc));

        let replaced = store
            .replace(&SCHOOLS, &id, obj(json!({"name": "Pine"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced["id"], json!(id));
        assert_eq!(replaced["name"], json!("Pine"));

        assert!(store.delete(&SCHOOLS, &id).await.unwrap());
        assert!(!store.delete(&SCHOOLS, &id).await.unwrap());
        assert_eq!(store.find_by_id(&SCHOOLS, "not-a-uuid", None).await.unwrap(), None);
    }
}
