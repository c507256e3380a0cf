//! Builds parameterized statements over JSONB document tables.
//! Identifiers and JSON keys come from entity descriptors only; values are always parameters.

use crate::entities::{EntityDef, FieldKind};
use crate::query::{Filter, FilterSet, Pagination, RangeCondition, SortOrder};
use crate::sql::params::BindValue;
use serde_json::Value;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Quote a string literal (used for JSON keys from descriptors).
fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// `doc->>'field'`
fn text_at(field: &str) -> String {
    format!("doc->>{}", literal(field))
}

/// Numeric value of a field, NULL when the stored value is not a JSON number.
fn number_at(field: &str) -> String {
    format!(
        "(CASE WHEN jsonb_typeof(doc->{0}) = 'number' THEN (doc->>{0})::float8 END)",
        literal(field)
    )
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: BindValue) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }
}

pub fn create_database(name: &str) -> String {
    format!("CREATE DATABASE {}", quoted(name))
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))
}

pub fn create_table(schema: &str, entity: &EntityDef) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
         id UUID PRIMARY KEY, \
         doc JSONB NOT NULL, \
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
         updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
        qualified_table(schema, entity.table)
    )
}

/// SELECT expression for the document, optionally reduced to `projection` keys.
fn doc_expr(q: &mut QueryBuf, projection: Option<&[&str]>) -> String {
    match projection {
        None => "doc".to_string(),
        Some(fields) => {
            let n = q.push_param(BindValue::TextArray(fields.iter().map(|f| f.to_string()).collect()));
            format!(
                "(SELECT COALESCE(jsonb_object_agg(key, value), '{{}}'::jsonb) FROM jsonb_each(doc) WHERE key = ANY(${}))",
                n
            )
        }
    }
}

fn range_clauses(q: &mut QueryBuf, field: &str, kind: FieldKind, range: &RangeCondition, out: &mut Vec<String>) {
    let bounds = [(">", &range.gt), (">=", &range.ge), ("<", &range.lt), ("<=", &range.le)];
    for (op, bound) in bounds {
        let Some(value) = bound else { continue };
        let clause = match (kind, value.as_f64()) {
            (FieldKind::Number, Some(f)) => {
                let n = q.push_param(BindValue::Float(f));
                format!("{} {} ${}", number_at(field), op, n)
            }
            _ => {
                let n = q.push_param(BindValue::Text(value.to_string()));
                format!("{} COLLATE \"C\" {} ${}", text_at(field), op, n)
            }
        };
        out.push(clause);
    }
}

/// WHERE clauses for every filter naming a schema field; other keys are ignored.
fn where_clauses(q: &mut QueryBuf, entity: &EntityDef, filters: &FilterSet) -> Vec<String> {
    let mut out = Vec::new();
    for (key, filter) in filters.iter() {
        let Some(field) = entity.field(key) else { continue };
        if field.kind == FieldKind::Object {
            continue;
        }
        match filter {
            Filter::Scalar(v) if field.kind == FieldKind::Tags => {
                let n = q.push_param(BindValue::Text(v.clone()));
                out.push(format!("doc->{} ? ${}", literal(key), n));
            }
            Filter::Scalar(v) => {
                let n = q.push_param(BindValue::Text(v.clone()));
                out.push(format!("{} = ${}", text_at(key), n));
            }
            Filter::List(items) if field.kind == FieldKind::Tags => {
                let n = q.push_param(BindValue::TextArray(items.clone()));
                out.push(format!("doc->{} ?| ${}", literal(key), n));
            }
            Filter::List(items) => {
                let n = q.push_param(BindValue::TextArray(items.clone()));
                out.push(format!("{} = ANY(${})", text_at(key), n));
            }
            Filter::Range(range) => range_clauses(q, key, field.kind, range, &mut out),
        }
    }
    out
}

fn order_clause(entity: &EntityDef, pagination: &Pagination) -> String {
    let dir = match pagination.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let expr = match entity.field(&pagination.sort).map(|f| f.kind) {
        Some(FieldKind::Number) => number_at(&pagination.sort),
        _ => format!("{} COLLATE \"C\"", text_at(&pagination.sort)),
    };
    format!(" ORDER BY {} {} NULLS LAST, id ASC", expr, dir)
}

/// One window of `limit + 1` rows so the caller can detect a further page.
pub fn select_page(
    schema: &str,
    entity: &EntityDef,
    filters: &FilterSet,
    projection: Option<&[&str]>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let default_pagination = Pagination::default();
    let pagination = filters.pagination().unwrap_or(&default_pagination);
    let select = doc_expr(&mut q, projection);
    let where_parts = where_clauses(&mut q, entity, filters);
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select,
        qualified_table(schema, entity.table),
        where_clause,
        order_clause(entity, pagination),
        pagination.limit as u64 + 1,
        pagination.start
    );
    q
}

pub fn select_by_id(schema: &str, entity: &EntityDef, id: uuid::Uuid, projection: Option<&[&str]>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let select = doc_expr(&mut q, projection);
    let n = q.push_param(BindValue::Uuid(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE id = ${}",
        select,
        qualified_table(schema, entity.table),
        n
    );
    q
}

pub fn insert(schema: &str, entity: &EntityDef, id: uuid::Uuid, doc: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_n = q.push_param(BindValue::Uuid(id));
    let doc_n = q.push_param(BindValue::Json(doc));
    q.sql = format!(
        "INSERT INTO {} (id, doc) VALUES (${}, ${}) RETURNING doc",
        qualified_table(schema, entity.table),
        id_n,
        doc_n
    );
    q
}

pub fn replace(schema: &str, entity: &EntityDef, id: uuid::Uuid, doc: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let doc_n = q.push_param(BindValue::Json(doc));
    let id_n = q.push_param(BindValue::Uuid(id));
    q.sql = format!(
        "UPDATE {} SET doc = ${}, updated_at = NOW() WHERE id = ${} RETURNING doc",
        qualified_table(schema, entity.table),
        doc_n,
        id_n
    );
    q
}

pub fn delete(schema: &str, entity: &EntityDef, id: uuid::Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Uuid(id));
    q.sql = format!(
        "DELETE FROM {} WHERE id = ${} RETURNING id",
        qualified_table(schema, entity.table),
        n
    );
    q
}
