//! Entity descriptors: schema fields, query affordances and access gates per endpoint.

use crate::auth::Gate;
use crate::error::AppError;
use crate::query::ranges::{date, number};
use crate::query::{FilterSet, PaginationConfig, RangeField};
use std::collections::HashMap;

/// Storage-level kind of a document field; drives equality and range matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Bool,
    /// Array of strings; equality means membership.
    Tags,
    Object,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, kind }
}

/// Entity-specific filter shaping, run after the shared normalizers.
pub type ShapeFn = fn(FilterSet) -> Result<FilterSet, AppError>;

#[derive(Debug)]
pub struct EntityDef {
    pub path_segment: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    pub sortable: &'static [&'static str],
    /// Parameters split on `||` (always includes `fields`).
    pub list_fields: &'static [&'static str],
    pub ranges: &'static [RangeField],
    pub shape: Option<ShapeFn>,
    pub write_gate: Gate,
    pub delete_gate: Gate,
    /// Keys stripped from every response.
    pub hidden: &'static [&'static str],
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn pagination_config(&self) -> PaginationConfig {
        PaginationConfig::new(self.sortable.iter().copied())
    }

    /// Requested projection intersected with the schema; unknown names are dropped.
    /// `id` is always part of a projection.
    pub fn project<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        let mut out = vec!["id"];
        for name in requested {
            let name = name.as_str();
            if name != "id" && self.field(name).is_some() && !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

fn campus_requires_name(filters: FilterSet) -> Result<FilterSet, AppError> {
    if filters.contains_key("campus") && !filters.contains_key("name") {
        return Err(AppError::missing("name required when campus specified"));
    }
    Ok(filters)
}

pub static SCHOOLS: EntityDef = EntityDef {
    path_segment: "schools",
    table: "schools",
    fields: &[
        field("name", FieldKind::Text),
        field("campus", FieldKind::Text),
        field("code", FieldKind::Text),
        field("address", FieldKind::Object),
        field("areas", FieldKind::Tags),
        field("established", FieldKind::Number),
        field("students", FieldKind::Number),
        field("website", FieldKind::Text),
    ],
    sortable: &["name", "established", "students"],
    list_fields: &["fields", "areas"],
    ranges: &[RangeField::new("established", number), RangeField::new("students", number)],
    shape: Some(campus_requires_name),
    write_gate: Gate::User,
    delete_gate: Gate::Admin,
    hidden: &[],
};

pub static PROGRAMS: EntityDef = EntityDef {
    path_segment: "programs",
    table: "programs",
    fields: &[
        field("name", FieldKind::Text),
        field("school", FieldKind::Text),
        field("area", FieldKind::Text),
        field("degree", FieldKind::Text),
        field("duration", FieldKind::Number),
        field("tuition", FieldKind::Number),
        field("starts", FieldKind::Date),
    ],
    sortable: &["name", "tuition", "duration", "starts"],
    list_fields: &["fields", "degree", "area"],
    ranges: &[
        RangeField::new("tuition", number),
        RangeField::new("duration", number),
        RangeField::new("starts", date),
    ],
    shape: None,
    write_gate: Gate::User,
    delete_gate: Gate::Admin,
    hidden: &[],
};

pub static AREAS: EntityDef = EntityDef {
    path_segment: "areas",
    table: "areas",
    fields: &[
        field("name", FieldKind::Text),
        field("description", FieldKind::Text),
        field("parent", FieldKind::Text),
    ],
    sortable: &["name"],
    list_fields: &["fields"],
    ranges: &[],
    shape: None,
    write_gate: Gate::Admin,
    delete_gate: Gate::Admin,
    hidden: &[],
};

pub static USERS: EntityDef = EntityDef {
    path_segment: "users",
    table: "users",
    fields: &[
        field("name", FieldKind::Text),
        field("email", FieldKind::Text),
        field("role", FieldKind::Text),
        field("verified", FieldKind::Bool),
    ],
    sortable: &["name", "email"],
    list_fields: &["fields", "role"],
    ranges: &[],
    shape: None,
    write_gate: Gate::Admin,
    delete_gate: Gate::Admin,
    hidden: &["password"],
};

pub static FACULTY: EntityDef = EntityDef {
    path_segment: "faculty",
    table: "faculty",
    fields: &[
        field("name", FieldKind::Text),
        field("school", FieldKind::Text),
        field("department", FieldKind::Text),
        field("title", FieldKind::Text),
        field("areas", FieldKind::Tags),
        field("hired", FieldKind::Date),
    ],
    sortable: &["name", "hired"],
    list_fields: &["fields", "areas"],
    ranges: &[RangeField::new("hired", date)],
    shape: None,
    write_gate: Gate::User,
    delete_gate: Gate::Admin,
    hidden: &[],
};

/// Administrative geography: states, districts, cities.
pub static REGIONS: EntityDef = EntityDef {
    path_segment: "regions",
    table: "regions",
    fields: &[
        field("name", FieldKind::Text),
        field("kind", FieldKind::Text),
        field("code", FieldKind::Text),
        field("parent", FieldKind::Text),
        field("population", FieldKind::Number),
    ],
    sortable: &["name", "population"],
    list_fields: &["fields", "kind"],
    ranges: &[RangeField::new("population", number)],
    shape: None,
    write_gate: Gate::Admin,
    delete_gate: Gate::Admin,
    hidden: &[],
};

pub static ALL: [&EntityDef; 6] = [&SCHOOLS, &PROGRAMS, &AREAS, &USERS, &FACULTY, &REGIONS];

/// Entities reachable over HTTP, keyed by path segment.
#[derive(Clone, Debug)]
pub struct EntityRegistry {
    by_path: HashMap<&'static str, &'static EntityDef>,
}

impl EntityRegistry {
    pub fn new(entities: &[&'static EntityDef]) -> Self {
        EntityRegistry {
            by_path: entities.iter().map(|e| (e.path_segment, *e)).collect(),
        }
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&'static EntityDef> {
        self.by_path.get(path).copied()
    }

    /// Registered path segments, sorted.
    pub fn path_segments(&self) -> Vec<&'static str> {
        let mut all: Vec<_> = self.by_path.keys().copied().collect();
        all.sort_unstable();
        all
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        EntityRegistry::new(&ALL)
    }
}
