use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FilterError;

/// Comparison operators accepted in the `field[op]` query syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
        }
    }

    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Gt => ordering == Greater,
            CmpOp::Gte => ordering != Less,
            CmpOp::Lt => ordering == Less,
            CmpOp::Lte => ordering != Greater,
        }
    }
}

/// Dot-separated path into a document, e.g. `location.state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        for segment in &segments {
            if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(FilterError::InvalidField(raw.to_string()));
            }
        }
        Ok(Self(segments))
    }

    /// Single-segment path for names known at compile time
    pub fn single(name: &str) -> Self {
        Self(vec![name.to_string()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is(&self, name: &str) -> bool {
        self.0.len() == 1 && self.0[0] == name
    }

    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// Postgres text[] literal for the `#>` / `#>>` operators. Segments are
    /// restricted to `[A-Za-z0-9_]` by `parse`, so no quoting is needed.
    pub fn to_pg_path(&self) -> String {
        format!("'{{{}}}'", self.0.join(","))
    }

    pub fn lookup<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(doc, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Typed filter expression handed to a document store
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Field equals value, or the field is an array containing the value
    Eq(FieldPath, Value),
    Cmp(FieldPath, CmpOp, Value),
    /// Field equals any of the listed values
    In(FieldPath, Vec<Value>),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    /// GeoJSON point stored at the path lies within `radians` of (lng, lat)
    Near {
        field: FieldPath,
        lng: f64,
        lat: f64,
        radians: f64,
    },
}

impl FilterExpr {
    /// Matches every document
    pub fn all() -> Self {
        FilterExpr::And(vec![])
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Result<Self, FilterError> {
        Ok(FilterExpr::Eq(FieldPath::parse(field)?, value.into()))
    }

    pub fn and(self, other: FilterExpr) -> Self {
        match self {
            FilterExpr::And(mut parts) => {
                parts.push(other);
                FilterExpr::And(parts)
            }
            expr => FilterExpr::And(vec![expr, other]),
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            FilterExpr::Eq(_, value) | FilterExpr::Cmp(_, _, value) => validate_scalar(value),
            FilterExpr::In(field, values) => {
                if values.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!("{}[in] requires at least one value", field)));
                }
                values.iter().try_for_each(validate_scalar)
            }
            FilterExpr::And(parts) | FilterExpr::Or(parts) => parts.iter().try_for_each(FilterExpr::validate),
            FilterExpr::Near { lng, lat, radians, .. } => {
                if !(-180.0..=180.0).contains(lng) || !(-90.0..=90.0).contains(lat) {
                    return Err(FilterError::InvalidOperatorData("coordinates out of range".to_string()));
                }
                if !radians.is_finite() || *radians < 0.0 {
                    return Err(FilterError::InvalidOperatorData("radius must be non-negative".to_string()));
                }
                Ok(())
            }
        }
    }
}

fn validate_scalar(value: &Value) -> Result<(), FilterError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(FilterError::InvalidOperatorData(
            "filter values must be scalars".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: FieldPath,
    pub direction: SortDirection,
}

/// Inclusion projection produced from `select=a,b`
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub fields: Vec<FieldPath>,
}

/// Sort and window handed to `DocumentStore::find`
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// Offset and end of the window, when both fit a signed 64-bit OFFSET
    pub fn window(&self) -> Option<(u64, u64)> {
        let skip = self.page.checked_sub(1)?.checked_mul(self.limit)?;
        let end = skip.checked_add(self.limit)?;
        (end <= i64::MAX as u64).then_some((skip, end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

impl Pagination {
    /// Next/prev descriptors, each omitted when out of range of `total`
    pub fn compute(page: PageRequest, total: u64) -> Self {
        let skip = page.skip();
        let next = (skip + page.limit < total).then(|| PageLink { page: page.page + 1, limit: page.limit });
        let prev = (skip > 0).then(|| PageLink { page: page.page - 1, limit: page.limit });
        Self { next, prev }
    }
}

/// Join rule for attaching related documents to each result
#[derive(Debug, Clone)]
pub struct Populate {
    pub collection: crate::database::Collection,
    /// Field on the result document holding the join key (usually `id`)
    pub local_field: &'static str,
    /// Field on the related documents holding the join key
    pub foreign_field: &'static str,
    /// Name of the attached field on the result
    pub as_field: &'static str,
    /// Attach one document (reference) instead of an array (virtual)
    pub single: bool,
    pub select: Option<Projection>,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
