use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::filter_where::DOC_COLUMN;
use super::types::{FieldPath, SortDirection, SortKey};

pub struct FilterOrder;

impl FilterOrder {
    /// Parses `name,-createdAt` into sort keys; `-` marks descending
    pub fn parse(raw: &str) -> Result<Vec<SortKey>, FilterError> {
        let mut out = Vec::new();
        for part in raw.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (direction, name) = match trimmed.strip_prefix('-') {
                Some(rest) => (SortDirection::Desc, rest),
                None => (SortDirection::Asc, trimmed.strip_prefix('+').unwrap_or(trimmed)),
            };
            out.push(SortKey { field: FieldPath::parse(name)?, direction });
        }
        Ok(out)
    }

    /// Sort applied when the caller does not supply one: newest first
    pub fn default_sort() -> Vec<SortKey> {
        vec![SortKey {
            field: FieldPath::single("createdAt"),
            direction: SortDirection::Desc,
        }]
    }

    pub fn generate(keys: &[SortKey]) -> String {
        if keys.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = keys
            .iter()
            .map(|key| {
                // The timestamp column keeps full precision; document fields sort as jsonb
                let expr = if key.field.is("createdAt") {
                    "\"created_at\"".to_string()
                } else {
                    format!("{} #> {}", DOC_COLUMN, key.field.to_pg_path())
                };
                format!("{} {} NULLS LAST", expr, key.direction.to_sql())
            })
            .collect();
        format!("ORDER BY {}, \"id\" ASC", parts.join(", "))
    }

    /// In-process ordering with the same semantics as `generate`:
    /// missing values last, numbers numerically, strings lexically.
    pub fn compare(keys: &[SortKey], a: &Value, b: &Value) -> Ordering {
        for key in keys {
            let left = key.field.lookup(a).filter(|v| !v.is_null());
            let right = key.field.lookup(b).filter(|v| !v.is_null());
            let ordering = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => return Ordering::Greater,
                (Some(_), None) => return Ordering::Less,
                (Some(l), Some(r)) => {
                    let natural = compare_values(l, r).unwrap_or(Ordering::Equal);
                    match key.direction {
                        SortDirection::Asc => natural,
                        SortDirection::Desc => natural.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Orders two scalars of the same JSON type; `None` across types
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(compare_strings(x, y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_strings(a: &str, b: &str) -> Ordering {
    // Timestamps compare chronologically; RFC 3339 text with varying
    // fractional digits does not sort lexically.
    match (
        chrono::DateTime::parse_from_rfc3339(a),
        chrono::DateTime::parse_from_rfc3339(b),
    ) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
