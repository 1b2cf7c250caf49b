use serde_json::Value;

use super::filter_order::compare_values;
use super::types::{FieldPath, FilterExpr};

/// Mean Earth radius in miles; radius arguments of `FilterExpr::Near` are
/// central angles, so `distance_miles / EARTH_RADIUS_MILES`.
pub const EARTH_RADIUS_MILES: f64 = 3963.2;

/// Evaluates a filter against a document held in process. Mirrors the
/// predicate `FilterWhere` generates for Postgres.
pub fn matches(expr: &FilterExpr, doc: &Value) -> bool {
    match expr {
        FilterExpr::Eq(field, value) => matches_eq(field, value, doc),
        FilterExpr::Cmp(field, op, value) => field
            .lookup(doc)
            .and_then(|actual| compare_values(actual, value))
            .map(|ordering| op.holds(ordering))
            .unwrap_or(false),
        FilterExpr::In(field, values) => values.iter().any(|v| matches_eq(field, v, doc)),
        FilterExpr::And(parts) => parts.iter().all(|p| matches(p, doc)),
        FilterExpr::Or(parts) => parts.iter().any(|p| matches(p, doc)),
        FilterExpr::Near { field, lng, lat, radians } => {
            let coordinates = field.child("coordinates");
            let point = coordinates.lookup(doc).and_then(Value::as_array).and_then(|c| {
                Some((c.first()?.as_f64()?, c.get(1)?.as_f64()?))
            });
            match point {
                Some((doc_lng, doc_lat)) => central_angle(*lng, *lat, doc_lng, doc_lat) <= *radians,
                None => false,
            }
        }
    }
}

fn matches_eq(field: &FieldPath, expected: &Value, doc: &Value) -> bool {
    let actual = field.lookup(doc);
    if expected.is_null() {
        return actual.map_or(true, Value::is_null);
    }
    match actual {
        None => false,
        Some(Value::Array(items)) => items.iter().any(|item| loose_eq(item, expected)),
        Some(value) => loose_eq(value, expected),
    }
}

/// Scalars compare by their text form, as `#>>` does in Postgres
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(_), _) | (Value::Object(_), _) => actual == expected,
        _ => scalar_text(actual) == scalar_text(expected),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Haversine central angle between two (lng, lat) points, in radians
pub fn central_angle(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2) + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::CmpOp;
    use serde_json::json;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    #[test]
    fn comparison_selects_numbers_only() {
        let expr = FilterExpr::Cmp(path("cost"), CmpOp::Gte, json!(1000));
        assert!(matches(&expr, &json!({"cost": 1000})));
        assert!(matches(&expr, &json!({"cost": 2500.5})));
        assert!(!matches(&expr, &json!({"cost": 999})));
        assert!(!matches(&expr, &json!({"cost": "5000"})));
        assert!(!matches(&expr, &json!({})));
    }

    #[test]
    fn equality_is_textual_and_array_aware() {
        assert!(matches(&FilterExpr::Eq(path("zip"), json!(10001)), &json!({"zip": "10001"})));
        assert!(matches(&FilterExpr::Eq(path("careers"), json!("Business")), &json!({"careers": ["UI/UX", "Business"]})));
        assert!(matches(&FilterExpr::Eq(path("housing"), json!(true)), &json!({"housing": true})));
        assert!(!matches(&FilterExpr::Eq(path("housing"), json!(true)), &json!({"housing": false})));
        assert!(matches(&FilterExpr::Eq(path("photo"), Value::Null), &json!({})));
    }

    #[test]
    fn membership_and_logical_operators() {
        let doc = json!({"minimumSkill": "beginner", "weeks": 8});
        let in_expr = FilterExpr::In(path("minimumSkill"), vec![json!("beginner"), json!("advanced")]);
        assert!(matches(&in_expr, &doc));
        let or_expr = FilterExpr::Or(vec![
            FilterExpr::Eq(path("weeks"), json!(12)),
            FilterExpr::Cmp(path("weeks"), CmpOp::Lt, json!(10)),
        ]);
        assert!(matches(&or_expr, &doc));
        assert!(matches(&FilterExpr::all(), &doc));
        assert!(!matches(&FilterExpr::Or(vec![]), &doc));
    }

    #[test]
    fn near_uses_great_circle_distance() {
        // Boston and Cambridge are roughly 3 miles apart; New York is ~190
        let boston = json!({"location": {"coordinates": [-71.0589, 42.3601]}});
        let nyc = json!({"location": {"coordinates": [-74.0060, 40.7128]}});
        let expr = FilterExpr::Near {
            field: path("location"),
            lng: -71.1097,
            lat: 42.3736,
            radians: 10.0 / EARTH_RADIUS_MILES,
        };
        assert!(matches(&expr, &boston));
        assert!(!matches(&expr, &nyc));
        assert!(!matches(&expr, &json!({"location": {}})));
    }
}
