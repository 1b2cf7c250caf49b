use serde_json::Value;

use super::error::FilterError;
use super::types::{FieldPath, FilterExpr};

/// Column holding the JSONB document in every collection table
pub const DOC_COLUMN: &str = "\"doc\"";

/// Translates a `FilterExpr` into a Postgres predicate over the JSONB
/// document column. Every parameter is bound as `jsonb`.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(expr: &FilterExpr, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        expr.validate()?;
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build(expr);
        Ok((sql, filter_where.param_values))
    }

    fn build(&mut self, expr: &FilterExpr) -> String {
        match expr {
            FilterExpr::Eq(field, value) => self.build_eq(field, value),
            FilterExpr::Cmp(field, op, value) => {
                let path = field.to_pg_path();
                let type_param = self.param(value.clone());
                let value_param = self.param(value.clone());
                format!(
                    "(jsonb_typeof({doc} #> {path}) = jsonb_typeof({type_param}::jsonb) AND {doc} #> {path} {op} {value_param}::jsonb)",
                    doc = DOC_COLUMN,
                    path = path,
                    type_param = type_param,
                    op = op.to_sql(),
                    value_param = value_param,
                )
            }
            FilterExpr::In(field, values) => {
                let parts: Vec<String> = values.iter().map(|v| self.build_eq(field, v)).collect();
                format!("({})", parts.join(" OR "))
            }
            FilterExpr::And(parts) => self.build_logical(parts, " AND ", "TRUE"),
            FilterExpr::Or(parts) => self.build_logical(parts, " OR ", "FALSE"),
            FilterExpr::Near { field, lng, lat, radians } => {
                let lng_sql = format!("({} #>> {})::float8", DOC_COLUMN, field.child("coordinates").child("0").to_pg_path());
                let lat_sql = format!("({} #>> {})::float8", DOC_COLUMN, field.child("coordinates").child("1").to_pg_path());
                let lng_param = self.float_param(*lng);
                let lat_param = self.float_param(*lat);
                let lat_param_again = self.float_param(*lat);
                let radius_param = self.float_param(*radians);
                // Haversine central angle, clamped so float error never leaves asin's domain
                format!(
                    "(jsonb_typeof({doc} #> {coords}) = 'array' AND 2 * asin(least(1.0, sqrt(\
                     power(sin(radians({lat_sql} - {lat_param}) / 2), 2) + \
                     cos(radians({lat_param_again})) * cos(radians({lat_sql})) * \
                     power(sin(radians({lng_sql} - {lng_param}) / 2), 2)))) <= {radius_param})",
                    doc = DOC_COLUMN,
                    coords = field.child("coordinates").to_pg_path(),
                    lat_sql = lat_sql,
                    lng_sql = lng_sql,
                    lat_param = lat_param,
                    lat_param_again = lat_param_again,
                    lng_param = lng_param,
                    radius_param = radius_param,
                )
            }
        }
    }

    fn build_eq(&mut self, field: &FieldPath, value: &Value) -> String {
        let path = field.to_pg_path();
        if value.is_null() {
            return format!(
                "({doc} #> {path} IS NULL OR {doc} #> {path} = 'null'::jsonb)",
                doc = DOC_COLUMN,
                path = path
            );
        }
        // Text comparison makes `?cost=1000` match a stored number and
        // `?zipcode=02118` match a stored string; the containment arm gives
        // array fields (careers) element semantics.
        let text_param = self.param(value.clone());
        let element_param = self.param(value.clone());
        format!(
            "({doc} #>> {path} = ({text_param}::jsonb #>> '{{}}') OR {doc} #> {path} @> jsonb_build_array({element_param}::jsonb))",
            doc = DOC_COLUMN,
            path = path,
            text_param = text_param,
            element_param = element_param,
        )
    }

    fn build_logical(&mut self, parts: &[FilterExpr], joiner: &str, empty: &str) -> String {
        if parts.is_empty() {
            return empty.to_string();
        }
        let sql: Vec<String> = parts.iter().map(|p| self.build(p)).collect();
        format!("({})", sql.join(joiner))
    }

    fn float_param(&mut self, value: f64) -> String {
        let placeholder = self.param(Value::from(value));
        format!("({}::jsonb #>> '{{}}')::float8", placeholder)
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
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
    fn empty_and_matches_everything() {
        let (sql, params) = FilterWhere::generate(&FilterExpr::all(), 0).unwrap();
        assert_eq!(sql, "TRUE");
        assert!(params.is_empty());
    }

    #[test]
    fn comparison_binds_value_and_guards_type() {
        let expr = FilterExpr::Cmp(path("averageCost"), CmpOp::Gte, json!(1000));
        let (sql, params) = FilterWhere::generate(&expr, 0).unwrap();
        assert!(sql.contains("jsonb_typeof(\"doc\" #> '{averageCost}') = jsonb_typeof($1::jsonb)"));
        assert!(sql.contains("\"doc\" #> '{averageCost}' >= $2::jsonb"));
        assert_eq!(params, vec![json!(1000), json!(1000)]);
    }

    #[test]
    fn nested_path_and_param_offset() {
        let expr = FilterExpr::Eq(path("location.state"), json!("MA"));
        let (sql, params) = FilterWhere::generate(&expr, 3).unwrap();
        assert!(sql.contains("'{location,state}'"));
        assert!(sql.contains("$4") && sql.contains("$5"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn membership_expands_to_disjunction() {
        let expr = FilterExpr::In(path("careers"), vec![json!("Business"), json!("UI/UX")]);
        let (sql, params) = FilterWhere::generate(&expr, 0).unwrap();
        assert_eq!(sql.matches(" OR ").count(), 3);
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn string_values_never_reach_the_sql_text() {
        let expr = FilterExpr::Eq(path("name"), json!("x' OR '1'='1 [gte]"));
        let (sql, params) = FilterWhere::generate(&expr, 0).unwrap();
        assert!(!sql.contains("OR '1'='1"));
        assert_eq!(params[0], json!("x' OR '1'='1 [gte]"));
    }

    #[test]
    fn near_uses_coordinates_of_the_point() {
        let expr = FilterExpr::Near { field: path("location"), lng: -71.1, lat: 42.3, radians: 0.01 };
        let (sql, params) = FilterWhere::generate(&expr, 0).unwrap();
        assert!(sql.contains("'{location,coordinates,0}'"));
        assert!(sql.contains("'{location,coordinates,1}'"));
        assert!(sql.contains("asin"));
        assert_eq!(params.len(), 4);
    }
}
