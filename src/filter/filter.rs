use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::types::{CmpOp, FieldPath, FilterExpr, PageRequest, Projection, SortKey};
use crate::config::FilterConfig;

/// A list request translated from query parameters: filter expression,
/// projection, sort and page window.
///
/// `?averageCost[lte]=10000&careers[in]=Business,UI/UX&select=name&sort=-name&page=2`
/// becomes `And[Cmp(averageCost <= 10000), In(careers, [..])]`, a projection
/// on `name`, a descending sort and page 2 of the configured default size.
#[derive(Debug, Clone)]
pub struct Filter {
    where_expr: FilterExpr,
    projection: Option<Projection>,
    order: Vec<SortKey>,
    page: PageRequest,
}

impl Filter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            where_expr: FilterExpr::all(),
            projection: None,
            order: FilterOrder::default_sort(),
            page: PageRequest { page: 1, limit: config.default_limit.max(1) as u64 },
        }
    }

    pub fn from_params(params: &[(String, String)], config: &FilterConfig) -> Result<Self, FilterError> {
        let mut filter = Self::new(config);
        filter.assign(params, config)?;
        Ok(filter)
    }

    pub fn assign(&mut self, params: &[(String, String)], config: &FilterConfig) -> Result<&mut Self, FilterError> {
        let mut conditions: Vec<FilterExpr> = Vec::new();

        // select/sort/page/limit control the listing; every other key filters it
        for (key, raw) in params {
            match key.as_str() {
                "select" => {
                    self.select(raw)?;
                }
                "sort" => {
                    self.order(raw)?;
                }
                "page" => {
                    self.page.page = parse_positive(raw).ok_or_else(|| FilterError::InvalidPage(raw.clone()))?;
                }
                "limit" => {
                    self.limit(raw, config)?;
                }
                _ => Self::push_condition(&mut conditions, key, raw)?,
            }
        }

        if self.page.window().is_none() {
            return Err(FilterError::InvalidPage(self.page.page.to_string()));
        }

        let expr = FilterExpr::And(conditions);
        expr.validate()?;
        self.where_expr = expr;

        if config.debug_logging {
            tracing::debug!(filter = ?self.where_expr, sort = ?self.order, page = ?self.page, "translated list query");
        }
        Ok(self)
    }

    pub fn select(&mut self, raw: &str) -> Result<&mut Self, FilterError> {
        let fields = raw
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(FieldPath::parse)
            .collect::<Result<Vec<_>, _>>()?;
        self.projection = if fields.is_empty() { None } else { Some(Projection { fields }) };
        Ok(self)
    }

    pub fn order(&mut self, raw: &str) -> Result<&mut Self, FilterError> {
        let keys = FilterOrder::parse(raw)?;
        self.order = if keys.is_empty() { FilterOrder::default_sort() } else { keys };
        Ok(self)
    }

    pub fn limit(&mut self, raw: &str, config: &FilterConfig) -> Result<&mut Self, FilterError> {
        let limit = parse_positive(raw).ok_or_else(|| FilterError::InvalidLimit(raw.to_string()))?;
        let max_limit = config.max_limit.max(1) as u64;
        let applied_limit = if limit > max_limit {
            if config.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };
        self.page.limit = applied_limit;
        Ok(self)
    }

    /// Restricts the filter further, e.g. to the courses of one bootcamp
    pub fn scope(&mut self, expr: FilterExpr) -> &mut Self {
        let current = std::mem::replace(&mut self.where_expr, FilterExpr::all());
        self.where_expr = current.and(expr);
        self
    }

    pub fn where_expr(&self) -> &FilterExpr {
        &self.where_expr
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.order
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    /// `field[op]=value`: the operator is only ever read from the bracket
    /// suffix of the key, values are taken verbatim.
    fn push_condition(conditions: &mut Vec<FilterExpr>, key: &str, raw: &str) -> Result<(), FilterError> {
        let (field, op) = split_operator(key)?;
        let field = FieldPath::parse(field)?;

        let expr = match op {
            None => FilterExpr::Eq(field, coerce_value(raw)),
            Some("in") => {
                let values: Vec<Value> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(coerce_value)
                    .collect();
                // Repeated `field[in]` keys accumulate into one membership test
                if let Some(FilterExpr::In(_, existing)) = conditions
                    .iter_mut()
                    .find(|c| matches!(c, FilterExpr::In(f, _) if *f == field))
                {
                    existing.extend(values);
                    return Ok(());
                }
                FilterExpr::In(field, values)
            }
            Some(op) => FilterExpr::Cmp(field, parse_cmp_op(op)?, coerce_value(raw)),
        };
        conditions.push(expr);
        Ok(())
    }
}

fn split_operator(key: &str) -> Result<(&str, Option<&str>), FilterError> {
    match key.find('[') {
        None => Ok((key, None)),
        Some(open) => {
            let rest = &key[open + 1..];
            let op = rest
                .strip_suffix(']')
                .filter(|op| !op.contains('[') && !op.contains(']'))
                .ok_or_else(|| FilterError::InvalidField(key.to_string()))?;
            Ok((&key[..open], Some(op)))
        }
    }
}

fn parse_cmp_op(op: &str) -> Result<CmpOp, FilterError> {
    match op {
        "gt" => Ok(CmpOp::Gt),
        "gte" => Ok(CmpOp::Gte),
        "lt" => Ok(CmpOp::Lt),
        "lte" => Ok(CmpOp::Lte),
        other => Err(FilterError::UnsupportedOperator(other.to_string())),
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// Query strings carry text only. Numbers and booleans are recovered when
/// the text is their canonical form, so `02118` stays a string.
pub fn coerce_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        if i.to_string() == raw {
            return Value::from(i);
        }
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() && f.to_string() == raw {
            return Value::from(f);
        }
    }
    Value::String(raw.to_string())
}

impl Projection {
    /// Keeps the selected fields (and `id`) of a document
    pub fn apply(&self, doc: &Value) -> Value {
        let mut out = Map::new();
        if let Some(id) = doc.get("id") {
            out.insert("id".to_string(), id.clone());
        }
        for field in &self.fields {
            if let Some(value) = field.lookup(doc) {
                insert_path(&mut out, field.segments(), value.clone());
            }
        }
        Value::Object(out)
    }

    /// Whether `name` was selected as a top-level field
    pub fn includes(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.is(name))
    }
}

fn insert_path(target: &mut Map<String, Value>, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [last] => {
            target.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = target
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn translate(pairs: &[(&str, &str)]) -> Result<Filter, FilterError> {
        Filter::from_params(&params(pairs), &AppConfig::development().filter)
    }

    #[test]
    fn strips_reserved_keys_from_conditions() {
        let filter = translate(&[("select", "name"), ("sort", "name"), ("page", "2"), ("limit", "5")]).unwrap();
        assert_eq!(filter.where_expr(), &FilterExpr::And(vec![]));
        assert_eq!(filter.page(), PageRequest { page: 2, limit: 5 });
        assert_eq!(filter.page().skip(), 5);
    }

    #[test]
    fn rewrites_bracket_operators() {
        let filter = translate(&[("averageCost[gte]", "1000"), ("weeks[lt]", "12")]).unwrap();
        assert_eq!(
            filter.where_expr(),
            &FilterExpr::And(vec![
                FilterExpr::Cmp(FieldPath::single("averageCost"), CmpOp::Gte, json!(1000)),
                FilterExpr::Cmp(FieldPath::single("weeks"), CmpOp::Lt, json!(12)),
            ])
        );
    }

    #[test]
    fn operator_words_inside_values_are_left_alone() {
        let filter = translate(&[("name", "gte lt in [gt]"), ("description", "[lte]")]).unwrap();
        assert_eq!(
            filter.where_expr(),
            &FilterExpr::And(vec![
                FilterExpr::Eq(FieldPath::single("name"), json!("gte lt in [gt]")),
                FilterExpr::Eq(FieldPath::single("description"), json!("[lte]")),
            ])
        );
    }

    #[test]
    fn field_names_containing_operator_words_are_not_rewritten() {
        let filter = translate(&[("interest", "x"), ("ingest[gt]", "3")]).unwrap();
        assert_eq!(
            filter.where_expr(),
            &FilterExpr::And(vec![
                FilterExpr::Eq(FieldPath::single("interest"), json!("x")),
                FilterExpr::Cmp(FieldPath::single("ingest"), CmpOp::Gt, json!(3)),
            ])
        );
    }

    #[test]
    fn in_operator_splits_and_accumulates() {
        let filter = translate(&[("careers[in]", "Business,UI/UX"), ("careers[in]", "Other")]).unwrap();
        assert_eq!(
            filter.where_expr(),
            &FilterExpr::And(vec![FilterExpr::In(
                FieldPath::single("careers"),
                vec![json!("Business"), json!("UI/UX"), json!("Other")]
            )])
        );
    }

    #[test]
    fn nested_paths_are_supported() {
        let filter = translate(&[("location.state", "MA")]).unwrap();
        assert_eq!(
            filter.where_expr(),
            &FilterExpr::And(vec![FilterExpr::Eq(FieldPath::parse("location.state").unwrap(), json!("MA"))])
        );
    }

    #[test]
    fn unknown_operator_and_malformed_keys_fail() {
        assert!(matches!(translate(&[("cost[ne]", "1")]), Err(FilterError::UnsupportedOperator(_))));
        assert!(matches!(translate(&[("cost[gt", "1")]), Err(FilterError::InvalidField(_))));
        assert!(matches!(translate(&[("cost[gt]]", "1")]), Err(FilterError::InvalidField(_))));
        assert!(matches!(translate(&[("$where", "1")]), Err(FilterError::InvalidField(_))));
    }

    #[test]
    fn page_and_limit_validation() {
        assert!(matches!(translate(&[("page", "0")]), Err(FilterError::InvalidPage(_))));
        assert!(matches!(translate(&[("limit", "abc")]), Err(FilterError::InvalidLimit(_))));
        let capped = translate(&[("limit", "100000")]).unwrap();
        assert_eq!(capped.page().limit, 1000);
    }

    #[test]
    fn page_window_must_fit_an_offset() {
        let max = u64::MAX.to_string();
        assert!(matches!(translate(&[("page", max.as_str())]), Err(FilterError::InvalidPage(_))));
        assert!(matches!(
            translate(&[("limit", "1000"), ("page", "9223372036854775807")]),
            Err(FilterError::InvalidPage(_))
        ));

        let last = translate(&[("limit", "1"), ("page", "9223372036854775807")]).unwrap();
        assert_eq!(last.page().skip(), 9223372036854775806);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let filter = translate(&[]).unwrap();
        assert_eq!(filter.sort(), FilterOrder::default_sort().as_slice());
        assert_eq!(filter.page(), PageRequest { page: 1, limit: 25 });
    }

    #[test]
    fn coerces_canonical_scalars_only() {
        assert_eq!(coerce_value("1000"), json!(1000));
        assert_eq!(coerce_value("2.5"), json!(2.5));
        assert_eq!(coerce_value("true"), json!(true));
        assert_eq!(coerce_value("02118"), json!("02118"));
        assert_eq!(coerce_value("1e3"), json!("1e3"));
        assert_eq!(coerce_value("Boston"), json!("Boston"));
    }

    #[test]
    fn projection_keeps_id_and_nested_fields() {
        let filter = translate(&[("select", "name,location.city")]).unwrap();
        let doc = json!({"id": "abc", "name": "Devworks", "description": "x", "location": {"city": "Boston", "state": "MA"}});
        let projected = filter.projection().unwrap().apply(&doc);
        assert_eq!(projected, json!({"id": "abc", "name": "Devworks", "location": {"city": "Boston"}}));
    }
}
