use crate::database::store::Collection;
use crate::filter::filter_order::FilterOrder;
use crate::filter::filter_where::{FilterWhere, DOC_COLUMN};
use crate::filter::{FilterError, FilterExpr, FindOptions, SqlResult};

/// Builds the SQL statements `PgDocumentStore` runs against one collection
/// table. Every filter parameter is bound as `jsonb`.
pub struct QueryBuilder {
    collection: Collection,
}

impl QueryBuilder {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }

    fn table(&self) -> String {
        format!("\"{}\"", self.collection.table_name())
    }

    pub fn select(&self, filter: &FilterExpr, options: &FindOptions) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(filter, 1)?;
        let mut query = format!(
            "SELECT \"id\", \"created_at\", {} FROM {} WHERE {}",
            DOC_COLUMN,
            self.table(),
            where_clause
        );

        let order_clause = FilterOrder::generate(&options.sort);
        if !order_clause.is_empty() {
            query.push(' ');
            query.push_str(&order_clause);
        }
        // Window values are integers produced by the filter, never caller text
        if let Some(limit) = options.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }
        if options.skip > 0 {
            query.push_str(&format!(" OFFSET {}", options.skip));
        }

        Ok(SqlResult { query, params })
    }

    pub fn count(&self, filter: &FilterExpr) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(filter, 1)?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM {} WHERE {}", self.table(), where_clause),
            params,
        })
    }

    pub fn delete(&self, filter: &FilterExpr) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(filter, 1)?;
        Ok(SqlResult {
            query: format!("DELETE FROM {} WHERE {}", self.table(), where_clause),
            params,
        })
    }

    pub fn insert(&self) -> String {
        format!(
            "INSERT INTO {} (\"id\", \"created_at\", {}) VALUES ($1, $2, $3)",
            self.table(),
            DOC_COLUMN
        )
    }

    pub fn get(&self) -> String {
        format!(
            "SELECT \"id\", \"created_at\", {} FROM {} WHERE \"id\" = $1",
            DOC_COLUMN,
            self.table()
        )
    }

    pub fn replace(&self) -> String {
        format!("UPDATE {} SET {} = $2 WHERE \"id\" = $1", self.table(), DOC_COLUMN)
    }

    pub fn delete_by_id(&self) -> String {
        format!("DELETE FROM {} WHERE \"id\" = $1", self.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FieldPath, SortDirection, SortKey};
    use serde_json::json;

    #[test]
    fn select_includes_window_and_order() {
        let filter = FilterExpr::all().and(FilterExpr::Eq(FieldPath::single("housing"), json!(true)));
        let options = FindOptions {
            sort: vec![SortKey { field: FieldPath::single("name"), direction: SortDirection::Asc }],
            skip: 20,
            limit: Some(10),
        };
        let sql = QueryBuilder::new(Collection::Bootcamps).select(&filter, &options).unwrap();
        assert!(sql.query.starts_with("SELECT \"id\", \"created_at\", \"doc\" FROM \"bootcamps\" WHERE "));
        assert!(sql.query.contains("ORDER BY \"doc\" #> '{name}' ASC NULLS LAST, \"id\" ASC"));
        assert!(sql.query.ends_with("LIMIT 10 OFFSET 20"));
        assert!(!sql.params.is_empty());
    }

    #[test]
    fn count_and_delete_share_the_predicate() {
        let filter = FilterExpr::Eq(FieldPath::single("bootcamp"), json!("b1"));
        let builder = QueryBuilder::new(Collection::Courses);
        let count = builder.count(&filter).unwrap();
        let delete = builder.delete(&filter).unwrap();
        assert!(count.query.starts_with("SELECT COUNT(*) AS count FROM \"courses\" WHERE "));
        assert!(delete.query.starts_with("DELETE FROM \"courses\" WHERE "));
        assert_eq!(count.params, delete.params);
    }

    #[test]
    fn invalid_filters_never_reach_sql() {
        let filter = FilterExpr::In(FieldPath::single("careers"), vec![]);
        assert!(QueryBuilder::new(Collection::Bootcamps).count(&filter).is_err());
    }
}
