use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, SqlResult, SqlValue};

/// Chainable table query, compiled to parameterized SQL.
///
/// ```ignore
/// Filter::new("audit_logs")
///     .eq("action", "settings_update")
///     .gte("created_at", since)
///     .order("created_at desc")
///     .limit(50, Some(0));
/// ```
///
/// Names are validated when the SQL is rendered, so builder calls never fail.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    conditions: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            select_columns: vec![],
            conditions: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    fn push(mut self, column: &str, operator: FilterOp, values: Vec<SqlValue>) -> Self {
        self.conditions.push(FilterWhereInfo {
            column: column.to_string(),
            operator,
            values,
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::Eq, vec![value.into()])
    }

    pub fn neq(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::Neq, vec![value.into()])
    }

    pub fn gt(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::Gt, vec![value.into()])
    }

    pub fn gte(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::Gte, vec![value.into()])
    }

    pub fn lt(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::Lt, vec![value.into()])
    }

    pub fn lte(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::Lte, vec![value.into()])
    }

    pub fn like(self, column: &str, pattern: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::Like, vec![pattern.into()])
    }

    pub fn ilike(self, column: &str, pattern: impl Into<SqlValue>) -> Self {
        self.push(column, FilterOp::ILike, vec![pattern.into()])
    }

    pub fn in_list<V: Into<SqlValue>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push(column, FilterOp::In, values)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.push(column, FilterOp::IsNull, vec![])
    }

    pub fn not_null(self, column: &str) -> Self {
        self.push(column, FilterOp::NotNull, vec![])
    }

    /// Apply `eq` only when a value is present (optional query parameters).
    pub fn eq_opt<V: Into<SqlValue>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn gte_opt<V: Into<SqlValue>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.gte(column, v),
            None => self,
        }
    }

    pub fn lte_opt<V: Into<SqlValue>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.lte(column, v),
            None => self,
        }
    }

    pub fn ilike_opt<V: Into<SqlValue>>(self, column: &str, pattern: Option<V>) -> Self {
        match pattern {
            Some(p) => self.ilike(column, p),
            None => self,
        }
    }

    /// Append ordering, e.g. `"created_at desc"` or `"title, created_at desc"`.
    pub fn order(mut self, spec: &str) -> Self {
        self.order_data.extend(FilterOrder::parse(spec));
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        self.validate()?;
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0)?;

        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table_name),
            Self::where_prefix(&where_clause),
            FilterOrder::generate(&self.order_data),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        self.validate()?;
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0)?;
        let query = [
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name),
            Self::where_prefix(&where_clause),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        Ok(SqlResult { query, params })
    }

    /// DELETE with the same conditions. Refuses to render an unconditional delete.
    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        self.validate()?;
        if self.conditions.is_empty() {
            return Err(FilterError::InvalidOperatorData(
                "DELETE requires at least one condition".to_string(),
            ));
        }
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0)?;
        Ok(SqlResult {
            query: format!("DELETE FROM \"{}\" WHERE {}", self.table_name, where_clause),
            params,
        })
    }

    fn where_prefix(where_clause: &str) -> String {
        if where_clause.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clause)
        }
    }

    fn validate(&self) -> Result<(), FilterError> {
        if !is_identifier(&self.table_name) {
            return Err(FilterError::InvalidTableName(format!(
                "Invalid table name format: {}",
                self.table_name
            )));
        }
        let columns = self
            .select_columns
            .iter()
            .filter(|c| c.as_str() != "*")
            .chain(self.conditions.iter().map(|c| &c.column))
            .chain(self.order_data.iter().map(|o| &o.column));
        for column in columns {
            if !is_identifier(column) {
                return Err(FilterError::InvalidColumn(format!(
                    "Invalid column name format: {}",
                    column
                )));
            }
        }
        if let Some(limit) = self.limit {
            if limit < 0 {
                return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        Ok(())
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn builds_chained_select() {
        let since = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let sql = Filter::new("audit_logs")
            .eq("action", "settings_update")
            .gte("created_at", since)
            .order("created_at desc")
            .limit(50, Some(100))
            .to_sql()
            .unwrap();

        assert_eq!(
            sql.query,
            "SELECT * FROM \"audit_logs\" WHERE \"action\" = $1 AND \"created_at\" >= $2 ORDER BY \"created_at\" DESC LIMIT 50 OFFSET 100"
        );
        assert_eq!(sql.params[0], SqlValue::Text("settings_update".into()));
        assert_eq!(sql.params[1], SqlValue::Timestamp(since));
    }

    #[test]
    fn optional_conditions_are_skipped() {
        let sql = Filter::new("job_listings")
            .eq("is_active", true)
            .eq_opt::<String>("location", None)
            .eq_opt("climate_sector", Some("solar"))
            .to_count_sql()
            .unwrap();
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) AS count FROM \"job_listings\" WHERE \"is_active\" = $1 AND \"climate_sector\" = $2"
        );
    }

    #[test]
    fn renders_comparison_operators() {
        let sql = Filter::new("job_listings")
            .neq("employment_type", "contract")
            .gt("salary_max", 40_000)
            .lt("salary_min", 90_000)
            .like("title", "%Solar%")
            .in_list("climate_sector", ["solar", "wind"])
            .is_null("deleted_at")
            .not_null("location")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"job_listings\" WHERE \"employment_type\" <> $1 AND \"salary_max\" > $2 \
             AND \"salary_min\" < $3 AND \"title\" LIKE $4 AND \"climate_sector\" IN ($5, $6) \
             AND \"deleted_at\" IS NULL AND \"location\" IS NOT NULL"
        );
        assert_eq!(sql.params.len(), 6);
    }

    #[test]
    fn selects_named_columns() {
        let sql = Filter::new("profiles").select(&["id", "user_type"]).to_sql().unwrap();
        assert_eq!(sql.query, "SELECT \"id\", \"user_type\" FROM \"profiles\"");
    }

    #[test]
    fn rejects_injected_identifiers() {
        assert!(Filter::new("profiles; DROP TABLE x").to_sql().is_err());
        assert!(Filter::new("profiles").eq("id\" OR 1=1 --", 1).to_sql().is_err());
        assert!(Filter::new("profiles").order("name; --").to_sql().is_err());
    }

    #[test]
    fn rejects_negative_limit() {
        assert!(matches!(
            Filter::new("profiles").limit(-1, None).to_sql(),
            Err(FilterError::InvalidLimit(_))
        ));
    }

    #[test]
    fn delete_requires_condition() {
        assert!(Filter::new("conversations").to_delete_sql().is_err());
        let sql = Filter::new("conversations").eq("id", 7).to_delete_sql().unwrap();
        assert_eq!(sql.query, "DELETE FROM \"conversations\" WHERE \"id\" = $1");
    }
}
