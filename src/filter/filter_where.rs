use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo, SqlValue};

pub struct FilterWhere {
    param_values: Vec<SqlValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render conditions joined by AND. Returns an empty clause when there are none.
    pub fn generate(
        conditions: &[FilterWhereInfo],
        starting_param_index: usize,
    ) -> Result<(String, Vec<SqlValue>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = Vec::with_capacity(conditions.len());
        for condition in conditions {
            sql_conditions.push(filter_where.build_sql_condition(condition)?);
        }
        Ok((sql_conditions.join(" AND "), filter_where.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let single = |op: &str| -> Result<SqlValue, FilterError> {
            condition
                .values
                .first()
                .cloned()
                .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires a value", op)))
        };

        Ok(match condition.operator {
            FilterOp::Eq => match single("eq")? {
                SqlValue::Null => format!("{} IS NULL", quoted_column),
                value => format!("{} = {}", quoted_column, self.param(value)),
            },
            FilterOp::Neq => match single("neq")? {
                SqlValue::Null => format!("{} IS NOT NULL", quoted_column),
                value => format!("{} <> {}", quoted_column, self.param(value)),
            },
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(single("gt")?)),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(single("gte")?)),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(single("lt")?)),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(single("lte")?)),
            FilterOp::Like => format!("{} LIKE {}", quoted_column, self.param(single("like")?)),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.param(single("ilike")?)),
            FilterOp::In => {
                if condition.values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let params: Vec<String> = condition
                    .values
                    .iter()
                    .map(|v| self.param(v.clone()))
                    .collect();
                format!("{} IN ({})", quoted_column, params.join(", "))
            }
            FilterOp::IsNull => format!("{} IS NULL", quoted_column),
            FilterOp::NotNull => format!("{} IS NOT NULL", quoted_column),
        })
    }

    fn param(&mut self, value: SqlValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(column: &str, operator: FilterOp, values: Vec<SqlValue>) -> FilterWhereInfo {
        FilterWhereInfo { column: column.to_string(), operator, values }
    }

    #[test]
    fn numbers_params_sequentially() {
        let conditions = vec![
            info("user_id", FilterOp::Eq, vec![SqlValue::Text("u1".into())]),
            info("status", FilterOp::In, vec!["active".into(), "archived".into()]),
            info("title", FilterOp::NotNull, vec![]),
        ];
        let (sql, params) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "\"user_id\" = $1 AND \"status\" IN ($2, $3) AND \"title\" IS NOT NULL");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn eq_null_becomes_is_null() {
        let conditions = vec![info("record_id", FilterOp::Eq, vec![SqlValue::Null])];
        let (sql, params) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "\"record_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn empty_in_matches_nothing() {
        let conditions = vec![info("id", FilterOp::In, vec![])];
        let (sql, _) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn comparison_without_value_is_rejected() {
        let conditions = vec![info("created_at", FilterOp::Gte, vec![])];
        assert!(FilterWhere::generate(&conditions, 0).is_err());
    }
}
