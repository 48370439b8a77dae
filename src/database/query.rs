use sqlx::{postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Row};

use super::manager::DatabaseError;
use crate::filter::{Filter, SqlValue};

// Thin execution layer over `Filter`: render, bind typed params, run.

pub async fn select_all<T>(pool: &PgPool, filter: &Filter) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = filter.to_sql()?;
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_all(pool).await?)
}

pub async fn select_optional<T>(pool: &PgPool, filter: &Filter) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = filter.to_sql()?;
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_optional(pool).await?)
}

pub async fn count(pool: &PgPool, filter: &Filter) -> Result<i64, DatabaseError> {
    let sql = filter.to_count_sql()?;
    let mut q = sqlx::query(&sql.query);
    for p in sql.params {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    Ok(row.try_get("count")?)
}

pub async fn delete(pool: &PgPool, filter: &Filter) -> Result<u64, DatabaseError> {
    let sql = filter.to_delete_sql()?;
    let mut q = sqlx::query(&sql.query);
    for p in sql.params {
        q = bind_param_query(q, p);
    }
    Ok(q.execute(pool).await?.rows_affected())
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: SqlValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlValue::Null => q.bind(None::<String>),
        SqlValue::Bool(b) => q.bind(b),
        SqlValue::Int(i) => q.bind(i),
        SqlValue::Float(f) => q.bind(f),
        SqlValue::Text(s) => q.bind(s),
        SqlValue::Uuid(u) => q.bind(u),
        SqlValue::Timestamp(ts) => q.bind(ts),
        SqlValue::Json(j) => q.bind(j),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: SqlValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlValue::Null => q.bind(None::<String>),
        SqlValue::Bool(b) => q.bind(b),
        SqlValue::Int(i) => q.bind(i),
        SqlValue::Float(f) => q.bind(f),
        SqlValue::Text(s) => q.bind(s),
        SqlValue::Uuid(u) => q.bind(u),
        SqlValue::Timestamp(ts) => q.bind(ts),
        SqlValue::Json(j) => q.bind(j),
    }
}
