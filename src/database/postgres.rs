//! PostgreSQL-backed document store.
//!
//! All collections share one JSONB table keyed by `(collection, id)`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::store::{describe_key, DocumentStore, Filter, Operator};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body JSONB NOT NULL,
    PRIMARY KEY (collection, id)
)";

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

fn sql_operator(op: Operator) -> &'static str {
    match op {
        Operator::Eq => "=",
        Operator::Ne => "<>",
        Operator::Lt => "<",
        Operator::Le => "<=",
        Operator::Gt => ">",
        Operator::Ge => ">=",
    }
}

/// `AND`-joined conditions for the filters. Field names and values are both
/// bound, starting at placeholder `$first`. Ordering comparisons also require
/// both sides to share a JSON type, since jsonb orders across types.
fn filter_conditions(filters: &[Filter], first: usize) -> String {
    filters
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let field = first + i * 2;
            let value = field + 1;
            let condition = format!("(body -> ${}) {} ${}", field, sql_operator(f.op), value);
            match f.op {
                Operator::Eq | Operator::Ne => condition,
                Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => format!(
                    "{} AND jsonb_typeof(body -> ${}) = jsonb_typeof(${})",
                    condition, field, value
                ),
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn select_sql(filters: &[Filter]) -> String {
    let mut sql = String::from("SELECT body FROM documents WHERE collection = $1");
    if !filters.is_empty() {
        sql.push_str(" AND ");
        sql.push_str(&filter_conditions(filters, 2));
    }
    sql
}

fn exists_sql(filters: &[Filter]) -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND {}) AS taken",
        filter_conditions(filters, 2)
    )
}

fn bind_filters<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    filters: &[Filter],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    for f in filters {
        q = q.bind(f.field.clone()).bind(f.value.clone());
    }
    q
}

fn bodies(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<Value>, DatabaseError> {
    rows.into_iter()
        .map(|row| row.try_get::<Value, _>("body").map_err(DatabaseError::from))
        .collect()
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, DatabaseError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;
        bodies(rows)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DatabaseError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<Value, _>("body")?)),
            None => Ok(None),
        }
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Value>, DatabaseError> {
        let sql = select_sql(filters);
        let q = bind_filters(sqlx::query(&sql).bind(collection), filters);
        let rows = q.fetch_all(&self.pool).await?;
        bodies(rows)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body",
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        unique: &[Filter],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Serialises creates within a collection until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(collection)
            .execute(&mut *tx)
            .await?;

        if !unique.is_empty() {
            let sql = exists_sql(unique);
            let row = bind_filters(sqlx::query(&sql).bind(collection), unique)
                .fetch_one(&mut *tx)
                .await?;
            if row.try_get::<bool, _>("taken")? {
                return Err(DatabaseError::AlreadyExists(describe_key(collection, unique)));
            }
        }

        let inserted = sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(DatabaseError::AlreadyExists(format!("{}/{}", collection, id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_without_filters_scans_collection() {
        assert_eq!(
            select_sql(&[]),
            "SELECT body FROM documents WHERE collection = $1"
        );
    }

    #[test]
    fn filters_bind_field_and_value_pairs() {
        let filters = [
            Filter::eq("firstName", "Ada"),
            Filter::new("zip", Operator::Ge, 90000),
        ];
        assert_eq!(
            select_sql(&filters),
            "SELECT body FROM documents WHERE collection = $1 AND (body -> $2) = $3 \
             AND (body -> $4) >= $5 AND jsonb_typeof(body -> $4) = jsonb_typeof($5)"
        );
    }

    #[test]
    fn ordering_requires_matching_json_types() {
        let sql = select_sql(&[Filter::new("zip", Operator::Lt, 0)]);
        assert!(sql.ends_with("(body -> $2) < $3 AND jsonb_typeof(body -> $2) = jsonb_typeof($3)"));

        let sql = select_sql(&[Filter::new("zip", Operator::Ne, 0)]);
        assert!(!sql.contains("jsonb_typeof"));
    }

    #[test]
    fn exists_query_wraps_key_conditions() {
        let sql = exists_sql(&[Filter::eq("username", "alovelace")]);
        assert_eq!(
            sql,
            "SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND (body -> $2) = $3) AS taken"
        );
    }

    #[test]
    fn not_equal_uses_sql_spelling() {
        assert_eq!(sql_operator(Operator::Ne), "<>");
    }
}
