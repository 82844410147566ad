// src/db/pg_store.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::store::{compare_values, DocumentStore, Filter, Query, SortDirection, TextSearch};

// Todos os documentos vivem na tabela `documents` (collection, id, body JSONB).
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// "price.retail" -> {price,retail}, para os operadores #> e #>>
fn path(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Eq(field, value) => {
            qb.push("(body #> ")
                .push_bind(path(field))
                .push("::text[]) = ")
                .push_bind(Json(value.clone()))
                .push("::jsonb");
        }
        Filter::In(field, values) => {
            let alternatives = values
                .iter()
                .map(|v| Filter::Eq(field.clone(), v.clone()))
                .collect();
            push_filter(qb, &Filter::Or(alternatives));
        }
        Filter::Contains(field, value) => {
            qb.push("(body #> ")
                .push_bind(path(field))
                .push("::text[]) @> ")
                .push_bind(Json(value.clone()))
                .push("::jsonb");
        }
        Filter::ILike(field, needle) => {
            qb.push("(body #>> ")
                .push_bind(path(field))
                .push("::text[]) ILIKE ")
                .push_bind(escape_like(needle));
        }
        Filter::Range { field, min, max } => {
            qb.push("(");
            let mut bounds = 0;
            for (op, bound) in [(">=", min), ("<=", max)] {
                if let Some(bound) = bound {
                    if bounds > 0 {
                        qb.push(" AND ");
                    }
                    qb.push("(body #>> ")
                        .push_bind(path(field))
                        .push("::text[])::double precision ")
                        .push(op)
                        .push(" ")
                        .push_bind(*bound);
                    bounds += 1;
                }
            }
            if bounds == 0 {
                // Sem limites: só exige que o campo exista
                qb.push("(body #> ").push_bind(path(field)).push("::text[]) IS NOT NULL");
            }
            qb.push(")");
        }
        Filter::And(filters) | Filter::Or(filters) if filters.is_empty() => {
            qb.push(if matches!(filter, Filter::And(_)) { "TRUE" } else { "FALSE" });
        }
        Filter::And(filters) | Filter::Or(filters) => {
            let joiner = if matches!(filter, Filter::And(_)) { " AND " } else { " OR " };
            qb.push("(");
            for (i, f) in filters.iter().enumerate() {
                if i > 0 {
                    qb.push(joiner);
                }
                push_filter(qb, f);
            }
            qb.push(")");
        }
        Filter::Not(inner) => {
            qb.push("NOT COALESCE(");
            push_filter(qb, inner);
            qb.push(", FALSE)");
        }
    }
}

fn push_text_vector(qb: &mut QueryBuilder<'_, Postgres>, text: &TextSearch) {
    qb.push("to_tsvector('simple', concat_ws(' '");
    for field in &text.fields {
        qb.push(", body #>> ").push_bind(path(field)).push("::text[]");
    }
    qb.push("))");
}

fn push_text_query(qb: &mut QueryBuilder<'_, Postgres>, text: &TextSearch) {
    // Termos unidos com OR; cada termo casa por prefixo
    let terms: Vec<&str> = text.term.split_whitespace().collect();
    qb.push("to_tsquery('simple', ")
        .push_bind(
            terms
                .iter()
                .map(|t| format!("'{}':*", t.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(" | "),
        )
        .push(")");
}

fn push_where(
    qb: &mut QueryBuilder<'_, Postgres>,
    collection: &str,
    filter: &Filter,
    text: Option<&TextSearch>,
) {
    qb.push(" WHERE collection = ").push_bind(collection.to_string());
    qb.push(" AND ");
    push_filter(qb, filter);
    if let Some(text) = text {
        qb.push(" AND ");
        push_text_vector(qb, text);
        qb.push(" @@ ");
        push_text_query(qb, text);
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), AppError> {
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // Converte erro de violação de chave única em um erro mais amigável
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return AppError::Conflict(format!("documento {} já existe em '{}'", id, collection));
                    }
                }
                AppError::DatabaseError(e)
            })?;
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, AppError> {
        let row: Option<Json<Value>> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(body)| body))
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Value>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents");
        push_where(&mut qb, collection, &query.filter, query.text.as_ref());

        qb.push(" ORDER BY ");
        if let Some(text) = &query.text {
            qb.push("ts_rank(");
            push_text_vector(&mut qb, text);
            qb.push(", ");
            push_text_query(&mut qb, text);
            qb.push(") DESC, ");
        }
        for sort in &query.sort {
            qb.push("body #> ").push_bind(path(&sort.field)).push("::text[] ");
            qb.push(match sort.direction {
                SortDirection::Asc => "ASC NULLS FIRST, ",
                SortDirection::Desc => "DESC NULLS LAST, ",
            });
        }
        qb.push("id ASC");

        qb.push(" OFFSET ").push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows: Vec<Json<Value>> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(body)| body).collect())
    }

    async fn count(
        &self,
        collection: &str,
        filter: &Filter,
        text: Option<&TextSearch>,
    ) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_where(&mut qb, collection, filter, text);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total as u64)
    }

    async fn replace(&self, collection: &str, id: Uuid, doc: Value) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE documents SET body = $3, updated_at = now() WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents");
        push_where(&mut qb, collection, filter, None);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn increment(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        by: i64,
    ) -> Result<bool, AppError> {
        // Um único UPDATE: atômico no documento, sem read-then-write
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = jsonb_set(
                    body,
                    $3::text[],
                    to_jsonb(COALESCE((body #>> $3::text[])::bigint, 0) + $4),
                    true
                ),
                updated_at = now()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(path(field))
        .bind(by)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn distinct(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
    ) -> Result<Vec<Value>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT DISTINCT elem FROM documents, ");
        qb.push("jsonb_array_elements(CASE WHEN jsonb_typeof(body #> ")
            .push_bind(path(field))
            .push("::text[]) = 'array' THEN body #> ")
            .push_bind(path(field))
            .push("::text[] ELSE jsonb_build_array(body #> ")
            .push_bind(path(field))
            .push("::text[]) END) AS elem");
        push_where(&mut qb, collection, filter, None);
        qb.push(" AND elem IS NOT NULL AND elem <> 'null'::jsonb");

        let rows: Vec<Json<Value>> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        let mut values: Vec<Value> = rows.into_iter().map(|Json(v)| v).collect();
        values.sort_by(|a, b| compare_values(Some(a), Some(b)));
        Ok(values)
    }

    async fn numeric_range(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
    ) -> Result<Option<(f64, f64)>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT MIN((body #>> ");
        qb.push_bind(path(field))
            .push("::text[])::double precision), MAX((body #>> ")
            .push_bind(path(field))
            .push("::text[])::double precision) FROM documents");
        push_where(&mut qb, collection, filter, None);

        let (min, max): (Option<f64>, Option<f64>) =
            qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(min.zip(max))
    }
}
