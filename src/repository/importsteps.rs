//! Importsteps queries (Postgres)

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::{
    error::{AppError, AppResult},
    models::{ImportCounts, Importstep},
};

pub async fn insert<'e>(
    ex: impl PgExecutor<'e>,
    user: &str,
    when: DateTime<Utc>,
) -> AppResult<Importstep> {
    let row = sqlx::query_as::<_, Importstep>(
        r#"INSERT INTO importsteps ("when", "user") VALUES ($1, $2) RETURNING *"#,
    )
    .bind(when)
    .bind(user)
    .fetch_one(ex)
    .await?;
    Ok(row)
}

/// Store the final counters of an import
pub async fn finish<'e>(
    ex: impl PgExecutor<'e>,
    id: i64,
    counts: &ImportCounts,
) -> AppResult<Importstep> {
    sqlx::query_as::<_, Importstep>(
        r#"
        UPDATE importsteps
        SET num_existing_rooms = $2, num_existing_seats = $3,
            num_new_rooms = $4, num_new_seats = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(counts.num_existing_rooms)
    .bind(counts.num_existing_seats)
    .bind(counts.num_new_rooms)
    .bind(counts.num_new_seats)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Importstep with id {} not found", id)))
}

pub async fn since<'e>(ex: impl PgExecutor<'e>, since: DateTime<Utc>) -> AppResult<Vec<Importstep>> {
    let rows = sqlx::query_as::<_, Importstep>(
        r#"SELECT * FROM importsteps WHERE "when" >= $1 ORDER BY "when", id"#,
    )
    .bind(since)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}
