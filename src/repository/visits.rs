//! Visits queries (Postgres)

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::{
    error::{AppError, AppResult},
    models::{NewVisit, Visit, VisitSearch},
};

pub async fn by_id<'e>(ex: impl PgExecutor<'e>, id: i64) -> AppResult<Visit> {
    sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Visit with id {} not found", id)))
}

pub async fn insert<'e>(
    ex: impl PgExecutor<'e>,
    seat_id: i64,
    visit: &NewVisit,
    submission_dt: DateTime<Utc>,
) -> AppResult<Visit> {
    let row = sqlx::query_as::<_, Visit>(
        r#"
        INSERT INTO visits (givenname, familyname, street_and_number, zipcode, town,
                            phone, email, status_3g, submission_dt,
                            present_from_dt, present_to_dt, seat_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(&visit.givenname)
    .bind(&visit.familyname)
    .bind(&visit.street_and_number)
    .bind(&visit.zipcode)
    .bind(&visit.town)
    .bind(&visit.phone)
    .bind(&visit.email)
    .bind(visit.status_3g)
    .bind(submission_dt)
    .bind(visit.present_from_dt)
    .bind(visit.present_to_dt)
    .bind(seat_id)
    .fetch_one(ex)
    .await?;
    Ok(row)
}

pub async fn in_room_between<'e>(
    ex: impl PgExecutor<'e>,
    room_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<Vec<Visit>> {
    let rows = sqlx::query_as::<_, Visit>(
        r#"
        SELECT v.* FROM visits v
        JOIN seats s ON s.id = v.seat_id
        WHERE s.room_id = $1 AND v.present_to_dt > $2 AND v.present_from_dt < $3
        ORDER BY v.present_from_dt, v.id
        "#,
    )
    .bind(room_id)
    .bind(from)
    .bind(to)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

pub async fn in_room_at<'e>(
    ex: impl PgExecutor<'e>,
    room_id: i64,
    at: DateTime<Utc>,
) -> AppResult<Vec<Visit>> {
    let rows = sqlx::query_as::<_, Visit>(
        r#"
        SELECT v.* FROM visits v
        JOIN seats s ON s.id = v.seat_id
        WHERE s.room_id = $1 AND v.present_from_dt <= $2 AND v.present_to_dt > $2
        ORDER BY v.present_from_dt, v.id
        "#,
    )
    .bind(room_id)
    .bind(at)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

pub async fn search<'e>(ex: impl PgExecutor<'e>, f: &VisitSearch) -> AppResult<Vec<Visit>> {
    let rows = sqlx::query_as::<_, Visit>(
        r#"
        SELECT v.* FROM visits v
        JOIN seats s ON s.id = v.seat_id
        JOIN rooms r ON r.id = s.room_id
        WHERE r.organization ILIKE $1 AND r.department ILIKE $2
          AND r.building ILIKE $3 AND r.room ILIKE $4
          AND v.givenname ILIKE $5 AND v.familyname ILIKE $6
          AND v.phone ILIKE $7 AND v.email ILIKE $8
          AND v.present_to_dt > $9
          AND v.present_from_dt < $10
        ORDER BY v.present_from_dt, v.id
        "#,
    )
    .bind(&f.organization)
    .bind(&f.department)
    .bind(&f.building)
    .bind(&f.room)
    .bind(&f.givenname)
    .bind(&f.familyname)
    .bind(&f.phone)
    .bind(&f.email)
    .bind(f.from_dt)
    .bind(f.to_dt)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}
