//! Seats queries (Postgres)

use sqlx::PgExecutor;

use super::NewSeat;
use crate::{
    error::{AppError, AppResult},
    models::Seat,
};

pub async fn by_id<'e>(ex: impl PgExecutor<'e>, id: i64) -> AppResult<Seat> {
    sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Seat with id {} not found", id)))
}

pub async fn by_hash<'e>(ex: impl PgExecutor<'e>, hash: &str) -> AppResult<Option<Seat>> {
    let seat = sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE hash = $1")
        .bind(hash)
        .fetch_optional(ex)
        .await?;
    Ok(seat)
}

/// Seat at a position of a room
pub async fn at<'e>(
    ex: impl PgExecutor<'e>,
    room_id: i64,
    rownumber: i32,
    seatnumber: i32,
) -> AppResult<Option<Seat>> {
    let seat = sqlx::query_as::<_, Seat>(
        "SELECT * FROM seats WHERE room_id = $1 AND rownumber = $2 AND seatnumber = $3",
    )
    .bind(room_id)
    .bind(rownumber)
    .bind(seatnumber)
    .fetch_optional(ex)
    .await?;
    Ok(seat)
}

pub async fn insert<'e>(ex: impl PgExecutor<'e>, seat: &NewSeat) -> AppResult<Seat> {
    let row = sqlx::query_as::<_, Seat>(
        r#"
        INSERT INTO seats (hash, rownumber, seatnumber, room_id)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&seat.hash)
    .bind(seat.rownumber)
    .bind(seat.seatnumber)
    .bind(seat.room_id)
    .fetch_one(ex)
    .await?;
    Ok(row)
}

pub async fn rehash<'e>(ex: impl PgExecutor<'e>, id: i64, hash: &str) -> AppResult<Seat> {
    sqlx::query_as::<_, Seat>("UPDATE seats SET hash = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(hash)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Seat with id {} not found", id)))
}

pub async fn of_importstep<'e>(ex: impl PgExecutor<'e>, importstep_id: i64) -> AppResult<Vec<Seat>> {
    let seats = sqlx::query_as::<_, Seat>(
        r#"
        SELECT s.* FROM seats s
        JOIN rooms r ON r.id = s.room_id
        WHERE r.importstep_id = $1
        ORDER BY r.organization, r.department, r.building, r.room, s.rownumber, s.seatnumber
        "#,
    )
    .bind(importstep_id)
    .fetch_all(ex)
    .await?;
    Ok(seats)
}

pub async fn count_of_importstep<'e>(ex: impl PgExecutor<'e>, importstep_id: i64) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM seats s JOIN rooms r ON r.id = s.room_id WHERE r.importstep_id = $1",
    )
    .bind(importstep_id)
    .fetch_one(ex)
    .await?;
    Ok(count)
}
