//! Rooms queries (Postgres)

use sqlx::PgExecutor;

use super::NewRoom;
use crate::{
    error::{AppError, AppResult},
    models::{room::DUMMY_ORGANIZATION, Room, RoomKey, RoomLayout, UsageStatistic},
};

/// Get room by ID
pub async fn by_id<'e>(ex: impl PgExecutor<'e>, id: i64) -> AppResult<Room> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", id)))
}

/// Get room by organization, department, building and room name
pub async fn by_key<'e>(ex: impl PgExecutor<'e>, key: &RoomKey) -> AppResult<Option<Room>> {
    let room = sqlx::query_as::<_, Room>(
        r#"
        SELECT * FROM rooms
        WHERE organization = $1 AND department = $2 AND building = $3 AND room = $4
        "#,
    )
    .bind(&key.organization)
    .bind(&key.department)
    .bind(&key.building)
    .bind(&key.room)
    .fetch_optional(ex)
    .await?;
    Ok(room)
}

pub async fn insert<'e>(ex: impl PgExecutor<'e>, room: &NewRoom) -> AppResult<Room> {
    let row = sqlx::query_as::<_, Room>(
        r#"
        INSERT INTO rooms (organization, department, building, room,
                           row_dist, seat_dist, seat_last,
                           importstep_id, created_importstep_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        RETURNING *
        "#,
    )
    .bind(&room.key.organization)
    .bind(&room.key.department)
    .bind(&room.key.building)
    .bind(&room.key.room)
    .bind(room.layout.row_dist)
    .bind(room.layout.seat_dist)
    .bind(&room.layout.seat_last)
    .bind(room.importstep_id)
    .fetch_one(ex)
    .await?;
    Ok(row)
}

pub async fn update_layout<'e>(
    ex: impl PgExecutor<'e>,
    id: i64,
    layout: &RoomLayout,
    importstep_id: i64,
) -> AppResult<Room> {
    sqlx::query_as::<_, Room>(
        r#"
        UPDATE rooms
        SET row_dist = $2, seat_dist = $3, seat_last = $4, importstep_id = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(layout.row_dist)
    .bind(layout.seat_dist)
    .bind(&layout.seat_last)
    .bind(importstep_id)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", id)))
}

/// Transaction-scoped advisory lock on the room's descriptor
pub async fn lock<'e>(ex: impl PgExecutor<'e>, key: &RoomKey) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
        .bind(key.descriptor())
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn usage_statistics<'e>(ex: impl PgExecutor<'e>) -> AppResult<Vec<UsageStatistic>> {
    let rows = sqlx::query_as::<_, UsageStatistic>(
        r#"
        SELECT r.organization, r.department,
               COUNT(DISTINCT r.id) AS rooms,
               COUNT(DISTINCT s.id) AS seats,
               COUNT(v.id) AS visits
        FROM rooms r
        JOIN seats s ON s.room_id = r.id
        LEFT JOIN visits v ON v.seat_id = s.id
        WHERE r.organization <> $1
        GROUP BY r.organization, r.department
        ORDER BY r.organization, r.department
        "#,
    )
    .bind(DUMMY_ORGANIZATION)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}
