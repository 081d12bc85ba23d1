//! Postgres-backed store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use super::{importsteps, rooms, seats, visits, NewRoom, NewSeat, Store, StoreTx};
use crate::{
    config::DatabaseConfig,
    error::AppResult,
    models::{
        ImportCounts, Importstep, NewVisit, PlacedSeat, Room, RoomKey, RoomLayout, Seat,
        UsageStatistic, Visit, VisitSearch,
    },
};

/// Store holding a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn placed_seat(&self, seat_id: i64) -> AppResult<PlacedSeat> {
        let seat = seats::by_id(&self.pool, seat_id).await?;
        let room = rooms::by_id(&self.pool, seat.room_id).await?;
        Ok(PlacedSeat { seat, room })
    }

    async fn seat_by_hash(&self, hash: &str) -> AppResult<Option<Seat>> {
        seats::by_hash(&self.pool, hash).await
    }

    async fn seats_of_importstep(&self, importstep_id: i64) -> AppResult<Vec<Seat>> {
        seats::of_importstep(&self.pool, importstep_id).await
    }

    async fn count_seats_of_importstep(&self, importstep_id: i64) -> AppResult<i64> {
        seats::count_of_importstep(&self.pool, importstep_id).await
    }

    async fn importsteps_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Importstep>> {
        importsteps::since(&self.pool, since).await
    }

    async fn insert_visit(
        &self,
        seat_id: i64,
        visit: &NewVisit,
        submission_dt: DateTime<Utc>,
    ) -> AppResult<Visit> {
        visits::insert(&self.pool, seat_id, visit, submission_dt).await
    }

    async fn visit(&self, id: i64) -> AppResult<Visit> {
        visits::by_id(&self.pool, id).await
    }

    async fn visits_in_room_between(
        &self,
        room_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Visit>> {
        visits::in_room_between(&self.pool, room_id, from, to).await
    }

    async fn visits_in_room_at(&self, room_id: i64, at: DateTime<Utc>) -> AppResult<Vec<Visit>> {
        visits::in_room_at(&self.pool, room_id, at).await
    }

    async fn search_visits(&self, filter: &VisitSearch) -> AppResult<Vec<Visit>> {
        visits::search(&self.pool, filter).await
    }

    async fn usage_statistics(&self) -> AppResult<Vec<UsageStatistic>> {
        rooms::usage_statistics(&self.pool).await
    }
}

/// Open Postgres transaction; rolled back when dropped uncommitted
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_room(&mut self, key: &RoomKey) -> AppResult<()> {
        rooms::lock(&mut *self.tx, key).await
    }

    async fn insert_importstep(&mut self, user: &str, when: DateTime<Utc>) -> AppResult<Importstep> {
        importsteps::insert(&mut *self.tx, user, when).await
    }

    async fn finish_importstep(
        &mut self,
        importstep_id: i64,
        counts: &ImportCounts,
    ) -> AppResult<Importstep> {
        importsteps::finish(&mut *self.tx, importstep_id, counts).await
    }

    async fn room_by_key(&mut self, key: &RoomKey) -> AppResult<Option<Room>> {
        rooms::by_key(&mut *self.tx, key).await
    }

    async fn insert_room(&mut self, room: &NewRoom) -> AppResult<Room> {
        rooms::insert(&mut *self.tx, room).await
    }

    async fn update_room_layout(
        &mut self,
        room_id: i64,
        layout: &RoomLayout,
        importstep_id: i64,
    ) -> AppResult<Room> {
        rooms::update_layout(&mut *self.tx, room_id, layout, importstep_id).await
    }

    async fn seat_by_hash(&mut self, hash: &str) -> AppResult<Option<Seat>> {
        seats::by_hash(&mut *self.tx, hash).await
    }

    async fn seat_at(
        &mut self,
        room_id: i64,
        rownumber: i32,
        seatnumber: i32,
    ) -> AppResult<Option<Seat>> {
        seats::at(&mut *self.tx, room_id, rownumber, seatnumber).await
    }

    async fn insert_seat(&mut self, seat: &NewSeat) -> AppResult<Seat> {
        seats::insert(&mut *self.tx, seat).await
    }

    async fn rehash_seat(&mut self, seat_id: i64, hash: &str) -> AppResult<Seat> {
        seats::rehash(&mut *self.tx, seat_id, hash).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
