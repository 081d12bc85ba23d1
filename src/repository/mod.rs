//! Repository layer: named queries over rooms, seats, visits and importsteps
//!
//! [`Store`] answers the read queries and appends visits. Imports go through a
//! [`StoreTx`] obtained from [`Store::begin`]; nothing written through it is
//! visible to anybody else until [`StoreTx::commit`], and dropping it without
//! committing discards every change.

pub mod importsteps;
pub mod memory;
pub mod postgres;
pub mod rooms;
pub mod seats;
pub mod visits;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        ImportCounts, Importstep, NewVisit, PlacedSeat, Room, RoomKey, RoomLayout, Seat,
        UsageStatistic, Visit, VisitSearch,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle to the storage backend
pub type Repository = Arc<dyn Store>;

/// Room to be inserted
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub key: RoomKey,
    pub layout: RoomLayout,
    pub importstep_id: i64,
}

/// Seat to be inserted
#[derive(Debug, Clone)]
pub struct NewSeat {
    pub hash: String,
    pub rownumber: i32,
    pub seatnumber: i32,
    pub room_id: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction for an import
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;

    async fn placed_seat(&self, seat_id: i64) -> AppResult<PlacedSeat>;

    async fn seat_by_hash(&self, hash: &str) -> AppResult<Option<Seat>>;

    /// Seats whose room currently reflects the importstep, by room and position
    async fn seats_of_importstep(&self, importstep_id: i64) -> AppResult<Vec<Seat>>;

    async fn count_seats_of_importstep(&self, importstep_id: i64) -> AppResult<i64>;

    /// Importsteps created at or after `since`, oldest first
    async fn importsteps_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Importstep>>;

    async fn insert_visit(
        &self,
        seat_id: i64,
        visit: &NewVisit,
        submission_dt: DateTime<Utc>,
    ) -> AppResult<Visit>;

    async fn visit(&self, id: i64) -> AppResult<Visit>;

    /// Visits in the room with `present_to > from` and `present_from < to`
    async fn visits_in_room_between(
        &self,
        room_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Visit>>;

    /// Visits in the room with `present_from <= at < present_to`
    async fn visits_in_room_at(&self, room_id: i64, at: DateTime<Utc>) -> AppResult<Vec<Visit>>;

    /// Visits matching the filter, by `present_from_dt`
    async fn search_visits(&self, filter: &VisitSearch) -> AppResult<Vec<Visit>>;

    /// Rooms, seats and visits per organization and department, the dummy room excluded
    async fn usage_statistics(&self) -> AppResult<Vec<UsageStatistic>>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Serialize against concurrent imports touching the same room
    async fn lock_room(&mut self, key: &RoomKey) -> AppResult<()>;

    async fn insert_importstep(&mut self, user: &str, when: DateTime<Utc>) -> AppResult<Importstep>;

    async fn finish_importstep(
        &mut self,
        importstep_id: i64,
        counts: &ImportCounts,
    ) -> AppResult<Importstep>;

    async fn room_by_key(&mut self, key: &RoomKey) -> AppResult<Option<Room>>;

    async fn insert_room(&mut self, room: &NewRoom) -> AppResult<Room>;

    /// Replace the layout and point the room at `importstep_id`
    async fn update_room_layout(
        &mut self,
        room_id: i64,
        layout: &RoomLayout,
        importstep_id: i64,
    ) -> AppResult<Room>;

    async fn seat_by_hash(&mut self, hash: &str) -> AppResult<Option<Seat>>;

    async fn seat_at(
        &mut self,
        room_id: i64,
        rownumber: i32,
        seatnumber: i32,
    ) -> AppResult<Option<Seat>>;

    async fn insert_seat(&mut self, seat: &NewSeat) -> AppResult<Seat>;

    async fn rehash_seat(&mut self, seat_id: i64, hash: &str) -> AppResult<Seat>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
