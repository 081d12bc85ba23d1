//! In-memory store, for tests and for embedding without a database
//!
//! A transaction holds the store's lock for its whole lifetime and works on a
//! copy of the tables, so concurrent imports run one after the other and an
//! uncommitted import leaves no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{NewRoom, NewSeat, Store, StoreTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        room::DUMMY_ORGANIZATION, ImportCounts, Importstep, NewVisit, PlacedSeat, Room, RoomKey,
        RoomLayout, Seat, UsageStatistic, Visit, VisitSearch,
    },
};

#[derive(Debug, Clone, Default)]
struct Tables {
    last_id: i64,
    importsteps: BTreeMap<i64, Importstep>,
    rooms: BTreeMap<i64, Room>,
    seats: BTreeMap<i64, Seat>,
    visits: BTreeMap<i64, Visit>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn room(&self, id: i64) -> AppResult<&Room> {
        self.rooms
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", id)))
    }

    fn seat(&self, id: i64) -> AppResult<&Seat> {
        self.seats
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Seat with id {} not found", id)))
    }

    fn room_by_key(&self, key: &RoomKey) -> Option<&Room> {
        self.rooms.values().find(|r| r.key() == *key)
    }

    fn seat_by_hash(&self, hash: &str) -> Option<&Seat> {
        self.seats.values().find(|s| s.hash == hash)
    }

    fn seat_at(&self, room_id: i64, rownumber: i32, seatnumber: i32) -> Option<&Seat> {
        self.seats.values().find(|s| {
            s.room_id == room_id && s.rownumber == rownumber && s.seatnumber == seatnumber
        })
    }

    fn seats_of_importstep(&self, importstep_id: i64) -> Vec<Seat> {
        let mut seats: Vec<(RoomKey, Seat)> = self
            .seats
            .values()
            .filter_map(|s| {
                let room = self.rooms.get(&s.room_id)?;
                (room.importstep_id == importstep_id).then(|| (room.key(), s.clone()))
            })
            .collect();
        seats.sort_by(|(ka, a), (kb, b)| {
            (ka, a.rownumber, a.seatnumber).cmp(&(kb, b.rownumber, b.seatnumber))
        });
        seats.into_iter().map(|(_, s)| s).collect()
    }

    fn visits_in_room<F>(&self, room_id: i64, keep: F) -> Vec<Visit>
    where
        F: Fn(&Visit) -> bool,
    {
        let mut visits: Vec<Visit> = self
            .visits
            .values()
            .filter(|v| self.seats.get(&v.seat_id).map(|s| s.room_id) == Some(room_id))
            .filter(|v| keep(v))
            .cloned()
            .collect();
        visits.sort_by_key(|v| (v.present_from_dt, v.id));
        visits
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    async fn placed_seat(&self, seat_id: i64) -> AppResult<PlacedSeat> {
        let tables = self.tables.lock().await;
        let seat = tables.seat(seat_id)?.clone();
        let room = tables.room(seat.room_id)?.clone();
        Ok(PlacedSeat { seat, room })
    }

    async fn seat_by_hash(&self, hash: &str) -> AppResult<Option<Seat>> {
        Ok(self.tables.lock().await.seat_by_hash(hash).cloned())
    }

    async fn seats_of_importstep(&self, importstep_id: i64) -> AppResult<Vec<Seat>> {
        Ok(self.tables.lock().await.seats_of_importstep(importstep_id))
    }

    async fn count_seats_of_importstep(&self, importstep_id: i64) -> AppResult<i64> {
        let count = self.tables.lock().await.seats_of_importstep(importstep_id).len();
        Ok(count as i64)
    }

    async fn importsteps_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Importstep>> {
        let tables = self.tables.lock().await;
        let mut steps: Vec<Importstep> = tables
            .importsteps
            .values()
            .filter(|s| s.when >= since)
            .cloned()
            .collect();
        steps.sort_by_key(|s| (s.when, s.id));
        Ok(steps)
    }

    async fn insert_visit(
        &self,
        seat_id: i64,
        visit: &NewVisit,
        submission_dt: DateTime<Utc>,
    ) -> AppResult<Visit> {
        let mut tables = self.tables.lock().await;
        tables.seat(seat_id)?;
        let id = tables.next_id();
        let row = Visit {
            id,
            givenname: visit.givenname.clone(),
            familyname: visit.familyname.clone(),
            street_and_number: visit.street_and_number.clone(),
            zipcode: visit.zipcode.clone(),
            town: visit.town.clone(),
            phone: visit.phone.clone(),
            email: visit.email.clone(),
            status_3g: visit.status_3g,
            submission_dt,
            present_from_dt: visit.present_from_dt,
            present_to_dt: visit.present_to_dt,
            seat_id,
        };
        tables.visits.insert(id, row.clone());
        Ok(row)
    }

    async fn visit(&self, id: i64) -> AppResult<Visit> {
        self.tables
            .lock()
            .await
            .visits
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Visit with id {} not found", id)))
    }

    async fn visits_in_room_between(
        &self,
        room_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Visit>> {
        let tables = self.tables.lock().await;
        Ok(tables.visits_in_room(room_id, |v| v.present_to_dt > from && v.present_from_dt < to))
    }

    async fn visits_in_room_at(&self, room_id: i64, at: DateTime<Utc>) -> AppResult<Vec<Visit>> {
        let tables = self.tables.lock().await;
        Ok(tables.visits_in_room(room_id, |v| v.is_present_at(at)))
    }

    async fn search_visits(&self, f: &VisitSearch) -> AppResult<Vec<Visit>> {
        let room_patterns = [
            LikePattern::new(&f.organization)?,
            LikePattern::new(&f.department)?,
            LikePattern::new(&f.building)?,
            LikePattern::new(&f.room)?,
        ];
        let visit_patterns = [
            LikePattern::new(&f.givenname)?,
            LikePattern::new(&f.familyname)?,
            LikePattern::new(&f.phone)?,
            LikePattern::new(&f.email)?,
        ];
        let tables = self.tables.lock().await;
        let mut visits = Vec::new();
        for v in tables.visits.values() {
            if !(v.present_to_dt > f.from_dt && v.present_from_dt < f.to_dt) {
                continue;
            }
            let room = tables.room(tables.seat(v.seat_id)?.room_id)?;
            let room_fields = [&room.organization, &room.department, &room.building, &room.room];
            let visit_fields = [&v.givenname, &v.familyname, &v.phone, &v.email];
            let matches = room_patterns.iter().zip(room_fields).all(|(p, s)| p.matches(s))
                && visit_patterns.iter().zip(visit_fields).all(|(p, s)| p.matches(s));
            if matches {
                visits.push(v.clone());
            }
        }
        visits.sort_by_key(|v| (v.present_from_dt, v.id));
        Ok(visits)
    }

    async fn usage_statistics(&self) -> AppResult<Vec<UsageStatistic>> {
        let tables = self.tables.lock().await;
        let mut groups: BTreeMap<(String, String), (BTreeSet<i64>, i64, i64)> = BTreeMap::new();
        for seat in tables.seats.values() {
            let room = tables.room(seat.room_id)?;
            if room.organization == DUMMY_ORGANIZATION {
                continue;
            }
            let visits = tables.visits.values().filter(|v| v.seat_id == seat.id).count() as i64;
            let entry = groups
                .entry((room.organization.clone(), room.department.clone()))
                .or_default();
            entry.0.insert(room.id);
            entry.1 += 1;
            entry.2 += visits;
        }
        Ok(groups
            .into_iter()
            .map(|((organization, department), (rooms, seats, visits))| UsageStatistic {
                organization,
                department,
                rooms: rooms.len() as i64,
                seats,
                visits,
            })
            .collect())
    }
}

/// Working copy of the tables, written back on commit
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_room(&mut self, _key: &RoomKey) -> AppResult<()> {
        // the transaction already holds the whole store
        Ok(())
    }

    async fn insert_importstep(&mut self, user: &str, when: DateTime<Utc>) -> AppResult<Importstep> {
        let id = self.work.next_id();
        let step = Importstep {
            id,
            when,
            user: user.to_string(),
            num_existing_rooms: 0,
            num_existing_seats: 0,
            num_new_rooms: 0,
            num_new_seats: 0,
        };
        self.work.importsteps.insert(id, step.clone());
        Ok(step)
    }

    async fn finish_importstep(
        &mut self,
        importstep_id: i64,
        counts: &ImportCounts,
    ) -> AppResult<Importstep> {
        let step = self.work.importsteps.get_mut(&importstep_id).ok_or_else(|| {
            AppError::NotFound(format!("Importstep with id {} not found", importstep_id))
        })?;
        step.num_existing_rooms = counts.num_existing_rooms;
        step.num_existing_seats = counts.num_existing_seats;
        step.num_new_rooms = counts.num_new_rooms;
        step.num_new_seats = counts.num_new_seats;
        Ok(step.clone())
    }

    async fn room_by_key(&mut self, key: &RoomKey) -> AppResult<Option<Room>> {
        Ok(self.work.room_by_key(key).cloned())
    }

    async fn insert_room(&mut self, room: &NewRoom) -> AppResult<Room> {
        if self.work.room_by_key(&room.key).is_some() {
            return Err(AppError::Conflict(format!(
                "Room {} already exists",
                room.key.descriptor()
            )));
        }
        let id = self.work.next_id();
        let row = Room {
            id,
            organization: room.key.organization.clone(),
            department: room.key.department.clone(),
            building: room.key.building.clone(),
            room: room.key.room.clone(),
            row_dist: room.layout.row_dist,
            seat_dist: room.layout.seat_dist,
            seat_last: room.layout.seat_last.clone(),
            importstep_id: room.importstep_id,
            created_importstep_id: room.importstep_id,
        };
        self.work.rooms.insert(id, row.clone());
        Ok(row)
    }

    async fn update_room_layout(
        &mut self,
        room_id: i64,
        layout: &RoomLayout,
        importstep_id: i64,
    ) -> AppResult<Room> {
        let room = self
            .work
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", room_id)))?;
        room.row_dist = layout.row_dist;
        room.seat_dist = layout.seat_dist;
        room.seat_last = layout.seat_last.clone();
        room.importstep_id = importstep_id;
        Ok(room.clone())
    }

    async fn seat_by_hash(&mut self, hash: &str) -> AppResult<Option<Seat>> {
        Ok(self.work.seat_by_hash(hash).cloned())
    }

    async fn seat_at(
        &mut self,
        room_id: i64,
        rownumber: i32,
        seatnumber: i32,
    ) -> AppResult<Option<Seat>> {
        Ok(self.work.seat_at(room_id, rownumber, seatnumber).cloned())
    }

    async fn insert_seat(&mut self, seat: &NewSeat) -> AppResult<Seat> {
        self.work.room(seat.room_id)?;
        if self.work.seat_by_hash(&seat.hash).is_some()
            || self
                .work
                .seat_at(seat.room_id, seat.rownumber, seat.seatnumber)
                .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Seat {} r{}s{} already exists",
                seat.hash, seat.rownumber, seat.seatnumber
            )));
        }
        let id = self.work.next_id();
        let row = Seat {
            id,
            hash: seat.hash.clone(),
            rownumber: seat.rownumber,
            seatnumber: seat.seatnumber,
            room_id: seat.room_id,
        };
        self.work.seats.insert(id, row.clone());
        Ok(row)
    }

    async fn rehash_seat(&mut self, seat_id: i64, hash: &str) -> AppResult<Seat> {
        if self.work.seat_by_hash(hash).is_some_and(|s| s.id != seat_id) {
            return Err(AppError::Conflict(format!("Seat hash {} already in use", hash)));
        }
        let seat = self
            .work
            .seats
            .get_mut(&seat_id)
            .ok_or_else(|| AppError::NotFound(format!("Seat with id {} not found", seat_id)))?;
        seat.hash = hash.to_string();
        Ok(seat.clone())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

/// Case-insensitive SQL LIKE pattern: `%` any run, `_` one character, `\` escapes
struct LikePattern(Regex);

impl LikePattern {
    fn new(pattern: &str) -> AppResult<Self> {
        let mut re = String::from("(?is)^");
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '%' => re.push_str(".*"),
                '_' => re.push('.'),
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        re.push_str(&regex::escape(&escaped.to_string()));
                    }
                }
                other => re.push_str(&regex::escape(&other.to_string())),
            }
        }
        re.push('$');
        Regex::new(&re)
            .map(LikePattern)
            .map_err(|e| AppError::Validation(format!("bad search pattern '{}': {}", pattern, e)))
    }

    fn matches(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}
