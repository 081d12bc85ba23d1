//! Room spreadsheet import
//!
//! Every sheet row names one room and spans its seat grid with the name of
//! the last seat. Rooms are matched by organization, department, building
//! and room name; seats by their hash, which only depends on the room's
//! identity and the seat's position, so re-importing a room keeps the QR
//! codes already printed for it valid.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    clock::Clock,
    config::ImportConfig,
    error::{AppError, AppResult},
    models::{DummySeat, ImportCounts, Importstep, PlacedSeat, RoomKey, RoomLayout, Seat, SheetRow},
    repository::{NewRoom, NewSeat, Repository, StoreTx},
};

/// Sheet row number of the first data row (row 1 holds the column titles)
const FIRST_DATA_ROW: usize = 2;

/// User recorded for the importstep that creates the dummy seat
const BOOTSTRAP_USER: &str = "system";

#[derive(Clone)]
pub struct ImportService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    config: ImportConfig,
}

impl ImportService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, config: ImportConfig) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    /// Import a room sheet as one transaction and return its importstep.
    ///
    /// Any bad row aborts the whole import; no importstep is stored then.
    pub async fn import(&self, rows: &[SheetRow], user: &str) -> AppResult<Importstep> {
        let parsed = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let lineno = i + FIRST_DATA_ROW;
                let parsed = row.parse(lineno)?;
                self.check_size(lineno, &parsed.1)?;
                Ok(parsed)
            })
            .collect::<AppResult<Vec<_>>>()?;

        let mut tx = self.repository.begin().await?;
        for key in lock_order(&parsed) {
            tx.lock_room(key).await?;
        }
        let step = tx.insert_importstep(user, self.clock.now()).await?;
        let mut counts = ImportCounts::default();
        let mut counted = HashSet::new();
        for (key, layout) in &parsed {
            self.reconcile_room(tx.as_mut(), step.id, key, layout, &mut counts, &mut counted)
                .await?;
        }
        let step = tx.finish_importstep(step.id, &counts).await?;
        tx.commit().await?;

        info!(
            importstep = step.id,
            user,
            new_rooms = counts.num_new_rooms,
            existing_rooms = counts.num_existing_rooms,
            new_seats = counts.num_new_seats,
            existing_seats = counts.num_existing_seats,
            "Room import completed"
        );
        Ok(step)
    }

    fn check_size(&self, lineno: usize, layout: &RoomLayout) -> AppResult<()> {
        let (rows, seats) = layout.extent()?;
        let total = i64::from(rows) * i64::from(seats);
        if total > i64::from(self.config.max_seats_per_room) {
            return Err(AppError::ImportFormat(format!(
                "row {}: seat_last '{}' spans {} seats, more than {}",
                lineno, layout.seat_last, total, self.config.max_seats_per_room
            )));
        }
        Ok(())
    }

    async fn reconcile_room(
        &self,
        tx: &mut dyn StoreTx,
        importstep_id: i64,
        key: &RoomKey,
        layout: &RoomLayout,
        counts: &mut ImportCounts,
        counted: &mut HashSet<i64>,
    ) -> AppResult<()> {
        let room = match tx.room_by_key(key).await? {
            Some(existing) => {
                counts.num_existing_rooms += 1;
                tx.update_room_layout(existing.id, layout, importstep_id)
                    .await?
            }
            None => {
                counts.num_new_rooms += 1;
                tx.insert_room(&NewRoom {
                    key: key.clone(),
                    layout: layout.clone(),
                    importstep_id,
                })
                .await?
            }
        };
        debug!(room = %key.descriptor(), seat_last = %layout.seat_last, "Reconciling room");

        let (rows, seats) = layout.extent()?;
        for rownumber in 1..=rows {
            for seatnumber in 1..=seats {
                let seatname = Seat::form_seatname(rownumber, seatnumber);
                let hash = Seat::seathash(key, &seatname, self.config.hash_length);
                match tx.seat_by_hash(&hash).await? {
                    Some(seat)
                        if seat.room_id == room.id
                            && seat.rownumber == rownumber
                            && seat.seatnumber == seatnumber =>
                    {
                        // a room named twice in one sheet counts each seat once
                        if counted.insert(seat.id) {
                            counts.num_existing_seats += 1;
                        }
                    }
                    Some(other) => {
                        return Err(AppError::Conflict(format!(
                            "hash {} of {} {} is already used by seat {}",
                            hash,
                            key.descriptor(),
                            seatname,
                            other.id
                        )));
                    }
                    None => match tx.seat_at(room.id, rownumber, seatnumber).await? {
                        Some(stale) => {
                            debug!(seat = stale.id, old = %stale.hash, new = %hash, "Seat hash changed");
                            tx.rehash_seat(stale.id, &hash).await?;
                            if counted.insert(stale.id) {
                                counts.num_existing_seats += 1;
                            }
                        }
                        None => {
                            let seat = tx
                                .insert_seat(&NewSeat {
                                    hash,
                                    rownumber,
                                    seatnumber,
                                    room_id: room.id,
                                })
                                .await?;
                            counted.insert(seat.id);
                            counts.num_new_seats += 1;
                        }
                    },
                }
            }
        }
        Ok(())
    }

    /// Look up the dummy seat, creating it on first use.
    ///
    /// Meant to run once at startup; the returned handle is passed to whoever
    /// needs the dummy seat.
    pub async fn ensure_dummy_seat(&self) -> AppResult<DummySeat> {
        let key = RoomKey::dummy();
        let mut tx = self.repository.begin().await?;
        tx.lock_room(&key).await?;
        if let Some(room) = tx.room_by_key(&key).await? {
            if let Some(seat) = tx.seat_at(room.id, 1, 1).await? {
                return Ok(DummySeat::new(PlacedSeat { seat, room }));
            }
        }

        let layout = RoomLayout {
            row_dist: 1.0,
            seat_dist: 1.0,
            seat_last: Seat::form_seatname(1, 1),
        };
        let step = tx.insert_importstep(BOOTSTRAP_USER, self.clock.now()).await?;
        let mut counts = ImportCounts::default();
        self.reconcile_room(tx.as_mut(), step.id, &key, &layout, &mut counts, &mut HashSet::new())
            .await?;
        tx.finish_importstep(step.id, &counts).await?;
        let room = tx
            .room_by_key(&key)
            .await?
            .ok_or_else(|| AppError::Internal("dummy room vanished".to_string()))?;
        let seat = tx
            .seat_at(room.id, 1, 1)
            .await?
            .ok_or_else(|| AppError::Internal("dummy seat vanished".to_string()))?;
        tx.commit().await?;

        info!(hash = %seat.hash, "Created dummy seat");
        Ok(DummySeat::new(PlacedSeat { seat, room }))
    }

    /// Seats whose QR codes belong to the importstep, for printing
    pub async fn seats_of_importstep(&self, importstep_id: i64) -> AppResult<Vec<Seat>> {
        self.repository.seats_of_importstep(importstep_id).await
    }
}

/// Distinct rooms of a sheet in a fixed global order, so concurrent imports
/// take their room locks in the same order.
fn lock_order(parsed: &[(RoomKey, RoomLayout)]) -> Vec<&RoomKey> {
    parsed
        .iter()
        .map(|(key, _)| key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
