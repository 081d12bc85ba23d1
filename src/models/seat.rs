//! Seat model, seat names, seat hashes and seat distances

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;

use super::room::{Room, RoomKey};
use crate::error::{AppError, AppResult};

static SEATNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^r(\d+)s(\d+)$").expect("valid seatname regex"));

/// Seat from database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct Seat {
    pub id: i64,
    /// Public identifier, part of the QR code URL
    pub hash: String,
    pub rownumber: i32,
    pub seatnumber: i32,
    pub room_id: i64,
}

impl Seat {
    pub fn seatname(&self) -> String {
        Self::form_seatname(self.rownumber, self.seatnumber)
    }

    pub fn form_seatname(row: i32, seat: i32) -> String {
        format!("r{}s{}", row, seat)
    }

    /// Inverse of [`Seat::form_seatname`]
    pub fn split_seatname(seatname: &str) -> AppResult<(i32, i32)> {
        let invalid = || AppError::Validation(format!("invalid seat name '{}'", seatname));
        let caps = SEATNAME_RE.captures(seatname).ok_or_else(invalid)?;
        let row: i32 = caps[1].parse().map_err(|_| invalid())?;
        let seat: i32 = caps[2].parse().map_err(|_| invalid())?;
        if row < 1 || seat < 1 {
            return Err(invalid());
        }
        Ok((row, seat))
    }

    /// Hash of room identity and seat name, truncated to `len` hex digits.
    pub fn seathash(room: &RoomKey, seatname: &str, len: usize) -> String {
        let digest = Sha256::digest(format!("{};{}", room.descriptor(), seatname).as_bytes());
        let mut hash = hex::encode(digest);
        hash.truncate(len.clamp(8, 64));
        hash
    }
}

/// A seat together with the room it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedSeat {
    pub seat: Seat,
    pub room: Room,
}

impl PlacedSeat {
    /// Euclidean distance in meters; both seats must be in the same room.
    pub fn distance_in_m(&self, other: &PlacedSeat) -> AppResult<f64> {
        if self.seat.room_id != other.seat.room_id || self.room.id != other.room.id {
            return Err(AppError::PreconditionViolation(format!(
                "distance between seats of different rooms ({} vs. {})",
                self.room.descriptor(),
                other.room.descriptor()
            )));
        }
        let rows = f64::from((self.seat.rownumber - other.seat.rownumber).abs());
        let seats = f64::from((self.seat.seatnumber - other.seat.seatnumber).abs());
        let r_dist = rows * self.room.row_dist;
        let s_dist = seats * self.room.seat_dist;
        Ok(r_dist.hypot(s_dist))
    }
}

/// Handle to the placeholder seat used for visits without a real seat.
///
/// Only obtainable from `ImportService::ensure_dummy_seat`.
#[derive(Debug, Clone, PartialEq)]
pub struct DummySeat(PlacedSeat);

impl DummySeat {
    pub(crate) fn new(placed: PlacedSeat) -> Self {
        Self(placed)
    }

    pub fn seat(&self) -> &Seat {
        &self.0.seat
    }

    pub fn room(&self) -> &Room {
        &self.0.room
    }

    pub fn placed(&self) -> &PlacedSeat {
        &self.0
    }
}
