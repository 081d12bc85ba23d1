//! Importstep model: one spreadsheet import and its counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Importstep from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Importstep {
    pub id: i64,
    pub when: DateTime<Utc>,
    /// Name of the importing user
    pub user: String,
    pub num_existing_rooms: i32,
    pub num_existing_seats: i32,
    pub num_new_rooms: i32,
    pub num_new_seats: i32,
}

impl Importstep {
    pub fn counts(&self) -> ImportCounts {
        ImportCounts {
            num_existing_rooms: self.num_existing_rooms,
            num_existing_seats: self.num_existing_seats,
            num_new_rooms: self.num_new_rooms,
            num_new_seats: self.num_new_seats,
        }
    }
}

/// Running totals of one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    pub num_existing_rooms: i32,
    pub num_existing_seats: i32,
    pub num_new_rooms: i32,
    pub num_new_seats: i32,
}

impl ImportCounts {
    /// Seats this import created or confirmed
    pub fn num_seats(&self) -> i64 {
        i64::from(self.num_new_seats) + i64::from(self.num_existing_seats)
    }
}

/// Importstep with statistics derived from the current rooms and seats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportstepWithStats {
    #[serde(flatten)]
    pub step: Importstep,
    /// Seats whose room currently reflects this importstep
    pub num_qrcodes: i64,
    /// Seats of this importstep whose room a later importstep has taken over
    pub num_qrcodes_moved: i64,
}

impl ImportstepWithStats {
    pub fn new(step: Importstep, num_qrcodes: i64) -> Self {
        let num_qrcodes_moved = (step.counts().num_seats() - num_qrcodes).max(0);
        Self {
            step,
            num_qrcodes,
            num_qrcodes_moved,
        }
    }
}
