//! Room model and spreadsheet row types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::seat::Seat;
use crate::error::{AppError, AppResult};

/// Organization name of the room holding the dummy seat
pub const DUMMY_ORGANIZATION: &str = "---";

/// Room from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub organization: String,
    pub department: String,
    pub building: String,
    pub room: String,
    /// Distance between two rows in meters
    pub row_dist: f64,
    /// Distance between two neighboring seats of one row in meters
    pub seat_dist: f64,
    /// Name of the last seat, e.g. `r7s12`; spans the seat grid
    pub seat_last: String,
    /// Importstep whose layout this room currently reflects
    pub importstep_id: i64,
    /// Importstep that first created this room
    pub created_importstep_id: i64,
}

impl Room {
    pub fn key(&self) -> RoomKey {
        RoomKey {
            organization: self.organization.clone(),
            department: self.department.clone(),
            building: self.building.clone(),
            room: self.room.clone(),
        }
    }

    /// `organization;department;building;room`
    pub fn descriptor(&self) -> String {
        self.key().descriptor()
    }

    pub fn layout(&self) -> RoomLayout {
        RoomLayout {
            row_dist: self.row_dist,
            seat_dist: self.seat_dist,
            seat_last: self.seat_last.clone(),
        }
    }
}

/// Natural key of a room
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomKey {
    pub organization: String,
    pub department: String,
    pub building: String,
    pub room: String,
}

impl RoomKey {
    pub fn descriptor(&self) -> String {
        format!(
            "{};{};{};{}",
            self.organization, self.department, self.building, self.room
        )
    }

    /// Key of the room that holds the dummy seat
    pub fn dummy() -> Self {
        Self {
            organization: DUMMY_ORGANIZATION.to_string(),
            department: "---".to_string(),
            building: "---".to_string(),
            room: "---".to_string(),
        }
    }
}

/// Mutable part of a room, replaced by every import touching it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLayout {
    pub row_dist: f64,
    pub seat_dist: f64,
    pub seat_last: String,
}

impl RoomLayout {
    /// Number of rows and seats per row spanned by `seat_last`
    pub fn extent(&self) -> AppResult<(i32, i32)> {
        Seat::split_seatname(&self.seat_last)
            .map_err(|_| AppError::ImportFormat(format!("bad seat_last '{}'", self.seat_last)))
    }
}

/// One row of a room spreadsheet, cells as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub organization: String,
    pub department: String,
    pub building: String,
    pub room: String,
    pub row_dist: String,
    pub seat_dist: String,
    pub seat_last: String,
}

impl SheetRow {
    /// Validate the row; `lineno` is only used for error messages.
    pub fn parse(&self, lineno: usize) -> AppResult<(RoomKey, RoomLayout)> {
        let key = RoomKey {
            organization: self.organization.trim().to_string(),
            department: self.department.trim().to_string(),
            building: self.building.trim().to_string(),
            room: self.room.trim().to_string(),
        };
        for (column, value) in [
            ("organization", &key.organization),
            ("department", &key.department),
            ("building", &key.building),
            ("room", &key.room),
        ] {
            if value.is_empty() {
                return Err(AppError::ImportFormat(format!(
                    "row {}: column '{}' is empty",
                    lineno, column
                )));
            }
        }
        let layout = RoomLayout {
            row_dist: parse_dist(&self.row_dist, "row_dist", lineno)?,
            seat_dist: parse_dist(&self.seat_dist, "seat_dist", lineno)?,
            seat_last: self.seat_last.trim().to_string(),
        };
        layout
            .extent()
            .map_err(|e| AppError::ImportFormat(format!("row {}: {}", lineno, inner_message(e))))?;
        Ok((key, layout))
    }
}

fn parse_dist(text: &str, column: &str, lineno: usize) -> AppResult<f64> {
    let value: f64 = text.trim().parse().map_err(|_| {
        AppError::ImportFormat(format!(
            "row {}: {} '{}' is not a number",
            lineno, column, text
        ))
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::ImportFormat(format!(
            "row {}: {} must be a positive number of meters, not '{}'",
            lineno, column, text
        )));
    }
    Ok(value)
}

fn inner_message(e: AppError) -> String {
    match e {
        AppError::ImportFormat(msg) => msg,
        other => other.to_string(),
    }
}

/// Rooms, seats and visits per organization and department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UsageStatistic {
    pub organization: String,
    pub department: String,
    pub rooms: i64,
    pub seats: i64,
    pub visits: i64,
}
