//! Visit model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::enums::Status3G;

/// Visit from database; never changed after insertion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct Visit {
    pub id: i64,
    pub givenname: String,
    pub familyname: String,
    pub street_and_number: String,
    pub zipcode: String,
    pub town: String,
    pub phone: String,
    pub email: String,
    pub status_3g: Status3G,
    pub submission_dt: DateTime<Utc>,
    pub present_from_dt: DateTime<Utc>,
    pub present_to_dt: DateTime<Utc>,
    pub seat_id: i64,
}

impl Visit {
    /// Length of the time both visits were present; zero if they do not overlap.
    pub fn shared_time(&self, other: &Visit) -> Duration {
        let from = self.present_from_dt.max(other.present_from_dt);
        let to = self.present_to_dt.min(other.present_to_dt);
        (to - from).max(Duration::zero())
    }

    /// Strict overlap (touching intervals do not overlap) lasting at least `min_overlap`.
    pub fn overlaps(&self, other: &Visit, min_overlap: Duration) -> bool {
        other.present_to_dt > self.present_from_dt
            && other.present_from_dt < self.present_to_dt
            && self.shared_time(other) >= min_overlap
    }

    /// Present during `[from, to)`
    pub fn is_present_at(&self, at: DateTime<Utc>) -> bool {
        self.present_from_dt <= at && at < self.present_to_dt
    }

    pub fn visitor(&self) -> Visitor {
        Visitor {
            email: self.email.clone(),
            givenname: self.givenname.clone(),
            familyname: self.familyname.clone(),
            phone: self.phone.clone(),
            seat_id: self.seat_id,
        }
    }
}

/// Visit submission as entered by a visitor
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewVisit {
    #[validate(length(min = 1, max = 80, message = "Given name is required"))]
    pub givenname: String,
    #[validate(length(min = 1, max = 80, message = "Family name is required"))]
    pub familyname: String,
    #[validate(length(min = 3, max = 80, message = "Street and number are required"))]
    pub street_and_number: String,
    #[validate(length(min = 4, max = 10, message = "Invalid zip code"))]
    pub zipcode: String,
    #[validate(length(min = 1, max = 80, message = "Town is required"))]
    pub town: String,
    #[validate(length(min = 6, max = 80, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub status_3g: Status3G,
    pub present_from_dt: DateTime<Utc>,
    pub present_to_dt: DateTime<Utc>,
}

/// A distinct person present in a room
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Visitor {
    /// Identity of the person
    pub email: String,
    pub givenname: String,
    pub familyname: String,
    pub phone: String,
    /// Seat of the person's most recent visit row
    pub seat_id: i64,
}

/// Search filter; text fields are case-insensitive LIKE patterns (`%`, `_`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitSearch {
    pub organization: String,
    pub department: String,
    pub building: String,
    pub room: String,
    pub givenname: String,
    pub familyname: String,
    pub phone: String,
    pub email: String,
    /// Visits that left after this instant...
    pub from_dt: DateTime<Utc>,
    /// ...and came before this one
    pub to_dt: DateTime<Utc>,
}

impl VisitSearch {
    /// Match every visit present during `(from_dt, to_dt)`
    pub fn window(from_dt: DateTime<Utc>, to_dt: DateTime<Utc>) -> Self {
        Self {
            organization: "%".into(),
            department: "%".into(),
            building: "%".into(),
            room: "%".into(),
            givenname: "%".into(),
            familyname: "%".into(),
            phone: "%".into(),
            email: "%".into(),
            from_dt,
            to_dt,
        }
    }
}

/// Search results cut to a display limit
#[derive(Debug, Clone, Serialize)]
pub struct VisitSearchResult<T> {
    pub items: Vec<T>,
    /// Number of results before truncation
    pub num_results: usize,
    pub limit: usize,
}

impl<T> VisitSearchResult<T> {
    pub fn truncated(mut items: Vec<T>, limit: usize) -> Self {
        let num_results = items.len();
        items.truncate(limit);
        Self {
            items,
            num_results,
            limit,
        }
    }

    pub fn too_many_results(&self) -> bool {
        self.num_results > self.limit
    }
}

/// A visit overlapping a search hit, with its seat's distance to the hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactVisit {
    /// Id of the visit this one is a contact of
    pub target_id: i64,
    pub visit: Visit,
    pub room_descriptor: String,
    pub seatname: String,
    pub distance_m: f64,
}
