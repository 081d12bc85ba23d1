//! Data models for Anwesende

pub mod enums;
pub mod importstep;
pub mod room;
pub mod seat;
pub mod visit;

// Re-export commonly used types
pub use enums::Status3G;
pub use importstep::{ImportCounts, Importstep, ImportstepWithStats};
pub use room::{Room, RoomKey, RoomLayout, SheetRow, UsageStatistic};
pub use seat::{DummySeat, PlacedSeat, Seat};
pub use visit::{ContactVisit, NewVisit, Visit, VisitSearch, VisitSearchResult, Visitor};
