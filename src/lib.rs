//! Anwesende seat attendance core
//!
//! Imports room and seat layouts from spreadsheets, registers visits at
//! seats, and answers the contact tracing questions: who overlapped with a
//! given visit, and who was in a room at a given instant.

use std::sync::Arc;

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use clock::Clock;
use models::DummySeat;
use repository::Repository;

/// Application state shared by all callers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub dummy_seat: Arc<DummySeat>,
}

impl AppState {
    /// Build the services and make sure the dummy seat exists
    pub async fn init(
        config: AppConfig,
        repository: Repository,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let services = services::Services::new(repository, clock, &config);
        let dummy_seat = services.imports.ensure_dummy_seat().await?;
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
            dummy_seat: Arc::new(dummy_seat),
        })
    }
}
