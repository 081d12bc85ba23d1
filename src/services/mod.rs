//! Business logic services

pub mod contacts;
pub mod imports;
pub mod stats;
pub mod visits;

use std::sync::Arc;

use crate::{clock::Clock, config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub imports: imports::ImportService,
    pub visits: visits::VisitService,
    pub contacts: contacts::ContactService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository and clock
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self {
            imports: imports::ImportService::new(
                repository.clone(),
                clock.clone(),
                config.import.clone(),
            ),
            visits: visits::VisitService::new(
                repository.clone(),
                clock.clone(),
                config.reporting.clone(),
            ),
            contacts: contacts::ContactService::new(
                repository.clone(),
                clock.clone(),
                config.contacts.clone(),
                config.reporting.clone(),
            ),
            stats: stats::StatsService::new(repository, clock, config.reporting.clone()),
        }
    }
}
