//! Visit registration and search

use std::sync::Arc;

use tracing::warn;
use validator::Validate;

use crate::{
    clock::Clock,
    config::ReportingConfig,
    error::{AppError, AppResult},
    models::{DummySeat, NewVisit, Visit, VisitSearch, VisitSearchResult},
    repository::Repository,
};

#[derive(Clone)]
pub struct VisitService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    visit_limit: usize,
}

impl VisitService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, reporting: ReportingConfig) -> Self {
        Self {
            repository,
            clock,
            visit_limit: reporting.visit_limit,
        }
    }

    /// Register a visit at the seat whose QR code carries `hash`
    pub async fn submit_visit(&self, hash: &str, form: &NewVisit) -> AppResult<Visit> {
        Self::check(form)?;
        let seat = self.repository.seat_by_hash(hash).await?.ok_or_else(|| {
            warn!(hash, "Visit submitted for unknown seat");
            AppError::NotFound(format!("No seat with hash {}", hash))
        })?;
        self.repository
            .insert_visit(seat.id, form, self.clock.now())
            .await
    }

    /// Register a visit that has no real seat
    pub async fn submit_walk_in(&self, dummy: &DummySeat, form: &NewVisit) -> AppResult<Visit> {
        Self::check(form)?;
        self.repository
            .insert_visit(dummy.seat().id, form, self.clock.now())
            .await
    }

    pub async fn search_visits(&self, filter: &VisitSearch) -> AppResult<VisitSearchResult<Visit>> {
        let visits = self.repository.search_visits(filter).await?;
        Ok(VisitSearchResult::truncated(visits, self.visit_limit))
    }

    fn check(form: &NewVisit) -> AppResult<()> {
        form.validate()?;
        if form.present_from_dt >= form.present_to_dt {
            return Err(AppError::PreconditionViolation(format!(
                "present from {} is not before present to {}",
                form.present_from_dt, form.present_to_dt
            )));
        }
        Ok(())
    }
}
