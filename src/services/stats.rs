//! Statistics service: import history and usage per department

use std::sync::Arc;

use chrono::Duration;

use crate::{
    clock::Clock,
    config::ReportingConfig,
    error::AppResult,
    models::{ImportstepWithStats, UsageStatistic},
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    config: ReportingConfig,
}

impl StatsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, config: ReportingConfig) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    /// Importsteps of the last `lookback`, oldest first.
    ///
    /// `num_qrcodes` and `num_qrcodes_moved` are computed from the rooms as
    /// they are now, so a later import touching a room changes the numbers of
    /// the importstep that created it.
    pub async fn displayable_importsteps(
        &self,
        lookback: Duration,
    ) -> AppResult<Vec<ImportstepWithStats>> {
        let since = self.clock.now() - lookback;
        let steps = self.repository.importsteps_since(since).await?;
        let mut result = Vec::with_capacity(steps.len());
        for step in steps {
            let num_qrcodes = self.repository.count_seats_of_importstep(step.id).await?;
            result.push(ImportstepWithStats::new(step, num_qrcodes));
        }
        Ok(result)
    }

    /// Importsteps within the configured default lookback
    pub async fn recent_importsteps(&self) -> AppResult<Vec<ImportstepWithStats>> {
        self.displayable_importsteps(Duration::hours(self.config.importstep_lookback_hours))
            .await
    }

    pub async fn usage_statistics(&self) -> AppResult<Vec<UsageStatistic>> {
        self.repository.usage_statistics().await
    }
}
