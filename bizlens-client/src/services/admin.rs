//! Migration and custom-table endpoints.

use super::types::{BusinessTable, MigrationRun, MigrationStatus};
use crate::orchestrator::RequestOrchestrator;
use bizlens_core::{RequestError, RequestOptions};
use std::time::Duration;

const MIGRATION_STATUS_TTL: Duration = Duration::from_secs(30);
const CUSTOM_TABLES_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AdminService {
    api: RequestOrchestrator,
}

impl AdminService {
    pub fn new(api: RequestOrchestrator) -> Self {
        Self { api }
    }

    pub async fn migration_status(&self) -> Result<MigrationStatus, RequestError> {
        self.api
            .call(
                "/migrations/status",
                RequestOptions::get(),
                Some(MIGRATION_STATUS_TTL),
            )
            .await
    }

    /// Apply pending migrations on the server.
    ///
    /// Clears the local response cache on success since cached schema and
    /// table listings may no longer match.
    pub async fn run_migrations(&self) -> Result<MigrationRun, RequestError> {
        let run: MigrationRun = self
            .api
            .call("/migrations/run", RequestOptions::post(), None)
            .await?;
        tracing::info!(executed = run.executed, total = run.total, "Migrations applied");
        self.api.clear_cache();
        Ok(run)
    }

    pub async fn custom_tables(&self) -> Vec<BusinessTable> {
        self.api
            .call("/custom-tables", RequestOptions::get(), Some(CUSTOM_TABLES_TTL))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get custom tables, using fallback");
                Vec::new()
            })
    }
}
