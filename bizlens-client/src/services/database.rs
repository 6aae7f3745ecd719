//! Database endpoints under `/database`.

use super::types::{
    ConnectionStatus, DatabaseStats, PerformanceMetrics, QueryActivity, QueryResult,
    RealtimeStats, TableDataPage, TableDataQuery, TableInfo, TableSchema, WeeklyActivity,
};
use crate::orchestrator::RequestOrchestrator;
use bizlens_core::{RequestError, RequestOptions};
use serde_json::{json, Value};
use std::time::Duration;

const STATUS_TTL: Duration = Duration::from_secs(10);
const STATS_TTL: Duration = Duration::from_secs(30);
const TABLES_TTL: Duration = Duration::from_secs(60);
const SCHEMA_TTL: Duration = Duration::from_secs(300);
const TABLE_DATA_TTL: Duration = Duration::from_secs(15);
const RECENT_QUERIES_TTL: Duration = Duration::from_secs(10);
const PERFORMANCE_TTL: Duration = Duration::from_secs(10);
const REALTIME_TTL: Duration = Duration::from_secs(5);
const WEEKLY_TTL: Duration = Duration::from_secs(60);

/// Typed access to the database monitoring and query endpoints.
#[derive(Debug, Clone)]
pub struct DatabaseService {
    api: RequestOrchestrator,
}

impl DatabaseService {
    pub fn new(api: RequestOrchestrator) -> Self {
        Self { api }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        ttl: Duration,
    ) -> Result<T, RequestError> {
        self.api.call(endpoint, RequestOptions::get(), Some(ttl)).await
    }

    /// Whether the backend reports a live database connection.
    /// Any failure reads as disconnected.
    pub async fn test_connection(&self) -> bool {
        match self
            .get::<ConnectionStatus>("/database/status", STATUS_TTL)
            .await
        {
            Ok(status) => status.is_connected,
            Err(e) => {
                tracing::warn!(error = %e, "Database connection test failed");
                false
            }
        }
    }

    /// Headline stats, or zeroed stats if the backend is unreachable.
    pub async fn stats(&self) -> DatabaseStats {
        self.get("/database/stats", STATS_TTL)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get database stats, using fallback");
                DatabaseStats::default()
            })
    }

    /// Table list, or empty if the backend is unreachable.
    pub async fn tables(&self) -> Vec<TableInfo> {
        self.get("/database/tables", TABLES_TTL)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get tables, using fallback");
                Vec::new()
            })
    }

    pub async fn table_schema(&self, table: &str) -> Result<TableSchema, RequestError> {
        self.get(&table_path(table, "schema"), SCHEMA_TTL).await
    }

    pub async fn table_data(
        &self,
        table: &str,
        query: &TableDataQuery,
    ) -> Result<TableDataPage, RequestError> {
        let mut endpoint = table_path(table, "data");
        let query_string = query.to_query_string();
        if !query_string.is_empty() {
            endpoint.push('?');
            endpoint.push_str(&query_string);
        }
        self.get(&endpoint, TABLE_DATA_TTL).await
    }

    pub async fn table_indexes(&self, table: &str) -> Result<Value, RequestError> {
        self.get(&table_path(table, "indexes"), SCHEMA_TTL).await
    }

    pub async fn table_foreign_keys(&self, table: &str) -> Result<Value, RequestError> {
        self.get(&table_path(table, "foreign-keys"), SCHEMA_TTL)
            .await
    }

    /// Table relationships for the data-model view.
    pub async fn data_model(&self) -> Result<Value, RequestError> {
        self.get("/database/data-model", SCHEMA_TTL).await
    }

    /// Run ad-hoc SQL. Never cached.
    pub async fn execute_query(&self, sql: &str) -> Result<QueryResult, RequestError> {
        let options = RequestOptions::post()
            .json_body(&json!({ "query": sql }))
            .map_err(|e| RequestError::InvalidResponse {
                reason: format!("Failed to encode query: {}", e),
            })?;
        self.api.call("/database/query", options, None).await
    }

    pub async fn recent_queries(&self) -> Vec<QueryActivity> {
        self.get("/database/queries/recent", RECENT_QUERIES_TTL)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get recent queries, using fallback");
                Vec::new()
            })
    }

    pub async fn performance(&self) -> Result<PerformanceMetrics, RequestError> {
        self.get("/database/performance", PERFORMANCE_TTL).await
    }

    pub async fn realtime_stats(&self) -> Result<RealtimeStats, RequestError> {
        self.get("/database/monitoring/realtime", REALTIME_TTL)
            .await
    }

    pub async fn weekly_activity(&self) -> Result<WeeklyActivity, RequestError> {
        self.get("/database/analytics/weekly", WEEKLY_TTL).await
    }
}

fn table_path(table: &str, suffix: &str) -> String {
    format!("/database/tables/{}/{}", urlencoding::encode(table), suffix)
}
