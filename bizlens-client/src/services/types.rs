//! Payload types returned by the dashboard API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// DATABASE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub is_connected: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Headline database numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_tables: u64,
    pub total_records: u64,
    pub database_size: String,
    pub active_connections: u64,
    pub new_tables: u64,
    pub new_records: u64,
    pub size_growth: String,
    pub max_connections: u64,
}

impl Default for DatabaseStats {
    fn default() -> Self {
        Self {
            total_tables: 0,
            total_records: 0,
            database_size: "0 MB".to_string(),
            active_connections: 0,
            new_tables: 0,
            new_records: 0,
            size_growth: "0 MB".to_string(),
            max_connections: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub id: u64,
    pub name: String,
    pub records: String,
    pub last_update: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryActivity {
    pub id: u64,
    pub query: String,
    pub duration: String,
    pub time: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "dataTypeID")]
    pub data_type_id: u32,
}

/// Result of an ad-hoc SQL query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<Value>,
    pub row_count: u64,
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldInfo>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDataPage {
    pub rows: Vec<Value>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Paging, search and sort for a table data request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDataQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl TableDataQuery {
    /// URL query string without the leading `?`; empty when nothing is set.
    ///
    /// Zero page or limit values and empty strings are omitted.
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(page) = self.page.filter(|p| *p > 0) {
            params.push(format!("page={}", page));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params.push(format!("limit={}", limit));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            params.push(format!("sort={}", urlencoding::encode(sort)));
        }
        if let Some(order) = self.order {
            params.push(format!("order={}", order.as_str()));
        }
        params.join("&")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub current: f64,
    pub average: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub current: f64,
    pub average: f64,
    pub available: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoMetrics {
    pub current: f64,
    pub read: String,
    pub write: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub active: u64,
    pub max: u64,
    pub idle: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub io: IoMetrics,
    pub connections: ConnectionMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeStats {
    pub active_connections: u64,
    pub queries_per_minute: f64,
    pub avg_response_time: f64,
    pub cache_hit_rate: f64,
    pub cache_size: String,
    pub transactions_per_second: f64,
    pub locks_count: u64,
    pub deadlocks: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayActivity {
    pub day: String,
    pub queries: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub error_queries: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyActivity {
    pub weekly_activity: Vec<DayActivity>,
    pub summary: ActivitySummary,
}

// ============================================================================
// ANALYTICS
// ============================================================================

/// Inclusive date range, ISO dates as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// KPI sections keyed by name (`orders`, `revenue`, `aov`, ...).
///
/// Section contents vary with the server's KPI set, so they stay untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardKpis {
    #[serde(flatten)]
    pub sections: HashMap<String, Value>,
}

impl DashboardKpis {
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub evidence: String,
    pub business_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantitative_effect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub metric: String,
    pub direction: String,
    pub change_percent: f64,
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightAnalysis {
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub trends: Vec<Trend>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub rows: Vec<Value>,
}

// ============================================================================
// ADMIN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationEntry {
    pub name: String,
    pub file: String,
    pub executed: bool,
    #[serde(default)]
    pub executed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    #[serde(default)]
    pub migrations: Vec<MigrationEntry>,
    pub total: u64,
    pub executed: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRun {
    pub executed: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessTable {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub record_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
