//! Service layer wrappers against a scripted transport.

use bizlens_client::services::{
    DatabaseStats, DateRange, Granularity, SortOrder, TableDataQuery,
};
use bizlens_client::{
    AdminService, AnalyticsService, DatabaseService, Method, RequestError, RequestOrchestrator,
};
use bizlens_test_utils::fixtures;
use bizlens_test_utils::{MockResponse, MockTransport};
use serde_json::json;
use std::sync::Arc;

fn setup() -> (Arc<MockTransport>, RequestOrchestrator) {
    let mock = Arc::new(MockTransport::new());
    let api = RequestOrchestrator::new(mock.clone(), fixtures::no_retry_config()).unwrap();
    (mock, api)
}

// ============================================================================
// DATABASE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_tables_falls_back_to_empty() {
    let (mock, api) = setup();
    mock.respond_err("/database/tables", fixtures::server_error());

    let db = DatabaseService::new(api);
    assert!(db.tables().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stats_falls_back_to_zeroed_default() {
    let (_mock, api) = setup();

    let stats = DatabaseService::new(api).stats().await;
    assert_eq!(stats, DatabaseStats::default());
    assert_eq!(stats.max_connections, 100);
    assert_eq!(stats.database_size, "0 MB");
}

#[tokio::test(start_paused = true)]
async fn test_stats_and_tables_decode_and_cache() {
    let (mock, api) = setup();
    mock.respond_ok("/database/stats", fixtures::database_stats_payload())
        .respond_ok("/database/tables", fixtures::table_list_payload());
    let db = DatabaseService::new(api.clone());

    let stats = db.stats().await;
    assert_eq!(stats.total_tables, 14);
    let tables = db.tables().await;
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1].schema.as_deref(), Some("public"));

    // Served from cache; the one-shot responses are already consumed.
    assert_eq!(db.stats().await.total_tables, 14);
    assert_eq!(db.tables().await.len(), 2);
    assert_eq!(mock.call_count(), 2);
    assert_eq!(api.cache_info().entries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_connection_reads_flag_or_false() {
    let (mock, api) = setup();
    mock.respond_ok("/database/status", json!({"isConnected": true, "database": "bizlens"}));
    let db = DatabaseService::new(api.clone());
    assert!(db.test_connection().await);

    api.clear_cache();
    assert!(!db.test_connection().await);
}

#[tokio::test(start_paused = true)]
async fn test_execute_query_posts_sql_and_propagates_errors() {
    let (mock, api) = setup();
    mock.respond_ok("/database/query", fixtures::query_result_payload())
        .respond_err("/database/query", fixtures::api_error("Ошибка выполнения запроса"));
    let db = DatabaseService::new(api);

    let result = db.execute_query("SELECT count(*) FROM orders").await.unwrap();
    assert_eq!(result.row_count, 1);

    let err = db.execute_query("SELEC").await.unwrap_err();
    assert!(matches!(err, RequestError::Api { .. }));

    let calls = mock.calls();
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(
        calls[0].body.as_deref(),
        Some(r#"{"query":"SELECT count(*) FROM orders"}"#)
    );
}

#[tokio::test(start_paused = true)]
async fn test_table_endpoints_encode_names_and_params() {
    let (mock, api) = setup();
    mock.respond_ok(
        "/database/tables/order%20items/schema",
        json!({"tableName": "order items", "columns": [{"column_name": "id"}]}),
    )
    .respond_ok(
        "/database/tables/orders/data?page=2&limit=10&search=acme%20co&order=DESC",
        json!({
            "rows": [{"id": 11}],
            "pagination": {"page": 2, "limit": 10, "total": 11, "pages": 2, "hasNext": false, "hasPrev": true}
        }),
    );
    let db = DatabaseService::new(api);

    let schema = db.table_schema("order items").await.unwrap();
    assert_eq!(schema.table_name, "order items");
    assert_eq!(schema.columns.len(), 1);

    let query = TableDataQuery {
        page: Some(2),
        limit: Some(10),
        search: Some("acme co".to_string()),
        order: Some(SortOrder::Desc),
        ..TableDataQuery::default()
    };
    let page = db.table_data("orders", &query).await.unwrap();
    assert!(page.pagination.has_prev);
    assert_eq!(page.rows.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_propagating_wrappers_surface_errors() {
    let (_mock, api) = setup();
    let db = DatabaseService::new(api);

    assert!(db.performance().await.is_err());
    assert!(db.realtime_stats().await.is_err());
    assert!(db.weekly_activity().await.is_err());
    assert!(db.data_model().await.is_err());
    assert!(db.table_indexes("orders").await.is_err());
    assert!(db.table_foreign_keys("orders").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_recent_queries_falls_back_to_empty() {
    let (_mock, api) = setup();
    assert!(DatabaseService::new(api).recent_queries().await.is_empty());
}

// ============================================================================
// ANALYTICS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_dashboard_kpis_posts_date_range() {
    let (mock, api) = setup();
    mock.respond_ok(
        "/advanced-analytics/dashboard-kpis",
        json!({"orders": {"total_orders": 120}, "revenue": {"gross_revenue": 5400.0}}),
    );
    let analytics = AnalyticsService::new(api);
    let range = DateRange {
        start: "2024-03-01".to_string(),
        end: "2024-03-31".to_string(),
    };

    let kpis = analytics.dashboard_kpis(Some(&range)).await.unwrap();
    assert_eq!(kpis.section("orders"), Some(&json!({"total_orders": 120})));
    assert_eq!(
        mock.calls()[0].body.as_deref(),
        Some(r#"{"dateRange":{"start":"2024-03-01","end":"2024-03-31"}}"#)
    );
}

#[tokio::test(start_paused = true)]
async fn test_dashboard_kpis_propagates_errors() {
    let (_mock, api) = setup();
    assert!(AnalyticsService::new(api).dashboard_kpis(None).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_insights_and_time_series_fall_back() {
    let (_mock, api) = setup();
    let analytics = AnalyticsService::new(api);

    let insights = analytics.business_insights().await;
    assert!(insights.insights.is_empty() && insights.trends.is_empty());

    let series = analytics.time_series("revenue", Granularity::Day, 30).await;
    assert!(series.rows.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_time_series_wraps_rows() {
    let (mock, api) = setup();
    mock.respond_ok(
        "/advanced-analytics/time-series",
        json!([{"period": "2024-03-01", "value": 10}, {"period": "2024-03-02", "value": 12}]),
    );
    let series = AnalyticsService::new(api)
        .time_series("orders", Granularity::Week, 14)
        .await;
    assert_eq!(series.rows.len(), 2);
}

// ============================================================================
// ADMIN
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_run_migrations_clears_cache() {
    let (mock, api) = setup();
    mock.respond_always(
        "/database/tables",
        MockResponse::Data(fixtures::table_list_payload()),
    )
    .respond_ok("/migrations/run", json!({"executed": 2, "total": 9}));

    DatabaseService::new(api.clone()).tables().await;
    assert_eq!(api.cache_info().entries, 1);

    let run = AdminService::new(api.clone()).run_migrations().await.unwrap();
    assert_eq!(run.executed, 2);
    assert_eq!(api.cache_info().entries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_migration_status_and_custom_tables() {
    let (mock, api) = setup();
    mock.respond_ok(
        "/migrations/status",
        json!({
            "migrations": [{"name": "001_init", "file": "001_init.sql", "executed": true, "executedAt": "2024-03-01T10:00:00Z"}],
            "total": 1,
            "executed": 1,
            "pending": 0
        }),
    );
    let admin = AdminService::new(api);

    let status = admin.migration_status().await.unwrap();
    assert_eq!(status.pending, 0);
    assert_eq!(status.migrations[0].name, "001_init");

    assert!(admin.custom_tables().await.is_empty());
}
