//! Analytics endpoints under `/advanced-analytics`.

use super::types::{DashboardKpis, DateRange, Granularity, InsightAnalysis, TimeSeries};
use crate::orchestrator::RequestOrchestrator;
use bizlens_core::{RequestError, RequestOptions};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const INSIGHTS_TTL: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KpiRequest<'a> {
    date_range: Option<&'a DateRange>,
}

#[derive(Serialize)]
struct TimeSeriesRequest<'a> {
    metric: &'a str,
    granularity: Granularity,
    days: u32,
}

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    api: RequestOrchestrator,
}

impl AnalyticsService {
    pub fn new(api: RequestOrchestrator) -> Self {
        Self { api }
    }

    /// KPI sections for the dashboard, optionally restricted to a date range.
    pub async fn dashboard_kpis(
        &self,
        date_range: Option<&DateRange>,
    ) -> Result<DashboardKpis, RequestError> {
        let options = post_json(&KpiRequest { date_range })?;
        self.api
            .call("/advanced-analytics/dashboard-kpis", options, None)
            .await
    }

    /// Generated insights and trends; empty when the backend fails.
    pub async fn business_insights(&self) -> InsightAnalysis {
        self.api
            .call(
                "/advanced-analytics/business-insights",
                RequestOptions::get(),
                Some(INSIGHTS_TTL),
            )
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get business insights, using fallback");
                InsightAnalysis::default()
            })
    }

    /// One metric bucketed by `granularity` over the last `days` days.
    pub async fn time_series(
        &self,
        metric: &str,
        granularity: Granularity,
        days: u32,
    ) -> TimeSeries {
        let request = TimeSeriesRequest {
            metric,
            granularity,
            days,
        };
        let result = match post_json(&request) {
            Ok(options) => {
                self.api
                    .call::<Vec<Value>>("/advanced-analytics/time-series", options, None)
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(rows) => TimeSeries { rows },
            Err(e) => {
                tracing::warn!(metric = %metric, error = %e, "Failed to get time series, using fallback");
                TimeSeries::default()
            }
        }
    }
}

fn post_json<T: Serialize>(body: &T) -> Result<RequestOptions, RequestError> {
    RequestOptions::post()
        .json_body(body)
        .map_err(|e| RequestError::InvalidResponse {
            reason: format!("Failed to encode request body: {}", e),
        })
}
