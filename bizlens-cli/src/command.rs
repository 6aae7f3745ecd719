//! Subcommand parsing and dispatch.

use crate::error::CliError;
use bizlens_client::services::{DateRange, Granularity, TableDataQuery};
use bizlens_client::{AdminService, AnalyticsService, DatabaseService, RequestOrchestrator};
use serde::Serialize;
use serde_json::Value;

pub const USAGE: &str = "\
Usage: bizlens [--config <path>] <command> [args]

Commands:
  health                         Probe the server liveness endpoint
  status                         Database connection check
  stats                          Database headline stats
  tables                         List tables
  schema <table>                 Column metadata for a table
  data <table> [page] [limit]    One page of table rows
  indexes <table>                Indexes on a table
  foreign-keys <table>           Foreign keys on a table
  data-model                     Table relationships
  query <sql>                    Run ad-hoc SQL
  recent                         Recently executed queries
  performance                    CPU, memory, IO and connection metrics
  realtime                       Live monitoring counters
  weekly                         Query activity for the last week
  kpis [start end]               Dashboard KPIs, optionally for a date range
  insights                       Business insights and trends
  series <metric> [day|week|month] [days]
  migrations                     Migration status
  migrate                        Apply pending migrations
  custom-tables                  Custom tables registered on the server
  orchestrator                   Local queue, breaker and cache state";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Health,
    Status,
    Stats,
    Tables,
    Schema(String),
    Data { table: String, query: TableDataQuery },
    Indexes(String),
    ForeignKeys(String),
    DataModel,
    Query(String),
    Recent,
    Performance,
    Realtime,
    Weekly,
    Kpis(Option<DateRange>),
    Insights,
    Series {
        metric: String,
        granularity: Granularity,
        days: u32,
    },
    Migrations,
    Migrate,
    CustomTables,
    Orchestrator,
}

impl Command {
    /// Parse process arguments (without the program name). `--config <path>`
    /// is skipped wherever it appears.
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut positional = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "--config" {
                iter.next();
            } else {
                positional.push(arg.as_str());
            }
        }

        let (name, rest) = positional
            .split_first()
            .ok_or_else(|| usage("missing command"))?;

        let command = match *name {
            "health" => Self::Health,
            "status" => Self::Status,
            "stats" => Self::Stats,
            "tables" => Self::Tables,
            "schema" => Self::Schema(required(rest, 0, "table")?),
            "data" => Self::Data {
                table: required(rest, 0, "table")?,
                query: TableDataQuery {
                    page: optional_number(rest, 1, "page")?,
                    limit: optional_number(rest, 2, "limit")?,
                    ..TableDataQuery::default()
                },
            },
            "indexes" => Self::Indexes(required(rest, 0, "table")?),
            "foreign-keys" => Self::ForeignKeys(required(rest, 0, "table")?),
            "data-model" => Self::DataModel,
            "query" => {
                if rest.is_empty() {
                    return Err(usage("missing argument: sql"));
                }
                Self::Query(rest.join(" "))
            }
            "recent" => Self::Recent,
            "performance" => Self::Performance,
            "realtime" => Self::Realtime,
            "weekly" => Self::Weekly,
            "kpis" => match rest {
                [] => Self::Kpis(None),
                [start, end] => Self::Kpis(Some(DateRange {
                    start: start.to_string(),
                    end: end.to_string(),
                })),
                _ => return Err(usage("kpis takes either no arguments or <start> <end>")),
            },
            "insights" => Self::Insights,
            "series" => Self::Series {
                metric: required(rest, 0, "metric")?,
                granularity: match rest.get(1) {
                    None => Granularity::Day,
                    Some(g) => parse_granularity(g)?,
                },
                days: optional_number(rest, 2, "days")?.unwrap_or(30),
            },
            "migrations" => Self::Migrations,
            "migrate" => Self::Migrate,
            "custom-tables" => Self::CustomTables,
            "orchestrator" => Self::Orchestrator,
            other => return Err(usage(&format!("unknown command: {}", other))),
        };
        Ok(command)
    }

    /// Execute against `api` and return the JSON to print.
    pub async fn run(&self, api: &RequestOrchestrator) -> Result<Value, CliError> {
        let db = DatabaseService::new(api.clone());
        let analytics = AnalyticsService::new(api.clone());
        let admin = AdminService::new(api.clone());

        match self {
            Self::Health => to_json(&serde_json::json!({ "healthy": api.health().await })),
            Self::Status => to_json(&serde_json::json!({ "isConnected": db.test_connection().await })),
            Self::Stats => to_json(&db.stats().await),
            Self::Tables => to_json(&db.tables().await),
            Self::Schema(table) => to_json(&db.table_schema(table).await?),
            Self::Data { table, query } => to_json(&db.table_data(table, query).await?),
            Self::Indexes(table) => Ok(db.table_indexes(table).await?),
            Self::ForeignKeys(table) => Ok(db.table_foreign_keys(table).await?),
            Self::DataModel => Ok(db.data_model().await?),
            Self::Query(sql) => to_json(&db.execute_query(sql).await?),
            Self::Recent => to_json(&db.recent_queries().await),
            Self::Performance => to_json(&db.performance().await?),
            Self::Realtime => to_json(&db.realtime_stats().await?),
            Self::Weekly => to_json(&db.weekly_activity().await?),
            Self::Kpis(range) => to_json(&analytics.dashboard_kpis(range.as_ref()).await?),
            Self::Insights => to_json(&analytics.business_insights().await),
            Self::Series {
                metric,
                granularity,
                days,
            } => to_json(&analytics.time_series(metric, *granularity, *days).await),
            Self::Migrations => to_json(&admin.migration_status().await?),
            Self::Migrate => to_json(&admin.run_migrations().await?),
            Self::CustomTables => to_json(&admin.custom_tables().await),
            Self::Orchestrator => to_json(&serde_json::json!({
                "stats": api.stats(),
                "cache": api.cache_info(),
            })),
        }
    }
}

fn usage(message: &str) -> CliError {
    CliError::Usage(format!("{}\n\n{}", message, USAGE))
}

fn required(rest: &[&str], index: usize, name: &str) -> Result<String, CliError> {
    rest.get(index)
        .map(|s| s.to_string())
        .ok_or_else(|| usage(&format!("missing argument: {}", name)))
}

fn optional_number<T: std::str::FromStr>(
    rest: &[&str],
    index: usize,
    name: &str,
) -> Result<Option<T>, CliError> {
    match rest.get(index) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| usage(&format!("{} must be a number, got {:?}", name, raw))),
    }
}

fn parse_granularity(raw: &str) -> Result<Granularity, CliError> {
    match raw.to_ascii_lowercase().as_str() {
        "day" => Ok(Granularity::Day),
        "week" => Ok(Granularity::Week),
        "month" => Ok(Granularity::Month),
        _ => Err(usage(&format!("unknown granularity: {}", raw))),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}
