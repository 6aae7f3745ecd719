//! Typed wrappers over [`RequestOrchestrator::call`](crate::RequestOrchestrator::call).
//!
//! Each wrapper picks its endpoint, method and cache TTL. Wrappers that
//! return a plain value substitute a fallback on failure and log the error;
//! the rest propagate it.

pub mod admin;
pub mod analytics;
pub mod database;
pub mod types;

pub use admin::AdminService;
pub use analytics::AnalyticsService;
pub use database::DatabaseService;
pub use types::*;
