//! Metrics aggregation and cache-aside layer for the CareerLab dashboard.
//!
//! Raw per-user records (CV evaluations, interview-simulation sessions,
//! job-application tracking events, user profiles) come from an external
//! system of record through a [`source::RecordSource`]. The aggregation
//! modules turn them into small, display-ready values; the
//! [`facade::DashboardMetrics`] front door serves each metric cache-aside
//! from a [`cache::MetricCache`].

pub mod cache;
pub mod db;
pub mod distribution;
pub mod facade;
pub mod frequency;
pub mod impact;
pub mod models;
pub mod ranking;
pub mod report;
pub mod source;
pub mod trend;
pub mod validate;

pub use cache::{cache_key, MetricCache, MetricKind, MetricValue};
pub use db::PgRecordSource;
pub use facade::DashboardMetrics;
pub use source::{CsvRecordSource, RecordSource};
