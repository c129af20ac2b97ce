//! Incremental coverage-extending cache for daily analytics metrics
//!
//! Aggregates daily-granularity metrics (views, likes, subscribers, ...)
//! from credentialed third-party analytics providers and serves them to
//! dashboards without re-querying the provider on every read. For each
//! `(owner, channel, metric)` series the cache tracks which contiguous date
//! range is already stored, asks the provider only for the days needed to
//! keep a rolling trailing window covered, and returns a calendar-complete
//! (gap-filled) daily series on every read.

pub mod config;
pub mod credentials;
pub mod densify;
pub mod error;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod response;
pub mod shape;
pub mod store;

mod client;

pub use client::*;
pub use error::Error;
pub use model::Metric;
pub use model::SeriesData;
pub use response::CoverageAction;
pub use response::Resolved;
