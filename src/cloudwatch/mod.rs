//! CloudWatch `GetMetricData` client and the metric source seam used by the dashboard.
mod client;
mod query;
mod series;
mod signing;


use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;

pub use client::{CloudWatchClient, CloudWatchSettings};
pub use query::{MetricQuery, MetricWindow};
pub use series::{MetricPoint, MetricSeries};
pub use signing::AwsCredentials;

pub(crate) use query::decode_response;

/// Something that can produce a fresh metric series on demand.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch the full series for the window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend call fails or its response is malformed.
    async fn fetch(&self, now: DateTime<Utc>) -> AppResult<MetricSeries>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String;
}
