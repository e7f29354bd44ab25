use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::args::{DashboardArgs, Dimension};
use crate::error::{AppError, AppResult, MetricsError};

use super::series::{MetricPoint, MetricSeries};

const DEFAULT_QUERY_ID: &str = "m1";

/// The single metric the dashboard charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub id: String,
    pub namespace: String,
    pub metric_name: String,
    pub stat: String,
    pub unit: String,
    pub period_secs: u64,
    pub dimensions: Vec<Dimension>,
    pub window: Duration,
}

/// Closed time range `[start, end]` of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MetricQuery {
    /// ECS CPU utilization, averaged over 5 minute buckets for the last 15 minutes.
    #[must_use]
    pub fn cpu_utilization() -> Self {
        Self {
            id: DEFAULT_QUERY_ID.to_owned(),
            namespace: "AWS/ECS".to_owned(),
            metric_name: "CPUUtilization".to_owned(),
            stat: "Average".to_owned(),
            unit: "Percent".to_owned(),
            period_secs: 300,
            dimensions: Vec::new(),
            window: Duration::from_secs(15 * 60),
        }
    }

    #[must_use]
    pub fn from_args(args: &DashboardArgs) -> Self {
        Self {
            id: DEFAULT_QUERY_ID.to_owned(),
            namespace: args.namespace.clone(),
            metric_name: args.metric_name.clone(),
            stat: args.stat.clone(),
            unit: args.unit.clone(),
            period_secs: args.period.get(),
            dimensions: args.dimensions.clone(),
            window: args.window,
        }
    }

    #[must_use]
    pub fn window_at(&self, now: DateTime<Utc>) -> MetricWindow {
        let span = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::zero());
        let start = now.checked_sub_signed(span).unwrap_or(now);
        MetricWindow { start, end: now }
    }

    pub(super) fn request_body<'query>(
        &'query self,
        window: &MetricWindow,
        next_token: Option<&'query str>,
    ) -> GetMetricDataRequest<'query> {
        GetMetricDataRequest {
            metric_data_queries: vec![MetricDataQuery {
                id: &self.id,
                metric_stat: MetricStat {
                    metric: Metric {
                        namespace: &self.namespace,
                        metric_name: &self.metric_name,
                        dimensions: &self.dimensions,
                    },
                    period: self.period_secs,
                    stat: &self.stat,
                    unit: &self.unit,
                },
                return_data: true,
            }],
            start_time: window.start.timestamp(),
            end_time: window.end.timestamp(),
            scan_by: "TimestampAscending",
            next_token,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct GetMetricDataRequest<'query> {
    pub(super) metric_data_queries: Vec<MetricDataQuery<'query>>,
    pub(super) start_time: i64,
    pub(super) end_time: i64,
    pub(super) scan_by: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) next_token: Option<&'query str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct MetricDataQuery<'query> {
    pub(super) id: &'query str,
    pub(super) metric_stat: MetricStat<'query>,
    pub(super) return_data: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct MetricStat<'query> {
    pub(super) metric: Metric<'query>,
    pub(super) period: u64,
    pub(super) stat: &'query str,
    pub(super) unit: &'query str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct Metric<'query> {
    pub(super) namespace: &'query str,
    pub(super) metric_name: &'query str,
    #[serde(skip_serializing_if = "no_dimensions")]
    pub(super) dimensions: &'query [Dimension],
}

const fn no_dimensions(dimensions: &&[Dimension]) -> bool {
    dimensions.is_empty()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetMetricDataResponse {
    #[serde(default)]
    pub(crate) metric_data_results: Vec<MetricDataResult>,
    pub(crate) next_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct MetricDataResult {
    pub(crate) id: String,
    pub(crate) label: Option<String>,
    #[serde(default)]
    pub(crate) timestamps: Vec<f64>,
    #[serde(default)]
    pub(crate) values: Vec<f64>,
    pub(crate) status_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ServiceErrorBody {
    #[serde(rename = "__type")]
    pub(super) kind: Option<String>,
    #[serde(alias = "Message")]
    pub(super) message: Option<String>,
}

impl ServiceErrorBody {
    /// `com.amazonaws...#InvalidParameterValueException` becomes `InvalidParameterValueException`.
    pub(super) fn short_kind(&self) -> String {
        self.kind
            .as_deref()
            .map(|kind| kind.rsplit('#').next().unwrap_or(kind))
            .unwrap_or("UnknownError")
            .to_owned()
    }
}

pub(crate) fn decode_response(body: &[u8]) -> AppResult<GetMetricDataResponse> {
    serde_json::from_slice(body)
        .map_err(|err| AppError::metrics(MetricsError::Decode { source: err }))
}

/// Appends the points of the result matching `id` to `series`.
///
/// Returns `false` when the page carried no result for `id`.
pub(super) fn merge_page(
    series: &mut MetricSeries,
    page: GetMetricDataResponse,
    id: &str,
) -> AppResult<bool> {
    let Some(result) = page
        .metric_data_results
        .into_iter()
        .find(|result| result.id == id)
    else {
        return Ok(false);
    };
    if result.timestamps.len() != result.values.len() {
        return Err(AppError::metrics(MetricsError::MismatchedSeries {
            timestamps: result.timestamps.len(),
            values: result.values.len(),
        }));
    }
    if series.label.is_none() {
        series.label = result.label;
    }
    if let Some(status) = result.status_code.as_deref()
        && status != "Complete"
    {
        tracing::debug!("GetMetricData result '{}' status {}", id, status);
    }
    for (timestamp, value) in result.timestamps.into_iter().zip(result.values) {
        series.points.push(MetricPoint {
            timestamp: epoch_seconds(timestamp)?,
            value,
        });
    }
    Ok(true)
}

fn epoch_seconds(value: f64) -> AppResult<DateTime<Utc>> {
    if !value.is_finite() {
        return Err(AppError::metrics(MetricsError::InvalidTimestamp { value }));
    }
    let millis = (value * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::metrics(MetricsError::InvalidTimestamp { value }))
}
