use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration;
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub dashboard: Option<DashboardConfig>,
    pub load: Option<LoadConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    pub listen_host: Option<String>,
    pub port: Option<u16>,
    pub region: Option<String>,
    pub cloudwatch_endpoint: Option<String>,
    pub namespace: Option<String>,
    pub metric_name: Option<String>,
    pub stat: Option<String>,
    pub unit: Option<String>,
    pub period: Option<u64>,
    pub window: Option<DurationValue>,
    pub dimensions: Option<Vec<String>>,
    pub refresh_interval: Option<DurationValue>,
    pub axis_points: Option<usize>,
    pub axis_step: Option<DurationValue>,
    pub reanchor_axis: Option<bool>,
    pub title: Option<String>,
    pub request_timeout: Option<DurationValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    pub host: Option<String>,
    pub users: Option<usize>,
    pub spawn_rate: Option<u64>,
    pub run_time: Option<DurationValue>,
    pub raffle_id: Option<String>,
    pub token: Option<String>,
    pub signer_program: Option<String>,
    pub signer_args: Option<Vec<String>>,
    pub wait_min: Option<DurationValue>,
    pub wait_max: Option<DurationValue>,
    pub weights: Option<WeightsConfig>,
    pub request_timeout: Option<DurationValue>,
    pub export_json: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightsConfig {
    pub purchase: Option<u32>,
    pub status: Option<u32>,
    pub cancel: Option<u32>,
}

/// A duration given either as whole seconds or as text (`"15m"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration(text),
        }
    }
}
