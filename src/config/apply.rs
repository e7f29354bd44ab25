use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{DashboardArgs, Dimension, LoadArgs, PositiveU64, PositiveUsize, parse_dimension};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{DashboardConfig, DurationValue, LoadConfig};

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn to_duration(value: &DurationValue, field: &'static str) -> AppResult<Duration> {
    value
        .to_duration()
        .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
}

fn ensure_positive_u64(value: u64, field: &'static str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive { field, source: err })
    })
}

fn ensure_positive_usize(value: usize, field: &'static str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive { field, source: err })
    })
}

fn parse_dimensions(entries: &[String]) -> AppResult<Vec<Dimension>> {
    let mut parsed = Vec::with_capacity(entries.len());
    for entry in entries {
        parsed.push(
            parse_dimension(entry)
                .map_err(|err| AppError::config(ConfigError::InvalidDimension { source: err }))?,
        );
    }
    Ok(parsed)
}

/// Applies the `[dashboard]` config section to arguments not set on the command line.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_dashboard_config(
    args: &mut DashboardArgs,
    matches: &ArgMatches,
    config: &DashboardConfig,
) -> AppResult<()> {
    if !is_cli(matches, "listen_host")
        && let Some(host) = config.listen_host.clone()
    {
        args.listen_host = host;
    }
    if !is_cli(matches, "port")
        && let Some(port) = config.port
    {
        args.port = port;
    }
    if !is_cli(matches, "region")
        && let Some(region) = config.region.clone()
    {
        args.region = region;
    }
    if !is_cli(matches, "cloudwatch_endpoint")
        && let Some(endpoint) = config.cloudwatch_endpoint.clone()
    {
        args.cloudwatch_endpoint = Some(endpoint);
    }
    if !is_cli(matches, "namespace")
        && let Some(namespace) = config.namespace.clone()
    {
        args.namespace = namespace;
    }
    if !is_cli(matches, "metric_name")
        && let Some(metric_name) = config.metric_name.clone()
    {
        args.metric_name = metric_name;
    }
    if !is_cli(matches, "stat")
        && let Some(stat) = config.stat.clone()
    {
        args.stat = stat;
    }
    if !is_cli(matches, "unit")
        && let Some(unit) = config.unit.clone()
    {
        args.unit = unit;
    }
    if !is_cli(matches, "period")
        && let Some(period) = config.period
    {
        args.period = ensure_positive_u64(period, "dashboard.period")?;
    }
    if !is_cli(matches, "window")
        && let Some(window) = config.window.as_ref()
    {
        args.window = to_duration(window, "dashboard.window")?;
    }
    if !is_cli(matches, "dimensions")
        && let Some(dimensions) = config.dimensions.as_ref()
    {
        args.dimensions = parse_dimensions(dimensions)?;
    }
    if !is_cli(matches, "refresh_interval")
        && let Some(interval) = config.refresh_interval.as_ref()
    {
        args.refresh_interval = to_duration(interval, "dashboard.refresh_interval")?;
    }
    if !is_cli(matches, "axis_points")
        && let Some(points) = config.axis_points
    {
        args.axis_points = ensure_positive_usize(points, "dashboard.axis_points")?;
    }
    if !is_cli(matches, "axis_step")
        && let Some(step) = config.axis_step.as_ref()
    {
        args.axis_step = to_duration(step, "dashboard.axis_step")?;
    }
    if !is_cli(matches, "reanchor_axis")
        && let Some(reanchor) = config.reanchor_axis
    {
        args.reanchor_axis = reanchor;
    }
    if !is_cli(matches, "title")
        && let Some(title) = config.title.clone()
    {
        args.title = title;
    }
    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.request_timeout.as_ref()
    {
        args.request_timeout = to_duration(timeout, "dashboard.request_timeout")?;
    }
    Ok(())
}

/// Applies the `[load]` config section to arguments not set on the command line.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_load_config(
    args: &mut LoadArgs,
    matches: &ArgMatches,
    config: &LoadConfig,
) -> AppResult<()> {
    if !is_cli(matches, "host")
        && let Some(host) = config.host.clone()
    {
        args.host = Some(host);
    }
    if !is_cli(matches, "users")
        && let Some(users) = config.users
    {
        args.users = ensure_positive_usize(users, "load.users")?;
    }
    if !is_cli(matches, "spawn_rate")
        && let Some(rate) = config.spawn_rate
    {
        args.spawn_rate = ensure_positive_u64(rate, "load.spawn_rate")?;
    }
    if !is_cli(matches, "run_time")
        && let Some(run_time) = config.run_time.as_ref()
    {
        args.run_time = Some(to_duration(run_time, "load.run_time")?);
    }
    if !is_cli(matches, "raffle_id")
        && let Some(raffle_id) = config.raffle_id.clone()
    {
        args.raffle_id = raffle_id;
    }
    if !is_cli(matches, "token")
        && matches.value_source("token") != Some(ValueSource::EnvVariable)
        && let Some(token) = config.token.clone()
    {
        args.token = token;
    }
    if !is_cli(matches, "signer_program")
        && let Some(program) = config.signer_program.clone()
    {
        args.signer_program = program;
    }
    if !is_cli(matches, "signer_args")
        && let Some(signer_args) = config.signer_args.clone()
    {
        args.signer_args = signer_args;
    }
    if !is_cli(matches, "wait_min")
        && let Some(wait_min) = config.wait_min.as_ref()
    {
        args.wait_min = to_duration(wait_min, "load.wait_min")?;
    }
    if !is_cli(matches, "wait_max")
        && let Some(wait_max) = config.wait_max.as_ref()
    {
        args.wait_max = to_duration(wait_max, "load.wait_max")?;
    }
    if let Some(weights) = config.weights.as_ref() {
        if !is_cli(matches, "weight_purchase")
            && let Some(weight) = weights.purchase
        {
            args.weight_purchase = weight;
        }
        if !is_cli(matches, "weight_status")
            && let Some(weight) = weights.status
        {
            args.weight_status = weight;
        }
        if !is_cli(matches, "weight_cancel")
            && let Some(weight) = weights.cancel
        {
            args.weight_cancel = weight;
        }
    }
    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.request_timeout.as_ref()
    {
        args.request_timeout = to_duration(timeout, "load.request_timeout")?;
    }
    if !is_cli(matches, "export_json")
        && let Some(path) = config.export_json.clone()
    {
        args.export_json = Some(path);
    }
    Ok(())
}
