use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use super::defaults::{
    DEFAULT_BEARER_TOKEN, DEFAULT_CHART_TITLE, DEFAULT_DASHBOARD_PORT, DEFAULT_LISTEN_HOST,
    DEFAULT_METRIC_NAME, DEFAULT_NAMESPACE, DEFAULT_RAFFLE_ID, DEFAULT_REGION,
    DEFAULT_SIGNER_PROGRAM, DEFAULT_SIGNER_SCRIPT, DEFAULT_STAT, DEFAULT_UNIT,
};
use super::parsers::{
    parse_dimension_arg, parse_duration_arg, parse_positive_u64, parse_positive_usize,
};
use super::types::{Dimension, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Operational tooling for the raffle service: a live CloudWatch CPU dashboard and a load generator for the raffle API."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (TOML or JSON). Defaults to ./raffle-ops.toml or ./raffle-ops.json
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Enable debug logging (overridden by RAFFLE_OPS_LOG or RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true, env = "NO_COLOR")]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the live CPU utilization dashboard
    Dashboard(DashboardArgs),
    /// Drive simulated raffle users against the HTTP API
    Load(LoadArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DashboardArgs {
    /// Address the web UI listens on
    #[arg(long = "listen-host", default_value = DEFAULT_LISTEN_HOST)]
    pub listen_host: String,

    /// Port the web UI listens on
    #[arg(long, short = 'p', default_value_t = DEFAULT_DASHBOARD_PORT)]
    pub port: u16,

    /// AWS region of the CloudWatch endpoint
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Override the CloudWatch endpoint (defaults to https://monitoring.<region>.amazonaws.com/)
    #[arg(long = "cloudwatch-endpoint")]
    pub cloudwatch_endpoint: Option<String>,

    /// Metric namespace
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Metric name
    #[arg(long = "metric-name", default_value = DEFAULT_METRIC_NAME)]
    pub metric_name: String,

    /// Statistic to request
    #[arg(long, default_value = DEFAULT_STAT)]
    pub stat: String,

    /// Unit to request
    #[arg(long, default_value = DEFAULT_UNIT)]
    pub unit: String,

    /// Aggregation period in seconds
    #[arg(long, default_value = "300", value_parser = parse_positive_u64)]
    pub period: PositiveU64,

    /// Trailing window to query (supports ms/s/m/h)
    #[arg(long, default_value = "15m", value_parser = parse_duration_arg)]
    pub window: Duration,

    /// Metric dimension as Name=Value (repeatable)
    #[arg(long = "dimension", short = 'd', value_parser = parse_dimension_arg)]
    pub dimensions: Vec<Dimension>,

    /// Interval between chart refreshes (supports ms/s/m/h)
    #[arg(long = "refresh-interval", default_value = "60s", value_parser = parse_duration_arg)]
    pub refresh_interval: Duration,

    /// Number of points on the time axis
    #[arg(long = "axis-points", default_value = "10", value_parser = parse_positive_usize)]
    pub axis_points: PositiveUsize,

    /// Spacing between time axis points (supports ms/s/m/h)
    #[arg(long = "axis-step", default_value = "1m", value_parser = parse_duration_arg)]
    pub axis_step: Duration,

    /// Re-anchor the time axis to the refresh time on every refresh
    #[arg(long = "reanchor-axis")]
    pub reanchor_axis: bool,

    /// Chart title
    #[arg(long, default_value = DEFAULT_CHART_TITLE)]
    pub title: String,

    /// CloudWatch request timeout (supports ms/s/m/h)
    #[arg(long = "request-timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,
}

#[derive(Debug, Args, Clone)]
pub struct LoadArgs {
    /// Base URL of the raffle API (e.g. http://localhost:3000)
    #[arg(long, short = 'H')]
    pub host: Option<String>,

    /// Number of simulated users
    #[arg(long, short = 'u', default_value = "1", value_parser = parse_positive_usize)]
    pub users: PositiveUsize,

    /// Users started per second
    #[arg(long = "spawn-rate", short = 'r', default_value = "1", value_parser = parse_positive_u64)]
    pub spawn_rate: PositiveU64,

    /// Stop after this long (supports ms/s/m/h). Runs until Ctrl-C when omitted
    #[arg(long = "run-time", short = 't', value_parser = parse_duration_arg)]
    pub run_time: Option<Duration>,

    /// Raffle every simulated user targets
    #[arg(long = "raffle-id", default_value = DEFAULT_RAFFLE_ID)]
    pub raffle_id: String,

    /// Bearer token sent with every request
    #[arg(long, env = "RAFFLE_OPS_TOKEN", default_value = DEFAULT_BEARER_TOKEN, hide_env_values = true)]
    pub token: String,

    /// Program that signs purchase transactions
    #[arg(long = "signer-program", default_value = DEFAULT_SIGNER_PROGRAM)]
    pub signer_program: String,

    /// Argument passed to the signer before the user id (repeatable)
    #[arg(
        long = "signer-arg",
        default_values = [DEFAULT_SIGNER_SCRIPT],
        allow_hyphen_values = true
    )]
    pub signer_args: Vec<String>,

    /// Minimum wait between tasks (supports ms/s/m/h)
    #[arg(long = "wait-min", default_value = "1s", value_parser = parse_duration_arg)]
    pub wait_min: Duration,

    /// Maximum wait between tasks (supports ms/s/m/h)
    #[arg(long = "wait-max", default_value = "5s", value_parser = parse_duration_arg)]
    pub wait_max: Duration,

    /// Relative weight of the purchase-ticket task
    #[arg(long = "weight-purchase", default_value_t = 1)]
    pub weight_purchase: u32,

    /// Relative weight of the raffle-status task
    #[arg(long = "weight-status", default_value_t = 2)]
    pub weight_status: u32,

    /// Relative weight of the cancel-raffle task
    #[arg(long = "weight-cancel", default_value_t = 1)]
    pub weight_cancel: u32,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "request-timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Write the final stats report as JSON to this path
    #[arg(long = "export-json")]
    pub export_json: Option<String>,
}
