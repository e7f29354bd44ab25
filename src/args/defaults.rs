pub(crate) const DEFAULT_USER_AGENT: &str = concat!("raffle-ops/", env!("CARGO_PKG_VERSION"));

/// Config filenames checked when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILES: [&str; 2] = ["raffle-ops.toml", "raffle-ops.json"];

pub(super) const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
pub(super) const DEFAULT_DASHBOARD_PORT: u16 = 8050;
pub(super) const DEFAULT_REGION: &str = "us-east-1";
pub(super) const DEFAULT_NAMESPACE: &str = "AWS/ECS";
pub(super) const DEFAULT_METRIC_NAME: &str = "CPUUtilization";
pub(super) const DEFAULT_STAT: &str = "Average";
pub(super) const DEFAULT_UNIT: &str = "Percent";
pub(super) const DEFAULT_CHART_TITLE: &str = "ECS CPU Utilization";

pub(super) const DEFAULT_RAFFLE_ID: &str = "raffle_001";
pub(super) const DEFAULT_BEARER_TOKEN: &str = "<your-jwt-token-here>";
pub(super) const DEFAULT_SIGNER_PROGRAM: &str = "node";
pub(super) const DEFAULT_SIGNER_SCRIPT: &str = "sign_transaction.js";
