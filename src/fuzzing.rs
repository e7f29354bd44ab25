use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};

use crate::args::parsers::{parse_dimension_arg, parse_duration_arg};
use crate::args::{Cli, Command, Dimension};
use crate::cloudwatch::decode_response;
use crate::config::types::ConfigFile;
use crate::config::{apply_dashboard_config, apply_load_config};
use crate::error::{AppError, AppResult, ConfigError};

/// Parses a duration argument (e.g. `10s`, `500ms`).
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_arg_input(input: &str) -> AppResult<Duration> {
    parse_duration_arg(input)
}

/// Parses a `Name=Value` metric dimension.
///
/// # Errors
///
/// Returns an error when the dimension is malformed.
pub fn parse_dimension_input(input: &str) -> AppResult<Dimension> {
    parse_dimension_arg(input)
}

/// Decodes a `GetMetricData` response body and returns `(results, points)`.
///
/// # Errors
///
/// Returns an error when the body is not a valid response.
pub fn decode_metric_page_input(body: &[u8]) -> AppResult<(usize, usize)> {
    let page = decode_response(body)?;
    let points = page
        .metric_data_results
        .iter()
        .map(|result| result.values.len())
        .fold(0usize, usize::saturating_add);
    Ok((page.metric_data_results.len(), points))
}

/// Parses TOML config and applies both sections to default arguments.
///
/// # Errors
///
/// Returns an error when the config does not parse or holds invalid values.
pub fn apply_config_from_toml(input: &str) -> AppResult<()> {
    let config: ConfigFile = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: "<fuzz>".into(),
            source: err,
        })
    })?;
    apply_config_file(&config)
}

/// Parses JSON config and applies both sections to default arguments.
///
/// # Errors
///
/// Returns an error when the config does not parse or holds invalid values.
pub fn apply_config_from_json(input: &str) -> AppResult<()> {
    let config: ConfigFile = serde_json::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseJson {
            path: "<fuzz>".into(),
            source: err,
        })
    })?;
    apply_config_file(&config)
}

fn apply_config_file(config: &ConfigFile) -> AppResult<()> {
    for subcommand in ["dashboard", "load"] {
        let matches = Cli::command().try_get_matches_from(["raffle-ops", subcommand])?;
        let mut cli = Cli::from_arg_matches(&matches)?;
        let Some((_, sub_matches)) = matches.subcommand() else {
            continue;
        };
        match &mut cli.command {
            Command::Dashboard(args) => {
                if let Some(section) = config.dashboard.as_ref() {
                    apply_dashboard_config(args, sub_matches, section)?;
                }
            }
            Command::Load(args) => {
                if let Some(section) = config.load.as_ref() {
                    apply_load_config(args, sub_matches, section)?;
                }
            }
        }
    }
    Ok(())
}
