//! Operational tooling for the raffle service.
//!
//! Two tools share this crate: a live web dashboard charting one CloudWatch
//! metric, and a load generator that drives simulated raffle users against
//! the HTTP API and reports per-endpoint latency stats. The `raffle-ops`
//! binary is the primary interface; library APIs exist for the binary and
//! its tests.
pub mod args;
pub mod cloudwatch;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod load;
pub mod logger;
pub mod metrics;
pub mod shutdown;

mod entry;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;

/// Parses the command line and runs the selected subcommand.
///
/// # Errors
///
/// Returns an error when configuration is invalid or the subcommand fails.
pub fn run() -> error::AppResult<()> {
    entry::run()
}
