//! Simulated raffle users and the load run that drives them.
mod execution;
mod runner;
mod signer;
mod tasks;
mod user;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::info;

use crate::args::LoadArgs;
use crate::error::{AppError, AppResult};
use crate::metrics::{export_json, print_report};
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

pub use execution::{PurchasePayload, TaskContext, classify_response, endpoint_url, execute_task};
pub use runner::{LoadPlan, WaitRange, run_load};
pub use signer::{
    ProcessSigner, SIGN_EVENT_NAME, SIGN_REQUEST_TYPE, SignedTransaction, TransactionSigner,
    sign_failure_event,
};
pub use tasks::{RaffleTask, TaskPicker, TaskWeights};
pub use user::SimulatedUser;

/// Runs the load test until `run_time` or Ctrl-C, then prints (and optionally
/// exports) the stats.
///
/// # Errors
///
/// Returns an error on invalid settings, HTTP client build failure, or when
/// the JSON export cannot be written.
pub async fn run_load_test(args: &LoadArgs) -> AppResult<()> {
    let plan = LoadPlan::from_args(args)?;
    let signer = Arc::new(ProcessSigner::from_args(args));

    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let _signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let report = run_load(&plan, signer, &shutdown_tx).await?;
    drop(shutdown_tx.send(()));

    print_report(&report);
    if let Some(path) = args.export_json.as_deref() {
        export_json(path, &report).await.map_err(AppError::from)?;
        info!("Stats written to {}", path);
    }
    Ok(())
}
