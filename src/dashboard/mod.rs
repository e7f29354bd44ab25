//! Web dashboard charting one CloudWatch metric.
mod axis;
mod chart;
mod page;
mod server;
mod state;


use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::args::DashboardArgs;
use crate::cloudwatch::{AwsCredentials, CloudWatchClient, CloudWatchSettings, MetricSource};
use crate::error::AppResult;
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

pub use axis::TimeAxis;
pub use chart::{ChartFrame, render_chart_svg};
pub use server::{SharedState, UpdateRequest, bind, router, serve};
pub use state::{DashboardSettings, DashboardState};

/// Fetches once, then serves the dashboard until Ctrl-C.
///
/// # Errors
///
/// Returns an error when credentials are missing, the initial fetch fails,
/// or the listener cannot be bound.
pub async fn run_dashboard(args: &DashboardArgs) -> AppResult<()> {
    let credentials = AwsCredentials::from_env()?;
    let client = CloudWatchClient::new(CloudWatchSettings::from_args(args), credentials)?;
    let source: Arc<dyn MetricSource> = Arc::new(client);
    info!("Dashboard source: {}", source.describe());

    let state = DashboardState::bootstrap(source, DashboardSettings::from_args(args), Utc::now())
        .await?;
    let listener = bind(&args.listen_host, args.port).await?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let _signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    serve(listener, Arc::new(state), shutdown_rx).await
}
