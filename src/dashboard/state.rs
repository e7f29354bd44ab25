use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::args::DashboardArgs;
use crate::cloudwatch::MetricSource;
use crate::error::AppResult;

use super::axis::TimeAxis;
use super::chart::{ChartFrame, render_chart_svg};

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub title: String,
    pub axis_points: usize,
    pub axis_step: Duration,
    pub refresh_interval: Duration,
    pub reanchor_axis: bool,
}

impl DashboardSettings {
    #[must_use]
    pub fn from_args(args: &DashboardArgs) -> Self {
        Self {
            title: args.title.clone(),
            axis_points: args.axis_points.get(),
            axis_step: args.axis_step,
            refresh_interval: args.refresh_interval,
            reanchor_axis: args.reanchor_axis,
        }
    }
}

/// Process-wide dashboard state shared by every request handler.
pub struct DashboardState {
    source: Arc<dyn MetricSource>,
    settings: DashboardSettings,
    frame: RwLock<ChartFrame>,
}

impl std::fmt::Debug for DashboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardState")
            .field("source", &self.source.describe())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl DashboardState {
    /// Anchors the axis at `now` and performs the initial fetch.
    ///
    /// # Errors
    ///
    /// Returns an error when the initial fetch fails.
    pub async fn bootstrap(
        source: Arc<dyn MetricSource>,
        settings: DashboardSettings,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let axis = TimeAxis::anchored(now, settings.axis_points, settings.axis_step);
        let series = source.fetch(now).await?;
        debug!("Initial fetch returned {} points", series.len());
        let frame = ChartFrame::from_series(axis, &series, now);
        Ok(Self {
            source,
            settings,
            frame: RwLock::new(frame),
        })
    }

    #[must_use]
    pub const fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub async fn frame(&self) -> ChartFrame {
        self.frame.read().await.clone()
    }

    /// Re-fetches the metric and replaces the frame.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous frame is kept in that case.
    pub async fn refresh(&self) -> AppResult<ChartFrame> {
        self.refresh_at(Utc::now()).await
    }

    /// Same as [`Self::refresh`] with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous frame is kept in that case.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> AppResult<ChartFrame> {
        let series = match self.source.fetch(now).await {
            Ok(series) => series,
            Err(err) => {
                error!("Metric refresh failed: {}", err);
                return Err(err);
            }
        };
        let axis = if self.settings.reanchor_axis {
            TimeAxis::anchored(now, self.settings.axis_points, self.settings.axis_step)
        } else {
            self.frame.read().await.axis.clone()
        };
        let mut next = ChartFrame::from_series(axis, &series, now);

        let mut guard = self.frame.write().await;
        next.refresh_count = guard.refresh_count.saturating_add(1);
        *guard = next.clone();
        drop(guard);
        debug!(
            "Refresh {} charted {} points",
            next.refresh_count,
            next.values.len()
        );
        Ok(next)
    }

    /// Renders the current frame without fetching.
    ///
    /// # Errors
    ///
    /// Returns an error when the chart cannot be drawn.
    pub async fn render(&self) -> AppResult<String> {
        let frame = self.frame().await;
        render_chart_svg(&frame, &self.settings.title)
    }
}
