use std::fmt::Display;

use chrono::{DateTime, TimeDelta, Utc};
use plotters::prelude::*;
use tracing::warn;

use crate::cloudwatch::MetricSeries;
use crate::error::{AppError, AppResult, DashboardError};

use super::axis::TimeAxis;

const CHART_SIZE: (u32, u32) = (960, 480);

/// What the graph currently shows: the x-axis and the values paired with it.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    pub axis: TimeAxis,
    pub values: Vec<f64>,
    pub fetched_at: DateTime<Utc>,
    pub refresh_count: u64,
}

impl ChartFrame {
    /// Pairs fetched values with `axis` by position.
    ///
    /// When the lengths differ the shorter one bounds the chart.
    #[must_use]
    pub fn from_series(axis: TimeAxis, series: &MetricSeries, fetched_at: DateTime<Utc>) -> Self {
        let mut values = series.values();
        if values.len() != axis.len() {
            warn!(
                "Fetched {} values for a {}-point axis; charting {}",
                values.len(),
                axis.len(),
                values.len().min(axis.len())
            );
            values.truncate(axis.len());
        }
        Self {
            axis,
            values,
            fetched_at,
            refresh_count: 0,
        }
    }

    pub fn points(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.axis
            .points()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

fn draw_error(err: &impl Display) -> AppError {
    AppError::dashboard(DashboardError::Draw {
        message: err.to_string(),
    })
}

fn value_range(values: &[f64]) -> AppResult<(f64, f64)> {
    if values.is_empty() {
        return Ok((0.0, 1.0));
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(*value), max.max(*value))
        });
    if !min.is_finite() || !max.is_finite() {
        return Err(AppError::dashboard(DashboardError::NonFiniteRange));
    }
    let span = max - min;
    let pad = if span.abs() < f64::EPSILON {
        1.0
    } else {
        span * 0.1
    };
    Ok((min - pad, max + pad))
}

/// Renders `frame` as an SVG line chart (x = time, y = value).
///
/// # Errors
///
/// Returns an error when the axis is empty, the values are not finite, or
/// plotters fails to draw.
pub fn render_chart_svg(frame: &ChartFrame, title: &str) -> AppResult<String> {
    let (x_start, x_last) = frame
        .axis
        .bounds()
        .ok_or_else(|| AppError::dashboard(DashboardError::EmptySeries))?;
    let x_end = if x_last > x_start {
        x_last
    } else {
        x_start
            .checked_add_signed(TimeDelta::minutes(1))
            .unwrap_or(x_start)
    };
    let (y_min, y_max) = value_range(&frame.values)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|err| draw_error(&err))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_start..x_end, y_min..y_max)
            .map_err(|err| draw_error(&err))?;

        chart
            .configure_mesh()
            .x_labels(frame.axis.len().max(2))
            .x_label_formatter(&|time: &DateTime<Utc>| time.format("%H:%M").to_string())
            .x_desc("Time (UTC)")
            .y_desc("Value")
            .draw()
            .map_err(|err| draw_error(&err))?;

        chart
            .draw_series(LineSeries::new(frame.points(), BLUE))
            .map_err(|err| draw_error(&err))?;
        chart
            .draw_series(
                frame
                    .points()
                    .map(|point| Circle::new(point, 3, BLUE.filled())),
            )
            .map_err(|err| draw_error(&err))?;

        root.present().map_err(|err| draw_error(&err))?;
    }
    Ok(svg)
}
