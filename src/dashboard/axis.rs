use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Evenly spaced timestamps ending at an anchor instant, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAxis {
    points: Vec<DateTime<Utc>>,
    step: Duration,
}

impl TimeAxis {
    /// Builds `count` timestamps spaced by `step`, the last one being `end`.
    #[must_use]
    pub fn anchored(end: DateTime<Utc>, count: usize, step: Duration) -> Self {
        let delta = TimeDelta::from_std(step).unwrap_or(TimeDelta::zero());
        let mut points = Vec::with_capacity(count);
        let mut cursor = end;
        for _ in 0..count {
            points.push(cursor);
            cursor = cursor.checked_sub_signed(delta).unwrap_or(cursor);
        }
        points.reverse();
        Self { points, step }
    }

    #[must_use]
    pub fn points(&self) -> &[DateTime<Utc>] {
        &self.points
    }

    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns `(first, last)`; `None` for an empty axis.
    #[must_use]
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.points.first()?, *self.points.last()?))
    }
}
