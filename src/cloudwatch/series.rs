use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One fetched series, ordered by timestamp ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    pub label: Option<String>,
    pub points: Vec<MetricPoint>,
}

impl MetricSeries {
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(super) fn sort_ascending(&mut self) {
        self.points.sort_by(|left, right| left.timestamp.cmp(&right.timestamp));
    }
}
