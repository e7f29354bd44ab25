use std::collections::BTreeMap;
use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::Instant};
use tracing::{debug, warn};

use super::histogram::LatencyHistogram;
use super::report::{EndpointStats, FailureStats, StatsReport};
use super::RequestEvent;

const AGGREGATED_NAME: &str = "Aggregated";

#[derive(Debug)]
struct EndpointAccumulator {
    num_requests: u64,
    num_failures: u64,
    total_response_time_ms: u128,
    min_response_time_ms: u64,
    max_response_time_ms: u64,
    total_content_length: u128,
    histogram: Option<LatencyHistogram>,
}

impl EndpointAccumulator {
    fn new() -> Self {
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                warn!("Failed to initialize latency histogram: {}", err);
                None
            }
        };
        Self {
            num_requests: 0,
            num_failures: 0,
            total_response_time_ms: 0,
            min_response_time_ms: u64::MAX,
            max_response_time_ms: 0,
            total_content_length: 0,
            histogram,
        }
    }

    fn record(&mut self, response_time: Duration, content_length: u64, failed: bool) {
        let latency_ms = u64::try_from(response_time.as_millis()).unwrap_or(u64::MAX);
        self.num_requests = self.num_requests.saturating_add(1);
        if failed {
            self.num_failures = self.num_failures.saturating_add(1);
        }
        self.total_response_time_ms = self
            .total_response_time_ms
            .saturating_add(u128::from(latency_ms));
        self.min_response_time_ms = self.min_response_time_ms.min(latency_ms);
        self.max_response_time_ms = self.max_response_time_ms.max(latency_ms);
        self.total_content_length = self
            .total_content_length
            .saturating_add(u128::from(content_length));
        if let Some(histogram) = self.histogram.as_mut()
            && let Err(err) = histogram.record(latency_ms)
        {
            warn!("Failed to record latency: {}", err);
        }
    }

    fn absorb(&mut self, other: &Self) {
        self.num_requests = self.num_requests.saturating_add(other.num_requests);
        self.num_failures = self.num_failures.saturating_add(other.num_failures);
        self.total_response_time_ms = self
            .total_response_time_ms
            .saturating_add(other.total_response_time_ms);
        self.min_response_time_ms = self.min_response_time_ms.min(other.min_response_time_ms);
        self.max_response_time_ms = self.max_response_time_ms.max(other.max_response_time_ms);
        self.total_content_length = self
            .total_content_length
            .saturating_add(other.total_content_length);
        if let (Some(histogram), Some(other_histogram)) =
            (self.histogram.as_mut(), other.histogram.as_ref())
            && let Err(err) = histogram.merge(other_histogram)
        {
            warn!("Failed to merge latency histogram: {}", err);
        }
    }

    fn to_stats(&self, request_type: &str, name: &str) -> EndpointStats {
        let (p50, p90, p99) = self
            .histogram
            .as_ref()
            .map_or((0, 0, 0), LatencyHistogram::percentiles);
        let divisor = u128::from(self.num_requests);
        EndpointStats {
            request_type: request_type.to_owned(),
            name: name.to_owned(),
            num_requests: self.num_requests,
            num_failures: self.num_failures,
            min_response_time_ms: if self.num_requests == 0 {
                0
            } else {
                self.min_response_time_ms
            },
            max_response_time_ms: self.max_response_time_ms,
            avg_response_time_ms: average(self.total_response_time_ms, divisor),
            p50_response_time_ms: p50,
            p90_response_time_ms: p90,
            p99_response_time_ms: p99,
            avg_content_length: average(self.total_content_length, divisor),
        }
    }
}

fn average(total: u128, count: u128) -> u64 {
    total
        .checked_div(count)
        .map_or(0, |value| u64::try_from(value).unwrap_or(u64::MAX))
}

/// Aggregates request events per `(request_type, name)`.
#[derive(Debug)]
pub struct StatsCollector {
    started: Instant,
    endpoints: BTreeMap<(&'static str, &'static str), EndpointAccumulator>,
    failures: BTreeMap<(&'static str, &'static str, String), u64>,
}

impl StatsCollector {
    #[must_use]
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            endpoints: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, event: RequestEvent) {
        let key = (event.request_type(), event.name());
        let entry = self
            .endpoints
            .entry(key)
            .or_insert_with(EndpointAccumulator::new);
        match event {
            RequestEvent::Success {
                response_time,
                response_length,
                ..
            } => entry.record(response_time, response_length, false),
            RequestEvent::Failure {
                request_type,
                name,
                response_time,
                message,
            } => {
                entry.record(response_time, 0, true);
                debug!("{} {} failed: {}", request_type, name, message);
                let count = self
                    .failures
                    .entry((request_type, name, message))
                    .or_insert(0);
                *count = count.saturating_add(1);
            }
        }
    }

    #[must_use]
    pub fn report(&self) -> StatsReport {
        let mut total = EndpointAccumulator::new();
        let endpoints = self
            .endpoints
            .iter()
            .map(|((request_type, name), accumulator)| {
                total.absorb(accumulator);
                accumulator.to_stats(request_type, name)
            })
            .collect();
        let failures = self
            .failures
            .iter()
            .map(|((request_type, name, message), occurrences)| FailureStats {
                request_type: (*request_type).to_owned(),
                name: (*name).to_owned(),
                message: message.clone(),
                occurrences: *occurrences,
            })
            .collect();

        StatsReport {
            duration_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            endpoints,
            aggregated: total.to_stats("", AGGREGATED_NAME),
            failures,
        }
    }
}

/// Spawns the collector task; it finishes once every event sender is dropped.
#[must_use]
pub fn setup_stats_collector(
    run_start: Instant,
    mut events_rx: mpsc::Receiver<RequestEvent>,
) -> JoinHandle<StatsReport> {
    tokio::spawn(async move {
        let mut collector = StatsCollector::new(run_start);
        while let Some(event) = events_rx.recv().await {
            collector.record(event);
        }
        collector.report()
    })
}
