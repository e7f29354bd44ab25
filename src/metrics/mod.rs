//! Request events, per-endpoint aggregation, and the end-of-run report.
mod collector;
mod events;
mod export;
mod histogram;
mod report;


pub use collector::{StatsCollector, setup_stats_collector};
pub use events::RequestEvent;
pub use export::export_json;
pub use histogram::LatencyHistogram;
pub use report::{EndpointStats, FailureStats, StatsReport, print_report};
