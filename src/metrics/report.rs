use serde::Serialize;

/// Stats for one `(request_type, name)` pair, or the aggregated row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointStats {
    pub request_type: String,
    pub name: String,
    pub num_requests: u64,
    pub num_failures: u64,
    pub min_response_time_ms: u64,
    pub max_response_time_ms: u64,
    pub avg_response_time_ms: u64,
    pub p50_response_time_ms: u64,
    pub p90_response_time_ms: u64,
    pub p99_response_time_ms: u64,
    pub avg_content_length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureStats {
    pub request_type: String,
    pub name: String,
    pub message: String,
    pub occurrences: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub duration_ms: u64,
    pub endpoints: Vec<EndpointStats>,
    pub aggregated: EndpointStats,
    pub failures: Vec<FailureStats>,
}

impl StatsReport {
    #[must_use]
    pub fn endpoint(&self, request_type: &str, name: &str) -> Option<&EndpointStats> {
        self.endpoints
            .iter()
            .find(|stats| stats.request_type == request_type && stats.name == name)
    }
}

pub(crate) fn summary_lines(report: &StatsReport) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "{:<16} {:<32} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Type",
        "Name",
        "# reqs",
        "# fails",
        "Avg",
        "Min",
        "Max",
        "p50",
        "p90",
        "p99",
        "Avg size"
    ));
    for stats in report.endpoints.iter().chain(std::iter::once(&report.aggregated)) {
        lines.push(format!(
            "{:<16} {:<32} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}",
            stats.request_type,
            stats.name,
            stats.num_requests,
            stats.num_failures,
            stats.avg_response_time_ms,
            stats.min_response_time_ms,
            stats.max_response_time_ms,
            stats.p50_response_time_ms,
            stats.p90_response_time_ms,
            stats.p99_response_time_ms,
            stats.avg_content_length
        ));
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures:".to_owned());
        for failure in &report.failures {
            lines.push(format!(
                "{:>6}x {} {}: {}",
                failure.occurrences, failure.request_type, failure.name, failure.message
            ));
        }
    }
    lines.push(String::new());
    lines.push(format!("Duration: {}s", report.duration_ms / 1000));
    lines
}

pub fn print_report(report: &StatsReport) {
    for line in summary_lines(report) {
        println!("{}", line);
    }
}
