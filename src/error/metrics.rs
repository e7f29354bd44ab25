use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Missing AWS credentials: set {variable}.")]
    MissingCredentials { variable: &'static str },
    #[error("GetMetricData request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("GetMetricData returned {status}: {kind}: {message}")]
    Service {
        status: u16,
        kind: String,
        message: String,
    },
    #[error("Failed to decode GetMetricData response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
    #[error("GetMetricData returned no results for query '{id}'.")]
    NoResults { id: String },
    #[error("GetMetricData returned {timestamps} timestamps but {values} values.")]
    MismatchedSeries { timestamps: usize, values: usize },
    #[error("Timestamp {value} is out of range.")]
    InvalidTimestamp { value: f64 },
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
