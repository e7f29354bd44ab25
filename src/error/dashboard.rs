use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Failed to draw chart: {message}")]
    Draw { message: String },
    #[error("Cannot render a chart with no points.")]
    EmptySeries,
    #[error("Chart value range is not finite.")]
    NonFiniteRange,
    #[error("Failed to bind dashboard on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Dashboard server failed: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}
