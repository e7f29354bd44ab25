mod app;
mod config;
mod dashboard;
mod http;
mod metrics;
mod sign;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use dashboard::DashboardError;
pub use http::HttpError;
pub use metrics::MetricsError;
pub use sign::SignError;
pub use validation::ValidationError;
