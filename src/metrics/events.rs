use std::time::Duration;

/// One observation reported by a simulated user.
///
/// `request_type` is the HTTP method, or a pseudo type such as
/// `SignTransaction` for work that never reaches the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    Success {
        request_type: &'static str,
        name: &'static str,
        response_time: Duration,
        response_length: u64,
    },
    Failure {
        request_type: &'static str,
        name: &'static str,
        response_time: Duration,
        message: String,
    },
}

impl RequestEvent {
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        match self {
            Self::Success { request_type, .. } | Self::Failure { request_type, .. } => {
                request_type
            }
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Success { name, .. } | Self::Failure { name, .. } => name,
        }
    }

    #[must_use]
    pub const fn response_time(&self) -> Duration {
        match self {
            Self::Success { response_time, .. } | Self::Failure { response_time, .. } => {
                *response_time
            }
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}
