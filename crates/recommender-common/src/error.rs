pub use reqwest::StatusCode;

/// Errors raised by calls against the recommendation backend.
///
/// Every variant is scoped to a single request. Callers decide how a failure
/// surfaces: search and analytics report it, description generation swallows it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("backend returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("backend returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("invalid backend url: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// HTTP status reported by the backend, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Upstream { status, .. } | ClientError::UpstreamBody { status, .. } => {
                Some(*status)
            }
            ClientError::Request(e) => e.status(),
            ClientError::InvalidJson(_) | ClientError::InvalidBaseUrl(_) => None,
        }
    }
}
