use recommender_common::client::BackendConfig;

use crate::error::AppError;

/// Result-count limit sent with every recommendation request.
pub const DEFAULT_TOP_K: usize = 6;

/// Console configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin, timeout and error-body limit.
    pub backend: BackendConfig,
    /// Number of matches requested per search.
    pub top_k: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `RECOMMENDER_API_URL`: backend origin (default `http://localhost:8000`)
    /// - `RECOMMENDER_TIMEOUT_SECS`: per-request timeout (default: HTTP client default)
    /// - `RECOMMENDER_TOP_K`: matches per search (default 6, must be at least 1)
    pub fn from_env() -> Result<Self, AppError> {
        let top_k = match std::env::var("RECOMMENDER_TOP_K") {
            Ok(raw) => parse_top_k(&raw)?,
            Err(_) => DEFAULT_TOP_K,
        };

        Ok(Self {
            backend: BackendConfig::from_env(),
            top_k,
        })
    }
}

fn parse_top_k(raw: &str) -> Result<usize, AppError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(AppError::Config(format!(
            "RECOMMENDER_TOP_K must be a positive integer, got {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_k() {
        assert_eq!(parse_top_k("6").unwrap(), 6);
        assert_eq!(parse_top_k(" 10 ").unwrap(), 10);
        assert!(matches!(parse_top_k("0"), Err(AppError::Config(_))));
        assert!(matches!(parse_top_k("-1"), Err(AppError::Config(_))));
        assert!(matches!(parse_top_k("six"), Err(AppError::Config(_))));
    }
}
