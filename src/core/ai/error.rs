use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AiError {
    #[error("missing configuration: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("rate limited by upstream")]
    RateLimited { body: String },
    #[error("upstream rejected request with status {status}")]
    UpstreamRejection { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("model returned no image: {0}")]
    NoImage(String),
    #[error("prediction did not finish after {polls} polls")]
    PollTimeout { polls: u32 },
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
    #[error("all {attempts} models failed, last error: {last}")]
    AllModelsFailed { attempts: usize, last: Box<AiError> },
}

impl AiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AiError::Config(_) => "CONFIG_MISSING",
            AiError::InvalidInput(_) => "INVALID_INPUT",
            AiError::Network(_) => "NETWORK_ERROR",
            AiError::RateLimited { .. } => "RATE_LIMITED",
            AiError::UpstreamRejection { .. } => "UPSTREAM_REJECTED",
            AiError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AiError::NoImage(_) => "NO_IMAGE_RETURNED",
            AiError::PollTimeout { .. } => "POLL_TIMEOUT",
            AiError::PredictionFailed(_) => "PREDICTION_FAILED",
            AiError::AllModelsFailed { last, .. } => last.error_code(),
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AiError::Config(_) | AiError::MalformedResponse(_) => 500,
            AiError::InvalidInput(_) => 400,
            AiError::Network(_) => 503,
            AiError::RateLimited { .. } => 429,
            AiError::UpstreamRejection { status, .. } => *status,
            AiError::NoImage(_) | AiError::PredictionFailed(_) => 502,
            AiError::PollTimeout { .. } => 504,
            AiError::AllModelsFailed { last, .. } => last.http_status(),
        }
    }

    /// 网络抖动或限流，换个时间/模型可能成功
    pub fn is_transient(&self) -> bool {
        matches!(self, AiError::Network(_) | AiError::RateLimited { .. })
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::MalformedResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AiError::Config("GEMINI_API_KEY".into()).http_status(), 500);
        assert_eq!(AiError::MalformedResponse("x".into()).http_status(), 500);
        assert_eq!(AiError::RateLimited { body: String::new() }.http_status(), 429);
        assert_eq!(
            AiError::UpstreamRejection {
                status: 403,
                body: "blocked".into()
            }
            .http_status(),
            403
        );
    }

    #[test]
    fn test_all_models_failed_delegates_to_last() {
        let err = AiError::AllModelsFailed {
            attempts: 3,
            last: Box::new(AiError::RateLimited { body: String::new() }),
        };
        assert_eq!(err.http_status(), 429);
        assert_eq!(err.error_code(), "RATE_LIMITED");
        assert!(err.to_string().contains("rate limited"));
    }
}
