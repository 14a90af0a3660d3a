//! Error types for the swap routing adapter

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    /// The routing service could not be reached or answered with an error
    ///
    /// `payload` carries the remote error body verbatim when there was one,
    /// so callers can decide whether a retry makes sense.
    #[error("Swap service unavailable at {stage} (status={status:?}): {message}")]
    Unavailable {
        /// Which request failed: `quote`, `swap_instructions` or `lookup_tables`
        stage: &'static str,
        status: Option<u16>,
        payload: Option<String>,
        message: String,
    },

    /// The service answered, but the body could not be understood
    #[error("Invalid swap response: {0}")]
    InvalidResponse(String),
}

impl SwapError {
    pub(crate) fn transport(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            stage,
            status: None,
            payload: None,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidResponse(reason.into())
    }

    /// Remote error payload, if the service sent one
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Unavailable { payload, .. } => payload.as_deref(),
            Self::InvalidResponse(_) => None,
        }
    }

    /// Hint for callers that drive their own retry policy
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { status, .. } => {
                matches!(status, None | Some(429)) || matches!(status, Some(s) if *s >= 500)
            }
            Self::InvalidResponse(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "swap_unavailable",
            Self::InvalidResponse(_) => "swap_invalid_response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_preserved() {
        let err = SwapError::Unavailable {
            stage: "quote",
            status: Some(400),
            payload: Some(r#"{"error":"Could not find any route"}"#.to_string()),
            message: "HTTP 400".to_string(),
        };
        assert_eq!(err.payload(), Some(r#"{"error":"Could not find any route"}"#));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("quote"));
    }

    #[test]
    fn test_retry_hints() {
        assert!(SwapError::transport("quote", "connection reset").is_retryable());
        let busy = SwapError::Unavailable {
            stage: "swap_instructions",
            status: Some(503),
            payload: None,
            message: "HTTP 503".to_string(),
        };
        assert!(busy.is_retryable());
        assert!(!SwapError::invalid("bad base64").is_retryable());
    }
}
