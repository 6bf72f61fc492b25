//! HTTP error mapping for the debugger service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ethsig::MalformedInputError;
use ethsig_evm::ValidationError;

/// Errors returned by the debugger endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body is well-formed JSON but not a usable request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Validation did not reach a verdict.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<MalformedInputError> for ApiError {
    fn from(err: MalformedInputError) -> Self {
        Self::Validation(err.into())
    }
}

impl ApiError {
    /// Status code for this error.
    ///
    /// Caller mistakes are `400`, a node answering nonsense is `502` and an
    /// unreachable node is `503`.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(ValidationError::UnexpectedResponse(_)) => StatusCode::BAD_GATEWAY,
            Self::Validation(ValidationError::Network(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "validation failed upstream");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use ethsig::MalformedWrapperError;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                MalformedInputError::InvalidAddress("0x".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ValidationError::MalformedWrapper(MalformedWrapperError::MissingSuffix).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ValidationError::UnknownNetwork("solana".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ValidationError::UnexpectedResponse("null result".into()).into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }
}
