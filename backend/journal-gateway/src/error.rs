/// Error types for the journal gateway
///
/// Transient downstream failures are retried inside the client layer and
/// never reach these types unless retries are exhausted. Compensation
/// failures are absorbed by the saga so a failed rollback cannot mask the
/// original failure reason.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;

use crate::clients::RemoteError;
use crate::saga::SagaStep;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug)]
pub enum GatewayError {
    /// A downstream call failed after the retry policy was exhausted, or
    /// failed permanently (4xx, undecodable body, count mismatch)
    RemoteInvocation(RemoteError),

    /// The link step failed and compensation was attempted
    SagaAborted { step: SagaStep, reason: String },

    /// Internal server error
    Internal(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::RemoteInvocation(e) => write!(f, "Remote invocation failed: {}", e),
            GatewayError::SagaAborted { step, reason } => {
                write!(f, "Journal creation aborted at step {}: {}", step, reason)
            }
            GatewayError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<RemoteError> for GatewayError {
    fn from(err: RemoteError) -> Self {
        GatewayError::RemoteInvocation(err)
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RemoteInvocation(RemoteError::Transport { .. }) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            GatewayError::RemoteInvocation(RemoteError::Status { status, .. })
                if *status == 404 =>
            {
                StatusCode::NOT_FOUND
            }
            GatewayError::RemoteInvocation(_) => StatusCode::BAD_GATEWAY,
            GatewayError::SagaAborted { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}
