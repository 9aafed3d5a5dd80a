//! HTTP error mapping.
//!
//! Every failure becomes `{ "error": <reason>, "message": <text> }` with a
//! status derived from the runtime's error taxonomy.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use runtime::{ErrorKind, RoundError};
use thiserror::Error;
use tracing::{error, warn};

use crate::api::ErrorBody;
use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Round(#[from] RoundError),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("malformed request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Round(err) => match err {
                RoundError::RoundNotFound(_) => StatusCode::NOT_FOUND,
                RoundError::CreationDisabled => StatusCode::FORBIDDEN,
                RoundError::ProverUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                RoundError::LedgerTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                other => match other.kind() {
                    ErrorKind::Validation | ErrorKind::Proof | ErrorKind::State => {
                        StatusCode::BAD_REQUEST
                    }
                    ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
                },
            },
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Round(err) => err.reason(),
            Self::Unauthorized(_) => "Unauthorized",
            Self::BadRequest(_) => "MalformedRequest",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(reason = self.reason(), error = %self, "Request failed");
        } else {
            warn!(reason = self.reason(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.reason().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
