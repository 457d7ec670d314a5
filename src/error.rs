//! Error types for the intent gateway.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
///
/// These never reach an HTTP caller: the classifier recovers from all of them.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Failure while forwarding a request to a downstream handler.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Error al contactar el servicio {handler}: {reason}")]
    Transport { handler: String, reason: String },

    #[error("Respuesta inválida del servicio {handler}: {reason}")]
    InvalidBody { handler: String, reason: String },
}

/// Errors surfaced to the HTTP caller by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Malformed body, missing field, or file/intent contradiction.
    #[error("{0}")]
    ClientRequest(String),

    /// The request was classified as out of policy.
    #[error("{0}")]
    Rejected(String),

    /// The downstream handler could not be reached or answered garbage.
    #[error(transparent)]
    Upstream(#[from] ForwardError),
}

impl DispatchError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ClientRequest(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClientRequest(_) => "client_request",
            Self::Rejected(_) => "rejected",
            Self::Upstream(_) => "upstream",
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
