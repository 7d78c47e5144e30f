//! The uniform error envelope used at every system boundary (spec §7).

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

/// The closed set of error kinds a job or a gateway request can terminate with.
///
/// Internal code is free to use `anyhow`/`?` everywhere; at the HTTP boundary
/// and at the job-record boundary every error is funneled through one of
/// these kinds so callers never need to know which handler or collaborator
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request payload failed schema validation or path sanitization.
    #[error("validation error")]
    Validation,
    /// Admission check failed (bad API key, address outside allow-list).
    #[error("authentication error")]
    Auth,
    /// Worker could not decode a popped payload, or the handler name is unknown.
    #[error("decode error")]
    Decode,
    /// The handler raised while processing the job.
    #[error("handler error")]
    Handler,
    /// The job exceeded its declared timeout.
    #[error("timeout error")]
    Timeout,
    /// Transport error talking to the broker.
    #[error("broker error")]
    Broker,
    /// The job id (or token) is unknown or has been reaped/expired.
    #[error("not found")]
    NotFound,
}

impl ErrorKind {
    /// The HTTP status this kind maps to when it is the direct cause of a
    /// gateway response (as opposed to being read back from a stored job).
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::FORBIDDEN,
            ErrorKind::Decode => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Handler => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Broker => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// A terminal job error: kind, one-line message, and an optional stack
/// excerpt captured at the handler boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct JobError {
    /// The closed error kind.
    pub kind: ErrorKind,
    /// A one-line human-readable message.
    pub message: String,
    /// An optional stack/backtrace excerpt, present only for `Handler` errors.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stack: Option<String>,
}

impl JobError {
    /// Build a new error of the given kind with no stack excerpt.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        JobError {
            kind,
            message: message.into(),
            stack: None,
        }
    }

    /// Build a new handler-kind error carrying a stack excerpt.
    pub fn handler<S: Into<String>>(message: S, stack: S) -> Self {
        JobError {
            kind: ErrorKind::Handler,
            message: message.into(),
            stack: Some(stack.into()),
        }
    }

    /// Render this error as the JSON body the gateway returns inline.
    pub fn as_json_error(&self) -> HttpResponse {
        HttpResponse::build(self.kind.status_code()).json(self)
    }
}

impl actix_web::error::ResponseError for JobError {
    fn error_response(&self) -> HttpResponse {
        self.as_json_error()
    }

    fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_spec() {
        assert_eq!(ErrorKind::Validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Auth.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Broker.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn round_trips_through_json() {
        let err = JobError::handler("boom", "at line 1");
        let encoded = serde_json::to_string(&err).unwrap();
        let decoded: JobError = serde_json::from_str(&encoded).unwrap();
        assert_eq!(err, decoded);
    }

    #[test]
    fn non_handler_errors_omit_stack() {
        let err = JobError::new(ErrorKind::Decode, "unknown handler tasks.nonexistent");
        let encoded = serde_json::to_string(&err).unwrap();
        assert!(!encoded.contains("stack"));
    }
}
