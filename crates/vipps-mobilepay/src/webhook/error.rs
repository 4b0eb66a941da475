//! Webhook error types

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::api::types::EventKind;

/// Inbound request authenticity failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// `X-Vipps-Signature` absent
    #[error("missing signature header")]
    MissingSignature,
    /// Signature is not valid base64
    #[error("malformed signature")]
    MalformedSignature,
    /// Body HMAC does not match
    #[error("invalid signature")]
    InvalidSignature,
    /// `X-Ms-Content-Sha256` absent
    #[error("missing content hash header")]
    MissingContentHash,
    /// Declared content hash differs from the body's hash
    #[error("content hash mismatch")]
    ContentHashMismatch,
    /// Neither `Authorization` nor `X-Vipps-Authorization` present
    #[error("missing authorization header")]
    MissingAuthorization,
    /// Canonical string signature does not match
    #[error("signature validation failed")]
    ValidationFailed,
}

/// No handler and no fallback for an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no handler for event type: {0}")]
pub struct RouteError(pub EventKind);

/// Webhook processing error
#[derive(Debug, Error)]
pub enum Error {
    /// Only POST is accepted
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// Signature verification failed
    #[error("webhook signature rejected: {0}")]
    Signature(#[from] SignatureError),

    /// Body is not a webhook event
    #[error("failed to decode webhook event: {0}")]
    Decode(#[from] serde_json::Error),

    /// Nothing registered for the event
    #[error(transparent)]
    NoHandler(#[from] RouteError),

    /// Handler returned an error
    #[error("webhook handler failed: {0}")]
    Handler(#[source] anyhow::Error),
}

impl Error {
    /// HTTP status to answer the provider with
    ///
    /// Dispatch failures answer 500 so the provider retries delivery.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::Signature(_) | Error::Decode(_) => StatusCode::BAD_REQUEST,
            Error::NoHandler(_) | Error::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
