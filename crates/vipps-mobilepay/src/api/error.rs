//! Vipps MobilePay API error types
//!
//! See <https://developer.vippsmobilepay.com/docs/knowledge-base/errors/> for
//! the provider's error reference.
//!
//! # Error Handling
//!
//! The API uses standard HTTP response codes:
//! - 2xx: Success
//! - 4xx: Client errors (invalid request, unknown reference, etc.)
//! - 5xx: Server errors
//!
//! Error responses usually follow RFC 7807 problem details:
//!
//! ```json
//! {
//!   "type": "https://developer.vippsmobilepay.com/docs/APIs/epayment-api/api-guide/errors",
//!   "title": "Bad Request",
//!   "status": 400,
//!   "detail": "Amount must be greater than zero",
//!   "instance": "/epayment/v1/payments",
//!   "code": "INVALID_AMOUNT"
//! }
//! ```
//!
//! Some gateway errors carry a plain text or differently shaped body. Those
//! still produce an [`ApiError`], just without [`ProblemDetails`]. The raw
//! body and HTTP status are always kept so callers can log diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vipps MobilePay API error
#[derive(Debug, Error)]
pub enum Error {
    /// Access token could not be obtained
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP transport error (connection, timeout, TLS)
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider rejected the request
    #[error("Vipps API error: {0}")]
    Api(#[from] ApiError),

    /// Operation is only available against the test environment
    #[error("{0} is only available in the test environment")]
    TestModeOnly(&'static str),
}

impl Error {
    /// Get the provider error if this is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Access token acquisition error
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token endpoint could not be reached
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Token endpoint answered with a non-success status
    #[error("token request rejected: status {status}, body: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Token response body was not the documented JSON
    #[error("failed to decode token response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Token response contained an empty access token
    #[error("token response contained an empty access token")]
    EmptyToken,

    /// `expires_in` was not a valid integer
    #[error("invalid expires_in value: {0:?}")]
    InvalidExpiresIn(String),
}

/// Provider rejection of a request (HTTP status >= 400)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.describe())]
pub struct ApiError {
    /// HTTP status code of the response
    pub status: u16,
    /// Decoded problem details, if the body had that shape
    pub problem: Option<ProblemDetails>,
    /// Raw response body
    pub body: String,
}

impl ApiError {
    /// Classify an error response body
    ///
    /// The body is decoded as [`ProblemDetails`] when possible; otherwise
    /// only the status and raw body are kept.
    pub fn from_response(status: u16, body: String) -> Self {
        let problem = serde_json::from_str::<ProblemDetails>(&body)
            .ok()
            .filter(|p| !p.is_empty());

        Self {
            status,
            problem,
            body,
        }
    }

    /// Get the problem title
    pub fn title(&self) -> Option<&str> {
        self.problem.as_ref().map(|p| p.title.as_str())
    }

    /// Get the problem detail
    pub fn detail(&self) -> Option<&str> {
        self.problem.as_ref().map(|p| p.detail.as_str())
    }

    /// Get the provider error code
    pub fn code(&self) -> Option<&str> {
        self.problem.as_ref().and_then(|p| p.code.as_deref())
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Check if this error is transient
    ///
    /// Returns `true` for rate limiting (429) and server errors (5xx). No
    /// retry is performed by this crate.
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.is_server_error()
    }

    fn describe(&self) -> String {
        match &self.problem {
            Some(problem) => format!(
                "{} - {} (code: {}, status: {})",
                problem.title,
                problem.detail,
                problem.code.as_deref().unwrap_or("none"),
                problem.status.unwrap_or(self.status)
            ),
            None => format!("status code {}, body: {}", self.status, self.body),
        }
    }
}

/// RFC 7807 problem details returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProblemDetails {
    /// Problem type URI
    #[serde(default, rename = "type")]
    pub problem_type: Option<String>,
    /// Short summary
    #[serde(default)]
    pub title: String,
    /// Status code as reported in the body
    #[serde(default)]
    pub status: Option<u16>,
    /// Human-readable explanation
    #[serde(default)]
    pub detail: String,
    /// Request path the problem refers to
    #[serde(default)]
    pub instance: Option<String>,
    /// Provider error code
    #[serde(default)]
    pub code: Option<String>,
}

impl ProblemDetails {
    // `{}` decodes fine with all-default fields; treat that as no problem payload
    fn is_empty(&self) -> bool {
        self.title.is_empty() && self.detail.is_empty() && self.code.is_none()
    }
}
