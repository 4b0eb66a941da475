//! Webhook signature verification
//!
//! Vipps MobilePay signs webhook deliveries with the secret returned when the
//! webhook was registered. Two schemes exist:
//!
//! - **Body HMAC** (`body_hmac`): `X-Vipps-Signature` carries the base64
//!   HMAC-SHA256 of the raw body.
//! - **Canonical string** (`canonical_string`): the body hash goes in
//!   `X-Ms-Content-Sha256`, and the `Authorization` header carries the HMAC of
//!   `METHOD\nPATH\nDATE;HOST;CONTENT_HASH`:
//!
//! ```text
//! HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature=<base64>
//! ```
//!
//! See <https://developer.vippsmobilepay.com/docs/APIs/webhooks-api/request-authentication/>.

use std::fmt;
use std::str::FromStr;

use axum::http::{HeaderMap, Method};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::{digest, hmac};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::SignatureError;
use super::InboundRequest;

/// Body HMAC signature header
pub const SIGNATURE_HEADER: &str = "X-Vipps-Signature";
/// Body hash header
pub const CONTENT_HASH_HEADER: &str = "X-Ms-Content-Sha256";
/// Date header included in the canonical string
pub const DATE_HEADER: &str = "X-Ms-Date";
/// Preferred authorization header
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Fallback authorization header
pub const VIPPS_AUTHORIZATION_HEADER: &str = "X-Vipps-Authorization";
/// Host header set by proxies
pub const FORWARDED_HOST_HEADER: &str = "X-Forwarded-Host";
/// Host header
pub const HOST_HEADER: &str = "Host";

const AUTHORIZATION_PREFIX: &str =
    "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature=";

/// Webhook signing scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningScheme {
    /// HMAC over the raw body in `X-Vipps-Signature`
    BodyHmac,
    /// HMAC over the canonical request string in `Authorization`
    #[default]
    CanonicalString,
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningScheme::BodyHmac => f.write_str("body_hmac"),
            SigningScheme::CanonicalString => f.write_str("canonical_string"),
        }
    }
}

impl FromStr for SigningScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "body_hmac" => Ok(SigningScheme::BodyHmac),
            "canonical_string" => Ok(SigningScheme::CanonicalString),
            other => Err(format!("unknown signing scheme: {}", other)),
        }
    }
}

/// Base64 SHA-256 of a body, as sent in `X-Ms-Content-Sha256`
pub fn content_hash(body: &[u8]) -> String {
    BASE64.encode(digest::digest(&digest::SHA256, body))
}

/// Canonical string signed by the canonical-string scheme
pub fn canonical_string(
    method: &Method,
    path: &str,
    date: &str,
    host: &str,
    content_hash: &str,
) -> String {
    format!(
        "{}\n{}\n{};{};{}",
        method.as_str(),
        path,
        date,
        host,
        content_hash
    )
}

/// Verifies inbound webhook signatures
///
/// The secret cannot be read back or changed; build a new verifier to rotate.
pub struct SignatureVerifier {
    key: hmac::Key,
    scheme: SigningScheme,
}

impl SignatureVerifier {
    /// Create a verifier for `secret`
    pub fn new(secret: &[u8], scheme: SigningScheme) -> Self {
        info!("Webhook signature verification using {} scheme", scheme);

        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            scheme,
        }
    }

    /// Active scheme
    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    /// Verify a request with the active scheme
    ///
    /// Borrows the body; it stays available for decoding.
    pub fn verify(&self, request: &InboundRequest) -> Result<(), SignatureError> {
        match self.scheme {
            SigningScheme::BodyHmac => self.verify_body_hmac(&request.headers, &request.body),
            SigningScheme::CanonicalString => self.verify_canonical_string(
                &request.method,
                &request.path,
                &request.headers,
                &request.body,
            ),
        }?;

        debug!("Webhook signature verified");
        Ok(())
    }

    /// Verify `X-Vipps-Signature` against the body
    pub fn verify_body_hmac(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let signature =
            header_str(headers, SIGNATURE_HEADER).ok_or(SignatureError::MissingSignature)?;

        let signature = BASE64
            .decode(signature)
            .map_err(|_| SignatureError::MalformedSignature)?;

        hmac::verify(&self.key, body, &signature).map_err(|_| SignatureError::InvalidSignature)
    }

    /// Verify the content hash and canonical-string authorization
    pub fn verify_canonical_string(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let declared_hash =
            header_str(headers, CONTENT_HASH_HEADER).ok_or(SignatureError::MissingContentHash)?;

        let computed_hash = content_hash(body);
        if declared_hash != computed_hash {
            return Err(SignatureError::ContentHashMismatch);
        }

        let authorization = header_str(headers, AUTHORIZATION_HEADER)
            .or_else(|| header_str(headers, VIPPS_AUTHORIZATION_HEADER))
            .ok_or(SignatureError::MissingAuthorization)?;

        let host = header_str(headers, FORWARDED_HOST_HEADER)
            .or_else(|| header_str(headers, HOST_HEADER))
            .unwrap_or_default();
        let date = header_str(headers, DATE_HEADER).unwrap_or_default();

        let expected = self.authorization_header(&canonical_string(
            method,
            path,
            date,
            host,
            &computed_hash,
        ));

        if authorization != expected {
            return Err(SignatureError::ValidationFailed);
        }

        Ok(())
    }

    /// Body HMAC signature for `X-Vipps-Signature`
    pub fn sign_body(&self, body: &[u8]) -> String {
        BASE64.encode(hmac::sign(&self.key, body))
    }

    /// Authorization header value for a request signed with the canonical-string scheme
    pub fn authorization_for(
        &self,
        method: &Method,
        path: &str,
        date: &str,
        host: &str,
        body: &[u8],
    ) -> String {
        self.authorization_header(&canonical_string(
            method,
            path,
            date,
            host,
            &content_hash(body),
        ))
    }

    fn authorization_header(&self, canonical: &str) -> String {
        let signature = BASE64.encode(hmac::sign(&self.key, canonical.as_bytes()));
        format!("{}{}", AUTHORIZATION_PREFIX, signature)
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

/// Non-empty header value
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
