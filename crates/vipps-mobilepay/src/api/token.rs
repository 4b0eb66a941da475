//! Access token lifecycle
//!
//! The Vipps MobilePay access token is short-lived (typically one hour in the
//! test environment and 24 hours in production). [`TokenManager`] owns the
//! token and its expiry and is the single place that decides whether the token
//! is usable. Every authenticated call goes through
//! [`TokenManager::ensure_valid`] right before it sends the request.
//!
//! See <https://developer.vippsmobilepay.com/docs/APIs/access-token-api/>.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::endpoint_url;
use super::error::AuthError;

/// Token endpoint path
pub const ACCESS_TOKEN_PATH: &str = "/accesstoken/get";

/// API credentials
///
/// Immutable after the client is constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// `Ocp-Apim-Subscription-Key`
    pub subscription_key: String,
    /// `Merchant-Serial-Number`
    pub merchant_serial_number: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        subscription_key: impl Into<String>,
        merchant_serial_number: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            subscription_key: subscription_key.into(),
            merchant_serial_number: merchant_serial_number.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_key", &"<redacted>")
            .field("merchant_serial_number", &self.merchant_serial_number)
            .finish()
    }
}

/// Token endpoint response
#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    expires_in: ExpiresIn,
    #[serde(default)]
    token_type: Option<String>,
}

/// `expires_in` is documented as a string but numbers are accepted too
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Result<u64, AuthError> {
        match self {
            ExpiresIn::Seconds(secs) => Ok(*secs),
            ExpiresIn::Text(text) => text
                .trim()
                .parse::<u64>()
                .map_err(|_| AuthError::InvalidExpiresIn(text.clone())),
        }
    }
}

/// Token and expiry, always replaced together
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_valid_at(&self, now: Instant) -> bool {
        !self.value.is_empty() && now < self.expires_at
    }
}

/// Owns the access token and refreshes it on demand
///
/// The token state sits behind an async mutex that is held for the whole
/// check-refresh-store sequence, so concurrent callers never observe a half
/// written `{token, expiry}` pair and wait for an in-flight refresh instead of
/// starting their own.
pub struct TokenManager {
    client: Client,
    token_url: Url,
    credentials: Credentials,
    state: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    /// Create a token manager for the API at `base_url`
    pub fn new(
        client: Client,
        base_url: &Url,
        credentials: Credentials,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            token_url: endpoint_url(base_url, ACCESS_TOKEN_PATH)?,
            credentials,
            state: Mutex::new(None),
        })
    }

    /// Get the credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Check if a token is present and not yet expired
    pub async fn is_valid(&self) -> bool {
        self.state
            .lock()
            .await
            .as_ref()
            .is_some_and(|token| token.is_valid_at(Instant::now()))
    }

    /// Make sure a valid token is available and return it
    ///
    /// Refreshes the token if it is missing or expired. The returned token is
    /// the one that was validated; callers must not cache it across requests.
    pub async fn ensure_valid(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.as_ref() {
            if token.is_valid_at(Instant::now()) {
                return Ok(token.value.clone());
            }
            debug!("Access token expired, refreshing");
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *state = Some(token);

        Ok(value)
    }

    /// Fetch a new token regardless of the current one
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        let token = self.fetch().await?;
        *state = Some(token);
        Ok(())
    }

    /// Request a token from the token endpoint
    ///
    /// Does not touch the stored state; a failed fetch leaves the previous
    /// token in place.
    async fn fetch(&self) -> Result<AccessToken, AuthError> {
        debug!("POST {}", self.token_url);

        let response = self
            .client
            .post(self.token_url.clone())
            .header("Content-Type", "application/json")
            .header("client_id", &self.credentials.client_id)
            .header("client_secret", &self.credentials.client_secret)
            .header("Ocp-Apim-Subscription-Key", &self.credentials.subscription_key)
            .header("Merchant-Serial-Number", &self.credentials.merchant_serial_number)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("Access token request rejected: {} - {}", status, text);
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let issued_at = Instant::now();
        let body: AccessTokenResponse = serde_json::from_str(&text)?;

        if body.access_token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let expires_in = body.expires_in.seconds()?;
        let expires_at = issued_at
            .checked_add(Duration::from_secs(expires_in))
            .ok_or_else(|| AuthError::InvalidExpiresIn(expires_in.to_string()))?;

        info!(
            "Obtained {} access token valid for {}s",
            body.token_type.as_deref().unwrap_or("Bearer"),
            expires_in
        );

        Ok(AccessToken {
            value: body.access_token,
            expires_at,
        })
    }

    #[cfg(test)]
    pub(crate) async fn expires_at(&self) -> Option<Instant> {
        self.state.lock().await.as_ref().map(|t| t.expires_at)
    }

    #[cfg(test)]
    pub(crate) async fn current_token(&self) -> Option<String> {
        self.state.lock().await.as_ref().map(|t| t.value.clone())
    }

    #[cfg(test)]
    pub(crate) async fn expire_now(&self) {
        if let Some(token) = self.state.lock().await.as_mut() {
            token.expires_at = Instant::now();
        }
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("client-id", "client-secret", "sub-key", "123456")
    }

    async fn manager(server: &mockito::ServerGuard) -> TokenManager {
        let base_url = Url::parse(&server.url()).unwrap();
        TokenManager::new(Client::new(), &base_url, credentials()).unwrap()
    }

    #[tokio::test]
    async fn test_ensure_valid_fetches_and_stores_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .match_header("client_id", "client-id")
            .match_header("client_secret", "client-secret")
            .match_header("Ocp-Apim-Subscription-Key", "sub-key")
            .match_header("Merchant-Serial-Number", "123456")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer","expires_in":"3600","access_token":"tok-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = manager(&server).await;
        assert!(!tokens.is_valid().await);

        let before = Instant::now();
        let token = tokens.ensure_valid().await.unwrap();
        let after = Instant::now();

        assert_eq!(token, "tok-1");
        assert!(tokens.is_valid().await);

        let expires_at = tokens.expires_at().await.unwrap();
        assert!(expires_at >= before + Duration::from_secs(3600));
        assert!(expires_at <= after + Duration::from_secs(3600));

        // Still valid, no second request
        assert_eq!(tokens.ensure_valid().await.unwrap(), "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_numeric_expires_in_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":86400,"access_token":"tok"}"#)
            .create_async()
            .await;

        let tokens = manager(&server).await;
        tokens.ensure_valid().await.unwrap();
        assert!(tokens.is_valid().await);
    }

    #[tokio::test]
    async fn test_malformed_expires_in_keeps_previous_token() {
        let mut server = mockito::Server::new_async().await;
        let good = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":"3600","access_token":"tok-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = manager(&server).await;
        tokens.ensure_valid().await.unwrap();
        good.assert_async().await;
        good.remove_async().await;

        let bad = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":"soon","access_token":"tok-2"}"#)
            .expect(1)
            .create_async()
            .await;

        tokens.expire_now().await;
        let expires_before = tokens.expires_at().await;

        let err = tokens.ensure_valid().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidExpiresIn(ref v) if v == "soon"));

        // Neither half of the pair was overwritten
        assert_eq!(tokens.current_token().await.as_deref(), Some("tok-1"));
        assert_eq!(tokens.expires_at().await, expires_before);
        bad.assert_async().await;
    }

    #[tokio::test]
    async fn test_unrepresentable_expires_in_keeps_previous_token() {
        let mut server = mockito::Server::new_async().await;
        let good = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":"3600","access_token":"tok-1"}"#)
            .create_async()
            .await;

        let tokens = manager(&server).await;
        tokens.ensure_valid().await.unwrap();
        good.remove_async().await;

        let _huge = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"expires_in":"18446744073709551615","access_token":"tok-2"}"#)
            .create_async()
            .await;

        tokens.expire_now().await;
        let expires_before = tokens.expires_at().await;

        let err = tokens.ensure_valid().await.unwrap_err();
        assert!(
            matches!(err, AuthError::InvalidExpiresIn(ref v) if v == "18446744073709551615")
        );
        assert_eq!(tokens.current_token().await.as_deref(), Some("tok-1"));
        assert_eq!(tokens.expires_at().await, expires_before);
    }

    #[tokio::test]
    async fn test_rejected_token_request() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(401)
            .with_body(r#"{"error":"unauthorized_client"}"#)
            .create_async()
            .await;

        let tokens = manager(&server).await;
        let err = tokens.ensure_valid().await.unwrap_err();

        match err {
            AuthError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("unauthorized_client"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!tokens.is_valid().await);
    }

    #[tokio::test]
    async fn test_empty_access_token_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":"3600","access_token":""}"#)
            .create_async()
            .await;

        let tokens = manager(&server).await;
        assert!(matches!(
            tokens.ensure_valid().await,
            Err(AuthError::EmptyToken)
        ));
        assert!(!tokens.is_valid().await);
    }

    #[tokio::test]
    async fn test_zero_lifetime_token_is_never_valid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":"0","access_token":"tok"}"#)
            .expect(2)
            .create_async()
            .await;

        let tokens = manager(&server).await;
        tokens.ensure_valid().await.unwrap();
        assert!(!tokens.is_valid().await);

        // Expired immediately, so the next call refreshes again
        tokens.ensure_valid().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ACCESS_TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":"3600","access_token":"shared"}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = Arc::new(manager(&server).await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tokens = Arc::clone(&tokens);
                tokio::spawn(async move { tokens.ensure_valid().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
        mock.assert_async().await;
    }

    #[test]
    fn test_token_url_keeps_base_path() {
        let base_url = Url::parse("https://gw.example/vipps").unwrap();
        let tokens = TokenManager::new(Client::new(), &base_url, credentials()).unwrap();
        assert_eq!(
            tokens.token_url.as_str(),
            "https://gw.example/vipps/accesstoken/get"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("client-secret"));
        assert!(!debug.contains("sub-key"));
        assert!(debug.contains("client-id"));
    }
}
