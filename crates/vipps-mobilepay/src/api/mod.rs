//! Vipps MobilePay API client
//!
//! This module implements the authenticated request path shared by every
//! Vipps MobilePay REST call, plus thin typed wrappers for the ePayment and
//! Webhooks APIs.
//! See <https://developer.vippsmobilepay.com/api/> for the complete API reference.
//!
//! # Endpoints
//!
//! ## Access Token
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/accesstoken/get` | Obtain a bearer token from client credentials |
//!
//! ## ePayment
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/epayment/v1/payments` | Create a payment |
//! | GET | `/epayment/v1/payments/{reference}` | Get payment details |
//! | GET | `/epayment/v1/payments/{reference}/events` | Get the payment event log |
//! | POST | `/epayment/v1/payments/{reference}/capture` | Capture an authorized payment |
//! | POST | `/epayment/v1/payments/{reference}/refund` | Refund a captured payment |
//! | POST | `/epayment/v1/payments/{reference}/cancel` | Cancel a payment |
//! | POST | `/epayment/v1/test/payments/{reference}/approve` | Force approve (test only) |
//!
//! ## Webhooks
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/webhooks/v1/webhooks` | Register a webhook |
//! | GET | `/webhooks/v1/webhooks` | List webhooks |
//! | GET | `/webhooks/v1/webhooks/{id}` | Get a webhook |
//! | DELETE | `/webhooks/v1/webhooks/{id}` | Delete a webhook |
//!
//! # Authentication
//!
//! Every request carries `Authorization: Bearer <token>`,
//! `Ocp-Apim-Subscription-Key` and `Merchant-Serial-Number`. The token is
//! obtained and refreshed by [`TokenManager`]; callers never handle it.
//!
//! # Idempotency
//!
//! Write operations accept an optional idempotency key. When none is given a
//! fresh UUID v4 is used, so each call is a distinct logical operation. Pass
//! the same key again to retry an operation safely; the provider treats the
//! repeated request as a duplicate.

pub mod error;
pub mod payment;
pub mod token;
pub mod types;
pub mod webhooks;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use error::{ApiError, Error};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use token::{Credentials, TokenManager};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::VippsConfig;

/// Base URL of the test environment
pub const TEST_BASE_URL: &str = "https://apitest.vipps.no";
/// Base URL of the production environment
pub const PRODUCTION_BASE_URL: &str = "https://api.vipps.no";
/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Header carrying the idempotency key
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Generate a fresh idempotency key
pub fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

/// Make `url` a directory so relative joins append below its path
fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Resolve an endpoint path below `base`, keeping any path prefix of the base
///
/// `https://gw.example/vipps` and `https://gw.example/vipps/` both resolve
/// `/accesstoken/get` to `https://gw.example/vipps/accesstoken/get`.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    directory_url(base.clone()).join(path.trim_start_matches('/'))
}

/// System information sent with every request
///
/// Vipps uses these headers to identify the integration in their logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// `Vipps-System-Name`
    pub name: String,
    /// `Vipps-System-Version`
    pub version: String,
    /// `Vipps-System-Plugin-Name`
    pub plugin_name: Option<String>,
    /// `Vipps-System-Plugin-Version`
    pub plugin_version: Option<String>,
}

impl SystemInfo {
    /// Override fields with the non-empty values given
    pub fn merge(
        mut self,
        name: &str,
        version: &str,
        plugin_name: &str,
        plugin_version: &str,
    ) -> Self {
        if !name.is_empty() {
            self.name = name.to_string();
        }
        if !version.is_empty() {
            self.version = version.to_string();
        }
        if !plugin_name.is_empty() {
            self.plugin_name = Some(plugin_name.to_string());
        }
        if !plugin_version.is_empty() {
            self.plugin_version = Some(plugin_version.to_string());
        }
        self
    }
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            plugin_name: None,
            plugin_version: None,
        }
    }
}

/// Raw API response
///
/// JSON decoding into a domain type is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Raw response body
    pub body: Bytes,
}

impl ApiResponse {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Vipps MobilePay API client
#[derive(Debug, Clone)]
pub struct VippsApi {
    base_url: Url,
    client: Client,
    tokens: Arc<TokenManager>,
    system: SystemInfo,
    test_mode: bool,
}

impl VippsApi {
    /// Create a new Vipps MobilePay API client
    ///
    /// `api_url` overrides the environment base URL chosen by `test_mode`.
    pub fn new(
        credentials: Credentials,
        test_mode: bool,
        api_url: Option<&str>,
        timeout_ms: u64,
    ) -> Result<Self, Error> {
        let default_url = if test_mode {
            TEST_BASE_URL
        } else {
            PRODUCTION_BASE_URL
        };
        let base_url = directory_url(Url::parse(api_url.unwrap_or(default_url))?);

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        let tokens = TokenManager::new(client.clone(), &base_url, credentials)?;

        Ok(Self {
            base_url,
            client,
            tokens: Arc::new(tokens),
            system: SystemInfo::default(),
            test_mode,
        })
    }

    /// Create a client from configuration
    pub fn from_config(config: &VippsConfig) -> Result<Self, Error> {
        let api = Self::new(
            config.credentials(),
            config.test_mode,
            config.api_url.as_deref(),
            config.timeout_ms,
        )?;

        Ok(api.with_system_info(config.system_info()))
    }

    /// Set the system information headers
    pub fn with_system_info(mut self, system: SystemInfo) -> Self {
        self.system = system;
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check if the client targets the test environment
    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Get the token manager
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Obtain an access token now
    ///
    /// Useful at startup to fail fast on bad credentials. Later calls refresh
    /// the token on their own.
    pub async fn authenticate(&self) -> Result<(), Error> {
        self.tokens.refresh().await?;
        Ok(())
    }

    /// Send an authenticated request
    ///
    /// The body is sent as JSON when present and omitted otherwise. The
    /// idempotency key is attached verbatim when non-empty. Responses with
    /// status >= 400 become [`ApiError`], which keeps the status and raw body.
    pub async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency_key: Option<&str>,
    ) -> Result<ApiResponse, Error>
    where
        B: Serialize + ?Sized,
    {
        let token = self.tokens.ensure_valid().await?;

        let url = endpoint_url(&self.base_url, path)?;
        debug!("{} {}", method, url);

        let credentials = self.tokens.credentials();
        let mut request = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .header("Ocp-Apim-Subscription-Key", &credentials.subscription_key)
            .header("Merchant-Serial-Number", &credentials.merchant_serial_number)
            .header("Vipps-System-Name", &self.system.name)
            .header("Vipps-System-Version", &self.system.version);

        if let Some(plugin_name) = &self.system.plugin_name {
            request = request.header("Vipps-System-Plugin-Name", plugin_name);
        }
        if let Some(plugin_version) = &self.system.plugin_version {
            request = request.header("Vipps-System-Plugin-Version", plugin_version);
        }

        if let Some(key) = idempotency_key.filter(|key| !key.is_empty()) {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.as_u16() >= 400 {
            let text = String::from_utf8_lossy(&body).into_owned();
            warn!("Vipps API error: {} - {}", status, text);
            return Err(ApiError::from_response(status.as_u16(), text).into());
        }

        Ok(ApiResponse { status, body })
    }

    /// Make a GET request and decode the JSON response
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.execute::<()>(Method::GET, path, None, None)
            .await?
            .json()
    }

    /// Make a POST request and decode the JSON response
    async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body), idempotency_key)
            .await?
            .json()
    }

    /// Make a DELETE request
    async fn delete(&self, path: &str) -> Result<(), Error> {
        self.execute::<()>(Method::DELETE, path, None, None).await?;
        Ok(())
    }
}
