//! Configuration types for the Vipps MobilePay integration

use serde::{Deserialize, Serialize};

use crate::api::token::Credentials;
use crate::api::{SystemInfo, DEFAULT_TIMEOUT_MS};
use crate::webhook::{SignatureVerifier, SigningScheme};

/// Vipps MobilePay configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct VippsConfig {
    /// Client id from the merchant portal
    #[serde(default)]
    pub client_id: String,
    /// Client secret from the merchant portal
    #[serde(default)]
    pub client_secret: String,
    /// `Ocp-Apim-Subscription-Key`
    #[serde(default)]
    pub subscription_key: String,
    /// Merchant serial number (MSN)
    #[serde(default)]
    pub merchant_serial_number: String,
    /// Use the test environment
    /// Default is true
    #[serde(default = "default_test_mode")]
    pub test_mode: bool,
    /// Override the base URL chosen by `test_mode`
    #[serde(default)]
    pub api_url: Option<String>,
    /// Request timeout in milliseconds
    /// Default is 30000
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// `Vipps-System-Name`, defaults to the crate name
    #[serde(default)]
    pub system_name: Option<String>,
    /// `Vipps-System-Version`, defaults to the crate version
    #[serde(default)]
    pub system_version: Option<String>,
    /// `Vipps-System-Plugin-Name`
    #[serde(default)]
    pub system_plugin_name: Option<String>,
    /// `Vipps-System-Plugin-Version`
    #[serde(default)]
    pub system_plugin_version: Option<String>,
    /// Secret returned when the webhook was registered
    /// Verification is skipped when unset
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Signing scheme used by inbound webhooks
    #[serde(default)]
    pub signing_scheme: SigningScheme,
}

fn default_test_mode() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for VippsConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            subscription_key: String::new(),
            merchant_serial_number: String::new(),
            test_mode: default_test_mode(),
            api_url: None,
            timeout_ms: default_timeout_ms(),
            system_name: None,
            system_version: None,
            system_plugin_name: None,
            system_plugin_version: None,
            webhook_secret: None,
            signing_scheme: SigningScheme::default(),
        }
    }
}

impl VippsConfig {
    /// API credentials
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            &self.client_id,
            &self.client_secret,
            &self.subscription_key,
            &self.merchant_serial_number,
        )
    }

    /// System information headers
    ///
    /// Unset or empty fields keep their defaults.
    pub fn system_info(&self) -> SystemInfo {
        SystemInfo::default().merge(
            self.system_name.as_deref().unwrap_or_default(),
            self.system_version.as_deref().unwrap_or_default(),
            self.system_plugin_name.as_deref().unwrap_or_default(),
            self.system_plugin_version.as_deref().unwrap_or_default(),
        )
    }

    /// Webhook signature verifier, if a secret is configured
    pub fn signature_verifier(&self) -> Option<SignatureVerifier> {
        self.webhook_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .map(|secret| SignatureVerifier::new(secret.as_bytes(), self.signing_scheme))
    }
}

impl std::fmt::Debug for VippsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VippsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("subscription_key", &"[redacted]")
            .field("merchant_serial_number", &self.merchant_serial_number)
            .field("test_mode", &self.test_mode)
            .field("api_url", &self.api_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("system_name", &self.system_name)
            .field("system_version", &self.system_version)
            .field("system_plugin_name", &self.system_plugin_name)
            .field("system_plugin_version", &self.system_plugin_version)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("signing_scheme", &self.signing_scheme)
            .finish()
    }
}
