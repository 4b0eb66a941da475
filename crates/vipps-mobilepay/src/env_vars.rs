//! Vipps MobilePay environment variables

use std::env;

use crate::config::VippsConfig;

/// Client id
pub const ENV_VIPPS_CLIENT_ID: &str = "VIPPS_CLIENT_ID";
/// Client secret
pub const ENV_VIPPS_CLIENT_SECRET: &str = "VIPPS_CLIENT_SECRET";
/// Subscription key
pub const ENV_VIPPS_SUBSCRIPTION_KEY: &str = "VIPPS_SUBSCRIPTION_KEY";
/// Merchant serial number
pub const ENV_VIPPS_MSN: &str = "VIPPS_MSN";
/// `true` for the test environment
pub const ENV_VIPPS_TEST_MODE: &str = "VIPPS_TEST_MODE";
/// Base URL override
pub const ENV_VIPPS_API_URL: &str = "VIPPS_API_URL";
/// Request timeout in milliseconds
pub const ENV_VIPPS_TIMEOUT_MS: &str = "VIPPS_TIMEOUT_MS";

// System information headers
/// System name header
pub const ENV_VIPPS_SYSTEM_NAME: &str = "VIPPS_SYSTEM_NAME";
/// System version header
pub const ENV_VIPPS_SYSTEM_VERSION: &str = "VIPPS_SYSTEM_VERSION";
/// Plugin name header
pub const ENV_VIPPS_SYSTEM_PLUGIN_NAME: &str = "VIPPS_SYSTEM_PLUGIN_NAME";
/// Plugin version header
pub const ENV_VIPPS_SYSTEM_PLUGIN_VERSION: &str = "VIPPS_SYSTEM_PLUGIN_VERSION";

// Webhook verification
/// Webhook signing secret
pub const ENV_VIPPS_WEBHOOK_SECRET: &str = "VIPPS_WEBHOOK_SECRET";
/// `body_hmac` or `canonical_string`
pub const ENV_VIPPS_SIGNING_SCHEME: &str = "VIPPS_SIGNING_SCHEME";

impl VippsConfig {
    /// Overlay `VIPPS_*` environment variables
    ///
    /// Unparseable values leave the current setting untouched.
    pub fn from_env(mut self) -> Self {
        if let Ok(client_id) = env::var(ENV_VIPPS_CLIENT_ID) {
            self.client_id = client_id;
        }

        if let Ok(client_secret) = env::var(ENV_VIPPS_CLIENT_SECRET) {
            self.client_secret = client_secret;
        }

        if let Ok(subscription_key) = env::var(ENV_VIPPS_SUBSCRIPTION_KEY) {
            self.subscription_key = subscription_key;
        }

        if let Ok(msn) = env::var(ENV_VIPPS_MSN) {
            self.merchant_serial_number = msn;
        }

        if let Ok(test_mode_str) = env::var(ENV_VIPPS_TEST_MODE) {
            if let Ok(test_mode) = test_mode_str.trim().parse::<bool>() {
                self.test_mode = test_mode;
            }
        }

        if let Ok(api_url) = env::var(ENV_VIPPS_API_URL) {
            self.api_url = Some(api_url).filter(|url| !url.is_empty());
        }

        if let Ok(timeout_str) = env::var(ENV_VIPPS_TIMEOUT_MS) {
            if let Ok(timeout_ms) = timeout_str.trim().parse::<u64>() {
                self.timeout_ms = timeout_ms;
            }
        }

        if let Ok(name) = env::var(ENV_VIPPS_SYSTEM_NAME) {
            self.system_name = Some(name);
        }

        if let Ok(version) = env::var(ENV_VIPPS_SYSTEM_VERSION) {
            self.system_version = Some(version);
        }

        if let Ok(plugin_name) = env::var(ENV_VIPPS_SYSTEM_PLUGIN_NAME) {
            self.system_plugin_name = Some(plugin_name);
        }

        if let Ok(plugin_version) = env::var(ENV_VIPPS_SYSTEM_PLUGIN_VERSION) {
            self.system_plugin_version = Some(plugin_version);
        }

        if let Ok(secret) = env::var(ENV_VIPPS_WEBHOOK_SECRET) {
            self.webhook_secret = Some(secret);
        }

        if let Ok(scheme_str) = env::var(ENV_VIPPS_SIGNING_SCHEME) {
            if let Ok(scheme) = scheme_str.parse() {
                self.signing_scheme = scheme;
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::SigningScheme;

    const ALL: [&str; 13] = [
        ENV_VIPPS_CLIENT_ID,
        ENV_VIPPS_CLIENT_SECRET,
        ENV_VIPPS_SUBSCRIPTION_KEY,
        ENV_VIPPS_MSN,
        ENV_VIPPS_TEST_MODE,
        ENV_VIPPS_API_URL,
        ENV_VIPPS_TIMEOUT_MS,
        ENV_VIPPS_SYSTEM_NAME,
        ENV_VIPPS_SYSTEM_VERSION,
        ENV_VIPPS_SYSTEM_PLUGIN_NAME,
        ENV_VIPPS_SYSTEM_PLUGIN_VERSION,
        ENV_VIPPS_WEBHOOK_SECRET,
        ENV_VIPPS_SIGNING_SCHEME,
    ];

    // Both cases live in one test since the process environment is shared
    #[test]
    fn test_from_env() {
        for var in ALL {
            env::remove_var(var);
        }

        env::set_var(ENV_VIPPS_CLIENT_ID, "id");
        env::set_var(ENV_VIPPS_CLIENT_SECRET, "secret");
        env::set_var(ENV_VIPPS_SUBSCRIPTION_KEY, "sub");
        env::set_var(ENV_VIPPS_MSN, "654321");
        env::set_var(ENV_VIPPS_TEST_MODE, "false");
        env::set_var(ENV_VIPPS_API_URL, "http://localhost:8080");
        env::set_var(ENV_VIPPS_TIMEOUT_MS, "5000");
        env::set_var(ENV_VIPPS_SYSTEM_NAME, "shop");
        env::set_var(ENV_VIPPS_WEBHOOK_SECRET, "hook");
        env::set_var(ENV_VIPPS_SIGNING_SCHEME, "body_hmac");

        let config = VippsConfig::default().from_env();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.subscription_key, "sub");
        assert_eq!(config.merchant_serial_number, "654321");
        assert!(!config.test_mode);
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.system_info().name, "shop");
        assert_eq!(config.webhook_secret.as_deref(), Some("hook"));
        assert_eq!(config.signing_scheme, SigningScheme::BodyHmac);

        // Invalid values keep what was there
        env::set_var(ENV_VIPPS_TEST_MODE, "maybe");
        env::set_var(ENV_VIPPS_TIMEOUT_MS, "soon");
        env::set_var(ENV_VIPPS_SIGNING_SCHEME, "rot13");

        let config = VippsConfig::default().from_env();
        assert!(config.test_mode);
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.signing_scheme, SigningScheme::CanonicalString);

        for var in ALL {
            env::remove_var(var);
        }
    }
}
