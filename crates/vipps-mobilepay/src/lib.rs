//! Vipps MobilePay ePayment client with webhook verification and event routing
//!
//! - [`VippsApi`] sends authenticated requests. The access token is fetched
//!   and refreshed by [`TokenManager`] right before each call.
//! - [`webhook::WebhookEndpoint`] verifies inbound webhook signatures, decodes
//!   the event and dispatches it through a [`webhook::EventRouter`].
//!
//! ```no_run
//! use vipps_mobilepay::{Amount, VippsApi, VippsConfig};
//!
//! # async fn run() -> Result<(), vipps_mobilepay::api::error::Error> {
//! let config = VippsConfig::default().from_env();
//! let api = VippsApi::from_config(&config)?;
//!
//! api.capture_payment("order-1", &Amount::nok(1000).into(), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod api;
pub mod config;
pub mod env_vars;
pub mod webhook;

pub use api::error::{ApiError, AuthError, Error};
pub use api::token::{Credentials, TokenManager};
pub use api::types::{Amount, EventKind, EventName};
pub use api::{ApiResponse, SystemInfo, VippsApi};
pub use config::VippsConfig;
pub use webhook::{create_webhook_router, EventRouter, SignatureVerifier, WebhookEndpoint};
