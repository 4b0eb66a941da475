//! Vipps MobilePay webhook handling
//!
//! Webhooks are HTTP notifications that Vipps MobilePay sends when a payment
//! changes state (created, authorized, captured, refunded, ...).
//!
//! See <https://developer.vippsmobilepay.com/docs/APIs/webhooks-api/> for the
//! official documentation.
//!
//! # Request Lifecycle
//!
//! Each delivery goes `received -> signature-checked -> body-decoded ->
//! dispatched -> acknowledged`, stopping at the first failure:
//!
//! | Step | Failure | Status |
//! |------|---------|--------|
//! | Method check | not POST | 405 |
//! | Signature check | [`SignatureError`] | 400 |
//! | Body decode | not a [`WebhookEvent`] | 400 |
//! | Dispatch | no handler, or handler error | 500 |
//!
//! A 500 makes the provider retry the delivery. Success answers 200 with an
//! empty body.
//!
//! # Example
//!
//! ```no_run
//! use vipps_mobilepay::webhook::{
//!     create_webhook_router, EventRouter, SignatureVerifier, SigningScheme, WebhookEndpoint,
//!     WebhookEvent,
//! };
//! use vipps_mobilepay::EventName;
//!
//! let mut router = EventRouter::new();
//! router.register(EventName::Captured, |event: WebhookEvent| async move {
//!     println!("captured {}", event.reference);
//!     anyhow::Ok(())
//! });
//!
//! let verifier = SignatureVerifier::new(b"secret", SigningScheme::CanonicalString);
//! let endpoint = WebhookEndpoint::new(Some(verifier), router);
//! let app: axum::Router = create_webhook_router("/webhooks/vipps", endpoint);
//! ```

pub mod error;
pub mod router;
pub mod signature;
pub mod types;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::any;
use axum::Router;
pub use error::{Error, RouteError, SignatureError};
pub use router::{EventHandler, EventRouter};
pub use signature::{SignatureVerifier, SigningScheme};
use tracing::{debug, error, info, warn};
pub use types::WebhookEvent;

/// Read-only view of an inbound HTTP request
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// HTTP method
    pub method: Method,
    /// Path component of the request URI
    pub path: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl InboundRequest {
    /// Create a request view
    pub fn new(
        method: Method,
        path: impl Into<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body,
        }
    }
}

/// Verifies, decodes and dispatches webhook deliveries
///
/// Cheap to clone; the verifier and router are shared.
#[derive(Debug, Clone)]
pub struct WebhookEndpoint {
    verifier: Option<Arc<SignatureVerifier>>,
    router: Arc<EventRouter>,
}

impl WebhookEndpoint {
    /// Create an endpoint
    ///
    /// Without a verifier every delivery is accepted unverified.
    pub fn new(verifier: Option<SignatureVerifier>, router: EventRouter) -> Self {
        if verifier.is_none() {
            warn!("No Vipps webhook secret configured, signatures will not be verified");
        }

        Self {
            verifier: verifier.map(Arc::new),
            router: Arc::new(router),
        }
    }

    /// Process a delivery
    ///
    /// The error's [`Error::status_code`] is the status to answer with.
    pub async fn handle(&self, request: &InboundRequest) -> Result<(), Error> {
        if request.method != Method::POST {
            debug!("Rejecting {} webhook request", request.method);
            return Err(Error::MethodNotAllowed(request.method.clone()));
        }

        match &self.verifier {
            Some(verifier) => verifier.verify(request).map_err(|e| {
                warn!("Webhook signature verification failed: {}", e);
                e
            })?,
            None => warn!("Skipping webhook signature verification, no secret configured"),
        }

        let event: WebhookEvent = serde_json::from_slice(&request.body).map_err(|e| {
            warn!("Failed to parse webhook event: {}", e);
            e
        })?;

        debug!("Received webhook: {} - {}", event.name, event.reference);

        self.router.dispatch(event).await.map_err(|e| {
            error!("Webhook dispatch failed: {}", e);
            e
        })
    }

    /// Process a delivery and return the status to answer with
    pub async fn respond(&self, request: &InboundRequest) -> StatusCode {
        match self.handle(request).await {
            Ok(()) => StatusCode::OK,
            Err(e) => e.status_code(),
        }
    }
}

/// Handle a webhook delivery
async fn handle_webhook(
    State(endpoint): State<WebhookEndpoint>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let request = InboundRequest::new(method, uri.path(), headers, body);
    endpoint.respond(&request).await
}

/// Create an Axum router for Vipps MobilePay webhooks
///
/// Every method is routed to the endpoint, which answers 405 for anything
/// but POST.
pub fn create_webhook_router(endpoint: &str, webhook: WebhookEndpoint) -> Router {
    info!("Vipps webhook router mounted at {}", endpoint);

    Router::new()
        .route(endpoint, any(handle_webhook))
        .with_state(webhook)
}
