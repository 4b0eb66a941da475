//! Event routing
//!
//! Handlers are registered per [`EventName`] before the router is handed to a
//! [`WebhookEndpoint`](super::WebhookEndpoint). Dispatch always ends in
//! exactly one of: the matching handler, the fallback, or [`RouteError`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::error::{Error, RouteError};
use super::types::WebhookEvent;
use crate::api::types::EventName;

/// Handles one kind of webhook event
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process an event
    async fn handle(&self, event: WebhookEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(WebhookEvent) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, event: WebhookEvent) -> anyhow::Result<()> {
        (self)(event).await
    }
}

/// Maps event names to handlers
#[derive(Default)]
pub struct EventRouter {
    handlers: HashMap<EventName, Arc<dyn EventHandler>>,
    fallback: Option<Arc<dyn EventHandler>>,
}

impl EventRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `name`, replacing any earlier one
    pub fn register<H>(&mut self, name: EventName, handler: H) -> &mut Self
    where
        H: EventHandler + 'static,
    {
        if self.handlers.insert(name, Arc::new(handler)).is_some() {
            debug!("Replaced webhook handler for {}", name);
        }
        self
    }

    /// Register the handler for events without a specific handler
    pub fn register_fallback<H>(&mut self, handler: H) -> &mut Self
    where
        H: EventHandler + 'static,
    {
        if self.fallback.replace(Arc::new(handler)).is_some() {
            debug!("Replaced fallback webhook handler");
        }
        self
    }

    /// Check if a specific handler is registered for `name`
    pub fn has_handler(&self, name: EventName) -> bool {
        self.handlers.contains_key(&name)
    }

    /// Check if a fallback handler is registered
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Dispatch an event to its handler
    ///
    /// Unrecognized event names only ever reach the fallback. Handler errors
    /// are returned as [`Error::Handler`].
    pub async fn dispatch(&self, event: WebhookEvent) -> Result<(), Error> {
        let handler = event
            .name
            .known()
            .and_then(|name| self.handlers.get(&name))
            .or(self.fallback.as_ref())
            .ok_or_else(|| RouteError(event.name.clone()))?;

        handler.handle(event).await.map_err(Error::Handler)
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().map(|name| name.as_str()).collect();
        names.sort_unstable();

        f.debug_struct("EventRouter")
            .field("handlers", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
