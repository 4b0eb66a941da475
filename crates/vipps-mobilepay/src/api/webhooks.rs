//! Webhooks API endpoints

use tracing::{debug, info};

use super::error::Error;
use super::types::{WebhookList, WebhookRegistration, WebhookRegistrationRequest};
use super::VippsApi;

const WEBHOOKS_PATH: &str = "/webhooks/v1/webhooks";

fn webhook_path(webhook_id: &str) -> String {
    format!("{}/{}", WEBHOOKS_PATH, urlencoding::encode(webhook_id))
}

impl VippsApi {
    // ==================== Webhook Endpoints ====================

    /// Register a webhook
    ///
    /// The returned registration carries the secret used to sign deliveries.
    /// It is only returned here, so store it.
    pub async fn register_webhook(
        &self,
        request: &WebhookRegistrationRequest,
    ) -> Result<WebhookRegistration, Error> {
        let registration: WebhookRegistration = self.post(WEBHOOKS_PATH, request, None).await?;
        info!("Registered webhook {} for {}", registration.id, request.url);
        Ok(registration)
    }

    /// Get all registered webhooks
    pub async fn get_webhooks(&self) -> Result<Vec<WebhookRegistration>, Error> {
        let response = self
            .execute::<()>(reqwest::Method::GET, WEBHOOKS_PATH, None, None)
            .await?;

        decode_webhook_list(&response.body)
    }

    /// Get a webhook by id
    pub async fn get_webhook(&self, webhook_id: &str) -> Result<WebhookRegistration, Error> {
        self.get(&webhook_path(webhook_id)).await
    }

    /// Delete a webhook
    pub async fn delete_webhook(&self, webhook_id: &str) -> Result<(), Error> {
        self.delete(&webhook_path(webhook_id)).await?;
        info!("Deleted webhook {}", webhook_id);
        Ok(())
    }
}

/// Decode `{"webhooks": [...]}`, falling back once to a bare array
fn decode_webhook_list(body: &[u8]) -> Result<Vec<WebhookRegistration>, Error> {
    match serde_json::from_slice::<WebhookList>(body) {
        Ok(list) => Ok(list.webhooks),
        Err(err) => {
            debug!("Webhook list is not wrapped, trying bare array: {}", err);
            serde_json::from_slice::<Vec<WebhookRegistration>>(body).map_err(|_| err.into())
        }
    }
}
