//! Webhook payload

use serde::{Deserialize, Serialize};

use crate::api::types::{Amount, EventKind};

/// Webhook event payload received from Vipps MobilePay
///
/// ```json
/// {
///   "msn": "123456",
///   "reference": "order-1",
///   "pspReference": "psp-1",
///   "name": "CAPTURED",
///   "amount": { "currency": "NOK", "value": 1000 },
///   "timestamp": "2024-01-15T12:00:00Z",
///   "idempotencyKey": "b2c9...",
///   "success": true
/// }
/// ```
///
/// Only `reference` and `name` are required; other missing fields decode to
/// their empty values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Merchant serial number
    #[serde(default)]
    pub msn: String,
    /// Merchant reference of the payment
    pub reference: String,
    /// PSP reference
    #[serde(default)]
    pub psp_reference: String,
    /// Event name, the routing key
    pub name: EventKind,
    /// Amount for this event in minor units
    #[serde(default)]
    pub amount: Amount,
    /// Event timestamp (RFC 3339)
    #[serde(default)]
    pub timestamp: String,
    /// Idempotency key of the operation that caused the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Whether the operation succeeded
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EventName;

    #[test]
    fn test_decode_event() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "msn": "123456",
                "reference": "order-1",
                "pspReference": "psp-1",
                "name": "CAPTURED",
                "amount": {"currency": "NOK", "value": 1000},
                "timestamp": "2024-01-15T12:00:00Z",
                "success": true
            }"#,
        )
        .unwrap();

        assert_eq!(event.name, EventKind::Known(EventName::Captured));
        assert_eq!(event.amount, Amount::nok(1000));
        assert_eq!(event.idempotency_key, None);
    }

    #[test]
    fn test_decode_unrecognized_event_name() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"msn":"1","reference":"r","name":"CHARGEBACK","amount":{"currency":"NOK","value":1},"timestamp":"t","success":false}"#,
        )
        .unwrap();

        assert_eq!(event.name.known(), None);
    }

    #[test]
    fn test_decode_sparse_event() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"name":"AUTHORIZED","reference":"order-1"}"#).unwrap();

        assert_eq!(event.name, EventKind::Known(EventName::Authorized));
        assert_eq!(event.reference, "order-1");
        assert_eq!(event.msn, "");
        assert_eq!(event.amount, Amount::default());
        assert_eq!(event.timestamp, "");
        assert!(!event.success);
    }

    #[test]
    fn test_missing_reference_is_rejected() {
        let result = serde_json::from_str::<WebhookEvent>(
            r#"{"msn":"1","name":"CAPTURED","amount":{"currency":"NOK","value":1},"timestamp":"t","success":true}"#,
        );
        assert!(result.is_err());
    }
}
