//! Vipps MobilePay API request and response types
//!
//! Only the fields this client reads or writes are modelled. Unknown fields in
//! responses are ignored.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Monetary amount in minor units (øre, cent)
///
/// `10.00 NOK` is `Amount { currency: "NOK", value: 1000 }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// ISO 4217 currency code (`NOK`, `DKK` or `EUR`)
    pub currency: String,
    /// Value in minor units
    pub value: i64,
}

impl Amount {
    /// Create a new amount
    pub fn new(currency: impl Into<String>, value: i64) -> Self {
        Self {
            currency: currency.into(),
            value,
        }
    }

    /// Amount in Norwegian kroner
    pub fn nok(value: i64) -> Self {
        Self::new("NOK", value)
    }
}

/// Payment event name
///
/// Routing key for webhook events and the `name` of entries in a payment's
/// event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventName {
    /// Payment was created
    Created,
    /// Payment was authorized by the user
    Authorized,
    /// Payment was aborted by the user
    Aborted,
    /// User did not act on the payment in time
    Expired,
    /// Payment was cancelled by the merchant
    Cancelled,
    /// Payment was captured by the merchant
    Captured,
    /// Payment was refunded by the merchant
    Refunded,
    /// Payment was terminated by the merchant
    Terminated,
}

impl EventName {
    /// All known event names
    pub const ALL: [EventName; 8] = [
        EventName::Created,
        EventName::Authorized,
        EventName::Aborted,
        EventName::Expired,
        EventName::Cancelled,
        EventName::Captured,
        EventName::Refunded,
        EventName::Terminated,
    ];

    /// Wire representation of the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Created => "CREATED",
            EventName::Authorized => "AUTHORIZED",
            EventName::Aborted => "ABORTED",
            EventName::Expired => "EXPIRED",
            EventName::Cancelled => "CANCELLED",
            EventName::Captured => "CAPTURED",
            EventName::Refunded => "REFUNDED",
            EventName::Terminated => "TERMINATED",
        }
    }

    /// Webhook subscription type for this event
    pub fn webhook_event_type(&self) -> &'static str {
        match self {
            EventName::Created => webhook_event_types::PAYMENT_CREATED,
            EventName::Authorized => webhook_event_types::PAYMENT_AUTHORIZED,
            EventName::Aborted => webhook_event_types::PAYMENT_ABORTED,
            EventName::Expired => webhook_event_types::PAYMENT_EXPIRED,
            EventName::Cancelled => webhook_event_types::PAYMENT_CANCELLED,
            EventName::Captured => webhook_event_types::PAYMENT_CAPTURED,
            EventName::Refunded => webhook_event_types::PAYMENT_REFUNDED,
            EventName::Terminated => webhook_event_types::PAYMENT_TERMINATED,
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event name as received on the wire
///
/// Names outside [`EventName`] are kept verbatim so they can be logged and
/// routed to a fallback handler, but never match a specific handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventKind {
    /// A known event name
    Known(EventName),
    /// A name this client does not know
    Unrecognized(String),
}

impl EventKind {
    /// Get the known event name, if any
    pub fn known(&self) -> Option<EventName> {
        match self {
            EventKind::Known(name) => Some(*name),
            EventKind::Unrecognized(_) => None,
        }
    }
}

impl From<EventName> for EventKind {
    fn from(name: EventName) -> Self {
        EventKind::Known(name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Known(name) => name.fmt(f),
            EventKind::Unrecognized(name) => f.write_str(name),
        }
    }
}

/// Webhook subscription event types
pub mod webhook_event_types {
    /// Payment created
    pub const PAYMENT_CREATED: &str = "epayments.payment.created.v1";
    /// Payment aborted by the user
    pub const PAYMENT_ABORTED: &str = "epayments.payment.aborted.v1";
    /// Payment expired
    pub const PAYMENT_EXPIRED: &str = "epayments.payment.expired.v1";
    /// Payment cancelled by the merchant
    pub const PAYMENT_CANCELLED: &str = "epayments.payment.cancelled.v1";
    /// Payment captured by the merchant
    pub const PAYMENT_CAPTURED: &str = "epayments.payment.captured.v1";
    /// Payment refunded by the merchant
    pub const PAYMENT_REFUNDED: &str = "epayments.payment.refunded.v1";
    /// Payment authorized by the user
    pub const PAYMENT_AUTHORIZED: &str = "epayments.payment.authorized.v1";
    /// Payment terminated by the merchant
    pub const PAYMENT_TERMINATED: &str = "epayments.payment.terminated.v1";
}

// ==================== Payments ====================

/// How the user is brought to the payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserFlow {
    /// Push notification to the user's app
    PushMessage,
    /// Redirect to the landing page
    WebRedirect,
    /// App-to-app redirect
    NativeRedirect,
    /// Return a QR code for the payment
    Qr,
}

/// Whether the customer is physically present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerInteraction {
    /// Customer is present at the point of sale
    CustomerPresent,
    /// Customer is not present
    CustomerNotPresent,
}

/// Current state of a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    /// Initiated but not acted upon
    Created,
    /// Accepted by the user
    Authorized,
    /// Stopped by the user
    Aborted,
    /// User did not act in time
    Expired,
    /// Cancelled by the merchant before authorization
    Terminated,
    /// Unknown state
    #[serde(other)]
    Unknown,
}

/// Customer identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Country code and number, e.g. `4712345678`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Personal QR code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_qr: Option<PersonalQr>,
    /// Customer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_token: Option<String>,
}

impl Customer {
    /// Customer identified by phone number
    pub fn phone(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
            ..Default::default()
        }
    }
}

/// Personal QR code presented by the customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalQr {
    /// QR code value
    pub qr: String,
}

/// Payment method configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    /// Method type, usually `WALLET`
    #[serde(rename = "type")]
    pub method_type: String,
    /// Payment sources to block
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_sources: Vec<String>,
}

impl PaymentMethod {
    /// Wallet payment method
    pub fn wallet() -> Self {
        Self {
            method_type: "WALLET".to_string(),
            blocked_sources: Vec::new(),
        }
    }
}

/// Additional compliance data for a payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryData {
    /// Airline ticket data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline_data: Option<AirlineData>,
}

/// Airline ticket data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirlineData {
    /// Invoice number of the travel agency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_invoice_number: Option<String>,
    /// IATA airline code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline_code: Option<String>,
    /// IATA airline designator code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline_designator_code: Option<String>,
    /// Passenger name as on the ticket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_name: Option<String>,
    /// Ticket number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
}

/// Receipt attached to a payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Receipt lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItem>,
}

/// Receipt line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Item name
    pub name: String,
    /// Item description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Number of items
    pub quantity: u32,
    /// Price per item
    pub amount: Amount,
    /// Discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Amount>,
    /// VAT amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<Amount>,
    /// VAT percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_percent: Option<u32>,
}

/// User profile data to request, or returned with a payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Space-separated profile scopes, e.g. `name phoneNumber`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// User id for the userinfo endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

/// QR code output format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrFormat {
    /// Format of the QR code, e.g. `IMAGE_URL`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Request to create a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Payment amount
    pub amount: Amount,
    /// Customer identification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    /// Customer interaction, defaults to not present on the provider side
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_interaction: Option<CustomerInteraction>,
    /// Additional compliance data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_data: Option<IndustryData>,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Profile data to request from the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// Merchant's unique reference for the payment
    pub reference: String,
    /// URL the user returns to after the payment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    /// How the user is brought to the payment
    pub user_flow: UserFlow,
    /// Expiry of a long-living payment (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// QR code format when the user flow is `QR`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_format: Option<QrFormat>,
    /// Description shown to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_description: Option<String>,
    /// Minimum user age
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_user_age: Option<u8>,
    /// Receipt shown in the app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    /// URL where the user can view or download the receipt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

impl CreatePaymentRequest {
    /// Wallet payment with only the required fields set
    pub fn new(amount: Amount, reference: impl Into<String>, user_flow: UserFlow) -> Self {
        Self {
            amount,
            customer: None,
            customer_interaction: None,
            industry_data: None,
            payment_method: PaymentMethod::wallet(),
            profile: None,
            reference: reference.into(),
            return_url: None,
            user_flow,
            expires_at: None,
            qr_format: None,
            payment_description: None,
            minimum_user_age: None,
            receipt: None,
            metadata: HashMap::new(),
            receipt_url: None,
        }
    }
}

/// Response to a payment creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    /// URL for continuing the payment flow
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// Reference of the created payment
    pub reference: String,
    /// QR image URL when the user flow is `QR`
    #[serde(default)]
    pub qr_image_url: Option<String>,
}

/// Aggregated amounts per payment state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateAmount {
    /// Authorized amount
    pub authorized_amount: Amount,
    /// Captured amount
    pub captured_amount: Amount,
    /// Refunded amount
    pub refunded_amount: Amount,
    /// Cancelled amount
    pub cancelled_amount: Amount,
}

/// Payment details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPaymentResponse {
    /// Aggregated amounts
    #[serde(default)]
    pub aggregate: Option<AggregateAmount>,
    /// Original payment amount
    pub amount: Amount,
    /// Current state
    pub state: PaymentState,
    /// PSP reference
    #[serde(default)]
    pub psp_reference: String,
    /// Redirect URL
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// Merchant reference
    pub reference: String,
    /// Metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Payment method used
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Profile data shared by the user
    #[serde(default)]
    pub profile: Option<Profile>,
    /// First six digits of the card for card payments
    #[serde(default)]
    pub card_bin: Option<String>,
    /// Customer name
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Customer phone number
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Customer email
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Customer address
    #[serde(default)]
    pub customer_address: Option<String>,
}

/// Entry in a payment's event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    /// Merchant reference
    pub reference: String,
    /// PSP reference for this event
    #[serde(default)]
    pub psp_reference: String,
    /// Event name
    pub name: EventKind,
    /// Amount for this event
    pub amount: Amount,
    /// Event timestamp (RFC 3339)
    pub timestamp: String,
    /// Idempotency key of the operation that caused the event
    #[serde(default)]
    pub idempotency_key: Option<String>,
    /// Whether the operation succeeded
    pub success: bool,
}

/// Capture or refund request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationRequest {
    /// Amount to capture or refund
    pub modification_amount: Amount,
}

impl From<Amount> for ModificationRequest {
    fn from(modification_amount: Amount) -> Self {
        Self {
            modification_amount,
        }
    }
}

/// Cancel request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelModificationRequest {
    /// Only cancel if the payment is not yet authorized
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancel_transaction_only: bool,
}

/// Response to capture, refund and cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResponse {
    /// Current payment amount
    pub amount: Amount,
    /// Current state
    pub state: PaymentState,
    /// Aggregated amounts
    pub aggregate: AggregateAmount,
    /// PSP reference
    #[serde(default)]
    pub psp_reference: String,
    /// Merchant reference
    pub reference: String,
}

// ==================== Webhooks ====================

/// Request to register a webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistrationRequest {
    /// Callback URL
    pub url: String,
    /// Event types to subscribe to, see [`webhook_event_types`]
    pub events: Vec<String>,
}

/// Registered webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    /// Webhook identifier
    pub id: String,
    /// Callback URL
    #[serde(default)]
    pub url: String,
    /// Subscribed event types
    #[serde(default)]
    pub events: Vec<String>,
    /// Registration time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Registration status, e.g. `active`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Merchant serial number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msn: Option<String>,
    /// Secret used to sign deliveries, only returned on registration
    #[serde(default, alias = "secretKey", skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Documented shape of the webhook list response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WebhookList {
    pub webhooks: Vec<WebhookRegistration>,
}
