//! ePayment API endpoints

use tracing::info;

use super::error::Error;
use super::types::{
    AdjustmentResponse, CancelModificationRequest, CreatePaymentRequest, CreatePaymentResponse,
    GetPaymentResponse, ModificationRequest, PaymentEvent,
};
use super::{new_idempotency_key, VippsApi};

const PAYMENTS_PATH: &str = "/epayment/v1/payments";
const TEST_PAYMENTS_PATH: &str = "/epayment/v1/test/payments";

/// Path of a single payment; the reference is always one encoded segment
fn payment_path(base: &str, reference: &str) -> String {
    format!("{}/{}", base, urlencoding::encode(reference))
}

impl VippsApi {
    // ==================== ePayment Endpoints ====================

    /// Create a payment
    ///
    /// `idempotency_key` identifies the logical operation; `None` uses a fresh
    /// key so every call creates a distinct request.
    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
        idempotency_key: Option<&str>,
    ) -> Result<CreatePaymentResponse, Error> {
        let key = idempotency_key.map_or_else(new_idempotency_key, str::to_string);
        let response: CreatePaymentResponse =
            self.post(PAYMENTS_PATH, request, Some(key.as_str())).await?;

        info!(
            "Created payment {} ({} {})",
            response.reference, request.amount.value, request.amount.currency
        );

        Ok(response)
    }

    /// Get payment details
    pub async fn get_payment(&self, reference: &str) -> Result<GetPaymentResponse, Error> {
        self.get(&payment_path(PAYMENTS_PATH, reference)).await
    }

    /// Get the event log of a payment
    pub async fn get_payment_events(&self, reference: &str) -> Result<Vec<PaymentEvent>, Error> {
        self.get(&format!("{}/events", payment_path(PAYMENTS_PATH, reference)))
            .await
    }

    /// Capture an authorized payment
    pub async fn capture_payment(
        &self,
        reference: &str,
        request: &ModificationRequest,
        idempotency_key: Option<&str>,
    ) -> Result<AdjustmentResponse, Error> {
        let key = idempotency_key.map_or_else(new_idempotency_key, str::to_string);
        self.post(
            &format!("{}/capture", payment_path(PAYMENTS_PATH, reference)),
            request,
            Some(key.as_str()),
        )
        .await
    }

    /// Refund a captured payment
    pub async fn refund_payment(
        &self,
        reference: &str,
        request: &ModificationRequest,
        idempotency_key: Option<&str>,
    ) -> Result<AdjustmentResponse, Error> {
        let key = idempotency_key.map_or_else(new_idempotency_key, str::to_string);
        self.post(
            &format!("{}/refund", payment_path(PAYMENTS_PATH, reference)),
            request,
            Some(key.as_str()),
        )
        .await
    }

    /// Cancel a payment
    ///
    /// Cancelling is naturally idempotent, so no key is sent.
    pub async fn cancel_payment(
        &self,
        reference: &str,
        request: &CancelModificationRequest,
    ) -> Result<AdjustmentResponse, Error> {
        self.post(
            &format!("{}/cancel", payment_path(PAYMENTS_PATH, reference)),
            request,
            None,
        )
        .await
    }

    /// Approve a payment without user interaction
    ///
    /// Only the test environment offers this endpoint; production clients get
    /// [`Error::TestModeOnly`] without a request being sent. Each call carries
    /// a fresh idempotency key.
    pub async fn force_approve_payment(
        &self,
        reference: &str,
        customer_phone: &str,
    ) -> Result<(), Error> {
        if !self.is_test_mode() {
            return Err(Error::TestModeOnly("force approve"));
        }

        let body = serde_json::json!({
            "customer": { "phoneNumber": customer_phone },
        });
        let key = new_idempotency_key();

        self.execute(
            reqwest::Method::POST,
            &format!("{}/approve", payment_path(TEST_PAYMENTS_PATH, reference)),
            Some(&body),
            Some(key.as_str()),
        )
        .await?;

        Ok(())
    }
}
