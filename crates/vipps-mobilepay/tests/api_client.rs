//! Client behaviour against a mocked Vipps MobilePay API

use mockito::Matcher;
use vipps_mobilepay::api::types::{PaymentState, WebhookRegistration};
use vipps_mobilepay::{Error, VippsApi, VippsConfig};

fn config(server: &mockito::ServerGuard) -> VippsConfig {
    VippsConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        subscription_key: "sub-key".to_string(),
        merchant_serial_number: "123456".to_string(),
        api_url: Some(server.url()),
        system_name: Some("integration-test".to_string()),
        ..Default::default()
    }
}

fn token_body(token: &str, expires_in: &str) -> String {
    format!(
        r#"{{"token_type":"Bearer","expires_in":"{}","access_token":"{}"}}"#,
        expires_in, token
    )
}

const PAYMENT_BODY: &str = r#"{
    "aggregate": {
        "authorizedAmount": {"currency": "NOK", "value": 1000},
        "capturedAmount": {"currency": "NOK", "value": 0},
        "refundedAmount": {"currency": "NOK", "value": 0},
        "cancelledAmount": {"currency": "NOK", "value": 0}
    },
    "amount": {"currency": "NOK", "value": 1000},
    "state": "AUTHORIZED",
    "pspReference": "psp-1",
    "reference": "order-1"
}"#;

#[tokio::test]
async fn test_token_fetched_once_and_reused() {
    let mut server = mockito::Server::new_async().await;
    let token = server
        .mock("POST", "/accesstoken/get")
        .match_header("client_id", "client-id")
        .match_header("client_secret", "client-secret")
        .match_header("Ocp-Apim-Subscription-Key", "sub-key")
        .match_header("Merchant-Serial-Number", "123456")
        .with_status(200)
        .with_body(token_body("tok-1", "3600"))
        .expect(1)
        .create_async()
        .await;
    let payment = server
        .mock("GET", "/epayment/v1/payments/order-1")
        .match_header("Authorization", "Bearer tok-1")
        .match_header("Vipps-System-Name", "integration-test")
        .with_status(200)
        .with_body(PAYMENT_BODY)
        .expect(2)
        .create_async()
        .await;

    let api = VippsApi::from_config(&config(&server)).unwrap();

    for _ in 0..2 {
        let details = api.get_payment("order-1").await.unwrap();
        assert_eq!(details.state, PaymentState::Authorized);
        assert_eq!(details.psp_reference, "psp-1");
    }

    token.assert_async().await;
    payment.assert_async().await;
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_each_call() {
    let mut server = mockito::Server::new_async().await;
    let token = server
        .mock("POST", "/accesstoken/get")
        .with_status(200)
        .with_body(token_body("short-lived", "0"))
        .expect(2)
        .create_async()
        .await;
    let _m = server
        .mock("GET", "/epayment/v1/payments/order-1")
        .with_status(200)
        .with_body(PAYMENT_BODY)
        .expect(2)
        .create_async()
        .await;

    let api = VippsApi::from_config(&config(&server)).unwrap();
    api.get_payment("order-1").await.unwrap();
    api.get_payment("order-1").await.unwrap();

    token.assert_async().await;
}

#[tokio::test]
async fn test_authenticate_fails_fast_on_bad_credentials() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/accesstoken/get")
        .with_status(401)
        .with_body(r#"{"error":"unauthorized_client"}"#)
        .create_async()
        .await;

    let api = VippsApi::from_config(&config(&server)).unwrap();
    let err = api.authenticate().await.unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert!(!api.tokens().is_valid().await);
}

#[tokio::test]
async fn test_refund_sends_fresh_key_per_call() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/accesstoken/get")
        .with_status(200)
        .with_body(token_body("tok", "3600"))
        .create_async()
        .await;
    let refund = server
        .mock("POST", "/epayment/v1/payments/order-1/refund")
        .match_header("Idempotency-Key", Matcher::Regex("^[0-9a-f-]{36}$".to_string()))
        .with_status(200)
        .with_body(PAYMENT_BODY)
        .expect(2)
        .create_async()
        .await;

    let api = VippsApi::from_config(&config(&server)).unwrap();
    let request = vipps_mobilepay::Amount::nok(500).into();
    api.refund_payment("order-1", &request, None).await.unwrap();
    api.refund_payment("order-1", &request, None).await.unwrap();

    refund.assert_async().await;
}

#[tokio::test]
async fn test_get_webhooks_accepts_both_shapes() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/accesstoken/get")
        .with_status(200)
        .with_body(token_body("tok", "3600"))
        .create_async()
        .await;
    let wrapped = server
        .mock("GET", "/webhooks/v1/webhooks")
        .with_status(200)
        .with_body(r#"{"webhooks":[{"id":"w1","url":"https://shop.example/hook","events":[]}]}"#)
        .expect(1)
        .create_async()
        .await;

    let api = VippsApi::from_config(&config(&server)).unwrap();
    let list: Vec<WebhookRegistration> = api.get_webhooks().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "w1");
    wrapped.assert_async().await;
    wrapped.remove_async().await;

    let _m = server
        .mock("GET", "/webhooks/v1/webhooks")
        .with_status(200)
        .with_body(r#"[{"id":"w2","url":"https://shop.example/hook"}]"#)
        .create_async()
        .await;

    let list = api.get_webhooks().await.unwrap();
    assert_eq!(list[0].id, "w2");
}

#[tokio::test]
async fn test_problem_details_surface_to_caller() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/accesstoken/get")
        .with_status(200)
        .with_body(token_body("tok", "3600"))
        .create_async()
        .await;
    let _m = server
        .mock("POST", "/epayment/v1/payments/order-1/capture")
        .with_status(400)
        .with_body(
            r#"{"type":"about:blank","title":"Bad Request","status":400,"detail":"Capture amount exceeds authorized amount","code":"CAPTURE_AMOUNT_TOO_HIGH"}"#,
        )
        .create_async()
        .await;

    let api = VippsApi::from_config(&config(&server)).unwrap();
    let err = api
        .capture_payment("order-1", &vipps_mobilepay::Amount::nok(5000).into(), None)
        .await
        .unwrap_err();

    let api_error = err.api_error().expect("provider error");
    assert_eq!(api_error.status, 400);
    assert_eq!(api_error.code(), Some("CAPTURE_AMOUNT_TOO_HIGH"));
    assert!(!api_error.is_retryable());
}
