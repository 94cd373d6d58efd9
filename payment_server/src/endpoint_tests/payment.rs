use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gpg_common::{GstRate, Paise};
use payment_engine::{db_types::Product, traits::ReconcileOutcome, OrderFlowApi};
use serde_json::json;

use super::{
    helpers::{post_request, sample_order, test_config, TEST_KEY_SECRET},
    mocks::{MockDb, MockGateway},
};
use crate::{
    data_objects::VerifyPaymentResponse,
    helpers::calculate_hmac,
    integrations::gateway::{GatewayError, GatewayPayment},
    routes::verify_payment,
};

fn catalog() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            name: "Rose face serum".to_string(),
            hsn_code: "3304".to_string(),
            unit_price: Paise::from_rupees(100),
            gst_rate: Some(GstRate::from_basis_points(500)),
        },
        Product {
            id: 2,
            name: "Sandalwood soap".to_string(),
            hsn_code: "3401".to_string(),
            unit_price: Paise::from_rupees(200),
            gst_rate: Some(GstRate::from_basis_points(500)),
        },
    ]
}

fn settled_payment() -> GatewayPayment {
    GatewayPayment { id: "pay_123".to_string(), order_id: "order_123".to_string(), status: "captured".to_string() }
}

fn verify_body(signature: &str) -> String {
    json!({
        "gatewayOrderId": "order_123",
        "gatewayPaymentId": "pay_123",
        "signature": signature,
        "orderDraft": {
            "customer": { "name": "Asha Pillai", "email": "asha@example.com", "phone": "+91 98200 00000" },
            "shipping": { "address": "14 Marine Drive", "city": "Mumbai", "state": "Maharashtra", "pincode": "400020" },
            "items": [ { "productId": 1, "quantity": 1 }, { "productId": 2, "quantity": 1 } ]
        }
    })
    .to_string()
}

fn valid_signature() -> String {
    calculate_hmac(TEST_KEY_SECRET, b"order_123|pay_123")
}

fn register(cfg: &mut ServiceConfig, db: MockDb, gateway: MockGateway) {
    let api = OrderFlowApi::new(db, "Maharashtra");
    cfg.service(web::resource("/payment/verify").route(web::post().to(verify_payment::<MockDb, MockGateway>)))
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway))
        .app_data(web::Data::new(test_config()));
}

#[actix_web::test]
async fn verify_payment_happy_path() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/payment/verify", verify_body(&valid_signature()), &[], configure_ok).await;
    assert_eq!(status, StatusCode::OK);
    let response: VerifyPaymentResponse = serde_json::from_str(&body).expect("response should parse");
    assert!(response.success);
    assert_eq!(response.order_id, "order_123");
    assert_eq!(response.total, Paise::from(31_500));
    assert_eq!(response.invoice_no.as_deref(), Some("INV-20250114-A3B7K9"));
}

fn configure_ok(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_ids().returning(|_| Ok(None));
    db.expect_products_by_ids().returning(|_| Ok(catalog()));
    db.expect_reconcile_payment().times(1).returning(|_, priced| {
        let priced = priced.expect("the confirmation path always carries a draft");
        assert_eq!(priced.breakdown.total(), Paise::from(31_500));
        Ok((sample_order(), ReconcileOutcome::Created))
    });
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|_| Ok(settled_payment()));
    register(cfg, db, gateway);
}

// The webhook may have created the order already; the confirmation then carries no cart and must
// still succeed by landing on the committed row.
#[actix_web::test]
async fn verify_without_a_draft_completes_against_the_stored_order() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "gatewayOrderId": "order_123",
        "gatewayPaymentId": "pay_123",
        "signature": valid_signature(),
    })
    .to_string();
    let (status, response) = post_request("/payment/verify", body, &[], configure_draftless).await;
    assert_eq!(status, StatusCode::OK);
    let response: VerifyPaymentResponse = serde_json::from_str(&response).expect("response should parse");
    assert!(response.success);
    assert_eq!(response.order_id, "order_123");
}

fn configure_draftless(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_ids().returning(|_| Ok(Some(sample_order())));
    db.expect_reconcile_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|_| Ok(settled_payment()));
    register(cfg, db, gateway);
}

#[actix_web::test]
async fn tampered_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut signature = valid_signature();
    signature.replace_range(0..4, "0000");
    let (status, body) = post_request("/payment/verify", verify_body(&signature), &[], configure_untouchable).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("signature is invalid"), "unexpected body: {body}");
}

// Neither the gateway nor the store may be touched when the signature fails.
fn configure_untouchable(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_ids().never();
    db.expect_reconcile_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    register(cfg, db, gateway);
}

#[actix_web::test]
async fn gateway_outage_is_a_503_not_a_failure() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/payment/verify", verify_body(&valid_signature()), &[], configure_outage).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("could not be reached"), "unexpected body: {body}");
}

fn configure_outage(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_reconcile_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|_| Err(GatewayError::Unavailable("connection refused".to_string())));
    register(cfg, db, gateway);
}

#[actix_web::test]
async fn uncaptured_payment_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/payment/verify", verify_body(&valid_signature()), &[], configure_uncaptured).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not been captured"), "unexpected body: {body}");
}

fn configure_uncaptured(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_reconcile_payment().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .returning(|_| Ok(GatewayPayment { status: "created".to_string(), ..settled_payment() }));
    register(cfg, db, gateway);
}

#[actix_web::test]
async fn payment_for_a_different_order_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/payment/verify", verify_body(&valid_signature()), &[], configure_mismatch).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("does not belong"), "unexpected body: {body}");
}

fn configure_mismatch(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_reconcile_payment().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .returning(|_| Ok(GatewayPayment { order_id: "order_999".to_string(), ..settled_payment() }));
    register(cfg, db, gateway);
}

#[actix_web::test]
async fn missing_fields_are_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "gatewayOrderId": "order_123" }).to_string();
    let (status, _) = post_request("/payment/verify", body, &[], configure_untouchable).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
