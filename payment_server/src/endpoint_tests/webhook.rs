use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gpg_common::{GstRate, Paise, Secret};
use payment_engine::{
    db_types::{OrderStatus, PaymentStatus, Product},
    traits::{PaymentGatewayError, ReconcileOutcome},
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{post_request, sample_order, TEST_WEBHOOK_SECRET},
    mocks::MockDb,
};
use crate::{
    helpers::calculate_hmac,
    middleware::{HmacMiddlewareFactory, GATEWAY_SIGNATURE_HEADER},
    webhook_routes::gateway_webhook,
};

fn register(cfg: &mut ServiceConfig, db: MockDb) {
    let api = OrderFlowApi::new(db, "Maharashtra");
    let guard =
        HmacMiddlewareFactory::new(GATEWAY_SIGNATURE_HEADER, Secret::new(TEST_WEBHOOK_SECRET.to_string()), true);
    cfg.service(web::resource("/payment/webhook").wrap(guard).route(web::post().to(gateway_webhook::<MockDb>)))
        .app_data(web::Data::new(api));
}

fn signed(body: &str) -> Vec<(&'static str, String)> {
    vec![(GATEWAY_SIGNATURE_HEADER, calculate_hmac(TEST_WEBHOOK_SECRET, body.as_bytes()))]
}

fn captured_event() -> String {
    json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_123",
            "order_id": "order_123",
            "status": "captured",
            "notes": {
                "customerName": "Asha Pillai",
                "shipState": "Maharashtra",
                "items": [ { "productId": 1, "quantity": 3 } ]
            }
        }}}
    })
    .to_string()
}

fn catalog() -> Vec<Product> {
    vec![Product {
        id: 1,
        name: "Rose face serum".to_string(),
        hsn_code: "3304".to_string(),
        unit_price: Paise::from_rupees(100),
        gst_rate: Some(GstRate::from_basis_points(500)),
    }]
}

#[actix_web::test]
async fn captured_delivery_is_reconciled_and_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = captured_event();
    let headers = signed(&body);
    let (status, response) = post_request("/payment/webhook", body, &headers, configure_captured).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

fn configure_captured(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_ids().returning(|_| Ok(None));
    db.expect_products_by_ids().returning(|_| Ok(catalog()));
    db.expect_reconcile_payment().times(1).withf(|ids, priced| {
        ids.order_id.as_str() == "order_123"
            && ids.payment_id.as_ref().map(|p| p.as_str()) == Some("pay_123")
            && priced.is_some()
    }).returning(|_, _| Ok((sample_order(), ReconcileOutcome::Created)));
    register(cfg, db);
}

#[actix_web::test]
async fn tampered_delivery_never_reaches_the_store() {
    let _ = env_logger::try_init().ok();
    let body = captured_event();
    // signed over a different body
    let headers = vec![(GATEWAY_SIGNATURE_HEADER, calculate_hmac(TEST_WEBHOOK_SECRET, b"something else"))];
    let (status, _) = post_request("/payment/webhook", body, &headers, configure_untouchable).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unsigned_delivery_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request("/payment/webhook", captured_event(), &[], configure_untouchable).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn configure_untouchable(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_ids().never();
    db.expect_reconcile_payment().never();
    db.expect_set_payment_failed().never();
    register(cfg, db);
}

#[actix_web::test]
async fn garbage_body_with_valid_signature_is_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = "this is not json".to_string();
    let headers = signed(&body);
    let (status, response) = post_request("/payment/webhook", body, &headers, configure_untouchable).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

#[actix_web::test]
async fn unknown_event_types_are_ignored() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "event": "refund.processed", "payload": {} }).to_string();
    let headers = signed(&body);
    let (status, response) = post_request("/payment/webhook", body, &headers, configure_untouchable).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

#[actix_web::test]
async fn order_paid_reconciles_without_a_payment_id() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "event": "order.paid",
        "payload": { "order": { "entity": {
            "id": "order_123",
            "status": "paid",
            "notes": { "shipState": "Maharashtra", "items": [ { "productId": 1, "quantity": 1 } ] }
        }}}
    })
    .to_string();
    let headers = signed(&body);
    let (status, _) = post_request("/payment/webhook", body, &headers, configure_order_paid).await;
    assert_eq!(status, StatusCode::OK);
}

fn configure_order_paid(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_ids().returning(|_| Ok(None));
    db.expect_products_by_ids().returning(|_| Ok(catalog()));
    db.expect_reconcile_payment()
        .times(1)
        .withf(|ids, _| ids.order_id.as_str() == "order_123" && ids.payment_id.is_none())
        .returning(|_, _| Ok((sample_order(), ReconcileOutcome::Created)));
    register(cfg, db);
}

#[actix_web::test]
async fn failed_payment_is_recorded() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "event": "payment.failed",
        "payload": { "payment": { "entity": { "id": "pay_123", "order_id": "order_123", "status": "failed" } } }
    })
    .to_string();
    let headers = signed(&body);
    let (status, response) = post_request("/payment/webhook", body, &headers, configure_failed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

fn configure_failed(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_reconcile_payment().never();
    db.expect_fetch_order_by_order_id().times(1).withf(|id| id.as_str() == "order_123").returning(|_| {
        let mut order = sample_order();
        order.payment_status = PaymentStatus::Pending;
        order.order_status = OrderStatus::Pending;
        Ok(Some(order))
    });
    db.expect_set_payment_failed().times(1).withf(|id| id.as_str() == "order_123").returning(|_| {
        let mut order = sample_order();
        order.payment_status = PaymentStatus::Failed;
        order.order_status = OrderStatus::Pending;
        Ok(Some(order))
    });
    register(cfg, db);
}

// A failure report for a settled payment must not touch the store.
#[actix_web::test]
async fn failure_report_never_downgrades_a_settled_payment() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "event": "payment.failed",
        "payload": { "payment": { "entity": { "id": "pay_123", "order_id": "order_123", "status": "failed" } } }
    })
    .to_string();
    let headers = signed(&body);
    let (status, response) = post_request("/payment/webhook", body, &headers, configure_already_settled).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

fn configure_already_settled(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().times(1).returning(|_| Ok(Some(sample_order())));
    db.expect_set_payment_failed().never();
    register(cfg, db);
}

#[actix_web::test]
async fn backend_errors_do_not_trigger_gateway_retries() {
    let _ = env_logger::try_init().ok();
    let body = captured_event();
    let headers = signed(&body);
    let (status, response) = post_request("/payment/webhook", body, &headers, configure_backend_down).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

fn configure_backend_down(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_ids().returning(|_| Ok(None));
    db.expect_products_by_ids().returning(|_| Ok(catalog()));
    db.expect_reconcile_payment()
        .returning(|_, _| Err(PaymentGatewayError::DatabaseError("database is locked".to_string())));
    register(cfg, db);
}
