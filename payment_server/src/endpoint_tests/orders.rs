use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gpg_common::{GstRate, Paise};
use payment_engine::{
    db_types::{OrderLineItem, OrderStatus},
    traits::PaymentGatewayError,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, post_request, sample_order},
    mocks::MockDb,
};
use crate::routes::{get_order, update_order_status};

fn register(cfg: &mut ServiceConfig, db: MockDb) {
    let api = OrderFlowApi::new(db, "Maharashtra");
    cfg.service(web::resource("/order/{order_id}").route(web::get().to(get_order::<MockDb>)))
        .service(web::resource("/order/{order_id}/status").route(web::post().to(update_order_status::<MockDb>)))
        .app_data(web::Data::new(api));
}

fn line_items() -> Vec<OrderLineItem> {
    vec![OrderLineItem {
        id: 1,
        order_id: 1,
        product_id: 1,
        product_name: "Rose face serum".to_string(),
        hsn_code: "3304".to_string(),
        quantity: 1,
        unit_price: Paise::from_rupees(100),
        gst_rate: GstRate::from_basis_points(500),
        gst_amount: Paise::from(500),
        line_total: Paise::from(10_500),
    }]
}

#[actix_web::test]
async fn fetch_order_with_items() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/order_123", configure_found).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["order"]["order_id"], "order_123");
    assert_eq!(value["order"]["total"], 31_500);
    assert_eq!(value["items"][0]["product_name"], "Rose face serum");
}

fn configure_found(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(sample_order())));
    db.expect_fetch_line_items().returning(|_| Ok(line_items()));
    register(cfg, db);
}

#[actix_web::test]
async fn fetch_unknown_order_is_a_404() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/order_999", configure_missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("not found"), "unexpected body: {body}");
}

fn configure_missing(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(None));
    register(cfg, db);
}

#[actix_web::test]
async fn admin_ships_a_processing_order() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "status": "Shipped", "actor": "Admin" }).to_string();
    let (status, response) = post_request("/order/order_123/status", body, &[], configure_ship).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["order_status"], "Shipped");
}

fn configure_ship(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(sample_order())));
    db.expect_update_order_status()
        .times(1)
        .withf(|_, from, to| *from == OrderStatus::Processing && *to == OrderStatus::Shipped)
        .returning(|_, _, _| {
            let mut order = sample_order();
            order.order_status = OrderStatus::Shipped;
            Ok(order)
        });
    register(cfg, db);
}

#[actix_web::test]
async fn customer_cannot_cancel() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "status": "Cancelled", "actor": "Customer" }).to_string();
    let (status, response) = post_request("/order/order_123/status", body, &[], configure_no_write).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("not permitted"), "unexpected body: {response}");
}

#[actix_web::test]
async fn skipping_fulfilment_stages_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "status": "Delivered", "actor": "Admin" }).to_string();
    // sample order is Processing; Processing -> Delivered skips the Shipped stage
    let (status, response) = post_request("/order/order_123/status", body, &[], configure_no_write).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("cannot move"), "unexpected body: {response}");
}

// An invalid transition must be rejected before any write happens.
fn configure_no_write(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(sample_order())));
    db.expect_update_order_status().never();
    register(cfg, db);
}

#[actix_web::test]
async fn concurrent_status_change_is_surfaced() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "status": "Shipped", "actor": "Admin" }).to_string();
    let (status, response) = post_request("/order/order_123/status", body, &[], configure_conflict).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("changed while the update was in flight"), "unexpected body: {response}");
}

fn configure_conflict(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(sample_order())));
    db.expect_update_order_status()
        .returning(|id, _, _| Err(PaymentGatewayError::StatusConflict(id.clone())));
    register(cfg, db);
}
