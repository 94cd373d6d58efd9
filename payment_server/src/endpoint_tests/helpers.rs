use actix_web::{body::MessageBody, error::ResponseError, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use gpg_common::{Paise, Secret};
use payment_engine::db_types::{Order, OrderId, OrderStatus, PaymentId, PaymentStatus};

use crate::config::ServerConfig;

pub const TEST_KEY_SECRET: &str = "test_key_secret";
pub const TEST_WEBHOOK_SECRET: &str = "test_webhook_secret";

/// A server configuration with known signing secrets and HMAC checks on.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.gateway.key_secret = Secret::new(TEST_KEY_SECRET.to_string());
    config.gateway.webhook_secret = Secret::new(TEST_WEBHOOK_SECRET.to_string());
    config
}

// The order the mock store hands back: two lines at 5% GST, shipped intra-state.
pub fn sample_order() -> Order {
    Order {
        id: 1,
        order_id: OrderId("order_123".into()),
        payment_id: Some(PaymentId("pay_123".into())),
        invoice_no: Some("INV-20250114-A3B7K9".to_string()),
        currency: "INR".to_string(),
        subtotal: Paise::from_rupees(300),
        gst: Paise::from(1_500),
        cgst: Paise::from(750),
        sgst: Paise::from(750),
        igst: Paise::from(0),
        total: Paise::from(31_500),
        payment_status: PaymentStatus::Completed,
        order_status: OrderStatus::Processing,
        customer_name: "Asha Pillai".to_string(),
        customer_email: "asha@example.com".to_string(),
        customer_phone: "+91 98200 00000".to_string(),
        ship_address: "14 Marine Drive".to_string(),
        ship_city: "Mumbai".to_string(),
        ship_state: "Maharashtra".to_string(),
        ship_pincode: "400020".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 1, 14, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 1, 14, 9, 30, 0).unwrap(),
    }
}

pub async fn post_request(
    path: &str,
    body: String,
    headers: &[(&str, String)],
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        req = req.insert_header((*name, value.clone()));
    }
    let req = req.set_payload(body).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        // Errors from handlers and middleware surface here before response rendering
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = TestRequest::get().uri(path).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}
