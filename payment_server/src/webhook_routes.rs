//----------------------------------------------   Webhooks  ----------------------------------------------------
//
// The asynchronous delivery path. By the time a request reaches this handler the HMAC middleware
// has already authenticated it, so everything here is acknowledged with a 200: the gateway retries
// non-2xx deliveries for days, and a payload we cannot process today will not get any more
// processable on the fifth redelivery. Failures are logged and acknowledged.

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use payment_engine::{
    db_types::{OrderDraft, OrderId, TransactionIds},
    traits::{PaymentGatewayDatabase, PaymentGatewayError, ProductCatalog},
    OrderFlowApi,
};
use serde_json::json;

use crate::data_objects::{OrderEntity, PaymentEntity, WebhookEvent};

pub async fn gateway_webhook<B>(req: HttpRequest, body: web::Bytes, api: web::Data<OrderFlowApi<B>>) -> HttpResponse
where B: PaymentGatewayDatabase + ProductCatalog {
    trace!("📨️ Received webhook request: {}", req.uri());
    let event = match serde_json::from_slice::<WebhookEvent>(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("📨️ Could not parse webhook payload. {e}");
            return acknowledge();
        },
    };
    match event.event.as_str() {
        "payment.captured" => match event.payload.payment {
            Some(payment) => handle_payment_captured(payment.entity, &api).await,
            None => warn!("📨️ payment.captured delivery carried no payment entity."),
        },
        "order.paid" => match event.payload.order {
            Some(order) => handle_order_paid(order.entity, &api).await,
            None => warn!("📨️ order.paid delivery carried no order entity."),
        },
        "payment.failed" => match event.payload.payment {
            Some(payment) => handle_payment_failed(payment.entity, &api).await,
            None => warn!("📨️ payment.failed delivery carried no payment entity."),
        },
        other => debug!("📨️ Ignoring webhook event type '{other}'."),
    }
    acknowledge()
}

fn acknowledge() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "received": true }))
}

async fn handle_payment_captured<B>(payment: PaymentEntity, api: &OrderFlowApi<B>)
where B: PaymentGatewayDatabase + ProductCatalog {
    if payment.order_id.is_empty() {
        warn!("📨️ payment.captured for {} carried no order id. Ignoring.", payment.id);
        return;
    }
    let ids = TransactionIds::new(OrderId(payment.order_id), Some(payment.id.into()));
    let draft = payment.notes.into_draft();
    reconcile_delivery(&ids, draft.as_ref(), api).await;
}

async fn handle_order_paid<B>(order: OrderEntity, api: &OrderFlowApi<B>)
where B: PaymentGatewayDatabase + ProductCatalog {
    if order.id.is_empty() {
        warn!("📨️ order.paid delivery carried no order id. Ignoring.");
        return;
    }
    // order.paid does not name the payment; the payment id is attached when payment.captured or
    // the client confirmation lands.
    let ids = TransactionIds::new(OrderId(order.id), None);
    let draft = order.notes.into_draft();
    reconcile_delivery(&ids, draft.as_ref(), api).await;
}

async fn reconcile_delivery<B>(ids: &TransactionIds, draft: Option<&OrderDraft>, api: &OrderFlowApi<B>)
where B: PaymentGatewayDatabase + ProductCatalog {
    match api.reconcile(ids, draft, api.db()).await {
        Ok((order, outcome)) => info!("📨️ Webhook for {ids} reconciled: {outcome:?} (order #{})", order.id),
        Err(PaymentGatewayError::DraftRequired(id)) => {
            // No stored order and no cart in the notes. Nothing can be created; the sync path
            // carries the full draft and will create the order when it lands.
            info!("📨️ Webhook for {id} arrived before any order details. Waiting for the confirmation path.");
        },
        Err(e) => warn!("📨️ Could not reconcile webhook delivery for {ids}. {e}"),
    }
}

async fn handle_payment_failed<B>(payment: PaymentEntity, api: &OrderFlowApi<B>)
where B: PaymentGatewayDatabase + ProductCatalog {
    if payment.order_id.is_empty() {
        warn!("📨️ payment.failed for {} carried no order id. Ignoring.", payment.id);
        return;
    }
    let order_id = OrderId(payment.order_id);
    match api.mark_payment_failed(&order_id).await {
        Ok(Some(order)) => info!("📨️ Payment for order {order_id} marked failed (order #{}).", order.id),
        Ok(None) => debug!("📨️ Failure report for {order_id} was a no-op."),
        Err(e) => warn!("📨️ Could not record payment failure for {order_id}. {e}"),
    }
}
