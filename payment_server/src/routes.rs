//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the storage backend and the gateway client so the endpoint tests can
//! run them against mocks. Actix cannot infer generics in handlers, so the concrete types are
//! filled in at registration time in [`crate::server`].

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use payment_engine::{
    db_types::{OrderId, TransactionIds},
    traits::{PaymentGatewayDatabase, ProductCatalog},
    OrderFlowApi,
};

use crate::{
    config::ServerConfig,
    data_objects::{StatusUpdateRequest, VerifyPaymentRequest, VerifyPaymentResponse},
    errors::ServerError,
    helpers::verify_hmac,
    integrations::gateway::GatewayClient,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ------------------------------------------   Verify payment  ------------------------------------------------
/// The synchronous confirmation path. The client's signature proves the confirmation came out of
/// the gateway checkout flow, and the follow-up API call to the gateway proves the money is
/// actually captured. Only then does the transaction go to the reconciler.
pub async fn verify_payment<B, G>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase + ProductCatalog,
    G: GatewayClient,
{
    let request = body.into_inner();
    debug!("💻️ POST verify payment for order {}", request.gateway_order_id);
    if config.gateway.hmac_checks {
        let valid =
            verify_hmac(config.gateway.key_secret.reveal(), request.signed_payload().as_bytes(), &request.signature);
        if !valid {
            warn!("💻️ Invalid signature on payment confirmation for order {}", request.gateway_order_id);
            return Err(ServerError::InvalidSignature);
        }
    }
    let payment = gateway.fetch_payment(&request.gateway_payment_id).await?;
    if !payment.order_id.is_empty() && payment.order_id != request.gateway_order_id {
        warn!(
            "💻️ Payment {} belongs to order {}, not {} as claimed.",
            payment.id, payment.order_id, request.gateway_order_id
        );
        return Err(ServerError::VerificationFailed(format!(
            "Payment {} does not belong to order {}",
            payment.id, request.gateway_order_id
        )));
    }
    if !payment.is_settled() {
        info!("💻️ Payment {} for order {} is '{}', not captured.", payment.id, request.gateway_order_id, payment.status);
        return Err(ServerError::PaymentNotCaptured);
    }
    let ids = TransactionIds::new(request.gateway_order_id.into(), Some(request.gateway_payment_id.into()));
    let (order, outcome) = api.reconcile(&ids, request.order_draft.as_ref(), api.db()).await?;
    info!("💻️ Payment verified for order {}: {outcome:?}", order.order_id);
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse::from_order(&order)))
}

// -------------------------------------------   Order status   ------------------------------------------------
/// The read side for storefront status pages and admin tooling.
pub async fn get_order<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    trace!("💻️ GET order {order_id}");
    let view = api
        .order_with_items(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    Ok(HttpResponse::Ok().json(view))
}

/// Apply a fulfilment transition on behalf of an admin or customer. The state machine decides
/// whether the move is legal; this handler only translates the answer to HTTP.
pub async fn update_order_status<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let request = body.into_inner();
    debug!("💻️ POST order {order_id} status -> {} by {}", request.status, request.actor);
    let order = api.update_order_status(&order_id, request.status, request.actor).await?;
    Ok(HttpResponse::Ok().json(order))
}
