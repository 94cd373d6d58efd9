use std::fmt::Display;

use gpg_common::Paise;
use payment_engine::{
    db_types::{CustomerInfo, DraftLineItem, Order, OrderDraft, OrderStatus, PaymentStatus, ShippingAddress},
    state::Actor,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------   Client confirmation   -----------------------------------------------------
/// What the storefront client posts after the gateway checkout completes. The signature covers
/// `"{gateway_order_id}|{gateway_payment_id}"` under the API key secret. The draft carries the
/// cart so the order can be created if the webhook has not landed yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    pub order_draft: Option<OrderDraft>,
}

impl VerifyPaymentRequest {
    /// The exact byte string the signature is computed over.
    pub fn signed_payload(&self) -> String {
        format!("{}|{}", self.gateway_order_id, self.gateway_payment_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub order_id: String,
    pub invoice_no: Option<String>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub total: Paise,
}

impl VerifyPaymentResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            success: true,
            order_id: order.order_id.to_string(),
            invoice_no: order.invoice_no.clone(),
            payment_status: order.payment_status,
            order_status: order.order_status,
            total: order.total,
        }
    }
}

//--------------------------------------    Admin transitions    -----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
    pub actor: Actor,
}

//--------------------------------------    Webhook payloads     -----------------------------------------------------
/// The envelope the gateway posts to the webhook endpoint. Entity fields are all defaulted: the
/// gateway's payload shape varies by event type, and an unrecognised delivery must parse far
/// enough to be acknowledged rather than bounce into a retry loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<WebhookEntity<PaymentEntity>>,
    #[serde(default)]
    pub order: Option<WebhookEntity<OrderEntity>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEntity<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: NotesDraft,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: NotesDraft,
}

/// The order details the storefront stashes in the gateway's free-form `notes` field at checkout
/// time, recovered best-effort. If the cart is missing the webhook cannot create an order on its
/// own, but a pre-created or confirmation-created order can still be completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesDraft {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub ship_address: String,
    #[serde(default)]
    pub ship_city: String,
    #[serde(default)]
    pub ship_state: String,
    #[serde(default)]
    pub ship_pincode: String,
    #[serde(default)]
    pub items: Vec<DraftLineItem>,
}

impl NotesDraft {
    /// An empty cart means no draft: reconciliation will then only complete an existing order.
    pub fn into_draft(self) -> Option<OrderDraft> {
        if self.items.is_empty() {
            return None;
        }
        Some(OrderDraft {
            customer: CustomerInfo {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
            },
            shipping: ShippingAddress {
                address: self.ship_address,
                city: self.ship_city,
                state: self.ship_state,
                pincode: self.ship_pincode,
            },
            items: self.items,
        })
    }
}
