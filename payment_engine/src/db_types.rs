use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gpg_common::{GstRate, Paise};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::tax::TaxBreakdown;

//--------------------------------------        OrderId        -------------------------------------------------------
/// The order identifier assigned by the payment gateway when the checkout session was opened.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       PaymentId       -------------------------------------------------------
/// The payment identifier the gateway assigns once the customer actually pays. Arrives separately
/// from the order id: the webhook path may see it before the client confirmation does.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl From<String> for PaymentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PaymentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     TransactionIds     ------------------------------------------------------
/// The pair of gateway identifiers a reconciliation call knows about. Either identifier alone is
/// enough to locate an existing order; the payment id is absent on `order.paid` deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIds {
    pub order_id: OrderId,
    pub payment_id: Option<PaymentId>,
}

impl TransactionIds {
    pub fn new(order_id: OrderId, payment_id: Option<PaymentId>) -> Self {
        Self { order_id, payment_id }
    }
}

impl Display for TransactionIds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payment_id {
            Some(pid) => write!(f, "[{}/{}]", self.order_id, pid),
            None => write!(f, "[{}]", self.order_id),
        }
    }
}

//--------------------------------------     OrderStatus       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order exists but payment has not been confirmed yet.
    Pending,
    /// Payment is in and the order is being prepared for dispatch.
    Processing,
    /// Handed to the courier. Cancellation is no longer possible.
    Shipped,
    /// Confirmed received. Terminal.
    Delivered,
    /// Cancelled by an admin before shipping. Terminal.
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Processing => write!(f, "Processing"),
            OrderStatus::Shipped => write!(f, "Shipped"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      -------------------------------------------------------
/// Payment state is an independent axis from the fulfilment lifecycle. `Completed` and `Failed`
/// are both terminal; an order can sit at `Pending` fulfilment with a `Failed` payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
/// A persisted order. Orders are financial records and are never deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub payment_id: Option<PaymentId>,
    pub invoice_no: Option<String>,
    pub currency: String,
    pub subtotal: Paise,
    pub gst: Paise,
    pub cgst: Paise,
    pub sgst: Paise,
    pub igst: Paise,
    pub total: Paise,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_state: String,
    pub ship_pincode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    OrderLineItem      -------------------------------------------------------
/// A priced line, owned exclusively by its order and created atomically with it. The product name,
/// HSN code, and unit price are snapshots taken from the catalog at order time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub hsn_code: String,
    pub quantity: i64,
    pub unit_price: Paise,
    pub gst_rate: GstRate,
    pub gst_amount: Paise,
    pub line_total: Paise,
}

/// A line that has been priced but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: i64,
    pub product_name: String,
    pub hsn_code: String,
    pub quantity: i64,
    pub unit_price: Paise,
    pub gst_rate: GstRate,
    pub gst_amount: Paise,
    pub line_total: Paise,
}

//--------------------------------------      OrderDraft       -------------------------------------------------------
/// What a caller supplies when an order may need to be created: the customer and shipping
/// snapshots plus the cart contents. Prices, names, and tax rates are resolved from the catalog,
/// never trusted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub customer: CustomerInfo,
    pub shipping: ShippingAddress,
    pub items: Vec<DraftLineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLineItem {
    pub product_id: i64,
    pub quantity: i64,
}

//--------------------------------------      PricedOrder      -------------------------------------------------------
/// A draft that has been run through the catalog and tax calculator and is ready to persist.
#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub invoice_no: String,
    pub customer: CustomerInfo,
    pub shipping: ShippingAddress,
    pub breakdown: TaxBreakdown,
    pub items: Vec<NewLineItem>,
}

//--------------------------------------       Product         -------------------------------------------------------
/// The catalog read model. `gst_rate` is optional; absent rates fall back to the default slab.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub hsn_code: String,
    pub unit_price: Paise,
    pub gst_rate: Option<GstRate>,
}

//--------------------------------------    OrderWithItems     -------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderLineItem>,
}
