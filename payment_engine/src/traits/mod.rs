//! Storage and catalog capabilities the engine runs against.
//!
//! All interactions are expressed as traits so the HTTP layer can be tested against mocks and the
//! engine stays provider-agnostic. The SQLite backend in [`crate::sqlite`] is the production
//! implementation of both traits.

use thiserror::Error;

use crate::{
    db_types::{Order, OrderId, OrderLineItem, OrderStatus, PricedOrder, Product, TransactionIds},
    state::TransitionError,
    tax::TaxError,
};

/// What a reconciliation call did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No order existed for either identifier; header and line items were created atomically.
    Created,
    /// An order existed with an unsettled payment; it was completed and backfilled.
    Updated,
    /// The order was already completed. Nothing was written.
    AlreadyCompleted,
}

/// The transactional order store. Implementations must uphold at-most-one-order per gateway
/// transaction: both gateway identifiers carry unique constraints, and [`reconcile_payment`]
/// performs its read-modify-write inside a single transaction.
///
/// [`reconcile_payment`]: PaymentGatewayDatabase::reconcile_payment
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Find the order matching either of the transaction identifiers. Either identifier alone is
    /// sufficient; the two entry paths may each know only one of them.
    async fn fetch_order_by_ids(&self, ids: &TransactionIds) -> Result<Option<Order>, PaymentGatewayError>;

    /// Find an order by its gateway order id.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// The line items belonging to the order with internal id `order_pk`.
    async fn fetch_line_items(&self, order_pk: i64) -> Result<Vec<OrderLineItem>, PaymentGatewayError>;

    /// The atomic find-or-create at the heart of the gateway. In one transaction:
    /// * if an order matches either identifier and is already completed, return it unchanged;
    /// * if it matches but is not completed, attach the payment id, mark the payment completed,
    ///   advance a `Pending` order to `Processing`, and backfill the invoice number and tax
    ///   fields only where they are currently unset;
    /// * otherwise persist the priced order (header and line items together) as completed.
    ///
    /// Creating requires `priced`; reconciling a transaction with no stored order and no priced
    /// draft fails with [`PaymentGatewayError::DraftRequired`].
    async fn reconcile_payment(
        &self,
        ids: &TransactionIds,
        priced: Option<PricedOrder>,
    ) -> Result<(Order, ReconcileOutcome), PaymentGatewayError>;

    /// Mark the payment for an order as failed. Completed payments are terminal and are left
    /// untouched; the fulfilment status is not changed (an order may sit at `Pending` with a
    /// failed payment). Returns the updated order, or `None` if the order does not exist or its
    /// payment was already completed.
    async fn set_payment_failed(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Apply a pre-validated fulfilment transition. The update is guarded on the status the
    /// caller validated against, so a concurrent change surfaces as
    /// [`PaymentGatewayError::StatusConflict`] instead of a silent overwrite.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, PaymentGatewayError>;
}

/// Read-only access to the product catalog, used exclusively at order-creation time to resolve
/// prices, HSN codes, and GST rates. Passed explicitly to the reconciler rather than reached for
/// as ambient state.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog {
    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Cannot insert order {0}, since it already exists")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Order {0} does not exist and no draft was supplied to create it")]
    DraftRequired(OrderId),
    #[error("The status of order {0} changed while the update was in flight")]
    StatusConflict(OrderId),
    #[error("{0}")]
    TaxError(#[from] TaxError),
    #[error("{0}")]
    TransitionError(#[from] TransitionError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
