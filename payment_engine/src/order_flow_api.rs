use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Order, OrderDraft, OrderId, OrderStatus, OrderWithItems, PaymentStatus, PricedOrder, TransactionIds},
    helpers::new_invoice_number,
    state::{next_order_status, next_payment_status, Actor},
    tax,
    traits::{PaymentGatewayDatabase, PaymentGatewayError, ProductCatalog, ReconcileOutcome},
};

/// `OrderFlowApi` is the single point of truth for payment events. Both entry paths — the
/// synchronous client confirmation and the asynchronous gateway webhook — terminate in
/// [`Self::reconcile`], which guarantees at most one persisted order per gateway transaction no
/// matter how many times, or in what order, the two paths fire.
pub struct OrderFlowApi<B> {
    db: B,
    seller_state: String,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    /// `seller_state` is the state of the seller's GST registration, used to decide between the
    /// CGST/SGST and IGST splits.
    pub fn new(db: B, seller_state: impl Into<String>) -> Self {
        Self { db, seller_state: seller_state.into() }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Idempotently find-or-create the one order for this gateway transaction.
    ///
    /// The draft is priced against the catalog up front (outside the storage transaction) and is
    /// only consulted when an order actually has to be created or backfilled. Calling this twice
    /// with identical inputs changes nothing the second time: no duplicate line items, no new
    /// invoice number.
    ///
    /// If a concurrent call for the same transaction wins the insert race, the unique constraints
    /// on the gateway identifiers reject ours and the call is retried once as a lookup, which then
    /// lands on the committed row.
    pub async fn reconcile<C: ProductCatalog>(
        &self,
        ids: &TransactionIds,
        draft: Option<&OrderDraft>,
        catalog: &C,
    ) -> Result<(Order, ReconcileOutcome), PaymentGatewayError> {
        if let Some(order) = self.db.fetch_order_by_ids(ids).await? {
            if order.payment_status == PaymentStatus::Completed {
                debug!("🔄️ Order {ids} is already reconciled and completed. Nothing to do.");
                return Ok((order, ReconcileOutcome::AlreadyCompleted));
            }
        }
        let priced = match draft {
            Some(d) if !d.items.is_empty() => Some(self.price_draft(d, catalog).await?),
            _ => None,
        };
        match self.db.reconcile_payment(ids, priced.clone()).await {
            Ok((order, outcome)) => {
                info!("🔄️ Reconciled {ids}: {outcome:?}. Order #{} ({})", order.id, order.order_id);
                Ok((order, outcome))
            },
            Err(PaymentGatewayError::OrderAlreadyExists(_)) => {
                // Lost the insert race against the other delivery path. The committed row wins.
                debug!("🔄️ Insert race on {ids}. Retrying as a lookup.");
                self.db.reconcile_payment(ids, priced).await
            },
            Err(e) => Err(e),
        }
    }

    async fn price_draft<C: ProductCatalog>(
        &self,
        draft: &OrderDraft,
        catalog: &C,
    ) -> Result<PricedOrder, PaymentGatewayError> {
        let ids: Vec<i64> = draft.items.iter().map(|i| i.product_id).collect();
        let products = catalog.products_by_ids(&ids).await?;
        let items = tax::price_order(&draft.items, &products)?;
        let breakdown = tax::breakdown(&items, &draft.shipping.state, &self.seller_state);
        trace!("🔄️ Draft priced: {} lines, {} + {} GST", items.len(), breakdown.subtotal, breakdown.gst);
        Ok(PricedOrder {
            invoice_no: new_invoice_number(Utc::now()),
            customer: draft.customer.clone(),
            shipping: draft.shipping.clone(),
            breakdown,
            items,
        })
    }

    /// Record a failed payment attempt reported by the gateway. The transition is validated
    /// against the payment state machine first, so a completed payment is never downgraded; an
    /// unknown order is a logged no-op since the gateway may report failures for checkouts that
    /// were abandoned before any order existed.
    pub async fn mark_payment_failed(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let Some(order) = self.db.fetch_order_by_order_id(order_id).await? else {
            debug!("🔄️ Failure report for {order_id} ignored: no order on record.");
            return Ok(None);
        };
        if next_payment_status(order.payment_status, PaymentStatus::Failed).is_err() {
            debug!("🔄️ Failure report for {order_id} ignored: payment is already {}.", order.payment_status);
            return Ok(None);
        }
        let result = self.db.set_payment_failed(order_id).await?;
        match &result {
            Some(order) => info!("🔄️ Payment for order {order_id} marked as failed (order #{}).", order.id),
            None => debug!("🔄️ Failure report for {order_id} ignored: no unsettled order on record."),
        }
        Ok(result)
    }

    /// Apply an admin/customer lifecycle transition. Validation happens before any write, so an
    /// invalid transition leaves the order exactly as it was.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
        actor: Actor,
    ) -> Result<Order, PaymentGatewayError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        let next = next_order_status(order.order_status, target, actor)?;
        let updated = self.db.update_order_status(order_id, order.order_status, next).await?;
        info!("🔄️ Order {order_id} moved {} -> {} by {actor}", order.order_status, updated.order_status);
        Ok(updated)
    }

    /// The read-only order view consumed by status pages and admin tooling.
    pub async fn order_with_items(&self, order_id: &OrderId) -> Result<Option<OrderWithItems>, PaymentGatewayError> {
        let Some(order) = self.db.fetch_order_by_order_id(order_id).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_line_items(order.id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }
}
