//! `SqliteDatabase` is the production backend for the payment engine. It implements both the
//! [`PaymentGatewayDatabase`] order store and the [`ProductCatalog`] read capability.

use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, orders, products};
use crate::{
    db_types::{Order, OrderId, OrderLineItem, OrderStatus, PaymentStatus, PricedOrder, Product, TransactionIds},
    state::next_payment_status,
    traits::{PaymentGatewayDatabase, PaymentGatewayError, ProductCatalog, ReconcileOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Seed or update a catalog row. Used by tests and local setup tooling.
    pub async fn upsert_product(&self, product: &Product) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        products::upsert_product(product, &mut conn).await?;
        Ok(())
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_by_ids(&self, ids: &TransactionIds) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_ids(ids, &mut conn).await?)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_order_id(order_id, &mut conn).await?)
    }

    async fn fetch_line_items(&self, order_pk: i64) -> Result<Vec<OrderLineItem>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_line_items(order_pk, &mut conn).await?)
    }

    /// The whole find-or-create runs inside one transaction. SQLite serialises writers, and the
    /// UNIQUE constraints on both gateway identifiers reject any insert that slips past the
    /// in-transaction lookup, so at most one order row can ever exist per transaction.
    async fn reconcile_payment(
        &self,
        ids: &TransactionIds,
        priced: Option<PricedOrder>,
    ) -> Result<(Order, ReconcileOutcome), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let existing = orders::fetch_order_by_ids(ids, &mut tx).await?;
        let result = match existing {
            Some(order) if order.payment_status == PaymentStatus::Completed => {
                debug!("🗃️ Order {ids} already completed as #{}. No write performed.", order.id);
                (order, ReconcileOutcome::AlreadyCompleted)
            },
            Some(order) => {
                next_payment_status(order.payment_status, PaymentStatus::Completed)?;
                let updated = orders::complete_payment(order.id, ids, priced.as_ref(), &mut tx).await?;
                // A storefront-created order carries no lines yet; adopt them from the draft
                if let Some(p) = priced.as_ref() {
                    if orders::fetch_line_items(order.id, &mut tx).await?.is_empty() {
                        orders::insert_line_items(order.id, &p.items, &mut tx).await?;
                    }
                }
                debug!("🗃️ Order {ids} completed and backfilled as #{}", updated.id);
                (updated, ReconcileOutcome::Updated)
            },
            None => {
                let priced = priced.ok_or_else(|| PaymentGatewayError::DraftRequired(ids.order_id.clone()))?;
                let order = orders::insert_completed_order(ids, &priced, &mut tx).await?;
                debug!("🗃️ Order {ids} created as #{} with invoice {}", order.id, priced.invoice_no);
                (order, ReconcileOutcome::Created)
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn set_payment_failed(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::set_payment_failed(order_id, &mut conn).await?)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let updated = orders::update_order_status(order_id, from, to, &mut conn).await?;
        updated.ok_or_else(|| PaymentGatewayError::StatusConflict(order_id.clone()))
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::products_by_ids(ids, &mut conn).await?)
    }
}
