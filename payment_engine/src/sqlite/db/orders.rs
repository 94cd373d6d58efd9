use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewLineItem, Order, OrderId, OrderLineItem, OrderStatus, PricedOrder, TransactionIds},
    traits::PaymentGatewayError,
};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
}

/// Returns the order matching either transaction identifier. An absent payment id never matches
/// the NULL payment_id of an unreconciled row.
pub async fn fetch_order_by_ids(
    ids: &TransactionIds,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "SELECT * FROM orders WHERE order_id = $1 OR (payment_id IS NOT NULL AND payment_id = $2) LIMIT 1",
    )
    .bind(ids.order_id.as_str())
    .bind(ids.payment_id.as_ref().map(|p| p.as_str()))
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_line_items(order_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_line_items WHERE order_id = $1 ORDER BY id")
        .bind(order_pk)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Inserts a completed order header and its line items. Not atomic on its own; the caller embeds
/// this in the reconcile transaction. A unique-constraint hit on either gateway identifier means
/// another writer got there first and is reported as `OrderAlreadyExists`.
pub async fn insert_completed_order(
    ids: &TransactionIds,
    priced: &PricedOrder,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let b = &priced.breakdown;
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                payment_id,
                invoice_no,
                subtotal,
                gst,
                cgst,
                sgst,
                igst,
                total,
                payment_status,
                order_status,
                customer_name,
                customer_email,
                customer_phone,
                ship_address,
                ship_city,
                ship_state,
                ship_pincode
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Completed', 'Processing', $10, $11, $12, $13, $14, $15, $16)
            RETURNING *;
        "#,
    )
    .bind(ids.order_id.as_str())
    .bind(ids.payment_id.as_ref().map(|p| p.as_str()))
    .bind(priced.invoice_no.as_str())
    .bind(b.subtotal.value())
    .bind(b.gst.value())
    .bind(b.cgst.value())
    .bind(b.sgst.value())
    .bind(b.igst.value())
    .bind(b.total().value())
    .bind(priced.customer.name.as_str())
    .bind(priced.customer.email.as_str())
    .bind(priced.customer.phone.as_str())
    .bind(priced.shipping.address.as_str())
    .bind(priced.shipping.city.as_str())
    .bind(priced.shipping.state.as_str())
    .bind(priced.shipping.pincode.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            PaymentGatewayError::OrderAlreadyExists(ids.order_id.clone())
        } else {
            e.into()
        }
    })?;
    insert_line_items(order.id, &priced.items, conn).await?;
    debug!("📝️ Order [{}] inserted with id {} and {} lines", order.order_id, order.id, priced.items.len());
    Ok(order)
}

pub async fn insert_line_items(
    order_pk: i64,
    items: &[NewLineItem],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query(
            r#"
                INSERT INTO order_line_items (
                    order_id, product_id, product_name, hsn_code, quantity, unit_price, gst_rate, gst_amount, line_total
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9);
            "#,
        )
        .bind(order_pk)
        .bind(item.product_id)
        .bind(item.product_name.as_str())
        .bind(item.hsn_code.as_str())
        .bind(item.quantity)
        .bind(item.unit_price.value())
        .bind(item.gst_rate.basis_points())
        .bind(item.gst_amount.value())
        .bind(item.line_total.value())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Completes the payment on an existing, unsettled order. Attaches the payment id if it is not
/// already set, advances a Pending order to Processing, and backfills the invoice number and tax
/// fields only where a prior writer has not committed a value (an untaxed order has `total = 0`).
/// All CASE expressions evaluate against the pre-update row, so no field is backfilled from a
/// value written in the same statement.
pub async fn complete_payment(
    order_pk: i64,
    ids: &TransactionIds,
    priced: Option<&PricedOrder>,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let b = priced.map(|p| &p.breakdown);
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_id = COALESCE(payment_id, $2),
                payment_status = 'Completed',
                order_status = CASE WHEN order_status = 'Pending' THEN 'Processing' ELSE order_status END,
                invoice_no = COALESCE(invoice_no, $3),
                subtotal = CASE WHEN total = 0 THEN COALESCE($4, subtotal) ELSE subtotal END,
                gst      = CASE WHEN total = 0 THEN COALESCE($5, gst)      ELSE gst      END,
                cgst     = CASE WHEN total = 0 THEN COALESCE($6, cgst)     ELSE cgst     END,
                sgst     = CASE WHEN total = 0 THEN COALESCE($7, sgst)     ELSE sgst     END,
                igst     = CASE WHEN total = 0 THEN COALESCE($8, igst)     ELSE igst     END,
                total    = CASE WHEN total = 0 THEN COALESCE($9, total)    ELSE total    END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(order_pk)
    .bind(ids.payment_id.as_ref().map(|p| p.as_str()))
    .bind(priced.map(|p| p.invoice_no.as_str()))
    .bind(b.map(|b| b.subtotal.value()))
    .bind(b.map(|b| b.gst.value()))
    .bind(b.map(|b| b.cgst.value()))
    .bind(b.map(|b| b.sgst.value()))
    .bind(b.map(|b| b.igst.value()))
    .bind(b.map(|b| b.total().value()))
    .fetch_optional(conn)
    .await?;
    trace!("📝️ Payment completion applied to order #{order_pk}");
    order.ok_or(PaymentGatewayError::OrderIdNotFound(order_pk))
}

pub async fn set_payment_failed(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = 'Failed', updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND payment_status != 'Completed'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Applies a fulfilment transition, guarded on the status the caller validated against. Zero rows
/// means the order moved underneath us (or never existed).
pub async fn update_order_status(
    order_id: &OrderId,
    from: OrderStatus,
    to: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET order_status = $3, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND order_status = $2
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(from.to_string())
    .bind(to.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
