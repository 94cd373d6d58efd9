//! GST pricing and the jurisdictional split.
//!
//! Everything in this module is pure. Per-line GST is rounded half-up to the nearest paise and
//! each line rounds independently, so the order total can drift from an unrounded ideal by up to
//! one paise per line. That drift is documented behaviour, not eliminated.

use gpg_common::{Paise, DEFAULT_GST_RATE};
use serde::Serialize;
use thiserror::Error;

use crate::db_types::{DraftLineItem, NewLineItem, Product};

/// The largest quantity a single line may carry. No genuine cart orders a million units; anything
/// beyond this is a malformed or hostile payload and is rejected before any arithmetic happens.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

#[derive(Debug, Clone, Error)]
pub enum TaxError {
    #[error("Product {0} is not in the catalog")]
    UnknownProduct(i64),
    #[error("Line for product {0} has non-positive quantity")]
    InvalidQuantity(i64),
    #[error("Line for product {0} exceeds {MAX_LINE_QUANTITY} units")]
    ExcessiveQuantity(i64),
    #[error("Line for product {0} overflows the representable amount")]
    AmountOverflow(i64),
}

//--------------------------------------     TaxBreakdown      -------------------------------------------------------
/// The order-level tax summary. CGST and SGST are populated together or not at all, and are
/// mutually exclusive with a non-zero IGST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub subtotal: Paise,
    pub gst: Paise,
    pub cgst: Paise,
    pub sgst: Paise,
    pub igst: Paise,
}

impl TaxBreakdown {
    /// The grand total payable. Always exactly `subtotal + gst` in stored paise.
    pub fn total(&self) -> Paise {
        self.subtotal + self.gst
    }
}

/// Price a single catalog product for `quantity` units. Quantities come from the client, so every
/// multiply and add on the line is checked rather than allowed to wrap into a wrong amount.
pub fn price_line(product: &Product, quantity: i64) -> Result<NewLineItem, TaxError> {
    let rate = product.gst_rate.unwrap_or(DEFAULT_GST_RATE);
    let net = product.unit_price.checked_mul(quantity).ok_or(TaxError::AmountOverflow(product.id))?;
    let gst_amount = rate.gst_on(product.unit_price, quantity);
    let line_total = net.checked_add(gst_amount).ok_or(TaxError::AmountOverflow(product.id))?;
    Ok(NewLineItem {
        product_id: product.id,
        product_name: product.name.clone(),
        hsn_code: product.hsn_code.clone(),
        quantity,
        unit_price: product.unit_price,
        gst_rate: rate,
        gst_amount,
        line_total,
    })
}

/// Price a whole draft against the catalog. Every draft line must resolve to a product; an
/// unknown id rejects the draft rather than silently pricing a partial order.
pub fn price_order(items: &[DraftLineItem], products: &[Product]) -> Result<Vec<NewLineItem>, TaxError> {
    items
        .iter()
        .map(|item| {
            if item.quantity <= 0 {
                return Err(TaxError::InvalidQuantity(item.product_id));
            }
            if item.quantity > MAX_LINE_QUANTITY {
                return Err(TaxError::ExcessiveQuantity(item.product_id));
            }
            let product = products
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or(TaxError::UnknownProduct(item.product_id))?;
            price_line(product, item.quantity)
        })
        .collect()
}

/// Compute the order-level breakdown from priced lines and the shipping destination.
///
/// Intra-state orders split the GST evenly into CGST and SGST; when the total is an odd number of
/// paise the extra paise lands on SGST. Inter-state orders carry the whole amount as IGST.
pub fn breakdown(lines: &[NewLineItem], ship_state: &str, seller_state: &str) -> TaxBreakdown {
    // the net was computed (and overflow-checked) at pricing time; recover it from the line
    let subtotal: Paise = lines.iter().map(|l| l.line_total - l.gst_amount).sum();
    let gst: Paise = lines.iter().map(|l| l.gst_amount).sum();
    if subtotal.is_zero() {
        return TaxBreakdown::default();
    }
    let (cgst, sgst, igst) = if same_state(ship_state, seller_state) {
        let half = Paise::from(gst.value() / 2);
        (half, gst - half, Paise::default())
    } else {
        (Paise::default(), Paise::default(), gst)
    };
    TaxBreakdown { subtotal, gst, cgst, sgst, igst }
}

/// State names arrive from checkout forms; compare them leniently.
pub fn same_state(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
