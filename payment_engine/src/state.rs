//! The order and payment lifecycle rules.
//!
//! Transitions are validated here before any write happens, so a rejected transition leaves the
//! stored order untouched. The fulfilment axis and the payment axis are independent.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderStatus, PaymentStatus};

/// Who is asking for the transition. Payment-driven moves come from the reconciler itself and are
/// attributed to `System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    System,
    Admin,
    Customer,
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::System => write!(f, "System"),
            Actor::Admin => write!(f, "Admin"),
            Actor::Customer => write!(f, "Customer"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("An order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("{actor} is not permitted to move an order from {from} to {to}")]
    ActorNotAllowed { actor: Actor, from: OrderStatus, to: OrderStatus },
    #[error("A payment cannot move from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },
}

/// Validate a fulfilment transition. Returns the new status on success.
///
/// | From \ To  | Processing | Shipped | Delivered | Cancelled |
/// |------------|------------|---------|-----------|-----------|
/// | Pending    | System     | -       | -         | Admin     |
/// | Processing | -          | Admin   | -         | Admin     |
/// | Shipped    | -          | -       | Admin/Cust| -         |
/// | Delivered  | -          | -       | -         | -         |
/// | Cancelled  | -          | -       | -         | -         |
///
/// `Delivered` and `Cancelled` are terminal, and cancellation is off the table once the order has
/// shipped.
pub fn next_order_status(from: OrderStatus, to: OrderStatus, actor: Actor) -> Result<OrderStatus, TransitionError> {
    use OrderStatus::*;
    let allowed: &[Actor] = match (from, to) {
        (Pending, Processing) => &[Actor::System],
        (Processing, Shipped) => &[Actor::Admin],
        (Shipped, Delivered) => &[Actor::Admin, Actor::Customer],
        (Pending | Processing, Cancelled) => &[Actor::Admin],
        (from, to) => return Err(TransitionError::InvalidTransition { from, to }),
    };
    if allowed.contains(&actor) {
        Ok(to)
    } else {
        Err(TransitionError::ActorNotAllowed { actor, from, to })
    }
}

/// Validate a payment-axis transition. `Completed` is terminal. `Failed` is not: the gateway's
/// failure report may describe an earlier attempt on the same checkout, so a later capture still
/// completes a failed payment. A failure report never downgrades a completed one.
pub fn next_payment_status(from: PaymentStatus, to: PaymentStatus) -> Result<PaymentStatus, TransitionError> {
    use PaymentStatus::*;
    match (from, to) {
        (Pending, Completed) | (Pending, Failed) | (Failed, Completed) => Ok(to),
        (from, to) => Err(TransitionError::InvalidPaymentTransition { from, to }),
    }
}
