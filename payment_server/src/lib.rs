//! # GPG server
//! This module hosts the HTTP surface of the GST payment gateway. It is responsible for:
//! Verifying gateway signatures on client payment confirmations and webhook deliveries.
//! Handing verified transactions to the reconciliation engine.
//! Serving order status to storefront pages and admin tooling.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payment/verify`: The synchronous confirmation route the storefront client calls after checkout.
//! * `/payment/webhook`: The asynchronous delivery route the payment gateway calls server-to-server.
//! * `/order/{order_id}`: The order status read route.
//! * `/order/{order_id}/status`: The admin fulfilment transition route.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

pub mod integrations;

#[cfg(test)]
mod endpoint_tests;
