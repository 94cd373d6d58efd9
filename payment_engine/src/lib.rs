//! GST Payment Engine
//!
//! The provider-agnostic core of the payment gateway. It owns the hard part of the system: taking
//! a verified gateway transaction — delivered at-least-once over two independent, unordered paths
//! — and turning it into exactly one persisted order with a jurisdiction-aware GST breakdown and
//! a validated status lifecycle.
//!
//! The library is split into:
//! 1. The pure components: the tax calculator ([`mod@tax`]) and the status state machine
//!    ([`mod@state`]). These never touch storage.
//! 2. The storage capabilities ([`mod@traits`]) and the SQLite implementation ([`mod@sqlite`]).
//!    You should never need to reach into the database directly; go through the public API.
//! 3. The reconciliation API ([`OrderFlowApi`]), the single point of truth both request handlers
//!    terminate in.

pub mod db_types;
pub mod helpers;
pub mod state;
pub mod tax;
pub mod traits;

mod order_flow_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use order_flow_api::OrderFlowApi;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
