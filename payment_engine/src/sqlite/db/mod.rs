//! # SQLite database methods
//!
//! "Low-level" SQLite interactions live here as plain functions taking a `&mut SqliteConnection`.
//! Callers can pass a pooled connection, or a transaction (`&mut tx`) when several calls must
//! commit or fail together — which is exactly what the reconcile flow does.

use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod orders;
pub mod products;

const SQLITE_DB_URL: &str = "sqlite://data/gpg_store.db";

pub fn db_url() -> String {
    let result = env::var("GPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("GPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
