use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::Product;

/// Fetch the catalog rows for the given product ids. Missing ids are simply absent from the
/// result; the tax calculator decides whether that is fatal.
pub async fn products_by_ids(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

/// Insert or replace a catalog row. The gateway itself never calls this in production — catalog
/// maintenance belongs to the store admin — but seeding is needed for tests and local setups.
pub async fn upsert_product(product: &Product, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO products (id, name, hsn_code, unit_price, gst_rate) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                hsn_code = excluded.hsn_code,
                unit_price = excluded.unit_price,
                gst_rate = excluded.gst_rate;
        "#,
    )
    .bind(product.id)
    .bind(product.name.as_str())
    .bind(product.hsn_code.as_str())
    .bind(product.unit_price.value())
    .bind(product.gst_rate.map(|r| r.basis_points()))
    .execute(conn)
    .await?;
    Ok(())
}
