//! Mirrored catalog repository.
//!
//! Products and stock are remote truth cached locally: the pull phase
//! upserts whole rows keyed by their remote ids, and nothing on-device ever
//! authors or edits them. Re-applying the same pull page is a no-op, which
//! is what makes pull retries safe.

use sqlx::SqlitePool;
use tracing::debug;

use mostrador_core::{Product, Stock};

use crate::error::DbResult;

/// Repository for the read-only product/stock mirror.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Upserts (pull phase)
    // =========================================================================

    /// Upserts a batch of product rows, full-row replace keyed by remote id.
    pub async fn upsert_products(&self, products: &[Product]) -> DbResult<()> {
        for product in products {
            sqlx::query(
                r#"
                INSERT INTO products (
                    id, tenant_id, sku, name, barcode,
                    price_cents, cost_cents, tax_rate,
                    category_id, image_url, is_active, synced_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (id) DO UPDATE SET
                    tenant_id = excluded.tenant_id,
                    sku = excluded.sku,
                    name = excluded.name,
                    barcode = excluded.barcode,
                    price_cents = excluded.price_cents,
                    cost_cents = excluded.cost_cents,
                    tax_rate = excluded.tax_rate,
                    category_id = excluded.category_id,
                    image_url = excluded.image_url,
                    is_active = excluded.is_active,
                    synced_at = excluded.synced_at
                "#,
            )
            .bind(&product.id)
            .bind(&product.tenant_id)
            .bind(&product.sku)
            .bind(&product.name)
            .bind(&product.barcode)
            .bind(product.price_cents)
            .bind(product.cost_cents)
            .bind(product.tax_rate)
            .bind(&product.category_id)
            .bind(&product.image_url)
            .bind(product.is_active)
            .bind(product.synced_at)
            .execute(&self.pool)
            .await?;
        }

        debug!(count = products.len(), "Product mirror refreshed");
        Ok(())
    }

    /// Upserts a batch of stock rows, full-row replace keyed by remote id.
    pub async fn upsert_stock(&self, rows: &[Stock]) -> DbResult<()> {
        for stock in rows {
            sqlx::query(
                r#"
                INSERT INTO stock (
                    id, tenant_id, product_id, location_id, quantity, synced_at
                )
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (id) DO UPDATE SET
                    tenant_id = excluded.tenant_id,
                    product_id = excluded.product_id,
                    location_id = excluded.location_id,
                    quantity = excluded.quantity,
                    synced_at = excluded.synced_at
                "#,
            )
            .bind(&stock.id)
            .bind(&stock.tenant_id)
            .bind(&stock.product_id)
            .bind(&stock.location_id)
            .bind(stock.quantity)
            .bind(stock.synced_at)
            .execute(&self.pool)
            .await?;
        }

        debug!(count = rows.len(), "Stock mirror refreshed");
        Ok(())
    }

    // =========================================================================
    // Reads (cart / UI side)
    // =========================================================================

    /// Fetches a product by its remote id, `None` if not mirrored.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Fetches a product by SKU (barcode-scanner path).
    pub async fn get_product_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products, alphabetically.
    pub async fn list_active_products(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Fetches mirrored stock for a product, all locations.
    pub async fn get_stock_for_product(&self, product_id: &str) -> DbResult<Vec<Stock>> {
        let rows = sqlx::query_as::<_, Stock>("SELECT * FROM stock WHERE product_id = ?")
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
