//! Sale ledger repository.
//!
//! Owns the durable record of every finalized sale and its frozen line
//! snapshots, plus the sync-status transitions the coordinator drives:
//!
//! ```text
//! pending ──mark_syncing──► syncing ──mark_synced──► synced
//!    ▲                         │
//!    │                         └────mark_error────► error
//!    └───────────────requeue_errored────────────────────┘
//! ```
//!
//! Every transition is guarded by a `WHERE sync_status = ...` clause and
//! checked via `rows_affected()`, so two concurrent writers cannot both claim
//! the same sale and a stale transition is reported instead of silently
//! applied.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mostrador_core::{
    Cart, CoreError, InvoiceOptions, LocalSale, LocalSaleItem, PaymentMethod, ServerSaleRefs,
    SyncStatus,
};

use crate::error::{DbError, DbResult};

/// Repository for the local sale ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Finalizes a cart into the ledger.
    ///
    /// The sale header and all line snapshots are written in a single
    /// transaction: a crash mid-checkout leaves no partial sale behind. The
    /// cart is validated before any write; an empty cart is rejected with
    /// [`CoreError::EmptyCart`].
    ///
    /// The returned sale is born `pending` and carries a client-generated id
    /// that later doubles as the idempotency key on push.
    pub async fn create_sale(
        &self,
        cart: &Cart,
        payment_method: PaymentMethod,
        invoice: InvoiceOptions,
        tenant_id: &str,
        location_id: &str,
    ) -> DbResult<LocalSale> {
        if cart.is_empty() {
            return Err(DbError::Rejected(CoreError::EmptyCart));
        }

        let sale = LocalSale {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            location_id: location_id.to_string(),
            subtotal_cents: cart.totals.subtotal_cents,
            tax_cents: cart.totals.tax_cents,
            discount_cents: cart.totals.discount_cents,
            total_cents: cart.totals.total_cents,
            customer_name: cart.customer.as_ref().and_then(|c| c.name.clone()),
            customer_email: cart.customer.as_ref().and_then(|c| c.email.clone()),
            customer_tax_id: cart.customer.as_ref().and_then(|c| c.tax_id.clone()),
            customer_phone: cart.customer.as_ref().and_then(|c| c.phone.clone()),
            payment_method,
            generate_invoice: invoice.generate_invoice,
            invoice_type: invoice.invoice_type,
            notes: cart.notes.clone(),
            sync_status: SyncStatus::Pending,
            synced_at: None,
            sync_error: None,
            server_id: None,
            sale_number: None,
            invoice_number: None,
            cae: None,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO local_sales (
                id, tenant_id, location_id,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                customer_name, customer_email, customer_tax_id, customer_phone,
                payment_method, generate_invoice, invoice_type, notes,
                sync_status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.location_id)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(&sale.customer_name)
        .bind(&sale.customer_email)
        .bind(&sale.customer_tax_id)
        .bind(&sale.customer_phone)
        .bind(sale.payment_method)
        .bind(sale.generate_invoice)
        .bind(&sale.invoice_type)
        .bind(&sale.notes)
        .bind(sale.sync_status)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &cart.lines {
            sqlx::query(
                r#"
                INSERT INTO local_sale_items (
                    id, sale_id, product_id, name, sku,
                    quantity, unit_price_cents, tax_rate,
                    discount_percent, line_total_cents
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(&line.sku)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.tax_rate)
            .bind(line.discount_percent)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            total_cents = sale.total_cents,
            lines = cart.lines.len(),
            "Sale finalized into local ledger"
        );

        Ok(sale)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fetches a sale by its local id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<LocalSale> {
        sqlx::query_as::<_, LocalSale>("SELECT * FROM local_sales WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Fetches the frozen line snapshots of a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<LocalSaleItem>> {
        let items = sqlx::query_as::<_, LocalSaleItem>(
            "SELECT * FROM local_sale_items WHERE sale_id = ? ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists all pending sales, oldest first.
    ///
    /// Oldest-first ordering means a sync cycle drains the backlog in the
    /// order sales actually happened.
    pub async fn list_pending(&self) -> DbResult<Vec<LocalSale>> {
        let sales = sqlx::query_as::<_, LocalSale>(
            "SELECT * FROM local_sales WHERE sync_status = ? ORDER BY created_at ASC",
        )
        .bind(SyncStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists errored sales for operator review, oldest first.
    pub async fn list_errored(&self) -> DbResult<Vec<LocalSale>> {
        let sales = sqlx::query_as::<_, LocalSale>(
            "SELECT * FROM local_sales WHERE sync_status = ? ORDER BY created_at ASC",
        )
        .bind(SyncStatus::Error)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists the most recent sales regardless of status, newest first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<LocalSale>> {
        let sales = sqlx::query_as::<_, LocalSale>(
            "SELECT * FROM local_sales ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Counts sales awaiting push.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM local_sales WHERE sync_status = ?")
                .bind(SyncStatus::Pending)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    // =========================================================================
    // Sync-status transitions
    // =========================================================================

    /// Claims a pending sale for the current sync cycle (`pending → syncing`).
    ///
    /// Fails with `NotFound` if the sale does not exist or is not pending,
    /// which is how a second concurrent claimer loses the race.
    pub async fn mark_syncing(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE local_sales SET sync_status = ? WHERE id = ? AND sync_status = ?",
        )
        .bind(SyncStatus::Syncing)
        .bind(id)
        .bind(SyncStatus::Pending)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending sale", id));
        }

        debug!(id = %id, "Sale claimed for sync");
        Ok(())
    }

    /// Records a successful push (`syncing → synced`).
    ///
    /// Stamps `synced_at`, stores the server-assigned identifiers, and clears
    /// any previous error message.
    pub async fn mark_synced(&self, id: &str, refs: &ServerSaleRefs) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE local_sales
            SET sync_status = ?,
                synced_at = ?,
                sync_error = NULL,
                server_id = ?,
                sale_number = ?,
                invoice_number = ?,
                cae = ?
            WHERE id = ? AND sync_status = ?
            "#,
        )
        .bind(SyncStatus::Synced)
        .bind(Utc::now())
        .bind(&refs.server_id)
        .bind(&refs.sale_number)
        .bind(&refs.invoice_number)
        .bind(&refs.cae)
        .bind(id)
        .bind(SyncStatus::Syncing)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Syncing sale", id));
        }

        info!(id = %id, server_id = %refs.server_id, "Sale synced");
        Ok(())
    }

    /// Records a failed push (`syncing → error`).
    ///
    /// Error is terminal for automatic sync: the sale drops out of the
    /// pending set and stays put until an operator calls
    /// [`requeue_errored`](Self::requeue_errored).
    pub async fn mark_error(&self, id: &str, message: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE local_sales SET sync_status = ?, sync_error = ? WHERE id = ? AND sync_status = ?",
        )
        .bind(SyncStatus::Error)
        .bind(message)
        .bind(id)
        .bind(SyncStatus::Syncing)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Syncing sale", id));
        }

        warn!(id = %id, error = %message, "Sale push failed, held for review");
        Ok(())
    }

    /// Explicitly requeues an errored sale (`error → pending`).
    ///
    /// The stored error message is kept until the next transition so the
    /// operator can still see why the last attempt failed.
    pub async fn requeue_errored(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE local_sales SET sync_status = ? WHERE id = ? AND sync_status = ?",
        )
        .bind(SyncStatus::Pending)
        .bind(id)
        .bind(SyncStatus::Error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Errored sale", id));
        }

        info!(id = %id, "Errored sale requeued for sync");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
