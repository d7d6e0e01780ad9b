//! # Domain Types
//!
//! Core domain types used throughout Mostrador.
//!
//! ## Snapshot-vs-mirror split
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Mirrored catalog (remote truth)        Local ledger (device truth)     │
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐      ┌─────────────────────────────┐ │
//! │  │   Product   │  │    Stock    │      │  LocalSale                  │ │
//! │  │  upsert-only│  │  upsert-only│      │   └── LocalSaleItem (frozen │ │
//! │  │  never      │  │  never      │      │       product snapshot,    │ │
//! │  │  authored   │  │  authored   │      │       immune to later      │ │
//! │  │  locally    │  │  locally    │      │       catalog edits)       │ │
//! │  └─────────────┘  └─────────────┘      └─────────────────────────────┘ │
//! │                                                                         │
//! │  Sale line rows COPY product fields at checkout time. They never join  │
//! │  back to the live mirror.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Sync Status
// =============================================================================

/// Per-sale synchronization state machine.
///
/// ```text
/// pending ──► syncing ──► synced
///                 │
///                 └──────► error   (terminal for automatic sync; an operator
///                                   must explicitly requeue it to pending)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Finalized locally, not yet pushed.
    Pending,
    /// A sync cycle is currently pushing this sale.
    Syncing,
    /// Accepted by the remote Sales API.
    Synced,
    /// Push failed; held for operator review, never auto-retried.
    Error,
}

impl Default for SyncStatus {
    fn default() -> Self {
        SyncStatus::Pending
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer / QR payment.
    Transfer,
}

// =============================================================================
// Customer Snapshot
// =============================================================================

/// Customer data captured on the cart and frozen into the sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Tax identifier (CUIT/CUIL) for invoiced sales.
    pub tax_id: Option<String>,
    pub phone: Option<String>,
}

/// Partial customer update, shallow-merged into the current snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    /// Shallow-merges a patch: fields present in the patch overwrite, fields
    /// absent are kept.
    pub fn apply(&mut self, patch: CustomerPatch) {
        if patch.name.is_some() {
            self.name = patch.name;
        }
        if patch.email.is_some() {
            self.email = patch.email;
        }
        if patch.tax_id.is_some() {
            self.tax_id = patch.tax_id;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
    }
}

// =============================================================================
// Invoice Options
// =============================================================================

/// Invoice request flags captured at checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceOptions {
    /// Ask the remote to generate a fiscal invoice for this sale.
    pub generate_invoice: bool,
    /// Invoice class ("A", "B", "C") when one is requested.
    pub invoice_type: Option<String>,
}

// =============================================================================
// Mirrored Catalog
// =============================================================================

/// A product row in the mirrored catalog.
///
/// Read-only local cache of remote truth: rows are upserted by the pull phase
/// and never authored on-device. `synced_at` records when this mirror row was
/// last refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Remote identifier (authoritative key).
    pub id: String,
    pub tenant_id: String,
    pub sku: String,
    pub name: String,
    pub barcode: Option<String>,
    /// Tax-inclusive price in cents.
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    /// Tax rate as a fraction (0.21 = 21%).
    pub tax_rate: Option<f64>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    /// When this mirror row was last refreshed from the remote.
    pub synced_at: DateTime<Utc>,
}

/// A stock row in the mirrored catalog (one per product per location).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Stock {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
    pub synced_at: DateTime<Utc>,
}

// =============================================================================
// Local Sale (the durable ledger record)
// =============================================================================

/// A finalized sale in the local ledger.
///
/// The business snapshot (totals, customer, payment, lines) is immutable once
/// created. Only the sync bookkeeping fields (`sync_status`, `synced_at`,
/// `sync_error`, and the server-assigned identifiers) ever change afterwards,
/// and only the ledger changes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LocalSale {
    /// Client-generated id; doubles as the idempotency key on push.
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,

    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,

    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_tax_id: Option<String>,
    pub customer_phone: Option<String>,

    pub payment_method: PaymentMethod,
    pub generate_invoice: bool,
    pub invoice_type: Option<String>,
    pub notes: Option<String>,

    pub sync_status: SyncStatus,
    pub synced_at: Option<DateTime<Utc>>,
    pub sync_error: Option<String>,
    /// Remote id assigned by the Sales API once pushed.
    pub server_id: Option<String>,
    /// Server-assigned sale number.
    pub sale_number: Option<String>,
    /// Server-assigned invoice number, when an invoice was generated.
    pub invoice_number: Option<String>,
    /// Fiscal authorization code (CAE) for invoiced sales.
    pub cae: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A line item of a [`LocalSale`].
///
/// Product fields are frozen copies taken at checkout so historical sales are
/// unaffected by later catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LocalSaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate: f64,
    pub discount_percent: f64,
    pub line_total_cents: i64,
}

/// Identifiers assigned by the remote Sales API when a push is accepted.
///
/// Stored onto the local sale by `mark_synced`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSaleRefs {
    /// Remote sale id.
    pub server_id: String,
    pub sale_number: String,
    pub invoice_number: Option<String>,
    /// Fiscal authorization code, when an invoice was generated.
    pub cae: Option<String>,
}

// =============================================================================
// Generic Sync Queue (outbox for non-sale mutations)
// =============================================================================

/// Lifecycle of a generic sync queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// An entry in the generic sync queue.
///
/// Sales use their own pending-flag path on `local_sales`; this queue is the
/// generalization point for future non-sale mutations (returns, cash counts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SyncQueueEntry {
    pub id: String,
    /// Operation kind: "create", "update", "delete".
    pub operation: String,
    pub entity_type: String,
    pub entity_id: String,
    /// Full entity payload as JSON.
    pub payload: String,
    pub status: QueueStatus,
    pub attempts: i64,
    pub last_attempt: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_default() {
        assert_eq!(SyncStatus::default(), SyncStatus::Pending);
    }

    #[test]
    fn test_customer_patch_is_shallow_merge() {
        let mut customer = Customer {
            name: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            tax_id: None,
            phone: None,
        };

        customer.apply(CustomerPatch {
            tax_id: Some("20-12345678-9".to_string()),
            ..Default::default()
        });

        // Existing fields survive, patched field lands
        assert_eq!(customer.name.as_deref(), Some("Ana"));
        assert_eq!(customer.email.as_deref(), Some("ana@example.com"));
        assert_eq!(customer.tax_id.as_deref(), Some("20-12345678-9"));
    }

    #[test]
    fn test_customer_patch_overwrites_present_fields() {
        let mut customer = Customer {
            name: Some("Ana".to_string()),
            ..Default::default()
        };

        customer.apply(CustomerPatch {
            name: Some("Ana María".to_string()),
            ..Default::default()
        });

        assert_eq!(customer.name.as_deref(), Some("Ana María"));
    }
}
