//! # mostrador-db: The Local Ledger
//!
//! Durable on-device storage for the offline-first POS core.
//!
//! ## Responsibilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          mostrador-db                                   │
//! │                                                                         │
//! │  ✅ RESPONSIBILITIES                   ❌ NOT RESPONSIBLE FOR           │
//! │  ──────────────────────                ─────────────────────────        │
//! │  • Connection pool management          • Pricing (mostrador-core)       │
//! │  • Schema migrations                   • Network/sync (mostrador-sync)  │
//! │  • Sale ledger + line snapshots        • UI formatting                  │
//! │  • Sync status transitions             • Remote wire format             │
//! │  • Mirrored catalog upserts                                             │
//! │  • Sync cursor / generic queue                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The one place that needs a true atomic transaction is
//! [`repository::sale::SaleRepository::create_sale`]: a sale header and its
//! line snapshots are committed together or not at all, so the sync
//! coordinator never observes a partially written sale.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::catalog::CatalogRepository;
pub use repository::sale::SaleRepository;
pub use repository::sync_meta::{parse_cursor, SyncMetaRepository, LAST_PULL_SYNC};
