//! Repository modules for ledger access.
//!
//! Each repository wraps the shared pool and owns the SQL for one slice of
//! the schema:
//! - [`sale`] - the durable sale ledger and its sync-status transitions
//! - [`catalog`] - the mirrored product/stock cache (upsert-only)
//! - [`sync_meta`] - pull cursor storage and the generic sync queue

pub mod catalog;
pub mod sale;
pub mod sync_meta;
