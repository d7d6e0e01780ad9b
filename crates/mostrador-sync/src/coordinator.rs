//! # Sync Coordinator
//!
//! Orchestrates push and pull against the remote API.
//!
//! ## Cycle Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           sync_all()                                    │
//! │                                                                         │
//! │  gate closed? ──────────────► Err(Offline), nothing attempted           │
//! │  flag already set? ─────────► Err(AlreadySyncing), nothing attempted    │
//! │                                                                         │
//! │  1. PUSH   oldest-first, strictly sequential                            │
//! │            pending ─► syncing ─► synced   (server refs stored)          │
//! │                           └────► error    (terminal, operator review)   │
//! │            one failed sale never aborts the batch                       │
//! │                                                                         │
//! │  2. PULL   cursor read ─► bounded fetches ─► mirror upserts             │
//! │            cursor advances to the pull START time, only on success.     │
//! │            A pull failure never undoes push results.                    │
//! │                                                                         │
//! │  3. recount pending, stamp last_sync_at, release the flag               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mutual-exclusion flag is released by a drop guard, so every exit path
//! (including an early `?`) leaves the coordinator runnable again.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use mostrador_db::{parse_cursor, Database, LAST_PULL_SYNC};

use crate::config::SyncConfig;
use crate::connectivity::ConnectivityGate;
use crate::error::{SyncError, SyncResult};
use crate::protocol::SalePushRequest;
use crate::remote::RemoteApi;

// =============================================================================
// Status Snapshot
// =============================================================================

/// Point-in-time view of the sync engine for status displays.
#[derive(Debug, Clone, Default)]
pub struct SyncStatusSnapshot {
    /// Whether a cycle is running right now.
    pub is_syncing: bool,

    /// Cached count of sales awaiting push.
    pub pending: i64,

    /// When the last cycle finished.
    pub last_sync_at: Option<DateTime<Utc>>,

    /// Most recent push or pull error message.
    pub last_error: Option<String>,
}

/// Outcome of one sync cycle.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Sales accepted by the remote this cycle.
    pub pushed: usize,

    /// Sales that failed and were parked in error.
    pub failed: usize,

    /// Product mirror rows refreshed.
    pub pulled_products: usize,

    /// Stock mirror rows refreshed.
    pub pulled_stock: usize,

    /// Pull phase failure, if any. Push results above still stand.
    pub pull_error: Option<String>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// The sync engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SyncCoordinator {
    db: Database,
    remote: Arc<dyn RemoteApi>,
    gate: ConnectivityGate,
    config: SyncConfig,

    /// Mutual-exclusion flag for `sync_all`.
    is_syncing: Arc<AtomicBool>,

    /// Cached pending count, refreshed by cycles and `recount_pending`.
    pending: Arc<AtomicI64>,

    last_sync_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_error: Arc<RwLock<Option<String>>>,
}

/// Releases the syncing flag on every exit path.
struct SyncingGuard(Arc<AtomicBool>);

impl Drop for SyncingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncCoordinator {
    /// Creates a coordinator over the given ledger, remote, and gate.
    pub fn new(
        db: Database,
        remote: Arc<dyn RemoteApi>,
        gate: ConnectivityGate,
        config: SyncConfig,
    ) -> Self {
        SyncCoordinator {
            db,
            remote,
            gate,
            config,
            is_syncing: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(AtomicI64::new(0)),
            last_sync_at: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the connectivity gate, for host applications to drive.
    pub fn gate(&self) -> &ConnectivityGate {
        &self.gate
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether a cycle should run: something pending, gate open, not already
    /// running.
    pub fn needs_sync(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
            && self.gate.is_online()
            && !self.is_syncing.load(Ordering::SeqCst)
    }

    /// Current status snapshot.
    pub async fn status(&self) -> SyncStatusSnapshot {
        SyncStatusSnapshot {
            is_syncing: self.is_syncing.load(Ordering::SeqCst),
            pending: self.pending.load(Ordering::SeqCst),
            last_sync_at: *self.last_sync_at.read().await,
            last_error: self.last_error.read().await.clone(),
        }
    }

    /// Refreshes the cached pending counter from the ledger.
    pub async fn recount_pending(&self) -> SyncResult<i64> {
        let count = self.db.sales().count_pending().await?;
        self.pending.store(count, Ordering::SeqCst);
        Ok(count)
    }

    /// Explicitly requeues an errored sale for the next cycle.
    ///
    /// The only path out of the error state; nothing requeues automatically.
    pub async fn requeue_sale(&self, sale_id: &str) -> SyncResult<()> {
        self.db.sales().requeue_errored(sale_id).await?;
        self.recount_pending().await?;
        Ok(())
    }

    // =========================================================================
    // The Cycle
    // =========================================================================

    /// Runs one full sync cycle: push, then pull.
    ///
    /// Refuses to run while offline ([`SyncError::Offline`]) or while another
    /// cycle holds the flag ([`SyncError::AlreadySyncing`]). The claim is a
    /// single `compare_exchange`, so two racing callers cannot both enter.
    pub async fn sync_all(&self) -> SyncResult<SyncReport> {
        if !self.gate.is_online() {
            return Err(SyncError::Offline);
        }

        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadySyncing);
        }
        let _guard = SyncingGuard(Arc::clone(&self.is_syncing));

        info!("Sync cycle started");
        let mut report = SyncReport::default();

        self.sync_pending_sales(&mut report).await?;

        // Pull failure stops only the pull phase. Pushed sales stay synced and
        // the cursor stays where it was, so the next cycle retries the window.
        if let Err(e) = self.pull_latest_data(&mut report).await {
            warn!(error = %e, "Pull phase failed, cursor left unadvanced");
            report.pull_error = Some(e.to_string());
            *self.last_error.write().await = Some(e.to_string());
        }

        self.recount_pending().await?;
        *self.last_sync_at.write().await = Some(Utc::now());

        info!(
            pushed = report.pushed,
            failed = report.failed,
            pulled_products = report.pulled_products,
            pulled_stock = report.pulled_stock,
            "Sync cycle finished"
        );
        Ok(report)
    }

    /// Pushes pending sales, oldest first, strictly sequentially.
    ///
    /// Each sale walks `pending → syncing → {synced | error}` on its ledger
    /// row. A remote rejection parks that one sale in error and moves on;
    /// only a ledger failure aborts the phase.
    async fn sync_pending_sales(&self, report: &mut SyncReport) -> SyncResult<()> {
        let pending = self.db.sales().list_pending().await?;
        if pending.is_empty() {
            debug!("No pending sales to push");
            return Ok(());
        }

        info!(count = pending.len(), "Pushing pending sales");
        let sales = self.db.sales();

        for sale in pending {
            // A lost claim means another path already took this sale; skip.
            if sales.mark_syncing(&sale.id).await.is_err() {
                debug!(id = %sale.id, "Sale no longer pending, skipping");
                continue;
            }

            let items = sales.get_items(&sale.id).await?;
            let request = SalePushRequest::from_sale(&sale, &items);

            match self.remote.push_sale(&request).await {
                Ok(response) => {
                    sales.mark_synced(&sale.id, &response.into()).await?;
                    report.pushed += 1;
                }
                Err(e) => {
                    let message = e.to_string();
                    sales.mark_error(&sale.id, &message).await?;
                    *self.last_error.write().await = Some(message);
                    report.failed += 1;
                }
            }
        }

        Ok(())
    }

    /// Pulls catalog and stock changes into the local mirror.
    ///
    /// The cursor is advanced to the pull START time, not the end: anything
    /// the remote changed while the pull was in flight lands in the next
    /// window instead of being skipped.
    async fn pull_latest_data(&self, report: &mut SyncReport) -> SyncResult<()> {
        let pull_started = Utc::now();
        let meta = self.db.sync_meta();

        let since = meta
            .get_cursor(LAST_PULL_SYNC)
            .await?
            .and_then(|value| parse_cursor(&value));

        debug!(?since, "Pulling catalog changes");

        let products = self
            .remote
            .fetch_products(since, self.config.pull_page_size)
            .await?;
        let stock = self
            .remote
            .fetch_stock(since, self.config.pull_page_size)
            .await?;

        let refreshed_at = Utc::now();
        let product_rows: Vec<_> = products
            .into_iter()
            .map(|record| record.into_mirror(refreshed_at))
            .collect();
        let stock_rows: Vec<_> = stock
            .into_iter()
            .map(|record| record.into_mirror(refreshed_at))
            .collect();

        let catalog = self.db.catalog();
        catalog.upsert_products(&product_rows).await?;
        catalog.upsert_stock(&stock_rows).await?;

        meta.set_cursor(LAST_PULL_SYNC, &pull_started.to_rfc3339())
            .await?;

        report.pulled_products = product_rows.len();
        report.pulled_stock = stock_rows.len();
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
