//! # Background Scheduler
//!
//! Periodic driver for the coordinator.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         scheduler task                                  │
//! │                                                                         │
//! │  sync interval    ──► sync_all()  only when needs_sync()                │
//! │  recount interval ──► recount_pending()  (cheap, local-only)            │
//! │  manual trigger   ──► sync_all()  regardless of needs_sync();           │
//! │                       still refused while offline or already syncing    │
//! │  shutdown watch   ──► loop exits, task ends                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::SyncCoordinator;
use crate::error::SyncError;

/// Handle to the spawned scheduler task.
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Requests an immediate sync cycle (app foreground, user action).
    ///
    /// Returns false if the scheduler is gone or a trigger is already queued.
    pub fn trigger(&self) -> bool {
        self.trigger_tx.try_send(()).is_ok()
    }

    /// Stops the scheduler and waits for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
        info!("Scheduler stopped");
    }
}

/// Spawns the background scheduler for a coordinator.
pub fn spawn(coordinator: SyncCoordinator) -> SchedulerHandle {
    // Capacity 1: a burst of triggers collapses into one queued cycle
    let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let sync_interval = coordinator.config().sync_interval;
    let recount_interval = coordinator.config().recount_interval;

    let task = tokio::spawn(async move {
        let mut sync_tick = tokio::time::interval(sync_interval);
        let mut recount_tick = tokio::time::interval(recount_interval);
        // The immediate first tick would fire before anything is pending
        sync_tick.tick().await;
        recount_tick.tick().await;

        info!(
            sync_interval_secs = sync_interval.as_secs(),
            recount_interval_secs = recount_interval.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = sync_tick.tick() => {
                    if coordinator.needs_sync() {
                        run_cycle(&coordinator, "interval").await;
                    }
                }

                _ = recount_tick.tick() => {
                    if let Err(e) = coordinator.recount_pending().await {
                        warn!(error = %e, "Pending recount failed");
                    }
                }

                Some(()) = trigger_rx.recv() => {
                    run_cycle(&coordinator, "manual").await;
                }

                changed = shutdown_rx.changed() => {
                    // A dropped sender counts as shutdown too
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("Scheduler shutdown requested");
                        break;
                    }
                }
            }
        }
    });

    SchedulerHandle {
        trigger_tx,
        shutdown_tx,
        task,
    }
}

async fn run_cycle(coordinator: &SyncCoordinator, source: &str) {
    match coordinator.sync_all().await {
        Ok(report) => {
            debug!(
                source,
                pushed = report.pushed,
                failed = report.failed,
                "Scheduled sync cycle done"
            );
        }
        // Both are normal operating conditions, not failures
        Err(SyncError::Offline) => debug!(source, "Sync skipped: offline"),
        Err(SyncError::AlreadySyncing) => debug!(source, "Sync skipped: cycle in flight"),
        Err(e) => warn!(source, error = %e, "Scheduled sync cycle failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::connectivity::ConnectivityGate;
    use crate::error::SyncResult;
    use crate::protocol::{ProductRecord, SalePushRequest, SalePushResponse, StockRecord};
    use crate::remote::RemoteApi;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use mostrador_core::{Cart, InvoiceOptions, PaymentMethod, Product, SyncStatus};
    use mostrador_db::{Database, DbConfig};
    use std::sync::Arc;
    use std::time::Duration;

    struct AcceptAllRemote;

    #[async_trait]
    impl RemoteApi for AcceptAllRemote {
        async fn push_sale(&self, request: &SalePushRequest) -> SyncResult<SalePushResponse> {
            Ok(SalePushResponse {
                id: format!("srv-{}", request.local_sale_id),
                sale_number: "0001-00000001".to_string(),
                invoice_number: None,
                cae: None,
            })
        }

        async fn fetch_products(
            &self,
            _since: Option<DateTime<Utc>>,
            _limit: u32,
        ) -> SyncResult<Vec<ProductRecord>> {
            Ok(vec![])
        }

        async fn fetch_stock(
            &self,
            _since: Option<DateTime<Utc>>,
            _limit: u32,
        ) -> SyncResult<Vec<StockRecord>> {
            Ok(vec![])
        }
    }

    async fn checkout(db: &Database) -> String {
        let mut cart = Cart::new();
        cart.add_line(&Product {
            id: "p1".to_string(),
            tenant_id: "t-1".to_string(),
            sku: "SKU-p1".to_string(),
            name: "Yerba".to_string(),
            barcode: None,
            price_cents: 1210,
            cost_cents: None,
            tax_rate: Some(0.21),
            category_id: None,
            image_url: None,
            is_active: true,
            synced_at: Utc::now(),
        });
        db.sales()
            .create_sale(
                &cart,
                PaymentMethod::Cash,
                InvoiceOptions::default(),
                "t-1",
                "l-1",
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_manual_trigger_runs_a_cycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale_id = checkout(&db).await;

        let coordinator = SyncCoordinator::new(
            db.clone(),
            Arc::new(AcceptAllRemote),
            ConnectivityGate::new(true),
            // Long intervals: only the manual trigger can fire in this test
            SyncConfig::new("https://api.example.com")
                .sync_interval(Duration::from_secs(3600))
                .recount_interval(Duration::from_secs(3600)),
        );

        let handle = spawn(coordinator);
        assert!(handle.trigger());

        // Give the task a moment to process the trigger
        tokio::time::sleep(Duration::from_millis(100)).await;

        let sale = db.sales().get_by_id(&sale_id).await.unwrap();
        assert_eq!(sale.sync_status, SyncStatus::Synced);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_task() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coordinator = SyncCoordinator::new(
            db,
            Arc::new(AcceptAllRemote),
            ConnectivityGate::new(true),
            SyncConfig::new("https://api.example.com"),
        );

        let handle = spawn(coordinator);
        handle.shutdown().await;
    }
}
