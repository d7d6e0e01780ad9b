//! End-to-end flow: cart → checkout → offline ledger → sync → server refs.
//!
//! Exercises the whole stack with an in-process fake remote: sales finalized
//! while offline survive, sync drains them once connectivity is declared, a
//! replayed push is deduplicated by the local sale id, and errored sales stay
//! parked until explicitly requeued.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mostrador_core::{
    Cart, CustomerPatch, InvoiceOptions, PaymentMethod, Product, SyncStatus, DEFAULT_LOCATION_ID,
    DEFAULT_TENANT_ID,
};
use mostrador_db::{Database, DbConfig};
use mostrador_sync::{
    ConnectivityGate, ProductRecord, RemoteApi, SalePushRequest, SalePushResponse, StockRecord,
    SyncConfig, SyncCoordinator, SyncError, SyncResult,
};

// =============================================================================
// Fake Remote
// =============================================================================

/// Records accepted pushes and enforces idempotency on `localSaleId`, like
/// the real Sales API.
#[derive(Default)]
struct FakeRemote {
    accepted: Mutex<Vec<SalePushRequest>>,
    seen_keys: Mutex<HashSet<String>>,
    outage: AtomicBool,
}

impl FakeRemote {
    fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    fn accepted_count(&self) -> usize {
        self.accepted.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn push_sale(&self, request: &SalePushRequest) -> SyncResult<SalePushResponse> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(SyncError::remote(503, "service unavailable"));
        }

        let mut seen = self.seen_keys.lock().unwrap();
        if !seen.insert(request.local_sale_id.clone()) {
            // Replay of an already-recorded sale: acknowledged, not re-recorded
            return Ok(SalePushResponse {
                id: format!("srv-{}", request.local_sale_id),
                sale_number: "0001-00000001".to_string(),
                invoice_number: None,
                cae: None,
            });
        }
        drop(seen);

        self.accepted.lock().unwrap().push(request.clone());
        Ok(SalePushResponse {
            id: format!("srv-{}", request.local_sale_id),
            sale_number: format!("0001-{:08}", self.accepted_count()),
            invoice_number: request
                .generate_invoice
                .then(|| format!("B-0001-{:08}", self.accepted_count())),
            cae: request.generate_invoice.then(|| "71234567890123".to_string()),
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

// =============================================================================
// Helpers
// =============================================================================

fn yerba() -> Product {
    Product {
        id: "p-yerba".to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        sku: "YER-500".to_string(),
        name: "Yerba 500g".to_string(),
        barcode: Some("7790000000001".to_string()),
        price_cents: 2420,
        cost_cents: Some(1500),
        tax_rate: Some(0.21),
        category_id: None,
        image_url: None,
        is_active: true,
        synced_at: Utc::now(),
    }
}

async fn setup() -> (SyncCoordinator, Arc<FakeRemote>, Database, ConnectivityGate) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let remote = Arc::new(FakeRemote::default());
    let gate = ConnectivityGate::new(false);
    let coordinator = SyncCoordinator::new(
        db.clone(),
        remote.clone(),
        gate.clone(),
        SyncConfig::new("https://api.example.com"),
    );
    (coordinator, remote, db, gate)
}

async fn checkout_invoiced(db: &Database) -> String {
    let mut cart = Cart::new();
    cart.add_line(&yerba());
    cart.add_line(&yerba()); // merges into quantity 2
    cart.set_customer(CustomerPatch {
        name: Some("Ana García".to_string()),
        tax_id: Some("27-23456789-4".to_string()),
        ..Default::default()
    });

    db.sales()
        .create_sale(
            &cart,
            PaymentMethod::Card,
            InvoiceOptions {
                generate_invoice: true,
                invoice_type: Some("B".to_string()),
            },
            DEFAULT_TENANT_ID,
            DEFAULT_LOCATION_ID,
        )
        .await
        .unwrap()
        .id
}

// =============================================================================
// Flows
// =============================================================================

#[tokio::test]
async fn offline_sales_survive_and_drain_once_online() {
    let (coordinator, remote, db, gate) = setup().await;

    // Sell twice while offline; both are durable immediately
    let first = checkout_invoiced(&db).await;
    let second = checkout_invoiced(&db).await;
    assert_eq!(db.sales().count_pending().await.unwrap(), 2);

    // Offline: the cycle refuses to even start
    assert!(matches!(
        coordinator.sync_all().await.unwrap_err(),
        SyncError::Offline
    ));

    // Connectivity declared: one cycle drains the backlog oldest-first
    gate.set_online(true);
    let report = coordinator.sync_all().await.unwrap();
    assert_eq!(report.pushed, 2);
    assert_eq!(remote.accepted_count(), 2);

    let pushes = remote.accepted.lock().unwrap();
    assert_eq!(pushes[0].local_sale_id, first);
    assert_eq!(pushes[1].local_sale_id, second);
    assert_eq!(pushes[0].items[0].quantity, 2);
    assert_eq!(pushes[0].customer_cuit.as_deref(), Some("27-23456789-4"));
    drop(pushes);

    // Server refs landed on the ledger rows
    let sale = db.sales().get_by_id(&first).await.unwrap();
    assert_eq!(sale.sync_status, SyncStatus::Synced);
    assert!(sale.invoice_number.is_some());
    assert!(sale.cae.is_some());
}

#[tokio::test]
async fn replayed_push_is_deduplicated_not_double_recorded() {
    let (coordinator, remote, db, gate) = setup().await;
    gate.set_online(true);

    let sale_id = checkout_invoiced(&db).await;
    coordinator.sync_all().await.unwrap();
    assert_eq!(remote.accepted_count(), 1);

    // Simulate a lost acknowledgment: force the same sale pending again and
    // push it a second time
    sqlx::query("UPDATE local_sales SET sync_status = 'pending' WHERE id = ?")
        .bind(&sale_id)
        .execute(db.pool())
        .await
        .unwrap();
    coordinator.recount_pending().await.unwrap();

    let report = coordinator.sync_all().await.unwrap();
    assert_eq!(report.pushed, 1);
    // The remote acknowledged but recorded nothing new
    assert_eq!(remote.accepted_count(), 1);
}

#[tokio::test]
async fn outage_parks_sales_until_operator_requeues() {
    let (coordinator, remote, db, gate) = setup().await;
    gate.set_online(true);
    remote.set_outage(true);

    let sale_id = checkout_invoiced(&db).await;
    let report = coordinator.sync_all().await.unwrap();
    assert_eq!(report.failed, 1);

    let sale = db.sales().get_by_id(&sale_id).await.unwrap();
    assert_eq!(sale.sync_status, SyncStatus::Error);
    assert!(sale.sync_error.is_some());

    // Outage over, but nothing retries on its own
    remote.set_outage(false);
    let report = coordinator.sync_all().await.unwrap();
    assert_eq!(report.pushed, 0);

    // Operator requeues; the next cycle lands it
    coordinator.requeue_sale(&sale_id).await.unwrap();
    let report = coordinator.sync_all().await.unwrap();
    assert_eq!(report.pushed, 1);
    assert_eq!(
        db.sales().get_by_id(&sale_id).await.unwrap().sync_status,
        SyncStatus::Synced
    );
}
