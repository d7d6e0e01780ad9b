//! # mostrador-sync: The Sync Engine
//!
//! Reconciles the local ledger with the remote Sales/Catalog APIs.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         mostrador-sync                                  │
//! │                                                                         │
//! │  ┌────────────────┐    declares      ┌──────────────────────────────┐  │
//! │  │  host app /    ├─────────────────►│  ConnectivityGate            │  │
//! │  │  OS events     │   online state   │  (AtomicBool, no probing)    │  │
//! │  └───────┬────────┘                  └──────────────┬───────────────┘  │
//! │          │ trigger                                  │ gates            │
//! │          ▼                                          ▼                  │
//! │  ┌────────────────┐   drives   ┌──────────────────────────────┐        │
//! │  │  scheduler     ├───────────►│  SyncCoordinator             │        │
//! │  │  (tokio task)  │            │  push then pull, exclusive   │        │
//! │  └────────────────┘            └──────────┬───────────────────┘        │
//! │                                           │ RemoteApi (trait)          │
//! │                                           ▼                            │
//! │                                ┌──────────────────────────────┐        │
//! │                                │  HttpRemote (reqwest)        │        │
//! │                                │  FakeRemote (tests)          │        │
//! │                                └──────────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Offline-first Contract
//! A sale is durable the instant checkout commits; sync is a background
//! reconciliation that can lag, fail, and resume without ever losing or
//! double-recording a sale. The local sale id is the idempotency key.

pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod error;
pub mod protocol;
pub mod remote;
pub mod scheduler;

pub use config::SyncConfig;
pub use connectivity::ConnectivityGate;
pub use coordinator::{SyncCoordinator, SyncReport, SyncStatusSnapshot};
pub use error::{SyncError, SyncResult};
pub use protocol::{
    ProductRecord, SalePushItem, SalePushRequest, SalePushResponse, StockRecord,
};
pub use remote::{HttpRemote, RemoteApi};
pub use scheduler::{spawn, SchedulerHandle};
