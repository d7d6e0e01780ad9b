//! # mostrador-core: Pure Business Logic for Mostrador
//!
//! This crate is the **heart** of the offline-first POS core. It contains the
//! cart/pricing engine and every domain type as pure code with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mostrador Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              ★ mostrador-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐      ┌───────────┐      ┌───────────┐          │   │
//! │  │   │   types   │      │   cart    │      │   error   │          │   │
//! │  │   │ LocalSale │      │   Cart    │      │ CoreError │          │   │
//! │  │   │  Product  │      │ CartLine  │      │           │          │   │
//! │  │   └───────────┘      └───────────┘      └───────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               mostrador-db (Local Ledger, SQLite)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             mostrador-sync (Connectivity + push/pull)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: cart recomputation is deterministic
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Tax-inclusive pricing**: prices already contain the tax component;
//!    tax is extracted as `price − price/(1+rate)`, never added on top
//! 4. **Late rounding**: intermediate pricing math stays in `f64`; amounts are
//!    rounded to integer cents once, at the end of each recomputation

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID for v0.1 (single-tenant runtime with multi-tenant schema)
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Default location ID for v0.1 (single-location runtime)
pub const DEFAULT_LOCATION_ID: &str = "00000000-0000-0000-0000-0000000000a1";

/// Tax rate used when a catalog product carries none (21% IVA).
pub const DEFAULT_TAX_RATE: f64 = 0.21;
