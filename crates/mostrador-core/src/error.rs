//! Domain error types for mostrador-core.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line id, sale id, etc.)
//! 3. Errors are enum variants, never bare strings

use thiserror::Error;

/// Core business logic errors.
///
/// These represent business rule violations. Checkout validation happens here,
/// before anything touches the ledger.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart operation referenced a line that is not in the cart.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Checkout was attempted on a cart with no lines.
    ///
    /// ## When This Occurs
    /// The cashier confirms a sale before scanning anything. Rejected before
    /// any persistence so the ledger never sees a zero-line sale.
    #[error("Cannot check out an empty cart")]
    EmptyCart,
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
