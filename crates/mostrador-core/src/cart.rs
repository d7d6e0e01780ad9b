//! # Cart / Pricing Engine
//!
//! Holds the in-memory mutable cart and recomputes tax-inclusive totals
//! deterministically after every mutation.
//!
//! ## Pricing Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Tax-inclusive cascading discounts                     │
//! │                                                                         │
//! │  per line:   discounted = qty × unit_price × (1 − line_disc/100)       │
//! │              tax        = discounted − discounted/(1 + tax_rate)       │
//! │                                                                         │
//! │  cart:       subtotal = Σ discounted          (f64, unrounded)          │
//! │              discount = subtotal × order_disc/100                       │
//! │              total    = subtotal − discount                             │
//! │              tax     *= total/subtotal        (order discount rescales │
//! │                                                tax proportionally)      │
//! │                                                                         │
//! │  ROUND ONCE: every aggregate is rounded to integer cents only at the   │
//! │  end of recompute(). Intermediate math stays in f64 so per-line        │
//! │  rounding error never compounds across the cart.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! Created empty at session start, mutated by line operations, destroyed
//! (reset to empty) on checkout or explicit [`Cart::clear`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Customer, CustomerPatch, Product};
use crate::DEFAULT_TAX_RATE;

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// Product fields are frozen at the moment the product is added: the cart
/// displays consistent data even if the mirrored catalog is refreshed
/// underneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Locally generated line id (UUID v4).
    pub id: String,

    /// Product ID in the mirrored catalog.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// SKU at time of adding (frozen).
    pub sku: String,

    /// Quantity in cart, always >= 1.
    pub quantity: i64,

    /// Tax-inclusive unit price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Tax rate as a fraction (0.21 = 21%).
    pub tax_rate: f64,

    /// Per-line discount percentage, clamped to [0, 100].
    pub discount_percent: f64,

    /// Rounded display total; aggregation uses the unrounded float.
    pub line_total_cents: i64,
}

impl CartLine {
    /// Creates a line with quantity 1 from a mirrored catalog product.
    ///
    /// The tax rate defaults from the product, falling back to
    /// [`DEFAULT_TAX_RATE`] when the catalog carries none.
    fn from_product(product: &Product) -> Self {
        CartLine {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            quantity: 1,
            unit_price_cents: product.price_cents,
            tax_rate: product.tax_rate.unwrap_or(DEFAULT_TAX_RATE),
            discount_percent: 0.0,
            line_total_cents: product.price_cents,
        }
    }

    /// Discounted line subtotal in fractional cents.
    ///
    /// Kept in `f64` on purpose: rounding happens once per recompute, at the
    /// cart level.
    fn discounted_subtotal(&self) -> f64 {
        self.quantity as f64
            * self.unit_price_cents as f64
            * (1.0 - self.discount_percent / 100.0)
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Derived totals, recomputed after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// The in-memory cart.
///
/// ## Invariants
/// - Lines are unique by `product_id`; re-adding increments quantity in place
/// - Insertion order is display order
/// - Quantity is always >= 1 (setting it to 0 removes the line)
/// - `totals` is consistent with `lines` + `discount_percent` after every
///   public mutator returns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,

    /// Customer snapshot, frozen into the sale at checkout.
    pub customer: Option<Customer>,

    /// Order-level discount percentage, clamped to [0, 100].
    pub discount_percent: f64,

    /// Free-text notes carried onto the sale.
    pub notes: Option<String>,

    /// Derived totals.
    pub totals: CartTotals,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product to the cart.
    ///
    /// If a line with the same `product_id` exists its quantity is incremented
    /// by 1; otherwise a new line with quantity 1 is appended.
    pub fn add_line(&mut self, product: &Product) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.id)
        {
            line.quantity += 1;
        } else {
            self.lines.push(CartLine::from_product(product));
        }
        self.recompute();
    }

    /// Removes a line unconditionally. Unknown ids are a no-op.
    pub fn remove_line(&mut self, line_id: &str) {
        self.lines.retain(|l| l.id != line_id);
        self.recompute();
    }

    /// Sets a line's quantity. A quantity of zero or less removes the line.
    pub fn set_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_line(line_id);
            return Ok(());
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        line.quantity = quantity;
        self.recompute();
        Ok(())
    }

    /// Sets a line's discount percentage, clamped to [0, 100].
    pub fn set_line_discount(&mut self, line_id: &str, percent: f64) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        line.discount_percent = percent.clamp(0.0, 100.0);
        self.recompute();
        Ok(())
    }

    /// Sets the order-level discount percentage, clamped to [0, 100].
    pub fn set_order_discount(&mut self, percent: f64) {
        self.discount_percent = percent.clamp(0.0, 100.0);
        self.recompute();
    }

    /// Shallow-merges a patch into the customer snapshot, creating one if the
    /// cart has none yet.
    pub fn set_customer(&mut self, patch: CustomerPatch) {
        self.customer.get_or_insert_with(Customer::default).apply(patch);
    }

    /// Replaces the free-text notes.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Resets every field to its empty/zero state.
    ///
    /// This is the only way a cart loses its lines other than checkout.
    pub fn clear(&mut self) {
        *self = Cart::default();
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Recomputes per-line totals and the cart aggregates.
    ///
    /// All intermediate math stays in `f64`; each aggregate is rounded to
    /// integer cents exactly once, at the end.
    fn recompute(&mut self) {
        let mut subtotal = 0.0_f64;
        let mut tax = 0.0_f64;

        for line in &mut self.lines {
            let line_subtotal = line.discounted_subtotal();
            line.line_total_cents = line_subtotal.round() as i64;
            subtotal += line_subtotal;
            // Tax-inclusive extraction: the tax is already inside the price.
            tax += line_subtotal - line_subtotal / (1.0 + line.tax_rate);
        }

        let discount = subtotal * self.discount_percent / 100.0;
        let total = subtotal - discount;

        // The order discount lowers the tax base too. Rescaling distributes
        // its tax effect evenly across lines instead of recomputing per line.
        if self.discount_percent > 0.0 && subtotal > 0.0 {
            tax *= total / subtotal;
        }

        self.totals = CartTotals {
            subtotal_cents: subtotal.round() as i64,
            tax_cents: tax.round() as i64,
            discount_cents: discount.round() as i64,
            total_cents: total.round() as i64,
        };
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_TENANT_ID;
    use chrono::Utc;

    fn test_product(id: &str, price_cents: i64, tax_rate: Option<f64>) -> Product {
        Product {
            id: id.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            barcode: None,
            price_cents,
            cost_cents: None,
            tax_rate,
            category_id: None,
            image_url: None,
            is_active: true,
            synced_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_same_product_twice_merges_lines() {
        let mut cart = Cart::new();
        let product = test_product("p1", 999, Some(0.21));

        cart.add_line(&product);
        cart.add_line(&product);

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_tax_inclusive_identity_no_discounts() {
        // 1210 at 21% tax-inclusive: the tax component is 210, total is the
        // sticker price.
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1210, Some(0.21)));

        assert_eq!(cart.totals.subtotal_cents, 1210);
        assert_eq!(cart.totals.tax_cents, 210);
        assert_eq!(cart.totals.discount_cents, 0);
        assert_eq!(cart.totals.total_cents, 1210);
    }

    #[test]
    fn test_order_discount_rescales_tax_proportionally() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1210, Some(0.21)));
        cart.set_order_discount(50.0);

        assert_eq!(cart.totals.total_cents, 605);
        assert_eq!(cart.totals.discount_cents, 605);
        assert_eq!(cart.totals.tax_cents, 105);
    }

    #[test]
    fn test_line_and_order_discounts_cascade() {
        // 1000 with 10% line discount → 900; 10% order discount on top → 810.
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1000, Some(0.21)));
        let line_id = cart.lines[0].id.clone();
        cart.set_line_discount(&line_id, 10.0).unwrap();
        cart.set_order_discount(10.0);

        assert_eq!(cart.totals.subtotal_cents, 900);
        assert_eq!(cart.totals.discount_cents, 90);
        assert_eq!(cart.totals.total_cents, 810);
    }

    #[test]
    fn test_totals_identity_holds() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1337, Some(0.21)));
        cart.add_line(&test_product("p2", 499, Some(0.105)));
        cart.set_order_discount(15.0);

        let t = cart.totals;
        assert!((t.total_cents - (t.subtotal_cents - t.discount_cents)).abs() <= 1);
    }

    #[test]
    fn test_tax_defaults_when_catalog_carries_none() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1210, None));

        assert!((cart.lines[0].tax_rate - DEFAULT_TAX_RATE).abs() < f64::EPSILON);
        assert_eq!(cart.totals.tax_cents, 210);
    }

    #[test]
    fn test_set_quantity_recomputes_line_total() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 500, Some(0.21)));
        let line_id = cart.lines[0].id.clone();

        cart.set_quantity(&line_id, 3).unwrap();

        assert_eq!(cart.lines[0].line_total_cents, 1500);
        assert_eq!(cart.totals.total_cents, 1500);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 500, Some(0.21)));
        let line_id = cart.lines[0].id.clone();

        cart.set_quantity(&line_id, 0).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.totals, CartTotals::default());
    }

    #[test]
    fn test_set_quantity_unknown_line_errors() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 500, Some(0.21)));

        let err = cart.set_quantity("nope", 2).unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound(_)));
    }

    #[test]
    fn test_discounts_are_clamped() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1000, Some(0.21)));
        let line_id = cart.lines[0].id.clone();

        cart.set_line_discount(&line_id, 150.0).unwrap();
        assert_eq!(cart.lines[0].discount_percent, 100.0);
        assert_eq!(cart.totals.total_cents, 0);

        cart.set_line_discount(&line_id, -5.0).unwrap();
        assert_eq!(cart.lines[0].discount_percent, 0.0);
        cart.set_order_discount(-20.0);
        assert_eq!(cart.discount_percent, 0.0);
        assert_eq!(cart.totals.total_cents, 1000);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1210, Some(0.21)));
        cart.set_order_discount(10.0);
        cart.set_customer(CustomerPatch {
            name: Some("Ana".to_string()),
            ..Default::default()
        });
        cart.set_notes(Some("mesa 4".to_string()));

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.customer.is_none());
        assert!(cart.notes.is_none());
        assert_eq!(cart.discount_percent, 0.0);
        assert_eq!(cart.totals, CartTotals::default());
    }

    #[test]
    fn test_mixed_rates_sum_per_line_tax_components() {
        // 1210 @ 21% → 210; 1105 @ 10.5% → 105. No discounts, so the total
        // is the sticker sum and tax is the sum of extracted components.
        let mut cart = Cart::new();
        cart.add_line(&test_product("p1", 1210, Some(0.21)));
        cart.add_line(&test_product("p2", 1105, Some(0.105)));

        assert_eq!(cart.totals.total_cents, 2315);
        assert_eq!(cart.totals.tax_cents, 315);
    }
}
