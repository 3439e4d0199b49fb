//! # Checkout
//!
//! The sale being composed on the sale screen and its totals.
//!
//! ## Sale Screen Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Sale Draft Operations                                │
//! │                                                                         │
//! │  Screen Action            Draft Call              Totals                │
//! │  ─────────────            ──────────              ──────                │
//! │                                                                         │
//! │  Pick product ───────────► add_item() ──────┐                          │
//! │  Change quantity ────────► update_quantity()├──► summarize(draft,      │
//! │  Remove line ────────────► remove_item() ───┘       discount_text,     │
//! │                                                     tendered_text)     │
//! │  Type discount/paid ─────────────────────────────► summarize(...)      │
//! │                                                                         │
//! │  Finalize ───────────────► SaleRepository::finalize (softx-db)         │
//! │                                                                         │
//! │  The subtotal is recomputed from every line on each change.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! - subtotal = Σ unit price × quantity
//! - total = max(0, subtotal − discount)
//! - change = max(0, tendered − total) when something was tendered, else 0

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::MAX_SALE_ITEMS;

/// Label shown in place of an amount when the totals cannot be computed.
pub const UNAVAILABLE_LABEL: &str = "R$ ---";

// =============================================================================
// Line Item
// =============================================================================

/// One product line of a sale being composed.
///
/// Name and unit price are copied from the product when the line is added,
/// so later catalogue edits do not change a sale already on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            unit_price: product.sale_price,
        }
    }

    /// Unit price × quantity, `None` if it does not fit in a `Money`.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(self.quantity)
    }

    /// Checks quantity range and price sign.
    pub fn validate(&self) -> CoreResult<()> {
        validate_quantity(self.quantity)?;
        if self.unit_price.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "preco_unitario".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// Sale Draft
// =============================================================================

/// The ordered list of lines on the sale screen.
///
/// ## Invariants
/// - One line per product (adding the same product again raises its quantity)
/// - Every quantity is within 1..=MAX_ITEM_QUANTITY
/// - At most MAX_SALE_ITEMS lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDraft {
    items: Vec<LineItem>,
}

impl SaleDraft {
    pub fn new() -> Self {
        SaleDraft::default()
    }

    /// Adds a product, or raises the quantity of its existing line.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            validate_quantity(new_qty)?;
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_SALE_ITEMS {
            return Err(CoreError::SaleTooLarge {
                max: MAX_SALE_ITEMS,
            });
        }

        self.items.push(LineItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CoreError::ItemNotInSale(product_id))?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: i64) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ItemNotInSale(product_id))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ unit price × quantity, recomputed from the full list.
    ///
    /// Fails when a line is malformed or the sum overflows.
    pub fn subtotal(&self) -> CoreResult<Money> {
        let overflow = || ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        };

        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| -> CoreResult<Money> {
                item.validate()?;
                let line = item.line_total().ok_or_else(overflow)?;
                acc.checked_add(line).ok_or_else(|| overflow().into())
            })
    }
}

impl FromIterator<LineItem> for SaleDraft {
    /// Builds a draft from lines as given, without merging or limits.
    /// [`SaleDraft::subtotal`] rejects it if a line is malformed.
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        SaleDraft {
            items: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Computed amounts of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    /// Amount due, never negative.
    pub total: Money,
    /// Change to hand back, never negative.
    pub change: Money,
}

impl SaleTotals {
    /// Applies discount and tendered amount to a subtotal.
    ///
    /// Differences saturate at the `Money` range instead of overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use softx_core::{Money, SaleTotals};
    ///
    /// // Tendered less than the total: no change
    /// let t = SaleTotals::compute(Money::from_cents(2550), Money::from_cents(300), Money::from_cents(2000));
    /// assert_eq!(t.total.cents(), 2250);
    /// assert_eq!(t.change, Money::zero());
    /// ```
    pub fn compute(subtotal: Money, discount: Money, tendered: Money) -> Self {
        let total = subtotal.saturating_sub(discount).non_negative();
        let change = if tendered.is_positive() {
            tendered.saturating_sub(total).non_negative()
        } else {
            Money::zero()
        };

        SaleTotals {
            subtotal,
            discount,
            total,
            change,
        }
    }
}

/// What the totals panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TotalsDisplay {
    Ready(SaleTotals),
    /// Discount or tendered text is not a number, the discount is negative,
    /// or a line is malformed.
    Invalid,
}

impl TotalsDisplay {
    /// Subtotal label, shown without currency symbol (`25.50`).
    pub fn subtotal_label(&self) -> String {
        match self {
            TotalsDisplay::Ready(t) => t.subtotal.to_plain_string(),
            TotalsDisplay::Invalid => UNAVAILABLE_LABEL.to_string(),
        }
    }

    /// Total label, e.g. `R$ 22.50`.
    pub fn total_label(&self) -> String {
        match self {
            TotalsDisplay::Ready(t) => t.total.to_string(),
            TotalsDisplay::Invalid => UNAVAILABLE_LABEL.to_string(),
        }
    }

    /// Change label, e.g. `R$ 7.50`.
    pub fn change_label(&self) -> String {
        match self {
            TotalsDisplay::Ready(t) => t.change.to_string(),
            TotalsDisplay::Invalid => UNAVAILABLE_LABEL.to_string(),
        }
    }

    pub fn totals(&self) -> Option<&SaleTotals> {
        match self {
            TotalsDisplay::Ready(t) => Some(t),
            TotalsDisplay::Invalid => None,
        }
    }
}

/// Recomputes the totals panel from the draft and the two free-text fields.
///
/// Never fails: bad input turns into [`TotalsDisplay::Invalid`].
pub fn summarize(draft: &SaleDraft, discount_text: &str, tendered_text: &str) -> TotalsDisplay {
    let Ok(subtotal) = draft.subtotal() else {
        return TotalsDisplay::Invalid;
    };

    match (Money::parse(discount_text), Money::parse(tendered_text)) {
        (Ok(discount), Ok(tendered)) if !discount.is_negative() => {
            TotalsDisplay::Ready(SaleTotals::compute(subtotal, discount, tendered))
        }
        _ => TotalsDisplay::Invalid,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_ITEM_QUANTITY;

    fn product(id: i64, price_cents: i64) -> Product {
        Product {
            id,
            name: format!("Produto {id}"),
            sale_price: Money::from_cents(price_cents),
            ..Product::default()
        }
    }

    fn sample_draft() -> SaleDraft {
        let mut draft = SaleDraft::new();
        draft.add_item(&product(1, 1000), 2).unwrap();
        draft.add_item(&product(2, 550), 1).unwrap();
        draft
    }

    #[test]
    fn test_totals_when_tendered_is_short() {
        let display = summarize(&sample_draft(), "3.00", "20.00");
        let totals = display.totals().unwrap();

        assert_eq!(totals.subtotal.cents(), 2550);
        assert_eq!(totals.total.cents(), 2250);
        assert_eq!(totals.change.cents(), 0);
        assert_eq!(display.subtotal_label(), "25.50");
        assert_eq!(display.total_label(), "R$ 22.50");
        assert_eq!(display.change_label(), "R$ 0.00");
    }

    #[test]
    fn test_totals_with_change() {
        let display = summarize(&sample_draft(), "3,00", "30");
        assert_eq!(display.totals().unwrap().change.cents(), 750);
        assert_eq!(display.change_label(), "R$ 7.50");
    }

    #[test]
    fn test_empty_fields_count_as_zero() {
        let display = summarize(&sample_draft(), "", "");
        let totals = display.totals().unwrap();
        assert_eq!(totals.total.cents(), 2550);
        assert_eq!(totals.change.cents(), 0);
    }

    #[test]
    fn test_discount_larger_than_subtotal_floors_total() {
        let totals = SaleTotals::compute(
            Money::from_cents(1000),
            Money::from_cents(5000),
            Money::from_cents(100),
        );
        assert_eq!(totals.total, Money::zero());
        assert_eq!(totals.change.cents(), 100);
    }

    #[test]
    fn test_non_numeric_input_is_invalid() {
        let display = summarize(&sample_draft(), "três", "30");
        assert_eq!(display, TotalsDisplay::Invalid);
        assert_eq!(display.total_label(), "R$ ---");
        assert_eq!(display.change_label(), "R$ ---");

        assert_eq!(summarize(&sample_draft(), "0", "abc"), TotalsDisplay::Invalid);
    }

    #[test]
    fn test_malformed_line_is_invalid() {
        let draft: SaleDraft = vec![LineItem {
            product_id: 1,
            name: "x".to_string(),
            quantity: 0,
            unit_price: Money::from_cents(100),
        }]
        .into_iter()
        .collect();
        assert_eq!(summarize(&draft, "", ""), TotalsDisplay::Invalid);
    }

    #[test]
    fn test_negative_discount_is_invalid() {
        assert_eq!(summarize(&sample_draft(), "-1", "30"), TotalsDisplay::Invalid);
        assert_eq!(
            summarize(&sample_draft(), "-92233720368547758", "0"),
            TotalsDisplay::Invalid
        );
    }

    #[test]
    fn test_compute_saturates_extreme_amounts() {
        let totals = SaleTotals::compute(
            Money::from_cents(2550),
            Money::from_cents(i64::MIN),
            Money::from_cents(i64::MIN),
        );
        assert_eq!(totals.total, Money::from_cents(i64::MAX));
        assert_eq!(totals.change, Money::zero());

        let totals = SaleTotals::compute(Money::zero(), Money::zero(), Money::from_cents(i64::MAX));
        assert_eq!(totals.change, Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_overflowing_line_is_invalid() {
        let draft: SaleDraft = vec![LineItem {
            product_id: 1,
            name: "x".to_string(),
            quantity: 3,
            unit_price: Money::from_cents(i64::MAX / 2),
        }]
        .into_iter()
        .collect();

        assert!(draft.subtotal().is_err());
        assert_eq!(summarize(&draft, "", ""), TotalsDisplay::Invalid);
    }

    #[test]
    fn test_overflowing_sum_is_invalid() {
        let line = |id| LineItem {
            product_id: id,
            name: "x".to_string(),
            quantity: 1,
            unit_price: Money::from_cents(i64::MAX / 2 + 1),
        };
        let draft: SaleDraft = vec![line(1), line(2)].into_iter().collect();
        assert_eq!(summarize(&draft, "", ""), TotalsDisplay::Invalid);
    }

    #[test]
    fn test_negative_price_line_is_invalid() {
        let draft: SaleDraft = vec![LineItem {
            product_id: 1,
            name: "x".to_string(),
            quantity: 1,
            unit_price: Money::from_cents(-100),
        }]
        .into_iter()
        .collect();
        assert!(matches!(draft.subtotal(), Err(CoreError::Validation(_))));
        assert_eq!(summarize(&draft, "", ""), TotalsDisplay::Invalid);
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut draft = SaleDraft::new();
        let p = product(1, 999);
        draft.add_item(&p, 2).unwrap();
        draft.add_item(&p, 3).unwrap();

        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.total_quantity(), 5);
        assert_eq!(draft.subtotal().unwrap().cents(), 4995);
    }

    #[test]
    fn test_add_rejects_bad_quantity() {
        let mut draft = SaleDraft::new();
        let p = product(1, 100);
        assert!(draft.add_item(&p, 0).is_err());
        draft.add_item(&p, MAX_ITEM_QUANTITY).unwrap();
        assert!(draft.add_item(&p, 1).is_err());
        assert_eq!(draft.total_quantity(), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_update_and_remove() {
        let mut draft = sample_draft();

        draft.update_quantity(2, 4).unwrap();
        assert_eq!(draft.subtotal().unwrap().cents(), 2000 + 2200);

        draft.update_quantity(2, 0).unwrap();
        assert_eq!(draft.items().len(), 1);

        assert!(matches!(draft.remove_item(99), Err(CoreError::ItemNotInSale(99))));
        assert!(draft.update_quantity(99, 1).is_err());

        draft.clear();
        assert!(draft.is_empty());
        assert_eq!(draft.subtotal().unwrap(), Money::zero());
    }

    #[test]
    fn test_price_frozen_when_added() {
        let mut draft = SaleDraft::new();
        let mut p = product(1, 1000);
        draft.add_item(&p, 1).unwrap();
        p.sale_price = Money::from_cents(5000);

        assert_eq!(draft.items()[0].unit_price.cents(), 1000);
    }
}
