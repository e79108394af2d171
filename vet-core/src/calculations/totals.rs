//! Estimate totals.
//!
//! The same three figures appear on the dashboard, the estimate list and the
//! printable estimate, so they all come from [`compute_totals`].
//!
//! ```
//! use rust_decimal_macros::dec;
//! use vet_core::LineItem;
//! use vet_core::calculations::compute_totals;
//!
//! let items = vec![
//!     LineItem { id: "1".into(), service: "Consulta".into(), description: "".into(), quantity: dec!(1), price: dec!(75) },
//!     LineItem { id: "2".into(), service: "Vacuna".into(), description: "".into(), quantity: dec!(2), price: dec!(10) },
//! ];
//!
//! let totals = compute_totals(&items, dec!(10));
//! assert_eq!(totals.subtotal, dec!(95));
//! assert_eq!(totals.tax_amount, dec!(9.5));
//! assert_eq!(totals.total, dec!(104.5));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::LineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// The same totals rounded to cents for display.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_half_up(self.subtotal),
            tax_amount: round_half_up(self.tax_amount),
            total: round_half_up(self.total),
        }
    }
}

/// Subtotal, tax and grand total for a set of line items.
///
/// * subtotal = Σ quantity × price
/// * tax amount = subtotal × tax rate / 100
/// * total = subtotal + tax amount
///
/// No rounding is applied; see [`Totals::rounded`]. A figure beyond the
/// `Decimal` range saturates at [`Decimal::MAX`] or [`Decimal::MIN`].
/// Validated estimates never get there; see [`checked_totals`].
pub fn compute_totals(
    line_items: &[LineItem],
    tax_rate: Decimal,
) -> Totals {
    let subtotal = line_items
        .iter()
        .map(LineItem::amount)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let tax_amount = subtotal.saturating_mul(tax_rate / Decimal::ONE_HUNDRED);

    Totals {
        subtotal,
        tax_amount,
        total: subtotal.saturating_add(tax_amount),
    }
}

/// Same figures as [`compute_totals`], or `None` when one of them does not
/// fit in a `Decimal`.
pub fn checked_totals(
    line_items: &[LineItem],
    tax_rate: Decimal,
) -> Option<Totals> {
    let mut subtotal = Decimal::ZERO;
    for item in line_items {
        subtotal = subtotal.checked_add(item.quantity.checked_mul(item.price)?)?;
    }
    let tax_amount = subtotal.checked_mul(tax_rate / Decimal::ONE_HUNDRED)?;

    Some(Totals {
        subtotal,
        tax_amount,
        total: subtotal.checked_add(tax_amount)?,
    })
}

/// Two decimal places, midpoint away from zero (`0.005` -> `0.01`).
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
