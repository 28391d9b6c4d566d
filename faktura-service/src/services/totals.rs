//! Financial totals calculator.
//!
//! Pure and deterministic: every consumer of a document's amounts
//! (records, notification messages, rendered documents) must agree
//! bit-for-bit, so all of them go through these functions. Invalid or
//! missing numeric inputs coerce to zero; no function here ever fails
//! or produces a non-finite result.

use crate::models::LineItem;

/// Coerce a number for financial arithmetic: NaN and infinities map
/// to zero.
pub fn to_number(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Total for a single line: `quantity * unit_price` with coercion on
/// both inputs and the product.
pub fn item_total(quantity: f64, unit_price: f64) -> f64 {
    to_number(to_number(quantity) * to_number(unit_price))
}

/// Sum of item totals over a document's lines. Empty yields zero.
pub fn subtotal(items: &[LineItem]) -> f64 {
    let sum = items
        .iter()
        .map(|item| item_total(item.quantity.unwrap_or(0.0), item.unit_price.unwrap_or(0.0)))
        .sum();
    to_number(sum)
}

/// Grand total: `subtotal - discount + tax`.
pub fn total(subtotal: f64, discount: f64, tax: f64) -> f64 {
    to_number(subtotal) - to_number(discount) + to_number(tax)
}

/// Format an amount as grouped rupiah, e.g. `Rp 120.000`. Fractional
/// amounts render two comma-separated decimals.
pub fn format_idr(amount: f64) -> String {
    let amount = to_number(amount);
    let negative = amount < 0.0;
    // Saturating cast keeps absurd amounts printable.
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if fraction > 0 {
        format!("{}Rp {},{:02}", sign, grouped, fraction)
    } else {
        format!("{}Rp {}", sign, grouped)
    }
}
