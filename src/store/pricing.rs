//! Unit and total price coupling
//!
//! One of the two prices is the source the user typed; the other is derived
//! from it and the quantity, and re-derived whenever either changes. A
//! derivation that would divide by zero or produce a non-finite value yields
//! `None` instead of an error.

use crate::model::{PriceSource, ShoppingItem};

/// A price typed by the user, in minor currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceEdit {
    pub source: PriceSource,
    pub amount_minor: i64,
}

impl PriceEdit {
    pub fn unit(amount_minor: i64) -> Self {
        Self {
            source: PriceSource::Unit,
            amount_minor,
        }
    }

    pub fn total(amount_minor: i64) -> Self {
        Self {
            source: PriceSource::Total,
            amount_minor,
        }
    }
}

/// Convert a rounded amount, refusing anything an `as` cast would clamp
fn checked_minor(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && in_range).then_some(value as i64)
}

/// `8.5` as `850`
pub fn to_minor(amount: f64) -> Option<i64> {
    checked_minor((amount * 100.0).round())
}

pub fn total_from_unit(quantity: f64, unit_minor: i64) -> Option<i64> {
    checked_minor((quantity * unit_minor as f64).round())
}

pub fn unit_from_total(total_minor: i64, quantity: f64) -> Option<i64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return None;
    }
    checked_minor((total_minor as f64 / quantity).round())
}

/// Both prices for `quantity` given which one is the source
pub fn couple(quantity: f64, edit: PriceEdit) -> (Option<i64>, Option<i64>) {
    match edit.source {
        PriceSource::Unit => (
            Some(edit.amount_minor),
            total_from_unit(quantity, edit.amount_minor),
        ),
        PriceSource::Total => (
            unit_from_total(edit.amount_minor, quantity),
            Some(edit.amount_minor),
        ),
    }
}

/// Set the source price on an item and derive the other
pub fn apply_price(item: &mut ShoppingItem, edit: PriceEdit) {
    let (unit, total) = couple(item.quantity.value(), edit);
    item.unit_price_minor = unit;
    item.total_price_minor = total;
    item.price_source = Some(edit.source);
}

pub fn clear_price(item: &mut ShoppingItem) {
    item.unit_price_minor = None;
    item.total_price_minor = None;
    item.price_source = None;
}

/// Re-derive after the quantity changed
pub fn recompute(item: &mut ShoppingItem) {
    let source = match item.price_source {
        Some(PriceSource::Unit) => item.unit_price_minor.map(PriceEdit::unit),
        Some(PriceSource::Total) => item.total_price_minor.map(PriceEdit::total),
        None => None,
    };
    if let Some(edit) = source {
        apply_price(item, edit);
    }
}
