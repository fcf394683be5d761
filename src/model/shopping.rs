//! Shopping aggregate: the list, its categories and items

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Identity;
use crate::validation::validate_quantity;

/// A decimal quantity typed by the user (`2`, `1,5`, `0.25`)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Quantity(f64);

impl Quantity {
    pub const ONE: Quantity = Quantity(1.0);

    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    /// Like [`Quantity::new`], but a rejected value is a validation error
    pub fn checked(value: f64) -> crate::Result<Self> {
        validate_quantity(value)?;
        Ok(Self(value))
    }

    /// Parse a decimal with `,` or `.` as the fraction separator
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().replace(',', ".");
        normalized.parse::<f64>().ok().and_then(Self::new)
    }

    /// Split a captured quantity like `2L` or `1,5 kg` into value and unit
    ///
    /// `Ok(None)` when the text is not a number followed by a unit. A number
    /// that is not a valid quantity, such as `0kg`, is a validation error.
    pub fn split_capture(text: &str) -> crate::Result<Option<(Self, String)>> {
        let text = text.trim();
        let Some(boundary) = text
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == ',' || *c == '.'))
            .map(|(i, _)| i)
        else {
            return Ok(None);
        };
        let (number, unit) = text.split_at(boundary);
        let unit = unit.trim();
        if unit.is_empty() {
            return Ok(None);
        }
        let Ok(value) = number.trim().replace(',', ".").parse::<f64>() else {
            return Ok(None);
        };
        Ok(Some((Self::checked(value)?, unit.to_string())))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Purchased,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Purchased => "purchased",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ItemStatus::Pending),
            "purchased" => Some(ItemStatus::Purchased),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ItemStatus::Pending => ItemStatus::Purchased,
            ItemStatus::Purchased => ItemStatus::Pending,
        }
    }
}

/// Which price field the user typed; the other one is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Unit,
    Total,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Unit => "unit",
            PriceSource::Total => "total",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unit" => Some(PriceSource::Unit),
            "total" => Some(PriceSource::Total),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Identity,
    pub list_id: i64,
    pub category_id: Identity,
    pub name: String,
    pub quantity: Quantity,
    pub unit: Option<String>,
    pub status: ItemStatus,
    /// Ordering key within the `(category_id, status)` bucket
    pub position: i64,
    pub unit_price_minor: Option<i64>,
    pub total_price_minor: Option<i64>,
    pub price_source: Option<PriceSource>,
    /// Set iff `status == Purchased`
    pub purchased_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShoppingItem {
    pub fn is_purchased(&self) -> bool {
        self.status == ItemStatus::Purchased
    }

    /// Amount this item adds to a total: the total price, else `quantity * unit`
    pub fn line_total_minor(&self) -> Option<i64> {
        self.total_price_minor.or_else(|| {
            let total = (self.unit_price_minor? as f64 * self.quantity.value()).round();
            (total.is_finite() && total.abs() < i64::MAX as f64).then_some(total as i64)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Identity,
    /// Unique, compared case-insensitively
    pub name: String,
    pub is_predefined: bool,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: i64,
    pub currency_code: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub hide_purchased_by_default: bool,
    pub ask_price_on_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category named by an item being created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    Existing(i64),
    /// Found case-insensitively, created when missing
    Named(String),
}

/// Input for creating a shopping item
#[derive(Debug, Clone, PartialEq)]
pub struct NewShoppingItem {
    pub list_id: i64,
    pub name: String,
    pub quantity: Quantity,
    pub unit: Option<String>,
    pub category: CategoryRef,
    pub unit_price_minor: Option<i64>,
    pub total_price_minor: Option<i64>,
    pub price_source: Option<PriceSource>,
}

impl NewShoppingItem {
    pub fn named(list_id: i64, name: impl Into<String>, category: CategoryRef) -> Self {
        Self {
            list_id,
            name: name.into(),
            quantity: Quantity::ONE,
            unit: None,
            category,
            unit_price_minor: None,
            total_price_minor: None,
            price_source: None,
        }
    }
}

/// What a created item brought along
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedItem {
    pub item: ShoppingItem,
    pub category: Category,
    /// The category did not exist before this write
    pub category_created: bool,
}

/// Settings the user can change on the list itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSettings {
    pub currency_code: Option<String>,
    pub hide_purchased_by_default: Option<bool>,
    pub ask_price_on_purchase: Option<bool>,
}
