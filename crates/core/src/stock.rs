//! Stock Demand and Adjustments
//!
//! Pure bookkeeping shared by the checkout stock gate, background
//! reconciliation and sale cancellation: how many units a cart needs per
//! product and variant, and which stock changes a sale implies.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::Cart,
    catalog::{Product, ProductId, StockAdjustmentError, line_label},
    sales::SaleItem,
};

/// Live stock does not cover what the cart needs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "insufficient stock for {label}: {requested} requested, {} available",
    .available.unwrap_or_default()
)]
pub struct Shortfall {
    /// Product name, qualified by variant.
    pub label: String,

    /// Units the cart needs.
    pub requested: u32,

    /// Units the backend reports. `None` if the variant no longer exists.
    pub available: Option<i64>,
}

/// Units needed of one product or product variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    /// Product the units come from.
    pub product_id: ProductId,

    /// Product name, used in error messages.
    pub product_name: String,

    /// Variant the units come from, `None` for base stock.
    pub variant_color: Option<String>,

    /// Units needed across every cart line for this product and variant.
    pub quantity: u32,
}

impl Demand {
    /// Check this demand against freshly fetched product data.
    ///
    /// # Errors
    ///
    /// Returns a [`Shortfall`] if the live stock is lower than the demand, or
    /// if the variant no longer exists.
    pub fn check(&self, live: &Product) -> Result<(), Shortfall> {
        let available = live.available_stock(self.variant_color.as_deref());

        match available {
            Some(stock) if stock >= i64::from(self.quantity) => Ok(()),
            _ => Err(Shortfall {
                label: line_label(&self.product_name, self.variant_color.as_deref()),
                requested: self.quantity,
                available,
            }),
        }
    }
}

/// Total demand per (product, variant), in order of first appearance in the
/// cart.
pub fn cart_demand(cart: &Cart) -> Vec<Demand> {
    let mut demand: Vec<Demand> = Vec::with_capacity(cart.len());
    let mut positions: FxHashMap<(&ProductId, Option<&str>), usize> = FxHashMap::default();

    for line in cart.lines() {
        let key = (line.product_id(), line.variant_color());

        if let Some(entry) = positions.get(&key).and_then(|&pos| demand.get_mut(pos)) {
            entry.quantity = entry.quantity.saturating_add(line.quantity());
            continue;
        }

        positions.insert(key, demand.len());
        demand.push(Demand {
            product_id: line.product_id().clone(),
            product_name: line.product_name().to_string(),
            variant_color: line.variant_color().map(ToString::to_string),
            quantity: line.quantity(),
        });
    }

    demand
}

/// A pending change to one product's base or variant stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    /// Product to change.
    pub product_id: ProductId,

    /// Variant to change, `None` for base stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_color: Option<String>,

    /// Units to add; negative to remove.
    pub delta: i64,
}

/// Direction of the stock change implied by a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Units leave the shelf when a sale is made.
    Deduct,

    /// Units return when a sale is cancelled.
    Restore,
}

/// One adjustment per sale item, in item order.
pub fn sale_adjustments(items: &[SaleItem], direction: Direction) -> Vec<StockAdjustment> {
    items
        .iter()
        .map(|item| {
            let units = i64::from(item.quantity);

            StockAdjustment {
                product_id: item.product_id.clone(),
                variant_color: item.variant_color.clone(),
                delta: match direction {
                    Direction::Deduct => -units,
                    Direction::Restore => units,
                },
            }
        })
        .collect()
}

impl AsRef<StockAdjustment> for StockAdjustment {
    fn as_ref(&self) -> &StockAdjustment {
        self
    }
}

/// Group adjustments by product, keeping the order products first appear in.
pub fn group_by_product<T: AsRef<StockAdjustment>>(
    adjustments: impl IntoIterator<Item = T>,
) -> Vec<(ProductId, Vec<T>)> {
    let mut groups: Vec<(ProductId, Vec<T>)> = Vec::new();
    let mut positions: FxHashMap<ProductId, usize> = FxHashMap::default();

    for adjustment in adjustments {
        let product_id = &adjustment.as_ref().product_id;

        match positions.get(product_id).copied() {
            Some(pos) => {
                if let Some((_, group)) = groups.get_mut(pos) {
                    group.push(adjustment);
                }
            }
            None => {
                let product_id = product_id.clone();

                positions.insert(product_id.clone(), groups.len());
                groups.push((product_id, vec![adjustment]));
            }
        }
    }

    groups
}

/// Apply adjustments to `product` in order.
///
/// An adjustment naming a variant the product does not have is skipped; the
/// skipped ones are returned with their position and error so the caller can
/// report them. Every other adjustment is applied.
pub fn apply_adjustments<T: AsRef<StockAdjustment>>(
    product: &mut Product,
    adjustments: &[T],
) -> Vec<(usize, StockAdjustmentError)> {
    adjustments
        .iter()
        .enumerate()
        .filter_map(|(index, adjustment)| {
            let adjustment = adjustment.as_ref();

            product
                .adjust_stock(adjustment.variant_color.as_deref(), adjustment.delta)
                .err()
                .map(|error| (index, error))
        })
        .collect()
}
