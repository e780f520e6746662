//! Cart

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    catalog::{Product, ProductId, line_label},
    rounding::{self, RoundingState},
};

/// Errors raised while building a cart.
///
/// None of these mutate the cart; they are surfaced to the cashier as a
/// warning and the previous state is kept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The selection has no stock at all.
    #[error("{0} is out of stock")]
    OutOfStock(String),

    /// The resulting quantity would exceed the stock reported by the catalog.
    #[error("only {available} of {product} in stock, {requested} requested")]
    InsufficientStock {
        /// Product label, qualified by variant.
        product: String,

        /// Quantity the line would hold after the change.
        requested: u32,

        /// Stock reported by the catalog.
        available: i64,
    },

    /// The product has no variant with the selected color.
    #[error("{product} has no variant {color}")]
    UnknownVariant {
        /// Product name.
        product: String,

        /// Selected color.
        color: String,
    },

    /// No line at the given position.
    #[error("no cart line at position {0}")]
    LineNotFound(usize),
}

/// What `add_item` did to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended at `index`.
    Added {
        /// Position of the new line.
        index: usize,
    },

    /// An existing variant-less line was incremented.
    Merged {
        /// Position of the merged line.
        index: usize,

        /// Quantity after the merge.
        quantity: u32,
    },
}

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    product_id: ProductId,
    product_name: String,
    price: Decimal,
    original_price: Decimal,
    quantity: u32,
    variant_color: Option<String>,
    rounding: RoundingState,
}

impl CartLine {
    fn new(product: &Product, variant_color: Option<&str>) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.price,
            original_price: product.price,
            quantity: 1,
            variant_color: variant_color.map(ToString::to_string),
            rounding: RoundingState::default(),
        }
    }

    /// Product the line was selected from.
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Product name at selection time.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Current unit price, possibly rounded.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Catalog unit price at selection time.
    pub fn original_price(&self) -> Decimal {
        self.original_price
    }

    /// Quantity, always at least 1.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Selected variant, if any.
    pub fn variant_color(&self) -> Option<&str> {
        self.variant_color.as_deref()
    }

    /// Rounding counters for this line.
    pub fn rounding(&self) -> RoundingState {
        self.rounding
    }

    /// `quantity × price`
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Name qualified by variant, e.g. `Lipstick (red)`.
    pub fn label(&self) -> String {
        line_label(&self.product_name, self.variant_color())
    }
}

/// Cart
///
/// Lines keep their insertion order. The total is always derived from the
/// lines and never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`, optionally as a specific variant.
    ///
    /// A variant-less selection merges into an existing variant-less line of
    /// the same product. Variant selections always get their own line.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] and leaves the cart untouched if the variant
    /// does not exist, or if the resulting quantity would exceed the stock the
    /// catalog reports for the selection.
    pub fn add_item(
        &mut self,
        product: &Product,
        variant_color: Option<&str>,
    ) -> Result<AddOutcome, CartError> {
        let available =
            product
                .available_stock(variant_color)
                .ok_or_else(|| CartError::UnknownVariant {
                    product: product.name.clone(),
                    color: variant_color.unwrap_or_default().to_string(),
                })?;

        let label = line_label(&product.name, variant_color);

        if available <= 0 {
            return Err(CartError::OutOfStock(label));
        }

        let existing = variant_color.is_none().then(|| {
            self.lines
                .iter()
                .position(|line| line.product_id == product.id && line.variant_color.is_none())
        });

        match existing.flatten() {
            Some(index) => {
                let line = self
                    .lines
                    .get_mut(index)
                    .ok_or(CartError::LineNotFound(index))?;

                let quantity = line.quantity.saturating_add(1);

                if i64::from(quantity) > available {
                    return Err(CartError::InsufficientStock {
                        product: label,
                        requested: quantity,
                        available,
                    });
                }

                line.quantity = quantity;

                Ok(AddOutcome::Merged { index, quantity })
            }
            None => {
                self.lines.push(CartLine::new(product, variant_color));

                Ok(AddOutcome::Added {
                    index: self.lines.len() - 1,
                })
            }
        }
    }

    /// Remove the line at `index`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn remove_item(&mut self, index: usize) -> Result<CartLine, CartError> {
        if index >= self.lines.len() {
            return Err(CartError::LineNotFound(index));
        }

        Ok(self.lines.remove(index))
    }

    /// Set a line's quantity. Values below 1 are clamped to 1.
    ///
    /// Quantity edits are not checked against stock here; the checkout stock
    /// gate is authoritative.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<u32, CartError> {
        let line = self.line_mut(index)?;

        line.quantity = quantity.max(1);

        Ok(line.quantity)
    }

    /// Apply one upward rounding press to a line, returning the new price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn round_up(&mut self, index: usize) -> Result<Decimal, CartError> {
        let line = self.line_mut(index)?;

        line.price = rounding::round_up(line.price, &mut line.rounding);

        Ok(line.price)
    }

    /// Apply one downward rounding press to a line, returning the new price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn round_down(&mut self, index: usize) -> Result<Decimal, CartError> {
        let line = self.line_mut(index)?;

        line.price = rounding::round_down(line.price, &mut line.rounding);

        Ok(line.price)
    }

    /// Restore a line's catalog price and clear its rounding counters.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn reset_price(&mut self, index: usize) -> Result<Decimal, CartError> {
        let line = self.line_mut(index)?;

        line.price = rounding::reset(line.original_price, &mut line.rounding);

        Ok(line.price)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// `Σ quantity × price` over all lines.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Line at `index`, if any.
    pub fn line(&self, index: usize) -> Option<&CartLine> {
        self.lines.get(index)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut CartLine, CartError> {
        self.lines
            .get_mut(index)
            .ok_or(CartError::LineNotFound(index))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn product(id: &str, price: i64, stock: i64) -> Result<Product, serde_json::Error> {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("Product {id}"),
            "price": price,
            "stock": stock,
            "variants": [
                { "color": "red", "stock": 1 },
                { "color": "blue", "stock": 0 }
            ]
        }))
    }

    #[test]
    fn add_item_appends_new_line_with_catalog_price() -> TestResult {
        let mut cart = Cart::new();
        let p1 = product("p1", 1230, 5)?;

        let outcome = cart.add_item(&p1, None)?;

        assert_eq!(outcome, AddOutcome::Added { index: 0 });

        let line = cart.line(0).ok_or("missing line")?;

        assert_eq!(line.quantity(), 1);
        assert_eq!(line.price(), Decimal::from(1230));
        assert_eq!(line.original_price(), Decimal::from(1230));
        assert!(line.rounding().is_untouched());

        Ok(())
    }

    #[test]
    fn re_adding_plain_product_merges() -> TestResult {
        let mut cart = Cart::new();
        let p1 = product("p1", 100, 5)?;

        cart.add_item(&p1, None)?;
        let outcome = cart.add_item(&p1, None)?;

        assert_eq!(
            outcome,
            AddOutcome::Merged {
                index: 0,
                quantity: 2
            }
        );
        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn variant_lines_never_merge() -> TestResult {
        let mut cart = Cart::new();
        let p1 = product("p1", 100, 5)?;

        cart.add_item(&p1, None)?;
        cart.add_item(&p1, Some("red"))?;

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.line(1).and_then(CartLine::variant_color), Some("red"));
        assert_eq!(cart.line(0).map(CartLine::quantity), Some(1));

        Ok(())
    }

    #[test]
    fn add_item_refuses_quantity_above_catalog_stock() -> TestResult {
        let mut cart = Cart::new();
        let p1 = product("p1", 100, 1)?;

        cart.add_item(&p1, None)?;
        let before = cart.clone();

        let result = cart.add_item(&p1, None);

        assert_eq!(
            result,
            Err(CartError::InsufficientStock {
                product: "Product p1".to_string(),
                requested: 2,
                available: 1,
            })
        );
        assert_eq!(cart, before);

        Ok(())
    }

    #[test]
    fn add_item_refuses_out_of_stock_variant() -> TestResult {
        let mut cart = Cart::new();
        let p1 = product("p1", 100, 5)?;

        let result = cart.add_item(&p1, Some("blue"));

        assert_eq!(
            result,
            Err(CartError::OutOfStock("Product p1 (blue)".to_string()))
        );
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn add_item_refuses_unknown_variant() -> TestResult {
        let mut cart = Cart::new();
        let p1 = product("p1", 100, 5)?;

        let result = cart.add_item(&p1, Some("green"));

        assert!(matches!(result, Err(CartError::UnknownVariant { .. })));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn set_quantity_clamps_to_one() -> TestResult {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 100, 5)?, None)?;

        assert_eq!(cart.set_quantity(0, 0)?, 1);
        assert_eq!(cart.set_quantity(0, 4)?, 4);
        assert_eq!(cart.set_quantity(3, 1), Err(CartError::LineNotFound(3)));

        Ok(())
    }

    #[test]
    fn total_is_sum_of_quantity_times_price() -> TestResult {
        let mut cart = Cart::new();
        let p1 = product("p1", 1000, 5)?;
        let p2 = product("p2", 250, 5)?;

        cart.add_item(&p1, None)?;
        cart.add_item(&p2, None)?;
        cart.add_item(&p1, None)?;
        cart.add_item(&p1, Some("red"))?;

        let expected: Decimal = cart
            .lines()
            .iter()
            .map(|line| line.price() * Decimal::from(line.quantity()))
            .sum();

        assert_eq!(cart.total(), expected);
        assert_eq!(cart.total(), Decimal::from(3250));

        Ok(())
    }

    #[test]
    fn rounding_only_touches_the_selected_line() -> TestResult {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 1230, 5)?, None)?;
        cart.add_item(&product("p2", 1230, 5)?, None)?;

        cart.round_down(0)?;
        let price = cart.round_down(0)?;

        assert_eq!(price, Decimal::from(1000));
        assert_eq!(cart.line(1).map(CartLine::price), Some(Decimal::from(1230)));

        assert_eq!(cart.reset_price(0)?, Decimal::from(1230));
        assert!(cart.line(0).is_some_and(|line| line.rounding().is_untouched()));

        Ok(())
    }

    #[test]
    fn remove_item_and_clear() -> TestResult {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 100, 5)?, None)?;
        cart.add_item(&product("p2", 100, 5)?, None)?;

        let removed = cart.remove_item(0)?;

        assert_eq!(removed.product_id().as_str(), "p1");
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.remove_item(5), Err(CartError::LineNotFound(5)));

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);

        Ok(())
    }
}
