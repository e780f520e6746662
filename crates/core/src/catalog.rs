//! Catalog Models
//!
//! Wire shapes of the backend's catalog collections. Products carry any
//! fields this crate does not model in `extra`, so a product read from the
//! backend and written back after a stock change loses nothing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ids::TypedId;

/// Product ID
pub type ProductId = TypedId<Product>;

/// Category ID
pub type CategoryId = TypedId<Category>;

/// Brand ID
pub type BrandId = TypedId<Brand>;

/// User ID
pub type UserId = TypedId<User>;

/// Errors raised when changing a product's stock.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockAdjustmentError {
    /// The product has no variant with the requested color.
    #[error("product {product} has no variant {color}")]
    UnknownVariant {
        /// Product name.
        product: String,

        /// Requested variant color.
        color: String,
    },
}

/// A stock-tracked sub-unit of a product, such as a color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant color, unique within its product.
    pub color: String,

    /// Units on hand for this variant.
    #[serde(default)]
    pub stock: i64,
}

/// Product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Catalog unit price
    pub price: Decimal,

    /// Base stock, used when a sale line has no variant
    #[serde(default)]
    pub stock: i64,

    /// Owning category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,

    /// Owning brand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<BrandId>,

    /// Image reference, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Stock-tracked variants
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Backend fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Find a variant by color.
    pub fn variant(&self, color: &str) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.color == color)
    }

    /// Stock available for a sale line: the variant's stock when `variant` is
    /// set, otherwise the base stock. `None` if the variant does not exist.
    pub fn available_stock(&self, variant: Option<&str>) -> Option<i64> {
        match variant {
            Some(color) => self.variant(color).map(|variant| variant.stock),
            None => Some(self.stock),
        }
    }

    /// Add `delta` units (negative to remove) to the base or variant stock,
    /// returning the new level.
    ///
    /// # Errors
    ///
    /// Returns [`StockAdjustmentError::UnknownVariant`] if `variant` names a
    /// color this product does not have.
    pub fn adjust_stock(
        &mut self,
        variant: Option<&str>,
        delta: i64,
    ) -> Result<i64, StockAdjustmentError> {
        let stock = match variant {
            Some(color) => {
                &mut self
                    .variants
                    .iter_mut()
                    .find(|variant| variant.color == color)
                    .ok_or_else(|| StockAdjustmentError::UnknownVariant {
                        product: self.name.clone(),
                        color: color.to_string(),
                    })?
                    .stock
            }
            None => &mut self.stock,
        };

        *stock = stock.saturating_add(delta);

        Ok(*stock)
    }
}

/// Category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID
    pub id: CategoryId,

    /// Display name
    pub name: String,

    /// Image reference, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Brand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    /// Brand ID
    pub id: BrandId,

    /// Display name
    pub name: String,

    /// Category the brand is listed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,

    /// Image reference, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages catalog data and users.
    Admin,

    /// Operates a till.
    Cashier,
}

/// User
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,

    /// Login name
    pub username: String,

    /// Stored credential, as returned by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Role
    pub role: Role,
}

/// Display label for a product, optionally qualified by variant.
pub fn line_label(name: &str, variant: Option<&str>) -> String {
    match variant {
        Some(color) => format!("{name} ({color})"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn lipstick() -> Result<Product, serde_json::Error> {
        serde_json::from_value(json!({
            "id": 7,
            "name": "Lipstick",
            "price": 4990,
            "stock": 3,
            "categoryId": "c1",
            "brandId": "b1",
            "variants": [{ "color": "red", "stock": 2 }],
            "sku": "LP-7"
        }))
    }

    #[test]
    fn product_keeps_unknown_fields_on_round_trip() -> TestResult {
        let product = lipstick()?;
        let value = serde_json::to_value(&product)?;

        assert_eq!(value["sku"], json!("LP-7"));
        assert_eq!(value["categoryId"], json!("c1"));
        assert_eq!(product.id.as_str(), "7");

        Ok(())
    }

    #[test]
    fn available_stock_prefers_variant() -> TestResult {
        let product = lipstick()?;

        assert_eq!(product.available_stock(None), Some(3));
        assert_eq!(product.available_stock(Some("red")), Some(2));
        assert_eq!(product.available_stock(Some("blue")), None);

        Ok(())
    }

    #[test]
    fn adjust_stock_targets_base_or_variant() -> TestResult {
        let mut product = lipstick()?;

        assert_eq!(product.adjust_stock(None, -1)?, 2);
        assert_eq!(product.adjust_stock(Some("red"), 4)?, 6);
        assert_eq!(product.stock, 2);

        Ok(())
    }

    #[test]
    fn adjust_stock_rejects_unknown_variant() -> TestResult {
        let mut product = lipstick()?;

        let result = product.adjust_stock(Some("blue"), -1);

        assert_eq!(
            result,
            Err(StockAdjustmentError::UnknownVariant {
                product: "Lipstick".to_string(),
                color: "blue".to_string(),
            })
        );

        Ok(())
    }

    #[test]
    fn user_role_uses_lowercase_wire_values() -> TestResult {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "username": "ana",
            "role": "cashier"
        }))?;

        assert_eq!(user.role, Role::Cashier);
        assert!(user.password.is_none());

        Ok(())
    }
}
