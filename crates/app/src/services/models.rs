//! Request bodies for record creation.

use std::fmt::{self, Debug, Formatter};

use rust_decimal::Decimal;
use serde::Serialize;
use till::catalog::{BrandId, CategoryId, Role, Variant};
use zeroize::Zeroizing;

/// New product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    /// Display name
    pub name: String,

    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Unit price
    pub price: Decimal,

    /// Base stock
    pub stock: i64,

    /// Owning category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,

    /// Owning brand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<BrandId>,

    /// Barcode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,

    /// Stock-tracked variants
    pub variants: Vec<Variant>,
}

/// New category.
#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    /// Display name
    pub name: String,
}

/// New brand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBrand {
    /// Display name
    pub name: String,

    /// Category the brand is listed under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

/// New user. The password is wiped from memory on drop.
#[derive(Clone, Serialize)]
pub struct NewUser {
    /// Login name
    pub username: String,

    /// Initial password
    #[serde(serialize_with = "serialize_secret")]
    pub password: Zeroizing<String>,

    /// Role
    pub role: Role,
}

impl Debug for NewUser {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Zeroizing<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret)
}
