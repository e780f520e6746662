//! Stock Gate
//!
//! Checks the cart against live backend stock right before a sale is
//! submitted. Cached catalog stock is never trusted here.

use futures::future::join_all;
use rustc_hash::FxHashMap;
use thiserror::Error;
use till::{
    cart::Cart,
    catalog::{Product, ProductId},
    stock::{Shortfall, cart_demand},
};
use tracing::debug;

use crate::services::{ProductsService, ServiceError};

/// Reasons the gate refuses a cart.
#[derive(Debug, Error)]
pub enum StockError {
    /// A product could not be fetched.
    #[error("could not check stock for {product}: {source}")]
    Lookup {
        /// Product name.
        product: String,

        /// Underlying error.
        #[source]
        source: ServiceError,
    },

    /// Live stock is lower than the cart needs.
    #[error(transparent)]
    Insufficient(#[from] Shortfall),
}

/// Fetch every product in `cart` once, concurrently, and check the summed
/// demand per product and variant. The first failure in cart order is
/// reported.
///
/// # Errors
///
/// Returns a [`StockError`] if a product cannot be fetched or does not have
/// enough stock.
pub async fn verify_stock(products: &dyn ProductsService, cart: &Cart) -> Result<(), StockError> {
    let demand = cart_demand(cart);

    let mut ids: Vec<ProductId> = Vec::new();

    for entry in &demand {
        if !ids.contains(&entry.product_id) {
            ids.push(entry.product_id.clone());
        }
    }

    let lookups = join_all(ids.iter().map(|id| products.get_product(id.clone()))).await;

    let mut live: FxHashMap<ProductId, Product> = FxHashMap::default();
    let mut failures: FxHashMap<ProductId, ServiceError> = FxHashMap::default();

    for (id, lookup) in ids.into_iter().zip(lookups) {
        match lookup {
            Ok(product) => {
                live.insert(id, product);
            }
            Err(error) => {
                failures.insert(id, error);
            }
        }
    }

    for entry in &demand {
        if let Some(source) = failures.remove(&entry.product_id) {
            return Err(StockError::Lookup {
                product: entry.product_name.clone(),
                source,
            });
        }

        let Some(product) = live.get(&entry.product_id) else {
            continue;
        };

        entry.check(product)?;
    }

    debug!(lines = cart.len(), "stock verified");

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{services::MockProductsService, test::fixtures};

    #[tokio::test]
    async fn each_product_is_fetched_once() -> TestResult {
        let mut cart = Cart::new();
        let cached = fixtures::product("p1", 10, 5);

        cart.add_item(&cached, None)?;
        cart.add_item(&cached, None)?;

        let mut products = MockProductsService::new();

        products
            .expect_get_product()
            .once()
            .return_once(|_| Ok(fixtures::product("p1", 10, 2)));

        verify_stock(&products, &cart).await?;

        Ok(())
    }

    #[tokio::test]
    async fn live_stock_wins_over_cached_stock() -> TestResult {
        let mut cart = Cart::new();

        cart.add_item(&fixtures::product("p1", 10, 5), None)?;
        cart.add_item(&fixtures::product("p1", 10, 5), None)?;

        let mut products = MockProductsService::new();

        products
            .expect_get_product()
            .once()
            .return_once(|_| Ok(fixtures::product("p1", 10, 1)));

        let result = verify_stock(&products, &cart).await;

        assert!(matches!(
            result,
            Err(StockError::Insufficient(Shortfall {
                requested: 2,
                available: Some(1),
                ..
            }))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn first_failure_in_cart_order_is_reported() -> TestResult {
        let mut cart = Cart::new();

        cart.add_item(&fixtures::product("p1", 10, 5), None)?;
        cart.add_item(&fixtures::product("p2", 10, 5), None)?;

        let mut products = MockProductsService::new();

        products.expect_get_product().times(2).returning(|id| {
            if id.as_str() == "p1" {
                Err(ServiceError::NotFound("p1".to_string()))
            } else {
                Ok(fixtures::product("p2", 10, 0))
            }
        });

        let result = verify_stock(&products, &cart).await;

        assert!(matches!(
            result,
            Err(StockError::Lookup { ref product, .. }) if product == "Product p1"
        ));

        Ok(())
    }
}
