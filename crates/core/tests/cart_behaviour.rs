//! Cart behaviour across longer edit sequences.

use rust_decimal::Decimal;
use serde_json::json;
use testresult::TestResult;
use till::{
    cart::{AddOutcome, Cart, CartLine},
    catalog::Product,
    sales::{PaymentError, PaymentMethod, settle},
};

fn product(id: &str, price: &str, stock: i64) -> Result<Product, serde_json::Error> {
    let price: f64 = price.parse().unwrap_or_default();

    serde_json::from_value(json!({
        "id": id,
        "name": id.to_uppercase(),
        "price": price,
        "stock": stock,
        "variants": [
            { "color": "red", "stock": stock },
            { "color": "blue", "stock": stock }
        ]
    }))
}

fn recomputed_total(cart: &Cart) -> Decimal {
    cart.lines()
        .iter()
        .map(|line| Decimal::from(line.quantity()) * line.price())
        .sum()
}

#[test]
fn total_matches_lines_after_every_add() -> TestResult {
    let catalog = [
        product("p1", "10.00", 10)?,
        product("p2", "2.50", 10)?,
        product("p3", "1230", 10)?,
    ];

    let selections = [
        (0, None),
        (1, Some("red")),
        (0, None),
        (2, None),
        (1, Some("red")),
        (2, Some("blue")),
        (0, None),
    ];

    let mut cart = Cart::new();

    for (index, variant) in selections {
        let product = catalog.get(index).ok_or("missing product")?;

        cart.add_item(product, variant)?;

        assert_eq!(cart.total(), recomputed_total(&cart));
    }

    assert_eq!(cart.len(), 5, "two variant adds of p2 stay separate lines");
    assert_eq!(cart.line(0).map(CartLine::quantity), Some(3));

    Ok(())
}

#[test]
fn plain_and_variant_lines_of_one_product_stay_apart() -> TestResult {
    let p1 = product("p1", "10", 5)?;
    let mut cart = Cart::new();

    cart.add_item(&p1, Some("red"))?;
    let outcome = cart.add_item(&p1, None)?;

    assert_eq!(outcome, AddOutcome::Added { index: 1 });

    let outcome = cart.add_item(&p1, None)?;

    assert_eq!(
        outcome,
        AddOutcome::Merged {
            index: 1,
            quantity: 2
        }
    );
    assert_eq!(cart.line(0).map(CartLine::quantity), Some(1));

    Ok(())
}

#[test]
fn rounding_sequence_then_reset_restores_line() -> TestResult {
    let mut cart = Cart::new();
    cart.add_item(&product("p1", "1230", 5)?, None)?;

    assert_eq!(cart.round_down(0)?, Decimal::from(1230));
    assert_eq!(cart.round_down(0)?, Decimal::from(1000));
    assert_eq!(cart.round_up(0)?, Decimal::from(1000));
    assert_eq!(cart.round_up(0)?, Decimal::from(1500));
    assert_eq!(cart.total(), Decimal::from(1500));

    cart.reset_price(0)?;

    let line = cart.line(0).ok_or("missing line")?;

    assert_eq!(line.price(), line.original_price());
    assert_eq!(line.rounding().round_up_count(), 0);
    assert_eq!(line.rounding().round_down_count(), 0);
    assert_eq!(cart.total(), Decimal::from(1230));

    Ok(())
}

#[test]
fn two_units_at_ten_paid_with_twenty_give_no_change() -> TestResult {
    let p1 = product("p1", "10.00", 5)?;
    let mut cart = Cart::new();

    cart.add_item(&p1, None)?;
    cart.set_quantity(0, 2)?;

    let payment = settle(cart.total(), PaymentMethod::Cash, Decimal::from(20))?;

    assert_eq!(payment.change(), Decimal::ZERO);

    let short = settle(cart.total(), PaymentMethod::Cash, Decimal::from(19));

    assert!(matches!(
        short,
        Err(PaymentError::InsufficientPayment { .. })
    ));

    Ok(())
}
