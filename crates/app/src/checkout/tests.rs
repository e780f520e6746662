use std::{path::Path, sync::Arc};

use rust_decimal::Decimal;
use rusty_money::iso;
use testresult::TestResult;
use till::{
    cart::Cart,
    catalog::{Product, Role},
    sales::{PaymentError, PaymentMethod, SaleId, SaleRecord, settle},
    session::Session,
};

use super::*;
use crate::{
    backend::BackendError,
    services::{MockProductsService, MockSalesService, ProductsService},
    storage::LocalStore,
    test::fixtures,
};

struct Harness {
    checkout: Checkout,
    canceller: SaleCanceller,
    outbox: StockOutbox,
    tasks: BackgroundTasks,
}

fn harness(
    dir: &Path,
    products: MockProductsService,
    sales: MockSalesService,
) -> Result<Harness, crate::storage::StoreError> {
    let products: Arc<dyn ProductsService> = Arc::new(products);
    let sales: Arc<dyn SalesService> = Arc::new(sales);
    let outbox = StockOutbox::new(LocalStore::open(&dir.join("data"))?);
    let reconciler = StockReconciler::new(Arc::clone(&products), outbox.clone());
    let tasks = BackgroundTasks::default();

    Ok(Harness {
        checkout: Checkout::new(
            products,
            Arc::clone(&sales),
            reconciler.clone(),
            tasks.clone(),
            dir.join("receipts"),
            iso::USD,
        ),
        canceller: SaleCanceller::new(sales, reconciler),
        outbox,
        tasks,
    })
}

fn open_session() -> Session {
    let cashier = fixtures::user("u1", Role::Cashier);
    let till = fixtures::till("t1", &cashier);

    Session::restore(Some(cashier), Some(till))
}

fn cart_with(product: &Product, units: u32) -> Result<Cart, till::cart::CartError> {
    let mut cart = Cart::new();

    for _ in 0..units {
        cart.add_item(product, None)?;
    }

    Ok(cart)
}

#[tokio::test]
async fn sale_is_submitted_and_stock_deducted_in_background() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = cart_with(&fixtures::product("p1", 10, 5), 2)?;

    let mut products = MockProductsService::new();

    products
        .expect_get_product()
        .times(2)
        .returning(|_| Ok(fixtures::product("p1", 10, 5)));

    products
        .expect_update_product()
        .once()
        .withf(|product| product.id.as_str() == "p1" && product.stock == 3)
        .return_once(|_| Ok(()));

    let mut sales = MockSalesService::new();

    sales
        .expect_create_sale()
        .once()
        .withf(|sale| sale.total() == Decimal::from(20) && sale.items().len() == 1)
        .return_once(|_| Ok(()));

    let harness = harness(dir.path(), products, sales)?;

    let outcome = harness
        .checkout
        .finalize(&open_session(), &mut cart, PaymentMethod::Cash, Decimal::from(20))
        .await?;

    harness.tasks.wait().await;

    assert_eq!(outcome.sale.change(), Decimal::ZERO);
    assert_eq!(outcome.queued_adjustments, 1);
    assert!(cart.is_empty());
    assert!(outcome.receipt?.is_file());
    assert!(harness.outbox.pending()?.is_empty());

    Ok(())
}

#[tokio::test]
async fn insufficient_live_stock_leaves_cart_untouched() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = cart_with(&fixtures::product("p2", 10, 5), 2)?;

    let mut products = MockProductsService::new();

    products
        .expect_get_product()
        .once()
        .return_once(|_| Ok(fixtures::product("p2", 10, 1)));

    products.expect_update_product().never();

    let mut sales = MockSalesService::new();

    sales.expect_create_sale().never();

    let harness = harness(dir.path(), products, sales)?;

    let result = harness
        .checkout
        .finalize(&open_session(), &mut cart, PaymentMethod::Debit, Decimal::ZERO)
        .await;

    assert!(matches!(result, Err(CheckoutError::Stock(_))));
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.line(0).map(|line| line.quantity()), Some(2));
    assert!(harness.outbox.pending()?.is_empty());

    Ok(())
}

#[tokio::test]
async fn cash_underpayment_stops_before_any_backend_call() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = cart_with(&fixtures::product("p1", 10, 5), 2)?;

    let mut products = MockProductsService::new();

    products.expect_get_product().never();

    let mut sales = MockSalesService::new();

    sales.expect_create_sale().never();

    let harness = harness(dir.path(), products, sales)?;

    let result = harness
        .checkout
        .finalize(&open_session(), &mut cart, PaymentMethod::Cash, Decimal::from(15))
        .await;

    assert!(matches!(
        result,
        Err(CheckoutError::Payment(PaymentError::InsufficientPayment { .. }))
    ));
    assert_eq!(cart.total(), Decimal::from(20));

    Ok(())
}

#[tokio::test]
async fn rejected_submission_keeps_cart_and_queues_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = cart_with(&fixtures::product("p1", 10, 5), 2)?;

    let mut products = MockProductsService::new();

    products
        .expect_get_product()
        .once()
        .return_once(|_| Ok(fixtures::product("p1", 10, 5)));

    products.expect_update_product().never();

    let mut sales = MockSalesService::new();

    sales.expect_create_sale().once().return_once(|_| {
        Err(ServiceError::Backend(BackendError::Status {
            status: 500,
            message: "database unavailable".to_string(),
        }))
    });

    let harness = harness(dir.path(), products, sales)?;

    let result = harness
        .checkout
        .finalize(&open_session(), &mut cart, PaymentMethod::Cash, Decimal::from(20))
        .await;

    harness.tasks.wait().await;

    assert!(matches!(result, Err(CheckoutError::Submit(_))));
    assert_eq!(cart.line(0).map(|line| line.quantity()), Some(2));
    assert!(harness.outbox.pending()?.is_empty());
    assert!(!dir.path().join("receipts").exists());

    Ok(())
}

#[tokio::test]
async fn checkout_requires_open_till() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = cart_with(&fixtures::product("p1", 10, 5), 1)?;

    let harness = harness(dir.path(), MockProductsService::new(), MockSalesService::new())?;

    let session = Session::restore(Some(fixtures::user("u1", Role::Cashier)), None);

    let result = harness
        .checkout
        .finalize(&session, &mut cart, PaymentMethod::Cash, Decimal::from(10))
        .await;

    assert!(matches!(result, Err(CheckoutError::Session(_))));

    Ok(())
}

#[tokio::test]
async fn failed_receipt_does_not_undo_the_sale() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = cart_with(&fixtures::product("p1", 10, 5), 1)?;

    std::fs::write(dir.path().join("receipts"), "in the way")?;

    let mut products = MockProductsService::new();

    products
        .expect_get_product()
        .times(2)
        .returning(|_| Ok(fixtures::product("p1", 10, 5)));

    products.expect_update_product().once().return_once(|_| Ok(()));

    let mut sales = MockSalesService::new();

    sales.expect_create_sale().once().return_once(|_| Ok(()));

    let harness = harness(dir.path(), products, sales)?;

    let outcome = harness
        .checkout
        .finalize(&open_session(), &mut cart, PaymentMethod::Qr, Decimal::ZERO)
        .await?;

    harness.tasks.wait().await;

    assert!(outcome.receipt.is_err());
    assert!(cart.is_empty());

    Ok(())
}

#[tokio::test]
async fn failed_deduction_stays_queued_and_is_retried() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = cart_with(&fixtures::product("p1", 10, 5), 1)?;

    let mut products = MockProductsService::new();

    products
        .expect_get_product()
        .times(2)
        .returning(|_| Ok(fixtures::product("p1", 10, 5)));

    products
        .expect_update_product()
        .once()
        .return_once(|_| Err(ServiceError::NotFound("p1".to_string())));

    let mut sales = MockSalesService::new();

    sales.expect_create_sale().once().return_once(|_| Ok(()));

    let harness = harness(dir.path(), products, sales)?;

    harness
        .checkout
        .finalize(&open_session(), &mut cart, PaymentMethod::Credit, Decimal::ZERO)
        .await?;

    harness.tasks.wait().await;

    let pending = harness.outbox.pending()?;

    assert_eq!(pending.len(), 1);
    assert_eq!(pending.first().map(|entry| entry.adjustment.delta), Some(-1));

    Ok(())
}

fn sale_of(products: &[(&Product, u32)]) -> Result<SaleRecord, Box<dyn std::error::Error>> {
    let mut cart = Cart::new();

    for (product, units) in products {
        for _ in 0..*units {
            cart.add_item(product, None)?;
        }
    }

    let payment = settle(cart.total(), PaymentMethod::Transfer, Decimal::ZERO)?;

    Ok(SaleRecord::from_cart(
        SaleId::new("s1"),
        "u1".into(),
        "t1".into(),
        jiff::Timestamp::UNIX_EPOCH,
        &cart,
        payment,
    ))
}

#[tokio::test]
async fn cancel_restores_every_product_then_flags_the_sale() -> TestResult {
    let dir = tempfile::tempdir()?;

    let mut loaded = vec![sale_of(&[
        (&fixtures::product("p1", 10, 5), 2),
        (&fixtures::product("p2", 5, 5), 1),
    ])?];

    let mut products = MockProductsService::new();

    products
        .expect_get_product()
        .times(2)
        .returning(|id| Ok(fixtures::product(id.as_str(), 10, 3)));

    products
        .expect_update_product()
        .times(2)
        .withf(|product| match product.id.as_str() {
            "p1" => product.stock == 5,
            "p2" => product.stock == 4,
            _ => false,
        })
        .returning(|_| Ok(()));

    let mut sales = MockSalesService::new();

    sales
        .expect_cancel_sale()
        .once()
        .withf(|id| id.as_str() == "s1")
        .return_once(|_| Ok(()));

    let harness = harness(dir.path(), products, sales)?;

    let outcome = harness
        .canceller
        .cancel(&mut loaded, &SaleId::new("s1"))
        .await?;

    assert_eq!(outcome.restock.updated.len(), 2);
    assert!(outcome.restock.is_complete());
    assert!(loaded.first().is_some_and(SaleRecord::is_cancelled));
    assert!(harness.outbox.pending()?.is_empty());

    Ok(())
}

#[tokio::test]
async fn cancel_refuses_unknown_and_cancelled_sales() -> TestResult {
    let dir = tempfile::tempdir()?;

    let mut sale = sale_of(&[(&fixtures::product("p1", 10, 5), 1)])?;

    sale.mark_cancelled();

    let mut loaded = vec![sale];

    let mut sales = MockSalesService::new();

    sales.expect_cancel_sale().never();

    let harness = harness(dir.path(), MockProductsService::new(), sales)?;

    assert!(matches!(
        harness.canceller.cancel(&mut loaded, &SaleId::new("s1")).await,
        Err(CancelError::AlreadyCancelled(_))
    ));
    assert!(matches!(
        harness.canceller.cancel(&mut loaded, &SaleId::new("s9")).await,
        Err(CancelError::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn sale_cancelled_on_the_backend_is_not_restocked_again() -> TestResult {
    let dir = tempfile::tempdir()?;

    let sale: SaleRecord = serde_json::from_value(serde_json::json!({
        "id": "s1",
        "cashierId": "u1",
        "sessionId": "t1",
        "date": "2025-03-15T21:14:22Z",
        "items": [{ "productId": "p1", "productName": "Soap", "price": 10, "quantity": 2 }],
        "total": 20,
        "amountPaid": 20,
        "change": 0,
        "paymentMethod": "efectivo",
        "isCancelled": true
    }))?;

    let mut loaded = vec![sale];

    let mut products = MockProductsService::new();

    products.expect_get_product().never();
    products.expect_update_product().never();

    let mut sales = MockSalesService::new();

    sales.expect_cancel_sale().never();

    let harness = harness(dir.path(), products, sales)?;

    assert!(matches!(
        harness.canceller.cancel(&mut loaded, &SaleId::new("s1")).await,
        Err(CancelError::AlreadyCancelled(_))
    ));
    assert!(harness.outbox.pending()?.is_empty());

    Ok(())
}

#[tokio::test]
async fn cancel_surfaces_backend_refusal() -> TestResult {
    let dir = tempfile::tempdir()?;

    let mut loaded = vec![sale_of(&[(&fixtures::product("p1", 10, 5), 1)])?];

    let mut products = MockProductsService::new();

    products
        .expect_get_product()
        .once()
        .return_once(|_| Ok(fixtures::product("p1", 10, 4)));

    products.expect_update_product().once().return_once(|_| Ok(()));

    let mut sales = MockSalesService::new();

    sales
        .expect_cancel_sale()
        .once()
        .return_once(|_| Err(ServiceError::NotFound("s1".to_string())));

    let harness = harness(dir.path(), products, sales)?;

    let result = harness.canceller.cancel(&mut loaded, &SaleId::new("s1")).await;

    assert!(matches!(result, Err(CancelError::Cancel(_))));
    assert!(loaded.first().is_some_and(|sale| !sale.is_cancelled()));

    Ok(())
}
