//! Checkout
//!
//! Turns a cart into a committed sale. The steps run in a fixed order and the
//! first failure stops the sale with the cart untouched:
//!
//! 1. session, cart and payment are checked locally,
//! 2. the stock gate checks live stock,
//! 3. the sale record is submitted once,
//! 4. the receipt is written,
//! 5. the cart is cleared and the cashier can carry on,
//! 6. stock deductions are queued and applied in the background.

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use thiserror::Error;
use till::{
    cart::Cart,
    receipt::{Receipt, ReceiptError},
    sales::{PaymentError, PaymentMethod, SaleId, SaleRecord, settle},
    session::{Session, SessionError},
    stock::{Direction, sale_adjustments},
};
use tracing::{info, warn};

use crate::services::{ProductsService, SalesService, ServiceError};

pub mod cancel;
pub mod gate;
pub mod outbox;
pub mod reconcile;
pub mod tasks;

#[cfg(test)]
mod tests;

pub use cancel::{CancelError, CancelOutcome, SaleCanceller};
pub use gate::{StockError, verify_stock};
pub use outbox::{PendingAdjustment, PendingId, StockOutbox};
pub use reconcile::{ReconcileReport, StockReconciler};
pub use tasks::BackgroundTasks;

/// Reasons a checkout stops before the sale is committed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No user or no open till.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Nothing to sell.
    #[error("the cart is empty")]
    EmptyCart,

    /// The payment does not cover the total.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// The stock gate refused the cart.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// The backend did not accept the sale.
    #[error("failed to submit sale: {0}")]
    Submit(#[source] ServiceError),
}

/// A committed sale.
#[derive(Debug)]
pub struct CheckoutOutcome {
    /// The sale as submitted.
    pub sale: SaleRecord,

    /// Where the receipt was written. The sale stands even if this failed.
    pub receipt: Result<PathBuf, ReceiptError>,

    /// Stock adjustments queued for the background reconciliation.
    pub queued_adjustments: usize,
}

/// Checkout pipeline.
#[derive(Clone)]
pub struct Checkout {
    products: Arc<dyn ProductsService>,
    sales: Arc<dyn SalesService>,
    reconciler: StockReconciler,
    tasks: BackgroundTasks,
    receipts_dir: PathBuf,
    currency: &'static Currency,
}

impl Checkout {
    /// Create a checkout pipeline.
    pub fn new(
        products: Arc<dyn ProductsService>,
        sales: Arc<dyn SalesService>,
        reconciler: StockReconciler,
        tasks: BackgroundTasks,
        receipts_dir: PathBuf,
        currency: &'static Currency,
    ) -> Self {
        Self {
            products,
            sales,
            reconciler,
            tasks,
            receipts_dir,
            currency,
        }
    }

    /// Sell the contents of `cart`.
    ///
    /// On success the cart is cleared and the stock deduction is running in
    /// the background. On failure the cart is left as it was.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] for the first step that fails.
    pub async fn finalize(
        &self,
        session: &Session,
        cart: &mut Cart,
        method: PaymentMethod,
        tendered: Decimal,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let (cashier, till) = session.require_till()?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let payment = settle(cart.total(), method, tendered)?;

        verify_stock(&*self.products, cart).await?;

        let sale = SaleRecord::from_cart(
            SaleId::generate(),
            cashier.id.clone(),
            till.id.clone(),
            Timestamp::now(),
            cart,
            payment,
        );

        self.sales
            .create_sale(sale.clone())
            .await
            .map_err(CheckoutError::Submit)?;

        info!(
            sale = %sale.id(),
            total = %sale.total(),
            method = %sale.payment_method(),
            "sale committed"
        );

        let receipt = self.write_receipt(&sale);

        if let Err(error) = &receipt {
            warn!(sale = %sale.id(), %error, "failed to write receipt");
        }

        cart.clear();

        let queued_adjustments = self.queue_stock_deduction(&sale);

        Ok(CheckoutOutcome {
            sale,
            receipt,
            queued_adjustments,
        })
    }

    /// Path of the receipt file for `sale`.
    pub fn receipt_path(&self, sale: &SaleId) -> PathBuf {
        receipt_path(&self.receipts_dir, sale)
    }

    fn write_receipt(&self, sale: &SaleRecord) -> Result<PathBuf, ReceiptError> {
        fs::create_dir_all(&self.receipts_dir)?;

        let path = self.receipt_path(sale.id());
        let mut out = BufWriter::new(fs::File::create(&path)?);

        Receipt::new(sale, self.currency).write_to(&mut out)?;

        out.flush()?;

        Ok(path)
    }

    fn queue_stock_deduction(&self, sale: &SaleRecord) -> usize {
        let entries: Vec<PendingAdjustment> = sale_adjustments(sale.items(), Direction::Deduct)
            .into_iter()
            .map(|adjustment| PendingAdjustment::new(sale.id().clone(), adjustment))
            .collect();

        let queued = entries.len();
        let reconciler = self.reconciler.clone();

        match reconciler.outbox().enqueue(&entries) {
            Ok(()) => self.tasks.spawn(async move {
                if let Err(error) = reconciler.retry_pending().await {
                    warn!(%error, "failed to read queued stock adjustments");
                }
            }),
            Err(error) => {
                warn!(%error, "failed to queue stock adjustments, applying without a queue");

                self.tasks.spawn(async move {
                    reconciler.reconcile(entries).await;
                });
            }
        }

        queued
    }
}

/// Path of the receipt file for `sale` under `dir`.
pub fn receipt_path(dir: &Path, sale: &SaleId) -> PathBuf {
    dir.join(format!("receipt-{sale}.txt"))
}
