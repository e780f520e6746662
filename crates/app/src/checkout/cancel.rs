//! Sale Cancellation
//!
//! Puts a sale's units back on the shelf, then flags the sale as cancelled.
//! Restocking goes through the same outbox as checkout, so a product that
//! cannot be updated now is retried later.

use std::sync::Arc;

use thiserror::Error;
use till::{
    sales::{SaleId, SaleRecord},
    stock::{Direction, sale_adjustments},
};
use tracing::{info, warn};

use super::{PendingAdjustment, ReconcileReport, StockReconciler};
use crate::services::{SalesService, ServiceError};

/// Reasons a sale cannot be cancelled.
#[derive(Debug, Error)]
pub enum CancelError {
    /// The sale is not in the loaded list.
    #[error("sale {0} not found")]
    NotFound(SaleId),

    /// The sale was cancelled before.
    #[error("sale {0} is already cancelled")]
    AlreadyCancelled(SaleId),

    /// The sale has nothing to restock.
    #[error("sale {0} has no items")]
    NoItems(SaleId),

    /// The backend refused to flag the sale.
    #[error("failed to cancel sale: {0}")]
    Cancel(#[source] ServiceError),
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Cancelled sale.
    pub sale_id: SaleId,

    /// How the restock went. Failed products stay queued.
    pub restock: ReconcileReport,
}

/// Cancels sales and restores their stock.
#[derive(Clone)]
pub struct SaleCanceller {
    sales: Arc<dyn SalesService>,
    reconciler: StockReconciler,
}

impl SaleCanceller {
    /// Canceller flagging sales through `sales` and restocking through
    /// `reconciler`.
    pub fn new(sales: Arc<dyn SalesService>, reconciler: StockReconciler) -> Self {
        Self { sales, reconciler }
    }

    /// Cancel the sale `id` from the previously loaded `sales` list.
    ///
    /// Stock is restored first; failures there are logged and left queued.
    /// The sale is then flagged as cancelled on the backend, and in `sales`
    /// once the backend accepts it.
    ///
    /// # Errors
    ///
    /// Returns a [`CancelError`] if the sale is unknown, already cancelled or
    /// empty, or if the backend refuses to flag it.
    pub async fn cancel(
        &self,
        sales: &mut [SaleRecord],
        id: &SaleId,
    ) -> Result<CancelOutcome, CancelError> {
        let sale = sales
            .iter_mut()
            .find(|sale| sale.id() == id)
            .ok_or_else(|| CancelError::NotFound(id.clone()))?;

        if sale.is_cancelled() {
            return Err(CancelError::AlreadyCancelled(id.clone()));
        }

        if sale.items().is_empty() {
            return Err(CancelError::NoItems(id.clone()));
        }

        let entries: Vec<PendingAdjustment> = sale_adjustments(sale.items(), Direction::Restore)
            .into_iter()
            .map(|adjustment| PendingAdjustment::new(id.clone(), adjustment))
            .collect();

        if let Err(error) = self.reconciler.outbox().enqueue(&entries) {
            warn!(sale = %id, %error, "failed to queue restock, applying without a queue");
        }

        let restock = self.reconciler.reconcile(entries).await;

        self.sales
            .cancel_sale(id.clone())
            .await
            .map_err(CancelError::Cancel)?;

        sale.mark_cancelled();

        info!(
            sale = %id,
            restocked = restock.updated.len(),
            failed = restock.failed.len(),
            "sale cancelled"
        );

        Ok(CancelOutcome {
            sale_id: id.clone(),
            restock,
        })
    }
}
