//! Stock Reconciliation
//!
//! Applies queued stock adjustments to the backend: one read and one write
//! per product, whatever the number of queued entries for it. Products are
//! handled concurrently and independently; a product that fails keeps its
//! entries queued and does not hold the others back.

use std::sync::Arc;

use futures::future::join_all;
use till::{
    catalog::ProductId,
    stock::{apply_adjustments, group_by_product},
};
use tracing::{error, info, warn};

use super::outbox::{PendingAdjustment, PendingId, StockOutbox};
use crate::{
    services::{ProductsService, ServiceError},
    storage::StoreError,
};

/// What one reconciliation pass achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Products whose stock was written back.
    pub updated: Vec<ProductId>,

    /// Products that could not be updated; their entries stay queued.
    pub failed: Vec<ProductId>,

    /// Entries dropped because they name a variant the product no longer has.
    pub discarded: usize,
}

impl ReconcileReport {
    /// `true` if every product was updated.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum ProductOutcome {
    Updated {
        product_id: ProductId,
        acknowledged: Vec<PendingId>,
        discarded: usize,
    },
    Failed {
        product_id: ProductId,
        discarded: Vec<PendingId>,
    },
}

/// Applies outbox entries to the backend.
#[derive(Clone)]
pub struct StockReconciler {
    products: Arc<dyn ProductsService>,
    outbox: StockOutbox,
}

impl StockReconciler {
    /// Reconciler writing through `products` and acknowledging in `outbox`.
    pub fn new(products: Arc<dyn ProductsService>, outbox: StockOutbox) -> Self {
        Self { products, outbox }
    }

    /// Outbox this reconciler drains.
    pub fn outbox(&self) -> &StockOutbox {
        &self.outbox
    }

    /// Apply every queued entry.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the queue cannot be read.
    pub async fn retry_pending(&self) -> Result<ReconcileReport, StoreError> {
        let pending = self.outbox.pending()?;

        if pending.is_empty() {
            return Ok(ReconcileReport::default());
        }

        info!(entries = pending.len(), "retrying queued stock adjustments");

        Ok(self.reconcile(pending).await)
    }

    /// Apply `entries`, skipping any another pass is already applying.
    /// Entries the backend accepted are removed from the queue.
    pub async fn reconcile(&self, entries: Vec<PendingAdjustment>) -> ReconcileReport {
        let claimed = self.outbox.claim(entries);
        let claimed_ids: Vec<PendingId> = claimed.iter().map(|entry| entry.id.clone()).collect();

        let outcomes = join_all(
            group_by_product(claimed)
                .into_iter()
                .map(|(product_id, group)| self.apply_product(product_id, group)),
        )
        .await;

        let mut report = ReconcileReport::default();
        let mut acknowledged = Vec::new();

        for outcome in outcomes {
            match outcome {
                ProductOutcome::Updated {
                    product_id,
                    acknowledged: ids,
                    discarded,
                } => {
                    report.updated.push(product_id);
                    report.discarded += discarded;
                    acknowledged.extend(ids);
                }
                ProductOutcome::Failed {
                    product_id,
                    discarded,
                } => {
                    report.failed.push(product_id);
                    report.discarded += discarded.len();
                    acknowledged.extend(discarded);
                }
            }
        }

        if let Err(error) = self.outbox.acknowledge(&acknowledged) {
            error!(
                %error,
                entries = acknowledged.len(),
                "failed to remove applied stock adjustments from the queue; \
                 they will be applied again on the next retry"
            );
        }

        self.outbox.release(&claimed_ids);

        if !report.is_complete() {
            warn!(
                failed = report.failed.len(),
                "stock adjustments left queued for retry"
            );
        }

        report
    }

    async fn apply_product(
        &self,
        product_id: ProductId,
        group: Vec<PendingAdjustment>,
    ) -> ProductOutcome {
        let mut product = match self.products.get_product(product_id.clone()).await {
            Ok(product) => product,
            Err(error) => return failed(product_id, &error, Vec::new()),
        };

        let rejected = apply_adjustments(&mut product, &group);

        let discarded: Vec<PendingId> = rejected
            .into_iter()
            .filter_map(|(index, reason)| {
                let entry = group.get(index)?;

                error!(
                    product = %product_id,
                    sale = %entry.sale_id,
                    %reason,
                    "discarding stock adjustment"
                );

                Some(entry.id.clone())
            })
            .collect();

        if discarded.len() == group.len() {
            return ProductOutcome::Updated {
                product_id,
                acknowledged: discarded.clone(),
                discarded: discarded.len(),
            };
        }

        if let Err(error) = self.products.update_product(product).await {
            return failed(product_id, &error, discarded);
        }

        info!(product = %product_id, entries = group.len(), "stock updated");

        ProductOutcome::Updated {
            product_id,
            discarded: discarded.len(),
            acknowledged: group.into_iter().map(|entry| entry.id).collect(),
        }
    }
}

fn failed(
    product_id: ProductId,
    error: &ServiceError,
    discarded: Vec<PendingId>,
) -> ProductOutcome {
    warn!(product = %product_id, %error, "failed to update stock");

    ProductOutcome::Failed {
        product_id,
        discarded,
    }
}
