//! Stock Outbox
//!
//! Stock adjustments are written here before any backend call is made and
//! removed only once the backend has accepted them, so a crash or a failed
//! request leaves them queued for the next retry.
//!
//! Delivery is at least once. If the queue cannot be rewritten after the
//! backend accepted an update, those entries are applied again on the next
//! retry.

use std::sync::{Arc, Mutex};

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use till::{ids::TypedId, sales::SaleId, stock::StockAdjustment};
use tracing::debug;

use crate::storage::{LocalStore, StoreError, keys};

/// Pending Adjustment ID
pub type PendingId = TypedId<PendingAdjustment>;

/// A stock adjustment waiting to be applied to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAdjustment {
    /// Outbox entry ID
    pub id: PendingId,

    /// Sale the adjustment comes from.
    pub sale_id: SaleId,

    /// When the adjustment was queued.
    pub queued_at: Timestamp,

    /// The change itself.
    #[serde(flatten)]
    pub adjustment: StockAdjustment,
}

impl PendingAdjustment {
    /// Wrap `adjustment` in a fresh outbox entry for `sale_id`.
    pub fn new(sale_id: SaleId, adjustment: StockAdjustment) -> Self {
        Self {
            id: PendingId::generate(),
            sale_id,
            queued_at: Timestamp::now(),
            adjustment,
        }
    }
}

impl AsRef<StockAdjustment> for PendingAdjustment {
    fn as_ref(&self) -> &StockAdjustment {
        &self.adjustment
    }
}

/// Durable queue of [`PendingAdjustment`]s. Clones share the queue and the
/// set of entries currently being applied.
#[derive(Debug, Clone)]
pub struct StockOutbox {
    store: LocalStore,
    in_flight: Arc<Mutex<FxHashSet<PendingId>>>,
}

impl StockOutbox {
    /// Outbox kept in `store`.
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            in_flight: Arc::default(),
        }
    }

    /// Append `entries` to the queue.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the queue cannot be written.
    pub fn enqueue(&self, entries: &[PendingAdjustment]) -> Result<(), StoreError> {
        let queued = self.store.update(
            keys::PENDING_STOCK_ADJUSTMENTS,
            |pending: &mut Vec<PendingAdjustment>| {
                pending.extend_from_slice(entries);
                pending.len()
            },
        )?;

        debug!(added = entries.len(), queued, "stock adjustments queued");

        Ok(())
    }

    /// Every queued entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the queue cannot be read.
    pub fn pending(&self) -> Result<Vec<PendingAdjustment>, StoreError> {
        Ok(self
            .store
            .get::<Vec<PendingAdjustment>>(keys::PENDING_STOCK_ADJUSTMENTS)?
            .unwrap_or_default())
    }

    /// Drop the entries with the given ids from the queue.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the queue cannot be written.
    pub fn acknowledge(&self, ids: &[PendingId]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        self.store.update(
            keys::PENDING_STOCK_ADJUSTMENTS,
            |pending: &mut Vec<PendingAdjustment>| {
                pending.retain(|entry| !ids.contains(&entry.id));
            },
        )
    }

    /// Mark `entries` as being applied, returning only those nobody else is
    /// applying already. Claimed entries must be handed back with
    /// [`StockOutbox::release`].
    pub(crate) fn claim(&self, entries: Vec<PendingAdjustment>) -> Vec<PendingAdjustment> {
        let Ok(mut in_flight) = self.in_flight.lock() else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter(|entry| in_flight.insert(entry.id.clone()))
            .collect()
    }

    /// Hand claimed entries back.
    pub(crate) fn release<'a>(&self, ids: impl IntoIterator<Item = &'a PendingId>) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            for id in ids {
                in_flight.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use till::catalog::ProductId;

    use super::*;

    fn entry(product: &str, delta: i64) -> PendingAdjustment {
        PendingAdjustment::new(
            SaleId::new("s1"),
            StockAdjustment {
                product_id: ProductId::new(product),
                variant_color: None,
                delta,
            },
        )
    }

    #[test]
    fn queue_survives_reopen_until_acknowledged() -> TestResult {
        let dir = tempfile::tempdir()?;
        let outbox = StockOutbox::new(LocalStore::open(dir.path())?);

        let first = entry("p1", -2);
        let second = entry("p2", -1);

        outbox.enqueue(&[first.clone(), second.clone()])?;

        let reopened = StockOutbox::new(LocalStore::open(dir.path())?);

        assert_eq!(reopened.pending()?, [first.clone(), second.clone()]);

        reopened.acknowledge(&[first.id])?;

        assert_eq!(reopened.pending()?, [second]);

        Ok(())
    }

    #[test]
    fn claimed_entries_are_not_handed_out_twice() -> TestResult {
        let dir = tempfile::tempdir()?;
        let outbox = StockOutbox::new(LocalStore::open(dir.path())?);
        let other = outbox.clone();

        let entries = vec![entry("p1", -1), entry("p2", -1)];

        let claimed = outbox.claim(entries.clone());

        assert_eq!(claimed.len(), 2);
        assert!(other.claim(entries.clone()).is_empty());

        outbox.release(claimed.iter().map(|entry| &entry.id));

        assert_eq!(other.claim(entries).len(), 2);

        Ok(())
    }
}
