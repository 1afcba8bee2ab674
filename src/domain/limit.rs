// ============================================================================
// Limit (Price Level) Domain Model
// ============================================================================

use crate::numeric::{Price, Quantity};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::Order;

/// All resting orders at one price, in strict time priority.
///
/// The FIFO is keyed by the book-assigned arrival sequence: the front of the
/// queue is the smallest key, and removal of an arbitrary order (cancel) is
/// a logarithmic lookup by its sequence instead of a linear scan.
///
/// `total_volume` caches the sum of remaining quantities of the entries and
/// is adjusted in the same critical section as every queue mutation, so any
/// reader that observes the post-mutation queue observes the post-mutation
/// volume. The field is atomic so depth readers outside the owning worker
/// see a consistent value through release/acquire publication.
#[derive(Debug)]
pub struct Limit {
    price: Price,
    entries: BTreeMap<u64, Arc<Order>>,
    total_volume: AtomicI64,
}

impl Limit {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            entries: BTreeMap::new(),
            total_volume: AtomicI64::new(0),
        }
    }

    /// Append an order at the back of the FIFO.
    ///
    /// `seq` must be greater than every sequence already in the level; the
    /// book's monotonically increasing counter guarantees this.
    pub fn add(&mut self, seq: u64, order: Arc<Order>) {
        let remaining_raw = order.remaining_quantity().raw_value();
        self.entries.insert(seq, order);
        self.total_volume.fetch_add(remaining_raw, Ordering::AcqRel);
    }

    /// Remove the order with the given arrival sequence.
    ///
    /// Subtracts the order's remaining quantity as of removal time, which is
    /// zero for an order that was just fully filled.
    pub fn remove(&mut self, seq: u64) -> Option<Arc<Order>> {
        let order = self.entries.remove(&seq)?;
        let remaining_raw = order.remaining_quantity().raw_value();
        if remaining_raw > 0 {
            self.total_volume.fetch_sub(remaining_raw, Ordering::AcqRel);
        }
        Some(order)
    }

    /// Subtract an executed quantity from the cached volume.
    ///
    /// Called for every fill against the front order, partial or full.
    pub fn subtract_volume(&self, amount: Quantity) {
        self.total_volume
            .fetch_sub(amount.raw_value(), Ordering::AcqRel);
    }

    /// Oldest resting order and its arrival sequence.
    pub fn front(&self) -> Option<(u64, &Arc<Order>)> {
        self.entries.iter().next().map(|(seq, order)| (*seq, order))
    }

    /// Newest resting order and its arrival sequence.
    pub fn back(&self) -> Option<(u64, &Arc<Order>)> {
        self.entries
            .iter()
            .next_back()
            .map(|(seq, order)| (*seq, order))
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn total_volume(&self) -> Quantity {
        Quantity::from_raw(self.total_volume.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
