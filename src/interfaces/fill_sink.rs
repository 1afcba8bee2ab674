// ============================================================================
// Fill Sink Interface
// Defines the contract for receiving trade executions
// ============================================================================

use crate::domain::Fill;
use parking_lot::Mutex;

/// Receiver of fill events from the matching engine.
///
/// The sink is invoked by the symbol worker thread that processed the order,
/// zero or more times per submission, in execution order (best price first,
/// oldest order first within a price). One sink instance may be shared
/// across symbols, so implementations must be thread-safe.
///
/// A sink must not call back into the dispatcher for the same symbol: the
/// worker is inside that book's critical section while fills are delivered.
pub trait FillSink: Send + Sync {
    /// Handle one executed fill.
    fn on_fill(&self, fill: &Fill);
}

/// No-op sink for testing and benchmarks.
pub struct NoOpFillSink;

impl FillSink for NoOpFillSink {
    fn on_fill(&self, _fill: &Fill) {
        // Do nothing
    }
}

/// Sink that logs every fill.
pub struct LoggingFillSink;

impl FillSink for LoggingFillSink {
    fn on_fill(&self, fill: &Fill) {
        tracing::debug!(
            symbol = %fill.symbol,
            price = %fill.price,
            quantity = %fill.quantity,
            side_sign = fill.side_sign(),
            "fill executed"
        );
    }
}

/// Sink that accumulates fills for later inspection.
#[derive(Default)]
pub struct CollectingFillSink {
    fills: Mutex<Vec<Fill>>,
}

impl CollectingFillSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the fills collected so far, in arrival order.
    pub fn fills(&self) -> Vec<Fill> {
        self.fills.lock().clone()
    }

    /// Drain and return the collected fills.
    pub fn take(&self) -> Vec<Fill> {
        std::mem::take(&mut *self.fills.lock())
    }

    pub fn len(&self) -> usize {
        self.fills.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.lock().is_empty()
    }
}

impl FillSink for CollectingFillSink {
    fn on_fill(&self, fill: &Fill) {
        self.fills.lock().push(fill.clone());
    }
}
