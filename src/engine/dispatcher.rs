// ============================================================================
// Dispatcher
// Routes requests to per-symbol workers and coordinates shutdown
// ============================================================================

use crossbeam::channel::TrySendError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::domain::{Book, BookSnapshot, EngineConfig, Order, OrderId};
use crate::interfaces::FillSink;
use crate::numeric::Price;

use super::errors::EngineError;
use super::worker::{Request, SymbolWorker};

/// Routes incoming requests to the worker owning the target symbol.
///
/// Workers are created lazily on first sight of a symbol and each owns its
/// book exclusively; books for different symbols run fully in parallel. The
/// worker map sits behind one coarse mutex held only for O(1) lookup and
/// insert, never across book work.
///
/// `submit` and `cancel` may be called from any number of producer threads.
/// All fills are delivered to the sink supplied at construction, on the
/// worker thread that executed them.
pub struct Dispatcher {
    config: EngineConfig,
    fill_sink: Arc<dyn FillSink>,
    workers: Mutex<HashMap<String, SymbolWorker>>,
    running: AtomicBool,
}

impl Dispatcher {
    /// Create a dispatcher with the default configuration.
    pub fn new(fill_sink: Arc<dyn FillSink>) -> Self {
        Self::with_config(EngineConfig::default(), fill_sink)
    }

    pub fn with_config(config: EngineConfig, fill_sink: Arc<dyn FillSink>) -> Self {
        Self {
            config,
            fill_sink,
            workers: Mutex::new(HashMap::new()),
            running: AtomicBool::new(true),
        }
    }

    /// Submit an order to the book for its symbol.
    ///
    /// Acceptance means the request was enqueued on the owning worker;
    /// order-level validation happens on that worker and rejected orders
    /// simply produce no fills. A full queue returns
    /// [`EngineError::Backpressure`] and the caller may retry.
    pub fn submit(&self, order: Arc<Order>) -> Result<(), EngineError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(EngineError::Shutdown);
        }

        let symbol = (*order.symbol).clone();
        let sender = {
            let mut workers = self.workers.lock();
            // Re-checked under the lock so no worker is spawned after shutdown
            if !self.running.load(Ordering::Acquire) {
                return Err(EngineError::Shutdown);
            }

            match workers.get(symbol.as_str()) {
                Some(worker) => worker.sender().clone(),
                None => {
                    let worker = SymbolWorker::spawn(&symbol, self.config.queue_capacity);
                    let sender = worker.sender().clone();
                    workers.insert(symbol.clone(), worker);
                    sender
                },
            }
        };

        let request = Request::Add {
            order,
            sink: Arc::clone(&self.fill_sink),
        };
        match sender.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EngineError::Backpressure { symbol }),
            Err(TrySendError::Disconnected(_)) => Err(EngineError::Shutdown),
        }
    }

    /// Cancel a resting order on the given symbol's book.
    ///
    /// Cancellation is itself a queued request: success means it was
    /// enqueued, and an unknown id resolves to a no-op on the worker.
    /// Cancelling across symbols by id alone is not supported because the
    /// id index is per-book.
    pub fn cancel(&self, order_id: OrderId, symbol: &str) -> Result<(), EngineError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(EngineError::Shutdown);
        }

        let sender = {
            let workers = self.workers.lock();
            if !self.running.load(Ordering::Acquire) {
                return Err(EngineError::Shutdown);
            }

            match workers.get(symbol) {
                Some(worker) => worker.sender().clone(),
                None => return Err(EngineError::UnknownSymbol(symbol.to_string())),
            }
        };

        match sender.try_send(Request::Cancel { order_id }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EngineError::Backpressure {
                symbol: symbol.to_string(),
            }),
            Err(TrySendError::Disconnected(_)) => Err(EngineError::Shutdown),
        }
    }

    /// Shut down every worker and release every book.
    ///
    /// Requests enqueued before this call are drained; requests arriving
    /// after it are refused. When this method returns no book will mutate
    /// again and no further fills will be delivered. Idempotent and safe to
    /// call from any thread.
    pub fn shutdown(&self) {
        let mut workers = self.workers.lock();
        if !self.running.swap(false, Ordering::AcqRel) {
            return; // Already shut down; joins happened under this lock
        }

        for worker in workers.values_mut() {
            worker.shutdown_and_join();
        }
        workers.clear();

        info!("dispatcher shut down");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    // ========================================================================
    // Read-only surface
    // ========================================================================

    /// Depth snapshot of a symbol's book, without involving its worker.
    pub fn snapshot(&self, symbol: &str, depth: usize) -> Option<BookSnapshot> {
        let book = self.book_handle(symbol)?;
        let snapshot = book.read().snapshot(depth);
        Some(snapshot)
    }

    /// Best bid for a symbol, if its book exists and has bids.
    pub fn best_bid(&self, symbol: &str) -> Option<Price> {
        let book = self.book_handle(symbol)?;
        let best = book.read().best_bid();
        best
    }

    /// Best ask for a symbol, if its book exists and has asks.
    pub fn best_ask(&self, symbol: &str) -> Option<Price> {
        let book = self.book_handle(symbol)?;
        let best = book.read().best_ask();
        best
    }

    /// Clone the book handle out from under the map lock so readers never
    /// hold the map lock across the book's read lock.
    fn book_handle(&self, symbol: &str) -> Option<Arc<RwLock<Book>>> {
        let workers = self.workers.lock();
        workers.get(symbol).map(|worker| Arc::clone(worker.book()))
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use crate::interfaces::{CollectingFillSink, NoOpFillSink};
    use crate::numeric::{Price, Quantity};

    fn limit_order(id: u64, symbol: &str, side: Side, price: i64, quantity: i64) -> Arc<Order> {
        Arc::new(Order::limit(
            OrderId::new(id),
            symbol,
            side,
            Price::from_integer(price).unwrap(),
            Quantity::from_integer(quantity).unwrap(),
        ))
    }

    #[test]
    fn test_workers_created_lazily_per_symbol() {
        let dispatcher = Dispatcher::new(Arc::new(NoOpFillSink));

        dispatcher
            .submit(limit_order(1, "AAPL", Side::Buy, 100, 1))
            .unwrap();
        dispatcher
            .submit(limit_order(2, "MSFT", Side::Buy, 200, 1))
            .unwrap();
        dispatcher
            .submit(limit_order(3, "AAPL", Side::Buy, 99, 1))
            .unwrap();

        assert_eq!(dispatcher.workers.lock().len(), 2);
        dispatcher.shutdown();
    }

    #[test]
    fn test_submit_and_cancel_after_shutdown_rejected() {
        let dispatcher = Dispatcher::new(Arc::new(NoOpFillSink));
        dispatcher
            .submit(limit_order(1, "AAPL", Side::Buy, 100, 1))
            .unwrap();

        dispatcher.shutdown();
        assert!(!dispatcher.is_running());

        assert_eq!(
            dispatcher.submit(limit_order(2, "AAPL", Side::Buy, 100, 1)),
            Err(EngineError::Shutdown)
        );
        assert_eq!(
            dispatcher.cancel(OrderId::new(1), "AAPL"),
            Err(EngineError::Shutdown)
        );
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let dispatcher = Dispatcher::new(Arc::new(NoOpFillSink));
        dispatcher
            .submit(limit_order(1, "AAPL", Side::Buy, 100, 1))
            .unwrap();

        dispatcher.shutdown();
        dispatcher.shutdown();
    }

    #[test]
    fn test_cancel_unknown_symbol() {
        let dispatcher = Dispatcher::new(Arc::new(NoOpFillSink));

        assert_eq!(
            dispatcher.cancel(OrderId::new(1), "MSFT"),
            Err(EngineError::UnknownSymbol("MSFT".to_string()))
        );
        dispatcher.shutdown();
    }

    #[test]
    fn test_shutdown_drains_pending_requests() {
        let fills = Arc::new(CollectingFillSink::new());
        let dispatcher = Dispatcher::new(Arc::clone(&fills) as Arc<dyn FillSink>);

        dispatcher
            .submit(limit_order(1, "AAPL", Side::Sell, 100, 5))
            .unwrap();
        dispatcher
            .submit(limit_order(2, "AAPL", Side::Buy, 100, 5))
            .unwrap();

        dispatcher.shutdown();

        // Both requests were enqueued before the sentinel, so the cross
        // happened even though shutdown followed immediately.
        assert_eq!(fills.len(), 1);
    }

    #[test]
    fn test_snapshot_after_resting_orders() {
        let dispatcher = Dispatcher::new(Arc::new(NoOpFillSink));

        dispatcher
            .submit(limit_order(1, "AAPL", Side::Buy, 100, 2))
            .unwrap();
        dispatcher
            .submit(limit_order(2, "AAPL", Side::Sell, 101, 3))
            .unwrap();

        // The worker applies requests asynchronously; poll until both rest
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let snapshot = loop {
            let snapshot = dispatcher.snapshot("AAPL", 10).unwrap();
            if snapshot.best_bid().is_some() && snapshot.best_ask().is_some() {
                break snapshot;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "orders never reached the book"
            );
            std::thread::yield_now();
        };

        assert_eq!(
            snapshot.best_bid(),
            Some(Price::from_integer(100).unwrap())
        );
        assert_eq!(
            snapshot.best_ask(),
            Some(Price::from_integer(101).unwrap())
        );
        assert_eq!(dispatcher.best_bid("AAPL"), snapshot.best_bid());
        assert_eq!(dispatcher.best_ask("AAPL"), snapshot.best_ask());

        assert!(dispatcher.snapshot("MSFT", 10).is_none());
        dispatcher.shutdown();
    }
}
