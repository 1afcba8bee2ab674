// ============================================================================
// Symbol Worker
// Single-writer thread owning one symbol's order book
// ============================================================================

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::domain::{Book, Order, OrderId};
use crate::interfaces::FillSink;

/// A request on a symbol worker's queue.
///
/// Requests are applied strictly in enqueue order. `Shutdown` is a sentinel:
/// the worker stops draining once it is dequeued, so everything enqueued
/// before it is still processed and everything after it is dropped.
pub enum Request {
    Add {
        order: Arc<Order>,
        sink: Arc<dyn FillSink>,
    },
    Cancel {
        order_id: OrderId,
    },
    Shutdown,
}

/// Per-symbol worker: one book, one bounded request queue, one thread.
///
/// The worker is the only writer of its book. It holds the book's write
/// lock for the full application of each request, so between dequeuing a
/// request and publishing its effects (book mutation plus emitted fills) no
/// other mutation of the book can occur. Depth readers share the
/// `Arc<RwLock<Book>>` and take the read lock.
pub struct SymbolWorker {
    sender: Sender<Request>,
    book: Arc<RwLock<Book>>,
    thread: Option<JoinHandle<()>>,
}

impl SymbolWorker {
    /// Create the book and start the worker thread for a symbol.
    pub fn spawn(symbol: &str, queue_capacity: usize) -> Self {
        let book = Arc::new(RwLock::new(Book::new(symbol)));
        let (sender, receiver) = bounded(queue_capacity);

        let thread_book = Arc::clone(&book);
        let thread_symbol = symbol.to_string();
        let thread = thread::Builder::new()
            .name(format!("book-{symbol}"))
            .spawn(move || Self::run(thread_symbol, thread_book, receiver))
            .expect("failed to spawn symbol worker thread");

        Self {
            sender,
            book,
            thread: Some(thread),
        }
    }

    /// The worker loop: drain requests in FIFO order until the shutdown
    /// sentinel arrives or every sender is gone.
    fn run(symbol: String, book: Arc<RwLock<Book>>, receiver: Receiver<Request>) {
        info!(symbol = %symbol, "symbol worker started");

        loop {
            let request = match receiver.recv() {
                Ok(request) => request,
                Err(_) => break, // All senders dropped
            };

            match request {
                Request::Add { order, sink } => {
                    let order_id = order.id;
                    let accepted = book.write().add_order(order, sink.as_ref());
                    if !accepted {
                        warn!(symbol = %symbol, order_id = %order_id, "order rejected");
                    }
                },
                Request::Cancel { order_id } => {
                    let cancelled = book.write().cancel_order(order_id);
                    if !cancelled {
                        debug!(symbol = %symbol, order_id = %order_id, "cancel target not found");
                    }
                },
                Request::Shutdown => break,
            }
        }

        info!(symbol = %symbol, "symbol worker stopped");
    }

    /// Sender end of the request queue.
    pub fn sender(&self) -> &Sender<Request> {
        &self.sender
    }

    /// Shared handle to this worker's book, for read-only snapshots.
    pub fn book(&self) -> &Arc<RwLock<Book>> {
        &self.book
    }

    /// Enqueue the shutdown sentinel and join the worker thread.
    ///
    /// Requests already in the queue are drained first. Safe to call more
    /// than once; later calls are no-ops.
    pub fn shutdown_and_join(&mut self) {
        let Some(handle) = self.thread.take() else {
            return;
        };

        // A send failure means the worker already exited; join regardless.
        let _ = self.sender.send(Request::Shutdown);

        if handle.join().is_err() {
            error!("symbol worker thread panicked");
        }
    }
}

impl Drop for SymbolWorker {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use crate::interfaces::CollectingFillSink;
    use crate::numeric::{Price, Quantity};

    fn limit_order(id: u64, side: Side, price: i64, quantity: i64) -> Arc<Order> {
        Arc::new(Order::limit(
            OrderId::new(id),
            "AAPL",
            side,
            Price::from_integer(price).unwrap(),
            Quantity::from_integer(quantity).unwrap(),
        ))
    }

    #[test]
    fn test_worker_applies_requests_in_order() {
        let mut worker = SymbolWorker::spawn("AAPL", 64);
        let sink: Arc<CollectingFillSink> = Arc::new(CollectingFillSink::new());

        let requests = vec![
            Request::Add {
                order: limit_order(1, Side::Sell, 100, 5),
                sink: Arc::clone(&sink) as Arc<dyn FillSink>,
            },
            Request::Add {
                order: limit_order(2, Side::Buy, 100, 3),
                sink: Arc::clone(&sink) as Arc<dyn FillSink>,
            },
            Request::Cancel {
                order_id: OrderId::new(1),
            },
        ];
        for request in requests {
            worker.sender().send(request).unwrap();
        }

        worker.shutdown_and_join();

        let fills = sink.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].quantity, Quantity::from_integer(3).unwrap());

        // The partially filled maker was cancelled afterwards
        let book = worker.book().read();
        assert!(book.is_empty());
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_requests_after_shutdown_sentinel_are_dropped() {
        let mut worker = SymbolWorker::spawn("AAPL", 64);
        let sink: Arc<CollectingFillSink> = Arc::new(CollectingFillSink::new());

        worker.sender().send(Request::Shutdown).unwrap();
        // May race the worker's exit; either way it must never be applied.
        let _ = worker.sender().send(Request::Add {
            order: limit_order(1, Side::Buy, 100, 5),
            sink: Arc::clone(&sink) as Arc<dyn FillSink>,
        });

        worker.shutdown_and_join();

        assert!(worker.book().read().is_empty());
    }

    #[test]
    fn test_shutdown_and_join_is_idempotent() {
        let mut worker = SymbolWorker::spawn("AAPL", 8);
        worker.shutdown_and_join();
        worker.shutdown_and_join();
    }
}
