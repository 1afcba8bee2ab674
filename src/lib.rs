// ============================================================================
// Limitbook
// Price-time-priority limit order book matching engine
// ============================================================================

//! # Limitbook
//!
//! A price-time-priority limit order book matching engine with one dedicated
//! worker thread per symbol.
//!
//! ## Features
//!
//! - **Price-time priority matching**: best price first, strict FIFO within
//!   a price level
//! - **Per-symbol single-writer concurrency**: every symbol's book is owned
//!   by one worker thread draining a bounded request queue
//! - **Exact fixed-point prices**: no floating-point keys in the book
//! - **Per-fill callbacks** delivered in execution order through a
//!   pluggable sink
//!
//! ## Example
//!
//! ```rust
//! use limitbook::prelude::*;
//! use limitbook::numeric::{Price, Quantity};
//! use std::sync::Arc;
//!
//! let fills = Arc::new(CollectingFillSink::new());
//! let engine = Dispatcher::new(Arc::clone(&fills) as Arc<dyn FillSink>);
//!
//! let ask = Arc::new(Order::limit(
//!     OrderId::new(1),
//!     "BTC-USD",
//!     Side::Sell,
//!     Price::from_integer(50_000).unwrap(),
//!     Quantity::from_integer(1).unwrap(),
//! ));
//! engine.submit(ask).unwrap();
//!
//! let bid = Arc::new(Order::limit(
//!     OrderId::new(2),
//!     "BTC-USD",
//!     Side::Buy,
//!     Price::from_integer(50_000).unwrap(),
//!     Quantity::from_integer(1).unwrap(),
//! ));
//! engine.submit(bid).unwrap();
//!
//! // Shutdown drains every queue, so all fills have been delivered
//! engine.shutdown();
//! assert_eq!(fills.fills().len(), 1);
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod numeric;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        Book, BookSnapshot, EngineConfig, Fill, Limit, Order, OrderId, OrderKind, Side,
    };
    pub use crate::engine::{Dispatcher, EngineError, Request, SymbolWorker};
    pub use crate::interfaces::{CollectingFillSink, FillSink, LoggingFillSink, NoOpFillSink};
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use crate::numeric::{Price, Quantity};
    use std::sync::Arc;

    fn px(value: &str) -> Price {
        value.parse().unwrap()
    }

    fn qty(value: i64) -> Quantity {
        Quantity::from_integer(value).unwrap()
    }

    fn limit_order(id: u64, symbol: &str, side: Side, price: &str, quantity: i64) -> Arc<Order> {
        Arc::new(Order::limit(
            OrderId::new(id),
            symbol,
            side,
            px(price),
            qty(quantity),
        ))
    }

    #[test]
    fn test_end_to_end_cross_and_market_sweep() {
        let fills = Arc::new(CollectingFillSink::new());
        let engine = Dispatcher::new(Arc::clone(&fills) as Arc<dyn FillSink>);

        engine
            .submit(limit_order(1, "AAPL", Side::Sell, "150.50", 150))
            .unwrap();
        engine
            .submit(limit_order(2, "AAPL", Side::Sell, "151.00", 100))
            .unwrap();
        engine
            .submit(limit_order(3, "AAPL", Side::Buy, "151.00", 120))
            .unwrap();
        engine
            .submit(Arc::new(Order::market(
                OrderId::new(4),
                "AAPL",
                Side::Buy,
                qty(100),
            )))
            .unwrap();

        engine.shutdown();

        // One symbol, one queue: fills arrive in the engine's total order
        let collected = fills.fills();
        let triples: Vec<(Price, Quantity, i8)> = collected
            .iter()
            .map(|f| (f.price, f.quantity, f.side_sign()))
            .collect();
        assert_eq!(
            triples,
            vec![
                (px("150.50"), qty(120), 1),
                (px("150.50"), qty(30), 1),
                (px("151.00"), qty(70), 1),
            ]
        );
        assert!(collected.iter().all(|f| f.symbol == "AAPL"));
    }

    #[test]
    fn test_cancelled_order_never_matches() {
        let fills = Arc::new(CollectingFillSink::new());
        let engine = Dispatcher::new(Arc::clone(&fills) as Arc<dyn FillSink>);

        engine
            .submit(limit_order(1, "AAPL", Side::Buy, "100", 10))
            .unwrap();
        engine.cancel(OrderId::new(1), "AAPL").unwrap();
        // Would cross the bid if the cancel had not landed first
        engine
            .submit(limit_order(2, "AAPL", Side::Sell, "100", 10))
            .unwrap();

        engine.shutdown();

        assert!(fills.is_empty());
    }

    #[test]
    fn test_symbols_match_independently() {
        let fills = Arc::new(CollectingFillSink::new());
        let engine = Dispatcher::new(Arc::clone(&fills) as Arc<dyn FillSink>);

        engine
            .submit(limit_order(1, "AAPL", Side::Sell, "150", 5))
            .unwrap();
        engine
            .submit(limit_order(2, "MSFT", Side::Sell, "300", 5))
            .unwrap();
        engine
            .submit(limit_order(3, "AAPL", Side::Buy, "150", 5))
            .unwrap();
        engine
            .submit(limit_order(4, "MSFT", Side::Buy, "300", 5))
            .unwrap();

        engine.shutdown();

        let collected = fills.fills();
        assert_eq!(collected.len(), 2);

        let aapl: Vec<_> = collected.iter().filter(|f| f.symbol == "AAPL").collect();
        let msft: Vec<_> = collected.iter().filter(|f| f.symbol == "MSFT").collect();
        assert_eq!(aapl.len(), 1);
        assert_eq!(aapl[0].price, px("150"));
        assert_eq!(msft.len(), 1);
        assert_eq!(msft[0].price, px("300"));
    }

    #[test]
    fn test_many_producer_threads() {
        let fills = Arc::new(CollectingFillSink::new());
        let engine = Dispatcher::with_config(
            EngineConfig::new().with_queue_capacity(256),
            Arc::clone(&fills) as Arc<dyn FillSink>,
        );

        let symbols = ["AAPL", "MSFT", "GOOG", "AMZN"];
        std::thread::scope(|scope| {
            for (index, symbol) in symbols.iter().enumerate() {
                let engine = &engine;
                scope.spawn(move || {
                    let base = (index as u64 + 1) * 1000;
                    for i in 0..10 {
                        engine
                            .submit(limit_order(base + i * 2, symbol, Side::Sell, "100", 1))
                            .unwrap();
                        engine
                            .submit(limit_order(base + i * 2 + 1, symbol, Side::Buy, "100", 1))
                            .unwrap();
                    }
                });
            }
        });

        engine.shutdown();

        let collected = fills.fills();
        assert_eq!(collected.len(), symbols.len() * 10);
        for symbol in symbols {
            assert_eq!(
                collected.iter().filter(|f| f.symbol == symbol).count(),
                10,
                "wrong fill count for {symbol}"
            );
        }
    }
}
