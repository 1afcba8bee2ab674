// ============================================================================
// Engine Errors
// Failure codes surfaced by the dispatcher
// ============================================================================

use thiserror::Error;

/// Errors returned by the dispatcher's public API.
///
/// Order-level validation failures (bad quantity, duplicate id, unknown
/// cancel target) are not errors at this layer: they are resolved on the
/// owning worker thread and reported through the book's boolean results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The dispatcher has been shut down; the request was not enqueued.
    #[error("engine is shut down")]
    Shutdown,

    /// The symbol worker's request queue is full. The request was not
    /// enqueued; the caller may retry.
    #[error("request queue for {symbol} is full")]
    Backpressure { symbol: String },

    /// No order book exists for the symbol, so there is nothing to cancel
    /// or query.
    #[error("no order book for symbol {0}")]
    UnknownSymbol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(EngineError::Shutdown.to_string(), "engine is shut down");
        assert_eq!(
            EngineError::Backpressure {
                symbol: "AAPL".to_string()
            }
            .to_string(),
            "request queue for AAPL is full"
        );
        assert_eq!(
            EngineError::UnknownSymbol("MSFT".to_string()).to_string(),
            "no order book for symbol MSFT"
        );
    }
}
