// ============================================================================
// Order Domain Model
// ============================================================================

use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Order identifier, unique across the process by caller convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(u64);

impl OrderId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Numeric encoding used in fill events: +1 for buy, -1 for sell.
    pub const fn sign(&self) -> i8 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    pub const fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderKind {
    /// Execute immediately at the best available prices; never rests.
    Market,
    /// Execute at the limit price or better; the remainder rests.
    Limit,
    /// Reserved: becomes a limit order once the stop price trades.
    /// Submissions are rejected until triggering is implemented.
    StopLimit { stop_price: Price },
}

// ============================================================================
// Order Entity
// ============================================================================

/// A single order instruction: immutable identity plus atomic fill state.
///
/// The mutable state is two fields, each with a single source of truth:
/// `filled_quantity` (monotonic non-decreasing) and `active`. Remaining
/// quantity is always derived as `quantity - filled_quantity`. Both fields
/// are published with release stores so that readers holding a clone of the
/// `Arc<Order>` on another thread observe a consistent snapshot without
/// taking the book's lock.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Arc<String>,
    pub side: Side,
    pub kind: OrderKind,
    /// Limit price; `None` for market orders.
    pub price: Option<Price>,
    /// Original quantity. Never changes after construction.
    pub quantity: Quantity,
    pub timestamp: DateTime<Utc>,

    // Atomic fill state (raw fixed-point units)
    filled_quantity: AtomicI64,
    active: AtomicBool,
}

impl Order {
    pub fn new(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        kind: OrderKind,
        price: Option<Price>,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            symbol: Arc::new(symbol.into()),
            side,
            kind,
            price,
            quantity,
            timestamp: Utc::now(),
            filled_quantity: AtomicI64::new(0),
            active: AtomicBool::new(true),
        }
    }

    /// Create a limit order.
    pub fn limit(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self::new(id, symbol, side, OrderKind::Limit, Some(price), quantity)
    }

    /// Create a market order.
    pub fn market(id: OrderId, symbol: impl Into<String>, side: Side, quantity: Quantity) -> Self {
        Self::new(id, symbol, side, OrderKind::Market, None, quantity)
    }

    // ========================================================================
    // Atomic Getters
    // ========================================================================

    pub fn filled_quantity(&self) -> Quantity {
        Quantity::from_raw(self.filled_quantity.load(Ordering::Acquire))
    }

    pub fn remaining_quantity(&self) -> Quantity {
        Quantity::from_raw(
            self.quantity.raw_value() - self.filled_quantity.load(Ordering::Acquire),
        )
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    // ========================================================================
    // Atomic Operations
    // ========================================================================

    /// Record a fill of `amount` against this order.
    ///
    /// Returns false without mutating state if `amount` is not positive or
    /// exceeds the remaining quantity. When the cumulative fill reaches the
    /// original quantity the order is deactivated in the same call.
    pub fn fill(&self, amount: Quantity) -> bool {
        let amount_raw = amount.raw_value();
        if amount_raw <= 0 {
            return false;
        }

        let total_raw = self.quantity.raw_value();

        loop {
            let filled = self.filled_quantity.load(Ordering::Acquire);
            let new_filled = filled + amount_raw;

            if new_filled > total_raw {
                return false; // Would overfill
            }

            if self
                .filled_quantity
                .compare_exchange(filled, new_filled, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if new_filled == total_raw {
                    self.active.store(false, Ordering::Release);
                }
                return true;
            }
            // CAS lost to a concurrent fill, retry
        }
    }

    /// Mark the order inactive (cancellation, or a market-order remainder).
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub fn is_market(&self) -> bool {
        matches!(self.kind, OrderKind::Market)
    }

    pub fn is_limit(&self) -> bool {
        matches!(self.kind, OrderKind::Limit)
    }
}

impl Clone for Order {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            symbol: Arc::clone(&self.symbol),
            side: self.side,
            kind: self.kind,
            price: self.price,
            quantity: self.quantity,
            timestamp: self.timestamp,
            filled_quantity: AtomicI64::new(self.filled_quantity.load(Ordering::Acquire)),
            active: AtomicBool::new(self.active.load(Ordering::Acquire)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(value: i64) -> Quantity {
        Quantity::from_integer(value).unwrap()
    }

    #[test]
    fn test_order_creation() {
        let order = Order::limit(
            OrderId::new(1),
            "AAPL",
            Side::Buy,
            Price::from_integer(150).unwrap(),
            qty(10),
        );

        assert_eq!(order.id, OrderId::new(1));
        assert_eq!(order.remaining_quantity(), qty(10));
        assert_eq!(order.filled_quantity(), Quantity::ZERO);
        assert!(order.is_active());
        assert!(order.is_limit());
    }

    #[test]
    fn test_market_order_has_no_price() {
        let order = Order::market(OrderId::new(2), "AAPL", Side::Sell, qty(5));
        assert!(order.price.is_none());
        assert!(order.is_market());
    }

    #[test]
    fn test_partial_fill() {
        let order = Order::limit(
            OrderId::new(3),
            "AAPL",
            Side::Buy,
            Price::from_integer(100).unwrap(),
            qty(10),
        );

        assert!(order.fill(qty(3)));
        assert_eq!(order.filled_quantity(), qty(3));
        assert_eq!(order.remaining_quantity(), qty(7));
        assert!(order.is_active());
    }

    #[test]
    fn test_full_fill_deactivates() {
        let order = Order::limit(
            OrderId::new(4),
            "AAPL",
            Side::Buy,
            Price::from_integer(100).unwrap(),
            qty(10),
        );

        assert!(order.fill(qty(10)));
        assert_eq!(order.remaining_quantity(), Quantity::ZERO);
        assert!(!order.is_active());
    }

    #[test]
    fn test_overfill_rejected() {
        let order = Order::limit(
            OrderId::new(5),
            "AAPL",
            Side::Buy,
            Price::from_integer(100).unwrap(),
            qty(5),
        );

        assert!(!order.fill(qty(10)));
        assert_eq!(order.filled_quantity(), Quantity::ZERO);
        assert!(order.is_active());
    }

    #[test]
    fn test_non_positive_fill_rejected() {
        let order = Order::limit(
            OrderId::new(6),
            "AAPL",
            Side::Buy,
            Price::from_integer(100).unwrap(),
            qty(5),
        );

        assert!(!order.fill(Quantity::ZERO));
        assert_eq!(order.filled_quantity(), Quantity::ZERO);
    }

    #[test]
    fn test_deactivate() {
        let order = Order::limit(
            OrderId::new(7),
            "AAPL",
            Side::Buy,
            Price::from_integer(100).unwrap(),
            qty(5),
        );

        order.deactivate();
        assert!(!order.is_active());
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Buy.sign(), 1);
        assert_eq!(Side::Sell.sign(), -1);
        assert_eq!(Side::Buy.opposite(), Side::Sell);
    }
}
