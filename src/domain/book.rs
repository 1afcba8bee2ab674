// ============================================================================
// Order Book Domain Model
// Price-time priority book for a single symbol
// ============================================================================

use crate::interfaces::FillSink;
use crate::numeric::{Price, Quantity};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{Fill, Limit, Order, OrderId, OrderKind, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Book
// ============================================================================

/// Index entry for a resting order: the order itself plus the arrival
/// sequence that keys it inside its price level.
#[derive(Debug)]
struct BookEntry {
    order: Arc<Order>,
    seq: u64,
}

/// Price-time priority order book for one symbol.
///
/// Both sides are sorted price-level maps: the best bid is the highest key
/// of `bids`, the best ask the lowest key of `asks`. A separate id index
/// holds every resting order together with its arrival sequence, so a cancel
/// is two logarithmic lookups instead of a scan.
///
/// The book is single-writer: exactly one symbol worker mutates it, holding
/// the enclosing write lock for the whole application of a request. Within
/// that critical section the derived aggregates (level volume, fill state)
/// always move together with the structures they summarize.
#[derive(Debug)]
pub struct Book {
    symbol: Arc<String>,

    /// Bid levels; best bid = highest price = last key
    bids: BTreeMap<Price, Limit>,

    /// Ask levels; best ask = lowest price = first key
    asks: BTreeMap<Price, Limit>,

    /// Resting orders by id, for cancellation
    orders: HashMap<OrderId, BookEntry>,

    /// Arrival sequence counter; assigned when an order rests
    next_seq: u64,
}

impl Book {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Arc::new(symbol.into()),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Process an incoming order against this book.
    ///
    /// Returns false without mutating state when the order is invalid:
    /// inactive, non-positive quantity, duplicate id, a limit order without
    /// a positive price, or the reserved stop-limit kind.
    ///
    /// Market orders match and never rest; whatever cannot execute is
    /// discarded and the call still returns true. Limit orders match first
    /// and rest any remainder at their limit price.
    pub fn add_order(&mut self, order: Arc<Order>, sink: &dyn FillSink) -> bool {
        if !order.is_active() {
            return false;
        }
        if !order.quantity.is_positive() {
            return false;
        }
        if self.orders.contains_key(&order.id) {
            return false;
        }

        match order.kind {
            OrderKind::Market => {
                self.match_order(&order, sink);
                true
            },
            OrderKind::Limit => {
                match order.price {
                    Some(price) if price.is_positive() => {},
                    _ => return false,
                }
                self.match_order(&order, sink);
                true
            },
            // Reserved: the stop trigger is not implemented, and resting a
            // stop-limit at its limit price without one would be wrong.
            OrderKind::StopLimit { .. } => false,
        }
    }

    /// Cancel a resting order by id.
    ///
    /// Returns false if the id is not resting on this book. On success the
    /// order is deactivated, removed from its level, and the level is
    /// dropped if it became empty.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        let Some(entry) = self.orders.remove(&order_id) else {
            return false;
        };

        entry.order.deactivate();

        let price = entry
            .order
            .price
            .expect("book invariant: resting orders carry a price");
        let levels = match entry.order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels
            .get_mut(&price)
            .expect("book invariant: indexed order references a live price level");

        level.remove(entry.seq);
        if level.is_empty() {
            levels.remove(&price);
        }

        true
    }

    /// Match an incoming order against the opposite side, best price first
    /// and oldest order first within a price. One fill is emitted to the
    /// sink per execution, in execution order.
    fn match_order(&mut self, taker: &Arc<Order>, sink: &dyn FillSink) {
        while taker.remaining_quantity().is_positive() {
            let opposite = match taker.side {
                Side::Buy => self.asks.iter_mut().next(),
                Side::Sell => self.bids.iter_mut().next_back(),
            };
            let Some((&level_price, level)) = opposite else {
                break;
            };

            // A limit taker stops at the first level beyond its limit; no
            // further level can be acceptable. Market takers take any price.
            if taker.is_limit() {
                let limit_price = taker.price.expect("limit orders carry a price");
                let acceptable = match taker.side {
                    Side::Buy => level_price <= limit_price,
                    Side::Sell => level_price >= limit_price,
                };
                if !acceptable {
                    break;
                }
            }

            let (maker_seq, maker) = level
                .front()
                .map(|(seq, order)| (seq, Arc::clone(order)))
                .expect("book invariant: empty price levels are removed eagerly");

            let fill_quantity = taker
                .remaining_quantity()
                .min(maker.remaining_quantity());

            // Execution is at the resting price. A taker whose limit is
            // better than the maker's price receives the improvement here.
            let applied = maker.fill(fill_quantity) && taker.fill(fill_quantity);
            assert!(
                applied,
                "book invariant: a fill within both remaining quantities must apply"
            );

            level.subtract_volume(fill_quantity);

            sink.on_fill(&Fill::new(
                (*self.symbol).clone(),
                level_price,
                fill_quantity,
                taker.side,
                maker.id,
                taker.id,
            ));

            // A fully filled maker leaves the book in the same critical
            // section that recorded its last fill.
            let mut level_emptied = false;
            if !maker.remaining_quantity().is_positive() {
                level.remove(maker_seq);
                self.orders.remove(&maker.id);
                level_emptied = level.is_empty();
            }

            if level_emptied {
                match taker.side {
                    Side::Buy => self.asks.remove(&level_price),
                    Side::Sell => self.bids.remove(&level_price),
                };
            }
        }

        if taker.remaining_quantity().is_positive() {
            match taker.kind {
                OrderKind::Limit => self.rest_on_book(Arc::clone(taker)),
                // Market remainders are discarded, never rested
                _ => taker.deactivate(),
            }
        }
    }

    fn rest_on_book(&mut self, order: Arc<Order>) {
        let price = order.price.expect("limit orders carry a price");
        let seq = self.next_seq;
        self.next_seq += 1;

        let levels = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels
            .entry(price)
            .or_insert_with(|| Limit::new(price))
            .add(seq, Arc::clone(&order));

        self.orders.insert(order.id, BookEntry { order, seq });
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    /// Highest bid price, if any bid rests.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price, if any ask rests.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Total resting volume at a price, if the level exists.
    pub fn volume_at(&self, side: Side, price: Price) -> Option<Quantity> {
        let levels = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        levels.get(&price).map(Limit::total_volume)
    }

    /// Number of resting orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Whether the given order id is resting on this book.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.contains_key(&order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Immutable depth snapshot of the top `depth` levels per side.
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_volume()))
            .collect();
        let asks = self
            .asks
            .iter()
            .take(depth)
            .map(|(price, level)| (*price, level.total_volume()))
            .collect();

        BookSnapshot::with_depth((*self.symbol).clone(), bids, asks)
    }
}

// ============================================================================
// Book Snapshot
// ============================================================================

/// Immutable snapshot of book depth, best levels first.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookSnapshot {
    pub symbol: String,
    /// Bid levels (price, total quantity), best first
    pub bids: Vec<(Price, Quantity)>,
    /// Ask levels (price, total quantity), best first
    pub asks: Vec<(Price, Quantity)>,
    /// Current spread (best ask - best bid)
    pub spread: Option<Price>,
    /// Midpoint of the best bid and ask
    pub mid_price: Option<Price>,
}

impl BookSnapshot {
    pub fn with_depth(
        symbol: String,
        bids: Vec<(Price, Quantity)>,
        asks: Vec<(Price, Quantity)>,
    ) -> Self {
        let spread = match (bids.first(), asks.first()) {
            (Some((bid, _)), Some((ask, _))) => ask.checked_sub(*bid).ok(),
            _ => None,
        };

        let mid_price = match (bids.first(), asks.first()) {
            (Some((bid, _)), Some((ask, _))) => Some(bid.midpoint(*ask)),
            _ => None,
        };

        Self {
            symbol,
            bids,
            asks,
            spread,
            mid_price,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|(price, _)| *price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|(price, _)| *price)
    }

    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids
            .iter()
            .fold(Quantity::ZERO, |acc, (_, qty)| acc + *qty)
    }

    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks
            .iter()
            .fold(Quantity::ZERO, |acc, (_, qty)| acc + *qty)
    }
}

// ============================================================================
// Tests
// ============================================================================
