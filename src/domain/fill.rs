// ============================================================================
// Fill Domain Model
// ============================================================================

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::numeric::{NumericResult, Price, Quantity};

use super::{OrderId, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One executed match between an incoming taker and a resting maker.
///
/// A single submission can produce any number of fills, emitted in execution
/// order: best price first, oldest order first within a price.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fill {
    /// Unique fill identifier
    pub id: Uuid,

    /// Trading symbol
    pub symbol: String,

    /// Execution price (the resting order's price)
    pub price: Price,

    /// Executed quantity
    pub quantity: Quantity,

    /// Side of the incoming (aggressing) order
    pub taker_side: Side,

    /// Order ID of the resting counterparty
    pub maker_order_id: OrderId,

    /// Order ID of the incoming order
    pub taker_order_id: OrderId,

    /// Execution timestamp
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    pub fn new(
        symbol: String,
        price: Price,
        quantity: Quantity,
        taker_side: Side,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            price,
            quantity,
            taker_side,
            maker_order_id,
            taker_order_id,
            timestamp: Utc::now(),
        }
    }

    /// Numeric side encoding: +1 when the taker bought, -1 when it sold.
    pub fn side_sign(&self) -> i8 {
        self.taker_side.sign()
    }

    /// Notional value of the fill (price x quantity).
    pub fn notional_value(&self) -> NumericResult<Price> {
        self.price.checked_mul(self.quantity)
    }
}
