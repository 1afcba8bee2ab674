// ============================================================================
// Numeric Module
// Fixed-point arithmetic for exact price and quantity bookkeeping
// ============================================================================
//
// Prices index the order book's sorted price-level maps, so the numeric type
// must give exact equality on the indexing key. FixedDecimal stores the value
// as a scaled i64, which makes Price usable as an Ord map key and removes the
// floating-point equality hazard outright.

mod errors;
mod fixed_decimal;

pub use errors::{NumericError, NumericResult};
pub use fixed_decimal::{FixedDecimal, Price, Quantity};
