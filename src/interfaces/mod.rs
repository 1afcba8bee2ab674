// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod fill_sink;

pub use fill_sink::{CollectingFillSink, FillSink, LoggingFillSink, NoOpFillSink};
