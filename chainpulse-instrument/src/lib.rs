//! Instrument identity types for the chainpulse ecosystem.
//!
//! An option chain is keyed by the market index it belongs to and, within the
//! chain, by the `(strike, kind)` pair of each contract. These types pin that
//! identity down once so every downstream layer (snapshot ingestion, change
//! tracking, analytics, reporting) agrees on what a contract *is*:
//!
//! - [`MarketIndex`] - the small fixed set of indices with listed chains.
//! - [`OptionKind`] - call or put, quoted on-exchange as `CE` / `PE`.
//! - [`Strike`] - exact strike identity backed by [`rust_decimal::Decimal`]
//!   (float keys drift and corrupt map identity).
//! - [`OptionContract`] - the `(strike, kind)` series key.

pub mod error;
pub mod index;
pub mod option;

pub use error::InstrumentError;
pub use index::MarketIndex;
pub use option::{OptionContract, OptionKind, Strike};
