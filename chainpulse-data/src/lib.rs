//! Chainpulse Data - Option Chain Change Tracking & Analytics
//!
//! Core library behind the chainpulse dashboards. It turns raw option chain
//! payloads into typed snapshots, retains a bounded per-contract history of
//! (volume, open interest) samples, and answers "how much did this contract
//! move over the last N minutes" without any market data credentials of its
//! own.
//!
//! The library includes:
//! - [`snapshot`]: normalisation of raw vendor chain payloads into
//!   [`ChainSnapshot`]s keyed by [`OptionContract`](chainpulse_instrument::OptionContract)
//! - [`tracker`]: the sliding-window [`ChainTracker`] holding up to
//!   [`DEFAULT_CAPACITY`] samples per contract and computing [`ChangeDelta`]s
//! - [`shared`]: [`SharedChainTracker`], a cheap-to-clone handle for sharing
//!   one tracker between an ingest writer and dashboard readers
//! - [`analytics`]: ATM selection, PCR, trend bias, support/resistance
//! - [`report`]: the per-tick [`ChainReport`](report::ChainReport) assembled
//!   for rendering
//! - [`positions`]: in-memory paper position bookkeeping
//!
//! ## Example
//!
//! ```rust
//! use chainpulse_data::{ChainTracker, Interval};
//! use chainpulse_instrument::{MarketIndex, OptionContract};
//! use chrono::{TimeZone, Utc};
//!
//! let mut tracker = ChainTracker::default();
//! let contract = OptionContract::call(20000i64);
//!
//! let open = Utc.with_ymd_and_hms(2025, 6, 2, 9, 15, 0).unwrap();
//! for (offset, volume, open_interest) in [(0, 100, 500), (30, 150, 480), (65, 200, 460)] {
//!     tracker.record_at(
//!         MarketIndex::Nifty50,
//!         contract,
//!         volume,
//!         open_interest,
//!         open + chrono::Duration::seconds(offset),
//!     );
//! }
//!
//! // One minute before the latest sample lands between the first two
//! // recordings, so the 09:15:30 sample is the baseline.
//! let delta = tracker
//!     .change_since_at(
//!         MarketIndex::Nifty50,
//!         contract,
//!         Interval::ONE_MINUTE,
//!         open + chrono::Duration::seconds(65),
//!     )
//!     .unwrap();
//!
//! assert_eq!((delta.volume, delta.open_interest), (50, -20));
//! ```

pub mod analytics;
pub mod error;
pub mod positions;
pub mod report;
pub mod shared;
pub mod snapshot;
pub mod time;
pub mod tracker;

// Re-export commonly used types for convenience
pub use error::DataError;
pub use shared::SharedChainTracker;
pub use snapshot::{ChainRow, ChainSnapshot, RawChainMessage};
pub use tracker::{ChainTracker, ChangeDelta, Interval, DEFAULT_CAPACITY};
