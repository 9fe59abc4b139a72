//! Sliding-window change tracking over per-contract chain readings.
//!
//! A poll loop [`record`](ChainTracker::record)s every `(volume, open
//! interest)` reading it observes; each `(index, contract)` pair keeps a
//! bounded [`SampleRing`] of recent readings. Dashboards then ask
//! [`change_since`](ChainTracker::change_since): how much did volume and OI
//! move over the last N minutes?
//!
//! A query resolves by scanning the ring oldest-first for the first sample
//! still inside the window and differencing it against the newest. When the
//! requested window is wider than retained history the oldest retained
//! sample stands in as the baseline - the longest change the history can
//! actually support - rather than refusing to answer.

mod buffer;

pub use buffer::{Sample, SampleRing};

use crate::{error::DataError, snapshot::ChainSnapshot, time};
use chainpulse_instrument::{MarketIndex, OptionContract};
use chrono::{DateTime, Duration, Utc};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::fmt;
use tracing::debug;

/// Default per-contract retention.
///
/// At the dashboard's ~1s poll cadence this covers roughly the most recent
/// ten minutes. Retention bounds sample count, not elapsed time, so a slower
/// cadence stretches the wall-clock window proportionally.
pub const DEFAULT_CAPACITY: usize = 600;

/// Lookback window for a change query, in whole minutes.
///
/// Constructed only through [`Interval::minutes`], so a zero-width window
/// (which would always difference the newest sample against itself) is
/// unrepresentable.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Interval(u32);

impl Interval {
    pub const ONE_MINUTE: Interval = Interval(1);
    pub const TWO_MINUTES: Interval = Interval(2);
    pub const FIVE_MINUTES: Interval = Interval(5);
    pub const TEN_MINUTES: Interval = Interval(10);

    /// Windows offered by the dashboard's interval selectors.
    pub const DASHBOARD: [Interval; 4] = [
        Interval::ONE_MINUTE,
        Interval::TWO_MINUTES,
        Interval::FIVE_MINUTES,
        Interval::TEN_MINUTES,
    ];

    /// Window covering `minutes` whole minutes. Zero is rejected fail-fast.
    pub fn minutes(minutes: u32) -> Result<Self, DataError> {
        if minutes == 0 {
            return Err(DataError::InvalidInterval);
        }
        Ok(Self(minutes))
    }

    pub fn as_minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

impl TryFrom<u32> for Interval {
    type Error = DataError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Interval::minutes(minutes)
    }
}

impl From<Interval> for u32 {
    fn from(interval: Interval) -> Self {
        interval.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// Signed change in cumulative volume and open interest across a window.
///
/// Both deltas are signed: open interest falls as positions unwind, and a
/// feed correction can step volume back. A flat reading is
/// `ChangeDelta { 0, 0 }`, which is distinct from "not enough history"
/// (`None` from the query).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct ChangeDelta {
    pub volume: i64,
    pub open_interest: i64,
}

/// Bounded per-contract reading history with change-over-window queries.
///
/// The tracker is an explicitly owned object - construct one, hand it to the
/// poll loop, share it behind
/// [`SharedChainTracker`](crate::shared::SharedChainTracker) when readers
/// run concurrently. Series are created lazily on first sight and are fully
/// independent: recording or querying one contract never perturbs another.
#[derive(Clone, Debug)]
pub struct ChainTracker {
    series: FnvHashMap<MarketIndex, FnvHashMap<OptionContract, SampleRing>>,
    capacity: usize,
}

impl Default for ChainTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChainTracker {
    /// Tracker retaining at most `capacity` samples per contract.
    ///
    /// # Panics
    /// If `capacity < 2` (a change query needs two samples).
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ChainTracker capacity must be at least 2");
        Self {
            series: FnvHashMap::default(),
            capacity,
        }
    }

    /// Per-contract retention limit.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a reading stamped with the reference clock's now.
    pub fn record(
        &mut self,
        index: MarketIndex,
        contract: OptionContract,
        volume: u64,
        open_interest: u64,
    ) {
        self.record_at(index, contract, volume, open_interest, time::now());
    }

    /// Append a reading observed at `at`.
    ///
    /// Index and contract entries are created lazily on first sight; once a
    /// contract's ring is full the oldest sample is evicted. Timestamps are
    /// expected to be non-decreasing per contract (the ingestion path
    /// observes one snapshot at a time); ties are permitted.
    pub fn record_at(
        &mut self,
        index: MarketIndex,
        contract: OptionContract,
        volume: u64,
        open_interest: u64,
        at: DateTime<Utc>,
    ) {
        let ring = match self.series.entry(index).or_default().entry(contract) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(%index, %contract, "tracking new contract series");
                entry.insert(SampleRing::new(self.capacity))
            }
        };

        ring.push(Sample {
            time: at,
            volume,
            open_interest,
        });
    }

    /// Record every row of a validated snapshot at the snapshot's own
    /// instant - the poll loop's single entry point.
    pub fn record_snapshot(&mut self, snapshot: &ChainSnapshot) {
        for row in &snapshot.rows {
            self.record_at(
                snapshot.index,
                row.contract,
                row.volume,
                row.open_interest,
                snapshot.taken_at,
            );
        }
    }

    /// Change in volume and open interest over the trailing `window`,
    /// evaluated against the reference clock's now.
    ///
    /// `None` means "not enough history yet": the index or contract has
    /// never been recorded, or fewer than two samples are retained. That is
    /// an expected warm-up state, not an error - and it is distinct from a
    /// legitimate flat reading of `Some(ChangeDelta { 0, 0 })`.
    pub fn change_since(
        &self,
        index: MarketIndex,
        contract: OptionContract,
        window: Interval,
    ) -> Option<ChangeDelta> {
        self.change_since_at(index, contract, window, time::now())
    }

    /// [`change_since`](Self::change_since) with a pinned `now`, so several
    /// queries in one render pass share a single clock reading.
    pub fn change_since_at(
        &self,
        index: MarketIndex,
        contract: OptionContract,
        window: Interval,
        now: DateTime<Utc>,
    ) -> Option<ChangeDelta> {
        let ring = self.series.get(&index)?.get(&contract)?;
        if ring.len() < 2 {
            return None;
        }

        let newest = ring.newest()?;
        let target = now - window.as_duration();

        // Oldest sample still inside the window; when the window exceeds
        // retained history, the oldest retained sample is the baseline.
        let baseline = ring
            .iter()
            .find(|sample| sample.time >= target)
            .or_else(|| ring.oldest())?;

        Some(ChangeDelta {
            volume: newest.volume as i64 - baseline.volume as i64,
            open_interest: newest.open_interest as i64 - baseline.open_interest as i64,
        })
    }

    /// Number of samples retained for a contract (0 when untracked).
    pub fn sample_count(&self, index: MarketIndex, contract: OptionContract) -> usize {
        self.series
            .get(&index)
            .and_then(|contracts| contracts.get(&contract))
            .map_or(0, SampleRing::len)
    }

    /// Number of contracts tracked under an index.
    pub fn contract_count(&self, index: MarketIndex) -> usize {
        self.series.get(&index).map_or(0, FnvHashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ChainRow;
    use chrono::TimeZone;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(2025, 6, 2, 9, 15, 0).unwrap();
        base + Duration::seconds(offset_secs)
    }

    fn ce_20000() -> OptionContract {
        OptionContract::call(20000i64)
    }

    #[test]
    fn test_interval_rejects_zero_minutes() {
        assert_eq!(Interval::minutes(0), Err(DataError::InvalidInterval));
        assert_eq!(Interval::minutes(3).map(|i| i.as_minutes()), Ok(3));
    }

    #[test]
    fn test_interval_serde_cannot_smuggle_zero() {
        assert!(serde_json::from_str::<Interval>("0").is_err());

        let five: Interval = serde_json::from_str("5").unwrap();
        assert_eq!(five, Interval::FIVE_MINUTES);
        assert_eq!(serde_json::to_string(&five).unwrap(), "5");
    }

    #[test]
    fn test_interval_dashboard_presets() {
        let minutes: Vec<u32> = Interval::DASHBOARD
            .iter()
            .map(Interval::as_minutes)
            .collect();
        assert_eq!(minutes, vec![1, 2, 5, 10]);
        assert_eq!(Interval::TEN_MINUTES.to_string(), "10m");
    }

    #[test]
    fn test_capacity_bounds_retention_and_shifts_the_baseline() {
        let mut tracker = ChainTracker::new(5);

        for i in 0..8u64 {
            tracker.record_at(
                MarketIndex::Nifty50,
                ce_20000(),
                i * 10,
                1_000 - i * 10,
                t(i as i64),
            );
        }

        assert_eq!(tracker.sample_count(MarketIndex::Nifty50, ce_20000()), 5);

        // Samples 0..=2 were evicted, so a window covering everything
        // differences against sample 3 (volume 30, oi 970).
        let delta = tracker
            .change_since_at(
                MarketIndex::Nifty50,
                ce_20000(),
                Interval::TEN_MINUTES,
                t(7),
            )
            .unwrap();
        assert_eq!(
            delta,
            ChangeDelta {
                volume: 40,
                open_interest: -40,
            }
        );
    }

    #[test]
    fn test_change_since_needs_two_samples() {
        let mut tracker = ChainTracker::default();

        // Unknown index.
        assert_eq!(
            tracker.change_since_at(
                MarketIndex::Nifty50,
                ce_20000(),
                Interval::ONE_MINUTE,
                t(0)
            ),
            None
        );

        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(0));

        // Known index, unknown contract.
        assert_eq!(
            tracker.change_since_at(
                MarketIndex::Nifty50,
                OptionContract::put(20000i64),
                Interval::ONE_MINUTE,
                t(0)
            ),
            None
        );

        // Known contract, single sample.
        assert_eq!(
            tracker.change_since_at(
                MarketIndex::Nifty50,
                ce_20000(),
                Interval::ONE_MINUTE,
                t(0)
            ),
            None
        );
    }

    #[test]
    fn test_flat_reading_is_zero_delta_not_none() {
        let mut tracker = ChainTracker::default();
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(30));

        let delta = tracker.change_since_at(
            MarketIndex::Nifty50,
            ce_20000(),
            Interval::ONE_MINUTE,
            t(30),
        );
        assert_eq!(delta, Some(ChangeDelta::default()));
    }

    #[test]
    fn test_window_wider_than_history_falls_back_to_oldest() {
        let mut tracker = ChainTracker::default();
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 150, 480, t(30));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 200, 460, t(65));

        // Ten minutes of lookback, 65s of history: baseline is the oldest
        // retained sample.
        let delta = tracker
            .change_since_at(
                MarketIndex::Nifty50,
                ce_20000(),
                Interval::TEN_MINUTES,
                t(65),
            )
            .unwrap();
        assert_eq!(
            delta,
            ChangeDelta {
                volume: 100,
                open_interest: -40,
            }
        );
    }

    #[test]
    fn test_one_minute_window_selects_first_sample_inside_it() {
        // t=0s (100, 500), t=30s (150, 480), t=65s (200, 460); a 1m query
        // pinned at t=65s targets t=5s, so the t=30s sample is the baseline.
        let mut tracker = ChainTracker::default();
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 150, 480, t(30));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 200, 460, t(65));

        let delta = tracker
            .change_since_at(
                MarketIndex::Nifty50,
                ce_20000(),
                Interval::ONE_MINUTE,
                t(65),
            )
            .unwrap();
        assert_eq!(
            delta,
            ChangeDelta {
                volume: 50,
                open_interest: -20,
            }
        );
    }

    #[test]
    fn test_equal_timestamps_baseline_is_the_first_of_the_tie() {
        let mut tracker = ChainTracker::default();
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 150, 520, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 300, 600, t(30));

        // Both t=0 samples satisfy the window bound; the oldest-first scan
        // settles on the one recorded first.
        let delta = tracker
            .change_since_at(
                MarketIndex::Nifty50,
                ce_20000(),
                Interval::ONE_MINUTE,
                t(30),
            )
            .unwrap();
        assert_eq!(
            delta,
            ChangeDelta {
                volume: 200,
                open_interest: 100,
            }
        );
    }

    #[test]
    fn test_window_shorter_than_sampling_gap_reads_flat() {
        let mut tracker = ChainTracker::default();
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 150, 480, t(600));

        // Only the newest sample is inside the last minute, so it is its own
        // baseline.
        let delta = tracker.change_since_at(
            MarketIndex::Nifty50,
            ce_20000(),
            Interval::ONE_MINUTE,
            t(600),
        );
        assert_eq!(delta, Some(ChangeDelta::default()));
    }

    #[test]
    fn test_windows_answer_independently_and_reads_never_mutate() {
        let mut tracker = ChainTracker::default();
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 100, 500, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 150, 480, t(30));
        tracker.record_at(MarketIndex::Nifty50, ce_20000(), 200, 460, t(65));

        let one = tracker.change_since_at(
            MarketIndex::Nifty50,
            ce_20000(),
            Interval::ONE_MINUTE,
            t(65),
        );
        let ten = tracker.change_since_at(
            MarketIndex::Nifty50,
            ce_20000(),
            Interval::TEN_MINUTES,
            t(65),
        );

        assert_eq!(
            one,
            Some(ChangeDelta {
                volume: 50,
                open_interest: -20,
            })
        );
        assert_eq!(
            ten,
            Some(ChangeDelta {
                volume: 100,
                open_interest: -40,
            })
        );

        // Same query again: same answer, same retained state.
        assert_eq!(
            tracker.change_since_at(
                MarketIndex::Nifty50,
                ce_20000(),
                Interval::ONE_MINUTE,
                t(65)
            ),
            one
        );
        assert_eq!(tracker.sample_count(MarketIndex::Nifty50, ce_20000()), 3);
    }

    #[test]
    fn test_series_isolation_across_contracts_and_indices() {
        let mut tracker = ChainTracker::default();
        let ce = ce_20000();
        let pe = OptionContract::put(20000i64);

        tracker.record_at(MarketIndex::Nifty50, ce, 100, 500, t(0));
        tracker.record_at(MarketIndex::Nifty50, ce, 200, 510, t(30));
        tracker.record_at(MarketIndex::Nifty50, pe, 40, 900, t(0));
        tracker.record_at(MarketIndex::Nifty50, pe, 45, 905, t(30));
        tracker.record_at(MarketIndex::BankNifty, ce, 7, 70, t(0));
        tracker.record_at(MarketIndex::BankNifty, ce, 9, 77, t(30));

        let window = Interval::FIVE_MINUTES;
        assert_eq!(
            tracker.change_since_at(MarketIndex::Nifty50, ce, window, t(30)),
            Some(ChangeDelta {
                volume: 100,
                open_interest: 10,
            })
        );
        assert_eq!(
            tracker.change_since_at(MarketIndex::Nifty50, pe, window, t(30)),
            Some(ChangeDelta {
                volume: 5,
                open_interest: 5,
            })
        );
        assert_eq!(
            tracker.change_since_at(MarketIndex::BankNifty, ce, window, t(30)),
            Some(ChangeDelta {
                volume: 2,
                open_interest: 7,
            })
        );

        // Same contract key under another index is a distinct series.
        assert_eq!(tracker.sample_count(MarketIndex::BankNifty, ce), 2);
        assert_eq!(tracker.sample_count(MarketIndex::BankNifty, pe), 0);
        assert_eq!(tracker.contract_count(MarketIndex::Nifty50), 2);
    }

    #[test]
    fn test_record_snapshot_records_every_row_at_the_snapshot_instant() {
        let mut tracker = ChainTracker::default();
        let ce = ce_20000();
        let pe = OptionContract::put(20000i64);

        let first = ChainSnapshot::new(
            MarketIndex::Nifty50,
            None,
            vec![
                ChainRow::new(ce, 105.5, 1_000, 50_000),
                ChainRow::new(pe, 98.0, 800, 60_000),
            ],
            t(0),
        );
        let second = ChainSnapshot::new(
            MarketIndex::Nifty50,
            None,
            vec![
                ChainRow::new(ce, 107.0, 1_500, 50_500),
                ChainRow::new(pe, 95.0, 1_100, 59_000),
            ],
            t(30),
        );

        tracker.record_snapshot(&first);
        tracker.record_snapshot(&second);

        assert_eq!(
            tracker.change_since_at(MarketIndex::Nifty50, ce, Interval::ONE_MINUTE, t(30)),
            Some(ChangeDelta {
                volume: 500,
                open_interest: 500,
            })
        );
        assert_eq!(
            tracker.change_since_at(MarketIndex::Nifty50, pe, Interval::ONE_MINUTE, t(30)),
            Some(ChangeDelta {
                volume: 300,
                open_interest: -1_000,
            })
        );
    }
}
