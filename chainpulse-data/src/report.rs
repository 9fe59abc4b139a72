//! Report assembly: one snapshot + the tracker -> the typed rows, leaders
//! and insights a dashboard renders.
//!
//! Build order matters: the snapshot is recorded first, then every change
//! query is pinned to the snapshot's instant, so all deltas in one render
//! pass share a single `now`.

use crate::{
    analytics::{self, ChainInsights, ChainTotals},
    snapshot::{ChainRow, ChainSnapshot},
    tracker::{ChainTracker, Interval},
};
use chainpulse_instrument::{MarketIndex, OptionContract, Strike};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a report is assembled: delta windows and strike depth.
///
/// Volume and OI windows are selected independently - watching 1m volume
/// against 5m OI build-up is a common scalping setup.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct ReportOptions {
    pub volume_interval: Interval,
    pub oi_interval: Interval,
    /// Strikes either side of ATM to show (scalping view 2, chain view 3).
    pub strike_depth: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            volume_interval: Interval::ONE_MINUTE,
            oi_interval: Interval::ONE_MINUTE,
            strike_depth: 2,
        }
    }
}

/// One rendered contract row.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ReportRow {
    pub contract: OptionContract,
    pub ltp: f64,
    pub volume: u64,
    /// `None` renders "N/A": not enough history yet, never faked as zero.
    pub volume_delta: Option<i64>,
    pub open_interest: u64,
    /// `None` renders "N/A", as with `volume_delta`.
    pub oi_delta: Option<i64>,
    pub oi_change_pct: f64,
    /// Row sits on the ATM strike (highlighted by the renderer).
    pub atm: bool,
}

/// Contract holding the highest positive value per headline metric - the
/// renderer's highlighting hints. A metric with no positive value (or no
/// history yet) has no leader.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct Leaders {
    pub volume: Option<OptionContract>,
    pub volume_delta: Option<OptionContract>,
    pub open_interest: Option<OptionContract>,
    pub oi_delta: Option<OptionContract>,
}

impl Leaders {
    fn scan(rows: &[ReportRow]) -> Self {
        let mut leaders = Self::default();
        let mut top_volume = 0u64;
        let mut top_volume_delta = 0i64;
        let mut top_oi = 0u64;
        let mut top_oi_delta = 0i64;

        for row in rows {
            if row.volume > top_volume {
                top_volume = row.volume;
                leaders.volume = Some(row.contract);
            }
            if let Some(delta) = row.volume_delta {
                if delta > top_volume_delta {
                    top_volume_delta = delta;
                    leaders.volume_delta = Some(row.contract);
                }
            }
            if row.open_interest > top_oi {
                top_oi = row.open_interest;
                leaders.open_interest = Some(row.contract);
            }
            if let Some(delta) = row.oi_delta {
                if delta > top_oi_delta {
                    top_oi_delta = delta;
                    leaders.oi_delta = Some(row.contract);
                }
            }
        }

        leaders
    }
}

/// Everything one dashboard render pass needs.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ChainReport {
    pub index: MarketIndex,
    /// The pinned instant every delta in this report was evaluated at.
    pub generated_at: DateTime<Utc>,
    pub spot: Option<Decimal>,
    pub atm: Option<Strike>,
    /// Rows ordered by strike, calls before puts.
    pub rows: Vec<ReportRow>,
    pub leaders: Leaders,
    pub insights: ChainInsights,
    pub totals: ChainTotals,
    pub volume_interval: Interval,
    pub oi_interval: Interval,
}

impl ChainReport {
    /// Record `snapshot` into `tracker`, then assemble the ATM +/- depth
    /// window with every change query pinned to `snapshot.taken_at`.
    pub fn build(
        snapshot: &ChainSnapshot,
        tracker: &mut ChainTracker,
        options: &ReportOptions,
    ) -> Self {
        tracker.record_snapshot(snapshot);

        let spot = snapshot.spot_price();
        let strikes = snapshot.strikes();
        let atm = spot.and_then(|spot| analytics::atm_strike(&strikes, spot));

        let shown: Vec<Strike> = match atm {
            Some(atm) => {
                analytics::strikes_around_atm(&strikes, atm, options.strike_depth).to_vec()
            }
            None => Vec::new(),
        };

        let mut visible: Vec<&ChainRow> = snapshot
            .rows
            .iter()
            .filter(|row| shown.contains(&row.contract.strike))
            .collect();
        visible.sort_by_key(|row| row.contract);

        let now = snapshot.taken_at;
        let mut rows = Vec::with_capacity(visible.len());
        let mut window_rows = Vec::with_capacity(visible.len());

        for row in visible {
            let volume_delta = tracker
                .change_since_at(snapshot.index, row.contract, options.volume_interval, now)
                .map(|delta| delta.volume);
            let oi_delta = tracker
                .change_since_at(snapshot.index, row.contract, options.oi_interval, now)
                .map(|delta| delta.open_interest);

            rows.push(ReportRow {
                contract: row.contract,
                ltp: row.ltp,
                volume: row.volume,
                volume_delta,
                open_interest: row.open_interest,
                oi_delta,
                oi_change_pct: row.oi_change_pct,
                atm: atm == Some(row.contract.strike),
            });
            window_rows.push(row.clone());
        }

        // The dashboard analyses what it shows: insights and totals cover
        // the windowed rows, not the whole chain.
        let leaders = Leaders::scan(&rows);
        let insights = ChainInsights::compute(&window_rows, spot);
        let totals = ChainTotals::compute(&window_rows, spot);

        Self {
            index: snapshot.index,
            generated_at: now,
            spot,
            atm,
            rows,
            leaders,
            insights,
            totals,
            volume_interval: options.volume_interval,
            oi_interval: options.oi_interval,
        }
    }
}
