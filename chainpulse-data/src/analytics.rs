//! Derived chain metrics: ATM strike detection, put-call ratio bias, side
//! totals and the aggregate positioning insights panel.
//!
//! Everything here is a pure function over validated [`ChainRow`]s - no
//! clocks, no state - so the report layer can recompute per render pass.

use crate::snapshot::ChainRow;
use chainpulse_instrument::Strike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// PCR above which positioning reads bearish.
pub const PCR_BEARISH_ABOVE: f64 = 1.0;

/// PCR below which positioning reads bullish.
pub const PCR_BULLISH_BELOW: f64 = 0.8;

/// Directional bias classification.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub enum TrendBias {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendBias {
    pub fn label(&self) -> &'static str {
        match self {
            TrendBias::Bullish => "Bullish",
            TrendBias::Bearish => "Bearish",
            TrendBias::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for TrendBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which side of the chain is printing more volume.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub enum VolumeTrend {
    CallsLead,
    PutsLead,
}

impl VolumeTrend {
    /// Call writing outpacing puts reads bullish on this dashboard.
    pub fn bias(&self) -> TrendBias {
        match self {
            VolumeTrend::CallsLead => TrendBias::Bullish,
            VolumeTrend::PutsLead => TrendBias::Bearish,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VolumeTrend::CallsLead => "CE volume leads",
            VolumeTrend::PutsLead => "PE volume leads",
        }
    }
}

/// Premium drift across both sides of the chain.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub enum LtpTrend {
    Rising,
    Falling,
    Sideways,
}

impl LtpTrend {
    pub fn arrow(&self) -> &'static str {
        match self {
            LtpTrend::Rising => "▲",
            LtpTrend::Falling => "▼",
            LtpTrend::Sideways => "→",
        }
    }
}

/// Strike closest to spot. Ties resolve to the earlier strike in `strikes`
/// (the lower one when the slice is sorted ascending).
pub fn atm_strike(strikes: &[Strike], spot: Decimal) -> Option<Strike> {
    strikes
        .iter()
        .copied()
        .min_by_key(|strike| (strike.0 - spot).abs())
}

/// The ATM strike plus `depth` strikes on either side, clamped at chain
/// edges. Expects `strikes` sorted ascending (as
/// [`ChainSnapshot::strikes`](crate::snapshot::ChainSnapshot::strikes)
/// yields them); the chain view uses depth 3, the scalping view depth 2.
pub fn strikes_around_atm(strikes: &[Strike], atm: Strike, depth: usize) -> &[Strike] {
    let Some(position) = strikes.iter().position(|strike| *strike == atm) else {
        return &[];
    };
    let low = position.saturating_sub(depth);
    let high = (position + depth + 1).min(strikes.len());
    &strikes[low..high]
}

/// Put-call ratio over total open interest, rounded to two decimals.
/// `None` when call OI is zero (a ratio against nothing reads as noise).
pub fn put_call_ratio(rows: &[ChainRow]) -> Option<f64> {
    let call_oi = side_oi(rows, true);
    let put_oi = side_oi(rows, false);
    if call_oi == 0 {
        return None;
    }
    Some(round2(put_oi as f64 / call_oi as f64))
}

/// PCR classification: heavy put writing above 1.0 reads bearish, heavy call
/// writing below 0.8 reads bullish.
pub fn trend_bias(pcr: f64) -> TrendBias {
    if pcr > PCR_BEARISH_ABOVE {
        TrendBias::Bearish
    } else if pcr < PCR_BULLISH_BELOW {
        TrendBias::Bullish
    } else {
        TrendBias::Neutral
    }
}

/// Side printing more cumulative volume; ties read as puts leading.
pub fn volume_trend(rows: &[ChainRow]) -> VolumeTrend {
    let call_volume: u64 = side_rows(rows, true).map(|row| row.volume).sum();
    let put_volume: u64 = side_rows(rows, false).map(|row| row.volume).sum();
    if call_volume > put_volume {
        VolumeTrend::CallsLead
    } else {
        VolumeTrend::PutsLead
    }
}

/// Premium drift: both sides' mean day-change negative reads falling, both
/// positive rising, anything mixed (or an empty side) sideways.
pub fn ltp_trend(rows: &[ChainRow]) -> LtpTrend {
    let call_drift = side_mean_ltp_change(rows, true);
    let put_drift = side_mean_ltp_change(rows, false);

    if call_drift < 0.0 && put_drift < 0.0 {
        LtpTrend::Falling
    } else if call_drift > 0.0 && put_drift > 0.0 {
        LtpTrend::Rising
    } else {
        LtpTrend::Sideways
    }
}

/// Strike carrying the heaviest put OI - where writers defend the downside.
pub fn strongest_support(rows: &[ChainRow]) -> Option<Strike> {
    max_oi_strike(rows, false)
}

/// Strike carrying the heaviest call OI - the ceiling writers defend.
pub fn strongest_resistance(rows: &[ChainRow]) -> Option<Strike> {
    max_oi_strike(rows, true)
}

/// The dashboard's analysis panel, computed in one pass over the rows the
/// dashboard is showing.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ChainInsights {
    pub spot: Option<Decimal>,
    pub total_call_oi: u64,
    pub total_put_oi: u64,
    /// `None` until the call side carries any OI.
    pub put_call_ratio: Option<f64>,
    pub bias: Option<TrendBias>,
    pub volume_trend: VolumeTrend,
    pub ltp_trend: LtpTrend,
    pub strongest_support: Option<Strike>,
    pub strongest_resistance: Option<Strike>,
}

impl ChainInsights {
    pub fn compute(rows: &[ChainRow], spot: Option<Decimal>) -> Self {
        let put_call_ratio = put_call_ratio(rows);
        Self {
            spot,
            total_call_oi: side_oi(rows, true),
            total_put_oi: side_oi(rows, false),
            put_call_ratio,
            bias: put_call_ratio.map(trend_bias),
            volume_trend: volume_trend(rows),
            ltp_trend: ltp_trend(rows),
            strongest_support: strongest_support(rows),
            strongest_resistance: strongest_resistance(rows),
        }
    }
}

/// Aggregate sums for one side (or slice) of the chain - the totals row
/// under the dashboard tables.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SideTotals {
    pub ltp: f64,
    pub ltp_change: f64,
    pub ask: f64,
    pub bid: f64,
    pub volume: u64,
    pub open_interest: u64,
    pub oi_change: f64,
    pub oi_change_pct: f64,
    pub prev_open_interest: u64,
}

impl SideTotals {
    fn accumulate(&mut self, row: &ChainRow) {
        self.ltp += row.ltp;
        self.ltp_change += row.ltp_change;
        self.ask += row.ask;
        self.bid += row.bid;
        self.volume += row.volume;
        self.open_interest += row.open_interest;
        self.oi_change += row.oi_change;
        self.oi_change_pct += row.oi_change_pct;
        self.prev_open_interest += row.prev_open_interest;
    }
}

/// Per-side and in-the-money aggregate totals.
///
/// Calls are ITM below spot, puts above it; without a spot the ITM splits
/// stay zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ChainTotals {
    pub calls: SideTotals,
    pub puts: SideTotals,
    pub calls_itm: SideTotals,
    pub puts_itm: SideTotals,
}

impl ChainTotals {
    pub fn compute(rows: &[ChainRow], spot: Option<Decimal>) -> Self {
        let mut totals = Self::default();

        for row in rows {
            let strike = row.contract.strike.0;
            if row.contract.kind.is_call() {
                totals.calls.accumulate(row);
                if spot.is_some_and(|spot| strike < spot) {
                    totals.calls_itm.accumulate(row);
                }
            } else {
                totals.puts.accumulate(row);
                if spot.is_some_and(|spot| strike > spot) {
                    totals.puts_itm.accumulate(row);
                }
            }
        }

        totals
    }

    /// Both sides combined.
    pub fn combined(&self) -> SideTotals {
        SideTotals {
            ltp: self.calls.ltp + self.puts.ltp,
            ltp_change: self.calls.ltp_change + self.puts.ltp_change,
            ask: self.calls.ask + self.puts.ask,
            bid: self.calls.bid + self.puts.bid,
            volume: self.calls.volume + self.puts.volume,
            open_interest: self.calls.open_interest + self.puts.open_interest,
            oi_change: self.calls.oi_change + self.puts.oi_change,
            oi_change_pct: self.calls.oi_change_pct + self.puts.oi_change_pct,
            prev_open_interest: self.calls.prev_open_interest + self.puts.prev_open_interest,
        }
    }
}

/// Large-quantity display unit: one crore = 10^7 contracts.
///
/// Wraps the raw count; `Display` scales, eg/ `15_000_000` renders
/// `"1.50 Cr"`. Zero and non-finite render `"0.00"` (the dashboard's
/// placeholder).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Crore(pub f64);

impl From<u64> for Crore {
    fn from(count: u64) -> Self {
        Self(count as f64)
    }
}

impl fmt::Display for Crore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.0.is_finite() || self.0 == 0.0 {
            return write!(f, "0.00");
        }
        write!(f, "{:.2} Cr", self.0 / 10_000_000.0)
    }
}

fn side_rows(rows: &[ChainRow], calls: bool) -> impl Iterator<Item = &ChainRow> {
    rows.iter()
        .filter(move |row| row.contract.kind.is_call() == calls)
}

fn side_oi(rows: &[ChainRow], calls: bool) -> u64 {
    side_rows(rows, calls).map(|row| row.open_interest).sum()
}

fn side_mean_ltp_change(rows: &[ChainRow], calls: bool) -> f64 {
    let (sum, count) = side_rows(rows, calls)
        .fold((0.0, 0usize), |(sum, count), row| {
            (sum + row.ltp_change, count + 1)
        });
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

fn max_oi_strike(rows: &[ChainRow], calls: bool) -> Option<Strike> {
    side_rows(rows, calls)
        .fold(None::<&ChainRow>, |best, row| match best {
            Some(best) if best.open_interest >= row.open_interest => Some(best),
            _ => Some(row),
        })
        .map(|row| row.contract.strike)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
