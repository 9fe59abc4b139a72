//! Typed option-chain snapshot models.
//!
//! The ingestion input is an explicit typed record validated once at the
//! boundary: the raw layer ([`RawChainMessage`]) tolerates the brokerage
//! payload's quirks (field spellings vary across API revisions, numbers
//! arrive quoted or bare, the underlying index is embedded as a pseudo-row),
//! and [`ChainRow::try_from_raw`] fails fast on anything that would corrupt
//! retained history - negative quantities, non-finite numbers, unknown
//! option kinds. The tracker and analytics layers only ever see validated
//! rows.

use crate::error::DataError;
use chainpulse_instrument::{MarketIndex, OptionContract, OptionKind, Strike};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use itertools::Itertools;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Raw option-chain message as returned by the brokerage REST endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawChainMessage {
    #[serde(default)]
    pub data: RawChainData,
}

/// Payload section of a raw chain message.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawChainData {
    #[serde(alias = "optionsChain", default)]
    pub options_chain: Vec<RawChainRow>,

    #[serde(
        alias = "underlyingValue",
        alias = "underlying_value",
        default,
        deserialize_with = "de_opt_flexible_f64"
    )]
    pub underlying: Option<f64>,
}

/// One raw chain row; everything is optional at this layer.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawChainRow {
    #[serde(
        alias = "strikePrice",
        default,
        deserialize_with = "de_opt_flexible_f64"
    )]
    pub strike_price: Option<f64>,

    #[serde(alias = "optionType", default)]
    pub option_type: Option<String>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub ltp: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub ltpch: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub ask: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub bid: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub volume: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub oi: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub oich: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    pub oichp: Option<f64>,

    #[serde(
        alias = "prevOi",
        default,
        deserialize_with = "de_opt_flexible_f64"
    )]
    pub prev_oi: Option<f64>,
}

impl RawChainRow {
    /// The brokerage embeds the underlying index as a pseudo-row with no
    /// option kind and a sentinel strike.
    fn is_underlying_quote(&self) -> bool {
        let no_kind = self
            .option_type
            .as_deref()
            .is_none_or(|kind| kind.trim().is_empty());
        let no_strike = self.strike_price.is_none_or(|strike| strike <= 0.0);
        no_kind && no_strike
    }
}

/// One validated chain row - the typed record handed to the tracker and
/// analytics layers. Quantities are whole contract counts.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ChainRow {
    pub contract: OptionContract,
    /// Last traded premium.
    pub ltp: f64,
    /// Day change in premium.
    pub ltp_change: f64,
    pub ask: f64,
    pub bid: f64,
    /// Cumulative session volume, contracts.
    pub volume: u64,
    /// Open interest, contracts.
    pub open_interest: u64,
    /// Day change in OI as reported by the feed.
    pub oi_change: f64,
    /// Day change in OI, percent.
    pub oi_change_pct: f64,
    /// Previous session's closing OI.
    pub prev_open_interest: u64,
}

impl ChainRow {
    /// Row with the fields the tracker cares about; day-change metrics zeroed.
    pub fn new(contract: OptionContract, ltp: f64, volume: u64, open_interest: u64) -> Self {
        Self {
            contract,
            ltp,
            ltp_change: 0.0,
            ask: 0.0,
            bid: 0.0,
            volume,
            open_interest,
            oi_change: 0.0,
            oi_change_pct: 0.0,
            prev_open_interest: 0,
        }
    }

    /// Validate a raw feed row.
    ///
    /// Fails fast: negative or non-finite quantities and unknown option
    /// kinds surface here instead of corrupting retained history (silent
    /// coercion is how feed anomalies stay hidden). Missing quantities
    /// default to zero - a freshly listed contract has no trades yet -
    /// and missing price metrics default to zero as display values.
    pub fn try_from_raw(raw: RawChainRow) -> Result<Self, DataError> {
        let strike = raw.strike_price.ok_or(DataError::MissingStrike)?;
        let strike = Decimal::from_f64(strike)
            .ok_or(DataError::NonFinite {
                field: "strike_price",
            })?
            .normalize();

        let kind = raw
            .option_type
            .unwrap_or_default()
            .parse::<OptionKind>()
            .map_err(DataError::from)?;

        Ok(Self {
            contract: OptionContract::new(Strike::new(strike), kind),
            ltp: metric(raw.ltp),
            ltp_change: metric(raw.ltpch),
            ask: metric(raw.ask),
            bid: metric(raw.bid),
            volume: quantity("volume", raw.volume)?,
            open_interest: quantity("oi", raw.oi)?,
            oi_change: metric(raw.oich),
            oi_change_pct: metric(raw.oichp),
            prev_open_interest: quantity("prev_oi", raw.prev_oi)?,
        })
    }
}

/// A validated point-in-time view of one index's option chain.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Constructor)]
pub struct ChainSnapshot {
    pub index: MarketIndex,
    /// Spot as reported by the feed, when present.
    pub underlying: Option<Decimal>,
    pub rows: Vec<ChainRow>,
    /// Instant the snapshot was taken; every row records at this time.
    pub taken_at: DateTime<Utc>,
}

impl ChainSnapshot {
    /// Validate a raw chain message observed at `at`.
    ///
    /// The first invalid row aborts the whole snapshot. The embedded
    /// underlying pseudo-row is consumed as a spot quote rather than
    /// rejected.
    pub fn from_raw(
        index: MarketIndex,
        message: RawChainMessage,
        at: DateTime<Utc>,
    ) -> Result<Self, DataError> {
        let mut underlying = message.data.underlying.and_then(Decimal::from_f64);
        let mut rows = Vec::with_capacity(message.data.options_chain.len());

        for raw in message.data.options_chain {
            if raw.is_underlying_quote() {
                match raw.ltp.and_then(Decimal::from_f64) {
                    Some(spot) if underlying.is_none() => underlying = Some(spot),
                    None => warn!(%index, "discarding underlying quote row with no usable price"),
                    _ => {}
                }
                continue;
            }
            rows.push(ChainRow::try_from_raw(raw)?);
        }

        Ok(Self {
            index,
            underlying,
            rows,
            taken_at: at,
        })
    }

    /// Spot price: the reported underlying, else the middle of the sorted
    /// distinct strikes (a serviceable proxy when the feed omits the spot).
    pub fn spot_price(&self) -> Option<Decimal> {
        self.underlying.or_else(|| {
            let strikes = self.strikes();
            strikes.get(strikes.len() / 2).map(|strike| strike.0)
        })
    }

    /// Sorted, deduplicated strikes present in the chain.
    pub fn strikes(&self) -> Vec<Strike> {
        self.rows
            .iter()
            .map(|row| row.contract.strike)
            .sorted()
            .dedup()
            .collect()
    }

    /// Row for a specific contract, if present.
    pub fn row(&self, contract: OptionContract) -> Option<&ChainRow> {
        self.rows.iter().find(|row| row.contract == contract)
    }
}

/// Non-negative whole-contract quantity; missing means "no activity yet".
fn quantity(field: &'static str, value: Option<f64>) -> Result<u64, DataError> {
    let Some(value) = value else {
        return Ok(0);
    };
    if !value.is_finite() {
        return Err(DataError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(DataError::NegativeQuantity { field, value });
    }
    Ok(value.round() as u64)
}

/// Display metric: absent or non-finite collapses to zero.
fn metric(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn de_opt_flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Num(f64),
        Text(String),
    }

    let value: Option<Flexible> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(Flexible::Num(num)) => Ok(Some(num)),
        Some(Flexible::Text(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Flexible::Text(raw)) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
