//! Paper position bookkeeping for the scalping view.
//!
//! Purely in-memory: opening a position records an entry price, exiting
//! drops it, and [`PositionBook::mark_to_market`] values the book against
//! the latest snapshot. No orders are placed anywhere.

use crate::{snapshot::ChainSnapshot, time};
use chainpulse_instrument::{MarketIndex, OptionContract};
use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use tracing::debug;

/// Contracts per lot assumed when the caller does not specify one.
pub const DEFAULT_LOT_SIZE: u32 = 75;

/// Identifier of one paper position: `"{strike}_{kind}_{epoch_millis}"`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct PositionId(SmolStr);

impl PositionId {
    fn generate(contract: OptionContract, at: DateTime<Utc>) -> Self {
        Self(SmolStr::from(format!(
            "{}_{}",
            contract,
            at.timestamp_millis()
        )))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One open paper position.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub id: PositionId,
    pub contract: OptionContract,
    pub entry_ltp: f64,
    pub entry_time: DateTime<Utc>,
    pub lot_size: u32,
}

impl Position {
    /// Mark-to-market PnL for one lot at `current_ltp`.
    pub fn pnl(&self, current_ltp: f64) -> f64 {
        (current_ltp - self.entry_ltp) * f64::from(self.lot_size)
    }
}

/// A position valued against the latest snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkedPosition {
    pub position: Position,
    pub current_ltp: f64,
    pub pnl: f64,
}

/// Mark-to-market view of one index's open positions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BookSummary {
    pub positions: Vec<MarkedPosition>,
    pub total_pnl: f64,
}

/// Paper positions, kept per index so each dashboard works its own book.
#[derive(Clone, Debug, Default)]
pub struct PositionBook {
    positions: FnvHashMap<MarketIndex, Vec<Position>>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a position entered at the reference clock's now.
    pub fn open(
        &mut self,
        index: MarketIndex,
        contract: OptionContract,
        entry_ltp: f64,
        lot_size: u32,
    ) -> PositionId {
        self.open_at(index, contract, entry_ltp, lot_size, time::now())
    }

    /// Open a position entered at `at`.
    pub fn open_at(
        &mut self,
        index: MarketIndex,
        contract: OptionContract,
        entry_ltp: f64,
        lot_size: u32,
        at: DateTime<Utc>,
    ) -> PositionId {
        let id = PositionId::generate(contract, at);
        debug!(%index, %contract, %id, entry_ltp, "opened paper position");

        self.positions.entry(index).or_default().push(Position {
            id: id.clone(),
            contract,
            entry_ltp,
            entry_time: at,
            lot_size,
        });
        id
    }

    /// Close one position, returning it if it was open.
    pub fn exit(&mut self, index: MarketIndex, id: &PositionId) -> Option<Position> {
        let positions = self.positions.get_mut(&index)?;
        let found = positions.iter().position(|position| &position.id == id)?;
        Some(positions.remove(found))
    }

    /// Close every position under `index`, returning how many were open.
    pub fn clear(&mut self, index: MarketIndex) -> usize {
        self.positions.remove(&index).map_or(0, |closed| closed.len())
    }

    /// Open positions under `index`, oldest first.
    pub fn active(&self, index: MarketIndex) -> &[Position] {
        self.positions.get(&index).map_or(&[], Vec::as_slice)
    }

    /// Value the book against snapshot LTPs.
    ///
    /// A contract that has left the visible chain marks at its entry price
    /// (flat PnL) rather than inventing a quote.
    pub fn mark_to_market(&self, snapshot: &ChainSnapshot) -> BookSummary {
        let mut positions = Vec::new();
        let mut total_pnl = 0.0;

        for position in self.active(snapshot.index) {
            let current_ltp = snapshot
                .row(position.contract)
                .map_or(position.entry_ltp, |row| row.ltp);
            let pnl = position.pnl(current_ltp);
            total_pnl += pnl;
            positions.push(MarkedPosition {
                position: position.clone(),
                current_ltp,
                pnl,
            });
        }

        BookSummary {
            positions,
            total_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ChainRow;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_open_exit_clear_lifecycle() {
        let mut book = PositionBook::new();
        let ce = OptionContract::call(20000i64);
        let pe = OptionContract::put(20000i64);

        let first = book.open_at(MarketIndex::Nifty50, ce, 105.0, DEFAULT_LOT_SIZE, at());
        let _second = book.open_at(MarketIndex::Nifty50, pe, 98.0, DEFAULT_LOT_SIZE, at());
        assert_eq!(book.active(MarketIndex::Nifty50).len(), 2);

        let closed = book.exit(MarketIndex::Nifty50, &first).unwrap();
        assert_eq!(closed.contract, ce);
        assert_eq!(book.active(MarketIndex::Nifty50).len(), 1);

        // Exiting twice is a no-op.
        assert_eq!(book.exit(MarketIndex::Nifty50, &first), None);

        assert_eq!(book.clear(MarketIndex::Nifty50), 1);
        assert!(book.active(MarketIndex::Nifty50).is_empty());
        assert_eq!(book.clear(MarketIndex::Nifty50), 0);
    }

    #[test]
    fn test_books_are_isolated_per_index() {
        let mut book = PositionBook::new();
        let ce = OptionContract::call(20000i64);

        book.open_at(MarketIndex::Nifty50, ce, 105.0, DEFAULT_LOT_SIZE, at());
        book.open_at(MarketIndex::BankNifty, ce, 205.0, DEFAULT_LOT_SIZE, at());

        assert_eq!(book.active(MarketIndex::Nifty50).len(), 1);
        assert_eq!(book.active(MarketIndex::BankNifty).len(), 1);

        book.clear(MarketIndex::Nifty50);
        assert_eq!(book.active(MarketIndex::BankNifty).len(), 1);
    }

    #[test]
    fn test_mark_to_market_values_against_the_snapshot() {
        let mut book = PositionBook::new();
        let ce = OptionContract::call(20000i64);
        let pe = OptionContract::put(19900i64);

        book.open_at(MarketIndex::Nifty50, ce, 105.0, DEFAULT_LOT_SIZE, at());
        book.open_at(MarketIndex::Nifty50, pe, 98.0, DEFAULT_LOT_SIZE, at());

        // Only the call is still in the visible chain, quoted at 107.5.
        let snapshot = ChainSnapshot::new(
            MarketIndex::Nifty50,
            None,
            vec![ChainRow::new(ce, 107.5, 1_000, 50_000)],
            at(),
        );

        let summary = book.mark_to_market(&snapshot);
        assert_eq!(summary.positions.len(), 2);

        // (107.5 - 105.0) * 75 = 187.5.
        assert_eq!(summary.positions[0].current_ltp, 107.5);
        assert_eq!(summary.positions[0].pnl, 187.5);

        // The put fell out of the window: marks flat at its entry price.
        assert_eq!(summary.positions[1].current_ltp, 98.0);
        assert_eq!(summary.positions[1].pnl, 0.0);

        assert_eq!(summary.total_pnl, 187.5);
    }

    #[test]
    fn test_position_id_carries_contract_and_entry_instant() {
        let mut book = PositionBook::new();
        let id = book.open_at(
            MarketIndex::Nifty50,
            OptionContract::call(20000i64),
            105.0,
            DEFAULT_LOT_SIZE,
            at(),
        );

        let expected = format!("20000_CE_{}", at().timestamp_millis());
        assert_eq!(id.as_str(), expected);
    }
}
