//! Sharing one tracker between a polling writer and concurrent readers.

use crate::{
    snapshot::ChainSnapshot,
    tracker::{ChainTracker, ChangeDelta, Interval},
};
use chainpulse_instrument::{MarketIndex, OptionContract};
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Cheaply cloneable handle to a [`ChainTracker`] shared between one polling
/// writer and any number of dashboard readers.
///
/// Appends and evictions happen inside the write lock, so a reader never
/// observes a partially appended sample or an over-capacity ring. Readers are
/// eventually consistent: a query racing a record may miss the newest sample
/// by one poll tick, which is acceptable at dashboard cadence. Every
/// operation is synchronous and bounded, so lock hold times stay tiny.
#[derive(Clone, Debug, Default)]
pub struct SharedChainTracker {
    inner: Arc<RwLock<ChainTracker>>,
}

impl SharedChainTracker {
    pub fn new(tracker: ChainTracker) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tracker)),
        }
    }

    /// Handle to a fresh tracker retaining `capacity` samples per contract.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(ChainTracker::new(capacity))
    }

    /// See [`ChainTracker::record`].
    pub fn record(
        &self,
        index: MarketIndex,
        contract: OptionContract,
        volume: u64,
        open_interest: u64,
    ) {
        self.inner.write().record(index, contract, volume, open_interest);
    }

    /// See [`ChainTracker::record_at`].
    pub fn record_at(
        &self,
        index: MarketIndex,
        contract: OptionContract,
        volume: u64,
        open_interest: u64,
        at: DateTime<Utc>,
    ) {
        self.inner
            .write()
            .record_at(index, contract, volume, open_interest, at);
    }

    /// See [`ChainTracker::record_snapshot`].
    pub fn record_snapshot(&self, snapshot: &ChainSnapshot) {
        self.inner.write().record_snapshot(snapshot);
    }

    /// See [`ChainTracker::change_since`].
    pub fn change_since(
        &self,
        index: MarketIndex,
        contract: OptionContract,
        window: Interval,
    ) -> Option<ChangeDelta> {
        self.inner.read().change_since(index, contract, window)
    }

    /// See [`ChainTracker::change_since_at`].
    pub fn change_since_at(
        &self,
        index: MarketIndex,
        contract: OptionContract,
        window: Interval,
        now: DateTime<Utc>,
    ) -> Option<ChangeDelta> {
        self.inner
            .read()
            .change_since_at(index, contract, window, now)
    }

    /// Read guard for compound queries over a consistent view.
    pub fn read(&self) -> RwLockReadGuard<'_, ChainTracker> {
        self.inner.read()
    }

    /// Write guard for compound updates, eg/ report building, which records
    /// a snapshot and queries it under one lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, ChainTracker> {
        self.inner.write()
    }
}
