//! The shared reference clock.
//!
//! Every non-pinned tracker operation stamps and compares instants from this
//! one clock, so interval arithmetic can never mix a recording clock with a
//! querying clock. Instants are tz-aware UTC; the exchange trades in IST
//! (`Asia/Kolkata`), which is exposed as a display conversion only.

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;

/// Timezone the exchange session runs in.
pub const EXCHANGE_TZ: Tz = Kolkata;

/// Current instant on the reference clock.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Exchange-local (IST) view of an instant, for display and session
/// bookkeeping.
pub fn exchange_local(ts: DateTime<Utc>) -> DateTime<Tz> {
    ts.with_timezone(&EXCHANGE_TZ)
}

/// Exchange-local wall-clock now, eg/ for entry timestamps on reports.
pub fn exchange_now() -> DateTime<Tz> {
    exchange_local(now())
}
