use crate::error::InstrumentError;
use derive_more::{Constructor, From};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of an option contract as quoted on the exchange: `CE` (call) or `PE`
/// (put).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum OptionKind {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionKind {
    /// Exchange quote suffix, eg/ "CE".
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Call => "CE",
            OptionKind::Put => "PE",
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, OptionKind::Call)
    }

    pub fn is_put(&self) -> bool {
        matches!(self, OptionKind::Put)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OptionKind {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CE" => Ok(OptionKind::Call),
            "PE" => Ok(OptionKind::Put),
            _ => Err(InstrumentError::UnknownOptionKind(s.to_string())),
        }
    }
}

/// Exchange strike price.
///
/// Wraps a [`Decimal`] so contract identity is exact: an `f64` key drifts
/// (`20000.0` vs `20000.000000001`) and silently splits one contract's history
/// across two map entries.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize, From,
)]
pub struct Strike(pub Decimal);

impl Strike {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Strike {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<u32> for Strike {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

impl fmt::Display for Strike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Identity of one option contract within an index chain - the key every
/// per-contract history series is stored under.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Deserialize,
    Serialize,
    Constructor,
)]
pub struct OptionContract {
    pub strike: Strike,
    pub kind: OptionKind,
}

impl OptionContract {
    /// Call contract at `strike`.
    pub fn call(strike: impl Into<Strike>) -> Self {
        Self::new(strike.into(), OptionKind::Call)
    }

    /// Put contract at `strike`.
    pub fn put(strike: impl Into<Strike>) -> Self {
        Self::new(strike.into(), OptionKind::Put)
    }
}

impl fmt::Display for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.strike, self.kind)
    }
}
