use crate::error::InstrumentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market indices with exchange-listed option chains tracked by chainpulse.
///
/// The set is deliberately closed: dashboards select from a fixed dropdown and
/// every index carries a known exchange symbol for chain requests.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum MarketIndex {
    #[serde(rename = "NIFTY50")]
    Nifty50,
    #[serde(rename = "BANKNIFTY")]
    BankNifty,
    #[serde(rename = "FINNIFTY")]
    FinNifty,
    #[serde(rename = "MIDCAPNIFTY")]
    MidcapNifty,
    #[serde(rename = "SENSEX")]
    Sensex,
}

impl MarketIndex {
    /// Every supported index, in dashboard display order.
    pub const ALL: [MarketIndex; 5] = [
        MarketIndex::Nifty50,
        MarketIndex::BankNifty,
        MarketIndex::FinNifty,
        MarketIndex::MidcapNifty,
        MarketIndex::Sensex,
    ];

    /// Dashboard-facing identifier, eg/ "NIFTY50".
    pub fn name(&self) -> &'static str {
        match self {
            MarketIndex::Nifty50 => "NIFTY50",
            MarketIndex::BankNifty => "BANKNIFTY",
            MarketIndex::FinNifty => "FINNIFTY",
            MarketIndex::MidcapNifty => "MIDCAPNIFTY",
            MarketIndex::Sensex => "SENSEX",
        }
    }

    /// Exchange symbol used when requesting the index option chain,
    /// eg/ "NSE:NIFTY50-INDEX".
    pub fn symbol(&self) -> &'static str {
        match self {
            MarketIndex::Nifty50 => "NSE:NIFTY50-INDEX",
            MarketIndex::BankNifty => "NSE:NIFTYBANK-INDEX",
            MarketIndex::FinNifty => "NSE:FINNIFTY-INDEX",
            MarketIndex::MidcapNifty => "NSE:MIDCPNIFTY-INDEX",
            MarketIndex::Sensex => "BSE:SENSEX-INDEX",
        }
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MarketIndex {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NIFTY50" => Ok(MarketIndex::Nifty50),
            "BANKNIFTY" => Ok(MarketIndex::BankNifty),
            "FINNIFTY" => Ok(MarketIndex::FinNifty),
            "MIDCAPNIFTY" => Ok(MarketIndex::MidcapNifty),
            "SENSEX" => Ok(MarketIndex::Sensex),
            _ => Err(InstrumentError::UnknownIndex(s.to_string())),
        }
    }
}
