use chainpulse_instrument::InstrumentError;
use thiserror::Error;

/// All errors generated in `chainpulse-data`.
///
/// Every variant is raised at a construction or ingestion boundary; the
/// tracker's query path never errors (absent history is `None` by contract).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("tracking interval must span at least one whole minute")]
    InvalidInterval,

    #[error("chain row is missing a strike price")]
    MissingStrike,

    #[error("chain row field {field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("chain row field {field} must be non-negative, got {value}")]
    NegativeQuantity { field: &'static str, value: f64 },

    #[error("instrument identity: {0}")]
    Instrument(#[from] InstrumentError),
}
