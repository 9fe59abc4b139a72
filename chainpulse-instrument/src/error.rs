use thiserror::Error;

/// All errors generated by `chainpulse-instrument`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    #[error("unrecognised market index: {0}")]
    UnknownIndex(String),

    #[error("unrecognised option kind: {0}")]
    UnknownOptionKind(String),
}
