use netsync_serde::SerdeErr;
use thiserror::Error;

/// Errors raised while decoding an input packet. The packet is discarded;
/// redundancy covers the loss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputDecodeError {
    #[error("input packet is malformed: {0}")]
    Malformed(#[from] SerdeErr),

    #[error("input packet contains no frames")]
    Empty,

    #[error("input packet starts at the reserved input id")]
    ReservedInputId,
}
