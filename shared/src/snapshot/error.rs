use netsync_serde::SerdeErr;
use thiserror::Error;

/// Errors raised while decoding a state payload. Any of these discards the
/// whole packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotReadError {
    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u8),

    #[error("snapshot payload is malformed: {0}")]
    Malformed(#[from] SerdeErr),

    #[error("controller entity block carries no input id")]
    MissingControllerInput,

    #[error("input id sentinel value inside a snapshot")]
    ReservedInputId,
}
