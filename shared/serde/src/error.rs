use thiserror::Error;

/// Errors that can occur while deserializing from a bit stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The bit stream ended before the value was fully read
    #[error("bit stream exhausted while reading a value")]
    Exhausted,
    /// The read bits do not form a valid value of the expected type
    #[error("bit stream contains an invalid encoding")]
    InvalidEncoding,
}
