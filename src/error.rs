use thiserror::Error;

use crate::constants::{MAX_SHARES, MAX_THRESHOLD, MIN_SHARES, MIN_THRESHOLD};

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ShamirError>;

/// Invalid split parameters. Reported before any randomness is consumed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("threshold {0} is out of range, expected {min}..={max}", min = MIN_THRESHOLD, max = MAX_THRESHOLD)]
    ThresholdOutOfRange(usize),

    #[error("share count {0} is out of range, expected {min}..={max}", min = MIN_SHARES, max = MAX_SHARES)]
    SharesOutOfRange(usize),

    #[error("threshold {threshold} cannot be bigger than the number of shares {shares}")]
    ThresholdExceedsShares { threshold: usize, shares: usize },

    #[error("secret must not be empty")]
    EmptySecret,

    #[error("share id {0} is out of range, expected 1..={max}", max = MAX_SHARES)]
    InvalidShareId(usize),
}

/// A share token that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("token is truncated: {len} characters")]
    Truncated { len: usize },

    #[error("field width character {0:?} is not a hex digit")]
    InvalidFieldWidth(char),

    #[error("unsupported field width of {0} bits")]
    UnsupportedFieldWidth(u8),

    #[error("share id 0 is reserved")]
    ReservedId,

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Shares that parse individually but do not belong together.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("at least {min} shares are required, got {0}", min = MIN_SHARES)]
    NotEnoughShares(usize),

    #[error("share id {0} appears more than once")]
    DuplicateId(u8),

    #[error("share id 0 is reserved")]
    ReservedId,

    #[error("share {id} has a field width of {found} bits, expected {expected}")]
    FieldWidthMismatch { id: u8, expected: u8, found: u8 },

    #[error("shares use an unsupported field width of {0} bits")]
    UnsupportedFieldWidth(u8),

    #[error("share {id} carries {found} bytes, expected {expected}")]
    LengthMismatch { id: u8, expected: usize, found: usize },

    #[error("share {0} carries no data")]
    EmptyShare(u8),
}

/// Umbrella error for the split/combine entry points.
#[derive(Debug, Error)]
pub enum ShamirError {
    #[error("invalid parameters: {0}")]
    Config(#[from] ConfigError),

    #[error("share #{index} is malformed: {source}")]
    Decode {
        /// Position of the offending token in the input.
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("inconsistent shares: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("secure random source unavailable: {0}")]
    Entropy(#[from] rand::Error),
}

impl ShamirError {
    pub(crate) fn decode(index: usize, source: DecodeError) -> Self {
        ShamirError::Decode { index, source }
    }
}
