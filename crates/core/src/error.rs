//! Error types for round construction and configuration
//!
//! Only configuration problems are errors. Rejected player moves are plain
//! `false` returns and never surface here.

use triple_tray_types::{MAX_HOLDING_SLOTS, MAX_TRAY_SLOTS};

/// Fatal problems detected while validating config or building a round
///
/// A round build that fails with one of these leaves no partial board behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("tile catalog is empty")]
    EmptyCatalog,
    #[error("layer count must be at least 1")]
    ZeroLayers,
    #[error("tray slot count must be at least 1")]
    ZeroSlots,
    #[error("per-type multiplicity must be at least 1")]
    ZeroMultiplicity,
    #[error("match count {match_count} exceeds tray capacity {slot_count}")]
    MatchCountTooLarge { match_count: usize, slot_count: usize },
    #[error("tray slot count {0} exceeds the maximum of {MAX_TRAY_SLOTS}")]
    TooManySlots(usize),
    #[error("holding slot count {0} exceeds the maximum of {MAX_HOLDING_SLOTS}")]
    HoldingTooLarge(usize),
    #[error("level needs {needed} tile types but the catalog has {available}")]
    NotEnoughTypes { needed: usize, available: usize },
    #[error("pile spacing must exceed the tile size plus twice the layer jitter")]
    PilesOverlap,
    #[error("no levels configured")]
    NoLevels,
    #[error("invalid config: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
