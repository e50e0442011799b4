//! Structured error kinds shared by every layer of the miner.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MiningError>;

/// Everything that can go wrong while configuring, loading, or running the
/// miner. Construction-time and ingest-time errors abort the run; see
/// `SPEC_FULL.md` §7 for the full propagation policy.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("invalid probability {value}: must be finite and in [0, 1]")]
    InvalidProbability { value: f64 },

    #[error("invalid tid {tid}: must be non-negative and unique within a tidset")]
    InvalidTid { tid: i64 },

    #[error("operation not permitted once the vertical store is sealed")]
    SealViolation,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
