//! A top-k closed frequent-itemset miner over uncertain transaction
//! databases, where each item in a transaction carries an independent
//! existence probability.
//!
//! # Usage
//!
//! ```
//! use uncertain_topk::config::MiningConfig;
//! use uncertain_topk::ingest::parse_database;
//! use uncertain_topk::mine;
//!
//! let text = "1 A:0.9\n2 A:0.5 B:0.4\n";
//! let db = parse_database(text).unwrap();
//! let config = MiningConfig::new(1, 0.5, 5, Default::default()).unwrap();
//! let patterns = mine(&db, config).unwrap();
//! for pattern in &patterns {
//!     println!("{:?} support={} probability={}", pattern.itemset, pattern.support, pattern.probability);
//! }
//! ```

pub mod cache;
pub mod calculator;
pub mod config;
pub mod engine;
pub mod error;
pub mod fft;
pub mod heap;
pub mod ingest;
pub mod itemset;
pub mod observer;
pub mod store;
pub mod tidset;
pub mod vocabulary;

pub use config::MiningConfig;
pub use engine::MiningEngine;
pub use error::{MiningError, Result};
pub use heap::Pattern;
pub use ingest::UncertainDatabase;

/// Underflow clamp for tidset probabilities: `SPEC_FULL.md` §3, §6.
pub const MIN_PROB: f64 = 1e-300;
/// Slack absorbed when comparing frequentness against `tau`: §4.3, §6.
pub const EPSILON: f64 = 1e-9;
/// Magnitudes below this after an inverse FFT are floored to zero: §4.4, §6.
pub const FFT_NOISE_FLOOR: f64 = 1e-10;

/// Mine `db` for the top-k closed patterns under `config`, using the
/// default no-op observer. A thin convenience wrapper around
/// [`MiningEngine::run`] for callers that don't need custom observers.
pub fn mine(db: &UncertainDatabase, config: MiningConfig) -> Result<Vec<Pattern>> {
    let engine = MiningEngine::new(config, clone_sealed_store(db)?);
    Ok(engine.run(db.vocabulary()))
}

/// `MiningEngine` owns its store, but `UncertainDatabase` also needs to keep
/// one around for `tidset_for`; rebuild a sealed store with identical
/// contents rather than sharing ownership, since the store has no `Clone`
/// (its tidsets would need deep copies anyway).
fn clone_sealed_store(db: &UncertainDatabase) -> Result<store::VerticalStore> {
    let mut rebuilt = store::VerticalStore::new();
    for id in db.vocabulary().ids() {
        for entry in db.store().tidset_for_item(id)?.iter() {
            rebuilt.add(entry.tid, id, entry.prob)?;
        }
    }
    rebuilt.seal();
    Ok(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mine_end_to_end_single_item() {
        let db = ingest::parse_database("1 A:0.9\n").unwrap();
        let config = MiningConfig::new(1, 0.5, 5, Default::default()).unwrap();
        let patterns = mine(&db, config).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].support, 1);
    }

    #[test]
    fn constants_match_spec() {
        assert_eq!(MIN_PROB, 1e-300);
        assert_eq!(EPSILON, 1e-9);
        assert_eq!(FFT_NOISE_FLOOR, 1e-10);
    }
}
