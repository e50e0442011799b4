//! Per-item tidset map built once from a horizontal transaction list, then
//! sealed for read-only single-item and itemset-intersection lookups.
//! See `SPEC_FULL.md` §4.2 and §9's "vertical store immutability" note.

use std::collections::{HashMap, HashSet};

use crate::error::{MiningError, Result};
use crate::itemset::Itemset;
use crate::tidset::{intersect, TidProb, Tidset};

fn validate_tid_prob(tid: i64, prob: f64) -> Result<()> {
    if tid < 0 {
        return Err(MiningError::InvalidTid { tid });
    }
    if !prob.is_finite() || !(0.0..=1.0).contains(&prob) {
        return Err(MiningError::InvalidProbability { value: prob });
    }
    Ok(())
}

enum StoreState {
    Building {
        buckets: HashMap<u32, Vec<TidProb>>,
        seen: HashSet<(u32, u64)>,
    },
    Sealed {
        buckets: HashMap<u32, Tidset>,
    },
}

/// A store that starts mutable (`add`) and transitions once, explicitly, to
/// a read-only sealed state (`seal`) before any lookup is permitted.
pub struct VerticalStore {
    state: StoreState,
    num_transactions: usize,
}

impl Default for VerticalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VerticalStore {
    pub fn new() -> Self {
        VerticalStore {
            state: StoreState::Building {
                buckets: HashMap::new(),
                seen: HashSet::new(),
            },
            num_transactions: 0,
        }
    }

    /// Record that item `item` occurs in transaction `tid` with probability
    /// `prob`. Fails with [`MiningError::SealViolation`] once the store has
    /// been sealed.
    pub fn add(&mut self, tid: u64, item: u32, prob: f64) -> Result<()> {
        validate_tid_prob(tid as i64, prob)?;
        match &mut self.state {
            StoreState::Building { buckets, seen } => {
                if !seen.insert((item, tid)) {
                    return Err(MiningError::InvalidTid { tid: tid as i64 });
                }
                buckets.entry(item).or_default().push(TidProb { tid, prob });
                self.num_transactions = self.num_transactions.max(tid as usize + 1);
                Ok(())
            }
            StoreState::Sealed { .. } => Err(MiningError::SealViolation),
        }
    }

    /// Sort every bucket by tid and transition to the sealed state. A
    /// no-op (beyond discarding the builder-only `seen` set) if already
    /// sealed.
    pub fn seal(&mut self) {
        if let StoreState::Building { buckets, .. } = &mut self.state {
            let sealed = std::mem::take(buckets)
                .into_iter()
                .map(|(item, entries)| (item, Tidset::sort_and_seal(entries)))
                .collect();
            self.state = StoreState::Sealed { buckets: sealed };
        }
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.state, StoreState::Sealed { .. })
    }

    /// Upper bound on transaction count, inferred from the largest tid ever
    /// added. Callers that need the *exact* database size should track it
    /// independently (see [`crate::ingest::UncertainDatabase`]).
    pub fn num_transactions(&self) -> usize {
        self.num_transactions
    }

    pub fn tidset_for_item(&self, id: u32) -> Result<Tidset> {
        match &self.state {
            StoreState::Sealed { buckets } => Ok(buckets.get(&id).cloned().unwrap_or_default()),
            StoreState::Building { .. } => Err(MiningError::SealViolation),
        }
    }

    /// `tidset_for_itemset` per `SPEC_FULL.md` §4.2: empty for the empty
    /// set, a direct lookup for singletons, and otherwise a size-ascending
    /// chain of merge-join intersections with early exit once the running
    /// result is empty.
    pub fn tidset_for_itemset(&self, x: &Itemset) -> Result<Tidset> {
        match x.len() {
            0 => Ok(Tidset::new()),
            1 => self.tidset_for_item(x.iter().next().expect("len == 1")),
            _ => {
                let mut tidsets: Vec<Tidset> = x
                    .iter()
                    .map(|id| self.tidset_for_item(id))
                    .collect::<Result<_>>()?;
                tidsets.sort_by_key(|t| t.len());
                let mut iter = tidsets.into_iter();
                let mut acc = iter.next().expect("len >= 2");
                for t in iter {
                    if acc.is_empty() {
                        break;
                    }
                    acc = intersect(&acc, &t);
                }
                Ok(acc)
            }
        }
    }
}
