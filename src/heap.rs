//! Size-bounded min-heap of accepted patterns, keyed by `(support,
//! probability)`, deduplicated by itemset. See `SPEC_FULL.md` §4.5.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use serde::{Deserialize, Serialize};

use crate::itemset::Itemset;

/// Output of mining: an itemset together with its probabilistic support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub itemset: Itemset,
    pub support: u32,
    pub probability: f64,
}

#[derive(Clone, Debug)]
struct HeapEntry {
    pattern: Pattern,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.support == other.pattern.support
            && self.pattern.probability == other.pattern.probability
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pattern
            .support
            .cmp(&other.pattern.support)
            .then_with(|| {
                self.pattern
                    .probability
                    .partial_cmp(&other.pattern.probability)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

/// Keeps at most `k` patterns, the ones with the highest `(support,
/// probability)`, and exposes the running minimum as a dynamic pruning
/// threshold.
pub struct TopKHeap {
    capacity: usize,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    members: HashSet<Itemset>,
}

impl TopKHeap {
    pub fn new(capacity: usize) -> Self {
        TopKHeap {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Attempt to add `(itemset, support, probability)`. Returns `false` if
    /// the itemset is already represented, or if the heap is full and this
    /// candidate does not exceed the current minimum.
    pub fn insert(&mut self, itemset: Itemset, support: u32, probability: f64) -> bool {
        if self.members.contains(&itemset) {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.members.insert(itemset.clone());
            self.heap.push(Reverse(HeapEntry {
                pattern: Pattern {
                    itemset,
                    support,
                    probability,
                },
            }));
            return true;
        }

        let is_better = {
            let min = &self.heap.peek().expect("full heap is non-empty").0.pattern;
            (support, probability) > (min.support, min.probability)
        };
        if !is_better {
            return false;
        }

        let evicted = self.heap.pop().expect("full heap is non-empty").0;
        self.members.remove(&evicted.pattern.itemset);
        self.members.insert(itemset.clone());
        self.heap.push(Reverse(HeapEntry {
            pattern: Pattern {
                itemset,
                support,
                probability,
            },
        }));
        true
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// `0` while the heap has not yet filled (so callers fall back to
    /// `minsup`), else the current minimum support in the heap.
    pub fn min_support(&self) -> u32 {
        if !self.is_full() {
            return 0;
        }
        self.heap
            .peek()
            .map(|Reverse(e)| e.pattern.support)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// All current entries, in unspecified order; callers sort.
    pub fn snapshot(&self) -> Vec<Pattern> {
        self.heap.iter().map(|Reverse(e)| e.pattern.clone()).collect()
    }
}
