//! Three-phase mining driver: a parallel scan for frequent 1-itemsets, a
//! seeding step, and a best-first closure-aware enumeration over a priority
//! queue. See `SPEC_FULL.md` §4.9.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::cache::{Cache, CacheEntry};
use crate::calculator::SupportCalculator;
use crate::config::MiningConfig;
use crate::heap::{Pattern, TopKHeap};
use crate::itemset::Itemset;
use crate::observer::{MiningObserver, NullObserver, ObserverSet};
use crate::store::VerticalStore;
use crate::tidset::{intersect, Tidset};
use crate::vocabulary::Vocabulary;

/// A queued itemset awaiting closure-check-and-extend, ordered for a
/// best-first max-heap: `(support desc, probability desc, size asc)`.
#[derive(Clone, Debug)]
struct Candidate {
    itemset: Itemset,
    support: u32,
    probability: f64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.support == other.support
            && self.probability == other.probability
            && self.itemset.len() == other.itemset.len()
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.support
            .cmp(&other.support)
            .then_with(|| {
                self.probability
                    .partial_cmp(&other.probability)
                    .unwrap_or(Ordering::Equal)
            })
            // Smaller itemsets sort *after* larger ones are popped first by a
            // BinaryHeap max-heap, so invert: size-ascending tie-break means
            // the smaller itemset must compare greater.
            .then_with(|| other.itemset.len().cmp(&self.itemset.len()))
    }
}

/// The three-phase driver described by `SPEC_FULL.md` §4.9. Owns the
/// immutable-after-phase-1 store and calculator for the duration of one run.
pub struct MiningEngine {
    config: MiningConfig,
    store: VerticalStore,
    calculator: Box<dyn SupportCalculator>,
    observers: ObserverSet,
}

impl MiningEngine {
    pub fn new(config: MiningConfig, store: VerticalStore) -> Self {
        let calculator = config.calculator.build();
        let mut observers = ObserverSet::new();
        observers.push(Box::new(NullObserver));
        MiningEngine {
            config,
            store,
            calculator,
            observers,
        }
    }

    /// Replace the default no-op observer set. Takes ownership since an
    /// engine's observer list is fixed for the run.
    pub fn with_observer(mut self, observer: Box<dyn MiningObserver + Send + Sync>) -> Self {
        self.observers = ObserverSet::new();
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Run all three phases against `vocabulary` (used only to enumerate
    /// item-ids) and return the sorted top-k closed patterns.
    pub fn run(&self, vocabulary: &Vocabulary) -> Vec<Pattern> {
        let cache = Cache::new();
        let n_total = self.store.num_transactions();

        self.observers.phase_start("frequent_1_itemsets");
        let mut phase1 = self.phase1_frequent_singletons(vocabulary, n_total, &cache);
        phase1.sort_by(|a, b| {
            b.support
                .cmp(&a.support)
                .then_with(|| b.probability.partial_cmp(&a.probability).unwrap_or(Ordering::Equal))
        });
        self.observers.phase_complete("frequent_1_itemsets");

        self.observers.phase_start("enumerate");
        let heap = self.phase2_and_3(phase1, &cache);
        self.observers.phase_complete("enumerate");

        let results = Self::sorted_snapshot(&heap);
        for pattern in &results {
            self.observers.pattern_found(pattern);
        }
        results
    }

    /// Same as [`Self::run`] but seeded with 2-itemsets instead of
    /// singletons, per `SPEC_FULL.md` §9's open question. Exists purely to
    /// regression-pin that the two seeding strategies agree; see
    /// `tests::seeding_strategies_agree`.
    #[cfg(test)]
    fn run_two_itemset_seeded(&self, vocabulary: &Vocabulary) -> Vec<Pattern> {
        let cache = Cache::new();
        let n_total = self.store.num_transactions();

        let mut phase1 = self.phase1_frequent_singletons(vocabulary, n_total, &cache);
        phase1.sort_by(|a, b| {
            b.support
                .cmp(&a.support)
                .then_with(|| b.probability.partial_cmp(&a.probability).unwrap_or(Ordering::Equal))
        });

        let heap = self.phase2_and_3_two_itemset_seeded(phase1, &cache);
        Self::sorted_snapshot(&heap)
    }

    /// Final-result ordering shared by every seeding strategy: (support
    /// desc, probability desc, itemset lexicographic asc for ties).
    fn sorted_snapshot(heap: &TopKHeap) -> Vec<Pattern> {
        let mut results = heap.snapshot();
        results.sort_by(|a, b| {
            b.support
                .cmp(&a.support)
                .then_with(|| b.probability.partial_cmp(&a.probability).unwrap_or(Ordering::Equal))
                .then_with(|| a.itemset.cmp(&b.itemset))
        });
        results
    }

    /// Phase 1: for every item-id in parallel, compute its singleton's
    /// support/probability from its tidset and keep it if frequent.
    fn phase1_frequent_singletons(
        &self,
        vocabulary: &Vocabulary,
        n_total: usize,
        cache: &Cache,
    ) -> Vec<Pattern> {
        vocabulary
            .ids()
            .collect::<Vec<_>>()
            .par_iter()
            .filter_map(|&id| {
                let singleton = Itemset::singleton(id);
                let tidset = self.store.tidset_for_item(id).ok()?;
                if tidset.is_empty() {
                    return None;
                }
                let (support, probability) = self.calculator.support_and_probability_sparse(
                    &tidset,
                    n_total,
                    self.config.tau,
                );
                if support < self.config.minsup {
                    return None;
                }
                cache.insert_if_absent(
                    singleton.clone(),
                    CacheEntry {
                        support,
                        probability,
                        tidset,
                    },
                );
                Some(Pattern {
                    itemset: singleton,
                    support,
                    probability,
                })
            })
            .collect()
    }

    /// Phases 2 and 3: seed the priority queue with frequent singletons, then
    /// run the closure-aware best-first enumeration to exhaustion.
    fn phase2_and_3(&self, phase1: Vec<Pattern>, cache: &Cache) -> TopKHeap {
        let mut heap = TopKHeap::new(self.config.k);
        let frequent_items: Vec<u32> = phase1
            .iter()
            .map(|p| p.itemset.iter().next().expect("singleton has one member"))
            .collect();

        let mut pq: BinaryHeap<Candidate> = BinaryHeap::with_capacity(phase1.len());
        for pattern in phase1 {
            pq.push(Candidate {
                itemset: pattern.itemset,
                support: pattern.support,
                probability: pattern.probability,
            });
        }

        self.drain_candidate_queue(&mut pq, &mut heap, &frequent_items, cache);
        heap
    }

    /// Alternate seeding strategy from `SPEC_FULL.md` §9's open question:
    /// instead of pushing frequent singletons onto the priority queue and
    /// letting phase 3 discover their extensions lazily, run
    /// closure-check-and-extend on every frequent singleton up front and
    /// seed the queue with the resulting 2-itemsets. Closed singletons still
    /// go straight into the heap. Kept as a test-only alternate driver to
    /// regression-pin that both seeding strategies converge on the same
    /// top-k output; production mining always uses [`Self::phase2_and_3`].
    #[cfg(test)]
    fn phase2_and_3_two_itemset_seeded(&self, phase1: Vec<Pattern>, cache: &Cache) -> TopKHeap {
        let mut heap = TopKHeap::new(self.config.k);
        let frequent_items: Vec<u32> = phase1
            .iter()
            .map(|p| p.itemset.iter().next().expect("singleton has one member"))
            .collect();

        let mut pq: BinaryHeap<Candidate> = BinaryHeap::new();
        for pattern in &phase1 {
            let candidate = Candidate {
                itemset: pattern.itemset.clone(),
                support: pattern.support,
                probability: pattern.probability,
            };
            let (is_closed, extensions) =
                self.closure_check_and_extend(&candidate, &frequent_items, &heap, cache);
            if is_closed {
                heap.insert(candidate.itemset, candidate.support, candidate.probability);
            }
            for ext in extensions {
                pq.push(Candidate {
                    itemset: ext.itemset,
                    support: ext.support,
                    probability: ext.probability,
                });
            }
        }

        self.drain_candidate_queue(&mut pq, &mut heap, &frequent_items, cache);
        heap
    }

    /// Shared best-first drain loop behind both seeding strategies: pop the
    /// head candidate, closure-check it, insert it if closed, and push its
    /// surviving extensions back onto the queue.
    fn drain_candidate_queue(
        &self,
        pq: &mut BinaryHeap<Candidate>,
        heap: &mut TopKHeap,
        frequent_items: &[u32],
        cache: &Cache,
    ) {
        while let Some(candidate) = pq.pop() {
            let threshold = self.config.minsup.max(heap.min_support());
            if heap.is_full() && candidate.support < threshold {
                break;
            }

            let (is_closed, extensions) =
                self.closure_check_and_extend(&candidate, frequent_items, heap, cache);

            if is_closed {
                // Only the final top-k survivors are reported via
                // `on_pattern_found`, once each, after the closing sort in
                // `run` — an insertion here can still be evicted later as
                // better candidates arrive, so firing now would double-count
                // (or falsely count) patterns for observers/metrics.
                heap.insert(candidate.itemset.clone(), candidate.support, candidate.probability);
            }

            let threshold = self.config.minsup.max(heap.min_support());
            for ext in extensions {
                if ext.support >= threshold || !heap.is_full() {
                    pq.push(Candidate {
                        itemset: ext.itemset,
                        support: ext.support,
                        probability: ext.probability,
                    });
                } else {
                    self.observers.candidate_pruned(&ext.itemset, "below dynamic threshold");
                }
            }
        }
    }

    /// One full pass of `SPEC_FULL.md`'s closure-check-and-extend over
    /// `frequent_items` (already sorted by support desc from phase 1).
    fn closure_check_and_extend(
        &self,
        x: &Candidate,
        frequent_items: &[u32],
        heap: &TopKHeap,
        cache: &Cache,
    ) -> (bool, Vec<ExtensionCandidate>) {
        let sup_x = x.support;
        let max_i = x.itemset.max_item().map(|m| m as i64).unwrap_or(-1);
        let threshold = self.config.minsup.max(heap.min_support());

        let mut is_closed = true;
        let mut closure_check_done = false;
        let mut extensions = Vec::new();

        for &e in frequent_items {
            if x.itemset.contains(e) {
                continue;
            }
            let s_e = match cache.get(&Itemset::singleton(e)) {
                Some(entry) => entry.support,
                None => continue,
            };
            if !closure_check_done && s_e < sup_x {
                closure_check_done = true;
            }

            let need_closure_check = !closure_check_done && is_closed;
            let need_extension = e as i64 > max_i;

            if !need_closure_check && !need_extension {
                continue;
            }

            let mut upper_bound = sup_x.min(s_e);
            if x.itemset.len() >= 3 && heap.is_full() && need_extension {
                for xj in x.itemset.iter() {
                    let pair = Itemset::singleton(xj).with(e);
                    if let Some(entry) = cache.get(&pair) {
                        upper_bound = upper_bound.min(entry.support);
                        if upper_bound < threshold {
                            break;
                        }
                    }
                }
            }

            if !need_closure_check
                && !(need_extension && (upper_bound >= threshold || !heap.is_full()))
            {
                continue;
            }

            let xe = x.itemset.with(e);
            let mut need_closure_check = need_closure_check;

            let (s_xe, p_xe) = match cache.get(&xe) {
                Some(entry) => (entry.support, entry.probability),
                None => {
                    let t_xe = self.tidset_for_pair(&x.itemset, e, cache);

                    if t_xe.len() < threshold as usize && heap.is_full() && !need_closure_check {
                        cache.insert_if_absent(
                            xe.clone(),
                            CacheEntry {
                                support: 0,
                                probability: 0.0,
                                tidset: t_xe,
                            },
                        );
                        self.observers.candidate_pruned(&xe, "tidset smaller than threshold");
                        continue;
                    }

                    if need_closure_check && (t_xe.len() as u32) < sup_x {
                        if !need_extension {
                            cache.insert_if_absent(
                                xe.clone(),
                                CacheEntry {
                                    support: 0,
                                    probability: 0.0,
                                    tidset: t_xe,
                                },
                            );
                            continue;
                        }
                        need_closure_check = false;
                    }

                    let (s, p) = self
                        .calculator
                        .support_and_probability_sparse(&t_xe, self.store.num_transactions(), self.config.tau);
                    cache.insert_if_absent(
                        xe.clone(),
                        CacheEntry {
                            support: s,
                            probability: p,
                            tidset: t_xe,
                        },
                    );
                    (s, p)
                }
            };

            if need_closure_check && s_xe == sup_x {
                is_closed = false;
            }

            if need_extension && s_xe >= self.config.minsup {
                extensions.push(ExtensionCandidate {
                    itemset: xe,
                    support: s_xe,
                    probability: p_xe,
                });
            }
        }

        (is_closed, extensions)
    }

    /// Tidset for `x ∪ {e}`, preferring a cached intersection of `x` and
    /// `{e}`'s own tidsets and falling back to a direct store lookup when
    /// either side is missing from the cache.
    fn tidset_for_pair(&self, x: &Itemset, e: u32, cache: &Cache) -> Tidset {
        let singleton_e = Itemset::singleton(e);
        match (cache.get(x), cache.get(&singleton_e)) {
            (Some(a), Some(b)) => intersect(&a.tidset, &b.tidset),
            _ => {
                let xe = x.with(e);
                self.store
                    .tidset_for_itemset(&xe)
                    .unwrap_or_default()
            }
        }
    }
}

struct ExtensionCandidate {
    itemset: Itemset,
    support: u32,
    probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalculatorKind;

    fn build_engine(rows: &[(u64, u32, f64)], config: MiningConfig) -> (MiningEngine, Vocabulary) {
        let mut store = VerticalStore::new();
        let mut vocabulary = Vocabulary::new();
        let mut max_id = 0u32;
        for &(tid, item, prob) in rows {
            store.add(tid, item, prob).unwrap();
            max_id = max_id.max(item);
        }
        for id in 0..=max_id {
            vocabulary.intern(&id.to_string());
        }
        store.seal();
        (MiningEngine::new(config, store), vocabulary)
    }

    #[test]
    fn s1_single_transaction_single_item() {
        let config = MiningConfig::new(1, 0.5, 5, CalculatorKind::PolyDp).unwrap();
        let (engine, vocab) = build_engine(&[(1, 0, 0.9)], config);
        let results = engine.run(&vocab);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].support, 1);
        assert!((results[0].probability - 0.9).abs() < 1e-9);
    }

    #[test]
    fn s2_pairwise_intersection_is_mined_and_closed() {
        // A = {0}, B = {1}; rows: (1,A,0.8)(1,B,0.6)(2,A,0.5)(3,B,0.4)
        let config = MiningConfig::new(1, 0.2, 5, CalculatorKind::PolyDp).unwrap();
        let (engine, vocab) = build_engine(
            &[(1, 0, 0.8), (1, 1, 0.6), (2, 0, 0.5), (3, 1, 0.4)],
            config,
        );
        let results = engine.run(&vocab);
        let pair = results
            .iter()
            .find(|p| p.itemset.len() == 2)
            .expect("pair itemset present");
        assert_eq!(pair.support, 1);
        assert!((pair.probability - 0.48).abs() < 1e-9);
    }

    #[test]
    fn s5_closure_pruning_drops_non_closed_singletons() {
        // A and B always co-occur with prob 1.0; C sometimes too.
        let config = MiningConfig::new(1, 0.5, 10, CalculatorKind::PolyDp).unwrap();
        let rows = vec![
            (1u64, 0u32, 1.0), (1, 1, 1.0), (1, 2, 0.9),
            (2, 0, 1.0), (2, 1, 1.0),
            (3, 0, 1.0), (3, 1, 1.0), (3, 2, 0.9),
        ];
        let (engine, vocab) = build_engine(&rows, config);
        let results = engine.run(&vocab);
        assert!(
            !results.iter().any(|p| p.itemset.len() == 1),
            "standalone {{A}} or {{B}} must not survive closure pruning: {:?}",
            results
        );
    }

    #[test]
    fn s6_dynamic_threshold_prunes_without_computing_tidsets() {
        // k=2 with descending per-item supports; low-support extensions
        // should never grow their own tidset entry in the cache.
        let config = MiningConfig::new(1, 0.5, 2, CalculatorKind::PolyDp).unwrap();
        let mut rows = Vec::new();
        for item in 0u32..6 {
            // item i occurs in (10 - i) transactions with prob 1.0
            for tid in 0..(10 - item as u64) {
                rows.push((tid, item, 1.0));
            }
        }
        let (engine, vocab) = build_engine(&rows, config);
        let results = engine.run(&vocab);
        assert!(results.len() <= 2);
        for w in results.windows(2) {
            assert!(w[0].support >= w[1].support);
        }
    }

    #[test]
    fn determinism_across_repeated_runs() {
        let config = MiningConfig::new(1, 0.3, 5, CalculatorKind::PolyDp).unwrap();
        let rows = vec![
            (1u64, 0u32, 0.9), (1, 1, 0.8), (1, 2, 0.7),
            (2, 0, 0.6), (2, 1, 0.9),
            (3, 1, 0.5), (3, 2, 0.9),
        ];
        let (engine, vocab) = build_engine(&rows, config);
        let a = engine.run(&vocab);
        let b = engine.run(&vocab);
        assert_eq!(a.len(), b.len());
        for (p, q) in a.iter().zip(b.iter()) {
            assert_eq!(p.itemset, q.itemset);
            assert_eq!(p.support, q.support);
            assert!((p.probability - q.probability).abs() < 1e-12);
        }
    }

    /// Regression pin for `SPEC_FULL.md` §9's open question: seeding the
    /// priority queue with frequent singletons (production, `run`) and
    /// seeding it with 2-itemsets derived from closure-checking those
    /// singletons up front (`run_two_itemset_seeded`) must converge on an
    /// identical top-k.
    #[test]
    fn seeding_strategies_agree() {
        let config = MiningConfig::new(1, 0.3, 5, CalculatorKind::PolyDp).unwrap();
        let rows = vec![
            (1u64, 0u32, 0.9), (1, 1, 0.8), (1, 2, 0.7),
            (2, 0, 0.6), (2, 1, 0.9),
            (3, 1, 0.5), (3, 2, 0.9),
            (4, 0, 0.7), (4, 2, 0.6),
        ];
        let (engine, vocab) = build_engine(&rows, config);

        let singleton_seeded = engine.run(&vocab);
        let two_itemset_seeded = engine.run_two_itemset_seeded(&vocab);

        assert_eq!(singleton_seeded.len(), two_itemset_seeded.len());
        for (p, q) in singleton_seeded.iter().zip(two_itemset_seeded.iter()) {
            assert_eq!(p.itemset, q.itemset);
            assert_eq!(p.support, q.support);
            assert!((p.probability - q.probability).abs() < 1e-9);
        }
    }
}
