//! Optional side-effect channel to external collaborators. Errors from
//! handlers must never affect mining correctness. See `SPEC_FULL.md` §4.7
//! and §9's "observer channel" note.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::heap::Pattern;
use crate::itemset::Itemset;

/// The four points in a mining run external collaborators may want to
/// observe. Every method has a default no-op body so implementors only
/// override what they need.
pub trait MiningObserver {
    fn on_phase_start(&self, _phase: &str) {}
    fn on_phase_complete(&self, _phase: &str) {}
    fn on_pattern_found(&self, _pattern: &Pattern) {}
    fn on_candidate_pruned(&self, _itemset: &Itemset, _reason: &str) {}
}

/// The default observer: does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl MiningObserver for NullObserver {}

/// Emits structured `tracing` events for every hook, at the verbosity level
/// appropriate to how often each fires: phases are rare (`info`), pattern
/// discovery is per-result (`debug`), pruning is per-candidate (`trace`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MiningObserver for TracingObserver {
    fn on_phase_start(&self, phase: &str) {
        tracing::info!(phase, "phase started");
    }

    fn on_phase_complete(&self, phase: &str) {
        tracing::info!(phase, "phase complete");
    }

    fn on_pattern_found(&self, pattern: &Pattern) {
        tracing::debug!(
            support = pattern.support,
            probability = pattern.probability,
            itemset = ?pattern.itemset,
            "pattern found"
        );
    }

    fn on_candidate_pruned(&self, itemset: &Itemset, reason: &str) {
        tracing::trace!(itemset = ?itemset, reason, "candidate pruned");
    }
}

/// Dispatches to a list of observers, catching any panic a handler raises so
/// a misbehaving handler can never take down or corrupt the mining run.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn MiningObserver + Send + Sync>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: Box<dyn MiningObserver + Send + Sync>) {
        self.observers.push(observer);
    }

    pub fn phase_start(&self, phase: &str) {
        for o in &self.observers {
            let _ = catch_unwind(AssertUnwindSafe(|| o.on_phase_start(phase)));
        }
    }

    pub fn phase_complete(&self, phase: &str) {
        for o in &self.observers {
            let _ = catch_unwind(AssertUnwindSafe(|| o.on_phase_complete(phase)));
        }
    }

    pub fn pattern_found(&self, pattern: &Pattern) {
        for o in &self.observers {
            let _ = catch_unwind(AssertUnwindSafe(|| o.on_pattern_found(pattern)));
        }
    }

    pub fn candidate_pruned(&self, itemset: &Itemset, reason: &str) {
        for o in &self.observers {
            let _ = catch_unwind(AssertUnwindSafe(|| o.on_candidate_pruned(itemset, reason)));
        }
    }
}
