//! Line-oriented parser/formatter for the uncertain-transaction text format
//! described in `SPEC_FULL.md` §4.8 and §6, and the `UncertainDatabase`
//! external-collaborator contract the engine is built against.

use std::collections::BTreeMap;

use crate::error::{MiningError, Result};
use crate::itemset::Itemset;
use crate::store::VerticalStore;
use crate::tidset::Tidset;
use crate::vocabulary::Vocabulary;

/// A fully loaded, sealed uncertain transaction database: a vocabulary plus
/// a vertical store of per-item tidsets, ready for mining.
pub struct UncertainDatabase {
    vocabulary: Vocabulary,
    store: VerticalStore,
    size: usize,
}

impl UncertainDatabase {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn store(&self) -> &VerticalStore {
        &self.store
    }

    pub fn tidset_for(&self, itemset: &Itemset) -> Result<Tidset> {
        self.store.tidset_for_itemset(itemset)
    }
}

fn looks_like_header(line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.len() == 2
        && tokens.iter().all(|t| !t.contains(':') && t.parse::<u64>().is_ok())
}

/// Parse the line-oriented grammar: an optional two-integer header line,
/// then one `<tid> <item>:<prob> <item>:<prob> ...` line per transaction.
/// Blank/whitespace-only lines and lines whose leading token is not an
/// integer are skipped silently. A malformed `item:prob` token is skipped
/// on its own (the rest of that line is still honored); a negative or
/// repeated tid is a hard [`crate::error::MiningError::InvalidTid`], since
/// tid identity is load-bearing rather than cosmetic.
pub fn parse_database(text: &str) -> Result<UncertainDatabase> {
    let mut vocabulary = Vocabulary::new();
    let mut store = VerticalStore::new();
    let mut size = 0usize;

    let mut lines = text.lines().peekable();
    if let Some(first) = lines.peek() {
        if looks_like_header(first) {
            lines.next();
        }
    }

    for line in lines {
        let mut tokens = line.split_whitespace();
        let tid_token = match tokens.next() {
            Some(t) => t,
            None => continue, // blank or all-whitespace line
        };
        // Parse as i64 first so a negative tid is distinguishable from a
        // genuinely unparseable leading token: the former is a hard error
        // (tid identity is load-bearing), the latter just skips the line.
        let tid: u64 = match tid_token.parse::<i64>() {
            Ok(t) if t < 0 => return Err(MiningError::InvalidTid { tid: t }),
            Ok(t) => t as u64,
            Err(_) => continue,
        };

        for token in tokens {
            let (name, prob_str) = match token.split_once(':') {
                Some(parts) => parts,
                None => continue, // malformed item spec: skip just this token
            };
            let prob: f64 = match prob_str.parse() {
                Ok(p) => p,
                Err(_) => continue,
            };
            if !prob.is_finite() || !(0.0..=1.0).contains(&prob) {
                continue;
            }
            let item_id = vocabulary.intern(name);
            store.add(tid, item_id, prob)?;
        }

        size += 1;
    }

    store.seal();
    Ok(UncertainDatabase {
        vocabulary,
        store,
        size,
    })
}

/// Render a database back to the grammar `parse_database` accepts. Used by
/// round-trip tests (`SPEC_FULL.md` §8 property 9); item order within a
/// line is by ascending item id for determinism.
pub fn format_database(db: &UncertainDatabase) -> String {
    let mut by_tid: BTreeMap<u64, Vec<(u32, f64)>> = BTreeMap::new();
    for id in db.vocabulary.ids() {
        if let Ok(tidset) = db.store.tidset_for_item(id) {
            for entry in tidset.iter() {
                by_tid.entry(entry.tid).or_default().push((id, entry.prob));
            }
        }
    }

    let mut out = String::new();
    for (tid, mut items) in by_tid {
        items.sort_by_key(|(id, _)| *id);
        out.push_str(&tid.to_string());
        for (id, prob) in items {
            out.push(' ');
            out.push_str(db.vocabulary.name(id));
            out.push(':');
            out.push_str(&prob.to_string());
        }
        out.push('\n');
    }
    out
}
