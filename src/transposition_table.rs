use log::trace;
use parking_lot::Mutex;

use std::collections::hash_map::{Entry, HashMap};
use std::sync::Arc;

use crate::{
    bitboard::Position,
    heuristic::Score,
    symmetry::{mirror_board, mirror_move},
};

/// How a cached score relates to the true value of its position
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Bound {
    /// The score is the value of the position at the stored depth
    Exact,
    /// The true value is at least the score
    LowerBound,
    /// The true value is at most the score
    UpperBound,
}

impl Bound {
    /// Classifies a search result against the window it was searched with
    pub fn classify(score: Score, alpha: Score, beta: Score) -> Self {
        if score <= alpha {
            Bound::UpperBound
        } else if score >= beta {
            Bound::LowerBound
        } else {
            Bound::Exact
        }
    }
}

/// A cached search result
///
/// The boards are kept alongside the result so that a hash collision can be
/// told apart from a genuine hit.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct TTEntry {
    pub red: u64,
    pub yellow: u64,
    /// Remaining search depth the score was computed with
    pub depth: u32,
    pub score: Score,
    pub flag: Bound,
    pub best_move: Option<usize>,
}

impl TTEntry {
    /// Whether the stored boards are exactly those of `position`
    pub fn matches(&self, position: &Position) -> bool {
        self.red == position.red() && self.yellow == position.yellow()
    }

    /// An entry may only answer a query for the same boards at a strictly shallower depth
    pub fn is_usable_for(&self, position: &Position, depth: u32) -> bool {
        self.matches(position) && self.depth > depth
    }

    /// The same result expressed for the reflected position
    pub fn mirrored(&self) -> Self {
        Self {
            red: mirror_board(self.red),
            yellow: mirror_board(self.yellow),
            best_move: mirror_move(self.best_move),
            ..*self
        }
    }
}

/// What happens when a result is written for a hash that already has an entry
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ReplacementPolicy {
    /// Existing entries are never replaced
    FirstWriterWins,
    /// An existing entry is replaced by one searched at least as deep
    #[default]
    ReplaceIfNotShallower,
}

/// A map from Zobrist hash to cached search results
///
/// Cloning the table is cheap and the clones share the same entries, so one
/// table can be handed to several solvers and worker threads. Every read and
/// write takes the single lock, nothing spans a read followed by a write.
#[derive(Clone)]
pub struct TranspositionTable {
    entries: Arc<Mutex<HashMap<u64, TTEntry>>>,
    policy: ReplacementPolicy,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::with_policy(ReplacementPolicy::default())
    }

    pub fn with_policy(policy: ReplacementPolicy) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            policy,
        }
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    pub fn read(&self, key: u64) -> Option<TTEntry> {
        self.entries.lock().get(&key).copied()
    }

    /// Looks up a position, falling back to its mirror image
    ///
    /// A hit on the mirror is translated back into the orientation of
    /// `position`, so the caller never has to care which one was stored.
    pub fn read_or_mirror(&self, position: &Position, mirrored: &Position) -> Option<TTEntry> {
        if let Some(entry) = self.read(position.hash()) {
            return Some(entry);
        }
        self.read(mirrored.hash()).map(|entry| entry.mirrored())
    }

    /// Stores an entry subject to the replacement policy, returning whether it was stored
    pub fn write(&self, key: u64, entry: TTEntry) -> bool {
        let mut entries = self.entries.lock();
        match entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            Entry::Occupied(mut slot) => match self.policy {
                ReplacementPolicy::ReplaceIfNotShallower if entry.depth >= slot.get().depth => {
                    slot.insert(entry);
                    true
                }
                _ => {
                    trace!(
                        "kept entry for {:#018x} at depth {}, rejected depth {}",
                        key,
                        slot.get().depth,
                        entry.depth
                    );
                    false
                }
            },
        }
    }

    /// Stores an entry regardless of the replacement policy
    pub fn overwrite(&self, key: u64, entry: TTEntry) {
        self.entries.lock().insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every entry, for all clones of this table
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
