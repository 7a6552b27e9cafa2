/*
 * paulchen, a UCI-compatible chess engine
 * Copyright (C) 2024 Jasper Shovelton
 *
 * paulchen is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free
 * Software Foundation, either version 3 of the License, or (at your option)
 * any later version.
 *
 * paulchen is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
 * details.
 *
 * You should have received a copy of the GNU General Public License along
 * with paulchen. If not, see <https://www.gnu.org/licenses/>.
 */

//! The transposition table: a fixed-size, power-of-two-sized cache of
//! previously-searched positions, indexed by the low bits of the Zobrist
//! key. Owned exclusively by the search worker for the duration of a
//! search, so entries are plain (non-atomic) and simply overwritten.

use crate::board::Key;
use crate::evaluation::{is_mate, Eval};
use crate::movegen::Move;
use crate::search::Height;

/// The default table size, in mebibytes.
pub const DEFAULT_MIB: usize = 32;
/// The largest table size the `Hash` UCI option accepts, in mebibytes.
pub const MAX_MIB: usize = 4096;

/// What a stored score means relative to the window it was found in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    /// The score is exact: it is the minimax value of the node.
    Exact,
    /// The real score is at least this value (the node failed high).
    Lower,
    /// The real score is at most this value (the node failed low).
    Upper,
}

/// A cached search result.
#[derive(Clone, Copy)]
struct TranspositionEntry {
    /// The full Zobrist key, used to detect index collisions.
    key: Key,
    /// The stored score, mate-distance-adjusted to be height-independent.
    score: Eval,
    /// The best (or refutation) move found at this node, if any.
    best_move: Move,
    /// What `score` means.
    bound: Bound,
    /// The depth this entry was searched to.
    depth: i16,
}

/// A transposition table hit, with the score already adjusted back to be
/// relative to the probing node's height.
#[derive(Clone, Copy)]
pub struct TranspositionHit {
    /// The stored score, adjusted for the probing height.
    pub score: Eval,
    /// The best (or refutation) move found at this node, if any.
    pub best_move: Move,
    /// What `score` means.
    pub bound: Bound,
    /// The depth this entry was searched to.
    pub depth: i16,
}

/// Converts a score found at `height` plies from the root into a
/// height-independent value suitable for storage, so a mate found here
/// remains correct if probed again at a different height via transposition.
fn denormalise(score: Eval, height: Height) -> Eval {
    if is_mate(score) {
        if score > 0 {
            score.saturating_add(height)
        } else {
            score.saturating_sub(height)
        }
    } else {
        score
    }
}

/// The inverse of [`denormalise`]: converts a stored height-independent
/// score back into one relative to the probing node's height.
fn normalise(score: Eval, height: Height) -> Eval {
    if is_mate(score) {
        if score > 0 {
            score.saturating_sub(height)
        } else {
            score.saturating_add(height)
        }
    } else {
        score
    }
}

/// A fixed-size, open-addressed transposition table.
pub struct TranspositionTable {
    table: Vec<Option<TranspositionEntry>>,
    mask: usize,
}

impl TranspositionTable {
    /// Creates a table sized to hold roughly `mib` mebibytes of entries,
    /// rounded down to a power of two.
    #[must_use]
    pub fn with_capacity_mib(mib: usize) -> Self {
        let mut table = Self {
            table: Vec::new(),
            mask: 0,
        };
        table.resize(mib);
        table
    }

    /// Resizes the table to hold roughly `mib` mebibytes, clearing it.
    pub fn resize(&mut self, mib: usize) {
        let bytes = mib.clamp(0, MAX_MIB) * 1024 * 1024;
        let entry_size = std::mem::size_of::<TranspositionEntry>().max(1);
        let raw = (bytes / entry_size).max(1);
        let entries = if raw.is_power_of_two() {
            raw
        } else {
            (raw.next_power_of_two() / 2).max(1)
        };
        self.table = vec![None; entries];
        self.mask = entries - 1;
    }

    /// Discards every stored entry without resizing.
    pub fn clear(&mut self) {
        self.table.iter_mut().for_each(|slot| *slot = None);
    }

    /// Maps `key` to a slot index.
    fn index(&self, key: Key) -> usize {
        (key as usize) & self.mask
    }

    /// Probes the table for `key`, returning a hit only if the stored key
    /// matches exactly (a mismatch is a collision, not an error: the slot
    /// may hold an entry for a different position entirely).
    #[must_use]
    pub fn load(&self, key: Key, height: Height) -> Option<TranspositionHit> {
        let entry = (*self.table.get(self.index(key))?)?;
        if entry.key != key {
            return None;
        }
        Some(TranspositionHit {
            score: normalise(entry.score, height),
            best_move: entry.best_move,
            bound: entry.bound,
            depth: entry.depth,
        })
    }

    /// Stores a search result, unconditionally replacing whatever was in
    /// the slot.
    pub fn store(
        &mut self,
        key: Key,
        score: Eval,
        best_move: Move,
        bound: Bound,
        depth: i16,
        height: Height,
    ) {
        let index = self.index(key);
        if let Some(slot) = self.table.get_mut(index) {
            *slot = Some(TranspositionEntry {
                key,
                score: denormalise(score, height),
                best_move,
                bound,
                depth,
            });
        }
    }

    /// Estimates how full the table is, in permille (0..=1000), as reported
    /// by the UCI `info hashfull` field, by sampling the first 1000 slots.
    #[must_use]
    pub fn estimate_hashfull(&self) -> u32 {
        let sample = self.table.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let filled = self.table[..sample].iter().filter(|e| e.is_some()).count();
        (filled * 1000 / sample) as u32
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::with_capacity_mib(DEFAULT_MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::{Bound, TranspositionTable};
    use crate::movegen::Move;

    #[test]
    fn round_trips_a_stored_entry() {
        let mut tt = TranspositionTable::with_capacity_mib(1);
        let mv = Move::new(crate::defs::Square::E2, crate::defs::Square::E4);
        tt.store(0xdead_beef, 123, mv, Bound::Exact, 4, 0);
        let hit = tt.load(0xdead_beef, 0).expect("entry was just stored");
        assert_eq!(hit.score, 123);
        assert_eq!(hit.best_move, mv);
        assert_eq!(hit.depth, 4);
    }

    #[test]
    fn colliding_key_misses() {
        // A single-entry table: key 2 maps to the same slot key 1 just
        // wrote, but isn't the same key, so the probe must miss.
        let mut tt = TranspositionTable::with_capacity_mib(0);
        let mv = Move::new(crate::defs::Square::E2, crate::defs::Square::E4);
        tt.store(1, 10, mv, Bound::Exact, 1, 0);
        assert!(tt.load(2, 0).is_none());
    }
}
