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

//! Aspiration windows: re-searching a shallow guess of the score with a
//! narrow window around it, widening on either side when the search proves
//! the guess wrong, instead of always searching the full `(-INF, +INF)`
//! window.

use crate::evaluation::{Eval, INF_EVAL};
use crate::search::{Depth, Pv, RootNode, SearchStatus, Worker};

/// The initial half-width of the aspiration window around the previous
/// iteration's score.
const INITIAL_MARGIN: Eval = 30;

/// Searches at `depth` using an aspiration window seeded from `previous_score`,
/// widening and re-searching on fail-low/fail-high until the true score is
/// bracketed (or the window has widened to the full range). Returns the
/// score and writes the root PV to `pv`.
pub fn aspiration_search(worker: &mut Worker<'_>, depth: Depth, previous_score: Eval, pv: &mut Pv) -> Eval {
    let mut margin = INITIAL_MARGIN;
    let mut alpha = previous_score.saturating_sub(margin).max(-INF_EVAL);
    let mut beta = previous_score.saturating_add(margin).min(INF_EVAL);

    loop {
        let score = crate::search::alpha_beta::search::<RootNode>(worker, alpha, beta, depth, 0, pv);

        if worker.check_status() != SearchStatus::Continue {
            return score;
        }

        if score <= alpha {
            beta = (alpha + beta) / 2;
            alpha = score.saturating_sub(margin).max(-INF_EVAL);
        } else if score >= beta {
            beta = score.saturating_add(margin).min(INF_EVAL);
        } else {
            return score;
        }

        margin = margin.saturating_mul(2);
        if alpha <= -INF_EVAL && beta >= INF_EVAL {
            return crate::search::alpha_beta::search::<RootNode>(worker, -INF_EVAL, INF_EVAL, depth, 0, pv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::aspiration_search;
    use crate::board::Board;
    use crate::search::{Pv, SharedState, Worker};
    use crate::transposition_table::TranspositionTable;

    #[test]
    fn aspiration_search_finds_a_legal_move_at_depth_one() {
        let mut tt = TranspositionTable::with_capacity_mib(1);
        let mut worker = Worker::new(&mut tt, SharedState::default()).with_board(Board::default());
        let mut pv = Pv::default();
        aspiration_search(&mut worker, 1, 0, &mut pv);
        assert!(pv.best_move().is_some());
    }
}
