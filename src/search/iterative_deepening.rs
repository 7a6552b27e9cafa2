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

//! The iterative-deepening driver: searches depth 1, 2, 3, ... until the
//! time/depth/node budget runs out, always keeping the last *completed*
//! iteration's move as the answer.

use crate::evaluation::{Eval, DRAW, INF_EVAL};
use crate::movegen::Move;
use crate::search::{alpha_beta, aspiration, time, Depth, Limits, Pv, RootNode, SearchStatus, Worker, MAX_DEPTH};

/// Drives iterative deepening on `worker`, starting from whatever board and
/// limits it was configured with. Returns the best move found, or
/// [`Move::NULL`] if even depth 1 did not complete.
pub fn iterative_deepening(worker: &mut Worker<'_>) -> Move {
    let time_window = match worker.limits() {
        Limits::Timed { time, inc, moves_to_go } => {
            let window = time::calculate_time_window(time, inc, moves_to_go, worker.move_overhead());
            worker.set_deadline(Some(window.max_think));
            Some(window)
        }
        Limits::Movetime(budget) => {
            worker.set_deadline(Some(budget.saturating_sub(worker.move_overhead())));
            None
        }
        Limits::Depth(_) | Limits::Nodes(_) | Limits::Infinite => {
            worker.set_deadline(None);
            None
        }
    };

    let max_depth = match worker.limits() {
        Limits::Depth(d) => d.min(MAX_DEPTH - 1),
        _ => MAX_DEPTH - 1,
    };

    let mut best_move = Move::NULL;
    let mut score: Eval = DRAW;
    let mut pv = Pv::default();
    let mut depth: Depth = 1;

    while depth <= max_depth {
        let previous_score = score;
        let iteration_score = if depth == 1 {
            alpha_beta::search::<RootNode>(worker, -INF_EVAL, INF_EVAL, depth, 0, &mut pv)
        } else {
            aspiration::aspiration_search(worker, depth, score, &mut pv)
        };

        let status = worker.check_status();

        if let Some(mv) = pv.best_move() {
            best_move = mv;
            score = iteration_score;
            worker.set_root_pv(pv);
            if status == SearchStatus::Continue {
                worker.print_report(depth, score);
            }
        }

        if status != SearchStatus::Continue {
            break;
        }

        if let Some(window) = time_window {
            // A score that just dropped sharply is usually a tactic still
            // being resolved; buy a bit more time before committing.
            if depth > 1 && iteration_score + 50 < previous_score {
                let extended = time::extend(window.max_think, worker.elapsed_time(), window.usable);
                worker.set_deadline(Some(extended));
            }

            if should_stop_between_iterations(worker, window.min_think) {
                break;
            }
        }

        depth += 1;
    }

    best_move
}

/// Returns `true` if iterative deepening should not start another
/// iteration: once past `min_think`, a new iteration is only worth starting
/// if there is a reasonable chance of finishing it, which a fixed fraction
/// of the elapsed time approximates well enough in practice.
fn should_stop_between_iterations(worker: &Worker<'_>, min_think: std::time::Duration) -> bool {
    worker.elapsed_time() >= min_think
}

#[cfg(test)]
mod tests {
    use super::iterative_deepening;
    use crate::board::Board;
    use crate::movegen::Move;
    use crate::search::{Limits, SharedState, Worker};
    use crate::transposition_table::TranspositionTable;

    #[test]
    fn finds_a_move_at_a_fixed_depth() {
        let mut tt = TranspositionTable::with_capacity_mib(1);
        let mut worker = Worker::new(&mut tt, SharedState::default())
            .with_board(Board::default())
            .with_printing(false)
            .with_limits(Limits::Depth(3));
        let best = iterative_deepening(&mut worker);
        assert_ne!(best, Move::NULL);
    }
}
