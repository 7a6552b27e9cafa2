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

//! The negamax/alpha-beta core: principal-variation search over a
//! transposition table, with null-move pruning, razoring, reverse futility,
//! per-move futility pruning and late move reductions, bottoming out in
//! quiescence search.

use crate::board::Board;
use crate::defs::PieceType;
use crate::evaluation::{evaluate, mate_in, mated_in, Eval, DRAW, INF_EVAL};
use crate::movegen::{AllMoves, CapturesOnly, Evasions, Move};
use crate::search::movepick::MovePicker;
use crate::search::{Depth, Height, Node, Pv, SearchStatus, Worker, MAX_DEPTH};
use crate::transposition_table::Bound;

/// Depths at or below this use razoring/reverse-futility/futility pruning;
/// beyond it the margins would rarely pay for the extra branch.
const LOW_DEPTH: Depth = 7;

/// `razor_margin[depth]`: `200 + 200 * depth`.
fn razor_margin(depth: Depth) -> Eval {
    200 + 200 * depth
}

/// `reverse_razor[depth]` (a.k.a. static null move margin): `120 * depth`.
fn reverse_razor_margin(depth: Depth) -> Eval {
    120 * depth
}

/// Per-move futility margin: `100 + 80 * depth`.
fn futility_margin(depth: Depth) -> Eval {
    100 + 80 * depth
}

/// Delta-pruning margin used in quiescence search.
const QS_DELTA_MARGIN: Eval = 200;

/// Null-move reduction: deeper searches reduce more, capped so the
/// verification search at `depth - R` is never negative.
fn null_move_reduction(depth: Depth) -> Depth {
    (3 + depth / 6).min(depth)
}

/// Late move reduction, replacing a precomputed table with a direct
/// logarithmic formula (the common `a + ln(depth) * ln(move_index) / b`
/// shape): moves searched very early, or at shallow depth, are never
/// reduced.
fn lmr_reduction(depth: Depth, move_index: usize) -> Depth {
    if depth < 3 || move_index < 2 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let d = f64::from(depth).ln();
    #[allow(clippy::cast_precision_loss)]
    let m = (move_index as f64).ln();
    let reduction = 0.77 + d * m / 2.36;
    #[allow(clippy::cast_possible_truncation)]
    let reduction = reduction as Depth;
    reduction.clamp(0, depth - 1)
}

/// Returns `true` if `mv` is "interesting" and so exempt from futility/LMR:
/// a promotion, a capture, or a check. `previous` is the board before `mv`,
/// `after` the board it produced.
fn is_interesting(previous: &Board, after: &Board, mv: Move) -> bool {
    mv.is_promotion() || !previous.is_quiet(mv) || after.is_in_check()
}

/// Runs the negamax search for `height` plies below the root, to
/// `leftover_depth` plies remaining, inside the window `(alpha, beta)`.
/// Writes the principal variation found (if any) to `pv`.
pub fn search<N: Node>(
    worker: &mut Worker<'_>,
    mut alpha: Eval,
    mut beta: Eval,
    mut leftover_depth: Depth,
    height: Height,
    pv: &mut Pv,
) -> Eval {
    pv.clear();

    if worker.check_status() != SearchStatus::Continue && !N::IS_ROOT {
        return 0;
    }

    if !N::IS_ROOT {
        if worker.is_draw() {
            return DRAW;
        }

        // Mate distance pruning: a mate found any shallower than `height`
        // cannot improve on a shorter mate already guaranteed/avoided by
        // the window.
        alpha = alpha.max(mated_in(height));
        beta = beta.min(mate_in(height + 1));
        if alpha >= beta {
            return alpha;
        }
    }

    if leftover_depth <= 0 {
        return quiescence_search(worker, alpha, beta, height);
    }

    if height >= MAX_DEPTH - 1 {
        return evaluate(worker.board());
    }

    let key = worker.board().key();
    let tt_hit = worker.tt_mut().load(key, height);
    if let Some(hit) = &tt_hit {
        if !N::IS_PV && hit.depth >= leftover_depth {
            match hit.bound {
                Bound::Exact => return hit.score,
                Bound::Lower if hit.score >= beta => return hit.score,
                Bound::Upper if hit.score <= alpha => return hit.score,
                _ => {}
            }
        }
    }
    let tt_move = tt_hit.as_ref().map(|hit| hit.best_move).filter(|&m| m != Move::NULL);

    let in_check = worker.board().is_in_check();
    let static_eval = evaluate(worker.board());

    if !N::IS_PV && !in_check {
        if leftover_depth <= LOW_DEPTH && static_eval + razor_margin(leftover_depth) <= alpha {
            let score = quiescence_search(worker, alpha, alpha + 1, height);
            if score <= alpha {
                return score;
            }
        }

        if leftover_depth <= LOW_DEPTH
            && has_non_pawn_material(worker.board())
            && static_eval - reverse_razor_margin(leftover_depth) > beta
        {
            return beta;
        }

        if has_non_pawn_material(worker.board()) && static_eval >= beta {
            let reduction = null_move_reduction(leftover_depth);
            let previous = worker.make_null_move();
            let mut child_pv = Pv::default();
            let score = -search::<N::Next>(
                worker,
                -beta,
                -beta + 1,
                leftover_depth - reduction - 1,
                height + 1,
                &mut child_pv,
            );
            worker.unmake_null_move(previous);
            if score >= beta {
                return beta;
            }
        }
    }

    let mut depth_adjust = 0;
    if in_check {
        depth_adjust += 1;
    }
    if N::IS_PV && leftover_depth > 1 && tt_hit.is_none() {
        depth_adjust -= 1;
    }
    leftover_depth += depth_adjust;
    if leftover_depth <= 0 {
        leftover_depth = 1;
    }

    let killers = worker.histories.killers(height);
    // Always generate the full move set here, in check or not: `Evasions`
    // only yields king moves and captures of the checker, never a quiet
    // interposition by a non-king piece, which is a legal (and sometimes the
    // only legal) reply to a slider check. `Evasions` is only correct in
    // quiescence search below, which never considers quiet moves at all.
    let mut picker = MovePicker::new::<AllMoves>(&worker.board, tt_move, killers, &worker.histories);

    let mut best_score = -INF_EVAL;
    let mut best_move = Move::NULL;
    let mut bound = Bound::Upper;
    let mut move_index = 0usize;
    let mut quiets_tried: Vec<Move> = Vec::new();
    let mut child_pv = Pv::default();
    let mut legal_moves = 0u32;

    while let Some(mv) = picker.next() {
        let Some(previous) = worker.make_move(mv) else {
            continue;
        };
        legal_moves += 1;
        worker.increment_nodes();
        worker.note_seldepth(height + 1);

        let quiet = previous.is_quiet(mv);
        let interesting = is_interesting(&previous, worker.board(), mv);

        if !N::IS_PV
            && legal_moves > 1
            && leftover_depth <= LOW_DEPTH
            && !interesting
            && static_eval + futility_margin(leftover_depth) < alpha
        {
            worker.unmake_move(previous);
            move_index += 1;
            continue;
        }

        let mut score;
        if move_index == 0 {
            score = -search::<N::Next>(worker, -beta, -alpha, leftover_depth - 1, height + 1, &mut child_pv);
        } else {
            let reduction = if quiet && !interesting && !in_check {
                lmr_reduction(leftover_depth, move_index)
            } else {
                0
            };

            score = -search::<crate::search::NonPvNode>(
                worker,
                -alpha - 1,
                -alpha,
                leftover_depth - reduction - 1,
                height + 1,
                &mut child_pv,
            );

            if score > alpha && reduction > 0 {
                score = -search::<crate::search::NonPvNode>(
                    worker,
                    -alpha - 1,
                    -alpha,
                    leftover_depth - 1,
                    height + 1,
                    &mut child_pv,
                );
            }

            if score > alpha && N::IS_PV {
                score = -search::<N::Next>(worker, -beta, -alpha, leftover_depth - 1, height + 1, &mut child_pv);
            }
        }

        worker.unmake_move(previous);

        if quiet {
            quiets_tried.push(mv);
        }
        move_index += 1;

        if worker.check_status() != SearchStatus::Continue {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = mv;

            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
                pv.update(mv, &child_pv);

                if alpha >= beta {
                    bound = Bound::Lower;
                    if quiet {
                        worker.histories_mut().record_killer(height, mv);
                        let side = worker.board().side_to_move();
                        worker.histories_mut().update(side, mv, &quiets_tried, leftover_depth);
                    }
                    break;
                }
            }
        }
    }

    if legal_moves == 0 {
        return if in_check { mated_in(height) } else { DRAW };
    }

    worker
        .tt_mut()
        .store(key, best_score, best_move, bound, leftover_depth, height);

    best_score
}

/// Extends the leaf position with captures, promotions and (if in check)
/// evasions, until a quiet position is reached.
pub fn quiescence_search(worker: &mut Worker<'_>, mut alpha: Eval, beta: Eval, height: Height) -> Eval {
    if worker.check_status() != SearchStatus::Continue {
        return 0;
    }
    worker.note_seldepth(height);

    if worker.is_draw() {
        return DRAW;
    }
    if height >= crate::search::MAX_DEPTH {
        return evaluate(worker.board());
    }

    let in_check = worker.board().is_in_check();
    let mut best_score = -INF_EVAL;

    if !in_check {
        let static_eval = evaluate(worker.board());
        best_score = static_eval;
        if static_eval >= beta {
            return static_eval;
        }
        alpha = alpha.max(static_eval);
    }

    let key = worker.board().key();
    if let Some(hit) = worker.tt_mut().load(key, height) {
        match hit.bound {
            Bound::Exact => return hit.score,
            Bound::Lower if hit.score >= beta => return hit.score,
            Bound::Upper if hit.score <= alpha => return hit.score,
            _ => {}
        }
    }

    let no_killers = [Move::NULL; 2];
    let mut picker = if in_check {
        MovePicker::new::<Evasions>(&worker.board, None, no_killers, &worker.histories)
    } else {
        MovePicker::new::<CapturesOnly>(&worker.board, None, no_killers, &worker.histories)
    };

    let mut searched_any = false;
    while let Some(mv) = picker.next() {
        if !in_check && !worker.board().see_ge(mv, 0) {
            continue;
        }
        if !in_check {
            let static_eval = evaluate(worker.board());
            if static_eval + QS_DELTA_MARGIN < alpha && !mv.is_promotion() {
                continue;
            }
        }

        let Some(previous) = worker.make_move(mv) else {
            continue;
        };
        searched_any = true;
        worker.increment_nodes();
        let score = -quiescence_search(worker, -beta, -alpha, height + 1);
        worker.unmake_move(previous);

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    return alpha;
                }
            }
        }
    }

    if in_check && !searched_any {
        return mated_in(height);
    }

    best_score
}

/// Returns `true` if the side to move has at least one piece other than
/// pawns and king, the usual precondition for null-move pruning (to avoid
/// zugzwang positions where passing is illegal in spirit).
fn has_non_pawn_material(board: &Board) -> bool {
    let us = board.side_to_move();
    let non_pawns = board.piece_any(PieceType::KNIGHT)
        | board.piece_any(PieceType::BISHOP)
        | board.piece_any(PieceType::ROOK)
        | board.piece_any(PieceType::QUEEN);
    !(non_pawns & board.side_any(us)).is_empty()
}
