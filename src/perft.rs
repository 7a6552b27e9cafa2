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

//! Move generator correctness testing: counting leaf nodes of the full game
//! tree to a fixed depth and comparing against known-correct totals.

use std::time::Instant;

use crate::board::Board;
use crate::movegen::{generate_moves, AllMoves, Moves};

/// Counts the number of legal move sequences of length `depth` from `board`.
#[must_use]
pub fn perft(board: &Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = Moves::new();
    generate_moves::<AllMoves>(board, &mut moves);

    if depth == 1 {
        return moves
            .iter()
            .filter(|scored| {
                let mut after = *board;
                after.make_move(scored.mv)
            })
            .count() as u64;
    }

    moves
        .iter()
        .map(|scored| {
            let mut after = *board;
            if after.make_move(scored.mv) {
                perft(&after, depth - 1)
            } else {
                0
            }
        })
        .sum()
}

/// Runs [`perft`] on `board` at `depth`, printing the standard `go perft`
/// per-move breakdown followed by the total node count and elapsed time.
pub fn divide(board: &Board, depth: u8) {
    let mut moves = Moves::new();
    generate_moves::<AllMoves>(board, &mut moves);

    let start = Instant::now();
    let mut total = 0u64;

    for scored in moves.iter() {
        let mut after = *board;
        if !after.make_move(scored.mv) {
            continue;
        }
        let count = if depth == 0 { 1 } else { perft(&after, depth - 1) };
        total += count;
        println!("{}: {count}", scored.mv);
    }

    let elapsed = start.elapsed();
    println!();
    println!("nodes searched: {total}");
    println!("time: {:.3}s", elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::perft;
    use crate::board::Board;

    #[test]
    fn startpos_perft_counts() {
        let board = Board::default();
        assert_eq!(perft(&board, 1), 20);
        assert_eq!(perft(&board, 2), 400);
        assert_eq!(perft(&board, 3), 8902);
    }

    #[test]
    fn kiwipete_perft_depth_one() {
        let board: Board = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
            .parse()
            .expect("valid kiwipete fen");
        assert_eq!(perft(&board, 1), 48);
    }

    /// An en-passant capture that would otherwise expose the king to a
    /// discovered rank attack: the a5 pawn may not take b5's pawn en passant
    /// because removing both pawns from rank 5 opens the rook on h5 onto the
    /// king on a5.
    #[test]
    fn pinned_pawn_en_passant_discovered_check() {
        let board: Board = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"
            .parse()
            .expect("valid en passant pin fen");
        assert_eq!(perft(&board, 5), 674_624);
    }
}
