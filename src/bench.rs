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

//! A fixed-depth, fixed-position search benchmark: a single deterministic
//! total node count and time, used to sanity-check a build (and, across
//! commits, spot search regressions) the way OpenBench-style testing
//! frameworks expect a `bench` command to behave.

use std::time::Instant;

use crate::board::Board;
use crate::search::{Limits, SharedState, Worker};
use crate::transposition_table::TranspositionTable;

/// The depth every bench position is searched to.
const BENCH_DEPTH: i16 = 8;

/// A representative handful of positions: the startpos, a few tactical and
/// endgame-ish middlegames, and a position with no legal castling, enough to
/// exercise most of the search without taking long to run.
const BENCH_POSITIONS: [&str; 8] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "2kr3r/p1ppqpb1/bn2Qnp1/3PN3/1p2P3/2N5/PPPBBPPP/R3K2R b KQ - 3 2",
    "rnb2k1r/pp1Pbppp/2p5/q7/2B5/8/PPPQNnPP/RNB1K2R w KQ - 3 9",
];

/// Runs a fixed-depth search on every [`BENCH_POSITIONS`] entry and prints
/// the total node count, elapsed time and nodes-per-second.
pub fn bench() {
    let start = Instant::now();
    let mut total_nodes = 0u64;

    for fen in BENCH_POSITIONS {
        let board: Board = fen.parse().unwrap_or_else(|_| panic!("bench fen `{fen}` must be valid"));
        let mut tt = TranspositionTable::with_capacity_mib(16);
        let mut worker = Worker::new(&mut tt, SharedState::default())
            .with_board(board)
            .with_printing(false)
            .with_limits(Limits::Depth(BENCH_DEPTH));
        worker.start_search();
        total_nodes += worker.nodes();
    }

    let elapsed = start.elapsed();
    let nps = if elapsed.as_millis() == 0 {
        0
    } else {
        u128::from(total_nodes) * 1000 / elapsed.as_millis()
    };

    println!("{total_nodes} nodes {nps} nps");
}
