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

//! The UCI front end: reads commands from stdin on the main thread, and runs
//! each search on its own worker thread so `stop`/`quit`/`isready` are never
//! blocked behind a long think. The transposition table has a single writer
//! at any moment: its ownership moves into the search thread for the
//! duration of a search and comes back over a channel once the thread exits.

use std::io::{self, BufRead};
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::board::{Board, Key};
use crate::movegen::Move;
use crate::search::{Limits, SharedState, Worker};
use crate::transposition_table::TranspositionTable;

pub mod uci;

use uci::{Command, GoParams, UciOptions};

/// A running search: the thread it's on, plus the stop/quit flags it reads.
struct ActiveSearch {
    handle: JoinHandle<TranspositionTable>,
    shared: SharedState,
}

/// Owns the engine's persistent state between UCI commands: the current
/// position, the transposition table (when no search holds it), and the
/// options set via `setoption`.
pub struct Engine {
    /// The current position, as set by `position` and advanced by `go`.
    board: Board,
    /// Keys of positions reached earlier in the game, for repetition
    /// detection across the whole game rather than just the current search.
    history_keys: Vec<Key>,
    /// The transposition table, when no search currently holds it.
    tt: Option<TranspositionTable>,
    /// The options set so far via `setoption`.
    options: UciOptions,
    /// The currently running search, if any.
    search: Option<ActiveSearch>,
    /// Whether `debug on` has been sent, enabling extra `info string` output.
    debug: bool,
}

impl Default for Engine {
    fn default() -> Self {
        let options = UciOptions::default();
        Self {
            board: Board::default(),
            history_keys: Vec::new(),
            tt: Some(TranspositionTable::with_capacity_mib(options.hash_mib)),
            options,
            search: None,
            debug: false,
        }
    }
}

impl Engine {
    /// Creates a new engine at the standard starting position.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads commands from stdin until `quit` or end of input, dispatching
    /// each to [`Self::handle_command`].
    pub fn main_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if self.handle_command(uci::parse_command(&line)) {
                break;
            }
        }
        self.join_search();
    }

    /// Executes one command. Returns `true` if the main loop should exit.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Uci => {
                println!("id name paulchen");
                println!("id author Jasper Shovelton");
                UciOptions::print_declarations();
                println!("uciok");
            }
            Command::Debug(on) => self.debug = on,
            Command::IsReady => println!("readyok"),
            Command::SetOption { name, value } => self.handle_setoption(&name, value.as_deref()),
            Command::UciNewGame => self.new_game(),
            Command::Position { fen, moves } => self.set_position(fen.as_deref(), &moves),
            Command::Go(params) => self.go(params),
            Command::Stop => self.stop(),
            Command::PonderHit => {}
            Command::Quit => {
                self.stop();
                return true;
            }
            Command::Unknown(line) => {
                if self.debug {
                    warn!("unrecognised command: {line}");
                }
            }
        }
        false
    }

    fn handle_setoption(&mut self, name: &str, value: Option<&str>) {
        let Some(value) = value else {
            warn!("setoption `{name}` has no value");
            return;
        };
        if let Err(error) = self.options.set(name, value) {
            warn!("{error}");
            return;
        }
        if name == "Hash" {
            if let Some(tt) = &mut self.tt {
                tt.resize(self.options.hash_mib);
            }
        }
    }

    /// Resets the transposition table and game history for a new game.
    fn new_game(&mut self) {
        self.stop();
        if let Some(tt) = &mut self.tt {
            tt.clear();
        }
        self.history_keys.clear();
        self.board = Board::default();
    }

    /// Replays `fen` (or the startpos) followed by `moves`, recording every
    /// intermediate position's key for repetition detection.
    fn set_position(&mut self, fen: Option<&str>, moves: &[String]) {
        self.stop();

        let mut board = match fen {
            Some(fen) => match fen.parse::<Board>() {
                Ok(board) => board,
                Err(error) => {
                    warn!("invalid fen: {error}");
                    return;
                }
            },
            None => Board::default(),
        };

        let mut history_keys = vec![board.key()];
        for token in moves {
            match uci::parse_uci_move(&board, token) {
                Ok(mv) => {
                    board.make_move(mv);
                    history_keys.push(board.key());
                }
                Err(error) => {
                    warn!("illegal move in position command: {error}");
                    break;
                }
            }
        }

        self.board = board;
        self.history_keys = history_keys;
    }

    /// Starts a search on its own thread, taking ownership of the
    /// transposition table until the search finishes.
    fn go(&mut self, params: GoParams) {
        self.join_search();

        let Some(tt) = self.tt.take() else {
            warn!("search already running");
            return;
        };

        let shared = SharedState::default();
        let board = self.board;
        let history_keys = self.history_keys.clone();
        let limits = build_limits(&params, board);
        let move_overhead = Duration::from_millis(10);
        let shared_for_thread = shared.clone();

        let handle = thread::spawn(move || {
            let mut tt = tt;
            let mut worker = Worker::new(&mut tt, shared_for_thread)
                .with_board(board)
                .with_limits(limits)
                .with_move_overhead(move_overhead);
            let prior_keys = &history_keys[..history_keys.len().saturating_sub(1)];
            for &key in prior_keys {
                worker.push_game_move(key);
            }

            let best_move = worker.start_search();
            print_bestmove(best_move);
            tt
        });

        self.search = Some(ActiveSearch { handle, shared });
    }

    /// Signals the running search (if any) to stop.
    fn stop(&mut self) {
        if let Some(search) = &self.search {
            search.shared.stop.store(true, Ordering::Relaxed);
        }
        self.join_search();
    }

    /// Blocks until the current search finishes and reclaims the
    /// transposition table.
    fn join_search(&mut self) {
        if let Some(search) = self.search.take() {
            if let Ok(tt) = search.handle.join() {
                self.tt = Some(tt);
            }
        }
    }
}

/// Builds search [`Limits`] from a parsed `go` command, resolving the
/// side-relative `wtime`/`btime`/`winc`/`binc` fields against the board's
/// side to move.
fn build_limits(params: &GoParams, board: Board) -> Limits {
    if let Some(depth) = params.depth {
        return Limits::Depth(depth);
    }
    if let Some(nodes) = params.nodes {
        return Limits::Nodes(nodes);
    }
    if let Some(movetime) = params.movetime {
        return Limits::Movetime(movetime);
    }
    if params.infinite {
        return Limits::Infinite;
    }

    let (time, inc) = if board.side_to_move() == crate::defs::Side::WHITE {
        (params.wtime, params.winc)
    } else {
        (params.btime, params.binc)
    };

    let Some(time) = time else {
        return Limits::Infinite;
    };

    let mut limits = Limits::new_timed(time);
    if let Some(inc) = inc {
        limits.set_inc(inc);
    }
    if let Some(moves_to_go) = params.movestogo {
        limits.set_moves_to_go(moves_to_go);
    }
    limits
}

/// Prints the UCI `bestmove` line, or `0000` if no move was found (e.g. the
/// search was stopped before depth 1 completed).
fn print_bestmove(mv: Move) {
    if mv == Move::NULL {
        println!("bestmove 0000");
    } else {
        println!("bestmove {mv}");
    }
    info!("bestmove {mv}");
}

#[cfg(test)]
mod tests {
    use super::{build_limits, Engine};
    use crate::board::Board;
    use crate::engine::uci::{parse_command, Command};
    use crate::search::Limits;

    #[test]
    fn go_depth_builds_a_depth_limit() {
        let Command::Go(params) = parse_command("go depth 5") else {
            panic!("expected go");
        };
        let limits = build_limits(&params, Board::default());
        assert!(matches!(limits, Limits::Depth(5)));
    }

    #[test]
    fn position_then_go_depth_one_finishes_without_panicking() {
        let mut engine = Engine::new();
        engine.handle_command(parse_command("position startpos moves e2e4"));
        engine.handle_command(parse_command("go depth 1"));
        engine.join_search();
    }
}
