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

//! Iterative-deepening negamax search: the [`Worker`] owns the board and
//! drives the search; everything it needs to do so (the PV buffer, the
//! killer/history tables, the time budget) lives alongside it here and in
//! the submodules.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;

use crate::board::{Board, Key};
use crate::movegen::Move;
use crate::transposition_table::TranspositionTable;
use crate::util::Stack;

/// Late move reductions and the formula replacing the teacher's baked
/// reduction table.
pub mod alpha_beta;
/// The aspiration window used between iterative-deepening iterations.
pub mod aspiration;
/// [`Depth`]/[`Height`] and the search horizon constant.
pub mod depth;
/// Killer moves and the butterfly history table.
pub mod history;
/// The iterative-deepening driver.
pub mod iterative_deepening;
/// Move ordering for the main search and quiescence search.
pub mod movepick;
/// Wall-clock time budgeting.
pub mod time;

pub use depth::{Depth, Height, MAX_DEPTH};
pub use history::Histories;

/// The number of plies of game history (before the root, plus the search
/// itself) tracked for repetition detection.
const BOARD_HISTORY_SIZE: usize = 1024;

/// A compile-time marker distinguishing how a node is searched. Rust can
/// express "is this a PV node?" as a type parameter rather than re-deriving
/// it from `beta - alpha` at every call, so the three node kinds below are
/// zero-sized types implementing this trait.
pub trait Node {
    /// Is this the root of the search?
    const IS_ROOT: bool;
    /// Is this a principal-variation node (searched with a non-null
    /// window)?
    const IS_PV: bool;
    /// The node kind used for this node's non-first children.
    type Next: Node;
}

/// The root of the search tree.
pub struct RootNode;
/// A principal-variation node below the root.
pub struct PvNode;
/// A node searched with a null (zero-width) window.
pub struct NonPvNode;

impl Node for RootNode {
    const IS_ROOT: bool = true;
    const IS_PV: bool = true;
    type Next = PvNode;
}

impl Node for PvNode {
    const IS_ROOT: bool = false;
    const IS_PV: bool = true;
    type Next = PvNode;
}

impl Node for NonPvNode {
    const IS_ROOT: bool = false;
    const IS_PV: bool = false;
    type Next = NonPvNode;
}

/// The time/depth/node budget for a search, set by the UCI `go` command.
#[derive(Clone, Copy)]
pub enum Limits {
    /// Search until the time manager decides to stop, given a clock.
    Timed {
        /// Time left on the clock.
        time: Duration,
        /// Increment gained per move.
        inc: Duration,
        /// Moves left until the next time control, if known.
        moves_to_go: Option<u32>,
    },
    /// Search to a fixed depth.
    Depth(Depth),
    /// Search until a fixed node count is reached.
    Nodes(u64),
    /// Search for a fixed amount of wall-clock time.
    Movetime(Duration),
    /// Search until told to stop.
    Infinite,
}

impl Default for Limits {
    fn default() -> Self {
        Self::Infinite
    }
}

impl Limits {
    /// Creates [`Self::Timed`] limits with no incrementor `moves_to_go` set
    /// yet.
    #[must_use]
    pub const fn new_timed(time: Duration) -> Self {
        Self::Timed {
            time,
            inc: Duration::ZERO,
            moves_to_go: None,
        }
    }

    /// Sets the increment, if `self` is [`Self::Timed`].
    pub fn set_inc(&mut self, new_inc: Duration) {
        if let Self::Timed { inc, .. } = self {
            *inc = new_inc;
        }
    }

    /// Sets `moves_to_go`, if `self` is [`Self::Timed`].
    pub fn set_moves_to_go(&mut self, new_moves_to_go: u32) {
        if let Self::Timed { moves_to_go, .. } = self {
            *moves_to_go = Some(new_moves_to_go);
        }
    }
}

/// Whether the search should keep going. Threaded through return values
/// rather than raised as an error: a stop is control flow, not failure.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Keep searching.
    Continue,
    /// Stop as soon as possible and report the last completed depth.
    Stop,
    /// Stop and exit the process once the search returns.
    Quit,
}

/// State shared between the UCI reader thread, the time-manager watchdog
/// thread and the engine worker thread: a pair of atomic flags, read at
/// every search node and written by the other two threads.
#[derive(Clone)]
pub struct SharedState {
    /// Set to request the current search stop early.
    pub stop: Arc<AtomicBool>,
    /// Set once `quit` has been received; checked after `stop` resolves.
    pub quit: Arc<AtomicBool>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            quit: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// A move-ordering-preserving game history, used for repetition and
/// insufficient-material draw detection.
pub struct BoardHistory {
    /// Keys of every position reached, root-first.
    keys: Stack<Key, BOARD_HISTORY_SIZE>,
}

impl Default for BoardHistory {
    fn default() -> Self {
        Self {
            keys: Stack::new(),
        }
    }
}

impl BoardHistory {
    /// Clears the history and seeds it with `board`'s key.
    pub fn set_to(&mut self, board: &Board) {
        self.keys.clear();
        self.keys.push(board.key());
    }

    /// Records a position reached by making a move.
    pub fn push(&mut self, key: Key) {
        self.keys.push(key);
    }

    /// Forgets the most recently recorded position.
    pub fn pop(&mut self) {
        self.keys.pop();
    }

    /// Returns `true` if `key` already appears in the history, i.e. the
    /// current position is a repetition.
    #[must_use]
    pub fn is_repetition(&self, key: Key) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// The principal variation found from a node: the sequence of best moves a
/// search believes both sides will play. Built bottom-up via the quadratic
/// PV scheme: each node's [`Pv`] is the move it picked, followed by its best
/// child's PV.
#[derive(Clone, Copy)]
pub struct Pv {
    /// The moves, root-first; only `[..len]` is meaningful.
    moves: [Move; MAX_DEPTH as usize],
    /// How many leading entries of `moves` are populated.
    len: usize,
}

impl Default for Pv {
    fn default() -> Self {
        Self {
            moves: [Move::NULL; MAX_DEPTH as usize],
            len: 0,
        }
    }
}

impl Pv {
    /// Empties the PV.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Rebuilds `self` as `mv` followed by `child`'s moves.
    pub fn update(&mut self, mv: Move, child: &Self) {
        self.moves[0] = mv;
        let tail = child.len.min(self.moves.len() - 1);
        self.moves[1..=tail].copy_from_slice(&child.moves[..tail]);
        self.len = tail + 1;
    }

    /// Returns the first move of the PV, the search's chosen move.
    #[must_use]
    pub fn best_move(&self) -> Option<Move> {
        self.moves.first().copied().filter(|_| self.len > 0)
    }

    /// Iterates over the PV's moves, root-first.
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves[..self.len].iter().copied()
    }
}

impl std::fmt::Display for Pv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut moves = self.iter();
        if let Some(first) = moves.next() {
            write!(f, "{first}")?;
        }
        for mv in moves {
            write!(f, " {mv}")?;
        }
        Ok(())
    }
}

/// Drives a single search: owns the board being searched, the game history
/// needed for draw detection, the killer/history tables, and a borrow of
/// the transposition table for its duration.
pub struct Worker<'a> {
    /// The position currently being searched.
    board: Board,
    /// Every position reached so far, in the game and in the search, for
    /// repetition detection.
    board_history: BoardHistory,
    /// Borrowed for the duration of the search; returned to the engine once
    /// it ends.
    tt: &'a mut TranspositionTable,
    /// Killer moves and the butterfly history table.
    histories: Histories,
    /// The budget this search was started with.
    limits: Limits,
    /// The stop/quit flags shared with the UCI reader thread.
    shared: SharedState,
    /// When [`Self::start_search`] was called.
    start_time: Instant,
    /// Fixed time subtracted from every time-based budget, covering engine
    /// and GUI overhead around the actual think.
    move_overhead: Duration,
    /// The time budget for the current search, computed once at the start
    /// of [`Self::start_search`] by [`time::calculate_time_window`] when
    /// [`Limits::Timed`] is in effect; extended on aspiration fail-lows.
    deadline: Option<Duration>,
    /// Nodes visited so far in the current search.
    nodes: u64,
    /// The deepest ply reached so far, for the UCI `seldepth` field.
    seldepth: Height,
    /// The principal variation of the last completed iteration.
    root_pv: Pv,
    /// Whether `info`/`bestmove` lines should be printed.
    printing: bool,
}

impl<'a> Worker<'a> {
    /// Creates a new worker over `tt`, sharing `shared`'s stop/quit flags
    /// with the rest of the engine.
    #[must_use]
    pub fn new(tt: &'a mut TranspositionTable, shared: SharedState) -> Self {
        let board = Board::default();
        let mut board_history = BoardHistory::default();
        board_history.set_to(&board);
        Self {
            board,
            board_history,
            tt,
            histories: Histories::default(),
            limits: Limits::default(),
            shared,
            start_time: Instant::now(),
            move_overhead: Duration::from_millis(10),
            deadline: None,
            nodes: 0,
            seldepth: 0,
            root_pv: Pv::default(),
            printing: true,
        }
    }

    /// Builder: sets the board to search from.
    #[must_use]
    pub fn with_board(mut self, board: Board) -> Self {
        self.set_board(board);
        self
    }

    /// Builder: controls whether `info`/`bestmove` lines are printed.
    #[must_use]
    pub fn with_printing(mut self, printing: bool) -> Self {
        self.printing = printing;
        self
    }

    /// Builder: sets the search limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Builder: sets the move overhead subtracted from the time budget.
    #[must_use]
    pub fn with_move_overhead(mut self, move_overhead: Duration) -> Self {
        self.move_overhead = move_overhead;
        self
    }

    /// Replaces the board being searched and resets the game history to it.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.board_history.set_to(&board);
    }

    /// Resets the board to the standard starting position.
    pub fn reset_board(&mut self) {
        self.set_board(Board::default());
    }

    /// Returns the board currently being searched.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Records a position from the game (not the search) reached outside of
    /// `start_search`, e.g. moves applied by the `position` command.
    pub fn push_game_move(&mut self, key: Key) {
        self.board_history.push(key);
    }

    /// Runs iterative deepening to completion (or until stopped) and
    /// returns the best move found, or [`Move::NULL`] if not even depth 1
    /// completed.
    pub fn start_search(&mut self) -> Move {
        self.start_time = Instant::now();
        self.nodes = 0;
        self.seldepth = 0;
        self.root_pv.clear();
        iterative_deepening::iterative_deepening(self)
    }

    /// Returns the number of nodes visited so far in the current search.
    #[must_use]
    pub const fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Increments the node counter and returns the new value.
    pub fn increment_nodes(&mut self) -> u64 {
        self.nodes += 1;
        self.nodes
    }

    /// Records that `height` plies were reached, for the UCI `seldepth`
    /// field.
    pub fn note_seldepth(&mut self, height: Height) {
        self.seldepth = self.seldepth.max(height);
    }

    /// Returns the root principal variation of the last completed
    /// iteration.
    #[must_use]
    pub const fn root_pv(&self) -> &Pv {
        &self.root_pv
    }

    /// Returns the wall-clock time elapsed since `start_search` was called.
    #[must_use]
    pub fn elapsed_time(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Plays `mv` on the board, recording history for draw detection.
    /// Returns the board *before* the move, to hand back to
    /// [`Self::unmake_move`]; returns `None` if `mv` turns out to be
    /// illegal, leaving `self` unchanged.
    pub fn make_move(&mut self, mv: Move) -> Option<Board> {
        let mut next = self.board;
        if !next.make_move(mv) {
            return None;
        }
        let previous = std::mem::replace(&mut self.board, next);
        self.board_history.push(next.key());
        Some(previous)
    }

    /// Undoes a move made by [`Self::make_move`], given the board it
    /// returned.
    pub fn unmake_move(&mut self, previous: Board) {
        self.board = previous;
        self.board_history.pop();
    }

    /// Plays a null move (a pass), returning the board to restore via
    /// [`Self::unmake_null_move`].
    pub fn make_null_move(&mut self) -> Board {
        let mut next = self.board;
        next.make_null_move();
        let previous = std::mem::replace(&mut self.board, next);
        self.board_history.push(next.key());
        previous
    }

    /// Undoes a null move made by [`Self::make_null_move`].
    pub fn unmake_null_move(&mut self, previous: Board) {
        self.board = previous;
        self.board_history.pop();
    }

    /// Checks the shared stop/quit flags and the search's own time/node
    /// limits, returning the status the caller should act on.
    #[must_use]
    pub fn check_status(&self) -> SearchStatus {
        if self.shared.quit.load(Ordering::Relaxed) {
            return SearchStatus::Quit;
        }
        if self.shared.stop.load(Ordering::Relaxed) {
            return SearchStatus::Stop;
        }
        if let Some(deadline) = self.deadline {
            if self.elapsed_time() >= deadline {
                return SearchStatus::Stop;
            }
        }
        match self.limits {
            Limits::Nodes(limit) if self.nodes >= limit => SearchStatus::Stop,
            Limits::Movetime(budget) if self.elapsed_time() >= budget.saturating_sub(self.move_overhead) => {
                SearchStatus::Stop
            }
            _ => SearchStatus::Continue,
        }
    }

    /// Returns the current deadline, if one has been computed.
    #[must_use]
    pub(crate) const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Sets (or clears) the search deadline, relative to `start_search`'s
    /// start time.
    pub(crate) fn set_deadline(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
    }

    /// Returns `true` if the search should stop at the next opportunity.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.check_status() != SearchStatus::Continue
    }

    /// Returns `true` if `info`/`bestmove` lines should be printed.
    #[must_use]
    pub const fn should_print(&self) -> bool {
        self.printing
    }

    /// Returns `true` if the current position is a draw by the fifty-move
    /// rule, threefold repetition, or insufficient material.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        if self.board.halfmoves() >= 100 {
            return true;
        }
        if self.board_history.is_repetition(self.board.key()) {
            return true;
        }
        is_insufficient_material(&self.board)
    }

    /// Prints a UCI `info` line summarising the just-completed iteration.
    pub fn print_report(&self, depth: Depth, score: crate::evaluation::Eval) {
        if !self.printing {
            return;
        }
        let elapsed = self.elapsed_time();
        let nps = if elapsed.as_millis() == 0 {
            0
        } else {
            u128::from(self.nodes) * 1000 / elapsed.as_millis()
        };
        let score_str = if crate::evaluation::is_mate(score) {
            format!("mate {}", crate::evaluation::moves_to_mate(score))
        } else {
            format!("cp {score}")
        };
        println!(
            "info depth {depth} seldepth {} score {score_str} time {} nodes {} nps {nps} hashfull {} pv {}",
            self.seldepth,
            elapsed.as_millis(),
            self.nodes,
            self.tt.estimate_hashfull(),
            self.root_pv,
        );
    }

    /// Sets the root PV to `pv` (called once an iteration completes).
    pub(crate) fn set_root_pv(&mut self, pv: Pv) {
        self.root_pv = pv;
    }

    /// Returns the shared stop/quit flags.
    pub(crate) const fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Returns the search limits.
    pub(crate) const fn limits(&self) -> Limits {
        self.limits
    }

    /// Returns the move-overhead budget.
    pub(crate) const fn move_overhead(&self) -> Duration {
        self.move_overhead
    }

    /// Returns a mutable borrow of the transposition table.
    pub(crate) fn tt_mut(&mut self) -> &mut TranspositionTable {
        self.tt
    }

    /// Returns the killer/history tables.
    pub(crate) fn histories_mut(&mut self) -> &mut Histories {
        &mut self.histories
    }
}

/// Crude but sufficient insufficient-material check: only kings, or a king
/// plus a single minor piece per side, cannot deliver mate.
fn is_insufficient_material(board: &Board) -> bool {
    use crate::defs::PieceType;

    let pawns = board.piece_any(PieceType::PAWN);
    let rooks = board.piece_any(PieceType::ROOK);
    let queens = board.piece_any(PieceType::QUEEN);
    if !(pawns | rooks | queens).is_empty() {
        return false;
    }
    let knights = board.piece_any(PieceType::KNIGHT);
    let bishops = board.piece_any(PieceType::BISHOP);
    (knights | bishops).count() < 2
}

/// Called once at process startup to wire the `log` facade to the
/// environment, matching the teacher's `env_logger`-behind-`RUST_LOG`
/// convention.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    info!("logging initialised");
}
