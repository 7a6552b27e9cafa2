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

//! Parsing of UCI protocol text: commands sent by the GUI, move tokens, and
//! option values.

use std::str::FromStr;
use std::time::Duration;

use crate::board::Board;
use crate::defs::{PieceType, Square};
use crate::error::{OptionError, ParseError};
use crate::movegen::{generate_moves, AllMoves, Move};
use crate::search::Depth;
use crate::transposition_table::MAX_MIB;

/// A single instruction sent by the GUI, parsed from one line of input.
#[derive(Debug, Clone)]
pub enum Command {
    /// `uci`: identify and list options.
    Uci,
    /// `debug [on|off]`.
    Debug(bool),
    /// `isready`: must be answered with `readyok`.
    IsReady,
    /// `setoption name <name> [value <value>]`.
    SetOption {
        /// The option's name.
        name: String,
        /// The option's new value, absent for button-like options.
        value: Option<String>,
    },
    /// `ucinewgame`: the next search is the start of a new game.
    UciNewGame,
    /// `position [startpos|fen <fen>] [moves <move>...]`.
    Position {
        /// The base FEN, or `None` for the standard starting position.
        fen: Option<String>,
        /// Moves to play from the base position, in UCI notation.
        moves: Vec<String>,
    },
    /// `go [...]`: start a search.
    Go(GoParams),
    /// `stop`: stop the current search and report `bestmove`.
    Stop,
    /// `ponderhit`: the opponent played the expected pondering move.
    PonderHit,
    /// `quit`: exit immediately.
    Quit,
    /// A line that didn't parse as a known command; ignored, per the UCI
    /// convention of tolerating unrecognised input.
    Unknown(String),
}

/// The parameters of a `go` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoParams {
    /// Time left for White.
    pub wtime: Option<Duration>,
    /// Time left for Black.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves remaining until the next time control.
    pub movestogo: Option<u32>,
    /// Search to a fixed depth.
    pub depth: Option<Depth>,
    /// Search until a fixed node count.
    pub nodes: Option<u64>,
    /// Search for a fixed amount of time.
    pub movetime: Option<Duration>,
    /// Search until `stop`, ignoring every other limit.
    pub infinite: bool,
}

/// Parses one line of UCI input into a [`Command`].
#[must_use]
pub fn parse_command(line: &str) -> Command {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("uci") => Command::Uci,
        Some("debug") => Command::Debug(tokens.next() == Some("on")),
        Some("isready") => Command::IsReady,
        Some("ucinewgame") => Command::UciNewGame,
        Some("stop") => Command::Stop,
        Some("ponderhit") => Command::PonderHit,
        Some("quit") => Command::Quit,
        Some("setoption") => parse_setoption(&mut tokens),
        Some("position") => parse_position(&mut tokens),
        Some("go") => Command::Go(parse_go(&mut tokens)),
        _ => Command::Unknown(line.to_string()),
    }
}

/// Parses the remainder of a `setoption name <name> [value <value>]` line.
fn parse_setoption<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Command {
    let rest: Vec<&str> = tokens.collect();
    let Some(name_index) = rest.iter().position(|&t| t == "name") else {
        return Command::Unknown("setoption".to_string());
    };
    let value_index = rest.iter().position(|&t| t == "value");
    let name_end = value_index.unwrap_or(rest.len());
    let name = rest[name_index + 1..name_end].join(" ");
    let value = value_index.map(|i| rest[i + 1..].join(" "));
    Command::SetOption { name, value }
}

/// Parses the remainder of a `position [startpos|fen ...] [moves ...]` line.
fn parse_position<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Command {
    let rest: Vec<&str> = tokens.collect();
    let moves_index = rest.iter().position(|&t| t == "moves");
    let head = moves_index.map_or(&rest[..], |i| &rest[..i]);

    let fen = if head.first() == Some(&"fen") {
        Some(head[1..].join(" "))
    } else {
        None
    };

    let moves = moves_index.map_or_else(Vec::new, |i| rest[i + 1..].iter().map(ToString::to_string).collect());

    Command::Position { fen, moves }
}

/// Parses the remainder of a `go ...` line.
fn parse_go<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> GoParams {
    let mut params = GoParams::default();
    let rest: Vec<&str> = tokens.collect();
    let mut iter = rest.into_iter();

    while let Some(token) = iter.next() {
        match token {
            "wtime" => params.wtime = next_millis(&mut iter),
            "btime" => params.btime = next_millis(&mut iter),
            "winc" => params.winc = next_millis(&mut iter),
            "binc" => params.binc = next_millis(&mut iter),
            "movestogo" => params.movestogo = next_u32(&mut iter),
            "depth" => params.depth = next_u32(&mut iter).map(|d| d as Depth),
            "nodes" => params.nodes = iter.next().and_then(|t| t.parse().ok()),
            "movetime" => params.movetime = next_millis(&mut iter),
            "infinite" => params.infinite = true,
            _ => {}
        }
    }

    params
}

/// Parses the next token as a millisecond count.
fn next_millis<'a>(iter: &mut impl Iterator<Item = &'a str>) -> Option<Duration> {
    iter.next().and_then(|t| t.parse().ok()).map(Duration::from_millis)
}

/// Parses the next token as a `u32`.
fn next_u32<'a>(iter: &mut impl Iterator<Item = &'a str>) -> Option<u32> {
    iter.next().and_then(|t| t.parse().ok())
}

/// Parses a UCI move token (e.g. `e2e4`, `e7e8q`) against the legal moves of
/// `board`, returning the matching [`Move`] (with its castling/en passant/
/// promotion flags filled in correctly).
pub fn parse_uci_move(board: &Board, token: &str) -> Result<Move, ParseError> {
    if token.len() < 4 {
        return Err(ParseError::InvalidToken(token.to_string()));
    }
    let start = Square::from_str(&token[0..2])?;
    let end = Square::from_str(&token[2..4])?;
    let promo_char = token.chars().nth(4).map(|c| c.to_ascii_lowercase());

    let mut moves = crate::movegen::Moves::new();
    generate_moves::<AllMoves>(board, &mut moves);

    for scored in moves.iter() {
        let mv = scored.mv;
        if mv.start() != start || mv.end() != end {
            continue;
        }
        if mv.is_promotion() {
            if mv.promotion_piece().map(promotion_letter) != promo_char {
                continue;
            }
        } else if promo_char.is_some() {
            continue;
        }

        let mut after = *board;
        if after.make_move(mv) {
            return Ok(mv);
        }
    }

    Err(ParseError::IllegalMove(token.to_string()))
}

/// The UCI promotion-suffix letter for a promotion piece type.
fn promotion_letter(piece_type: PieceType) -> char {
    match piece_type {
        PieceType::ROOK => 'r',
        PieceType::BISHOP => 'b',
        PieceType::KNIGHT => 'n',
        _ => 'q',
    }
}

/// The UCI-configurable options this engine exposes.
#[derive(Debug, Clone, Copy)]
pub struct UciOptions {
    /// The transposition table size, in MiB.
    pub hash_mib: usize,
}

impl Default for UciOptions {
    fn default() -> Self {
        Self {
            hash_mib: crate::transposition_table::DEFAULT_MIB,
        }
    }
}

impl UciOptions {
    /// Applies a `setoption name <name> value <value>` pair, returning an
    /// error if the name is unknown or the value is invalid/out of range.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        match name {
            "Hash" => {
                let mib: usize = value.parse().map_err(|_| OptionError::InvalidValue {
                    name: name.to_string(),
                    value: value.to_string(),
                })?;
                if mib > MAX_MIB {
                    return Err(OptionError::OutOfRange {
                        name: name.to_string(),
                        value: value.to_string(),
                    });
                }
                self.hash_mib = mib;
                Ok(())
            }
            _ => Err(OptionError::UnknownOption(name.to_string())),
        }
    }

    /// Prints the `option` lines in response to `uci`.
    pub fn print_declarations() {
        println!(
            "option name Hash type spin default {} min 0 max {}",
            crate::transposition_table::DEFAULT_MIB,
            MAX_MIB
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, parse_uci_move, Command};
    use crate::board::Board;

    #[test]
    fn parses_a_timed_go_command() {
        let Command::Go(params) = parse_command("go wtime 60000 btime 59000 winc 500 binc 500") else {
            panic!("expected a go command");
        };
        assert_eq!(params.wtime, Some(std::time::Duration::from_millis(60000)));
        assert_eq!(params.binc, Some(std::time::Duration::from_millis(500)));
    }

    #[test]
    fn parses_position_with_moves() {
        let Command::Position { fen, moves } = parse_command("position startpos moves e2e4 e7e5") else {
            panic!("expected a position command");
        };
        assert_eq!(fen, None);
        assert_eq!(moves, vec!["e2e4", "e7e5"]);
    }

    #[test]
    fn parses_a_legal_opening_move() {
        let board = Board::default();
        let mv = parse_uci_move(&board, "e2e4").expect("e2e4 is legal from startpos");
        assert_eq!(mv.start(), crate::defs::Square::E2);
        assert_eq!(mv.end(), crate::defs::Square::E4);
    }
}
