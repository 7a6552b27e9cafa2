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

//! Error types for parsing user-supplied text (FEN, UCI commands, moves) and
//! for UCI option validation.

use thiserror::Error;

/// An error encountered while parsing a FEN string, a UCI move token, or
/// another piece of user-supplied text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A token was present but did not have the expected shape.
    #[error("invalid token `{0}`")]
    InvalidToken(String),
    /// A token was expected but the input ended early.
    #[error("expected another token but found none")]
    ExpectedToken,
    /// A move string did not name a legal move in the current position.
    #[error("`{0}` is not a legal move here")]
    IllegalMove(String),
}

/// An error encountered while applying a `setoption` command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    /// The named option does not exist.
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    /// The value could not be parsed as the option's type.
    #[error("value `{value}` is not a valid value for option `{name}`")]
    InvalidValue {
        /// The option's name.
        name: String,
        /// The value that failed to parse.
        value: String,
    },
    /// The value was of the right type but outside the option's allowed
    /// range.
    #[error("value `{value}` for option `{name}` is out of range")]
    OutOfRange {
        /// The option's name.
        name: String,
        /// The value that was out of range.
        value: String,
    },
}
