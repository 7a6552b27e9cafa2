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

//! King safety: a pawn shield bonus and a penalty per enemy piece attacking
//! the squares around the king.
//!
//! The magnitude of each term is scaled down as non-pawn material leaves the
//! board, since king safety matters far less once queens are traded off.

use crate::board::Board;
use crate::defs::{PieceType, Side};
use crate::evaluation::Score;
use crate::lookups::LOOKUPS;

const SHIELD_PAWN_BONUS: i16 = 8;
const ATTACKER_PENALTY: i16 = 6;

/// Calculates the king safety term for `board`, from White's perspective.
#[must_use]
pub fn king_safety(board: &Board) -> Score {
    let mut total = 0i16;
    let occ = board.occupancies();

    for side in [Side::WHITE, Side::BLACK] {
        let sign = if side == Side::WHITE { 1 } else { -1 };
        let them = side.flip();

        let Some(king_sq) = (board.piece_any(PieceType::KING) & board.side_any(side)).lsb() else {
            continue;
        };

        let shield_squares = LOOKUPS.king_attacks(king_sq);
        let own_pawns = board.piece_any(PieceType::PAWN) & board.side_any(side);
        let shield_count = (shield_squares & own_pawns).count();
        total += sign * SHIELD_PAWN_BONUS * i16::try_from(shield_count).unwrap_or(0);

        let zone = shield_squares;
        let mut attackers = 0u32;
        let mut enemy_knights = board.piece_any(PieceType::KNIGHT) & board.side_any(them);
        while let Some(sq) = enemy_knights.pop_lsb() {
            if !(LOOKUPS.knight_attacks(sq) & zone).is_empty() {
                attackers += 1;
            }
        }
        let mut enemy_bishops = board.piece_any(PieceType::BISHOP) & board.side_any(them);
        while let Some(sq) = enemy_bishops.pop_lsb() {
            if !(LOOKUPS.bishop_attacks(sq, occ) & zone).is_empty() {
                attackers += 1;
            }
        }
        let mut enemy_rooks = board.piece_any(PieceType::ROOK) & board.side_any(them);
        while let Some(sq) = enemy_rooks.pop_lsb() {
            if !(LOOKUPS.rook_attacks(sq, occ) & zone).is_empty() {
                attackers += 1;
            }
        }
        let mut enemy_queens = board.piece_any(PieceType::QUEEN) & board.side_any(them);
        while let Some(sq) = enemy_queens.pop_lsb() {
            if !(LOOKUPS.queen_attacks(sq, occ) & zone).is_empty() {
                attackers += 2;
            }
        }

        total -= sign * ATTACKER_PENALTY * i16::try_from(attackers).unwrap_or(0);
    }

    // King safety matters in the middlegame only; scale by remaining phase.
    let phase = i16::from(board.phase().min(24));
    Score(total * phase / 24, 0)
}

#[cfg(test)]
mod tests {
    use super::king_safety;
    use crate::board::Board;

    #[test]
    fn startpos_has_zero_net_king_safety() {
        let board = Board::default();
        let score = king_safety(&board);
        assert_eq!(score.0, 0);
    }
}
