// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! The score formula (spec §4.6). Scores are never stored; they are
//! recomputed on demand from a player's remaining/placed piece sets, so
//! there is no way for score and board state to drift apart.

use serde::{Deserialize, Serialize};

use crate::piece::PieceId;
use crate::player::Player;

/// `+15` for placing every piece; DESIGN.md resolves the spec's open
/// question in favor of *also* awarding the extra `+5` below, i.e. the
/// literal formula text rather than the simpler fallback it offers.
const ALL_PLACED_BONUS: i32 = 15;
/// Extra bonus when the last piece placed, given all pieces were placed,
/// was the monomino.
const LAST_PIECE_I1_BONUS: i32 = 5;

/// The full breakdown behind a player's `final_score`, exposed for UI
/// display and for tests asserting on an exact score (spec §8 scenario 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub placed_squares: i32,
    pub remaining_squares: i32,
    pub base: i32,
    pub bonus: i32,
    pub final_score: i32,
}

/// Computes `player`'s current score breakdown. Pure function of the
/// player's remaining/placed piece sets; never mutates, never cached.
pub fn score(player: &Player) -> ScoreBreakdown {
    let placed_squares = player.placed_square_count() as i32;
    let remaining_squares = player.remaining_square_count() as i32;
    let base = placed_squares - remaining_squares;

    let placed_everything = player.remaining().is_empty();
    let mut bonus = 0;
    if placed_everything {
        bonus += ALL_PLACED_BONUS;
        if player.last_placed() == Some(PieceId::I1) {
            bonus += LAST_PIECE_I1_BONUS;
        }
    }

    ScoreBreakdown {
        placed_squares,
        remaining_squares,
        base,
        bonus,
        final_score: base + bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::player::{PlayerColor, PlayerId};

    #[test]
    fn fresh_player_scores_negative_full_remaining() {
        let player = Player::new(PlayerId::new(0), "P1", PlayerColor::Blue, Cell::new(0, 0));
        let breakdown = score(&player);
        assert_eq!(breakdown.placed_squares, 0);
        assert_eq!(breakdown.remaining_squares, 89);
        assert_eq!(breakdown.base, -89);
        assert_eq!(breakdown.bonus, 0);
        assert_eq!(breakdown.final_score, -89);
    }

    #[test]
    fn scenario_1_single_i1_placement_matches_spec() {
        let mut player = Player::new(PlayerId::new(0), "P1", PlayerColor::Blue, Cell::new(0, 0));
        player.take_piece(PieceId::I1, 0, false, Cell::new(0, 0)).unwrap();
        let breakdown = score(&player);
        assert_eq!(breakdown.placed_squares, 1);
        assert_eq!(breakdown.remaining_squares, 88);
        assert_eq!(breakdown.base, -87);
        assert_eq!(breakdown.bonus, 0);
        assert_eq!(breakdown.final_score, -87);
    }

    #[test]
    fn all_pieces_placed_grants_15_bonus() {
        let mut player = Player::new(PlayerId::new(0), "P1", PlayerColor::Blue, Cell::new(0, 0));
        for piece in PieceId::all().filter(|p| *p != PieceId::I1) {
            player.take_piece(piece, 0, false, Cell::new(0, 0)).unwrap();
        }
        // Finish on I1 to also trigger the extra bonus.
        player.take_piece(PieceId::I1, 0, false, Cell::new(0, 0)).unwrap();
        let breakdown = score(&player);
        assert_eq!(breakdown.remaining_squares, 0);
        assert_eq!(breakdown.bonus, 15 + 5); // last piece was I1 here
        assert_eq!(breakdown.final_score, 89 + 20);
    }

    #[test]
    fn finishing_on_non_i1_skips_extra_bonus() {
        let mut player = Player::new(PlayerId::new(0), "P1", PlayerColor::Blue, Cell::new(0, 0));
        player.take_piece(PieceId::I1, 0, false, Cell::new(0, 0)).unwrap();
        for piece in PieceId::all().filter(|p| *p != PieceId::I1 && *p != PieceId::I2) {
            player.take_piece(piece, 0, false, Cell::new(0, 0)).unwrap();
        }
        player.take_piece(PieceId::I2, 0, false, Cell::new(0, 0)).unwrap();
        let breakdown = score(&player);
        assert_eq!(breakdown.remaining_squares, 0);
        assert_eq!(breakdown.bonus, 15);
    }
}
