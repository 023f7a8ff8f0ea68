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

//! The phase/turn state machine: `Setup -> Playing -> Ended`, move
//! application, and end-game detection (spec §4.5-4.6).
//!
//! [`GameState::apply_move`] is the one place board + player + history +
//! score mutate together; a rejected move leaves every one of those
//! untouched (spec §7's "transactional at move granularity").

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, Cell};
use crate::error::{IllegalOperation, InvariantViolation};
use crate::piece::{catalog, PieceId};
use crate::player::{Player, PlayerColor, PlayerId};
use crate::scoring::score;
use crate::validator::{self, has_any_legal_move, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    Playing,
    Ended,
}

/// A total description of a legal placement, or the distinguished *pass*
/// value (spec §3's "Move").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Place {
        player: PlayerId,
        piece: PieceId,
        orientation_index: usize,
        rotation: u16,
        flipped: bool,
        anchor: Cell,
    },
    Pass {
        player: PlayerId,
    },
}

impl Move {
    pub fn player(&self) -> PlayerId {
        match self {
            Move::Place { player, .. } => *player,
            Move::Pass { player } => *player,
        }
    }
}

/// The union of every way [`GameState::apply_move`] can fail: a rule
/// violation, a misuse of the facade for the current phase/turn, or (in
/// theory only - the validator is supposed to prevent this) a broken
/// internal invariant.
#[derive(Debug, Error)]
pub enum ApplyMoveError {
    #[error(transparent)]
    Illegal(#[from] IllegalOperation),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    players: Vec<Player>,
    current_index: usize,
    phase: Phase,
    move_history: Vec<Move>,
    consecutive_passes: u32,
    winner_ids: Vec<PlayerId>,
}

impl GameState {
    /// Creates a new game in `Setup` phase for 2-4 named seats. Origin
    /// corners are assigned in seating order per spec §3: P1=(0,0),
    /// P2=(0,19), P3=(19,19), P4=(19,0).
    pub fn new(names: Vec<String>) -> Result<Self, IllegalOperation> {
        if !(2..=4).contains(&names.len()) {
            return Err(IllegalOperation::WrongPlayerCount(names.len()));
        }
        let corners = Cell::origin_corners();
        let players = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                Player::new(PlayerId::new(i), name, PlayerColor::for_seat(i), corners[i])
            })
            .collect::<Vec<_>>();
        Ok(Self {
            board: Board::new(players.len()),
            players,
            current_index: 0,
            phase: Phase::Setup,
            move_history: Vec::new(),
            consecutive_passes: 0,
            winner_ids: Vec::new(),
        })
    }

    pub fn start(&mut self) -> Result<(), IllegalOperation> {
        if self.phase != Phase::Setup {
            return Err(IllegalOperation::GameAlreadyStarted);
        }
        self.phase = Phase::Playing;
        debug!("game started with {} players", self.players.len());
        Ok(())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[Move] {
        &self.move_history
    }

    pub fn winner_ids(&self) -> &[PlayerId] {
        &self.winner_ids
    }

    pub fn consecutive_passes(&self) -> u32 {
        self.consecutive_passes
    }

    pub fn current_player_id(&self) -> PlayerId {
        self.players[self.current_index].id()
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_index]
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    /// Applies `mv` transactionally: either every one of board, player
    /// state, history, score and turn order advance together, or (on
    /// error) none of them do.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), ApplyMoveError> {
        match self.phase {
            Phase::Setup => return Err(IllegalOperation::GameNotStarted.into()),
            Phase::Ended => return Err(IllegalOperation::GameAlreadyEnded.into()),
            Phase::Playing => {}
        }

        let current = self.current_player_id();
        if mv.player() != current {
            return Err(IllegalOperation::NotYourTurn(current, mv.player()).into());
        }
        if self.player(current).has_passed() {
            return Err(IllegalOperation::PlayerAlreadyPassed(current).into());
        }

        match mv {
            Move::Pass { player } => {
                self.players[player.index()].mark_passed();
                self.consecutive_passes += 1;
            }
            Move::Place {
                player,
                piece,
                orientation_index,
                anchor,
                ..
            } => {
                let orientation = catalog()
                    .orientations(piece)
                    .get(orientation_index)
                    .ok_or(IllegalOperation::PieceNotHeld(player, piece))?;
                validator::validate(&self.board, &self.players[player.index()], orientation, anchor)?;

                let absolute = orientation.place_cells(anchor.row() as i32, anchor.col() as i32);
                let cells: Vec<Cell> = absolute
                    .iter()
                    .map(|&(r, c)| Cell::new(r as u8, c as u8))
                    .collect();
                self.board.place(player, &cells)?;
                self.players[player.index()].take_piece(
                    piece,
                    orientation.rotation,
                    orientation.flipped,
                    anchor,
                )?;
                self.consecutive_passes = 0;
            }
        }

        self.move_history.push(mv);
        self.advance_turn();
        self.reevaluate_end();
        Ok(())
    }

    fn advance_turn(&mut self) {
        let n = self.players.len();
        if self.players.iter().all(|p| p.has_passed()) {
            return;
        }
        let mut idx = (self.current_index + 1) % n;
        while self.players[idx].has_passed() {
            idx = (idx + 1) % n;
        }
        self.current_index = idx;
    }

    fn reevaluate_end(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }
        let all_passed = self.players.iter().all(|p| p.has_passed());
        let all_remaining_empty = self.players.iter().all(|p| p.remaining().is_empty());
        let ended = all_passed
            || all_remaining_empty
            || self
                .players
                .iter()
                .all(|p| !has_any_legal_move(&self.board, p));

        if ended {
            self.phase = Phase::Ended;
            let breakdowns: Vec<(PlayerId, i32)> = self
                .players
                .iter()
                .map(|p| (p.id(), score(p).final_score))
                .collect();
            let max_score = breakdowns.iter().map(|(_, s)| *s).max().unwrap_or(0);
            self.winner_ids = breakdowns
                .iter()
                .filter(|(_, s)| *s == max_score)
                .map(|(id, _)| *id)
                .collect();
            debug!("game ended, winners: {:?}", self.winner_ids);
        }
    }

    /// Falls back to a pass for `player` rather than ever leaving state
    /// half-applied; used by the facade when an AI strategy panics or
    /// times out with nothing to offer.
    pub fn force_pass_with_warning(&mut self, player: PlayerId, reason: &str) {
        warn!("forcing pass for {player:?}: {reason}");
        if let Err(e) = self.apply_move(Move::Pass { player }) {
            warn!("forced pass also failed for {player:?}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_game() -> GameState {
        let mut g = GameState::new(vec!["Alice".into(), "Bob".into()]).unwrap();
        g.start().unwrap();
        g
    }

    #[test]
    fn starts_in_playing_after_start() {
        let g = two_player_game();
        assert_eq!(g.phase(), Phase::Playing);
        assert_eq!(g.current_player_id(), PlayerId::new(0));
    }

    #[test]
    fn scenario_1_first_move_at_origin_is_legal() {
        let mut g = two_player_game();
        let mv = Move::Place {
            player: PlayerId::new(0),
            piece: PieceId::I1,
            orientation_index: 0,
            rotation: 0,
            flipped: false,
            anchor: Cell::new(0, 0),
        };
        g.apply_move(mv).unwrap();
        assert_eq!(g.board().owner(Cell::new(0, 0)), Some(PlayerId::new(0)));
        assert_eq!(g.history().len(), 1);
        assert_eq!(g.current_player_id(), PlayerId::new(1));

        let breakdown = score(g.player(PlayerId::new(0)));
        assert_eq!(breakdown.placed_squares, 1);
        assert_eq!(breakdown.remaining_squares, 88);
        assert_eq!(breakdown.base, -87);
        assert_eq!(breakdown.final_score, -87);
    }

    #[test]
    fn scenario_2_first_move_off_corner_rejected() {
        let mut g = two_player_game();
        let mv = Move::Place {
            player: PlayerId::new(0),
            piece: PieceId::I1,
            orientation_index: 0,
            rotation: 0,
            flipped: false,
            anchor: Cell::new(1, 0),
        };
        let err = g.apply_move(mv).unwrap_err();
        assert!(matches!(
            err,
            ApplyMoveError::Validation(ValidationError::FirstMoveNotAtCorner { .. })
        ));
        assert!(g.board().is_empty(Cell::new(1, 0)));
        assert_eq!(g.history().len(), 0);
    }

    #[test]
    fn wrong_turn_is_rejected() {
        let mut g = two_player_game();
        let mv = Move::Pass {
            player: PlayerId::new(1),
        };
        let err = g.apply_move(mv).unwrap_err();
        assert!(matches!(
            err,
            ApplyMoveError::Illegal(IllegalOperation::NotYourTurn(_, _))
        ));
    }

    #[test]
    fn scenario_5_universal_pass_ends_the_game() {
        let mut g = two_player_game();
        g.apply_move(Move::Pass {
            player: PlayerId::new(0),
        })
        .unwrap();
        assert_eq!(g.phase(), Phase::Playing);
        g.apply_move(Move::Pass {
            player: PlayerId::new(1),
        })
        .unwrap();
        assert_eq!(g.phase(), Phase::Ended);
        assert!(!g.winner_ids().is_empty());
    }

    #[test]
    fn cannot_apply_move_after_game_ended() {
        let mut g = two_player_game();
        g.apply_move(Move::Pass { player: PlayerId::new(0) }).unwrap();
        g.apply_move(Move::Pass { player: PlayerId::new(1) }).unwrap();
        let err = g
            .apply_move(Move::Pass { player: PlayerId::new(0) })
            .unwrap_err();
        assert!(matches!(
            err,
            ApplyMoveError::Illegal(IllegalOperation::GameAlreadyEnded)
        ));
    }

    #[test]
    fn turn_order_skips_passed_players_in_a_four_player_game() {
        let mut g = GameState::new(vec!["A".into(), "B".into(), "C".into(), "D".into()]).unwrap();
        g.start().unwrap();
        g.apply_move(Move::Pass { player: PlayerId::new(0) }).unwrap();
        assert_eq!(g.current_player_id(), PlayerId::new(1));
        g.apply_move(Move::Pass { player: PlayerId::new(1) }).unwrap();
        assert_eq!(g.current_player_id(), PlayerId::new(2));
    }
}
