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

//! Per-seat state: which pieces remain, which have been placed (and
//! where), and the sticky first-move/pass flags the turn manager reads.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::board::Cell;
use crate::error::IllegalOperation;
use crate::piece::PieceId;

/// A seat at the table, 0-indexed internally (`PlayerId::new(0)` is the
/// player the rest of the engine displays as "player 1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index as u8)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

/// The four standard Blokus seat colors, in seating order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, EnumIter, Serialize, Deserialize)]
pub enum PlayerColor {
    Blue,
    Yellow,
    Red,
    Green,
}

impl PlayerColor {
    pub fn for_seat(index: usize) -> Self {
        match index % 4 {
            0 => PlayerColor::Blue,
            1 => PlayerColor::Yellow,
            2 => PlayerColor::Red,
            _ => PlayerColor::Green,
        }
    }
}

/// A piece as it sits on the board: which orientation, and where its
/// normalized origin was anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub piece_id: PieceId,
    pub rotation: u16,
    pub flipped: bool,
    pub anchor: Cell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    color: PlayerColor,
    origin: Cell,
    remaining: HashSet<PieceId>,
    placed: Vec<PlacedPiece>,
    has_made_first_move: bool,
    has_passed: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, color: PlayerColor, origin: Cell) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            origin,
            remaining: PieceId::all().collect(),
            placed: Vec::with_capacity(21),
            has_made_first_move: false,
            has_passed: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> PlayerColor {
        self.color
    }

    pub fn origin(&self) -> Cell {
        self.origin
    }

    pub fn remaining(&self) -> &HashSet<PieceId> {
        &self.remaining
    }

    pub fn placed(&self) -> &[PlacedPiece] {
        &self.placed
    }

    pub fn has_piece(&self, piece: PieceId) -> bool {
        self.remaining.contains(&piece)
    }

    pub fn has_made_first_move(&self) -> bool {
        self.has_made_first_move
    }

    pub fn has_passed(&self) -> bool {
        self.has_passed
    }

    /// Permanently withdraws this player from turn rotation. Per
    /// DESIGN.md this is never reversed for the rest of the game.
    pub fn mark_passed(&mut self) {
        self.has_passed = true;
    }

    /// Moves `piece` from remaining to placed, recording where it went.
    /// Fails if the player does not currently hold `piece`; the rule
    /// validator is expected to have already confirmed legality, so this
    /// failure indicates host/engine misuse rather than a bad move.
    pub fn take_piece(
        &mut self,
        piece: PieceId,
        rotation: u16,
        flipped: bool,
        anchor: Cell,
    ) -> Result<(), IllegalOperation> {
        if !self.remaining.remove(&piece) {
            return Err(IllegalOperation::PieceNotHeld(self.id, piece));
        }
        self.placed.push(PlacedPiece {
            piece_id: piece,
            rotation,
            flipped,
            anchor,
        });
        self.has_made_first_move = true;
        self.debug_check_invariants();
        Ok(())
    }

    pub fn remaining_square_count(&self) -> usize {
        self.remaining.iter().map(|p| p.cell_count()).sum()
    }

    pub fn placed_square_count(&self) -> usize {
        self.placed.iter().map(|p| p.piece_id.cell_count()).sum()
    }

    /// The piece placed most recently, used by the scoring bonus for
    /// finishing on the monomino.
    pub fn last_placed(&self) -> Option<PieceId> {
        self.placed.last().map(|p| p.piece_id)
    }

    fn debug_check_invariants(&self) {
        debug_assert_eq!(
            self.remaining.len() + self.placed.len(),
            crate::piece::NUM_PIECES,
            "remaining + placed must always cover the full catalog for {:?}",
            self.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_player() -> Player {
        Player::new(PlayerId::new(0), "Alice", PlayerColor::Blue, Cell::new(0, 0))
    }

    #[test]
    fn starts_with_full_catalog_remaining() {
        let p = make_player();
        assert_eq!(p.remaining().len(), crate::piece::NUM_PIECES);
        assert_eq!(p.placed().len(), 0);
        assert_eq!(p.remaining_square_count(), 89);
        assert_eq!(p.placed_square_count(), 0);
    }

    #[test]
    fn take_piece_moves_from_remaining_to_placed() {
        let mut p = make_player();
        p.take_piece(PieceId::I1, 0, false, Cell::new(0, 0)).unwrap();
        assert!(!p.has_piece(PieceId::I1));
        assert_eq!(p.placed().len(), 1);
        assert_eq!(p.last_placed(), Some(PieceId::I1));
        assert!(p.has_made_first_move());
    }

    #[test]
    fn take_piece_twice_fails() {
        let mut p = make_player();
        p.take_piece(PieceId::I1, 0, false, Cell::new(0, 0)).unwrap();
        assert!(p.take_piece(PieceId::I1, 0, false, Cell::new(1, 1)).is_err());
    }

    #[test]
    fn pass_is_sticky() {
        let mut p = make_player();
        p.mark_passed();
        assert!(p.has_passed());
        // Nothing un-sets it; there is deliberately no `unmark_passed`.
        assert!(p.has_passed());
    }

    #[test]
    fn colors_cycle_every_four_seats() {
        assert_eq!(PlayerColor::for_seat(0), PlayerColor::Blue);
        assert_eq!(PlayerColor::for_seat(3), PlayerColor::Green);
    }
}
