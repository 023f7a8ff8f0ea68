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

//! The rule validator: R1-R4 placement legality, and the lazy move
//! enumerator every AI strategy and UI preview is built on.
//!
//! Rules are checked in a fixed order (bounds, overlap, own-edge
//! adjacency, corner rule) so the common rejection paths are the
//! cheapest; see DESIGN.md for why own-edge adjacency is checked ahead
//! of the corner-connection rule.
//! Nothing here mutates state; `validate` is a pure function of its
//! arguments, which is what lets AI strategies call it millions of times
//! against unboxed board snapshots during a single search.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, Cell, BOARD_SIZE};
use crate::game::Move;
use crate::piece::{catalog, Orientation, PieceId};
use crate::player::Player;

/// Why a candidate placement was rejected, naming the first rule it
/// broke (rules are evaluated in R1..R4 order, so only the first failure
/// is ever reported).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("position ({row}, {col}) is out of bounds")]
    OutOfBounds { row: i32, col: i32 },
    #[error("position {cell} is already occupied")]
    Overlap { cell: Cell },
    #[error("first piece must cover your corner at {corner}")]
    FirstMoveNotAtCorner { corner: Cell },
    #[error("piece must touch one of your own pieces corner-to-corner")]
    NoCornerConnection,
    #[error("piece would touch your own piece edge-to-edge at {cell}")]
    OwnEdgeAdjacency { cell: Cell },
}

impl ValidationError {
    /// The structured rule code from spec §4.3, stable for host-side
    /// matching independent of the (possibly localized) display message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            Self::Overlap { .. } => "OVERLAP",
            Self::FirstMoveNotAtCorner { .. } => "FIRST_MOVE_NOT_AT_CORNER",
            Self::NoCornerConnection => "NO_CORNER_CONNECTION",
            Self::OwnEdgeAdjacency { .. } => "OWN_EDGE_ADJACENCY",
        }
    }
}

/// Checks a candidate `(piece, orientation, anchor)` placement for
/// `player` against the current `board`. Pure: never mutates `board` or
/// `player`.
pub fn validate(
    board: &Board,
    player: &Player,
    orientation: &Orientation,
    anchor: Cell,
) -> Result<(), ValidationError> {
    let absolute = orientation.place_cells(anchor.row() as i32, anchor.col() as i32);

    // R1: bounds.
    for &(row, col) in &absolute {
        if !Board::is_in_bounds(row as isize, col as isize) {
            return Err(ValidationError::OutOfBounds { row, col });
        }
    }
    let cells: Vec<Cell> = absolute
        .iter()
        .map(|&(r, c)| Cell::new(r as u8, c as u8))
        .collect();

    // R2: no overlap.
    for &cell in &cells {
        if !board.is_empty(cell) {
            return Err(ValidationError::Overlap { cell });
        }
    }

    // R4: no edge adjacency to the player's own existing cells. On the
    // first move the player owns no cells yet, so this is a safe no-op.
    // Checked ahead of the corner-connection rule below: see DESIGN.md
    // for why (spec's own worked example requires it).
    for &cell in &cells {
        if cell
            .edge_neighbors()
            .any(|n| board.owner(n) == Some(player.id()))
        {
            return Err(ValidationError::OwnEdgeAdjacency { cell });
        }
    }

    // R3a / R3b: origin corner on the first move, corner-connection after.
    if !player.has_made_first_move() {
        if !cells.contains(&player.origin()) {
            return Err(ValidationError::FirstMoveNotAtCorner {
                corner: player.origin(),
            });
        }
    } else {
        let connected = cells.iter().any(|cell| {
            cell.diagonal_neighbors()
                .any(|n| board.owner(n) == Some(player.id()))
        });
        if !connected {
            return Err(ValidationError::NoCornerConnection);
        }
    }

    Ok(())
}

fn all_anchors() -> impl Iterator<Item = Cell> {
    (0..BOARD_SIZE as u8).flat_map(|r| (0..BOARD_SIZE as u8).map(move |c| Cell::new(r, c)))
}

/// All legal moves for `player` on `board`, in deterministic order:
/// piece id ascending, then orientation index ascending (the catalog's
/// fixed order), then anchor in row-major order. Lazy: nothing is
/// computed until the iterator is polled, and polling stops as soon as
/// the caller stops pulling (see [`has_any_legal_move`]).
pub fn enumerate_legal_moves<'a>(
    board: &'a Board,
    player: &'a Player,
) -> impl Iterator<Item = Move> + 'a {
    PieceId::all()
        .filter(move |p| player.has_piece(*p))
        .flat_map(move |piece| {
            catalog()
                .orientations(piece)
                .iter()
                .enumerate()
                .flat_map(move |(orientation_index, orientation)| {
                    all_anchors().filter_map(move |anchor| {
                        validate(board, player, orientation, anchor)
                            .ok()
                            .map(|()| Move::Place {
                                player: player.id(),
                                piece,
                                orientation_index,
                                rotation: orientation.rotation,
                                flipped: orientation.flipped,
                                anchor,
                            })
                    })
                })
        })
}

/// Convenience wrapper applying an additional host-supplied predicate
/// (e.g. "only pieces of size >= 3") without changing the base
/// enumeration order.
pub fn enumerate_legal_moves_filtered<'a, F>(
    board: &'a Board,
    player: &'a Player,
    filter: F,
) -> impl Iterator<Item = Move> + 'a
where
    F: Fn(&Move) -> bool + 'a,
{
    enumerate_legal_moves(board, player).filter(move |m| filter(m))
}

/// True iff `player` has at least one legal move on `board`. Short
/// circuits on the first candidate found rather than counting them all.
pub fn has_any_legal_move(board: &Board, player: &Player) -> bool {
    enumerate_legal_moves(board, player).next().is_some()
}
