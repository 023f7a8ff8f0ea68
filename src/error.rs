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

//! The three error kinds that sit alongside [`crate::validator::ValidationError`]:
//! programmer-error misuse of the facade, AI deadline overruns (recoverable
//! via fallback), and internal invariant breaks (fatal).

use thiserror::Error;

use crate::board::Cell;
use crate::piece::PieceId;
use crate::player::PlayerId;

/// The caller used the facade in a way the state machine does not allow
/// (e.g. submitting a move when it isn't that player's turn). These
/// indicate a bug in the host, not a bad move from a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalOperation {
    #[error("it is player {0:?}'s turn, not {1:?}")]
    NotYourTurn(PlayerId, PlayerId),
    #[error("player {0:?} no longer has piece {1}")]
    PieceNotHeld(PlayerId, PieceId),
    #[error("the game has already ended")]
    GameAlreadyEnded,
    #[error("the game has not started yet")]
    GameNotStarted,
    #[error("the game has already been started")]
    GameAlreadyStarted,
    #[error("a game needs 2 to 4 players, got {0}")]
    WrongPlayerCount(usize),
    #[error("player {0:?} has already passed for the rest of the game")]
    PlayerAlreadyPassed(PlayerId),
    #[error("piece {0} has no orientation for rotation {1} flipped={2}")]
    UnknownOrientation(PieceId, u16, bool),
}

/// An AI strategy did not return a move before its deadline. The engine
/// falls back to the best move found so far, or a uniform-random legal
/// move if none was found; this error is logged, not propagated to the
/// host as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("AI strategy for player {player:?} exceeded its deadline")]
pub struct AITimeout {
    pub player: PlayerId,
}

/// A contract the engine relies on internally was broken. Unlike
/// [`crate::validator::ValidationError`], this can never be caused by a
/// legal sequence of host calls; encountering one aborts the game rather
/// than being reported as a rejected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("cell {cell} is already occupied")]
    CellAlreadyOccupied { cell: Cell },
    #[error("player {0:?} has no remaining pieces but was asked to move")]
    NoPiecesRemaining(PlayerId),
    #[error("turn index {0} is out of range for {1} players")]
    TurnIndexOutOfRange(usize, usize),
    #[error("move history and applied board state have diverged")]
    HistoryDesync,
}
