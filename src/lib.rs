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

//! Core engine for a 2-to-4 player Blokus game
//!
//! This crate models the rules, turn structure, scoring and simple AI
//! opponents for Blokus. It is a pure library: no rendering, no
//! persistence, no network transport. A host application drives the
//! engine through [`engine::Engine`] and renders whatever it likes from
//! the snapshots and events that come back out.
//!
//! Key abstractions:
//!
//! * [`piece::PieceId`] enumerates the 21 canonical pieces. Each piece
//!   has up to eight distinct [`piece::Orientation`]s (four rotations,
//!   optionally mirrored first).
//! * [`board::Board`] holds the 20-by-20 grid of cell owners plus a
//!   per-player occupancy [`board::Mask400`] used for the adjacency
//!   checks the rule validator needs.
//! * [`validator`] implements the four ordered placement rules (bounds,
//!   overlap, corner connection, own-edge adjacency) as
//!   [`validator::ValidationError`] variants.
//! * [`game::GameState`] is the turn/phase state machine: `Setup` ->
//!   `Playing` -> `Ended`, tracking whose turn it is and who has passed.
//! * [`ai`] provides three [`ai::Strategy`] implementations (easy,
//!   medium, hard) that a host can plug in for any seat.
//! * [`engine::Engine`] is the facade: it owns a `GameState`, applies
//!   moves transactionally, and appends an ordered [`engine::Event`]
//!   stream a host can replay or stream to observers.

mod board;
mod piece;
mod player;
mod validator;
mod game;
mod scoring;
mod ai;
mod engine;
mod error;

pub use ai::{
    seed_from_env, EasyStrategy, HardStrategy, MediumStrategy, Strategy, EASY_TIME_BUDGET,
    HARD_TIME_BUDGET, MEDIUM_TIME_BUDGET,
};
pub use board::{Board, Cell, Mask400, BOARD_SIZE, NUM_CELLS};
pub use engine::{
    Difficulty, Engine, Event, EventId, EventKind, GameConfig, PlacementOutcome, PlayerView, Seat,
    SeatConfig, Snapshot,
};
pub use error::{AITimeout, IllegalOperation, InvariantViolation};
pub use game::{ApplyMoveError, GameState, Move, Phase};
pub use piece::{catalog, Orientation, PieceCatalog, PieceId, NUM_PIECES};
pub use player::{PlacedPiece, Player, PlayerColor, PlayerId};
pub use scoring::{score, ScoreBreakdown};
pub use validator::{enumerate_legal_moves, has_any_legal_move, validate, ValidationError};
