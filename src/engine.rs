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

//! The thin orchestrator a host drives (spec §4.8): [`Engine`] owns a
//! [`GameState`] plus one [`Strategy`] per AI seat, applies moves
//! transactionally, and appends an ordered [`Event`] stream a host can
//! replay or forward to observers.
//!
//! Event sequence numbers are a single counter shared by every
//! subscriber (DESIGN.md resolves spec §9's open question on ordering in
//! favor of one global order). Timestamps are nanoseconds since the Unix
//! epoch rather than a formatted ISO-8601 string: no ISO-8601 formatting
//! crate is part of this crate's dependency stack, and pulling one in
//! only to format a log-adjacent timestamp would mean fabricating a
//! dependency no sibling in this corpus reaches for.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::ai::{self, EasyStrategy, HardStrategy, MediumStrategy, Strategy};
use crate::board::{Board, Cell};
use crate::error::{AITimeout, IllegalOperation};
use crate::game::{ApplyMoveError, GameState, Move, Phase};
use crate::piece::{catalog, PieceId};
use crate::player::{Player, PlayerId};
use crate::scoring::{score, ScoreBreakdown};
use crate::validator;

pub type EventId = u64;

/// Which seat kind a player occupies: a human driven by host input, or
/// an AI driven by a [`Strategy`] on `request_ai_move`.
pub enum Seat {
    Human,
    Ai(Box<dyn Strategy + Send>),
}

impl std::fmt::Debug for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seat::Human => write!(f, "Seat::Human"),
            Seat::Ai(s) => write!(f, "Seat::Ai({})", s.name()),
        }
    }
}

/// The difficulty presets a host can pick for an AI seat, matching the
/// three strategies spec §4.7 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    /// Hard with the opt-in 2-ply best-reply search (spec §4.7, §9 open
    /// question 2, resolved in DESIGN.md as an opt-in flag).
    HardTwoPly,
}

impl Difficulty {
    fn build(self, seed: Option<u64>) -> Box<dyn Strategy + Send> {
        match self {
            Difficulty::Easy => Box::new(EasyStrategy::new(seed)),
            Difficulty::Medium => Box::new(MediumStrategy::new()),
            Difficulty::Hard => Box::new(HardStrategy::new()),
            Difficulty::HardTwoPly => Box::new(HardStrategy::new().with_two_ply(true)),
        }
    }
}

/// One seat's setup: a display name and whether it's human- or
/// AI-controlled.
#[derive(Debug, Clone)]
pub struct SeatConfig {
    pub name: String,
    pub ai: Option<Difficulty>,
}

impl SeatConfig {
    pub fn human(name: impl Into<String>) -> Self {
        Self { name: name.into(), ai: None }
    }

    pub fn ai(name: impl Into<String>, difficulty: Difficulty) -> Self {
        Self { name: name.into(), ai: Some(difficulty) }
    }
}

/// Configuration for [`Engine::new_game`]: 2-4 seats plus an optional RNG
/// seed (spec §6's `BLOKUS_SEED`) for reproducible Easy-strategy play.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seats: Vec<SeatConfig>,
    pub seed: Option<u64>,
}

impl GameConfig {
    /// A 4-AI game with mixed difficulties, for the `--spectate` CLI
    /// flag (spec §6).
    pub fn spectate(seed: Option<u64>) -> Self {
        Self {
            seats: vec![
                SeatConfig::ai("Easy Bot", Difficulty::Easy),
                SeatConfig::ai("Medium Bot", Difficulty::Medium),
                SeatConfig::ai("Hard Bot", Difficulty::Hard),
                SeatConfig::ai("Hard+ Bot", Difficulty::HardTwoPly),
            ],
            seed,
        }
    }
}

/// The outcome of a single placement attempt, recorded verbatim in a
/// [`EventKind::PlacementAttempted`] event whether it succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOutcome {
    Accepted,
    Rejected { code: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    PieceSelected {
        player: PlayerId,
        piece: PieceId,
    },
    PlacementAttempted {
        player: PlayerId,
        piece: PieceId,
        anchor: Cell,
        result: PlacementOutcome,
    },
    PlacementApplied {
        player: PlayerId,
        piece: PieceId,
        cells: Vec<Cell>,
    },
    TurnAdvanced {
        next_player: PlayerId,
    },
    PlayerPassed {
        player: PlayerId,
    },
    AIThinkingStarted {
        player: PlayerId,
        strategy: &'static str,
    },
    AIThinkingEnded {
        player: PlayerId,
        strategy: &'static str,
        chosen: Move,
    },
    GameEnded {
        winners: Vec<PlayerId>,
        breakdown: Vec<(PlayerId, ScoreBreakdown)>,
    },
}

/// A single append-only, totally ordered entry in the engine's event
/// stream (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp_unix_nanos: u128,
    pub kind: EventKind,
}

fn now_unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// A player's view of the board, reduced to the fields the wire format
/// in spec §6 names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: crate::player::PlayerColor,
    pub origin: Cell,
    pub score: ScoreBreakdown,
    pub has_passed: bool,
    pub has_made_first_move: bool,
    pub remaining: Vec<PieceId>,
    pub placed: Vec<crate::player::PlacedPiece>,
}

impl PlayerView {
    fn from_player(p: &Player) -> Self {
        let mut remaining: Vec<PieceId> = p.remaining().iter().copied().collect();
        remaining.sort_unstable();
        Self {
            id: p.id(),
            name: p.name().to_string(),
            color: p.color(),
            origin: p.origin(),
            score: score(p),
            has_passed: p.has_passed(),
            has_made_first_move: p.has_made_first_move(),
            remaining,
            placed: p.placed().to_vec(),
        }
    }
}

/// The read-only state snapshot format from spec §6: phase, current
/// player, every player's view, the 20x20 owner grid, and full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub current_player: PlayerId,
    pub players: Vec<PlayerView>,
    pub board: Vec<Vec<u8>>,
    pub history: Vec<Move>,
    pub winner_ids: Vec<PlayerId>,
}

fn board_grid(board: &Board) -> Vec<Vec<u8>> {
    (0..crate::board::BOARD_SIZE as u8)
        .map(|r| {
            (0..crate::board::BOARD_SIZE as u8)
                .map(|c| {
                    board
                        .owner(Cell::new(r, c))
                        .map(|p| p.index() as u8 + 1)
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect()
}

/// The facade a host drives (spec §4.8). Owns the [`GameState`], one
/// [`Seat`] per player, and the event log.
pub struct Engine {
    state: GameState,
    seats: Vec<Seat>,
    events: Vec<Event>,
    next_event_id: EventId,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("phase", &self.state.phase())
            .field("seats", &self.seats.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Engine {
    pub fn new_game(config: GameConfig) -> Result<Self, IllegalOperation> {
        let names = config.seats.iter().map(|s| s.name.clone()).collect();
        let state = GameState::new(names)?;
        let seats = config
            .seats
            .into_iter()
            .map(|s| match s.ai {
                Some(difficulty) => Seat::Ai(difficulty.build(config.seed)),
                None => Seat::Human,
            })
            .collect();
        Ok(Self { state, seats, events: Vec::new(), next_event_id: 0 })
    }

    fn push_event(&mut self, kind: EventKind) {
        let id = self.next_event_id;
        self.next_event_id += 1;
        debug!("event #{id}: {kind:?}");
        self.events.push(Event { id, timestamp_unix_nanos: now_unix_nanos(), kind });
    }

    pub fn start(&mut self) -> Result<(), IllegalOperation> {
        self.state.start()?;
        info!("game started with {} seats", self.seats.len());
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn current_player(&self) -> &Player {
        self.state.current_player()
    }

    /// Lazy legal-move enumeration for UI previews/highlighting (spec
    /// §4.8); nothing is computed until the caller polls the iterator.
    pub fn legal_moves(&self, player: PlayerId) -> impl Iterator<Item = Move> + '_ {
        validator::enumerate_legal_moves(self.state.board(), self.state.player(player))
    }

    /// Non-mutating legality check for a candidate placement, for UI
    /// hover previews. Never appends an event: previewing is a pure
    /// query, not an attempt.
    pub fn preview(
        &self,
        player: PlayerId,
        piece: PieceId,
        rotation: u16,
        flipped: bool,
        anchor: Cell,
    ) -> Result<(), ApplyMoveError> {
        let (_, orientation) = catalog()
            .orientation_for(piece, rotation, flipped)
            .ok_or(IllegalOperation::UnknownOrientation(piece, rotation, flipped))?;
        validator::validate(self.state.board(), self.state.player(player), orientation, anchor)?;
        Ok(())
    }

    /// Attempts to place `piece` under `(rotation, flipped)` at `anchor`
    /// for `player`. Emits `PlacementAttempted` unconditionally, then
    /// `PlacementApplied` and `TurnAdvanced` (and `GameEnded` if the game
    /// just ended) only on success (spec §4.8, §7's transactional move
    /// application).
    pub fn apply(
        &mut self,
        player: PlayerId,
        piece: PieceId,
        rotation: u16,
        flipped: bool,
        anchor: Cell,
    ) -> Result<Snapshot, ApplyMoveError> {
        self.push_event(EventKind::PieceSelected { player, piece });
        self.apply_placement(player, piece, rotation, flipped, anchor)?;
        Ok(self.snapshot())
    }

    fn record_ended_if_needed(&mut self) {
        if self.state.phase() == Phase::Ended && !self.events.iter().any(|e| matches!(e.kind, EventKind::GameEnded { .. })) {
            let breakdown: Vec<(PlayerId, ScoreBreakdown)> =
                self.state.players().iter().map(|p| (p.id(), score(p))).collect();
            let winners = self.state.winner_ids().to_vec();
            info!("game ended, winners {winners:?}");
            self.push_event(EventKind::GameEnded { winners, breakdown });
        }
    }

    pub fn pass_turn(&mut self, player: PlayerId) -> Result<(), ApplyMoveError> {
        self.state.apply_move(Move::Pass { player })?;
        self.push_event(EventKind::PlayerPassed { player });
        if self.state.phase() == Phase::Playing {
            self.push_event(EventKind::TurnAdvanced { next_player: self.state.current_player_id() });
        }
        self.record_ended_if_needed();
        Ok(())
    }

    /// Asks the current player's AI seat for a move and applies it.
    /// Never panics and never mutates state on failure: a panicking or
    /// timed-out strategy degrades to the fallback ladder in
    /// [`ai::choose_with_fallback`], logged as an [`AITimeout`]-shaped
    /// warning rather than propagated.
    pub fn request_ai_move(&mut self, deadline: Option<Duration>) -> Result<Move, IllegalOperation> {
        if self.state.phase() != Phase::Playing {
            return Err(IllegalOperation::GameNotStarted);
        }
        let player = self.state.current_player_id();
        let seat_index = player.index();
        let (strategy_name, budget) = match &self.seats[seat_index] {
            Seat::Ai(s) => (s.name(), deadline.unwrap_or_else(|| s.default_time_budget())),
            Seat::Human => return Err(IllegalOperation::NotYourTurn(player, player)),
        };
        let computed_deadline = Instant::now() + budget;

        self.push_event(EventKind::AIThinkingStarted { player, strategy: strategy_name });
        let chosen = {
            let Seat::Ai(strategy) = &mut self.seats[seat_index] else {
                unreachable!("seat kind checked above")
            };
            ai::choose_with_fallback(strategy.as_mut(), &self.state, player, computed_deadline)
        };
        if Instant::now() > computed_deadline {
            warn!("{}", AITimeout { player });
        }
        self.push_event(EventKind::AIThinkingEnded { player, strategy: strategy_name, chosen });

        match chosen {
            Move::Pass { .. } => {
                self.pass_turn(player).map_err(|e| match e {
                    ApplyMoveError::Illegal(i) => i,
                    other => {
                        warn!("AI pass rejected unexpectedly: {other}");
                        IllegalOperation::GameAlreadyEnded
                    }
                })?;
            }
            Move::Place { piece, rotation, flipped, anchor, .. } => {
                self.apply_placement(player, piece, rotation, flipped, anchor)
                    .map_err(|e| match e {
                        ApplyMoveError::Illegal(i) => i,
                        other => {
                            warn!("AI placement rejected unexpectedly: {other}");
                            IllegalOperation::GameAlreadyEnded
                        }
                    })?;
            }
        }
        Ok(chosen)
    }

    fn apply_placement(
        &mut self,
        player: PlayerId,
        piece: PieceId,
        rotation: u16,
        flipped: bool,
        anchor: Cell,
    ) -> Result<(), ApplyMoveError> {
        let (orientation_index, orientation) = catalog()
            .orientation_for(piece, rotation, flipped)
            .ok_or(IllegalOperation::UnknownOrientation(piece, rotation, flipped))?;
        let validation = validator::validate(self.state.board(), self.state.player(player), orientation, anchor);

        let outcome = match &validation {
            Ok(()) => PlacementOutcome::Accepted,
            Err(e) => PlacementOutcome::Rejected { code: e.code(), message: e.to_string() },
        };
        self.push_event(EventKind::PlacementAttempted { player, piece, anchor, result: outcome });
        validation?;

        let mv = Move::Place {
            player,
            piece,
            orientation_index,
            rotation: orientation.rotation,
            flipped: orientation.flipped,
            anchor,
        };
        let cells: Vec<Cell> = orientation
            .place_cells(anchor.row() as i32, anchor.col() as i32)
            .into_iter()
            .map(|(r, c)| Cell::new(r as u8, c as u8))
            .collect();

        self.state.apply_move(mv)?;
        self.push_event(EventKind::PlacementApplied { player, piece, cells });
        if self.state.phase() == Phase::Playing {
            self.push_event(EventKind::TurnAdvanced { next_player: self.state.current_player_id() });
        }
        self.record_ended_if_needed();
        Ok(())
    }

    pub fn score_breakdown(&self, player: PlayerId) -> ScoreBreakdown {
        score(self.state.player(player))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.state.phase(),
            current_player: self.state.current_player_id(),
            players: self.state.players().iter().map(PlayerView::from_player).collect(),
            board: board_grid(self.state.board()),
            history: self.state.history().to_vec(),
            winner_ids: self.state.winner_ids().to_vec(),
        }
    }

    pub fn game_state(&self) -> &GameState {
        &self.state
    }
}
