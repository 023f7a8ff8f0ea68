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

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;
use crate::player::PlayerId;

pub const BOARD_SIZE: usize = 20;
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// A single square of the 20-by-20 board, addressed by (row, col) with
/// row 0 at the top and col 0 at the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    row: u8,
    col: u8,
}

impl Cell {
    #[inline]
    pub const fn new(row: u8, col: u8) -> Self {
        debug_assert!((row as usize) < BOARD_SIZE);
        debug_assert!((col as usize) < BOARD_SIZE);
        Self { row, col }
    }

    #[inline]
    pub const fn row(&self) -> u8 {
        self.row
    }

    #[inline]
    pub const fn col(&self) -> u8 {
        self.col
    }

    #[inline]
    pub const fn to_index(&self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < NUM_CELLS);
        Self::new((index / BOARD_SIZE) as u8, (index % BOARD_SIZE) as u8)
    }

    /// The four origin corners a first move must cover one of, in player
    /// seating order: top-left, top-right, bottom-right, bottom-left.
    pub const fn origin_corners() -> [Self; 4] {
        [
            Self::new(0, 0),
            Self::new(0, (BOARD_SIZE - 1) as u8),
            Self::new((BOARD_SIZE - 1) as u8, (BOARD_SIZE - 1) as u8),
            Self::new((BOARD_SIZE - 1) as u8, 0),
        ]
    }

    /// Cells sharing an edge with this one (up to four, fewer at the
    /// board's perimeter).
    pub fn edge_neighbors(&self) -> impl Iterator<Item = Cell> {
        let row = self.row as isize;
        let col = self.col as isize;
        [(row - 1, col), (row + 1, col), (row, col - 1), (row, col + 1)]
            .into_iter()
            .filter_map(|(r, c)| Self::try_from_rc(r, c))
    }

    /// Cells sharing only a corner with this one (up to four).
    pub fn diagonal_neighbors(&self) -> impl Iterator<Item = Cell> {
        let row = self.row as isize;
        let col = self.col as isize;
        [
            (row - 1, col - 1),
            (row - 1, col + 1),
            (row + 1, col - 1),
            (row + 1, col + 1),
        ]
        .into_iter()
        .filter_map(|(r, c)| Self::try_from_rc(r, c))
    }

    #[inline]
    pub fn try_from_rc(row: isize, col: isize) -> Option<Self> {
        if row < 0 || col < 0 || row as usize >= BOARD_SIZE || col as usize >= BOARD_SIZE {
            return None;
        }
        Some(Self::new(row as u8, col as u8))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(r{}, c{})", self.row, self.col)
    }
}

const MASK_WORDS: usize = (NUM_CELLS + 63) / 64;

/// A 400-bit set of board cells, one bit per square. Generalizes the
/// single-word bitboard mask idiom to a board larger than 64 squares by
/// spreading the bits across seven `u64` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mask400([u64; MASK_WORDS]);

impl Mask400 {
    #[inline]
    pub const fn empty() -> Self {
        Self([0; MASK_WORDS])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> bool {
        let i = cell.to_index();
        (self.0[i / 64] >> (i % 64)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, cell: Cell) {
        let i = cell.to_index();
        self.0[i / 64] |= 1 << (i % 64);
    }

    #[inline]
    pub fn reset(&mut self, cell: Cell) {
        let i = cell.to_index();
        self.0[i / 64] &= !(1 << (i % 64));
    }

    pub fn iter(&self) -> Mask400Iter {
        Mask400Iter { words: self.0, idx: 0 }
    }

    /// True if this mask shares at least one set bit with `other`.
    pub fn intersects(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a & b != 0)
    }
}

impl BitOr for Mask400 {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        let mut out = self;
        for (a, b) in out.0.iter_mut().zip(rhs.0.iter()) {
            *a |= b;
        }
        out
    }
}

impl BitOrAssign for Mask400 {
    fn bitor_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a |= b;
        }
    }
}

impl BitAnd for Mask400 {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        let mut out = self;
        for (a, b) in out.0.iter_mut().zip(rhs.0.iter()) {
            *a &= b;
        }
        out
    }
}

impl Not for Mask400 {
    type Output = Self;
    fn not(self) -> Self::Output {
        let mut out = [0u64; MASK_WORDS];
        for (i, w) in self.0.iter().enumerate() {
            out[i] = !w;
        }
        // Clear the padding bits beyond NUM_CELLS in the last word.
        let last_valid_bits = NUM_CELLS % 64;
        if last_valid_bits != 0 {
            out[MASK_WORDS - 1] &= (1u64 << last_valid_bits) - 1;
        }
        Self(out)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Mask400Iter {
    words: [u64; MASK_WORDS],
    idx: usize,
}

impl Iterator for Mask400Iter {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < MASK_WORDS {
            let word = self.words[self.idx];
            if word != 0 {
                let bit = word.trailing_zeros() as usize;
                self.words[self.idx] &= word - 1;
                return Some(Cell::from_index(self.idx * 64 + bit));
            }
            self.idx += 1;
        }
        None
    }
}

/// The 20-by-20 occupancy grid plus per-player occupancy masks.
///
/// `owners` is the single source of truth for what is on the board; the
/// per-player [`Mask400`]s are kept in sync on every [`Board::place`]
/// and exist only to make adjacency queries and AI lookahead cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    owners: Vec<Option<PlayerId>>,
    occupied: Vec<Mask400>,
    fingerprint: u64,
}

impl Board {
    pub fn new(num_players: usize) -> Self {
        Self {
            owners: vec![None; NUM_CELLS],
            occupied: vec![Mask400::empty(); num_players],
            fingerprint: 0,
        }
    }

    #[inline]
    pub fn is_in_bounds(row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE
    }

    #[inline]
    pub fn is_empty(&self, cell: Cell) -> bool {
        self.owners[cell.to_index()].is_none()
    }

    #[inline]
    pub fn owner(&self, cell: Cell) -> Option<PlayerId> {
        self.owners[cell.to_index()]
    }

    pub fn occupied_by(&self, player: PlayerId) -> &Mask400 {
        &self.occupied[player.index()]
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Marks `cells` as owned by `player`. Every cell must currently be
    /// empty; violating that is an engine bug, not a rule violation, so
    /// it is reported as an [`InvariantViolation`] rather than a
    /// [`crate::validator::ValidationError`].
    pub fn place(&mut self, player: PlayerId, cells: &[Cell]) -> Result<(), InvariantViolation> {
        for &cell in cells {
            if !self.is_empty(cell) {
                return Err(InvariantViolation::CellAlreadyOccupied { cell });
            }
        }
        for &cell in cells {
            self.owners[cell.to_index()] = Some(player);
            self.occupied[player.index()].set(cell);
            self.fingerprint ^= zobrist_word(cell, player);
        }
        Ok(())
    }

    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> {
        cell.edge_neighbors()
    }
}

/// Deterministic per-(cell, player) fingerprint word, memoized once per
/// process. The table is derived from a fixed seed rather than sampled
/// fresh each run so that `Board::fingerprint()` is reproducible across
/// runs, which the easy strategy's move cache depends on.
fn zobrist_word(cell: Cell, player: PlayerId) -> u64 {
    use once_cell::sync::Lazy;
    static TABLE: Lazy<Vec<u64>> = Lazy::new(|| {
        // A small xorshift-style PRNG seeded with a fixed constant. Not
        // used for anything security sensitive, only for spreading bits
        // deterministically across the fingerprint table.
        let mut state: u64 = 0x9E3779B97F4A7C15;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        (0..NUM_CELLS * 4).map(|_| next()).collect()
    });
    TABLE[cell.to_index() * 4 + player.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_round_trips_through_index() {
        for idx in 0..NUM_CELLS {
            let cell = Cell::from_index(idx);
            assert_eq!(cell.to_index(), idx);
        }
    }

    #[test]
    fn origin_corners_are_the_four_corners() {
        let corners = Cell::origin_corners();
        assert_eq!(corners[0], Cell::new(0, 0));
        assert_eq!(corners[1], Cell::new(0, 19));
        assert_eq!(corners[2], Cell::new(19, 19));
        assert_eq!(corners[3], Cell::new(19, 0));
    }

    #[test]
    fn edge_neighbors_exclude_diagonals() {
        let center = Cell::new(10, 10);
        let neighbors: Vec<_> = center.edge_neighbors().collect();
        assert_eq!(neighbors.len(), 4);
        assert!(!neighbors.contains(&Cell::new(9, 9)));
    }

    #[test]
    fn corner_cell_has_two_edge_and_one_diagonal_neighbor() {
        let corner = Cell::new(0, 0);
        assert_eq!(corner.edge_neighbors().count(), 2);
        assert_eq!(corner.diagonal_neighbors().count(), 1);
    }

    #[test]
    fn mask400_set_get_roundtrip_across_word_boundary() {
        let mut mask = Mask400::empty();
        let cell = Cell::new(3, 3); // index 63, right at the word boundary
        mask.set(cell);
        assert!(mask.get(cell));
        assert_eq!(mask.len(), 1);
        let cell2 = Cell::new(3, 4); // index 64, first bit of next word
        mask.set(cell2);
        assert!(mask.get(cell2));
        assert_eq!(mask.len(), 2);
    }

    #[test]
    fn mask400_iter_yields_all_set_cells() {
        let mut mask = Mask400::empty();
        let cells = [Cell::new(0, 0), Cell::new(5, 5), Cell::new(19, 19)];
        for c in cells {
            mask.set(c);
        }
        let mut collected: Vec<_> = mask.iter().collect();
        collected.sort_by_key(|c| c.to_index());
        let mut expected: Vec<_> = cells.to_vec();
        expected.sort_by_key(|c| c.to_index());
        assert_eq!(collected, expected);
    }

    #[test]
    fn board_place_rejects_overlap() {
        let mut board = Board::new(4);
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        board.place(p0, &[Cell::new(0, 0)]).unwrap();
        assert!(board.place(p1, &[Cell::new(0, 0)]).is_err());
    }

    #[test]
    fn board_fingerprint_changes_on_place() {
        let mut board = Board::new(4);
        let before = board.fingerprint();
        board.place(PlayerId::new(0), &[Cell::new(0, 0)]).unwrap();
        assert_ne!(before, board.fingerprint());
    }
}
