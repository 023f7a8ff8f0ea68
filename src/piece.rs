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

//! The 21-piece catalog and the rigid transforms (rotate/mirror) used to
//! turn each canonical shape into its distinct orientations.
//!
//! Mirror is always applied before rotation (spec §3): an `Orientation`'s
//! `rotation` field describes a rotation of the *already-mirrored* shape.
//! Orientations are computed once per process by [`catalog()`] and shared
//! immutably from there on; nothing here allocates per move.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// The 21 canonical Blokus piece identifiers, in the order spec.md §6
/// lists them. This declaration order is the "piece id" ordering that
/// [`crate::validator::enumerate_legal_moves`] iterates in.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum PieceId {
    I1,
    I2,
    I3,
    I4,
    I5,
    L4,
    L5,
    T4,
    T5,
    Z4,
    Z5,
    V3,
    V4,
    V5,
    U5,
    W4,
    W5,
    X5,
    Y5,
    F5,
    P5,
}

pub const NUM_PIECES: usize = 21;

impl PieceId {
    #[inline]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        PieceId::iter().nth(index)
    }

    pub fn all() -> impl Iterator<Item = PieceId> {
        PieceId::iter()
    }

    /// Number of cells the canonical shape occupies.
    pub fn cell_count(&self) -> usize {
        canonical_shape(*self).len()
    }
}

/// The canonical (unrotated, unmirrored) shape for each piece, as
/// `(row, col)` offsets already normalized to a minimum of `(0, 0)`.
///
/// Distribution: 1 monomino, 1 domino, 2 trominoes (`I3`, `V3`), 5
/// tetrominoes (`I4`, `L4`, `T4`, `V4` the square, `Z4`), and the 12 free
/// pentominoes. `W4` is, despite its name, a pentomino (the "N" shape) and
/// `W5` is the staircase ("W") pentomino; see DESIGN.md for why the two
/// identifiers that don't encode their own cell count resolve this way.
fn canonical_shape(id: PieceId) -> &'static [(i32, i32)] {
    use PieceId::*;
    match id {
        I1 => &[(0, 0)],
        I2 => &[(0, 0), (1, 0)],
        I3 => &[(0, 0), (1, 0), (2, 0)],
        V3 => &[(0, 0), (1, 0), (1, 1)],
        I4 => &[(0, 0), (1, 0), (2, 0), (3, 0)],
        L4 => &[(0, 0), (1, 0), (2, 0), (2, 1)],
        T4 => &[(0, 0), (0, 1), (0, 2), (1, 1)],
        V4 => &[(0, 0), (0, 1), (1, 0), (1, 1)],
        Z4 => &[(0, 1), (0, 2), (1, 0), (1, 1)],
        I5 => &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)],
        L5 => &[(0, 0), (1, 0), (2, 0), (3, 0), (3, 1)],
        T5 => &[(0, 0), (0, 1), (0, 2), (1, 1), (2, 1)],
        Z5 => &[(0, 1), (0, 2), (1, 1), (2, 0), (2, 1)],
        V5 => &[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)],
        U5 => &[(0, 0), (0, 2), (1, 0), (1, 1), (1, 2)],
        W4 => &[(0, 1), (1, 1), (2, 0), (2, 1), (3, 0)],
        W5 => &[(0, 0), (1, 0), (1, 1), (2, 1), (2, 2)],
        X5 => &[(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)],
        Y5 => &[(0, 1), (1, 0), (1, 1), (2, 1), (3, 1)],
        F5 => &[(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)],
        P5 => &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 0)],
    }
}

#[inline]
fn mirror(cells: &[(i32, i32)]) -> Vec<(i32, i32)> {
    cells.iter().map(|&(r, c)| (r, -c)).collect()
}

#[inline]
fn rotate90(cells: &[(i32, i32)]) -> Vec<(i32, i32)> {
    cells.iter().map(|&(r, c)| (c, -r)).collect()
}

fn normalize(cells: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let min_r = cells.iter().map(|c| c.0).min().unwrap_or(0);
    let min_c = cells.iter().map(|c| c.1).min().unwrap_or(0);
    let mut out: Vec<(i32, i32)> = cells.iter().map(|&(r, c)| (r - min_r, c - min_c)).collect();
    out.sort_unstable();
    out
}

/// A piece shape under one of the (up to eight) rigid transforms: a
/// rotation of the shape after an optional horizontal mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orientation {
    /// Rotation applied after the mirror, in degrees: 0, 90, 180 or 270.
    pub rotation: u16,
    pub flipped: bool,
    cells: Vec<(i32, i32)>,
    /// `(height, width)` of the normalized shape's bounding box.
    pub bbox: (u8, u8),
}

impl Orientation {
    pub fn cells(&self) -> &[(i32, i32)] {
        &self.cells
    }

    /// Absolute `(row, col)` pairs for this orientation anchored at
    /// `(anchor_row, anchor_col)`. These may fall out of board bounds;
    /// bounds checking is the validator's job (R1), not this function's.
    pub fn place_cells(&self, anchor_row: i32, anchor_col: i32) -> Vec<(i32, i32)> {
        self.cells
            .iter()
            .map(|&(r, c)| (r + anchor_row, c + anchor_col))
            .collect()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rot{}{}",
            self.rotation,
            if self.flipped { "+flip" } else { "" }
        )
    }
}

/// Precomputed, deduplicated orientations for a single piece, in a fixed,
/// deterministic order: flip (false then true) outer, rotation (0, 90,
/// 180, 270) inner, duplicates dropped on first repeat.
fn compute_orientations(id: PieceId) -> Vec<Orientation> {
    let base = canonical_shape(id).to_vec();
    let mut seen: Vec<Vec<(i32, i32)>> = Vec::with_capacity(8);
    let mut out = Vec::with_capacity(8);

    for flipped in [false, true] {
        let mirrored = if flipped { mirror(&base) } else { base.clone() };
        let mut rotated = mirrored;
        for step in 0..4u16 {
            let normalized = normalize(&rotated);
            if !seen.contains(&normalized) {
                let max_r = normalized.iter().map(|c| c.0).max().unwrap_or(0);
                let max_c = normalized.iter().map(|c| c.1).max().unwrap_or(0);
                seen.push(normalized.clone());
                out.push(Orientation {
                    rotation: step * 90,
                    flipped,
                    cells: normalized,
                    bbox: ((max_r + 1) as u8, (max_c + 1) as u8),
                });
            }
            rotated = rotate90(&rotated);
        }
    }
    out
}

/// The immutable, shared catalog of all 21 pieces' distinct orientations.
pub struct PieceCatalog {
    orientations: Vec<Vec<Orientation>>,
}

impl PieceCatalog {
    fn build() -> Self {
        let orientations = PieceId::all().map(compute_orientations).collect();
        Self { orientations }
    }

    /// The deterministic, deduplicated sequence of distinct orientations
    /// for `piece`. Length is 1, 2, 4 or 8 depending on the shape's
    /// symmetry.
    pub fn orientations(&self, piece: PieceId) -> &[Orientation] {
        &self.orientations[piece.index()]
    }

    pub fn cell_count(&self, piece: PieceId) -> usize {
        // Every orientation has the same cell count; just look at the first.
        self.orientations[piece.index()][0].cells().len()
    }

    /// Finds the distinct orientation matching `piece` under `rotation`
    /// degrees (applied after an optional mirror), the way a host encodes
    /// the spec's `(rotation, flip)` orientation pair. Because
    /// [`compute_orientations`] dedupes symmetric duplicates, the exact
    /// `(rotation, flipped)` pair a caller asks for may have collapsed
    /// into an earlier-stored entry tagged with a different pair that
    /// produces the identical shape; this recomputes the shape and
    /// matches on cells rather than on the stored tag.
    pub fn orientation_for(
        &self,
        piece: PieceId,
        rotation: u16,
        flipped: bool,
    ) -> Option<(usize, &Orientation)> {
        if rotation % 90 != 0 || rotation >= 360 {
            return None;
        }
        let base = canonical_shape(piece).to_vec();
        let mut rotated = if flipped { mirror(&base) } else { base };
        for _ in 0..(rotation / 90) {
            rotated = rotate90(&rotated);
        }
        let target = normalize(&rotated);
        self.orientations[piece.index()]
            .iter()
            .enumerate()
            .find(|(_, o)| o.cells() == target.as_slice())
    }
}

static CATALOG: Lazy<PieceCatalog> = Lazy::new(PieceCatalog::build);

/// The process-wide piece catalog, computed once on first access.
pub fn catalog() -> &'static PieceCatalog {
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_21_named_pieces() {
        assert_eq!(PieceId::all().count(), NUM_PIECES);
    }

    #[test]
    fn cell_counts_sum_to_89() {
        let total: usize = PieceId::all().map(|p| p.cell_count()).sum();
        assert_eq!(total, 89);
    }

    #[test]
    fn tromino_and_pentomino_distribution() {
        let mut by_size = [0usize; 6];
        for p in PieceId::all() {
            by_size[p.cell_count()] += 1;
        }
        assert_eq!(by_size[1], 1);
        assert_eq!(by_size[2], 1);
        assert_eq!(by_size[3], 2);
        assert_eq!(by_size[4], 5);
        assert_eq!(by_size[5], 12);
    }

    #[test]
    fn orientation_counts_are_1_2_4_or_8() {
        for p in PieceId::all() {
            let n = catalog().orientations(p).len();
            assert!(matches!(n, 1 | 2 | 4 | 8), "{p} had {n} orientations");
        }
    }

    #[test]
    fn x5_has_one_orientation() {
        // The plus-shaped pentomino is fully symmetric.
        assert_eq!(catalog().orientations(PieceId::X5).len(), 1);
    }

    #[test]
    fn i1_has_one_orientation() {
        assert_eq!(catalog().orientations(PieceId::I1).len(), 1);
    }

    #[test]
    fn l4_canonical_shape_matches_spec_example() {
        let orientations = catalog().orientations(PieceId::L4);
        let identity = orientations
            .iter()
            .find(|o| o.rotation == 0 && !o.flipped)
            .unwrap();
        let mut cells = identity.cells().to_vec();
        cells.sort_unstable();
        assert_eq!(cells, vec![(0, 0), (1, 0), (2, 0), (2, 1)]);
    }

    #[test]
    fn four_rotations_return_to_identity() {
        let base = normalize(canonical_shape(PieceId::L5));
        let mut cells = base.clone();
        for _ in 0..4 {
            cells = normalize(&rotate90(&cells));
        }
        assert_eq!(cells, base);
    }

    #[test]
    fn double_mirror_returns_to_identity() {
        let base = normalize(canonical_shape(PieceId::F5));
        let once = normalize(&mirror(&base));
        let twice = normalize(&mirror(&once));
        assert_eq!(twice, base);
    }

    #[test]
    fn mirror_then_rotate_matches_spec_scenario_6() {
        let base = canonical_shape(PieceId::L4).to_vec();
        let mirrored = mirror(&base);
        let rotated = rotate90(&mirrored);
        let mut got = normalize(&rotated);
        got.sort_unstable();
        let mut want = vec![(0, 0), (1, 0), (1, 1), (1, 2)];
        want.sort_unstable();
        assert_eq!(got, want);
    }

    #[test]
    fn place_cells_offsets_by_anchor() {
        let orientation = &catalog().orientations(PieceId::I2)[0];
        let placed = orientation.place_cells(5, 7);
        assert!(placed.contains(&(5, 7)));
        assert_eq!(placed.len(), 2);
    }

    #[test]
    fn orientation_for_finds_exact_tag_when_present() {
        let (_, orientation) = catalog().orientation_for(PieceId::L4, 90, false).unwrap();
        assert_eq!(orientation.rotation, 90);
        assert!(!orientation.flipped);
    }

    #[test]
    fn orientation_for_matches_symmetric_piece_regardless_of_requested_flip() {
        // X5 is fully symmetric: every (rotation, flip) pair produces the
        // single stored orientation.
        let (index_a, _) = catalog().orientation_for(PieceId::X5, 0, false).unwrap();
        let (index_b, _) = catalog().orientation_for(PieceId::X5, 180, true).unwrap();
        assert_eq!(index_a, index_b);
    }

    #[test]
    fn orientation_for_rejects_non_right_angle_rotation() {
        assert!(catalog().orientation_for(PieceId::I1, 45, false).is_none());
    }

    #[test]
    fn orientation_order_is_deterministic_across_calls() {
        let a = compute_orientations(PieceId::Y5);
        let b = compute_orientations(PieceId::Y5);
        assert_eq!(a, b);
    }
}
