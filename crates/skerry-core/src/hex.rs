//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the coordinate types the board builder works with:
//! - `HexCoord`: identifies individual hex tiles
//! - `CornerCoord`: identifies corners (settlement spots) shared by adjacent tiles
//!
//! We use axial coordinates because they make neighbor calculations elegant
//! and keep corner identity exact: with pointy-top hexes, every corner of the
//! grid is the North or South pole of exactly one hex, so `(hex, direction)`
//! is already a unique, integer-only key for a corner. Deduplicating shared
//! corners never compares floating-point positions.

use serde::{Deserialize, Serialize};

/// Which pole of a hex a corner sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerDir {
    /// Top corner of the hex
    North,
    /// Bottom corner of the hex
    South,
}

/// Axial coordinate for the hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six corners of this hex in clockwise ring order, starting at the
    /// North pole.
    ///
    /// Four of the six are expressed through neighboring hexes; each entry is
    /// the unique canonical identity of that corner. Walking this ring links
    /// each corner to the two corners exactly one edge away, which is the
    /// neighbor relation the settlement distance rule is built on.
    pub fn corners(&self) -> [CornerCoord; 6] {
        let Self { q, r } = *self;
        [
            CornerCoord::new(Self::new(q, r), CornerDir::North),
            CornerCoord::new(Self::new(q + 1, r - 1), CornerDir::South), // via NE neighbor
            CornerCoord::new(Self::new(q, r + 1), CornerDir::North),    // via SE neighbor
            CornerCoord::new(Self::new(q, r), CornerDir::South),
            CornerCoord::new(Self::new(q - 1, r + 1), CornerDir::North), // via SW neighbor
            CornerCoord::new(Self::new(q, r - 1), CornerDir::South),     // via NW neighbor
        ]
    }

    /// Convert to pixel coordinates (center of hex).
    /// Uses pointy-top orientation with the given hex size (radius).
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * (3.0_f64.sqrt() * self.q as f64 + 3.0_f64.sqrt() / 2.0 * self.r as f64);
        let y = hex_size * (3.0 / 2.0 * self.r as f64);
        (x, y)
    }
}

/// Corner coordinate - identifies a corner where up to 3 hexes meet.
///
/// Corners are where settlements are placed. The `(hex, direction)` pair is
/// unique per geometric corner, so equality and hashing work without any
/// canonicalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CornerCoord {
    /// The hex whose pole this corner is
    pub hex: HexCoord,
    /// North or South pole of that hex
    pub dir: CornerDir,
}

impl CornerCoord {
    /// Create a new corner coordinate
    pub const fn new(hex: HexCoord, dir: CornerDir) -> Self {
        Self { hex, dir }
    }

    /// Convert to pixel coordinates
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let (hx, hy) = self.hex.to_pixel(hex_size);
        match self.dir {
            CornerDir::North => (hx, hy - hex_size),
            CornerDir::South => (hx, hy + hex_size),
        }
    }
}
