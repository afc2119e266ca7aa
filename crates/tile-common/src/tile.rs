//! Tile grid coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinates of a tile (column `tx`, row `ty`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub tx: u32,
    pub ty: u32,
}

impl TileCoord {
    pub fn new(tx: u32, ty: u32) -> Self {
        Self { tx, ty }
    }

    /// Chebyshev (chessboard) distance in tile units.
    pub fn chebyshev_distance(&self, other: &TileCoord) -> u32 {
        let dx = self.tx.abs_diff(other.tx);
        let dy = self.ty.abs_diff(other.ty);
        dx.max(dy)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tx, self.ty)
    }
}

impl From<(u32, u32)> for TileCoord {
    fn from((tx, ty): (u32, u32)) -> Self {
        Self { tx, ty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance() {
        let a = TileCoord::new(2, 2);
        assert_eq!(a.chebyshev_distance(&TileCoord::new(2, 2)), 0);
        assert_eq!(a.chebyshev_distance(&TileCoord::new(5, 3)), 3);
        assert_eq!(a.chebyshev_distance(&TileCoord::new(0, 6)), 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(TileCoord::new(3, 7).to_string(), "3/7");
    }
}
