use serde::{Deserialize, Serialize};

/// Discretized cell of the grid. `x` and `z` count cells of the size used at
/// `lod`, starting from the configured origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadCoord {
    pub x: i32,
    pub z: i32,
    pub lod: i32,
}

impl QuadCoord {
    /// Coordinate of everything that does not fit the grid.
    pub const OUTSIDER: QuadCoord = QuadCoord { x: 0, z: 0, lod: -1 };

    pub const fn new(x: i32, z: i32, lod: i32) -> Self {
        Self { x, z, lod }
    }

    #[inline(always)]
    pub fn is_outsider(&self) -> bool {
        self.lod < 0
    }

    pub fn parent(&self) -> QuadCoord {
        QuadCoord::new(self.x >> 1, self.z >> 1, self.lod + 1)
    }

    #[inline(always)]
    pub fn children(&self) -> [QuadCoord; 4] {
        let (x, z, lod) = (self.x * 2, self.z * 2, self.lod - 1);
        [
            QuadCoord::new(x, z, lod),
            QuadCoord::new(x + 1, z, lod),
            QuadCoord::new(x, z + 1, lod),
            QuadCoord::new(x + 1, z + 1, lod),
        ]
    }
}
