/// Absolute block position in a level. Signed so that handlers can look
/// one cell past any edge without wrapping; the grid rejects such positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Neighbour fan-out order used by every notification in the engine.
pub const FAN_OUT: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// The four horizontal directions (±X, ±Z), in fan-out order.
pub const HORIZONTAL: [(i32, i32, i32); 4] = [(1, 0, 0), (-1, 0, 0), (0, 0, 1), (0, 0, -1)];

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn above(&self) -> Self {
        self.offset(0, 1, 0)
    }

    pub const fn below(&self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The six cardinal neighbors, in `FAN_OUT` order.
    pub const fn neighbors(&self) -> [BlockPos; 6] {
        [
            Self::new(self.x + 1, self.y, self.z),
            Self::new(self.x - 1, self.y, self.z),
            Self::new(self.x, self.y + 1, self.z),
            Self::new(self.x, self.y - 1, self.z),
            Self::new(self.x, self.y, self.z + 1),
            Self::new(self.x, self.y, self.z - 1),
        ]
    }

    /// The four horizontal neighbors (±X, ±Z).
    pub const fn horizontal(&self) -> [BlockPos; 4] {
        [
            Self::new(self.x + 1, self.y, self.z),
            Self::new(self.x - 1, self.y, self.z),
            Self::new(self.x, self.y, self.z + 1),
            Self::new(self.x, self.y, self.z - 1),
        ]
    }

    /// Squared euclidean distance.
    pub const fn dist_sq(&self, other: &BlockPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Position of the 16x16x16 section containing this block.
    pub const fn section(&self) -> SectionPos {
        SectionPos {
            x: self.x >> 4,
            y: self.y >> 4,
            z: self.z >> 4,
        }
    }
}

/// Section coordinates (each section is a 16x16x16 cube).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}
