/// Opaque block identifier. The engine stores these without interpreting them.
/// Game-specific layers assign meaning to specific IDs (e.g. 0 = air, 12 = sand).
///
/// Ids below 256 live directly in the grid's base byte array. Ids from 256 up
/// are "extended": the base array holds a marker byte and the low byte lives
/// in a sparse 16x16x16 section (see `VoxelGrid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The universal "empty" block.
    pub const AIR: BlockId = BlockId(0);

    /// Returned for reads outside the grid. Behaves like air for neighbour reads but
    /// is never written into a grid.
    pub const INVALID: BlockId = BlockId(u16::MAX);

    /// Number of ids addressable through the base byte array.
    pub const BASE_COUNT: u16 = 256;

    /// Highest id the extended storage can represent (3 marker ranges).
    pub const MAX_EXTENDED: u16 = 1023;

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn is_extended(self) -> bool {
        self.0 >= Self::BASE_COUNT && self.0 != u16::MAX
    }

    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.0 == u16::MAX
    }

    /// Air or out-of-world.
    #[inline]
    pub const fn is_air_like(self) -> bool {
        self.0 == 0 || self.0 == u16::MAX
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_invalid() {
            write!(f, "invalid")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
