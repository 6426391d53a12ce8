/// Number of blocks along each axis of a section.
pub const SECTION_SIZE: usize = 16;
/// Total cell count in one section.
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// A 16x16x16 cube of low bytes for extended block ids.
///
/// Stored as a flat array in XZY order, matching the grid's own layout.
/// A cell holding 0 means "no extended block here"; the base array decides
/// whether the cell is extended at all.
#[derive(Clone)]
pub struct ChunkSection {
    bytes: Box<[u8; SECTION_VOLUME]>,
    used: u16,
}

impl ChunkSection {
    pub fn new_empty() -> Self {
        Self {
            bytes: Box::new([0; SECTION_VOLUME]),
            used: 0,
        }
    }

    #[inline]
    pub const fn local_index(x: usize, y: usize, z: usize) -> usize {
        (y & 0xF) * SECTION_SIZE * SECTION_SIZE + (z & 0xF) * SECTION_SIZE + (x & 0xF)
    }

    #[inline]
    pub fn get(&self, local: usize) -> u8 {
        self.bytes[local]
    }

    /// Stores a low byte and tracks how many cells are occupied. The marker
    /// byte in the base array is what flags a cell as extended, so occupancy
    /// is tracked separately from the stored value.
    pub fn set(&mut self, local: usize, low: u8, occupied: bool, was_occupied: bool) {
        self.bytes[local] = low;
        match (was_occupied, occupied) {
            (false, true) => self.used += 1,
            (true, false) => self.used = self.used.saturating_sub(1),
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub fn as_bytes(&self) -> &[u8; SECTION_VOLUME] {
        &self.bytes
    }

    pub fn from_bytes(bytes: Box<[u8; SECTION_VOLUME]>, used: u16) -> Self {
        Self { bytes, used }
    }
}
