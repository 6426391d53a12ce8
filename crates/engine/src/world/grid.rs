use super::block::BlockId;
use super::chunk::{ChunkSection, SECTION_SIZE};
use super::position::BlockPos;
use thiserror::Error;

/// Base bytes that redirect a cell into extended storage. Marker `k` covers
/// ids `256 * (k + 1) .. 256 * (k + 2)`.
pub const EXT_MARKERS: [u8; 3] = [163, 198, 199];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be non-zero (got {0}x{1}x{2})")]
    ZeroDimension(u16, u16, u16),
    #[error("grid volume {0} does not fit a 32-bit index")]
    TooLarge(u64),
    #[error("raw block array has {actual} cells, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("block id {0} cannot be stored")]
    Unstorable(u16),
}

/// Which extended range a base byte redirects to, if any.
#[inline]
fn marker_range(base: u8) -> Option<u16> {
    EXT_MARKERS.iter().position(|m| *m == base).map(|k| k as u16 + 1)
}

/// A fixed-size flat 3D array of block ids.
///
/// Addressed by a single linear index `x + width * (z + length * y)`. Reads
/// outside the grid return `BlockId::INVALID`; nothing ever wraps around.
/// The grid has no knowledge of physics: writes here never schedule work.
pub struct VoxelGrid {
    width: u16,
    height: u16,
    length: u16,
    blocks: Box<[u8]>,
    /// Sparse extended storage, one optional section per 16^3 cube.
    sections: Vec<Option<ChunkSection>>,
    sections_x: usize,
    sections_z: usize,
}

impl VoxelGrid {
    /// An all-air grid.
    pub fn new(width: u16, height: u16, length: u16) -> Result<Self, GridError> {
        let volume = Self::checked_volume(width, height, length)?;
        Ok(Self::with_blocks(width, height, length, vec![0u8; volume].into_boxed_slice()))
    }

    /// Wrap an existing base array (used when loading a saved level).
    pub fn from_raw(width: u16, height: u16, length: u16, blocks: Vec<u8>) -> Result<Self, GridError> {
        let volume = Self::checked_volume(width, height, length)?;
        if blocks.len() != volume {
            return Err(GridError::SizeMismatch {
                expected: volume,
                actual: blocks.len(),
            });
        }
        Ok(Self::with_blocks(width, height, length, blocks.into_boxed_slice()))
    }

    fn checked_volume(width: u16, height: u16, length: u16) -> Result<usize, GridError> {
        if width == 0 || height == 0 || length == 0 {
            return Err(GridError::ZeroDimension(width, height, length));
        }
        let volume = width as u64 * height as u64 * length as u64;
        if volume > u32::MAX as u64 {
            return Err(GridError::TooLarge(volume));
        }
        Ok(volume as usize)
    }

    fn with_blocks(width: u16, height: u16, length: u16, blocks: Box<[u8]>) -> Self {
        let sections_x = (width as usize).div_ceil(SECTION_SIZE);
        let sections_y = (height as usize).div_ceil(SECTION_SIZE);
        let sections_z = (length as usize).div_ceil(SECTION_SIZE);
        let mut sections = Vec::with_capacity(sections_x * sections_y * sections_z);
        sections.resize_with(sections_x * sections_y * sections_z, || None);
        Self {
            width,
            height,
            length,
            blocks,
            sections,
            sections_x,
            sections_z,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    /// Number of cells.
    pub fn volume(&self) -> usize {
        self.blocks.len()
    }

    // ── Coordinates ─────────────────────────────────────────────────────

    #[inline]
    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && pos.x < self.width as i32
            && pos.y < self.height as i32
            && pos.z < self.length as i32
    }

    /// Linear index of `pos`, or `None` outside the grid.
    #[inline]
    pub fn pos_to_index(&self, pos: BlockPos) -> Option<u32> {
        if !self.contains(pos) {
            return None;
        }
        let (w, l) = (self.width as u32, self.length as u32);
        Some(pos.x as u32 + w * (pos.z as u32 + l * pos.y as u32))
    }

    /// Inverse of `pos_to_index`. `index` must be below `volume()`.
    #[inline]
    pub fn index_to_pos(&self, index: u32) -> BlockPos {
        let (w, l) = (self.width as u32, self.length as u32);
        let x = index % w;
        let z = (index / w) % l;
        let y = (index / w) / l;
        BlockPos::new(x as i32, y as i32, z as i32)
    }

    /// Index of the cell at `(dx, dy, dz)` from `index`, if inside the grid.
    #[inline]
    pub fn neighbor_index(&self, index: u32, dx: i32, dy: i32, dz: i32) -> Option<u32> {
        let pos = self.index_to_pos(index);
        self.pos_to_index(pos.offset(dx, dy, dz))
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Block at `pos`; `BlockId::INVALID` outside the grid.
    #[inline]
    pub fn get(&self, pos: BlockPos) -> BlockId {
        match self.pos_to_index(pos) {
            Some(index) => self.get_index(index),
            None => BlockId::INVALID,
        }
    }

    /// Block and index at `pos`, or `None` outside the grid.
    #[inline]
    pub fn get_with_index(&self, pos: BlockPos) -> Option<(BlockId, u32)> {
        self.pos_to_index(pos).map(|i| (self.get_index(i), i))
    }

    /// Block at a linear index; `BlockId::INVALID` past the end.
    #[inline]
    pub fn get_index(&self, index: u32) -> BlockId {
        let Some(&base) = self.blocks.get(index as usize) else {
            return BlockId::INVALID;
        };
        match marker_range(base) {
            None => BlockId(base as u16),
            Some(range) => {
                let low = self.extended_low(index).unwrap_or(0);
                BlockId(range * 256 + low as u16)
            }
        }
    }

    fn section_slot(&self, pos: BlockPos) -> usize {
        let s = pos.section();
        (s.y as usize * self.sections_z + s.z as usize) * self.sections_x + s.x as usize
    }

    fn extended_low(&self, index: u32) -> Option<u8> {
        let pos = self.index_to_pos(index);
        let slot = self.section_slot(pos);
        let local = ChunkSection::local_index(pos.x as usize, pos.y as usize, pos.z as usize);
        self.sections[slot].as_ref().map(|s| s.get(local))
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Unconditional low-level write. Out-of-range indices and unstorable ids
    /// are ignored (returns false); callers do their gating beforehand.
    pub fn set_raw(&mut self, index: u32, block: BlockId) -> bool {
        let Some(&old_base) = self.blocks.get(index as usize) else {
            return false;
        };
        if block.is_invalid() || block.0 > BlockId::MAX_EXTENDED {
            return false;
        }
        // Extended id whose base byte collides with a marker cannot be base-stored.
        let (base, low) = if block.is_extended() {
            let range = (block.0 / 256) as usize;
            (EXT_MARKERS[range - 1], Some((block.0 % 256) as u8))
        } else if marker_range(block.0 as u8).is_some() {
            return false;
        } else {
            (block.0 as u8, None)
        };

        let was_extended = marker_range(old_base).is_some();
        self.blocks[index as usize] = base;
        if was_extended || low.is_some() {
            let pos = self.index_to_pos(index);
            let slot = self.section_slot(pos);
            let local = ChunkSection::local_index(pos.x as usize, pos.y as usize, pos.z as usize);
            let section = self.sections[slot].get_or_insert_with(ChunkSection::new_empty);
            section.set(local, low.unwrap_or(0), low.is_some(), was_extended);
            if section.is_empty() {
                self.sections[slot] = None;
            }
        }
        true
    }

    /// Convenience write by position.
    pub fn set(&mut self, pos: BlockPos, block: BlockId) -> bool {
        match self.pos_to_index(pos) {
            Some(index) => self.set_raw(index, block),
            None => false,
        }
    }

    /// Fill an axis-aligned box (inclusive bounds), clamped to the grid.
    pub fn fill(&mut self, min: BlockPos, max: BlockPos, block: BlockId) {
        for y in min.y.max(0)..=max.y.min(self.height as i32 - 1) {
            for z in min.z.max(0)..=max.z.min(self.length as i32 - 1) {
                for x in min.x.max(0)..=max.x.min(self.width as i32 - 1) {
                    self.set(BlockPos::new(x, y, z), block);
                }
            }
        }
    }

    // ── Bulk access for persistence ─────────────────────────────────────

    /// The base byte array (marker bytes included).
    pub fn raw_blocks(&self) -> &[u8] {
        &self.blocks
    }

    /// Allocated extended sections as `(slot, bytes)` pairs.
    pub fn extended_sections(&self) -> impl Iterator<Item = (usize, &ChunkSection)> {
        self.sections
            .iter()
            .enumerate()
            .filter_map(|(slot, s)| s.as_ref().map(|s| (slot, s)))
    }

    /// Restore one extended section. Occupancy is recomputed from the base
    /// array so a stale count in a save file cannot leak sections.
    pub fn restore_section(&mut self, slot: usize, bytes: Box<[u8; super::chunk::SECTION_VOLUME]>) {
        if slot >= self.sections.len() {
            return;
        }
        let sy = slot / (self.sections_x * self.sections_z);
        let sz = (slot / self.sections_x) % self.sections_z;
        let sx = slot % self.sections_x;
        let mut used = 0u16;
        for y in 0..SECTION_SIZE {
            for z in 0..SECTION_SIZE {
                for x in 0..SECTION_SIZE {
                    let pos = BlockPos::new(
                        (sx * SECTION_SIZE + x) as i32,
                        (sy * SECTION_SIZE + y) as i32,
                        (sz * SECTION_SIZE + z) as i32,
                    );
                    if let Some(i) = self.pos_to_index(pos) {
                        if marker_range(self.blocks[i as usize]).is_some() {
                            used += 1;
                        }
                    }
                }
            }
        }
        self.sections[slot] = (used > 0).then(|| ChunkSection::from_bytes(bytes, used));
    }

    pub fn extended_section_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_some()).count()
    }
}
