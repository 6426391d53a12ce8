//! A loaded level: grid, physics worklist, pending updates, and the state
//! the behaviour handlers share.

use std::sync::Arc;

use indexmap::IndexMap;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Deserialize;
use voxtick_engine::physics::{CapacityPolicy, PhysData, PhysicsWorklist};
use voxtick_engine::sink::{BlockSender, ChangeHistory, NullSender};
use voxtick_engine::world::{BlockId, BlockPos, GridError, VoxelGrid};

use crate::block::{self, BlockProps, BlockRegistry};

/// Per-level knobs. Physics levels: 0 off, 1 normal, 2 advanced,
/// 3 hardcore, 4 instant, 5 doors only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub physics: u8,
    pub seed: u64,
    pub grass_grow: bool,
    pub leaf_decay: bool,
    /// Also record physics-made changes in the change history.
    pub history_physics: bool,
    pub max_checks: usize,
    pub max_checks_per_tick: usize,
    pub capacity_policy: CapacityPolicyConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicyConfig {
    #[default]
    RejectNewest,
    Grow,
}

impl From<CapacityPolicyConfig> for CapacityPolicy {
    fn from(value: CapacityPolicyConfig) -> Self {
        match value {
            CapacityPolicyConfig::RejectNewest => CapacityPolicy::RejectNewest,
            CapacityPolicyConfig::Grow => CapacityPolicy::Grow,
        }
    }
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            physics: 1,
            seed: 0,
            grass_grow: true,
            leaf_decay: false,
            history_physics: false,
            max_checks: 1 << 20,
            max_checks_per_tick: 100_000,
            capacity_policy: CapacityPolicyConfig::RejectNewest,
        }
    }
}

/// A player standing in the level, as seen by animal AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub id: u32,
    pub pos: BlockPos,
}

/// Things the level reports to the outer layers (sessions, commands).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelEvent {
    /// A player clicked a message block.
    Message { index: u32, player: u32 },
    /// A player clicked a portal.
    Portal { index: u32, player: u32 },
    /// A hunting animal struck a player.
    PlayerHit { player: u32, by: BlockId, index: u32 },
    Exploded { center: BlockPos, strength: u8 },
}

/// A queued physics mutation, applied after the pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingUpdate {
    pub block: BlockId,
    pub data: PhysData,
}

/// C4 blocks wired to (at most) one detonator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Circuit {
    pub cells: Vec<u32>,
    pub detonator: Option<u32>,
}

pub struct Level {
    pub name: String,
    pub(crate) grid: VoxelGrid,
    pub(crate) checks: PhysicsWorklist,
    pub(crate) updates: IndexMap<u32, PendingUpdate>,
    /// Checks requested by handlers during a pass; scheduled after it.
    pub(crate) deferred_checks: Vec<(u32, PhysData)>,
    pub(crate) blocks: Arc<BlockRegistry>,
    pub(crate) settings: LevelSettings,
    pub(crate) rng: Xoshiro256PlusPlus,
    pub(crate) sender: Box<dyn BlockSender>,
    pub(crate) history: Option<Box<dyn ChangeHistory>>,
    pub(crate) occupants: Vec<Occupant>,
    pub(crate) events: Vec<LevelEvent>,
    pub(crate) circuits: Vec<Circuit>,
    pub(crate) ticks: u64,
    /// Set by any committed change; cleared by persistence after a save.
    pub(crate) dirty: bool,
    out_of_range_total: u64,
    out_of_range_unreported: u64,
}

impl Level {
    pub fn new(name: &str, grid: VoxelGrid, blocks: Arc<BlockRegistry>, settings: LevelSettings) -> Self {
        let checks = PhysicsWorklist::new(
            grid.volume(),
            settings.max_checks,
            settings.capacity_policy.into(),
        );
        Self {
            name: name.to_string(),
            grid,
            checks,
            updates: IndexMap::new(),
            deferred_checks: Vec::new(),
            blocks,
            rng: Xoshiro256PlusPlus::seed_from_u64(settings.seed),
            settings,
            sender: Box::new(NullSender),
            history: None,
            occupants: Vec::new(),
            events: Vec::new(),
            circuits: Vec::new(),
            ticks: 0,
            dirty: false,
            out_of_range_total: 0,
            out_of_range_unreported: 0,
        }
    }

    pub fn with_sender(mut self, sender: Box<dyn BlockSender>) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_history(mut self, history: Box<dyn ChangeHistory>) -> Self {
        self.history = Some(history);
        self
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    pub fn physics(&self) -> u8 {
        self.settings.physics
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.blocks
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn worklist_len(&self) -> usize {
        self.checks.len()
    }

    pub fn pending_updates(&self) -> usize {
        self.updates.len()
    }

    pub fn worklist(&self) -> &PhysicsWorklist {
        &self.checks
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn get(&self, pos: BlockPos) -> BlockId {
        self.grid.get(pos)
    }

    #[inline]
    pub fn get_index(&self, index: u32) -> BlockId {
        self.grid.get_index(index)
    }

    #[inline]
    pub fn pos(&self, index: u32) -> BlockPos {
        self.grid.index_to_pos(index)
    }

    #[inline]
    pub fn index(&self, pos: BlockPos) -> Option<u32> {
        self.grid.pos_to_index(pos)
    }

    #[inline]
    pub fn props(&self, block: BlockId) -> &BlockProps {
        self.blocks.props(block)
    }

    pub fn rng(&mut self) -> &mut Xoshiro256PlusPlus {
        &mut self.rng
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Change the physics level. Dropping to 0 freezes the worklist as-is.
    pub fn set_physics(&mut self, physics: u8) {
        let physics = physics.min(5);
        if physics != self.settings.physics {
            tracing::info!(
                "Level '{}': physics {} -> {} ({} entries pending)",
                self.name,
                self.settings.physics,
                physics,
                self.checks.len()
            );
        }
        self.settings.physics = physics;
    }

    /// Forget all scheduled work.
    pub fn clear_physics(&mut self) {
        self.checks.clear();
        self.updates.clear();
        self.deferred_checks.clear();
    }

    /// Swap in a new registry snapshot (between ticks only).
    pub fn set_registry(&mut self, blocks: Arc<BlockRegistry>) {
        self.blocks = blocks;
    }

    /// Reseed the level's random source.
    pub fn reseed(&mut self, seed: u64) {
        self.settings.seed = seed;
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    }

    pub fn set_occupants(&mut self, occupants: Vec<Occupant>) {
        self.occupants = occupants;
    }

    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    /// Take everything reported since the last call.
    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Direct requests refused because they fell outside the level.
    pub fn out_of_range_requests(&self) -> u64 {
        self.out_of_range_total
    }

    /// Count an out-of-range request. Warns on the first one since the
    /// last report; the rest are summed up at the next tick.
    pub(crate) fn note_out_of_range(&mut self, pos: BlockPos) {
        if self.out_of_range_unreported == 0 {
            tracing::warn!(
                "Level '{}': change at ({}, {}, {}) is outside {}x{}x{}",
                self.name,
                pos.x,
                pos.y,
                pos.z,
                self.grid.width(),
                self.grid.height(),
                self.grid.length()
            );
        }
        self.out_of_range_unreported += 1;
        self.out_of_range_total += 1;
    }

    pub(crate) fn report_out_of_range(&mut self) {
        if self.out_of_range_unreported > 1 {
            tracing::warn!(
                "Level '{}': {} more out-of-range changes refused",
                self.name,
                self.out_of_range_unreported - 1
            );
        }
        self.out_of_range_unreported = 0;
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    /// Flush the change history, if any.
    pub fn flush_history(&mut self) {
        if let Some(history) = self.history.as_deref_mut() {
            if let Err(e) = history.flush() {
                tracing::error!("Level '{}': history flush failed: {}", self.name, e);
            }
        }
    }
}

/// A flat world: bedrock floor, stone, three layers of dirt and a grass
/// surface at half height.
pub fn flat_grid(width: u16, height: u16, length: u16) -> Result<VoxelGrid, GridError> {
    let mut grid = VoxelGrid::new(width, height, length)?;
    let surface = (height / 2) as i32;
    let (w, l) = (width as i32 - 1, length as i32 - 1);
    grid.fill(BlockPos::new(0, 0, 0), BlockPos::new(w, 0, l), block::BEDROCK);
    if surface > 4 {
        grid.fill(BlockPos::new(0, 1, 0), BlockPos::new(w, surface - 4, l), block::STONE);
    }
    if surface > 1 {
        grid.fill(
            BlockPos::new(0, (surface - 3).max(1), 0),
            BlockPos::new(w, surface - 1, l),
            block::DIRT,
        );
    }
    if surface > 0 {
        grid.fill(BlockPos::new(0, surface, 0), BlockPos::new(w, surface, l), block::GRASS);
    }
    Ok(grid)
}
