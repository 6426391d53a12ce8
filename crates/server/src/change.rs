//! The ChangeApplier: the single choke point for every block mutation.
//!
//! Player edits, commands, draw operations, physics handlers and explosions
//! all end up in [`Level::commit`]. Direct requests go through
//! [`Level::request_change`], which runs the placement/removal hooks first.
//! Handlers queue their mutations with [`Level::add_update`]; the queue is
//! coalesced and committed once per tick, after the pass that produced it.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use voxtick_engine::physics::{PhysData, ScheduleResult};
use voxtick_engine::sink::{ChangeRecord, RECORD_PHYSICS, RECORD_SUBSTITUTED};
use voxtick_engine::world::position::FAN_OUT;
use voxtick_engine::world::{BlockId, BlockPos};

use crate::block;
use crate::hooks::HookOutcome;
use crate::level::{Level, PendingUpdate};

/// Who asked for a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Player(u32),
    /// Commands, draw operations, imports.
    Command,
    Physics,
}

impl Requester {
    pub fn id(&self) -> u32 {
        match self {
            Requester::Player(id) => *id,
            Requester::Command | Requester::Physics => 0,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Requester::Player(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeResult {
    /// Nothing was written at the requested position (no-op, or a hook
    /// handled the request with its own effect).
    Unchanged,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChangeError {
    #[error("position ({}, {}, {}) is outside the level", .0.x, .0.y, .0.z)]
    OutOfRange(BlockPos),
    #[error("block {0} cannot be stored")]
    InvalidBlock(BlockId),
    #[error("level is unloaded")]
    Unloaded,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Level {
    // ── Direct requests ─────────────────────────────────────────────────

    /// Ask for `block` at `pos`. The only entry point for outside callers.
    pub fn request_change(
        &mut self,
        pos: BlockPos,
        block: BlockId,
        requester: Requester,
    ) -> Result<ChangeResult, ChangeError> {
        self.request_change_with(pos, block, requester, PhysData::EMPTY)
    }

    /// `request_change` with an initial worklist payload (timed-block args,
    /// pre-armed fuses).
    pub fn request_change_with(
        &mut self,
        pos: BlockPos,
        block: BlockId,
        requester: Requester,
        data: PhysData,
    ) -> Result<ChangeResult, ChangeError> {
        let Some(index) = self.grid.pos_to_index(pos) else {
            self.note_out_of_range(pos);
            return Err(ChangeError::OutOfRange(pos));
        };
        if block.is_invalid() || block.index() >= self.blocks.len() {
            return Err(ChangeError::InvalidBlock(block));
        }
        let old = self.grid.get_index(index);

        let hook = if block.is_air_like() {
            self.blocks.delete_hook(old)
        } else {
            self.blocks.place_hook(block)
        };
        let mut flags = 0;
        let block = match hook {
            Some(hook) => match hook(self, index, old, block, requester) {
                HookOutcome::Handled(result) => return Ok(result),
                HookOutcome::Proceed(substitute) => {
                    if substitute != block {
                        flags |= RECORD_SUBSTITUTED;
                    }
                    substitute
                }
            },
            None => block,
        };

        if self.commit_flagged(index, block, requester, data, flags) {
            Ok(ChangeResult::Modified)
        } else {
            Ok(ChangeResult::Unchanged)
        }
    }

    // ── Commit ──────────────────────────────────────────────────────────

    /// Write `block` at `index` if it differs from what is there, schedule
    /// physics for it and its neighbours, and forward the change to the
    /// sender and history. Returns whether anything was written.
    pub(crate) fn commit(&mut self, index: u32, block: BlockId, requester: Requester, data: PhysData) -> bool {
        self.commit_flagged(index, block, requester, data, 0)
    }

    fn commit_flagged(
        &mut self,
        index: u32,
        block: BlockId,
        requester: Requester,
        data: PhysData,
        flags: u8,
    ) -> bool {
        let old = self.grid.get_index(index);
        if old == block {
            // Same block: only a timed/armed payload can still matter.
            if !data.is_empty() {
                self.schedule(index, block, data, true);
            }
            return false;
        }
        if !self.grid.set_raw(index, block) {
            tracing::debug!("Level '{}': refused to store {} at {}", self.name, block, index);
            return false;
        }
        self.dirty = true;

        if self.blocks.is_active(block) || data.has_timed_args() {
            self.schedule(index, block, data, !data.is_empty());
        }
        self.notify_neighbors(index);
        self.sender.send(index, block);

        if let Some(history) = self.history.as_deref_mut() {
            let physics = requester == Requester::Physics;
            if !physics || self.settings.history_physics {
                let record = ChangeRecord {
                    index,
                    old,
                    new: block,
                    requester: requester.id(),
                    timestamp: unix_now(),
                    flags: flags | if physics { RECORD_PHYSICS } else { 0 },
                };
                if let Err(e) = history.append(record) {
                    tracing::error!("Level '{}': history append failed: {}", self.name, e);
                }
            }
        }

        self.after_commit(index, old, block, requester);
        true
    }

    /// Grass under a freshly placed light blocker turns to dirt.
    fn after_commit(&mut self, index: u32, _old: BlockId, new: BlockId, requester: Requester) {
        if !self.settings.grass_grow || !self.props(new).blocks_light {
            return;
        }
        let Some(below) = self.grid.neighbor_index(index, 0, -1, 0) else {
            return;
        };
        let below_block = self.grid.get_index(below);
        if let Some(dirt) = self.props(below_block).dirt_block {
            self.commit(below, dirt, requester, PhysData::EMPTY);
        }
    }

    /// Schedule the six neighbours of `index` (fan-out order) whose blocks
    /// are active. Stale entries for whatever was replaced are dropped by
    /// the next pass when it re-reads the cell.
    fn notify_neighbors(&mut self, index: u32) {
        for (dx, dy, dz) in FAN_OUT {
            if let Some(n) = self.grid.neighbor_index(index, dx, dy, dz) {
                let b = self.grid.get_index(n);
                if self.blocks.is_active(b) {
                    self.schedule(n, b, PhysData::EMPTY, false);
                }
            }
        }
    }

    fn schedule(&mut self, index: u32, block: BlockId, data: PhysData, overwrite: bool) -> ScheduleResult {
        if overwrite {
            self.checks.schedule_override(index, block, data)
        } else {
            self.checks.schedule(index, block, data)
        }
    }

    // ── Handler-facing queue ────────────────────────────────────────────

    /// Queue a physics mutation for the end of this tick.
    ///
    /// First request per cell wins, except that water-family and lava-family
    /// liquids meeting in one cell always resolve to stone, whichever came
    /// first. Returns whether the request took effect.
    pub fn add_update(&mut self, index: u32, block: BlockId, data: PhysData) -> bool {
        if index as usize >= self.grid.volume() || block.is_invalid() {
            return false;
        }
        match self.updates.get_mut(&index) {
            None => {
                self.updates.insert(index, PendingUpdate { block, data });
                true
            }
            Some(existing) => {
                let a = self.blocks.props(existing.block).liquid_family();
                let b = self.blocks.props(block).liquid_family();
                match (a, b) {
                    (Some(a), Some(b)) if a.opposes(b) => {
                        existing.block = block::STONE;
                        existing.data = PhysData::EMPTY;
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    /// `add_update` by position; out-of-range positions are ignored.
    pub fn add_update_at(&mut self, pos: BlockPos, block: BlockId, data: PhysData) -> bool {
        match self.grid.pos_to_index(pos) {
            Some(index) => self.add_update(index, block, data),
            None => false,
        }
    }

    /// Atomically queue `from -> leave`, `to -> block`: both or neither.
    /// Keeps moving blocks (falling sand, animals, finite liquids) from being
    /// lost or duplicated when two handlers aim at the same cell.
    pub fn add_move(&mut self, from: u32, to: u32, leave: BlockId, block: BlockId, data: PhysData) -> bool {
        if from == to || self.updates.contains_key(&from) || self.updates.contains_key(&to) {
            return false;
        }
        if to as usize >= self.grid.volume() {
            return false;
        }
        self.updates.insert(to, PendingUpdate { block, data });
        self.updates.insert(from, PendingUpdate { block: leave, data: PhysData::EMPTY });
        true
    }

    pub fn has_pending(&self, index: u32) -> bool {
        self.updates.contains_key(&index)
    }

    /// Ask for `index` to be evaluated next tick.
    pub fn add_check(&mut self, index: u32, data: PhysData) {
        if (index as usize) < self.grid.volume() {
            self.deferred_checks.push((index, data));
        }
    }

    /// Schedule handler-requested checks. Runs after the pass compacted.
    pub(crate) fn flush_deferred_checks(&mut self) {
        let deferred = std::mem::take(&mut self.deferred_checks);
        for (index, data) in deferred {
            let b = self.grid.get_index(index);
            if self.blocks.is_active(b) || data.has_timed_args() {
                self.schedule(index, b, data, !data.is_empty());
            }
        }
    }

    /// Commit every queued update in request order. Returns how many
    /// actually changed the grid.
    pub(crate) fn apply_updates(&mut self) -> usize {
        let updates = std::mem::take(&mut self.updates);
        let mut applied = 0;
        for (index, update) in updates {
            if self.commit(index, update.block, Requester::Physics, update.data) {
                applied += 1;
            }
        }
        applied
    }
}
