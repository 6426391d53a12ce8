//! PhysicsDispatcher: per-block handler table and the per-level tick.
//!
//! Each tick drains the front of the level's worklist (at most
//! `max_checks_per_tick` entries, snapshot at pass start), re-reads the live
//! block behind every entry, and runs the gated handler for it. Handlers
//! queue their mutations; the queue is committed once the pass is compacted,
//! so nothing a handler causes is evaluated before the next tick.

pub mod ai;
pub mod door;
pub mod explosion;
pub mod explosive;
pub mod falling;
pub mod finite;
pub mod fire;
pub mod liquid;
pub mod other;
pub mod timed;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::BlockId;

use crate::block::{self, BlockProps, DoorKind, LiquidKind};
use crate::level::{Level, LevelSettings};

pub type HandlerFn = fn(&mut Level, &mut PhysInfo);

/// Handler family, used to gate handlers by physics level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Door,
    Liquid,
    Finite,
    Falling,
    Stack,
    Grass,
    Other,
    LeafDecay,
    Fire,
    Explosive,
    Firework,
    Animal,
    Sponge,
    Timed,
}

impl Category {
    /// May handlers of this family run at `physics`?
    pub fn allowed(self, physics: u8, settings: &LevelSettings) -> bool {
        match self {
            Category::Door => (1..=5).contains(&physics),
            Category::LeafDecay => (2..=4).contains(&physics) && settings.leaf_decay,
            Category::Explosive => (3..=4).contains(&physics),
            _ => (1..=4).contains(&physics),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Handler {
    pub func: HandlerFn,
    pub category: Category,
}

impl Handler {
    pub const fn new(func: HandlerFn, category: Category) -> Self {
        Self { func, category }
    }
}

/// Runs for any entry whose payload carries timed-block args.
pub const TIMED: Handler = Handler::new(timed::timed, Category::Timed);

/// The handler for `block`: exact codes first, then by property.
/// `None` means the block never needs evaluation.
pub fn handler_for(block: BlockId, props: &BlockProps) -> Option<Handler> {
    match block {
        block::FIRE => return Some(Handler::new(fire::fire, Category::Fire)),
        block::TNT_EXPLOSION => return Some(Handler::new(explosive::explosion_cell, Category::Other)),
        _ => {}
    }

    if props.dirt_block.is_some() || props.grass_block.is_some() {
        return Some(Handler::new(other::grass, Category::Grass));
    }
    if let Some(liquid) = props.liquid {
        return match liquid.kind {
            LiquidKind::Still => None,
            LiquidKind::Finite | LiquidKind::FiniteFaucet => {
                Some(Handler::new(finite::finite, Category::Finite))
            }
            _ => Some(Handler::new(liquid::liquid, Category::Liquid)),
        };
    }
    if props.stack_block.is_some() {
        return Some(Handler::new(other::stack, Category::Stack));
    }
    if props.falls {
        return Some(Handler::new(falling::falling, Category::Falling));
    }
    if props.floats {
        return Some(Handler::new(falling::float, Category::Falling));
    }
    if props.animal_ai.is_some() {
        return Some(Handler::new(ai::animal, Category::Animal));
    }
    if let Some(door) = props.door {
        return match (door.kind, door.open) {
            (DoorKind::Door | DoorKind::TDoor, false) => None,
            _ => Some(Handler::new(door::door, Category::Door)),
        };
    }
    if props.tnt_strength.is_some() {
        return Some(Handler::new(explosive::tnt, Category::Explosive));
    }
    if props.firework {
        return Some(Handler::new(explosive::firework, Category::Firework));
    }
    if props.sponge.is_some() {
        return Some(Handler::new(other::sponge, Category::Sponge));
    }
    if props.decays {
        return Some(Handler::new(other::leaf_decay, Category::LeafDecay));
    }
    if props.plant {
        return Some(Handler::new(other::plant, Category::Other));
    }
    None
}

// ── Tick ─────────────────────────────────────────────────────────────────

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Entries whose handler ran.
    pub processed: usize,
    /// Entries dropped when the pass was compacted.
    pub removed: usize,
    /// Handlers that panicked.
    pub faults: usize,
    /// Queued updates that changed the grid.
    pub applied: usize,
    /// Block deltas handed to the sender.
    pub sent: usize,
    /// Worklist length after the tick.
    pub pending: usize,
}

impl Level {
    /// Advance physics by one tick. Never panics outward.
    pub fn tick(&mut self) -> TickStats {
        let mut stats = TickStats::default();
        let physics = self.settings.physics;
        self.report_out_of_range();
        if physics == 0 {
            // Frozen physics still delivers direct edits.
            stats.sent = self.sender.flush();
            stats.pending = self.checks.len();
            return stats;
        }

        let blocks = Arc::clone(&self.blocks);
        let window = self.checks.begin_pass(self.settings.max_checks_per_tick);
        for pos in 0..window.processed {
            let mut info = self.checks.entry(pos);
            let live = self.grid.get_index(info.index);
            if live != info.block {
                info.block = live;
                info.data = PhysData::EMPTY;
            }

            let handler = if info.data.has_timed_args() {
                Some(TIMED)
            } else {
                blocks.handler(live)
            };
            let Some(handler) = handler.filter(|h| h.category.allowed(physics, &self.settings)) else {
                info.remove();
                self.checks.store(pos, info);
                continue;
            };

            let marks = (self.updates.len(), self.deferred_checks.len(), self.events.len());
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (handler.func)(self, &mut info)));
            if let Err(payload) = outcome {
                // A faulting handler leaves nothing behind.
                self.updates.truncate(marks.0);
                self.deferred_checks.truncate(marks.1);
                self.events.truncate(marks.2);
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                let at = self.grid.index_to_pos(info.index);
                tracing::error!(
                    "Level '{}': {} handler panicked at ({}, {}, {}): {}",
                    self.name,
                    blocks.name(live),
                    at.x,
                    at.y,
                    at.z,
                    msg
                );
                info.remove();
                stats.faults += 1;
            }
            self.checks.store(pos, info);
            stats.processed += 1;
        }
        stats.removed = self.checks.end_pass(window);

        self.flush_deferred_checks();
        stats.applied = self.apply_updates();
        stats.sent = self.sender.flush();
        self.ticks += 1;
        stats.pending = self.checks.len();

        if stats.processed > 0 {
            tracing::debug!(
                "Level '{}' tick {}: {} processed, {} removed, {} applied, {} pending",
                self.name,
                self.ticks,
                stats.processed,
                stats.removed,
                stats.applied,
                stats.pending
            );
        }
        stats
    }
}
