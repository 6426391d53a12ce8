//! Placement and removal hooks consulted by `Level::request_change`.
//!
//! A hook either approves the request (possibly substituting another block)
//! or handles it entirely, performing its own effect.

use voxtick_engine::physics::PhysData;
use voxtick_engine::physics::data::EXTRA_ARMED;
use voxtick_engine::world::BlockId;
use voxtick_engine::world::position::FAN_OUT;

use crate::block::{self, BlockProps, DoorKind};
use crate::change::{ChangeResult, Requester};
use crate::level::{Circuit, Level, LevelEvent};
use crate::physics::explosion::{self, Explosion, Strength};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Commit this block (the requested one or a substitute).
    Proceed(BlockId),
    /// The hook did its own thing; report this to the caller.
    Handled(ChangeResult),
}

/// `(level, index, old, new, requester)`.
pub type PlaceHook = fn(&mut Level, u32, BlockId, BlockId, Requester) -> HookOutcome;
pub type DeleteHook = fn(&mut Level, u32, BlockId, BlockId, Requester) -> HookOutcome;

pub fn place_hook_for(_block: BlockId, props: &BlockProps) -> Option<PlaceHook> {
    if props.dirt_block.is_some() {
        Some(place_grass)
    } else if props.stack_block.is_some() {
        Some(place_stackable)
    } else if props.c4 {
        Some(place_c4)
    } else if props.detonator {
        Some(place_detonator)
    } else {
        None
    }
}

pub fn delete_hook_for(_block: BlockId, props: &BlockProps) -> Option<DeleteHook> {
    if props.door.is_some() {
        Some(delete_door)
    } else if props.message_block {
        Some(delete_message)
    } else if props.portal {
        Some(delete_portal)
    } else if props.detonator {
        Some(delete_detonator)
    } else if props.c4 {
        Some(delete_c4)
    } else if props.sponge.is_some() {
        Some(delete_sponge)
    } else {
        None
    }
}

// ── Placement ────────────────────────────────────────────────────────────

/// Grass placed under cover goes down as its dirt form.
fn place_grass(level: &mut Level, index: u32, _old: BlockId, new: BlockId, _who: Requester) -> HookOutcome {
    if !level.settings.grass_grow {
        return HookOutcome::Proceed(new);
    }
    let covered = level
        .grid
        .neighbor_index(index, 0, 1, 0)
        .is_some_and(|above| level.props(level.get_index(above)).blocks_light);
    match level.props(new).dirt_block {
        Some(dirt) if covered => HookOutcome::Proceed(dirt),
        _ => HookOutcome::Proceed(new),
    }
}

/// A player stacking a slab onto the same slab merges the two.
fn place_stackable(level: &mut Level, index: u32, _old: BlockId, new: BlockId, who: Requester) -> HookOutcome {
    if !who.is_player() {
        return HookOutcome::Proceed(new);
    }
    let Some(below) = level.grid.neighbor_index(index, 0, -1, 0) else {
        return HookOutcome::Proceed(new);
    };
    match level.props(new).stack_block {
        Some(stacked) if level.get_index(below) == new => {
            level.commit(below, stacked, who, PhysData::EMPTY);
            HookOutcome::Handled(ChangeResult::Unchanged)
        }
        _ => HookOutcome::Proceed(new),
    }
}

/// New C4 joins the circuit of an adjacent C4 block, or starts a circuit.
fn place_c4(level: &mut Level, index: u32, _old: BlockId, new: BlockId, _who: Requester) -> HookOutcome {
    let neighbors: Vec<u32> = FAN_OUT
        .iter()
        .filter_map(|(dx, dy, dz)| level.grid.neighbor_index(index, *dx, *dy, *dz))
        .collect();
    match level
        .circuits
        .iter_mut()
        .find(|c| c.cells.iter().any(|cell| neighbors.contains(cell)))
    {
        Some(circuit) => {
            if !circuit.cells.contains(&index) {
                circuit.cells.push(index);
            }
        }
        None => level.circuits.push(Circuit {
            cells: vec![index],
            detonator: None,
        }),
    }
    HookOutcome::Proceed(new)
}

/// A detonator wires itself to the newest circuit that lacks one.
/// Without such a circuit the placement is refused.
fn place_detonator(level: &mut Level, index: u32, _old: BlockId, new: BlockId, _who: Requester) -> HookOutcome {
    match level.circuits.iter_mut().rev().find(|c| c.detonator.is_none()) {
        Some(circuit) => {
            circuit.detonator = Some(index);
            HookOutcome::Proceed(new)
        }
        None => {
            tracing::debug!("Level '{}': detonator at {} has no circuit", level.name, index);
            HookOutcome::Handled(ChangeResult::Unchanged)
        }
    }
}

// ── Removal ──────────────────────────────────────────────────────────────

/// Open (or toggle) a door instead of removing it. Called for player
/// clicks and for the door fan-out wave.
pub(crate) fn activate_door(level: &mut Level, index: u32, current: BlockId, who: Requester) -> bool {
    let Some(door) = level.props(current).door else {
        return false;
    };
    match door.kind {
        DoorKind::Door | DoorKind::TDoor if !door.open => {
            level.commit(index, door.pair, who, PhysData::EMPTY)
        }
        DoorKind::ODoor => level.commit(index, door.pair, who, PhysData::EMPTY.with_flag(EXTRA_ARMED)),
        _ => false,
    }
}

fn delete_door(level: &mut Level, index: u32, old: BlockId, new: BlockId, who: Requester) -> HookOutcome {
    if !who.is_player() || level.physics() == 0 {
        return HookOutcome::Proceed(new);
    }
    activate_door(level, index, old, who);
    HookOutcome::Handled(ChangeResult::Unchanged)
}

fn delete_message(level: &mut Level, index: u32, _old: BlockId, new: BlockId, who: Requester) -> HookOutcome {
    match who {
        Requester::Player(player) => {
            level.events.push(LevelEvent::Message { index, player });
            HookOutcome::Handled(ChangeResult::Unchanged)
        }
        _ => HookOutcome::Proceed(new),
    }
}

fn delete_portal(level: &mut Level, index: u32, _old: BlockId, new: BlockId, who: Requester) -> HookOutcome {
    match who {
        Requester::Player(player) => {
            level.events.push(LevelEvent::Portal { index, player });
            HookOutcome::Handled(ChangeResult::Unchanged)
        }
        _ => HookOutcome::Proceed(new),
    }
}

/// Removing a detonator sets off every C4 block of its circuit
/// (hardcore physics and above). The detonator itself is removed.
fn delete_detonator(level: &mut Level, index: u32, _old: BlockId, new: BlockId, _who: Requester) -> HookOutcome {
    let Some(slot) = level.circuits.iter().position(|c| c.detonator == Some(index)) else {
        return HookOutcome::Proceed(new);
    };
    if level.physics() < 3 || level.physics() == 5 {
        level.circuits[slot].detonator = None;
        return HookOutcome::Proceed(new);
    }
    let circuit = level.circuits.remove(slot);
    let mut fired = 0;
    for cell in circuit.cells {
        if level.get_index(cell) == block::C4 {
            let center = level.pos(cell);
            explosion::explode(level, Explosion::new(center, Strength::Small, block::C4));
            fired += 1;
        }
    }
    tracing::debug!("Level '{}': detonator at {} fired {} C4 blocks", level.name, index, fired);
    HookOutcome::Proceed(new)
}

fn delete_c4(level: &mut Level, index: u32, _old: BlockId, new: BlockId, _who: Requester) -> HookOutcome {
    for circuit in &mut level.circuits {
        circuit.cells.retain(|c| *c != index);
    }
    level.circuits.retain(|c| !c.cells.is_empty() || c.detonator.is_some());
    HookOutcome::Proceed(new)
}

/// Removing a sponge wakes the liquids it was holding back.
fn delete_sponge(level: &mut Level, index: u32, _old: BlockId, new: BlockId, who: Requester) -> HookOutcome {
    let changed = level.commit(index, new, who, PhysData::EMPTY);
    let center = level.pos(index);
    for dy in -3..=3 {
        for dz in -3..=3 {
            for dx in -3..=3 {
                let Some(i) = level.index(center.offset(dx, dy, dz)) else {
                    continue;
                };
                let b = level.get_index(i);
                if level.props(b).is_liquid() && level.registry().is_active(b) {
                    level.checks.schedule(i, b, PhysData::EMPTY);
                }
            }
        }
    }
    HookOutcome::Handled(if changed {
        ChangeResult::Modified
    } else {
        ChangeResult::Unchanged
    })
}
