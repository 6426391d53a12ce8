//! Flowing liquids: water, lava, falls, faucets, drips, magma and geysers.

use rand::Rng;
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::BlockId;
use voxtick_engine::world::position::HORIZONTAL;

use crate::block::{self, LiquidFamily, LiquidKind};
use crate::level::Level;

/// Ticks lava waits between spread steps.
pub const LAVA_DELAY: u8 = 4;
/// Faucets act once their counter exceeds this.
pub const FAUCET_INTERVAL: u8 = 2;
/// Magma and geysers act every this many ticks.
pub const EXTENDED_INTERVAL: u8 = 3;
/// How many cells an extended liquid may climb.
pub const EXTENDED_RISE: u16 = 3;
/// Sponges clear (and keep clear) this cube radius.
pub const SPONGE_RADIUS: i32 = 2;

const DOWN: (i32, i32, i32) = (0, -1, 0);

pub(super) fn liquid(level: &mut Level, info: &mut PhysInfo) {
    let block = level.get_index(info.index);
    let Some(liquid) = level.props(block).liquid else {
        info.remove();
        return;
    };
    let family = liquid.family;

    match liquid.kind {
        LiquidKind::Flowing => {
            if family == LiquidFamily::Lava && info.data.bump() < LAVA_DELAY {
                return;
            }
            spread(level, info.index, block, family, true, PhysData::EMPTY);
            info.remove();
        }
        LiquidKind::Fast => {
            spread(level, info.index, block, family, true, PhysData::EMPTY);
            info.remove();
        }
        LiquidKind::Fall => {
            fall(level, info.index, block, family);
            info.remove();
        }
        LiquidKind::Faucet => {
            if faucet_fires(level, info) {
                emit_below(level, info.index, drip_of(family));
            }
        }
        LiquidKind::Drip => {
            drip(level, info.index, block);
            info.remove();
        }
        LiquidKind::Extended => {
            if info.data.bump() < EXTENDED_INTERVAL {
                return;
            }
            info.data.set_counter(0);
            let used = info.data.wait().max(height_above_support(level, info.index, block));
            // Spread cells inherit the rise already spent.
            let carried = PhysData::EMPTY.with_wait(used);
            spread(level, info.index, block, family, true, carried);
            rise(level, info.index, block, used);
            info.remove();
        }
        LiquidKind::Still | LiquidKind::Finite | LiquidKind::FiniteFaucet => info.remove(),
    }
}

/// The flowing block a liquid family spreads as once a fall lands.
pub fn base_of(family: LiquidFamily) -> BlockId {
    match family {
        LiquidFamily::Water => block::WATER,
        LiquidFamily::Lava => block::LAVA,
    }
}

fn drip_of(family: LiquidFamily) -> BlockId {
    match family {
        LiquidFamily::Water => block::WATER_DRIP,
        LiquidFamily::Lava => block::LAVA_DRIP,
    }
}

/// Counter pattern shared by every faucet: bump, act only past the
/// interval, reset, then a 1..10 draw must exceed 7.
pub(super) fn faucet_fires(level: &mut Level, info: &mut PhysInfo) -> bool {
    if info.data.bump() <= FAUCET_INTERVAL {
        return false;
    }
    info.data.set_counter(0);
    level.rng().random_range(1..10) > 7
}

pub(super) fn emit_below(level: &mut Level, index: u32, block: BlockId) {
    if let Some(below) = level.grid.neighbor_index(index, 0, -1, 0) {
        if level.get_index(below) == block::AIR {
            level.add_update(below, block, PhysData::EMPTY);
        }
    }
}

/// Is a sponge soaking up `family` within reach of `index`?
pub fn sponge_near(level: &Level, index: u32, family: LiquidFamily) -> bool {
    let center = level.pos(index);
    for dy in -SPONGE_RADIUS..=SPONGE_RADIUS {
        for dz in -SPONGE_RADIUS..=SPONGE_RADIUS {
            for dx in -SPONGE_RADIUS..=SPONGE_RADIUS {
                let b = level.get(center.offset(dx, dy, dz));
                if level.props(b).sponge == Some(family) {
                    return true;
                }
            }
        }
    }
    false
}

/// Flow from `index` into its horizontal neighbours (and below, if `down`).
/// New liquid cells start with `data`.
fn spread(level: &mut Level, index: u32, block: BlockId, family: LiquidFamily, down: bool, data: PhysData) {
    for &(dx, dy, dz) in HORIZONTAL.iter().chain(down.then_some(&DOWN)) {
        if let Some(n) = level.grid.neighbor_index(index, dx, dy, dz) {
            flow_into(level, n, block, family, data);
        }
    }
}

fn flow_into(level: &mut Level, target: u32, block: BlockId, family: LiquidFamily, data: PhysData) {
    let current = level.get_index(target);
    let props = *level.props(current);
    if current == block::AIR {
        if !sponge_near(level, target, family) {
            level.add_update(target, block, data);
        }
        return;
    }
    if props.op_block {
        return;
    }
    match props.liquid_family() {
        Some(other) if other.opposes(family) => {
            level.add_update(target, block::STONE, PhysData::EMPTY);
        }
        Some(_) => {}
        None => {
            let killed = match family {
                LiquidFamily::Water => props.water_kills,
                LiquidFamily::Lava => props.lava_kills,
            };
            if killed {
                level.add_update(target, block, data);
            } else if props.falls || props.floats {
                level.add_check(target, PhysData::EMPTY);
            }
        }
    }
}

/// Falls go straight down; only a solid floor makes them spread.
fn fall(level: &mut Level, index: u32, block: BlockId, family: LiquidFamily) {
    let Some(below) = level.grid.neighbor_index(index, 0, -1, 0) else {
        return;
    };
    let under = level.get_index(below);
    if under == block::AIR {
        if level.physics() == 4 {
            let mut cursor = Some(below);
            while let Some(i) = cursor {
                if level.get_index(i) != block::AIR {
                    break;
                }
                level.add_update(i, block, PhysData::EMPTY);
                cursor = level.grid.neighbor_index(i, 0, -1, 0);
            }
        } else {
            flow_into(level, below, block, family, PhysData::EMPTY);
        }
        return;
    }
    if level.props(under).is_liquid() {
        flow_into(level, below, block, family, PhysData::EMPTY);
        return;
    }
    spread(level, index, base_of(family), family, false, PhysData::EMPTY);
}

fn drip(level: &mut Level, index: u32, block: BlockId) {
    match level.grid.neighbor_index(index, 0, -1, 0) {
        Some(below) if level.get_index(below) == block::AIR => {
            level.add_move(index, below, block::AIR, block, PhysData::EMPTY);
        }
        _ => {
            level.add_update(index, block::AIR, PhysData::EMPTY);
        }
    }
}

/// Cells of air or `block` between `index` and the first other block
/// below it, capped at `EXTENDED_RISE`. Re-armed cells arrive with an empty
/// payload; this keeps them from climbing again.
fn height_above_support(level: &Level, index: u32, block: BlockId) -> u16 {
    let mut height = 0;
    let mut cursor = level.grid.neighbor_index(index, 0, -1, 0);
    while let Some(i) = cursor {
        let b = level.get_index(i);
        if height >= EXTENDED_RISE || (b != block::AIR && b != block) {
            break;
        }
        height += 1;
        cursor = level.grid.neighbor_index(i, 0, -1, 0);
    }
    height
}

/// Climb one cell while rise steps remain and a 1-in-4 draw passes.
fn rise(level: &mut Level, index: u32, block: BlockId, used: u16) {
    if used >= EXTENDED_RISE {
        return;
    }
    let Some(above) = level.grid.neighbor_index(index, 0, 1, 0) else {
        return;
    };
    if level.get_index(above) == block::AIR && level.rng().random_range(0..4) == 0 {
        level.add_update(above, block, PhysData::EMPTY.with_wait(used + 1));
    }
}
