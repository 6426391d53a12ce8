//! Grass and dirt, plants, leaf decay, slab stacking and sponges.

use std::collections::{HashSet, VecDeque};

use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::position::FAN_OUT;

use crate::block;
use crate::level::Level;

use super::liquid::SPONGE_RADIUS;

/// Ticks lit dirt waits before turning into grass.
pub const GRASS_DELAY: u8 = 20;
/// Leaves further than this (through other leaves) from a log decay.
pub const LEAF_REACH: u8 = 4;

pub(super) fn grass(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    let props = *level.props(block);
    let lit = match level.grid.neighbor_index(index, 0, 1, 0) {
        Some(above) => !level.props(level.get_index(above)).blocks_light,
        None => true,
    };

    if let Some(dirt) = props.dirt_block {
        if !lit {
            level.add_update(index, dirt, PhysData::EMPTY);
        }
    } else if let Some(grass) = props.grass_block {
        if lit && level.settings.grass_grow {
            if info.data.bump() < GRASS_DELAY {
                return;
            }
            level.add_update(index, grass, PhysData::EMPTY);
        }
    }
    info.remove();
}

/// Flowers and saplings need grass or dirt below; mushrooms any solid.
pub(super) fn plant(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    let under = level
        .grid
        .neighbor_index(index, 0, -1, 0)
        .map(|b| level.get_index(b))
        .unwrap_or(block::AIR);
    let supported = match block {
        block::BROWN_MUSHROOM | block::RED_MUSHROOM => level.props(under).solid,
        _ => under == block::GRASS || under == block::DIRT,
    };
    if !supported {
        level.add_update(index, block::AIR, PhysData::EMPTY);
    }
    info.remove();
}

pub(super) fn leaf_decay(level: &mut Level, info: &mut PhysInfo) {
    if !log_within_reach(level, info.index) {
        level.add_update(info.index, block::AIR, PhysData::EMPTY);
    }
    info.remove();
}

/// Breadth-first search through leaves for a log at most `LEAF_REACH` away.
fn log_within_reach(level: &Level, start: u32) -> bool {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0u8)]);
    while let Some((index, dist)) = queue.pop_front() {
        for (dx, dy, dz) in FAN_OUT {
            let Some(n) = level.grid.neighbor_index(index, dx, dy, dz) else {
                continue;
            };
            let b = level.get_index(n);
            if b == block::LOG {
                return true;
            }
            if dist + 1 < LEAF_REACH && level.props(b).decays && seen.insert(n) {
                queue.push_back((n, dist + 1));
            }
        }
    }
    false
}

/// A stackable block resting on its twin merges into the stacked form.
pub(super) fn stack(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    if let (Some(stacked), Some(below)) = (
        level.props(block).stack_block,
        level.grid.neighbor_index(index, 0, -1, 0),
    ) {
        if level.get_index(below) == block {
            level.add_update(below, stacked, PhysData::EMPTY);
            level.add_update(index, block::AIR, PhysData::EMPTY);
        }
    }
    info.remove();
}

/// Soak up every liquid of the sponge's family in range.
pub(super) fn sponge(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let Some(family) = level.props(level.get_index(index)).sponge else {
        info.remove();
        return;
    };
    let center = level.pos(index);
    for dy in -SPONGE_RADIUS..=SPONGE_RADIUS {
        for dz in -SPONGE_RADIUS..=SPONGE_RADIUS {
            for dx in -SPONGE_RADIUS..=SPONGE_RADIUS {
                let Some(i) = level.index(center.offset(dx, dy, dz)) else {
                    continue;
                };
                let props = level.props(level.get_index(i));
                if props.liquid_family() == Some(family) && !props.op_block {
                    level.add_update(i, block::AIR, PhysData::EMPTY);
                }
            }
        }
    }
    info.remove();
}
