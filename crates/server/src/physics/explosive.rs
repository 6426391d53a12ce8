//! Fused TNT, explosion debris and fireworks.

use rand::Rng;
use voxtick_engine::physics::data::{EXTRA_DISSIPATE, EXTRA_WAIT};
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::BlockId;

use crate::block;
use crate::level::Level;

use super::explosion::{self, Explosion, Strength};

/// Evaluations before a fuse goes off.
pub const TNT_FUSE: u8 = 4;
/// Cells a firework climbs before bursting.
pub const FIREWORK_RISE: u8 = 7;
/// Ticks burst wool hangs in the air.
pub const FIREWORK_LINGER: u16 = 6;

pub(super) fn tnt(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    let Some(power) = level.props(block).tnt_strength else {
        info.remove();
        return;
    };
    if info.data.bump() < TNT_FUSE {
        return;
    }
    info.remove();
    let center = level.pos(index);
    explosion::explode(level, Explosion::new(center, Strength::from_power(power), block));
}

/// Explosion debris clears after one tick.
pub(super) fn explosion_cell(level: &mut Level, info: &mut PhysInfo) {
    level.add_update(info.index, block::AIR, PhysData::EMPTY);
    info.remove();
}

pub(super) fn firework(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let height = info.data.counter();
    if height < FIREWORK_RISE {
        if let Some(above) = level.grid.neighbor_index(index, 0, 1, 0) {
            if level.get_index(above) == block::AIR {
                let climbed = PhysData::EMPTY.with_counter(height + 1);
                if level.add_move(index, above, block::AIR, block::FIREWORK, climbed) {
                    info.remove();
                }
                return;
            }
        }
    }
    info.remove();
    burst(level, index);
}

fn burst(level: &mut Level, index: u32) {
    let center = level.pos(index);
    let linger = PhysData::EMPTY
        .with_flag(EXTRA_WAIT | EXTRA_DISSIPATE)
        .with_wait(FIREWORK_LINGER)
        .with_param(100);
    for dy in -1..=1 {
        for dz in -1..=1 {
            for dx in -1..=1 {
                let Some(i) = level.index(center.offset(dx, dy, dz)) else {
                    continue;
                };
                if i != index && level.get_index(i) != block::AIR {
                    continue;
                }
                let wool = BlockId(level.rng().random_range(block::RED.0..=block::WHITE.0));
                level.add_update(i, wool, linger);
            }
        }
    }
}
