//! Fire: burns for a few ticks, spreads to flammable neighbours, lights TNT.

use rand::Rng;
use voxtick_engine::physics::data::EXTRA_ARMED;
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::position::FAN_OUT;

use crate::block;
use crate::level::Level;

/// Minimum burn time; each fire adds `0..3` on its first evaluation.
pub const FIRE_BURN_TICKS: u8 = 4;
/// Out of 10: chance a flammable neighbour catches each tick.
pub const FIRE_SPREAD_CHANCE: u32 = 3;

pub(super) fn fire(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    if info.data.param() == 0 {
        let burn = FIRE_BURN_TICKS + level.rng().random_range(0..3u8);
        info.data.set_param(burn);
    }
    let age = info.data.bump();

    let physics = level.physics();
    if physics >= 2 {
        for (dx, dy, dz) in FAN_OUT {
            let Some(n) = level.grid.neighbor_index(index, dx, dy, dz) else {
                continue;
            };
            let props = *level.props(level.get_index(n));
            if let Some(fuse) = props.ignite_into {
                if physics >= 3 {
                    level.add_update(n, fuse, PhysData::EMPTY.with_flag(EXTRA_ARMED));
                }
                continue;
            }
            if props.flammable && level.rng().random_range(0..10) < FIRE_SPREAD_CHANCE {
                level.add_update(n, block::FIRE, PhysData::EMPTY);
            }
        }
    }

    if age > info.data.param() {
        level.add_update(index, block::AIR, PhysData::EMPTY);
        // The log it sat on is left charred.
        if let Some(below) = level.grid.neighbor_index(index, 0, -1, 0) {
            if level.get_index(below) == block::LOG {
                level.add_update(below, block::COAL_ORE, PhysData::EMPTY);
            }
        }
        info.remove();
    }
}
