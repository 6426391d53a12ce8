//! Blocks carrying timed args in their worklist payload.
//!
//! Payload layout: `wait` counts down first, then one action fires:
//! explode, dissipate (`param`% chance to vanish), drop (`direction`%
//! chance to fall a cell) or revert to `block`.

use rand::Rng;
use voxtick_engine::physics::data::{EXTRA_DISSIPATE, EXTRA_DROP, EXTRA_EXPLODE, EXTRA_REVERT, EXTRA_WAIT};
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::BlockId;

use crate::block;
use crate::level::Level;

use super::explosion::{self, Explosion, Strength};

pub(super) fn timed(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let data = info.data;
    if data.has_flag(EXTRA_WAIT) && data.wait() > 0 {
        info.data.set_wait(data.wait() - 1);
        return;
    }
    let block = level.get_index(index);

    if data.has_flag(EXTRA_EXPLODE) {
        info.remove();
        let center = level.pos(index);
        explosion::explode(level, Explosion::new(center, Strength::Small, block));
        return;
    }

    if data.has_flag(EXTRA_DISSIPATE) && level.rng().random_range(0..100) < data.param() {
        level.add_update(index, block::AIR, PhysData::EMPTY);
        info.remove();
        return;
    }

    if data.has_flag(EXTRA_DROP) {
        let below = level
            .grid
            .neighbor_index(index, 0, -1, 0)
            .filter(|b| level.get_index(*b) == block::AIR);
        match below {
            Some(below) => {
                if level.rng().random_range(0..100) < data.direction() {
                    // The args travel with the block; the wait is spent.
                    let carried = data.with_wait(0);
                    if level.add_move(index, below, block::AIR, block, carried) {
                        info.remove();
                    }
                }
                return;
            }
            None if !data.has_flag(EXTRA_REVERT) => {
                info.remove();
                return;
            }
            None => {}
        }
    }

    if data.has_flag(EXTRA_REVERT) {
        level.add_update(index, BlockId(data.block()), PhysData::EMPTY);
        info.remove();
        return;
    }

    if !data.has_flag(EXTRA_DISSIPATE) {
        info.remove();
    }
}
