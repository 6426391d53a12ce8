//! Doors. An opened Door/TDoor passes the activation to its neighbours on
//! its first evaluation (one ring per tick) and closes again after
//! `DOOR_WAIT` ticks. ODoors toggle for good.

use voxtick_engine::physics::data::EXTRA_ARMED;
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::position::FAN_OUT;

use crate::block::DoorKind;
use crate::level::Level;

pub const DOOR_WAIT: u8 = 16;

pub(super) fn door(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    let Some(door) = level.props(block).door else {
        info.remove();
        return;
    };

    match door.kind {
        DoorKind::Door | DoorKind::TDoor if door.open => {
            let age = info.data.bump();
            if age == 1 {
                for (dx, dy, dz) in FAN_OUT {
                    let Some(n) = level.grid.neighbor_index(index, dx, dy, dz) else {
                        continue;
                    };
                    let neighbor = level.get_index(n);
                    let Some(other) = level.props(neighbor).door else {
                        continue;
                    };
                    let joins = match door.kind {
                        DoorKind::TDoor => neighbor == door.pair,
                        _ => other.kind == DoorKind::Door,
                    };
                    if joins && !other.open {
                        level.add_update(n, other.pair, PhysData::EMPTY);
                    }
                }
            }
            if age > DOOR_WAIT {
                level.add_update(index, door.pair, PhysData::EMPTY);
                info.remove();
            }
        }
        DoorKind::ODoor => {
            if info.data.has_flag(EXTRA_ARMED) {
                for (dx, dy, dz) in FAN_OUT {
                    let Some(n) = level.grid.neighbor_index(index, dx, dy, dz) else {
                        continue;
                    };
                    if level.get_index(n) == door.pair {
                        level.add_update(n, block, PhysData::EMPTY.with_flag(EXTRA_ARMED));
                    }
                }
            }
            info.remove();
        }
        _ => info.remove(),
    }
}
