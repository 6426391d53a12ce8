//! Finite liquids: a fixed bulk that seeks lower ground instead of spreading.

use rand::Rng;
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::BlockId;

use crate::block::{self, LiquidKind};
use crate::level::Level;

use super::liquid::{emit_below, faucet_fires};

/// Footprint side; slot `i` maps to `(i / 5 - 2, i % 5 - 2)`.
const FOOTPRINT: usize = 5;
const SLOTS: usize = FOOTPRINT * FOOTPRINT;

pub(super) fn finite(level: &mut Level, info: &mut PhysInfo) {
    let block = level.get_index(info.index);
    let Some(liquid) = level.props(block).liquid else {
        info.remove();
        return;
    };
    match liquid.kind {
        LiquidKind::FiniteFaucet => {
            if faucet_fires(level, info) {
                emit_below(level, info.index, block::FINITE_WATER);
            }
        }
        LiquidKind::Finite => settle(level, info, block),
        _ => info.remove(),
    }
}

/// Seeded Fisher–Yates over the footprint slots.
pub fn shuffled_slots<R: Rng + ?Sized>(rng: &mut R) -> [u8; SLOTS] {
    let mut slots: [u8; SLOTS] = std::array::from_fn(|i| i as u8);
    for i in (1..SLOTS).rev() {
        let j = rng.random_range(0..=i);
        slots.swap(i, j);
    }
    slots
}

fn settle(level: &mut Level, info: &mut PhysInfo, block: BlockId) {
    let index = info.index;
    if let Some(below) = level.grid.neighbor_index(index, 0, -1, 0) {
        if level.get_index(below) == block::AIR {
            // A contended move is retried next tick.
            if level.add_move(index, below, block::AIR, block, PhysData::EMPTY) {
                info.remove();
            }
            return;
        }
    }

    let pos = level.pos(index);
    let slots = shuffled_slots(level.rng());
    for slot in slots {
        let dx = slot as i32 / FOOTPRINT as i32 - 2;
        let dz = slot as i32 % FOOTPRINT as i32 - 2;
        if dx == 0 && dz == 0 {
            continue;
        }
        let target = pos.offset(dx, 0, dz);
        if level.get(target) != block::AIR || level.get(target.below()) != block::AIR {
            continue;
        }
        // Integer division truncates toward zero: the path bends to the centre.
        let mid = pos.offset(dx / 2, 0, dz / 2);
        if mid != pos && level.get(mid) != block::AIR {
            continue;
        }
        let Some(to) = level.index(target) else {
            continue;
        };
        if level.add_move(index, to, block::AIR, block, PhysData::EMPTY) {
            info.remove();
            return;
        }
    }
    // At rest.
    info.remove();
}
