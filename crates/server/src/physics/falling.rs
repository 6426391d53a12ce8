//! Blocks that fall (sand, gravel) or float up through water.

use voxtick_engine::physics::{PhysData, PhysInfo};

use crate::block::{self, LiquidFamily};
use crate::level::Level;

/// Cells a falling block drops per tick below instant physics.
pub const FALL_STEP: u32 = 1;

pub(super) fn falling(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    let max = if level.physics() == 4 { u32::MAX } else { FALL_STEP };

    let mut dest = None;
    let mut cursor = index;
    let mut steps = 0;
    while steps < max {
        let Some(below) = level.grid.neighbor_index(cursor, 0, -1, 0) else {
            break;
        };
        let under = level.get_index(below);
        let props = level.props(under);
        let passable = under == block::AIR || (props.is_liquid() && !props.op_block);
        if !passable {
            break;
        }
        dest = Some(below);
        cursor = below;
        steps += 1;
    }

    match dest {
        None => info.remove(),
        Some(to) => {
            if level.add_move(index, to, block::AIR, block, PhysData::EMPTY) {
                info.remove();
            }
        }
    }
}

/// Floating wood swaps upward with the water above it.
pub(super) fn float(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    let Some(above) = level.grid.neighbor_index(index, 0, 1, 0) else {
        info.remove();
        return;
    };
    let over = level.get_index(above);
    let props = level.props(over);
    if props.liquid_family() == Some(LiquidFamily::Water) && !props.op_block {
        if level.add_move(index, above, over, block, PhysData::EMPTY) {
            info.remove();
        }
        return;
    }
    info.remove();
}
