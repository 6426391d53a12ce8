//! Animal AI: birds, fish, zombies and creepers.
//!
//! Every `AI_DELAY` ticks an animal picks one neighbouring cell of its
//! medium and swaps with it: toward the nearest player when hunting, away
//! from it when fleeing. With no player near, the nearest cell of the
//! animal's target block stands in. Otherwise it wanders at random.
//! Hunters next to a player strike it (hardcore physics and up).

use rand::Rng;
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::position::{FAN_OUT, HORIZONTAL};
use voxtick_engine::world::{BlockId, BlockPos};

use crate::block::{self, AiMedium, AiMode, AiTarget, AnimalAi, LiquidFamily};
use crate::level::{Level, LevelEvent, Occupant};

use super::explosion::{self, Explosion, Strength};

pub const AI_DELAY: u8 = 2;
/// Players further than this are ignored.
pub const AI_SEARCH: i64 = 16;
/// Squared distance at which a hunter strikes.
pub const AI_STRIKE_SQ: i64 = 2;
/// Cube radius searched for target blocks.
pub const AI_BLOCK_SEARCH: i32 = 8;

pub(super) fn animal(level: &mut Level, info: &mut PhysInfo) {
    let index = info.index;
    let block = level.get_index(index);
    let Some(ai) = level.props(block).animal_ai else {
        info.remove();
        return;
    };
    if info.data.bump() < AI_DELAY {
        return;
    }
    info.data.set_counter(0);

    let pos = level.pos(index);
    let player = nearest_player(level.occupants(), pos);

    if ai.mode == AiMode::Hunt && level.physics() >= 3 {
        if let Some(player) = player.filter(|p| p.pos.dist_sq(&pos) <= AI_STRIKE_SQ) {
            if ai.explodes {
                info.remove();
                explosion::explode(level, Explosion::new(pos, Strength::Small, block));
            } else {
                level.events.push(LevelEvent::PlayerHit {
                    player: player.id,
                    by: block,
                    index,
                });
            }
            return;
        }
    }

    let moves = candidate_moves(level, pos, &ai);
    if moves.is_empty() {
        return;
    }
    let target = match (player, ai.mode, ai.target) {
        (Some(player), _, _) => Some(player.pos),
        (None, AiMode::Wander, _) | (None, _, None) => None,
        (None, _, Some(wanted)) => nearest_block(level, pos, wanted),
    };
    let choice = match (ai.mode, target) {
        (AiMode::Hunt, Some(target)) => pick_by_distance(&moves, target, false),
        (AiMode::Flee, Some(target)) => pick_by_distance(&moves, target, true),
        _ => {
            let roll = level.rng().random_range(0..moves.len());
            moves[roll]
        }
    };

    let (to, medium) = choice;
    let Some(to_index) = level.index(to) else {
        return;
    };
    if level.add_move(index, to_index, medium, block, PhysData::EMPTY) {
        info.remove();
    }
}

fn nearest_player(occupants: &[Occupant], pos: BlockPos) -> Option<Occupant> {
    let mut best: Option<(i64, Occupant)> = None;
    for occupant in occupants {
        let d = occupant.pos.dist_sq(&pos);
        if d > AI_SEARCH * AI_SEARCH {
            continue;
        }
        if best.is_none_or(|(b, _)| d < b) {
            best = Some((d, *occupant));
        }
    }
    best.map(|(_, o)| o)
}

/// Nearest cell holding `wanted` within `AI_BLOCK_SEARCH`, first in index
/// order on ties.
fn nearest_block(level: &Level, pos: BlockPos, wanted: AiTarget) -> Option<BlockPos> {
    let r = AI_BLOCK_SEARCH;
    let mut best: Option<(i64, BlockPos)> = None;
    for dy in -r..=r {
        for dz in -r..=r {
            for dx in -r..=r {
                let at = pos.offset(dx, dy, dz);
                let b = level.get(at);
                let hit = match wanted {
                    AiTarget::Block(target) => b == target,
                    AiTarget::Liquid(family) => level.props(b).liquid_family() == Some(family),
                };
                if !hit || at == pos {
                    continue;
                }
                let d = at.dist_sq(&pos);
                if best.is_none_or(|(best_d, _)| d < best_d) {
                    best = Some((d, at));
                }
            }
        }
    }
    best.map(|(_, at)| at)
}

/// First candidate with the smallest (or largest) distance to `target`.
fn pick_by_distance(moves: &[(BlockPos, BlockId)], target: BlockPos, farthest: bool) -> (BlockPos, BlockId) {
    let mut best = moves[0];
    let mut best_d = best.0.dist_sq(&target);
    for &candidate in &moves[1..] {
        let d = candidate.0.dist_sq(&target);
        let better = if farthest { d > best_d } else { d < best_d };
        if better {
            best = candidate;
            best_d = d;
        }
    }
    best
}

fn in_medium(level: &Level, block: BlockId, medium: AiMedium) -> bool {
    let props = level.props(block);
    match medium {
        AiMedium::Air => block == block::AIR,
        AiMedium::Water => props.liquid_family() == Some(LiquidFamily::Water) && !props.op_block,
        AiMedium::Lava => props.liquid_family() == Some(LiquidFamily::Lava) && !props.op_block,
    }
}

/// Reachable cells paired with the block they hold (left behind on a swap).
fn candidate_moves(level: &Level, pos: BlockPos, ai: &AnimalAi) -> Vec<(BlockPos, BlockId)> {
    let mut moves = Vec::with_capacity(6);
    if !ai.walker {
        for (dx, dy, dz) in FAN_OUT {
            let to = pos.offset(dx, dy, dz);
            let b = level.get(to);
            if !b.is_invalid() && in_medium(level, b, ai.medium) {
                moves.push((to, b));
            }
        }
        return moves;
    }

    let solid = |p: BlockPos| {
        let b = level.get(p);
        !b.is_invalid() && level.props(b).solid
    };
    let open = |p: BlockPos| level.get(p) == block::AIR;

    // Nothing underfoot: fall.
    if open(pos.below()) {
        moves.push((pos.below(), block::AIR));
        return moves;
    }
    for (dx, dy, dz) in HORIZONTAL {
        let ahead = pos.offset(dx, dy, dz);
        if open(ahead) {
            if solid(ahead.below()) {
                moves.push((ahead, block::AIR));
            } else if open(ahead.below()) && solid(ahead.below().below()) {
                moves.push((ahead.below(), block::AIR));
            }
        } else if solid(ahead) && open(ahead.above()) && open(pos.above()) {
            moves.push((ahead.above(), block::AIR));
        }
    }
    moves
}
