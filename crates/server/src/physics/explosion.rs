//! ExplosionEngine: turns an explosion into queued block updates.
//!
//! Cells are visited in increasing index order (y, then z, then x), so the
//! same explosion with the same seed always fills in the same way. Nothing
//! is written directly; everything goes through the level's update queue
//! and lands at the end of the current tick.

use rand::Rng;
use voxtick_engine::physics::data::{EXTRA_ARMED, EXTRA_DISSIPATE, EXTRA_DROP};
use voxtick_engine::physics::PhysData;
use voxtick_engine::world::{BlockId, BlockPos};

use crate::block;
use crate::level::{Level, LevelEvent};

use super::explosive::TNT_FUSE;

/// Percent chance per tick that rubble drops one cell.
pub const RUBBLE_DROP: u8 = 50;
/// Percent chance per tick that rubble vanishes.
pub const RUBBLE_DISSIPATE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Small,
    Big,
    Nuke,
    Custom(u8),
}

impl Strength {
    pub fn power(self) -> u8 {
        match self {
            Strength::Small => 0,
            Strength::Big => 1,
            Strength::Nuke => 4,
            Strength::Custom(power) => power,
        }
    }

    pub fn from_power(power: u8) -> Self {
        match power {
            0 => Strength::Small,
            1 => Strength::Big,
            4 => Strength::Nuke,
            other => Strength::Custom(other),
        }
    }

    /// Radius of the fully destroyed core.
    pub fn radius(self) -> i32 {
        self.power() as i32 + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explosion {
    pub center: BlockPos,
    pub strength: Strength,
    /// The block that went off (TNT, C4, a creeper...).
    pub cause: BlockId,
}

impl Explosion {
    pub fn new(center: BlockPos, strength: Strength, cause: BlockId) -> Self {
        Self { center, strength, cause }
    }
}

pub fn explode(level: &mut Level, explosion: Explosion) {
    let Explosion { center, strength, cause } = explosion;
    let r = strength.radius();
    let center_index = level.index(center);
    if let Some(i) = center_index {
        level.add_update(i, block::TNT_EXPLOSION, PhysData::EMPTY);
    }

    let mut queued = 0usize;
    for dy in -r..=r {
        for dz in -r..=r {
            for dx in -r..=r {
                let Some(i) = level.index(center.offset(dx, dy, dz)) else {
                    continue;
                };
                if Some(i) != center_index && blast_core(level, i) {
                    queued += 1;
                }
            }
        }
    }

    let outer = r + 2;
    for dy in -outer..=outer {
        for dz in -outer..=outer {
            for dx in -outer..=outer {
                if dx.abs().max(dy.abs()).max(dz.abs()) <= r {
                    continue;
                }
                let Some(i) = level.index(center.offset(dx, dy, dz)) else {
                    continue;
                };
                let b = level.get_index(i);
                if b == block::AIR || level.props(b).explosion_resistant {
                    continue;
                }
                if level.rng().random_range(0..3) == 0 && level.add_update(i, block::AIR, PhysData::EMPTY) {
                    queued += 1;
                }
            }
        }
    }

    level.events.push(LevelEvent::Exploded {
        center,
        strength: strength.power(),
    });
    tracing::debug!(
        "Level '{}': {} exploded at ({}, {}, {}) power {}, {} cells queued",
        level.name,
        level.registry().name(cause),
        center.x,
        center.y,
        center.z,
        strength.power(),
        queued
    );
}

/// One core cell. Returns whether an update was queued.
fn blast_core(level: &mut Level, index: u32) -> bool {
    let b = level.get_index(index);
    let props = *level.props(b);
    // Debris from an earlier blast clears itself next tick.
    if props.explosion_resistant || b == block::TNT_EXPLOSION {
        return false;
    }
    if let Some(fuse) = props.ignite_into {
        return level.add_update(index, fuse, PhysData::EMPTY.with_flag(EXTRA_ARMED));
    }
    if props.tnt_strength.is_some() {
        // Goes off on its next evaluation.
        let armed = PhysData::EMPTY.with_flag(EXTRA_ARMED).with_counter(TNT_FUSE - 1);
        return level.add_update(index, b, armed);
    }

    let draw: u8 = level.rng().random_range(1..11);
    if draw <= 4 {
        level.add_update(index, block::TNT_EXPLOSION, PhysData::EMPTY)
    } else if draw <= 8 {
        b != block::AIR && level.add_update(index, block::AIR, PhysData::EMPTY)
    } else if b != block::AIR {
        let rubble = PhysData::EMPTY
            .with_flag(EXTRA_DROP | EXTRA_DISSIPATE)
            .with_direction(RUBBLE_DROP)
            .with_param(RUBBLE_DISSIPATE);
        level.add_update(index, b, rubble)
    } else {
        false
    }
}
