//! Block type definitions and the per-level property registry.
//!
//! Codes below 66 follow the classic block set plus its common extension.
//! Physics blocks sit above that. Codes 163, 198 and 199 are extended-storage
//! markers in the grid and are never assigned.

use std::sync::{Arc, RwLock};

use crate::hooks::{self, DeleteHook, PlaceHook};
use crate::physics::{self, Handler};
use voxtick_engine::world::block::BlockId;

// -- Classic --

pub const AIR: BlockId = BlockId(0);
pub const STONE: BlockId = BlockId(1);
pub const GRASS: BlockId = BlockId(2);
pub const DIRT: BlockId = BlockId(3);
pub const COBBLESTONE: BlockId = BlockId(4);
pub const WOOD: BlockId = BlockId(5);
pub const SAPLING: BlockId = BlockId(6);
pub const BEDROCK: BlockId = BlockId(7);
pub const WATER: BlockId = BlockId(8);
pub const STILL_WATER: BlockId = BlockId(9);
pub const LAVA: BlockId = BlockId(10);
pub const STILL_LAVA: BlockId = BlockId(11);
pub const SAND: BlockId = BlockId(12);
pub const GRAVEL: BlockId = BlockId(13);
pub const GOLD_ORE: BlockId = BlockId(14);
pub const IRON_ORE: BlockId = BlockId(15);
pub const COAL_ORE: BlockId = BlockId(16);
pub const LOG: BlockId = BlockId(17);
pub const LEAVES: BlockId = BlockId(18);
pub const SPONGE: BlockId = BlockId(19);
pub const GLASS: BlockId = BlockId(20);
/// First and last of the sixteen wool colours (red .. white).
pub const RED: BlockId = BlockId(21);
pub const WHITE: BlockId = BlockId(36);
pub const DANDELION: BlockId = BlockId(37);
pub const ROSE: BlockId = BlockId(38);
pub const BROWN_MUSHROOM: BlockId = BlockId(39);
pub const RED_MUSHROOM: BlockId = BlockId(40);
pub const GOLD: BlockId = BlockId(41);
pub const IRON: BlockId = BlockId(42);
pub const DOUBLE_SLAB: BlockId = BlockId(43);
pub const SLAB: BlockId = BlockId(44);
pub const BRICK: BlockId = BlockId(45);
pub const TNT: BlockId = BlockId(46);
pub const BOOKSHELF: BlockId = BlockId(47);
pub const MOSSY_ROCKS: BlockId = BlockId(48);
pub const OBSIDIAN: BlockId = BlockId(49);

// -- Classic extension --

pub const COBBLESTONE_SLAB: BlockId = BlockId(50);
pub const ROPE: BlockId = BlockId(51);
pub const SANDSTONE: BlockId = BlockId(52);
pub const SNOW: BlockId = BlockId(53);
pub const FIRE: BlockId = BlockId(54);
pub const ICE: BlockId = BlockId(60);
pub const MAGMA_ROCK: BlockId = BlockId(62);
pub const CRATE: BlockId = BlockId(64);
pub const STONE_BRICK: BlockId = BlockId(65);

// -- Physics: liquids --

pub const WOOD_FLOAT: BlockId = BlockId(66);
pub const FAST_LAVA: BlockId = BlockId(67);
pub const WATERFALL: BlockId = BlockId(68);
pub const LAVAFALL: BlockId = BlockId(69);
pub const WATER_FAUCET: BlockId = BlockId(70);
pub const LAVA_FAUCET: BlockId = BlockId(71);
pub const WATER_DRIP: BlockId = BlockId(72);
pub const LAVA_DRIP: BlockId = BlockId(73);
pub const FINITE_WATER: BlockId = BlockId(74);
pub const FINITE_LAVA: BlockId = BlockId(75);
pub const FINITE_FAUCET: BlockId = BlockId(76);
pub const MAGMA: BlockId = BlockId(77);
pub const GEYSER: BlockId = BlockId(78);
pub const LAVA_SPONGE: BlockId = BlockId(79);

// -- Physics: explosives, activatable --

pub const SMALL_TNT: BlockId = BlockId(80);
pub const BIG_TNT: BlockId = BlockId(81);
pub const NUKE_TNT: BlockId = BlockId(82);
pub const TNT_EXPLOSION: BlockId = BlockId(83);
pub const FIREWORK: BlockId = BlockId(84);
pub const C4: BlockId = BlockId(85);
pub const C4_DETONATOR: BlockId = BlockId(86);
pub const MESSAGE_BLOCK: BlockId = BlockId(87);
pub const MESSAGE_AIR: BlockId = BlockId(88);
pub const PORTAL_BLUE: BlockId = BlockId(89);
pub const PORTAL_ORANGE: BlockId = BlockId(90);

// -- Op blocks: immune to physics and explosions --

pub const OP_GLASS: BlockId = BlockId(100);
pub const OPSIDIAN: BlockId = BlockId(101);
pub const OP_BRICK: BlockId = BlockId(102);
pub const OP_STONE: BlockId = BlockId(103);
pub const OP_COBBLESTONE: BlockId = BlockId(104);
pub const OP_AIR: BlockId = BlockId(105);
pub const OP_WATER: BlockId = BlockId(106);
pub const OP_LAVA: BlockId = BlockId(107);

// -- Doors: closed codes, open codes follow at +10 --

pub const DOOR_LOG: BlockId = BlockId(110);
pub const DOOR_OBSIDIAN: BlockId = BlockId(111);
pub const DOOR_GLASS: BlockId = BlockId(112);
pub const DOOR_STONE: BlockId = BlockId(113);
pub const DOOR_LEAVES: BlockId = BlockId(114);
pub const DOOR_SAND: BlockId = BlockId(115);
pub const DOOR_WOOD: BlockId = BlockId(116);
pub const DOOR_IRON: BlockId = BlockId(117);
pub const DOOR_OPEN_OFFSET: u16 = 10;

pub const TDOOR_LOG: BlockId = BlockId(130);
pub const TDOOR_STONE: BlockId = BlockId(131);
pub const TDOOR_WOOD: BlockId = BlockId(132);
pub const TDOOR_GLASS: BlockId = BlockId(133);
pub const TDOOR_OPEN_OFFSET: u16 = 4;

pub const ODOOR_LOG: BlockId = BlockId(140);
pub const ODOOR_STONE: BlockId = BlockId(141);
pub const ODOOR_WOOD: BlockId = BlockId(142);
pub const ODOOR_GLASS: BlockId = BlockId(143);
pub const ODOOR_ON_OFFSET: u16 = 4;

// -- Animals --

pub const BIRD_WHITE: BlockId = BlockId(150);
pub const BIRD_BLACK: BlockId = BlockId(151);
pub const BIRD_KILLER: BlockId = BlockId(152);
pub const FISH_GOLD: BlockId = BlockId(153);
pub const FISH_SHARK: BlockId = BlockId(154);
pub const FISH_LAVA: BlockId = BlockId(155);
pub const FISH_LAVA_SHARK: BlockId = BlockId(156);
pub const ZOMBIE: BlockId = BlockId(157);
pub const CREEPER: BlockId = BlockId(158);

/// Registry rows: every base code plus the three extended ranges.
pub const REGISTRY_SIZE: usize = BlockId::MAX_EXTENDED as usize + 1;

// ── Property types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidFamily {
    Water,
    Lava,
}

impl LiquidFamily {
    pub fn opposes(self, other: LiquidFamily) -> bool {
        self != other
    }
}

/// How a liquid block behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidKind {
    /// Spreads to air neighbours (water every tick, lava on a delay).
    Flowing,
    /// Inert liquid: never spreads by itself.
    Still,
    /// Lava that spreads every tick.
    Fast,
    /// Falls straight down first, spreads only when landing on a solid.
    Fall,
    /// Emits drips downward on a counter and a random draw.
    Faucet,
    /// A single falling drop.
    Drip,
    /// Fixed bulk that seeks lower ground.
    Finite,
    /// Faucet emitting finite liquid.
    FiniteFaucet,
    /// Slow liquid that can also rise a few cells.
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liquid {
    pub family: LiquidFamily,
    pub kind: LiquidKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    /// Opens, fans out to any closed door, reverts after a wait.
    Door,
    /// Like `Door` but only fans out to its own material.
    TDoor,
    /// Toggles permanently between its two states.
    ODoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorInfo {
    pub kind: DoorKind,
    /// The other state of this door.
    pub pair: BlockId,
    /// True for the open (air-like) state of Door/TDoor and the "on"
    /// state of an ODoor.
    pub open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiMedium {
    Air,
    Water,
    Lava,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiMode {
    Wander,
    Flee,
    Hunt,
}

/// What an animal hunts or flees when no player is near.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTarget {
    Block(BlockId),
    Liquid(LiquidFamily),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimalAi {
    pub medium: AiMedium,
    pub mode: AiMode,
    pub target: Option<AiTarget>,
    /// Walks on the ground instead of flying/swimming freely.
    pub walker: bool,
    /// Blows up instead of striking.
    pub explodes: bool,
}

/// Static per-type metadata consulted by dispatch and handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockProps {
    /// Supports falling blocks and stops liquids.
    pub solid: bool,
    pub blocks_light: bool,
    pub liquid: Option<Liquid>,
    pub door: Option<DoorInfo>,
    pub message_block: bool,
    pub portal: bool,
    /// Dirt turns into this when lit.
    pub grass_block: Option<BlockId>,
    /// Grass turns into this when covered.
    pub dirt_block: Option<BlockId>,
    /// Two of these stacked merge into this block.
    pub stack_block: Option<BlockId>,
    pub animal_ai: Option<AnimalAi>,
    pub lava_kills: bool,
    pub water_kills: bool,
    pub flammable: bool,
    pub explosion_resistant: bool,
    pub falls: bool,
    pub floats: bool,
    /// Needs soil (or any solid, for mushrooms) underneath.
    pub plant: bool,
    pub decays: bool,
    pub sponge: Option<LiquidFamily>,
    /// Explosive strength for fused TNT blocks.
    pub tnt_strength: Option<u8>,
    /// Fire or an explosion turns this block into an armed fuse.
    pub ignite_into: Option<BlockId>,
    pub firework: bool,
    pub c4: bool,
    pub detonator: bool,
    pub op_block: bool,
}

pub const DEFAULT_PROPS: BlockProps = BlockProps {
    solid: true,
    blocks_light: true,
    liquid: None,
    door: None,
    message_block: false,
    portal: false,
    grass_block: None,
    dirt_block: None,
    stack_block: None,
    animal_ai: None,
    lava_kills: false,
    water_kills: false,
    flammable: false,
    explosion_resistant: false,
    falls: false,
    floats: false,
    plant: false,
    decays: false,
    sponge: None,
    tnt_strength: None,
    ignite_into: None,
    firework: false,
    c4: false,
    detonator: false,
    op_block: false,
};

const PASSABLE: BlockProps = BlockProps {
    solid: false,
    blocks_light: false,
    ..DEFAULT_PROPS
};

impl BlockProps {
    pub fn is_liquid(&self) -> bool {
        self.liquid.is_some()
    }

    pub fn liquid_family(&self) -> Option<LiquidFamily> {
        self.liquid.map(|l| l.family)
    }
}

fn liquid(family: LiquidFamily, kind: LiquidKind) -> BlockProps {
    BlockProps {
        liquid: Some(Liquid { family, kind }),
        ..PASSABLE
    }
}

fn animal(medium: AiMedium, mode: AiMode, target: Option<AiTarget>) -> BlockProps {
    BlockProps {
        animal_ai: Some(AnimalAi {
            medium,
            mode,
            target,
            walker: false,
            explodes: false,
        }),
        ..PASSABLE
    }
}

fn walker(explodes: bool) -> BlockProps {
    BlockProps {
        animal_ai: Some(AnimalAi {
            medium: AiMedium::Air,
            mode: AiMode::Hunt,
            target: None,
            walker: true,
            explodes,
        }),
        ..PASSABLE
    }
}

fn door(kind: DoorKind, pair: BlockId, open: bool) -> BlockProps {
    let info = Some(DoorInfo { kind, pair, open });
    match (kind, open) {
        (DoorKind::Door | DoorKind::TDoor, true) => BlockProps { door: info, ..PASSABLE },
        _ => BlockProps { door: info, ..DEFAULT_PROPS },
    }
}

fn name_of(code: u16) -> &'static str {
    match code {
        0 => "air", 1 => "stone", 2 => "grass", 3 => "dirt", 4 => "cobblestone",
        5 => "wood", 6 => "sapling", 7 => "bedrock", 8 => "water", 9 => "still_water",
        10 => "lava", 11 => "still_lava", 12 => "sand", 13 => "gravel", 14 => "gold_ore",
        15 => "iron_ore", 16 => "coal_ore", 17 => "log", 18 => "leaves", 19 => "sponge",
        20 => "glass", 21..=36 => "wool", 37 => "dandelion", 38 => "rose",
        39 => "brown_mushroom", 40 => "red_mushroom", 41 => "gold", 42 => "iron",
        43 => "double_slab", 44 => "slab", 45 => "brick", 46 => "tnt", 47 => "bookshelf",
        48 => "mossy_rocks", 49 => "obsidian", 50 => "cobblestone_slab", 51 => "rope",
        52 => "sandstone", 53 => "snow", 54 => "fire", 60 => "ice", 62 => "magma_rock",
        64 => "crate", 65 => "stone_brick", 66 => "wood_float", 67 => "fast_lava",
        68 => "waterfall", 69 => "lavafall", 70 => "water_faucet", 71 => "lava_faucet",
        72 => "water_drip", 73 => "lava_drip", 74 => "finite_water", 75 => "finite_lava",
        76 => "finite_faucet", 77 => "magma", 78 => "geyser", 79 => "lava_sponge",
        80 => "small_tnt", 81 => "big_tnt", 82 => "nuke_tnt", 83 => "tnt_explosion",
        84 => "firework", 85 => "c4", 86 => "c4_detonator", 87 => "message_block",
        88 => "message_air", 89 => "portal_blue", 90 => "portal_orange",
        100..=107 => "op_block", 110..=117 => "door", 120..=127 => "door_open",
        130..=133 => "tdoor", 134..=137 => "tdoor_open", 140..=143 => "odoor",
        144..=147 => "odoor_on", 150 => "bird_white", 151 => "bird_black",
        152 => "bird_killer", 153 => "fish_gold", 154 => "fish_shark", 155 => "fish_lava",
        156 => "fish_lava_shark", 157 => "zombie", 158 => "creeper",
        _ => "unknown",
    }
}

/// Built-in properties for `code`.
pub fn default_props(code: u16) -> BlockProps {
    use LiquidFamily::{Lava, Water};
    use LiquidKind::*;

    let b = BlockId(code);
    match b {
        AIR | OP_AIR => PASSABLE,
        GRASS => BlockProps { dirt_block: Some(DIRT), ..DEFAULT_PROPS },
        DIRT => BlockProps { grass_block: Some(GRASS), ..DEFAULT_PROPS },
        WOOD | LOG | BOOKSHELF | CRATE => BlockProps {
            flammable: true,
            lava_kills: true,
            ..DEFAULT_PROPS
        },
        SAPLING | DANDELION | ROSE | BROWN_MUSHROOM | RED_MUSHROOM => BlockProps {
            plant: true,
            water_kills: true,
            lava_kills: true,
            flammable: true,
            ..PASSABLE
        },
        BEDROCK | OBSIDIAN => BlockProps { explosion_resistant: true, ..DEFAULT_PROPS },
        WATER => liquid(Water, Flowing),
        STILL_WATER => liquid(Water, Still),
        LAVA => liquid(Lava, Flowing),
        STILL_LAVA => liquid(Lava, Still),
        FAST_LAVA => liquid(Lava, Fast),
        WATERFALL => liquid(Water, Fall),
        LAVAFALL => liquid(Lava, Fall),
        WATER_FAUCET => BlockProps { liquid: Some(Liquid { family: Water, kind: Faucet }), ..DEFAULT_PROPS },
        LAVA_FAUCET => BlockProps { liquid: Some(Liquid { family: Lava, kind: Faucet }), ..DEFAULT_PROPS },
        WATER_DRIP => liquid(Water, Drip),
        LAVA_DRIP => liquid(Lava, Drip),
        FINITE_WATER => liquid(Water, Finite),
        FINITE_LAVA => liquid(Lava, Finite),
        FINITE_FAUCET => BlockProps { liquid: Some(Liquid { family: Water, kind: FiniteFaucet }), ..DEFAULT_PROPS },
        MAGMA => liquid(Lava, Extended),
        GEYSER => liquid(Water, Extended),
        SAND | GRAVEL => BlockProps { falls: true, ..DEFAULT_PROPS },
        WOOD_FLOAT => BlockProps { floats: true, flammable: true, ..DEFAULT_PROPS },
        LEAVES => BlockProps {
            decays: true,
            flammable: true,
            lava_kills: true,
            blocks_light: false,
            ..DEFAULT_PROPS
        },
        SPONGE => BlockProps { sponge: Some(Water), ..DEFAULT_PROPS },
        LAVA_SPONGE => BlockProps { sponge: Some(Lava), ..DEFAULT_PROPS },
        GLASS | ICE => BlockProps { blocks_light: false, ..DEFAULT_PROPS },
        SLAB => BlockProps { stack_block: Some(DOUBLE_SLAB), blocks_light: false, ..DEFAULT_PROPS },
        COBBLESTONE_SLAB => BlockProps { stack_block: Some(COBBLESTONE), blocks_light: false, ..DEFAULT_PROPS },
        ROPE | SNOW => BlockProps { blocks_light: false, water_kills: true, ..PASSABLE },
        FIRE => BlockProps { water_kills: true, ..PASSABLE },
        TNT => BlockProps { ignite_into: Some(SMALL_TNT), flammable: true, ..DEFAULT_PROPS },
        SMALL_TNT => BlockProps { tnt_strength: Some(0), ..DEFAULT_PROPS },
        BIG_TNT => BlockProps { tnt_strength: Some(1), ..DEFAULT_PROPS },
        NUKE_TNT => BlockProps { tnt_strength: Some(4), ..DEFAULT_PROPS },
        TNT_EXPLOSION => BlockProps { lava_kills: true, water_kills: true, ..PASSABLE },
        FIREWORK => BlockProps { firework: true, ..DEFAULT_PROPS },
        C4 => BlockProps { c4: true, ..DEFAULT_PROPS },
        C4_DETONATOR => BlockProps { detonator: true, ..DEFAULT_PROPS },
        MESSAGE_BLOCK => BlockProps { message_block: true, ..DEFAULT_PROPS },
        MESSAGE_AIR => BlockProps { message_block: true, ..PASSABLE },
        PORTAL_BLUE | PORTAL_ORANGE => BlockProps { portal: true, ..PASSABLE },
        OP_WATER => BlockProps {
            liquid: Some(Liquid { family: Water, kind: Still }),
            op_block: true,
            explosion_resistant: true,
            ..PASSABLE
        },
        OP_LAVA => BlockProps {
            liquid: Some(Liquid { family: Lava, kind: Still }),
            op_block: true,
            explosion_resistant: true,
            ..PASSABLE
        },
        BlockId(100..=104) => BlockProps {
            op_block: true,
            explosion_resistant: true,
            ..DEFAULT_PROPS
        },
        BlockId(c @ 110..=117) => door(DoorKind::Door, BlockId(c + DOOR_OPEN_OFFSET), false),
        BlockId(c @ 120..=127) => door(DoorKind::Door, BlockId(c - DOOR_OPEN_OFFSET), true),
        BlockId(c @ 130..=133) => door(DoorKind::TDoor, BlockId(c + TDOOR_OPEN_OFFSET), false),
        BlockId(c @ 134..=137) => door(DoorKind::TDoor, BlockId(c - TDOOR_OPEN_OFFSET), true),
        BlockId(c @ 140..=143) => door(DoorKind::ODoor, BlockId(c + ODOOR_ON_OFFSET), false),
        BlockId(c @ 144..=147) => door(DoorKind::ODoor, BlockId(c - ODOOR_ON_OFFSET), true),
        BIRD_WHITE => animal(AiMedium::Air, AiMode::Wander, None),
        BIRD_BLACK => animal(AiMedium::Air, AiMode::Flee, Some(AiTarget::Block(BIRD_KILLER))),
        BIRD_KILLER => animal(AiMedium::Air, AiMode::Hunt, Some(AiTarget::Block(BIRD_WHITE))),
        FISH_GOLD => animal(AiMedium::Water, AiMode::Flee, Some(AiTarget::Liquid(LiquidFamily::Lava))),
        FISH_SHARK => animal(AiMedium::Water, AiMode::Hunt, Some(AiTarget::Block(FISH_GOLD))),
        FISH_LAVA => animal(AiMedium::Lava, AiMode::Flee, Some(AiTarget::Liquid(LiquidFamily::Water))),
        FISH_LAVA_SHARK => animal(AiMedium::Lava, AiMode::Hunt, Some(AiTarget::Block(FISH_LAVA))),
        ZOMBIE => walker(false),
        CREEPER => walker(true),
        BlockId(21..=36) => BlockProps { flammable: true, lava_kills: true, ..DEFAULT_PROPS },
        _ => DEFAULT_PROPS,
    }
}

// ── Registry ─────────────────────────────────────────────────────────────

/// One row per block code plus the dispatch tables derived from them.
///
/// Rows are immutable while a tick runs; redefinition goes through
/// [`SharedRegistry`], which waits for in-flight ticks.
#[derive(Clone)]
pub struct BlockRegistry {
    props: Vec<BlockProps>,
    names: Vec<String>,
    handlers: Vec<Option<Handler>>,
    place_hooks: Vec<Option<PlaceHook>>,
    delete_hooks: Vec<Option<DeleteHook>>,
    /// Exact-code handler replacements that survive `rebuild`.
    overrides: Vec<(BlockId, Option<Handler>)>,
}

impl BlockRegistry {
    /// Built-in rows for every code; extended codes start out as inert solids.
    pub fn default_set() -> Self {
        let mut props = Vec::with_capacity(REGISTRY_SIZE);
        let mut names = Vec::with_capacity(REGISTRY_SIZE);
        for code in 0..REGISTRY_SIZE as u16 {
            props.push(default_props(code));
            names.push(name_of(code).to_string());
        }
        let mut registry = Self {
            props,
            names,
            handlers: Vec::new(),
            place_hooks: Vec::new(),
            delete_hooks: Vec::new(),
            overrides: Vec::new(),
        };
        registry.rebuild();
        registry
    }

    /// Recompute the handler and hook tables from the property rows.
    pub fn rebuild(&mut self) {
        self.handlers = (0..REGISTRY_SIZE as u16)
            .map(|code| physics::handler_for(BlockId(code), &self.props[code as usize]))
            .collect();
        for (block, handler) in &self.overrides {
            self.handlers[block.index()] = *handler;
        }
        self.place_hooks = (0..REGISTRY_SIZE as u16)
            .map(|code| hooks::place_hook_for(BlockId(code), &self.props[code as usize]))
            .collect();
        self.delete_hooks = (0..REGISTRY_SIZE as u16)
            .map(|code| hooks::delete_hook_for(BlockId(code), &self.props[code as usize]))
            .collect();
    }

    /// Properties of `block`; unknown or invalid codes get inert defaults.
    #[inline]
    pub fn props(&self, block: BlockId) -> &BlockProps {
        self.props.get(block.index()).unwrap_or(&DEFAULT_PROPS)
    }

    pub fn name(&self, block: BlockId) -> &str {
        self.names.get(block.index()).map(String::as_str).unwrap_or("invalid")
    }

    /// The physics handler for `block`, if it has one.
    #[inline]
    pub fn handler(&self, block: BlockId) -> Option<Handler> {
        self.handlers.get(block.index()).copied().flatten()
    }

    /// Does placing `block` create a worklist entry?
    #[inline]
    pub fn is_active(&self, block: BlockId) -> bool {
        self.handler(block).is_some()
    }

    pub fn place_hook(&self, block: BlockId) -> Option<PlaceHook> {
        self.place_hooks.get(block.index()).copied().flatten()
    }

    pub fn delete_hook(&self, block: BlockId) -> Option<DeleteHook> {
        self.delete_hooks.get(block.index()).copied().flatten()
    }

    /// Redefine a block (custom block definitions). Rebuilds the tables.
    /// Marker codes and out-of-range ids are refused.
    pub fn redefine(&mut self, block: BlockId, name: &str, props: BlockProps) -> bool {
        if block.index() >= REGISTRY_SIZE
            || matches!(block.0, 163 | 198 | 199)
            || block == AIR
        {
            return false;
        }
        self.props[block.index()] = props;
        self.names[block.index()] = name.to_string();
        self.rebuild();
        true
    }

    /// Force a handler (or force none) for one exact code.
    pub fn override_handler(&mut self, block: BlockId, handler: Option<Handler>) {
        if block.index() >= REGISTRY_SIZE {
            return;
        }
        self.overrides.retain(|(b, _)| *b != block);
        self.overrides.push((block, handler));
        self.handlers[block.index()] = handler;
    }

    /// Number of rows (every code a grid can hold).
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::default_set()
    }
}

/// Registry shared by every loaded level.
///
/// Ticks hold the read lock for their whole duration; `redefine` takes the
/// write lock, so it waits for in-flight ticks and no tick ever sees a
/// half-updated table.
#[derive(Clone)]
pub struct SharedRegistry(Arc<RwLock<Arc<BlockRegistry>>>);

impl SharedRegistry {
    pub fn new(registry: BlockRegistry) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(registry))))
    }

    /// Read barrier for one tick. Poisoning only means a redefinition
    /// panicked midway; the stored `Arc` is still a complete registry.
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, Arc<BlockRegistry>> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Arc<BlockRegistry> {
        Arc::clone(&self.read())
    }

    /// Redefine one block for every level.
    pub fn redefine(&self, block: BlockId, name: &str, props: BlockProps) -> bool {
        let mut guard = self.0.write().unwrap_or_else(|e| e.into_inner());
        let mut next = BlockRegistry::clone(&guard);
        if !next.redefine(block, name, props) {
            return false;
        }
        *guard = Arc::new(next);
        tracing::info!("Block {} redefined as '{}'", block, name);
        true
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new(BlockRegistry::default_set())
    }
}
