//! Handler table, category gates and the behaviour of individual block
//! families.

use std::sync::Arc;

use voxtick_engine::physics::data::{EXTRA_DISSIPATE, EXTRA_DROP, EXTRA_REVERT, EXTRA_WAIT};
use voxtick_engine::physics::{PhysData, PhysInfo};
use voxtick_engine::world::{BlockId, BlockPos, VoxelGrid};
use voxtick_server::block::{self, BlockRegistry, DEFAULT_PROPS, REGISTRY_SIZE};
use voxtick_server::change::Requester;
use voxtick_server::level::{self, Level, LevelEvent, LevelSettings, Occupant};
use voxtick_server::physics::explosion::{self, Explosion, Strength};
use voxtick_server::physics::finite::shuffled_slots;
use voxtick_server::physics::{self, Category, Handler};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 32^3 flat world: grass surface at y=16, air from y=17 up.
fn flat_level(physics: u8) -> Level {
    flat_level_with(BlockRegistry::default_set(), physics, LevelSettings::default())
}

fn flat_level_with(registry: BlockRegistry, physics: u8, settings: LevelSettings) -> Level {
    let grid = level::flat_grid(32, 32, 32).unwrap();
    let settings = LevelSettings { physics, ..settings };
    Level::new("test", grid, Arc::new(registry), settings)
}

fn at(x: i32, y: i32, z: i32) -> BlockPos {
    BlockPos::new(x, y, z)
}

fn place(level: &mut Level, pos: BlockPos, block: BlockId) {
    level.request_change(pos, block, Requester::Command).unwrap();
}

fn run(level: &mut Level, ticks: usize) {
    for _ in 0..ticks {
        level.tick();
    }
}

fn count_where(level: &Level, f: impl Fn(u8) -> bool) -> usize {
    level.grid().raw_blocks().iter().filter(|b| f(**b)).count()
}

// ---------------------------------------------------------------------------
// Dispatch table
// ---------------------------------------------------------------------------

#[test]
fn every_code_resolves_to_a_handler_or_none() {
    let registry = BlockRegistry::default_set();
    assert_eq!(registry.len(), REGISTRY_SIZE);
    for code in 0..REGISTRY_SIZE as u16 {
        let b = BlockId(code);
        let expected = physics::handler_for(b, registry.props(b)).map(|h| h.category);
        assert_eq!(registry.handler(b).map(|h| h.category), expected, "code {code}");
        assert_eq!(registry.is_active(b), expected.is_some(), "code {code}");
    }
    assert!(registry.handler(BlockId::INVALID).is_none());
    assert!(registry.handler(BlockId(5000)).is_none());
    assert_eq!(registry.props(BlockId::INVALID), &DEFAULT_PROPS);
}

#[test]
fn handler_categories_by_block() {
    let registry = BlockRegistry::default_set();
    let open_door = BlockId(block::DOOR_LOG.0 + block::DOOR_OPEN_OFFSET);
    let cases = [
        (block::AIR, None),
        (block::STONE, None),
        (block::STILL_WATER, None),
        (block::OP_WATER, None),
        (block::TNT, None),
        (block::DOOR_LOG, None),
        (block::TDOOR_LOG, None),
        (BlockId(600), None),
        (open_door, Some(Category::Door)),
        (block::ODOOR_LOG, Some(Category::Door)),
        (block::WATER, Some(Category::Liquid)),
        (block::LAVA_FAUCET, Some(Category::Liquid)),
        (block::FINITE_WATER, Some(Category::Finite)),
        (block::FINITE_FAUCET, Some(Category::Finite)),
        (block::SAND, Some(Category::Falling)),
        (block::WOOD_FLOAT, Some(Category::Falling)),
        (block::GRASS, Some(Category::Grass)),
        (block::DIRT, Some(Category::Grass)),
        (block::SLAB, Some(Category::Stack)),
        (block::FIRE, Some(Category::Fire)),
        (block::TNT_EXPLOSION, Some(Category::Other)),
        (block::SMALL_TNT, Some(Category::Explosive)),
        (block::NUKE_TNT, Some(Category::Explosive)),
        (block::FIREWORK, Some(Category::Firework)),
        (block::SPONGE, Some(Category::Sponge)),
        (block::LEAVES, Some(Category::LeafDecay)),
        (block::ROSE, Some(Category::Other)),
        (block::ZOMBIE, Some(Category::Animal)),
        (block::FISH_SHARK, Some(Category::Animal)),
    ];
    for (b, category) in cases {
        assert_eq!(registry.handler(b).map(|h| h.category), category, "block {b}");
    }
}

#[test]
fn category_gates_follow_physics_level() {
    let mut settings = LevelSettings::default();
    assert!(!Category::Door.allowed(0, &settings));
    assert!(Category::Door.allowed(5, &settings));
    assert!(!Category::Liquid.allowed(5, &settings));
    assert!(Category::Liquid.allowed(1, &settings));
    assert!(!Category::Explosive.allowed(2, &settings));
    assert!(Category::Explosive.allowed(3, &settings));
    assert!(Category::Explosive.allowed(4, &settings));
    assert!(!Category::LeafDecay.allowed(2, &settings));
    settings.leaf_decay = true;
    assert!(Category::LeafDecay.allowed(2, &settings));
    assert!(!Category::LeafDecay.allowed(1, &settings));
}

#[test]
fn doors_only_physics_ignores_liquids() {
    let mut level = flat_level(5);
    place(&mut level, at(10, 17, 10), block::WATER);
    place(&mut level, at(3, 17, 3), block::DOOR_LOG);
    level
        .request_change(at(3, 17, 3), block::AIR, Requester::Player(2))
        .unwrap();
    let open = BlockId(block::DOOR_LOG.0 + block::DOOR_OPEN_OFFSET);
    assert_eq!(level.get(at(3, 17, 3)), open);

    run(&mut level, 3);
    assert_eq!(level.get(at(11, 17, 10)), block::AIR);
    assert_eq!(level.get(at(3, 17, 3)), open);

    run(&mut level, 20);
    assert_eq!(level.get(at(3, 17, 3)), block::DOOR_LOG);
}

// ---------------------------------------------------------------------------
// Fault isolation
// ---------------------------------------------------------------------------

fn faulty(_level: &mut Level, _info: &mut PhysInfo) {
    panic!("handler bug");
}

#[test]
fn panicking_handler_is_dropped_and_tick_continues() {
    let mut registry = BlockRegistry::default_set();
    registry.override_handler(block::BRICK, Some(Handler::new(faulty, Category::Other)));
    let mut level = flat_level_with(registry, 1, LevelSettings::default());
    place(&mut level, at(4, 20, 4), block::BRICK);
    place(&mut level, at(8, 25, 8), block::SAND);

    let stats = level.tick();
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.processed, 2);
    assert_eq!(level.get(at(8, 24, 8)), block::SAND);
    assert_eq!(level.get(at(4, 20, 4)), block::BRICK);

    let stats = level.tick();
    assert_eq!(stats.faults, 0);
    assert_eq!(level.get(at(8, 23, 8)), block::SAND);
}

fn queue_then_fail(level: &mut Level, info: &mut PhysInfo) {
    let above = level.grid().neighbor_index(info.index, 0, 1, 0).unwrap();
    level.add_update(above, block::GOLD, PhysData::EMPTY);
    level.add_check(info.index, PhysData::EMPTY);
    panic!("failed halfway");
}

#[test]
fn panicking_handler_leaves_no_queued_updates() {
    let mut registry = BlockRegistry::default_set();
    registry.override_handler(block::BRICK, Some(Handler::new(queue_then_fail, Category::Other)));
    let mut level = flat_level_with(registry, 1, LevelSettings::default());
    place(&mut level, at(4, 20, 4), block::BRICK);

    let stats = level.tick();
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.applied, 0);
    assert_eq!(level.get(at(4, 21, 4)), block::AIR);
    assert_eq!(level.pending_updates(), 0);
    assert_eq!(level.worklist_len(), 0);
}

// ---------------------------------------------------------------------------
// Timed blocks
// ---------------------------------------------------------------------------

#[test]
fn timed_block_reverts_after_its_wait() {
    let mut level = flat_level(1);
    let pos = at(5, 20, 5);
    let data = PhysData::EMPTY
        .with_flag(EXTRA_WAIT | EXTRA_REVERT)
        .with_wait(2)
        .with_block(block::AIR.0);
    level
        .request_change_with(pos, block::GLASS, Requester::Command, data)
        .unwrap();

    run(&mut level, 2);
    assert_eq!(level.get(pos), block::GLASS);
    level.tick();
    assert_eq!(level.get(pos), block::AIR);
}

#[test]
fn certain_dissipation_clears_on_first_evaluation() {
    let mut level = flat_level(1);
    let pos = at(6, 20, 6);
    let data = PhysData::EMPTY.with_flag(EXTRA_DISSIPATE).with_param(100);
    level
        .request_change_with(pos, block::STONE, Requester::Command, data)
        .unwrap();
    level.tick();
    assert_eq!(level.get(pos), block::AIR);
}

#[test]
fn dropping_rubble_lands_and_stays() {
    let mut level = flat_level(1);
    let data = PhysData::EMPTY.with_flag(EXTRA_DROP).with_direction(100);
    level
        .request_change_with(at(7, 22, 7), block::STONE, Requester::Command, data)
        .unwrap();

    level.tick();
    assert_eq!(level.get(at(7, 21, 7)), block::STONE);
    run(&mut level, 10);
    assert_eq!(level.get(at(7, 17, 7)), block::STONE);
    for y in 18..=22 {
        assert_eq!(level.get(at(7, y, 7)), block::AIR);
    }
}

// ---------------------------------------------------------------------------
// Liquids
// ---------------------------------------------------------------------------

#[test]
fn water_spreads_every_tick_lava_waits() {
    let mut level = flat_level(1);
    place(&mut level, at(5, 17, 5), block::WATER);
    place(&mut level, at(20, 17, 20), block::LAVA);

    level.tick();
    assert_eq!(level.get(at(6, 17, 5)), block::WATER);
    assert_eq!(level.get(at(5, 17, 4)), block::WATER);

    run(&mut level, 2);
    assert_eq!(level.get(at(21, 17, 20)), block::AIR);
    level.tick();
    assert_eq!(level.get(at(21, 17, 20)), block::LAVA);
    assert_eq!(level.get(at(20, 17, 19)), block::LAVA);
}

#[test]
fn water_washes_away_plants() {
    let mut level = flat_level(1);
    place(&mut level, at(11, 17, 10), block::ROSE);
    place(&mut level, at(10, 17, 10), block::WATER);
    level.tick();
    assert_eq!(level.get(at(11, 17, 10)), block::WATER);
}

#[test]
fn sponge_soaks_and_holds_back_water() {
    let mut level = flat_level(1);
    place(&mut level, at(10, 17, 10), block::STILL_WATER);
    place(&mut level, at(11, 17, 10), block::STILL_WATER);
    place(&mut level, at(14, 17, 10), block::STILL_WATER);
    place(&mut level, at(10, 17, 12), block::SPONGE);
    level.tick();
    assert_eq!(level.get(at(10, 17, 10)), block::AIR);
    assert_eq!(level.get(at(11, 17, 10)), block::AIR);
    assert_eq!(level.get(at(14, 17, 10)), block::STILL_WATER);

    place(&mut level, at(10, 17, 16), block::WATER);
    run(&mut level, 5);
    assert_eq!(level.get(at(10, 17, 15)), block::WATER);
    assert_eq!(level.get(at(10, 17, 14)), block::AIR);

    // Removing the sponge lets the water back in.
    place(&mut level, at(10, 17, 12), block::AIR);
    run(&mut level, 2);
    assert_eq!(level.get(at(10, 17, 14)), block::WATER);
}

#[test]
fn faucet_drips_on_every_third_tick_when_the_draw_passes() {
    let seed = 11;
    let settings = LevelSettings { seed, ..LevelSettings::default() };
    let mut level = flat_level_with(BlockRegistry::default_set(), 1, settings);
    place(&mut level, at(8, 30, 8), block::WATER_FAUCET);

    // The faucet is the only thing drawing from the level's random source.
    let mut reference = Xoshiro256PlusPlus::seed_from_u64(seed);
    let below = at(8, 29, 8);
    for tick in 1..=60 {
        level.tick();
        let expected = if tick % 3 == 0 && reference.random_range(1..10) > 7 {
            block::WATER_DRIP
        } else {
            block::AIR
        };
        assert_eq!(level.get(below), expected, "tick {tick}");
        assert_eq!(level.get(at(8, 30, 8)), block::WATER_FAUCET);
    }
}

#[test]
fn drip_falls_then_vanishes_on_the_ground() {
    let mut level = flat_level(1);
    place(&mut level, at(5, 19, 5), block::WATER_DRIP);
    level.tick();
    assert_eq!(level.get(at(5, 19, 5)), block::AIR);
    assert_eq!(level.get(at(5, 18, 5)), block::WATER_DRIP);
    level.tick();
    assert_eq!(level.get(at(5, 17, 5)), block::WATER_DRIP);
    level.tick();
    assert_eq!(level.get(at(5, 17, 5)), block::AIR);
    assert_eq!(count_where(&level, |b| b as u16 == block::WATER_DRIP.0), 0);
    assert_eq!(level.get(at(5, 16, 5)), block::GRASS);
}

#[test]
fn falls_go_straight_down_before_spreading() {
    for (fall, base) in [(block::WATERFALL, block::WATER), (block::LAVAFALL, block::LAVA)] {
        let mut level = flat_level(1);
        place(&mut level, at(10, 20, 10), fall);
        run(&mut level, 3);
        for y in 17..=20 {
            assert_eq!(level.get(at(10, y, 10)), fall, "{fall} column at y={y}");
        }
        for y in 17..=20 {
            for (x, z) in [(9, 10), (11, 10), (10, 9), (10, 11)] {
                assert_eq!(level.get(at(x, y, z)), block::AIR, "{fall} beside at y={y}");
            }
        }

        // Landed on grass: now it spreads sideways as the base liquid.
        level.tick();
        assert_eq!(level.get(at(11, 17, 10)), base, "{fall}");
        assert_eq!(level.get(at(10, 17, 9)), base, "{fall}");
        run(&mut level, 10);
        for y in 18..=20 {
            assert_eq!(level.get(at(11, y, 10)), block::AIR, "{fall} never climbs");
        }
    }
}

#[test]
fn magma_rises_at_most_three_cells() {
    let mut grid = VoxelGrid::new(9, 40, 9).unwrap();
    grid.fill(at(0, 0, 0), at(8, 0, 8), block::STONE);
    let mut level = Level::new(
        "magma",
        grid,
        Arc::new(BlockRegistry::default_set()),
        LevelSettings { physics: 1, seed: 5, ..LevelSettings::default() },
    );
    place(&mut level, at(4, 1, 4), block::MAGMA);
    run(&mut level, 3000);

    let top = level
        .grid()
        .raw_blocks()
        .iter()
        .enumerate()
        .filter(|(_, b)| **b as u16 == block::MAGMA.0)
        .map(|(i, _)| level.pos(i as u32).y)
        .max()
        .unwrap();
    assert!(top >= 2, "magma never rose");
    assert!(top <= 4, "magma climbed to y={top}");
    assert_eq!(level.get(at(0, 1, 0)), block::MAGMA);
}

#[test]
fn floating_wood_rises_through_water() {
    let mut level = flat_level(1);
    place(&mut level, at(10, 17, 10), block::WOOD_FLOAT);
    for y in 18..=20 {
        place(&mut level, at(10, y, 10), block::STILL_WATER);
    }
    level.tick();
    assert_eq!(level.get(at(10, 18, 10)), block::WOOD_FLOAT);
    assert_eq!(level.get(at(10, 17, 10)), block::STILL_WATER);
    run(&mut level, 2);
    assert_eq!(level.get(at(10, 20, 10)), block::WOOD_FLOAT);

    // Air above: it stays put.
    run(&mut level, 5);
    assert_eq!(level.get(at(10, 20, 10)), block::WOOD_FLOAT);
    assert_eq!(level.get(at(10, 21, 10)), block::AIR);
    for y in 17..=19 {
        assert_eq!(level.get(at(10, y, 10)), block::STILL_WATER);
    }
}

#[test]
fn finite_slot_shuffle_is_a_seeded_permutation() {
    let a = shuffled_slots(&mut Xoshiro256PlusPlus::seed_from_u64(3));
    let b = shuffled_slots(&mut Xoshiro256PlusPlus::seed_from_u64(3));
    assert_eq!(a, b);
    let mut sorted = a;
    sorted.sort_unstable();
    let identity: Vec<u8> = (0..25).collect();
    assert_eq!(sorted.to_vec(), identity);
}

// ---------------------------------------------------------------------------
// Fire and explosives
// ---------------------------------------------------------------------------

#[test]
fn fire_burns_out_and_chars_the_log() {
    let mut level = flat_level(1);
    place(&mut level, at(5, 17, 5), block::LOG);
    place(&mut level, at(5, 18, 5), block::FIRE);
    level.tick();
    assert_eq!(level.get(at(5, 18, 5)), block::FIRE);

    run(&mut level, 10);
    assert_eq!(level.get(at(5, 18, 5)), block::AIR);
    assert_eq!(level.get(at(5, 17, 5)), block::COAL_ORE);
}

#[test]
fn fire_stops_at_non_flammable_blocks() {
    let mut level = flat_level(2);
    // Burning row ending at a stone block, wood beyond it.
    for x in 5..=9 {
        place(&mut level, at(x, 20, 10), block::FIRE);
    }
    place(&mut level, at(10, 20, 10), block::STONE);
    for x in 11..=15 {
        place(&mut level, at(x, 20, 10), block::WOOD);
    }
    // Wood boxed in by fire does catch.
    place(&mut level, at(5, 20, 14), block::WOOD);
    for (x, y, z) in [(4, 20, 14), (6, 20, 14), (5, 20, 13), (5, 20, 15), (5, 21, 14)] {
        place(&mut level, at(x, y, z), block::FIRE);
    }

    run(&mut level, 60);
    assert_eq!(level.get(at(10, 20, 10)), block::STONE);
    for x in 11..=15 {
        assert_eq!(level.get(at(x, 20, 10)), block::WOOD, "x={x}");
    }
    assert_eq!(level.get(at(5, 20, 14)), block::AIR);
    assert_eq!(count_where(&level, |b| b as u16 == block::FIRE.0), 0);
}

#[test]
fn fire_arms_tnt_only_in_hardcore() {
    for (physics, expected) in [(2, block::TNT), (3, block::SMALL_TNT)] {
        let mut level = flat_level(physics);
        place(&mut level, at(11, 17, 10), block::TNT);
        place(&mut level, at(10, 17, 10), block::FIRE);
        level.tick();
        assert_eq!(level.get(at(11, 17, 10)), expected, "physics {physics}");
    }
}

#[test]
fn tnt_fuse_runs_four_ticks() {
    let mut level = flat_level(3);
    let pos = at(10, 17, 10);
    place(&mut level, pos, block::SMALL_TNT);

    run(&mut level, 3);
    assert_eq!(level.get(pos), block::SMALL_TNT);
    assert!(level.drain_events().is_empty());

    level.tick();
    assert_eq!(level.get(pos), block::TNT_EXPLOSION);
    assert_eq!(
        level.drain_events(),
        vec![LevelEvent::Exploded { center: pos, strength: 0 }]
    );

    level.tick();
    assert_eq!(level.get(pos), block::AIR);
}

#[test]
fn tnt_is_inert_below_hardcore() {
    let mut level = flat_level(2);
    let pos = at(10, 17, 10);
    place(&mut level, pos, block::SMALL_TNT);
    run(&mut level, 10);
    assert_eq!(level.get(pos), block::SMALL_TNT);
    assert!(level.drain_events().is_empty());
}

fn blast(seed: u64) -> Level {
    let settings = LevelSettings {
        seed,
        ..LevelSettings::default()
    };
    let mut level = flat_level_with(BlockRegistry::default_set(), 3, settings);
    place(&mut level, at(16, 16, 17), block::OBSIDIAN);
    place(&mut level, at(14, 17, 16), block::BEDROCK);
    place(&mut level, at(18, 17, 16), block::SMALL_TNT);
    explosion::explode(
        &mut level,
        Explosion::new(at(16, 17, 16), Strength::Big, block::TNT),
    );
    level
}

#[test]
fn explosion_spares_resistant_blocks_and_chains() {
    let mut level = blast(9);
    level.tick();
    assert_eq!(level.get(at(16, 17, 16)), block::TNT_EXPLOSION);
    assert_eq!(level.get(at(16, 16, 17)), block::OBSIDIAN);
    assert_eq!(level.get(at(14, 17, 16)), block::BEDROCK);
    assert_eq!(level.get(at(18, 17, 16)), block::SMALL_TNT);
    assert_eq!(
        level.drain_events(),
        vec![LevelEvent::Exploded { center: at(16, 17, 16), strength: 1 }]
    );

    // The armed TNT goes off on its next evaluation.
    level.tick();
    assert!(
        level
            .drain_events()
            .contains(&LevelEvent::Exploded { center: at(18, 17, 16), strength: 0 })
    );

    run(&mut level, 40);
    assert_eq!(level.get(at(16, 16, 17)), block::OBSIDIAN);
    assert_eq!(level.get(at(0, 0, 0)), block::BEDROCK);
    assert_eq!(count_where(&level, |b| b as u16 == block::TNT_EXPLOSION.0), 0);
}

#[test]
fn explosion_is_deterministic_per_seed() {
    let mut a = blast(21);
    let mut b = blast(21);
    run(&mut a, 30);
    run(&mut b, 30);
    assert_eq!(a.grid().raw_blocks(), b.grid().raw_blocks());
}

#[test]
fn strength_classes() {
    assert_eq!(Strength::Small.radius(), 1);
    assert_eq!(Strength::Big.radius(), 2);
    assert_eq!(Strength::Nuke.radius(), 5);
    assert_eq!(Strength::from_power(4), Strength::Nuke);
    assert_eq!(Strength::from_power(2), Strength::Custom(2));
}

#[test]
fn firework_climbs_bursts_and_fades() {
    let mut level = flat_level(1);
    place(&mut level, at(16, 17, 16), block::FIREWORK);
    let is_wool = |b: u8| (block::RED.0..=block::WHITE.0).contains(&(b as u16));

    run(&mut level, 7);
    assert_eq!(level.get(at(16, 24, 16)), block::FIREWORK);
    level.tick();
    assert_eq!(count_where(&level, is_wool), 27);
    assert_eq!(count_where(&level, |b| b as u16 == block::FIREWORK.0), 0);

    run(&mut level, 20);
    assert_eq!(count_where(&level, is_wool), 0);
}

// ---------------------------------------------------------------------------
// Doors
// ---------------------------------------------------------------------------

#[test]
fn odoor_toggle_spreads_and_stays() {
    let mut level = flat_level(1);
    let on = BlockId(block::ODOOR_LOG.0 + block::ODOOR_ON_OFFSET);
    for x in 4..7 {
        place(&mut level, at(x, 17, 4), block::ODOOR_LOG);
    }
    level
        .request_change(at(4, 17, 4), block::AIR, Requester::Player(1))
        .unwrap();
    assert_eq!(level.get(at(4, 17, 4)), on);

    level.tick();
    assert_eq!(level.get(at(5, 17, 4)), on);
    assert_eq!(level.get(at(6, 17, 4)), block::ODOOR_LOG);
    level.tick();
    assert_eq!(level.get(at(6, 17, 4)), on);

    run(&mut level, 30);
    for x in 4..7 {
        assert_eq!(level.get(at(x, 17, 4)), on);
    }
}

#[test]
fn command_removes_doors_outright() {
    let mut level = flat_level(1);
    place(&mut level, at(4, 17, 4), block::DOOR_IRON);
    place(&mut level, at(4, 17, 4), block::AIR);
    assert_eq!(level.get(at(4, 17, 4)), block::AIR);
}

// ---------------------------------------------------------------------------
// Grass, plants, leaves
// ---------------------------------------------------------------------------

#[test]
fn lit_dirt_grows_grass_after_delay() {
    let mut level = flat_level(1);
    place(&mut level, at(5, 17, 5), block::DIRT);
    assert_eq!(level.get(at(5, 16, 5)), block::DIRT);

    run(&mut level, 19);
    assert_eq!(level.get(at(5, 17, 5)), block::DIRT);
    level.tick();
    assert_eq!(level.get(at(5, 17, 5)), block::GRASS);
    assert_eq!(level.get(at(5, 16, 5)), block::DIRT);
}

#[test]
fn unsupported_flower_drops() {
    let mut level = flat_level(1);
    place(&mut level, at(3, 20, 3), block::DANDELION);
    place(&mut level, at(4, 17, 4), block::DANDELION);
    level.tick();
    assert_eq!(level.get(at(3, 20, 3)), block::AIR);
    assert_eq!(level.get(at(4, 17, 4)), block::DANDELION);
}

#[test]
fn leaves_far_from_a_log_decay() {
    let settings = LevelSettings {
        leaf_decay: true,
        ..LevelSettings::default()
    };
    let mut level = flat_level_with(BlockRegistry::default_set(), 2, settings);
    place(&mut level, at(10, 17, 10), block::LOG);
    for y in 18..=24 {
        place(&mut level, at(10, y, 10), block::LEAVES);
    }
    place(&mut level, at(3, 22, 3), block::LEAVES);

    run(&mut level, 3);
    for y in 18..=21 {
        assert_eq!(level.get(at(10, y, 10)), block::LEAVES, "y {y}");
    }
    for y in 22..=24 {
        assert_eq!(level.get(at(10, y, 10)), block::AIR, "y {y}");
    }
    assert_eq!(level.get(at(3, 22, 3)), block::AIR);
}

#[test]
fn leaves_stay_without_leaf_decay() {
    let mut level = flat_level(2);
    place(&mut level, at(3, 22, 3), block::LEAVES);
    run(&mut level, 3);
    assert_eq!(level.get(at(3, 22, 3)), block::LEAVES);
}

// ---------------------------------------------------------------------------
// Animals
// ---------------------------------------------------------------------------

#[test]
fn zombie_strikes_adjacent_player_in_hardcore() {
    let mut level = flat_level(3);
    let pos = at(10, 17, 10);
    place(&mut level, pos, block::ZOMBIE);
    level.set_occupants(vec![Occupant { id: 1, pos: at(11, 17, 10) }]);

    run(&mut level, 2);
    let index = level.index(pos).unwrap();
    assert_eq!(
        level.drain_events(),
        vec![LevelEvent::PlayerHit { player: 1, by: block::ZOMBIE, index }]
    );
    assert_eq!(level.get(pos), block::ZOMBIE);
}

#[test]
fn zombie_does_not_strike_below_hardcore() {
    let mut level = flat_level(2);
    place(&mut level, at(10, 17, 10), block::ZOMBIE);
    level.set_occupants(vec![Occupant { id: 1, pos: at(11, 17, 10) }]);
    run(&mut level, 4);
    assert!(
        !level
            .drain_events()
            .iter()
            .any(|e| matches!(e, LevelEvent::PlayerHit { .. }))
    );
}

#[test]
fn creeper_explodes_next_to_player() {
    let mut level = flat_level(3);
    let pos = at(10, 17, 10);
    place(&mut level, pos, block::CREEPER);
    level.set_occupants(vec![Occupant { id: 4, pos: at(10, 17, 11) }]);
    run(&mut level, 2);
    assert_eq!(
        level.drain_events(),
        vec![LevelEvent::Exploded { center: pos, strength: 0 }]
    );
    assert_eq!(level.get(pos), block::TNT_EXPLOSION);
}

#[test]
fn hunting_bird_closes_in() {
    let mut level = flat_level(2);
    place(&mut level, at(10, 20, 10), block::BIRD_KILLER);
    level.set_occupants(vec![Occupant { id: 1, pos: at(10, 26, 10) }]);

    run(&mut level, 2);
    assert_eq!(level.get(at(10, 20, 10)), block::AIR);
    assert_eq!(level.get(at(10, 21, 10)), block::BIRD_KILLER);
    run(&mut level, 2);
    assert_eq!(level.get(at(10, 22, 10)), block::BIRD_KILLER);
}

#[test]
fn fleeing_bird_moves_away_from_player() {
    let mut level = flat_level(1);
    place(&mut level, at(10, 20, 10), block::BIRD_BLACK);
    level.set_occupants(vec![Occupant { id: 1, pos: at(10, 20, 12) }]);
    run(&mut level, 2);
    assert_eq!(level.get(at(10, 20, 10)), block::AIR);
    assert_eq!(level.get(at(10, 20, 9)), block::BIRD_BLACK);
}

#[test]
fn fleeing_bird_avoids_a_killer_bird() {
    let mut level = flat_level(1);
    place(&mut level, at(10, 20, 10), block::BIRD_BLACK);
    place(&mut level, at(10, 20, 13), block::BIRD_KILLER);
    run(&mut level, 2);
    assert_eq!(level.get(at(10, 20, 9)), block::BIRD_BLACK);
}

/// A one-cell-wide water channel along x at y=18, z=10.
fn water_channel(level: &mut Level) {
    for x in 6..=14 {
        place(level, at(x, 18, 10), block::STILL_WATER);
    }
}

#[test]
fn gold_fish_swims_away_from_lava() {
    let mut level = flat_level(1);
    water_channel(&mut level);
    place(&mut level, at(4, 18, 10), block::STILL_LAVA);
    place(&mut level, at(8, 18, 10), block::FISH_GOLD);

    run(&mut level, 2);
    assert_eq!(level.get(at(8, 18, 10)), block::STILL_WATER);
    assert_eq!(level.get(at(9, 18, 10)), block::FISH_GOLD);
    run(&mut level, 2);
    assert_eq!(level.get(at(10, 18, 10)), block::FISH_GOLD);
}

#[test]
fn shark_hunts_gold_fish_without_players() {
    let mut level = flat_level(1);
    water_channel(&mut level);
    place(&mut level, at(6, 18, 10), block::FISH_SHARK);
    place(&mut level, at(13, 18, 10), block::FISH_GOLD);

    run(&mut level, 2);
    assert_eq!(level.get(at(7, 18, 10)), block::FISH_SHARK);
    run(&mut level, 2);
    assert_eq!(level.get(at(8, 18, 10)), block::FISH_SHARK);
    assert_eq!(level.get(at(6, 18, 10)), block::STILL_WATER);
}
