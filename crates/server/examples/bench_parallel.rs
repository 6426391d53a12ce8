//! Benchmark: ticking many levels one after another vs. on the rayon pool.
//!
//! Every level gets a grid of sand columns dropped onto a flat floor. Both
//! runs tick until every level is quiet, then the grids are compared.
//! Run with: `cargo run --release -p voxtick-server --example bench_parallel`

use std::sync::Arc;
use std::time::Instant;

use voxtick_engine::world::BlockPos;
use voxtick_server::block::{self, BlockRegistry, SharedRegistry};
use voxtick_server::change::Requester;
use voxtick_server::level::{self, Level, LevelSettings};
use voxtick_server::simulation::LevelSet;

const LEVELS: usize = 16;
const SIDE: u16 = 64;
const HEIGHT: u16 = 48;
const COLUMN_SPACING: i32 = 4;
const DROP_HEIGHT: i32 = 44;

fn main() {
    println!("=== voxtick: sequential vs parallel level ticking ===\n");
    println!(
        "  {} levels of {}x{}x{}, sand every {} cells dropped from y={}\n",
        LEVELS, SIDE, HEIGHT, SIDE, COLUMN_SPACING, DROP_HEIGHT
    );

    let registry = Arc::new(BlockRegistry::default_set());

    // --- Sequential ---
    let mut seq: Vec<Level> = (0..LEVELS).map(|i| build_level(i, &registry)).collect();
    let t0 = Instant::now();
    let mut ticks_seq = 0;
    while seq.iter().any(|l| l.worklist_len() > 0 || l.pending_updates() > 0) {
        for level in &mut seq {
            level.tick();
        }
        ticks_seq += 1;
    }
    let dt_seq = t0.elapsed();
    println!("  Sequential: {:>5} ticks in {:>8.2?}", ticks_seq, dt_seq);

    // --- Parallel ---
    let set = LevelSet::new(SharedRegistry::new(BlockRegistry::clone(&registry)));
    for i in 0..LEVELS {
        set.load(build_level(i, &set.registry().snapshot()));
    }
    let t0 = Instant::now();
    let mut ticks_par = 0;
    while set.tick_all().iter().any(|(_, stats)| stats.pending > 0) {
        ticks_par += 1;
    }
    ticks_par += 1;
    let dt_par = t0.elapsed();
    println!("  Parallel:   {:>5} ticks in {:>8.2?}", ticks_par, dt_par);

    let speedup = dt_seq.as_secs_f64() / dt_par.as_secs_f64();
    println!("\n  Speedup: {:.2}x", speedup);

    // --- Verify identical ---
    let mut mismatches = 0;
    for (i, level) in seq.iter().enumerate() {
        let Some(handle) = set.get(&format!("bench-{}", i)) else {
            mismatches += 1;
            continue;
        };
        let other = handle.lock();
        if level.grid().raw_blocks() != other.grid().raw_blocks() {
            mismatches += 1;
        }
    }
    if mismatches == 0 {
        println!("  Verification: PASS (levels identical)");
    } else {
        println!("  Verification: FAIL ({} levels differ)", mismatches);
    }
}

fn build_level(i: usize, registry: &Arc<BlockRegistry>) -> Level {
    let grid = level::flat_grid(SIDE, HEIGHT, SIDE).expect("valid dimensions");
    let settings = LevelSettings {
        seed: i as u64,
        ..LevelSettings::default()
    };
    let mut level = Level::new(&format!("bench-{}", i), grid, Arc::clone(registry), settings);
    for x in (2..SIDE as i32).step_by(COLUMN_SPACING as usize) {
        for z in (2..SIDE as i32).step_by(COLUMN_SPACING as usize) {
            level
                .request_change(BlockPos::new(x, DROP_HEIGHT, z), block::SAND, Requester::Command)
                .expect("in range");
        }
    }
    level
}
