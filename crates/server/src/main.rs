use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use voxtick_engine::world::BlockPos;
use voxtick_server::block::{self, SharedRegistry};
use voxtick_server::change::Requester;
use voxtick_server::config::{LevelConfig, ServerConfig};
use voxtick_server::event_bus::{self, BlockChangeBatch, BusSender};
use voxtick_server::level::{self, Level, LevelSettings};
use voxtick_server::persistence::{self, FileHistory};
use voxtick_server::player_registry::PlayerRegistry;
use voxtick_server::simulation::{self, LevelSet};

fn arg_value(flag: &str) -> Option<String> {
    std::env::args().skip_while(|a| a != flag).nth(1)
}

#[tokio::main]
async fn main() {
    let demo_mode = std::env::args().any(|a| a == "--demo");
    let config_path: PathBuf = arg_value("--config").unwrap_or_else(|| "voxtick.json".into()).into();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if demo_mode {
        run_demo();
        return;
    }

    let mut config = match ServerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return;
        }
    };
    if let Some(dir) = arg_value("--world") {
        config.world_dir = dir.into();
    }

    tracing::info!("voxtick -- block physics server");

    let registry = SharedRegistry::default();
    let levels = Arc::new(LevelSet::new(registry.clone()));
    let bus = event_bus::channel();
    let players = Arc::new(PlayerRegistry::new());

    for level_config in &config.levels {
        match open_level(&config, level_config, &registry, &bus) {
            Ok(level) => {
                levels.load(level);
            }
            Err(e) => tracing::error!("Level '{}' not loaded: {:#}", level_config.name, e),
        }
    }
    if levels.is_empty() {
        tracing::error!("No level could be loaded");
        return;
    }

    let period = Duration::from_millis(config.tick_interval_ms);
    simulation::start_all(&levels, &players, period);

    // ── Periodic autosave ────────────────────────────────────────────────
    if config.autosave_secs > 0 {
        let save_levels = Arc::clone(&levels);
        let save_dir = config.world_dir.clone();
        let every = Duration::from_secs(config.autosave_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // first tick is immediate, skip it
            loop {
                interval.tick().await;
                let saved = save_all(&save_levels, &save_dir);
                tracing::info!("Autosave complete: {} levels written", saved);
            }
        });
    }

    // ── Periodic metrics log ─────────────────────────────────────────────
    if config.metrics_secs > 0 {
        let metric_levels = Arc::clone(&levels);
        let every = Duration::from_secs(config.metrics_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                match serde_json::to_string(&metric_levels.metrics_snapshot()) {
                    Ok(json) => tracing::info!("metrics {}", json),
                    Err(e) => tracing::warn!("metrics snapshot not serializable: {}", e),
                }
            }
        });
    }

    tracing::info!(
        "{} levels running, tick period {:?}",
        levels.len(),
        period
    );
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to wait for Ctrl+C: {}", e);
    }
    tracing::info!("Ctrl+C received, shutting down...");

    // ── Save on shutdown ─────────────────────────────────────────────────
    let saved = save_all(&levels, &config.world_dir);
    tracing::info!("Shutdown save complete: {} levels written", saved);
    for name in levels.names() {
        levels.unload(&name);
    }
}

/// Load a saved level or generate a flat one, and wire up its sinks.
fn open_level(
    config: &ServerConfig,
    level_config: &LevelConfig,
    registry: &SharedRegistry,
    bus: &tokio::sync::broadcast::Sender<BlockChangeBatch>,
) -> anyhow::Result<Level> {
    let name = &level_config.name;
    let mut settings = level_config.settings.clone();
    let grid = match persistence::load_level(&config.world_dir, name)? {
        Some(saved) => {
            settings.physics = saved.physics;
            saved.grid
        }
        None => {
            tracing::info!(
                "Generating flat level '{}' ({}x{}x{})",
                name,
                level_config.width,
                level_config.height,
                level_config.length
            );
            level::flat_grid(level_config.width, level_config.height, level_config.length)
                .with_context(|| format!("generating level '{}'", name))?
        }
    };

    let mut level = Level::new(name, grid, registry.snapshot(), settings)
        .with_sender(Box::new(BusSender::new(name, bus.clone())));
    if config.history {
        let history = FileHistory::open(&persistence::history_path(&config.world_dir, name))?;
        level = level.with_history(Box::new(history));
    }
    Ok(level)
}

fn save_all(levels: &LevelSet, dir: &std::path::Path) -> usize {
    let mut saved = 0;
    for name in levels.names() {
        let Some(handle) = levels.get(&name) else {
            continue;
        };
        match persistence::save_level(&mut handle.lock(), dir) {
            Ok(true) => saved += 1,
            Ok(false) => {}
            Err(e) => tracing::error!("Saving level '{}' failed: {:#}", name, e),
        }
    }
    saved
}

/// Headless run: drop sand, pour water and lava, light a fuse, and report.
fn run_demo() {
    tracing::info!("voxtick -- physics demo");

    let grid = match level::flat_grid(32, 32, 32) {
        Ok(grid) => grid,
        Err(e) => {
            tracing::error!("{}", e);
            return;
        }
    };
    let settings = LevelSettings {
        physics: 3,
        seed: 7,
        ..LevelSettings::default()
    };
    let mut level = Level::new("demo", grid, SharedRegistry::default().snapshot(), settings);

    let sand = BlockPos::new(8, 28, 8);
    let placements = [
        (sand, block::SAND),
        (BlockPos::new(20, 17, 20), block::WATER),
        (BlockPos::new(24, 17, 20), block::LAVA),
        (BlockPos::new(4, 17, 24), block::TNT),
        (BlockPos::new(4, 17, 25), block::FIRE),
    ];
    for (pos, b) in placements {
        if let Err(e) = level.request_change(pos, b, Requester::Command) {
            tracing::warn!("Demo placement at {:?} failed: {}", pos, e);
        }
    }

    for _ in 0..40 {
        let stats = level.tick();
        tracing::info!(
            "tick {:>2}: {:>4} processed, {:>4} applied, {:>4} pending",
            level.ticks(),
            stats.processed,
            stats.applied,
            stats.pending
        );
    }

    let landed = level.get(BlockPos::new(8, 17, 8));
    if landed == block::SAND {
        tracing::info!("Sand landed on the surface.");
    } else {
        tracing::warn!("Unexpected block {} where the sand should rest", landed);
    }
    for event in level.drain_events() {
        tracing::info!("event: {:?}", event);
    }
}
