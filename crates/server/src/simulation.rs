//! Level set and tick drivers.
//!
//! Each loaded level sits behind a [`LevelHandle`]: one mutex serializes
//! outside `request_change` calls with the level's own ticks. A tokio task
//! per level drives its ticks on a fixed interval ([`start`]); `tick_all`
//! ticks every level at once on the rayon pool (benchmarks, headless runs).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rayon::prelude::*;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use voxtick_engine::world::{BlockId, BlockPos};

use crate::block::SharedRegistry;
use crate::change::{ChangeError, ChangeResult, Requester};
use crate::level::{Level, LevelEvent};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::physics::TickStats;
use crate::player_registry::PlayerRegistry;

pub struct LevelHandle {
    name: String,
    level: Mutex<Level>,
    registry: SharedRegistry,
    unloaded: AtomicBool,
}

impl LevelHandle {
    pub fn new(level: Level, registry: SharedRegistry) -> Self {
        Self {
            name: level.name.clone(),
            level: Mutex::new(level),
            registry,
            unloaded: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exclusive access to the level. A handler panic is caught inside the
    /// tick, so a poisoned lock still guards a consistent level.
    pub fn lock(&self) -> MutexGuard<'_, Level> {
        self.level.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::Acquire)
    }

    pub fn request_change(
        &self,
        pos: BlockPos,
        block: BlockId,
        requester: Requester,
    ) -> Result<ChangeResult, ChangeError> {
        if self.is_unloaded() {
            return Err(ChangeError::Unloaded);
        }
        self.lock().request_change(pos, block, requester)
    }

    /// One tick under the registry read barrier. `None` once unloaded.
    pub fn tick(&self) -> Option<TickStats> {
        if self.is_unloaded() {
            return None;
        }
        let registry = self.registry.read();
        let mut level = self.lock();
        if !Arc::ptr_eq(level.registry(), &*registry) {
            level.set_registry(Arc::clone(&*registry));
        }
        Some(level.tick())
    }

    fn unload(&self) {
        self.unloaded.store(true, Ordering::Release);
        let mut level = self.lock();
        level.clear_physics();
        level.flush_history();
    }
}

/// Every loaded level, by name.
pub struct LevelSet {
    levels: DashMap<String, Arc<LevelHandle>>,
    drivers: DashMap<String, JoinHandle<()>>,
    registry: SharedRegistry,
    metrics: Arc<Metrics>,
}

impl LevelSet {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            levels: DashMap::new(),
            drivers: DashMap::new(),
            registry,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Add a level, replacing (and unloading) any level of the same name.
    pub fn load(&self, level: Level) -> Arc<LevelHandle> {
        let handle = Arc::new(LevelHandle::new(level, self.registry.clone()));
        let name = handle.name().to_string();
        if self.levels.contains_key(&name) {
            self.unload(&name);
        }
        self.levels.insert(name.clone(), Arc::clone(&handle));
        self.metrics.level_loaded();
        tracing::info!("Level '{}' loaded", name);
        handle
    }

    pub fn get(&self, name: &str) -> Option<Arc<LevelHandle>> {
        self.levels.get(name).map(|h| Arc::clone(h.value()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.levels.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Stop ticking `name` and drop its scheduled work. A tick already in
    /// progress finishes first (it holds the level lock).
    pub fn unload(&self, name: &str) -> Option<Arc<LevelHandle>> {
        let (_, handle) = self.levels.remove(name)?;
        if let Some((_, driver)) = self.drivers.remove(name) {
            driver.abort();
        }
        handle.unload();
        self.metrics.level_unloaded();
        tracing::info!("Level '{}' unloaded", name);
        Some(handle)
    }

    /// Tick every level once, one level per rayon worker.
    pub fn tick_all(&self) -> Vec<(String, TickStats)> {
        let handles: Vec<Arc<LevelHandle>> = self.levels.iter().map(|e| Arc::clone(e.value())).collect();
        let mut results: Vec<(String, TickStats)> = handles
            .par_iter()
            .filter_map(|handle| {
                let start = Instant::now();
                let stats = handle.tick()?;
                self.metrics.record_tick(&stats, start.elapsed());
                Some((handle.name().to_string(), stats))
            })
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let (entries, rejected) = self.levels.iter().fold((0u64, 0u64), |(e, r), handle| {
            let level = handle.lock();
            (
                e + level.worklist_len() as u64,
                r + level.worklist().rejected_total(),
            )
        });
        self.metrics.snapshot(entries, rejected)
    }
}

// ── Tick drivers ─────────────────────────────────────────────────────────────

/// Spawn the tick driver for one level.
///
/// Every `period` the driver copies the level's players in as occupants,
/// ticks it, and logs what the level reported. Block deltas leave through
/// the level's own sender.
pub fn start(set: &Arc<LevelSet>, handle: Arc<LevelHandle>, players: Arc<PlayerRegistry>, period: Duration) {
    let metrics = Arc::clone(set.metrics());
    let name = handle.name().to_string();
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it.
        interval.tick().await;
        tracing::info!("Tick driver for '{}' started (period {:?})", handle.name(), period);

        loop {
            interval.tick().await;
            if handle.is_unloaded() {
                break;
            }
            handle.lock().set_occupants(players.occupants(handle.name()));

            let start = Instant::now();
            let Some(stats) = handle.tick() else {
                break;
            };
            metrics.record_tick(&stats, start.elapsed());

            let events = handle.lock().drain_events();
            for event in &events {
                log_event(handle.name(), event);
            }
        }
        tracing::info!("Tick driver for '{}' stopped", handle.name());
    });
    if let Some(old) = set.drivers.insert(name, task) {
        old.abort();
    }
}

/// Spawn drivers for every loaded level.
pub fn start_all(set: &Arc<LevelSet>, players: &Arc<PlayerRegistry>, period: Duration) {
    for name in set.names() {
        if let Some(handle) = set.get(&name) {
            start(set, handle, Arc::clone(players), period);
        }
    }
}

fn log_event(level: &str, event: &LevelEvent) {
    match event {
        LevelEvent::Message { index, player } => {
            tracing::debug!("Level '{}': player {} read message block {}", level, player, index)
        }
        LevelEvent::Portal { index, player } => {
            tracing::debug!("Level '{}': player {} entered portal {}", level, player, index)
        }
        LevelEvent::PlayerHit { player, by, index } => {
            tracing::info!("Level '{}': player {} hit by {} at {}", level, player, by, index)
        }
        LevelEvent::Exploded { center, strength } => tracing::debug!(
            "Level '{}': explosion power {} at ({}, {}, {})",
            level,
            strength,
            center.x,
            center.y,
            center.z
        ),
    }
}
