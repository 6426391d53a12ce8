//! Shared registry of connected players.
//!
//! Sessions keep each player's level and block position current here; the
//! tick driver copies the players of a level into its occupant list before
//! every tick, which is all the animal AI sees of them.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;
use voxtick_engine::world::BlockPos;

use crate::level::Occupant;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerInfo {
    pub id: u32,
    pub name: String,
    pub level: String,
    pub pos: BlockPos,
}

/// Lifecycle events broadcast to interested sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    Joined { id: u32, name: String, level: String },
    Left { id: u32 },
    Moved { id: u32, level: String, pos: BlockPos },
}

/// Uses `std::sync::RwLock`: every operation is brief (no awaits while the
/// lock is held) and reads dominate.
pub struct PlayerRegistry {
    players: RwLock<HashMap<u32, PlayerInfo>>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(512);
        Self {
            players: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    pub fn register(&self, info: PlayerInfo) {
        let event = PlayerEvent::Joined {
            id: info.id,
            name: info.name.clone(),
            level: info.level.clone(),
        };
        self.players
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(info.id, info);
        let _ = self.event_tx.send(event);
    }

    /// Move a player, possibly into another level.
    pub fn update_position(&self, id: u32, level: &str, pos: BlockPos) {
        {
            let mut players = self.players.write().unwrap_or_else(|e| e.into_inner());
            let Some(info) = players.get_mut(&id) else {
                return;
            };
            if info.level != level {
                info.level = level.to_string();
            }
            info.pos = pos;
        }
        let _ = self.event_tx.send(PlayerEvent::Moved {
            id,
            level: level.to_string(),
            pos,
        });
    }

    pub fn deregister(&self, id: u32) {
        let removed = self
            .players
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        if removed.is_some() {
            let _ = self.event_tx.send(PlayerEvent::Left { id });
        }
    }

    /// Players currently in `level`, as the physics sees them.
    pub fn occupants(&self, level: &str) -> Vec<Occupant> {
        let players = self.players.read().unwrap_or_else(|e| e.into_inner());
        let mut occupants: Vec<Occupant> = players
            .values()
            .filter(|p| p.level == level)
            .map(|p| Occupant { id: p.id, pos: p.pos })
            .collect();
        // HashMap order is arbitrary; AI ties are broken by list order.
        occupants.sort_by_key(|o| o.id);
        occupants
    }

    pub fn snapshot(&self) -> Vec<PlayerInfo> {
        self.players
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
