//! Block physics and world simulation server.
//!
//! - [`block`]: block types, their properties and the dispatch tables.
//! - [`level`]: a loaded level and everything its physics shares.
//! - [`change`]: the single mutation path (`request_change`, update queue).
//! - [`hooks`]: placement and removal hooks.
//! - [`physics`]: the tick, the handler table and every behaviour handler.
//! - [`simulation`]: level set, locking and tick drivers.
//! - [`persistence`], [`config`], [`metrics`], [`event_bus`],
//!   [`player_registry`]: the server around it.

pub mod block;
pub mod change;
pub mod config;
pub mod event_bus;
pub mod hooks;
pub mod level;
pub mod metrics;
pub mod persistence;
pub mod physics;
pub mod player_registry;
pub mod simulation;
