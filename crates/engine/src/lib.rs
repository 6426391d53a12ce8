//! Game-agnostic voxel substrate.
//!
//! - [`world`]: the flat block grid and its coordinate mapping.
//! - [`physics`]: the per-level worklist of pending physics evaluations.
//! - [`sink`]: outbound block-delta and change-history interfaces.

pub mod physics;
pub mod sink;
pub mod world;
