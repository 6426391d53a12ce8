//! The spatial substrate: a fixed 3D lattice of block ids.
//!
//! Time and scheduling live in `physics::worklist`, not here.

pub mod block;
pub mod chunk;
pub mod grid;
pub mod position;

pub use block::BlockId;
pub use grid::{GridError, VoxelGrid};
pub use position::BlockPos;
