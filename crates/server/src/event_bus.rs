//! World-change event bus.
//!
//! Every level's flushed block deltas are published as a [`BlockChangeBatch`]
//! on a shared `tokio::sync::broadcast` channel. Sessions subscribe and
//! forward the batches for the level their player is in.

use std::sync::Arc;

use tokio::sync::broadcast;
use voxtick_engine::sink::{BlockSender, BufferedSender};
use voxtick_engine::world::BlockId;

/// 256 batches in flight covers a burst of ticks across many levels.
pub const BUS_CAPACITY: usize = 256;

/// One level's block deltas from one flush.
///
/// `Arc<[...]>` so cloning per subscriber is a refcount bump.
#[derive(Clone, Debug)]
pub struct BlockChangeBatch {
    pub level: Arc<str>,
    pub changes: Arc<[(u32, BlockId)]>,
}

/// Create the bus. Receivers are made with `Sender::subscribe`.
pub fn channel() -> broadcast::Sender<BlockChangeBatch> {
    broadcast::channel(BUS_CAPACITY).0
}

/// A level's block sender that publishes every flush onto the bus.
pub struct BusSender {
    inner: BufferedSender<Box<dyn FnMut(Vec<(u32, BlockId)>) + Send>>,
}

impl BusSender {
    pub fn new(level: &str, bus: broadcast::Sender<BlockChangeBatch>) -> Self {
        let level: Arc<str> = Arc::from(level);
        let publish = move |changes: Vec<(u32, BlockId)>| {
            let batch = BlockChangeBatch {
                level: Arc::clone(&level),
                changes: changes.into(),
            };
            // No subscribers is fine.
            let _ = bus.send(batch);
        };
        Self {
            inner: BufferedSender::new(Box::new(publish)),
        }
    }
}

impl BlockSender for BusSender {
    fn send(&mut self, index: u32, block: BlockId) {
        self.inner.send(index, block);
    }

    fn flush(&mut self) -> usize {
        self.inner.flush()
    }

    fn pending(&self) -> usize {
        self.inner.pending()
    }
}
