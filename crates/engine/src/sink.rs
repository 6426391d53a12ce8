//! Outbound interfaces: where committed block changes go.
//!
//! The engine never talks to sessions or storage directly. Every committed
//! mutation is pushed into a [`BlockSender`] (network delivery) and, when
//! configured, a [`ChangeHistory`] (per-block change records). Both are
//! buffered; nothing on the tick path blocks on I/O.

use crate::world::block::BlockId;
use indexmap::IndexMap;
use thiserror::Error;

/// Buffered sink for `(index, new block)` pairs.
pub trait BlockSender: Send {
    fn send(&mut self, index: u32, block: BlockId);

    /// Deliver everything buffered so far. Returns how many pairs went out.
    fn flush(&mut self) -> usize;

    /// Pairs waiting for the next flush.
    fn pending(&self) -> usize;
}

/// Coalescing sender: repeated writes to one index inside a flush window
/// collapse into the last value, keeping the position of the first write.
pub struct BufferedSender<F>
where
    F: FnMut(Vec<(u32, BlockId)>) + Send,
{
    buffer: IndexMap<u32, BlockId>,
    target: F,
}

impl<F> BufferedSender<F>
where
    F: FnMut(Vec<(u32, BlockId)>) + Send,
{
    pub fn new(target: F) -> Self {
        Self {
            buffer: IndexMap::new(),
            target,
        }
    }
}

impl<F> BlockSender for BufferedSender<F>
where
    F: FnMut(Vec<(u32, BlockId)>) + Send,
{
    fn send(&mut self, index: u32, block: BlockId) {
        self.buffer.insert(index, block);
    }

    fn flush(&mut self) -> usize {
        if self.buffer.is_empty() {
            return 0;
        }
        let batch: Vec<(u32, BlockId)> = self.buffer.drain(..).collect();
        let n = batch.len();
        (self.target)(batch);
        n
    }

    fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Discards everything (headless levels, benchmarks).
#[derive(Debug, Default)]
pub struct NullSender;

impl BlockSender for NullSender {
    fn send(&mut self, _index: u32, _block: BlockId) {}

    fn flush(&mut self) -> usize {
        0
    }

    fn pending(&self) -> usize {
        0
    }
}

// ── Change history ───────────────────────────────────────────────────────

/// Record flag: the change was produced by physics rather than a requester.
pub const RECORD_PHYSICS: u8 = 1 << 0;
/// Record flag: the change was substituted by a placement hook.
pub const RECORD_SUBSTITUTED: u8 = 1 << 1;

/// One historical block change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    pub index: u32,
    pub old: BlockId,
    pub new: BlockId,
    /// Numeric requester identity (player id; 0 for commands and physics).
    pub requester: u32,
    /// Seconds since the unix epoch.
    pub timestamp: u64,
    pub flags: u8,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history sink is closed")]
    Closed,
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only change log.
pub trait ChangeHistory: Send {
    fn append(&mut self, record: ChangeRecord) -> Result<(), HistoryError>;

    fn flush(&mut self) -> Result<(), HistoryError>;
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    pub records: Vec<ChangeRecord>,
}

impl ChangeHistory for MemoryHistory {
    fn append(&mut self, record: ChangeRecord) -> Result<(), HistoryError> {
        self.records.push(record);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), HistoryError> {
        Ok(())
    }
}
