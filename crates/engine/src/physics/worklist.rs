use super::data::PhysData;
use crate::world::block::BlockId;
use bitvec::vec::BitVec;

/// What to do when a schedule request would exceed the worklist capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityPolicy {
    /// Refuse the new entry, count it, and warn once per pass.
    #[default]
    RejectNewest,
    /// Never refuse; the capacity is only a preallocation hint.
    Grow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleResult {
    Added,
    /// The index already has an entry; nothing changed.
    AlreadyScheduled,
    /// Capacity reached under `CapacityPolicy::RejectNewest`.
    Rejected,
}

/// Whether an entry survives the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryState {
    #[default]
    Keep,
    Remove,
}

/// One scheduled physics evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysInfo {
    pub index: u32,
    /// Block at `index` when the entry was scheduled (refreshed every pass).
    pub block: BlockId,
    pub data: PhysData,
    pub state: EntryState,
}

impl PhysInfo {
    pub const fn new(index: u32, block: BlockId, data: PhysData) -> Self {
        Self {
            index,
            block,
            data,
            state: EntryState::Keep,
        }
    }

    /// Drop this entry at the end of the current pass.
    pub fn remove(&mut self) {
        self.state = EntryState::Remove;
    }

    pub fn is_removed(&self) -> bool {
        self.state == EntryState::Remove
    }
}

/// The slice of the worklist a pass is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassWindow {
    /// Entries `[0, processed)` are evaluated this pass.
    pub processed: usize,
    /// Worklist length when the pass started. Entries in
    /// `[processed, snapshot)` are deferred; entries past `snapshot` were
    /// appended during the pass.
    pub snapshot: usize,
}

/// Ordered, deduplicated collection of indices awaiting evaluation.
///
/// Drained in two phases: `begin_pass` fixes the window, the caller reads and
/// writes entries by position inside it, `end_pass` compacts once. Nothing is
/// swapped around while a pass is in progress, so the window stays valid even
/// if entries are appended meanwhile.
///
/// An index scheduled while its own entry is being removed by the running
/// pass is dropped together with it; callers that reschedule from inside a
/// pass should defer the request until after `end_pass`.
pub struct PhysicsWorklist {
    entries: Vec<PhysInfo>,
    /// One bit per grid cell: does `entries` hold this index?
    members: BitVec,
    capacity: usize,
    policy: CapacityPolicy,
    rejected_total: u64,
    rejected_unreported: u64,
}

impl PhysicsWorklist {
    pub fn new(volume: usize, capacity: usize, policy: CapacityPolicy) -> Self {
        let members = BitVec::repeat(false, volume);
        Self {
            entries: Vec::with_capacity(capacity.min(4096)),
            members,
            capacity,
            policy,
            rejected_total: 0,
            rejected_unreported: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn set_capacity(&mut self, capacity: usize, policy: CapacityPolicy) {
        self.capacity = capacity;
        self.policy = policy;
    }

    /// Total schedule requests refused since creation.
    pub fn rejected_total(&self) -> u64 {
        self.rejected_total
    }

    #[inline]
    pub fn is_scheduled(&self, index: u32) -> bool {
        self.members.get(index as usize).is_some_and(|b| *b)
    }

    pub fn get(&self, pos: usize) -> Option<&PhysInfo> {
        self.entries.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhysInfo> {
        self.entries.iter()
    }

    /// Append an entry for `index` unless one exists already.
    pub fn schedule(&mut self, index: u32, block: BlockId, data: PhysData) -> ScheduleResult {
        if index as usize >= self.members.len() {
            return ScheduleResult::Rejected;
        }
        if self.is_scheduled(index) {
            return ScheduleResult::AlreadyScheduled;
        }
        if self.policy == CapacityPolicy::RejectNewest && self.entries.len() >= self.capacity {
            if self.rejected_unreported == 0 {
                tracing::warn!(
                    "Physics worklist full ({} entries): rejecting new entries",
                    self.capacity
                );
            }
            self.rejected_total += 1;
            self.rejected_unreported += 1;
            return ScheduleResult::Rejected;
        }
        self.members.set(index as usize, true);
        self.entries.push(PhysInfo::new(index, block, data));
        ScheduleResult::Added
    }

    /// Like `schedule`, but an existing entry gets `data` (and `block`)
    /// replaced. Linear in the worklist length when the entry exists.
    pub fn schedule_override(&mut self, index: u32, block: BlockId, data: PhysData) -> ScheduleResult {
        match self.schedule(index, block, data) {
            ScheduleResult::AlreadyScheduled => {
                if let Some(entry) = self.entries.iter_mut().find(|e| e.index == index) {
                    entry.block = block;
                    entry.data = data;
                    entry.state = EntryState::Keep;
                }
                ScheduleResult::AlreadyScheduled
            }
            other => other,
        }
    }

    /// O(1) removal by list position: swap with the last entry and truncate.
    /// Only valid between passes.
    pub fn swap_remove(&mut self, pos: usize) -> Option<PhysInfo> {
        if pos >= self.entries.len() {
            return None;
        }
        let removed = self.entries.swap_remove(pos);
        self.members.set(removed.index as usize, false);
        Some(removed)
    }

    /// Drop every entry (level unload, physics reset).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.members.fill(false);
    }

    // ── Two-phase draining ──────────────────────────────────────────────

    /// Fix the window for a pass: at most `max` entries from the front.
    pub fn begin_pass(&self, max: usize) -> PassWindow {
        let snapshot = self.entries.len();
        PassWindow {
            processed: snapshot.min(max),
            snapshot,
        }
    }

    /// Copy of the entry at list position `pos`.
    #[inline]
    pub fn entry(&self, pos: usize) -> PhysInfo {
        self.entries[pos]
    }

    /// Write back an entry read with `entry`.
    #[inline]
    pub fn store(&mut self, pos: usize, info: PhysInfo) {
        self.entries[pos] = info;
    }

    /// Compact after a pass. Resulting order: deferred entries first, then
    /// surviving processed entries, then entries appended during the pass.
    /// Returns how many entries were removed.
    pub fn end_pass(&mut self, window: PassWindow) -> usize {
        let PassWindow { processed, snapshot } = window;
        let mut next = Vec::with_capacity(self.entries.len());
        next.extend_from_slice(&self.entries[processed..snapshot]);

        let mut removed = 0;
        for entry in &self.entries[..processed] {
            if entry.is_removed() {
                self.members.set(entry.index as usize, false);
                removed += 1;
            } else {
                next.push(*entry);
            }
        }
        next.extend_from_slice(&self.entries[snapshot..]);
        self.entries = next;

        if self.rejected_unreported > 0 {
            tracing::warn!(
                "Physics worklist rejected {} entries (capacity {}, {} total)",
                self.rejected_unreported,
                self.capacity,
                self.rejected_total
            );
            self.rejected_unreported = 0;
        }
        removed
    }
}
