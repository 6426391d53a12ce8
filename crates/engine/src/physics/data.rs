//! Per-entry payload carried by every worklist entry.
//!
//! Eight raw bytes, read through named views. Each handler family owns the
//! meaning of the views it uses; nothing in here encodes "remove me" (that is
//! `EntryState`).

/// Timed-block argument bits stored in the `flags` view.
pub const EXTRA_WAIT: u8 = 1 << 0;
pub const EXTRA_REVERT: u8 = 1 << 1;
pub const EXTRA_DISSIPATE: u8 = 1 << 2;
pub const EXTRA_DROP: u8 = 1 << 3;
pub const EXTRA_EXPLODE: u8 = 1 << 4;
/// The entry was armed by something other than a plain placement
/// (an igniting fire, a chained explosion).
pub const EXTRA_ARMED: u8 = 1 << 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PhysData([u8; 8]);

impl PhysData {
    pub const EMPTY: PhysData = PhysData([0; 8]);

    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 8] {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 8]
    }

    // ── byte 0: generic tick counter ────────────────────────────────────

    pub const fn counter(&self) -> u8 {
        self.0[0]
    }

    pub fn set_counter(&mut self, value: u8) {
        self.0[0] = value;
    }

    /// Increments the counter (saturating) and returns the new value.
    pub fn bump(&mut self) -> u8 {
        self.0[0] = self.0[0].saturating_add(1);
        self.0[0]
    }

    // ── bytes 1..3: wait / remaining steps──────────────────────────────────

    pub const fn wait(&self) -> u16 {
        u16::from_le_bytes([self.0[1], self.0[2]])
    }

    pub fn set_wait(&mut self, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.0[1] = lo;
        self.0[2] = hi;
    }

    // ── byte 3: direction (index into the fan-out order) ────────────────

    pub const fn direction(&self) -> u8 {
        self.0[3]
    }

    pub fn set_direction(&mut self, value: u8) {
        self.0[3] = value;
    }

    // ── bytes 4..6: block tag (revert target, liquid tag) ───────────────

    pub const fn block(&self) -> u16 {
        u16::from_le_bytes([self.0[4], self.0[5]])
    }

    pub fn set_block(&mut self, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.0[4] = lo;
        self.0[5] = hi;
    }

    // ── byte 6: flags, byte 7: param ────────────────────────────────────

    pub const fn flags(&self) -> u8 {
        self.0[6]
    }

    pub const fn has_flag(&self, flag: u8) -> bool {
        self.0[6] & flag != 0
    }

    pub fn set_flag(&mut self, flag: u8) {
        self.0[6] |= flag;
    }

    pub fn clear_flag(&mut self, flag: u8) {
        self.0[6] &= !flag;
    }

    pub const fn param(&self) -> u8 {
        self.0[7]
    }

    pub fn set_param(&mut self, value: u8) {
        self.0[7] = value;
    }

    // ── builders ────────────────────────────────────────────────────────

    pub fn with_counter(mut self, value: u8) -> Self {
        self.set_counter(value);
        self
    }

    pub fn with_wait(mut self, value: u16) -> Self {
        self.set_wait(value);
        self
    }

    pub fn with_direction(mut self, value: u8) -> Self {
        self.set_direction(value);
        self
    }

    pub fn with_block(mut self, value: u16) -> Self {
        self.set_block(value);
        self
    }

    pub fn with_flag(mut self, flag: u8) -> Self {
        self.set_flag(flag);
        self
    }

    pub fn with_param(mut self, value: u8) -> Self {
        self.set_param(value);
        self
    }

    /// Timed-block args: any of the `EXTRA_*` action bits set.
    pub const fn has_timed_args(&self) -> bool {
        self.0[6] & (EXTRA_WAIT | EXTRA_REVERT | EXTRA_DISSIPATE | EXTRA_DROP | EXTRA_EXPLODE) != 0
    }
}
