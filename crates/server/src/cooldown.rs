//! Per-player cooldown bookkeeping.
//!
//! The ledger lives in process memory only; entries are overwritten on each
//! successful use and never pruned.

use std::collections::HashMap;

use stuck_core::PlayerId;

/// Last successful use per player, in epoch milliseconds.
#[derive(Debug, Default, Clone)]
pub struct CooldownLedger {
    last_use: HashMap<PlayerId, i64>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole seconds the player still has to wait, if any.
    ///
    /// The remainder is truncated, so the final partial second of a window
    /// already counts as elapsed.
    pub fn remaining_secs(&self, player: PlayerId, now_ms: i64, cooldown_secs: u32) -> Option<i64> {
        let last = *self.last_use.get(&player)?;
        let elapsed = now_ms - last;
        let remaining = (i64::from(cooldown_secs) * 1000 - elapsed) / 1000;
        (remaining > 0).then_some(remaining)
    }

    /// Start a new window for `player` at `now_ms`.
    pub fn commit(&mut self, player: PlayerId, now_ms: i64) {
        self.last_use.insert(player, now_ms);
    }

    pub fn last_use(&self, player: PlayerId) -> Option<i64> {
        self.last_use.get(&player).copied()
    }

    /// Number of players with an entry.
    pub fn len(&self) -> usize {
        self.last_use.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_use.is_empty()
    }
}
