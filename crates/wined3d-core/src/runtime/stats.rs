use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of [`DeviceStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceStatsSnapshot {
    pub contexts_created: u64,
    pub contexts_destroyed: u64,
    pub context_switches: u64,
    pub skipped_switches: u64,
    pub states_applied: u64,
    pub draws: u64,
    pub pbuffer_contentions: u64,
    pub offscreen_readbacks: u64,
}

/// Counters for context and state traffic, cheap enough to bump on every draw.
#[derive(Debug, Default)]
pub struct DeviceStats {
    contexts_created: AtomicU64,
    contexts_destroyed: AtomicU64,
    context_switches: AtomicU64,
    /// Logical switches where the native context was already current.
    skipped_switches: AtomicU64,
    states_applied: AtomicU64,
    draws: AtomicU64,
    pbuffer_contentions: AtomicU64,
    offscreen_readbacks: AtomicU64,
}

impl DeviceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_contexts_created(&self) {
        self.contexts_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_contexts_destroyed(&self) {
        self.contexts_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_context_switches(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped_switches(&self) {
        self.skipped_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_states_applied(&self, count: u64) {
        self.states_applied.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_draws(&self) {
        self.draws.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_pbuffer_contentions(&self) {
        self.pbuffer_contentions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_offscreen_readbacks(&self) {
        self.offscreen_readbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeviceStatsSnapshot {
        DeviceStatsSnapshot {
            contexts_created: self.contexts_created.load(Ordering::Relaxed),
            contexts_destroyed: self.contexts_destroyed.load(Ordering::Relaxed),
            context_switches: self.context_switches.load(Ordering::Relaxed),
            skipped_switches: self.skipped_switches.load(Ordering::Relaxed),
            states_applied: self.states_applied.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
            pbuffer_contentions: self.pbuffer_contentions.load(Ordering::Relaxed),
            offscreen_readbacks: self.offscreen_readbacks.load(Ordering::Relaxed),
        }
    }
}
