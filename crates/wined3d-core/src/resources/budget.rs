//! Accounting for default-pool (video memory) resources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

use super::ResourceError;

#[derive(Debug)]
pub struct MemoryBudget {
    total: u64,
    used: AtomicU64,
}

impl MemoryBudget {
    pub fn new(total: u64) -> Arc<Self> {
        Arc::new(Self {
            total,
            used: AtomicU64::new(0),
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    pub fn available(&self) -> u64 {
        self.total.saturating_sub(self.used())
    }

    /// Reserves `bytes`, failing without side effects if they do not fit.
    pub fn try_reserve(self: &Arc<Self>, bytes: u64) -> Result<Reservation, ResourceError> {
        let mut used = self.used.load(Ordering::Acquire);
        loop {
            let available = self.total.saturating_sub(used);
            if bytes > available {
                return Err(ResourceError::OutOfVideoMemory {
                    requested: bytes,
                    available,
                });
            }
            match self.used.compare_exchange_weak(
                used,
                used + bytes,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => used = actual,
            }
        }
        trace!(bytes, used = used + bytes, total = self.total, "reserved video memory");
        Ok(Reservation {
            budget: Arc::clone(self),
            bytes,
        })
    }
}

/// Bytes held against a [`MemoryBudget`], returned on drop.
#[derive(Debug)]
pub struct Reservation {
    budget: Arc<MemoryBudget>,
    bytes: u64,
}

impl Reservation {
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.budget.used.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}
