use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bitflags::bitflags;

use super::budget::{MemoryBudget, Reservation};
use super::private_data::{Guid, PrivateData, PrivateDataFlags, PrivateDataStore};
use super::ResourceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Surface,
    Texture,
    VertexBuffer,
    IndexBuffer,
}

/// Where a resource lives (`D3DPOOL`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Video memory; counted against the device memory budget.
    #[default]
    Default,
    Managed,
    SystemMem,
    Scratch,
}

bitflags! {
    /// `D3DUSAGE_*` bits.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct Usage: u32 {
        const RENDER_TARGET = 0x0000_0001;
        const DEPTH_STENCIL = 0x0000_0002;
        const WRITE_ONLY = 0x0000_0008;
        const SOFTWARE_PROCESSING = 0x0000_0010;
        const DONOTCLIP = 0x0000_0020;
        const POINTS = 0x0000_0040;
        const RTPATCHES = 0x0000_0080;
        const NPATCHES = 0x0000_0100;
        const DYNAMIC = 0x0000_0200;
        const AUTOGENMIPMAP = 0x0000_0400;
    }
}

/// State shared by every surface, texture and buffer.
///
/// Resources are handed out as `Arc`s; the last handle to drop returns the resource's
/// video-memory reservation and releases its private data.
pub struct Resource {
    id: ResourceId,
    kind: ResourceKind,
    pool: Pool,
    usage: Usage,
    size: u64,
    priority: AtomicU32,
    private_data: Mutex<PrivateDataStore>,
    _reservation: Option<Reservation>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("pool", &self.pool)
            .field("usage", &self.usage)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Resource {
    pub(crate) fn new(
        kind: ResourceKind,
        pool: Pool,
        usage: Usage,
        size: u64,
        budget: &Arc<MemoryBudget>,
    ) -> Result<Self, ResourceError> {
        let reservation = match pool {
            Pool::Default => Some(budget.try_reserve(size)?),
            Pool::Managed | Pool::SystemMem | Pool::Scratch => None,
        };
        Ok(Self {
            id: ResourceId::next(),
            kind,
            pool,
            usage,
            size,
            priority: AtomicU32::new(0),
            private_data: Mutex::new(PrivateDataStore::default()),
            _reservation: reservation,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn pool(&self) -> Pool {
        self.pool
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the previous priority.
    pub fn set_priority(&self, priority: u32) -> u32 {
        self.priority.swap(priority, Ordering::Relaxed)
    }

    pub fn priority(&self) -> u32 {
        self.priority.load(Ordering::Relaxed)
    }

    fn store(&self) -> MutexGuard<'_, PrivateDataStore> {
        self.private_data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_private_data(&self, guid: Guid, data: PrivateData, flags: PrivateDataFlags) {
        self.store().set(guid, data, flags);
    }

    pub fn get_private_data(
        &self,
        guid: Guid,
        out: Option<&mut [u8]>,
        size: &mut usize,
    ) -> Result<(), ResourceError> {
        self.store().get(guid, out, size)
    }

    pub fn private_object(&self, guid: Guid) -> Result<Arc<dyn Any + Send + Sync>, ResourceError> {
        self.store().object(guid)
    }

    pub fn private_data_flags(&self, guid: Guid) -> Option<PrivateDataFlags> {
        self.store().flags(guid)
    }

    pub fn free_private_data(&self, guid: Guid) -> Result<(), ResourceError> {
        self.store().free(guid)
    }
}
