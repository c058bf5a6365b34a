//! Application data attached to a resource under a GUID.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use hashbrown::HashMap;
use tracing::trace;

use super::ResourceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Guid(pub u128);

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{{{:08x}-{:04x}-{:04x}-{:04x}-{:012x}}}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PrivateDataFlags: u32 {
        /// The entry holds a shared reference to an object rather than bytes.
        const IUNKNOWN = 1 << 0;
    }
}

#[derive(Clone)]
pub enum PrivateData {
    Blob(Vec<u8>),
    Object(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for PrivateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob(bytes) => f.debug_tuple("Blob").field(&bytes.len()).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl PrivateData {
    fn flags(&self) -> PrivateDataFlags {
        match self {
            Self::Blob(_) => PrivateDataFlags::empty(),
            Self::Object(_) => PrivateDataFlags::IUNKNOWN,
        }
    }
}

#[derive(Debug)]
struct PrivateEntry {
    data: PrivateData,
    flags: PrivateDataFlags,
}

#[derive(Debug, Default)]
pub struct PrivateDataStore {
    entries: HashMap<Guid, PrivateEntry>,
}

impl PrivateDataStore {
    /// Replaces any entry stored under `guid`, releasing the old one first.
    ///
    /// `IUNKNOWN` in `flags` is ignored; it is derived from the payload.
    pub fn set(&mut self, guid: Guid, data: PrivateData, flags: PrivateDataFlags) {
        if let Some(old) = self.entries.remove(&guid) {
            trace!(%guid, old = ?old.data, "releasing replaced private data");
            drop(old);
        }
        let flags = (flags - PrivateDataFlags::IUNKNOWN) | data.flags();
        self.entries.insert(guid, PrivateEntry { data, flags });
    }

    /// Copies a blob entry into `out`.
    ///
    /// `size` carries the capacity the caller offers and is updated to the stored length. With
    /// no buffer, or one that is too small, the call fails with [`ResourceError::MoreData`]
    /// and leaves the entry untouched.
    pub fn get(&self, guid: Guid, out: Option<&mut [u8]>, size: &mut usize) -> Result<(), ResourceError> {
        let entry = self.entries.get(&guid).ok_or(ResourceError::NotFound(guid))?;
        let PrivateData::Blob(bytes) = &entry.data else {
            return Err(ResourceError::NotABlob(guid));
        };

        let required = bytes.len();
        let out = match out {
            Some(out) if *size >= required => out,
            _ => {
                *size = required;
                return Err(ResourceError::MoreData { required });
            }
        };
        if out.len() < required {
            return Err(ResourceError::InvalidSize);
        }

        out[..required].copy_from_slice(bytes);
        *size = required;
        Ok(())
    }

    pub fn object(&self, guid: Guid) -> Result<Arc<dyn Any + Send + Sync>, ResourceError> {
        let entry = self.entries.get(&guid).ok_or(ResourceError::NotFound(guid))?;
        match &entry.data {
            PrivateData::Object(object) => Ok(Arc::clone(object)),
            PrivateData::Blob(_) => Err(ResourceError::NotAnObject(guid)),
        }
    }

    pub fn flags(&self, guid: Guid) -> Option<PrivateDataFlags> {
        self.entries.get(&guid).map(|e| e.flags)
    }

    pub fn free(&mut self, guid: Guid) -> Result<(), ResourceError> {
        self.entries
            .remove(&guid)
            .map(drop)
            .ok_or(ResourceError::NotFound(guid))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
