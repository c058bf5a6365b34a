use std::sync::Arc;

use tracing::debug;

use super::{Pool, Resource, ResourceError, ResourceKind, Usage};
use crate::runtime::{Device, DeviceError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub fn size(self) -> u32 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

#[derive(Debug)]
pub struct Buffer {
    resource: Resource,
    len: u32,
    index_format: Option<IndexFormat>,
}

impl Buffer {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `None` for vertex buffers.
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_format
    }
}

impl Device {
    pub fn create_vertex_buffer(
        &mut self,
        len: u32,
        usage: Usage,
        pool: Pool,
    ) -> Result<Arc<Buffer>, DeviceError> {
        self.create_buffer(ResourceKind::VertexBuffer, len, usage, pool, None)
    }

    pub fn create_index_buffer(
        &mut self,
        len: u32,
        usage: Usage,
        pool: Pool,
        format: IndexFormat,
    ) -> Result<Arc<Buffer>, DeviceError> {
        self.create_buffer(ResourceKind::IndexBuffer, len, usage, pool, Some(format))
    }

    fn create_buffer(
        &mut self,
        kind: ResourceKind,
        len: u32,
        usage: Usage,
        pool: Pool,
        index_format: Option<IndexFormat>,
    ) -> Result<Arc<Buffer>, DeviceError> {
        if len == 0 {
            return Err(ResourceError::InvalidSize.into());
        }
        let resource = Resource::new(kind, pool, usage, u64::from(len), &self.budget)?;
        debug!(resource = %resource.id(), ?kind, len, ?pool, "created buffer");
        Ok(Arc::new(Buffer {
            resource,
            len,
            index_format,
        }))
    }
}
