use std::sync::Arc;

use tracing::debug;

use super::{Format, MemoryBudget, Pool, Resource, ResourceError, ResourceKind, Usage};
use crate::runtime::swapchain::SwapChainId;
use crate::runtime::{Device, DeviceError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
}

/// A 2D image that can be rendered to.
///
/// Surfaces owned by a swapchain render onscreen; every other surface is an offscreen target.
#[derive(Debug)]
pub struct Surface {
    resource: Resource,
    desc: SurfaceDesc,
    swap_chain: Option<SwapChainId>,
}

impl Surface {
    pub(crate) fn new(
        desc: SurfaceDesc,
        pool: Pool,
        usage: Usage,
        swap_chain: Option<SwapChainId>,
        budget: &Arc<MemoryBudget>,
    ) -> Result<Self, ResourceError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(ResourceError::InvalidSize);
        }
        let size = desc.format.surface_size(desc.width, desc.height);
        let resource = Resource::new(ResourceKind::Surface, pool, usage, size, budget)?;
        Ok(Self {
            resource,
            desc,
            swap_chain,
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn desc(&self) -> &SurfaceDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn format(&self) -> Format {
        self.desc.format
    }

    /// The swapchain this surface is a front or back buffer of.
    pub fn swap_chain(&self) -> Option<SwapChainId> {
        self.swap_chain
    }

    pub fn is_offscreen(&self) -> bool {
        self.swap_chain.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    /// 0 requests the full mip chain.
    pub levels: u32,
    pub format: Format,
}

#[derive(Debug)]
pub struct Texture {
    resource: Resource,
    desc: TextureDesc,
}

impl Texture {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn levels(&self) -> u32 {
        self.desc.levels
    }
}

fn full_mip_chain(width: u32, height: u32) -> u32 {
    32 - width.max(height).leading_zeros()
}

fn mip_chain_size(desc: &TextureDesc) -> u64 {
    (0..desc.levels)
        .map(|level| {
            let w = (desc.width >> level).max(1);
            let h = (desc.height >> level).max(1);
            desc.format.surface_size(w, h)
        })
        .sum()
}

impl Device {
    pub fn create_render_target(&mut self, desc: SurfaceDesc) -> Result<Arc<Surface>, DeviceError> {
        let surface = Surface::new(desc, Pool::Default, Usage::RENDER_TARGET, None, &self.budget)?;
        debug!(
            resource = %surface.resource().id(),
            width = desc.width,
            height = desc.height,
            format = %desc.format,
            "created render target"
        );
        Ok(Arc::new(surface))
    }

    pub fn create_offscreen_plain_surface(
        &mut self,
        desc: SurfaceDesc,
        pool: Pool,
    ) -> Result<Arc<Surface>, DeviceError> {
        let surface = Surface::new(desc, pool, Usage::empty(), None, &self.budget)?;
        Ok(Arc::new(surface))
    }

    pub fn create_texture(
        &mut self,
        desc: TextureDesc,
        usage: Usage,
        pool: Pool,
    ) -> Result<Arc<Texture>, DeviceError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(ResourceError::InvalidSize.into());
        }
        let max_levels = full_mip_chain(desc.width, desc.height);
        let mut desc = desc;
        desc.levels = match desc.levels {
            0 => max_levels,
            n => n.min(max_levels),
        };

        let resource = Resource::new(
            ResourceKind::Texture,
            pool,
            usage,
            mip_chain_size(&desc),
            &self.budget,
        )?;
        debug!(
            resource = %resource.id(),
            width = desc.width,
            height = desc.height,
            levels = desc.levels,
            ?pool,
            "created texture"
        );
        Ok(Arc::new(Texture { resource, desc }))
    }
}
