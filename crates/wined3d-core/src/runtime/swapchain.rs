use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::backend::{DrawBuffer, WindowHandle};
use super::{Device, DeviceError};
use crate::context::ContextId;
use crate::resources::{Format, MemoryBudget, Pool, Surface, SurfaceDesc, Usage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapChainId(pub(crate) u32);

impl SwapChainId {
    pub const IMPLICIT: Self = Self(0);
}

impl fmt::Display for SwapChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swapchain#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapChainDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub back_buffer_count: u32,
    pub window: WindowHandle,
}

#[derive(Debug)]
pub struct SwapChain {
    id: SwapChainId,
    desc: SwapChainDesc,
    front: Arc<Surface>,
    back: Vec<Arc<Surface>>,
    /// One per thread that has rendered to this swapchain.
    pub(crate) contexts: Vec<ContextId>,
}

impl SwapChain {
    pub fn id(&self) -> SwapChainId {
        self.id
    }

    pub fn desc(&self) -> &SwapChainDesc {
        &self.desc
    }

    pub fn front_buffer(&self) -> &Arc<Surface> {
        &self.front
    }

    pub fn back_buffer(&self, index: usize) -> Option<&Arc<Surface>> {
        self.back.get(index)
    }

    pub fn contexts(&self) -> &[ContextId] {
        &self.contexts
    }

    /// Which buffer of this swapchain `surface` is, compared by identity.
    pub fn draw_buffer_for(&self, surface: &Arc<Surface>) -> Option<DrawBuffer> {
        if Arc::ptr_eq(&self.front, surface) {
            Some(DrawBuffer::Front)
        } else if self.back.iter().any(|b| Arc::ptr_eq(b, surface)) {
            Some(DrawBuffer::Back)
        } else {
            None
        }
    }
}

impl Device {
    /// Creates a swapchain and the context the calling thread renders to it with.
    pub fn create_swap_chain(&mut self, desc: SwapChainDesc) -> Result<SwapChainId, DeviceError> {
        let id = SwapChainId(self.next_swap_chain_id);
        let surface_desc = SurfaceDesc {
            width: desc.width,
            height: desc.height,
            format: desc.format,
        };
        let new_buffer = |budget: &Arc<MemoryBudget>| {
            Surface::new(surface_desc, Pool::Default, Usage::RENDER_TARGET, Some(id), budget)
                .map(Arc::new)
        };
        let front = new_buffer(&self.budget)?;
        let back = (0..desc.back_buffer_count.max(1))
            .map(|_| new_buffer(&self.budget))
            .collect::<Result<Vec<_>, _>>()?;

        self.swap_chains.insert(
            id,
            SwapChain {
                id,
                desc,
                front,
                back,
                contexts: Vec::new(),
            },
        );
        self.next_swap_chain_id += 1;

        let thread = std::thread::current().id();
        if let Err(err) = self.swap_chain_context_for_thread(id, thread) {
            self.swap_chains.remove(&id);
            return Err(err);
        }
        debug!(swap_chain = %id, width = desc.width, height = desc.height, "created swapchain");
        Ok(id)
    }

    /// Destroys the swapchain and every context rendering to it.
    pub fn destroy_swap_chain(&mut self, id: SwapChainId) -> Result<(), DeviceError> {
        if id == SwapChainId::IMPLICIT {
            return Err(DeviceError::ImplicitSwapChain);
        }
        let swap_chain = self
            .swap_chains
            .remove(&id)
            .ok_or(DeviceError::UnknownSwapChain(id))?;
        for context in swap_chain.contexts {
            self.destroy_context(context);
        }
        if self
            .last_target
            .as_ref()
            .is_some_and(|t| t.swap_chain() == Some(id))
        {
            self.last_target = None;
            self.last_thread = None;
        }
        debug!(swap_chain = %id, "destroyed swapchain");
        Ok(())
    }

    pub fn swap_chain(&self, id: SwapChainId) -> Result<&SwapChain, DeviceError> {
        self.swap_chains
            .get(&id)
            .ok_or(DeviceError::UnknownSwapChain(id))
    }

    /// Presents the swapchain's back buffer from the calling thread's context.
    pub fn present(&mut self, id: SwapChainId) -> Result<(), DeviceError> {
        let back = self
            .swap_chain(id)?
            .back_buffer(0)
            .cloned()
            .ok_or(DeviceError::UnknownSwapChain(id))?;
        let context = self.activate(Some(&back), crate::context::ContextUsage::ResourceLoad)?;
        let native = self.context(context)?.native();
        self.backend
            .swap_buffers(native)
            .map_err(|source| DeviceError::Present { swap_chain: id, source })
    }
}
