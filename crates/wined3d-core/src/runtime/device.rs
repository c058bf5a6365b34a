use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;

use hashbrown::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use super::backend::{ClearParams, DrawBuffer, GraphicsBackend, StateApplier};
use super::config::{DeviceCaps, DeviceConfig, OffscreenRenderingMode};
use super::stats::{DeviceStats, DeviceStatsSnapshot};
use super::swapchain::{SwapChain, SwapChainDesc, SwapChainId};
use super::topology::PrimitiveType;
use crate::context::{Context, ContextId, ContextUsage, PbufferContext};
use crate::resources::{MemoryBudget, ResourceError, Surface, Usage};
use crate::state::{State, StateBlock, SyntheticState, Viewport};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("invalid render state {0}")]
    InvalidRenderState(u32),

    #[error("texture stage {stage} out of range (device has {max})")]
    InvalidTextureStage { stage: u32, max: usize },

    #[error("invalid texture stage state {0}")]
    InvalidTextureStageState(u32),

    #[error("invalid sampler {0}")]
    InvalidSampler(u32),

    #[error("invalid sampler state {0}")]
    InvalidSamplerState(u32),

    #[error("invalid transform state {0}")]
    InvalidTransform(u32),

    #[error("stream {0} out of range")]
    InvalidStream(u32),

    #[error("clip plane {0} out of range")]
    InvalidClipPlane(u32),

    #[error("shader constants {start}..{end} exceed the {max} available registers")]
    InvalidConstantRange { start: u32, end: u64, max: usize },

    #[error("light {0} was never set")]
    InvalidLight(u32),

    #[error("surface was not created as a render target")]
    NotARenderTarget,

    #[error("a state block is already being recorded")]
    AlreadyRecording,

    #[error("no state block is being recorded")]
    NotRecording,

    #[error("unknown swapchain {0}")]
    UnknownSwapChain(SwapChainId),

    #[error("device has no implicit swapchain")]
    NoImplicitSwapChain,

    #[error("the implicit swapchain lives as long as the device")]
    ImplicitSwapChain,

    #[error("surface is not a buffer of {0}")]
    SurfaceNotOwnedBySwapChain(SwapChainId),

    #[error("unknown context {0}")]
    UnknownContext(ContextId),

    #[error("native context creation failed")]
    ContextCreation {
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to make {context} current")]
    MakeCurrentFailed { context: ContextId },

    #[error("pbuffer context is owned by thread {owner:?}, requested from {requested:?}")]
    PbufferContention { owner: ThreadId, requested: ThreadId },

    #[error("present of {swap_chain} failed")]
    Present {
        swap_chain: SwapChainId,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthCopyState {
    #[default]
    Initial,
    /// The depth buffer must be copied into the new render target's depth before drawing.
    Copy,
    NoCopy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorTracking {
    #[default]
    Disabled,
    Tracking,
    NeedsTracking,
    NeedsDisable,
}

/// Device-wide rendering flags that apply leaves read and update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderingMode {
    /// The current target is not a swapchain buffer, so rendering is vertically flipped.
    pub render_offscreen: bool,
    pub offscreen_rendering_mode: OffscreenRenderingMode,
    pub depth_copy: DepthCopyState,
    pub color_tracking: ColorTracking,
}

/// A D3D9-style device: committed state, the contexts realising it, and its swapchains.
pub struct Device {
    pub(crate) config: DeviceConfig,
    pub(crate) backend: Box<dyn GraphicsBackend>,
    pub(crate) applier: Box<dyn StateApplier>,
    pub(crate) budget: Arc<MemoryBudget>,
    pub(crate) stats: Arc<DeviceStats>,

    pub(crate) state: StateBlock,
    pub(crate) recording: Option<StateBlock>,

    pub(crate) contexts: HashMap<ContextId, Context>,
    pub(crate) next_context_id: u32,
    pub(crate) swap_chains: HashMap<SwapChainId, SwapChain>,
    pub(crate) next_swap_chain_id: u32,
    pub(crate) pbuffer: Option<PbufferContext>,

    pub(crate) mode: RenderingMode,
    pub(crate) active: Option<ContextId>,
    /// Context each thread last activated.
    pub(crate) thread_active: HashMap<ThreadId, ContextId>,
    // Last (target, thread) pair resolved by `find_context`.
    pub(crate) last_target: Option<Arc<Surface>>,
    pub(crate) last_thread: Option<ThreadId>,
    pub(crate) last_draw_buffer: DrawBuffer,

    pub(crate) render_target: Option<Arc<Surface>>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("config", &self.config)
            .field("contexts", &self.contexts.len())
            .field("swap_chains", &self.swap_chains.len())
            .field("mode", &self.mode)
            .field("active", &self.active)
            .field("recording", &self.recording.is_some())
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Creates the device, its implicit swapchain and a context for the calling thread.
    pub fn new(
        config: DeviceConfig,
        backend: Box<dyn GraphicsBackend>,
        applier: Box<dyn StateApplier>,
        swap_chain: SwapChainDesc,
    ) -> Result<Self, DeviceError> {
        let mut config = config;
        config.caps = config.caps.clamped();

        let mut device = Self {
            config,
            backend,
            applier,
            budget: MemoryBudget::new(config.video_memory_bytes),
            stats: Arc::new(DeviceStats::new()),
            state: StateBlock::with_defaults(&config.caps),
            recording: None,
            contexts: HashMap::new(),
            next_context_id: 0,
            swap_chains: HashMap::new(),
            next_swap_chain_id: SwapChainId::IMPLICIT.0,
            pbuffer: None,
            mode: RenderingMode {
                offscreen_rendering_mode: config.offscreen_rendering_mode,
                ..RenderingMode::default()
            },
            active: None,
            thread_active: HashMap::new(),
            last_target: None,
            last_thread: None,
            last_draw_buffer: DrawBuffer::Back,
            render_target: None,
        };

        let id = device.create_swap_chain(swap_chain)?;
        let back = device
            .swap_chain(id)?
            .back_buffer(0)
            .cloned()
            .ok_or(DeviceError::NoImplicitSwapChain)?;
        device
            .state
            .set_viewport(&Viewport::covering(back.width(), back.height()));
        device.render_target = Some(back);

        debug!(
            offscreen_rendering_mode = %config.offscreen_rendering_mode,
            video_memory_bytes = config.video_memory_bytes,
            "created device"
        );
        Ok(device)
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn caps(&self) -> &DeviceCaps {
        &self.config.caps
    }

    pub fn stats(&self) -> DeviceStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn available_video_memory(&self) -> u64 {
        self.budget.available()
    }

    /// The committed state.
    pub fn state_block(&self) -> &StateBlock {
        &self.state
    }

    pub fn rendering_mode(&self) -> &RenderingMode {
        &self.mode
    }

    pub fn context(&self, id: ContextId) -> Result<&Context, DeviceError> {
        self.contexts.get(&id).ok_or(DeviceError::UnknownContext(id))
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    pub fn active_context(&self) -> Option<ContextId> {
        self.active
    }

    pub fn render_target(&self) -> Option<&Arc<Surface>> {
        self.render_target.as_ref()
    }

    /// Marks `state` dirty on every live context.
    pub fn mark_state_dirty(&mut self, state: State) {
        for context in self.contexts.values_mut() {
            context.mark_state_dirty(state);
        }
    }

    pub(crate) fn mark_vertex_constants_dirty(&mut self, registers: std::ops::Range<usize>) {
        for context in self.contexts.values_mut() {
            context.mark_vertex_constants_dirty(registers.clone());
        }
        self.mark_state_dirty(State::Synthetic(SyntheticState::VertexShaderConstant));
    }

    pub(crate) fn mark_pixel_constants_dirty(&mut self, registers: std::ops::Range<usize>) {
        for context in self.contexts.values_mut() {
            context.mark_pixel_constants_dirty(registers.clone());
        }
        self.mark_state_dirty(State::Synthetic(SyntheticState::PixelShaderConstant));
    }

    /// Selects the surface draws and clears go to, resetting the viewport to cover it.
    pub fn set_render_target(&mut self, surface: Arc<Surface>) -> Result<(), DeviceError> {
        if !surface.resource().usage().contains(Usage::RENDER_TARGET) {
            return Err(DeviceError::NotARenderTarget);
        }
        let viewport = Viewport::covering(surface.width(), surface.height());
        if self.state.set_viewport(&viewport) {
            self.mark_state_dirty(State::Synthetic(SyntheticState::Viewport));
        }
        self.mode.depth_copy = DepthCopyState::Copy;
        self.render_target = Some(surface);
        Ok(())
    }

    fn current_render_target(&self) -> Result<Arc<Surface>, DeviceError> {
        self.render_target
            .clone()
            .ok_or(DeviceError::NoImplicitSwapChain)
    }

    pub fn draw_primitive(
        &mut self,
        primitive: PrimitiveType,
        start_vertex: u32,
        primitive_count: u32,
    ) -> Result<(), DeviceError> {
        if primitive_count == 0 {
            trace!(%primitive, "ignoring draw of zero primitives");
            return Ok(());
        }
        let target = self.current_render_target()?;
        self.activate(Some(&target), ContextUsage::DrawPrim)?;
        self.backend
            .draw_primitive(primitive, start_vertex, primitive.vertex_count(primitive_count));
        self.stats.inc_draws();
        Ok(())
    }

    pub fn clear(&mut self, params: &ClearParams) -> Result<(), DeviceError> {
        let target = self.current_render_target()?;
        self.activate(Some(&target), ContextUsage::Clear)?;
        self.backend.clear(params);
        Ok(())
    }

    pub fn blit_surface(&mut self, src: &Arc<Surface>, dst: &Arc<Surface>) -> Result<(), DeviceError> {
        self.activate(Some(dst), ContextUsage::Blit)?;
        self.backend.blit(src, dst);
        Ok(())
    }

    /// Uploads `surface` using whichever context is current for the calling thread.
    pub fn preload(&mut self, surface: &Arc<Surface>) -> Result<(), DeviceError> {
        self.activate(None, ContextUsage::ResourceLoad)?;
        self.backend.preload(surface);
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        for (id, context) in self.contexts.drain() {
            trace!(context = %id, "destroying context with device");
            self.backend.destroy_context(context.native());
        }
    }
}
