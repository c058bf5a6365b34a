//! Choosing and activating the context a render target is drawn with.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::{debug, error, trace, warn};

use super::{Context, ContextId, ContextOwner, ContextUsage};
use crate::resources::{Format, Surface};
use crate::runtime::backend::{ContextRequest, DrawBuffer, Drawable, GraphicsBackend, NativeContext};
use crate::runtime::config::OffscreenRenderingMode;
use crate::runtime::swapchain::SwapChainId;
use crate::runtime::{Device, DeviceError};
use crate::state::{RenderState, State, SyntheticState, TextureStageState, TransformState};

/// States whose meaning depends on whether rendering is vertically flipped.
const OFFSCREEN_FLIP_STATES: [State; 5] = [
    State::Transform(TransformState::Projection),
    State::Synthetic(SyntheticState::VertexDecl),
    State::Synthetic(SyntheticState::Viewport),
    State::Synthetic(SyntheticState::ScissorRect),
    State::Synthetic(SyntheticState::FrontFace),
];

/// States the blit configuration overrides, besides each stage's color op and sampler.
const BLIT_CLOBBERED_STATES: [State; 17] = [
    State::Render(RenderState::LIGHTING),
    State::Render(RenderState::ZENABLE),
    State::Render(RenderState::FOGENABLE),
    State::Render(RenderState::ALPHABLENDENABLE),
    State::Render(RenderState::CULLMODE),
    State::Render(RenderState::STENCILENABLE),
    State::Render(RenderState::SCISSORTESTENABLE),
    State::Render(RenderState::ALPHATESTENABLE),
    State::Render(RenderState::POINTSPRITEENABLE),
    State::Render(RenderState::COLORWRITEENABLE),
    State::Render(RenderState::CLIPPING),
    State::Transform(TransformState::Projection),
    State::Transform(TransformState::World(0)),
    State::Transform(TransformState::Texture(0)),
    State::Transform(TransformState::View),
    State::Synthetic(SyntheticState::Viewport),
    State::Synthetic(SyntheticState::VertexDecl),
];

/// The device-wide offscreen pbuffer and the size it was created with.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PbufferContext {
    pub(crate) context: ContextId,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Device {
    pub(crate) fn create_context(
        &mut self,
        owner: ContextOwner,
        drawable: Drawable,
        format: Format,
        share_with: Option<NativeContext>,
        thread: Option<ThreadId>,
    ) -> Result<ContextId, DeviceError> {
        let request = ContextRequest {
            drawable,
            format,
            share_with,
        };
        let native = self
            .backend
            .create_context(&request)
            .map_err(|source| DeviceError::ContextCreation { source })?;

        let id = ContextId(self.next_context_id);
        self.next_context_id += 1;
        self.contexts
            .insert(id, Context::new(id, native, owner, thread, &self.config.caps));
        self.stats.inc_contexts_created();
        debug!(context = %id, ?owner, ?native, ?drawable, ?thread, "created context");
        Ok(id)
    }

    /// Destroys a context, forgetting it as the active one if it was.
    pub(crate) fn destroy_context(&mut self, id: ContextId) {
        let Some(context) = self.contexts.remove(&id) else {
            return;
        };
        self.backend.destroy_context(context.native());
        if self.active == Some(id) {
            self.active = None;
        }
        self.thread_active.retain(|_, c| *c != id);
        if self.pbuffer.is_some_and(|p| p.context == id) {
            self.pbuffer = None;
        }
        for swap_chain in self.swap_chains.values_mut() {
            swap_chain.contexts.retain(|&c| c != id);
        }
        self.stats.inc_contexts_destroyed();
        debug!(context = %id, "destroyed context");
    }

    /// Any live context to share objects with.
    fn share_context(&self) -> Option<NativeContext> {
        self.swap_chains
            .get(&SwapChainId::IMPLICIT)
            .and_then(|sc| sc.contexts.first())
            .and_then(|id| self.contexts.get(id))
            .map(Context::native)
    }

    /// The context `thread` renders to the swapchain with, created on first use.
    pub(crate) fn swap_chain_context_for_thread(
        &mut self,
        swap_chain: SwapChainId,
        thread: ThreadId,
    ) -> Result<ContextId, DeviceError> {
        let sc = self
            .swap_chains
            .get(&swap_chain)
            .ok_or(DeviceError::UnknownSwapChain(swap_chain))?;
        let existing = sc.contexts.iter().copied().find(|id| {
            self.contexts
                .get(id)
                .is_some_and(|c| c.thread_affinity() == Some(thread))
        });
        if let Some(id) = existing {
            return Ok(id);
        }

        let drawable = Drawable::Window(sc.desc().window);
        let format = sc.desc().format;
        debug!(%swap_chain, ?thread, "no context for this thread yet");
        let share = self.share_context();
        let id = self.create_context(
            ContextOwner::SwapChain(swap_chain),
            drawable,
            format,
            share,
            Some(thread),
        )?;
        if let Some(sc) = self.swap_chains.get_mut(&swap_chain) {
            sc.contexts.push(id);
        }
        Ok(id)
    }

    /// Decides which context renders to `target` from `thread`, and into which buffer.
    pub fn find_context(
        &mut self,
        target: &Arc<Surface>,
        thread: ThreadId,
    ) -> Result<(ContextId, DrawBuffer), DeviceError> {
        let was_offscreen = self.mode.render_offscreen;
        let previous = self.last_target.clone();

        if let Some(prev) = previous.as_ref() {
            if was_offscreen
                && !Arc::ptr_eq(prev, target)
                && self.mode.offscreen_rendering_mode != OffscreenRenderingMode::Fbo
            {
                // The previous target only lives in the drawable we are about to leave.
                debug!(resource = %prev.resource().id(), "reading back offscreen target");
                self.backend.preload(prev);
                self.stats.inc_offscreen_readbacks();
            }
        }

        let (context, draw_buffer) = match target.swap_chain() {
            Some(swap_chain) => {
                let draw_buffer = self
                    .swap_chain(swap_chain)?
                    .draw_buffer_for(target)
                    .ok_or(DeviceError::SurfaceNotOwnedBySwapChain(swap_chain))?;
                let context = self.swap_chain_context_for_thread(swap_chain, thread)?;
                self.mode.render_offscreen = false;
                (context, draw_buffer)
            }
            None => {
                let context = self.offscreen_context(target, thread)?;
                self.mode.render_offscreen = true;
                (context, DrawBuffer::Offscreen)
            }
        };

        let ctx = self
            .contexts
            .get_mut(&context)
            .ok_or(DeviceError::UnknownContext(context))?;
        if ctx.set_render_offscreen(self.mode.render_offscreen) {
            trace!(context = %context, offscreen = self.mode.render_offscreen, "render flip changed");
            for state in OFFSCREEN_FLIP_STATES {
                ctx.mark_state_dirty(state);
            }
        }
        if let Some(prev) = previous {
            if prev.format().has_alpha() != target.format().has_alpha() {
                ctx.mark_state_dirty(State::Render(RenderState::ALPHABLENDENABLE));
            }
        }
        Ok((context, draw_buffer))
    }

    fn offscreen_context(
        &mut self,
        target: &Arc<Surface>,
        thread: ThreadId,
    ) -> Result<ContextId, DeviceError> {
        match self.mode.offscreen_rendering_mode {
            OffscreenRenderingMode::Fbo | OffscreenRenderingMode::BackBuffer => {
                self.thread_context(thread)
            }
            OffscreenRenderingMode::Pbuffer => match self.pbuffer_context(target, thread) {
                Err(DeviceError::ContextCreation { source }) => {
                    warn!(error = %source, "pbuffer creation failed, falling back to backbuffer rendering");
                    self.mode.offscreen_rendering_mode = OffscreenRenderingMode::BackBuffer;
                    self.thread_context(thread)
                }
                result => result,
            },
        }
    }

    /// The context `thread` last activated, or its implicit swapchain context.
    fn thread_context(&mut self, thread: ThreadId) -> Result<ContextId, DeviceError> {
        if let Some(&active) = self.thread_active.get(&thread) {
            let owned = self
                .contexts
                .get(&active)
                .is_some_and(|c| c.thread_affinity() == Some(thread));
            if owned {
                return Ok(active);
            }
        }
        if !self.swap_chains.contains_key(&SwapChainId::IMPLICIT) {
            return Err(DeviceError::NoImplicitSwapChain);
        }
        self.swap_chain_context_for_thread(SwapChainId::IMPLICIT, thread)
    }

    fn pbuffer_context(
        &mut self,
        target: &Arc<Surface>,
        thread: ThreadId,
    ) -> Result<ContextId, DeviceError> {
        let (width, height) = match self.pbuffer {
            Some(p) if p.width >= target.width() && p.height >= target.height() => {
                (p.width, p.height)
            }
            Some(p) => (p.width.max(target.width()), p.height.max(target.height())),
            None => (target.width(), target.height()),
        };

        let pbuffer = match self.pbuffer {
            Some(p) if p.width == width && p.height == height => p,
            current => {
                let owner = current.and_then(|p| {
                    self.contexts
                        .get(&p.context)
                        .and_then(Context::thread_affinity)
                });
                if let Some(old) = current {
                    debug!(
                        old_width = old.width,
                        old_height = old.height,
                        width,
                        height,
                        "growing pbuffer"
                    );
                    self.destroy_context(old.context);
                }
                let share = self.share_context();
                let context = self.create_context(
                    ContextOwner::Pbuffer,
                    Drawable::Pbuffer { width, height },
                    target.format(),
                    share,
                    owner,
                )?;
                let p = PbufferContext {
                    context,
                    width,
                    height,
                };
                self.pbuffer = Some(p);
                p
            }
        };

        let strict = self.config.strict_pbuffer_ownership;
        let context = self
            .contexts
            .get_mut(&pbuffer.context)
            .ok_or(DeviceError::UnknownContext(pbuffer.context))?;
        match context.thread_affinity() {
            Some(owner) if owner != thread => {
                self.stats.inc_pbuffer_contentions();
                if strict {
                    return Err(DeviceError::PbufferContention {
                        owner,
                        requested: thread,
                    });
                }
                warn!(
                    ?owner,
                    requested = ?thread,
                    "pbuffer context used from a second thread, taking it over"
                );
            }
            _ => {}
        }
        context.set_thread_affinity(thread);
        Ok(pbuffer.context)
    }

    /// Makes the right context current for drawing to `target` from the calling thread and
    /// prepares it for `usage`.
    ///
    /// `None` means the last activated target, or the render target if nothing was activated
    /// yet.
    pub fn activate(
        &mut self,
        target: Option<&Arc<Surface>>,
        usage: ContextUsage,
    ) -> Result<ContextId, DeviceError> {
        let thread = thread::current().id();
        let target = target
            .cloned()
            .or_else(|| self.last_target.clone())
            .or_else(|| self.render_target.clone())
            .ok_or(DeviceError::NoImplicitSwapChain)?;

        let cached = match (self.active, self.last_target.as_ref()) {
            (Some(active), Some(last))
                if Arc::ptr_eq(last, &target) && self.last_thread == Some(thread) =>
            {
                Some(active)
            }
            _ => None,
        };
        let (id, draw_buffer) = match cached {
            Some(active) => (active, self.last_draw_buffer),
            None => {
                let (id, draw_buffer) = self.find_context(&target, thread)?;
                self.last_target = Some(Arc::clone(&target));
                self.last_thread = Some(thread);
                self.last_draw_buffer = draw_buffer;
                (id, draw_buffer)
            }
        };

        let native = self.context(id)?.native();
        if self.active != Some(id) || self.backend.current_context() != Some(native) {
            self.switch_to(id, thread)?;
        }
        self.thread_active.insert(thread, id);

        let context = self
            .contexts
            .get_mut(&id)
            .ok_or(DeviceError::UnknownContext(id))?;
        if context.last_draw_buffer() != Some(draw_buffer) {
            trace!(context = %id, ?draw_buffer, "selecting draw buffer");
            self.backend.set_draw_buffer(draw_buffer);
            context.set_last_draw_buffer(draw_buffer);
        }

        match usage {
            ContextUsage::ResourceLoad => {}
            ContextUsage::Clear => {
                self.backend.prepare_clear();
                context.mark_state_dirty(State::Render(RenderState::ALPHABLENDENABLE));
                context.mark_state_dirty(State::Render(RenderState::SCISSORTESTENABLE));
                context.set_last_was_blit(false);
            }
            ContextUsage::DrawPrim => {
                let applied =
                    context.apply_dirty_states(&mut *self.applier, &self.state, &mut self.mode);
                self.stats.add_states_applied(applied);
                context.set_last_was_blit(false);
            }
            ContextUsage::Blit => {
                let stages = self.config.caps.max_texture_stages;
                setup_for_blit(
                    context,
                    &mut *self.backend,
                    stages,
                    target.width(),
                    target.height(),
                );
            }
        }
        Ok(id)
    }

    fn switch_to(&mut self, id: ContextId, thread: ThreadId) -> Result<(), DeviceError> {
        let context = self
            .contexts
            .get_mut(&id)
            .ok_or(DeviceError::UnknownContext(id))?;
        let native = context.native();
        if self.backend.current_context() == Some(native) {
            trace!(context = %id, "native context already current");
            self.stats.inc_skipped_switches();
        } else {
            debug!(context = %id, ?native, "switching context");
            if !self.backend.make_current(native) {
                error!(context = %id, ?native, "failed to make context current");
                self.active = None;
                self.thread_active.remove(&thread);
                return Err(DeviceError::MakeCurrentFailed { context: id });
            }
            self.stats.inc_context_switches();
        }
        // Uploads made through another context may not be visible here.
        context.mark_all_constants_dirty();
        self.active = Some(id);
        Ok(())
    }
}

fn setup_for_blit(
    context: &mut Context,
    backend: &mut dyn GraphicsBackend,
    stages: usize,
    width: u32,
    height: u32,
) {
    if context.last_was_blit() {
        trace!(context = %context.id(), "already set up for blitting");
        return;
    }
    debug!(context = %context.id(), width, height, "setting up context for blit");
    backend.setup_blit(width, height);

    for stage in 0..stages as u8 {
        context.mark_state_dirty(State::TextureStage(stage, TextureStageState::COLOROP));
        context.mark_state_dirty(State::Sampler(stage));
    }
    for state in BLIT_CLOBBERED_STATES {
        context.mark_state_dirty(state);
    }
    context.last_was_rhw = true;
    context.set_last_was_blit(true);
}
