//! Per-thread native contexts and the states each one still has to apply.

mod dirty;
mod selection;

use std::fmt;
use std::ops::Range;
use std::thread::ThreadId;

use tracing::{trace, warn};

pub use dirty::DirtyStates;
pub(crate) use selection::PbufferContext;

use crate::runtime::backend::{DrawBuffer, NativeContext, StateApplier};
use crate::runtime::config::DeviceCaps;
use crate::runtime::device::RenderingMode;
use crate::runtime::swapchain::SwapChainId;
use crate::state::table::{self, ApplyFn};
use crate::state::{BitSet, State, StateBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u32);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextOwner {
    SwapChain(SwapChainId),
    /// The device-wide offscreen pbuffer.
    Pbuffer,
}

/// What a context is being activated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextUsage {
    ResourceLoad,
    Clear,
    DrawPrim,
    Blit,
}

#[derive(Debug)]
pub struct Context {
    id: ContextId,
    native: NativeContext,
    owner: ContextOwner,
    /// `None` only for a pbuffer context no thread has claimed yet.
    thread: Option<ThreadId>,
    dirty: DirtyStates,
    vs_constants_dirty: BitSet,
    ps_constants_dirty: BitSet,
    last_draw_buffer: Option<DrawBuffer>,
    last_was_blit: bool,
    /// Flip orientation the queued flip-dependent states were last marked for.
    render_offscreen: Option<bool>,
    /// Whether the last draw used pretransformed (RHW) vertices; maintained by apply leaves.
    pub last_was_rhw: bool,
}

impl Context {
    pub(crate) fn new(
        id: ContextId,
        native: NativeContext,
        owner: ContextOwner,
        thread: Option<ThreadId>,
        caps: &DeviceCaps,
    ) -> Self {
        let mut context = Self {
            id,
            native,
            owner,
            thread,
            dirty: DirtyStates::default(),
            vs_constants_dirty: BitSet::new(caps.max_vertex_shader_constants),
            ps_constants_dirty: BitSet::new(caps.max_pixel_shader_constants),
            last_draw_buffer: None,
            last_was_blit: false,
            render_offscreen: None,
            last_was_rhw: false,
        };
        context.mark_all_states_dirty();
        context.mark_all_constants_dirty();
        context
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn native(&self) -> NativeContext {
        self.native
    }

    pub fn owner(&self) -> ContextOwner {
        self.owner
    }

    /// The only thread this context may be made current on.
    pub fn thread_affinity(&self) -> Option<ThreadId> {
        self.thread
    }

    pub(crate) fn set_thread_affinity(&mut self, thread: ThreadId) {
        self.thread = Some(thread);
    }

    pub fn mark_state_dirty(&mut self, state: State) -> bool {
        self.dirty.mark(state)
    }

    pub fn is_state_dirty(&self, state: State) -> bool {
        self.dirty.is_dirty(state)
    }

    pub fn mark_all_states_dirty(&mut self) {
        self.dirty.mark_all();
    }

    /// Representatives queued for the next drain, in marking order.
    pub fn dirty_states(&self) -> &[State] {
        self.dirty.pending()
    }

    pub fn last_draw_buffer(&self) -> Option<DrawBuffer> {
        self.last_draw_buffer
    }

    pub(crate) fn set_last_draw_buffer(&mut self, buffer: DrawBuffer) {
        self.last_draw_buffer = Some(buffer);
    }

    pub fn last_was_blit(&self) -> bool {
        self.last_was_blit
    }

    pub(crate) fn set_last_was_blit(&mut self, blit: bool) {
        self.last_was_blit = blit;
    }

    /// Records the flip orientation this context now renders with. Returns `true` if it differs
    /// from the last one recorded.
    pub(crate) fn set_render_offscreen(&mut self, offscreen: bool) -> bool {
        self.render_offscreen.replace(offscreen) != Some(offscreen)
    }

    pub fn mark_vertex_constants_dirty(&mut self, registers: Range<usize>) {
        self.vs_constants_dirty.insert_range(registers);
    }

    pub fn mark_pixel_constants_dirty(&mut self, registers: Range<usize>) {
        self.ps_constants_dirty.insert_range(registers);
    }

    pub fn mark_all_constants_dirty(&mut self) {
        self.vs_constants_dirty.fill();
        self.ps_constants_dirty.fill();
    }

    /// Dirty vertex shader constant registers, ascending; clears them.
    pub fn take_dirty_vertex_constants(&mut self) -> Vec<usize> {
        self.vs_constants_dirty.take()
    }

    pub fn take_dirty_pixel_constants(&mut self) -> Vec<usize> {
        self.ps_constants_dirty.take()
    }

    /// Applies every queued representative in marking order and returns how many reached the
    /// applier.
    ///
    /// Each bit is cleared before its leaf runs, so a leaf that re-marks an already drained
    /// representative queues it for the next drain instead of looping.
    pub(crate) fn apply_dirty_states(
        &mut self,
        applier: &mut dyn StateApplier,
        block: &StateBlock,
        mode: &mut RenderingMode,
    ) -> u64 {
        let pending = self.dirty.take_list();
        let mut applied = 0;
        for &rep in &pending {
            self.dirty.unmark(rep);
            match table::entry(rep).apply {
                ApplyFn::NoGl => trace!(context = %self.id, state = %rep, "no native equivalent"),
                ApplyFn::Undefined => warn!(context = %self.id, state = %rep, "state not implemented"),
                func => {
                    trace!(context = %self.id, state = %rep, ?func, "applying state");
                    applier.apply(func, rep, block, mode, self);
                    applied += 1;
                }
            }
        }
        self.dirty.recycle(pending);
        applied
    }
}
