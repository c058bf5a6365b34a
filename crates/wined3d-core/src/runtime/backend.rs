//! Seams to the native graphics binding.
//!
//! The core never talks to a graphics API directly. Context management and draw submission go
//! through [`GraphicsBackend`]; realising individual states goes through [`StateApplier`].

use bitflags::bitflags;

use super::device::RenderingMode;
use super::topology::PrimitiveType;
use crate::context::Context;
use crate::resources::{Format, Surface};
use crate::state::{ApplyFn, Rect, State, StateBlock};

/// Opaque handle of a native graphics context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeContext(pub u64);

/// Opaque handle of the window a swapchain presents to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drawable {
    Window(WindowHandle),
    Pbuffer { width: u32, height: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextRequest {
    pub drawable: Drawable,
    pub format: Format,
    /// Share objects with this context.
    pub share_with: Option<NativeContext>,
}

/// Native buffer draws are directed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawBuffer {
    Front,
    Back,
    Offscreen,
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const TARGET = 1 << 0;
        const ZBUFFER = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClearParams {
    pub flags: ClearFlags,
    pub color: u32,
    pub z: f32,
    pub stencil: u32,
    /// Empty clears the whole viewport.
    pub rects: Vec<Rect>,
}

pub trait GraphicsBackend: Send {
    fn create_context(&mut self, request: &ContextRequest) -> anyhow::Result<NativeContext>;

    fn destroy_context(&mut self, context: NativeContext);

    /// Makes `context` current on the calling thread.
    fn make_current(&mut self, context: NativeContext) -> bool;

    fn current_context(&self) -> Option<NativeContext>;

    fn set_draw_buffer(&mut self, buffer: DrawBuffer);

    /// Brings the GPU copy of `surface` up to date.
    fn preload(&mut self, surface: &Surface);

    /// Native setup clears need beyond the blend/scissor states the core dirties.
    fn prepare_clear(&mut self) {}

    /// Puts the current context in the fixed configuration used for 2D blits.
    fn setup_blit(&mut self, width: u32, height: u32);

    fn clear(&mut self, params: &ClearParams);

    fn draw_primitive(&mut self, primitive: PrimitiveType, start_vertex: u32, vertex_count: u32);

    fn blit(&mut self, src: &Surface, dst: &Surface);

    fn swap_buffers(&mut self, context: NativeContext) -> anyhow::Result<()>;
}

/// Realises representatives on the current native context.
///
/// Implementations read values from `block` and may mark other states dirty on `context`;
/// marks for representatives already applied in the running drain are picked up by the next
/// drain.
pub trait StateApplier: Send {
    fn apply(
        &mut self,
        func: ApplyFn,
        state: State,
        block: &StateBlock,
        mode: &mut RenderingMode,
        context: &mut Context,
    );
}
