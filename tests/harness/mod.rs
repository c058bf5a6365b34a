#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::bail;
use wined3d_core::context::{Context, ContextId};
use wined3d_core::resources::{Format, ResourceId, Surface};
use wined3d_core::runtime::{
    ClearFlags, ClearParams, ContextRequest, Device, DeviceConfig, DrawBuffer, Drawable,
    GraphicsBackend, NativeContext, PrimitiveType, RenderingMode, StateApplier, SwapChainDesc,
    WindowHandle,
};
use wined3d_core::state::{ApplyFn, State, StateBlock};

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 64;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateContext(Drawable),
    DestroyContext(NativeContext),
    MakeCurrent(NativeContext),
    SetDrawBuffer(DrawBuffer),
    Preload(ResourceId),
    PrepareClear,
    SetupBlit { width: u32, height: u32 },
    Clear(ClearFlags),
    Draw { vertex_count: u32 },
    Blit { src: ResourceId, dst: ResourceId },
    SwapBuffers(NativeContext),
}

#[derive(Debug, Default)]
pub struct BackendLog {
    pub calls: Vec<Call>,
    /// The native context the fake considers current; tests may set it directly.
    pub current: Option<NativeContext>,
    pub next_native: u64,
    pub fail_make_current: bool,
    pub fail_pbuffers: bool,
}

impl BackendLog {
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

pub struct FakeBackend(pub Arc<Mutex<BackendLog>>);

impl FakeBackend {
    fn log(&self) -> MutexGuard<'_, BackendLog> {
        self.0.lock().unwrap()
    }
}

impl GraphicsBackend for FakeBackend {
    fn create_context(&mut self, request: &ContextRequest) -> anyhow::Result<NativeContext> {
        let mut log = self.log();
        if log.fail_pbuffers && matches!(request.drawable, Drawable::Pbuffer { .. }) {
            bail!("pbuffers unavailable");
        }
        log.next_native += 1;
        let native = NativeContext(log.next_native);
        log.calls.push(Call::CreateContext(request.drawable));
        Ok(native)
    }

    fn destroy_context(&mut self, context: NativeContext) {
        let mut log = self.log();
        if log.current == Some(context) {
            log.current = None;
        }
        log.calls.push(Call::DestroyContext(context));
    }

    fn make_current(&mut self, context: NativeContext) -> bool {
        let mut log = self.log();
        log.calls.push(Call::MakeCurrent(context));
        if log.fail_make_current {
            return false;
        }
        log.current = Some(context);
        true
    }

    fn current_context(&self) -> Option<NativeContext> {
        self.log().current
    }

    fn set_draw_buffer(&mut self, buffer: DrawBuffer) {
        self.log().calls.push(Call::SetDrawBuffer(buffer));
    }

    fn preload(&mut self, surface: &Surface) {
        self.log().calls.push(Call::Preload(surface.resource().id()));
    }

    fn prepare_clear(&mut self) {
        self.log().calls.push(Call::PrepareClear);
    }

    fn setup_blit(&mut self, width: u32, height: u32) {
        self.log().calls.push(Call::SetupBlit { width, height });
    }

    fn clear(&mut self, params: &ClearParams) {
        self.log().calls.push(Call::Clear(params.flags));
    }

    fn draw_primitive(&mut self, _primitive: PrimitiveType, _start_vertex: u32, vertex_count: u32) {
        self.log().calls.push(Call::Draw { vertex_count });
    }

    fn blit(&mut self, src: &Surface, dst: &Surface) {
        self.log().calls.push(Call::Blit {
            src: src.resource().id(),
            dst: dst.resource().id(),
        });
    }

    fn swap_buffers(&mut self, context: NativeContext) -> anyhow::Result<()> {
        self.log().calls.push(Call::SwapBuffers(context));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ApplyLog {
    pub applied: Vec<(ContextId, State)>,
    /// While applying the first state, mark the second dirty on the same context.
    pub remarks: Vec<(State, State)>,
}

impl ApplyLog {
    pub fn take_states(&mut self) -> Vec<State> {
        std::mem::take(&mut self.applied)
            .into_iter()
            .map(|(_, state)| state)
            .collect()
    }
}

pub struct RecordingApplier(pub Arc<Mutex<ApplyLog>>);

impl StateApplier for RecordingApplier {
    fn apply(
        &mut self,
        _func: ApplyFn,
        state: State,
        _block: &StateBlock,
        _mode: &mut RenderingMode,
        context: &mut Context,
    ) {
        let mut log = self.0.lock().unwrap();
        log.applied.push((context.id(), state));
        let marks: Vec<State> = log
            .remarks
            .iter()
            .filter(|(trigger, _)| *trigger == state)
            .map(|&(_, mark)| mark)
            .collect();
        for mark in marks {
            context.mark_state_dirty(mark);
        }
    }
}

pub struct Harness {
    pub device: Device,
    pub backend: Arc<Mutex<BackendLog>>,
    pub applied: Arc<Mutex<ApplyLog>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    pub fn with_config(config: DeviceConfig) -> Self {
        Self::build(config, BackendLog::default())
    }

    pub fn build(config: DeviceConfig, backend: BackendLog) -> Self {
        init_tracing();
        let backend = Arc::new(Mutex::new(backend));
        let applied = Arc::new(Mutex::new(ApplyLog::default()));
        let device = Device::new(
            config,
            Box::new(FakeBackend(Arc::clone(&backend))),
            Box::new(RecordingApplier(Arc::clone(&applied))),
            swap_chain_desc(1),
        )
        .unwrap();
        Self {
            device,
            backend,
            applied,
        }
    }

    pub fn backend(&self) -> MutexGuard<'_, BackendLog> {
        self.backend.lock().unwrap()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        self.backend().take_calls()
    }

    pub fn take_applied(&self) -> Vec<State> {
        self.applied.lock().unwrap().take_states()
    }

    pub fn draw(&mut self) {
        self.device
            .draw_primitive(PrimitiveType::TriangleList, 0, 1)
            .unwrap();
    }

    /// Draws once and forgets everything the draw applied or called.
    pub fn draw_and_settle(&mut self) {
        self.draw();
        self.take_applied();
        self.take_calls();
    }

    pub fn context(&self, id: ContextId) -> &Context {
        self.device.context(id).unwrap()
    }

    pub fn active(&self) -> &Context {
        self.context(self.device.active_context().unwrap())
    }
}

pub fn swap_chain_desc(window: u64) -> SwapChainDesc {
    SwapChainDesc {
        width: WIDTH,
        height: HEIGHT,
        format: Format::X8R8G8B8,
        back_buffer_count: 1,
        window: WindowHandle(window),
    }
}
