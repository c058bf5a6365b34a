mod harness;

use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use harness::{BackendLog, Call, Harness, HEIGHT, WIDTH};
use pretty_assertions::assert_eq;
use wined3d_core::resources::{Format, Surface, SurfaceDesc};
use wined3d_core::runtime::{
    DeviceConfig, DeviceError, DrawBuffer, Drawable, OffscreenRenderingMode, SwapChainId,
};
use wined3d_core::state::{RenderState, State, SyntheticState, TransformState};
use wined3d_core::{ContextId, ContextOwner, Device, PrimitiveType};

fn offscreen(h: &mut Harness, width: u32, height: u32, format: Format) -> Arc<Surface> {
    h.device
        .create_render_target(SurfaceDesc {
            width,
            height,
            format,
        })
        .unwrap()
}

fn pbuffer_config() -> DeviceConfig {
    DeviceConfig {
        offscreen_rendering_mode: OffscreenRenderingMode::Pbuffer,
        ..DeviceConfig::default()
    }
}

fn draw_on_other_thread(device: &mut Device) -> (thread::ThreadId, Result<(), DeviceError>) {
    thread::scope(|s| {
        s.spawn(move || {
            let result = device.draw_primitive(PrimitiveType::TriangleList, 0, 1);
            (thread::current().id(), result)
        })
        .join()
        .unwrap()
    })
}

fn flip_states() -> Vec<State> {
    vec![
        State::Transform(TransformState::Projection),
        State::Synthetic(SyntheticState::VertexDecl),
        State::Synthetic(SyntheticState::Viewport),
        State::Synthetic(SyntheticState::ScissorRect),
        State::Synthetic(SyntheticState::FrontFace),
    ]
}

/// Draws on a long-lived worker thread and reports the context it drew with.
fn worker_draw(
    jobs: &mpsc::Sender<()>,
    results: &mpsc::Receiver<Result<Option<ContextId>, DeviceError>>,
) -> ContextId {
    jobs.send(()).unwrap();
    results.recv().unwrap().unwrap().unwrap()
}

#[test]
fn swap_chain_contexts_are_per_thread() {
    let mut h = Harness::new();
    h.draw_and_settle();
    let main = thread::current().id();
    let main_ctx = h.device.active_context().unwrap();

    let (other, result) = draw_on_other_thread(&mut h.device);
    result.unwrap();
    let other_ctx = h.device.active_context().unwrap();

    assert_ne!(main_ctx, other_ctx);
    assert_eq!(h.context(main_ctx).thread_affinity(), Some(main));
    assert_eq!(h.context(other_ctx).thread_affinity(), Some(other));
    assert_eq!(
        h.context(other_ctx).owner(),
        ContextOwner::SwapChain(SwapChainId::IMPLICIT)
    );
    assert_eq!(
        h.device
            .swap_chain(SwapChainId::IMPLICIT)
            .unwrap()
            .contexts()
            .len(),
        2
    );

    h.draw();
    assert_eq!(h.device.active_context(), Some(main_ctx));
    assert_eq!(h.device.stats().contexts_created, 2);
}

#[test]
fn offscreen_targets_flip_rendering() {
    let mut h = Harness::new();
    h.draw_and_settle();
    let back = h.device.render_target().cloned().unwrap();
    let rt = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);
    let flipped = flip_states();

    h.device.set_render_target(rt).unwrap();
    h.draw();
    assert!(h.device.rendering_mode().render_offscreen);
    assert_eq!(h.take_applied(), flipped);
    assert_eq!(
        h.take_calls(),
        vec![
            Call::SetDrawBuffer(DrawBuffer::Offscreen),
            Call::Draw { vertex_count: 3 }
        ]
    );

    h.device.set_render_target(back).unwrap();
    h.draw();
    assert!(!h.device.rendering_mode().render_offscreen);
    assert_eq!(h.take_applied(), flipped);
}

#[test]
fn flip_is_tracked_per_context() {
    let mut h = Harness::new();
    let back = h.device.render_target().cloned().unwrap();
    let rt = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);

    h.device.set_render_target(rt).unwrap();
    h.draw_and_settle();
    let main_ctx = h.device.active_context().unwrap();

    // Another thread flips the device back onscreen with its own context.
    h.device.set_render_target(back).unwrap();
    let (_, result) = draw_on_other_thread(&mut h.device);
    result.unwrap();
    assert_ne!(h.device.active_context(), Some(main_ctx));
    h.take_applied();

    h.draw();
    assert_eq!(h.device.active_context(), Some(main_ctx));
    assert_eq!(h.take_applied(), flip_states());
}

#[test]
fn fbo_rendering_reuses_the_threads_active_context() {
    let mut h = Harness::new();
    let second = h
        .device
        .create_swap_chain(harness::swap_chain_desc(2))
        .unwrap();
    let second_back = h
        .device
        .swap_chain(second)
        .unwrap()
        .back_buffer(0)
        .cloned()
        .unwrap();
    let rt = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);
    h.device.set_render_target(second_back).unwrap();

    let device = Mutex::new(&mut h.device);
    thread::scope(|s| {
        let (jobs, job_rx) = mpsc::channel::<()>();
        let (result_tx, results) = mpsc::channel();
        let device = &device;
        s.spawn(move || {
            for () in job_rx {
                let mut device = device.lock().unwrap();
                let result = device
                    .draw_primitive(PrimitiveType::TriangleList, 0, 1)
                    .map(|()| device.active_context());
                result_tx.send(result).unwrap();
            }
        });

        let worker_ctx = worker_draw(&jobs, &results);
        let created = {
            let mut device = device.lock().unwrap();
            device
                .draw_primitive(PrimitiveType::TriangleList, 0, 1)
                .unwrap();
            assert_ne!(device.active_context(), Some(worker_ctx));
            device.set_render_target(rt).unwrap();
            device.stats().contexts_created
        };

        assert_eq!(worker_draw(&jobs, &results), worker_ctx);
        let device = device.lock().unwrap();
        assert_eq!(device.stats().contexts_created, created);
        assert_eq!(
            device.context(worker_ctx).unwrap().owner(),
            ContextOwner::SwapChain(second)
        );
    });
}

#[test]
fn alpha_presence_change_dirties_blending() {
    let mut h = Harness::new();
    let with_alpha = offscreen(&mut h, WIDTH, HEIGHT, Format::A8R8G8B8);
    let without_alpha = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);

    h.device.set_render_target(with_alpha).unwrap();
    h.draw_and_settle();
    h.device.set_render_target(without_alpha).unwrap();
    h.draw();
    assert_eq!(
        h.take_applied(),
        vec![State::Render(RenderState::ALPHABLENDENABLE)]
    );
}

#[test]
fn fbo_mode_never_reads_back() {
    let mut h = Harness::new();
    let a = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);
    let b = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);

    h.device.set_render_target(a).unwrap();
    h.draw();
    h.device.set_render_target(b).unwrap();
    h.draw();
    assert_eq!(h.backend().count(|c| matches!(c, Call::Preload(_))), 0);
    assert_eq!(h.device.stats().offscreen_readbacks, 0);
}

#[test]
fn pbuffer_mode_reads_back_and_grows() {
    let mut h = Harness::with_config(pbuffer_config());
    h.draw_and_settle();
    let back = h.device.render_target().cloned().unwrap();
    let small = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);
    let large = offscreen(&mut h, 128, 96, Format::X8R8G8B8);

    h.device.set_render_target(Arc::clone(&small)).unwrap();
    h.draw();
    let first_pbuffer = h.device.active_context().unwrap();
    assert_eq!(h.context(first_pbuffer).owner(), ContextOwner::Pbuffer);
    let calls = h.take_calls();
    assert!(calls.contains(&Call::CreateContext(Drawable::Pbuffer {
        width: WIDTH,
        height: HEIGHT
    })));
    assert!(!calls.iter().any(|c| matches!(c, Call::Preload(_))));

    let old_native = h.context(first_pbuffer).native();
    h.device.set_render_target(Arc::clone(&large)).unwrap();
    h.draw();
    let calls = h.take_calls();
    assert!(calls.contains(&Call::Preload(small.resource().id())));
    assert!(calls.contains(&Call::DestroyContext(old_native)));
    assert!(calls.contains(&Call::CreateContext(Drawable::Pbuffer {
        width: 128,
        height: 96
    })));
    assert!(h.device.context(first_pbuffer).is_err());

    h.device.set_render_target(back).unwrap();
    h.draw();
    assert!(h
        .take_calls()
        .contains(&Call::Preload(large.resource().id())));
    assert_eq!(h.device.stats().offscreen_readbacks, 2);
}

#[test]
fn pbuffer_failure_falls_back_to_back_buffer() {
    let mut h = Harness::build(
        pbuffer_config(),
        BackendLog {
            fail_pbuffers: true,
            ..BackendLog::default()
        },
    );
    h.draw_and_settle();
    let ctx = h.device.active_context().unwrap();
    let rt = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);

    h.device.set_render_target(rt).unwrap();
    h.draw();
    assert_eq!(
        h.device.rendering_mode().offscreen_rendering_mode,
        OffscreenRenderingMode::BackBuffer
    );
    assert_eq!(h.device.active_context(), Some(ctx));
}

#[test]
fn pbuffer_is_taken_over_by_a_second_thread() {
    let mut h = Harness::with_config(pbuffer_config());
    let rt = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);
    h.device.set_render_target(rt).unwrap();
    h.draw_and_settle();
    let pbuffer = h.device.active_context().unwrap();

    let (other, result) = draw_on_other_thread(&mut h.device);
    result.unwrap();
    assert_eq!(h.device.stats().pbuffer_contentions, 1);
    assert_eq!(h.context(pbuffer).thread_affinity(), Some(other));
}

#[test]
fn strict_pbuffer_ownership_rejects_a_second_thread() {
    let mut h = Harness::with_config(DeviceConfig {
        strict_pbuffer_ownership: true,
        ..pbuffer_config()
    });
    let rt = offscreen(&mut h, WIDTH, HEIGHT, Format::X8R8G8B8);
    h.device.set_render_target(rt).unwrap();
    h.draw_and_settle();
    let pbuffer = h.device.active_context().unwrap();
    let main = thread::current().id();

    let (other, result) = draw_on_other_thread(&mut h.device);
    match result {
        Err(DeviceError::PbufferContention { owner, requested }) => {
            assert_eq!(owner, main);
            assert_eq!(requested, other);
        }
        unexpected => panic!("expected pbuffer contention, got {unexpected:?}"),
    }
    assert_eq!(h.context(pbuffer).thread_affinity(), Some(main));
}

#[test]
fn make_current_failure_keeps_states_dirty() {
    let mut h = Harness::build(
        DeviceConfig::default(),
        BackendLog {
            fail_make_current: true,
            ..BackendLog::default()
        },
    );
    let ctx = h.device.contexts().next().unwrap().id();
    let fill = State::Render(RenderState::FILLMODE);

    let err = h
        .device
        .draw_primitive(PrimitiveType::TriangleList, 0, 1)
        .unwrap_err();
    assert!(matches!(err, DeviceError::MakeCurrentFailed { context } if context == ctx));
    assert_eq!(h.device.active_context(), None);
    assert!(h.context(ctx).is_state_dirty(fill));
    assert_eq!(h.take_applied(), vec![]);

    h.backend().fail_make_current = false;
    h.draw();
    assert_eq!(h.device.active_context(), Some(ctx));
    assert!(h.take_applied().contains(&fill));
}

#[test]
fn already_current_native_context_is_not_switched() {
    let mut h = Harness::new();
    let native = h.device.contexts().next().unwrap().native();
    h.backend().current = Some(native);

    h.draw();
    let stats = h.device.stats();
    assert_eq!(stats.skipped_switches, 1);
    assert_eq!(stats.context_switches, 0);
    assert_eq!(h.backend().count(|c| matches!(c, Call::MakeCurrent(_))), 0);
}

#[test]
fn draw_buffer_is_only_set_when_it_changes() {
    let mut h = Harness::new();
    h.draw();
    h.draw();
    assert_eq!(
        h.backend()
            .count(|c| *c == Call::SetDrawBuffer(DrawBuffer::Back)),
        1
    );

    let front = h
        .device
        .swap_chain(SwapChainId::IMPLICIT)
        .unwrap()
        .front_buffer()
        .clone();
    h.device.set_render_target(front).unwrap();
    h.draw();
    assert_eq!(
        h.backend()
            .count(|c| *c == Call::SetDrawBuffer(DrawBuffer::Front)),
        1
    );
}

#[test]
fn destroying_a_swap_chain_destroys_its_contexts() {
    let mut h = Harness::new();
    let id = h
        .device
        .create_swap_chain(harness::swap_chain_desc(2))
        .unwrap();
    assert_eq!(h.device.contexts().count(), 2);

    h.device.destroy_swap_chain(id).unwrap();
    assert_eq!(h.device.contexts().count(), 1);
    assert_eq!(h.device.stats().contexts_destroyed, 1);
    assert!(matches!(
        h.device.destroy_swap_chain(id),
        Err(DeviceError::UnknownSwapChain(_))
    ));
}

#[test]
fn present_swaps_the_calling_threads_context() {
    let mut h = Harness::new();
    let native = h.device.contexts().next().unwrap().native();
    h.device.present(SwapChainId::IMPLICIT).unwrap();
    assert!(h.take_calls().contains(&Call::SwapBuffers(native)));
}
