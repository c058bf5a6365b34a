mod harness;

use std::io;
use std::sync::{Arc, Mutex};

use harness::Harness;
use tracing_subscriber::fmt::MakeWriter;
use pretty_assertions::assert_eq;
use wined3d_core::resources::{Pool, Usage};
use wined3d_core::runtime::{DeviceCaps, DeviceConfig, DeviceError};
use wined3d_core::state::{
    Light, RenderState, SamplerState, State, SyntheticState, TextureStageState, Viewport,
};

const FILLMODE: u32 = 8;
const ZFUNC: u32 = 23;
const D3DTSS_COLOROP: u32 = 1;
const D3DSAMP_MINFILTER: u32 = 6;

fn fill() -> State {
    State::Render(RenderState::FILLMODE)
}

#[test]
fn recording_leaves_committed_state_and_contexts_alone() {
    let mut h = Harness::new();
    h.draw_and_settle();

    h.device.begin_state_block().unwrap();
    assert!(h.device.is_recording());
    h.device.set_render_state(FILLMODE, 2).unwrap();
    h.device.set_texture_stage_state(1, D3DTSS_COLOROP, 4).unwrap();
    let block = h.device.end_state_block().unwrap();

    assert!(!h.device.is_recording());
    assert_eq!(h.device.render_state(FILLMODE).unwrap(), 3);
    assert!(h.active().dirty_states().is_empty());
    assert_eq!(block.render_state(RenderState::FILLMODE), 2);
    assert!(block.changed().contains(fill()));
    assert!(block
        .changed()
        .contains(State::TextureStage(1, TextureStageState::COLOROP)));
    assert_eq!(block.changed().count(), 2);
}

#[test]
fn recording_calls_must_pair_up() {
    let mut h = Harness::new();
    assert!(matches!(
        h.device.end_state_block(),
        Err(DeviceError::NotRecording)
    ));
    h.device.begin_state_block().unwrap();
    assert!(matches!(
        h.device.begin_state_block(),
        Err(DeviceError::AlreadyRecording)
    ));
    h.device.end_state_block().unwrap();
}

#[test]
fn invalid_calls_fail_while_recording() {
    let mut h = Harness::new();
    h.device.begin_state_block().unwrap();
    assert!(h.device.set_render_state(999, 0).is_err());
    let block = h.device.end_state_block().unwrap();
    assert!(block.changed().is_empty());
}

#[test]
fn applying_a_block_replays_and_dirties() {
    let mut h = Harness::new();
    let viewport = Viewport {
        x: 8,
        y: 8,
        width: 32,
        height: 32,
        min_z: 0.0,
        max_z: 1.0,
    };

    h.device.begin_state_block().unwrap();
    h.device.set_render_state(FILLMODE, 2).unwrap();
    h.device.set_texture_stage_state(1, D3DTSS_COLOROP, 4).unwrap();
    h.device.set_sampler_state(0, D3DSAMP_MINFILTER, 2).unwrap();
    h.device
        .set_vertex_shader_constant_f(4, &[[1.0, 0.5, 0.25, 0.0]])
        .unwrap();
    h.device.light_enable(3, true);
    h.device.set_viewport(&viewport);
    let block = h.device.end_state_block().unwrap();

    h.draw_and_settle();
    h.device.apply_state_block(&block);

    assert_eq!(h.device.render_state(FILLMODE).unwrap(), 2);
    assert_eq!(h.device.texture_stage_state(1, D3DTSS_COLOROP).unwrap(), 4);
    assert_eq!(h.device.sampler_state(0, D3DSAMP_MINFILTER).unwrap(), 2);
    assert_eq!(
        h.device.state_block().vertex_shader_constants()[4],
        [1.0, 0.5, 0.25, 0.0]
    );
    let light = h.device.light(3).unwrap();
    assert!(light.enabled);
    assert_eq!(light.light, Light::default());
    assert_eq!(*h.device.state_block().viewport(), viewport);

    let dirty = h.active().dirty_states().to_vec();
    for state in [
        fill(),
        State::TextureStage(1, TextureStageState::COLOROP),
        State::Sampler(0),
        State::Synthetic(SyntheticState::VertexShaderConstant),
        State::Synthetic(SyntheticState::Lights),
        State::Synthetic(SyntheticState::Viewport),
    ] {
        assert!(dirty.contains(&state), "{state} not dirty");
    }
    assert_eq!(dirty.len(), 6);

    h.draw();
    assert_eq!(h.take_applied().len(), 6);

    h.device.apply_state_block(&block);
    assert!(h.active().dirty_states().is_empty());
}

#[test]
fn stream_state_is_replayed_per_stream() {
    let mut h = Harness::new();
    let vb = h
        .device
        .create_vertex_buffer(256, Usage::WRITE_ONLY, Pool::Default)
        .unwrap();

    h.device.begin_state_block().unwrap();
    h.device
        .set_stream_source(0, Some(Arc::clone(&vb)), 0, 16)
        .unwrap();
    h.device.set_stream_source_freq(1, 2).unwrap();
    let block = h.device.end_state_block().unwrap();
    assert!(h.device.state_block().stream_source(0).buffer.is_none());

    h.draw_and_settle();
    h.device.apply_state_block(&block);

    let committed = h.device.state_block();
    let stream = committed.stream_source(0);
    assert!(stream.buffer.as_ref().is_some_and(|b| Arc::ptr_eq(b, &vb)));
    assert_eq!(stream.stride, 16);
    assert_eq!(committed.stream_source(1).frequency, 2);
    assert_eq!(committed.stream_source(0).frequency, 1);
    assert_eq!(
        h.active().dirty_states(),
        &[State::Synthetic(SyntheticState::VertexDecl)]
    );
}

#[test]
fn capture_refreshes_recorded_states_only() {
    let mut h = Harness::new();
    h.device.begin_state_block().unwrap();
    h.device.set_render_state(FILLMODE, 2).unwrap();
    let mut block = h.device.end_state_block().unwrap();

    h.device.set_render_state(FILLMODE, 1).unwrap();
    h.device.set_render_state(ZFUNC, 2).unwrap();
    h.device.capture_state_block(&mut block);

    assert_eq!(block.render_state(RenderState::FILLMODE), 1);
    assert_eq!(block.render_state(RenderState::ZFUNC), 4);

    h.device.set_render_state(FILLMODE, 3).unwrap();
    h.device.apply_state_block(&block);
    assert_eq!(h.device.render_state(FILLMODE).unwrap(), 1);
    assert_eq!(h.device.render_state(ZFUNC).unwrap(), 2);
}

#[test]
fn sampler_block_only_replays_recorded_sampler_states() {
    let mut h = Harness::new();
    h.device.begin_state_block().unwrap();
    h.device.set_sampler_state(2, D3DSAMP_MINFILTER, 2).unwrap();
    let block = h.device.end_state_block().unwrap();

    // D3DSAMP_MAGFILTER
    h.device.set_sampler_state(2, 5, 3).unwrap();
    h.device.apply_state_block(&block);
    assert_eq!(
        h.device
            .state_block()
            .sampler_state(2, SamplerState::MINFILTER),
        2
    );
    assert_eq!(
        h.device
            .state_block()
            .sampler_state(2, SamplerState::MAGFILTER),
        3
    );
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn light_limit_is_checked_against_the_recorded_block() {
    let mut h = Harness::with_config(DeviceConfig {
        caps: DeviceCaps {
            max_active_lights: 1,
            ..DeviceCaps::default()
        },
        ..DeviceConfig::default()
    });
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(logs.clone())
        .finish();

    h.device.begin_state_block().unwrap();
    tracing::subscriber::with_default(subscriber, || {
        h.device.light_enable(0, true);
        h.device.light_enable(1, true);
    });
    let block = h.device.end_state_block().unwrap();

    assert!(logs.contents().contains("more lights enabled"));
    assert!(h.device.light(0).is_err());
    assert!(block.changed().contains(State::Synthetic(SyntheticState::Lights)));
}
