//! State setters, getters and state block recording.
//!
//! Every setter validates its arguments before touching any state. Writes go to the recording
//! block while one is open; otherwise they go to the committed block and, when the value
//! actually changed, the state is marked dirty on every context.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::{Device, DeviceError};
use crate::resources::{Buffer, Texture};
use crate::state::ids::{combined_sampler_index, MAX_FRAGMENT_SAMPLERS, MAX_STREAMS};
use crate::state::{
    Light, LightInfo, Material, Matrix, Rect, RenderState, SamplerState, ShaderHandle, State,
    StateBlock, SyntheticState, TextureStageState, TransformState, VertexDeclaration, Viewport,
};

impl Device {
    fn commit(&mut self, state: State, write: impl FnOnce(&mut StateBlock) -> bool) {
        if let Some(recording) = self.recording.as_mut() {
            write(recording);
            trace!(%state, "recorded");
            return;
        }
        if write(&mut self.state) {
            self.mark_state_dirty(state);
        } else {
            trace!(%state, "value unchanged, not dirtying");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    fn validate_stage(&self, stage: u32) -> Result<u8, DeviceError> {
        let max = self.config.caps.max_texture_stages;
        if (stage as usize) < max {
            Ok(stage as u8)
        } else {
            Err(DeviceError::InvalidTextureStage { stage, max })
        }
    }

    fn validate_sampler(&self, sampler: u32) -> Result<u8, DeviceError> {
        let caps = &self.config.caps;
        let index = combined_sampler_index(sampler).ok_or(DeviceError::InvalidSampler(sampler))?;
        let supported = match (index as usize).checked_sub(MAX_FRAGMENT_SAMPLERS) {
            None => (index as usize) < caps.max_fragment_samplers,
            Some(vertex) => vertex < caps.max_vertex_samplers,
        };
        if supported {
            Ok(index)
        } else {
            Err(DeviceError::InvalidSampler(sampler))
        }
    }

    fn validate_transform(&self, raw: u32) -> Result<TransformState, DeviceError> {
        let caps = &self.config.caps;
        match TransformState::from_raw(raw) {
            Some(TransformState::World(i)) if (i as usize) >= caps.max_world_matrices => {
                Err(DeviceError::InvalidTransform(raw))
            }
            Some(TransformState::Texture(s)) if (s as usize) >= caps.max_texture_stages => {
                Err(DeviceError::InvalidTransform(raw))
            }
            Some(transform) => Ok(transform),
            None => Err(DeviceError::InvalidTransform(raw)),
        }
    }

    fn validate_stream(&self, stream: u32) -> Result<usize, DeviceError> {
        if (stream as usize) < self.config.caps.max_streams {
            Ok(stream as usize)
        } else {
            Err(DeviceError::InvalidStream(stream))
        }
    }

    fn validate_constants(start: u32, count: usize, max: usize) -> Result<usize, DeviceError> {
        let end = u64::from(start) + count as u64;
        if end <= max as u64 {
            Ok(start as usize)
        } else {
            Err(DeviceError::InvalidConstantRange { start, end, max })
        }
    }

    pub fn set_render_state(&mut self, state: u32, value: u32) -> Result<(), DeviceError> {
        let rs = RenderState::from_raw(state).ok_or(DeviceError::InvalidRenderState(state))?;
        self.commit(State::Render(rs), |b| b.set_render_state(rs, value));
        Ok(())
    }

    pub fn render_state(&self, state: u32) -> Result<u32, DeviceError> {
        let rs = RenderState::from_raw(state).ok_or(DeviceError::InvalidRenderState(state))?;
        Ok(self.state.render_state(rs))
    }

    pub fn set_texture_stage_state(
        &mut self,
        stage: u32,
        state: u32,
        value: u32,
    ) -> Result<(), DeviceError> {
        let stage = self.validate_stage(stage)?;
        let kind =
            TextureStageState::from_raw(state).ok_or(DeviceError::InvalidTextureStageState(state))?;
        self.commit(State::TextureStage(stage, kind), |b| {
            b.set_texture_stage_state(stage, kind, value)
        });
        Ok(())
    }

    pub fn texture_stage_state(&self, stage: u32, state: u32) -> Result<u32, DeviceError> {
        let stage = self.validate_stage(stage)?;
        let kind =
            TextureStageState::from_raw(state).ok_or(DeviceError::InvalidTextureStageState(state))?;
        Ok(self.state.texture_stage_state(stage, kind))
    }

    pub fn set_sampler_state(
        &mut self,
        sampler: u32,
        state: u32,
        value: u32,
    ) -> Result<(), DeviceError> {
        let index = self.validate_sampler(sampler)?;
        let kind = SamplerState::from_raw(state).ok_or(DeviceError::InvalidSamplerState(state))?;
        self.commit(State::Sampler(index), |b| b.set_sampler_state(index, kind, value));
        Ok(())
    }

    pub fn sampler_state(&self, sampler: u32, state: u32) -> Result<u32, DeviceError> {
        let index = self.validate_sampler(sampler)?;
        let kind = SamplerState::from_raw(state).ok_or(DeviceError::InvalidSamplerState(state))?;
        Ok(self.state.sampler_state(index, kind))
    }

    pub fn set_texture(
        &mut self,
        sampler: u32,
        texture: Option<Arc<Texture>>,
    ) -> Result<(), DeviceError> {
        let index = self.validate_sampler(sampler)?;
        self.commit(State::Sampler(index), |b| b.set_texture(index, texture));
        Ok(())
    }

    pub fn texture(&self, sampler: u32) -> Result<Option<Arc<Texture>>, DeviceError> {
        let index = self.validate_sampler(sampler)?;
        Ok(self.state.texture(index).cloned())
    }

    pub fn set_transform(&mut self, state: u32, matrix: &Matrix) -> Result<(), DeviceError> {
        let transform = self.validate_transform(state)?;
        self.commit(State::Transform(transform), |b| b.set_transform(transform, matrix));
        Ok(())
    }

    pub fn transform(&self, state: u32) -> Result<Matrix, DeviceError> {
        let transform = self.validate_transform(state)?;
        Ok(*self.state.transform(transform))
    }

    pub fn set_material(&mut self, material: &Material) {
        self.commit(State::Synthetic(SyntheticState::Material), |b| {
            b.set_material(material)
        });
    }

    pub fn set_light(&mut self, index: u32, light: &Light) {
        self.commit(State::Synthetic(SyntheticState::Lights), |b| b.set_light(index, light));
    }

    pub fn light(&self, index: u32) -> Result<LightInfo, DeviceError> {
        self.state
            .light(index)
            .copied()
            .ok_or(DeviceError::InvalidLight(index))
    }

    /// Enabling an index that was never set installs the default light.
    pub fn light_enable(&mut self, index: u32, enable: bool) {
        let max = self.config.caps.max_active_lights;
        self.commit(State::Synthetic(SyntheticState::Lights), |b| {
            let changed = b.light_enable(index, enable);
            let active = b.enabled_lights().len();
            if enable && active > max {
                warn!(index, active, max, "more lights enabled than the device can apply");
            }
            changed
        });
    }

    pub fn set_clip_plane(&mut self, index: u32, plane: [f32; 4]) -> Result<(), DeviceError> {
        if index as usize >= self.config.caps.max_clip_planes {
            return Err(DeviceError::InvalidClipPlane(index));
        }
        let index = index as u8;
        self.commit(State::Synthetic(SyntheticState::ClipPlane(index)), |b| {
            b.set_clip_plane(index, plane)
        });
        Ok(())
    }

    pub fn clip_plane(&self, index: u32) -> Result<[f32; 4], DeviceError> {
        if index as usize >= self.config.caps.max_clip_planes {
            return Err(DeviceError::InvalidClipPlane(index));
        }
        Ok(self.state.clip_plane(index as u8))
    }

    pub fn set_stream_source(
        &mut self,
        stream: u32,
        buffer: Option<Arc<Buffer>>,
        offset: u32,
        stride: u32,
    ) -> Result<(), DeviceError> {
        let stream = self.validate_stream(stream)?;
        self.commit(State::Synthetic(SyntheticState::StreamSource), |b| {
            b.set_stream_source(stream, buffer, offset, stride)
        });
        Ok(())
    }

    pub fn set_stream_source_freq(&mut self, stream: u32, frequency: u32) -> Result<(), DeviceError> {
        let stream = self.validate_stream(stream)?;
        self.commit(State::Synthetic(SyntheticState::StreamFrequency), |b| {
            b.set_stream_frequency(stream, frequency)
        });
        Ok(())
    }

    pub fn set_indices(&mut self, indices: Option<Arc<Buffer>>) {
        self.commit(State::Synthetic(SyntheticState::Indices), |b| b.set_indices(indices));
    }

    pub fn set_vertex_declaration(&mut self, decl: Option<VertexDeclaration>) {
        self.commit(State::Synthetic(SyntheticState::VertexDecl), |b| {
            b.set_vertex_declaration(decl)
        });
    }

    pub fn set_vertex_shader(&mut self, shader: Option<ShaderHandle>) {
        self.commit(State::Synthetic(SyntheticState::VertexShader), |b| {
            b.set_vertex_shader(shader)
        });
    }

    pub fn set_pixel_shader(&mut self, shader: Option<ShaderHandle>) {
        self.commit(State::Synthetic(SyntheticState::PixelShader), |b| {
            b.set_pixel_shader(shader)
        });
    }

    pub fn set_vertex_shader_constant_f(
        &mut self,
        start: u32,
        values: &[[f32; 4]],
    ) -> Result<(), DeviceError> {
        let max = self.config.caps.max_vertex_shader_constants;
        let start = Self::validate_constants(start, values.len(), max)?;
        if let Some(recording) = self.recording.as_mut() {
            recording.set_vertex_shader_constants(start, values);
        } else if self.state.set_vertex_shader_constants(start, values) {
            self.mark_vertex_constants_dirty(start..start + values.len());
        }
        Ok(())
    }

    pub fn set_pixel_shader_constant_f(
        &mut self,
        start: u32,
        values: &[[f32; 4]],
    ) -> Result<(), DeviceError> {
        let max = self.config.caps.max_pixel_shader_constants;
        let start = Self::validate_constants(start, values.len(), max)?;
        if let Some(recording) = self.recording.as_mut() {
            recording.set_pixel_shader_constants(start, values);
        } else if self.state.set_pixel_shader_constants(start, values) {
            self.mark_pixel_constants_dirty(start..start + values.len());
        }
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.commit(State::Synthetic(SyntheticState::Viewport), |b| {
            b.set_viewport(viewport)
        });
    }

    pub fn set_scissor_rect(&mut self, rect: &Rect) {
        self.commit(State::Synthetic(SyntheticState::ScissorRect), |b| {
            b.set_scissor_rect(rect)
        });
    }

    /// Starts redirecting state writes into a new state block.
    pub fn begin_state_block(&mut self) -> Result<(), DeviceError> {
        if self.recording.is_some() {
            return Err(DeviceError::AlreadyRecording);
        }
        self.recording = Some(self.state.fork_for_recording());
        debug!("recording state block");
        Ok(())
    }

    pub fn end_state_block(&mut self) -> Result<StateBlock, DeviceError> {
        let block = self.recording.take().ok_or(DeviceError::NotRecording)?;
        debug!(states = block.changed().count(), "finished recording state block");
        Ok(block)
    }

    /// Replays the recorded values of `block` as if each setter were called again.
    pub fn apply_state_block(&mut self, block: &StateBlock) {
        for state in block.changed().iter() {
            match state {
                State::Render(rs) => {
                    self.commit(state, |b| b.set_render_state(rs, block.render_state(rs)));
                }
                State::TextureStage(stage, kind) => {
                    let value = block.texture_stage_state(stage, kind);
                    self.commit(state, |b| b.set_texture_stage_state(stage, kind, value));
                }
                State::Sampler(sampler) => {
                    for kind in block.changed_sampler_states(sampler) {
                        let value = block.sampler_state(sampler, kind);
                        self.commit(state, |b| b.set_sampler_state(sampler, kind, value));
                    }
                    if block.texture_changed(sampler) {
                        let texture = block.texture(sampler).cloned();
                        self.commit(state, |b| b.set_texture(sampler, texture));
                    }
                }
                State::Transform(transform) => {
                    let matrix = *block.transform(transform);
                    self.commit(state, |b| b.set_transform(transform, &matrix));
                }
                State::Synthetic(synthetic) => self.apply_recorded_synthetic(synthetic, block),
            }
        }
    }

    fn apply_recorded_synthetic(&mut self, synthetic: SyntheticState, block: &StateBlock) {
        let state = State::Synthetic(synthetic);
        match synthetic {
            SyntheticState::VertexDecl => self.set_vertex_declaration(block.vertex_declaration()),
            SyntheticState::VertexShader => self.set_vertex_shader(block.vertex_shader()),
            SyntheticState::PixelShader => self.set_pixel_shader(block.pixel_shader()),
            SyntheticState::Indices => self.set_indices(block.indices().cloned()),
            SyntheticState::StreamSource => {
                for stream in (0..MAX_STREAMS).filter(|&s| block.stream_source_changed(s)) {
                    let src = block.stream_source(stream).clone();
                    self.commit(state, |b| {
                        b.set_stream_source(stream, src.buffer, src.offset, src.stride)
                    });
                }
            }
            SyntheticState::StreamFrequency => {
                for stream in (0..MAX_STREAMS).filter(|&s| block.stream_frequency_changed(s)) {
                    let frequency = block.stream_source(stream).frequency;
                    self.commit(state, |b| b.set_stream_frequency(stream, frequency));
                }
            }
            SyntheticState::VertexShaderConstant => {
                for reg in block.changed_vertex_constants() {
                    let value = [block.vertex_shader_constants()[reg]];
                    if let Err(err) = self.set_vertex_shader_constant_f(reg as u32, &value) {
                        warn!(%err, "skipping recorded vertex shader constant");
                    }
                }
            }
            SyntheticState::PixelShaderConstant => {
                for reg in block.changed_pixel_constants() {
                    let value = [block.pixel_shader_constants()[reg]];
                    if let Err(err) = self.set_pixel_shader_constant_f(reg as u32, &value) {
                        warn!(%err, "skipping recorded pixel shader constant");
                    }
                }
            }
            SyntheticState::Viewport => self.set_viewport(block.viewport()),
            SyntheticState::ScissorRect => self.set_scissor_rect(block.scissor_rect()),
            SyntheticState::FrontFace => {}
            SyntheticState::Material => self.set_material(block.material()),
            SyntheticState::Lights => {
                for index in block.changed_lights() {
                    if let Some(info) = block.light(index).copied() {
                        self.set_light(index, &info.light);
                        self.light_enable(index, info.enabled);
                    }
                }
            }
            SyntheticState::ClipPlane(index) => {
                let plane = block.clip_plane(index);
                self.commit(state, |b| b.set_clip_plane(index, plane));
            }
        }
    }

    /// Refreshes the recorded values of `block` from the committed state.
    pub fn capture_state_block(&self, block: &mut StateBlock) {
        block.capture_from(&self.state);
    }
}
