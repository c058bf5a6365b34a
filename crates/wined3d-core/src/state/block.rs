//! Value snapshot of all device state.
//!
//! A device owns one committed block. While a state block is being recorded a second block
//! receives the writes instead, and its change tracking says which values to replay later.
//! Setters report whether the stored value actually changed so the device can skip dirtying
//! contexts for redundant calls.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use hashbrown::{HashMap, HashSet};

use super::ids::{
    RenderState, SamplerState, State, SyntheticState, TextureStageState, TransformState,
    MAX_CLIP_PLANES, MAX_COMBINED_SAMPLERS, MAX_STREAMS, MAX_TEXTURE_STAGES, RENDER_STATE_COUNT,
    SAMPLER_STATE_COUNT, TEXTURE_STAGE_STATE_COUNT, TRANSFORM_COUNT,
};
use super::mask::{BitSet, StateMask};
use crate::resources::{Buffer, Texture};
use crate::runtime::config::DeviceCaps;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Matrix(pub [[f32; 4]; 4]);

impl Matrix {
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub power: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Viewport {
    /// Full-target viewport with the default depth range.
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
            min_z: 0.0,
            max_z: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightType {
    Point,
    Spot,
    Directional,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub ambient: [f32; 4],
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub range: f32,
    pub falloff: f32,
    pub attenuation: [f32; 3],
    pub theta: f32,
    pub phi: f32,
}

impl Default for Light {
    /// The light D3D9 substitutes when an unset index is enabled: white, directional, +z.
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            diffuse: [1.0, 1.0, 1.0, 0.0],
            specular: [0.0; 4],
            ambient: [0.0; 4],
            position: [0.0; 3],
            direction: [0.0, 0.0, 1.0],
            range: 0.0,
            falloff: 0.0,
            attenuation: [0.0; 3],
            theta: 0.0,
            phi: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightInfo {
    pub light: Light,
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexDeclaration(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

#[derive(Clone, Debug)]
pub struct StreamSource {
    pub buffer: Option<Arc<Buffer>>,
    pub offset: u32,
    pub stride: u32,
    pub frequency: u32,
}

impl Default for StreamSource {
    fn default() -> Self {
        Self {
            buffer: None,
            offset: 0,
            stride: 0,
            frequency: 1,
        }
    }
}

fn same_bits<T: Pod>(a: &T, b: &T) -> bool {
    bytemuck::bytes_of(a) == bytemuck::bytes_of(b)
}

fn same_arc<T>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

const TEXTURE_CHANGED_BIT: u16 = 1;

#[derive(Clone, Debug)]
pub struct StateBlock {
    render: Vec<u32>,
    texture_stages: [[u32; TEXTURE_STAGE_STATE_COUNT]; MAX_TEXTURE_STAGES],
    samplers: [[u32; SAMPLER_STATE_COUNT]; MAX_COMBINED_SAMPLERS],
    textures: [Option<Arc<Texture>>; MAX_COMBINED_SAMPLERS],
    transforms: Vec<Matrix>,
    material: Material,
    lights: HashMap<u32, LightInfo>,
    clip_planes: [[f32; 4]; MAX_CLIP_PLANES],
    streams: [StreamSource; MAX_STREAMS],
    indices: Option<Arc<Buffer>>,
    vertex_declaration: Option<VertexDeclaration>,
    vertex_shader: Option<ShaderHandle>,
    pixel_shader: Option<ShaderHandle>,
    vs_constants: Vec<[f32; 4]>,
    ps_constants: Vec<[f32; 4]>,
    viewport: Viewport,
    scissor_rect: Rect,

    // Change tracking, only meaningful for recorded blocks.
    changed: StateMask,
    /// Per sampler: bit `n` for sampler state `n`, bit 0 for the bound texture.
    changed_samplers: [u16; MAX_COMBINED_SAMPLERS],
    changed_lights: HashSet<u32>,
    changed_vs_constants: BitSet,
    changed_ps_constants: BitSet,
    /// Low half: stream sources, high half: stream frequencies.
    changed_streams: u32,
}

impl StateBlock {
    pub fn with_defaults(caps: &DeviceCaps) -> Self {
        let mut texture_stages = [[0; TEXTURE_STAGE_STATE_COUNT]; MAX_TEXTURE_STAGES];
        for (stage, states) in texture_stages.iter_mut().enumerate() {
            *states = default_texture_stage_states(stage);
        }

        Self {
            render: default_render_states(),
            texture_stages,
            samplers: [default_sampler_states(); MAX_COMBINED_SAMPLERS],
            textures: std::array::from_fn(|_| None),
            transforms: vec![Matrix::IDENTITY; TRANSFORM_COUNT],
            material: Material::default(),
            lights: HashMap::new(),
            clip_planes: [[0.0; 4]; MAX_CLIP_PLANES],
            streams: std::array::from_fn(|_| StreamSource::default()),
            indices: None,
            vertex_declaration: None,
            vertex_shader: None,
            pixel_shader: None,
            vs_constants: vec![[0.0; 4]; caps.max_vertex_shader_constants],
            ps_constants: vec![[0.0; 4]; caps.max_pixel_shader_constants],
            viewport: Viewport::default(),
            scissor_rect: Rect::default(),
            changed: StateMask::new(),
            changed_samplers: [0; MAX_COMBINED_SAMPLERS],
            changed_lights: HashSet::new(),
            changed_vs_constants: BitSet::new(caps.max_vertex_shader_constants),
            changed_ps_constants: BitSet::new(caps.max_pixel_shader_constants),
            changed_streams: 0,
        }
    }

    /// A copy of `self` with no recorded changes, used as a recording target.
    pub(crate) fn fork_for_recording(&self) -> Self {
        let mut block = self.clone();
        block.clear_changes();
        block
    }

    pub(crate) fn clear_changes(&mut self) {
        self.changed.clear();
        self.changed_samplers = [0; MAX_COMBINED_SAMPLERS];
        self.changed_lights.clear();
        self.changed_vs_constants.clear();
        self.changed_ps_constants.clear();
        self.changed_streams = 0;
    }

    pub fn render_state(&self, state: RenderState) -> u32 {
        self.render[state.slot()]
    }

    pub fn texture_stage_state(&self, stage: u8, state: TextureStageState) -> u32 {
        self.texture_stages[stage as usize][state.slot()]
    }

    pub fn sampler_state(&self, sampler: u8, state: SamplerState) -> u32 {
        self.samplers[sampler as usize][state.slot()]
    }

    pub fn texture(&self, sampler: u8) -> Option<&Arc<Texture>> {
        self.textures[sampler as usize].as_ref()
    }

    pub fn transform(&self, transform: TransformState) -> &Matrix {
        &self.transforms[transform.slot()]
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn light(&self, index: u32) -> Option<&LightInfo> {
        self.lights.get(&index)
    }

    /// Enabled lights in ascending index order.
    pub fn enabled_lights(&self) -> Vec<(u32, Light)> {
        let mut lights: Vec<_> = self
            .lights
            .iter()
            .filter(|(_, info)| info.enabled)
            .map(|(&index, info)| (index, info.light))
            .collect();
        lights.sort_by_key(|&(index, _)| index);
        lights
    }

    pub fn clip_plane(&self, index: u8) -> [f32; 4] {
        self.clip_planes[index as usize]
    }

    pub fn stream_source(&self, stream: usize) -> &StreamSource {
        &self.streams[stream]
    }

    pub fn indices(&self) -> Option<&Arc<Buffer>> {
        self.indices.as_ref()
    }

    pub fn vertex_declaration(&self) -> Option<VertexDeclaration> {
        self.vertex_declaration
    }

    pub fn vertex_shader(&self) -> Option<ShaderHandle> {
        self.vertex_shader
    }

    pub fn pixel_shader(&self) -> Option<ShaderHandle> {
        self.pixel_shader
    }

    pub fn vertex_shader_constants(&self) -> &[[f32; 4]] {
        &self.vs_constants
    }

    pub fn pixel_shader_constants(&self) -> &[[f32; 4]] {
        &self.ps_constants
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scissor_rect(&self) -> &Rect {
        &self.scissor_rect
    }

    /// States written while this block was the recording target.
    pub fn changed(&self) -> &StateMask {
        &self.changed
    }

    pub(crate) fn changed_sampler_states(&self, sampler: u8) -> impl Iterator<Item = SamplerState> {
        let bits = self.changed_samplers[sampler as usize];
        SamplerState::all().filter(move |s| bits & (1 << s.raw()) != 0)
    }

    pub(crate) fn texture_changed(&self, sampler: u8) -> bool {
        self.changed_samplers[sampler as usize] & TEXTURE_CHANGED_BIT != 0
    }

    pub(crate) fn changed_lights(&self) -> Vec<u32> {
        let mut lights: Vec<_> = self.changed_lights.iter().copied().collect();
        lights.sort_unstable();
        lights
    }

    pub(crate) fn changed_vertex_constants(&self) -> impl Iterator<Item = usize> + '_ {
        self.changed_vs_constants.iter()
    }

    pub(crate) fn changed_pixel_constants(&self) -> impl Iterator<Item = usize> + '_ {
        self.changed_ps_constants.iter()
    }

    pub(crate) fn stream_source_changed(&self, stream: usize) -> bool {
        self.changed_streams & (1 << stream) != 0
    }

    pub(crate) fn stream_frequency_changed(&self, stream: usize) -> bool {
        self.changed_streams & (1 << (stream + MAX_STREAMS)) != 0
    }

    pub(crate) fn set_render_state(&mut self, state: RenderState, value: u32) -> bool {
        self.changed.insert(State::Render(state));
        std::mem::replace(&mut self.render[state.slot()], value) != value
    }

    pub(crate) fn set_texture_stage_state(
        &mut self,
        stage: u8,
        state: TextureStageState,
        value: u32,
    ) -> bool {
        self.changed.insert(State::TextureStage(stage, state));
        let slot = &mut self.texture_stages[stage as usize][state.slot()];
        std::mem::replace(slot, value) != value
    }

    pub(crate) fn set_sampler_state(&mut self, sampler: u8, state: SamplerState, value: u32) -> bool {
        self.changed.insert(State::Sampler(sampler));
        self.changed_samplers[sampler as usize] |= 1 << state.raw();
        let slot = &mut self.samplers[sampler as usize][state.slot()];
        std::mem::replace(slot, value) != value
    }

    pub(crate) fn set_texture(&mut self, sampler: u8, texture: Option<Arc<Texture>>) -> bool {
        self.changed.insert(State::Sampler(sampler));
        self.changed_samplers[sampler as usize] |= TEXTURE_CHANGED_BIT;
        let slot = &mut self.textures[sampler as usize];
        let changed = !same_arc(slot.as_ref(), texture.as_ref());
        *slot = texture;
        changed
    }

    pub(crate) fn set_transform(&mut self, transform: TransformState, matrix: &Matrix) -> bool {
        self.changed.insert(State::Transform(transform));
        let slot = &mut self.transforms[transform.slot()];
        let changed = !same_bits(slot, matrix);
        *slot = *matrix;
        changed
    }

    pub(crate) fn set_material(&mut self, material: &Material) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::Material));
        let changed = !same_bits(&self.material, material);
        self.material = *material;
        changed
    }

    pub(crate) fn set_light(&mut self, index: u32, light: &Light) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::Lights));
        self.changed_lights.insert(index);
        let info = self.lights.entry(index).or_default();
        let changed = info.light != *light;
        info.light = *light;
        changed
    }

    /// Enabling an index that was never set installs the default light first.
    pub(crate) fn light_enable(&mut self, index: u32, enable: bool) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::Lights));
        self.changed_lights.insert(index);
        let info = self.lights.entry(index).or_default();
        std::mem::replace(&mut info.enabled, enable) != enable
    }

    pub(crate) fn set_clip_plane(&mut self, index: u8, plane: [f32; 4]) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::ClipPlane(index)));
        let slot = &mut self.clip_planes[index as usize];
        let changed = !same_bits(slot, &plane);
        *slot = plane;
        changed
    }

    pub(crate) fn set_stream_source(
        &mut self,
        stream: usize,
        buffer: Option<Arc<Buffer>>,
        offset: u32,
        stride: u32,
    ) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::StreamSource));
        self.changed_streams |= 1 << stream;
        let slot = &mut self.streams[stream];
        let changed =
            !same_arc(slot.buffer.as_ref(), buffer.as_ref()) || slot.offset != offset || slot.stride != stride;
        slot.buffer = buffer;
        slot.offset = offset;
        slot.stride = stride;
        changed
    }

    pub(crate) fn set_stream_frequency(&mut self, stream: usize, frequency: u32) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::StreamFrequency));
        self.changed_streams |= 1 << (stream + MAX_STREAMS);
        std::mem::replace(&mut self.streams[stream].frequency, frequency) != frequency
    }

    pub(crate) fn set_indices(&mut self, indices: Option<Arc<Buffer>>) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::Indices));
        let changed = !same_arc(self.indices.as_ref(), indices.as_ref());
        self.indices = indices;
        changed
    }

    pub(crate) fn set_vertex_declaration(&mut self, decl: Option<VertexDeclaration>) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::VertexDecl));
        std::mem::replace(&mut self.vertex_declaration, decl) != decl
    }

    pub(crate) fn set_vertex_shader(&mut self, shader: Option<ShaderHandle>) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::VertexShader));
        std::mem::replace(&mut self.vertex_shader, shader) != shader
    }

    pub(crate) fn set_pixel_shader(&mut self, shader: Option<ShaderHandle>) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::PixelShader));
        std::mem::replace(&mut self.pixel_shader, shader) != shader
    }

    /// The caller has checked that `start + values.len()` fits.
    pub(crate) fn set_vertex_shader_constants(&mut self, start: usize, values: &[[f32; 4]]) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::VertexShaderConstant));
        self.changed_vs_constants.insert_range(start..start + values.len());
        write_constants(&mut self.vs_constants[start..start + values.len()], values)
    }

    pub(crate) fn set_pixel_shader_constants(&mut self, start: usize, values: &[[f32; 4]]) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::PixelShaderConstant));
        self.changed_ps_constants.insert_range(start..start + values.len());
        write_constants(&mut self.ps_constants[start..start + values.len()], values)
    }

    pub(crate) fn set_viewport(&mut self, viewport: &Viewport) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::Viewport));
        let changed = !same_bits(&self.viewport, viewport);
        self.viewport = *viewport;
        changed
    }

    pub(crate) fn set_scissor_rect(&mut self, rect: &Rect) -> bool {
        self.changed.insert(State::Synthetic(SyntheticState::ScissorRect));
        std::mem::replace(&mut self.scissor_rect, *rect) != *rect
    }

    /// Refreshes every recorded value from `committed`, keeping the change tracking.
    pub(crate) fn capture_from(&mut self, committed: &StateBlock) {
        for state in self.changed.iter().collect::<Vec<_>>() {
            match state {
                State::Render(rs) => self.render[rs.slot()] = committed.render[rs.slot()],
                State::TextureStage(stage, kind) => {
                    self.texture_stages[stage as usize][kind.slot()] =
                        committed.texture_stages[stage as usize][kind.slot()];
                }
                State::Sampler(sampler) => {
                    let s = sampler as usize;
                    for kind in self.changed_sampler_states(sampler).collect::<Vec<_>>() {
                        self.samplers[s][kind.slot()] = committed.samplers[s][kind.slot()];
                    }
                    if self.texture_changed(sampler) {
                        self.textures[s] = committed.textures[s].clone();
                    }
                }
                State::Transform(transform) => {
                    self.transforms[transform.slot()] = committed.transforms[transform.slot()];
                }
                State::Synthetic(synthetic) => self.capture_synthetic(synthetic, committed),
            }
        }
    }

    fn capture_synthetic(&mut self, synthetic: SyntheticState, committed: &StateBlock) {
        match synthetic {
            SyntheticState::VertexDecl => self.vertex_declaration = committed.vertex_declaration,
            SyntheticState::VertexShader => self.vertex_shader = committed.vertex_shader,
            SyntheticState::PixelShader => self.pixel_shader = committed.pixel_shader,
            SyntheticState::StreamSource | SyntheticState::StreamFrequency => {
                for stream in 0..MAX_STREAMS {
                    if self.stream_source_changed(stream) {
                        let src = &committed.streams[stream];
                        self.streams[stream].buffer = src.buffer.clone();
                        self.streams[stream].offset = src.offset;
                        self.streams[stream].stride = src.stride;
                    }
                    if self.stream_frequency_changed(stream) {
                        self.streams[stream].frequency = committed.streams[stream].frequency;
                    }
                }
            }
            SyntheticState::Indices => self.indices = committed.indices.clone(),
            SyntheticState::VertexShaderConstant => {
                for reg in self.changed_vs_constants.iter().collect::<Vec<_>>() {
                    self.vs_constants[reg] = committed.vs_constants[reg];
                }
            }
            SyntheticState::PixelShaderConstant => {
                for reg in self.changed_ps_constants.iter().collect::<Vec<_>>() {
                    self.ps_constants[reg] = committed.ps_constants[reg];
                }
            }
            SyntheticState::Viewport => self.viewport = committed.viewport,
            SyntheticState::ScissorRect => self.scissor_rect = committed.scissor_rect,
            SyntheticState::FrontFace => {}
            SyntheticState::Material => self.material = committed.material,
            SyntheticState::Lights => {
                for index in self.changed_lights() {
                    match committed.lights.get(&index) {
                        Some(info) => {
                            self.lights.insert(index, *info);
                        }
                        None => {
                            self.lights.remove(&index);
                        }
                    }
                }
            }
            SyntheticState::ClipPlane(index) => {
                self.clip_planes[index as usize] = committed.clip_planes[index as usize];
            }
        }
    }
}

fn write_constants(dst: &mut [[f32; 4]], values: &[[f32; 4]]) -> bool {
    let changed = bytemuck::cast_slice::<_, u8>(&*dst) != bytemuck::cast_slice::<_, u8>(values);
    dst.copy_from_slice(values);
    changed
}

mod defaults {
    pub const TRUE: u32 = 1;
    pub const FILL_SOLID: u32 = 3;
    pub const SHADE_GOURAUD: u32 = 2;
    pub const BLEND_ZERO: u32 = 1;
    pub const BLEND_ONE: u32 = 2;
    pub const CULL_CCW: u32 = 3;
    pub const CMP_LESSEQUAL: u32 = 4;
    pub const CMP_ALWAYS: u32 = 8;
    pub const STENCILOP_KEEP: u32 = 1;
    pub const MCS_COLOR1: u32 = 1;
    pub const MCS_COLOR2: u32 = 2;
    pub const DEGREE_LINEAR: u32 = 1;
    pub const DEGREE_CUBIC: u32 = 3;
    pub const BLENDOP_ADD: u32 = 1;

    pub const TOP_DISABLE: u32 = 1;
    pub const TOP_SELECTARG1: u32 = 2;
    pub const TOP_MODULATE: u32 = 4;
    pub const TA_CURRENT: u32 = 1;
    pub const TA_TEXTURE: u32 = 2;

    pub const TADDRESS_WRAP: u32 = 1;
    pub const TEXF_POINT: u32 = 1;
}

fn default_render_states() -> Vec<u32> {
    use defaults::*;
    use RenderState as R;

    let one = 1.0f32.to_bits();
    let mut rs = vec![0u32; RENDER_STATE_COUNT];
    let mut set = |state: RenderState, value: u32| rs[state.slot()] = value;

    set(R::ZENABLE, TRUE);
    set(R::FILLMODE, FILL_SOLID);
    set(R::SHADEMODE, SHADE_GOURAUD);
    set(R::ZWRITEENABLE, TRUE);
    set(R::LASTPIXEL, TRUE);
    set(R::SRCBLEND, BLEND_ONE);
    set(R::DESTBLEND, BLEND_ZERO);
    set(R::CULLMODE, CULL_CCW);
    set(R::ZFUNC, CMP_LESSEQUAL);
    set(R::ALPHAFUNC, CMP_ALWAYS);
    set(R::FOGEND, one);
    set(R::FOGDENSITY, one);
    set(R::STENCILFAIL, STENCILOP_KEEP);
    set(R::STENCILZFAIL, STENCILOP_KEEP);
    set(R::STENCILPASS, STENCILOP_KEEP);
    set(R::STENCILFUNC, CMP_ALWAYS);
    set(R::STENCILMASK, u32::MAX);
    set(R::STENCILWRITEMASK, u32::MAX);
    set(R::TEXTUREFACTOR, u32::MAX);
    set(R::CLIPPING, TRUE);
    set(R::LIGHTING, TRUE);
    set(R::COLORVERTEX, TRUE);
    set(R::LOCALVIEWER, TRUE);
    set(R::DIFFUSEMATERIALSOURCE, MCS_COLOR1);
    set(R::SPECULARMATERIALSOURCE, MCS_COLOR2);
    set(R::POINTSIZE, one);
    set(R::POINTSIZE_MIN, one);
    set(R::POINTSCALE_A, one);
    set(R::MULTISAMPLEANTIALIAS, TRUE);
    set(R::MULTISAMPLEMASK, u32::MAX);
    set(R::PATCHSEGMENTS, one);
    set(R::DEBUGMONITORTOKEN, 0xbaad_cafe);
    set(R::POINTSIZE_MAX, 64.0f32.to_bits());
    set(R::COLORWRITEENABLE, 0xf);
    set(R::COLORWRITEENABLE1, 0xf);
    set(R::COLORWRITEENABLE2, 0xf);
    set(R::COLORWRITEENABLE3, 0xf);
    set(R::BLENDOP, BLENDOP_ADD);
    set(R::POSITIONDEGREE, DEGREE_CUBIC);
    set(R::NORMALDEGREE, DEGREE_LINEAR);
    set(R::MINTESSELLATIONLEVEL, one);
    set(R::MAXTESSELLATIONLEVEL, one);
    set(R::ADAPTIVETESS_Z, one);
    set(R::CCW_STENCILFAIL, STENCILOP_KEEP);
    set(R::CCW_STENCILZFAIL, STENCILOP_KEEP);
    set(R::CCW_STENCILPASS, STENCILOP_KEEP);
    set(R::CCW_STENCILFUNC, CMP_ALWAYS);
    set(R::BLENDFACTOR, u32::MAX);
    set(R::SRCBLENDALPHA, BLEND_ONE);
    set(R::DESTBLENDALPHA, BLEND_ZERO);
    set(R::BLENDOPALPHA, BLENDOP_ADD);
    rs
}

fn default_texture_stage_states(stage: usize) -> [u32; TEXTURE_STAGE_STATE_COUNT] {
    use defaults::*;
    use TextureStageState as T;

    let mut ts = [0u32; TEXTURE_STAGE_STATE_COUNT];
    let first = stage == 0;
    ts[T::COLOROP.slot()] = if first { TOP_MODULATE } else { TOP_DISABLE };
    ts[T::COLORARG1.slot()] = TA_TEXTURE;
    ts[T::COLORARG2.slot()] = TA_CURRENT;
    ts[T::ALPHAOP.slot()] = if first { TOP_SELECTARG1 } else { TOP_DISABLE };
    ts[T::ALPHAARG1.slot()] = TA_TEXTURE;
    ts[T::ALPHAARG2.slot()] = TA_CURRENT;
    ts[T::TEXCOORDINDEX.slot()] = stage as u32;
    ts[T::COLORARG0.slot()] = TA_CURRENT;
    ts[T::ALPHAARG0.slot()] = TA_CURRENT;
    ts[T::RESULTARG.slot()] = TA_CURRENT;
    ts
}

fn default_sampler_states() -> [u32; SAMPLER_STATE_COUNT] {
    use defaults::*;
    use SamplerState as S;

    let mut ss = [0u32; SAMPLER_STATE_COUNT];
    ss[S::ADDRESSU.slot()] = TADDRESS_WRAP;
    ss[S::ADDRESSV.slot()] = TADDRESS_WRAP;
    ss[S::ADDRESSW.slot()] = TADDRESS_WRAP;
    ss[S::MAGFILTER.slot()] = TEXF_POINT;
    ss[S::MINFILTER.slot()] = TEXF_POINT;
    ss[S::MAXANISOTROPY.slot()] = 1;
    ss
}
