//! Identity of every piece of device state that can go stale on a context.
//!
//! D3D9 splits its state into render states, per-stage texture states, per-sampler states and
//! transforms, and the engine adds a handful of synthetic states (vertex declaration, viewport,
//! ...). [`State`] is the single sum type over all of them. The dense [`State::index`] exists
//! only so bit masks can address states in O(1); nothing outside this module does offset
//! arithmetic.

use std::fmt;

pub const MAX_TEXTURE_STAGES: usize = 8;
pub const MAX_FRAGMENT_SAMPLERS: usize = 16;
pub const MAX_VERTEX_SAMPLERS: usize = 4;
pub const MAX_COMBINED_SAMPLERS: usize = MAX_FRAGMENT_SAMPLERS + MAX_VERTEX_SAMPLERS;
pub const MAX_WORLD_MATRICES: usize = 256;
pub const MAX_CLIP_PLANES: usize = 32;
pub const MAX_STREAMS: usize = 16;

/// D3D9 id of the first vertex texture sampler (`D3DVERTEXTEXTURESAMPLER0`).
pub const VERTEX_SAMPLER0: u32 = 257;

pub const RENDER_STATE_COUNT: usize = 210;
pub const TEXTURE_STAGE_STATE_COUNT: usize = 33;
pub const SAMPLER_STATE_COUNT: usize = 14;
pub const TRANSFORM_COUNT: usize = 2 + MAX_TEXTURE_STAGES + MAX_WORLD_MATRICES;
const SYNTHETIC_FIXED_COUNT: usize = 13;
pub const SYNTHETIC_COUNT: usize = SYNTHETIC_FIXED_COUNT + MAX_CLIP_PLANES;

const RENDER_BASE: usize = 0;
const TEXTURE_STAGE_BASE: usize = RENDER_BASE + RENDER_STATE_COUNT;
const SAMPLER_BASE: usize = TEXTURE_STAGE_BASE + MAX_TEXTURE_STAGES * TEXTURE_STAGE_STATE_COUNT;
const TRANSFORM_BASE: usize = SAMPLER_BASE + MAX_COMBINED_SAMPLERS;
const SYNTHETIC_BASE: usize = TRANSFORM_BASE + TRANSFORM_COUNT;

/// Number of distinct [`State`] values.
pub const STATE_COUNT: usize = SYNTHETIC_BASE + SYNTHETIC_COUNT;

/// A D3D9 render state id (`D3DRENDERSTATETYPE`).
///
/// Any value below [`RENDER_STATE_COUNT`] is a valid id, including the holes the D3D9 headers
/// leave undefined; those simply never get applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderState(u16);

impl RenderState {
    pub const TEXTUREHANDLE: Self = Self(1);
    pub const ANTIALIAS: Self = Self(2);
    pub const TEXTUREADDRESS: Self = Self(3);
    pub const TEXTUREPERSPECTIVE: Self = Self(4);
    pub const WRAPU: Self = Self(5);
    pub const WRAPV: Self = Self(6);
    pub const ZENABLE: Self = Self(7);
    pub const FILLMODE: Self = Self(8);
    pub const SHADEMODE: Self = Self(9);
    pub const LINEPATTERN: Self = Self(10);
    pub const MONOENABLE: Self = Self(11);
    pub const ROP2: Self = Self(12);
    pub const PLANEMASK: Self = Self(13);
    pub const ZWRITEENABLE: Self = Self(14);
    pub const ALPHATESTENABLE: Self = Self(15);
    pub const LASTPIXEL: Self = Self(16);
    pub const TEXTUREMAG: Self = Self(17);
    pub const TEXTUREMIN: Self = Self(18);
    pub const SRCBLEND: Self = Self(19);
    pub const DESTBLEND: Self = Self(20);
    pub const TEXTUREMAPBLEND: Self = Self(21);
    pub const CULLMODE: Self = Self(22);
    pub const ZFUNC: Self = Self(23);
    pub const ALPHAREF: Self = Self(24);
    pub const ALPHAFUNC: Self = Self(25);
    pub const DITHERENABLE: Self = Self(26);
    pub const ALPHABLENDENABLE: Self = Self(27);
    pub const FOGENABLE: Self = Self(28);
    pub const SPECULARENABLE: Self = Self(29);
    pub const ZVISIBLE: Self = Self(30);
    pub const SUBPIXEL: Self = Self(31);
    pub const SUBPIXELX: Self = Self(32);
    pub const STIPPLEDALPHA: Self = Self(33);
    pub const FOGCOLOR: Self = Self(34);
    pub const FOGTABLEMODE: Self = Self(35);
    pub const FOGSTART: Self = Self(36);
    pub const FOGEND: Self = Self(37);
    pub const FOGDENSITY: Self = Self(38);
    pub const STIPPLEENABLE: Self = Self(39);
    pub const EDGEANTIALIAS: Self = Self(40);
    pub const COLORKEYENABLE: Self = Self(41);
    pub const BORDERCOLOR: Self = Self(43);
    pub const TEXTUREADDRESSU: Self = Self(44);
    pub const TEXTUREADDRESSV: Self = Self(45);
    pub const MIPMAPLODBIAS: Self = Self(46);
    pub const ZBIAS: Self = Self(47);
    pub const RANGEFOGENABLE: Self = Self(48);
    pub const ANISOTROPY: Self = Self(49);
    pub const FLUSHBATCH: Self = Self(50);
    pub const TRANSLUCENTSORTINDEPENDENT: Self = Self(51);
    pub const STENCILENABLE: Self = Self(52);
    pub const STENCILFAIL: Self = Self(53);
    pub const STENCILZFAIL: Self = Self(54);
    pub const STENCILPASS: Self = Self(55);
    pub const STENCILFUNC: Self = Self(56);
    pub const STENCILREF: Self = Self(57);
    pub const STENCILMASK: Self = Self(58);
    pub const STENCILWRITEMASK: Self = Self(59);
    pub const TEXTUREFACTOR: Self = Self(60);
    /// `STIPPLEPATTERN00..=31` occupy 64..=95.
    pub const STIPPLEPATTERN00: Self = Self(64);
    pub const WRAP0: Self = Self(128);
    pub const WRAP1: Self = Self(129);
    pub const WRAP2: Self = Self(130);
    pub const WRAP3: Self = Self(131);
    pub const WRAP4: Self = Self(132);
    pub const WRAP5: Self = Self(133);
    pub const WRAP6: Self = Self(134);
    pub const WRAP7: Self = Self(135);
    pub const CLIPPING: Self = Self(136);
    pub const LIGHTING: Self = Self(137);
    pub const EXTENTS: Self = Self(138);
    pub const AMBIENT: Self = Self(139);
    pub const FOGVERTEXMODE: Self = Self(140);
    pub const COLORVERTEX: Self = Self(141);
    pub const LOCALVIEWER: Self = Self(142);
    pub const NORMALIZENORMALS: Self = Self(143);
    pub const COLORKEYBLENDENABLE: Self = Self(144);
    pub const DIFFUSEMATERIALSOURCE: Self = Self(145);
    pub const SPECULARMATERIALSOURCE: Self = Self(146);
    pub const AMBIENTMATERIALSOURCE: Self = Self(147);
    pub const EMISSIVEMATERIALSOURCE: Self = Self(148);
    pub const VERTEXBLEND: Self = Self(151);
    pub const CLIPPLANEENABLE: Self = Self(152);
    pub const SOFTWAREVERTEXPROCESSING: Self = Self(153);
    pub const POINTSIZE: Self = Self(154);
    pub const POINTSIZE_MIN: Self = Self(155);
    pub const POINTSPRITEENABLE: Self = Self(156);
    pub const POINTSCALEENABLE: Self = Self(157);
    pub const POINTSCALE_A: Self = Self(158);
    pub const POINTSCALE_B: Self = Self(159);
    pub const POINTSCALE_C: Self = Self(160);
    pub const MULTISAMPLEANTIALIAS: Self = Self(161);
    pub const MULTISAMPLEMASK: Self = Self(162);
    pub const PATCHEDGESTYLE: Self = Self(163);
    pub const PATCHSEGMENTS: Self = Self(164);
    pub const DEBUGMONITORTOKEN: Self = Self(165);
    pub const POINTSIZE_MAX: Self = Self(166);
    pub const INDEXEDVERTEXBLENDENABLE: Self = Self(167);
    pub const COLORWRITEENABLE: Self = Self(168);
    pub const TWEENFACTOR: Self = Self(170);
    pub const BLENDOP: Self = Self(171);
    pub const POSITIONDEGREE: Self = Self(172);
    pub const NORMALDEGREE: Self = Self(173);
    pub const SCISSORTESTENABLE: Self = Self(174);
    pub const SLOPESCALEDEPTHBIAS: Self = Self(175);
    pub const ANTIALIASEDLINEENABLE: Self = Self(176);
    pub const MINTESSELLATIONLEVEL: Self = Self(178);
    pub const MAXTESSELLATIONLEVEL: Self = Self(179);
    pub const ADAPTIVETESS_X: Self = Self(180);
    pub const ADAPTIVETESS_Y: Self = Self(181);
    pub const ADAPTIVETESS_Z: Self = Self(182);
    pub const ADAPTIVETESS_W: Self = Self(183);
    pub const ENABLEADAPTIVETESSELLATION: Self = Self(184);
    pub const TWOSIDEDSTENCILMODE: Self = Self(185);
    pub const CCW_STENCILFAIL: Self = Self(186);
    pub const CCW_STENCILZFAIL: Self = Self(187);
    pub const CCW_STENCILPASS: Self = Self(188);
    pub const CCW_STENCILFUNC: Self = Self(189);
    pub const COLORWRITEENABLE1: Self = Self(190);
    pub const COLORWRITEENABLE2: Self = Self(191);
    pub const COLORWRITEENABLE3: Self = Self(192);
    pub const BLENDFACTOR: Self = Self(193);
    pub const SRGBWRITEENABLE: Self = Self(194);
    pub const DEPTHBIAS: Self = Self(195);
    pub const WRAP8: Self = Self(198);
    pub const WRAP9: Self = Self(199);
    pub const WRAP10: Self = Self(200);
    pub const WRAP11: Self = Self(201);
    pub const WRAP12: Self = Self(202);
    pub const WRAP13: Self = Self(203);
    pub const WRAP14: Self = Self(204);
    pub const WRAP15: Self = Self(205);
    pub const SEPARATEALPHABLENDENABLE: Self = Self(206);
    pub const SRCBLENDALPHA: Self = Self(207);
    pub const DESTBLENDALPHA: Self = Self(208);
    pub const BLENDOPALPHA: Self = Self(209);

    pub const fn from_raw(raw: u32) -> Option<Self> {
        if (raw as usize) < RENDER_STATE_COUNT {
            Some(Self(raw as u16))
        } else {
            None
        }
    }

    pub const fn raw(self) -> u32 {
        self.0 as u32
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            1 => "TEXTUREHANDLE",
            2 => "ANTIALIAS",
            3 => "TEXTUREADDRESS",
            4 => "TEXTUREPERSPECTIVE",
            5 => "WRAPU",
            6 => "WRAPV",
            7 => "ZENABLE",
            8 => "FILLMODE",
            9 => "SHADEMODE",
            10 => "LINEPATTERN",
            11 => "MONOENABLE",
            12 => "ROP2",
            13 => "PLANEMASK",
            14 => "ZWRITEENABLE",
            15 => "ALPHATESTENABLE",
            16 => "LASTPIXEL",
            17 => "TEXTUREMAG",
            18 => "TEXTUREMIN",
            19 => "SRCBLEND",
            20 => "DESTBLEND",
            21 => "TEXTUREMAPBLEND",
            22 => "CULLMODE",
            23 => "ZFUNC",
            24 => "ALPHAREF",
            25 => "ALPHAFUNC",
            26 => "DITHERENABLE",
            27 => "ALPHABLENDENABLE",
            28 => "FOGENABLE",
            29 => "SPECULARENABLE",
            30 => "ZVISIBLE",
            31 => "SUBPIXEL",
            32 => "SUBPIXELX",
            33 => "STIPPLEDALPHA",
            34 => "FOGCOLOR",
            35 => "FOGTABLEMODE",
            36 => "FOGSTART",
            37 => "FOGEND",
            38 => "FOGDENSITY",
            39 => "STIPPLEENABLE",
            40 => "EDGEANTIALIAS",
            41 => "COLORKEYENABLE",
            43 => "BORDERCOLOR",
            44 => "TEXTUREADDRESSU",
            45 => "TEXTUREADDRESSV",
            46 => "MIPMAPLODBIAS",
            47 => "ZBIAS",
            48 => "RANGEFOGENABLE",
            49 => "ANISOTROPY",
            50 => "FLUSHBATCH",
            51 => "TRANSLUCENTSORTINDEPENDENT",
            52 => "STENCILENABLE",
            53 => "STENCILFAIL",
            54 => "STENCILZFAIL",
            55 => "STENCILPASS",
            56 => "STENCILFUNC",
            57 => "STENCILREF",
            58 => "STENCILMASK",
            59 => "STENCILWRITEMASK",
            60 => "TEXTUREFACTOR",
            64..=95 => "STIPPLEPATTERN",
            128..=135 | 198..=205 => "WRAP",
            136 => "CLIPPING",
            137 => "LIGHTING",
            138 => "EXTENTS",
            139 => "AMBIENT",
            140 => "FOGVERTEXMODE",
            141 => "COLORVERTEX",
            142 => "LOCALVIEWER",
            143 => "NORMALIZENORMALS",
            144 => "COLORKEYBLENDENABLE",
            145 => "DIFFUSEMATERIALSOURCE",
            146 => "SPECULARMATERIALSOURCE",
            147 => "AMBIENTMATERIALSOURCE",
            148 => "EMISSIVEMATERIALSOURCE",
            151 => "VERTEXBLEND",
            152 => "CLIPPLANEENABLE",
            153 => "SOFTWAREVERTEXPROCESSING",
            154 => "POINTSIZE",
            155 => "POINTSIZE_MIN",
            156 => "POINTSPRITEENABLE",
            157 => "POINTSCALEENABLE",
            158 => "POINTSCALE_A",
            159 => "POINTSCALE_B",
            160 => "POINTSCALE_C",
            161 => "MULTISAMPLEANTIALIAS",
            162 => "MULTISAMPLEMASK",
            163 => "PATCHEDGESTYLE",
            164 => "PATCHSEGMENTS",
            165 => "DEBUGMONITORTOKEN",
            166 => "POINTSIZE_MAX",
            167 => "INDEXEDVERTEXBLENDENABLE",
            168 => "COLORWRITEENABLE",
            170 => "TWEENFACTOR",
            171 => "BLENDOP",
            172 => "POSITIONDEGREE",
            173 => "NORMALDEGREE",
            174 => "SCISSORTESTENABLE",
            175 => "SLOPESCALEDEPTHBIAS",
            176 => "ANTIALIASEDLINEENABLE",
            178 => "MINTESSELLATIONLEVEL",
            179 => "MAXTESSELLATIONLEVEL",
            180 => "ADAPTIVETESS_X",
            181 => "ADAPTIVETESS_Y",
            182 => "ADAPTIVETESS_Z",
            183 => "ADAPTIVETESS_W",
            184 => "ENABLEADAPTIVETESSELLATION",
            185 => "TWOSIDEDSTENCILMODE",
            186 => "CCW_STENCILFAIL",
            187 => "CCW_STENCILZFAIL",
            188 => "CCW_STENCILPASS",
            189 => "CCW_STENCILFUNC",
            190..=192 => "COLORWRITEENABLE",
            193 => "BLENDFACTOR",
            194 => "SRGBWRITEENABLE",
            195 => "DEPTHBIAS",
            206 => "SEPARATEALPHABLENDENABLE",
            207 => "SRCBLENDALPHA",
            208 => "DESTBLENDALPHA",
            209 => "BLENDOPALPHA",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}({})", self.0),
            None => write!(f, "undefined({})", self.0),
        }
    }
}

/// A D3D9 texture stage state id (`D3DTEXTURESTAGESTATETYPE`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureStageState(u8);

impl TextureStageState {
    pub const COLOROP: Self = Self(1);
    pub const COLORARG1: Self = Self(2);
    pub const COLORARG2: Self = Self(3);
    pub const ALPHAOP: Self = Self(4);
    pub const ALPHAARG1: Self = Self(5);
    pub const ALPHAARG2: Self = Self(6);
    pub const BUMPENVMAT00: Self = Self(7);
    pub const BUMPENVMAT01: Self = Self(8);
    pub const BUMPENVMAT10: Self = Self(9);
    pub const BUMPENVMAT11: Self = Self(10);
    pub const TEXCOORDINDEX: Self = Self(11);
    // 12..=21 and 25 are the pre-D3D9 sampler states; D3D9 moved them to sampler state.
    pub const BUMPENVLSCALE: Self = Self(22);
    pub const BUMPENVLOFFSET: Self = Self(23);
    pub const TEXTURETRANSFORMFLAGS: Self = Self(24);
    pub const COLORARG0: Self = Self(26);
    pub const ALPHAARG0: Self = Self(27);
    pub const RESULTARG: Self = Self(28);
    pub const CONSTANT: Self = Self(32);

    pub const fn from_raw(raw: u32) -> Option<Self> {
        if (raw as usize) < TEXTURE_STAGE_STATE_COUNT {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    pub const fn raw(self) -> u32 {
        self.0 as u32
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TextureStageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            1 => "COLOROP",
            2 => "COLORARG1",
            3 => "COLORARG2",
            4 => "ALPHAOP",
            5 => "ALPHAARG1",
            6 => "ALPHAARG2",
            7..=10 => "BUMPENVMAT",
            11 => "TEXCOORDINDEX",
            22 => "BUMPENVLSCALE",
            23 => "BUMPENVLOFFSET",
            24 => "TEXTURETRANSFORMFLAGS",
            26 => "COLORARG0",
            27 => "ALPHAARG0",
            28 => "RESULTARG",
            32 => "CONSTANT",
            _ => "undefined",
        };
        write!(f, "{name}({})", self.0)
    }
}

/// A D3D9 sampler state id (`D3DSAMPLERSTATETYPE`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerState(u8);

impl SamplerState {
    pub const ADDRESSU: Self = Self(1);
    pub const ADDRESSV: Self = Self(2);
    pub const ADDRESSW: Self = Self(3);
    pub const BORDERCOLOR: Self = Self(4);
    pub const MAGFILTER: Self = Self(5);
    pub const MINFILTER: Self = Self(6);
    pub const MIPFILTER: Self = Self(7);
    pub const MIPMAPLODBIAS: Self = Self(8);
    pub const MAXMIPLEVEL: Self = Self(9);
    pub const MAXANISOTROPY: Self = Self(10);
    pub const SRGBTEXTURE: Self = Self(11);
    pub const ELEMENTINDEX: Self = Self(12);
    pub const DMAPOFFSET: Self = Self(13);

    /// Only the defined ids are accepted; 0 is not a sampler state.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        if raw >= 1 && (raw as usize) < SAMPLER_STATE_COUNT {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    pub const fn raw(self) -> u32 {
        self.0 as u32
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = SamplerState> {
        (1..SAMPLER_STATE_COUNT as u8).map(Self)
    }
}

/// Maps a D3D9 sampler index (`0..16` or `D3DVERTEXTEXTURESAMPLER0..=3`) onto the combined
/// sampler range used by the engine.
pub fn combined_sampler_index(raw: u32) -> Option<u8> {
    match raw {
        r if (r as usize) < MAX_FRAGMENT_SAMPLERS => Some(r as u8),
        r if (VERTEX_SAMPLER0..VERTEX_SAMPLER0 + MAX_VERTEX_SAMPLERS as u32).contains(&r) => {
            Some((r - VERTEX_SAMPLER0) as u8 + MAX_FRAGMENT_SAMPLERS as u8)
        }
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransformState {
    View,
    Projection,
    Texture(u8),
    World(u8),
}

impl TransformState {
    /// Decodes a `D3DTRANSFORMSTATETYPE` value.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            2 => Some(Self::View),
            3 => Some(Self::Projection),
            16..=23 => Some(Self::Texture((raw - 16) as u8)),
            256..=511 => Some(Self::World((raw - 256) as u8)),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::View => 2,
            Self::Projection => 3,
            Self::Texture(stage) => 16 + stage as u32,
            Self::World(index) => 256 + index as u32,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Self::View => 0,
            Self::Projection => 1,
            Self::Texture(stage) => 2 + stage as usize,
            Self::World(index) => 2 + MAX_TEXTURE_STAGES + index as usize,
        }
    }

    fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(Self::View),
            1 => Some(Self::Projection),
            s if s < 2 + MAX_TEXTURE_STAGES => Some(Self::Texture((s - 2) as u8)),
            s if s < TRANSFORM_COUNT => Some(Self::World((s - 2 - MAX_TEXTURE_STAGES) as u8)),
            _ => None,
        }
    }
}

impl fmt::Display for TransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => f.write_str("view"),
            Self::Projection => f.write_str("projection"),
            Self::Texture(stage) => write!(f, "texture{stage}"),
            Self::World(index) => write!(f, "world{index}"),
        }
    }
}

/// States with no D3D9 render-state id of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntheticState {
    VertexDecl,
    VertexShader,
    StreamSource,
    StreamFrequency,
    Indices,
    PixelShader,
    VertexShaderConstant,
    PixelShaderConstant,
    Viewport,
    ScissorRect,
    /// Winding depends on whether rendering is flipped for offscreen targets.
    FrontFace,
    Material,
    Lights,
    ClipPlane(u8),
}

impl SyntheticState {
    fn slot(self) -> usize {
        match self {
            Self::VertexDecl => 0,
            Self::VertexShader => 1,
            Self::StreamSource => 2,
            Self::StreamFrequency => 3,
            Self::Indices => 4,
            Self::PixelShader => 5,
            Self::VertexShaderConstant => 6,
            Self::PixelShaderConstant => 7,
            Self::Viewport => 8,
            Self::ScissorRect => 9,
            Self::FrontFace => 10,
            Self::Material => 11,
            Self::Lights => 12,
            Self::ClipPlane(index) => SYNTHETIC_FIXED_COUNT + index as usize,
        }
    }

    fn from_slot(slot: usize) -> Option<Self> {
        Some(match slot {
            0 => Self::VertexDecl,
            1 => Self::VertexShader,
            2 => Self::StreamSource,
            3 => Self::StreamFrequency,
            4 => Self::Indices,
            5 => Self::PixelShader,
            6 => Self::VertexShaderConstant,
            7 => Self::PixelShaderConstant,
            8 => Self::Viewport,
            9 => Self::ScissorRect,
            10 => Self::FrontFace,
            11 => Self::Material,
            12 => Self::Lights,
            s if s < SYNTHETIC_COUNT => Self::ClipPlane((s - SYNTHETIC_FIXED_COUNT) as u8),
            _ => return None,
        })
    }
}

impl fmt::Display for SyntheticState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VertexDecl => f.write_str("vdecl"),
            Self::VertexShader => f.write_str("vshader"),
            Self::StreamSource => f.write_str("streamsrc"),
            Self::StreamFrequency => f.write_str("streamfreq"),
            Self::Indices => f.write_str("indices"),
            Self::PixelShader => f.write_str("pshader"),
            Self::VertexShaderConstant => f.write_str("vshader_const"),
            Self::PixelShaderConstant => f.write_str("pshader_const"),
            Self::Viewport => f.write_str("viewport"),
            Self::ScissorRect => f.write_str("scissorrect"),
            Self::FrontFace => f.write_str("frontface"),
            Self::Material => f.write_str("material"),
            Self::Lights => f.write_str("lights"),
            Self::ClipPlane(index) => write!(f, "clipplane{index}"),
        }
    }
}

/// Any state that a context may have to re-apply.
///
/// Stage, sampler and clip-plane indices are meaningful only below the `MAX_*` constants of
/// this module. The device validates user input before building a `State`; anything else that
/// fails [`State::is_valid`] is never queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    Render(RenderState),
    TextureStage(u8, TextureStageState),
    /// One state per sampler unit, covering every sampler state and the bound texture.
    Sampler(u8),
    Transform(TransformState),
    Synthetic(SyntheticState),
}

impl State {
    pub const fn render(state: RenderState) -> Self {
        Self::Render(state)
    }

    pub const fn stage(stage: u8, state: TextureStageState) -> Self {
        Self::TextureStage(stage, state)
    }

    /// Whether every stage, sampler or plane index the state carries fits the engine's storage.
    ///
    /// The payloads are plain integers, so an out-of-range state can be built; it has no index
    /// and is never queued.
    pub fn is_valid(self) -> bool {
        match self {
            Self::TextureStage(stage, _) | Self::Transform(TransformState::Texture(stage)) => {
                (stage as usize) < MAX_TEXTURE_STAGES
            }
            Self::Sampler(sampler) => (sampler as usize) < MAX_COMBINED_SAMPLERS,
            Self::Synthetic(SyntheticState::ClipPlane(plane)) => (plane as usize) < MAX_CLIP_PLANES,
            Self::Render(_) | Self::Transform(_) | Self::Synthetic(_) => true,
        }
    }

    /// Dense index in `0..STATE_COUNT`, or `None` for a state that fails [`Self::is_valid`].
    pub fn index(self) -> Option<usize> {
        if !self.is_valid() {
            return None;
        }
        Some(match self {
            Self::Render(rs) => RENDER_BASE + rs.slot(),
            Self::TextureStage(stage, kind) => {
                TEXTURE_STAGE_BASE + stage as usize * TEXTURE_STAGE_STATE_COUNT + kind.slot()
            }
            Self::Sampler(sampler) => SAMPLER_BASE + sampler as usize,
            Self::Transform(transform) => TRANSFORM_BASE + transform.slot(),
            Self::Synthetic(synthetic) => SYNTHETIC_BASE + synthetic.slot(),
        })
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index < TEXTURE_STAGE_BASE {
            Some(Self::Render(RenderState((index - RENDER_BASE) as u16)))
        } else if index < SAMPLER_BASE {
            let rel = index - TEXTURE_STAGE_BASE;
            Some(Self::TextureStage(
                (rel / TEXTURE_STAGE_STATE_COUNT) as u8,
                TextureStageState((rel % TEXTURE_STAGE_STATE_COUNT) as u8),
            ))
        } else if index < TRANSFORM_BASE {
            Some(Self::Sampler((index - SAMPLER_BASE) as u8))
        } else if index < SYNTHETIC_BASE {
            TransformState::from_slot(index - TRANSFORM_BASE).map(Self::Transform)
        } else {
            SyntheticState::from_slot(index - SYNTHETIC_BASE).map(Self::Synthetic)
        }
    }

    /// Every state, in index order.
    pub fn all() -> impl Iterator<Item = State> {
        (0..STATE_COUNT).filter_map(Self::from_index)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(rs) => write!(f, "render {rs}"),
            Self::TextureStage(stage, kind) => write!(f, "stage {stage} {kind}"),
            Self::Sampler(sampler) => write!(f, "sampler {sampler}"),
            Self::Transform(transform) => write!(f, "transform {transform}"),
            Self::Synthetic(synthetic) => write!(f, "{synthetic}"),
        }
    }
}
