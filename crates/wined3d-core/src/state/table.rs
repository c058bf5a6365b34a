//! The state table: which representative a state is dirtied through, and which leaf applies it.
//!
//! States that are consumed together share a representative, so dirtying any of them queues the
//! representative once and its leaf reads every grouped value from the [`StateBlock`].
//!
//! [`StateBlock`]: super::block::StateBlock

use super::ids::{RenderState, State, SyntheticState, TextureStageState, TransformState};

/// The leaf that realises a representative on the native context.
///
/// `NoGl` and `Undefined` never reach the [`StateApplier`]: the former has no native
/// counterpart, the latter is a state the engine does not implement yet.
///
/// [`StateApplier`]: crate::runtime::backend::StateApplier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApplyFn {
    NoGl,
    Undefined,

    Antialias,
    Perspective,
    WrapU,
    WrapV,
    ZEnable,
    FillMode,
    ShadeMode,
    LinePattern,
    MonoEnable,
    Rop2,
    PlaneMask,
    ZWriteEnable,
    AlphaTest,
    LastPixel,
    Blend,
    CullMode,
    ZFunc,
    DitherEnable,
    Fog,
    SpecularEnable,
    Subpixel,
    SubpixelX,
    StippledAlpha,
    FogColor,
    FogDensity,
    StippleEnable,
    BorderColor,
    MipmapLodBias,
    ZBias,
    Anisotropy,
    FlushBatch,
    TranslucentSortIndependent,
    Stencil,
    StencilWrite,
    TextureFactor,
    Wrap,
    Clipping,
    Lighting,
    Extents,
    Ambient,
    ColorMaterial,
    LocalViewer,
    NormalizeNormals,
    ColorKeyBlend,
    PointSize,
    PointSizeMin,
    PointSizeMax,
    PointSprite,
    PointScale,
    MultisampleAntialias,
    MultisampleMask,
    PatchEdgeStyle,
    PatchSegments,
    ColorWrite,
    BlendOp,
    PositionDegree,
    NormalDegree,
    Scissor,
    DepthBias,
    Tessellation,
    SrgbWrite,
    SeparateBlend,

    ColorOp,
    AlphaOp,
    TexCoordIndex,
    BumpEnvLScale,
    BumpEnvLOffset,
    TextureTransform,

    Sampler,

    View,
    Projection,
    World,
    WorldMatrixPalette,

    VertexDecl,
    Indices,
    PixelShader,
    VertexShaderConstants,
    PixelShaderConstants,
    Viewport,
    ScissorRect,
    FrontFace,
    Material,
    Lights,
    ClipPlane,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateEntry {
    /// `None` means the state never needs applying and is never queued.
    pub representative: Option<State>,
    pub apply: ApplyFn,
}

impl StateEntry {
    const fn unqueued(apply: ApplyFn) -> Self {
        Self {
            representative: None,
            apply,
        }
    }

    const fn through(representative: State, apply: ApplyFn) -> Self {
        Self {
            representative: Some(representative),
            apply,
        }
    }
}

pub fn entry(state: State) -> StateEntry {
    if !state.is_valid() {
        return StateEntry::unqueued(ApplyFn::Undefined);
    }
    match state {
        State::Render(rs) => render_entry(rs),
        State::TextureStage(stage, kind) => stage_entry(stage, kind),
        State::Sampler(sampler) => StateEntry::through(State::Sampler(sampler), ApplyFn::Sampler),
        State::Transform(transform) => transform_entry(transform),
        State::Synthetic(synthetic) => synthetic_entry(synthetic),
    }
}

/// Representative of `state`, or `None` for the never-applied sentinel.
pub fn representative(state: State) -> Option<State> {
    entry(state).representative
}

fn render_entry(rs: RenderState) -> StateEntry {
    use RenderState as R;

    let (representative, apply) = match rs {
        R::ANTIALIAS => (R::ANTIALIAS, ApplyFn::Antialias),
        R::TEXTUREPERSPECTIVE => (R::TEXTUREPERSPECTIVE, ApplyFn::Perspective),
        R::WRAPU => (R::WRAPU, ApplyFn::WrapU),
        R::WRAPV => (R::WRAPV, ApplyFn::WrapV),
        R::ZENABLE => (R::ZENABLE, ApplyFn::ZEnable),
        R::FILLMODE => (R::FILLMODE, ApplyFn::FillMode),
        R::SHADEMODE => (R::SHADEMODE, ApplyFn::ShadeMode),
        R::LINEPATTERN => (R::LINEPATTERN, ApplyFn::LinePattern),
        R::MONOENABLE => (R::MONOENABLE, ApplyFn::MonoEnable),
        R::ROP2 => (R::ROP2, ApplyFn::Rop2),
        R::PLANEMASK => (R::PLANEMASK, ApplyFn::PlaneMask),
        R::ZWRITEENABLE => (R::ZWRITEENABLE, ApplyFn::ZWriteEnable),
        R::ALPHATESTENABLE | R::ALPHAREF | R::ALPHAFUNC | R::COLORKEYENABLE => {
            (R::ALPHATESTENABLE, ApplyFn::AlphaTest)
        }
        R::LASTPIXEL => (R::LASTPIXEL, ApplyFn::LastPixel),
        R::ALPHABLENDENABLE
        | R::SRCBLEND
        | R::DESTBLEND
        | R::EDGEANTIALIAS
        | R::ANTIALIASEDLINEENABLE
        | R::BLENDFACTOR => (R::ALPHABLENDENABLE, ApplyFn::Blend),
        R::CULLMODE => (R::CULLMODE, ApplyFn::CullMode),
        R::ZFUNC => (R::ZFUNC, ApplyFn::ZFunc),
        R::DITHERENABLE => (R::DITHERENABLE, ApplyFn::DitherEnable),
        R::FOGENABLE | R::FOGTABLEMODE | R::FOGSTART | R::FOGEND | R::FOGVERTEXMODE => {
            (R::FOGENABLE, ApplyFn::Fog)
        }
        R::SPECULARENABLE => (R::SPECULARENABLE, ApplyFn::SpecularEnable),
        R::SUBPIXEL => (R::SUBPIXEL, ApplyFn::Subpixel),
        R::SUBPIXELX => (R::SUBPIXELX, ApplyFn::SubpixelX),
        R::STIPPLEDALPHA => (R::STIPPLEDALPHA, ApplyFn::StippledAlpha),
        R::FOGCOLOR => (R::FOGCOLOR, ApplyFn::FogColor),
        R::FOGDENSITY => (R::FOGDENSITY, ApplyFn::FogDensity),
        R::STIPPLEENABLE => (R::STIPPLEENABLE, ApplyFn::StippleEnable),
        R::BORDERCOLOR => (R::BORDERCOLOR, ApplyFn::BorderColor),
        R::MIPMAPLODBIAS => (R::MIPMAPLODBIAS, ApplyFn::MipmapLodBias),
        R::ZBIAS => (R::ZBIAS, ApplyFn::ZBias),
        R::ANISOTROPY => (R::ANISOTROPY, ApplyFn::Anisotropy),
        R::FLUSHBATCH => (R::FLUSHBATCH, ApplyFn::FlushBatch),
        R::TRANSLUCENTSORTINDEPENDENT => {
            (R::TRANSLUCENTSORTINDEPENDENT, ApplyFn::TranslucentSortIndependent)
        }
        R::STENCILENABLE
        | R::STENCILFAIL
        | R::STENCILZFAIL
        | R::STENCILPASS
        | R::STENCILFUNC
        | R::STENCILREF
        | R::STENCILMASK
        | R::TWOSIDEDSTENCILMODE
        | R::CCW_STENCILFAIL
        | R::CCW_STENCILZFAIL
        | R::CCW_STENCILPASS
        | R::CCW_STENCILFUNC => (R::STENCILENABLE, ApplyFn::Stencil),
        R::STENCILWRITEMASK => (R::STENCILWRITEMASK, ApplyFn::StencilWrite),
        R::TEXTUREFACTOR => (R::TEXTUREFACTOR, ApplyFn::TextureFactor),
        R::CLIPPING | R::CLIPPLANEENABLE => (R::CLIPPING, ApplyFn::Clipping),
        R::LIGHTING => (R::LIGHTING, ApplyFn::Lighting),
        R::EXTENTS => (R::EXTENTS, ApplyFn::Extents),
        R::AMBIENT => (R::AMBIENT, ApplyFn::Ambient),
        R::COLORVERTEX
        | R::DIFFUSEMATERIALSOURCE
        | R::SPECULARMATERIALSOURCE
        | R::AMBIENTMATERIALSOURCE
        | R::EMISSIVEMATERIALSOURCE => (R::COLORVERTEX, ApplyFn::ColorMaterial),
        R::LOCALVIEWER => (R::LOCALVIEWER, ApplyFn::LocalViewer),
        R::NORMALIZENORMALS => (R::NORMALIZENORMALS, ApplyFn::NormalizeNormals),
        R::COLORKEYBLENDENABLE => (R::COLORKEYBLENDENABLE, ApplyFn::ColorKeyBlend),
        R::POINTSIZE => (R::POINTSIZE, ApplyFn::PointSize),
        R::POINTSIZE_MIN => (R::POINTSIZE_MIN, ApplyFn::PointSizeMin),
        R::POINTSIZE_MAX => (R::POINTSIZE_MAX, ApplyFn::PointSizeMax),
        R::POINTSPRITEENABLE => (R::POINTSPRITEENABLE, ApplyFn::PointSprite),
        R::POINTSCALEENABLE | R::POINTSCALE_A | R::POINTSCALE_B | R::POINTSCALE_C => {
            (R::POINTSCALEENABLE, ApplyFn::PointScale)
        }
        R::MULTISAMPLEANTIALIAS => (R::MULTISAMPLEANTIALIAS, ApplyFn::MultisampleAntialias),
        R::MULTISAMPLEMASK => (R::MULTISAMPLEMASK, ApplyFn::MultisampleMask),
        R::PATCHEDGESTYLE => (R::PATCHEDGESTYLE, ApplyFn::PatchEdgeStyle),
        R::PATCHSEGMENTS => (R::PATCHSEGMENTS, ApplyFn::PatchSegments),
        // Queued so that debug builds of applications see it consumed, but nothing to apply.
        R::DEBUGMONITORTOKEN => (R::DEBUGMONITORTOKEN, ApplyFn::NoGl),
        R::COLORWRITEENABLE
        | R::COLORWRITEENABLE1
        | R::COLORWRITEENABLE2
        | R::COLORWRITEENABLE3 => (R::COLORWRITEENABLE, ApplyFn::ColorWrite),
        R::BLENDOP => (R::BLENDOP, ApplyFn::BlendOp),
        R::POSITIONDEGREE => (R::POSITIONDEGREE, ApplyFn::PositionDegree),
        R::NORMALDEGREE => (R::NORMALDEGREE, ApplyFn::NormalDegree),
        R::SCISSORTESTENABLE => (R::SCISSORTESTENABLE, ApplyFn::Scissor),
        R::SLOPESCALEDEPTHBIAS | R::DEPTHBIAS => (R::DEPTHBIAS, ApplyFn::DepthBias),
        R::MINTESSELLATIONLEVEL
        | R::MAXTESSELLATIONLEVEL
        | R::ADAPTIVETESS_X
        | R::ADAPTIVETESS_Y
        | R::ADAPTIVETESS_Z
        | R::ADAPTIVETESS_W
        | R::ENABLEADAPTIVETESSELLATION => (R::ENABLEADAPTIVETESSELLATION, ApplyFn::Tessellation),
        R::SRGBWRITEENABLE => (R::SRGBWRITEENABLE, ApplyFn::SrgbWrite),
        R::SEPARATEALPHABLENDENABLE | R::SRCBLENDALPHA | R::DESTBLENDALPHA | R::BLENDOPALPHA => {
            (R::SEPARATEALPHABLENDENABLE, ApplyFn::SeparateBlend)
        }
        R::ZVISIBLE
        | R::RANGEFOGENABLE
        | R::VERTEXBLEND
        | R::SOFTWAREVERTEXPROCESSING
        | R::INDEXEDVERTEXBLENDENABLE
        | R::TWEENFACTOR => return StateEntry::unqueued(ApplyFn::NoGl),
        _ if is_wrap(rs) => (R::WRAP0, ApplyFn::Wrap),
        // Ids handled before the device (ddraw-era texture handles), stipple patterns and holes.
        _ => return StateEntry::unqueued(ApplyFn::Undefined),
    };
    StateEntry::through(State::Render(representative), apply)
}

fn is_wrap(rs: RenderState) -> bool {
    (RenderState::WRAP0..=RenderState::WRAP7).contains(&rs)
        || (RenderState::WRAP8..=RenderState::WRAP15).contains(&rs)
}

fn stage_entry(stage: u8, kind: TextureStageState) -> StateEntry {
    use TextureStageState as T;

    let (representative, apply) = match kind {
        T::COLOROP
        | T::COLORARG1
        | T::COLORARG2
        | T::COLORARG0
        | T::BUMPENVMAT00
        | T::BUMPENVMAT01
        | T::BUMPENVMAT10
        | T::BUMPENVMAT11 => (T::COLOROP, ApplyFn::ColorOp),
        T::ALPHAOP | T::ALPHAARG1 | T::ALPHAARG2 | T::ALPHAARG0 => (T::ALPHAOP, ApplyFn::AlphaOp),
        T::TEXCOORDINDEX => (T::TEXCOORDINDEX, ApplyFn::TexCoordIndex),
        T::BUMPENVLSCALE => (T::BUMPENVLSCALE, ApplyFn::BumpEnvLScale),
        T::BUMPENVLOFFSET => (T::BUMPENVLOFFSET, ApplyFn::BumpEnvLOffset),
        T::TEXTURETRANSFORMFLAGS => (T::TEXTURETRANSFORMFLAGS, ApplyFn::TextureTransform),
        // Queued but not implemented; applying them logs and moves on.
        T::RESULTARG | T::CONSTANT => (kind, ApplyFn::Undefined),
        _ => return StateEntry::unqueued(ApplyFn::Undefined),
    };
    StateEntry::through(State::TextureStage(stage, representative), apply)
}

fn transform_entry(transform: TransformState) -> StateEntry {
    match transform {
        TransformState::View => StateEntry::through(State::Transform(transform), ApplyFn::View),
        TransformState::Projection => {
            StateEntry::through(State::Transform(transform), ApplyFn::Projection)
        }
        TransformState::Texture(stage) => StateEntry::through(
            State::TextureStage(stage, TextureStageState::TEXTURETRANSFORMFLAGS),
            ApplyFn::TextureTransform,
        ),
        TransformState::World(0) => StateEntry::through(State::Transform(transform), ApplyFn::World),
        TransformState::World(_) => {
            StateEntry::through(State::Transform(transform), ApplyFn::WorldMatrixPalette)
        }
    }
}

fn synthetic_entry(synthetic: SyntheticState) -> StateEntry {
    use SyntheticState as S;

    let (representative, apply) = match synthetic {
        S::VertexDecl | S::VertexShader | S::StreamSource | S::StreamFrequency => {
            (S::VertexDecl, ApplyFn::VertexDecl)
        }
        S::Indices => (S::Indices, ApplyFn::Indices),
        S::PixelShader => (S::PixelShader, ApplyFn::PixelShader),
        S::VertexShaderConstant => (S::VertexShaderConstant, ApplyFn::VertexShaderConstants),
        S::PixelShaderConstant => (S::PixelShaderConstant, ApplyFn::PixelShaderConstants),
        S::Viewport => (S::Viewport, ApplyFn::Viewport),
        S::ScissorRect => (S::ScissorRect, ApplyFn::ScissorRect),
        S::FrontFace => (S::FrontFace, ApplyFn::FrontFace),
        S::Material => (S::Material, ApplyFn::Material),
        S::Lights => (S::Lights, ApplyFn::Lights),
        S::ClipPlane(_) => (synthetic, ApplyFn::ClipPlane),
    };
    StateEntry::through(State::Synthetic(representative), apply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ids::STATE_COUNT;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn representatives_are_their_own_representative() {
        for state in State::all() {
            if let Some(rep) = representative(state) {
                assert_eq!(representative(rep), Some(rep), "{state}");
            }
        }
    }

    #[test]
    fn grouped_states_share_the_apply_leaf() {
        for state in State::all() {
            let e = entry(state);
            if let Some(rep) = e.representative {
                assert_eq!(entry(rep).apply, e.apply, "{state} -> {rep}");
            }
        }
    }

    #[test]
    fn sentinel_covers_the_zero_state_and_holes() {
        let zero = State::from_index(0).unwrap();
        assert_eq!(representative(zero), None);
        assert_eq!(representative(State::Render(RenderState::from_raw(42).unwrap())), None);
        assert_eq!(representative(State::Render(RenderState::STIPPLEPATTERN00)), None);
        assert_eq!(entry(State::Render(RenderState::VERTEXBLEND)).apply, ApplyFn::NoGl);
    }

    #[test]
    fn color_args_funnel_into_colorop() {
        let rep = State::TextureStage(2, TextureStageState::COLOROP);
        for kind in [
            TextureStageState::COLORARG0,
            TextureStageState::COLORARG1,
            TextureStageState::COLORARG2,
        ] {
            assert_eq!(representative(State::TextureStage(2, kind)), Some(rep));
        }
    }

    #[test]
    fn texture_transforms_funnel_into_stage_flags() {
        assert_eq!(
            representative(State::Transform(TransformState::Texture(3))),
            Some(State::TextureStage(3, TextureStageState::TEXTURETRANSFORMFLAGS))
        );
    }

    #[test]
    fn wrap_states_share_wrap0() {
        let rep = Some(State::Render(RenderState::WRAP0));
        assert_eq!(representative(State::Render(RenderState::WRAP7)), rep);
        assert_eq!(representative(State::Render(RenderState::WRAP15)), rep);
    }

    proptest! {
        #[test]
        fn representative_lookup_is_idempotent(index in 0..STATE_COUNT) {
            let state = State::from_index(index).unwrap();
            let rep = representative(state);
            prop_assert_eq!(rep.and_then(representative), rep);
        }
    }
}
