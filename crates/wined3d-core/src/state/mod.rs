pub mod block;
pub mod ids;
pub mod mask;
pub mod table;

pub use block::{
    Light, LightInfo, LightType, Material, Matrix, Rect, ShaderHandle, StateBlock, StreamSource,
    VertexDeclaration, Viewport,
};
pub use ids::{
    RenderState, SamplerState, State, SyntheticState, TextureStageState, TransformState,
};
pub use mask::{BitSet, StateMask};
pub use table::{ApplyFn, StateEntry};
