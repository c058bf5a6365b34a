//! Direct3D 9 device state on top of a native GL-style context API.
//!
//! The [`Device`] holds the committed state and decides which native context a render target
//! is drawn with. Each [`Context`] keeps its own queue of dirty states, drained just before a
//! draw through a [`StateApplier`].

pub mod context;
pub mod resources;
pub mod runtime;
pub mod state;

pub use context::{Context, ContextId, ContextOwner, ContextUsage, DirtyStates};
pub use resources::{ResourceError, Surface};
pub use runtime::{
    Device, DeviceConfig, DeviceError, GraphicsBackend, PrimitiveType, RenderingMode,
    StateApplier, SwapChainId,
};
pub use state::{State, StateBlock};
