pub mod backend;
pub mod config;
pub mod device;
pub mod stats;
pub mod swapchain;
pub mod topology;

mod states;

pub use backend::{
    ClearFlags, ClearParams, ContextRequest, DrawBuffer, Drawable, GraphicsBackend, NativeContext,
    StateApplier, WindowHandle,
};
pub use config::{DeviceCaps, DeviceConfig, OffscreenRenderingMode};
pub use device::{ColorTracking, DepthCopyState, Device, DeviceError, RenderingMode};
pub use stats::{DeviceStats, DeviceStatsSnapshot};
pub use swapchain::{SwapChain, SwapChainDesc, SwapChainId};
pub use topology::PrimitiveType;
