mod budget;
mod buffer;
mod format;
mod private_data;
mod resource;
mod surface;

use thiserror::Error;

pub use budget::{MemoryBudget, Reservation};
pub use buffer::{Buffer, IndexFormat};
pub use format::{Format, FormatDesc};
pub use private_data::{Guid, PrivateData, PrivateDataFlags, PrivateDataStore};
pub use resource::{Pool, Resource, ResourceId, ResourceKind, Usage};
pub use surface::{Surface, SurfaceDesc, Texture, TextureDesc};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("out of video memory: requested {requested} bytes, {available} available")]
    OutOfVideoMemory { requested: u64, available: u64 },

    #[error("no private data stored under {0}")]
    NotFound(Guid),

    #[error("buffer too small for private data: {required} bytes required")]
    MoreData { required: usize },

    #[error("private data under {0} is an object, not a blob")]
    NotABlob(Guid),

    #[error("private data under {0} is a blob, not an object")]
    NotAnObject(Guid),

    #[error("invalid resource size")]
    InvalidSize,
}
