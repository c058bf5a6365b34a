use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::state::ids::{
    MAX_CLIP_PLANES, MAX_FRAGMENT_SAMPLERS, MAX_STREAMS, MAX_TEXTURE_STAGES, MAX_VERTEX_SAMPLERS,
    MAX_WORLD_MATRICES,
};

pub const OFFSCREEN_RENDERING_MODE_ENV: &str = "WINED3D_OFFSCREEN_RENDERING_MODE";
pub const VIDEO_MEMORY_SIZE_ENV: &str = "WINED3D_VIDEO_MEMORY_SIZE";
pub const STRICT_PBUFFER_ENV: &str = "WINED3D_STRICT_PBUFFER";

const MIB: u64 = 1024 * 1024;

/// How rendering into a surface that no swapchain owns is carried out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OffscreenRenderingMode {
    /// Framebuffer objects on the current context.
    #[default]
    Fbo,
    /// One device-wide pbuffer context, resized on demand.
    Pbuffer,
    /// Render into the back buffer and copy out afterwards.
    BackBuffer,
}

impl FromStr for OffscreenRenderingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fbo" => Ok(Self::Fbo),
            "pbuffer" => Ok(Self::Pbuffer),
            "backbuffer" => Ok(Self::BackBuffer),
            other => Err(format!("unknown offscreen rendering mode {other:?}")),
        }
    }
}

impl fmt::Display for OffscreenRenderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fbo => "fbo",
            Self::Pbuffer => "pbuffer",
            Self::BackBuffer => "backbuffer",
        })
    }
}

/// Limits the device validates state calls against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceCaps {
    pub max_texture_stages: usize,
    pub max_fragment_samplers: usize,
    pub max_vertex_samplers: usize,
    pub max_world_matrices: usize,
    pub max_clip_planes: usize,
    pub max_vertex_shader_constants: usize,
    pub max_pixel_shader_constants: usize,
    pub max_active_lights: usize,
    pub max_streams: usize,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            max_texture_stages: MAX_TEXTURE_STAGES,
            max_fragment_samplers: MAX_FRAGMENT_SAMPLERS,
            max_vertex_samplers: MAX_VERTEX_SAMPLERS,
            max_world_matrices: MAX_WORLD_MATRICES,
            max_clip_planes: MAX_CLIP_PLANES,
            max_vertex_shader_constants: 256,
            max_pixel_shader_constants: 224,
            max_active_lights: 8,
            max_streams: MAX_STREAMS,
        }
    }
}

impl DeviceCaps {
    /// Clamps every limit to what the state storage can hold.
    pub(crate) fn clamped(mut self) -> Self {
        self.max_texture_stages = self.max_texture_stages.min(MAX_TEXTURE_STAGES);
        self.max_fragment_samplers = self.max_fragment_samplers.min(MAX_FRAGMENT_SAMPLERS);
        self.max_vertex_samplers = self.max_vertex_samplers.min(MAX_VERTEX_SAMPLERS);
        self.max_world_matrices = self.max_world_matrices.min(MAX_WORLD_MATRICES);
        self.max_clip_planes = self.max_clip_planes.min(MAX_CLIP_PLANES);
        self.max_streams = self.max_streams.min(MAX_STREAMS);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    pub offscreen_rendering_mode: OffscreenRenderingMode,
    /// Budget for default-pool resources.
    pub video_memory_bytes: u64,
    /// Reject cross-thread use of the pbuffer context instead of stealing it.
    pub strict_pbuffer_ownership: bool,
    pub caps: DeviceCaps,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            offscreen_rendering_mode: OffscreenRenderingMode::default(),
            video_memory_bytes: 64 * MIB,
            strict_pbuffer_ownership: false,
            caps: DeviceCaps::default(),
        }
    }
}

impl DeviceConfig {
    /// Defaults with `WINED3D_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    pub(crate) fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = var(OFFSCREEN_RENDERING_MODE_ENV) {
            match raw.parse() {
                Ok(mode) => self.offscreen_rendering_mode = mode,
                Err(err) => warn!(%err, "ignoring {OFFSCREEN_RENDERING_MODE_ENV}"),
            }
        }
        if let Some(raw) = var(VIDEO_MEMORY_SIZE_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(mib) => self.video_memory_bytes = mib.saturating_mul(MIB),
                Err(err) => warn!(%err, value = %raw, "ignoring {VIDEO_MEMORY_SIZE_ENV}"),
            }
        }
        if var(STRICT_PBUFFER_ENV).is_some_and(|v| is_truthy(&v)) {
            self.strict_pbuffer_ownership = true;
        }
        self
    }
}

fn is_truthy(raw: &str) -> bool {
    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let config = DeviceConfig::default().with_overrides(vars(&[
            (OFFSCREEN_RENDERING_MODE_ENV, "PBuffer"),
            (VIDEO_MEMORY_SIZE_ENV, "128"),
            (STRICT_PBUFFER_ENV, "yes"),
        ]));
        assert_eq!(config.offscreen_rendering_mode, OffscreenRenderingMode::Pbuffer);
        assert_eq!(config.video_memory_bytes, 128 * MIB);
        assert!(config.strict_pbuffer_ownership);
    }

    #[test]
    fn unparseable_values_are_ignored() {
        let config = DeviceConfig::default().with_overrides(vars(&[
            (OFFSCREEN_RENDERING_MODE_ENV, "glx"),
            (VIDEO_MEMORY_SIZE_ENV, "lots"),
            (STRICT_PBUFFER_ENV, "0"),
        ]));
        assert_eq!(config, DeviceConfig::default());
    }

    #[test]
    fn caps_are_clamped_to_storage() {
        let caps = DeviceCaps {
            max_texture_stages: 32,
            ..DeviceCaps::default()
        }
        .clamped();
        assert_eq!(caps.max_texture_stages, MAX_TEXTURE_STAGES);
    }
}
