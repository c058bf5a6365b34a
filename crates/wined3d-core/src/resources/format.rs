use std::fmt;

/// The D3D9 pixel formats surfaces and textures can be created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    A8R8G8B8,
    X8R8G8B8,
    R5G6B5,
    X1R5G5B5,
    A1R5G5B5,
    A4R4G4B4,
    A2R10G10B10,
    A8,
    L8,
    R16F,
    R32F,
    A16B16G16R16F,
    A32B32G32R32F,
    D16,
    D24S8,
    D24X8,
    D32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatDesc {
    pub has_alpha: bool,
    pub bytes_per_pixel: u32,
    pub depth_stencil: bool,
}

impl Format {
    pub const fn desc(self) -> FormatDesc {
        let (has_alpha, bytes_per_pixel, depth_stencil) = match self {
            Self::A8R8G8B8 => (true, 4, false),
            Self::X8R8G8B8 => (false, 4, false),
            Self::R5G6B5 => (false, 2, false),
            Self::X1R5G5B5 => (false, 2, false),
            Self::A1R5G5B5 => (true, 2, false),
            Self::A4R4G4B4 => (true, 2, false),
            Self::A2R10G10B10 => (true, 4, false),
            Self::A8 => (true, 1, false),
            Self::L8 => (false, 1, false),
            Self::R16F => (false, 2, false),
            Self::R32F => (false, 4, false),
            Self::A16B16G16R16F => (true, 8, false),
            Self::A32B32G32R32F => (true, 16, false),
            Self::D16 => (false, 2, true),
            Self::D24S8 | Self::D24X8 | Self::D32 => (false, 4, true),
        };
        FormatDesc {
            has_alpha,
            bytes_per_pixel,
            depth_stencil,
        }
    }

    pub const fn has_alpha(self) -> bool {
        self.desc().has_alpha
    }

    pub const fn bytes_per_pixel(self) -> u32 {
        self.desc().bytes_per_pixel
    }

    pub fn surface_size(self, width: u32, height: u32) -> u64 {
        u64::from(width) * u64::from(height) * u64::from(self.bytes_per_pixel())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alpha_presence() {
        assert!(Format::A8R8G8B8.has_alpha());
        assert!(!Format::X8R8G8B8.has_alpha());
        assert!(!Format::D24S8.has_alpha());
    }

    #[test]
    fn surface_size_uses_bytes_per_pixel() {
        assert_eq!(Format::R5G6B5.surface_size(640, 480), 640 * 480 * 2);
        assert_eq!(Format::A32B32G32R32F.surface_size(4, 4), 256);
    }
}
