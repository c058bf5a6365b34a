use std::fmt;

/// D3D9 primitive types (`D3DPRIMITIVETYPE`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::PointList,
            2 => Self::LineList,
            3 => Self::LineStrip,
            4 => Self::TriangleList,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            _ => return None,
        })
    }

    /// Vertices consumed by `primitive_count` primitives.
    pub fn vertex_count(self, primitive_count: u32) -> u32 {
        match self {
            Self::PointList => primitive_count,
            Self::LineList => primitive_count.saturating_mul(2),
            Self::LineStrip => primitive_count.saturating_add(1),
            Self::TriangleList => primitive_count.saturating_mul(3),
            Self::TriangleStrip | Self::TriangleFan => primitive_count.saturating_add(2),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveType::PointList => "point_list",
            PrimitiveType::LineList => "line_list",
            PrimitiveType::LineStrip => "line_strip",
            PrimitiveType::TriangleList => "triangle_list",
            PrimitiveType::TriangleStrip => "triangle_strip",
            PrimitiveType::TriangleFan => "triangle_fan",
        };
        f.write_str(s)
    }
}
