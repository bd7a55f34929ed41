//! GPU-facing enumerations.
//!
//! Each enum maps onto one closed set of WebGL2 enums via `gl_enum()`.

use std::fmt;
use std::str::FromStr;

use glkit_webgl::constants;
use serde::{Deserialize, Serialize};

use crate::error::{GlKitError, Result};

// ==================== Vertex Data ====================

/// Scalar type of vertex attribute data.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    #[default]
    Float,
    /// Four signed channels packed 10/10/10/2 into one word.
    Int2_10_10_10Rev,
    /// Four unsigned channels packed 10/10/10/2 into one word.
    UnsignedInt2_10_10_10Rev,
}

impl ScalarType {
    /// Size of one scalar in bytes; the whole word for packed types.
    pub fn byte_size(self) -> usize {
        match self {
            ScalarType::Byte | ScalarType::UnsignedByte => 1,
            ScalarType::Short | ScalarType::UnsignedShort | ScalarType::HalfFloat => 2,
            ScalarType::Int
            | ScalarType::UnsignedInt
            | ScalarType::Float
            | ScalarType::Int2_10_10_10Rev
            | ScalarType::UnsignedInt2_10_10_10Rev => 4,
        }
    }

    pub fn gl_enum(self) -> u32 {
        match self {
            ScalarType::Byte => constants::BYTE,
            ScalarType::UnsignedByte => constants::UNSIGNED_BYTE,
            ScalarType::Short => constants::SHORT,
            ScalarType::UnsignedShort => constants::UNSIGNED_SHORT,
            ScalarType::Int => constants::INT,
            ScalarType::UnsignedInt => constants::UNSIGNED_INT,
            ScalarType::HalfFloat => constants::HALF_FLOAT,
            ScalarType::Float => constants::FLOAT,
            ScalarType::Int2_10_10_10Rev => constants::INT_2_10_10_10_REV,
            ScalarType::UnsignedInt2_10_10_10Rev => constants::UNSIGNED_INT_2_10_10_10_REV,
        }
    }

    /// Whether the data can feed an integer shader input.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarType::Byte
                | ScalarType::UnsignedByte
                | ScalarType::Short
                | ScalarType::UnsignedShort
                | ScalarType::Int
                | ScalarType::UnsignedInt
        )
    }

    pub fn is_packed(self) -> bool {
        matches!(
            self,
            ScalarType::Int2_10_10_10Rev | ScalarType::UnsignedInt2_10_10_10Rev
        )
    }

    pub fn is_signed(self) -> bool {
        !matches!(
            self,
            ScalarType::UnsignedByte
                | ScalarType::UnsignedShort
                | ScalarType::UnsignedInt
                | ScalarType::UnsignedInt2_10_10_10Rev
        )
    }
}

/// Element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    /// The narrowest type that can hold `max_index`.
    pub fn for_max_index(max_index: u64) -> Result<Self> {
        match max_index {
            0..=0xFF => Ok(IndexType::UnsignedByte),
            0x100..=0xFFFF => Ok(IndexType::UnsignedShort),
            0x1_0000..=0xFFFF_FFFF => Ok(IndexType::UnsignedInt),
            _ => Err(GlKitError::validation(format!(
                "index {max_index} does not fit in 32 bits"
            ))),
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }

    pub fn gl_enum(self) -> u32 {
        match self {
            IndexType::UnsignedByte => constants::UNSIGNED_BYTE,
            IndexType::UnsignedShort => constants::UNSIGNED_SHORT,
            IndexType::UnsignedInt => constants::UNSIGNED_INT,
        }
    }
}

/// Buffer usage hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
    StreamDraw,
    StreamRead,
    StreamCopy,
}

impl BufferUsage {
    pub const ALL: [BufferUsage; 9] = [
        BufferUsage::StaticDraw,
        BufferUsage::StaticRead,
        BufferUsage::StaticCopy,
        BufferUsage::DynamicDraw,
        BufferUsage::DynamicRead,
        BufferUsage::DynamicCopy,
        BufferUsage::StreamDraw,
        BufferUsage::StreamRead,
        BufferUsage::StreamCopy,
    ];

    pub fn gl_enum(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => constants::STATIC_DRAW,
            BufferUsage::StaticRead => constants::STATIC_READ,
            BufferUsage::StaticCopy => constants::STATIC_COPY,
            BufferUsage::DynamicDraw => constants::DYNAMIC_DRAW,
            BufferUsage::DynamicRead => constants::DYNAMIC_READ,
            BufferUsage::DynamicCopy => constants::DYNAMIC_COPY,
            BufferUsage::StreamDraw => constants::STREAM_DRAW,
            BufferUsage::StreamRead => constants::STREAM_READ,
            BufferUsage::StreamCopy => constants::STREAM_COPY,
        }
    }

    /// The snake_case name used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            BufferUsage::StaticDraw => "static_draw",
            BufferUsage::StaticRead => "static_read",
            BufferUsage::StaticCopy => "static_copy",
            BufferUsage::DynamicDraw => "dynamic_draw",
            BufferUsage::DynamicRead => "dynamic_read",
            BufferUsage::DynamicCopy => "dynamic_copy",
            BufferUsage::StreamDraw => "stream_draw",
            BufferUsage::StreamRead => "stream_read",
            BufferUsage::StreamCopy => "stream_copy",
        }
    }
}

impl FromStr for BufferUsage {
    type Err = GlKitError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        BufferUsage::ALL
            .into_iter()
            .find(|usage| usage.name() == wanted)
            .ok_or_else(|| GlKitError::validation(format!("unknown buffer usage '{s}'")))
    }
}

// ==================== Drawing ====================

/// Primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl DrawMode {
    pub fn gl_enum(self) -> u32 {
        match self {
            DrawMode::Points => constants::POINTS,
            DrawMode::Lines => constants::LINES,
            DrawMode::LineLoop => constants::LINE_LOOP,
            DrawMode::LineStrip => constants::LINE_STRIP,
            DrawMode::Triangles => constants::TRIANGLES,
            DrawMode::TriangleStrip => constants::TRIANGLE_STRIP,
            DrawMode::TriangleFan => constants::TRIANGLE_FAN,
        }
    }

    /// Check that `count` indices form whole primitives.
    pub fn validate_count(self, count: usize) -> Result<()> {
        let ok = match self {
            DrawMode::Points | DrawMode::LineLoop => count >= 1,
            DrawMode::Lines => count >= 2 && count % 2 == 0,
            DrawMode::LineStrip => count >= 2,
            DrawMode::Triangles => count >= 3 && count % 3 == 0,
            DrawMode::TriangleStrip | DrawMode::TriangleFan => count >= 3,
        };
        if ok {
            Ok(())
        } else {
            Err(GlKitError::validation(format!(
                "{count} indices do not form whole {self:?} primitives"
            )))
        }
    }
}

/// Which faces to cull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    Front,
    #[default]
    Back,
    FrontAndBack,
}

impl CullFace {
    pub fn gl_enum(self) -> u32 {
        match self {
            CullFace::Front => constants::FRONT,
            CullFace::Back => constants::BACK,
            CullFace::FrontAndBack => constants::FRONT_AND_BACK,
        }
    }
}

/// Depth comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunc {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl DepthFunc {
    pub fn gl_enum(self) -> u32 {
        match self {
            DepthFunc::Never => constants::NEVER,
            DepthFunc::Less => constants::LESS,
            DepthFunc::Equal => constants::EQUAL,
            DepthFunc::LessEqual => constants::LEQUAL,
            DepthFunc::Greater => constants::GREATER,
            DepthFunc::NotEqual => constants::NOTEQUAL,
            DepthFunc::GreaterEqual => constants::GEQUAL,
            DepthFunc::Always => constants::ALWAYS,
        }
    }
}

/// Blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    DstColor,
    OneMinusDstColor,
    SrcAlphaSaturate,
}

impl BlendFactor {
    pub fn gl_enum(self) -> u32 {
        match self {
            BlendFactor::Zero => constants::ZERO,
            BlendFactor::One => constants::ONE,
            BlendFactor::SrcColor => constants::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => constants::ONE_MINUS_SRC_COLOR,
            BlendFactor::SrcAlpha => constants::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => constants::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstAlpha => constants::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => constants::ONE_MINUS_DST_ALPHA,
            BlendFactor::DstColor => constants::DST_COLOR,
            BlendFactor::OneMinusDstColor => constants::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlphaSaturate => constants::SRC_ALPHA_SATURATE,
        }
    }
}

/// Blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendEquation {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendEquation {
    pub fn gl_enum(self) -> u32 {
        match self {
            BlendEquation::Add => constants::FUNC_ADD,
            BlendEquation::Subtract => constants::FUNC_SUBTRACT,
            BlendEquation::ReverseSubtract => constants::FUNC_REVERSE_SUBTRACT,
            BlendEquation::Min => constants::MIN,
            BlendEquation::Max => constants::MAX,
        }
    }
}

// ==================== Textures ====================

/// Texture binding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
    Texture3D,
    CubeMap,
    Texture2DArray,
}

impl TextureTarget {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureTarget::Texture2D => constants::TEXTURE_2D,
            TextureTarget::Texture3D => constants::TEXTURE_3D,
            TextureTarget::CubeMap => constants::TEXTURE_CUBE_MAP,
            TextureTarget::Texture2DArray => constants::TEXTURE_2D_ARRAY,
        }
    }

    /// 3D and array textures are allocated and attached per layer.
    pub fn is_layered(self) -> bool {
        matches!(self, TextureTarget::Texture3D | TextureTarget::Texture2DArray)
    }
}

impl fmt::Display for TextureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextureTarget::Texture2D => "TEXTURE_2D",
            TextureTarget::Texture3D => "TEXTURE_3D",
            TextureTarget::CubeMap => "TEXTURE_CUBE_MAP",
            TextureTarget::Texture2DArray => "TEXTURE_2D_ARRAY",
        })
    }
}

/// Sized internal format of a texture or renderbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    Srgb8Alpha8,
    R16F,
    Rg16F,
    Rgba16F,
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,
    R8UI,
    R32I,
    R32UI,
    Rgba8UI,
    Depth16,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Depth32FStencil8,
    /// Renderbuffer only.
    Stencil8,
}

impl TextureFormat {
    pub fn internal_format(self) -> u32 {
        match self {
            TextureFormat::R8 => constants::R8,
            TextureFormat::Rg8 => constants::RG8,
            TextureFormat::Rgb8 => constants::RGB8,
            TextureFormat::Rgba8 => constants::RGBA8,
            TextureFormat::Srgb8Alpha8 => constants::SRGB8_ALPHA8,
            TextureFormat::R16F => constants::R16F,
            TextureFormat::Rg16F => constants::RG16F,
            TextureFormat::Rgba16F => constants::RGBA16F,
            TextureFormat::R32F => constants::R32F,
            TextureFormat::Rg32F => constants::RG32F,
            TextureFormat::Rgb32F => constants::RGB32F,
            TextureFormat::Rgba32F => constants::RGBA32F,
            TextureFormat::R8UI => constants::R8UI,
            TextureFormat::R32I => constants::R32I,
            TextureFormat::R32UI => constants::R32UI,
            TextureFormat::Rgba8UI => constants::RGBA8UI,
            TextureFormat::Depth16 => constants::DEPTH_COMPONENT16,
            TextureFormat::Depth24 => constants::DEPTH_COMPONENT24,
            TextureFormat::Depth32F => constants::DEPTH_COMPONENT32F,
            TextureFormat::Depth24Stencil8 => constants::DEPTH24_STENCIL8,
            TextureFormat::Depth32FStencil8 => constants::DEPTH32F_STENCIL8,
            TextureFormat::Stencil8 => constants::STENCIL_INDEX8,
        }
    }

    /// `(format, type)` pair for `texSubImage*` uploads.
    pub fn upload_format(self) -> (u32, u32) {
        match self {
            TextureFormat::R8 => (constants::RED, constants::UNSIGNED_BYTE),
            TextureFormat::Rg8 => (constants::RG, constants::UNSIGNED_BYTE),
            TextureFormat::Rgb8 => (constants::RGB, constants::UNSIGNED_BYTE),
            TextureFormat::Rgba8 | TextureFormat::Srgb8Alpha8 => (constants::RGBA, constants::UNSIGNED_BYTE),
            TextureFormat::R16F => (constants::RED, constants::HALF_FLOAT),
            TextureFormat::Rg16F => (constants::RG, constants::HALF_FLOAT),
            TextureFormat::Rgba16F => (constants::RGBA, constants::HALF_FLOAT),
            TextureFormat::R32F => (constants::RED, constants::FLOAT),
            TextureFormat::Rg32F => (constants::RG, constants::FLOAT),
            TextureFormat::Rgb32F => (constants::RGB, constants::FLOAT),
            TextureFormat::Rgba32F => (constants::RGBA, constants::FLOAT),
            TextureFormat::R8UI => (constants::RED_INTEGER, constants::UNSIGNED_BYTE),
            TextureFormat::R32I => (constants::RED_INTEGER, constants::INT),
            TextureFormat::R32UI => (constants::RED_INTEGER, constants::UNSIGNED_INT),
            TextureFormat::Rgba8UI => (constants::RGBA_INTEGER, constants::UNSIGNED_BYTE),
            TextureFormat::Depth16 => (constants::DEPTH_COMPONENT, constants::UNSIGNED_SHORT),
            TextureFormat::Depth24 => (constants::DEPTH_COMPONENT, constants::UNSIGNED_INT),
            TextureFormat::Depth32F => (constants::DEPTH_COMPONENT, constants::FLOAT),
            TextureFormat::Depth24Stencil8 => (constants::DEPTH_STENCIL, constants::UNSIGNED_INT_24_8),
            TextureFormat::Depth32FStencil8 => {
                (constants::DEPTH_STENCIL, constants::FLOAT_32_UNSIGNED_INT_24_8_REV)
            }
            TextureFormat::Stencil8 => (constants::NONE, constants::UNSIGNED_BYTE),
        }
    }

    /// Bytes per texel of upload data.
    pub fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::R8 | TextureFormat::R8UI | TextureFormat::Stencil8 => 1,
            TextureFormat::Rg8 | TextureFormat::R16F | TextureFormat::Depth16 => 2,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8
            | TextureFormat::Srgb8Alpha8
            | TextureFormat::Rg16F
            | TextureFormat::R32F
            | TextureFormat::R32I
            | TextureFormat::R32UI
            | TextureFormat::Rgba8UI
            | TextureFormat::Depth24
            | TextureFormat::Depth32F
            | TextureFormat::Depth24Stencil8 => 4,
            TextureFormat::Rgba16F | TextureFormat::Rg32F | TextureFormat::Depth32FStencil8 => 8,
            TextureFormat::Rgb32F => 12,
            TextureFormat::Rgba32F => 16,
        }
    }

    pub fn has_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16
                | TextureFormat::Depth24
                | TextureFormat::Depth32F
                | TextureFormat::Depth24Stencil8
                | TextureFormat::Depth32FStencil8
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth24Stencil8 | TextureFormat::Depth32FStencil8 | TextureFormat::Stencil8
        )
    }

    pub fn is_color(self) -> bool {
        !self.has_depth() && !self.has_stencil()
    }

    /// Sampled through `isampler*`/`usampler*`; never filterable.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TextureFormat::R8UI | TextureFormat::R32I | TextureFormat::R32UI | TextureFormat::Rgba8UI
        )
    }

    /// Whether the format can back a texture (as opposed to a renderbuffer).
    pub fn is_texturable(self) -> bool {
        self != TextureFormat::Stencil8
    }
}

/// Texture filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl Filter {
    pub fn gl_enum(self) -> u32 {
        match self {
            Filter::Nearest => constants::NEAREST,
            Filter::Linear => constants::LINEAR,
            Filter::NearestMipmapNearest => constants::NEAREST_MIPMAP_NEAREST,
            Filter::LinearMipmapNearest => constants::LINEAR_MIPMAP_NEAREST,
            Filter::NearestMipmapLinear => constants::NEAREST_MIPMAP_LINEAR,
            Filter::LinearMipmapLinear => constants::LINEAR_MIPMAP_LINEAR,
        }
    }

    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Filter::Nearest | Filter::Linear)
    }

    /// Whether sampling interpolates between texels.
    pub fn is_linear(self) -> bool {
        !matches!(self, Filter::Nearest | Filter::NearestMipmapNearest)
    }
}

/// Texture wrap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

impl Wrap {
    pub fn gl_enum(self) -> u32 {
        match self {
            Wrap::Repeat => constants::REPEAT,
            Wrap::ClampToEdge => constants::CLAMP_TO_EDGE,
            Wrap::MirroredRepeat => constants::MIRRORED_REPEAT,
        }
    }
}

// ==================== Shaders ====================

/// Shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => constants::VERTEX_SHADER,
            ShaderStage::Fragment => constants::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// GLSL precision qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Low,
    Medium,
    High,
}

impl Precision {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "lowp" => Some(Precision::Low),
            "mediump" => Some(Precision::Medium),
            "highp" => Some(Precision::High),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_type_boundaries() {
        assert_eq!(IndexType::for_max_index(0).unwrap(), IndexType::UnsignedByte);
        assert_eq!(IndexType::for_max_index(255).unwrap(), IndexType::UnsignedByte);
        assert_eq!(IndexType::for_max_index(256).unwrap(), IndexType::UnsignedShort);
        assert_eq!(IndexType::for_max_index(65535).unwrap(), IndexType::UnsignedShort);
        assert_eq!(IndexType::for_max_index(65536).unwrap(), IndexType::UnsignedInt);
        assert_eq!(IndexType::for_max_index(u32::MAX as u64).unwrap(), IndexType::UnsignedInt);
        assert!(IndexType::for_max_index(1 << 32).is_err());
    }

    #[test]
    fn test_draw_mode_counts() {
        assert!(DrawMode::Triangles.validate_count(3).is_ok());
        assert!(DrawMode::Triangles.validate_count(4).is_err());
        assert!(DrawMode::Triangles.validate_count(0).is_err());
        assert!(DrawMode::Lines.validate_count(3).is_err());
        assert!(DrawMode::TriangleStrip.validate_count(4).is_ok());
        assert!(DrawMode::LineStrip.validate_count(1).is_err());
        assert!(DrawMode::Points.validate_count(1).is_ok());
    }

    #[test]
    fn test_buffer_usage_parse() {
        assert_eq!("dynamic_draw".parse::<BufferUsage>().unwrap(), BufferUsage::DynamicDraw);
        assert_eq!(" STREAM_COPY ".parse::<BufferUsage>().unwrap(), BufferUsage::StreamCopy);
        assert!("sometimes".parse::<BufferUsage>().is_err());
    }

    #[test]
    fn test_scalar_sizes() {
        let sizes: Vec<usize> = [
            ScalarType::Byte,
            ScalarType::UnsignedByte,
            ScalarType::Short,
            ScalarType::UnsignedShort,
            ScalarType::Int,
            ScalarType::UnsignedInt,
            ScalarType::HalfFloat,
            ScalarType::Float,
            ScalarType::Int2_10_10_10Rev,
            ScalarType::UnsignedInt2_10_10_10Rev,
        ]
        .iter()
        .map(|t| t.byte_size())
        .collect();
        assert_eq!(sizes, vec![1, 1, 2, 2, 4, 4, 2, 4, 4, 4]);
    }

    #[test]
    fn test_format_classes() {
        assert!(TextureFormat::Rgba8.is_color());
        assert!(TextureFormat::Depth24Stencil8.has_depth());
        assert!(TextureFormat::Depth24Stencil8.has_stencil());
        assert!(!TextureFormat::Stencil8.is_texturable());
        assert_eq!(TextureFormat::Rgba32F.bytes_per_texel(), 16);
    }
}
