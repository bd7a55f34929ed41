//! GLSL ES 3.00 types as seen by attribute and uniform declarations.

use crate::types::TextureTarget;

/// Scalar kind behind a GLSL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Float,
    Int,
    Uint,
    Bool,
}

/// Which `uniform*` entry point uploads a value, and with what width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadShape {
    Float(u32),
    Int(u32),
    Uint(u32),
    Matrix { columns: u32, rows: u32 },
}

/// A declarable GLSL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Uint,
    UVec2,
    UVec3,
    UVec4,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
    Mat2x3,
    Mat2x4,
    Mat3x2,
    Mat3x4,
    Mat4x2,
    Mat4x3,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler2DArray,
    Sampler2DShadow,
    SamplerCubeShadow,
    Sampler2DArrayShadow,
    ISampler2D,
    ISampler3D,
    ISamplerCube,
    ISampler2DArray,
    USampler2D,
    USampler3D,
    USamplerCube,
    USampler2DArray,
}

impl GlslType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        use GlslType::*;
        Some(match word {
            "float" => Float,
            "vec2" => Vec2,
            "vec3" => Vec3,
            "vec4" => Vec4,
            "int" => Int,
            "ivec2" => IVec2,
            "ivec3" => IVec3,
            "ivec4" => IVec4,
            "uint" => Uint,
            "uvec2" => UVec2,
            "uvec3" => UVec3,
            "uvec4" => UVec4,
            "bool" => Bool,
            "bvec2" => BVec2,
            "bvec3" => BVec3,
            "bvec4" => BVec4,
            "mat2" | "mat2x2" => Mat2,
            "mat3" | "mat3x3" => Mat3,
            "mat4" | "mat4x4" => Mat4,
            "mat2x3" => Mat2x3,
            "mat2x4" => Mat2x4,
            "mat3x2" => Mat3x2,
            "mat3x4" => Mat3x4,
            "mat4x2" => Mat4x2,
            "mat4x3" => Mat4x3,
            "sampler2D" => Sampler2D,
            "sampler3D" => Sampler3D,
            "samplerCube" => SamplerCube,
            "sampler2DArray" => Sampler2DArray,
            "sampler2DShadow" => Sampler2DShadow,
            "samplerCubeShadow" => SamplerCubeShadow,
            "sampler2DArrayShadow" => Sampler2DArrayShadow,
            "isampler2D" => ISampler2D,
            "isampler3D" => ISampler3D,
            "isamplerCube" => ISamplerCube,
            "isampler2DArray" => ISampler2DArray,
            "usampler2D" => USampler2D,
            "usampler3D" => USampler3D,
            "usamplerCube" => USamplerCube,
            "usampler2DArray" => USampler2DArray,
            _ => return None,
        })
    }

    pub fn scalar_kind(self) -> ScalarKind {
        use GlslType::*;
        match self {
            Float | Vec2 | Vec3 | Vec4 | Mat2 | Mat3 | Mat4 | Mat2x3 | Mat2x4 | Mat3x2 | Mat3x4
            | Mat4x2 | Mat4x3 => ScalarKind::Float,
            Int | IVec2 | IVec3 | IVec4 => ScalarKind::Int,
            Uint | UVec2 | UVec3 | UVec4 => ScalarKind::Uint,
            Bool | BVec2 | BVec3 | BVec4 => ScalarKind::Bool,
            // sampler uniforms hold a unit index
            _ => ScalarKind::Int,
        }
    }

    /// `(columns, rows)` for matrix types.
    pub fn matrix_dims(self) -> Option<(u32, u32)> {
        use GlslType::*;
        match self {
            Mat2 => Some((2, 2)),
            Mat3 => Some((3, 3)),
            Mat4 => Some((4, 4)),
            Mat2x3 => Some((2, 3)),
            Mat2x4 => Some((2, 4)),
            Mat3x2 => Some((3, 2)),
            Mat3x4 => Some((3, 4)),
            Mat4x2 => Some((4, 2)),
            Mat4x3 => Some((4, 3)),
            _ => None,
        }
    }

    /// Components per element: 1 for scalars and samplers, N for vectors,
    /// columns × rows for matrices.
    pub fn components(self) -> usize {
        use GlslType::*;
        if let Some((columns, rows)) = self.matrix_dims() {
            return (columns * rows) as usize;
        }
        match self {
            Vec2 | IVec2 | UVec2 | BVec2 => 2,
            Vec3 | IVec3 | UVec3 | BVec3 => 3,
            Vec4 | IVec4 | UVec4 | BVec4 => 4,
            _ => 1,
        }
    }

    /// Consecutive attribute locations the type occupies.
    pub fn attribute_slots(self) -> u32 {
        self.matrix_dims().map(|(columns, _)| columns).unwrap_or(1)
    }

    /// Texture target a sampler type reads from.
    pub fn sampler_target(self) -> Option<TextureTarget> {
        use GlslType::*;
        match self {
            Sampler2D | Sampler2DShadow | ISampler2D | USampler2D => Some(TextureTarget::Texture2D),
            Sampler3D | ISampler3D | USampler3D => Some(TextureTarget::Texture3D),
            SamplerCube | SamplerCubeShadow | ISamplerCube | USamplerCube => Some(TextureTarget::CubeMap),
            Sampler2DArray | Sampler2DArrayShadow | ISampler2DArray | USampler2DArray => {
                Some(TextureTarget::Texture2DArray)
            }
            _ => None,
        }
    }

    pub fn is_sampler(self) -> bool {
        self.sampler_target().is_some()
    }

    /// Whether a sampler reads integer textures.
    pub fn is_integer_sampler(self) -> bool {
        use GlslType::*;
        matches!(
            self,
            ISampler2D
                | ISampler3D
                | ISamplerCube
                | ISampler2DArray
                | USampler2D
                | USampler3D
                | USamplerCube
                | USampler2DArray
        )
    }

    /// Integer vertex inputs must be fed through `vertexAttribIPointer`.
    pub fn is_integer(self) -> bool {
        !self.is_sampler() && matches!(self.scalar_kind(), ScalarKind::Int | ScalarKind::Uint)
    }

    pub fn upload_shape(self) -> UploadShape {
        if let Some((columns, rows)) = self.matrix_dims() {
            return UploadShape::Matrix { columns, rows };
        }
        let width = self.components() as u32;
        match self.scalar_kind() {
            ScalarKind::Float => UploadShape::Float(width),
            ScalarKind::Int | ScalarKind::Bool => UploadShape::Int(width),
            ScalarKind::Uint => UploadShape::Uint(width),
        }
    }
}
