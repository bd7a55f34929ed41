//! # glkit WebGL
//!
//! The graphics-context capability consumed by `glkit`.
//!
//! ## Features
//!
//! - **Gl**: the primitive WebGL2 operations as a trait (create/compile/link,
//!   buffer upload, vertex attribute pointers, uniforms, textures,
//!   framebuffers, draw issuance, limit queries)
//! - **Constants**: the WebGL2 enum values the trait speaks in
//! - **SoftwareGl**: a headless context that tracks object state, emulates
//!   compilation and linking, and records draws and uniform uploads
//!
//! ## Architecture
//!
//! `glkit` never talks to a driver directly. Everything it needs from the
//! platform goes through [`Gl`], so the same builders run against a browser
//! binding or against [`SoftwareGl`] in tests.

use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

mod gl;
mod software;

pub use gl::Gl;
pub use software::{
    AttachmentData, BufferData, DrawState, FramebufferData, ProgramData, RecordedDraw,
    RenderbufferData, ShaderData, SoftwareGl, SoftwareLimits, TextureData, UniformData,
    UniformUpload, VertexArrayData, VertexAttribPointer, WebGLState,
};

// ==================== Errors ====================

/// Errors reported through the context error flag.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlError {
    #[error("Invalid enum")]
    InvalidEnum,

    #[error("Invalid value")]
    InvalidValue,

    #[error("Invalid operation")]
    InvalidOperation,

    #[error("Invalid framebuffer operation")]
    InvalidFramebufferOperation,

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Context lost")]
    ContextLost,
}

impl GlError {
    /// Map a `getError` code to an error; `NO_ERROR` maps to `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            constants::NO_ERROR => None,
            constants::INVALID_ENUM => Some(Self::InvalidEnum),
            constants::INVALID_VALUE => Some(Self::InvalidValue),
            constants::INVALID_OPERATION => Some(Self::InvalidOperation),
            constants::INVALID_FRAMEBUFFER_OPERATION => Some(Self::InvalidFramebufferOperation),
            constants::OUT_OF_MEMORY => Some(Self::OutOfMemory),
            constants::CONTEXT_LOST_WEBGL => Some(Self::ContextLost),
            _ => Some(Self::InvalidOperation),
        }
    }

    /// The `getError` code for this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidEnum => constants::INVALID_ENUM,
            Self::InvalidValue => constants::INVALID_VALUE,
            Self::InvalidOperation => constants::INVALID_OPERATION,
            Self::InvalidFramebufferOperation => constants::INVALID_FRAMEBUFFER_OPERATION,
            Self::OutOfMemory => constants::OUT_OF_MEMORY,
            Self::ContextLost => constants::CONTEXT_LOST_WEBGL,
        }
    }
}

// ==================== Constants ====================

/// WebGL2 constants (matches OpenGL ES 3.0).
pub mod constants {
    // Primitive types
    pub const POINTS: u32 = 0x0000;
    pub const LINES: u32 = 0x0001;
    pub const LINE_LOOP: u32 = 0x0002;
    pub const LINE_STRIP: u32 = 0x0003;
    pub const TRIANGLES: u32 = 0x0004;
    pub const TRIANGLE_STRIP: u32 = 0x0005;
    pub const TRIANGLE_FAN: u32 = 0x0006;

    // Buffer targets
    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;

    // Buffer usage
    pub const STREAM_DRAW: u32 = 0x88E0;
    pub const STREAM_READ: u32 = 0x88E1;
    pub const STREAM_COPY: u32 = 0x88E2;
    pub const STATIC_DRAW: u32 = 0x88E4;
    pub const STATIC_READ: u32 = 0x88E5;
    pub const STATIC_COPY: u32 = 0x88E6;
    pub const DYNAMIC_DRAW: u32 = 0x88E8;
    pub const DYNAMIC_READ: u32 = 0x88E9;
    pub const DYNAMIC_COPY: u32 = 0x88EA;

    // Data types
    pub const BYTE: u32 = 0x1400;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const SHORT: u32 = 0x1402;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const INT: u32 = 0x1404;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;
    pub const UNSIGNED_INT_2_10_10_10_REV: u32 = 0x8368;
    pub const INT_2_10_10_10_REV: u32 = 0x8D9F;
    pub const UNSIGNED_INT_24_8: u32 = 0x84FA;
    pub const FLOAT_32_UNSIGNED_INT_24_8_REV: u32 = 0x8DAD;

    // Shader types
    pub const FRAGMENT_SHADER: u32 = 0x8B30;
    pub const VERTEX_SHADER: u32 = 0x8B31;

    // Shader parameters
    pub const DELETE_STATUS: u32 = 0x8B80;
    pub const COMPILE_STATUS: u32 = 0x8B81;
    pub const LINK_STATUS: u32 = 0x8B82;

    // Texture targets
    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE_3D: u32 = 0x806F;
    pub const TEXTURE_2D_ARRAY: u32 = 0x8C1A;
    pub const TEXTURE_CUBE_MAP: u32 = 0x8513;
    pub const TEXTURE_CUBE_MAP_POSITIVE_X: u32 = 0x8515;
    pub const TEXTURE_CUBE_MAP_NEGATIVE_X: u32 = 0x8516;
    pub const TEXTURE_CUBE_MAP_POSITIVE_Y: u32 = 0x8517;
    pub const TEXTURE_CUBE_MAP_NEGATIVE_Y: u32 = 0x8518;
    pub const TEXTURE_CUBE_MAP_POSITIVE_Z: u32 = 0x8519;
    pub const TEXTURE_CUBE_MAP_NEGATIVE_Z: u32 = 0x851A;

    // Texture units
    pub const TEXTURE0: u32 = 0x84C0;

    // Texture parameters
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;
    pub const TEXTURE_WRAP_R: u32 = 0x8072;
    pub const TEXTURE_BASE_LEVEL: u32 = 0x813C;
    pub const TEXTURE_MAX_LEVEL: u32 = 0x813D;

    // Texture filter values
    pub const NEAREST: u32 = 0x2600;
    pub const LINEAR: u32 = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;

    // Texture wrap values
    pub const REPEAT: u32 = 0x2901;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const MIRRORED_REPEAT: u32 = 0x8370;

    // Pixel formats
    pub const DEPTH_COMPONENT: u32 = 0x1902;
    pub const RED: u32 = 0x1903;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const RG: u32 = 0x8227;
    pub const DEPTH_STENCIL: u32 = 0x84F9;
    pub const RED_INTEGER: u32 = 0x8D94;
    pub const RGBA_INTEGER: u32 = 0x8D99;

    // Sized internal formats
    pub const R8: u32 = 0x8229;
    pub const RG8: u32 = 0x822B;
    pub const RGB8: u32 = 0x8051;
    pub const RGBA8: u32 = 0x8058;
    pub const SRGB8_ALPHA8: u32 = 0x8C43;
    pub const R16F: u32 = 0x822D;
    pub const RG16F: u32 = 0x822F;
    pub const RGBA16F: u32 = 0x881A;
    pub const R32F: u32 = 0x822E;
    pub const RG32F: u32 = 0x8230;
    pub const RGB32F: u32 = 0x8815;
    pub const RGBA32F: u32 = 0x8814;
    pub const R8UI: u32 = 0x8232;
    pub const R32I: u32 = 0x8235;
    pub const R32UI: u32 = 0x8236;
    pub const RGBA8UI: u32 = 0x8D7C;
    pub const DEPTH_COMPONENT16: u32 = 0x81A5;
    pub const DEPTH_COMPONENT24: u32 = 0x81A6;
    pub const DEPTH_COMPONENT32F: u32 = 0x8CAC;
    pub const DEPTH24_STENCIL8: u32 = 0x88F0;
    pub const DEPTH32F_STENCIL8: u32 = 0x8CAD;
    pub const STENCIL_INDEX8: u32 = 0x8D48;

    // Blend functions
    pub const ZERO: u32 = 0;
    pub const ONE: u32 = 1;
    pub const SRC_COLOR: u32 = 0x0300;
    pub const ONE_MINUS_SRC_COLOR: u32 = 0x0301;
    pub const SRC_ALPHA: u32 = 0x0302;
    pub const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
    pub const DST_ALPHA: u32 = 0x0304;
    pub const ONE_MINUS_DST_ALPHA: u32 = 0x0305;
    pub const DST_COLOR: u32 = 0x0306;
    pub const ONE_MINUS_DST_COLOR: u32 = 0x0307;
    pub const SRC_ALPHA_SATURATE: u32 = 0x0308;

    // Blend equations
    pub const FUNC_ADD: u32 = 0x8006;
    pub const MIN: u32 = 0x8007;
    pub const MAX: u32 = 0x8008;
    pub const FUNC_SUBTRACT: u32 = 0x800A;
    pub const FUNC_REVERSE_SUBTRACT: u32 = 0x800B;

    // Depth test functions
    pub const NEVER: u32 = 0x0200;
    pub const LESS: u32 = 0x0201;
    pub const EQUAL: u32 = 0x0202;
    pub const LEQUAL: u32 = 0x0203;
    pub const GREATER: u32 = 0x0204;
    pub const NOTEQUAL: u32 = 0x0205;
    pub const GEQUAL: u32 = 0x0206;
    pub const ALWAYS: u32 = 0x0207;

    // Capabilities
    pub const BLEND: u32 = 0x0BE2;
    pub const CULL_FACE: u32 = 0x0B44;
    pub const DEPTH_TEST: u32 = 0x0B71;
    pub const SCISSOR_TEST: u32 = 0x0C11;
    pub const STENCIL_TEST: u32 = 0x0B90;

    // Face culling
    pub const FRONT: u32 = 0x0404;
    pub const BACK: u32 = 0x0405;
    pub const FRONT_AND_BACK: u32 = 0x0408;

    // Error codes
    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const OUT_OF_MEMORY: u32 = 0x0505;
    pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;
    pub const CONTEXT_LOST_WEBGL: u32 = 0x9242;

    // Framebuffers
    pub const NONE: u32 = 0;
    pub const FRAMEBUFFER: u32 = 0x8D40;
    pub const RENDERBUFFER: u32 = 0x8D41;
    pub const READ_FRAMEBUFFER: u32 = 0x8CA8;
    pub const DRAW_FRAMEBUFFER: u32 = 0x8CA9;
    pub const COLOR_ATTACHMENT0: u32 = 0x8CE0;
    pub const DEPTH_ATTACHMENT: u32 = 0x8D00;
    pub const STENCIL_ATTACHMENT: u32 = 0x8D20;
    pub const DEPTH_STENCIL_ATTACHMENT: u32 = 0x821A;

    // Framebuffer status
    pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;
    pub const FRAMEBUFFER_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
    pub const FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT: u32 = 0x8CD7;
    pub const FRAMEBUFFER_INCOMPLETE_DIMENSIONS: u32 = 0x8CD9;
    pub const FRAMEBUFFER_UNSUPPORTED: u32 = 0x8CDD;
    pub const FRAMEBUFFER_INCOMPLETE_MULTISAMPLE: u32 = 0x8D56;

    // Implementation limits
    pub const MAX_TEXTURE_SIZE: u32 = 0x0D33;
    pub const MAX_3D_TEXTURE_SIZE: u32 = 0x8073;
    pub const MAX_CUBE_MAP_TEXTURE_SIZE: u32 = 0x851C;
    pub const MAX_RENDERBUFFER_SIZE: u32 = 0x84E8;
    pub const MAX_DRAW_BUFFERS: u32 = 0x8824;
    pub const MAX_VERTEX_ATTRIBS: u32 = 0x8869;
    pub const MAX_ARRAY_TEXTURE_LAYERS: u32 = 0x88FF;
    pub const MAX_COMBINED_TEXTURE_IMAGE_UNITS: u32 = 0x8B4D;
    pub const MAX_COLOR_ATTACHMENTS: u32 = 0x8CDF;
    pub const MAX_SAMPLES: u32 = 0x8D57;
}

// ==================== Object IDs ====================

/// WebGL object handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WebGLObject(u32);

impl WebGLObject {
    fn new() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id handed out by a platform binding.
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

pub type WebGLBuffer = WebGLObject;
pub type WebGLShader = WebGLObject;
pub type WebGLProgram = WebGLObject;
pub type WebGLVertexArray = WebGLObject;
pub type WebGLTexture = WebGLObject;
pub type WebGLFramebuffer = WebGLObject;
pub type WebGLRenderbuffer = WebGLObject;
pub type WebGLUniformLocation = WebGLObject;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_round_trip() {
        for err in [
            GlError::InvalidEnum,
            GlError::InvalidValue,
            GlError::InvalidOperation,
            GlError::InvalidFramebufferOperation,
            GlError::OutOfMemory,
            GlError::ContextLost,
        ] {
            assert_eq!(GlError::from_code(err.code()), Some(err));
        }
        assert_eq!(GlError::from_code(constants::NO_ERROR), None);
    }

    #[test]
    fn test_object_ids_are_unique() {
        let a = WebGLObject::new();
        let b = WebGLObject::new();
        assert_ne!(a, b);
        assert!(a.is_valid());
        assert!(!WebGLObject::from_raw(0).is_valid());
    }
}
