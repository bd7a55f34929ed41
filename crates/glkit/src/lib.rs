//! # glkit
//!
//! Validated WebGL2 resource builders for teaching and prototyping.
//!
//! ## Features
//!
//! - **Programs**: shader compilation with source-keyed caching, linking,
//!   and reflection of attributes and uniforms (including sampler units)
//! - **Buffers**: interleaved attribute buffers and index buffers with the
//!   narrowest index type
//! - **Vertex arrays**: name-matched attribute binding with matrix columns
//!   and integer inputs
//! - **Textures**: 2D, 3D, array and cube textures, renderbuffers and
//!   framebuffers with completeness checks made before the driver sees them
//! - **Draw calls**: idempotent uniform uploads and selective render state
//!   that is restored after every draw
//!
//! ## Architecture
//!
//! [`GlKit`] owns a [`Gl`] context and a registry of everything it created.
//! Handles are small ids; a handle whose resource was deleted is reported as
//! stale instead of reaching the context. [`GlKit::reset_context`] starts a
//! new generation and frees whatever the last generations did not reuse.
//!
//! ```ignore
//! let mut kit = GlKit::new(SoftwareGl::new());
//! let program = kit.create_program_from_source("flat", VS, FS, &[])?;
//! let positions = kit.create_attribute_buffer("tri", &attributes, None)?;
//! let indices = kit.create_index_buffer("tri", &[0, 1, 2], DrawMode::Triangles, None)?;
//! let vao = kit.create_vertex_array("tri", program, indices, &[positions])?;
//! let call = kit.create_draw_call(DrawCallDesc::new("tri", vao, program))?;
//! kit.draw(&call)?;
//! ```

pub mod buffer;
pub mod cache;
pub mod config;
pub mod context;
pub mod draw;
pub mod error;
pub mod framebuffer;
pub mod glsl;
pub mod layout;
pub mod program;
pub mod reflect;
pub mod resources;
pub mod texture;
pub mod types;
pub mod uniform;
pub mod vertex_array;

pub use cache::CacheStats;
pub use config::KitConfig;
pub use context::{GlKit, KitStats, Limits};
pub use draw::{BlendState, DepthState, DrawCall, DrawCallDesc, RenderState};
pub use error::{ErrorKind, GlKitError, IncompleteReason, Result};
pub use framebuffer::{Attachment, AttachmentPoint};
pub use glsl::GlslType;
pub use layout::{AttributeDesc, AttributeLayout, AttributeSet};
pub use reflect::{AttributeInfo, UniformInfo};
pub use resources::{
    BufferId, FramebufferId, IndexBufferId, ProgramId, RegistryCounts, RenderbufferId, ResourceId,
    ShaderId, TextureId, VertexArrayId,
};
pub use texture::{max_mip_levels, TextureDesc, TextureSource};
pub use types::{
    BlendEquation, BlendFactor, BufferUsage, CullFace, DepthFunc, DrawMode, Filter, IndexType,
    Precision, ScalarType, ShaderStage, TextureFormat, TextureTarget, Wrap,
};
pub use uniform::UniformValue;

pub use glkit_common::{init_logging, init_test_logging, try_init_logging, LogConfig, LogFormat};
pub use glkit_webgl::{constants, Gl, GlError, SoftwareGl};
