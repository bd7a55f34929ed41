//! Resource descriptors and the registry that owns them.
//!
//! Every GPU object glkit creates is owned by the [`Registry`] and named by
//! a typed id. Descriptors are immutable once built, except for the uniform
//! values a program remembers for upload diffing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use glkit_webgl::{
    WebGLBuffer, WebGLFramebuffer, WebGLProgram, WebGLRenderbuffer, WebGLShader, WebGLTexture,
    WebGLVertexArray,
};

use crate::error::{GlKitError, Result};
use crate::layout::AttributeLayout;
use crate::reflect::{AttributeInfo, UniformInfo};
use crate::types::{BufferUsage, DrawMode, IndexType, ShaderStage, TextureFormat, TextureTarget};

// ==================== Ids ====================

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} #{}", $label, self.0)
            }
        }
    };
}

resource_id!(ShaderId, "shader");
resource_id!(ProgramId, "program");
resource_id!(
    /// An attribute (vertex data) buffer.
    BufferId,
    "attribute buffer"
);
resource_id!(IndexBufferId, "index buffer");
resource_id!(VertexArrayId, "vertex array");
resource_id!(TextureId, "texture");
resource_id!(RenderbufferId, "renderbuffer");
resource_id!(FramebufferId, "framebuffer");

/// Any resource id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Shader(ShaderId),
    Program(ProgramId),
    AttributeBuffer(BufferId),
    IndexBuffer(IndexBufferId),
    VertexArray(VertexArrayId),
    Texture(TextureId),
    Renderbuffer(RenderbufferId),
    Framebuffer(FramebufferId),
}

macro_rules! resource_id_from {
    ($($id:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$id> for ResourceId {
                fn from(id: $id) -> Self {
                    ResourceId::$variant(id)
                }
            }
        )*
    };
}

resource_id_from! {
    ShaderId => Shader,
    ProgramId => Program,
    BufferId => AttributeBuffer,
    IndexBufferId => IndexBuffer,
    VertexArrayId => VertexArray,
    TextureId => Texture,
    RenderbufferId => Renderbuffer,
    FramebufferId => Framebuffer,
}

// ==================== Descriptors ====================

/// A compiled shader.
#[derive(Debug, Clone)]
pub struct Shader {
    pub name: String,
    pub stage: ShaderStage,
    pub source: String,
    pub handle: WebGLShader,
}

/// A linked program with its reflected interface.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub vertex: ShaderId,
    pub fragment: ShaderId,
    pub attributes: BTreeMap<String, AttributeInfo>,
    pub uniforms: BTreeMap<String, UniformInfo>,
    pub handle: WebGLProgram,
}

/// Interleaved vertex data on the GPU.
#[derive(Debug, Clone)]
pub struct AttributeBuffer {
    pub name: String,
    pub vertex_count: usize,
    /// In layout order.
    pub layout: Vec<(String, AttributeLayout)>,
    pub stride: usize,
    pub usage: BufferUsage,
    pub handle: WebGLBuffer,
}

impl AttributeBuffer {
    pub fn attribute(&self, name: &str) -> Option<&AttributeLayout> {
        self.layout.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }
}

#[derive(Debug, Clone)]
pub struct IndexBuffer {
    pub name: String,
    pub index_type: IndexType,
    pub count: usize,
    pub usage: BufferUsage,
    pub mode: DrawMode,
    pub handle: WebGLBuffer,
}

/// Which buffer attribute feeds a vertex array location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub buffer: BufferId,
    pub attribute: String,
    /// Matrix column; 0 otherwise.
    pub column: u32,
    /// Bound through `vertexAttribIPointer`.
    pub integer: bool,
}

#[derive(Debug, Clone)]
pub struct VertexArray {
    pub name: String,
    pub index_buffer: IndexBufferId,
    pub index_type: IndexType,
    pub index_count: usize,
    pub mode: DrawMode,
    pub bindings: BTreeMap<u32, AttributeBinding>,
    pub handle: WebGLVertexArray,
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub target: TextureTarget,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Depth for 3D textures, layer count for arrays, 1 otherwise.
    pub depth: u32,
    pub levels: u32,
    pub handle: WebGLTexture,
}

impl Texture {
    /// Width and height of mip level `level`.
    pub fn level_size(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }

    /// Layers addressable by attachments and sub-image uploads.
    pub fn layers(&self) -> u32 {
        match self.target {
            TextureTarget::CubeMap => 6,
            _ => self.depth,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderbuffer {
    pub name: String,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub handle: WebGLRenderbuffer,
}

#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub handle: WebGLFramebuffer,
}

// ==================== Registry ====================

/// A GL object handed back by [`Registry::remove`] for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlObject {
    Shader(WebGLShader),
    Program(WebGLProgram),
    Buffer(WebGLBuffer),
    VertexArray(WebGLVertexArray),
    Texture(WebGLTexture),
    Renderbuffer(WebGLRenderbuffer),
    Framebuffer(WebGLFramebuffer),
}

/// Owner of every live descriptor.
#[derive(Debug, Default)]
pub struct Registry {
    next_id: u32,
    shaders: HashMap<ShaderId, Shader>,
    programs: HashMap<ProgramId, Program>,
    buffers: HashMap<BufferId, AttributeBuffer>,
    index_buffers: HashMap<IndexBufferId, IndexBuffer>,
    vertex_arrays: HashMap<VertexArrayId, VertexArray>,
    textures: HashMap<TextureId, Texture>,
    renderbuffers: HashMap<RenderbufferId, Renderbuffer>,
    framebuffers: HashMap<FramebufferId, Framebuffer>,
}

macro_rules! registry_access {
    ($($map:ident: $id:ident => $ty:ident, $insert:ident, $get:ident, $get_mut:ident;)*) => {
        $(
            pub fn $insert(&mut self, value: $ty) -> $id {
                let id = $id(self.allocate());
                self.$map.insert(id, value);
                id
            }

            pub fn $get(&self, id: $id) -> Result<&$ty> {
                self.$map.get(&id).ok_or_else(|| stale(ResourceId::from(id)))
            }

            pub fn $get_mut(&mut self, id: $id) -> Result<&mut $ty> {
                self.$map.get_mut(&id).ok_or_else(|| stale(ResourceId::from(id)))
            }
        )*
    };
}

fn stale(id: ResourceId) -> GlKitError {
    let (kind, raw) = match id {
        ResourceId::Shader(id) => ("shader", id.0),
        ResourceId::Program(id) => ("program", id.0),
        ResourceId::AttributeBuffer(id) => ("attribute buffer", id.0),
        ResourceId::IndexBuffer(id) => ("index buffer", id.0),
        ResourceId::VertexArray(id) => ("vertex array", id.0),
        ResourceId::Texture(id) => ("texture", id.0),
        ResourceId::Renderbuffer(id) => ("renderbuffer", id.0),
        ResourceId::Framebuffer(id) => ("framebuffer", id.0),
    };
    GlKitError::StaleHandle { kind, id: raw }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    registry_access! {
        shaders: ShaderId => Shader, insert_shader, shader, shader_mut;
        programs: ProgramId => Program, insert_program, program, program_mut;
        buffers: BufferId => AttributeBuffer, insert_buffer, buffer, buffer_mut;
        index_buffers: IndexBufferId => IndexBuffer, insert_index_buffer, index_buffer, index_buffer_mut;
        vertex_arrays: VertexArrayId => VertexArray, insert_vertex_array, vertex_array, vertex_array_mut;
        textures: TextureId => Texture, insert_texture, texture, texture_mut;
        renderbuffers: RenderbufferId => Renderbuffer, insert_renderbuffer, renderbuffer, renderbuffer_mut;
        framebuffers: FramebufferId => Framebuffer, insert_framebuffer, framebuffer, framebuffer_mut;
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        match id {
            ResourceId::Shader(id) => self.shaders.contains_key(&id),
            ResourceId::Program(id) => self.programs.contains_key(&id),
            ResourceId::AttributeBuffer(id) => self.buffers.contains_key(&id),
            ResourceId::IndexBuffer(id) => self.index_buffers.contains_key(&id),
            ResourceId::VertexArray(id) => self.vertex_arrays.contains_key(&id),
            ResourceId::Texture(id) => self.textures.contains_key(&id),
            ResourceId::Renderbuffer(id) => self.renderbuffers.contains_key(&id),
            ResourceId::Framebuffer(id) => self.framebuffers.contains_key(&id),
        }
    }

    /// Drop a descriptor, returning the GL object to delete.
    pub fn remove(&mut self, id: ResourceId) -> Result<GlObject> {
        let object = match id {
            ResourceId::Shader(id) => self.shaders.remove(&id).map(|r| GlObject::Shader(r.handle)),
            ResourceId::Program(id) => self.programs.remove(&id).map(|r| GlObject::Program(r.handle)),
            ResourceId::AttributeBuffer(id) => self.buffers.remove(&id).map(|r| GlObject::Buffer(r.handle)),
            ResourceId::IndexBuffer(id) => self.index_buffers.remove(&id).map(|r| GlObject::Buffer(r.handle)),
            ResourceId::VertexArray(id) => {
                self.vertex_arrays.remove(&id).map(|r| GlObject::VertexArray(r.handle))
            }
            ResourceId::Texture(id) => self.textures.remove(&id).map(|r| GlObject::Texture(r.handle)),
            ResourceId::Renderbuffer(id) => {
                self.renderbuffers.remove(&id).map(|r| GlObject::Renderbuffer(r.handle))
            }
            ResourceId::Framebuffer(id) => {
                self.framebuffers.remove(&id).map(|r| GlObject::Framebuffer(r.handle))
            }
        };
        object.ok_or_else(|| stale(id))
    }

    pub fn stats(&self) -> RegistryCounts {
        RegistryCounts {
            shaders: self.shaders.len(),
            programs: self.programs.len(),
            buffers: self.buffers.len(),
            index_buffers: self.index_buffers.len(),
            vertex_arrays: self.vertex_arrays.len(),
            textures: self.textures.len(),
            renderbuffers: self.renderbuffers.len(),
            framebuffers: self.framebuffers.len(),
        }
    }
}

/// Live descriptor counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCounts {
    pub shaders: usize,
    pub programs: usize,
    pub buffers: usize,
    pub index_buffers: usize,
    pub vertex_arrays: usize,
    pub textures: usize,
    pub renderbuffers: usize,
    pub framebuffers: usize,
}

impl RegistryCounts {
    pub fn total(&self) -> usize {
        self.shaders
            + self.programs
            + self.buffers
            + self.index_buffers
            + self.vertex_arrays
            + self.textures
            + self.renderbuffers
            + self.framebuffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glkit_webgl::WebGLObject;

    fn renderbuffer() -> Renderbuffer {
        Renderbuffer {
            name: "depth".into(),
            format: TextureFormat::Depth24,
            width: 4,
            height: 4,
            samples: 0,
            handle: WebGLObject::from_raw(42),
        }
    }

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let mut registry = Registry::new();
        let a = registry.insert_renderbuffer(renderbuffer());
        let b = registry.insert_renderbuffer(renderbuffer());
        assert_ne!(a, b);
        assert_eq!(registry.stats().renderbuffers, 2);
    }

    #[test]
    fn test_remove_then_lookup_is_stale() {
        let mut registry = Registry::new();
        let id = registry.insert_renderbuffer(renderbuffer());

        assert_eq!(
            registry.remove(id.into()).unwrap(),
            GlObject::Renderbuffer(WebGLObject::from_raw(42))
        );
        assert!(!registry.contains(id.into()));
        assert!(matches!(
            registry.renderbuffer(id),
            Err(GlKitError::StaleHandle { kind: "renderbuffer", .. })
        ));
        assert!(registry.remove(id.into()).is_err());
    }

    #[test]
    fn test_display() {
        let mut registry = Registry::new();
        let id = registry.insert_renderbuffer(renderbuffer());
        assert_eq!(id.to_string(), format!("renderbuffer #{}", id.raw()));
    }
}
