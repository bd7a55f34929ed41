//! The owning context.

use glkit_webgl::{constants, Gl, GlError};
use tracing::{debug, warn};

use crate::cache::{CacheStats, ResourceCache};
use crate::config::KitConfig;
use crate::error::{GlKitError, Result};
use crate::resources::{
    AttributeBuffer, Framebuffer, FramebufferId, GlObject, IndexBuffer, IndexBufferId, Program,
    ProgramId, Registry, RegistryCounts, Renderbuffer, RenderbufferId, ResourceId, Shader,
    ShaderId, Texture, TextureId, VertexArray, VertexArrayId, BufferId,
};
use crate::uniform::UniformValue;

/// Implementation limits, queried once from the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_vertex_attribs: u32,
    pub max_texture_units: u32,
    pub max_color_attachments: u32,
    pub max_draw_buffers: u32,
    pub max_renderbuffer_size: u32,
    pub max_texture_size: u32,
    pub max_3d_texture_size: u32,
    pub max_cube_map_size: u32,
    pub max_array_layers: u32,
    pub max_samples: u32,
}

impl Limits {
    pub fn query<G: Gl>(gl: &G) -> Self {
        let get = |pname| gl.get_parameter(pname).max(0) as u32;
        Self {
            max_vertex_attribs: get(constants::MAX_VERTEX_ATTRIBS),
            max_texture_units: get(constants::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
            max_color_attachments: get(constants::MAX_COLOR_ATTACHMENTS),
            max_draw_buffers: get(constants::MAX_DRAW_BUFFERS),
            max_renderbuffer_size: get(constants::MAX_RENDERBUFFER_SIZE),
            max_texture_size: get(constants::MAX_TEXTURE_SIZE),
            max_3d_texture_size: get(constants::MAX_3D_TEXTURE_SIZE),
            max_cube_map_size: get(constants::MAX_CUBE_MAP_TEXTURE_SIZE),
            max_array_layers: get(constants::MAX_ARRAY_TEXTURE_LAYERS),
            max_samples: get(constants::MAX_SAMPLES),
        }
    }
}

/// Snapshot of live resources and cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KitStats {
    pub live: RegistryCounts,
    pub cache: CacheStats,
}

impl KitStats {
    pub fn generation(&self) -> u64 {
        self.cache.generation
    }
}

/// A graphics context together with everything glkit built on it.
///
/// All resource builders and the draw executor are methods on this type;
/// see the `program`, `buffer`, `vertex_array`, `texture`, `framebuffer`
/// and `draw` modules.
pub struct GlKit<G: Gl> {
    pub(crate) gl: G,
    pub(crate) config: KitConfig,
    pub(crate) limits: Limits,
    pub(crate) cache: ResourceCache,
    pub(crate) registry: Registry,
}

impl<G: Gl> GlKit<G> {
    pub fn new(gl: G) -> Self {
        Self::with_config(gl, KitConfig::default())
    }

    pub fn with_config(gl: G, config: KitConfig) -> Self {
        let limits = Limits::query(&gl);
        debug!(?limits, debug = config.debug, "created glkit context");
        Self {
            gl,
            config,
            limits,
            cache: ResourceCache::new(),
            registry: Registry::new(),
        }
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    /// Direct access for calls glkit does not wrap.
    pub fn gl_mut(&mut self) -> &mut G {
        &mut self.gl
    }

    pub fn into_inner(self) -> G {
        self.gl
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn generation(&self) -> u64 {
        self.cache.generation()
    }

    // ==================== Lookups ====================

    pub fn shader(&self, id: ShaderId) -> Result<&Shader> {
        self.registry.shader(id)
    }

    pub fn program(&self, id: ProgramId) -> Result<&Program> {
        self.registry.program(id)
    }

    pub fn attribute_buffer(&self, id: BufferId) -> Result<&AttributeBuffer> {
        self.registry.buffer(id)
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Result<&IndexBuffer> {
        self.registry.index_buffer(id)
    }

    pub fn vertex_array(&self, id: VertexArrayId) -> Result<&VertexArray> {
        self.registry.vertex_array(id)
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture> {
        self.registry.texture(id)
    }

    pub fn renderbuffer(&self, id: RenderbufferId) -> Result<&Renderbuffer> {
        self.registry.renderbuffer(id)
    }

    pub fn framebuffer(&self, id: FramebufferId) -> Result<&Framebuffer> {
        self.registry.framebuffer(id)
    }

    pub fn contains(&self, id: impl Into<ResourceId>) -> bool {
        self.registry.contains(id.into())
    }

    /// Location of an active attribute.
    pub fn attribute_location(&self, program: ProgramId, name: &str) -> Result<u32> {
        let result = self.registry.program(program).and_then(|p| {
            p.attributes
                .get(name)
                .map(|a| a.location)
                .ok_or_else(|| GlKitError::UnknownAttribute {
                    program: p.name.clone(),
                    name: name.to_string(),
                })
        });
        self.finish(result)
    }

    /// Last value uploaded to an active uniform.
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Result<&UniformValue> {
        let result = self.registry.program(program).and_then(|p| {
            p.uniforms
                .get(name)
                .map(|u| &u.value)
                .ok_or_else(|| GlKitError::UnknownUniform {
                    program: p.name.clone(),
                    name: name.to_string(),
                })
        });
        self.finish(result)
    }

    // ==================== Lifetime ====================

    /// Start a new generation.
    ///
    /// Cached shaders and programs not created or reused within the last
    /// `keep_last` generations are deleted, as is every other resource.
    pub fn reset_context(&mut self, keep_last: u64) {
        self.gl.bind_vertex_array(None);
        self.gl.use_program(None);
        self.gl.bind_framebuffer(constants::FRAMEBUFFER, None);

        let evicted = self.cache.advance(keep_last);
        let count = evicted.len();
        for id in evicted {
            if let Ok(object) = self.registry.remove(id) {
                self.delete_object(object);
            }
        }
        debug!(generation = self.cache.generation(), deleted = count, "context reset");
        self.check_gl("reset_context");
    }

    /// [`reset_context`](Self::reset_context) with the configured `keep_generations`.
    pub fn reset_default(&mut self) {
        self.reset_context(self.config.keep_generations);
    }

    /// Delete one resource now.
    pub fn delete(&mut self, id: impl Into<ResourceId>) -> Result<()> {
        let id = id.into();
        let result = self.registry.remove(id).map(|object| {
            self.cache.forget(id);
            self.delete_object(object);
        });
        self.finish(result)
    }

    pub fn stats(&self) -> KitStats {
        KitStats {
            live: self.registry.stats(),
            cache: self.cache.stats(),
        }
    }

    // ==================== Internals ====================

    pub(crate) fn delete_object(&mut self, object: GlObject) {
        match object {
            GlObject::Shader(h) => self.gl.delete_shader(h),
            GlObject::Program(h) => self.gl.delete_program(h),
            GlObject::Buffer(h) => self.gl.delete_buffer(h),
            GlObject::VertexArray(h) => self.gl.delete_vertex_array(h),
            GlObject::Texture(h) => self.gl.delete_texture(h),
            GlObject::Renderbuffer(h) => self.gl.delete_renderbuffer(h),
            GlObject::Framebuffer(h) => self.gl.delete_framebuffer(h),
        }
    }

    /// Apply the configured error detail level.
    pub(crate) fn finish<T>(&self, result: Result<T>) -> Result<T> {
        if self.config.debug {
            result
        } else {
            result.map_err(GlKitError::redact)
        }
    }

    /// In debug mode, drain and log the context error flag.
    pub(crate) fn check_gl(&mut self, operation: &str) {
        if !self.config.debug {
            return;
        }
        // a lost context can report the same error forever
        for _ in 0..8 {
            let code = self.gl.get_error();
            if code == constants::NO_ERROR {
                break;
            }
            match GlError::from_code(code) {
                Some(error) => warn!(operation, %error, "context reported an error"),
                None => warn!(operation, code, "context reported an unknown error"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::TextureFormat;
    use glkit_webgl::{SoftwareGl, SoftwareLimits};

    #[test]
    fn test_limits_come_from_the_context() {
        let gl = SoftwareGl::with_limits(SoftwareLimits {
            max_vertex_attribs: 8,
            ..SoftwareLimits::default()
        });
        let kit = GlKit::new(gl);
        assert_eq!(kit.limits().max_vertex_attribs, 8);
        assert_eq!(kit.limits().max_texture_units, 32);
    }

    #[test]
    fn test_non_debug_redacts() {
        let config = KitConfig {
            debug: false,
            ..KitConfig::default()
        };
        let mut kit = GlKit::with_config(SoftwareGl::new(), config);
        let rb = kit
            .create_renderbuffer("depth", TextureFormat::Depth16, 4, 4, 0)
            .unwrap();
        kit.delete(rb).unwrap();
        let err = kit.delete(rb).unwrap_err();
        assert_eq!(err, GlKitError::Redacted(ErrorKind::Validation));
    }

    #[test]
    fn test_debug_keeps_details() {
        let config = KitConfig {
            debug: true,
            ..KitConfig::default()
        };
        let mut kit = GlKit::with_config(SoftwareGl::new(), config);
        let rb = kit
            .create_renderbuffer("depth", TextureFormat::Depth16, 4, 4, 0)
            .unwrap();
        kit.delete(rb).unwrap();
        assert_eq!(kit.gl().live_objects(), 0);
        let err = kit.delete(rb).unwrap_err();
        assert!(matches!(err, GlKitError::StaleHandle { kind: "renderbuffer", .. }));
    }

    #[test]
    fn test_empty_stats() {
        let kit = GlKit::new(SoftwareGl::new());
        let stats = kit.stats();
        assert_eq!(stats.live.total(), 0);
        assert_eq!(stats.generation(), 0);
    }
}
