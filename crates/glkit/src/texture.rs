//! Texture and renderbuffer builders.

use glkit_webgl::{constants, Gl};
use tracing::{debug, warn};

use crate::context::GlKit;
use crate::error::{GlKitError, Result};
use crate::resources::{Renderbuffer, RenderbufferId, Texture, TextureId};
use crate::types::{Filter, TextureFormat, TextureTarget, Wrap};

/// Initial contents of a texture's base level.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TextureSource {
    /// Allocate only.
    #[default]
    Empty,
    /// Tightly packed texels of every layer, in layer order.
    Pixels(Vec<u8>),
    /// One image per cube face, in `+X, -X, +Y, -Y, +Z, -Z` order.
    CubeFaces(Box<[Vec<u8>; 6]>),
}

/// Description of a texture to create.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub target: TextureTarget,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Depth of a 3D texture or layer count of an array; 1 otherwise.
    pub depth: u32,
    pub levels: u32,
    /// `None` picks nearest for integer and depth formats, linear otherwise.
    pub min_filter: Option<Filter>,
    pub mag_filter: Option<Filter>,
    pub wrap: Wrap,
    pub source: TextureSource,
    pub generate_mipmaps: bool,
}

impl TextureDesc {
    fn with_target(target: TextureTarget, format: TextureFormat, width: u32, height: u32, depth: u32) -> Self {
        Self {
            target,
            format,
            width,
            height,
            depth,
            levels: 1,
            min_filter: None,
            mag_filter: None,
            wrap: Wrap::ClampToEdge,
            source: TextureSource::Empty,
            generate_mipmaps: false,
        }
    }

    pub fn new_2d(format: TextureFormat, width: u32, height: u32) -> Self {
        Self::with_target(TextureTarget::Texture2D, format, width, height, 1)
    }

    pub fn new_3d(format: TextureFormat, width: u32, height: u32, depth: u32) -> Self {
        Self::with_target(TextureTarget::Texture3D, format, width, height, depth)
    }

    pub fn new_array(format: TextureFormat, width: u32, height: u32, layers: u32) -> Self {
        Self::with_target(TextureTarget::Texture2DArray, format, width, height, layers)
    }

    pub fn new_cube(format: TextureFormat, size: u32) -> Self {
        Self::with_target(TextureTarget::CubeMap, format, size, size, 1)
    }

    pub fn levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    pub fn filter(mut self, min: Filter, mag: Filter) -> Self {
        self.min_filter = Some(min);
        self.mag_filter = Some(mag);
        self
    }

    pub fn wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn pixels(mut self, data: Vec<u8>) -> Self {
        self.source = TextureSource::Pixels(data);
        self
    }

    pub fn cube_faces(mut self, faces: [Vec<u8>; 6]) -> Self {
        self.source = TextureSource::CubeFaces(Box::new(faces));
        self
    }

    /// Fill levels above the base with `generateMipmap` after upload.
    pub fn generate_mipmaps(mut self) -> Self {
        self.generate_mipmaps = true;
        self
    }

    fn resolved_filters(&self) -> (Filter, Filter) {
        let fallback = if self.format.is_integer() || !self.format.is_color() {
            Filter::Nearest
        } else {
            Filter::Linear
        };
        (
            self.min_filter.unwrap_or(fallback),
            self.mag_filter.unwrap_or(fallback),
        )
    }
}

/// `floor(log2(max(dims))) + 1`.
pub fn max_mip_levels(width: u32, height: u32, depth: u32) -> u32 {
    let largest = width.max(height).max(depth).max(1);
    u32::BITS - largest.leading_zeros()
}

fn cube_face(face: u32) -> u32 {
    constants::TEXTURE_CUBE_MAP_POSITIVE_X + face
}

impl<G: Gl> GlKit<G> {
    pub fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> Result<TextureId> {
        let result = self.create_texture_inner(name, desc);
        self.check_gl("create_texture");
        self.finish(result)
    }

    fn validate_texture(&self, name: &str, desc: &TextureDesc) -> Result<()> {
        let invalid = |reason: String| Err(GlKitError::validation(format!("texture '{name}': {reason}")));
        let limits = &self.limits;

        if desc.width == 0 || desc.height == 0 || desc.depth == 0 {
            return invalid(format!(
                "dimensions {}x{}x{} must be positive",
                desc.width, desc.height, desc.depth
            ));
        }
        if !desc.format.is_texturable() {
            return invalid(format!("{:?} can only back a renderbuffer", desc.format));
        }
        let (max_size, max_depth) = match desc.target {
            TextureTarget::Texture2D => (limits.max_texture_size, 1),
            TextureTarget::Texture3D => (limits.max_3d_texture_size, limits.max_3d_texture_size),
            TextureTarget::Texture2DArray => (limits.max_texture_size, limits.max_array_layers),
            TextureTarget::CubeMap => (limits.max_cube_map_size, 1),
        };
        if desc.width > max_size || desc.height > max_size || desc.depth > max_depth {
            return invalid(format!(
                "{}x{}x{} exceeds the {} limit of {}x{}x{}",
                desc.width, desc.height, desc.depth, desc.target, max_size, max_size, max_depth
            ));
        }
        if desc.target == TextureTarget::CubeMap && desc.width != desc.height {
            return invalid(format!("cube faces must be square, got {}x{}", desc.width, desc.height));
        }

        let mip_depth = if desc.target == TextureTarget::Texture3D { desc.depth } else { 1 };
        let max_levels = max_mip_levels(desc.width, desc.height, mip_depth);
        if desc.levels == 0 || desc.levels > max_levels {
            return invalid(format!("{} mip levels requested, 1..={} allowed", desc.levels, max_levels));
        }

        let (min, mag) = desc.resolved_filters();
        if mag.uses_mipmaps() {
            return invalid(format!("{mag:?} is not a magnification filter"));
        }
        if (desc.format.is_integer() || !desc.format.is_color()) && (min.is_linear() || mag.is_linear()) {
            return invalid(format!("{:?} textures cannot be sampled with linear filtering", desc.format));
        }
        if desc.generate_mipmaps && (desc.format.is_integer() || !desc.format.is_color()) {
            return invalid(format!("cannot generate mipmaps for {:?}", desc.format));
        }

        let layer_bytes = desc.width as usize * desc.height as usize * desc.format.bytes_per_texel();
        match (&desc.source, desc.target) {
            (TextureSource::Empty, _) => {}
            (TextureSource::CubeFaces(faces), TextureTarget::CubeMap) => {
                if let Some((face, data)) = faces.iter().enumerate().find(|(_, d)| d.len() != layer_bytes) {
                    return invalid(format!("cube face {} has {} bytes, expected {}", face, data.len(), layer_bytes));
                }
            }
            (TextureSource::CubeFaces(_), _) => {
                return invalid("cube faces given for a non-cube texture".to_string());
            }
            (TextureSource::Pixels(_), TextureTarget::CubeMap) => {
                return invalid("cube maps take one image per face".to_string());
            }
            (TextureSource::Pixels(data), _) => {
                let expected = layer_bytes * desc.depth as usize;
                if data.len() != expected {
                    return invalid(format!("{} bytes of pixel data, expected {}", data.len(), expected));
                }
            }
        }
        Ok(())
    }

    fn create_texture_inner(&mut self, name: &str, desc: &TextureDesc) -> Result<TextureId> {
        self.validate_texture(name, desc)?;
        let (min, mag) = desc.resolved_filters();
        if min.uses_mipmaps() && desc.levels == 1 {
            warn!(texture = name, ?min, "mipmap filter on a single-level texture");
        }

        let handle = self
            .gl
            .create_texture()
            .ok_or_else(|| GlKitError::ResourceCreation(format!("texture '{name}'")))?;
        let target = desc.target.gl_enum();
        let (format, type_) = desc.format.upload_format();
        let (w, h, d) = (desc.width as i32, desc.height as i32, desc.depth as i32);

        self.gl.active_texture(constants::TEXTURE0);
        self.gl.bind_texture(target, Some(handle));
        if desc.target.is_layered() {
            self.gl
                .tex_storage_3d(target, desc.levels as i32, desc.format.internal_format(), w, h, d);
        } else {
            self.gl
                .tex_storage_2d(target, desc.levels as i32, desc.format.internal_format(), w, h);
        }

        match &desc.source {
            TextureSource::Empty => {}
            TextureSource::Pixels(data) if desc.target.is_layered() => {
                self.gl.tex_sub_image_3d(target, 0, 0, 0, 0, w, h, d, format, type_, data);
            }
            TextureSource::Pixels(data) => {
                self.gl.tex_sub_image_2d(target, 0, 0, 0, w, h, format, type_, data);
            }
            TextureSource::CubeFaces(faces) => {
                for (face, data) in (0u32..).zip(faces.iter()) {
                    self.gl
                        .tex_sub_image_2d(cube_face(face), 0, 0, 0, w, h, format, type_, data);
                }
            }
        }

        self.gl.tex_parameteri(target, constants::TEXTURE_MIN_FILTER, min.gl_enum() as i32);
        self.gl.tex_parameteri(target, constants::TEXTURE_MAG_FILTER, mag.gl_enum() as i32);
        let wrap = desc.wrap.gl_enum() as i32;
        self.gl.tex_parameteri(target, constants::TEXTURE_WRAP_S, wrap);
        self.gl.tex_parameteri(target, constants::TEXTURE_WRAP_T, wrap);
        if desc.target == TextureTarget::Texture3D {
            self.gl.tex_parameteri(target, constants::TEXTURE_WRAP_R, wrap);
        }
        if desc.generate_mipmaps && desc.levels > 1 {
            self.gl.generate_mipmap(target);
        }
        self.gl.bind_texture(target, None);

        debug!(
            texture = name,
            target = %desc.target,
            format = ?desc.format,
            width = desc.width,
            height = desc.height,
            depth = desc.depth,
            levels = desc.levels,
            "created texture"
        );
        let id = self.registry.insert_texture(Texture {
            name: name.to_string(),
            target: desc.target,
            format: desc.format,
            width: desc.width,
            height: desc.height,
            depth: desc.depth,
            levels: desc.levels,
            handle,
        });
        self.cache.track(id.into());
        Ok(id)
    }

    /// Replace one whole layer (or cube face) of one mip level.
    pub fn update_texture(&mut self, id: TextureId, level: u32, layer: u32, data: &[u8]) -> Result<()> {
        let result = self.update_texture_inner(id, level, layer, data);
        self.check_gl("update_texture");
        self.finish(result)
    }

    fn update_texture_inner(&mut self, id: TextureId, level: u32, layer: u32, data: &[u8]) -> Result<()> {
        let texture = self.registry.texture(id)?;
        if level >= texture.levels {
            return Err(GlKitError::validation(format!(
                "texture '{}' has {} levels, cannot update level {}",
                texture.name, texture.levels, level
            )));
        }
        let layers = match texture.target {
            TextureTarget::Texture3D => (texture.depth >> level).max(1),
            _ => texture.layers(),
        };
        if layer >= layers {
            return Err(GlKitError::validation(format!(
                "texture '{}' has {} layers at level {}, cannot update layer {}",
                texture.name, layers, level, layer
            )));
        }
        let (w, h) = texture.level_size(level);
        let expected = w as usize * h as usize * texture.format.bytes_per_texel();
        if data.len() != expected {
            return Err(GlKitError::validation(format!(
                "texture '{}' level {} takes {} bytes per layer, got {}",
                texture.name, level, expected, data.len()
            )));
        }

        let (format, type_) = texture.format.upload_format();
        let (target, handle) = (texture.target, texture.handle);
        let bind_target = target.gl_enum();
        self.gl.active_texture(constants::TEXTURE0);
        self.gl.bind_texture(bind_target, Some(handle));
        match target {
            TextureTarget::Texture2D => self.gl.tex_sub_image_2d(
                bind_target, level as i32, 0, 0, w as i32, h as i32, format, type_, data,
            ),
            TextureTarget::CubeMap => self.gl.tex_sub_image_2d(
                cube_face(layer), level as i32, 0, 0, w as i32, h as i32, format, type_, data,
            ),
            TextureTarget::Texture3D | TextureTarget::Texture2DArray => self.gl.tex_sub_image_3d(
                bind_target, level as i32, 0, 0, layer as i32, w as i32, h as i32, 1, format, type_, data,
            ),
        }
        self.gl.bind_texture(bind_target, None);
        Ok(())
    }

    /// Regenerate levels above the base from level 0.
    pub fn generate_mipmaps(&mut self, id: TextureId) -> Result<()> {
        let result = self.generate_mipmaps_inner(id);
        self.check_gl("generate_mipmaps");
        self.finish(result)
    }

    fn generate_mipmaps_inner(&mut self, id: TextureId) -> Result<()> {
        let texture = self.registry.texture(id)?;
        if texture.format.is_integer() || !texture.format.is_color() {
            return Err(GlKitError::validation(format!(
                "cannot generate mipmaps for texture '{}' ({:?})",
                texture.name, texture.format
            )));
        }
        let (target, handle) = (texture.target.gl_enum(), texture.handle);
        self.gl.active_texture(constants::TEXTURE0);
        self.gl.bind_texture(target, Some(handle));
        self.gl.generate_mipmap(target);
        self.gl.bind_texture(target, None);
        Ok(())
    }

    /// Allocate a renderbuffer; `samples` of 0 is single-sampled.
    pub fn create_renderbuffer(
        &mut self,
        name: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<RenderbufferId> {
        let result = self.create_renderbuffer_inner(name, format, width, height, samples);
        self.check_gl("create_renderbuffer");
        self.finish(result)
    }

    fn create_renderbuffer_inner(
        &mut self,
        name: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<RenderbufferId> {
        let max = self.limits.max_renderbuffer_size;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(GlKitError::validation(format!(
                "renderbuffer '{name}': {width}x{height} must be within 1..={max}"
            )));
        }
        if samples > self.limits.max_samples {
            return Err(GlKitError::validation(format!(
                "renderbuffer '{}': {} samples requested, at most {} supported",
                name, samples, self.limits.max_samples
            )));
        }
        if samples > 0 && format.is_integer() {
            return Err(GlKitError::validation(format!(
                "renderbuffer '{name}': integer formats cannot be multisampled"
            )));
        }

        let handle = self
            .gl
            .create_renderbuffer()
            .ok_or_else(|| GlKitError::ResourceCreation(format!("renderbuffer '{name}'")))?;
        self.gl.bind_renderbuffer(constants::RENDERBUFFER, Some(handle));
        self.gl.renderbuffer_storage_multisample(
            constants::RENDERBUFFER,
            samples as i32,
            format.internal_format(),
            width as i32,
            height as i32,
        );
        self.gl.bind_renderbuffer(constants::RENDERBUFFER, None);

        debug!(renderbuffer = name, ?format, width, height, samples, "created renderbuffer");
        let id = self.registry.insert_renderbuffer(Renderbuffer {
            name: name.to_string(),
            format,
            width,
            height,
            samples,
            handle,
        });
        self.cache.track(id.into());
        Ok(id)
    }
}
