//! Framebuffer builder.
//!
//! Attachments are checked before any GL object exists, in the order the
//! platform reports them: missing, format class, dimensions, samples. The
//! platform status is still queried afterwards and has the final word.

use glkit_webgl::{constants, Gl};
use tracing::debug;

use crate::context::GlKit;
use crate::error::{GlKitError, IncompleteReason, Result};
use crate::resources::{Framebuffer, FramebufferId, RenderbufferId, TextureId};
use crate::types::{TextureFormat, TextureTarget};

/// Where an image is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    pub fn gl_enum(self) -> u32 {
        match self {
            AttachmentPoint::Color(index) => constants::COLOR_ATTACHMENT0 + index,
            AttachmentPoint::Depth => constants::DEPTH_ATTACHMENT,
            AttachmentPoint::Stencil => constants::STENCIL_ATTACHMENT,
            AttachmentPoint::DepthStencil => constants::DEPTH_STENCIL_ATTACHMENT,
        }
    }

    /// Whether an image of `format` can be attached here.
    pub fn accepts(self, format: TextureFormat) -> bool {
        match self {
            AttachmentPoint::Color(_) => format.is_color(),
            AttachmentPoint::Depth => format.has_depth(),
            AttachmentPoint::Stencil => format.has_stencil(),
            AttachmentPoint::DepthStencil => format.has_depth() && format.has_stencil(),
        }
    }
}

/// The image attached at one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// A texture level. `layer` selects the layer of a 3D or array texture
    /// or the face (0-5) of a cube map, and must be `None` for 2D textures.
    Texture {
        texture: TextureId,
        level: u32,
        layer: Option<u32>,
    },
    Renderbuffer(RenderbufferId),
}

impl Attachment {
    /// Level 0 of a 2D texture.
    pub fn texture(texture: TextureId) -> Self {
        Attachment::Texture {
            texture,
            level: 0,
            layer: None,
        }
    }

    pub fn texture_layer(texture: TextureId, level: u32, layer: u32) -> Self {
        Attachment::Texture {
            texture,
            level,
            layer: Some(layer),
        }
    }
}

impl From<RenderbufferId> for Attachment {
    fn from(id: RenderbufferId) -> Self {
        Attachment::Renderbuffer(id)
    }
}

/// An attachment resolved against the registry.
#[derive(Debug, Clone, Copy)]
struct ResolvedAttachment {
    point: AttachmentPoint,
    attachment: Attachment,
    format: TextureFormat,
    width: u32,
    height: u32,
    samples: u32,
}

impl<G: Gl> GlKit<G> {
    /// Create a framebuffer and verify it is complete.
    pub fn create_framebuffer(
        &mut self,
        name: &str,
        attachments: &[(AttachmentPoint, Attachment)],
    ) -> Result<FramebufferId> {
        let result = self.create_framebuffer_inner(name, attachments);
        self.check_gl("create_framebuffer");
        self.finish(result)
    }

    /// Direct subsequent draws into `framebuffer`, or the default one for `None`.
    pub fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) -> Result<()> {
        let result = match framebuffer {
            Some(id) => self.registry.framebuffer(id).map(|f| Some(f.handle)),
            None => Ok(None),
        };
        let result = result.map(|handle| self.gl.bind_framebuffer(constants::FRAMEBUFFER, handle));
        self.finish(result)
    }

    fn create_framebuffer_inner(
        &mut self,
        name: &str,
        attachments: &[(AttachmentPoint, Attachment)],
    ) -> Result<FramebufferId> {
        let incomplete = |reason| GlKitError::IncompleteFramebuffer {
            name: name.to_string(),
            reason,
        };
        if attachments.is_empty() {
            return Err(incomplete(IncompleteReason::MissingAttachment));
        }

        let mut resolved: Vec<ResolvedAttachment> = Vec::with_capacity(attachments.len());
        for &(point, attachment) in attachments {
            if resolved.iter().any(|r| r.point == point) {
                return Err(GlKitError::validation(format!(
                    "framebuffer '{name}' attaches {point:?} twice"
                )));
            }
            if let AttachmentPoint::Color(index) = point {
                if index >= self.limits.max_color_attachments {
                    return Err(GlKitError::validation(format!(
                        "framebuffer '{}' uses color attachment {}, but only {} exist",
                        name, index, self.limits.max_color_attachments
                    )));
                }
            }
            resolved.push(self.resolve_attachment(name, point, attachment)?);
        }

        if resolved.iter().any(|r| !r.point.accepts(r.format)) {
            return Err(incomplete(IncompleteReason::UnsupportedCombination));
        }
        let has = |point| resolved.iter().find(|r| r.point == point);
        if has(AttachmentPoint::DepthStencil).is_some()
            && (has(AttachmentPoint::Depth).is_some() || has(AttachmentPoint::Stencil).is_some())
        {
            return Err(incomplete(IncompleteReason::UnsupportedCombination));
        }
        if let (Some(depth), Some(stencil)) = (has(AttachmentPoint::Depth), has(AttachmentPoint::Stencil)) {
            if depth.attachment != stencil.attachment {
                return Err(incomplete(IncompleteReason::UnsupportedCombination));
            }
        }

        let first = resolved[0];
        if resolved.iter().any(|r| r.width != first.width || r.height != first.height) {
            return Err(incomplete(IncompleteReason::DimensionMismatch));
        }
        if resolved.iter().any(|r| r.samples != first.samples) {
            return Err(incomplete(IncompleteReason::MultisampleMismatch));
        }

        let handle = self
            .gl
            .create_framebuffer()
            .ok_or_else(|| GlKitError::ResourceCreation(format!("framebuffer '{name}'")))?;
        self.gl.bind_framebuffer(constants::FRAMEBUFFER, Some(handle));
        let attached = self.attach_all(&resolved);
        let status = self.gl.check_framebuffer_status(constants::FRAMEBUFFER);
        self.gl.bind_framebuffer(constants::FRAMEBUFFER, None);

        let failure = match attached {
            Err(err) => Some(err),
            Ok(()) => IncompleteReason::from_status(status).map(incomplete),
        };
        if let Some(err) = failure {
            self.gl.delete_framebuffer(handle);
            return Err(err);
        }

        debug!(
            framebuffer = name,
            attachments = resolved.len(),
            width = first.width,
            height = first.height,
            samples = first.samples,
            "created framebuffer"
        );
        let id = self.registry.insert_framebuffer(Framebuffer {
            name: name.to_string(),
            width: first.width,
            height: first.height,
            samples: first.samples,
            handle,
        });
        self.cache.track(id.into());
        Ok(id)
    }

    fn resolve_attachment(
        &self,
        name: &str,
        point: AttachmentPoint,
        attachment: Attachment,
    ) -> Result<ResolvedAttachment> {
        match attachment {
            Attachment::Renderbuffer(id) => {
                let rb = self.registry.renderbuffer(id)?;
                Ok(ResolvedAttachment {
                    point,
                    attachment,
                    format: rb.format,
                    width: rb.width,
                    height: rb.height,
                    samples: rb.samples,
                })
            }
            Attachment::Texture { texture, level, layer } => {
                let tex = self.registry.texture(texture)?;
                if level >= tex.levels {
                    return Err(GlKitError::validation(format!(
                        "framebuffer '{}': texture '{}' has no level {}",
                        name, tex.name, level
                    )));
                }
                let layer_ok = match (tex.target, layer) {
                    (TextureTarget::Texture2D, None) => true,
                    (TextureTarget::Texture2D, Some(_)) | (_, None) => false,
                    (TextureTarget::Texture3D, Some(l)) => l < (tex.depth >> level).max(1),
                    (_, Some(l)) => l < tex.layers(),
                };
                if !layer_ok {
                    return Err(GlKitError::validation(format!(
                        "framebuffer '{}': layer {:?} is not valid for {} texture '{}'",
                        name, layer, tex.target, tex.name
                    )));
                }
                let (width, height) = tex.level_size(level);
                Ok(ResolvedAttachment {
                    point,
                    attachment,
                    format: tex.format,
                    width,
                    height,
                    samples: 0,
                })
            }
        }
    }

    /// Attach every image to the bound framebuffer and set its draw buffers.
    fn attach_all(&mut self, resolved: &[ResolvedAttachment]) -> Result<()> {
        for r in resolved {
            let point = r.point.gl_enum();
            match r.attachment {
                Attachment::Renderbuffer(id) => {
                    let handle = self.registry.renderbuffer(id)?.handle;
                    self.gl.framebuffer_renderbuffer(
                        constants::FRAMEBUFFER,
                        point,
                        constants::RENDERBUFFER,
                        Some(handle),
                    );
                }
                Attachment::Texture { texture, level, layer } => {
                    let tex = self.registry.texture(texture)?;
                    let (target, handle) = (tex.target, tex.handle);
                    match (target, layer) {
                        (TextureTarget::CubeMap, Some(face)) => self.gl.framebuffer_texture_2d(
                            constants::FRAMEBUFFER,
                            point,
                            constants::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                            Some(handle),
                            level as i32,
                        ),
                        (_, Some(layer)) => self.gl.framebuffer_texture_layer(
                            constants::FRAMEBUFFER,
                            point,
                            Some(handle),
                            level as i32,
                            layer as i32,
                        ),
                        (_, None) => self.gl.framebuffer_texture_2d(
                            constants::FRAMEBUFFER,
                            point,
                            constants::TEXTURE_2D,
                            Some(handle),
                            level as i32,
                        ),
                    }
                }
            }
        }

        self.gl.draw_buffers(&draw_buffers(resolved));
        Ok(())
    }
}

/// `drawBuffers` list: each used color index maps to itself, gaps to `NONE`.
fn draw_buffers(resolved: &[ResolvedAttachment]) -> Vec<u32> {
    let colors: Vec<u32> = resolved
        .iter()
        .filter_map(|r| match r.point {
            AttachmentPoint::Color(index) => Some(index),
            _ => None,
        })
        .collect();
    match colors.iter().max() {
        None => vec![constants::NONE],
        Some(&last) => (0..=last)
            .map(|i| {
                if colors.contains(&i) {
                    constants::COLOR_ATTACHMENT0 + i
                } else {
                    constants::NONE
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::texture::TextureDesc;
    use glkit_webgl::{AttachmentData, SoftwareGl};

    fn texture(kit: &mut GlKit<SoftwareGl>, format: TextureFormat, size: u32) -> TextureId {
        kit.create_texture("t", &TextureDesc::new_2d(format, size, size)).unwrap()
    }

    fn reason(err: GlKitError) -> IncompleteReason {
        match err {
            GlKitError::IncompleteFramebuffer { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_complete_framebuffer() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let color = texture(&mut kit, TextureFormat::Rgba8, 64);
        let normal = texture(&mut kit, TextureFormat::Rgba16F, 64);
        let depth = kit.create_renderbuffer("depth", TextureFormat::Depth24Stencil8, 64, 64, 0).unwrap();

        let id = kit
            .create_framebuffer(
                "gbuffer",
                &[
                    (AttachmentPoint::Color(0), Attachment::texture(color)),
                    (AttachmentPoint::Color(2), Attachment::texture(normal)),
                    (AttachmentPoint::DepthStencil, depth.into()),
                ],
            )
            .unwrap();

        let fb = kit.framebuffer(id).unwrap();
        assert_eq!((fb.width, fb.height), (64, 64));
        let data = kit.gl().get_framebuffer_data(fb.handle).unwrap();
        assert_eq!(data.attachments.len(), 3);
        assert_eq!(
            data.draw_buffers,
            vec![constants::COLOR_ATTACHMENT0, constants::NONE, constants::COLOR_ATTACHMENT0 + 2]
        );
        assert_eq!(kit.gl().state().current_draw_framebuffer, None);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let color = texture(&mut kit, TextureFormat::Rgba8, 256);
        let depth = texture(&mut kit, TextureFormat::Depth24, 512);

        let err = kit
            .create_framebuffer(
                "shadow",
                &[
                    (AttachmentPoint::Color(0), Attachment::texture(color)),
                    (AttachmentPoint::Depth, Attachment::texture(depth)),
                ],
            )
            .unwrap_err();
        assert_eq!(reason(err), IncompleteReason::DimensionMismatch);
        assert_eq!(kit.stats().live.framebuffers, 0);
    }

    #[test]
    fn test_incompleteness_taxonomy() {
        let mut kit = GlKit::new(SoftwareGl::new());
        assert_eq!(reason(kit.create_framebuffer("empty", &[]).unwrap_err()), IncompleteReason::MissingAttachment);

        let color = texture(&mut kit, TextureFormat::Rgba8, 32);
        let err = kit
            .create_framebuffer("swapped", &[(AttachmentPoint::Depth, Attachment::texture(color))])
            .unwrap_err();
        assert_eq!(reason(err), IncompleteReason::UnsupportedCombination);

        let msaa = kit.create_renderbuffer("msaa", TextureFormat::Rgba8, 32, 32, 4).unwrap();
        let err = kit
            .create_framebuffer(
                "mixed",
                &[
                    (AttachmentPoint::Color(0), Attachment::texture(color)),
                    (AttachmentPoint::Color(1), msaa.into()),
                ],
            )
            .unwrap_err();
        assert_eq!(reason(err), IncompleteReason::MultisampleMismatch);
    }

    #[test]
    fn test_layers_and_faces() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let cube = kit.create_texture("env", &TextureDesc::new_cube(TextureFormat::Rgba8, 16)).unwrap();
        let array = kit
            .create_texture("cascades", &TextureDesc::new_array(TextureFormat::Depth32F, 16, 16, 4))
            .unwrap();

        let id = kit
            .create_framebuffer(
                "face",
                &[
                    (AttachmentPoint::Color(0), Attachment::texture_layer(cube, 0, 3)),
                    (AttachmentPoint::Depth, Attachment::texture_layer(array, 0, 2)),
                ],
            )
            .unwrap();
        let handle = kit.framebuffer(id).unwrap().handle;
        let data = kit.gl().get_framebuffer_data(handle).unwrap();
        assert!(matches!(
            data.attachments[&constants::DEPTH_ATTACHMENT],
            AttachmentData::Texture { layer: Some(2), .. }
        ));

        let err = kit
            .create_framebuffer("bad", &[(AttachmentPoint::Color(0), Attachment::texture(cube))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_bind_framebuffer() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let color = texture(&mut kit, TextureFormat::Rgba8, 8);
        let id = kit
            .create_framebuffer("target", &[(AttachmentPoint::Color(0), Attachment::texture(color))])
            .unwrap();

        kit.bind_framebuffer(Some(id)).unwrap();
        assert!(kit.gl().state().current_draw_framebuffer.is_some());
        kit.bind_framebuffer(None).unwrap();
        assert_eq!(kit.gl().state().current_draw_framebuffer, None);
    }
}
