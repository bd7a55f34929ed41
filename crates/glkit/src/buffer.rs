//! Attribute and index buffer builders.

use glkit_webgl::{constants, Gl};
use tracing::debug;

use crate::context::GlKit;
use crate::error::{GlKitError, Result};
use crate::layout::{self, AttributeSet};
use crate::resources::{AttributeBuffer, BufferId, IndexBuffer, IndexBufferId};
use crate::types::{BufferUsage, DrawMode, IndexType};

impl<G: Gl> GlKit<G> {
    /// Interleave `attributes` into one vertex buffer.
    ///
    /// `usage` falls back to the configured default.
    pub fn create_attribute_buffer(
        &mut self,
        name: &str,
        attributes: &AttributeSet,
        usage: Option<BufferUsage>,
    ) -> Result<BufferId> {
        let result = self.create_attribute_buffer_inner(name, attributes, usage);
        self.check_gl("create_attribute_buffer");
        self.finish(result)
    }

    fn create_attribute_buffer_inner(
        &mut self,
        name: &str,
        attributes: &AttributeSet,
        usage: Option<BufferUsage>,
    ) -> Result<BufferId> {
        let encoded = layout::encode(name, attributes)?;
        let usage = usage.unwrap_or(self.config.default_usage);

        let handle = self
            .gl
            .create_buffer()
            .ok_or_else(|| GlKitError::ResourceCreation(format!("attribute buffer '{name}'")))?;
        self.gl.bind_buffer(constants::ARRAY_BUFFER, Some(handle));
        self.gl.buffer_data(constants::ARRAY_BUFFER, &encoded.bytes, usage.gl_enum());
        self.gl.bind_buffer(constants::ARRAY_BUFFER, None);

        debug!(
            buffer = name,
            vertices = encoded.vertex_count,
            stride = encoded.stride,
            bytes = encoded.bytes.len(),
            "created attribute buffer"
        );
        let id = self.registry.insert_buffer(AttributeBuffer {
            name: name.to_string(),
            vertex_count: encoded.vertex_count,
            layout: encoded.layout,
            stride: encoded.stride,
            usage,
            handle,
        });
        self.cache.track(id.into());
        Ok(id)
    }

    /// Replace the contents of an attribute buffer.
    ///
    /// Attribute names, order and formats must match the existing buffer; the
    /// vertex count may change.
    pub fn update_attribute_buffer(&mut self, id: BufferId, attributes: &AttributeSet) -> Result<()> {
        let result = self.update_attribute_buffer_inner(id, attributes);
        self.check_gl("update_attribute_buffer");
        self.finish(result)
    }

    fn update_attribute_buffer_inner(&mut self, id: BufferId, attributes: &AttributeSet) -> Result<()> {
        let buffer = self.registry.buffer(id)?;
        let encoded = layout::encode(&buffer.name, attributes)?;

        let same_layout = encoded.layout.len() == buffer.layout.len()
            && encoded
                .layout
                .iter()
                .zip(&buffer.layout)
                .all(|((a, la), (b, lb))| a == b && la.same_format(lb));
        if !same_layout {
            return Err(GlKitError::validation(format!(
                "attribute buffer '{}' cannot change its layout; create a new buffer instead",
                buffer.name
            )));
        }

        let (handle, usage) = (buffer.handle, buffer.usage);
        self.gl.bind_buffer(constants::ARRAY_BUFFER, Some(handle));
        self.gl.buffer_data(constants::ARRAY_BUFFER, &encoded.bytes, usage.gl_enum());
        self.gl.bind_buffer(constants::ARRAY_BUFFER, None);

        let buffer = self.registry.buffer_mut(id)?;
        buffer.vertex_count = encoded.vertex_count;
        debug!(buffer = %buffer.name, vertices = encoded.vertex_count, "updated attribute buffer");
        Ok(())
    }

    /// Upload an index list, picking the narrowest index type that fits.
    pub fn create_index_buffer(
        &mut self,
        name: &str,
        indices: &[u64],
        mode: DrawMode,
        usage: Option<BufferUsage>,
    ) -> Result<IndexBufferId> {
        let result = self.create_index_buffer_inner(name, indices, mode, usage);
        self.check_gl("create_index_buffer");
        self.finish(result)
    }

    fn create_index_buffer_inner(
        &mut self,
        name: &str,
        indices: &[u64],
        mode: DrawMode,
        usage: Option<BufferUsage>,
    ) -> Result<IndexBufferId> {
        if indices.is_empty() {
            return Err(GlKitError::validation(format!("index buffer '{name}' is empty")));
        }
        mode.validate_count(indices.len())?;
        let max = indices.iter().copied().max().unwrap_or(0);
        let index_type = IndexType::for_max_index(max)?;
        let bytes = encode_indices(indices, index_type);
        let usage = usage.unwrap_or(self.config.default_usage);

        let handle = self
            .gl
            .create_buffer()
            .ok_or_else(|| GlKitError::ResourceCreation(format!("index buffer '{name}'")))?;
        // the element binding belongs to the bound vertex array
        self.gl.bind_vertex_array(None);
        self.gl.bind_buffer(constants::ELEMENT_ARRAY_BUFFER, Some(handle));
        self.gl.buffer_data(constants::ELEMENT_ARRAY_BUFFER, &bytes, usage.gl_enum());
        self.gl.bind_buffer(constants::ELEMENT_ARRAY_BUFFER, None);

        debug!(buffer = name, count = indices.len(), ?index_type, "created index buffer");
        let id = self.registry.insert_index_buffer(IndexBuffer {
            name: name.to_string(),
            index_type,
            count: indices.len(),
            usage,
            mode,
            handle,
        });
        self.cache.track(id.into());
        Ok(id)
    }
}

/// Little-endian index bytes; every index must fit `index_type`.
fn encode_indices(indices: &[u64], index_type: IndexType) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(indices.len() * index_type.byte_size());
    for &index in indices {
        match index_type {
            IndexType::UnsignedByte => bytes.push(index as u8),
            IndexType::UnsignedShort => bytes.extend_from_slice(&(index as u16).to_le_bytes()),
            IndexType::UnsignedInt => bytes.extend_from_slice(&(index as u32).to_le_bytes()),
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::layout::AttributeDesc;
    use glkit_webgl::SoftwareGl;

    fn positions() -> AttributeSet {
        AttributeSet::new().with(
            "a_pos",
            AttributeDesc::new(&[-1.0f32, -1.0, 1.0, -1.0, 0.0, 1.0], 2),
        )
    }

    #[test]
    fn test_attribute_buffer_upload() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let id = kit.create_attribute_buffer("tri", &positions(), None).unwrap();

        let buffer = kit.attribute_buffer(id).unwrap();
        assert_eq!(buffer.vertex_count, 3);
        assert_eq!(buffer.stride, 8);
        assert_eq!(buffer.usage, BufferUsage::StaticDraw);

        let data = kit.gl().get_buffer_data(buffer.handle).unwrap();
        assert_eq!(data.data.len(), 24);
        assert_eq!(&data.data[0..4], &(-1.0f32).to_le_bytes());
        assert_eq!(kit.gl().state().current_array_buffer, None);
    }

    #[test]
    fn test_update_keeps_layout() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let id = kit.create_attribute_buffer("tri", &positions(), None).unwrap();

        let grown = AttributeSet::new().with("a_pos", AttributeDesc::new(&[0.0f32; 8], 2));
        kit.update_attribute_buffer(id, &grown).unwrap();
        assert_eq!(kit.attribute_buffer(id).unwrap().vertex_count, 4);

        let reshaped = AttributeSet::new().with("a_pos", AttributeDesc::new(&[0.0f32; 9], 3));
        let err = kit.update_attribute_buffer(id, &reshaped).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_index_type_boundaries() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let cases = [
            (255, IndexType::UnsignedByte),
            (256, IndexType::UnsignedShort),
            (65535, IndexType::UnsignedShort),
            (65536, IndexType::UnsignedInt),
        ];
        for (max, expected) in cases {
            let id = kit
                .create_index_buffer("idx", &[0, 1, max], DrawMode::Triangles, None)
                .unwrap();
            let buffer = kit.index_buffer(id).unwrap();
            assert_eq!(buffer.index_type, expected, "max index {max}");
            let bytes = &kit.gl().get_buffer_data(buffer.handle).unwrap().data;
            assert_eq!(bytes.len(), 3 * expected.byte_size());
        }

        let err = kit
            .create_index_buffer("idx", &[0, 1, 1 << 32], DrawMode::Triangles, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_index_count_must_match_mode() {
        let mut kit = GlKit::new(SoftwareGl::new());
        assert!(kit.create_index_buffer("idx", &[0, 1], DrawMode::Triangles, None).is_err());
        assert!(kit.create_index_buffer("idx", &[], DrawMode::Points, None).is_err());
        assert!(kit.create_index_buffer("idx", &[0, 1], DrawMode::Lines, None).is_ok());
    }

    #[test]
    fn test_encode_indices_little_endian() {
        assert_eq!(encode_indices(&[1, 258], IndexType::UnsignedShort), vec![1, 0, 2, 1]);
    }
}
