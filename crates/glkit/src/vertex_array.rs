//! Vertex array builder.
//!
//! Buffer attributes are matched to program attributes by name. Buffers are
//! walked in the order given and attributes in layout order; the first
//! binding of a location wins and later ones are logged and dropped.

use std::collections::BTreeMap;

use glkit_webgl::{constants, Gl, WebGLVertexArray};
use tracing::{debug, trace, warn};

use crate::context::GlKit;
use crate::error::{GlKitError, Result};
use crate::resources::{
    AttributeBinding, BufferId, IndexBufferId, ProgramId, VertexArray, VertexArrayId,
};

impl<G: Gl> GlKit<G> {
    /// Bind `buffers` to the attributes of `program` and record `index_buffer`.
    ///
    /// Buffer attributes the program does not use are ignored; program
    /// attributes no buffer provides are reported when a draw call is created.
    pub fn create_vertex_array(
        &mut self,
        name: &str,
        program: ProgramId,
        index_buffer: IndexBufferId,
        buffers: &[BufferId],
    ) -> Result<VertexArrayId> {
        let result = self.create_vertex_array_inner(name, program, index_buffer, buffers);
        self.check_gl("create_vertex_array");
        self.finish(result)
    }

    fn create_vertex_array_inner(
        &mut self,
        name: &str,
        program: ProgramId,
        index_buffer: IndexBufferId,
        buffers: &[BufferId],
    ) -> Result<VertexArrayId> {
        let (index_handle, index_type, index_count, mode) = {
            let index = self.registry.index_buffer(index_buffer)?;
            (index.handle, index.index_type, index.count, index.mode)
        };
        // fail on stale ids before touching the context
        self.registry.program(program)?;
        for id in buffers {
            self.registry.buffer(*id)?;
        }

        let handle = self
            .gl
            .create_vertex_array()
            .ok_or_else(|| GlKitError::ResourceCreation(format!("vertex array '{name}'")))?;

        self.gl.bind_vertex_array(Some(handle));
        self.gl.bind_buffer(constants::ELEMENT_ARRAY_BUFFER, Some(index_handle));
        let bindings = self.bind_attributes(name, handle, program, buffers);
        self.gl.bind_vertex_array(None);
        self.gl.bind_buffer(constants::ARRAY_BUFFER, None);

        let bindings = match bindings {
            Ok(bindings) => bindings,
            Err(err) => {
                self.gl.delete_vertex_array(handle);
                return Err(err);
            }
        };

        debug!(vertex_array = name, locations = bindings.len(), "created vertex array");
        let id = self.registry.insert_vertex_array(VertexArray {
            name: name.to_string(),
            index_buffer,
            index_type,
            index_count,
            mode,
            bindings,
            handle,
        });
        self.cache.track(id.into());
        Ok(id)
    }

    /// Issue the attribute pointer calls; `vertex_array` must be bound.
    fn bind_attributes(
        &mut self,
        name: &str,
        vertex_array: WebGLVertexArray,
        program: ProgramId,
        buffers: &[BufferId],
    ) -> Result<BTreeMap<u32, AttributeBinding>> {
        let program = self.registry.program(program)?;
        let max_attribs = self.limits.max_vertex_attribs;
        let mut bindings: BTreeMap<u32, AttributeBinding> = BTreeMap::new();

        for &buffer_id in buffers {
            let buffer = self.registry.buffer(buffer_id)?;
            self.gl.bind_buffer(constants::ARRAY_BUFFER, Some(buffer.handle));

            for (attribute, layout) in &buffer.layout {
                let Some(info) = program.attributes.get(attribute) else {
                    trace!(buffer = %buffer.name, attribute = %attribute, "program does not use attribute");
                    continue;
                };

                let shader_integer = info.ty.is_integer();
                if shader_integer && !(layout.scalar_type.is_integer() && !layout.scalar_type.is_packed()) {
                    return Err(GlKitError::validation(format!(
                        "attribute '{}' of program '{}' is an integer input, but buffer '{}' holds {:?} data",
                        attribute, program.name, buffer.name, layout.scalar_type
                    )));
                }
                if info.location + layout.width > max_attribs {
                    return Err(GlKitError::validation(format!(
                        "attribute '{}' needs locations {}..{}, but only {} exist",
                        attribute,
                        info.location,
                        info.location + layout.width,
                        max_attribs
                    )));
                }

                for column in 0..layout.width {
                    let location = info.location + column;
                    if let Some(existing) = bindings.get(&location) {
                        warn!(
                            vertex_array = name,
                            location,
                            attribute = %attribute,
                            buffer = %buffer.name,
                            bound = %existing.attribute,
                            "location already bound, keeping the first binding"
                        );
                        continue;
                    }

                    let stride = buffer.stride as i32;
                    let offset = layout.column_offset(column) as i32;
                    let type_ = layout.scalar_type.gl_enum();
                    self.gl.enable_vertex_attrib_array(location);
                    if shader_integer {
                        self.gl
                            .vertex_attrib_i_pointer(location, layout.pointer_size(), type_, stride, offset);
                    } else {
                        self.gl.vertex_attrib_pointer(
                            location,
                            layout.pointer_size(),
                            type_,
                            layout.normalized,
                            stride,
                            offset,
                        );
                    }
                    if layout.divisor > 0 {
                        self.gl.vertex_attrib_divisor(location, layout.divisor);
                    }
                    trace!(?vertex_array, location, offset, stride, "bound attribute column");

                    bindings.insert(
                        location,
                        AttributeBinding {
                            buffer: buffer_id,
                            attribute: attribute.clone(),
                            column,
                            integer: shader_integer,
                        },
                    );
                }
            }
        }
        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::layout::{AttributeDesc, AttributeSet};
    use crate::types::{DrawMode, ScalarType};
    use glkit_webgl::SoftwareGl;

    const VS: &str = "in vec2 a_pos;\nin mat4 a_model;\nin uvec2 a_id;\n\
        void main() { gl_Position = a_model * vec4(a_pos, float(a_id.x), 1.0); }";
    const FS: &str = "out vec4 c;\nvoid main() { c = vec4(1.0); }";

    fn setup(kit: &mut GlKit<SoftwareGl>) -> (ProgramId, IndexBufferId) {
        let program = kit.create_program_from_source("inst", VS, FS, &[]).unwrap();
        let index = kit.create_index_buffer("idx", &[0, 1, 2], DrawMode::Triangles, None).unwrap();
        (program, index)
    }

    fn identity() -> Vec<f32> {
        (0..16).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_binds_matrix_columns_and_integers() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let (program, index) = setup(&mut kit);
        let geometry = kit
            .create_attribute_buffer(
                "geometry",
                &AttributeSet::new()
                    .with("a_pos", AttributeDesc::new(&[0.0f32; 6], 2))
                    .with("a_id", AttributeDesc::new(&[1u32, 2, 3, 4, 5, 6], 2).scalar_type(ScalarType::UnsignedInt))
                    .with("a_unused", AttributeDesc::new(&[0.0f32; 3], 1)),
                None,
            )
            .unwrap();
        let instances = kit
            .create_attribute_buffer(
                "instances",
                &AttributeSet::new().with("a_model", AttributeDesc::new(&identity(), 4).width(4).divisor(1)),
                None,
            )
            .unwrap();

        let vao = kit.create_vertex_array("inst", program, index, &[geometry, instances]).unwrap();

        let model = kit.attribute_location(program, "a_model").unwrap();
        let id_location = kit.attribute_location(program, "a_id").unwrap();
        let vertex_array = kit.vertex_array(vao).unwrap();
        assert_eq!(vertex_array.bindings.len(), 2 + 4);
        assert!(vertex_array.bindings[&id_location].integer);

        let data = kit.gl().get_vertex_array_data(vertex_array.handle).unwrap();
        for column in 0..4 {
            let pointer = &data.attribs[(model + column) as usize];
            assert!(pointer.enabled);
            assert_eq!(pointer.offset, (column * 16) as i32);
            assert_eq!(pointer.stride, 64);
            assert_eq!(pointer.divisor, 1);
        }
        assert!(data.attribs[id_location as usize].integer);
        assert!(data.element_buffer.is_some());
        assert_eq!(kit.gl().state().current_vertex_array, None);
    }

    #[test]
    fn test_first_writer_wins() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let (program, index) = setup(&mut kit);
        let first = kit
            .create_attribute_buffer("first", &AttributeSet::new().with("a_pos", AttributeDesc::new(&[1.0f32; 6], 2)), None)
            .unwrap();
        let second = kit
            .create_attribute_buffer("second", &AttributeSet::new().with("a_pos", AttributeDesc::new(&[2.0f32; 6], 2)), None)
            .unwrap();

        let vao = kit.create_vertex_array("dup", program, index, &[first, second]).unwrap();
        let location = kit.attribute_location(program, "a_pos").unwrap();
        assert_eq!(kit.vertex_array(vao).unwrap().bindings[&location].buffer, first);
    }

    #[test]
    fn test_float_data_for_integer_input_is_rejected() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let (program, index) = setup(&mut kit);
        let ids = kit
            .create_attribute_buffer("ids", &AttributeSet::new().with("a_id", AttributeDesc::new(&[0.0f32; 6], 2)), None)
            .unwrap();

        let err = kit.create_vertex_array("bad", program, index, &[ids]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(kit.stats().live.vertex_arrays, 0);
        assert_eq!(kit.gl().state().current_vertex_array, None);
    }
}
