//! Shader and program builders.

use tracing::{debug, info_span};

use glkit_webgl::Gl;

use crate::context::GlKit;
use crate::error::{GlKitError, Result};
use crate::reflect::{discover_attributes, discover_uniforms};
use crate::resources::{Program, ProgramId, Shader, ShaderId};
use crate::types::ShaderStage;
use crate::uniform::{self, UniformValue};

impl<G: Gl> GlKit<G> {
    /// Compile a shader, reusing a cached one with the same stage and source.
    pub fn create_shader(&mut self, name: &str, stage: ShaderStage, source: &str) -> Result<ShaderId> {
        let result = self.create_shader_inner(name, stage, source);
        self.check_gl("create_shader");
        self.finish(result)
    }

    fn create_shader_inner(&mut self, name: &str, stage: ShaderStage, source: &str) -> Result<ShaderId> {
        if let Some(id) = self.cache.shader(stage, source) {
            debug!(shader = name, %stage, %id, "reusing cached shader");
            return Ok(id);
        }

        let handle = self
            .gl
            .create_shader(stage.gl_enum())
            .ok_or_else(|| GlKitError::ResourceCreation(format!("{stage} shader '{name}'")))?;
        self.gl.shader_source(handle, source);
        self.gl.compile_shader(handle);

        if !self.gl.get_shader_compile_status(handle) {
            let log = self.gl.get_shader_info_log(handle);
            self.gl.delete_shader(handle);
            return Err(GlKitError::CompileFailure {
                name: name.to_string(),
                stage,
                log,
            });
        }

        let id = self.registry.insert_shader(Shader {
            name: name.to_string(),
            stage,
            source: source.to_string(),
            handle,
        });
        self.cache.insert_shader(stage, source, id);
        debug!(shader = name, %stage, %id, "compiled shader");
        Ok(id)
    }

    /// Link two shaders into a program and reflect its interface.
    ///
    /// `uniforms` overrides the default values (and sampler units) of the
    /// named uniforms; every name must be an active uniform. Programs are
    /// cached by their shader sources, so a second call with identical
    /// sources returns the first program unchanged.
    pub fn create_program(
        &mut self,
        name: &str,
        vertex: ShaderId,
        fragment: ShaderId,
        uniforms: &[(&str, UniformValue)],
    ) -> Result<ProgramId> {
        let span = info_span!("create_program", program = name);
        let _enter = span.enter();
        let result = self.create_program_inner(name, vertex, fragment, uniforms);
        self.check_gl("create_program");
        self.finish(result)
    }

    /// Compile both stages and link them; see [`create_program`](Self::create_program).
    pub fn create_program_from_source(
        &mut self,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
        uniforms: &[(&str, UniformValue)],
    ) -> Result<ProgramId> {
        let vertex = self.create_shader(&format!("{name}.vert"), ShaderStage::Vertex, vertex_source)?;
        let fragment =
            self.create_shader(&format!("{name}.frag"), ShaderStage::Fragment, fragment_source)?;
        self.create_program(name, vertex, fragment, uniforms)
    }

    fn create_program_inner(
        &mut self,
        name: &str,
        vertex: ShaderId,
        fragment: ShaderId,
        uniforms: &[(&str, UniformValue)],
    ) -> Result<ProgramId> {
        let vs = self.registry.shader(vertex)?.clone();
        let fs = self.registry.shader(fragment)?.clone();
        for (shader, role) in [(&vs, ShaderStage::Vertex), (&fs, ShaderStage::Fragment)] {
            if shader.stage != role {
                return Err(GlKitError::validation(format!(
                    "program '{}' needs a {} shader, but '{}' is a {} shader",
                    name, role, shader.name, shader.stage
                )));
            }
        }

        if let Some(id) = self.cache.program(&vs.source, &fs.source) {
            self.cache.shader(ShaderStage::Vertex, &vs.source);
            self.cache.shader(ShaderStage::Fragment, &fs.source);
            debug!(%id, "reusing cached program");
            return Ok(id);
        }

        let handle = self
            .gl
            .create_program()
            .ok_or_else(|| GlKitError::ResourceCreation(format!("program '{name}'")))?;
        self.gl.attach_shader(handle, vs.handle);
        self.gl.attach_shader(handle, fs.handle);
        self.gl.link_program(handle);

        if !self.gl.get_program_link_status(handle) {
            let mut log = self.gl.get_program_info_log(handle);
            for shader in [&vs, &fs] {
                let shader_log = self.gl.get_shader_info_log(shader.handle);
                if !shader_log.is_empty() {
                    log.push_str(&format!("\n{} ({}): {}", shader.name, shader.stage, shader_log));
                }
            }
            self.gl.delete_program(handle);
            return Err(GlKitError::LinkFailure {
                name: name.to_string(),
                log,
            });
        }

        let attributes = discover_attributes(&self.gl, handle, &vs.source);
        let uniforms = match discover_uniforms(
            &self.gl,
            handle,
            name,
            &vs.source,
            &fs.source,
            uniforms,
            self.limits.max_texture_units,
        ) {
            Ok(uniforms) => uniforms,
            Err(err) => {
                self.gl.delete_program(handle);
                return Err(err);
            }
        };

        self.gl.use_program(Some(handle));
        for info in uniforms.values() {
            uniform::upload(&mut self.gl, info.location, info.ty, &info.value);
        }
        self.gl.use_program(None);

        debug!(
            attributes = attributes.len(),
            uniforms = uniforms.len(),
            "linked program"
        );
        let id = self.registry.insert_program(Program {
            name: name.to_string(),
            vertex,
            fragment,
            attributes,
            uniforms,
            handle,
        });
        self.cache.insert_program(&vs.source, &fs.source, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::glsl::GlslType;
    use glkit_webgl::{SoftwareGl, UniformData};

    const VS: &str = "in vec2 a_pos;\nuniform mat3 u_xform;\n\
        void main() { gl_Position = vec4(u_xform * vec3(a_pos, 1.0), 1.0); }";
    const FS: &str = "uniform vec4 u_tint;\nout vec4 color;\nvoid main() { color = u_tint; }";

    #[test]
    fn test_program_reflects_and_uploads_defaults() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let id = kit
            .create_program_from_source("flat", VS, FS, &[("u_tint", UniformValue::from([1.0f32, 0.0, 0.0, 1.0]))])
            .unwrap();

        let program = kit.program(id).unwrap();
        assert_eq!(program.attributes["a_pos"].ty, GlslType::Vec2);
        assert_eq!(program.uniforms.len(), 2);

        let xform = program.uniforms["u_xform"].location;
        let tint = program.uniforms["u_tint"].location;
        assert_eq!(
            kit.gl().uniform_value(xform),
            Some(&UniformData::Matrix {
                columns: 3,
                rows: 3,
                transpose: false,
                data: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            })
        );
        assert_eq!(kit.gl().uniform_value(tint), Some(&UniformData::Float(vec![1.0, 0.0, 0.0, 1.0])));
        assert_eq!(kit.gl().state().current_program, None);
    }

    #[test]
    fn test_compile_failure_carries_log() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let err = kit
            .create_shader("broken", ShaderStage::Fragment, "#error nope\nvoid main() {}")
            .unwrap_err();
        match err {
            GlKitError::CompileFailure { name, stage, log } => {
                assert_eq!(name, "broken");
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(kit.gl().live_objects(), 0);
    }

    #[test]
    fn test_stage_roles_are_checked() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let a = kit.create_shader("a", ShaderStage::Fragment, FS).unwrap();
        let b = kit.create_shader("b", ShaderStage::Fragment, FS).unwrap();
        let err = kit.create_program("swapped", a, b, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_link_failure_deletes_program() {
        let mut gl = SoftwareGl::new();
        gl.fail_next_link("varying mismatch");
        let mut kit = GlKit::new(gl);

        let err = kit.create_program_from_source("bad", VS, FS, &[]).unwrap_err();
        match err {
            GlKitError::LinkFailure { name, log } => {
                assert_eq!(name, "bad");
                assert!(log.contains("varying mismatch"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // the two shaders stay cached
        assert_eq!(kit.stats().live.shaders, 2);
        assert_eq!(kit.stats().live.programs, 0);
    }

    #[test]
    fn test_unknown_uniform_override() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let err = kit
            .create_program_from_source("flat", VS, FS, &[("u_tnit", UniformValue::from(1.0f32))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownUniform);
        assert_eq!(kit.stats().live.programs, 0);
    }

    #[test]
    fn test_lost_context() {
        let mut gl = SoftwareGl::new();
        gl.lose_context();
        let mut kit = GlKit::new(gl);
        let err = kit.create_shader("vs", ShaderStage::Vertex, VS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceCreationFailure);
    }
}
