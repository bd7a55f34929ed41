//! Draw calls and the executor.
//!
//! A [`DrawCall`] pairs a vertex array with a program and carries the
//! per-call uniform values, texture bindings and render state. Executing it
//! changes only what the call asks for and undoes every change afterwards,
//! so draws can be interleaved with calls glkit does not make.

use std::collections::BTreeMap;

use glkit_webgl::{constants, Gl};
use tracing::{debug, trace, warn};

use crate::context::GlKit;
use crate::error::{GlKitError, Result};
use crate::glsl::GlslType;
use crate::resources::{ProgramId, TextureId, VertexArrayId};
use crate::types::{BlendEquation, BlendFactor, CullFace, DepthFunc, DrawMode, IndexType, TextureTarget};
use crate::uniform::{self, UniformValue};

// ==================== Render State ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub func: DepthFunc,
    pub write: bool,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            func: DepthFunc::Less,
            write: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub equation_rgb: BlendEquation,
    pub equation_alpha: BlendEquation,
}

impl BlendState {
    /// The same factors for color and alpha, additive.
    pub fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self {
            src_rgb: src,
            dst_rgb: dst,
            src_alpha: src,
            dst_alpha: dst,
            equation_rgb: BlendEquation::Add,
            equation_alpha: BlendEquation::Add,
        }
    }

    /// Straight alpha blending.
    pub fn alpha() -> Self {
        Self::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
    }

    pub fn equation(mut self, equation: BlendEquation) -> Self {
        self.equation_rgb = equation;
        self.equation_alpha = equation;
        self
    }
}

/// Per-call state overrides. `None` leaves the context state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderState {
    pub cull: Option<CullFace>,
    pub depth: Option<DepthState>,
    pub blend: Option<BlendState>,
}

impl RenderState {
    pub fn cull(mut self, face: CullFace) -> Self {
        self.cull = Some(face);
        self
    }

    pub fn depth(mut self, func: DepthFunc, write: bool) -> Self {
        self.depth = Some(DepthState { func, write });
        self
    }

    pub fn blend(mut self, blend: BlendState) -> Self {
        self.blend = Some(blend);
        self
    }
}

// ==================== Draw Calls ====================

/// Description passed to [`GlKit::create_draw_call`].
#[derive(Debug, Clone)]
pub struct DrawCallDesc {
    name: String,
    vertex_array: VertexArrayId,
    program: ProgramId,
    uniforms: Vec<(String, UniformValue)>,
    textures: Vec<(String, TextureId)>,
    instances: u32,
    range: Option<(usize, usize)>,
    state: RenderState,
}

impl DrawCallDesc {
    pub fn new(name: impl Into<String>, vertex_array: VertexArrayId, program: ProgramId) -> Self {
        Self {
            name: name.into(),
            vertex_array,
            program,
            uniforms: Vec::new(),
            textures: Vec::new(),
            instances: 1,
            range: None,
            state: RenderState::default(),
        }
    }

    pub fn uniform(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.uniforms.push((name.into(), value.into()));
        self
    }

    /// Bind `texture` to the unit of the sampler uniform `name`.
    pub fn texture(mut self, name: impl Into<String>, texture: TextureId) -> Self {
        self.textures.push((name.into(), texture));
        self
    }

    pub fn instances(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }

    /// Draw `count` indices starting at index `offset`.
    pub fn range(mut self, count: usize, offset: usize) -> Self {
        self.range = Some((count, offset));
        self
    }

    pub fn state(mut self, state: RenderState) -> Self {
        self.state = state;
        self
    }
}

/// Declared type of a uniform, copied from the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UniformSlot {
    ty: GlslType,
    array_size: usize,
}

/// A validated draw.
///
/// The vertex array and program are fixed; uniform values, texture
/// bindings, range, instance count and render state may change between
/// draws.
#[derive(Debug, Clone)]
pub struct DrawCall {
    name: String,
    vertex_array: VertexArrayId,
    program: ProgramId,
    program_name: String,
    mode: DrawMode,
    index_type: IndexType,
    index_count: usize,
    count: usize,
    offset: usize,
    instances: u32,
    uniforms: BTreeMap<String, UniformValue>,
    textures: BTreeMap<String, TextureId>,
    state: RenderState,
    slots: BTreeMap<String, UniformSlot>,
    debug: bool,
}

impl DrawCall {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn instances(&self) -> u32 {
        self.instances
    }

    pub fn uniforms(&self) -> &BTreeMap<String, UniformValue> {
        &self.uniforms
    }

    pub fn textures(&self) -> &BTreeMap<String, TextureId> {
        &self.textures
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Set the value uploaded for `name` on the next draw.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        let result = self.check_uniform(name, value.into()).map(|value| {
            self.uniforms.insert(name.to_string(), value);
        });
        self.finish(result)
    }

    /// Bind `texture` to the sampler uniform `name` on the next draw.
    pub fn bind_texture(&mut self, name: &str, texture: TextureId) -> Result<()> {
        let result = self.check_sampler(name).map(|_| {
            self.textures.insert(name.to_string(), texture);
        });
        self.finish(result)
    }

    /// Zero is rejected when the call is drawn.
    pub fn set_instances(&mut self, instances: u32) {
        self.instances = instances;
    }

    pub fn set_range(&mut self, count: usize, offset: usize) -> Result<()> {
        let result = self.check_range(count, offset).map(|()| {
            self.count = count;
            self.offset = offset;
        });
        self.finish(result)
    }

    pub fn set_state(&mut self, state: RenderState) {
        self.state = state;
    }

    fn unknown_uniform(&self, name: &str) -> GlKitError {
        GlKitError::UnknownUniform {
            program: self.program_name.clone(),
            name: name.to_string(),
        }
    }

    fn check_uniform(&self, name: &str, value: UniformValue) -> Result<UniformValue> {
        let slot = self.slots.get(name).ok_or_else(|| self.unknown_uniform(name))?;
        if slot.ty.is_sampler() {
            return Err(GlKitError::validation(format!(
                "'{name}' is a sampler; bind a texture to it instead of setting a value"
            )));
        }
        value.conform(slot.ty, slot.array_size).map_err(|reason| {
            GlKitError::validation(format!(
                "uniform '{}' of program '{}': {}",
                name, self.program_name, reason
            ))
        })
    }

    fn check_sampler(&self, name: &str) -> Result<TextureTarget> {
        let slot = self.slots.get(name).ok_or_else(|| self.unknown_uniform(name))?;
        slot.ty.sampler_target().ok_or_else(|| {
            GlKitError::validation(format!(
                "uniform '{}' of program '{}' is a {:?}, not a sampler",
                name, self.program_name, slot.ty
            ))
        })
    }

    fn check_range(&self, count: usize, offset: usize) -> Result<()> {
        if offset.checked_add(count).map_or(true, |end| end > self.index_count) {
            return Err(GlKitError::validation(format!(
                "draw call '{}' reads indices {}..{}, but only {} exist",
                self.name,
                offset,
                offset.saturating_add(count),
                self.index_count
            )));
        }
        self.mode.validate_count(count)
    }

    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        if self.debug {
            result
        } else {
            result.map_err(GlKitError::redact)
        }
    }
}

// ==================== Executor ====================

/// What a draw changed and must undo.
#[derive(Debug, Default)]
struct Touched {
    cull: bool,
    depth: bool,
    blend: bool,
    /// (unit, target)
    textures: Vec<(u32, u32)>,
}

impl<G: Gl> GlKit<G> {
    /// Validate a draw against its vertex array and program.
    pub fn create_draw_call(&self, desc: DrawCallDesc) -> Result<DrawCall> {
        let result = self.create_draw_call_inner(desc);
        self.finish(result)
    }

    fn create_draw_call_inner(&self, desc: DrawCallDesc) -> Result<DrawCall> {
        let vertex_array = self.registry.vertex_array(desc.vertex_array)?;
        let program = self.registry.program(desc.program)?;

        for (attribute, info) in &program.attributes {
            for location in info.location..info.location + info.ty.attribute_slots() {
                let Some(binding) = vertex_array.bindings.get(&location) else {
                    return Err(GlKitError::MissingAttribute {
                        program: program.name.clone(),
                        vertex_array: vertex_array.name.clone(),
                        attribute: attribute.clone(),
                    });
                };
                if binding.integer != info.ty.is_integer() {
                    return Err(GlKitError::validation(format!(
                        "attribute '{}' of program '{}' is {:?}, but vertex array '{}' binds it through the {} path",
                        attribute,
                        program.name,
                        info.ty,
                        vertex_array.name,
                        if binding.integer { "integer" } else { "float" }
                    )));
                }
            }
        }

        let (count, offset) = desc.range.unwrap_or((vertex_array.index_count, 0));
        let mut call = DrawCall {
            name: desc.name,
            vertex_array: desc.vertex_array,
            program: desc.program,
            program_name: program.name.clone(),
            mode: vertex_array.mode,
            index_type: vertex_array.index_type,
            index_count: vertex_array.index_count,
            count,
            offset,
            instances: desc.instances,
            uniforms: BTreeMap::new(),
            textures: BTreeMap::new(),
            state: desc.state,
            slots: program
                .uniforms
                .iter()
                .map(|(name, info)| {
                    let slot = UniformSlot {
                        ty: info.ty,
                        array_size: info.array_size,
                    };
                    (name.clone(), slot)
                })
                .collect(),
            debug: true,
        };

        call.check_range(count, offset)?;
        if call.instances == 0 {
            return Err(GlKitError::validation(format!(
                "draw call '{}' needs at least one instance",
                call.name
            )));
        }
        for (name, value) in desc.uniforms {
            let value = call.check_uniform(&name, value)?;
            call.uniforms.insert(name, value);
        }
        for (name, texture) in desc.textures {
            let target = call.check_sampler(&name)?;
            let texture_target = self.registry.texture(texture)?.target;
            if texture_target != target {
                return Err(GlKitError::validation(format!(
                    "sampler '{name}' expects a {target} texture, got {texture_target}"
                )));
            }
            call.textures.insert(name, texture);
        }

        call.debug = self.config.debug;
        debug!(draw_call = %call.name, count, offset, instances = call.instances, "created draw call");
        Ok(call)
    }

    /// Execute a draw call.
    ///
    /// Uniforms are uploaded only when their value differs from the last one
    /// uploaded to the program. Every binding and state change is undone
    /// before returning, also on error.
    pub fn draw(&mut self, call: &DrawCall) -> Result<()> {
        let mut touched = Touched::default();
        let result = self.draw_inner(call, &mut touched);
        self.unwind(&touched);
        self.check_gl("draw");
        self.finish(result)
    }

    fn draw_inner(&mut self, call: &DrawCall, touched: &mut Touched) -> Result<()> {
        let vertex_array = self.registry.vertex_array(call.vertex_array)?.handle;
        let program = self.registry.program(call.program)?.handle;

        self.gl.bind_vertex_array(Some(vertex_array));
        self.gl.use_program(Some(program));

        self.apply_state(&call.state, touched);
        self.upload_uniforms(call)?;
        self.bind_textures(call, touched)?;

        if call.instances == 0 {
            return Err(GlKitError::validation(format!(
                "draw call '{}' needs at least one instance",
                call.name
            )));
        }
        let count = call.count as i32;
        let offset = (call.offset * call.index_type.byte_size()) as i32;
        let (mode, index_type) = (call.mode.gl_enum(), call.index_type.gl_enum());
        if call.instances == 1 {
            self.gl.draw_elements(mode, count, index_type, offset);
        } else {
            self.gl
                .draw_elements_instanced(mode, count, index_type, offset, call.instances as i32);
        }
        trace!(draw_call = %call.name, count, offset, instances = call.instances, "issued draw");
        Ok(())
    }

    fn apply_state(&mut self, state: &RenderState, touched: &mut Touched) {
        if let Some(face) = state.cull {
            self.gl.enable(constants::CULL_FACE);
            self.gl.cull_face(face.gl_enum());
            touched.cull = true;
        }
        if let Some(depth) = state.depth {
            self.gl.enable(constants::DEPTH_TEST);
            self.gl.depth_func(depth.func.gl_enum());
            self.gl.depth_mask(depth.write);
            touched.depth = true;
        }
        if let Some(blend) = state.blend {
            self.gl.enable(constants::BLEND);
            self.gl.blend_func_separate(
                blend.src_rgb.gl_enum(),
                blend.dst_rgb.gl_enum(),
                blend.src_alpha.gl_enum(),
                blend.dst_alpha.gl_enum(),
            );
            self.gl
                .blend_equation_separate(blend.equation_rgb.gl_enum(), blend.equation_alpha.gl_enum());
            touched.blend = true;
        }
    }

    fn upload_uniforms(&mut self, call: &DrawCall) -> Result<()> {
        let program = self.registry.program_mut(call.program)?;
        for (name, value) in &call.uniforms {
            let info = program
                .uniforms
                .get_mut(name)
                .ok_or_else(|| call.unknown_uniform(name))?;
            if info.value == *value {
                continue;
            }
            uniform::upload(&mut self.gl, info.location, info.ty, value);
            info.value = value.clone();
            trace!(uniform = %name, "uploaded uniform");
        }
        Ok(())
    }

    fn bind_textures(&mut self, call: &DrawCall, touched: &mut Touched) -> Result<()> {
        let mut units: BTreeMap<u32, (TextureTarget, TextureId)> = BTreeMap::new();
        let mut plan = Vec::with_capacity(call.textures.len());
        {
            let program = self.registry.program(call.program)?;
            for (name, &texture_id) in &call.textures {
                let info = program
                    .uniforms
                    .get(name)
                    .ok_or_else(|| call.unknown_uniform(name))?;
                let unit = info.unit().ok_or_else(|| {
                    GlKitError::validation(format!("uniform '{name}' has no texture unit"))
                })?;
                let texture = self.registry.texture(texture_id)?;

                match units.get(&unit) {
                    Some(&(first, _)) if first != texture.target => {
                        return Err(GlKitError::TextureUnitConflict {
                            draw_call: call.name.clone(),
                            unit,
                            first,
                            second: texture.target,
                        });
                    }
                    Some(&(_, previous)) if previous != texture_id => {
                        warn!(
                            draw_call = %call.name,
                            unit,
                            sampler = %name,
                            "texture unit rebound within one draw, the last binding wins"
                        );
                    }
                    _ => {}
                }
                units.insert(unit, (texture.target, texture_id));
                plan.push((unit, texture.target.gl_enum(), texture.handle));
            }
        }

        for (unit, target, handle) in plan {
            self.gl.active_texture(constants::TEXTURE0 + unit);
            self.gl.bind_texture(target, Some(handle));
            touched.textures.push((unit, target));
        }
        Ok(())
    }

    fn unwind(&mut self, touched: &Touched) {
        for &(unit, target) in &touched.textures {
            self.gl.active_texture(constants::TEXTURE0 + unit);
            self.gl.bind_texture(target, None);
        }
        if !touched.textures.is_empty() {
            self.gl.active_texture(constants::TEXTURE0);
        }
        self.gl.use_program(None);
        self.gl.bind_vertex_array(None);
        if touched.cull {
            self.gl.disable(constants::CULL_FACE);
        }
        if touched.depth {
            self.gl.disable(constants::DEPTH_TEST);
            self.gl.depth_mask(true);
        }
        if touched.blend {
            self.gl.disable(constants::BLEND);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::layout::{AttributeDesc, AttributeSet};
    use crate::texture::TextureDesc;
    use crate::types::TextureFormat;
    use glkit_webgl::SoftwareGl;

    const VS: &str = "in vec2 a_pos;\nuniform vec2 u_offset;\n\
        void main() { gl_Position = vec4(a_pos + u_offset, 0.0, 1.0); }";
    const FS: &str = "uniform sampler2D u_albedo;\nuniform samplerCube u_env;\nuniform vec4 u_tint;\n\
        out vec4 c;\n\
        void main() { c = u_tint * texture(u_albedo, vec2(0.0)) + texture(u_env, vec3(0.0)); }";

    struct Scene {
        kit: GlKit<SoftwareGl>,
        program: ProgramId,
        vao: VertexArrayId,
    }

    fn scene() -> Scene {
        let mut kit = GlKit::new(SoftwareGl::new());
        let program = kit.create_program_from_source("lit", VS, FS, &[]).unwrap();
        let buffer = kit
            .create_attribute_buffer(
                "quad",
                &AttributeSet::new().with("a_pos", AttributeDesc::new(&[0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 2)),
                None,
            )
            .unwrap();
        let index = kit
            .create_index_buffer("quad", &[0, 1, 2, 0, 2, 3], DrawMode::Triangles, None)
            .unwrap();
        let vao = kit.create_vertex_array("quad", program, index, &[buffer]).unwrap();
        Scene { kit, program, vao }
    }

    #[test]
    fn test_draw_records_and_unwinds() {
        let Scene { mut kit, program, vao } = scene();
        let call = kit
            .create_draw_call(
                DrawCallDesc::new("quad", vao, program)
                    .range(3, 3)
                    .state(RenderState::default().blend(BlendState::alpha()).depth(DepthFunc::LessEqual, false)),
            )
            .unwrap();
        kit.draw(&call).unwrap();

        let draws = kit.gl().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 3);
        assert_eq!(draws[0].offset, 3);
        assert_eq!(draws[0].type_, constants::UNSIGNED_BYTE);
        assert!(draws[0].state.blend_enabled);
        assert!(draws[0].state.depth_test_enabled);
        assert!(!draws[0].state.depth_mask);
        assert!(!draws[0].state.cull_face_enabled);

        let state = kit.gl().state();
        assert!(!state.blend_enabled);
        assert!(!state.depth_test_enabled);
        assert!(state.depth_mask);
        assert_eq!(state.current_program, None);
        assert_eq!(state.current_vertex_array, None);
    }

    #[test]
    fn test_uniform_uploads_only_on_change() {
        let Scene { mut kit, program, vao } = scene();
        let mut call = kit
            .create_draw_call(DrawCallDesc::new("quad", vao, program).uniform("u_offset", [0.5f32, 0.5]))
            .unwrap();
        kit.gl_mut().clear_uniform_uploads();

        kit.draw(&call).unwrap();
        assert_eq!(kit.gl().uniform_uploads().len(), 1);
        kit.draw(&call).unwrap();
        assert_eq!(kit.gl().uniform_uploads().len(), 1);

        call.set_uniform("u_offset", [0.5f32, 0.25]).unwrap();
        kit.draw(&call).unwrap();
        assert_eq!(kit.gl().uniform_uploads().len(), 2);
        assert_eq!(
            kit.uniform_value(program, "u_offset").unwrap(),
            &UniformValue::Float(vec![0.5, 0.25])
        );
    }

    #[test]
    fn test_unknown_and_mistyped_uniforms() {
        let Scene { kit, program, vao } = scene();
        let err = kit
            .create_draw_call(DrawCallDesc::new("quad", vao, program).uniform("u_ofset", [0.0f32, 0.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownUniform);

        let mut call = kit.create_draw_call(DrawCallDesc::new("quad", vao, program)).unwrap();
        assert_eq!(call.set_uniform("u_offset", 1.0f32).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(call.set_uniform("u_albedo", 0i32).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(call.set_uniform("u_nope", 0i32).unwrap_err().kind(), ErrorKind::UnknownUniform);
    }

    #[test]
    fn test_textures_bind_to_assigned_units() {
        let Scene { mut kit, program, vao } = scene();
        let albedo = kit.create_texture("albedo", &TextureDesc::new_2d(TextureFormat::Rgba8, 4, 4)).unwrap();
        let env = kit.create_texture("env", &TextureDesc::new_cube(TextureFormat::Rgba8, 4)).unwrap();
        let call = kit
            .create_draw_call(DrawCallDesc::new("quad", vao, program).texture("u_albedo", albedo).texture("u_env", env))
            .unwrap();
        kit.draw(&call).unwrap();

        let albedo_unit = kit.uniform_value(program, "u_albedo").unwrap().to_u32()[0];
        let env_unit = kit.uniform_value(program, "u_env").unwrap().to_u32()[0];
        let textures = &kit.gl().draws()[0].state.textures;
        assert_eq!(textures.len(), 2);
        assert!(textures.contains(&(albedo_unit, constants::TEXTURE_2D, kit.texture(albedo).unwrap().handle)));
        assert!(textures.contains(&(env_unit, constants::TEXTURE_CUBE_MAP, kit.texture(env).unwrap().handle)));
        assert!(kit.gl().state().texture_units.is_empty());
    }

    #[test]
    fn test_sampler_target_mismatch() {
        let Scene { mut kit, program, vao } = scene();
        let flat = kit.create_texture("flat", &TextureDesc::new_2d(TextureFormat::Rgba8, 4, 4)).unwrap();
        let err = kit
            .create_draw_call(DrawCallDesc::new("quad", vao, program).texture("u_env", flat))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unit_conflict_across_targets() {
        let mut kit = GlKit::new(SoftwareGl::new());
        let program = kit
            .create_program_from_source(
                "clash",
                VS,
                FS,
                &[("u_albedo", UniformValue::from(3i32)), ("u_env", UniformValue::from(3i32))],
            )
            .unwrap();
        let buffer = kit
            .create_attribute_buffer("tri", &AttributeSet::new().with("a_pos", AttributeDesc::new(&[0.0f32; 6], 2)), None)
            .unwrap();
        let index = kit.create_index_buffer("tri", &[0, 1, 2], DrawMode::Triangles, None).unwrap();
        let vao = kit.create_vertex_array("tri", program, index, &[buffer]).unwrap();
        let albedo = kit.create_texture("albedo", &TextureDesc::new_2d(TextureFormat::Rgba8, 4, 4)).unwrap();
        let env = kit.create_texture("env", &TextureDesc::new_cube(TextureFormat::Rgba8, 4)).unwrap();

        let call = kit
            .create_draw_call(DrawCallDesc::new("tri", vao, program).texture("u_albedo", albedo).texture("u_env", env))
            .unwrap();
        let err = kit.draw(&call).unwrap_err();
        assert!(matches!(err, GlKitError::TextureUnitConflict { unit: 3, .. }));
        assert!(kit.gl().draws().is_empty());
        assert!(kit.gl().state().texture_units.is_empty());
        assert_eq!(kit.gl().state().current_program, None);
    }

    #[test]
    fn test_instances_and_range() {
        let Scene { mut kit, program, vao } = scene();
        let mut call = kit.create_draw_call(DrawCallDesc::new("quad", vao, program).instances(4)).unwrap();
        kit.draw(&call).unwrap();
        assert_eq!(kit.gl().draws()[0].instances, 4);

        assert!(call.set_range(6, 3).is_err());
        assert!(call.set_range(4, 0).is_err());
        call.set_range(3, 0).unwrap();

        call.set_instances(0);
        assert_eq!(kit.draw(&call).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(kit.gl().draws().len(), 1);
    }

    #[test]
    fn test_stale_vertex_array() {
        let Scene { mut kit, program, vao } = scene();
        let call = kit.create_draw_call(DrawCallDesc::new("quad", vao, program)).unwrap();
        kit.reset_context(1);
        assert!(matches!(kit.draw(&call), Err(GlKitError::StaleHandle { .. })));
    }
}
