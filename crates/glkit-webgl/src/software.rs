//! Headless WebGL2 context.
//!
//! `SoftwareGl` keeps the object and binding state a real context keeps,
//! but never rasterizes. Draws and uniform uploads are recorded so callers
//! can assert on exactly what reached the "GPU".

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::{
    constants, Gl, WebGLBuffer, WebGLFramebuffer, WebGLObject, WebGLProgram, WebGLRenderbuffer,
    WebGLShader, WebGLTexture, WebGLUniformLocation, WebGLVertexArray,
};

// ==================== Shader ====================

/// Shader data.
#[derive(Debug, Clone)]
pub struct ShaderData {
    pub shader_type: u32,
    pub source: String,
    pub compiled: bool,
    pub info_log: String,
    pub deleted: bool,
}

impl ShaderData {
    pub fn new(shader_type: u32) -> Self {
        Self {
            shader_type,
            source: String::new(),
            compiled: false,
            info_log: String::new(),
            deleted: false,
        }
    }
}

// ==================== Program ====================

/// Program data.
#[derive(Debug, Clone, Default)]
pub struct ProgramData {
    pub vertex_shader: Option<WebGLShader>,
    pub fragment_shader: Option<WebGLShader>,
    pub linked: bool,
    pub info_log: String,
    pub deleted: bool,
    /// Active attributes and their first location.
    pub attributes: HashMap<String, i32>,
    /// Active uniforms, keyed by base name.
    pub uniforms: HashMap<String, WebGLUniformLocation>,
}

// ==================== Buffer ====================

/// Buffer data.
#[derive(Debug, Clone)]
pub struct BufferData {
    pub target: u32,
    pub usage: u32,
    pub data: Vec<u8>,
    pub deleted: bool,
}

impl Default for BufferData {
    fn default() -> Self {
        Self {
            target: 0,
            usage: constants::STATIC_DRAW,
            data: Vec::new(),
            deleted: false,
        }
    }
}

// ==================== Vertex Arrays ====================

/// Vertex attribute pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexAttribPointer {
    pub enabled: bool,
    pub size: i32,
    pub type_: u32,
    pub normalized: bool,
    /// Set through `vertexAttribIPointer`.
    pub integer: bool,
    pub stride: i32,
    pub offset: i32,
    pub divisor: u32,
    pub buffer: Option<WebGLBuffer>,
}

/// Vertex array object state.
#[derive(Debug, Clone)]
pub struct VertexArrayData {
    pub attribs: Vec<VertexAttribPointer>,
    pub element_buffer: Option<WebGLBuffer>,
    pub deleted: bool,
}

impl VertexArrayData {
    fn new(max_attribs: u32) -> Self {
        Self {
            attribs: (0..max_attribs).map(|_| VertexAttribPointer::default()).collect(),
            element_buffer: None,
            deleted: false,
        }
    }

    /// Locations with an enabled attribute array.
    pub fn enabled_locations(&self) -> Vec<u32> {
        self.attribs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.enabled)
            .map(|(i, _)| i as u32)
            .collect()
    }
}

// ==================== Texture ====================

/// Texture data.
#[derive(Debug, Clone, Default)]
pub struct TextureData {
    /// Zero until the texture is first bound.
    pub target: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub levels: u32,
    pub internal_format: u32,
    pub immutable: bool,
    pub parameters: HashMap<u32, i32>,
    pub uploaded_bytes: usize,
    pub mipmaps_generated: bool,
    pub deleted: bool,
}

impl TextureData {
    fn level_size(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }
}

// ==================== Renderbuffer ====================

/// Renderbuffer data.
#[derive(Debug, Clone, Default)]
pub struct RenderbufferData {
    pub internal_format: u32,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub deleted: bool,
}

// ==================== Framebuffer ====================

/// What a framebuffer attachment point refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentData {
    Texture {
        texture: WebGLTexture,
        level: u32,
        layer: Option<u32>,
    },
    Renderbuffer(WebGLRenderbuffer),
}

/// Framebuffer data.
#[derive(Debug, Clone, Default)]
pub struct FramebufferData {
    pub attachments: HashMap<u32, AttachmentData>,
    pub draw_buffers: Vec<u32>,
    pub deleted: bool,
}

// ==================== Uniforms ====================

/// Payload of one uniform upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformData {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Uint(Vec<u32>),
    Matrix {
        columns: u32,
        rows: u32,
        transpose: bool,
        data: Vec<f32>,
    },
}

/// A recorded `uniform*` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformUpload {
    pub program: WebGLProgram,
    pub location: WebGLUniformLocation,
    /// Vector width for `uniform*v`, row count for matrices.
    pub size: u32,
    pub data: UniformData,
}

// ==================== Limits ====================

/// Implementation limits reported through `get_parameter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareLimits {
    pub max_vertex_attribs: u32,
    pub max_combined_texture_units: u32,
    pub max_color_attachments: u32,
    pub max_draw_buffers: u32,
    pub max_renderbuffer_size: u32,
    pub max_texture_size: u32,
    pub max_3d_texture_size: u32,
    pub max_cube_map_texture_size: u32,
    pub max_array_texture_layers: u32,
    pub max_samples: u32,
}

impl Default for SoftwareLimits {
    fn default() -> Self {
        // WebGL2 minimums
        Self {
            max_vertex_attribs: 16,
            max_combined_texture_units: 32,
            max_color_attachments: 4,
            max_draw_buffers: 4,
            max_renderbuffer_size: 2048,
            max_texture_size: 2048,
            max_3d_texture_size: 256,
            max_cube_map_texture_size: 2048,
            max_array_texture_layers: 256,
            max_samples: 4,
        }
    }
}

// ==================== Context State ====================

/// Bound objects and fixed-function state.
#[derive(Debug, Clone)]
pub struct WebGLState {
    pub blend_enabled: bool,
    pub blend_func: (u32, u32, u32, u32),
    pub blend_equation: (u32, u32),
    pub cull_face_enabled: bool,
    pub cull_face_mode: u32,
    pub depth_test_enabled: bool,
    pub depth_func: u32,
    pub depth_mask: bool,
    pub stencil_test_enabled: bool,
    pub scissor_test_enabled: bool,
    pub current_program: Option<WebGLProgram>,
    pub current_array_buffer: Option<WebGLBuffer>,
    pub current_vertex_array: Option<WebGLVertexArray>,
    pub current_draw_framebuffer: Option<WebGLFramebuffer>,
    pub current_read_framebuffer: Option<WebGLFramebuffer>,
    pub current_renderbuffer: Option<WebGLRenderbuffer>,
    /// Index of the active unit (not the `TEXTURE0` enum).
    pub active_texture: u32,
    /// (unit, target) -> texture
    pub texture_units: HashMap<(u32, u32), WebGLTexture>,
}

impl Default for WebGLState {
    fn default() -> Self {
        Self {
            blend_enabled: false,
            blend_func: (constants::ONE, constants::ZERO, constants::ONE, constants::ZERO),
            blend_equation: (constants::FUNC_ADD, constants::FUNC_ADD),
            cull_face_enabled: false,
            cull_face_mode: constants::BACK,
            depth_test_enabled: false,
            depth_func: constants::LESS,
            depth_mask: true,
            stencil_test_enabled: false,
            scissor_test_enabled: false,
            current_program: None,
            current_array_buffer: None,
            current_vertex_array: None,
            current_draw_framebuffer: None,
            current_read_framebuffer: None,
            current_renderbuffer: None,
            active_texture: 0,
            texture_units: HashMap::new(),
        }
    }
}

// ==================== Draw Call ====================

/// A recorded `drawElements`/`drawElementsInstanced`.
#[derive(Debug, Clone)]
pub struct RecordedDraw {
    pub mode: u32,
    pub count: i32,
    pub type_: u32,
    pub offset: i32,
    pub instances: i32,
    pub program: WebGLProgram,
    pub vertex_array: Option<WebGLVertexArray>,
    pub framebuffer: Option<WebGLFramebuffer>,
    pub state: Box<DrawState>,
}

/// State captured at draw time.
#[derive(Debug, Clone)]
pub struct DrawState {
    pub blend_enabled: bool,
    pub blend_func: (u32, u32, u32, u32),
    pub blend_equation: (u32, u32),
    pub depth_test_enabled: bool,
    pub depth_func: u32,
    pub depth_mask: bool,
    pub cull_face_enabled: bool,
    pub cull_face_mode: u32,
    /// (unit, target, texture), sorted by unit.
    pub textures: Vec<(u32, u32, WebGLTexture)>,
    pub uniforms: HashMap<WebGLUniformLocation, UniformData>,
}

// ==================== Software Context ====================

/// A WebGL2 context without a GPU.
#[derive(Debug)]
pub struct SoftwareGl {
    limits: SoftwareLimits,
    state: WebGLState,
    default_vertex_array: VertexArrayData,
    shaders: HashMap<WebGLShader, ShaderData>,
    programs: HashMap<WebGLProgram, ProgramData>,
    buffers: HashMap<WebGLBuffer, BufferData>,
    vertex_arrays: HashMap<WebGLVertexArray, VertexArrayData>,
    textures: HashMap<WebGLTexture, TextureData>,
    framebuffers: HashMap<WebGLFramebuffer, FramebufferData>,
    renderbuffers: HashMap<WebGLRenderbuffer, RenderbufferData>,
    uniform_values: HashMap<WebGLUniformLocation, UniformData>,
    uniform_uploads: Vec<UniformUpload>,
    draws: Vec<RecordedDraw>,
    last_error: u32,
    context_lost: bool,
    pending_link_failure: Option<String>,
    attribute_remaps: HashMap<String, i32>,
}

impl Default for SoftwareGl {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareGl {
    /// Create a context with the WebGL2 minimum limits.
    pub fn new() -> Self {
        Self::with_limits(SoftwareLimits::default())
    }

    /// Create a context reporting the given limits.
    pub fn with_limits(limits: SoftwareLimits) -> Self {
        Self {
            limits,
            state: WebGLState::default(),
            default_vertex_array: VertexArrayData::new(limits.max_vertex_attribs),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            renderbuffers: HashMap::new(),
            uniform_values: HashMap::new(),
            uniform_uploads: Vec::new(),
            draws: Vec::new(),
            last_error: constants::NO_ERROR,
            context_lost: false,
            pending_link_failure: None,
            attribute_remaps: HashMap::new(),
        }
    }

    // ==================== Test Hooks ====================

    /// Make the next `link_program` fail with the given log.
    pub fn fail_next_link(&mut self, log: impl Into<String>) {
        self.pending_link_failure = Some(log.into());
    }

    /// Simulate a lost context: every create call returns `None` afterwards.
    pub fn lose_context(&mut self) {
        self.context_lost = true;
        self.set_error(constants::CONTEXT_LOST_WEBGL);
    }

    /// Force the linker to place an attribute at `location`, ignoring any
    /// `layout(location = N)` the source declares.
    pub fn remap_attribute(&mut self, name: impl Into<String>, location: i32) {
        self.attribute_remaps.insert(name.into(), location);
    }

    // ==================== Output ====================

    pub fn limits(&self) -> &SoftwareLimits {
        &self.limits
    }

    pub fn state(&self) -> &WebGLState {
        &self.state
    }

    /// Check if a capability is enabled.
    pub fn is_enabled(&self, cap: u32) -> bool {
        match cap {
            constants::BLEND => self.state.blend_enabled,
            constants::CULL_FACE => self.state.cull_face_enabled,
            constants::DEPTH_TEST => self.state.depth_test_enabled,
            constants::SCISSOR_TEST => self.state.scissor_test_enabled,
            constants::STENCIL_TEST => self.state.stencil_test_enabled,
            _ => false,
        }
    }

    /// Recorded draws, oldest first.
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Get draw calls and clear them.
    pub fn take_draws(&mut self) -> Vec<RecordedDraw> {
        std::mem::take(&mut self.draws)
    }

    /// Every uniform upload since creation (or the last clear).
    pub fn uniform_uploads(&self) -> &[UniformUpload] {
        &self.uniform_uploads
    }

    pub fn clear_uniform_uploads(&mut self) {
        self.uniform_uploads.clear();
    }

    /// Last value uploaded to a uniform location.
    pub fn uniform_value(&self, location: WebGLUniformLocation) -> Option<&UniformData> {
        self.uniform_values.get(&location)
    }

    pub fn get_shader_data(&self, shader: WebGLShader) -> Option<&ShaderData> {
        self.shaders.get(&shader)
    }

    pub fn get_program_data(&self, program: WebGLProgram) -> Option<&ProgramData> {
        self.programs.get(&program)
    }

    pub fn get_buffer_data(&self, buffer: WebGLBuffer) -> Option<&BufferData> {
        self.buffers.get(&buffer)
    }

    pub fn get_vertex_array_data(&self, vertex_array: WebGLVertexArray) -> Option<&VertexArrayData> {
        self.vertex_arrays.get(&vertex_array)
    }

    pub fn get_texture_data(&self, texture: WebGLTexture) -> Option<&TextureData> {
        self.textures.get(&texture)
    }

    pub fn get_renderbuffer_data(&self, renderbuffer: WebGLRenderbuffer) -> Option<&RenderbufferData> {
        self.renderbuffers.get(&renderbuffer)
    }

    pub fn get_framebuffer_data(&self, framebuffer: WebGLFramebuffer) -> Option<&FramebufferData> {
        self.framebuffers.get(&framebuffer)
    }

    /// Number of created objects that have not been deleted.
    pub fn live_objects(&self) -> usize {
        self.shaders.values().filter(|d| !d.deleted).count()
            + self.programs.values().filter(|d| !d.deleted).count()
            + self.buffers.values().filter(|d| !d.deleted).count()
            + self.vertex_arrays.values().filter(|d| !d.deleted).count()
            + self.textures.values().filter(|d| !d.deleted).count()
            + self.renderbuffers.values().filter(|d| !d.deleted).count()
            + self.framebuffers.values().filter(|d| !d.deleted).count()
    }

    // ==================== Internals ====================

    fn set_error(&mut self, code: u32) {
        // The first error sticks until read.
        if self.last_error == constants::NO_ERROR {
            self.last_error = code;
        }
    }

    fn allocate(&mut self) -> Option<WebGLObject> {
        if self.context_lost {
            return None;
        }
        Some(WebGLObject::new())
    }

    fn current_vertex_array_mut(&mut self) -> Option<&mut VertexArrayData> {
        match self.state.current_vertex_array {
            Some(vao) => self.vertex_arrays.get_mut(&vao),
            None => Some(&mut self.default_vertex_array),
        }
    }

    fn current_vertex_array(&self) -> Option<&VertexArrayData> {
        match self.state.current_vertex_array {
            Some(vao) => self.vertex_arrays.get(&vao),
            None => Some(&self.default_vertex_array),
        }
    }

    fn bound_texture(&self, target: u32) -> Option<WebGLTexture> {
        let target = match target {
            constants::TEXTURE_CUBE_MAP_POSITIVE_X..=constants::TEXTURE_CUBE_MAP_NEGATIVE_Z => {
                constants::TEXTURE_CUBE_MAP
            }
            other => other,
        };
        self.state
            .texture_units
            .get(&(self.state.active_texture, target))
            .copied()
    }

    fn framebuffer_binding(&self, target: u32) -> Option<WebGLFramebuffer> {
        match target {
            constants::READ_FRAMEBUFFER => self.state.current_read_framebuffer,
            _ => self.state.current_draw_framebuffer,
        }
    }

    fn record_uniform(&mut self, location: WebGLUniformLocation, size: u32, data: UniformData) {
        let Some(program) = self.state.current_program else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        let owned = self
            .programs
            .get(&program)
            .is_some_and(|p| p.uniforms.values().any(|l| *l == location));
        if !owned {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }
        trace!(location = location.id(), "uniform upload");
        self.uniform_values.insert(location, data.clone());
        self.uniform_uploads.push(UniformUpload {
            program,
            location,
            size,
            data,
        });
    }

    fn record_draw(&mut self, mode: u32, count: i32, type_: u32, offset: i32, instances: i32) {
        let Some(program) = self.state.current_program else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if !self.programs.get(&program).is_some_and(|p| p.linked) {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }
        if count < 0 || offset < 0 || instances < 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        if self.current_vertex_array().and_then(|v| v.element_buffer).is_none() {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }

        let mut textures: Vec<(u32, u32, WebGLTexture)> = self
            .state
            .texture_units
            .iter()
            .map(|((unit, target), tex)| (*unit, *target, *tex))
            .collect();
        textures.sort();

        let uniforms = self
            .programs
            .get(&program)
            .map(|p| {
                p.uniforms
                    .values()
                    .filter_map(|loc| self.uniform_values.get(loc).map(|v| (*loc, v.clone())))
                    .collect()
            })
            .unwrap_or_default();

        let state = DrawState {
            blend_enabled: self.state.blend_enabled,
            blend_func: self.state.blend_func,
            blend_equation: self.state.blend_equation,
            depth_test_enabled: self.state.depth_test_enabled,
            depth_func: self.state.depth_func,
            depth_mask: self.state.depth_mask,
            cull_face_enabled: self.state.cull_face_enabled,
            cull_face_mode: self.state.cull_face_mode,
            textures,
            uniforms,
        };

        self.draws.push(RecordedDraw {
            mode,
            count,
            type_,
            offset,
            instances,
            program,
            vertex_array: self.state.current_vertex_array,
            framebuffer: self.state.current_draw_framebuffer,
            state: Box::new(state),
        });
    }

    fn resolve_attachment(&self, attachment: &AttachmentData) -> Option<(u32, u32, u32, u32)> {
        match attachment {
            AttachmentData::Texture { texture, level, .. } => {
                let data = self.textures.get(texture).filter(|d| !d.deleted && d.immutable)?;
                let (w, h) = data.level_size(*level);
                Some((w, h, 0, data.internal_format))
            }
            AttachmentData::Renderbuffer(rb) => {
                let data = self.renderbuffers.get(rb).filter(|d| !d.deleted)?;
                if data.width == 0 || data.height == 0 {
                    return None;
                }
                Some((data.width, data.height, data.samples, data.internal_format))
            }
        }
    }
}

// ==================== Format Classification ====================

/// (depth, stencil) bits present in a sized internal format.
fn depth_stencil_bits(internal_format: u32) -> (bool, bool) {
    match internal_format {
        constants::DEPTH_COMPONENT16
        | constants::DEPTH_COMPONENT24
        | constants::DEPTH_COMPONENT32F => (true, false),
        constants::DEPTH24_STENCIL8 | constants::DEPTH32F_STENCIL8 => (true, true),
        constants::STENCIL_INDEX8 => (false, true),
        _ => (false, false),
    }
}

fn attachment_accepts(attachment: u32, internal_format: u32) -> bool {
    let (depth, stencil) = depth_stencil_bits(internal_format);
    match attachment {
        constants::DEPTH_ATTACHMENT => depth,
        constants::STENCIL_ATTACHMENT => stencil,
        constants::DEPTH_STENCIL_ATTACHMENT => depth && stencil,
        _ => !depth && !stencil,
    }
}

// ==================== Link Emulation ====================

#[derive(Debug)]
struct ScannedVariable {
    name: String,
    type_name: String,
    location: Option<i32>,
}

/// Rough declaration finder: any line holding `keyword TYPE NAME`.
fn scan_variables(source: &str, keyword: &str) -> Vec<ScannedVariable> {
    let mut out = Vec::new();
    for line in source.lines() {
        let code = line.split("//").next().unwrap_or("");
        let tokens: Vec<&str> = code
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .collect();
        let Some(pos) = tokens.iter().position(|t| *t == keyword) else {
            continue;
        };
        let mut rest = tokens[pos + 1..]
            .iter()
            .filter(|t| !matches!(**t, "lowp" | "mediump" | "highp"));
        let (Some(type_name), Some(name)) = (rest.next(), rest.next()) else {
            continue;
        };
        let location = tokens
            .iter()
            .position(|t| *t == "location")
            .and_then(|p| tokens.get(p + 1))
            .and_then(|t| t.parse().ok());
        out.push(ScannedVariable {
            name: name.to_string(),
            type_name: type_name.to_string(),
            location,
        });
    }
    out
}

fn identifier_count(sources: &[&str], name: &str) -> usize {
    sources
        .iter()
        .flat_map(|s| s.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')))
        .filter(|t| *t == name)
        .count()
}

/// A variable is active when it is mentioned beyond its declarations.
fn is_active(sources: &[&str], name: &str, declarations: usize) -> bool {
    identifier_count(sources, name) > declarations
}

fn attribute_slots(type_name: &str) -> i32 {
    type_name
        .strip_prefix("mat")
        .and_then(|dims| dims.chars().next())
        .and_then(|c| c.to_digit(10))
        .map(|d| d as i32)
        .unwrap_or(1)
}

fn assign_attribute_locations(
    vertex_source: &str,
    remaps: &HashMap<String, i32>,
    max_attribs: u32,
) -> HashMap<String, i32> {
    let declared = scan_variables(vertex_source, "in");
    let active: Vec<&ScannedVariable> = declared
        .iter()
        .filter(|v| is_active(&[vertex_source], &v.name, 1))
        .collect();

    let mut used: HashSet<i32> = HashSet::new();
    let mut locations = HashMap::new();

    for var in active.iter().filter(|v| v.location.is_some()) {
        let location = var.location.unwrap_or_default();
        for slot in 0..attribute_slots(&var.type_name) {
            used.insert(location + slot);
        }
        locations.insert(var.name.clone(), location);
    }

    for var in active.iter().filter(|v| v.location.is_none()) {
        let slots = attribute_slots(&var.type_name);
        let start = (0..max_attribs as i32)
            .find(|start| (0..slots).all(|s| !used.contains(&(start + s))))
            .unwrap_or(max_attribs as i32);
        for slot in 0..slots {
            used.insert(start + slot);
        }
        locations.insert(var.name.clone(), start);
    }

    for (name, location) in remaps {
        if let Some(existing) = locations.get_mut(name) {
            *existing = *location;
        }
    }
    locations
}

fn active_uniforms(vertex_source: &str, fragment_source: &str) -> Vec<String> {
    let mut declared: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for var in scan_variables(vertex_source, "uniform")
        .into_iter()
        .chain(scan_variables(fragment_source, "uniform"))
    {
        let count = counts.entry(var.name.clone()).or_insert(0);
        if *count == 0 {
            declared.push(var.name);
        }
        *count += 1;
    }
    declared
        .into_iter()
        .filter(|name| is_active(&[vertex_source, fragment_source], name, counts[name]))
        .collect()
}

fn compile_log(source: &str) -> Option<String> {
    for (number, line) in source.lines().enumerate() {
        if line.trim_start().starts_with("#error") {
            return Some(format!("ERROR: 0:{}: '#error' : {}", number + 1, line.trim()));
        }
    }
    if !source.contains("void main") {
        return Some("ERROR: 0:0: 'main' : missing main function".to_string());
    }
    None
}

// ==================== Gl Implementation ====================

impl Gl for SoftwareGl {
    fn get_error(&mut self) -> u32 {
        let err = self.last_error;
        self.last_error = constants::NO_ERROR;
        err
    }

    fn get_parameter(&self, pname: u32) -> i32 {
        let value = match pname {
            constants::MAX_VERTEX_ATTRIBS => self.limits.max_vertex_attribs,
            constants::MAX_COMBINED_TEXTURE_IMAGE_UNITS => self.limits.max_combined_texture_units,
            constants::MAX_COLOR_ATTACHMENTS => self.limits.max_color_attachments,
            constants::MAX_DRAW_BUFFERS => self.limits.max_draw_buffers,
            constants::MAX_RENDERBUFFER_SIZE => self.limits.max_renderbuffer_size,
            constants::MAX_TEXTURE_SIZE => self.limits.max_texture_size,
            constants::MAX_3D_TEXTURE_SIZE => self.limits.max_3d_texture_size,
            constants::MAX_CUBE_MAP_TEXTURE_SIZE => self.limits.max_cube_map_texture_size,
            constants::MAX_ARRAY_TEXTURE_LAYERS => self.limits.max_array_texture_layers,
            constants::MAX_SAMPLES => self.limits.max_samples,
            _ => 0,
        };
        value as i32
    }

    fn enable(&mut self, cap: u32) {
        match cap {
            constants::BLEND => self.state.blend_enabled = true,
            constants::CULL_FACE => self.state.cull_face_enabled = true,
            constants::DEPTH_TEST => self.state.depth_test_enabled = true,
            constants::SCISSOR_TEST => self.state.scissor_test_enabled = true,
            constants::STENCIL_TEST => self.state.stencil_test_enabled = true,
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn disable(&mut self, cap: u32) {
        match cap {
            constants::BLEND => self.state.blend_enabled = false,
            constants::CULL_FACE => self.state.cull_face_enabled = false,
            constants::DEPTH_TEST => self.state.depth_test_enabled = false,
            constants::SCISSOR_TEST => self.state.scissor_test_enabled = false,
            constants::STENCIL_TEST => self.state.stencil_test_enabled = false,
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn depth_mask(&mut self, flag: bool) {
        self.state.depth_mask = flag;
    }

    fn depth_func(&mut self, func: u32) {
        self.state.depth_func = func;
    }

    fn cull_face(&mut self, mode: u32) {
        self.state.cull_face_mode = mode;
    }

    fn blend_func_separate(&mut self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        self.state.blend_func = (src_rgb, dst_rgb, src_alpha, dst_alpha);
    }

    fn blend_equation_separate(&mut self, mode_rgb: u32, mode_alpha: u32) {
        self.state.blend_equation = (mode_rgb, mode_alpha);
    }

    // ==================== Shaders ====================

    fn create_shader(&mut self, shader_type: u32) -> Option<WebGLShader> {
        if !matches!(shader_type, constants::VERTEX_SHADER | constants::FRAGMENT_SHADER) {
            self.set_error(constants::INVALID_ENUM);
            return None;
        }
        let shader = self.allocate()?;
        self.shaders.insert(shader, ShaderData::new(shader_type));
        Some(shader)
    }

    fn shader_source(&mut self, shader: WebGLShader, source: &str) {
        match self.shaders.get_mut(&shader) {
            Some(data) => data.source = source.to_string(),
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: WebGLShader) {
        let Some(data) = self.shaders.get_mut(&shader) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        match compile_log(&data.source) {
            Some(log) => {
                data.compiled = false;
                data.info_log = log;
            }
            None => {
                data.compiled = true;
                data.info_log.clear();
            }
        }
    }

    fn get_shader_compile_status(&self, shader: WebGLShader) -> bool {
        self.shaders.get(&shader).is_some_and(|d| d.compiled)
    }

    fn get_shader_info_log(&self, shader: WebGLShader) -> String {
        self.shaders
            .get(&shader)
            .map(|d| d.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: WebGLShader) {
        if let Some(data) = self.shaders.get_mut(&shader) {
            data.deleted = true;
        }
    }

    // ==================== Programs ====================

    fn create_program(&mut self) -> Option<WebGLProgram> {
        let program = self.allocate()?;
        self.programs.insert(program, ProgramData::default());
        Some(program)
    }

    fn attach_shader(&mut self, program: WebGLProgram, shader: WebGLShader) {
        let Some(shader_type) = self.shaders.get(&shader).map(|d| d.shader_type) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        let Some(program_data) = self.programs.get_mut(&program) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        match shader_type {
            constants::VERTEX_SHADER => program_data.vertex_shader = Some(shader),
            constants::FRAGMENT_SHADER => program_data.fragment_shader = Some(shader),
            _ => {}
        }
    }

    fn link_program(&mut self, program: WebGLProgram) {
        let Some(data) = self.programs.get(&program) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        let compiled_source = |shader: Option<WebGLShader>| {
            shader
                .and_then(|s| self.shaders.get(&s))
                .filter(|d| d.compiled)
                .map(|d| d.source.clone())
        };
        let vertex = compiled_source(data.vertex_shader);
        let fragment = compiled_source(data.fragment_shader);

        let (linked, info_log, attributes, uniforms) = match (self.pending_link_failure.take(), vertex, fragment) {
            (Some(log), _, _) => (false, log, HashMap::new(), HashMap::new()),
            (None, Some(vs), Some(fs)) => {
                let attributes = assign_attribute_locations(
                    &vs,
                    &self.attribute_remaps,
                    self.limits.max_vertex_attribs,
                );
                let uniforms = active_uniforms(&vs, &fs)
                    .into_iter()
                    .map(|name| (name, WebGLObject::new()))
                    .collect();
                (true, String::new(), attributes, uniforms)
            }
            _ => (
                false,
                "Failed to link: missing or uncompiled shaders".to_string(),
                HashMap::new(),
                HashMap::new(),
            ),
        };

        debug!(program = program.id(), linked, "link_program");
        if let Some(data) = self.programs.get_mut(&program) {
            data.linked = linked;
            data.info_log = info_log;
            data.attributes = attributes;
            data.uniforms = uniforms;
        }
    }

    fn get_program_link_status(&self, program: WebGLProgram) -> bool {
        self.programs.get(&program).is_some_and(|d| d.linked)
    }

    fn get_program_info_log(&self, program: WebGLProgram) -> String {
        self.programs
            .get(&program)
            .map(|d| d.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: Option<WebGLProgram>) {
        if let Some(p) = program {
            if !self.programs.get(&p).is_some_and(|d| d.linked && !d.deleted) {
                self.set_error(constants::INVALID_OPERATION);
                return;
            }
        }
        self.state.current_program = program;
    }

    fn delete_program(&mut self, program: WebGLProgram) {
        if let Some(data) = self.programs.get_mut(&program) {
            data.deleted = true;
        }
        if self.state.current_program == Some(program) {
            self.state.current_program = None;
        }
    }

    fn get_attrib_location(&self, program: WebGLProgram, name: &str) -> i32 {
        self.programs
            .get(&program)
            .and_then(|d| d.attributes.get(name).copied())
            .unwrap_or(-1)
    }

    fn get_uniform_location(
        &self,
        program: WebGLProgram,
        name: &str,
    ) -> Option<WebGLUniformLocation> {
        let base = name.strip_suffix("[0]").unwrap_or(name);
        self.programs
            .get(&program)
            .and_then(|d| d.uniforms.get(base).copied())
    }

    // ==================== Uniforms ====================

    fn uniform_fv(&mut self, location: WebGLUniformLocation, size: u32, data: &[f32]) {
        self.record_uniform(location, size, UniformData::Float(data.to_vec()));
    }

    fn uniform_iv(&mut self, location: WebGLUniformLocation, size: u32, data: &[i32]) {
        self.record_uniform(location, size, UniformData::Int(data.to_vec()));
    }

    fn uniform_uiv(&mut self, location: WebGLUniformLocation, size: u32, data: &[u32]) {
        self.record_uniform(location, size, UniformData::Uint(data.to_vec()));
    }

    fn uniform_matrix_fv(
        &mut self,
        location: WebGLUniformLocation,
        columns: u32,
        rows: u32,
        transpose: bool,
        data: &[f32],
    ) {
        self.record_uniform(
            location,
            rows,
            UniformData::Matrix {
                columns,
                rows,
                transpose,
                data: data.to_vec(),
            },
        );
    }

    // ==================== Buffers ====================

    fn create_buffer(&mut self) -> Option<WebGLBuffer> {
        let buffer = self.allocate()?;
        self.buffers.insert(buffer, BufferData::default());
        Some(buffer)
    }

    fn bind_buffer(&mut self, target: u32, buffer: Option<WebGLBuffer>) {
        match target {
            constants::ARRAY_BUFFER => self.state.current_array_buffer = buffer,
            constants::ELEMENT_ARRAY_BUFFER => {
                if let Some(vao) = self.current_vertex_array_mut() {
                    vao.element_buffer = buffer;
                }
            }
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32) {
        let buffer = match target {
            constants::ARRAY_BUFFER => self.state.current_array_buffer,
            constants::ELEMENT_ARRAY_BUFFER => self.current_vertex_array().and_then(|v| v.element_buffer),
            _ => None,
        };

        match buffer.and_then(|b| self.buffers.get_mut(&b)) {
            Some(buf_data) => {
                buf_data.target = target;
                buf_data.usage = usage;
                buf_data.data = data.to_vec();
            }
            None => self.set_error(constants::INVALID_OPERATION),
        }
    }

    fn delete_buffer(&mut self, buffer: WebGLBuffer) {
        if let Some(data) = self.buffers.get_mut(&buffer) {
            data.deleted = true;
        }
        if self.state.current_array_buffer == Some(buffer) {
            self.state.current_array_buffer = None;
        }
    }

    // ==================== Vertex Arrays ====================

    fn create_vertex_array(&mut self) -> Option<WebGLVertexArray> {
        let vao = self.allocate()?;
        self.vertex_arrays
            .insert(vao, VertexArrayData::new(self.limits.max_vertex_attribs));
        Some(vao)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<WebGLVertexArray>) {
        if let Some(vao) = vertex_array {
            if !self.vertex_arrays.get(&vao).is_some_and(|d| !d.deleted) {
                self.set_error(constants::INVALID_OPERATION);
                return;
            }
        }
        self.state.current_vertex_array = vertex_array;
    }

    fn delete_vertex_array(&mut self, vertex_array: WebGLVertexArray) {
        if let Some(data) = self.vertex_arrays.get_mut(&vertex_array) {
            data.deleted = true;
        }
        if self.state.current_vertex_array == Some(vertex_array) {
            self.state.current_vertex_array = None;
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        let attrib = self
            .current_vertex_array_mut()
            .and_then(|v| v.attribs.get_mut(index as usize));
        match attrib {
            Some(a) => a.enabled = true,
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let buffer = self.state.current_array_buffer;
        if buffer.is_none() || !(1..=4).contains(&size) || !(0..=255).contains(&stride) {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }
        let attrib = self
            .current_vertex_array_mut()
            .and_then(|v| v.attribs.get_mut(index as usize));
        match attrib {
            Some(a) => {
                *a = VertexAttribPointer {
                    enabled: a.enabled,
                    size,
                    type_,
                    normalized,
                    integer: false,
                    stride,
                    offset,
                    divisor: a.divisor,
                    buffer,
                }
            }
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    fn vertex_attrib_i_pointer(&mut self, index: u32, size: i32, type_: u32, stride: i32, offset: i32) {
        let buffer = self.state.current_array_buffer;
        let integer_type = matches!(
            type_,
            constants::BYTE
                | constants::UNSIGNED_BYTE
                | constants::SHORT
                | constants::UNSIGNED_SHORT
                | constants::INT
                | constants::UNSIGNED_INT
        );
        if buffer.is_none() || !integer_type || !(1..=4).contains(&size) {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }
        let attrib = self
            .current_vertex_array_mut()
            .and_then(|v| v.attribs.get_mut(index as usize));
        match attrib {
            Some(a) => {
                *a = VertexAttribPointer {
                    enabled: a.enabled,
                    size,
                    type_,
                    normalized: false,
                    integer: true,
                    stride,
                    offset,
                    divisor: a.divisor,
                    buffer,
                }
            }
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        let attrib = self
            .current_vertex_array_mut()
            .and_then(|v| v.attribs.get_mut(index as usize));
        match attrib {
            Some(a) => a.divisor = divisor,
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    // ==================== Textures ====================

    fn create_texture(&mut self) -> Option<WebGLTexture> {
        let texture = self.allocate()?;
        self.textures.insert(texture, TextureData::default());
        Some(texture)
    }

    fn active_texture(&mut self, texture: u32) {
        let unit = texture.wrapping_sub(constants::TEXTURE0);
        if unit >= self.limits.max_combined_texture_units {
            self.set_error(constants::INVALID_ENUM);
            return;
        }
        self.state.active_texture = unit;
    }

    fn bind_texture(&mut self, target: u32, texture: Option<WebGLTexture>) {
        let key = (self.state.active_texture, target);
        let Some(tex) = texture else {
            self.state.texture_units.remove(&key);
            return;
        };
        match self.textures.get_mut(&tex) {
            Some(data) if data.target == 0 || data.target == target => {
                data.target = target;
                self.state.texture_units.insert(key, tex);
            }
            _ => self.set_error(constants::INVALID_OPERATION),
        }
    }

    fn tex_storage_2d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32) {
        self.tex_storage_3d(target, levels, internal_format, width, height, 1);
    }

    fn tex_storage_3d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
    ) {
        if levels < 1 || width < 1 || height < 1 || depth < 1 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        let Some(tex) = self.bound_texture(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        match self.textures.get_mut(&tex) {
            Some(data) if !data.immutable => {
                data.width = width as u32;
                data.height = height as u32;
                data.depth = depth as u32;
                data.levels = levels as u32;
                data.internal_format = internal_format;
                data.immutable = true;
            }
            _ => self.set_error(constants::INVALID_OPERATION),
        }
    }

    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        xoffset: i32,
        yoffset: i32,
        width: i32,
        height: i32,
        format: u32,
        type_: u32,
        data: &[u8],
    ) {
        self.tex_sub_image_3d(target, level, xoffset, yoffset, 0, width, height, 1, format, type_, data);
    }

    fn tex_sub_image_3d(
        &mut self,
        target: u32,
        level: i32,
        xoffset: i32,
        yoffset: i32,
        zoffset: i32,
        width: i32,
        height: i32,
        depth: i32,
        _format: u32,
        _type_: u32,
        data: &[u8],
    ) {
        let Some(tex) = self.bound_texture(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        let Some(tex_data) = self.textures.get_mut(&tex) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if !tex_data.immutable || level < 0 || level as u32 >= tex_data.levels {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }
        let (w, h) = tex_data.level_size(level as u32);
        let in_bounds = xoffset >= 0
            && yoffset >= 0
            && zoffset >= 0
            && (xoffset + width) as u32 <= w
            && (yoffset + height) as u32 <= h
            && (zoffset + depth) as u32 <= tex_data.depth.max(1);
        if !in_bounds {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        tex_data.uploaded_bytes += data.len();
    }

    fn tex_parameteri(&mut self, target: u32, pname: u32, param: i32) {
        let Some(tex) = self.bound_texture(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(data) = self.textures.get_mut(&tex) {
            data.parameters.insert(pname, param);
        }
    }

    fn generate_mipmap(&mut self, target: u32) {
        let Some(tex) = self.bound_texture(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(data) = self.textures.get_mut(&tex) {
            data.mipmaps_generated = true;
        }
    }

    fn delete_texture(&mut self, texture: WebGLTexture) {
        if let Some(data) = self.textures.get_mut(&texture) {
            data.deleted = true;
        }
        self.state.texture_units.retain(|_, t| *t != texture);
    }

    // ==================== Renderbuffers ====================

    fn create_renderbuffer(&mut self) -> Option<WebGLRenderbuffer> {
        let rb = self.allocate()?;
        self.renderbuffers.insert(rb, RenderbufferData::default());
        Some(rb)
    }

    fn bind_renderbuffer(&mut self, _target: u32, renderbuffer: Option<WebGLRenderbuffer>) {
        self.state.current_renderbuffer = renderbuffer;
    }

    fn renderbuffer_storage_multisample(
        &mut self,
        _target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        if samples < 0
            || samples as u32 > self.limits.max_samples
            || width < 1
            || height < 1
            || width as u32 > self.limits.max_renderbuffer_size
            || height as u32 > self.limits.max_renderbuffer_size
        {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        let Some(rb) = self.state.current_renderbuffer else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(data) = self.renderbuffers.get_mut(&rb) {
            data.internal_format = internal_format;
            data.width = width as u32;
            data.height = height as u32;
            data.samples = samples as u32;
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: WebGLRenderbuffer) {
        if let Some(data) = self.renderbuffers.get_mut(&renderbuffer) {
            data.deleted = true;
        }
        if self.state.current_renderbuffer == Some(renderbuffer) {
            self.state.current_renderbuffer = None;
        }
    }

    // ==================== Framebuffers ====================

    fn create_framebuffer(&mut self) -> Option<WebGLFramebuffer> {
        let fb = self.allocate()?;
        self.framebuffers.insert(fb, FramebufferData::default());
        Some(fb)
    }

    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<WebGLFramebuffer>) {
        match target {
            constants::FRAMEBUFFER => {
                self.state.current_draw_framebuffer = framebuffer;
                self.state.current_read_framebuffer = framebuffer;
            }
            constants::DRAW_FRAMEBUFFER => self.state.current_draw_framebuffer = framebuffer,
            constants::READ_FRAMEBUFFER => self.state.current_read_framebuffer = framebuffer,
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        _textarget: u32,
        texture: Option<WebGLTexture>,
        level: i32,
    ) {
        let Some(fb) = self.framebuffer_binding(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(data) = self.framebuffers.get_mut(&fb) {
            match texture {
                Some(texture) => {
                    data.attachments.insert(
                        attachment,
                        AttachmentData::Texture {
                            texture,
                            level: level.max(0) as u32,
                            layer: None,
                        },
                    );
                }
                None => {
                    data.attachments.remove(&attachment);
                }
            }
        }
    }

    fn framebuffer_texture_layer(
        &mut self,
        target: u32,
        attachment: u32,
        texture: Option<WebGLTexture>,
        level: i32,
        layer: i32,
    ) {
        let Some(fb) = self.framebuffer_binding(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(data) = self.framebuffers.get_mut(&fb) {
            match texture {
                Some(texture) => {
                    data.attachments.insert(
                        attachment,
                        AttachmentData::Texture {
                            texture,
                            level: level.max(0) as u32,
                            layer: Some(layer.max(0) as u32),
                        },
                    );
                }
                None => {
                    data.attachments.remove(&attachment);
                }
            }
        }
    }

    fn framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        _renderbuffer_target: u32,
        renderbuffer: Option<WebGLRenderbuffer>,
    ) {
        let Some(fb) = self.framebuffer_binding(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(data) = self.framebuffers.get_mut(&fb) {
            match renderbuffer {
                Some(rb) => {
                    data.attachments.insert(attachment, AttachmentData::Renderbuffer(rb));
                }
                None => {
                    data.attachments.remove(&attachment);
                }
            }
        }
    }

    fn draw_buffers(&mut self, buffers: &[u32]) {
        let Some(fb) = self.state.current_draw_framebuffer else {
            return;
        };
        if buffers.len() as u32 > self.limits.max_draw_buffers {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        if let Some(data) = self.framebuffers.get_mut(&fb) {
            data.draw_buffers = buffers.to_vec();
        }
    }

    fn check_framebuffer_status(&self, target: u32) -> u32 {
        let Some(fb) = self.framebuffer_binding(target) else {
            return constants::FRAMEBUFFER_COMPLETE;
        };
        let Some(data) = self.framebuffers.get(&fb) else {
            return constants::FRAMEBUFFER_UNSUPPORTED;
        };
        if data.attachments.is_empty() {
            return constants::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        }
        if data.attachments.contains_key(&constants::DEPTH_STENCIL_ATTACHMENT)
            && (data.attachments.contains_key(&constants::DEPTH_ATTACHMENT)
                || data.attachments.contains_key(&constants::STENCIL_ATTACHMENT))
        {
            return constants::FRAMEBUFFER_UNSUPPORTED;
        }
        if let (Some(depth), Some(stencil)) = (
            data.attachments.get(&constants::DEPTH_ATTACHMENT),
            data.attachments.get(&constants::STENCIL_ATTACHMENT),
        ) {
            if depth != stencil {
                return constants::FRAMEBUFFER_UNSUPPORTED;
            }
        }

        let mut resolved = Vec::with_capacity(data.attachments.len());
        for (point, attachment) in &data.attachments {
            match self.resolve_attachment(attachment) {
                Some((w, h, samples, format)) if attachment_accepts(*point, format) => {
                    resolved.push((w, h, samples));
                }
                _ => return constants::FRAMEBUFFER_INCOMPLETE_ATTACHMENT,
            }
        }
        let (w0, h0, s0) = resolved[0];
        if resolved.iter().any(|(w, h, _)| *w != w0 || *h != h0) {
            return constants::FRAMEBUFFER_INCOMPLETE_DIMENSIONS;
        }
        if resolved.iter().any(|(_, _, s)| *s != s0) {
            return constants::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE;
        }
        constants::FRAMEBUFFER_COMPLETE
    }

    fn delete_framebuffer(&mut self, framebuffer: WebGLFramebuffer) {
        if let Some(data) = self.framebuffers.get_mut(&framebuffer) {
            data.deleted = true;
        }
        if self.state.current_draw_framebuffer == Some(framebuffer) {
            self.state.current_draw_framebuffer = None;
        }
        if self.state.current_read_framebuffer == Some(framebuffer) {
            self.state.current_read_framebuffer = None;
        }
    }

    // ==================== Drawing ====================

    fn draw_elements(&mut self, mode: u32, count: i32, type_: u32, offset: i32) {
        self.record_draw(mode, count, type_, offset, 1);
    }

    fn draw_elements_instanced(
        &mut self,
        mode: u32,
        count: i32,
        type_: u32,
        offset: i32,
        instance_count: i32,
    ) {
        self.record_draw(mode, count, type_, offset, instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "#version 300 es
layout(location = 1) in vec3 a_normal;
in vec2 a_pos;
in vec4 a_unused;
in mat4 a_model;
uniform mat4 u_mvp;
void main() {
    gl_Position = u_mvp * a_model * vec4(a_pos, 0.0, 1.0) + vec4(a_normal, 0.0);
}";

    const FS: &str = "#version 300 es
precision mediump float;
uniform vec4 u_color;
uniform float u_dead;
out vec4 color;
void main() {
    color = u_color;
}";

    fn linked_program(ctx: &mut SoftwareGl, vs_src: &str, fs_src: &str) -> WebGLProgram {
        let vs = ctx.create_shader(constants::VERTEX_SHADER).unwrap();
        ctx.shader_source(vs, vs_src);
        ctx.compile_shader(vs);
        let fs = ctx.create_shader(constants::FRAGMENT_SHADER).unwrap();
        ctx.shader_source(fs, fs_src);
        ctx.compile_shader(fs);
        let program = ctx.create_program().unwrap();
        ctx.attach_shader(program, vs);
        ctx.attach_shader(program, fs);
        ctx.link_program(program);
        program
    }

    #[test]
    fn test_create_shader() {
        let mut ctx = SoftwareGl::new();
        let shader = ctx.create_shader(constants::VERTEX_SHADER).unwrap();
        assert!(shader.is_valid());

        ctx.shader_source(shader, "void main() {}");
        ctx.compile_shader(shader);

        assert!(ctx.get_shader_compile_status(shader));
    }

    #[test]
    fn test_compile_error_reports_log() {
        let mut ctx = SoftwareGl::new();
        let shader = ctx.create_shader(constants::FRAGMENT_SHADER).unwrap();
        ctx.shader_source(shader, "#error broken\nvoid main() {}");
        ctx.compile_shader(shader);

        assert!(!ctx.get_shader_compile_status(shader));
        assert!(ctx.get_shader_info_log(shader).contains("#error"));
    }

    #[test]
    fn test_link_assigns_locations() {
        let mut ctx = SoftwareGl::new();
        let program = linked_program(&mut ctx, VS, FS);

        assert!(ctx.get_program_link_status(program));
        assert_eq!(ctx.get_attrib_location(program, "a_normal"), 1);
        assert_eq!(ctx.get_attrib_location(program, "a_pos"), 0);
        // mat4 takes four consecutive slots after the explicit one
        assert_eq!(ctx.get_attrib_location(program, "a_model"), 2);
        assert_eq!(ctx.get_attrib_location(program, "a_unused"), -1);
    }

    #[test]
    fn test_link_drops_unused_uniforms() {
        let mut ctx = SoftwareGl::new();
        let program = linked_program(&mut ctx, VS, FS);

        assert!(ctx.get_uniform_location(program, "u_mvp").is_some());
        assert!(ctx.get_uniform_location(program, "u_color").is_some());
        assert!(ctx.get_uniform_location(program, "u_dead").is_none());
    }

    #[test]
    fn test_injected_link_failure() {
        let mut ctx = SoftwareGl::new();
        ctx.fail_next_link("varying mismatch");
        let program = linked_program(&mut ctx, VS, FS);

        assert!(!ctx.get_program_link_status(program));
        assert_eq!(ctx.get_program_info_log(program), "varying mismatch");
    }

    #[test]
    fn test_lost_context_returns_none() {
        let mut ctx = SoftwareGl::new();
        ctx.lose_context();
        assert!(ctx.create_buffer().is_none());
        assert_eq!(ctx.get_error(), constants::CONTEXT_LOST_WEBGL);
    }

    #[test]
    fn test_uniform_uploads_are_recorded() {
        let mut ctx = SoftwareGl::new();
        let program = linked_program(&mut ctx, VS, FS);
        let loc = ctx.get_uniform_location(program, "u_color").unwrap();

        ctx.use_program(Some(program));
        ctx.uniform_fv(loc, 4, &[1.0, 0.0, 0.0, 1.0]);

        assert_eq!(ctx.uniform_uploads().len(), 1);
        assert_eq!(
            ctx.uniform_value(loc),
            Some(&UniformData::Float(vec![1.0, 0.0, 0.0, 1.0]))
        );
    }

    #[test]
    fn test_uniform_without_program_is_an_error() {
        let mut ctx = SoftwareGl::new();
        let program = linked_program(&mut ctx, VS, FS);
        let loc = ctx.get_uniform_location(program, "u_color").unwrap();

        ctx.uniform_fv(loc, 4, &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(ctx.get_error(), constants::INVALID_OPERATION);
        assert!(ctx.uniform_uploads().is_empty());
    }

    #[test]
    fn test_enable_disable() {
        let mut ctx = SoftwareGl::new();

        assert!(!ctx.is_enabled(constants::BLEND));
        ctx.enable(constants::BLEND);
        assert!(ctx.is_enabled(constants::BLEND));
        ctx.disable(constants::BLEND);
        assert!(!ctx.is_enabled(constants::BLEND));
    }

    #[test]
    fn test_vertex_array_captures_pointers() {
        let mut ctx = SoftwareGl::new();
        let vao = ctx.create_vertex_array().unwrap();
        let buffer = ctx.create_buffer().unwrap();
        ctx.bind_vertex_array(Some(vao));
        ctx.bind_buffer(constants::ARRAY_BUFFER, Some(buffer));
        ctx.vertex_attrib_pointer(0, 3, constants::FLOAT, false, 12, 0);
        ctx.enable_vertex_attrib_array(0);
        ctx.bind_vertex_array(None);

        let data = ctx.get_vertex_array_data(vao).unwrap();
        assert_eq!(data.enabled_locations(), vec![0]);
        assert_eq!(data.attribs[0].size, 3);
        assert_eq!(data.attribs[0].buffer, Some(buffer));
        // default VAO untouched
        assert!(ctx.default_vertex_array.enabled_locations().is_empty());
    }

    #[test]
    fn test_draw_elements_records_state() {
        let mut ctx = SoftwareGl::new();
        let program = linked_program(&mut ctx, VS, FS);
        let vao = ctx.create_vertex_array().unwrap();
        let indices = ctx.create_buffer().unwrap();
        ctx.bind_vertex_array(Some(vao));
        ctx.bind_buffer(constants::ELEMENT_ARRAY_BUFFER, Some(indices));
        ctx.buffer_data(constants::ELEMENT_ARRAY_BUFFER, &[0, 1, 2], constants::STATIC_DRAW);
        ctx.use_program(Some(program));
        ctx.enable(constants::DEPTH_TEST);

        ctx.draw_elements(constants::TRIANGLES, 3, constants::UNSIGNED_BYTE, 0);

        let draws = ctx.take_draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 3);
        assert_eq!(draws[0].instances, 1);
        assert!(draws[0].state.depth_test_enabled);
    }

    #[test]
    fn test_draw_without_element_buffer_fails() {
        let mut ctx = SoftwareGl::new();
        let program = linked_program(&mut ctx, VS, FS);
        ctx.use_program(Some(program));
        ctx.draw_elements(constants::TRIANGLES, 3, constants::UNSIGNED_BYTE, 0);

        assert!(ctx.draws().is_empty());
        assert_eq!(ctx.get_error(), constants::INVALID_OPERATION);
    }

    #[test]
    fn test_texture_storage_and_upload() {
        let mut ctx = SoftwareGl::new();
        let texture = ctx.create_texture().unwrap();

        ctx.bind_texture(constants::TEXTURE_2D, Some(texture));
        ctx.tex_storage_2d(constants::TEXTURE_2D, 1, constants::RGBA8, 2, 2);
        ctx.tex_sub_image_2d(
            constants::TEXTURE_2D,
            0,
            0,
            0,
            2,
            2,
            constants::RGBA,
            constants::UNSIGNED_BYTE,
            &[0; 16],
        );
        ctx.tex_parameteri(constants::TEXTURE_2D, constants::TEXTURE_MIN_FILTER, constants::LINEAR as i32);

        let tex_data = ctx.get_texture_data(texture).unwrap();
        assert_eq!(tex_data.uploaded_bytes, 16);
        assert_eq!(
            tex_data.parameters.get(&constants::TEXTURE_MIN_FILTER),
            Some(&(constants::LINEAR as i32))
        );
    }

    #[test]
    fn test_framebuffer_completeness() {
        let mut ctx = SoftwareGl::new();
        let color = ctx.create_texture().unwrap();
        ctx.bind_texture(constants::TEXTURE_2D, Some(color));
        ctx.tex_storage_2d(constants::TEXTURE_2D, 1, constants::RGBA8, 64, 64);

        let depth = ctx.create_renderbuffer().unwrap();
        ctx.bind_renderbuffer(constants::RENDERBUFFER, Some(depth));
        ctx.renderbuffer_storage_multisample(constants::RENDERBUFFER, 0, constants::DEPTH_COMPONENT16, 32, 32);

        let fb = ctx.create_framebuffer().unwrap();
        ctx.bind_framebuffer(constants::FRAMEBUFFER, Some(fb));
        assert_eq!(
            ctx.check_framebuffer_status(constants::FRAMEBUFFER),
            constants::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
        );

        ctx.framebuffer_texture_2d(
            constants::FRAMEBUFFER,
            constants::COLOR_ATTACHMENT0,
            constants::TEXTURE_2D,
            Some(color),
            0,
        );
        assert_eq!(
            ctx.check_framebuffer_status(constants::FRAMEBUFFER),
            constants::FRAMEBUFFER_COMPLETE
        );

        ctx.framebuffer_renderbuffer(
            constants::FRAMEBUFFER,
            constants::DEPTH_ATTACHMENT,
            constants::RENDERBUFFER,
            Some(depth),
        );
        assert_eq!(
            ctx.check_framebuffer_status(constants::FRAMEBUFFER),
            constants::FRAMEBUFFER_INCOMPLETE_DIMENSIONS
        );
    }

    #[test]
    fn test_live_objects_excludes_deleted() {
        let mut ctx = SoftwareGl::new();
        let a = ctx.create_buffer().unwrap();
        let _b = ctx.create_buffer().unwrap();
        assert_eq!(ctx.live_objects(), 2);
        ctx.delete_buffer(a);
        assert_eq!(ctx.live_objects(), 1);
    }
}
