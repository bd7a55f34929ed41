//! The graphics-context capability.

use crate::{
    WebGLBuffer, WebGLFramebuffer, WebGLProgram, WebGLRenderbuffer, WebGLShader, WebGLTexture,
    WebGLUniformLocation, WebGLVertexArray,
};

/// The primitive operations of a WebGL2 rendering context.
///
/// Method names and argument order follow the WebGL2 API. Creation methods
/// return `None` where WebGL would hand back `null` (lost context, resource
/// exhaustion). Everything else reports failure through [`Gl::get_error`], the
/// same way the platform does.
pub trait Gl {
    // ==================== State ====================

    /// Get and clear the error flag.
    fn get_error(&mut self) -> u32;

    /// Query an integer implementation limit such as `MAX_VERTEX_ATTRIBS`.
    fn get_parameter(&self, pname: u32) -> i32;

    fn enable(&mut self, cap: u32);
    fn disable(&mut self, cap: u32);
    fn depth_mask(&mut self, flag: bool);
    fn depth_func(&mut self, func: u32);
    fn cull_face(&mut self, mode: u32);
    fn blend_func_separate(&mut self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
    fn blend_equation_separate(&mut self, mode_rgb: u32, mode_alpha: u32);

    // ==================== Shaders ====================

    fn create_shader(&mut self, shader_type: u32) -> Option<WebGLShader>;
    fn shader_source(&mut self, shader: WebGLShader, source: &str);
    fn compile_shader(&mut self, shader: WebGLShader);
    fn get_shader_compile_status(&self, shader: WebGLShader) -> bool;
    fn get_shader_info_log(&self, shader: WebGLShader) -> String;
    fn delete_shader(&mut self, shader: WebGLShader);

    // ==================== Programs ====================

    fn create_program(&mut self) -> Option<WebGLProgram>;
    fn attach_shader(&mut self, program: WebGLProgram, shader: WebGLShader);
    fn link_program(&mut self, program: WebGLProgram);
    fn get_program_link_status(&self, program: WebGLProgram) -> bool;
    fn get_program_info_log(&self, program: WebGLProgram) -> String;
    fn use_program(&mut self, program: Option<WebGLProgram>);
    fn delete_program(&mut self, program: WebGLProgram);

    /// Location of an active attribute, or -1.
    fn get_attrib_location(&self, program: WebGLProgram, name: &str) -> i32;

    /// Location of an active uniform, or `None` when the linker dropped it.
    fn get_uniform_location(&self, program: WebGLProgram, name: &str)
        -> Option<WebGLUniformLocation>;

    // ==================== Uniforms ====================

    /// `uniform{1,2,3,4}fv`; `size` is the component count.
    fn uniform_fv(&mut self, location: WebGLUniformLocation, size: u32, data: &[f32]);

    /// `uniform{1,2,3,4}iv`; also used for booleans and samplers.
    fn uniform_iv(&mut self, location: WebGLUniformLocation, size: u32, data: &[i32]);

    /// `uniform{1,2,3,4}uiv`.
    fn uniform_uiv(&mut self, location: WebGLUniformLocation, size: u32, data: &[u32]);

    /// `uniformMatrix{C}x{R}fv`.
    fn uniform_matrix_fv(
        &mut self,
        location: WebGLUniformLocation,
        columns: u32,
        rows: u32,
        transpose: bool,
        data: &[f32],
    );

    // ==================== Buffers ====================

    fn create_buffer(&mut self) -> Option<WebGLBuffer>;
    fn bind_buffer(&mut self, target: u32, buffer: Option<WebGLBuffer>);
    fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32);
    fn delete_buffer(&mut self, buffer: WebGLBuffer);

    // ==================== Vertex Arrays ====================

    fn create_vertex_array(&mut self) -> Option<WebGLVertexArray>;
    fn bind_vertex_array(&mut self, vertex_array: Option<WebGLVertexArray>);
    fn delete_vertex_array(&mut self, vertex_array: WebGLVertexArray);
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn vertex_attrib_i_pointer(&mut self, index: u32, size: i32, type_: u32, stride: i32, offset: i32);
    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32);

    // ==================== Textures ====================

    fn create_texture(&mut self) -> Option<WebGLTexture>;

    /// Select the active unit; `texture` is `TEXTURE0 + n`.
    fn active_texture(&mut self, texture: u32);
    fn bind_texture(&mut self, target: u32, texture: Option<WebGLTexture>);
    fn tex_storage_2d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32);
    fn tex_storage_3d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    #[allow(clippy::too_many_arguments)]
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
        format: u32,
        type_: u32,
        data: &[u8],
    );
    fn tex_parameteri(&mut self, target: u32, pname: u32, param: i32);
    fn generate_mipmap(&mut self, target: u32);
    fn delete_texture(&mut self, texture: WebGLTexture);

    // ==================== Renderbuffers ====================

    fn create_renderbuffer(&mut self) -> Option<WebGLRenderbuffer>;
    fn bind_renderbuffer(&mut self, target: u32, renderbuffer: Option<WebGLRenderbuffer>);
    fn renderbuffer_storage_multisample(
        &mut self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    );
    fn delete_renderbuffer(&mut self, renderbuffer: WebGLRenderbuffer);

    // ==================== Framebuffers ====================

    fn create_framebuffer(&mut self) -> Option<WebGLFramebuffer>;
    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<WebGLFramebuffer>);
    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        textarget: u32,
        texture: Option<WebGLTexture>,
        level: i32,
    );
    fn framebuffer_texture_layer(
        &mut self,
        target: u32,
        attachment: u32,
        texture: Option<WebGLTexture>,
        level: i32,
        layer: i32,
    );
    fn framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: Option<WebGLRenderbuffer>,
    );
    fn draw_buffers(&mut self, buffers: &[u32]);
    fn check_framebuffer_status(&self, target: u32) -> u32;
    fn delete_framebuffer(&mut self, framebuffer: WebGLFramebuffer);

    // ==================== Drawing ====================

    fn draw_elements(&mut self, mode: u32, count: i32, type_: u32, offset: i32);
    fn draw_elements_instanced(
        &mut self,
        mode: u32,
        count: i32,
        type_: u32,
        offset: i32,
        instance_count: i32,
    );
}
