//! `GraphicsBackend` over a live OpenGL context through glow.

use glow::HasContext;

use super::backend::{
    ClearMask, DrawMode, GraphicsBackend, PixelFormat, ShaderStage, TextureFilter, TextureWrap,
};
use super::uniform::{UniformKind, UniformValue};

pub struct GlBackend {
    gl: glow::Context,
}

impl GlBackend {
    /// # Safety
    ///
    /// The context `gl` was loaded from must be current on this thread for as
    /// long as the backend, and every resource created from it, is alive.
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn version_string(&self) -> String {
        // SAFETY: see `GlBackend::new`.
        unsafe { self.gl.get_parameter_string(glow::VERSION) }
    }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn mode_enum(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Triangles => glow::TRIANGLES,
    }
}

// SAFETY for every block below: `GlBackend::new` requires the context to be
// current on this thread for the lifetime of `self`.
impl GraphicsBackend for GlBackend {
    type Shader = glow::NativeShader;
    type Program = glow::NativeProgram;
    type VertexArray = glow::NativeVertexArray;
    type Buffer = glow::NativeBuffer;
    type Texture = glow::NativeTexture;
    type UniformLocation = glow::NativeUniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage_enum(stage)) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: &UniformValue) {
        let location = Some(location);
        unsafe {
            match *value {
                UniformValue::Float(x) => self.gl.uniform_1_f32(location, x),
                UniformValue::Int(x) => self.gl.uniform_1_i32(location, x),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
            }
        }
    }

    fn read_uniform(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        kind: UniformKind,
    ) -> Option<UniformValue> {
        if kind == UniformKind::Int {
            let mut out = [0i32; 1];
            unsafe { self.gl.get_uniform_i32(program, location, &mut out) };
            return Some(UniformValue::Int(out[0]));
        }
        let mut out = [0f32; 16];
        let n = kind.components();
        unsafe { self.gl.get_uniform_f32(program, location, &mut out[..n]) };
        kind.from_f32s(&out[..n])
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer) }
    }

    fn array_buffer_data(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { self.gl.create_texture() }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture_2d(&self, texture: Option<Self::Texture>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) }
    }

    fn tex_image_2d(&self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        let (internal, external) = match format {
            PixelFormat::Rgb8 => (glow::RGB8, glow::RGB),
            PixelFormat::Rgba8 => (glow::RGBA8, glow::RGBA),
        };
        unsafe {
            // RGB rows are not 4-byte aligned for most widths.
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal as i32,
                width as i32,
                height as i32,
                0,
                external,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        }
    }

    fn tex_parameters_2d(&self, wrap: TextureWrap, filter: TextureFilter) {
        let wrap = match wrap {
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        } as i32;
        let (min, mag) = match filter {
            TextureFilter::Nearest => (glow::NEAREST_MIPMAP_NEAREST, glow::NEAREST),
            TextureFilter::Linear => (glow::LINEAR_MIPMAP_LINEAR, glow::LINEAR),
        };
        unsafe {
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, mag as i32);
        }
    }

    fn generate_mipmap_2d(&self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        unsafe { self.gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]) }
    }

    fn clear(&self, mask: ClearMask) {
        let mut bits = 0;
        if mask.color {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.depth {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(bits) }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode_enum(mode), first, count) }
    }

    fn take_error(&self) -> Option<u32> {
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => None,
            code => Some(code),
        }
    }
}
