//! The graphics-API surface the wrappers are written against.
//!
//! Method names follow the GL calls they stand for. Every method assumes the
//! backend's context is current on the calling thread; resources built on a
//! backend share it through `Rc` and are never sent across threads.

use std::fmt;

use super::uniform::{UniformKind, UniformValue};

/// GL_INVALID_ENUM
pub const INVALID_ENUM: u32 = 0x0500;
/// GL_INVALID_VALUE
pub const INVALID_VALUE: u32 = 0x0501;
/// GL_INVALID_OPERATION
pub const INVALID_OPERATION: u32 = 0x0502;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: ClearMask = ClearMask { color: true, depth: false };
    pub const COLOR_DEPTH: ClearMask = ClearMask { color: true, depth: true };
}

/// Layout of the pixel bytes handed to `tex_image_2d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

pub trait GraphicsBackend {
    type Shader: Copy + PartialEq + fmt::Debug;
    type Program: Copy + PartialEq + fmt::Debug;
    type VertexArray: Copy + PartialEq + fmt::Debug;
    type Buffer: Copy + PartialEq + fmt::Debug;
    type Texture: Copy + PartialEq + fmt::Debug;
    type UniformLocation: Clone;

    // Shader stages
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    // Programs
    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    // Uniforms
    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    /// Writes to the uniform slot of the program currently in use.
    fn set_uniform(&self, location: &Self::UniformLocation, value: &UniformValue);
    fn read_uniform(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        kind: UniformKind,
    ) -> Option<UniformValue>;

    // Vertex arrays and buffers
    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>);
    /// Static-draw upload into the bound array buffer.
    fn array_buffer_data(&self, data: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);
    /// Float attribute, never normalized. Stride and offset are in bytes.
    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib_array(&self, index: u32);

    // Textures
    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture_2d(&self, texture: Option<Self::Texture>);
    fn tex_image_2d(&self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]);
    fn tex_parameters_2d(&self, wrap: TextureWrap, filter: TextureFilter);
    fn generate_mipmap_2d(&self);
    fn delete_texture(&self, texture: Self::Texture);

    // Frame state
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, rgba: [f32; 4]);
    fn clear(&self, mask: ClearMask);
    fn set_depth_test(&self, enabled: bool);
    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32);

    /// Returns and clears the backend error flag.
    fn take_error(&self) -> Option<u32>;
}
