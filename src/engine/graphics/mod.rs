pub mod backend;
pub mod error;
pub mod geometry;
pub mod gl;
pub mod headless;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod uniform;

pub use backend::{GraphicsBackend, ShaderStage};
pub use error::GraphicsError;
pub use geometry::{GeometryBinding, VertexLayout};
pub use gl::GlBackend;
pub use headless::HeadlessBackend;
pub use renderer::Renderer;
pub use shader::{CompiledStage, ShaderProgram};
pub use texture::{DecodedImage, Texture2D};
pub use uniform::{UniformKind, UniformValue};
