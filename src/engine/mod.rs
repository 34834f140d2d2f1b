//! Engine module containing graphics, input, window management and logging.

pub mod graphics;
pub mod input;
pub mod logging;
pub mod window;

// Re-export commonly used types
pub use graphics::{
    GeometryBinding, GraphicsBackend, GraphicsError, Renderer, ShaderProgram, Texture2D,
};
