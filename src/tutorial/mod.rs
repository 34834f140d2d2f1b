//! The LearnOpenGL progression as selectable lessons, plus the application
//! shell that drives them.

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod lessons;

// Re-export commonly used types
pub use app::App;
pub use camera::Camera;
pub use config::{AppConfig, AssetPaths};
pub use error::AppError;
pub use frame::{FrameClock, FrameContext, FrameTime};
pub use lessons::{LessonKind, Scene};
