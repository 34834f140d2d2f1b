use thiserror::Error;

use crate::engine::graphics::GraphicsError;
use crate::engine::window::WindowError;

use super::lessons::LessonKind;

/// Failures that end the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("failed to build lesson {lesson}: {source}")]
    Lesson {
        lesson: LessonKind,
        #[source]
        source: GraphicsError,
    },
}
