//! The tutorial progression, one `Scene` per step.

pub mod cubes;
pub mod meshes;
pub mod textured;
pub mod transformed;
pub mod two_triangles;
pub mod uniform_color;

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use log::warn;

use crate::engine::graphics::{GraphicsBackend, GraphicsError, Renderer, Texture2D};

use super::config::AssetPaths;
use super::frame::FrameContext;

pub use cubes::Cubes;
pub use textured::Textured;
pub use transformed::Transformed;
pub use two_triangles::TwoTriangles;
pub use uniform_color::UniformColor;

/// A lesson that owns its GPU resources and draws one frame at a time.
pub trait Scene<B: GraphicsBackend> {
    fn kind(&self) -> LessonKind;

    /// Whether the frame needs a depth buffer clear and depth testing.
    fn uses_depth(&self) -> bool {
        false
    }

    /// Whether keyboard and mouse steer the camera.
    fn uses_camera(&self) -> bool {
        false
    }

    fn render(&self, renderer: &Renderer<B>, frame: &FrameContext<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonKind {
    TwoTriangles,
    UniformColor,
    Textured,
    Transformed,
    Cubes,
}

impl LessonKind {
    pub const ALL: [LessonKind; 5] = [
        LessonKind::TwoTriangles,
        LessonKind::UniformColor,
        LessonKind::Textured,
        LessonKind::Transformed,
        LessonKind::Cubes,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            LessonKind::TwoTriangles => "Hello Triangle",
            LessonKind::UniformColor => "Uniform Color",
            LessonKind::Textured => "Textures",
            LessonKind::Transformed => "Transformations",
            LessonKind::Cubes => "Camera",
        }
    }

    /// Creates the lesson's programs, geometry and textures.
    pub fn build<B: GraphicsBackend + 'static>(
        self,
        backend: &Rc<B>,
        assets: &AssetPaths,
    ) -> Result<Box<dyn Scene<B>>, GraphicsError> {
        Ok(match self {
            LessonKind::TwoTriangles => Box::new(TwoTriangles::new(backend, assets)?),
            LessonKind::UniformColor => Box::new(UniformColor::new(backend, assets)?),
            LessonKind::Textured => Box::new(Textured::new(backend, assets)?),
            LessonKind::Transformed => Box::new(Transformed::new(backend, assets)?),
            LessonKind::Cubes => Box::new(Cubes::new(backend, assets)?),
        })
    }
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.index() + 1, self.title())
    }
}

/// Loads a lesson texture, substituting a checkerboard when the file is
/// missing or unreadable.
pub(crate) fn load_texture_or_default<B: GraphicsBackend>(
    backend: &Rc<B>,
    path: &Path,
) -> Result<Texture2D<B>, GraphicsError> {
    match Texture2D::load(backend, path) {
        Ok(texture) => Ok(texture),
        Err(e @ (GraphicsError::ResourceLoad { .. } | GraphicsError::ImageDecode { .. })) => {
            warn!("Failed to load texture: {}, using default", e);
            Texture2D::checkerboard(backend)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::tutorial::camera::Camera;
    use crate::tutorial::frame::FrameTime;

    pub fn shipped_assets() -> AssetPaths {
        AssetPaths::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
    }

    pub fn frame_at(elapsed: f32, camera: &Camera) -> FrameContext<'_> {
        let time = FrameTime { delta: 1.0 / 60.0, elapsed, frame_index: 0 };
        FrameContext::new(time, 800.0 / 600.0, camera)
    }
}
