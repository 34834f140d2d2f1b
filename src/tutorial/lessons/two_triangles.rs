use std::rc::Rc;

use crate::engine::graphics::{
    GeometryBinding, GraphicsBackend, GraphicsError, Renderer, ShaderProgram,
};
use crate::tutorial::config::AssetPaths;
use crate::tutorial::frame::FrameContext;

use super::meshes::{TRIANGLE_LEFT, TRIANGLE_RIGHT};
use super::{LessonKind, Scene};

/// Two triangles, each with its own program and vertex array.
pub struct TwoTriangles<B: GraphicsBackend> {
    orange: ShaderProgram<B>,
    yellow: ShaderProgram<B>,
    left: GeometryBinding<B>,
    right: GeometryBinding<B>,
}

impl<B: GraphicsBackend> TwoTriangles<B> {
    pub fn new(backend: &Rc<B>, assets: &AssetPaths) -> Result<Self, GraphicsError> {
        let vertex = assets.shader("triangle.vert");
        Ok(Self {
            orange: ShaderProgram::from_files(backend, &vertex, assets.shader("orange.frag"))?,
            yellow: ShaderProgram::from_files(backend, &vertex, assets.shader("yellow.frag"))?,
            left: GeometryBinding::upload(backend, &TRIANGLE_LEFT)?,
            right: GeometryBinding::upload(backend, &TRIANGLE_RIGHT)?,
        })
    }
}

impl<B: GraphicsBackend> Scene<B> for TwoTriangles<B> {
    fn kind(&self) -> LessonKind {
        LessonKind::TwoTriangles
    }

    fn render(&self, renderer: &Renderer<B>, _frame: &FrameContext<'_>) {
        renderer.draw(&self.orange, &self.left, &[]);
        renderer.draw(&self.yellow, &self.right, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::HeadlessBackend;
    use crate::tutorial::camera::Camera;
    use crate::tutorial::lessons::test_support::{frame_at, shipped_assets};

    #[test]
    fn test_frame_draws_each_triangle_with_its_program() {
        let backend = Rc::new(HeadlessBackend::new());
        let renderer = Renderer::new(Rc::clone(&backend), [0.2, 0.3, 0.3, 1.0], 800, 600);
        let scene = TwoTriangles::new(&backend, &shipped_assets()).unwrap();
        let camera = Camera::default();

        renderer.begin_frame(false);
        scene.render(&renderer, &frame_at(0.0, &camera));
        renderer.check_errors().unwrap();

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].program, scene.orange.handle());
        assert_eq!(draws[0].attributes[&0], TRIANGLE_LEFT);
        assert_eq!(draws[1].program, scene.yellow.handle());
        assert_eq!(draws[1].attributes[&0], TRIANGLE_RIGHT);
        assert_eq!(scene.orange.name(), "triangle.vert+orange.frag");
    }
}
