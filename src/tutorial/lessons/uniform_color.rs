use std::rc::Rc;

use glam::Vec4;

use crate::engine::graphics::{
    GeometryBinding, GraphicsBackend, GraphicsError, Renderer, ShaderProgram, UniformValue,
};
use crate::tutorial::config::AssetPaths;
use crate::tutorial::frame::FrameContext;

use super::meshes::TRIANGLE_LEFT;
use super::{LessonKind, Scene};

/// A triangle whose green channel pulses with time.
pub struct UniformColor<B: GraphicsBackend> {
    program: ShaderProgram<B>,
    triangle: GeometryBinding<B>,
}

/// Color at `elapsed` seconds: green follows `sin(t) / 2 + 0.5`.
pub fn pulse_color(elapsed: f32) -> Vec4 {
    Vec4::new(0.0, elapsed.sin() / 2.0 + 0.5, 0.0, 1.0)
}

impl<B: GraphicsBackend> UniformColor<B> {
    pub fn new(backend: &Rc<B>, assets: &AssetPaths) -> Result<Self, GraphicsError> {
        Ok(Self {
            program: ShaderProgram::from_files(
                backend,
                assets.shader("triangle.vert"),
                assets.shader("uniform_color.frag"),
            )?,
            triangle: GeometryBinding::upload(backend, &TRIANGLE_LEFT)?,
        })
    }
}

impl<B: GraphicsBackend> Scene<B> for UniformColor<B> {
    fn kind(&self) -> LessonKind {
        LessonKind::UniformColor
    }

    fn render(&self, renderer: &Renderer<B>, frame: &FrameContext<'_>) {
        let color = UniformValue::from(pulse_color(frame.elapsed()));
        renderer.draw(&self.program, &self.triangle, &[("ourColor", color)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::{HeadlessBackend, UniformKind};
    use crate::tutorial::camera::Camera;
    use crate::tutorial::lessons::test_support::{frame_at, shipped_assets};
    use approx::assert_relative_eq;

    #[test]
    fn test_pulse_stays_in_unit_range() {
        assert_relative_eq!(pulse_color(0.0).y, 0.5);
        assert_relative_eq!(pulse_color(std::f32::consts::FRAC_PI_2).y, 1.0);
        assert_relative_eq!(pulse_color(-std::f32::consts::FRAC_PI_2).y, 0.0);
    }

    #[test]
    fn test_render_pushes_our_color() {
        let backend = Rc::new(HeadlessBackend::new());
        let renderer = Renderer::new(Rc::clone(&backend), [0.0; 4], 800, 600);
        let scene = UniformColor::new(&backend, &shipped_assets()).unwrap();
        let camera = Camera::default();

        scene.render(&renderer, &frame_at(std::f32::consts::FRAC_PI_2, &camera));

        let stored = scene.program.read_uniform("ourColor", UniformKind::Vec4);
        let Some(UniformValue::Vec4(color)) = stored else {
            panic!("ourColor not readable");
        };
        assert_relative_eq!(color.y, 1.0, epsilon = 1e-6);
        assert_eq!(backend.draw_calls()[0].count, 3);
    }
}
