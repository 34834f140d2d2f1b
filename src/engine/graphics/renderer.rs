use std::rc::Rc;

use log::{debug, error, trace};

use super::backend::{ClearMask, DrawMode, GraphicsBackend};
use super::error::GraphicsError;
use super::geometry::GeometryBinding;
use super::shader::ShaderProgram;
use super::uniform::UniformValue;

/// Frame-level driver over a backend: clear, draw, error check.
pub struct Renderer<B: GraphicsBackend> {
    backend: Rc<B>,
    clear_color: [f32; 4],
    size: (u32, u32),
}

impl<B: GraphicsBackend> Renderer<B> {
    pub fn new(backend: Rc<B>, clear_color: [f32; 4], width: u32, height: u32) -> Self {
        let mut renderer = Self { backend, clear_color, size: (0, 0) };
        renderer.resize(width, height);
        renderer
    }

    pub fn backend(&self) -> &Rc<B> {
        &self.backend
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
            self.backend.viewport(0, 0, width as i32, height as i32);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn aspect(&self) -> f32 {
        let (width, height) = self.size;
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    /// Clears color, and depth when `depth` is set. Depth testing follows the
    /// same flag.
    pub fn begin_frame(&self, depth: bool) {
        self.backend.set_depth_test(depth);
        self.backend.clear_color(self.clear_color);
        self.backend.clear(if depth { ClearMask::COLOR_DEPTH } else { ClearMask::COLOR });
    }

    /// Selects `program` and `geometry`, pushes `uniforms` and draws every
    /// vertex of the binding as triangles.
    pub fn draw(
        &self,
        program: &ShaderProgram<B>,
        geometry: &GeometryBinding<B>,
        uniforms: &[(&str, UniformValue)],
    ) {
        program.use_program();
        for (name, value) in uniforms {
            program.set_uniform(name, *value);
        }
        geometry.bind();
        trace!("[renderer] draw '{}' x{}", program.name(), geometry.vertex_count());
        self.backend.draw_arrays(DrawMode::Triangles, 0, geometry.vertex_count());
        geometry.unbind();
    }

    /// Drains the backend error flag.
    pub fn check_errors(&self) -> Result<(), GraphicsError> {
        match self.backend.take_error() {
            None => Ok(()),
            Some(code) => {
                error!("[renderer] backend reported error 0x{:04X}", code);
                // Later errors of the same frame are queued behind the first.
                let dropped = drain_errors(|| self.backend.take_error());
                if dropped > 0 {
                    debug!("[renderer] discarded {} further error(s)", dropped);
                }
                Err(GraphicsError::Backend { code })
            }
        }
    }
}

/// Upper bound on errors pulled per check; a lost context may report one
/// forever.
const MAX_DRAINED_ERRORS: usize = 16;

fn drain_errors(mut next: impl FnMut() -> Option<u32>) -> usize {
    (0..MAX_DRAINED_ERRORS).take_while(|_| next().is_some()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::backend::INVALID_OPERATION;
    use crate::engine::graphics::headless::HeadlessBackend;

    const VS: &str = "#version 330 core\n\
        layout (location = 0) in vec3 aPos;\n\
        void main()\n\
        {\n\
        gl_Position = vec4(aPos, 1.0);\n\
        }\n";
    const FS: &str = "#version 330 core\n\
        out vec4 FragColor;\n\
        uniform vec4 ourColor;\n\
        void main()\n\
        {\n\
        FragColor = ourColor;\n\
        }\n";

    #[test]
    fn test_frame_clears_and_draws() {
        let backend = Rc::new(HeadlessBackend::new());
        let renderer = Renderer::new(Rc::clone(&backend), [0.2, 0.3, 0.3, 1.0], 800, 600);
        let program = ShaderProgram::compile(&backend, "color", VS, FS).unwrap();
        let geometry = GeometryBinding::upload(&backend, &[0.0; 9]).unwrap();

        renderer.begin_frame(false);
        let color = UniformValue::Vec4(glam::Vec4::new(0.0, 1.0, 0.0, 1.0));
        renderer.draw(&program, &geometry, &[("ourColor", color)]);
        renderer.check_errors().unwrap();

        assert_eq!(backend.viewport_rect(), [0, 0, 800, 600]);
        assert_eq!(backend.last_clear(), Some((ClearMask::COLOR, [0.2, 0.3, 0.3, 1.0])));
        let draws = backend.draw_calls();
        assert_eq!(draws[0].uniforms["ourColor"], color);
        assert_eq!(backend.bound_vertex_array(), None);
    }

    #[test]
    fn test_error_flag_becomes_typed_error() {
        let backend = Rc::new(HeadlessBackend::new());
        let renderer = Renderer::new(Rc::clone(&backend), [0.0; 4], 1, 1);
        backend.draw_arrays(DrawMode::Triangles, 0, 3);
        assert!(matches!(
            renderer.check_errors(),
            Err(GraphicsError::Backend { code: INVALID_OPERATION })
        ));
        assert!(renderer.check_errors().is_ok());
    }

    #[test]
    fn test_zero_size_resize_is_ignored() {
        let backend = Rc::new(HeadlessBackend::new());
        let mut renderer = Renderer::new(Rc::clone(&backend), [0.0; 4], 640, 480);
        renderer.resize(0, 0);
        assert_eq!(renderer.size(), (640, 480));
        assert!((renderer.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_error_drain_is_bounded() {
        let mut calls = 0;
        let drained = drain_errors(|| {
            calls += 1;
            Some(0x0507)
        });
        assert_eq!(drained, MAX_DRAINED_ERRORS);
        assert_eq!(calls, MAX_DRAINED_ERRORS);

        let mut queued = vec![INVALID_OPERATION, INVALID_OPERATION];
        assert_eq!(drain_errors(|| queued.pop()), 2);
    }
}
