use std::rc::Rc;

use crate::engine::graphics::{
    GeometryBinding, GraphicsBackend, GraphicsError, Renderer, ShaderProgram, Texture2D,
    UniformValue, VertexLayout,
};
use crate::tutorial::config::AssetPaths;
use crate::tutorial::frame::FrameContext;

use super::meshes::QUAD;
use super::{load_texture_or_default, LessonKind, Scene};

pub struct Textured<B: GraphicsBackend> {
    program: ShaderProgram<B>,
    quad: GeometryBinding<B>,
    texture: Texture2D<B>,
}

impl<B: GraphicsBackend> Textured<B> {
    pub fn new(backend: &Rc<B>, assets: &AssetPaths) -> Result<Self, GraphicsError> {
        Ok(Self {
            program: ShaderProgram::from_files(
                backend,
                assets.shader("textured.vert"),
                assets.shader("textured.frag"),
            )?,
            quad: GeometryBinding::upload_with_layout(backend, &QUAD, VertexLayout::position_uv())?,
            texture: load_texture_or_default(backend, &assets.texture("container.png"))?,
        })
    }
}

impl<B: GraphicsBackend> Scene<B> for Textured<B> {
    fn kind(&self) -> LessonKind {
        LessonKind::Textured
    }

    fn render(&self, renderer: &Renderer<B>, _frame: &FrameContext<'_>) {
        self.texture.bind(0);
        renderer.draw(&self.program, &self.quad, &[("texture1", UniformValue::Int(0))]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::backend::PixelFormat;
    use crate::engine::graphics::HeadlessBackend;
    use crate::tutorial::camera::Camera;
    use crate::tutorial::lessons::test_support::{frame_at, shipped_assets};

    #[test]
    fn test_quad_samples_container_from_unit_zero() {
        let backend = Rc::new(HeadlessBackend::new());
        let renderer = Renderer::new(Rc::clone(&backend), [0.0; 4], 800, 600);
        let scene = Textured::new(&backend, &shipped_assets()).unwrap();
        let camera = Camera::default();

        assert_eq!(scene.texture.format(), PixelFormat::Rgb8);
        scene.render(&renderer, &frame_at(0.0, &camera));
        renderer.check_errors().unwrap();

        let draw = &backend.draw_calls()[0];
        assert_eq!(draw.count, 6);
        assert_eq!(draw.uniforms["texture1"], UniformValue::Int(0));
        assert_eq!(draw.textures.get(&0), Some(&scene.texture.handle()));
        assert_eq!(draw.vertices(1, 2)[0], vec![1.0, 1.0]);
    }
}
