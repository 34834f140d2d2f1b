use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::engine::graphics::{
    GeometryBinding, GraphicsBackend, GraphicsError, Renderer, ShaderProgram, Texture2D,
    UniformValue, VertexLayout,
};
use crate::tutorial::config::AssetPaths;
use crate::tutorial::frame::FrameContext;

use super::meshes::QUAD;
use super::{load_texture_or_default, LessonKind, Scene};

/// The textured quad, moved to the bottom-right corner and spun about Z.
pub struct Transformed<B: GraphicsBackend> {
    program: ShaderProgram<B>,
    quad: GeometryBinding<B>,
    texture: Texture2D<B>,
}

pub fn spin_transform(elapsed: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.5, -0.5, 0.0)) * Mat4::from_rotation_z(elapsed)
}

impl<B: GraphicsBackend> Transformed<B> {
    pub fn new(backend: &Rc<B>, assets: &AssetPaths) -> Result<Self, GraphicsError> {
        Ok(Self {
            program: ShaderProgram::from_files(
                backend,
                assets.shader("transform.vert"),
                assets.shader("textured.frag"),
            )?,
            quad: GeometryBinding::upload_with_layout(backend, &QUAD, VertexLayout::position_uv())?,
            texture: load_texture_or_default(backend, &assets.texture("container.png"))?,
        })
    }
}

impl<B: GraphicsBackend> Scene<B> for Transformed<B> {
    fn kind(&self) -> LessonKind {
        LessonKind::Transformed
    }

    fn render(&self, renderer: &Renderer<B>, frame: &FrameContext<'_>) {
        self.texture.bind(0);
        renderer.draw(
            &self.program,
            &self.quad,
            &[
                ("texture1", UniformValue::Int(0)),
                ("transform", spin_transform(frame.elapsed()).into()),
            ],
        );
    }
}
