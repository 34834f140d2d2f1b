use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::engine::graphics::{
    GeometryBinding, GraphicsBackend, GraphicsError, Renderer, ShaderProgram, Texture2D,
    UniformValue, VertexLayout,
};
use crate::tutorial::config::AssetPaths;
use crate::tutorial::frame::FrameContext;

use super::meshes::{CUBE, CUBE_POSITIONS};
use super::{load_texture_or_default, LessonKind, Scene};

/// Ten textured cubes seen through the fly camera.
pub struct Cubes<B: GraphicsBackend> {
    program: ShaderProgram<B>,
    cube: GeometryBinding<B>,
    texture: Texture2D<B>,
}

/// Model matrix of cube `index`: placed at its slot, tilted 20 degrees more
/// than the previous one.
pub fn cube_model(index: usize) -> Mat4 {
    let axis = Vec3::new(1.0, 0.3, 0.5).normalize();
    let angle = (20.0 * index as f32).to_radians();
    Mat4::from_translation(CUBE_POSITIONS[index]) * Mat4::from_axis_angle(axis, angle)
}

impl<B: GraphicsBackend> Cubes<B> {
    pub fn new(backend: &Rc<B>, assets: &AssetPaths) -> Result<Self, GraphicsError> {
        Ok(Self {
            program: ShaderProgram::from_files(
                backend,
                assets.shader("cube.vert"),
                assets.shader("textured.frag"),
            )?,
            cube: GeometryBinding::upload_with_layout(backend, &CUBE, VertexLayout::position_uv())?,
            texture: load_texture_or_default(backend, &assets.texture("container.png"))?,
        })
    }
}

impl<B: GraphicsBackend> Scene<B> for Cubes<B> {
    fn kind(&self) -> LessonKind {
        LessonKind::Cubes
    }

    fn uses_depth(&self) -> bool {
        true
    }

    fn uses_camera(&self) -> bool {
        true
    }

    fn render(&self, renderer: &Renderer<B>, frame: &FrameContext<'_>) {
        let view = UniformValue::from(frame.camera.view_matrix());
        let projection = UniformValue::from(frame.camera.projection(frame.aspect));
        self.texture.bind(0);
        for index in 0..CUBE_POSITIONS.len() {
            renderer.draw(
                &self.program,
                &self.cube,
                &[
                    ("texture1", UniformValue::Int(0)),
                    ("model", cube_model(index).into()),
                    ("view", view),
                    ("projection", projection),
                ],
            );
        }
    }
}
