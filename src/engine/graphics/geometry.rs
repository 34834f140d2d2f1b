//! Vertex array + vertex buffer wrapper.

use std::mem::size_of;
use std::rc::Rc;

use log::debug;

use super::backend::GraphicsBackend;
use super::error::GraphicsError;

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub index: u32,
    pub components: u32,
    /// Offset from the start of the vertex, in floats.
    pub offset: u32,
}

/// How a flat `f32` buffer splits into vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Floats per vertex.
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Three tightly packed floats in slot 0.
    pub fn position() -> Self {
        Self {
            stride: 3,
            attributes: vec![VertexAttribute { index: 0, components: 3, offset: 0 }],
        }
    }

    /// Position in slot 0 followed by a texture coordinate in slot 1.
    pub fn position_uv() -> Self {
        Self {
            stride: 5,
            attributes: vec![
                VertexAttribute { index: 0, components: 3, offset: 0 },
                VertexAttribute { index: 1, components: 2, offset: 3 },
            ],
        }
    }

    pub fn stride_bytes(&self) -> i32 {
        (self.stride as usize * size_of::<f32>()) as i32
    }
}

/// A static mesh uploaded once. Callers that need indexed drawing go around
/// this type.
pub struct GeometryBinding<B: GraphicsBackend> {
    backend: Rc<B>,
    vertex_array: B::VertexArray,
    buffer: B::Buffer,
    vertex_count: i32,
    layout: VertexLayout,
}

impl<B: GraphicsBackend> GeometryBinding<B> {
    /// Uploads positions (x, y, z per vertex) with the fixed slot-0 layout.
    pub fn upload(backend: &Rc<B>, vertices: &[f32]) -> Result<Self, GraphicsError> {
        Self::upload_with_layout(backend, vertices, VertexLayout::position())
    }

    pub fn upload_with_layout(
        backend: &Rc<B>,
        vertices: &[f32],
        layout: VertexLayout,
    ) -> Result<Self, GraphicsError> {
        let stride = layout.stride as usize;
        if stride == 0 || vertices.len() % stride != 0 {
            return Err(GraphicsError::InvalidVertexData { len: vertices.len(), stride });
        }

        let vertex_array = backend
            .create_vertex_array()
            .map_err(|reason| GraphicsError::ObjectCreation { what: "vertex array", reason })?;
        let buffer = match backend.create_buffer() {
            Ok(buffer) => buffer,
            Err(reason) => {
                backend.delete_vertex_array(vertex_array);
                return Err(GraphicsError::ObjectCreation { what: "vertex buffer", reason });
            }
        };

        backend.bind_vertex_array(Some(vertex_array));
        backend.bind_array_buffer(Some(buffer));
        backend.array_buffer_data(bytemuck::cast_slice(vertices));
        for attribute in &layout.attributes {
            backend.vertex_attrib_pointer_f32(
                attribute.index,
                attribute.components as i32,
                layout.stride_bytes(),
                (attribute.offset as usize * size_of::<f32>()) as i32,
            );
            backend.enable_vertex_attrib_array(attribute.index);
        }
        // Leave no array bound so later attribute calls cannot land in it.
        backend.bind_vertex_array(None);
        backend.bind_array_buffer(None);

        let vertex_count = (vertices.len() / stride) as i32;
        debug!(
            "[geometry] uploaded {} vertices ({} bytes) into {:?}",
            vertex_count,
            size_of::<f32>() * vertices.len(),
            vertex_array
        );
        Ok(Self { backend: Rc::clone(backend), vertex_array, buffer, vertex_count, layout })
    }

    pub fn bind(&self) {
        self.backend.bind_vertex_array(Some(self.vertex_array));
    }

    pub fn unbind(&self) {
        self.backend.bind_vertex_array(None);
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_array(&self) -> B::VertexArray {
        self.vertex_array
    }

    pub fn buffer(&self) -> B::Buffer {
        self.buffer
    }
}

impl<B: GraphicsBackend> Drop for GeometryBinding<B> {
    fn drop(&mut self) {
        self.backend.delete_vertex_array(self.vertex_array);
        self.backend.delete_buffer(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::backend::DrawMode;
    use crate::engine::graphics::headless::{AttributeState, HeadlessBackend};
    use crate::engine::graphics::shader::ShaderProgram;

    const VS: &str = "#version 330 core\n\
        layout (location = 0) in vec3 aPos;\n\
        void main()\n\
        {\n\
        gl_Position = vec4(aPos, 1.0);\n\
        }\n";
    const FS: &str = "#version 330 core\n\
        out vec4 FragColor;\n\
        void main()\n\
        {\n\
        FragColor = vec4(1.0, 0.5, 0.2, 1.0);\n\
        }\n";

    #[rustfmt::skip]
    const TRIANGLE: [f32; 9] = [
        -1.0, -0.0, 0.0,
         0.0, -0.0, 0.0,
        -0.5,  1.0, 0.0,
    ];

    #[test]
    fn test_upload_declares_fixed_layout_and_unbinds() {
        let backend = Rc::new(HeadlessBackend::new());
        let geometry = GeometryBinding::upload(&backend, &TRIANGLE).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(backend.bound_vertex_array(), None);
        assert_eq!(
            backend.vertex_array_attributes(geometry.vertex_array()).unwrap(),
            vec![AttributeState {
                index: 0,
                components: 3,
                stride: 12,
                offset: 0,
                buffer: geometry.buffer(),
                enabled: true,
            }]
        );
        let bytes = backend.buffer_contents(geometry.buffer()).unwrap();
        let floats: Vec<f32> =
            bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned::<f32>).collect();
        assert_eq!(floats, TRIANGLE);
    }

    #[test]
    fn test_draw_streams_vertices_in_order() {
        let backend = Rc::new(HeadlessBackend::new());
        let program = ShaderProgram::compile(&backend, "orange", VS, FS).unwrap();
        let vertices: Vec<f32> = (0..30).map(|i| i as f32 * 0.25).collect();
        let geometry = GeometryBinding::upload(&backend, &vertices).unwrap();

        program.use_program();
        geometry.bind();
        backend.draw_arrays(DrawMode::Triangles, 0, geometry.vertex_count());
        geometry.unbind();

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 10);
        assert_eq!(draws[0].attributes[&0], vertices);
        assert_eq!(backend.take_error(), None);
    }

    #[test]
    fn test_bindings_are_independent() {
        let backend = Rc::new(HeadlessBackend::new());
        let first = GeometryBinding::upload(&backend, &TRIANGLE).unwrap();
        let before = backend.vertex_array_attributes(first.vertex_array()).unwrap();

        first.bind();
        first.unbind();
        let second = GeometryBinding::upload_with_layout(
            &backend,
            &[0.0; 15],
            VertexLayout::position_uv(),
        )
        .unwrap();
        second.bind();

        assert_eq!(backend.vertex_array_attributes(first.vertex_array()).unwrap(), before);
        assert_eq!(backend.vertex_array_attributes(second.vertex_array()).unwrap().len(), 2);
        assert_eq!(first.layout(), &VertexLayout::position());
    }

    #[test]
    fn test_textured_layout_offsets() {
        let backend = Rc::new(HeadlessBackend::new());
        let geometry =
            GeometryBinding::upload_with_layout(&backend, &[0.0; 10], VertexLayout::position_uv())
                .unwrap();
        let attributes = backend.vertex_array_attributes(geometry.vertex_array()).unwrap();
        assert_eq!(geometry.vertex_count(), 2);
        let uv = &attributes[1];
        assert_eq!((uv.components, uv.stride, uv.offset), (2, 20, 12));
    }

    #[test]
    fn test_ragged_vertex_data_is_rejected() {
        let backend = Rc::new(HeadlessBackend::new());
        let err = GeometryBinding::upload(&backend, &[0.0; 7]).err().unwrap();
        assert!(matches!(err, GraphicsError::InvalidVertexData { len: 7, stride: 3 }));
        assert_eq!(backend.live_objects().total(), 0);
    }

    #[test]
    fn test_drop_releases_objects() {
        let backend = Rc::new(HeadlessBackend::new());
        let geometry = GeometryBinding::upload(&backend, &TRIANGLE).unwrap();
        assert_eq!(backend.live_objects().vertex_arrays, 1);
        drop(geometry);
        assert_eq!(backend.live_objects().total(), 0);
    }
}
