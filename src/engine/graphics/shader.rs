//! Shader stages and linked programs.
//!
//! A [`ShaderProgram`] only exists once both stages compiled and the link
//! succeeded; every failure comes back as a [`GraphicsError`] carrying the
//! backend's diagnostic log. Objects are released when the wrapper drops.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::{debug, error, info, warn};

use super::backend::{GraphicsBackend, ShaderStage};
use super::error::GraphicsError;
use super::uniform::{UniformKind, UniformValue};

/// Reads a shader source file in full. An empty file is valid content.
pub fn read_source(path: &Path) -> Result<String, GraphicsError> {
    fs::read_to_string(path).map_err(|source| GraphicsError::ResourceLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// One compiled stage.
pub struct CompiledStage<B: GraphicsBackend> {
    backend: Rc<B>,
    stage: ShaderStage,
    handle: B::Shader,
}

impl<B: GraphicsBackend> CompiledStage<B> {
    pub fn compile(
        backend: &Rc<B>,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self, GraphicsError> {
        let handle = backend
            .create_shader(stage)
            .map_err(|reason| GraphicsError::ObjectCreation { what: "shader", reason })?;
        // Owned from here on so the handle is released on every exit path.
        let compiled = Self { backend: Rc::clone(backend), stage, handle };
        backend.shader_source(handle, source);
        backend.compile_shader(handle);
        if !backend.shader_compile_status(handle) {
            let log = backend.shader_info_log(handle);
            error!("[shader] {} stage failed to compile:\n{}", stage, log);
            return Err(GraphicsError::ShaderCompile { stage, log });
        }
        debug!("[shader] compiled {} stage {:?}", stage, handle);
        Ok(compiled)
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn handle(&self) -> B::Shader {
        self.handle
    }
}

impl<B: GraphicsBackend> Drop for CompiledStage<B> {
    fn drop(&mut self) {
        self.backend.delete_shader(self.handle);
    }
}

/// A linked vertex + fragment program.
pub struct ShaderProgram<B: GraphicsBackend> {
    backend: Rc<B>,
    handle: B::Program,
    name: String,
    warned: RefCell<HashSet<String>>,
}

impl<B: GraphicsBackend> ShaderProgram<B> {
    /// Compiles both stages and links them. Linking is only attempted when
    /// both stages compiled.
    pub fn compile(
        backend: &Rc<B>,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, GraphicsError> {
        let vertex = CompiledStage::compile(backend, ShaderStage::Vertex, vertex_source)?;
        let fragment = CompiledStage::compile(backend, ShaderStage::Fragment, fragment_source)?;
        Self::link(backend, name, &vertex, &fragment)
    }

    /// Loads both stage files and compiles them.
    pub fn from_files(
        backend: &Rc<B>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, GraphicsError> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let vertex_source = read_source(vertex_path)?;
        let fragment_source = read_source(fragment_path)?;
        let name = format!(
            "{}+{}",
            vertex_path.file_name().unwrap_or_default().to_string_lossy(),
            fragment_path.file_name().unwrap_or_default().to_string_lossy()
        );
        Self::compile(backend, &name, &vertex_source, &fragment_source)
    }

    /// Links two compiled stages. The stages stay owned by the caller and may
    /// be reused for other programs.
    pub fn link(
        backend: &Rc<B>,
        name: &str,
        vertex: &CompiledStage<B>,
        fragment: &CompiledStage<B>,
    ) -> Result<Self, GraphicsError> {
        if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
            return Err(GraphicsError::ProgramLink {
                log: format!(
                    "expected a vertex and a fragment stage, got {} and {}",
                    vertex.stage(),
                    fragment.stage()
                ),
            });
        }
        let handle = backend
            .create_program()
            .map_err(|reason| GraphicsError::ObjectCreation { what: "program", reason })?;
        let program = Self {
            backend: Rc::clone(backend),
            handle,
            name: name.to_string(),
            warned: RefCell::new(HashSet::new()),
        };
        backend.attach_shader(handle, vertex.handle());
        backend.attach_shader(handle, fragment.handle());
        backend.link_program(handle);
        let linked = backend.program_link_status(handle);
        backend.detach_shader(handle, vertex.handle());
        backend.detach_shader(handle, fragment.handle());
        if !linked {
            let log = backend.program_info_log(handle);
            error!("[shader] program '{}' failed to link:\n{}", name, log);
            return Err(GraphicsError::ProgramLink { log });
        }
        info!("[shader] linked program '{}'", name);
        Ok(program)
    }

    /// Makes this the active program for subsequent draw calls.
    pub fn use_program(&self) {
        self.backend.use_program(Some(self.handle));
    }

    /// Pushes `value` into the uniform `name` of this program, making it the
    /// program in use first. The location is looked up on every call. A name
    /// that does not resolve to an active uniform is skipped: the first miss
    /// per name is logged as a warning, later ones at debug level.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.backend.uniform_location(self.handle, name) {
            Some(location) => {
                self.use_program();
                self.backend.set_uniform(&location, &value);
            }
            None => self.report_missing(name),
        }
    }

    /// Reads the current value of `name` back from the backend.
    pub fn read_uniform(&self, name: &str, kind: UniformKind) -> Option<UniformValue> {
        let location = self.backend.uniform_location(self.handle, name)?;
        self.backend.read_uniform(self.handle, &location, kind)
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.backend.uniform_location(self.handle, name).is_some()
    }

    pub fn handle(&self) -> B::Program {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn report_missing(&self, name: &str) {
        if self.warned.borrow_mut().insert(name.to_string()) {
            warn!(
                "[shader] program '{}' has no active uniform '{}'; value ignored",
                self.name, name
            );
        } else {
            debug!("[shader] skipped unknown uniform '{}' on '{}'", name, self.name);
        }
    }
}

impl<B: GraphicsBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        debug!("[shader] releasing program '{}'", self.name);
        self.backend.delete_program(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::headless::HeadlessBackend;
    use approx::assert_relative_eq;
    use glam::{Mat4, Vec3, Vec4};

    const PASS_VS: &str = "#version 330 core\n\
        layout (location = 0) in vec3 aPos;\n\
        uniform mat4 transform;\n\
        uniform float scale;\n\
        void main()\n\
        {\n\
            gl_Position = transform * vec4(aPos * scale, 1.0);\n\
        }\n";

    const PASS_FS: &str = "#version 330 core\n\
        out vec4 FragColor;\n\
        uniform vec3 color;\n\
        uniform vec4 tint;\n\
        uniform int unit;\n\
        void main()\n\
        {\n\
            FragColor = vec4(color, 1.0) * tint;\n\
        }\n";

    fn backend() -> Rc<HeadlessBackend> {
        Rc::new(HeadlessBackend::new())
    }

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("learngl-shader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_valid_pair_links_and_uses_cleanly() {
        let backend = backend();
        let program = ShaderProgram::compile(&backend, "pass", PASS_VS, PASS_FS).unwrap();
        program.use_program();
        assert_eq!(backend.current_program(), Some(program.handle()));
        assert_eq!(backend.take_error(), None);
    }

    #[test]
    fn test_vertex_defect_is_stage_tagged() {
        let backend = backend();
        let broken = PASS_VS.replace("uniform float scale;", "uniform float scale");
        let err = ShaderProgram::compile(&backend, "broken", &broken, PASS_FS).err().unwrap();
        assert_eq!(err.failed_stage(), Some(ShaderStage::Vertex));
        match err {
            GraphicsError::ShaderCompile { log, .. } => assert!(log.contains("expecting `;`")),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(backend.live_objects().total(), 0);
    }

    #[test]
    fn test_fragment_defect_is_stage_tagged() {
        let backend = backend();
        let broken = PASS_FS.replace("void main()", "void main(");
        let err = ShaderProgram::compile(&backend, "broken", PASS_VS, &broken).err().unwrap();
        assert_eq!(err.failed_stage(), Some(ShaderStage::Fragment));
        assert_eq!(backend.live_objects().programs, 0);
    }

    #[test]
    fn test_link_failure_carries_log_and_releases_program() {
        let backend = backend();
        let needs_varying = PASS_FS.replace("uniform int unit;", "in vec3 normal;");
        let err = ShaderProgram::compile(&backend, "unlinked", PASS_VS, &needs_varying)
            .err()
            .unwrap();
        match err {
            GraphicsError::ProgramLink { log } => assert!(log.contains("normal")),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(backend.live_objects().total(), 0);
    }

    #[test]
    fn test_swapped_stages_are_rejected() {
        let backend = backend();
        let vs = CompiledStage::compile(&backend, ShaderStage::Vertex, PASS_VS).unwrap();
        let fs = CompiledStage::compile(&backend, ShaderStage::Fragment, PASS_FS).unwrap();
        let err = ShaderProgram::link(&backend, "swapped", &fs, &vs).err().unwrap();
        assert!(matches!(err, GraphicsError::ProgramLink { .. }));
    }

    #[test]
    fn test_stages_can_be_shared_between_programs() {
        let backend = backend();
        let vs = CompiledStage::compile(&backend, ShaderStage::Vertex, PASS_VS).unwrap();
        let fs = CompiledStage::compile(&backend, ShaderStage::Fragment, PASS_FS).unwrap();
        let a = ShaderProgram::link(&backend, "a", &vs, &fs).unwrap();
        let b = ShaderProgram::link(&backend, "b", &vs, &fs).unwrap();
        assert_ne!(a.handle(), b.handle());
        drop((vs, fs));
        b.use_program();
        assert_eq!(backend.take_error(), None);
    }

    #[test]
    fn test_uniform_values_read_back() {
        let backend = backend();
        let program = ShaderProgram::compile(&backend, "pass", PASS_VS, PASS_FS).unwrap();
        program.use_program();
        program.set_uniform("scale", 0.75f32);
        program.set_uniform("color", Vec3::new(1.0, 0.5, 0.2));
        program.set_uniform("tint", Vec4::new(0.1, 0.2, 0.3, 0.4));
        program.set_uniform("unit", 1);
        let m = Mat4::from_rotation_z(1.0) * Mat4::from_scale(Vec3::splat(0.5));
        program.set_uniform("transform", m);
        assert_eq!(backend.take_error(), None);

        match program.read_uniform("scale", UniformKind::Float) {
            Some(UniformValue::Float(x)) => assert_relative_eq!(x, 0.75),
            other => panic!("unexpected {other:?}"),
        }
        match program.read_uniform("color", UniformKind::Vec3) {
            Some(UniformValue::Vec3(v)) => {
                assert_relative_eq!(v.x, 1.0);
                assert_relative_eq!(v.y, 0.5);
                assert_relative_eq!(v.z, 0.2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            program.read_uniform("tint", UniformKind::Vec4),
            Some(UniformValue::Vec4(Vec4::new(0.1, 0.2, 0.3, 0.4)))
        );
        assert_eq!(program.read_uniform("unit", UniformKind::Int), Some(UniformValue::Int(1)));
        assert_eq!(
            program.read_uniform("transform", UniformKind::Mat4),
            Some(UniformValue::Mat4(m))
        );
    }

    #[test]
    fn test_set_uniform_writes_its_own_program() {
        let backend = backend();
        let a = ShaderProgram::compile(&backend, "a", PASS_VS, PASS_FS).unwrap();
        let b = ShaderProgram::compile(&backend, "b", PASS_VS, PASS_FS).unwrap();
        a.use_program();
        b.set_uniform("scale", 2.0f32);

        assert_eq!(backend.take_error(), None);
        assert_eq!(backend.current_program(), Some(b.handle()));
        assert_eq!(b.read_uniform("scale", UniformKind::Float), Some(UniformValue::Float(2.0)));
        assert_eq!(a.read_uniform("scale", UniformKind::Float), Some(UniformValue::Float(0.0)));
    }

    #[test]
    fn test_malformed_layout_is_a_compile_error() {
        let backend = backend();
        let broken = "#version 330 core\n\
            float f(\n\
            layout ) (location = 0) in vec3 a;\n\
            void main() {}\n";
        let err = ShaderProgram::compile(&backend, "broken", broken, PASS_FS).err().unwrap();
        assert_eq!(err.failed_stage(), Some(ShaderStage::Vertex));
        assert_eq!(backend.live_objects().total(), 0);
    }

    #[test]
    fn test_unknown_uniform_is_a_no_op() {
        let backend = backend();
        let program = ShaderProgram::compile(&backend, "pass", PASS_VS, PASS_FS).unwrap();
        program.use_program();
        program.set_uniform("doesNotExist", 1.0f32);
        program.set_uniform("doesNotExist", 2.0f32);
        assert_eq!(backend.take_error(), None);
        assert!(!program.has_uniform("doesNotExist"));
        assert_eq!(program.warned.borrow().len(), 1);
    }

    #[test]
    fn test_drop_releases_program() {
        let backend = backend();
        {
            let _program = ShaderProgram::compile(&backend, "pass", PASS_VS, PASS_FS).unwrap();
            assert_eq!(backend.live_objects().programs, 1);
            assert_eq!(backend.live_objects().shaders, 0);
        }
        assert_eq!(backend.live_objects().total(), 0);
    }

    #[test]
    fn test_missing_file_differs_from_empty_file() {
        let backend = backend();
        let fs_path = temp_file("pass.frag", PASS_FS);
        let missing = fs_path.with_file_name("does-not-exist.vert");
        let err = ShaderProgram::from_files(&backend, &missing, &fs_path).err().unwrap();
        assert!(matches!(err, GraphicsError::ResourceLoad { ref path, .. } if *path == missing));

        let empty = temp_file("empty.vert", "");
        let err = ShaderProgram::from_files(&backend, &empty, &fs_path).err().unwrap();
        assert_eq!(err.failed_stage(), Some(ShaderStage::Vertex));
    }

    #[test]
    fn test_from_files_names_program_after_files() {
        let backend = backend();
        let vs_path = temp_file("named.vert", PASS_VS);
        let fs_path = temp_file("named.frag", PASS_FS);
        let program = ShaderProgram::from_files(&backend, &vs_path, &fs_path).unwrap();
        assert_eq!(program.name(), "named.vert+named.frag");
    }
}
