//! In-process emulation of the GL state machine.
//!
//! `HeadlessBackend` keeps object tables, reflects shader interfaces with the
//! minimal front end in [`glsl`], stores uniform values so they can be read
//! back, and records every draw call together with the vertices it streamed
//! out of the bound buffers. Misuse sets the error flag with the same codes a
//! driver would use instead of panicking.

pub mod glsl;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::trace;

use super::backend::{
    ClearMask, DrawMode, GraphicsBackend, PixelFormat, ShaderStage, TextureFilter, TextureWrap,
    INVALID_ENUM, INVALID_OPERATION, INVALID_VALUE,
};
use super::uniform::{UniformKind, UniformValue};
use glsl::{ProgramInterface, StageInterface};

const MAX_TEXTURE_UNITS: u32 = 32;

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: Option<StageInterface>,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: Option<ProgramInterface>,
    log: String,
    values: Vec<Option<UniformValue>>,
}

#[derive(Default)]
struct VertexArrayObject {
    pointers: BTreeMap<u32, AttributePointer>,
    enabled: BTreeSet<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AttributePointer {
    components: i32,
    stride: i32,
    offset: i32,
    buffer: u32,
}

/// Attribute slot state of a vertex array, as a driver would report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeState {
    pub index: u32,
    pub components: i32,
    pub stride: i32,
    pub offset: i32,
    pub buffer: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
    pub wrap: Option<TextureWrap>,
    pub filter: Option<TextureFilter>,
    pub mipmapped: bool,
}

/// One recorded `draw_arrays`, with the per-attribute floats it consumed and
/// snapshots of the program's uniforms and the bound texture units.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: u32,
    pub vertex_array: u32,
    pub mode: DrawMode,
    pub first: i32,
    pub count: i32,
    pub attributes: BTreeMap<u32, Vec<f32>>,
    pub uniforms: BTreeMap<String, UniformValue>,
    pub textures: BTreeMap<u32, u32>,
}

impl DrawCall {
    /// Vertices streamed from attribute slot `index`, one entry per vertex.
    pub fn vertices(&self, index: u32, components: usize) -> Vec<Vec<f32>> {
        self.attributes
            .get(&index)
            .map(|floats| floats.chunks(components).map(<[f32]>::to_vec).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectCounts {
    pub shaders: usize,
    pub programs: usize,
    pub vertex_arrays: usize,
    pub buffers: usize,
    pub textures: usize,
}

impl ObjectCounts {
    pub fn total(&self) -> usize {
        self.shaders + self.programs + self.vertex_arrays + self.buffers + self.textures
    }
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    vertex_arrays: HashMap<u32, VertexArrayObject>,
    buffers: HashMap<u32, Vec<u8>>,
    textures: HashMap<u32, Option<TextureInfo>>,
    texture_params: HashMap<u32, (TextureWrap, TextureFilter)>,

    current_program: Option<u32>,
    bound_vertex_array: Option<u32>,
    bound_array_buffer: Option<u32>,
    active_unit: u32,
    texture_units: BTreeMap<u32, u32>,

    viewport: [i32; 4],
    clear_color: [f32; 4],
    clear_count: usize,
    last_clear: Option<ClearMask>,
    depth_test: bool,

    error: Option<u32>,
    draws: Vec<DrawCall>,
}

impl State {
    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// GL keeps only the first error until it is queried.
    fn flag(&mut self, code: u32) {
        trace!("[headless] error flag 0x{:04X}", code);
        self.error.get_or_insert(code);
    }

    fn bound_texture(&self) -> Option<u32> {
        self.texture_units.get(&self.active_unit).copied()
    }

    fn link(&self, program: &ProgramObject) -> Result<ProgramInterface, String> {
        let mut vertex = None;
        let mut fragment = None;
        for id in &program.attached {
            let Some(shader) = self.shaders.get(id) else {
                return Err(format!("error: attached shader {id} was deleted"));
            };
            let Some(iface) = &shader.compiled else {
                return Err(format!("error: {} shader {id} is not compiled", shader.stage));
            };
            let slot = match shader.stage {
                ShaderStage::Vertex => &mut vertex,
                ShaderStage::Fragment => &mut fragment,
            };
            if slot.replace(iface).is_some() {
                return Err(format!("error: more than one {} shader attached", shader.stage));
            }
        }
        match (vertex, fragment) {
            (Some(v), Some(f)) => glsl::link(v, f),
            (None, _) => Err("error: no vertex shader attached".to_string()),
            (_, None) => Err("error: no fragment shader attached".to_string()),
        }
    }

    fn stream_vertices(
        &self,
        vao: &VertexArrayObject,
        first: i32,
        count: i32,
    ) -> Option<BTreeMap<u32, Vec<f32>>> {
        let mut out = BTreeMap::new();
        for index in &vao.enabled {
            let pointer = vao.pointers.get(index)?;
            let data = self.buffers.get(&pointer.buffer)?;
            let size = pointer.components as usize * 4;
            let stride = if pointer.stride == 0 { size } else { pointer.stride as usize };
            let end = first.checked_add(count)?;
            if end > 0 {
                let last = pointer.offset as usize + (end as usize - 1) * stride;
                data.get(last..last + size)?;
            }
            let mut floats = Vec::with_capacity(count as usize * pointer.components as usize);
            for vertex in first..end {
                let start = pointer.offset as usize + vertex as usize * stride;
                let bytes = data.get(start..start + size)?;
                floats.extend(bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned::<f32>));
            }
            out.insert(*index, floats);
        }
        Some(out)
    }
}

/// Software stand-in for a GL 3.3 core context.
#[derive(Default)]
pub struct HeadlessBackend {
    state: RefCell<State>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn take_draw_calls(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.state.borrow_mut().draws)
    }

    pub fn current_program(&self) -> Option<u32> {
        self.state.borrow().current_program
    }

    pub fn bound_vertex_array(&self) -> Option<u32> {
        self.state.borrow().bound_vertex_array
    }

    pub fn bound_texture(&self, unit: u32) -> Option<u32> {
        self.state.borrow().texture_units.get(&unit).copied()
    }

    /// Attribute slots of `vertex_array` in index order.
    pub fn vertex_array_attributes(&self, vertex_array: u32) -> Option<Vec<AttributeState>> {
        let state = self.state.borrow();
        let vao = state.vertex_arrays.get(&vertex_array)?;
        let indices: BTreeSet<u32> = vao.pointers.keys().chain(&vao.enabled).copied().collect();
        Some(
            indices
                .into_iter()
                .map(|index| {
                    let pointer = vao.pointers.get(&index);
                    AttributeState {
                        index,
                        components: pointer.map_or(4, |p| p.components),
                        stride: pointer.map_or(0, |p| p.stride),
                        offset: pointer.map_or(0, |p| p.offset),
                        buffer: pointer.map_or(0, |p| p.buffer),
                        enabled: vao.enabled.contains(&index),
                    }
                })
                .collect(),
        )
    }

    pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn texture(&self, texture: u32) -> Option<TextureInfo> {
        let state = self.state.borrow();
        let mut info = state.textures.get(&texture)?.clone()?;
        if let Some((wrap, filter)) = state.texture_params.get(&texture) {
            info.wrap = Some(*wrap);
            info.filter = Some(*filter);
        }
        Some(info)
    }

    pub fn live_objects(&self) -> ObjectCounts {
        let state = self.state.borrow();
        ObjectCounts {
            shaders: state.shaders.len(),
            programs: state.programs.len(),
            vertex_arrays: state.vertex_arrays.len(),
            buffers: state.buffers.len(),
            textures: state.textures.len(),
        }
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clear_count
    }

    pub fn last_clear(&self) -> Option<(ClearMask, [f32; 4])> {
        let state = self.state.borrow();
        state.last_clear.map(|mask| (mask, state.clear_color))
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.state.borrow().depth_test
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Shader = u32;
    type Program = u32;
    type VertexArray = u32;
    type Buffer = u32;
    type Texture = u32;
    type UniformLocation = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.shaders.insert(
            id,
            ShaderObject { stage, source: String::new(), compiled: None, log: String::new() },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(object) => object.source = source.to_string(),
            None => state.flag(INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.shaders.get_mut(&shader) else {
            state.flag(INVALID_VALUE);
            return;
        };
        match glsl::compile(object.stage, &object.source) {
            Ok(iface) => {
                object.compiled = Some(iface);
                object.log.clear();
            }
            Err(log) => {
                object.compiled = None;
                object.log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        let state = self.state.borrow();
        state.shaders.get(&shader).is_some_and(|s| s.compiled.is_some())
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let state = self.state.borrow();
        state.shaders.get(&shader).map(|s| s.log.clone()).unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.programs.insert(id, ProgramObject::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            state.flag(INVALID_VALUE);
            return;
        }
        let already = state.programs.get(&program).map(|p| p.attached.contains(&shader));
        match already {
            Some(false) => {
                if let Some(object) = state.programs.get_mut(&program) {
                    object.attached.push(shader);
                }
            }
            Some(true) => state.flag(INVALID_OPERATION),
            None => state.flag(INVALID_VALUE),
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        let attached = state.programs.get(&program).map(|p| p.attached.contains(&shader));
        match attached {
            Some(true) => {
                if let Some(object) = state.programs.get_mut(&program) {
                    object.attached.retain(|s| *s != shader);
                }
            }
            Some(false) => state.flag(INVALID_OPERATION),
            None => state.flag(INVALID_VALUE),
        }
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.programs.get(&program) else {
            state.flag(INVALID_VALUE);
            return;
        };
        let result = state.link(object);
        if let Some(object) = state.programs.get_mut(&program) {
            match result {
                Ok(iface) => {
                    object.values = iface.uniforms.iter().map(|u| u.ty.zero_value()).collect();
                    object.linked = Some(iface);
                    object.log.clear();
                }
                Err(log) => {
                    object.linked = None;
                    object.values.clear();
                    object.log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        let state = self.state.borrow();
        state.programs.get(&program).is_some_and(|p| p.linked.is_some())
    }

    fn program_info_log(&self, program: u32) -> String {
        let state = self.state.borrow();
        state.programs.get(&program).map(|p| p.log.clone()).unwrap_or_default()
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match program {
            None => state.current_program = None,
            Some(id) => match state.programs.get(&id) {
                Some(object) if object.linked.is_some() => state.current_program = Some(id),
                Some(_) => state.flag(INVALID_OPERATION),
                None => state.flag(INVALID_VALUE),
            },
        }
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let lookup = state.programs.get(&program).map(|p| {
            p.linked
                .as_ref()
                .map(|iface| {
                    iface.uniforms.iter().find(|u| u.name == name).and_then(|u| u.location)
                })
        });
        match lookup {
            Some(Some(location)) => location,
            Some(None) => {
                state.flag(INVALID_OPERATION);
                None
            }
            None => {
                state.flag(INVALID_VALUE);
                None
            }
        }
    }

    fn set_uniform(&self, location: &u32, value: &UniformValue) {
        let mut state = self.state.borrow_mut();
        let Some(current) = state.current_program else {
            state.flag(INVALID_OPERATION);
            return;
        };
        let declared = state
            .programs
            .get(&current)
            .and_then(|p| p.linked.as_ref())
            .and_then(|iface| iface.uniforms.get(*location as usize))
            .and_then(|u| u.ty.uniform_kind());
        if declared != Some(value.kind()) {
            state.flag(INVALID_OPERATION);
            return;
        }
        if let Some(slot) = state
            .programs
            .get_mut(&current)
            .and_then(|p| p.values.get_mut(*location as usize))
        {
            *slot = Some(*value);
        }
    }

    fn read_uniform(
        &self,
        program: u32,
        location: &u32,
        kind: UniformKind,
    ) -> Option<UniformValue> {
        let mut state = self.state.borrow_mut();
        let slot = state.programs.get(&program).and_then(|p| {
            let uniform = p.linked.as_ref()?.uniforms.get(*location as usize)?;
            let value = p.values.get(*location as usize).copied().flatten();
            Some((uniform.ty.uniform_kind(), value))
        });
        match slot {
            Some((Some(declared), value)) if declared == kind => value,
            _ => {
                state.flag(INVALID_OPERATION);
                None
            }
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.vertex_arrays.insert(id, VertexArrayObject::default());
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match vertex_array {
            Some(id) if !state.vertex_arrays.contains_key(&id) => state.flag(INVALID_OPERATION),
            other => state.bound_vertex_array = other,
        }
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array);
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.buffers.insert(id, Vec::new());
        Ok(id)
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(id) if !state.buffers.contains_key(&id) => state.flag(INVALID_OPERATION),
            other => state.bound_array_buffer = other,
        }
    }

    fn array_buffer_data(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let target = state.bound_array_buffer;
        match target.and_then(|id| state.buffers.get_mut(&id)) {
            Some(storage) => *storage = data.to_vec(),
            None => state.flag(INVALID_OPERATION),
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer);
        if state.bound_array_buffer == Some(buffer) {
            state.bound_array_buffer = None;
        }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        if !(1..=4).contains(&components) || stride < 0 || offset < 0 {
            state.flag(INVALID_VALUE);
            return;
        }
        let (Some(vao), Some(buffer)) = (state.bound_vertex_array, state.bound_array_buffer) else {
            state.flag(INVALID_OPERATION);
            return;
        };
        if let Some(object) = state.vertex_arrays.get_mut(&vao) {
            object
                .pointers
                .insert(index, AttributePointer { components, stride, offset, buffer });
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let bound = state.bound_vertex_array;
        match bound.and_then(|id| state.vertex_arrays.get_mut(&id)) {
            Some(object) => {
                object.enabled.insert(index);
            }
            None => state.flag(INVALID_OPERATION),
        }
    }

    fn create_texture(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.textures.insert(id, None);
        Ok(id)
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        if unit >= MAX_TEXTURE_UNITS {
            state.flag(INVALID_ENUM);
            return;
        }
        state.active_unit = unit;
    }

    fn bind_texture_2d(&self, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            Some(id) if !state.textures.contains_key(&id) => state.flag(INVALID_VALUE),
            Some(id) => {
                state.texture_units.insert(unit, id);
            }
            None => {
                state.texture_units.remove(&unit);
            }
        }
    }

    fn tex_image_2d(&self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let expected = width as usize * height as usize * format.channels() as usize;
        if pixels.len() != expected {
            state.flag(INVALID_VALUE);
            return;
        }
        let Some(texture) = state.bound_texture() else {
            state.flag(INVALID_OPERATION);
            return;
        };
        state.textures.insert(
            texture,
            Some(TextureInfo {
                width,
                height,
                format,
                pixels: pixels.to_vec(),
                wrap: None,
                filter: None,
                mipmapped: false,
            }),
        );
    }

    fn tex_parameters_2d(&self, wrap: TextureWrap, filter: TextureFilter) {
        let mut state = self.state.borrow_mut();
        match state.bound_texture() {
            Some(texture) => {
                state.texture_params.insert(texture, (wrap, filter));
            }
            None => state.flag(INVALID_OPERATION),
        }
    }

    fn generate_mipmap_2d(&self) {
        let mut state = self.state.borrow_mut();
        let bound = state.bound_texture();
        match bound.and_then(|id| state.textures.get_mut(&id)) {
            Some(Some(info)) => info.mipmapped = true,
            _ => state.flag(INVALID_OPERATION),
        }
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        state.texture_params.remove(&texture);
        state.texture_units.retain(|_, bound| *bound != texture);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        if width < 0 || height < 0 {
            state.flag(INVALID_VALUE);
            return;
        }
        state.viewport = [x, y, width, height];
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().clear_color = rgba;
    }

    fn clear(&self, mask: ClearMask) {
        let mut state = self.state.borrow_mut();
        state.clear_count += 1;
        state.last_clear = Some(mask);
    }

    fn set_depth_test(&self, enabled: bool) {
        self.state.borrow_mut().depth_test = enabled;
    }

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        let end = first.checked_add(count);
        if first < 0 || count < 0 || end.is_none() {
            state.flag(INVALID_VALUE);
            return;
        }
        let (Some(program), Some(vertex_array)) = (state.current_program, state.bound_vertex_array)
        else {
            state.flag(INVALID_OPERATION);
            return;
        };
        let streamed = state
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|vao| state.stream_vertices(vao, first, count));
        let Some(attributes) = streamed else {
            state.flag(INVALID_OPERATION);
            return;
        };
        let uniforms = state
            .programs
            .get(&program)
            .and_then(|p| p.linked.as_ref().map(|iface| (iface, &p.values)))
            .map(|(iface, values)| {
                iface
                    .uniforms
                    .iter()
                    .zip(values)
                    .filter_map(|(u, v)| (*v).map(|v| (u.name.clone(), v)))
                    .collect()
            })
            .unwrap_or_default();
        let textures = state.texture_units.clone();
        trace!("[headless] draw {:?} {}..{:?} with program {}", mode, first, end, program);
        state.draws.push(DrawCall {
            program,
            vertex_array,
            mode,
            first,
            count,
            attributes,
            uniforms,
            textures,
        });
    }

    fn take_error(&self) -> Option<u32> {
        self.state.borrow_mut().error.take()
    }
}
