use glam::{Mat4, Vec3, Vec4};

/// A value pushed into a program uniform. Not stored by the wrappers; lessons
/// rebuild and resend these every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    /// Plain integers and sampler texture-unit indices.
    Int(i32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Number of scalar components the value occupies.
    pub fn components(self) -> usize {
        match self {
            UniformKind::Float | UniformKind::Int => 1,
            UniformKind::Vec3 => 3,
            UniformKind::Vec4 => 4,
            UniformKind::Mat4 => 16,
        }
    }

    /// Builds a value from column-major float components.
    pub fn from_f32s(self, values: &[f32]) -> Option<UniformValue> {
        if values.len() < self.components() {
            return None;
        }
        Some(match self {
            UniformKind::Float => UniformValue::Float(values[0]),
            UniformKind::Int => UniformValue::Int(values[0] as i32),
            UniformKind::Vec3 => UniformValue::Vec3(Vec3::from_slice(values)),
            UniformKind::Vec4 => UniformValue::Vec4(Vec4::from_slice(values)),
            UniformKind::Mat4 => UniformValue::Mat4(Mat4::from_cols_slice(&values[..16])),
        })
    }
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(Vec3::from_array(value))
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}
