//! Error types surfaced by the graphics layer.

use std::path::PathBuf;

use thiserror::Error;

use super::backend::ShaderStage;

#[derive(Debug, Error)]
pub enum GraphicsError {
    /// A single stage failed to compile. `log` is the backend's diagnostic text.
    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{log}")]
    ProgramLink { log: String },

    /// The file is missing or unreadable. Empty files are not an error here.
    #[error("failed to read {}: {source}", path.display())]
    ResourceLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("vertex data of {len} floats is not a multiple of the {stride}-float stride")]
    InvalidVertexData { len: usize, stride: usize },

    #[error("backend could not create {what}: {reason}")]
    ObjectCreation { what: &'static str, reason: String },

    #[error("backend error flag set (0x{code:04X})")]
    Backend { code: u32 },
}

impl GraphicsError {
    /// Stage tag of a compile failure, if this is one.
    pub fn failed_stage(&self) -> Option<ShaderStage> {
        match self {
            GraphicsError::ShaderCompile { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
