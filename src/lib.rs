//! Library entry point for the tutorial renderer.

pub mod engine;
pub mod tutorial;

// Re-export main types for convenience
pub use tutorial::{App, AppConfig, AppError};
