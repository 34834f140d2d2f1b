//! Window management module
//! Owns the winit window together with its glutin surface and GL context.

pub mod manager;

pub use manager::{WindowError, WindowManager, WindowSettings};
