//! Input handling module
//! This module contains input processing logic for keyboard, mouse, and window events.

pub mod handler;

pub use handler::{InputAction, InputHandler};
