use std::collections::HashSet;
use winit::event::MouseScrollDelta;
use winit::keyboard::KeyCode;
use winit::window::{CursorGrabMode, Fullscreen, Window};
use log::{debug, warn};

use crate::tutorial::camera::Camera;

/// Discrete requests produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Close,
    ToggleFullscreen,
    /// Zero-based lesson index from the digit row.
    SelectLesson(usize),
}

pub struct InputHandler {
    /// Degrees of rotation per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// World units per second.
    pub movement_speed: f32,
    pressed_keys: HashSet<KeyCode>,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.1,
            movement_speed: 2.5,
            pressed_keys: HashSet::new(),
        }
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks held keys and returns the action bound to a fresh press.
    pub fn handle_keyboard_input_event(
        &mut self,
        keycode: KeyCode,
        pressed: bool,
    ) -> Option<InputAction> {
        if !pressed {
            self.pressed_keys.remove(&keycode);
            return None;
        }
        self.pressed_keys.insert(keycode);

        use KeyCode::*;
        match keycode {
            Escape => Some(InputAction::Close),
            F11 => Some(InputAction::ToggleFullscreen),
            Digit1 => Some(InputAction::SelectLesson(0)),
            Digit2 => Some(InputAction::SelectLesson(1)),
            Digit3 => Some(InputAction::SelectLesson(2)),
            Digit4 => Some(InputAction::SelectLesson(3)),
            Digit5 => Some(InputAction::SelectLesson(4)),
            _ => None,
        }
    }

    pub fn is_pressed(&self, keycode: KeyCode) -> bool {
        self.pressed_keys.contains(&keycode)
    }

    /// Moves the camera for the held WASD/Space/Shift keys over `delta`
    /// seconds.
    pub fn apply_movement(&self, camera: &mut Camera, delta: f32) {
        use KeyCode::*;
        let mut direction = glam::Vec3::ZERO;

        if self.is_pressed(KeyW) {
            direction.z += 1.0;
        }
        if self.is_pressed(KeyS) {
            direction.z -= 1.0;
        }
        if self.is_pressed(KeyD) {
            direction.x += 1.0;
        }
        if self.is_pressed(KeyA) {
            direction.x -= 1.0;
        }
        if self.is_pressed(Space) {
            direction.y += 1.0;
        }
        if self.is_pressed(ShiftLeft) || self.is_pressed(ShiftRight) {
            direction.y -= 1.0;
        }

        if direction != glam::Vec3::ZERO {
            camera.translate_local(direction.normalize() * self.movement_speed * delta);
            debug!("Camera moved: {:?}", camera.position);
        }
    }

    pub fn handle_mouse_motion(&self, delta: (f64, f64), camera: &mut Camera) {
        let (delta_x, delta_y) = delta;
        camera.rotate(
            delta_x as f32 * self.mouse_sensitivity,
            -delta_y as f32 * self.mouse_sensitivity,
        );
    }

    pub fn handle_scroll(&self, delta: MouseScrollDelta, camera: &mut Camera) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            // Touchpads report pixels; roughly 20 per wheel notch.
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
        };
        camera.zoom(amount);
        debug!("Camera fov: {:.1}", camera.fov);
    }

    pub fn handle_window_focus(&self, focused: bool, window: Option<&Window>) {
        if let Some(window) = window {
            if focused {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grabbed {
                    warn!("Failed to grab cursor: {:?}", e);
                }
                window.set_cursor_visible(false);
                debug!("Window focused, cursor locked and hidden");
            } else {
                let _ = window.set_cursor_grab(CursorGrabMode::None);
                window.set_cursor_visible(true);
                debug!("Window unfocused, cursor unlocked and visible");
            }
        }
    }

    pub fn handle_fullscreen_toggle(&mut self, fullscreen: &mut bool, window: Option<&Window>) {
        if let Some(window) = window {
            if *fullscreen {
                window.set_fullscreen(None);
                debug!("Exited fullscreen mode");
            } else {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                debug!("Entered fullscreen mode");
            }
            *fullscreen = !*fullscreen;
        }
    }

    /// Forgets held keys, e.g. when focus is lost mid-press.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn set_mouse_sensitivity(&mut self, sensitivity: f32) {
        self.mouse_sensitivity = sensitivity;
    }

    pub fn set_movement_speed(&mut self, speed: f32) {
        self.movement_speed = speed;
    }
}
