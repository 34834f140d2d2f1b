use std::rc::Rc;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;
use log::{error, info};

use crate::engine::graphics::{GlBackend, Renderer};
use crate::engine::input::{InputAction, InputHandler};
use crate::engine::window::WindowManager;

use super::camera::Camera;
use super::config::AppConfig;
use super::error::AppError;
use super::frame::{FrameClock, FrameContext};
use super::lessons::{LessonKind, Scene};

/// Field order is drop order: GL resources go before the context that owns
/// them.
pub struct App {
    scene: Option<Box<dyn Scene<GlBackend>>>,
    renderer: Option<Renderer<GlBackend>>,
    backend: Option<Rc<GlBackend>>,
    window_manager: WindowManager,
    config: AppConfig,
    camera: Camera,
    input_handler: InputHandler,
    clock: FrameClock,
    fullscreen: bool,
    error: Option<AppError>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let mut input_handler = InputHandler::new();
        input_handler.set_mouse_sensitivity(config.mouse_sensitivity);
        input_handler.set_movement_speed(config.movement_speed);
        Self {
            scene: None,
            renderer: None,
            backend: None,
            window_manager: WindowManager::new(),
            config,
            camera: Camera::default(),
            input_handler,
            clock: FrameClock::new(),
            fullscreen: false,
            error: None,
        }
    }

    /// The failure that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let gl = self.window_manager.create_window(event_loop, &self.config.window)?;
        // SAFETY: `create_window` made the context current on this thread, and
        // `window_manager` is declared after every field holding GL resources.
        let backend = Rc::new(unsafe { GlBackend::new(gl) });
        info!("OpenGL version: {}", backend.version_string());

        let size = self.window_manager.get_size().unwrap_or(PhysicalSize::new(
            self.config.window.width,
            self.config.window.height,
        ));
        let renderer = Renderer::new(
            Rc::clone(&backend),
            self.config.clear_color,
            size.width,
            size.height,
        );

        let lesson = self.config.start_lesson;
        let scene = lesson
            .build(&backend, &self.config.assets())
            .map_err(|source| AppError::Lesson { lesson, source })?;
        info!("Starting lesson {}", lesson);

        self.scene = Some(scene);
        self.renderer = Some(renderer);
        self.backend = Some(backend);
        self.update_title(lesson);
        self.clock.reset();
        Ok(())
    }

    /// Builds `lesson` and swaps it in. On failure the current lesson keeps
    /// running.
    fn switch_lesson(&mut self, lesson: LessonKind) {
        let Some(backend) = &self.backend else {
            return;
        };
        if self.scene.as_ref().is_some_and(|scene| scene.kind() == lesson) {
            return;
        }
        match lesson.build(backend, &self.config.assets()) {
            Ok(scene) => {
                info!("Switched to lesson {}", lesson);
                self.scene = Some(scene);
                self.update_title(lesson);
                self.clock.reset();
            }
            Err(e) => error!("Failed to build lesson {}: {}", lesson, e),
        }
    }

    fn update_title(&self, lesson: LessonKind) {
        if let Some(window) = self.window_manager.get_window() {
            window.set_title(&format!("{} - {}", self.config.window.title, lesson));
        }
    }

    fn redraw(&mut self) {
        let time = self.clock.tick();
        let (Some(renderer), Some(scene)) = (&self.renderer, &self.scene) else {
            return;
        };
        if scene.uses_camera() {
            self.input_handler.apply_movement(&mut self.camera, time.delta);
        }

        let frame = FrameContext::new(time, renderer.aspect(), &self.camera);
        renderer.begin_frame(scene.uses_depth());
        scene.render(renderer, &frame);
        if let Err(e) = renderer.check_errors() {
            error!("Render error: {}", e);
        }
        if let Err(e) = self.window_manager.swap_buffers() {
            error!("Failed to present frame: {}", e);
        }
        self.window_manager.request_redraw();
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.window_manager.set_window_size(new_size);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height);
        }
    }

    fn handle_action(&mut self, event_loop: &ActiveEventLoop, action: InputAction) {
        match action {
            InputAction::Close => event_loop.exit(),
            InputAction::ToggleFullscreen => {
                let window = self.window_manager.get_window();
                self.input_handler.handle_fullscreen_toggle(&mut self.fullscreen, window);
            }
            InputAction::SelectLesson(index) => {
                if let Some(lesson) = LessonKind::from_index(index) {
                    self.switch_lesson(lesson);
                }
            }
        }
    }

    fn camera_active(&self) -> bool {
        self.scene.as_ref().is_some_and(|scene| scene.uses_camera())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.backend.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            error!("Failed to initialize graphics: {}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            WindowEvent::Resized(physical_size) => {
                self.resize(physical_size);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if event.repeat {
                        return;
                    }
                    let action = self.input_handler.handle_keyboard_input_event(keycode, pressed);
                    if let Some(action) = action {
                        self.handle_action(event_loop, action);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.camera_active() {
                    self.input_handler.handle_scroll(delta, &mut self.camera);
                }
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.input_handler.release_all();
                }
                self.input_handler
                    .handle_window_focus(focused, self.window_manager.get_window());
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.camera_active() {
                self.input_handler.handle_mouse_motion(delta, &mut self.camera);
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        info!("Shutting down");
        self.scene = None;
        self.renderer = None;
        self.backend = None;
    }
}
