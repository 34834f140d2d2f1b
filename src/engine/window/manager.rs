//! Window and OpenGL context management.

use std::num::NonZeroU32;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{debug, error, info, warn};
use raw_window_handle::HasWindowHandle;
use thiserror::Error;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("failed to create window or choose a GL config: {0}")]
    Display(String),
    #[error("window handle unavailable: {0}")]
    Handle(#[from] raw_window_handle::HandleError),
    #[error("GL context error: {0}")]
    Context(#[from] glutin::error::Error),
    #[error("no window has been created")]
    NoWindow,
}

/// What the window and its GL context should look like.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Requested core-profile version (major, minor).
    pub gl_version: (u8, u8),
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "LearnOpenGL".to_string(),
            width: 800,
            height: 600,
            gl_version: (3, 3),
            vsync: true,
        }
    }
}

pub struct WindowManager {
    window: Option<Window>,
    surface: Option<Surface<WindowSurface>>,
    context: Option<PossiblyCurrentContext>,
    size: Option<PhysicalSize<u32>>,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager {
    pub fn new() -> Self {
        Self {
            window: None,
            surface: None,
            context: None,
            size: None,
        }
    }

    /// Opens the window, creates a core-profile context, makes it current on
    /// this thread and returns the loaded GL function table.
    pub fn create_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        settings: &WindowSettings,
    ) -> Result<glow::Context, WindowError> {
        let attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(LogicalSize::new(settings.width, settings.height));
        let template = ConfigTemplateBuilder::new().with_depth_size(24);

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes))
            .build(event_loop, template, pick_config)
            .map_err(|e| {
                error!("Failed to create window: {:?}", e);
                WindowError::Display(e.to_string())
            })?;
        let window = window.ok_or(WindowError::NoWindow)?;

        let (major, minor) = settings.gl_version;
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .build(Some(window.window_handle()?.as_raw()));

        let gl_display = gl_config.display();
        // SAFETY: the raw window handle passed to the context attributes
        // belongs to `window`, which outlives the context in `self`.
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes)? };
        let surface_attributes = window.build_surface_attributes(Default::default())?;
        // SAFETY: as above, the surface is dropped before the window.
        let surface =
            unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes)? };
        let context = not_current.make_current(&surface)?;

        let interval = if settings.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            warn!("Failed to set swap interval: {:?}", e);
        }

        // SAFETY: the context created above is current on this thread.
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
        };

        let size = window.inner_size();
        info!(
            "Created {}x{} window with GL {}.{} core context ({} depth bits)",
            size.width,
            size.height,
            major,
            minor,
            gl_config.depth_size()
        );
        self.size = Some(size);
        self.window = Some(window);
        self.surface = Some(surface);
        self.context = Some(context);
        Ok(gl)
    }

    /// Resizes the drawable; zero-sized requests (minimised windows) are
    /// remembered but not forwarded to the surface.
    pub fn set_window_size(&mut self, size: PhysicalSize<u32>) {
        self.size = Some(size);
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return;
        };
        if let (Some(surface), Some(context)) = (&self.surface, &self.context) {
            surface.resize(context, width, height);
            debug!("Surface resized to {}x{}", size.width, size.height);
        }
    }

    pub fn swap_buffers(&self) -> Result<(), WindowError> {
        match (&self.surface, &self.context) {
            (Some(surface), Some(context)) => Ok(surface.swap_buffers(context)?),
            _ => Err(WindowError::NoWindow),
        }
    }

    pub fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    pub fn get_window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    pub fn get_size(&self) -> Option<PhysicalSize<u32>> {
        self.size
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        // Surface and context go before the window they were created from.
        self.surface.take();
        self.context.take();
        self.window.take();
    }
}

/// Prefers the deepest depth buffer, then the fewest samples.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            let deeper = config.depth_size() > best.depth_size();
            let same_depth_fewer_samples = config.depth_size() == best.depth_size()
                && config.num_samples() < best.num_samples();
            if deeper || same_depth_fewer_samples {
                config
            } else {
                best
            }
        })
        .expect("display builder offers at least one config")
}
