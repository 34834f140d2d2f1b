//! Application entry point.

use winit::event_loop::{ControlFlow, EventLoop};
use log::{info, error};

use learngl::engine::logging::{init_logging, LoggingConfig};
use learngl::{App, AppConfig, AppError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default());
    info!("Logger initialized");

    let event_loop = EventLoop::new().map_err(|e| {
        error!("Failed to create event loop: {:?}", e);
        AppError::from(e)
    })?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(AppConfig::default());
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Application error: {:?}", e);
        return Err(Box::new(AppError::from(e)));
    }
    if let Some(e) = app.take_error() {
        error!("Application error: {}", e);
        return Err(Box::new(e));
    }

    Ok(())
}
