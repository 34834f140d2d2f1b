//! Per-frame timing and the context handed to lessons.

use std::time::{Duration, Instant};

use log::debug;

use super::camera::Camera;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Clamped seconds since the previous tick.
    pub delta: f32,
    /// Seconds since the clock started.
    pub elapsed: f32,
    pub frame_index: u64,
}

/// Produces clamped delta times and counts frames per second.
///
/// Delta time is held in `[dt_min, dt_max]` so a stall (debugger, minimised
/// window) does not launch the camera across the scene.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    fps_window_start: Instant,
    fps_frames: u32,
    last_fps: u32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
            fps_window_start: now,
            fps_frames: 0,
            last_fps: 0,
        }
    }

    /// Resets the delta baseline, e.g. after the lesson changes.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let time = FrameTime {
            delta: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);

        self.fps_frames += 1;
        if now.saturating_duration_since(self.fps_window_start) >= Duration::from_secs(1) {
            self.last_fps = self.fps_frames;
            self.fps_frames = 0;
            self.fps_window_start = now;
            debug!("FPS: {}", self.last_fps);
        }
        time
    }

    /// Frames counted in the last full second.
    pub fn fps(&self) -> u32 {
        self.last_fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a lesson may read while drawing one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub time: FrameTime,
    /// Viewport width over height.
    pub aspect: f32,
    pub camera: &'a Camera,
}

impl<'a> FrameContext<'a> {
    pub fn new(time: FrameTime, aspect: f32, camera: &'a Camera) -> Self {
        Self { time, aspect, camera }
    }

    pub fn elapsed(&self) -> f32 {
        self.time.elapsed
    }

    pub fn delta(&self) -> f32 {
        self.time.delta
    }

    pub fn frame_index(&self) -> u64 {
        self.time.frame_index
    }
}
