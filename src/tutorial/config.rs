use std::path::{Path, PathBuf};

use crate::engine::window::WindowSettings;

use super::lessons::LessonKind;

/// Application settings. There are no config files or flags; binaries
/// adjust the defaults with the `with_*` setters.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub window: WindowSettings,
    pub clear_color: [f32; 4],
    /// Directory holding `shaders/` and `textures/`.
    pub asset_root: PathBuf,
    pub start_lesson: LessonKind,
    pub mouse_sensitivity: f32,
    pub movement_speed: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            asset_root: PathBuf::from("assets"),
            start_lesson: LessonKind::TwoTriangles,
            mouse_sensitivity: 0.1,
            movement_speed: 2.5,
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.window.vsync = vsync;
        self
    }

    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = asset_root.into();
        self
    }

    pub fn with_start_lesson(mut self, lesson: LessonKind) -> Self {
        self.start_lesson = lesson;
        self
    }

    pub fn with_mouse_sensitivity(mut self, sensitivity: f32) -> Self {
        self.mouse_sensitivity = sensitivity;
        self
    }

    pub fn with_movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    pub fn assets(&self) -> AssetPaths {
        AssetPaths::new(&self.asset_root)
    }
}

/// Resolves lesson asset names under an asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn shader(&self, file: &str) -> PathBuf {
        self.root.join("shaders").join(file)
    }

    pub fn texture(&self, file: &str) -> PathBuf {
        self.root.join("textures").join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tutorial_window() {
        let config = AppConfig::default();
        assert_eq!(config.window.title, "LearnOpenGL");
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.window.gl_version, (3, 3));
        assert_eq!(config.clear_color, [0.2, 0.3, 0.3, 1.0]);
        assert_eq!(config.start_lesson, LessonKind::TwoTriangles);
    }

    #[test]
    fn test_setters_chain() {
        let config = AppConfig::default()
            .with_title("cubes")
            .with_size(1280, 720)
            .with_vsync(false)
            .with_start_lesson(LessonKind::Cubes)
            .with_asset_root("/opt/learngl");
        assert_eq!(config.window.title, "cubes");
        assert_eq!(config.window.width, 1280);
        assert!(!config.window.vsync);
        assert_eq!(config.start_lesson, LessonKind::Cubes);
        assert_eq!(
            config.assets().shader("cube.vert"),
            PathBuf::from("/opt/learngl/shaders/cube.vert")
        );
        assert_eq!(
            config.assets().texture("container.png"),
            PathBuf::from("/opt/learngl/textures/container.png")
        );
    }
}
