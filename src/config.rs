use glam::Vec3;

pub const CANVAS_ID: &str = "scene";

pub const STATE_KEY: &str = "guiState";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub canvas_id: String,
    pub storage_key: String,
    pub camera: CameraConfig,
    /// Upper bound applied to the device pixel ratio when sizing the surface.
    pub max_pixel_ratio: f64,
    pub orbit_damping: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas_id: CANVAS_ID.to_string(),
            storage_key: STATE_KEY.to_string(),
            camera: CameraConfig::default(),
            max_pixel_ratio: 2.0,
            orbit_damping: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 50.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(2.0, 2.0, 5.0),
        }
    }
}

/// Size in physical pixels a surface should have for the given layout size.
///
/// `logical` is the CSS/logical size of the surface, `scale_factor` the device
/// pixel ratio. The ratio is capped at `max_pixel_ratio` and each dimension is
/// at least one pixel.
pub fn display_size(logical: (f64, f64), scale_factor: f64, max_pixel_ratio: f64) -> (u32, u32) {
    let ratio = scale_factor.min(max_pixel_ratio).max(0.0);
    let width = (logical.0 * ratio).floor().max(1.0) as u32;
    let height = (logical.1 * ratio).floor().max(1.0) as u32;
    (width, height)
}
