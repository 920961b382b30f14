use std::path::PathBuf;
use std::time::Duration;

/// Vertical field of view of the perspective projection, in degrees.
pub const FOV_Y_DEGREES: f32 = 45.0;
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 100.0;

/// Everything the viewer needs to know up front. Built from the command line
/// in `main`, or from `Default` in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub model: PathBuf,
    pub width: u32,
    pub height: u32,
    pub tick_interval: Duration,
    /// Radians of rotation per pixel of mouse travel.
    pub rotation_speed: f32,
    /// World units per tick of held movement key.
    pub move_speed: f32,
    /// Vertex color applied to every loaded vertex.
    pub color: [f32; 4],
    pub background: [f32; 4],
    /// World-space position of the model.
    pub model_offset: [f32; 3],
    pub spin: bool,
    pub mouse_queue_capacity: usize,
    pub vsync: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/cube.obj"),
            width: 800,
            height: 600,
            tick_interval: Duration::from_millis(15),
            rotation_speed: 0.01,
            move_speed: 0.1,
            color: [1.0, 1.0, 1.0, 1.0],
            background: [0.0, 0.2, 0.4, 1.0],
            model_offset: [0.0, 0.0, 4.0],
            spin: false,
            mouse_queue_capacity: 64,
            vsync: true,
        }
    }
}

impl ViewerConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Parses `r,g,b,a` (or `r,g,b` with alpha 1) into a color.
pub fn parse_color(text: &str) -> Result<[f32; 4], String> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [r, g, b] => Ok([*r, *g, *b, 1.0]),
        [r, g, b, a] => Ok([*r, *g, *b, *a]),
        _ => Err(format!("expected 3 or 4 components, got {}", parts.len())),
    }
}
