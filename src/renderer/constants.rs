use glam::Mat4;

use crate::config::{FAR_PLANE, FOV_Y_DEGREES, NEAR_PLANE};

/// Per-frame shader inputs. Matrices are stored transposed so the shader
/// multiplies row vectors (`vec4 * m`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneConstants {
    pub world_view: [[f32; 4]; 4],
    pub world_view_proj: [[f32; 4]; 4],
    _padding: [[f32; 4]; 8],
}

const _: () = assert!(std::mem::size_of::<SceneConstants>() == 256);

impl SceneConstants {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(world_view: Mat4, world_view_proj: Mat4) -> Self {
        Self {
            world_view: world_view.transpose().to_cols_array_2d(),
            world_view_proj: world_view_proj.transpose().to_cols_array_2d(),
            _padding: [[0.0; 4]; 8],
        }
    }

    /// Mathematical (untransposed) world-view matrix.
    pub fn world_view_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world_view).transpose()
    }

    pub fn world_view_proj_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world_view_proj).transpose()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for SceneConstants {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

pub fn projection_matrix(aspect: f32) -> Mat4 {
    Mat4::perspective_lh(FOV_Y_DEGREES.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}

/// World-view is the world placement followed by the camera view;
/// world-view-projection adds the perspective projection on top.
pub fn compute_constants(world: Mat4, view: Mat4, aspect: f32) -> SceneConstants {
    let world_view = view * world;
    let world_view_proj = projection_matrix(aspect) * world_view;
    SceneConstants::new(world_view, world_view_proj)
}
