pub mod camera;
pub mod input;
pub mod transform;

pub use camera::Camera;
pub use input::{FrameInput, InputState, KeyboardState, MouseDeltaQueue, MovementKey};
pub use transform::{AnimationClock, WorldTransform};

use glam::Mat4;

/// Camera, world placement and animation for the one mesh on screen.
/// Only `update` mutates the camera.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub world: WorldTransform,
    clock: AnimationClock,
}

impl Scene {
    pub fn new(camera: Camera, world: WorldTransform) -> Self {
        Self {
            camera,
            world,
            clock: AnimationClock::default(),
        }
    }

    /// Feeds one tick of input into the camera and steps the animation.
    pub fn update(&mut self, input: FrameInput) {
        if input.reset {
            self.camera.reset();
        }

        let (dx, dy) = input.rotation;
        if dx != 0.0 || dy != 0.0 {
            self.camera.rotate(dx, dy);
        }
        if input.translation != glam::Vec3::ZERO {
            self.camera.move_local(input.translation);
        }

        self.clock.advance();
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world.to_matrix(self.clock.angle())
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.camera.view_matrix()
    }
}
