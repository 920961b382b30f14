use std::f32::consts::TAU;
use glam::{Mat4, Vec3};

/// Angle advanced once per tick. Wraps at 4π so that both the 2.5× yaw term
/// and the sine term of the spin stay continuous across the wrap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClock {
    angle: f32,
    speed: f32,
}

impl AnimationClock {
    pub const DEFAULT_SPEED: f32 = 1.0 / 64.0;
    const PERIOD: f32 = 2.0 * TAU;

    pub fn new(speed: f32) -> Self {
        Self { angle: 0.0, speed }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn advance(&mut self) {
        self.angle += self.speed;
        if self.angle >= Self::PERIOD {
            self.angle -= Self::PERIOD;
        }
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPEED)
    }
}

/// Places the single mesh in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub offset: Vec3,
    pub spin: bool,
}

impl WorldTransform {
    pub fn new(offset: Vec3, spin: bool) -> Self {
        Self { offset, spin }
    }

    /// Spin (yaw 2.5·angle, then pitch sin(angle)/2) followed by the offset.
    pub fn to_matrix(&self, angle: f32) -> Mat4 {
        let translation = Mat4::from_translation(self.offset);
        if !self.spin {
            return translation;
        }

        let rotation = Mat4::from_rotation_x(angle.sin() / 2.0) * Mat4::from_rotation_y(2.5 * angle);
        translation * rotation
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, false)
    }
}
