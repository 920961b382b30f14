use std::f32::consts::{PI, TAU};
use glam::{Mat3, Mat4, Vec3};

/// Pitch stays strictly short of straight up/down (0.4975π).
pub const PITCH_LIMIT: f32 = PI * 0.995 / 2.0;

/// Free-look camera: Euler pitch/yaw plus a position, no roll.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pitch: f32,
    yaw: f32,
    position: Vec3,
    rotation_speed: f32,
    move_speed: f32,
}

impl Camera {
    pub const DEFAULT_PITCH: f32 = 0.0;
    pub const DEFAULT_YAW: f32 = 0.0;
    pub const DEFAULT_POSITION: Vec3 = Vec3::ZERO;

    pub fn new(rotation_speed: f32, move_speed: f32) -> Self {
        Self {
            pitch: Self::DEFAULT_PITCH,
            yaw: Self::DEFAULT_YAW,
            position: Self::DEFAULT_POSITION,
            rotation_speed,
            move_speed,
        }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Applies a mouse delta: x turns yaw, y turns pitch.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.pitch = (self.pitch + delta_y * self.rotation_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = wrap_angle(self.yaw + delta_x * self.rotation_speed);
    }

    /// Moves by a camera-local translation scaled by the move speed.
    pub fn move_local(&mut self, translation: Vec3) {
        self.position += self.orientation() * (translation * self.move_speed);
    }

    pub fn reset(&mut self) {
        self.pitch = Self::DEFAULT_PITCH;
        self.yaw = Self::DEFAULT_YAW;
        self.position = Self::DEFAULT_POSITION;
    }

    /// Pitch about local x first, then yaw about y.
    pub fn orientation(&self) -> Mat3 {
        Mat3::from_rotation_y(self.yaw) * Mat3::from_rotation_x(self.pitch)
    }

    pub fn look_direction(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    /// Left-handed look-at from the position along the look direction, world up +y.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.position, self.position + self.look_direction(), Vec3::Y)
    }
}

/// Wraps into [0, 2π). `rem_euclid` can round up to exactly 2π for tiny
/// negative inputs, which is folded back to 0.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
