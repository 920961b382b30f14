use std::collections::VecDeque;
use glam::Vec3;
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKey {
    Forward,
    Left,
    Back,
    Right,
    Up,
    Down,
}

impl MovementKey {
    pub fn from_key_code(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW => Some(Self::Forward),
            KeyCode::KeyA => Some(Self::Left),
            KeyCode::KeyS => Some(Self::Back),
            KeyCode::KeyD => Some(Self::Right),
            KeyCode::Space => Some(Self::Up),
            KeyCode::ShiftLeft => Some(Self::Down),
            _ => None,
        }
    }
}

/// Latest level of each movement key. Missed transitions are not replayed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardState {
    pub forward: bool,
    pub left: bool,
    pub back: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl KeyboardState {
    pub fn set(&mut self, key: MovementKey, pressed: bool) {
        match key {
            MovementKey::Forward => self.forward = pressed,
            MovementKey::Left => self.left = pressed,
            MovementKey::Back => self.back = pressed,
            MovementKey::Right => self.right = pressed,
            MovementKey::Up => self.up = pressed,
            MovementKey::Down => self.down = pressed,
        }
    }

    /// Camera-local translation implied by the held keys.
    pub fn translation(&self) -> Vec3 {
        fn axis(positive: bool, negative: bool) -> f32 {
            positive as i32 as f32 - negative as i32 as f32
        }

        Vec3::new(
            axis(self.right, self.left),
            axis(self.up, self.down),
            axis(self.forward, self.back),
        )
    }
}

/// Bounded queue of mouse deltas, drained once per tick.
#[derive(Debug, Clone)]
pub struct MouseDeltaQueue {
    samples: VecDeque<(f32, f32)>,
    capacity: usize,
}

impl MouseDeltaQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Queues a delta. When full, the delta is folded into the newest sample
    /// so the net motion survives.
    pub fn push(&mut self, dx: f32, dy: f32) {
        if self.samples.len() < self.capacity {
            self.samples.push_back((dx, dy));
        } else if let Some(last) = self.samples.back_mut() {
            last.0 += dx;
            last.1 += dy;
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Empties the queue and returns the summed delta.
    pub fn drain(&mut self) -> (f32, f32) {
        self.samples
            .drain(..)
            .fold((0.0, 0.0), |(x, y), (dx, dy)| (x + dx, y + dy))
    }
}

/// What one tick feeds into the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub rotation: (f32, f32),
    pub translation: Vec3,
    pub reset: bool,
}

/// Keyboard levels and mouse motion collected between ticks.
#[derive(Debug, Clone)]
pub struct InputState {
    keyboard: KeyboardState,
    mouse: MouseDeltaQueue,
    button_held: bool,
    last_cursor: Option<(f64, f64)>,
    reset_requested: bool,
}

impl InputState {
    pub fn new(mouse_queue_capacity: usize) -> Self {
        Self {
            keyboard: KeyboardState::default(),
            mouse: MouseDeltaQueue::new(mouse_queue_capacity),
            button_held: false,
            last_cursor: None,
            reset_requested: false,
        }
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn pending_mouse_samples(&self) -> usize {
        self.mouse.len()
    }

    /// Returns false for keys the camera does not use.
    pub fn process_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        if let Some(movement) = MovementKey::from_key_code(key) {
            self.keyboard.set(movement, pressed);
            return true;
        }

        if key == KeyCode::KeyR {
            if pressed {
                self.reset_requested = true;
            }
            return true;
        }

        false
    }

    pub fn process_mouse_button(&mut self, pressed: bool) {
        self.button_held = pressed;
        if !pressed {
            self.last_cursor = None;
        }
    }

    /// Cursor positions only turn into deltas while the button is held.
    pub fn process_cursor(&mut self, x: f64, y: f64) {
        if !self.button_held {
            return;
        }

        if let Some((last_x, last_y)) = self.last_cursor {
            self.mouse.push((x - last_x) as f32, (y - last_y) as f32);
        }
        self.last_cursor = Some((x, y));
    }

    pub fn take_frame_input(&mut self) -> FrameInput {
        FrameInput {
            rotation: self.mouse.drain(),
            translation: self.keyboard.translation(),
            reset: std::mem::take(&mut self.reset_requested),
        }
    }
}
