//! Simulation module: scene state, the hand/watch/street state machines,
//! and per-frame time and input bookkeeping.
//!
//! Everything here runs on one thread in a strict per-frame order; the only
//! clock is the monotonic frame clock in [`TimeState`].

pub mod hand;
pub mod scene;
pub mod street;
pub mod sun;
pub mod watch;

pub use scene::Scene;

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Held-key state plus accumulated mouse motion for the current frame.
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Run key; only takes effect on the heart-rate screen in viewing mode.
    pub run: bool,
    pub mouse_delta: (f32, f32),
    pub cursor_position: (f32, f32),
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            run: false,
            mouse_delta: (0.0, 0.0),
            cursor_position: (0.0, 0.0),
        }
    }
}

impl InputState {
    pub fn handle_keyboard(&mut self, event: &KeyEvent) {
        let pressed = event.state == ElementState::Pressed;

        if let PhysicalKey::Code(keycode) = event.physical_key {
            match keycode {
                KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
                KeyCode::KeyS | KeyCode::ArrowDown => self.backward = pressed,
                KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
                KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
                KeyCode::KeyE => self.up = pressed,
                KeyCode::KeyQ => self.down = pressed,
                KeyCode::KeyR => self.run = pressed,
                _ => {}
            }
        }
    }

    pub fn reset_mouse_delta(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }
}

/// Frame clock: per-frame delta plus a monotonic elapsed-seconds value that
/// all watch/sensor timers compare against.
#[derive(Debug, Clone)]
pub struct TimeState {
    pub current_time: f64,
    pub delta_time: f32,
    pub last_frame_time: std::time::Instant,
    pub frame_count: u64,
    pub last_fps_instant: std::time::Instant,
}

impl Default for TimeState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            delta_time: 0.0,
            last_frame_time: std::time::Instant::now(),
            frame_count: 0,
            last_fps_instant: std::time::Instant::now(),
        }
    }
}

impl TimeState {
    pub fn update(&mut self) {
        let now = std::time::Instant::now();
        self.delta_time = now.duration_since(self.last_frame_time).as_secs_f32();
        self.current_time += self.delta_time as f64;
        self.last_frame_time = now;
        self.frame_count += 1;
    }

    pub fn fps_sample(&mut self) -> Option<f32> {
        let now = std::time::Instant::now();
        let elapsed = now.duration_since(self.last_fps_instant).as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.last_fps_instant = now;
            Some(fps)
        } else {
            None
        }
    }
}
