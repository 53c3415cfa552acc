use glam::Vec3;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::hand::Hand;
use super::street::Street;
use super::sun::Sun;
use super::watch::{Watch, WatchScreen};
use super::{InputState, TimeState};
use crate::config::Config;
use crate::rendering::{Camera, CameraMode, FrameContext, FrameUniforms};

/// The whole scene: every component explicitly owned, updated and rendered
/// in a fixed order each frame.
///
/// Ordering is load-bearing: the camera (including bobbing) is finalized
/// before the hand controller reads its position, and the hand transform is
/// finalized before street/watch updates and before any watch-local
/// transform is derived.
pub struct Scene {
    pub camera: Camera,
    pub hand: Hand,
    pub street: Street,
    pub watch: Watch,
    pub sun: Sun,
    pub time: TimeState,
    pub input: InputState,

    mouse_height_sensitivity: f32,
    free_move_speed: f32,
    fog_color: Vec3,
    fog_density: f32,
    window_width: f32,
    is_running: bool,
    pub last_fps: Option<f32>,
}

impl Scene {
    pub fn new(config: &Config, aspect: f32) -> Self {
        Self {
            camera: Camera::new(config, aspect),
            hand: Hand::new(config),
            street: Street::new(config),
            watch: Watch::new(),
            sun: Sun::new(),
            time: TimeState::default(),
            input: InputState::default(),
            mouse_height_sensitivity: config.mouse_height_sensitivity,
            free_move_speed: config.free_move_speed,
            fog_color: Vec3::from_array(config.fog_color),
            fog_density: config.fog_density,
            window_width: config.window_width as f32,
            is_running: false,
            last_fps: None,
        }
    }

    /// Running requires all three: run key held, heart-rate screen showing,
    /// and the watch raised into view.
    fn compute_running(&self) -> bool {
        self.input.run
            && self.watch.screen() == WatchScreen::HeartRate
            && self.hand.is_viewing()
    }

    pub fn update(&mut self) {
        self.time.update();
        let dt = self.time.delta_time;
        let now = self.time.current_time;

        // Camera first. Mouse look is ignored while reading the watch.
        let (dx, dy) = self.input.mouse_delta;
        if !self.hand.is_viewing() && (dx != 0.0 || dy != 0.0) {
            match self.camera.mode {
                CameraMode::Walk => self
                    .camera
                    .move_vertical(-dy * self.mouse_height_sensitivity),
                CameraMode::Free => self.camera.update_orientation(dx, -dy),
            }
        }
        if self.camera.mode == CameraMode::Free {
            let step = self.free_move_speed * dt;
            if self.input.forward {
                self.camera.move_forward(step);
            }
            if self.input.backward {
                self.camera.move_forward(-step);
            }
            if self.input.right {
                self.camera.move_right(step);
            }
            if self.input.left {
                self.camera.move_right(-step);
            }
            if self.input.up {
                self.camera.move_up(step);
            }
            if self.input.down {
                self.camera.move_up(-step);
            }
        }

        self.is_running = self.compute_running();
        self.camera.update_bobbing(dt, self.is_running);

        // Hand reads the finalized camera eye (bobbing included) so the arm
        // rides the footstep motion.
        self.hand.update(dt, self.camera.eye_position());

        self.street
            .update(dt, self.is_running, self.camera.position.z);
        self.watch.update(dt, now, self.is_running);

        if let Some(fps) = self.time.fps_sample() {
            log::info!("FPS: {:.1}", fps);
            self.last_fps = Some(fps);
        }

        self.input.reset_mouse_delta();
    }

    /// Fills the frame context: uniforms first, then the draw list in
    /// back-to-front scene order (environment, sun, arm, watch).
    pub fn render(&self, frame: &mut FrameContext) {
        let hand_matrix = self.hand.transform_matrix();
        let watch_light = if self.watch_focused() {
            Some(self.watch.glow_light(hand_matrix))
        } else {
            None
        };

        frame.begin(FrameUniforms {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(),
            camera_position: self.camera.eye_position(),
            light: self.sun.light(),
            watch_light,
            fog_color: self.fog_color,
            fog_density: self.fog_density,
        });

        self.street.render(frame);
        self.sun.render(frame);
        self.hand.render(frame);
        self.watch.render(frame, hand_matrix);
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// True while the watch is raised or mid-transition; drives the glow
    /// light and the cursor visibility in the windowing layer.
    pub fn watch_focused(&self) -> bool {
        self.hand.is_viewing() || self.hand.is_transitioning()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.window_width = width as f32;
        self.camera.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(event),
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_position = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(),
            WindowEvent::Resized(size) => self.set_viewport(size.width, size.height),
            _ => {}
        }
    }

    fn handle_keyboard(&mut self, event: &KeyEvent) {
        if event.state == ElementState::Pressed && !event.repeat {
            if let PhysicalKey::Code(code) = event.physical_key {
                match code {
                    KeyCode::Space => self.hand.toggle_viewing(),
                    KeyCode::KeyF => {
                        self.camera.mode = match self.camera.mode {
                            CameraMode::Walk => CameraMode::Free,
                            CameraMode::Free => CameraMode::Walk,
                        };
                    }
                    _ => {}
                }
            }
        }
        self.input.handle_keyboard(event);
    }

    /// Screen-thirds hit regions for the watch arrows; only live while the
    /// watch is raised.
    fn handle_click(&mut self) {
        if !self.hand.is_viewing() {
            return;
        }
        let x = self.input.cursor_position.0;
        if x < self.window_width / 3.0 {
            self.watch.prev_screen();
        } else if x > 2.0 * self.window_width / 3.0 {
            self.watch.next_screen();
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.mouse_delta.0 += delta.0 as f32;
            self.input.mouse_delta.1 += delta.1 as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::MeshId;

    fn scene() -> Scene {
        Scene::new(&Config::default(), 1.5)
    }

    fn raise_watch(scene: &mut Scene) {
        scene.hand.toggle_viewing();
        for _ in 0..100 {
            scene.hand.update(0.02, scene.camera.eye_position());
        }
        assert!(scene.hand.is_viewing());
    }

    #[test]
    fn test_draw_list_order() {
        let scene = scene();
        let mut frame = FrameContext::new();
        scene.render(&mut frame);

        assert_eq!(frame.commands[0].mesh, MeshId::Ground);
        let meshes: Vec<MeshId> = frame.commands.iter().map(|c| c.mesh).collect();
        let pos = |m: MeshId| meshes.iter().position(|&x| x == m).unwrap();
        assert!(pos(MeshId::RoadSegment) < pos(MeshId::Sphere));
        assert!(pos(MeshId::Sphere) < pos(MeshId::Arm));
        assert!(pos(MeshId::Arm) < pos(MeshId::WatchBody));
    }

    #[test]
    fn test_watch_light_only_while_focused() {
        let mut scene = scene();
        let mut frame = FrameContext::new();
        scene.render(&mut frame);
        assert!(frame.uniforms.watch_light.is_none());

        raise_watch(&mut scene);
        scene.render(&mut frame);
        assert!(frame.uniforms.watch_light.is_some());
    }

    #[test]
    fn test_running_requires_key_screen_and_viewing() {
        let mut scene = scene();
        scene.input.run = true;
        assert!(!scene.compute_running(), "wrong screen, hand down");

        scene.watch.next_screen();
        assert_eq!(scene.watch.screen(), WatchScreen::HeartRate);
        assert!(!scene.compute_running(), "hand still down");

        raise_watch(&mut scene);
        assert!(scene.compute_running());

        scene.input.run = false;
        assert!(!scene.compute_running());
    }

    #[test]
    fn test_click_navigation_only_while_viewing() {
        let mut scene = scene();
        // Right third of a 1200px window.
        scene.input.cursor_position = (1100.0, 400.0);
        scene.handle_click();
        assert_eq!(scene.watch.screen(), WatchScreen::Clock, "hand down: ignored");

        raise_watch(&mut scene);
        scene.handle_click();
        assert_eq!(scene.watch.screen(), WatchScreen::HeartRate);
        scene.handle_click();
        assert_eq!(scene.watch.screen(), WatchScreen::Battery);

        // Middle third does nothing.
        scene.input.cursor_position = (600.0, 400.0);
        scene.handle_click();
        assert_eq!(scene.watch.screen(), WatchScreen::Battery);

        scene.input.cursor_position = (100.0, 400.0);
        scene.handle_click();
        assert_eq!(scene.watch.screen(), WatchScreen::HeartRate);
    }

    #[test]
    fn test_update_runs_full_pipeline() {
        let mut scene = scene();
        for _ in 0..5 {
            scene.update();
        }
        assert!(!scene.is_running());
        // Mouse deltas are consumed each frame.
        scene.input.mouse_delta = (3.0, 4.0);
        scene.update();
        assert_eq!(scene.input.mouse_delta, (0.0, 0.0));
    }

    #[test]
    fn test_viewport_updates_aspect() {
        let mut scene = scene();
        scene.set_viewport(800, 400);
        assert_eq!(scene.camera.aspect, 2.0);
        assert_eq!(scene.window_width, 800.0);
    }
}
