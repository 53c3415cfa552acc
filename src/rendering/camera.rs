use glam::{Mat4, Vec3};

use crate::config::Config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// Street mode: height restricted to the walking band, look direction
    /// fixed down the road.
    Walk,
    /// Free-fly: full mouse look and basis-vector movement.
    Free,
}

/// First-person perspective camera. Right-handed system; starts looking
/// down -Z. Yaw/pitch are stored in degrees; the front/right/up basis is
/// recomputed after every orientation change and stays orthonormal.
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    world_up: Vec3,
    pub mode: CameraMode,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,

    walk_height: (f32, f32),
    free_height: (f32, f32),

    bobbing_phase: f32,
    bobbing_offset: f32,
    bobbing_speed: f32,
    bobbing_amount: f32,
}

impl Camera {
    pub fn new(config: &Config, aspect: f32) -> Self {
        let mut cam = Self {
            position: Vec3::from_array(config.start_position),
            yaw: -90.0,
            pitch: 0.0,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            mode: CameraMode::Walk,
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near_plane,
            far: config.far_plane,
            sensitivity: config.look_sensitivity,
            walk_height: (config.walk_height_min, config.walk_height_max),
            free_height: (config.free_height_min, config.free_height_max),
            bobbing_phase: 0.0,
            bobbing_offset: 0.0,
            bobbing_speed: config.bobbing_speed,
            bobbing_amount: config.bobbing_amount,
        };
        cam.update_vectors();
        cam
    }

    /// Applies a mouse delta to yaw/pitch. Pitch is reflected, not clamped,
    /// past ±90°: the look direction continues over the pole with yaw flipped
    /// by 180°, so free-look never locks at the zenith.
    pub fn update_orientation(&mut self, dx: f32, dy: f32) {
        self.yaw += self.sensitivity * dx;
        self.pitch += self.sensitivity * dy;

        if self.pitch > 90.0 {
            self.pitch = 180.0 - self.pitch;
            self.yaw += 180.0;
        } else if self.pitch < -90.0 {
            self.pitch = -180.0 - self.pitch;
            self.yaw += 180.0;
        }
        // Keep yaw bounded for numeric hygiene; the basis is periodic anyway.
        self.yaw = self.yaw.rem_euclid(360.0);

        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();

        let right = self.front.cross(self.world_up);
        // Degenerate only when looking straight along world up; keeps the
        // previous right vector instead of emitting NaNs.
        if right.length_squared() > 1e-8 {
            self.right = right.normalize();
        }
        self.up = self.right.cross(self.front).normalize();
    }

    /// Adds to camera height, clamped to the mode's vertical band.
    pub fn move_vertical(&mut self, offset: f32) {
        let (lo, hi) = match self.mode {
            CameraMode::Walk => self.walk_height,
            CameraMode::Free => self.free_height,
        };
        self.position.y = (self.position.y + offset).clamp(lo, hi);
    }

    pub fn move_forward(&mut self, amount: f32) {
        if self.mode == CameraMode::Free {
            self.position += self.front * amount;
        }
    }

    pub fn move_right(&mut self, amount: f32) {
        if self.mode == CameraMode::Free {
            self.position += self.right * amount;
        }
    }

    pub fn move_up(&mut self, amount: f32) {
        if self.mode == CameraMode::Free {
            self.position += self.up * amount;
        }
    }

    /// Footstep bobbing. While running the phase accumulates and the offset
    /// oscillates; while idle the offset decays geometrically and snaps to
    /// exactly zero below the threshold.
    pub fn update_bobbing(&mut self, dt: f32, is_running: bool) {
        if is_running {
            self.bobbing_phase += dt * self.bobbing_speed;
            self.bobbing_offset = self.bobbing_phase.sin() * self.bobbing_amount;
        } else {
            self.bobbing_offset *= 0.95;
            if self.bobbing_offset.abs() < 0.001 {
                self.bobbing_offset = 0.0;
            }
        }
    }

    #[inline]
    pub fn bobbing_offset(&self) -> f32 {
        self.bobbing_offset
    }

    /// Camera eye position including the bobbing offset; the hand and the
    /// view matrix both anchor to this so the arm bobs with the head.
    #[inline]
    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.bobbing_offset, 0.0)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.eye_position();
        Mat4::look_at_rh(eye, eye + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect.max(1e-6),
            self.near,
            self.far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&Config::default(), 1.5)
    }

    fn assert_orthonormal(cam: &Camera) {
        assert!((cam.front.length() - 1.0).abs() < 1e-4);
        assert!((cam.right.length() - 1.0).abs() < 1e-4);
        assert!((cam.up.length() - 1.0).abs() < 1e-4);
        assert!(cam.front.dot(cam.right).abs() < 1e-4);
        assert!(cam.front.dot(cam.up).abs() < 1e-4);
        assert!(cam.right.dot(cam.up).abs() < 1e-4);
    }

    #[test]
    fn test_initial_basis_looks_down_negative_z() {
        let cam = camera();
        assert!((cam.front - Vec3::NEG_Z).length() < 1e-5);
        assert_orthonormal(&cam);
    }

    #[test]
    fn test_basis_stays_orthonormal_under_arbitrary_look() {
        let mut cam = camera();
        cam.mode = CameraMode::Free;
        for i in 0..500 {
            let dx = ((i * 37) % 23) as f32 - 11.0;
            let dy = ((i * 53) % 19) as f32 - 9.0;
            cam.update_orientation(dx, dy);
            assert_orthonormal(&cam);
            assert!(cam.pitch <= 90.0 && cam.pitch >= -90.0);
        }
    }

    #[test]
    fn test_pitch_reflects_over_pole_instead_of_clamping() {
        let mut cam = camera();
        cam.sensitivity = 1.0;
        cam.pitch = 85.0;
        let yaw_before = cam.yaw;
        cam.update_orientation(0.0, 10.0);
        // 95 reflects to 85 with yaw flipped half a turn.
        assert!((cam.pitch - 85.0).abs() < 1e-4);
        assert!(((cam.yaw - yaw_before).rem_euclid(360.0) - 180.0).abs() < 1e-3);
        assert_orthonormal(&cam);

        cam.pitch = -85.0;
        cam.update_orientation(0.0, -10.0);
        assert!((cam.pitch + 85.0).abs() < 1e-4);
    }

    #[test]
    fn test_walk_height_band() {
        let mut cam = camera();
        cam.move_vertical(100.0);
        assert_eq!(cam.position.y, 1.8);
        cam.move_vertical(-100.0);
        assert_eq!(cam.position.y, 1.3);
    }

    #[test]
    fn test_free_move_only_in_free_mode() {
        let mut cam = camera();
        let start = cam.position;
        cam.move_forward(2.0);
        cam.move_right(2.0);
        cam.move_up(2.0);
        assert_eq!(cam.position, start);

        cam.mode = CameraMode::Free;
        cam.move_forward(2.0);
        assert!((cam.position - start).length() > 1.9);
    }

    #[test]
    fn test_bobbing_decays_to_exact_zero() {
        let mut cam = camera();
        cam.update_bobbing(0.2, true);
        assert!(cam.bobbing_offset().abs() > 0.0);

        let mut calls = 0;
        while cam.bobbing_offset() != 0.0 {
            cam.update_bobbing(0.016, false);
            calls += 1;
            assert!(calls < 500, "decay must converge in bounded calls");
        }
        assert_eq!(cam.bobbing_offset(), 0.0);
    }

    #[test]
    fn test_bobbing_bounded_by_amount() {
        let mut cam = camera();
        for _ in 0..1000 {
            cam.update_bobbing(0.016, true);
            assert!(cam.bobbing_offset().abs() <= Config::default().bobbing_amount + 1e-6);
        }
    }

    #[test]
    fn test_view_uses_bobbing_offset() {
        let mut cam = camera();
        let eye_before = cam.eye_position();
        cam.update_bobbing(0.2, true);
        let eye_after = cam.eye_position();
        assert!(eye_before.y != eye_after.y);
        assert_eq!(eye_before.x, eye_after.x);
    }
}
