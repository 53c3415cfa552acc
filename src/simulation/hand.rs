use glam::{Mat4, Vec3};

use crate::config::Config;
use crate::rendering::{DrawCommand, FrameContext, Material, MeshId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandState {
    /// Arm hangs at the runner's side.
    Normal,
    /// Wrist raised in front of the face to read the watch.
    Viewing,
}

impl HandState {
    fn opposite(self) -> Self {
        match self {
            HandState::Normal => HandState::Viewing,
            HandState::Viewing => HandState::Normal,
        }
    }
}

/// Two-state position/rotation blend between the resting and viewing poses.
/// At most one transition is ever in flight: `toggle` is a no-op while one
/// runs, so rapid re-toggling cannot thrash the state.
pub struct HandController {
    current_state: HandState,
    target_state: HandState,
    normal_offset: Vec3,
    viewing_offset: Vec3,
    current_offset: Vec3,
    camera_position: Vec3,
    transition_progress: f32,
    transition_speed: f32,
    transitioning: bool,
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

impl HandController {
    pub fn new(config: &Config) -> Self {
        let normal_offset = Vec3::from_array(config.hand_normal_offset);
        Self {
            current_state: HandState::Normal,
            target_state: HandState::Normal,
            normal_offset,
            viewing_offset: Vec3::from_array(config.hand_viewing_offset),
            current_offset: normal_offset,
            camera_position: Vec3::ZERO,
            transition_progress: 0.0,
            transition_speed: config.hand_transition_speed,
            transitioning: false,
        }
    }

    pub fn toggle(&mut self) {
        if self.transitioning {
            return;
        }
        self.target_state = self.current_state.opposite();
        self.transitioning = true;
        self.transition_progress = 0.0;
    }

    pub fn update(&mut self, dt: f32, camera_position: Vec3) {
        self.camera_position = camera_position;

        if !self.transitioning {
            return;
        }
        self.transition_progress = (self.transition_progress + dt * self.transition_speed).min(1.0);
        let fraction = self.viewing_fraction();
        self.current_offset = self.normal_offset.lerp(self.viewing_offset, fraction);

        if self.transition_progress >= 1.0 {
            self.current_state = self.target_state;
            self.transitioning = false;
        }
    }

    /// Eased fraction of the way toward the Viewing pose, continuous across
    /// transition boundaries in either direction. Position and rotation are
    /// both driven by this single value.
    pub fn viewing_fraction(&self) -> f32 {
        if self.transitioning {
            let eased = smoothstep(self.transition_progress);
            match self.target_state {
                HandState::Viewing => eased,
                HandState::Normal => 1.0 - eased,
            }
        } else if self.current_state == HandState::Viewing {
            1.0
        } else {
            0.0
        }
    }

    /// World transform of the hand root: camera-anchored translation plus the
    /// wrist turn (90° about +Y, 180° roll about +Z) scaled by the eased
    /// viewing fraction.
    pub fn transform_matrix(&self) -> Mat4 {
        let t = self.viewing_fraction();
        Mat4::from_translation(self.camera_position + self.current_offset)
            * Mat4::from_rotation_y(t * 90f32.to_radians())
            * Mat4::from_rotation_z(t * 180f32.to_radians())
    }

    pub fn current_offset(&self) -> Vec3 {
        self.current_offset
    }

    pub fn is_viewing(&self) -> bool {
        self.current_state == HandState::Viewing
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn progress(&self) -> f32 {
        self.transition_progress
    }
}

/// The visible arm: wraps the controller with the arm mesh placement and
/// skin material.
pub struct Hand {
    pub controller: HandController,
    skin: Material,
    arm_offset: Vec3,
    arm_rotation_axis: Vec3,
    arm_scale: f32,
}

impl Hand {
    pub fn new(config: &Config) -> Self {
        Self {
            controller: HandController::new(config),
            skin: Material::new(
                Vec3::new(0.85, 0.72, 0.62),
                Vec3::new(0.4, 0.32, 0.28),
                Vec3::new(0.25, 0.22, 0.2),
                12.0,
            ),
            arm_offset: Vec3::new(0.0, 0.0, 0.3),
            arm_rotation_axis: Vec3::new(0.0, 0.1, 1.0),
            arm_scale: 0.02,
        }
    }

    pub fn update(&mut self, dt: f32, camera_position: Vec3) {
        self.controller.update(dt, camera_position);
    }

    pub fn toggle_viewing(&mut self) {
        self.controller.toggle();
    }

    pub fn is_viewing(&self) -> bool {
        self.controller.is_viewing()
    }

    pub fn is_transitioning(&self) -> bool {
        self.controller.is_transitioning()
    }

    pub fn transform_matrix(&self) -> Mat4 {
        self.controller.transform_matrix()
    }

    pub fn arm_transform_matrix(&self) -> Mat4 {
        self.transform_matrix()
            * Mat4::from_translation(self.arm_offset)
            * Mat4::from_axis_angle(self.arm_rotation_axis.normalize(), std::f32::consts::PI)
            * Mat4::from_scale(Vec3::splat(self.arm_scale))
    }

    pub fn render(&self, frame: &mut FrameContext) {
        frame.draw(DrawCommand::new(
            MeshId::Arm,
            self.arm_transform_matrix(),
            self.skin,
        ));
    }
}
