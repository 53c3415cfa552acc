use glam::{Mat4, Vec3};

use crate::config::Config;
use crate::rendering::meshes::BUILDING_KINDS;
use crate::rendering::{DrawCommand, FrameContext, Material, MeshId, TextureId};

/// Anything that rides the treadmill: exposes its forward (Z) coordinate for
/// the shared recycling pass.
pub trait TrackedObject {
    fn forward(&self) -> f32;
    fn set_forward(&mut self, z: f32);
}

impl TrackedObject for f32 {
    fn forward(&self) -> f32 {
        *self
    }
    fn set_forward(&mut self, z: f32) {
        *self = z;
    }
}

/// One skyline building: world position plus purely cosmetic scale and
/// silhouette index.
#[derive(Clone, Copy, Debug)]
pub struct Building {
    pub position: Vec3,
    pub scale: f32,
    pub kind: usize,
}

impl TrackedObject for Building {
    fn forward(&self) -> f32 {
        self.position.z
    }
    fn set_forward(&mut self, z: f32) {
        self.position.z = z;
    }
}

/// Treadmill step shared by both rings: advance every object, then relocate
/// each one past `threshold` to one spacing behind the current rearmost.
/// The tracked minimum updates after every relocation, so several objects
/// wrapping in a single frame still land in a contiguous, gap-free line.
pub fn advance_ring<T: TrackedObject>(
    objects: &mut [T],
    movement: f32,
    threshold: f32,
    spacing: f32,
) {
    if objects.is_empty() {
        return;
    }
    for obj in objects.iter_mut() {
        let z = obj.forward() + movement;
        obj.set_forward(z);
    }
    let mut rearmost = objects
        .iter()
        .map(TrackedObject::forward)
        .fold(f32::INFINITY, f32::min);
    for obj in objects.iter_mut() {
        if obj.forward() > threshold {
            let recycled = rearmost - spacing;
            obj.set_forward(recycled);
            rearmost = recycled;
        }
    }
}

/// The infinite-road illusion: a fixed ring of road segments and a fixed ring
/// of buildings trail the camera, recycled front-to-back while running.
pub struct RunningSimulation {
    running: bool,
    speed: f32,
    segment_length: f32,
    num_segments: usize,
    recycle_margin: f32,

    num_buildings: usize,
    building_spacing: f32,
    building_recycle_margin: f32,
    building_lane_x: f32,

    segment_positions: Vec<f32>,
    buildings: Vec<Building>,
}

impl RunningSimulation {
    pub fn new(config: &Config) -> Self {
        let mut sim = Self {
            running: false,
            speed: config.run_speed,
            segment_length: config.segment_length,
            num_segments: config.num_segments,
            recycle_margin: config.recycle_margin,
            num_buildings: config.num_buildings,
            building_spacing: config.building_spacing,
            building_recycle_margin: config.building_recycle_margin,
            building_lane_x: config.building_lane_x,
            segment_positions: Vec::new(),
            buildings: Vec::new(),
        };
        sim.reset();
        sim
    }

    /// Restores the initial contiguous layout for both rings.
    pub fn reset(&mut self) {
        self.segment_positions = (0..self.num_segments)
            .map(|i| -(i as f32) * self.segment_length)
            .collect();

        self.buildings = (0..self.num_buildings)
            .map(|i| {
                let side = if i % 2 == 0 { 1.0 } else { -1.0 };
                Building {
                    position: Vec3::new(
                        side * self.building_lane_x,
                        0.0,
                        -10.0 - (i as f32) * self.building_spacing,
                    ),
                    scale: 0.4 + 0.1 * (i % 3) as f32,
                    kind: i % BUILDING_KINDS,
                }
            })
            .collect();
    }

    /// Advances both rings while running; frozen world otherwise.
    pub fn update(&mut self, dt: f32, running: bool, camera_z: f32) {
        self.running = running;
        if !running {
            return;
        }
        let movement = self.speed * dt;
        advance_ring(
            &mut self.segment_positions,
            movement,
            camera_z + self.recycle_margin,
            self.segment_length,
        );
        advance_ring(
            &mut self.buildings,
            movement,
            camera_z + self.building_recycle_margin,
            self.building_spacing,
        );
    }

    pub fn segment_positions(&self) -> &[f32] {
        &self.segment_positions
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

struct StreetMaterials {
    ground: Material,
    road: Material,
    building: Material,
}

/// Owns the running simulation plus the ground/road/building draw submission.
pub struct Street {
    pub simulation: RunningSimulation,
    materials: StreetMaterials,
}

impl Street {
    pub fn new(config: &Config) -> Self {
        Self {
            simulation: RunningSimulation::new(config),
            materials: StreetMaterials {
                ground: Material::new(
                    Vec3::new(0.2, 0.6, 0.15),
                    Vec3::new(0.1, 0.25, 0.08),
                    Vec3::splat(0.02),
                    2.0,
                ),
                road: Material::new(Vec3::splat(0.6), Vec3::splat(0.25), Vec3::splat(0.1), 4.0),
                building: Material::new(
                    Vec3::new(0.6, 0.55, 0.5),
                    Vec3::new(0.4, 0.38, 0.35),
                    Vec3::splat(0.2),
                    16.0,
                ),
            },
        }
    }

    pub fn update(&mut self, dt: f32, running: bool, camera_z: f32) {
        self.simulation.update(dt, running, camera_z);
    }

    pub fn render(&self, frame: &mut FrameContext) {
        frame.draw(DrawCommand::new(MeshId::Ground, Mat4::IDENTITY, self.materials.ground).fogged());

        for &z in self.simulation.segment_positions() {
            // Slightly above the ground plane to avoid z-fighting.
            let model = Mat4::from_translation(Vec3::new(0.0, 0.01, z));
            frame.draw(
                DrawCommand::new(MeshId::RoadSegment, model, self.materials.road)
                    .textured(TextureId::Road)
                    .fogged(),
            );
        }

        for building in self.simulation.buildings() {
            let model = Mat4::from_translation(building.position)
                * Mat4::from_scale(Vec3::splat(building.scale));
            frame.draw(
                DrawCommand::new(
                    MeshId::Building(building.kind),
                    model,
                    self.materials.building,
                )
                .fogged(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERA_Z: f32 = 5.0;

    fn simulation() -> RunningSimulation {
        RunningSimulation::new(&Config::default())
    }

    fn max_gap(positions: &[f32]) -> f32 {
        let mut sorted = positions.to_vec();
        sorted.sort_by(f32::total_cmp);
        sorted
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(0.0f32, f32::max)
    }

    #[test]
    fn test_initial_layout_is_contiguous() {
        let sim = simulation();
        assert_eq!(sim.segment_positions().len(), 5);
        assert!((max_gap(sim.segment_positions()) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_update_noop_while_not_running() {
        let mut sim = simulation();
        let before = sim.segment_positions().to_vec();
        let buildings_before: Vec<f32> =
            sim.buildings().iter().map(|b| b.position.z).collect();
        sim.update(10.0, false, CAMERA_Z);
        assert_eq!(sim.segment_positions(), before.as_slice());
        let after: Vec<f32> = sim.buildings().iter().map(|b| b.position.z).collect();
        assert_eq!(after, buildings_before);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_segment_count_and_gap_invariant_over_long_run() {
        let mut sim = simulation();
        let count = sim.segment_positions().len();
        for _ in 0..10_000 {
            sim.update(0.016, true, CAMERA_Z);
            assert_eq!(sim.segment_positions().len(), count);
            let gap = max_gap(sim.segment_positions());
            assert!(
                gap <= sim.segment_length + 1e-3,
                "gap {gap} exceeds segment length"
            );
            for &z in sim.segment_positions() {
                assert!(z <= CAMERA_Z + sim.recycle_margin + 1e-3);
            }
        }
    }

    #[test]
    fn test_multiple_wraps_in_one_frame_stay_contiguous() {
        let mut sim = simulation();
        // One enormous step pushes several segments past the camera at once.
        sim.update(8.0, true, CAMERA_Z);
        assert_eq!(sim.segment_positions().len(), 5);
        let gap = max_gap(sim.segment_positions());
        assert!(gap <= sim.segment_length + 1e-3, "gap {gap}");

        // No two segments may overlap either.
        let mut sorted = sim.segment_positions().to_vec();
        sorted.sort_by(f32::total_cmp);
        for w in sorted.windows(2) {
            assert!(w[1] - w[0] >= sim.segment_length - 1e-3);
        }
    }

    #[test]
    fn test_buildings_keep_kind_and_scale_across_recycling() {
        let mut sim = simulation();
        let tagged: Vec<(usize, f32)> = sim.buildings().iter().map(|b| (b.kind, b.scale)).collect();
        for _ in 0..5_000 {
            sim.update(0.033, true, CAMERA_Z);
        }
        let after: Vec<(usize, f32)> = sim.buildings().iter().map(|b| (b.kind, b.scale)).collect();
        assert_eq!(tagged, after);
        // Lanes never change: buildings stay on their side of the road.
        for b in sim.buildings() {
            assert!(b.position.x.abs() > 1.0);
        }
    }

    #[test]
    fn test_reset_restores_initial_layout() {
        let mut sim = simulation();
        let initial = sim.segment_positions().to_vec();
        for _ in 0..100 {
            sim.update(0.1, true, CAMERA_Z);
        }
        assert_ne!(sim.segment_positions(), initial.as_slice());
        sim.reset();
        assert_eq!(sim.segment_positions(), initial.as_slice());
    }

    #[test]
    fn test_street_render_emits_ground_segments_buildings() {
        let street = Street::new(&Config::default());
        let mut frame = FrameContext::new();
        street.render(&mut frame);
        let expected = 1 + 5 + Config::default().num_buildings;
        assert_eq!(frame.commands.len(), expected);
        assert_eq!(frame.commands[0].mesh, MeshId::Ground);
        assert!(frame.commands.iter().all(|c| c.fog));
        assert_eq!(
            frame
                .commands
                .iter()
                .filter(|c| c.mesh == MeshId::RoadSegment)
                .count(),
            5
        );
    }
}
