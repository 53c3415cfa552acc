use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Scene tuning. Every constant that varied between revisions of the original
/// scene lives here with one consistent set of values; a JSON file passed as
/// the first CLI argument overrides individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // Window
    pub window_width: u32,
    pub window_height: u32,
    /// Optional FPS cap; `None` leaves pacing to vsync.
    pub frame_cap: Option<u32>,

    // Camera
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub start_position: [f32; 3],
    /// Vertical clamp band while walking (head-bob range).
    pub walk_height_min: f32,
    pub walk_height_max: f32,
    /// Vertical clamp band in free-fly mode.
    pub free_height_min: f32,
    pub free_height_max: f32,
    pub mouse_height_sensitivity: f32,
    /// Free-look sensitivity, degrees per pixel of mouse motion.
    pub look_sensitivity: f32,
    pub free_move_speed: f32,
    pub bobbing_speed: f32,
    pub bobbing_amount: f32,

    // Hand
    pub hand_transition_speed: f32,
    pub hand_normal_offset: [f32; 3],
    pub hand_viewing_offset: [f32; 3],

    // Street
    pub run_speed: f32,
    pub segment_length: f32,
    pub num_segments: usize,
    pub road_width: f32,
    /// Distance past the camera at which a road segment recycles.
    pub recycle_margin: f32,
    pub num_buildings: usize,
    pub building_spacing: f32,
    pub building_lane_x: f32,
    pub building_recycle_margin: f32,

    // Atmosphere
    pub fog_color: [f32; 3],
    pub fog_density: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_width: 1200,
            window_height: 800,
            frame_cap: None,

            fov_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 100.0,
            start_position: [0.0, 1.6, 5.0],
            walk_height_min: 1.3,
            walk_height_max: 1.8,
            free_height_min: 0.5,
            free_height_max: 50.0,
            mouse_height_sensitivity: 0.005,
            look_sensitivity: 0.1,
            free_move_speed: 4.0,
            bobbing_speed: 8.0,
            bobbing_amount: 0.05,

            hand_transition_speed: 3.0,
            hand_normal_offset: [0.5, -0.6, -0.7],
            hand_viewing_offset: [0.0, 0.0, -0.6],

            run_speed: 5.0,
            segment_length: 10.0,
            num_segments: 5,
            road_width: 5.0,
            recycle_margin: 0.5,
            num_buildings: 10,
            building_spacing: 15.0,
            building_lane_x: 8.0,
            building_recycle_margin: 5.0,

            fog_color: [0.62, 0.66, 0.72],
            fog_density: 0.02,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.as_ref().display()))?;
        serde_json::from_str(&text).context("failed to parse config JSON")
    }

    /// Loads the override file if a path was given, otherwise defaults.
    /// A broken file is logged and ignored rather than aborting startup.
    pub fn load_or_default(path: Option<&str>) -> Self {
        match path {
            Some(p) => match Self::load(p) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("ignoring config {}: {:#}", p, e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"bobbing_amount": 0.1}"#).unwrap();
        assert_eq!(cfg.bobbing_amount, 0.1);
        assert_eq!(cfg.num_segments, Config::default().num_segments);
        assert_eq!(cfg.walk_height_min, 1.3);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let cfg = Config::load_or_default(Some("/nonexistent/config.json"));
        assert_eq!(cfg.segment_length, Config::default().segment_length);
    }
}
