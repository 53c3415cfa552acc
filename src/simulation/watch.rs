use chrono::Timelike;
use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

use crate::rendering::{
    digits, DrawCommand, FrameContext, FrameLight, Material, MeshId, TextureId,
};

/// Heart rate ceiling while running.
const HEART_RATE_MAX: i32 = 220;
/// Resting baseline the idle heart rate trends toward.
const HEART_RATE_REST: i32 = 70;
/// Lower edge of the resting band; below this the rate climbs back up.
const HEART_RATE_LOW: i32 = 60;
/// Sensor cadences in seconds of scene time.
const HEART_CADENCE_RUNNING: f64 = 0.05;
const HEART_CADENCE_IDLE: f64 = 0.1;
const CLOCK_CADENCE: f64 = 1.0;
const BATTERY_CADENCE: f64 = 10.0;
/// ECG scroll wraps modulo this to stay small enough for texture coords.
const ECG_WRAP: f32 = 100.0;
/// Slack on timer comparisons so steps landing exactly on a cadence boundary
/// never miss a tick to float rounding.
const TIMER_SLACK: f64 = 1e-9;

/// Heart rate above which the warning overlay appears.
const HEART_RATE_WARNING: i32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchScreen {
    Clock,
    HeartRate,
    Battery,
}

impl WatchScreen {
    /// Linear order, no wraparound: the right arrow is disabled on Battery.
    pub fn next(self) -> Self {
        match self {
            WatchScreen::Clock => WatchScreen::HeartRate,
            WatchScreen::HeartRate => WatchScreen::Battery,
            WatchScreen::Battery => WatchScreen::Battery,
        }
    }

    /// Linear order, no wraparound: the left arrow is disabled on Clock.
    pub fn prev(self) -> Self {
        match self {
            WatchScreen::Clock => WatchScreen::Clock,
            WatchScreen::HeartRate => WatchScreen::Clock,
            WatchScreen::Battery => WatchScreen::HeartRate,
        }
    }

    fn renderer(self) -> &'static dyn ScreenRenderer {
        match self {
            WatchScreen::Clock => &ClockScreen,
            WatchScreen::HeartRate => &HeartRateScreen,
            WatchScreen::Battery => &BatteryScreen,
        }
    }
}

/// Smartwatch state: screen navigation plus simulated sensors, each on its
/// own wall-clock cadence so update can run every frame at any frame rate.
pub struct Watch {
    current_screen: WatchScreen,

    hours: u8,
    minutes: u8,
    seconds: u8,
    last_time_update: f64,

    heart_rate: i32,
    last_heart_update: f64,
    ecg_scroll_offset: f32,

    battery_percent: i32,
    last_battery_update: f64,

    watch_offset: Vec3,
    content_scale: f32,
}

impl Watch {
    /// Clock seeded from the system time; a one-time read, never persisted.
    pub fn new() -> Self {
        let now = chrono::Local::now();
        Self::with_time(now.hour() as u8, now.minute() as u8, now.second() as u8)
    }

    /// Fixed start time; the constructor used by tests.
    pub fn with_time(hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            current_screen: WatchScreen::Clock,
            hours: hours % 24,
            minutes: minutes % 60,
            seconds: seconds % 60,
            last_time_update: 0.0,
            heart_rate: HEART_RATE_REST,
            last_heart_update: 0.0,
            ecg_scroll_offset: 0.0,
            battery_percent: 100,
            last_battery_update: 0.0,
            watch_offset: Vec3::new(-0.15, 0.0, -0.05),
            content_scale: 0.55,
        }
    }

    /// `now` is elapsed scene time in seconds; sensors fire when their own
    /// last-update timestamp falls far enough behind it.
    pub fn update(&mut self, dt: f32, now: f64, is_running: bool) {
        if now - self.last_time_update >= CLOCK_CADENCE - TIMER_SLACK {
            self.last_time_update = now;
            self.tick_clock();
        }

        let cadence = if is_running {
            HEART_CADENCE_RUNNING
        } else {
            HEART_CADENCE_IDLE
        };
        if now - self.last_heart_update >= cadence - TIMER_SLACK {
            self.last_heart_update = now;
            self.tick_heart_rate(is_running);
        }

        // The ECG strip scrolls continuously, proportional to heart rate.
        let ecg_speed = 0.3 * (self.heart_rate as f32 / HEART_RATE_REST as f32);
        self.ecg_scroll_offset += ecg_speed * dt;
        if self.ecg_scroll_offset > ECG_WRAP {
            self.ecg_scroll_offset -= ECG_WRAP;
        }

        if now - self.last_battery_update >= BATTERY_CADENCE - TIMER_SLACK {
            self.last_battery_update = now;
            self.battery_percent = (self.battery_percent - 1).max(0);
        }
    }

    fn tick_clock(&mut self) {
        self.seconds += 1;
        if self.seconds >= 60 {
            self.seconds = 0;
            self.minutes += 1;
        }
        if self.minutes >= 60 {
            self.minutes = 0;
            self.hours += 1;
        }
        if self.hours >= 24 {
            self.hours = 0;
        }
    }

    fn tick_heart_rate(&mut self, is_running: bool) {
        if is_running {
            if self.heart_rate < HEART_RATE_MAX {
                self.heart_rate += 1;
            }
        } else if self.heart_rate > HEART_RATE_REST {
            self.heart_rate -= 1;
        } else if self.heart_rate < HEART_RATE_LOW {
            self.heart_rate += 1;
        } else {
            // Resting band: small random walk models natural variability.
            self.heart_rate += rand::thread_rng().gen_range(-1..=1);
        }
        self.heart_rate = self.heart_rate.clamp(0, HEART_RATE_MAX);
    }

    pub fn next_screen(&mut self) {
        self.current_screen = self.current_screen.next();
    }

    pub fn prev_screen(&mut self) {
        self.current_screen = self.current_screen.prev();
    }

    pub fn screen(&self) -> WatchScreen {
        self.current_screen
    }

    pub fn heart_rate(&self) -> i32 {
        self.heart_rate
    }

    pub fn battery_percent(&self) -> i32 {
        self.battery_percent
    }

    pub fn time(&self) -> (u8, u8, u8) {
        (self.hours, self.minutes, self.seconds)
    }

    pub fn ecg_scroll_offset(&self) -> f32 {
        self.ecg_scroll_offset
    }

    /// Watch body frame: fixed offset from the hand root, face turned toward
    /// the viewer.
    pub fn body_matrix(&self, hand_matrix: Mat4) -> Mat4 {
        hand_matrix
            * Mat4::from_translation(self.watch_offset)
            * Mat4::from_rotation_y((-90f32).to_radians())
    }

    fn screen_matrix(&self, hand_matrix: Mat4) -> Mat4 {
        self.body_matrix(hand_matrix) * Mat4::from_translation(Vec3::new(0.0, 0.0, 0.021))
    }

    /// World-space point just above the screen face; the lighting system
    /// places the watch-glow light here.
    pub fn screen_position(&self, hand_matrix: Mat4) -> Vec3 {
        (hand_matrix * Mat4::from_translation(self.watch_offset))
            .transform_point3(Vec3::new(0.0, 0.1, -0.02))
    }

    /// Secondary light emitted by the lit screen while it is being viewed.
    pub fn glow_light(&self, hand_matrix: Mat4) -> FrameLight {
        FrameLight {
            position: self.screen_position(hand_matrix),
            ambient: Vec3::new(0.02, 0.03, 0.02),
            diffuse: Vec3::new(0.25, 0.45, 0.3),
            specular: Vec3::new(0.1, 0.2, 0.12),
        }
    }

    /// Arrow anchor points in watch-local (screen) space, for the input
    /// layer's hit regions: (left, right).
    pub fn arrow_anchors(&self) -> (Vec2, Vec2) {
        let x = 0.14 * self.content_scale;
        (Vec2::new(-x, 0.0), Vec2::new(x, 0.0))
    }

    pub fn render(&self, frame: &mut FrameContext, hand_matrix: Mat4) {
        let body = self.body_matrix(hand_matrix);
        frame.draw(DrawCommand::new(
            MeshId::WatchBody,
            body,
            Material::new(Vec3::splat(0.02), Vec3::splat(0.01), Vec3::splat(0.1), 16.0),
        ));

        let screen = self.screen_matrix(hand_matrix);

        // White dial behind all content.
        let dial = screen
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -0.001))
            * Mat4::from_scale(Vec3::new(0.23, 0.23, 1.0));
        frame.draw(DrawCommand::new(
            MeshId::WatchDial,
            dial,
            Material::new(Vec3::splat(0.9), Vec3::splat(0.8), Vec3::splat(0.1), 4.0),
        ));

        // Navigation arrows, hidden at the ends of the screen strip.
        let (left, right) = self.arrow_anchors();
        let arrow_size = 0.04 * self.content_scale;
        if self.current_screen != WatchScreen::Clock {
            draw_quad(
                frame,
                screen,
                TextureId::Arrow,
                left.x,
                left.y,
                arrow_size,
                arrow_size,
                true,
            );
        }
        if self.current_screen != WatchScreen::Battery {
            draw_quad(
                frame,
                screen,
                TextureId::Arrow,
                right.x,
                right.y,
                arrow_size,
                arrow_size,
                false,
            );
        }

        self.current_screen.renderer().render(self, frame, screen);
    }
}

impl Default for Watch {
    fn default() -> Self {
        Self::new()
    }
}

/// Textured UI quad in screen-local space; `flip_x` mirrors the arrow.
fn draw_quad(
    frame: &mut FrameContext,
    parent: Mat4,
    texture: TextureId,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    flip_x: bool,
) {
    let mut scale = Vec3::new(w, h, 1.0);
    if flip_x {
        scale.x = -scale.x;
    }
    let model =
        parent * Mat4::from_translation(Vec3::new(x, y, 0.01)) * Mat4::from_scale(scale);
    frame.draw(
        DrawCommand::new(
            MeshId::Quad,
            model,
            Material::new(Vec3::splat(0.3), Vec3::splat(0.4), Vec3::ZERO, 1.0),
        )
        .textured(texture),
    );
}

/// Per-screen content rendering, selected by the current screen state.
trait ScreenRenderer {
    fn render(&self, watch: &Watch, frame: &mut FrameContext, screen: Mat4);
}

struct ClockScreen;

impl ScreenRenderer for ClockScreen {
    fn render(&self, watch: &Watch, frame: &mut FrameContext, screen: Mat4) {
        let s = watch.content_scale;
        let scale = 0.045 * s;
        let (h, m, sec) = watch.time();
        digits::draw_time(
            frame,
            screen,
            h,
            m,
            sec,
            -digits::time_width(scale) / 2.0,
            -0.02 * s,
            scale,
            Vec3::splat(0.1),
        );
    }
}

struct HeartRateScreen;

impl ScreenRenderer for HeartRateScreen {
    fn render(&self, watch: &Watch, frame: &mut FrameContext, screen: Mat4) {
        let s = watch.content_scale;
        let hr = watch.heart_rate() as f32;

        // Faster and taller trace as the heart rate climbs.
        let repeats = (2.0 + (hr - 60.0) / 150.0 * 2.0).clamp(1.5, 4.0);
        let height_scale = (1.0 + (hr - 70.0) / 150.0 * 0.5).clamp(1.0, 1.5);

        let model = screen
            * Mat4::from_translation(Vec3::new(0.0, -0.05 * s, 0.01))
            * Mat4::from_scale(Vec3::new(0.22 * s, 0.08 * s * height_scale, 1.0));
        frame.draw(
            DrawCommand::new(
                MeshId::Quad,
                model,
                Material::new(
                    Vec3::new(0.0, 0.8, 0.0),
                    Vec3::new(0.0, 0.5, 0.0),
                    Vec3::ZERO,
                    1.0,
                ),
            )
            .textured(TextureId::Ecg)
            .uv_window(
                Vec2::new(watch.ecg_scroll_offset(), 0.0),
                Vec2::new(repeats, 1.0),
            ),
        );

        digits::draw_number(
            frame,
            screen,
            watch.heart_rate().max(0) as u32,
            -0.06 * s,
            0.08 * s,
            0.035 * s,
            Vec3::new(0.8, 0.0, 0.0),
        );

        if watch.heart_rate() > HEART_RATE_WARNING {
            draw_quad(
                frame,
                screen,
                TextureId::Warning,
                0.0,
                0.0,
                0.3 * s,
                0.3 * s,
                false,
            );
        }
    }
}

struct BatteryScreen;

impl ScreenRenderer for BatteryScreen {
    fn render(&self, watch: &Watch, frame: &mut FrameContext, screen: Mat4) {
        let s = watch.content_scale;
        let percent = watch.battery_percent();

        draw_quad(
            frame,
            screen,
            TextureId::Battery,
            0.0,
            0.0,
            0.16 * s,
            0.09 * s,
            false,
        );

        // Charge bar, anchored to the battery glyph's left edge.
        let bar_width = 0.13 * s * (percent as f32 / 100.0);
        let bar_color = if percent < 10 {
            Vec3::new(0.9, 0.0, 0.0)
        } else if percent < 20 {
            Vec3::new(0.9, 0.8, 0.0)
        } else {
            Vec3::new(0.0, 0.8, 0.0)
        };
        if bar_width > 0.0 {
            let model = screen
                * Mat4::from_translation(Vec3::new(-0.065 * s + bar_width / 2.0, 0.0, 0.02))
                * Mat4::from_scale(Vec3::new(bar_width, 0.065 * s, 1.0));
            frame.draw(DrawCommand::new(
                MeshId::Quad,
                model,
                Material::flat(bar_color),
            ));
        }

        let scale = 0.035 * s;
        digits::draw_number(
            frame,
            screen,
            percent.max(0) as u32,
            -0.025 * s,
            0.07 * s,
            scale,
            Vec3::splat(0.1),
        );
        digits::draw_percent(frame, screen, 0.04 * s, 0.07 * s, scale, Vec3::splat(0.1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_navigation_has_no_wraparound() {
        let mut watch = Watch::with_time(12, 0, 0);
        assert_eq!(watch.screen(), WatchScreen::Clock);
        watch.prev_screen();
        assert_eq!(watch.screen(), WatchScreen::Clock, "prev at Clock is a no-op");

        watch.next_screen();
        assert_eq!(watch.screen(), WatchScreen::HeartRate);
        watch.next_screen();
        assert_eq!(watch.screen(), WatchScreen::Battery);
        watch.next_screen();
        assert_eq!(watch.screen(), WatchScreen::Battery, "next at Battery is a no-op");

        watch.prev_screen();
        assert_eq!(watch.screen(), WatchScreen::HeartRate);
        watch.prev_screen();
        assert_eq!(watch.screen(), WatchScreen::Clock);
    }

    #[test]
    fn test_clock_advances_hour_minute_second_over_3661s() {
        let mut watch = Watch::with_time(12, 30, 0);
        for i in 1..=3661 {
            watch.update(1.0, i as f64, false);
        }
        assert_eq!(watch.time(), (13, 31, 1));
    }

    #[test]
    fn test_clock_wraps_at_midnight() {
        let mut watch = Watch::with_time(23, 59, 59);
        watch.update(1.0, 1.0, false);
        assert_eq!(watch.time(), (0, 0, 0));
    }

    #[test]
    fn test_clock_tolerates_variable_frame_rate() {
        // Coarse 0.4s frames: the 1s cadence still ticks roughly once per
        // second of elapsed time, never more.
        let mut watch = Watch::with_time(0, 0, 0);
        let mut now = 0.0;
        for _ in 0..25 {
            now += 0.4;
            watch.update(0.4, now, false);
        }
        let (_, _, s) = watch.time();
        assert!((8..=10).contains(&s), "got {s} ticks over 10s");
    }

    #[test]
    fn test_battery_drains_to_zero_and_floors() {
        let mut watch = Watch::with_time(0, 0, 0);
        assert_eq!(watch.battery_percent(), 100);
        for i in 1..=1000 {
            watch.update(1.0, i as f64, false);
        }
        assert_eq!(watch.battery_percent(), 0);
        // Further drain attempts stay floored.
        for i in 1001..=1100 {
            watch.update(1.0, i as f64, false);
        }
        assert_eq!(watch.battery_percent(), 0);
    }

    #[test]
    fn test_heart_rate_running_ramp() {
        let mut watch = Watch::with_time(0, 0, 0);
        assert_eq!(watch.heart_rate(), 70);
        // 5 seconds at the 0.05s running cadence: exactly 100 increments.
        let mut now = 0.0;
        for _ in 0..100 {
            now += 0.05;
            watch.update(0.05, now, true);
        }
        assert_eq!(watch.heart_rate(), 170);
    }

    #[test]
    fn test_heart_rate_caps_at_220() {
        let mut watch = Watch::with_time(0, 0, 0);
        let mut now = 0.0;
        for _ in 0..10_000 {
            now += 0.05;
            watch.update(0.05, now, true);
        }
        assert_eq!(watch.heart_rate(), 220);
    }

    #[test]
    fn test_heart_rate_decays_toward_resting_band() {
        let mut watch = Watch::with_time(0, 0, 0);
        let mut now = 0.0;
        for _ in 0..3000 {
            now += 0.05;
            watch.update(0.05, now, true);
        }
        assert_eq!(watch.heart_rate(), 220);
        // Idle long enough to settle, then stay inside the jitter band.
        for _ in 0..5000 {
            now += 0.1;
            watch.update(0.1, now, false);
        }
        for _ in 0..1000 {
            now += 0.1;
            watch.update(0.1, now, false);
            let hr = watch.heart_rate();
            assert!((59..=71).contains(&hr), "resting heart rate {hr} out of band");
        }
    }

    #[test]
    fn test_ecg_offset_wraps_and_scales_with_heart_rate() {
        let mut watch = Watch::with_time(0, 0, 0);
        // At resting rate the scroll speed is exactly 0.3/s.
        watch.update(1.0, 0.009, false);
        assert!((watch.ecg_scroll_offset() - 0.3).abs() < 1e-4);

        for i in 0..4000 {
            watch.update(0.1, 0.01 + i as f64 * 1e-6, false);
            assert!(watch.ecg_scroll_offset() <= ECG_WRAP);
            assert!(watch.ecg_scroll_offset() >= 0.0);
        }
    }

    #[test]
    fn test_render_hides_arrows_at_strip_ends() {
        let frame_textures = |watch: &Watch| -> Vec<TextureId> {
            let mut frame = FrameContext::new();
            watch.render(&mut frame, Mat4::IDENTITY);
            frame.commands.iter().filter_map(|c| c.texture).collect()
        };

        let mut watch = Watch::with_time(12, 0, 0);
        let arrows = |t: &[TextureId]| t.iter().filter(|&&t| t == TextureId::Arrow).count();

        assert_eq!(arrows(&frame_textures(&watch)), 1, "Clock: right arrow only");
        watch.next_screen();
        assert_eq!(arrows(&frame_textures(&watch)), 2, "HeartRate: both arrows");
        watch.next_screen();
        assert_eq!(arrows(&frame_textures(&watch)), 1, "Battery: left arrow only");
    }

    #[test]
    fn test_render_emits_body_and_dial_first() {
        let watch = Watch::with_time(12, 0, 0);
        let mut frame = FrameContext::new();
        watch.render(&mut frame, Mat4::IDENTITY);
        assert_eq!(frame.commands[0].mesh, MeshId::WatchBody);
        assert_eq!(frame.commands[1].mesh, MeshId::WatchDial);
        // Clock screen renders digit cells after the chrome.
        assert!(frame.commands.iter().any(|c| c.mesh == MeshId::Cell));
    }

    #[test]
    fn test_battery_screen_bar_color_thresholds() {
        let mut watch = Watch::with_time(0, 0, 0);
        watch.next_screen();
        watch.next_screen();
        assert_eq!(watch.screen(), WatchScreen::Battery);

        let bar_color = |watch: &Watch| -> Option<Vec3> {
            let mut frame = FrameContext::new();
            watch.render(&mut frame, Mat4::IDENTITY);
            frame
                .commands
                .iter()
                .find(|c| c.mesh == MeshId::Quad && c.texture.is_none())
                .map(|c| c.material.diffuse)
        };

        assert_eq!(bar_color(&watch), Some(Vec3::new(0.0, 0.8, 0.0)));
        watch.battery_percent = 15;
        assert_eq!(bar_color(&watch), Some(Vec3::new(0.9, 0.8, 0.0)));
        watch.battery_percent = 5;
        assert_eq!(bar_color(&watch), Some(Vec3::new(0.9, 0.0, 0.0)));
        watch.battery_percent = 0;
        assert_eq!(bar_color(&watch), None, "empty battery draws no bar");
    }

    #[test]
    fn test_warning_overlay_above_200_bpm() {
        let mut watch = Watch::with_time(0, 0, 0);
        watch.next_screen();
        watch.heart_rate = 201;
        let mut frame = FrameContext::new();
        watch.render(&mut frame, Mat4::IDENTITY);
        assert!(frame
            .commands
            .iter()
            .any(|c| c.texture == Some(TextureId::Warning)));

        watch.heart_rate = 200;
        let mut frame = FrameContext::new();
        watch.render(&mut frame, Mat4::IDENTITY);
        assert!(!frame
            .commands
            .iter()
            .any(|c| c.texture == Some(TextureId::Warning)));
    }

    #[test]
    fn test_screen_position_follows_hand_transform() {
        let watch = Watch::with_time(0, 0, 0);
        let at_origin = watch.screen_position(Mat4::IDENTITY);
        let moved = watch.screen_position(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert!((moved - at_origin - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_arrow_anchors_symmetric() {
        let watch = Watch::with_time(0, 0, 0);
        let (left, right) = watch.arrow_anchors();
        assert_eq!(left.x, -right.x);
        assert_eq!(left.y, right.y);
        assert!(right.x > 0.0);
    }
}
