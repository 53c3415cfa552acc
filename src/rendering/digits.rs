//! Procedural seven-segment digit rendering. No font assets: every glyph is
//! a handful of scaled unit-cell quads submitted through the frame context.

use glam::{Mat4, Vec3};

use super::{DrawCommand, FrameContext, Material, MeshId};

/// Segment bitmasks per digit. Bit order: 0 top, 1 top-right, 2 bottom-right,
/// 3 bottom, 4 bottom-left, 5 top-left, 6 middle.
const DIGIT_SEGMENTS: [u8; 10] = [
    0x3F, // 0
    0x06, // 1
    0x5B, // 2
    0x4F, // 3
    0x66, // 4
    0x6D, // 5
    0x7D, // 6
    0x07, // 7
    0x7F, // 8
    0x6F, // 9
];

/// Horizontal advance between glyphs, in multiples of the glyph scale.
pub const GLYPH_ADVANCE: f32 = 0.6;
/// Advance after a colon.
pub const COLON_ADVANCE: f32 = 0.3;

pub fn segment_count(digit: u8) -> u32 {
    DIGIT_SEGMENTS[digit as usize % 10].count_ones()
}

fn draw_cell(frame: &mut FrameContext, parent: Mat4, x: f32, y: f32, w: f32, h: f32, color: Vec3) {
    let model = parent
        * Mat4::from_translation(Vec3::new(x, y, 0.02))
        * Mat4::from_scale(Vec3::new(w, h, 1.0));
    frame.draw(DrawCommand::new(MeshId::Cell, model, Material::flat(color)));
}

pub fn draw_digit(
    frame: &mut FrameContext,
    parent: Mat4,
    digit: u8,
    x: f32,
    y: f32,
    scale: f32,
    color: Vec3,
) {
    let mask = DIGIT_SEGMENTS[digit as usize % 10];
    let t = 0.1 * scale;
    let w = 0.5 * scale;
    let h = 1.0 * scale;
    let sh = h / 2.0;

    let segments = [
        (x, y + h - t, w, t),          // top
        (x + w - t, y + sh, t, sh),    // top-right
        (x + w - t, y, t, sh),         // bottom-right
        (x, y, w, t),                  // bottom
        (x, y, t, sh),                 // bottom-left
        (x, y + sh, t, sh),            // top-left
        (x, y + sh - t / 2.0, w, t),   // middle
    ];
    for (i, &(sx, sy, sw, sth)) in segments.iter().enumerate() {
        if mask & (1 << i) != 0 {
            draw_cell(frame, parent, sx, sy, sw, sth, color);
        }
    }
}

pub fn draw_colon(
    frame: &mut FrameContext,
    parent: Mat4,
    x: f32,
    y: f32,
    scale: f32,
    color: Vec3,
) {
    let size = 0.1 * scale;
    let h = scale;
    draw_cell(frame, parent, x, y + 0.6 * h, size, size, color);
    draw_cell(frame, parent, x, y + 0.3 * h, size, size, color);
}

pub fn draw_percent(
    frame: &mut FrameContext,
    parent: Mat4,
    x: f32,
    y: f32,
    scale: f32,
    color: Vec3,
) {
    let size = 0.1 * scale;
    let h = scale;
    let w = 0.5 * scale;
    draw_cell(frame, parent, x, y + 0.2 * h, size, size, color);
    draw_cell(frame, parent, x + w, y + 0.8 * h, size, size, color);
}

/// Draws a non-negative integer left-to-right starting at `x`.
pub fn draw_number(
    frame: &mut FrameContext,
    parent: Mat4,
    number: u32,
    x: f32,
    y: f32,
    scale: f32,
    color: Vec3,
) {
    let mut cursor = x;
    // Yields most-significant digit first.
    let mut divisor = 1;
    while number / divisor >= 10 {
        divisor *= 10;
    }
    while divisor > 0 {
        let digit = (number / divisor) % 10;
        draw_digit(frame, parent, digit as u8, cursor, y, scale, color);
        cursor += GLYPH_ADVANCE * scale;
        divisor /= 10;
    }
}

/// HH:MM:SS with zero padding.
pub fn draw_time(
    frame: &mut FrameContext,
    parent: Mat4,
    hours: u8,
    minutes: u8,
    seconds: u8,
    x: f32,
    y: f32,
    scale: f32,
    color: Vec3,
) {
    let advance = GLYPH_ADVANCE * scale;
    let colon_advance = COLON_ADVANCE * scale;
    let mut cursor = x;

    for (value, trailing_colon) in [(hours, true), (minutes, true), (seconds, false)] {
        draw_digit(frame, parent, value / 10, cursor, y, scale, color);
        cursor += advance;
        draw_digit(frame, parent, value % 10, cursor, y, scale, color);
        cursor += advance;
        if trailing_colon {
            draw_colon(frame, parent, cursor, y, scale, color);
            cursor += colon_advance;
        }
    }
}

/// Total width of the HH:MM:SS layout, for centering.
pub fn time_width(scale: f32) -> f32 {
    (6.0 * GLYPH_ADVANCE + 2.0 * COLON_ADVANCE) * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::FrameContext;

    fn count_for(f: impl FnOnce(&mut FrameContext)) -> usize {
        let mut frame = FrameContext::new();
        f(&mut frame);
        frame.commands.len()
    }

    #[test]
    fn test_digit_segment_counts() {
        assert_eq!(segment_count(8), 7);
        assert_eq!(segment_count(1), 2);
        assert_eq!(segment_count(0), 6);
        assert_eq!(segment_count(4), 4);
    }

    #[test]
    fn test_draw_digit_emits_one_command_per_segment() {
        for d in 0u8..10 {
            let n = count_for(|f| draw_digit(f, Mat4::IDENTITY, d, 0.0, 0.0, 1.0, Vec3::ONE));
            assert_eq!(n as u32, segment_count(d));
        }
    }

    #[test]
    fn test_draw_number_multi_digit() {
        // 100 -> 1, 0, 0
        let n = count_for(|f| draw_number(f, Mat4::IDENTITY, 100, 0.0, 0.0, 1.0, Vec3::ONE));
        assert_eq!(n as u32, segment_count(1) + 2 * segment_count(0));
        // single digit
        let n = count_for(|f| draw_number(f, Mat4::IDENTITY, 7, 0.0, 0.0, 1.0, Vec3::ONE));
        assert_eq!(n as u32, segment_count(7));
    }

    #[test]
    fn test_draw_time_emits_six_digits_and_two_colons() {
        let n = count_for(|f| {
            draw_time(f, Mat4::IDENTITY, 12, 30, 59, 0.0, 0.0, 1.0, Vec3::ONE);
        });
        let expected = segment_count(1)
            + segment_count(2)
            + segment_count(3)
            + segment_count(0)
            + segment_count(5)
            + segment_count(9)
            + 2 * 2;
        assert_eq!(n as u32, expected);
    }

    #[test]
    fn test_all_digit_glyphs_within_cell_bounds() {
        // Every segment rectangle must stay inside the glyph cell [0, 0.5] x [0, 1].
        for d in 0u8..10 {
            let mut frame = FrameContext::new();
            draw_digit(&mut frame, Mat4::IDENTITY, d, 0.0, 0.0, 1.0, Vec3::ONE);
            for cmd in &frame.commands {
                let origin = cmd.model.transform_point3(glam::Vec3::ZERO);
                let corner = cmd.model.transform_point3(glam::Vec3::new(1.0, 1.0, 0.0));
                assert!(origin.x >= -1e-5 && corner.x <= 0.5 + 1e-5);
                assert!(origin.y >= -1e-5 && corner.y <= 1.0 + 1e-5);
            }
        }
    }
}
