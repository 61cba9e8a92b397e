//! Color parsing and formatting for the handful of CSS-style colors the
//! viewer uses.

use glam::Vec3;

pub const BLACK: Vec3 = Vec3::ZERO;
pub const WHITE: Vec3 = Vec3::ONE;
pub const ORANGE: Vec3 = Vec3::new(1.0, 165.0 / 255.0, 0.0);

/// Parses `#rrggbb`, `#rgb` or one of the supported color names.
pub fn parse_color(value: &str) -> Option<Vec3> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    let rgb = match value.to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "gray" | "grey" => (128, 128, 128),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "teal" => (0, 128, 128),
        "orange" => (255, 165, 0),
        "blue" => (0, 0, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        _ => return None,
    };
    Some(from_rgb8(rgb.0, rgb.1, rgb.2))
}

/// Formats a color as lowercase `#rrggbb`.
pub fn to_hex(color: Vec3) -> String {
    let [r, g, b] = to_rgb8(color);
    format!("#{r:02x}{g:02x}{b:02x}")
}

pub fn from_rgb8(r: u8, g: u8, b: u8) -> Vec3 {
    Vec3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

fn to_rgb8(color: Vec3) -> [u8; 3] {
    let clamped = color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    [
        clamped.x.round() as u8,
        clamped.y.round() as u8,
        clamped.z.round() as u8,
    ]
}

fn parse_hex(hex: &str) -> Option<Vec3> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(from_rgb8(r, g, b))
        }
        3 => {
            let mut channels = hex
                .chars()
                .filter_map(|ch| ch.to_digit(16))
                .map(|digit| (digit * 17) as u8);
            let r = channels.next()?;
            let g = channels.next()?;
            let b = channels.next()?;
            Some(from_rgb8(r, g, b))
        }
        _ => None,
    }
}
