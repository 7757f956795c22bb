//! Color Palette Module
//! Default trace colors and parsing of user supplied color strings.

use plotters::style::RGBColor;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid color '{0}': expected #rgb, #rrggbb, rgb(r, g, b) or a color name")]
    Invalid(String),
}

/// Default colorway, cycled by trace or slice position
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(99, 110, 250),  // Blue
    RGBColor(239, 85, 59),   // Red
    RGBColor(0, 204, 150),   // Green
    RGBColor(171, 99, 250),  // Purple
    RGBColor(255, 161, 90),  // Orange
    RGBColor(25, 211, 243),  // Cyan
    RGBColor(255, 102, 146), // Pink
    RGBColor(182, 232, 128), // Light Green
    RGBColor(255, 151, 255), // Light Pink
    RGBColor(254, 203, 82),  // Yellow
];

/// Horizontal grid lines
pub const GRID_COLOR: RGBColor = RGBColor(225, 225, 225);

const NAMED: [(&str, RGBColor); 24] = [
    ("black", RGBColor(0, 0, 0)),
    ("white", RGBColor(255, 255, 255)),
    ("red", RGBColor(255, 0, 0)),
    ("green", RGBColor(0, 128, 0)),
    ("lime", RGBColor(0, 255, 0)),
    ("blue", RGBColor(0, 0, 255)),
    ("yellow", RGBColor(255, 255, 0)),
    ("cyan", RGBColor(0, 255, 255)),
    ("aqua", RGBColor(0, 255, 255)),
    ("magenta", RGBColor(255, 0, 255)),
    ("fuchsia", RGBColor(255, 0, 255)),
    ("gray", RGBColor(128, 128, 128)),
    ("grey", RGBColor(128, 128, 128)),
    ("silver", RGBColor(192, 192, 192)),
    ("maroon", RGBColor(128, 0, 0)),
    ("olive", RGBColor(128, 128, 0)),
    ("navy", RGBColor(0, 0, 128)),
    ("purple", RGBColor(128, 0, 128)),
    ("teal", RGBColor(0, 128, 128)),
    ("orange", RGBColor(255, 165, 0)),
    ("pink", RGBColor(255, 192, 203)),
    ("brown", RGBColor(165, 42, 42)),
    ("gold", RGBColor(255, 215, 0)),
    ("indigo", RGBColor(75, 0, 130)),
];

/// Get the default color for a position.
pub fn default_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Parse a color string. An empty string means "no explicit color".
pub fn parse_color(input: &str) -> Result<Option<RGBColor>, ColorError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid = || ColorError::Invalid(input.to_string());
    let lower = trimmed.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).map(Some).ok_or_else(invalid);
    }

    if let Some(body) = lower
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<u8> = body
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        return match channels.as_slice() {
            [r, g, b] => Ok(Some(RGBColor(*r, *g, *b))),
            _ => Err(invalid()),
        };
    }

    NAMED
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, color)| Some(*color))
        .ok_or_else(invalid)
}

/// Resolve an optional list entry to a color, falling back to the palette.
pub fn color_or_default(entry: Option<&String>, index: usize) -> Result<RGBColor, ColorError> {
    match entry {
        Some(raw) => Ok(parse_color(raw)?.unwrap_or_else(|| default_color(index))),
        None => Ok(default_color(index)),
    }
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(RGBColor(digit(0)?, digit(1)?, digit(2)?))
        }
        6 => {
            let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(RGBColor(pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}
