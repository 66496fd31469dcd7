//! Colour themes for pieces and grid cells.

use rand::Rng;
use ratatui::style::Color;

/// A fill/stroke colour pair. The fill paints occupied cells and particles,
/// the stroke is the matching dark outline tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub fill: Color,
    pub stroke: Color,
}

/// Palette pieces draw from. One theme is picked per tray refill so a whole
/// set shares its colour.
pub const PALETTE: [Theme; 8] = [
    Theme { fill: Color::Rgb(120, 190, 255), stroke: Color::Rgb(18, 18, 26) },
    Theme { fill: Color::Rgb(255, 220, 110), stroke: Color::Rgb(26, 20, 14) },
    Theme { fill: Color::Rgb(160, 240, 170), stroke: Color::Rgb(18, 26, 18) },
    Theme { fill: Color::Rgb(255, 140, 160), stroke: Color::Rgb(26, 18, 22) },
    Theme { fill: Color::Rgb(190, 160, 255), stroke: Color::Rgb(20, 18, 26) },
    Theme { fill: Color::Rgb(255, 180, 120), stroke: Color::Rgb(26, 20, 18) },
    Theme { fill: Color::Rgb(140, 240, 240), stroke: Color::Rgb(16, 24, 26) },
    Theme { fill: Color::Rgb(240, 240, 140), stroke: Color::Rgb(26, 26, 18) },
];

/// Pick a uniformly random palette entry.
pub fn random_theme<R: Rng>(rng: &mut R) -> Theme {
    PALETTE[rng.gen_range(0..PALETTE.len())]
}
