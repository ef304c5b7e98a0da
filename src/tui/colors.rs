//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;
use crate::task::Category;

/// Header and status bar background.
pub const BRAND: Color = Color::Rgb(79, 70, 229);
/// Focused form field border.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Overdue rows and field errors.
pub const DANGER: Color = Color::Rgb(220, 38, 38);
/// Confirmation dialog background.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const SUCCESS: Color = Color::Rgb(34, 197, 94);

/// Parse a `#rrggbb` color. Anything else yields `None`.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

pub fn category_color(category: &Category) -> Color {
    parse_hex(&category.color).unwrap_or(Color::Gray)
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Rgb(239, 68, 68),
        Priority::Medium => Color::Rgb(245, 158, 11),
        Priority::Low => Color::Rgb(16, 185, 129),
    }
}
