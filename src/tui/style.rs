//! Color constants and formatting helpers for the TUI.

use ratatui::style::Color;

/// Power event sparkline color.
pub const POWER_COLOR: Color = Color::Cyan;
/// Price event sparkline color.
pub const PRICE_COLOR: Color = Color::Yellow;
/// Scrub gauge color.
pub const SCRUB_COLOR: Color = Color::Green;
/// Row highlight for the entity changed last.
pub const HIGHLIGHT: Color = Color::Magenta;
/// Link flowing in the declared direction.
pub const FLOW_FORWARD: Color = Color::Green;
/// Link flowing against the declared direction.
pub const FLOW_REVERSE: Color = Color::Red;
/// Idle link.
pub const FLOW_IDLE: Color = Color::DarkGray;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;

/// Color for a link given its power and whether the first endpoint sourced it.
pub fn flow_color(power: f64, from_first: bool) -> Color {
    if power == 0.0 || power.is_nan() {
        FLOW_IDLE
    } else if from_first {
        FLOW_FORWARD
    } else {
        FLOW_REVERSE
    }
}

/// Formats a power value in watts, switching to kW above 10 kW.
pub fn watts(power: f64) -> String {
    if power.is_nan() {
        "-".to_string()
    } else if power.abs() >= 10_000.0 {
        format!("{:.1} kW", power / 1000.0)
    } else {
        format!("{power:.0} W")
    }
}
