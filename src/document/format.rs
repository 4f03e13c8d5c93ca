//! Numeric formatting for the scene document
//!
//! The downstream compiler's parser requires every float to carry a
//! decimal point. Integral values render with exactly one fractional
//! digit; everything else renders at 7-digit precision with trailing
//! zeros trimmed, never below one fractional digit.

/// Render a float for the document.
#[must_use]
pub fn format_f32(value: f32) -> String {
    if !value.is_finite() || value == value.trunc() {
        return format!("{value:.1}");
    }

    let mut s = format!("{value:.7}");
    while s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }
    s
}

/// Render a 0-1 color component as an 8-bit integer.
#[must_use]
pub fn color_byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
