//! Decimal odds parsing and point rounding.
//!
//! Odds come from the frontend as strings with either `.` or `,` as the
//! decimal separator (`"1.85"`, `"3,25"`). Points are presented with two
//! decimal places everywhere.

/// Parse a decimal odds value, accepting `.` or `,` as the separator.
///
/// Returns `None` for anything that is not a finite, positive number — the
/// submission guard rejects such batches rather than persisting garbage.
pub fn parse_decimal_odds(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Round a point total to two decimal places for display and ranking.
pub fn round_points(points: f64) -> f64 {
    (points * 100.0).round() / 100.0
}
