//! Numeric helpers

/// Round to `places` decimal digits.
///
/// Rounds the exact binary value of `value`, so `1.005` (stored just below
/// 1.005) becomes `1.0` rather than `1.01`.
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Render a float the way the metrics panel shows it: shortest form,
/// always with a fractional part (`1.0`, `2.57`).
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}
