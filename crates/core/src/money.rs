//! Cent rounding for monetary values.

/// Tolerance for binary floating-point noise (`0.29 * 100 = 28.999…`).
const EPSILON: f64 = 1e-6;

/// Round a monetary amount down to whole cents.
pub fn floor2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    ((value * 100.0) + EPSILON).floor() / 100.0
}

/// Round to two decimals, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor2_truncates_downward() {
        assert_eq!(floor2(10.999), 10.99);
        assert_eq!(floor2(3.141), 3.14);
        assert_eq!(floor2(-1.001), -1.01);
    }

    #[test]
    fn floor2_tolerates_float_noise() {
        assert_eq!(floor2(0.29), 0.29);
        assert_eq!(floor2(1.15), 1.15);
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(33.335_000_1), 33.34);
        assert_eq!(round2(66.664), 66.66);
    }
}
