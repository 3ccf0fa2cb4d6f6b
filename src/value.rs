// Rendering of evaluation results for display

pub const DEFAULT_PRECISION: usize = 15;
pub const MIN_PRECISION: usize = 1;
pub const MAX_PRECISION: usize = 20;

// Fixed-point with `precision` digits after the point, minus trailing zeros (and a bare trailing point).
// IEEE special values get names instead.
pub fn format_result(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let mut out = format!("{:.*}", precision, value);
    if out.contains('.') {
        let len = out.trim_end_matches('0').trim_end_matches('.').len();
        out.truncate(len);
    }
    // tiny negative values round to a signed zero
    if out == "-0" {
        out.remove(0);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_results() {
        let test_cases = [
            (13.0, 15, "13"),
            (2.5, 15, "2.5"),
            (-2.5, 15, "-2.5"),
            (0.1 + 0.2, 15, "0.3"),
            (1.0 / 3.0, 15, "0.333333333333333"),
            (1.0 / 3.0, 4, "0.3333"),
            (2.0 / 3.0, 2, "0.67"),
            (0.0, 15, "0"),
            (-0.0, 15, "0"),
            (-1e-20, 15, "0"),
            (1e20, 15, "100000000000000000000"),
            (1234.5, 1, "1234.5"),
            (1234.96, 1, "1235"),
            (f64::NAN, 15, "NaN"),
            (f64::INFINITY, 15, "Infinity"),
            (f64::NEG_INFINITY, 15, "-Infinity"),
        ];
        for (value, precision, expected) in test_cases {
            assert_eq!(format_result(value, precision), expected, "{} at precision {}", value, precision);
        }
    }
}
