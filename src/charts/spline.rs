//! Spline smoothing for line traces.

/// Interpolated points inserted between two data points
pub const SPLINE_STEPS: usize = 16;

/// Catmull-Rom interpolation through every point of `points`.
///
/// The curve passes through each input point; end tangents reuse the first
/// and last points. Fewer than three points are returned unchanged.
pub fn catmull_rom(points: &[(f64, f64)], steps: usize) -> Vec<(f64, f64)> {
    if points.len() < 3 || steps == 0 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut out = Vec::with_capacity(last * steps + 1);

    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        for step in 0..steps {
            let t = step as f64 / steps as f64;
            out.push((
                blend(p0.0, p1.0, p2.0, p3.0, t),
                blend(p0.1, p1.1, p2.1, p3.1, t),
            ));
        }
    }
    out.push(points[last]);

    out
}

fn blend(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_data_points() {
        let points = [(0.0, 20.0), (1.0, 30.0), (2.0, 10.0), (3.0, 50.0)];
        let curve = catmull_rom(&points, 4);

        assert_eq!(curve.len(), 3 * 4 + 1);
        for (i, point) in points.iter().enumerate() {
            let sample = curve[i * 4];
            assert!((sample.0 - point.0).abs() < 1e-9);
            assert!((sample.1 - point.1).abs() < 1e-9);
        }
    }

    #[test]
    fn straight_line_stays_straight() {
        let points = [(0.0, 0.0), (1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        for (x, y) in catmull_rom(&points, 8) {
            assert!((y - 2.0 * x).abs() < 1e-9);
        }
    }

    #[test]
    fn short_input_is_untouched() {
        let points = [(0.0, 1.0), (1.0, 5.0)];
        assert_eq!(catmull_rom(&points, 16), points.to_vec());
    }
}
