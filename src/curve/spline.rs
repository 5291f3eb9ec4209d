//! Bézier and B-spline sampling.

use crate::vector::Vec3;

/// Adaptively samples a cubic Bézier by recursive de Casteljau subdivision,
/// stopping when both control points are within `tolerance` of the chord
/// (the flatness predicate).
#[must_use]
pub fn sample_cubic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, tolerance: f64) -> Vec<Vec3> {
    let mut out = Vec::new();
    subdivide_cubic(p0, p1, p2, p3, tolerance, 0, &mut out);
    out.push(p3);
    out
}

const MAX_SUBDIVISION_DEPTH: u32 = 24;

fn subdivide_cubic(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, tolerance: f64, depth: u32, out: &mut Vec<Vec3>) {
    if depth >= MAX_SUBDIVISION_DEPTH || is_flat(p0, p1, p2, p3, tolerance) {
        out.push(p0);
        return;
    }

    // de Casteljau split at t = 0.5.
    let p01 = p0.lerp(p1, 0.5);
    let p12 = p1.lerp(p2, 0.5);
    let p23 = p2.lerp(p3, 0.5);
    let p012 = p01.lerp(p12, 0.5);
    let p123 = p12.lerp(p23, 0.5);
    let mid = p012.lerp(p123, 0.5);

    subdivide_cubic(p0, p01, p012, mid, tolerance, depth + 1, out);
    out.push(mid);
    subdivide_cubic(mid, p123, p23, p3, tolerance, depth + 1, out);
}

fn is_flat(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, tolerance: f64) -> bool {
    perpendicular_distance(p1, p0, p3) <= tolerance && perpendicular_distance(p2, p0, p3) <= tolerance
}

/// Segment-clamped perpendicular distance, shared with the RDP simplifier;
/// duplicated here rather than exposed as a dependency edge since both
/// places independently need the same formula.
fn perpendicular_distance(p: Vec3, a: Vec3, b: Vec3) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Promotes a quadratic Bézier to cubic control points via the standard
/// formula, then samples it the same way.
#[must_use]
pub fn sample_quadratic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, tolerance: f64) -> Vec<Vec3> {
    let cp1 = p0 + (p1 - p0) * (2.0 / 3.0);
    let cp2 = p2 + (p1 - p2) * (2.0 / 3.0);
    sample_cubic_bezier(p0, cp1, cp2, p2, tolerance)
}

/// Policy for the open knot-division-by-zero case in the de Boor–Cox basis
/// recursion. This implementation adds a tiny
/// epsilon to the denominator rather than skipping the term, so the basis
/// functions stay continuous as knots coincide instead of dropping a term
/// discontinuously.
const KNOT_DIVISION_EPSILON: f64 = 1e-12;

/// Samples a uniform B-spline of degree `d` at `k` uniform parameter steps
/// via de Boor–Cox basis functions. If `control.len() < d + 1` the controls
/// are returned unchanged (the curve is under-determined).
#[must_use]
pub fn sample_uniform_bspline(control: &[Vec3], degree: usize, k: usize) -> Vec<Vec3> {
    let n = control.len();
    if n < degree + 1 {
        return control.to_vec();
    }

    let knots = build_open_knot_vector(n, degree);
    let k = k.max(2);

    let u_start = knots[degree];
    let u_end = knots[n]; // last knot, given n+d+2 entries; see build_open_knot_vector.

    (0..k)
        .map(|i| {
            let t = i as f64 / (k - 1) as f64;
            let u = u_start + t * (u_end - u_start);
            evaluate_bspline_point(control, &knots, degree, u)
        })
        .collect()
}

/// Builds the `n + d + 2`-entry open/clamped knot vector: `d+1` leading
/// zeros, interior knots `(i-d)/(n-d+1)` for `d < i <= n`, and trailing
/// knots fixed at `1`.
fn build_open_knot_vector(n: usize, d: usize) -> Vec<f64> {
    let n = n - 1; // here `n` is `|control| - 1`
    let count = n + d + 2;
    let mut knots = vec![0.0; count];
    for i in (d + 1)..count {
        if i <= n {
            knots[i] = (i as f64 - d as f64) / (n as f64 - d as f64 + 1.0);
        } else {
            knots[i] = 1.0;
        }
    }
    knots
}

fn find_knot_span(n: usize, degree: usize, u: f64, knots: &[f64]) -> usize {
    for i in degree..n {
        if u < knots[i + 1] {
            return i;
        }
    }
    n
}

fn evaluate_bspline_point(control: &[Vec3], knots: &[f64], degree: usize, u: f64) -> Vec3 {
    let n = control.len() - 1;
    let span = find_knot_span(n, degree, u, knots);

    let mut basis = vec![0.0_f64; degree + 1];
    let mut left = vec![0.0_f64; degree + 1];
    let mut right = vec![0.0_f64; degree + 1];
    basis[0] = 1.0;

    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let denom = if denom.abs() < KNOT_DIVISION_EPSILON {
                KNOT_DIVISION_EPSILON
            } else {
                denom
            };
            let temp = basis[r] / denom;
            basis[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        basis[j] = saved;
    }

    let mut point = Vec3::ZERO;
    for (j, &b) in basis.iter().enumerate() {
        point = point + control[span - degree + j] * b;
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_cubic_bezier_samples_few_points() {
        let pts = sample_cubic_bezier(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0 / 3.0, 0.0, 0.0),
            Vec3::new(2.0 / 3.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            0.05,
        );
        assert_eq!(pts.first(), Some(&Vec3::new(0.0, 0.0, 0.0)));
        assert_eq!(pts.last(), Some(&Vec3::new(1.0, 0.0, 0.0)));
        assert!(pts.len() <= 3);
    }

    #[test]
    fn curved_cubic_bezier_subdivides_more() {
        let pts = sample_cubic_bezier(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            0.001,
        );
        assert!(pts.len() > 4);
        assert_eq!(pts[0], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(*pts.last().unwrap(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn quadratic_bezier_promotion_matches_endpoints() {
        let pts = sample_quadratic_bezier(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            0.01,
        );
        assert_eq!(pts[0], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(*pts.last().unwrap(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn bspline_with_too_few_controls_returns_unchanged() {
        let control = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        let out = sample_uniform_bspline(&control, 3, 50);
        assert_eq!(out, control);
    }

    #[test]
    fn bspline_endpoints_interpolate_clamped_knots() {
        let control = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(3.0, 1.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
        ];
        let out = sample_uniform_bspline(&control, 3, 40);
        assert_eq!(out.len(), 40);
        let first = out.first().unwrap();
        let last = out.last().unwrap();
        assert!((first.distance(control[0])) < 1e-6);
        assert!((last.distance(*control.last().unwrap())) < 1e-6);
    }

    #[test]
    fn bspline_sample_count_clamped_minimum() {
        let control = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 1.0, 0.0),
        ];
        let out = sample_uniform_bspline(&control, 3, 1);
        // k is clamped to >= 2 internally.
        assert_eq!(out.len(), 2);
    }
}
