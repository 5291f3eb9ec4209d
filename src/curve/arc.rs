//! Arc, circle, and ellipse tessellation.

use std::f64::consts::PI;

use super::plane_basis;
use crate::vector::Vec3;

/// Tessellates an arc into a polyline of `n + 1` points under a chord-error
/// bound, clamped to `[min_segments, max_segments]`.
///
/// `normal` need not be unit length; the caller is not required to
/// normalize it. All degenerate inputs (`radius <= 0`, `chord_error <= 0`,
/// a non-positive max-angle-per-segment) fall back to a safe segment count
/// rather than erroring.
#[must_use]
pub fn tessellate_arc(
    center: Vec3,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    normal: Vec3,
    chord_error: f64,
    min_segments: u32,
    max_segments: u32,
) -> Vec<Vec3> {
    let mut sweep = end_angle - start_angle;
    if sweep < 0.0 {
        sweep += 2.0 * PI;
    }

    let n = segment_count(sweep, radius, chord_error, min_segments, max_segments);
    sample_arc_points(center, radius, start_angle, sweep, normal, n)
}

/// Tessellates a full-turn circle (`start=0, end=2*PI`).
#[must_use]
pub fn tessellate_circle(
    center: Vec3,
    radius: f64,
    normal: Vec3,
    chord_error: f64,
    min_segments: u32,
    max_segments: u32,
) -> Vec<Vec3> {
    tessellate_arc(center, radius, 0.0, 2.0 * PI, normal, chord_error, min_segments, max_segments)
}

/// Tessellates a full ellipse. Segment count is estimated from
/// `max(major, minor)`, then the clamp range is doubled relative to the
/// circular case; the in-plane basis is rotated by `rotation` radians.
#[must_use]
pub fn tessellate_ellipse(
    center: Vec3,
    major: f64,
    minor: f64,
    normal: Vec3,
    rotation: f64,
    chord_error: f64,
    min_segments: u32,
    max_segments: u32,
) -> Vec<Vec3> {
    let radius_for_estimate = major.max(minor);
    let n = segment_count(
        2.0 * PI,
        radius_for_estimate,
        chord_error,
        min_segments * 2,
        max_segments * 2,
    );

    let (u, v) = plane_basis(normal);
    let cos_r = rotation.cos();
    let sin_r = rotation.sin();
    let u_rot = u * cos_r - v * sin_r;
    let v_rot = u * sin_r + v * cos_r;

    (0..=n)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (n as f64);
            center + u_rot * (major * theta.cos()) + v_rot * (minor * theta.sin())
        })
        .collect()
}

/// `n = ceil(sweep / (2*acos(clamp(1 - chord_error/radius, -1, 1))))`,
/// clamped into `[min_segments, max_segments]`.
fn segment_count(sweep: f64, radius: f64, chord_error: f64, min_segments: u32, max_segments: u32) -> u32 {
    if radius <= 0.0 || chord_error <= 0.0 {
        return min_segments;
    }

    let cos_half_angle = (1.0 - chord_error / radius).clamp(-1.0, 1.0);
    let max_angle_per_segment = 2.0 * cos_half_angle.acos();
    if max_angle_per_segment <= 0.0 {
        return max_segments;
    }

    let n = (sweep / max_angle_per_segment).ceil() as i64;
    n.clamp(i64::from(min_segments), i64::from(max_segments)) as u32
}

fn sample_arc_points(center: Vec3, radius: f64, start_angle: f64, sweep: f64, normal: Vec3, n: u32) -> Vec<Vec3> {
    let (u, v) = plane_basis(normal);
    (0..=n)
        .map(|i| {
            let theta = start_angle + sweep * (i as f64) / (n as f64);
            center + u * (radius * theta.cos()) + v * (radius * theta.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec3, b: Vec3, tol: f64) {
        assert!((a.x - b.x).abs() < tol, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < tol, "{a:?} != {b:?}");
        assert!((a.z - b.z).abs() < tol, "{a:?} != {b:?}");
    }

    #[test]
    fn quarter_arc_endpoint_count_and_positions() {
        let pts = tessellate_arc(
            Vec3::ZERO,
            1.0,
            0.0,
            PI / 2.0,
            Vec3::Z,
            0.01,
            8,
            128,
        );
        assert!(pts.len() >= 9 && pts.len() <= 17);
        approx_eq(pts[0], Vec3::new(1.0, 0.0, 0.0), 1e-9);
        approx_eq(*pts.last().unwrap(), Vec3::new(0.0, 1.0, 0.0), 1e-9);
    }

    #[test]
    fn full_circle_min_clamp_gives_exactly_nine_points() {
        let pts = tessellate_circle(Vec3::ZERO, 1.0, Vec3::Z, 10.0, 8, 128);
        assert_eq!(pts.len(), 9);
        approx_eq(pts[0], *pts.last().unwrap(), 1e-9);
    }

    #[test]
    fn degenerate_radius_falls_back_to_min_segments() {
        let pts = tessellate_arc(Vec3::ZERO, 0.0, 0.0, PI, Vec3::Z, 0.01, 8, 128);
        assert_eq!(pts.len(), 9);
    }

    #[test]
    fn degenerate_chord_error_falls_back_to_min_segments() {
        let pts = tessellate_arc(Vec3::ZERO, 1.0, 0.0, PI, Vec3::Z, 0.0, 8, 128);
        assert_eq!(pts.len(), 9);
    }

    #[test]
    fn negative_sweep_normalizes_to_full_turn_minus() {
        // start > end should wrap by adding 2*PI rather than going negative.
        let pts = tessellate_arc(Vec3::ZERO, 1.0, PI / 2.0, 0.0, Vec3::Z, 0.01, 8, 128);
        assert!(pts.len() > 8);
    }

    #[test]
    fn ellipse_segment_count_uses_doubled_clamp_range() {
        let pts = tessellate_ellipse(Vec3::ZERO, 2.0, 1.0, Vec3::Z, 0.0, 10.0, 8, 128);
        assert_eq!(pts.len(), 17);
    }

    #[test]
    fn arc_segment_count_clamped_to_max() {
        let pts = tessellate_arc(Vec3::ZERO, 100.0, 0.0, 2.0 * PI, Vec3::Z, 1e-6, 8, 16);
        assert_eq!(pts.len(), 17);
    }
}
