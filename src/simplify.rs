//! Ramer–Douglas–Peucker polyline simplification.
//!
//! Two entry points: [`simplify`] is the iterative, stack-safe variant used
//! for ordinary inputs; [`simplify_chunked`] splits oversized inputs
//! (`> chunk * 2` points) into overlapping chunks and reports progress,
//! per `OversizedInput`.

use log::debug;

use crate::vector::Vec3;

const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// Segment-clamped perpendicular distance from `p` to segment `a-b`.
/// Falls back to the point-to-point distance when `a` and `b` coincide
/// (within `1e-12` squared length) rather than dividing by zero.
fn perpendicular_distance(p: Vec3, a: Vec3, b: Vec3) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Simplifies `points` with tolerance `epsilon` using an explicit work
/// stack rather than recursion, since inputs can exceed 10^6 points.
///
/// Always keeps `points[0]` and `points[last]`. For `points.len() <= 2` the
/// input is returned unchanged.
#[must_use]
pub fn simplify(points: &[Vec3], epsilon: f64) -> Vec<Vec3> {
    let len = points.len();
    if len <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; len];
    keep[0] = true;
    keep[len - 1] = true;

    let mut stack = vec![(0usize, len - 1)];
    while let Some((s, e)) = stack.pop() {
        if e <= s + 1 {
            continue;
        }

        let a = points[s];
        let b = points[e];
        let mut farthest_index = s;
        let mut farthest_distance = 0.0_f64;
        for (offset, &p) in points[s + 1..e].iter().enumerate() {
            let d = perpendicular_distance(p, a, b);
            if d > farthest_distance {
                farthest_distance = d;
                farthest_index = s + 1 + offset;
            }
        }

        if farthest_distance > epsilon {
            keep[farthest_index] = true;
            stack.push((s, farthest_index));
            stack.push((farthest_index, e));
        }
    }

    points
        .iter()
        .zip(keep.iter())
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

/// Chunked variant for inputs beyond `chunk * 2` points: splits into
/// overlapping windows of `chunk + overlap` points
/// (`overlap = min(1000, chunk / 10)`), simplifies each independently, and
/// stitches the results, dropping the duplicate seam point of every
/// non-first chunk. `progress` is invoked synchronously after each chunk
/// with `(processed, total)`.
pub fn simplify_chunked(
    points: &[Vec3],
    epsilon: f64,
    chunk: usize,
    mut progress: impl FnMut(usize, usize),
) -> Vec<Vec3> {
    let total = points.len();
    if total <= chunk * 2 {
        let out = simplify(points, epsilon);
        progress(total, total);
        return out;
    }

    let overlap = 1000.min(chunk / 10).max(1);
    let window = chunk + overlap;

    let mut out: Vec<Vec3> = Vec::new();
    let mut start = 0usize;
    let mut processed = 0usize;
    let mut first_chunk = true;

    while start < total {
        let end = (start + window).min(total);
        let slice = &points[start..end];
        let mut simplified = simplify(slice, epsilon);

        if !first_chunk && !simplified.is_empty() {
            simplified.remove(0);
        }
        out.append(&mut simplified);
        first_chunk = false;

        processed = end;
        debug!("simplify_chunked: processed {processed}/{total} points");
        progress(processed, total);

        if end >= total {
            break;
        }
        start = end - overlap;
    }

    if let (Some(&last_input), Some(&last_output)) = (points.last(), out.last()) {
        if last_output != last_input {
            out.push(last_input);
        }
    }

    debug_assert_eq!(processed, total);
    out
}

/// Convenience wrapper using the default chunk size (100 000).
pub fn simplify_chunked_default(points: &[Vec3], epsilon: f64, progress: impl FnMut(usize, usize)) -> Vec<Vec3> {
    simplify_chunked(points, epsilon, DEFAULT_CHUNK_SIZE, progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment_tight_epsilon_is_unchanged() {
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        let out = simplify(&pts, 0.1);
        assert_eq!(out, pts);
    }

    #[test]
    fn colinear_points_collapse_to_endpoints() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.5, 0.001, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ];
        let out = simplify(&pts, 0.01);
        assert_eq!(out, vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]);
    }

    #[test]
    fn endpoints_always_preserved() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 5.0, 0.0),
            Vec3::new(2.0, -5.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ];
        let out = simplify(&pts, 0.01);
        assert_eq!(out.first(), pts.first());
        assert_eq!(out.last(), pts.last());
    }

    #[test]
    fn idempotent() {
        let pts: Vec<Vec3> = (0..50)
            .map(|i| Vec3::new(i as f64, ((i as f64) * 0.37).sin() * 3.0, 0.0))
            .collect();
        let once = simplify(&pts, 0.2);
        let twice = simplify(&once, 0.2);
        assert_eq!(once, twice);
    }

    #[test]
    fn monotonic_in_epsilon() {
        let pts: Vec<Vec3> = (0..200)
            .map(|i| Vec3::new(i as f64, ((i as f64) * 0.21).sin() * 4.0, 0.0))
            .collect();
        let tight = simplify(&pts, 0.01);
        let loose = simplify(&pts, 1.0);
        assert!(loose.len() <= tight.len());
    }

    #[test]
    fn every_removed_point_is_within_epsilon_of_output_polyline() {
        let pts: Vec<Vec3> = (0..300)
            .map(|i| {
                let t = i as f64 * 0.05;
                Vec3::new(t, t.sin() * 2.0 + (t * 3.0).cos() * 0.3, 0.0)
            })
            .collect();
        let eps = 0.05;
        let out = simplify(&pts, eps);

        for &p in &pts {
            let min_dist = out
                .windows(2)
                .map(|w| perpendicular_distance(p, w[0], w[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(min_dist <= eps + 1e-9, "point {p:?} exceeds epsilon: {min_dist}");
        }
    }

    #[test]
    fn chunked_matches_iterative_on_small_input() {
        let pts: Vec<Vec3> = (0..50)
            .map(|i| Vec3::new(i as f64, ((i as f64) * 0.3).sin(), 0.0))
            .collect();
        let direct = simplify(&pts, 0.05);
        let mut calls = Vec::new();
        let chunked = simplify_chunked(&pts, 0.05, 100, |done, total| calls.push((done, total)));
        assert_eq!(direct, chunked);
        assert_eq!(calls, vec![(50, 50)]);
    }

    #[test]
    fn chunked_preserves_last_point_on_large_input() {
        let pts: Vec<Vec3> = (0..10_000)
            .map(|i| Vec3::new(i as f64, ((i as f64) * 0.01).sin() * 5.0, 0.0))
            .collect();
        let mut progress_calls = 0;
        let out = simplify_chunked(&pts, 0.05, 1000, |_, _| progress_calls += 1);
        assert_eq!(out.first(), pts.first());
        assert_eq!(out.last(), pts.last());
        assert!(progress_calls > 1);
    }
}
