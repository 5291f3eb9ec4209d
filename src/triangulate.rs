//! Ear-clip triangulation with robust 3D→2D planar projection.

use log::debug;

use crate::curve::plane_basis;
use crate::vector::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point2 {
    u: f64,
    v: f64,
}

/// Triangulates a simple closed polygon given as 3D points with no
/// explicit closing vertex. Returns a flat sequence of indices into
/// `points`. `<3` points triangulate to nothing; exactly 3 points
/// triangulate to `[0, 1, 2]` unconditionally.
#[must_use]
pub fn triangulate(points: &[Vec3]) -> Vec<u32> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![0, 1, 2];
    }

    let normal = newell_normal(points);
    let (u, v) = plane_basis(normal);
    let projected: Vec<Point2> = points
        .iter()
        .map(|&p| Point2 { u: p.dot(u), v: p.dot(v) })
        .collect();

    let mut order: Vec<usize> = (0..n).collect();
    if signed_area(&projected, &order) < 0.0 {
        order.reverse();
    }

    ear_clip(&projected, order)
}

/// Newell's method: robust to non-convex, slightly non-planar input.
/// Falls back to `+Z` when the accumulated normal is zero (degenerate,
/// e.g. all points colinear).
fn newell_normal(points: &[Vec3]) -> Vec3 {
    let n = points.len();
    let mut normal = Vec3::ZERO;
    for i in 0..n {
        let cur = points[i];
        let next = points[(i + 1) % n];
        normal = normal
            + Vec3::new(
                (cur.y - next.y) * (cur.z + next.z),
                (cur.z - next.z) * (cur.x + next.x),
                (cur.x - next.x) * (cur.y + next.y),
            );
    }
    let normalized = normal.normalized();
    if normalized == Vec3::ZERO {
        Vec3::Z
    } else {
        normalized
    }
}

fn signed_area(points: &[Point2], order: &[usize]) -> f64 {
    let n = order.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = points[order[i]];
        let b = points[order[(i + 1) % n]];
        area += a.u * b.v - b.u * a.v;
    }
    area * 0.5
}

fn cross2(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.u - a.u) * (c.v - a.v) - (b.v - a.v) * (c.u - a.u)
}

/// Same-sign edge-function test: `p` lies *strictly* inside triangle
/// `(a,b,c)`. A point exactly on an edge (one `d` is zero) does not count
/// as inside — otherwise a vertex collinear with an edge of its neighbors'
/// candidate ear would block every real ear on that pass, and ear-clipping
/// would fall through to the best-effort single-triangle fallback.
fn point_in_triangle(p: Point2, a: Point2, b: Point2, c: Point2) -> bool {
    let d1 = cross2(a, b, p);
    let d2 = cross2(b, c, p);
    let d3 = cross2(c, a, p);
    let all_positive = d1 > 0.0 && d2 > 0.0 && d3 > 0.0;
    let all_negative = d1 < 0.0 && d2 < 0.0 && d3 < 0.0;
    all_positive || all_negative
}

fn ear_clip(points: &[Point2], mut order: Vec<usize>) -> Vec<u32> {
    let mut triangles = Vec::new();
    let original_len = order.len();
    let max_iterations = original_len * original_len;
    let mut iterations = 0usize;

    while order.len() > 3 && iterations < max_iterations {
        iterations += 1;
        let n = order.len();
        let mut found_ear = false;

        for i in 0..n {
            let ia = order[(i + n - 1) % n];
            let ib = order[i];
            let ic = order[(i + 1) % n];
            let (a, b, c) = (points[ia], points[ib], points[ic]);

            if cross2(a, b, c) <= 0.0 {
                continue; // reflex or colinear: not convex
            }

            let is_ear = !order.iter().enumerate().any(|(j, &idx)| {
                j != (i + n - 1) % n && j != i && j != (i + 1) % n && point_in_triangle(points[idx], a, b, c)
            });

            if is_ear {
                triangles.push(ia as u32);
                triangles.push(ib as u32);
                triangles.push(ic as u32);
                order.remove(i);
                found_ear = true;
                break;
            }
        }

        if !found_ear {
            debug!("ear_clip: no ear found with {} vertices remaining, emitting best-effort triangle", order.len());
            break;
        }
    }

    if order.len() == 3 {
        triangles.push(order[0] as u32);
        triangles.push(order[1] as u32);
        triangles.push(order[2] as u32);
    }

    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_three_points_triangulates_to_nothing() {
        assert!(triangulate(&[]).is_empty());
        assert!(triangulate(&[Vec3::ZERO]).is_empty());
        assert!(triangulate(&[Vec3::ZERO, Vec3::X]).is_empty());
    }

    #[test]
    fn exactly_three_points_is_one_triangle() {
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        assert_eq!(triangulate(&pts), vec![0, 1, 2]);
    }

    #[test]
    fn unit_square_triangulates_to_two_triangles_covering_unit_area() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let indices = triangulate(&pts);
        assert_eq!(indices.len(), 6);

        let mut total_area = 0.0;
        for tri in indices.chunks_exact(3) {
            let a = pts[tri[0] as usize];
            let b = pts[tri[1] as usize];
            let c = pts[tri[2] as usize];
            total_area += 0.5 * (b - a).cross(c - a).length();
        }
        assert!((total_area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn convex_polygon_yields_n_minus_two_triangles() {
        // Regular hexagon.
        let n = 6;
        let pts: Vec<Vec3> = (0..n)
            .map(|i| {
                let theta = std::f64::consts::TAU * i as f64 / n as f64;
                Vec3::new(theta.cos(), theta.sin(), 0.0)
            })
            .collect();
        let indices = triangulate(&pts);
        assert_eq!(indices.len() / 3, n - 2);

        let mut vertex_set: Vec<u32> = indices.clone();
        vertex_set.sort_unstable();
        vertex_set.dedup();
        assert_eq!(vertex_set, (0..n as u32).collect::<Vec<_>>());
    }

    #[test]
    fn triangulates_polygon_not_in_xy_plane() {
        // Square tilted into the XZ plane.
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let indices = triangulate(&pts);
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn l_shaped_concave_polygon_triangulates_without_panic() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let indices = triangulate(&pts);
        assert_eq!(indices.len(), (pts.len() - 2) * 3);
    }
}
