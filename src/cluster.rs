//! Grid-based vertex-clustering mesh decimation.

use log::debug;

use crate::dto::Mesh;
use crate::vector::Vec3;

const AABB_PADDING: f64 = 0.001;

/// Collapses `mesh` onto a uniform `grid x grid x grid` cell grid, clamped
/// to `[32, 1024]`. Each occupied cell contributes one output vertex (the
/// centroid of its members, accumulated in input order so float summation
/// is deterministic and not reassociated). Triangles that collapse to two
/// or fewer distinct vertex ids are dropped.
#[must_use]
pub fn cluster_mesh(mesh: &Mesh, grid: u32) -> Mesh {
    let grid = grid.clamp(32, 1024);

    if mesh.vertices.is_empty() {
        return Mesh::new(mesh.layer.clone(), Vec::new(), Vec::new());
    }

    let (min, max) = aabb(&mesh.vertices);
    let extent = (max - min) + Vec3::new(AABB_PADDING * 2.0, AABB_PADDING * 2.0, AABB_PADDING * 2.0);
    let padded_min = min - Vec3::new(AABB_PADDING, AABB_PADDING, AABB_PADDING);
    let cell_size = Vec3::new(
        extent.x / grid as f64,
        extent.y / grid as f64,
        extent.z / grid as f64,
    );

    let cell_id_of = |v: Vec3| -> u64 {
        let cx = cell_index(v.x, padded_min.x, cell_size.x, grid);
        let cy = cell_index(v.y, padded_min.y, cell_size.y, grid);
        let cz = cell_index(v.z, padded_min.z, cell_size.z, grid);
        cx as u64 + cy as u64 * grid as u64 + cz as u64 * grid as u64 * grid as u64
    };

    // Preserve input order: first-seen cell gets the next output slot, and
    // centroid accumulation for that slot happens in input order.
    let mut cell_to_slot: std::collections::HashMap<u64, usize> = std::collections::HashMap::new();
    let mut sums: Vec<Vec3> = Vec::new();
    let mut counts: Vec<u32> = Vec::new();
    let mut vertex_slot: Vec<usize> = Vec::with_capacity(mesh.vertices.len());

    for &v in &mesh.vertices {
        let id = cell_id_of(v);
        let slot = *cell_to_slot.entry(id).or_insert_with(|| {
            sums.push(Vec3::ZERO);
            counts.push(0);
            sums.len() - 1
        });
        sums[slot] = sums[slot] + v;
        counts[slot] += 1;
        vertex_slot.push(slot);
    }

    let new_vertices: Vec<Vec3> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&sum, &count)| sum / f64::from(count))
        .collect();

    let mut new_indices = Vec::with_capacity(mesh.triangle_indices.len());
    let mut retained = 0usize;
    let mut removed = 0usize;
    for tri in mesh.triangle_indices.chunks_exact(3) {
        let a = vertex_slot[tri[0] as usize];
        let b = vertex_slot[tri[1] as usize];
        let c = vertex_slot[tri[2] as usize];
        if a == b || b == c || a == c {
            removed += 1;
            continue;
        }
        new_indices.push(a as u32);
        new_indices.push(b as u32);
        new_indices.push(c as u32);
        retained += 1;
    }

    debug!(
        "cluster_mesh: layer={} grid={} vertices {}->{} triangles retained={} removed={}",
        mesh.layer,
        grid,
        mesh.vertices.len(),
        new_vertices.len(),
        retained,
        removed
    );

    Mesh::new(mesh.layer.clone(), new_vertices, new_indices)
}

fn cell_index(coord: f64, min: f64, cell_size: f64, grid: u32) -> u32 {
    if cell_size <= 0.0 {
        return 0;
    }
    let idx = ((coord - min) / cell_size).floor();
    let idx = if idx.is_finite() { idx } else { 0.0 };
    (idx as i64).clamp(0, i64::from(grid) - 1) as u32
}

fn aabb(vertices: &[Vec3]) -> (Vec3, Vec3) {
    let mut min = vertices[0];
    let mut max = vertices[0];
    for &v in &vertices[1..] {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_mesh(n: usize) -> Mesh {
        let mut vertices = Vec::new();
        let mut index_of = std::collections::HashMap::new();
        for i in 0..n {
            for j in 0..n {
                let idx = (i * n + j) as u32;
                index_of.insert((i, j), idx);
                vertices.push(Vec3::new(i as f64 / (n - 1) as f64, j as f64 / (n - 1) as f64, 0.0));
            }
        }
        let mut indices = Vec::new();
        for i in 0..n - 1 {
            for j in 0..n - 1 {
                let a = index_of[&(i, j)];
                let b = index_of[&(i + 1, j)];
                let c = index_of[&(i + 1, j + 1)];
                let d = index_of[&(i, j + 1)];
                indices.extend_from_slice(&[a, b, c, a, c, d]);
            }
        }
        Mesh::new("test", vertices, indices)
    }

    #[test]
    fn collapses_10x10_grid_with_grid_2_to_at_most_eight_vertices() {
        let mesh = grid_mesh(10);
        assert_eq!(mesh.triangle_count(), 162);
        let out = cluster_mesh(&mesh, 2);
        assert!(out.vertices.len() <= 8);
        assert!(out.triangle_count() < 12);
        assert_eq!(out.layer, "test");
    }

    #[test]
    fn no_degenerate_triangles_emitted() {
        let mesh = grid_mesh(10);
        let out = cluster_mesh(&mesh, 2);
        for tri in out.triangle_indices.chunks_exact(3) {
            assert_ne!(tri[0], tri[1]);
            assert_ne!(tri[1], tri[2]);
            assert_ne!(tri[0], tri[2]);
        }
    }

    #[test]
    fn output_bbox_within_input_bbox_plus_padding() {
        let mesh = grid_mesh(10);
        let out = cluster_mesh(&mesh, 4);
        let (in_min, in_max) = aabb(&mesh.vertices);
        let (out_min, out_max) = aabb(&out.vertices);
        let pad = Vec3::new(AABB_PADDING, AABB_PADDING, AABB_PADDING);
        assert!(out_min.x >= in_min.x - pad.x - 1e-9);
        assert!(out_max.x <= in_max.x + pad.x + 1e-9);
        assert!(out_min.y >= in_min.y - pad.y - 1e-9);
        assert!(out_max.y <= in_max.y + pad.y + 1e-9);
    }

    #[test]
    fn grid_clamped_to_valid_range() {
        let mesh = grid_mesh(3);
        let out_low = cluster_mesh(&mesh, 1);
        let out_high = cluster_mesh(&mesh, 5000);
        assert!(out_low.vertices.len() <= 32 * 32 * 32);
        assert!(out_high.vertices.len() <= mesh.vertices.len());
    }

    #[test]
    fn empty_mesh_returns_empty() {
        let mesh = Mesh::new("empty", Vec::new(), Vec::new());
        let out = cluster_mesh(&mesh, 32);
        assert!(out.vertices.is_empty());
        assert!(out.triangle_indices.is_empty());
    }
}
