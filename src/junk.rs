//! Percentile bounding-box culling and connected-component island removal.

use log::debug;

use crate::dto::Mesh;
use crate::vector::Vec3;

/// Options for the percentile bounding-box cull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxCullOptions {
    /// Fraction of coordinates to keep per axis before padding (default 0.95).
    pub percentile: f64,
    /// Fractional padding applied to the percentile box per axis (default 0.10).
    pub padding: f64,
}

impl Default for BoundingBoxCullOptions {
    fn default() -> Self {
        Self {
            percentile: 0.95,
            padding: 0.10,
        }
    }
}

/// Keeps a triangle iff **any** of its three vertices lies inside the
/// percentile-expanded bounding box, per axis: sorted coordinates at the
/// `(1-p)/2` and `(1+p)/2` indices form the box, then it is expanded by
/// `+-padding * extent`. Output vertices are remapped so none are
/// unreferenced.
#[must_use]
pub fn cull_outliers(mesh: &Mesh, options: BoundingBoxCullOptions) -> Mesh {
    if mesh.vertices.is_empty() {
        return Mesh::new(mesh.layer.clone(), Vec::new(), Vec::new());
    }

    let (min, max) = percentile_bbox(&mesh.vertices, options.percentile, options.padding);

    let inside = |v: Vec3| v.x >= min.x && v.x <= max.x && v.y >= min.y && v.y <= max.y && v.z >= min.z && v.z <= max.z;

    let mut keep_triangle = Vec::with_capacity(mesh.triangle_count());
    for tri in mesh.triangle_indices.chunks_exact(3) {
        let a = mesh.vertices[tri[0] as usize];
        let b = mesh.vertices[tri[1] as usize];
        let c = mesh.vertices[tri[2] as usize];
        keep_triangle.push(inside(a) || inside(b) || inside(c));
    }

    let kept_count = keep_triangle.iter().filter(|&&k| k).count();
    debug!(
        "cull_outliers: layer={} triangles {}->{}",
        mesh.layer,
        mesh.triangle_count(),
        kept_count
    );

    remap_kept_triangles(mesh, &keep_triangle)
}

fn percentile_bbox(vertices: &[Vec3], percentile: f64, padding: f64) -> (Vec3, Vec3) {
    let axis = |pick: fn(Vec3) -> f64| -> (f64, f64) {
        let mut values: Vec<f64> = vertices.iter().map(|&v| pick(v)).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = values.len();
        let low_idx = (((1.0 - percentile) / 2.0) * n as f64).floor() as usize;
        let high_idx_raw = (((1.0 + percentile) / 2.0) * n as f64).floor() as usize;
        let high_idx = high_idx_raw.max(low_idx + 1).min(n - 1);
        let low_idx = low_idx.min(high_idx.saturating_sub(1));
        let lo = values[low_idx];
        let hi = values[high_idx];
        let extent = (hi - lo).max(0.0);
        (lo - extent * padding, hi + extent * padding)
    };

    let (min_x, max_x) = axis(|v| v.x);
    let (min_y, max_y) = axis(|v| v.y);
    let (min_z, max_z) = axis(|v| v.z);
    (Vec3::new(min_x, min_y, min_z), Vec3::new(max_x, max_y, max_z))
}

/// Minimum component size to retain by default.
pub const DEFAULT_MIN_TRIANGLES: usize = 100;

/// Removes connected components ("islands") of fewer than `min_triangles`
/// edge-adjacent triangles via union-find over shared edges.
#[must_use]
pub fn remove_small_islands(mesh: &Mesh, min_triangles: usize) -> Mesh {
    let triangle_count = mesh.triangle_count();
    if triangle_count == 0 {
        return Mesh::new(mesh.layer.clone(), Vec::new(), Vec::new());
    }

    let mut uf = UnionFind::new(triangle_count);
    let mut edge_owner: std::collections::HashMap<(u32, u32), usize> = std::collections::HashMap::new();

    for (tri_idx, tri) in mesh.triangle_indices.chunks_exact(3).enumerate() {
        for (v1, v2) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (v1.min(v2), v1.max(v2));
            match edge_owner.get(&key) {
                Some(&other) => uf.union(tri_idx, other),
                None => {
                    edge_owner.insert(key, tri_idx);
                }
            }
        }
    }

    let mut component_size: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
    for tri_idx in 0..triangle_count {
        *component_size.entry(uf.find(tri_idx)).or_insert(0) += 1;
    }

    let keep_triangle: Vec<bool> = (0..triangle_count)
        .map(|tri_idx| component_size[&uf.find(tri_idx)] >= min_triangles)
        .collect();

    let kept_count = keep_triangle.iter().filter(|&&k| k).count();
    debug!(
        "remove_small_islands: layer={} triangles {}->{} (min_triangles={})",
        mesh.layer, triangle_count, kept_count, min_triangles
    );

    remap_kept_triangles(mesh, &keep_triangle)
}

fn remap_kept_triangles(mesh: &Mesh, keep_triangle: &[bool]) -> Mesh {
    let mut remap: Vec<Option<u32>> = vec![None; mesh.vertices.len()];
    let mut new_vertices = Vec::new();
    let mut new_indices = Vec::new();

    for (tri, &keep) in mesh.triangle_indices.chunks_exact(3).zip(keep_triangle.iter()) {
        if !keep {
            continue;
        }
        for &old_index in tri {
            let old_index = old_index as usize;
            let new_index = match remap[old_index] {
                Some(idx) => idx,
                None => {
                    let idx = new_vertices.len() as u32;
                    new_vertices.push(mesh.vertices[old_index]);
                    remap[old_index] = Some(idx);
                    idx
                }
            };
            new_indices.push(new_index);
        }
    }

    Mesh::new(mesh.layer.clone(), new_vertices, new_indices)
}

/// Union-find with path compression and union-by-rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
