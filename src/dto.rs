//! Stable value types exchanged between the preprocessing core and its
//! external collaborators — the CAD parser and the glTF writer.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PreprocessError, Result};
use crate::vector::Vec3;

/// An ordered sequence of 3D points on a named layer.
///
/// Invariants: `points.len() >= 1` once constructed; when `is_closed` the
/// closing edge from the last point back to the first is implied, not
/// duplicated in `points`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub layer: String,
    pub points: Vec<Vec3>,
    pub is_closed: bool,
}

impl Polyline {
    #[must_use]
    pub fn new(layer: impl Into<String>, points: Vec<Vec3>, is_closed: bool) -> Self {
        Self {
            layer: layer.into(),
            points,
            is_closed,
        }
    }
}

/// A triangle mesh on a named layer.
///
/// Invariant: `triangle_indices.len() % 3 == 0` and every index is a valid
/// offset into `vertices`. A triangle is non-degenerate iff its three
/// indices are pairwise distinct; the optimizer drops degenerates silently
/// rather than emitting them.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub layer: String,
    pub vertices: Vec<Vec3>,
    pub triangle_indices: Vec<u32>,
}

impl Mesh {
    #[must_use]
    pub fn new(layer: impl Into<String>, vertices: Vec<Vec3>, triangle_indices: Vec<u32>) -> Self {
        Self {
            layer: layer.into(),
            vertices,
            triangle_indices,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }

    /// Checks the `Mesh` precondition: `triangle_indices.len() % 3 == 0`
    /// and every index is a valid offset into `vertices`. This is a
    /// genuine precondition violation, not a
    /// `DegenerateGeometry` case the pipeline absorbs — a parser adapter
    /// that hands the core a malformed `Mesh` has a bug, and the core
    /// reports it rather than silently truncating or panicking.
    pub fn validate(&self) -> Result<()> {
        if self.triangle_indices.len() % 3 != 0 {
            return Err(PreprocessError::MismatchedMeshIndices {
                layer: self.layer.clone(),
                vertex_count: self.vertices.len(),
                triangle_index_count: self.triangle_indices.len(),
                max_index: 0,
            });
        }
        if let Some(&max) = self.triangle_indices.iter().max() {
            if max as usize >= self.vertices.len() {
                return Err(PreprocessError::MismatchedMeshIndices {
                    layer: self.layer.clone(),
                    vertex_count: self.vertices.len(),
                    triangle_index_count: self.triangle_indices.len(),
                    max_index: max as usize,
                });
            }
        }
        Ok(())
    }
}

/// Counters describing the reduction the preprocessor achieved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryStats {
    pub original_vertices: usize,
    pub optimized_vertices: usize,
    pub original_entities: usize,
    pub optimized_polylines: usize,
    pub mesh_count: usize,
    pub triangle_count: usize,
    pub entity_counts: BTreeMap<String, usize>,
}

impl GeometryStats {
    /// `(1 - optimized/original) * 100`, or `0` when there was nothing to
    /// reduce from.
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        if self.original_vertices == 0 {
            0.0
        } else {
            (1.0 - self.optimized_vertices as f64 / self.original_vertices as f64) * 100.0
        }
    }

    pub fn record_entity(&mut self, kind: &str) {
        self.original_entities += 1;
        *self.entity_counts.entry(kind.to_string()).or_insert(0) += 1;
    }
}

/// The result bundle handed to the external writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizedGeometry {
    pub polylines: Vec<Polyline>,
    pub meshes: Vec<Mesh>,
    pub stats: GeometryStats,
}

/// Tunables for the preprocessing pipeline. Every field has a default;
/// `with_*` setters give a fluent construction style.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessorOptions {
    pub polyline_epsilon: f64,
    pub arc_chord_error: f64,
    pub spline_tolerance: f64,
    pub merge_distance: f64,
    pub include_layers: Option<BTreeSet<String>>,
    pub min_arc_segments: u32,
    pub max_arc_segments: u32,
}

impl Default for PreprocessorOptions {
    fn default() -> Self {
        Self {
            polyline_epsilon: 0.1,
            arc_chord_error: 0.01,
            spline_tolerance: 0.05,
            merge_distance: 0.001,
            include_layers: None,
            min_arc_segments: 8,
            max_arc_segments: 128,
        }
    }
}

impl PreprocessorOptions {
    #[must_use]
    pub fn with_polyline_epsilon(mut self, v: f64) -> Self {
        self.polyline_epsilon = v;
        self
    }

    #[must_use]
    pub fn with_arc_chord_error(mut self, v: f64) -> Self {
        self.arc_chord_error = v;
        self
    }

    #[must_use]
    pub fn with_spline_tolerance(mut self, v: f64) -> Self {
        self.spline_tolerance = v;
        self
    }

    #[must_use]
    pub fn with_merge_distance(mut self, v: f64) -> Self {
        self.merge_distance = v;
        self
    }

    #[must_use]
    pub fn with_include_layers(mut self, layers: BTreeSet<String>) -> Self {
        self.include_layers = Some(
            layers
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn with_arc_segment_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_arc_segments = min;
        self.max_arc_segments = max;
        self
    }

    /// Case-insensitive allowlist check; `true` when there is no allowlist.
    #[must_use]
    pub fn layer_allowed(&self, layer: &str) -> bool {
        match &self.include_layers {
            None => true,
            Some(set) => set.contains(&layer.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_validate_accepts_well_formed_mesh() {
        let mesh = Mesh::new("roof", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn mesh_validate_rejects_non_multiple_of_three_indices() {
        let mesh = Mesh::new("roof", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn mesh_validate_rejects_out_of_range_index() {
        let mesh = Mesh::new("roof", vec![Vec3::ZERO, Vec3::X], vec![0, 1, 2]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn reduction_percent_zero_when_original_is_zero() {
        let stats = GeometryStats::default();
        assert_eq!(stats.reduction_percent(), 0.0);
    }

    #[test]
    fn reduction_percent_basic() {
        let stats = GeometryStats {
            original_vertices: 100,
            optimized_vertices: 25,
            ..Default::default()
        };
        assert!((stats.reduction_percent() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn layer_allowlist_is_case_insensitive() {
        let mut set = BTreeSet::new();
        set.insert("Walls".to_string());
        let opts = PreprocessorOptions::default().with_include_layers(set);
        assert!(opts.layer_allowed("walls"));
        assert!(opts.layer_allowed("WALLS"));
        assert!(!opts.layer_allowed("doors"));
    }

    #[test]
    fn no_allowlist_admits_everything() {
        let opts = PreprocessorOptions::default();
        assert!(opts.layer_allowed("anything"));
    }
}
