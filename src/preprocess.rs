//! The orchestrator: dispatches parsed entities to the curve/spline
//! samplers and the RDP simplifier, then runs the mesh optimization
//! pipeline over anything the parser handed over as triangles already.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::{debug, info, warn};

use crate::cluster::cluster_mesh;
use crate::curve::{sample_cubic_bezier, sample_uniform_bspline, tessellate_arc, tessellate_circle, tessellate_ellipse};
use crate::dto::{GeometryStats, Mesh, OptimizedGeometry, Polyline, PreprocessorOptions};
use crate::entity::{Entity, EntitySource};
use crate::error::Result;
use crate::junk::{cull_outliers, remove_small_islands, BoundingBoxCullOptions};
use crate::simplify::{simplify, simplify_chunked_default};
use crate::vector::Vec3;

/// Entities with more raw points than this switch to the chunked RDP path
/// and report progress.
const LARGE_POLYLINE_THRESHOLD: usize = 500_000;

/// Vertex clustering only kicks in above this triangle count post-merge.
const CLUSTER_TRIANGLE_THRESHOLD: usize = 1000;

/// Toggles for the mesh-pipeline post-processing step. These aren't part
/// of [`PreprocessorOptions`] because that struct scopes per-entity
/// tessellation/simplification tunables; this mirrors the CLI surface
/// `-j/--junk-filter`, `-d/--decimate`, `--min-component`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptimizationOptions {
    pub junk_filter: bool,
    pub bbox_cull: BoundingBoxCullOptions,
    /// `Some(grid)` enables vertex-clustering decimation at that grid
    /// resolution, applied only when a merged layer exceeds
    /// [`CLUSTER_TRIANGLE_THRESHOLD`] triangles.
    pub decimate_grid: Option<u32>,
    pub min_component_triangles: usize,
}

impl Default for MeshOptimizationOptions {
    fn default() -> Self {
        Self {
            junk_filter: false,
            bbox_cull: BoundingBoxCullOptions::default(),
            decimate_grid: None,
            min_component_triangles: crate::junk::DEFAULT_MIN_TRIANGLES,
        }
    }
}

/// Runs the full pipeline with no progress reporting and no cancellation.
///
/// # Errors
/// Returns [`crate::error::PreprocessError::MismatchedMeshIndices`] if any
/// mesh-bearing entity violates the `Mesh` invariant — a genuine
/// precondition violation from the parser adapter, not geometry the core
/// can absorb.
pub fn process<S: EntitySource>(
    source: S,
    options: &PreprocessorOptions,
    mesh_options: &MeshOptimizationOptions,
) -> Result<OptimizedGeometry> {
    process_with(source, options, mesh_options, |_, _| {}, || false)
}

/// Runs the full pipeline, invoking `on_progress(processed, total)`
/// synchronously on the chunked-RDP path and checking `should_cancel`
/// between entities. A polyline being chunked always completes before the
/// next cancellation check, so no partial polyline or partial mesh is ever
/// emitted; on cancellation the partial `OptimizedGeometry` assembled so
/// far is returned.
///
/// # Errors
/// See [`process`].
pub fn process_with<S: EntitySource>(
    source: S,
    options: &PreprocessorOptions,
    mesh_options: &MeshOptimizationOptions,
    mut on_progress: impl FnMut(usize, usize),
    mut should_cancel: impl FnMut() -> bool,
) -> Result<OptimizedGeometry> {
    let mut stats = GeometryStats::default();
    let mut polylines: Vec<Polyline> = Vec::new();
    let mut meshes_by_layer: BTreeMap<String, Vec<Mesh>> = BTreeMap::new();
    let mut face3d_points: Vec<Vec3> = Vec::new();
    let mut face3d_layer: Option<String> = None;

    for entity in source.entities() {
        if should_cancel() {
            warn!("preprocess: cancellation requested, stopping at entity boundary");
            break;
        }

        if !options.layer_allowed(entity.layer()) {
            warn!("preprocess: dropping entity on excluded layer {:?}", entity.layer());
            continue;
        }

        stats.record_entity(entity.kind());
        debug!("preprocess: dispatching entity kind={} layer={:?}", entity.kind(), entity.layer());

        match entity {
            Entity::Line(e) => {
                stats.original_vertices += 2;
                polylines.push(Polyline::new(e.layer, vec![e.start, e.end], false));
            }
            Entity::LwPolyline(e) => {
                stats.original_vertices += e.points.len();
                let points: Vec<Vec3> = e.points.iter().map(|&(x, y)| Vec3::new(x, y, e.elevation)).collect();
                let simplified = simplify_maybe_chunked(&points, options.polyline_epsilon, &mut on_progress, &mut should_cancel);
                polylines.push(Polyline::new(e.layer, simplified, e.is_closed));
            }
            Entity::Polyline3D(e) => {
                stats.original_vertices += e.points.len();
                let simplified = simplify_maybe_chunked(&e.points, options.polyline_epsilon, &mut on_progress, &mut should_cancel);
                polylines.push(Polyline::new(e.layer, simplified, e.is_closed));
            }
            Entity::Arc(e) => {
                let sweep = normalized_sweep(e.start_angle, e.end_angle);
                stats.original_vertices += ((sweep / (PI / 18.0)).ceil() as usize).max(1);
                let points = tessellate_arc(
                    e.center,
                    e.radius,
                    e.start_angle,
                    e.end_angle,
                    e.normal,
                    options.arc_chord_error,
                    options.min_arc_segments,
                    options.max_arc_segments,
                );
                polylines.push(Polyline::new(e.layer, points, false));
            }
            Entity::Circle(e) => {
                stats.original_vertices += 36;
                let points = tessellate_circle(
                    e.center,
                    e.radius,
                    e.normal,
                    options.arc_chord_error,
                    options.min_arc_segments,
                    options.max_arc_segments,
                );
                polylines.push(Polyline::new(e.layer, points, true));
            }
            Entity::Ellipse(e) => {
                stats.original_vertices += 72;
                let points = tessellate_ellipse(
                    e.center,
                    e.major_radius,
                    e.minor_radius,
                    e.normal,
                    e.rotation,
                    options.arc_chord_error,
                    options.min_arc_segments,
                    options.max_arc_segments,
                );
                polylines.push(Polyline::new(e.layer, points, true));
            }
            Entity::Spline(e) => {
                stats.original_vertices += 10 * e.control_points.len();
                let sampled = if e.degree == 3 && e.control_points.len() == 4 {
                    sample_cubic_bezier(
                        e.control_points[0],
                        e.control_points[1],
                        e.control_points[2],
                        e.control_points[3],
                        options.spline_tolerance,
                    )
                } else {
                    let k = (5 * e.control_points.len()).max(20);
                    sample_uniform_bspline(&e.control_points, e.degree, k)
                };
                let simplified = simplify(&sampled, options.polyline_epsilon);
                polylines.push(Polyline::new(e.layer, simplified, false));
            }
            Entity::Face3D(e) => {
                stats.original_vertices += e.corners.len();
                if face3d_layer.is_none() {
                    face3d_layer = Some("3DFace".to_string());
                }
                let dedup_corners = dedup_face_corners(&e.corners);
                face3d_points.extend(dedup_corners);
            }
            Entity::Mesh(e) => {
                e.mesh.validate()?;
                meshes_by_layer.entry(e.mesh.layer.clone()).or_default().push(e.mesh);
            }
        }
    }

    if let Some(layer) = face3d_layer {
        let simplified = simplify(&face3d_points, options.polyline_epsilon);
        if !simplified.is_empty() {
            polylines.push(Polyline::new(layer, simplified, false));
        }
    }

    if options.merge_distance > 0.0 {
        for polyline in &mut polylines {
            polyline.points = merge_near_points(&polyline.points, options.merge_distance);
        }
    }

    let meshes = optimize_meshes(meshes_by_layer, mesh_options);

    stats.optimized_polylines = polylines.len();
    stats.mesh_count = meshes.len();
    stats.triangle_count = meshes.iter().map(Mesh::triangle_count).sum();
    stats.optimized_vertices =
        polylines.iter().map(|p| p.points.len()).sum::<usize>() + meshes.iter().map(|m| m.vertices.len()).sum::<usize>();

    info!(
        "preprocess: {} entities -> {} polylines, {} meshes ({} triangles), {:.2}% vertex reduction",
        stats.original_entities,
        stats.optimized_polylines,
        stats.mesh_count,
        stats.triangle_count,
        stats.reduction_percent()
    );

    Ok(OptimizedGeometry { polylines, meshes, stats })
}

fn normalized_sweep(start: f64, end: f64) -> f64 {
    let mut sweep = end - start;
    if sweep < 0.0 {
        sweep += 2.0 * PI;
    }
    sweep
}

fn simplify_maybe_chunked(
    points: &[Vec3],
    epsilon: f64,
    on_progress: &mut impl FnMut(usize, usize),
    _should_cancel: &mut impl FnMut() -> bool,
) -> Vec<Vec3> {
    if points.len() > LARGE_POLYLINE_THRESHOLD {
        debug!("preprocess: large polyline ({} points), switching to chunked RDP", points.len());
        simplify_chunked_default(points, epsilon, |processed, total| on_progress(processed, total))
    } else {
        simplify(points, epsilon)
    }
}

/// Drops the fourth corner when it duplicates the third (bitwise-equal) —
/// a 3DFACE entity degenerating to a triangle.
fn dedup_face_corners(corners: &[Vec3]) -> Vec<Vec3> {
    if corners.len() == 4 && corners[3] == corners[2] {
        corners[..3].to_vec()
    } else {
        corners.to_vec()
    }
}

/// Keeps the first point, then appends subsequent points only when the
/// squared distance to the last kept point exceeds `merge_distance^2`.
/// Never reduces a `>=2`-point input below 2 output points.
fn merge_near_points(points: &[Vec3], merge_distance: f64) -> Vec<Vec3> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let threshold_sq = merge_distance * merge_distance;
    let mut out = vec![points[0]];
    for &p in &points[1..] {
        if p.distance_squared(*out.last().unwrap()) > threshold_sq {
            out.push(p);
        }
    }

    if out.len() < 2 {
        out = vec![points[0], *points.last().unwrap()];
    }
    out
}

/// Merges meshes sharing a layer, then applies junk filtering and/or
/// vertex clustering per layer. Within junk filtering the ordering is
/// bbox cull first, then island removal.
fn optimize_meshes(meshes_by_layer: BTreeMap<String, Vec<Mesh>>, options: &MeshOptimizationOptions) -> Vec<Mesh> {
    meshes_by_layer
        .into_values()
        .filter_map(|meshes| merge_layer_meshes(meshes))
        .map(|mesh| {
            let mesh = if options.junk_filter {
                let culled = cull_outliers(&mesh, options.bbox_cull);
                remove_small_islands(&culled, options.min_component_triangles)
            } else {
                mesh
            };

            if let Some(grid) = options.decimate_grid {
                if mesh.triangle_count() > CLUSTER_TRIANGLE_THRESHOLD {
                    cluster_mesh(&mesh, grid)
                } else {
                    mesh
                }
            } else {
                mesh
            }
        })
        .collect()
}

fn merge_layer_meshes(meshes: Vec<Mesh>) -> Option<Mesh> {
    let layer = meshes.first()?.layer.clone();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for mesh in meshes {
        let offset = vertices.len() as u32;
        vertices.extend(mesh.vertices);
        indices.extend(mesh.triangle_indices.into_iter().map(|i| i + offset));
    }
    Some(Mesh::new(layer, vertices, indices))
}
