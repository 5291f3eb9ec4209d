//! Stable JSON encoding for the file-based parser/writer handoff.
//!
//! Field names are snake_case, `None` fields are omitted, and the writer is
//! pretty-printed — this module only defines the `serde` shapes and a thin
//! `to_string_pretty` wrapper; it takes no position on *how* the bytes
//! reach disk (that belongs to the external writer).

use serde::Serialize;

use crate::dto::OptimizedGeometry;
use crate::error::{PreprocessError, Result};

#[derive(Debug, Serialize)]
struct PolylineJson {
    layer: String,
    points: Vec<[f64; 3]>,
    closed: bool,
}

#[derive(Debug, Serialize)]
struct StatsJson {
    original_vertices: usize,
    optimized_vertices: usize,
    reduction_percent: f64,
    original_entities: usize,
    optimized_polylines: usize,
    entity_counts: std::collections::BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
struct GeometryJson {
    polylines: Vec<PolylineJson>,
    stats: StatsJson,
}

/// Serializes the polylines + stats half of an [`OptimizedGeometry`] to the
/// stable wire format. Mesh primitives are the binary writer's
/// concern, not this JSON handoff.
pub fn to_string_pretty(geometry: &OptimizedGeometry) -> Result<String> {
    let doc = GeometryJson {
        polylines: geometry
            .polylines
            .iter()
            .map(|p| PolylineJson {
                layer: p.layer.clone(),
                points: p.points.iter().map(|v| v.to_array()).collect(),
                closed: p.is_closed,
            })
            .collect(),
        stats: StatsJson {
            original_vertices: geometry.stats.original_vertices,
            optimized_vertices: geometry.stats.optimized_vertices,
            reduction_percent: round_two_decimals(geometry.stats.reduction_percent()),
            original_entities: geometry.stats.original_entities,
            optimized_polylines: geometry.stats.optimized_polylines,
            entity_counts: geometry.stats.entity_counts.clone(),
        },
    };

    serde_json::to_string_pretty(&doc).map_err(|e| PreprocessError::InvalidOption {
        reason: format!("failed to serialize geometry: {e}"),
    })
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
