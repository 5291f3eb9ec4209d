//! Crate-wide error taxonomy.
//!
//! The core never raises on *interpretable* data — degenerate geometry,
//! numerical edges, and oversized input are all absorbed with a documented
//! fallback (see the individual module docs). [`PreprocessError`] exists only
//! for the handful of genuine precondition violations a parser adapter can
//! commit against the core's contract.

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error(
        "mesh on layer {layer:?} has {vertex_count} vertices but triangle_indices (len {triangle_index_count}) references index {max_index}"
    )]
    MismatchedMeshIndices {
        layer: String,
        vertex_count: usize,
        triangle_index_count: usize,
        max_index: usize,
    },

    #[error("invalid option: {reason}")]
    InvalidOption { reason: String },
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
