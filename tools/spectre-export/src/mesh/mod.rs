//! Mesh passes: layout planning, vertex interleaving, index merging, bounds
//!
//! All passes walk a [`MergeGroup`] in the same mesh order. The vertex bases
//! computed once by [`VertexBases::compute`] are shared by the index merger
//! and the skeleton aggregator.

mod attributes;
mod bounds;
mod indices;
mod interleave;
mod layout;
mod types;

// Re-export public API
pub use attributes::{validate_group, AttributeSet};
pub use bounds::submesh_bounds;
pub use indices::{merge_indices, DrawRange, MergedIndices, VertexBases};
pub use interleave::build_vertex_buffer;
pub use layout::plan_layout;
pub use types::MergeGroup;
