//! spectre-export library
//!
//! Merges the meshes of one scene node into GPU-ready interleaved vertex and
//! index buffers, aggregates skin weights over the node hierarchy and encodes
//! animation tracks, producing one [`Document`] per export.

pub mod animation;
pub mod config;
pub mod document;
pub mod error;
pub mod mesh;
pub mod skeleton;

// Re-export the shared scene and document types
pub use spectre_common::{
    AnimationRecord, AttributeDescriptor, BoneRecord, Bounds, Document, ElementFormat, IndexWidth,
    LayoutMode, Scene, Semantic, Submesh, VertexLayout,
};

pub use config::ExportConfig;
pub use document::{export_group, export_scene, list_merge_groups};
pub use error::{AttributeMismatch, ExportError, ExportResult, MissingData};

// Re-export the individual passes
pub use animation::{encode_animations, list_animations};
pub use mesh::{
    build_vertex_buffer, merge_indices, plan_layout, validate_group, AttributeSet, MergeGroup,
    VertexBases,
};
pub use skeleton::aggregate_skeleton;
