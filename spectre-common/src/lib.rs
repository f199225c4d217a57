//! Shared types for the Spectre mesh exporter
//!
//! This crate holds the data that crosses the exporter's boundaries:
//! - `spectre-export` (core) reads a [`scene::Scene`] and produces a
//!   [`formats::Document`]
//! - importers build a [`scene::Scene`]; encoders consume a [`formats::Document`]
//!
//! # Modules
//!
//! - [`scene`] - Read-only input scene graph (nodes, meshes, bones, animations)
//! - [`formats`] - Vertex layout descriptors and the output document tree

pub mod formats;
pub mod scene;

// Re-export commonly used scene items
pub use scene::{
    Animation, Bone, Face, Mesh, Node, NodeAnimation, QuatKey, Scene, UvChannel, VectorKey,
    VertexWeight,
};

// Re-export commonly used format items
pub use formats::{
    AnimationRecord, AttributeDescriptor, BoneRecord, Bounds, ChannelRecord, Document,
    ElementFormat, FORMAT_NORMAL, FORMAT_TANGENT, IndexWidth, LayoutMode, PRIMITIVE_TRIANGLES,
    Semantic, Submesh, VertexLayout,
};
