//! Export error taxonomy
//!
//! Every variant is a structural defect in the input scene. Checks run before
//! the affected buffer is emitted, so an error never comes with partial output.

use spectre_common::{IndexWidth, Semantic};

/// Result alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Attribute on which a mesh disagrees with the first mesh of its group
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeMismatch {
    #[error("normals present: expected {expected}, found {found}")]
    Normals { expected: bool, found: bool },

    #[error("tangents/bitangents present: expected {expected}, found {found}")]
    TangentFrame { expected: bool, found: bool },

    #[error("UV channel count: expected {expected}, found {found}")]
    UvChannelCount { expected: usize, found: usize },

    #[error("UV channel {channel} components: expected {expected}, found {found}")]
    UvComponents { channel: usize, expected: u8, found: u8 },

    #[error("color channel count: expected {expected}, found {found}")]
    ColorChannelCount { expected: usize, found: usize },
}

/// Data an empty mesh is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingData {
    Vertices,
    Faces,
    Positions,
}

impl std::fmt::Display for MissingData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingData::Vertices => f.write_str("no vertices"),
            MissingData::Faces => f.write_str("no faces"),
            MissingData::Positions => f.write_str("no positions"),
        }
    }
}

/// Error raised by an export
///
/// `group` is the name of the merge-group node; `mesh` is the position of the
/// offending mesh within that group.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    /// Meshes in one merge group disagree on attribute presence
    #[error("malformed group '{group}': mesh #{mesh} differs from mesh #0 ({mismatch})")]
    MalformedGroup {
        group: String,
        mesh: usize,
        mismatch: AttributeMismatch,
    },

    #[error("group '{group}': mesh #{mesh} has tangents without bitangents or vice versa")]
    UnpairedTangents { group: String, mesh: usize },

    #[error("group '{group}': mesh #{mesh} {semantic} has {actual} entries, expected {expected}")]
    AttributeLength {
        group: String,
        mesh: usize,
        semantic: Semantic,
        expected: usize,
        actual: usize,
    },

    #[error("group '{group}': mesh #{mesh} UV channel {channel} declares {components} components (must be 1-4)")]
    InvalidUvComponents {
        group: String,
        mesh: usize,
        channel: usize,
        components: u8,
    },

    #[error("group '{group}' references no meshes")]
    EmptyGroup { group: String },

    #[error("group '{group}': mesh #{mesh} has {missing}")]
    EmptyMesh {
        group: String,
        mesh: usize,
        missing: MissingData,
    },

    #[error("group '{group}' references mesh {index}, which is not in the scene")]
    MeshIndexOutOfRange { group: String, index: usize },

    #[error("group '{group}': mesh #{mesh} face {face} references vertex {index} (vertex count {vertex_count})")]
    VertexIndexOutOfRange {
        group: String,
        mesh: usize,
        face: usize,
        index: u32,
        vertex_count: u32,
    },

    #[error("group '{group}': mesh #{mesh} bone '{bone}' weights vertex {index} (vertex count {vertex_count})")]
    BoneVertexOutOfRange {
        group: String,
        mesh: usize,
        bone: String,
        index: u32,
        vertex_count: u32,
    },

    /// A mesh bone names no node in the skeleton hierarchy
    #[error("group '{group}': mesh #{mesh} bone '{bone}' matches no node in the skeleton hierarchy")]
    UnresolvedBoneReference {
        group: String,
        mesh: usize,
        bone: String,
    },

    #[error("skeleton hierarchy contains node name '{name}' more than once")]
    DuplicateNodeName { name: String },

    /// A merged index does not fit the configured index width
    #[error("group '{group}': mesh #{mesh} merged index {index} exceeds {width:?} maximum {}", .width.max_index())]
    IndexOverflow {
        group: String,
        mesh: usize,
        index: u64,
        width: IndexWidth,
    },

    /// The skeleton root transform has no inverse, so its offset matrix is undefined
    #[error("skeleton root '{name}' has a singular transform")]
    SingularRootTransform { name: String },

    #[error("node '{name}' not found in scene")]
    NodeNotFound { name: String },

    #[error("no node in the scene references meshes")]
    NoMergeGroup,
}
