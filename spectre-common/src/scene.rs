//! Read-only input scene graph
//!
//! Produced once by an external importer and never mutated by the exporter.
//! The node tree owns its children exclusively; meshes and animations live in
//! flat scene-level tables and are referenced from nodes by index.
//!
//! All types derive serde traits so an importer running in another process can
//! hand a scene over as JSON.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Root of an imported scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Root of the node tree
    pub root: Node,
    /// Global mesh table, referenced by [`Node::meshes`]
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    /// Global animation table
    #[serde(default)]
    pub animations: Vec<Animation>,
}

impl Scene {
    pub fn new(root: Node) -> Self {
        Self {
            root,
            meshes: Vec::new(),
            animations: Vec::new(),
        }
    }

    /// Look up a mesh from the global table
    pub fn mesh(&self, index: usize) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    /// Find the first node with the given name (pre-order)
    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.root.find(name)
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Transform relative to the parent node
    #[serde(default = "identity")]
    pub transform: Mat4,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Indices into [`Scene::meshes`]
    #[serde(default)]
    pub meshes: Vec<usize>,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }

    /// Iterate this node and all of its descendants in depth-first pre-order
    pub fn descendants(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Find the first node (pre-order) named `name`, including `self`
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.descendants().find(|node| node.name == name)
    }
}

/// Depth-first pre-order iterator over a node subtree
pub struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reversed so the first child is visited first
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// One triangle of mesh-local vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face(pub [u32; 3]);

/// A texture coordinate channel
///
/// Coordinates are stored 4-wide; only the first `components` values of each
/// entry carry data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvChannel {
    /// Declared component count (1-4)
    pub components: u8,
    pub coords: Vec<[f32; 4]>,
}

impl UvChannel {
    /// Build a 2-component channel from `[u, v]` pairs
    pub fn from_uv(coords: &[[f32; 2]]) -> Self {
        Self {
            components: 2,
            coords: coords.iter().map(|c| [c[0], c[1], 0.0, 0.0]).collect(),
        }
    }
}

/// A mesh with optional per-vertex attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub name: String,
    pub vertex_count: u32,
    #[serde(default)]
    pub positions: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    pub normals: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    pub tangents: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    pub bitangents: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    pub uv_channels: Vec<UvChannel>,
    /// RGBA color channels
    #[serde(default)]
    pub color_channels: Vec<Vec<[f32; 4]>>,
    #[serde(default)]
    pub faces: Vec<Face>,
    #[serde(default)]
    pub bones: Vec<Bone>,
}

impl Mesh {
    /// Create a mesh from positions; `vertex_count` follows the position count
    ///
    /// More than `u32::MAX` positions saturates `vertex_count`, so the position
    /// array no longer matches it and export validation rejects the mesh.
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>) -> Self {
        Self {
            name: name.into(),
            vertex_count: u32::try_from(positions.len()).unwrap_or(u32::MAX),
            positions: Some(positions),
            normals: None,
            tangents: None,
            bitangents: None,
            uv_channels: Vec::new(),
            color_channels: Vec::new(),
            faces: Vec::new(),
            bones: Vec::new(),
        }
    }

    pub fn with_faces(mut self, faces: &[[u32; 3]]) -> Self {
        self.faces.extend(faces.iter().copied().map(Face));
        self
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_tangent_frame(mut self, tangents: Vec<[f32; 3]>, bitangents: Vec<[f32; 3]>) -> Self {
        self.tangents = Some(tangents);
        self.bitangents = Some(bitangents);
        self
    }

    pub fn with_uv_channel(mut self, channel: UvChannel) -> Self {
        self.uv_channels.push(channel);
        self
    }

    pub fn with_color_channel(mut self, colors: Vec<[f32; 4]>) -> Self {
        self.color_channels.push(colors);
        self
    }

    pub fn with_bone(mut self, bone: Bone) -> Self {
        self.bones.push(bone);
        self
    }

    pub fn has_positions(&self) -> bool {
        self.positions.is_some()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Tangents and bitangents only count when both are present
    pub fn has_tangents_and_bitangents(&self) -> bool {
        self.tangents.is_some() && self.bitangents.is_some()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Find the bone named `name`
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name == name)
    }
}

/// A skin weight: influence of one bone on one mesh-local vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexWeight {
    pub vertex_id: u32,
    pub weight: f32,
}

/// A bone attached to a mesh, linked to a hierarchy node by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Mesh space to bone space at bind time
    #[serde(default = "identity")]
    pub offset_matrix: Mat4,
    #[serde(default)]
    pub weights: Vec<VertexWeight>,
}

impl Bone {
    pub fn new(name: impl Into<String>, offset_matrix: Mat4) -> Self {
        Self {
            name: name.into(),
            offset_matrix,
            weights: Vec::new(),
        }
    }

    pub fn with_weights(mut self, weights: &[(u32, f32)]) -> Self {
        self.weights.extend(
            weights
                .iter()
                .map(|&(vertex_id, weight)| VertexWeight { vertex_id, weight }),
        );
        self
    }
}

/// A 3-vector keyframe (position or scale)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorKey {
    pub time: f64,
    pub value: Vec3,
}

/// A rotation keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuatKey {
    pub time: f64,
    pub value: Quat,
}

/// Keyframe tracks for one animated node
///
/// The three tracks are timed independently and may differ in length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAnimation {
    pub node_name: String,
    #[serde(default)]
    pub position_keys: Vec<VectorKey>,
    #[serde(default)]
    pub rotation_keys: Vec<QuatKey>,
    #[serde(default)]
    pub scaling_keys: Vec<VectorKey>,
}

/// An animation clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub ticks_per_second: f64,
    /// Duration in ticks
    pub duration: f64,
    #[serde(default)]
    pub channels: Vec<NodeAnimation>,
}
