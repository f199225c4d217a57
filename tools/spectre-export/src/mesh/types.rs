//! Types shared by the mesh passes

use spectre_common::{Mesh, Node, Scene};

use crate::error::{ExportError, ExportResult};

/// Maximum number of UV channels kept inline before spilling to the heap
pub(crate) const INLINE_UV_CHANNELS: usize = 8;

/// The meshes referenced by one node, merged into shared buffers
///
/// Mesh order is the node's reference order; every pass walks it identically.
#[derive(Debug, Clone)]
pub struct MergeGroup<'a> {
    /// Name of the node that references the meshes
    pub name: &'a str,
    pub meshes: Vec<&'a Mesh>,
}

impl<'a> MergeGroup<'a> {
    /// Resolve the mesh references of `node` against the scene mesh table
    pub fn from_node(scene: &'a Scene, node: &'a Node) -> ExportResult<Self> {
        if node.meshes.is_empty() {
            return Err(ExportError::EmptyGroup {
                group: node.name.clone(),
            });
        }

        let meshes = node
            .meshes
            .iter()
            .map(|&index| {
                scene
                    .mesh(index)
                    .ok_or_else(|| ExportError::MeshIndexOutOfRange {
                        group: node.name.clone(),
                        index,
                    })
            })
            .collect::<ExportResult<Vec<_>>>()?;

        Ok(Self {
            name: &node.name,
            meshes,
        })
    }

    /// Build a group directly from meshes
    pub fn new(name: &'a str, meshes: Vec<&'a Mesh>) -> Self {
        Self { name, meshes }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Sum of vertex counts over the group
    pub fn total_vertex_count(&self) -> u64 {
        self.meshes.iter().map(|m| m.vertex_count as u64).sum()
    }
}
