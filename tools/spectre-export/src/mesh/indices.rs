//! Index merging
//!
//! Each mesh's local triangle indices are rebased onto the merged vertex
//! buffer. A mesh's vertex base is the running *vertex* count of the meshes
//! before it; its draw range starts at the running *index* count.

use spectre_common::{IndexWidth, Mesh};

use super::types::MergeGroup;
use crate::error::{ExportError, ExportResult};

/// First merged vertex of each mesh in a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBases {
    bases: Vec<u32>,
    total: u32,
}

impl VertexBases {
    /// Prefix sums of the group's vertex counts
    ///
    /// Fails when the merged vertex count does not fit a 32-bit index.
    pub fn compute(group: &MergeGroup) -> ExportResult<Self> {
        let mut bases = Vec::with_capacity(group.len());
        let mut total: u32 = 0;

        for (position, mesh) in group.meshes.iter().enumerate() {
            bases.push(total);
            total = total
                .checked_add(mesh.vertex_count)
                .ok_or_else(|| ExportError::IndexOverflow {
                    group: group.name.to_string(),
                    mesh: position,
                    index: total as u64 + mesh.vertex_count as u64,
                    width: IndexWidth::U32,
                })?;
        }

        Ok(Self { bases, total })
    }

    /// Base of the mesh at `position` in the group
    #[inline]
    pub fn base(&self, position: usize) -> u32 {
        self.bases[position]
    }

    /// Total merged vertex count
    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.bases
    }
}

/// Contiguous span of the merged index buffer drawn for one mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub index_offset: u32,
    pub index_count: u32,
}

/// Merged index buffer plus one draw range per mesh
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergedIndices {
    pub indices: Vec<u32>,
    pub ranges: Vec<DrawRange>,
}

/// Merge the triangle lists of `group` into one index buffer
///
/// Every local index is checked against its mesh's vertex count and every
/// merged index against `width`.
pub fn merge_indices(
    group: &MergeGroup,
    bases: &VertexBases,
    width: IndexWidth,
) -> ExportResult<MergedIndices> {
    let index_total: usize = group.meshes.iter().map(|m| m.face_count() * 3).sum();
    let mut merged = MergedIndices {
        indices: Vec::with_capacity(index_total),
        ranges: Vec::with_capacity(group.len()),
    };

    for (position, mesh) in group.meshes.iter().enumerate() {
        let index_offset = merged.indices.len() as u32;
        append_mesh(
            &mut merged.indices,
            group.name,
            position,
            mesh,
            bases.base(position),
            width,
        )?;
        merged.ranges.push(DrawRange {
            index_offset,
            index_count: merged.indices.len() as u32 - index_offset,
        });
    }

    tracing::debug!(
        "Group '{}': merged {} indices over {} vertices",
        group.name,
        merged.indices.len(),
        bases.total()
    );

    Ok(merged)
}

fn append_mesh(
    out: &mut Vec<u32>,
    group: &str,
    position: usize,
    mesh: &Mesh,
    base: u32,
    width: IndexWidth,
) -> ExportResult<()> {
    let max = width.max_index() as u64;

    for (face_index, face) in mesh.faces.iter().enumerate() {
        for &local in &face.0 {
            if local >= mesh.vertex_count {
                return Err(ExportError::VertexIndexOutOfRange {
                    group: group.to_string(),
                    mesh: position,
                    face: face_index,
                    index: local,
                    vertex_count: mesh.vertex_count,
                });
            }

            let index = base as u64 + local as u64;
            if index > max {
                return Err(ExportError::IndexOverflow {
                    group: group.to_string(),
                    mesh: position,
                    index,
                    width,
                });
            }
            out.push(index as u32);
        }
    }

    Ok(())
}
