//! Attribute capability flags and group validation
//!
//! A merge group must be attribute-homogeneous: every mesh presents the same
//! attribute set as the first one. The set is computed once per group and
//! threaded through the passes instead of being queried per vertex.

use smallvec::SmallVec;
use spectre_common::{Mesh, Semantic, FORMAT_NORMAL, FORMAT_TANGENT};

use super::types::{MergeGroup, INLINE_UV_CHANNELS};
use crate::error::{AttributeMismatch, ExportError, ExportResult, MissingData};

/// Which per-vertex attributes a mesh carries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSet {
    /// `FORMAT_NORMAL` | `FORMAT_TANGENT`
    pub flags: u8,
    /// Declared component count of each UV channel
    pub uv_components: SmallVec<[u8; INLINE_UV_CHANNELS]>,
    pub color_channels: usize,
}

impl AttributeSet {
    /// Capability flags of `mesh`
    ///
    /// A tangent frame only counts when both tangents and bitangents exist.
    pub fn of(mesh: &Mesh) -> Self {
        let mut flags = 0u8;
        if mesh.has_normals() {
            flags |= FORMAT_NORMAL;
        }
        if mesh.has_tangents_and_bitangents() {
            flags |= FORMAT_TANGENT;
        }

        Self {
            flags,
            uv_components: mesh.uv_channels.iter().map(|c| c.components).collect(),
            color_channels: mesh.color_channels.len(),
        }
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        self.flags & FORMAT_NORMAL != 0
    }

    #[inline]
    pub fn has_tangents(&self) -> bool {
        self.flags & FORMAT_TANGENT != 0
    }

    /// First attribute on which `other` differs from `self`
    pub fn mismatch(&self, other: &AttributeSet) -> Option<AttributeMismatch> {
        if self.has_normals() != other.has_normals() {
            return Some(AttributeMismatch::Normals {
                expected: self.has_normals(),
                found: other.has_normals(),
            });
        }
        if self.has_tangents() != other.has_tangents() {
            return Some(AttributeMismatch::TangentFrame {
                expected: self.has_tangents(),
                found: other.has_tangents(),
            });
        }
        if self.uv_components.len() != other.uv_components.len() {
            return Some(AttributeMismatch::UvChannelCount {
                expected: self.uv_components.len(),
                found: other.uv_components.len(),
            });
        }
        for (channel, (&expected, &found)) in self
            .uv_components
            .iter()
            .zip(other.uv_components.iter())
            .enumerate()
        {
            if expected != found {
                return Some(AttributeMismatch::UvComponents {
                    channel,
                    expected,
                    found,
                });
            }
        }
        if self.color_channels != other.color_channels {
            return Some(AttributeMismatch::ColorChannelCount {
                expected: self.color_channels,
                found: other.color_channels,
            });
        }
        None
    }

    /// Check `mesh` (at `position` in `group`) against this set
    pub(crate) fn check(&self, group: &str, position: usize, mesh: &Mesh) -> ExportResult<()> {
        match self.mismatch(&AttributeSet::of(mesh)) {
            Some(mismatch) => Err(ExportError::MalformedGroup {
                group: group.to_string(),
                mesh: position,
                mismatch,
            }),
            None => Ok(()),
        }
    }
}

/// Validate every mesh of `group` and return the group's attribute set
///
/// Checks, per mesh: non-zero vertex and face counts, positions present,
/// tangents paired with bitangents, UV component counts in 1..=4, attribute
/// array lengths equal to the vertex count, and homogeneity with mesh #0.
pub fn validate_group(group: &MergeGroup) -> ExportResult<AttributeSet> {
    let first = group.meshes.first().ok_or_else(|| ExportError::EmptyGroup {
        group: group.name.to_string(),
    })?;
    let attributes = AttributeSet::of(first);

    for (position, mesh) in group.meshes.iter().enumerate() {
        check_mesh(group.name, position, mesh)?;
        attributes.check(group.name, position, mesh)?;
    }

    tracing::debug!(
        "Group '{}': {} meshes, normals={}, tangents={}, uv channels={}, color channels={}",
        group.name,
        group.len(),
        attributes.has_normals(),
        attributes.has_tangents(),
        attributes.uv_components.len(),
        attributes.color_channels
    );

    Ok(attributes)
}

/// Structural checks on a single mesh
fn check_mesh(group: &str, position: usize, mesh: &Mesh) -> ExportResult<()> {
    let empty = |missing| ExportError::EmptyMesh {
        group: group.to_string(),
        mesh: position,
        missing,
    };

    if mesh.vertex_count == 0 {
        return Err(empty(MissingData::Vertices));
    }
    if mesh.faces.is_empty() {
        return Err(empty(MissingData::Faces));
    }
    let positions = mesh
        .positions
        .as_ref()
        .ok_or_else(|| empty(MissingData::Positions))?;

    if mesh.tangents.is_some() != mesh.bitangents.is_some() {
        return Err(ExportError::UnpairedTangents {
            group: group.to_string(),
            mesh: position,
        });
    }

    for (channel, uv) in mesh.uv_channels.iter().enumerate() {
        if !(1..=4).contains(&uv.components) {
            return Err(ExportError::InvalidUvComponents {
                group: group.to_string(),
                mesh: position,
                channel,
                components: uv.components,
            });
        }
    }

    let expected = mesh.vertex_count as usize;
    let check_len = |semantic: Semantic, actual: usize| {
        if actual == expected {
            Ok(())
        } else {
            Err(ExportError::AttributeLength {
                group: group.to_string(),
                mesh: position,
                semantic,
                expected,
                actual,
            })
        }
    };

    check_len(Semantic::Position, positions.len())?;
    if let Some(normals) = &mesh.normals {
        check_len(Semantic::Normal, normals.len())?;
    }
    if let (Some(tangents), Some(bitangents)) = (&mesh.tangents, &mesh.bitangents) {
        check_len(Semantic::Tangent, tangents.len())?;
        check_len(Semantic::Bitangent, bitangents.len())?;
    }
    for (channel, uv) in mesh.uv_channels.iter().enumerate() {
        check_len(Semantic::TexCoord(channel as u8), uv.coords.len())?;
    }
    for (channel, colors) in mesh.color_channels.iter().enumerate() {
        check_len(Semantic::Color(channel as u8), colors.len())?;
    }

    Ok(())
}
