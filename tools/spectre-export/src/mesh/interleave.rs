//! Interleaved vertex buffer building
//!
//! One record per vertex, attribute by attribute in descriptor order,
//! concatenated across the group's meshes in group order. Slots beyond an
//! attribute's natural width are zero-filled, except the fourth position
//! component which is 1.0 (homogeneous point).

use smallvec::SmallVec;
use spectre_common::{AttributeDescriptor, Mesh, Semantic, VertexLayout};

use super::attributes::AttributeSet;
use super::types::MergeGroup;
use crate::error::{ExportError, ExportResult};

/// Per-vertex data source backing one descriptor
#[derive(Clone, Copy)]
enum Source<'a> {
    Vector(&'a [[f32; 3]]),
    Wide(&'a [[f32; 4]]),
}

impl Source<'_> {
    fn len(&self) -> usize {
        match self {
            Source::Vector(data) => data.len(),
            Source::Wide(data) => data.len(),
        }
    }

    /// All stored components of vertex `index`
    fn components(&self, index: usize) -> &[f32] {
        match self {
            Source::Vector(data) => &data[index],
            Source::Wide(data) => &data[index],
        }
    }
}

/// Build the interleaved vertex buffer for `group`
///
/// Fails with [`ExportError::MalformedGroup`] when a mesh's attribute set
/// differs from `attributes`, and with [`ExportError::AttributeLength`] when
/// an attribute array does not cover every vertex.
pub fn build_vertex_buffer(
    group: &MergeGroup,
    attributes: &AttributeSet,
    layout: &VertexLayout,
) -> ExportResult<Vec<f32>> {
    let float_stride = layout.float_stride();
    let vertex_count = group.total_vertex_count() as usize;
    let mut data = Vec::with_capacity(vertex_count * float_stride);

    for (position, mesh) in group.meshes.iter().enumerate() {
        attributes.check(group.name, position, mesh)?;
        let sources = bind_sources(group.name, position, mesh, layout)?;

        for i in 0..mesh.vertex_count as usize {
            for (source, descriptor) in &sources {
                write_attribute(&mut data, source.components(i), descriptor);
            }
        }
    }

    debug_assert_eq!(data.len(), vertex_count * float_stride);
    tracing::debug!(
        "Group '{}': interleaved {} vertices ({} floats)",
        group.name,
        vertex_count,
        data.len()
    );

    Ok(data)
}

/// Pair each descriptor with the mesh array it reads from
fn bind_sources<'a, 'l>(
    group: &str,
    position: usize,
    mesh: &'a Mesh,
    layout: &'l VertexLayout,
) -> ExportResult<SmallVec<[(Source<'a>, &'l AttributeDescriptor); 16]>> {
    let mut sources = SmallVec::new();

    for descriptor in &layout.attributes {
        let source = match descriptor.semantic {
            Semantic::Position => mesh.positions.as_deref().map(Source::Vector),
            Semantic::Normal => mesh.normals.as_deref().map(Source::Vector),
            Semantic::Tangent => mesh.tangents.as_deref().map(Source::Vector),
            Semantic::Bitangent => mesh.bitangents.as_deref().map(Source::Vector),
            Semantic::TexCoord(channel) => mesh
                .uv_channels
                .get(channel as usize)
                .map(|uv| Source::Wide(&uv.coords)),
            Semantic::Color(channel) => mesh
                .color_channels
                .get(channel as usize)
                .map(|colors| Source::Wide(colors)),
        };

        let actual = source.map_or(0, |s| s.len());
        match source {
            Some(source) if actual == mesh.vertex_count as usize => {
                sources.push((source, descriptor));
            }
            _ => {
                return Err(ExportError::AttributeLength {
                    group: group.to_string(),
                    mesh: position,
                    semantic: descriptor.semantic,
                    expected: mesh.vertex_count as usize,
                    actual,
                });
            }
        }
    }

    Ok(sources)
}

/// Append one attribute value, padded to the descriptor's width
#[inline]
fn write_attribute(data: &mut Vec<f32>, components: &[f32], descriptor: &AttributeDescriptor) {
    let natural = descriptor.component_count as usize;
    data.extend_from_slice(&components[..natural]);

    for slot in natural..descriptor.width as usize {
        let fill = if descriptor.semantic == Semantic::Position && slot == 3 {
            1.0
        } else {
            0.0
        };
        data.push(fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{plan_layout, validate_group};
    use spectre_common::{LayoutMode, UvChannel};

    fn quad(offset: f32) -> Mesh {
        Mesh::new(
            "quad",
            vec![
                [offset, 0.0, 0.0],
                [offset + 1.0, 0.0, 0.0],
                [offset + 1.0, 1.0, 0.0],
                [offset, 1.0, 0.0],
            ],
        )
        .with_faces(&[[0, 1, 2], [0, 2, 3]])
        .with_normals(vec![[0.0, 0.0, 1.0]; 4])
        .with_uv_channel(UvChannel::from_uv(&[
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ]))
    }

    fn build(group: &MergeGroup, mode: LayoutMode) -> (VertexLayout, Vec<f32>) {
        let attributes = validate_group(group).unwrap();
        let layout = plan_layout(&attributes, mode);
        let data = build_vertex_buffer(group, &attributes, &layout).unwrap();
        (layout, data)
    }

    #[test]
    fn test_packed_record() {
        let mesh = quad(0.0);
        let group = MergeGroup::new("g", vec![&mesh]);
        let (layout, data) = build(&group, LayoutMode::Packed);
        assert_eq!(layout.float_stride(), 8);
        assert_eq!(data.len(), 4 * 8);
        // Vertex 2: position, normal, uv
        assert_eq!(&data[16..24], &[1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_padded_record() {
        let mesh = quad(0.0);
        let group = MergeGroup::new("g", vec![&mesh]);
        let (layout, data) = build(&group, LayoutMode::Padded);
        assert_eq!(layout.float_stride(), 12);
        assert_eq!(
            &data[12..24],
            &[
                1.0, 0.0, 0.0, 1.0, // position, w = 1
                0.0, 0.0, 1.0, 0.0, // normal, padded with 0
                1.0, 0.0, 0.0, 0.0, // uv, two real values then zeros
            ]
        );
    }

    #[test]
    fn test_meshes_concatenate_in_order() {
        let a = quad(0.0);
        let b = quad(10.0);
        let group = MergeGroup::new("g", vec![&a, &b]);
        let (layout, data) = build(&group, LayoutMode::Packed);
        let stride = layout.float_stride();
        assert_eq!(data.len() / stride, 8);
        assert_eq!(data[4 * stride], 10.0, "mesh b starts at vertex 4");
    }

    #[test]
    fn test_color_written_four_wide() {
        let mesh = Mesh::new("c", vec![[0.0; 3]])
            .with_faces(&[[0, 0, 0]])
            .with_color_channel(vec![[0.1, 0.2, 0.3, 0.4]]);
        let group = MergeGroup::new("g", vec![&mesh]);
        let (_, data) = build(&group, LayoutMode::Packed);
        assert_eq!(data, vec![0.0, 0.0, 0.0, 0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_one_component_uv_padded() {
        let mesh = Mesh::new("u", vec![[0.0; 3]])
            .with_faces(&[[0, 0, 0]])
            .with_uv_channel(UvChannel {
                components: 1,
                coords: vec![[0.75, 9.0, 9.0, 9.0]],
            });
        let group = MergeGroup::new("g", vec![&mesh]);

        let (_, packed) = build(&group, LayoutMode::Packed);
        assert_eq!(packed, vec![0.0, 0.0, 0.0, 0.75]);

        let (_, padded) = build(&group, LayoutMode::Padded);
        assert_eq!(padded, vec![0.0, 0.0, 0.0, 1.0, 0.75, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mismatched_mesh_rejected() {
        let a = quad(0.0);
        let mut b = quad(1.0);
        b.uv_channels.clear();
        let attributes = AttributeSet::of(&a);
        let layout = plan_layout(&attributes, LayoutMode::Packed);
        let group = MergeGroup::new("g", vec![&a, &b]);
        assert!(matches!(
            build_vertex_buffer(&group, &attributes, &layout),
            Err(ExportError::MalformedGroup { mesh: 1, .. })
        ));
    }

    #[test]
    fn test_short_attribute_rejected() {
        let mut mesh = quad(0.0);
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        let attributes = AttributeSet::of(&mesh);
        let layout = plan_layout(&attributes, LayoutMode::Packed);
        let group = MergeGroup::new("g", vec![&mesh]);
        assert!(matches!(
            build_vertex_buffer(&group, &attributes, &layout),
            Err(ExportError::AttributeLength {
                semantic: Semantic::Normal,
                actual: 3,
                ..
            })
        ));
    }
}
