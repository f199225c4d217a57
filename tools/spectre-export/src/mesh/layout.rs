//! Vertex layout planning
//!
//! Layout order: Position → Normal → Tangent → Bitangent → TexCoord0..n → Color0..n
//! - Packed: each attribute takes its natural width (color is always 4 wide)
//! - Padded: each attribute takes 4 floats (16 bytes)

use smallvec::SmallVec;
use spectre_common::formats::{COLOR_COMPONENTS, ELEMENT_SIZE};
use spectre_common::{AttributeDescriptor, ElementFormat, LayoutMode, Semantic, VertexLayout};

use super::attributes::AttributeSet;

/// Natural component count of position, normal, tangent and bitangent
const VECTOR_COMPONENTS: u32 = 3;

/// Plan the interleaved layout for a group with `attributes`
///
/// Pure: the same attribute set and mode always yield the same layout.
/// UV component counts are expected to be validated (1..=4) beforehand.
pub fn plan_layout(attributes: &AttributeSet, mode: LayoutMode) -> VertexLayout {
    let mut entries: SmallVec<[(Semantic, u32); 16]> = SmallVec::new();

    entries.push((Semantic::Position, VECTOR_COMPONENTS));
    if attributes.has_normals() {
        entries.push((Semantic::Normal, VECTOR_COMPONENTS));
    }
    if attributes.has_tangents() {
        entries.push((Semantic::Tangent, VECTOR_COMPONENTS));
        entries.push((Semantic::Bitangent, VECTOR_COMPONENTS));
    }
    for (channel, &components) in attributes.uv_components.iter().enumerate() {
        debug_assert!((1..=4).contains(&components));
        entries.push((Semantic::TexCoord(channel as u8), components.clamp(1, 4) as u32));
    }
    for channel in 0..attributes.color_channels {
        entries.push((Semantic::Color(channel as u8), COLOR_COMPONENTS));
    }

    let stride: u32 = entries
        .iter()
        .map(|&(_, components)| mode.width(components) * ELEMENT_SIZE)
        .sum();

    let mut byte_offset = 0;
    let attributes = entries
        .iter()
        .map(|&(semantic, components)| {
            let width = mode.width(components);
            let descriptor = AttributeDescriptor {
                semantic,
                component_count: components,
                width,
                byte_offset,
                stride,
                format: element_format(components),
            };
            byte_offset += width * ELEMENT_SIZE;
            descriptor
        })
        .collect();

    tracing::debug!("Planned {:?} vertex layout: stride={} bytes", mode, stride);

    VertexLayout {
        mode,
        attributes,
        stride,
    }
}

fn element_format(components: u32) -> ElementFormat {
    ElementFormat::from_components(components).unwrap_or(ElementFormat::Float4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectre_common::{Mesh, UvChannel};

    fn full_mesh() -> Mesh {
        Mesh::new("full", vec![[0.0; 3]])
            .with_normals(vec![[0.0, 1.0, 0.0]])
            .with_tangent_frame(vec![[1.0, 0.0, 0.0]], vec![[0.0, 0.0, 1.0]])
            .with_uv_channel(UvChannel::from_uv(&[[0.5, 0.5]]))
            .with_uv_channel(UvChannel {
                components: 3,
                coords: vec![[0.1, 0.2, 0.3, 0.0]],
            })
            .with_color_channel(vec![[1.0, 0.0, 0.0, 1.0]])
    }

    fn semantics(layout: &VertexLayout) -> Vec<Semantic> {
        layout.attributes.iter().map(|a| a.semantic).collect()
    }

    #[test]
    fn test_emission_order() {
        let layout = plan_layout(&AttributeSet::of(&full_mesh()), LayoutMode::Packed);
        assert_eq!(
            semantics(&layout),
            vec![
                Semantic::Position,
                Semantic::Normal,
                Semantic::Tangent,
                Semantic::Bitangent,
                Semantic::TexCoord(0),
                Semantic::TexCoord(1),
                Semantic::Color(0),
            ]
        );
    }

    #[test]
    fn test_packed_offsets() {
        let layout = plan_layout(&AttributeSet::of(&full_mesh()), LayoutMode::Packed);
        let offsets: Vec<u32> = layout.attributes.iter().map(|a| a.byte_offset).collect();
        // 3 + 3 + 3 + 3 + 2 + 3 + 4 floats
        assert_eq!(offsets, vec![0, 12, 24, 36, 48, 56, 68]);
        assert_eq!(layout.stride, 84);
        assert!(layout.attributes.iter().all(|a| a.stride == 84));
        assert!(layout
            .attributes
            .iter()
            .all(|a| a.width == a.component_count));
    }

    #[test]
    fn test_padded_offsets() {
        let layout = plan_layout(&AttributeSet::of(&full_mesh()), LayoutMode::Padded);
        let offsets: Vec<u32> = layout.attributes.iter().map(|a| a.byte_offset).collect();
        assert_eq!(offsets, vec![0, 16, 32, 48, 64, 80, 96]);
        assert_eq!(layout.stride, 7 * 16);
        assert!(layout.attributes.iter().all(|a| a.width == 4));
    }

    #[test]
    fn test_formats_follow_natural_width() {
        let layout = plan_layout(&AttributeSet::of(&full_mesh()), LayoutMode::Padded);
        let uv0 = layout.attribute(Semantic::TexCoord(0)).unwrap();
        assert_eq!(uv0.format, ElementFormat::Float2);
        assert_eq!(uv0.component_count, 2);
        let position = layout.attribute(Semantic::Position).unwrap();
        assert_eq!(position.format, ElementFormat::Float3);
        let color = layout.attribute(Semantic::Color(0)).unwrap();
        assert_eq!(color.format, ElementFormat::Float4);
    }

    #[test]
    fn test_position_only() {
        let mesh = Mesh::new("p", vec![[0.0; 3]]);
        let packed = plan_layout(&AttributeSet::of(&mesh), LayoutMode::Packed);
        assert_eq!(packed.stride, 12);
        let padded = plan_layout(&AttributeSet::of(&mesh), LayoutMode::Padded);
        assert_eq!(padded.stride, 16);
        assert_eq!(padded.attributes.len(), 1);
    }

    #[test]
    fn test_padded_position_normal_uv_stride() {
        let mesh = Mesh::new("c", vec![[0.0; 3]])
            .with_normals(vec![[0.0, 0.0, 1.0]])
            .with_uv_channel(UvChannel::from_uv(&[[0.0, 0.0]]));
        let layout = plan_layout(&AttributeSet::of(&mesh), LayoutMode::Padded);
        assert_eq!(layout.float_stride(), 12);
        assert_eq!(layout.stride, 48);
    }

    #[test]
    fn test_planning_is_idempotent() {
        let set = AttributeSet::of(&full_mesh());
        for mode in [LayoutMode::Packed, LayoutMode::Padded] {
            assert_eq!(plan_layout(&set, mode), plan_layout(&set, mode));
        }
    }
}
