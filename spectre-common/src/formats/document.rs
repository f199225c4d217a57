//! Export document tree
//!
//! One [`Document`] describes a single merge group: the vertex layout, the
//! interleaved vertex buffer, the merged index buffer, the per-submesh draw
//! ranges and bounds, the skeleton and the animation tracks. It is handed as-is
//! to an encoder; field names serialize in camelCase.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::layout::{Semantic, VertexLayout};
use crate::scene::{QuatKey, VectorKey};

/// Primitive topology of every exported index buffer
pub const PRIMITIVE_TRIANGLES: &str = "triangles";

/// Width of one entry in the merged index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexWidth {
    #[default]
    U16,
    U32,
}

impl IndexWidth {
    /// Largest index representable at this width
    #[inline]
    pub const fn max_index(self) -> u32 {
        match self {
            IndexWidth::U16 => u16::MAX as u32,
            IndexWidth::U32 => u32::MAX,
        }
    }

    /// Size of one index in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }

    /// Width from a bit count (16 or 32)
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(IndexWidth::U16),
            32 => Some(IndexWidth::U32),
            _ => None,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(rename = "aabbMin")]
    pub min: [f32; 3],
    #[serde(rename = "aabbMax")]
    pub max: [f32; 3],
}

impl Bounds {
    /// Inverted box that any point will grow
    pub const EMPTY: Self = Self {
        min: [f32::MAX; 3],
        max: [-f32::MAX; 3],
    };

    /// Grow the box to include `point`
    pub fn encapsulate_point(&mut self, point: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    /// Box covering `points`, [`Bounds::EMPTY`] when there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut bounds, p| {
            bounds.encapsulate_point(*p);
            bounds
        })
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn contains(&self, point: [f32; 3]) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }
}

/// One mesh's contribution to the merged buffers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submesh {
    pub name: String,
    /// First index of this submesh in the merged index buffer
    pub index_offset: u32,
    /// `face_count * 3`
    pub index_count: u32,
    /// Vertex base: first vertex of this submesh in the merged vertex buffer
    pub vertex_offset: u32,
    pub vertex_count: u32,
    #[serde(flatten)]
    pub bounds: Bounds,
}

/// One hierarchy node of the skeleton with its aggregated skin weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoneRecord {
    pub name: String,
    /// Local transform of the hierarchy node
    pub transform: Mat4,
    pub offset_transform: Mat4,
    /// Vertex ids in merged-buffer space
    pub vertices: Vec<u32>,
    /// One weight per entry in `vertices`
    pub weights: Vec<f32>,
    /// Names of the immediate children, in hierarchy order
    pub children: Vec<String>,
}

/// Keyframe tracks of one animated node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub node_name: String,
    pub position_track: Vec<VectorKey>,
    pub rotation_track: Vec<QuatKey>,
    pub scale_track: Vec<VectorKey>,
}

/// An animation clip, transcribed without resampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRecord {
    pub name: String,
    pub ticks_per_second: f64,
    pub duration_ticks: f64,
    pub channels: Vec<ChannelRecord>,
}

/// The assembled export of one merge group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Always [`PRIMITIVE_TRIANGLES`]
    pub primitive: String,
    pub layout: VertexLayout,
    pub index_width: IndexWidth,
    pub submeshes: Vec<Submesh>,
    /// Interleaved vertex records, vertex-major
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    /// Pre-order: every bone appears after its parent
    pub bones: Vec<BoneRecord>,
    pub animations: Vec<AnimationRecord>,
}

impl Document {
    /// Number of vertex records in [`Document::vertices`]
    pub fn vertex_count(&self) -> usize {
        match self.layout.float_stride() {
            0 => 0,
            stride => self.vertices.len() / stride,
        }
    }

    /// Values of `semantic` for vertex `vertex`, without padding
    pub fn attribute_values(&self, vertex: usize, semantic: Semantic) -> Option<&[f32]> {
        let attribute = self.layout.attribute(semantic)?;
        let start = vertex * self.layout.float_stride() + attribute.float_offset();
        self.vertices
            .get(start..start + attribute.component_count as usize)
    }

    /// Raw vertex buffer bytes for GPU upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer packed little-endian at [`Document::index_width`]
    ///
    /// `None` when an index does not fit the width, which only happens for a
    /// document that was edited or deserialized rather than exported.
    pub fn index_bytes(&self) -> Option<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.indices.len() * self.index_width.size());
        for &index in &self.indices {
            match self.index_width {
                IndexWidth::U16 => bytes.extend_from_slice(&u16::try_from(index).ok()?.to_le_bytes()),
                IndexWidth::U32 => bytes.extend_from_slice(&index.to_le_bytes()),
            }
        }
        Some(bytes)
    }

    /// Find a bone record by node name
    pub fn bone(&self, name: &str) -> Option<&BoneRecord> {
        self.bones.iter().find(|bone| bone.name == name)
    }

    /// Find an animation record by name
    pub fn animation(&self, name: &str) -> Option<&AnimationRecord> {
        self.animations.iter().find(|anim| anim.name == name)
    }
}
