//! Vertex layout descriptors
//!
//! A [`VertexLayout`] describes one interleaved vertex record: which semantic
//! attributes it carries, in what order, and at which byte offsets. Every
//! element is a 32-bit float.
//!
//! # Emission order
//! ```text
//! POSITION
//! NORMAL                  (if present)
//! TANGENT, BITANGENT      (if present, always as a pair)
//! TEXCOORD0..TEXCOORDn    (if any)
//! COLOR0..COLORn          (if any)
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Attribute Presence Flags
// ============================================================================

/// Attribute flag: has normals
pub const FORMAT_NORMAL: u8 = 1;
/// Attribute flag: has tangents and bitangents (always as a pair)
pub const FORMAT_TANGENT: u8 = 2;

/// Size of one vertex element in bytes (f32)
pub const ELEMENT_SIZE: u32 = 4;

/// Component count every attribute occupies in [`LayoutMode::Padded`]
pub const PADDED_COMPONENTS: u32 = 4;

/// Components per color entry (RGBA), in both layout modes
pub const COLOR_COMPONENTS: u32 = 4;

/// How attributes are sized inside a vertex record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Each attribute occupies its natural component count
    Packed,
    /// Each attribute occupies 4 components (16 bytes)
    #[default]
    Padded,
}

impl LayoutMode {
    /// Number of floats an attribute with `components` natural components occupies
    #[inline]
    pub const fn width(self, components: u32) -> u32 {
        match self {
            LayoutMode::Packed => components,
            LayoutMode::Padded => PADDED_COMPONENTS,
        }
    }
}

// ============================================================================
// Semantics
// ============================================================================

/// A named per-vertex data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    Bitangent,
    TexCoord(u8),
    Color(u8),
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semantic::Position => f.write_str("POSITION"),
            Semantic::Normal => f.write_str("NORMAL"),
            Semantic::Tangent => f.write_str("TANGENT"),
            Semantic::Bitangent => f.write_str("BITANGENT"),
            Semantic::TexCoord(channel) => write!(f, "TEXCOORD{}", channel),
            Semantic::Color(channel) => write!(f, "COLOR{}", channel),
        }
    }
}

/// Error returned when a semantic name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSemanticError(pub String);

impl fmt::Display for ParseSemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vertex semantic '{}'", self.0)
    }
}

impl std::error::Error for ParseSemanticError {}

impl FromStr for Semantic {
    type Err = ParseSemanticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let channel = |rest: &str| {
            rest.parse::<u8>()
                .map_err(|_| ParseSemanticError(s.to_string()))
        };
        match s {
            "POSITION" => Ok(Semantic::Position),
            "NORMAL" => Ok(Semantic::Normal),
            "TANGENT" => Ok(Semantic::Tangent),
            "BITANGENT" => Ok(Semantic::Bitangent),
            _ => {
                if let Some(rest) = s.strip_prefix("TEXCOORD") {
                    channel(rest).map(Semantic::TexCoord)
                } else if let Some(rest) = s.strip_prefix("COLOR") {
                    channel(rest).map(Semantic::Color)
                } else {
                    Err(ParseSemanticError(s.to_string()))
                }
            }
        }
    }
}

impl Serialize for Semantic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Semantic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Element Formats
// ============================================================================

/// Element format of an attribute, by natural component count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementFormat {
    Float1,
    Float2,
    Float3,
    Float4,
}

impl ElementFormat {
    /// Format for `components` floats, `None` outside 1..=4
    pub const fn from_components(components: u32) -> Option<Self> {
        match components {
            1 => Some(ElementFormat::Float1),
            2 => Some(ElementFormat::Float2),
            3 => Some(ElementFormat::Float3),
            4 => Some(ElementFormat::Float4),
            _ => None,
        }
    }

    pub const fn components(self) -> u32 {
        match self {
            ElementFormat::Float1 => 1,
            ElementFormat::Float2 => 2,
            ElementFormat::Float3 => 3,
            ElementFormat::Float4 => 4,
        }
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// Placement of one attribute inside the interleaved vertex record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    pub semantic: Semantic,
    /// Natural component count (values carrying data)
    pub component_count: u32,
    /// Components occupied in the record, including padding
    pub width: u32,
    pub byte_offset: u32,
    /// Total vertex stride in bytes
    pub stride: u32,
    pub format: ElementFormat,
}

impl AttributeDescriptor {
    /// Offset of the first component in floats
    #[inline]
    pub const fn float_offset(&self) -> usize {
        (self.byte_offset / ELEMENT_SIZE) as usize
    }
}

/// Ordered attribute descriptors plus total stride
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexLayout {
    pub mode: LayoutMode,
    pub attributes: Vec<AttributeDescriptor>,
    /// Vertex stride in bytes
    pub stride: u32,
}

impl VertexLayout {
    /// Vertex stride in floats
    #[inline]
    pub const fn float_stride(&self) -> usize {
        (self.stride / ELEMENT_SIZE) as usize
    }

    /// Find the descriptor for `semantic`
    pub fn attribute(&self, semantic: Semantic) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }
}
