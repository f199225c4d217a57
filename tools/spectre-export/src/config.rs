//! Export configuration (export.toml)
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! layout = "padded"       # or "packed"
//! index_width = "u16"     # or "u32"
//! mesh_node = "body"      # merge-group node (default: first node with meshes)
//! skeleton_root = "root"  # hierarchy root (default: first node named by a bone)
//! include_animations = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use spectre_common::{IndexWidth, LayoutMode};

/// Settings consumed by one export call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Packed or padded vertex records
    pub layout: LayoutMode,
    /// Width used for index overflow checks
    pub index_width: IndexWidth,
    /// Name of the node whose meshes form the merge group
    pub mesh_node: Option<String>,
    /// Name of the skeleton hierarchy root
    pub skeleton_root: Option<String>,
    pub include_animations: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMode::default(),
            index_width: IndexWidth::default(),
            mesh_node: None,
            skeleton_root: None,
            include_animations: true,
        }
    }
}

impl ExportConfig {
    /// Load and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read export config: {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse export config: {:?}", path))
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_index_width(mut self, index_width: IndexWidth) -> Self {
        self.index_width = index_width;
        self
    }
}
