//! Document assembly and export entry points
//!
//! Export pipeline for one merge group:
//! 1. Resolve the group's meshes and validate attribute homogeneity
//! 2. Plan the vertex layout and interleave the vertex buffer
//! 3. Compute vertex bases once, merge indices with them
//! 4. Aggregate skin weights with the same bases
//! 5. Encode animations
//! 6. Assemble the document
//!
//! Every step that can fail runs before assembly, so an error never comes with
//! a partially built document.

use spectre_common::{
    AnimationRecord, BoneRecord, Document, IndexWidth, Node, Scene, Submesh, VertexLayout,
    PRIMITIVE_TRIANGLES,
};

use crate::animation::encode_animations;
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::mesh::{
    build_vertex_buffer, merge_indices, plan_layout, submesh_bounds, validate_group, DrawRange,
    MergeGroup, VertexBases,
};
use crate::skeleton::{aggregate_skeleton, find_skeleton_root};

/// Finished buffers and tables, ready to be combined
#[derive(Debug, Clone)]
pub struct DocumentParts {
    pub layout: VertexLayout,
    pub index_width: IndexWidth,
    pub submeshes: Vec<Submesh>,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub bones: Vec<BoneRecord>,
    pub animations: Vec<AnimationRecord>,
}

/// Combine finished parts into a document
pub fn assemble(parts: DocumentParts) -> Document {
    Document {
        primitive: PRIMITIVE_TRIANGLES.to_string(),
        layout: parts.layout,
        index_width: parts.index_width,
        submeshes: parts.submeshes,
        vertices: parts.vertices,
        indices: parts.indices,
        bones: parts.bones,
        animations: parts.animations,
    }
}

/// One submesh entry per mesh: draw range, vertex base and own bounds
pub fn submesh_table(group: &MergeGroup, bases: &VertexBases, ranges: &[DrawRange]) -> Vec<Submesh> {
    group
        .meshes
        .iter()
        .zip(ranges)
        .enumerate()
        .map(|(position, (mesh, range))| Submesh {
            name: mesh.name.clone(),
            index_offset: range.index_offset,
            index_count: range.index_count,
            vertex_offset: bases.base(position),
            vertex_count: mesh.vertex_count,
            bounds: submesh_bounds(mesh),
        })
        .collect()
}

/// Export the meshes referenced by `group_node`
///
/// `skeleton_root` is the hierarchy the group's bones link to. Without one,
/// the group must carry no bones.
pub fn export_group(
    scene: &Scene,
    group_node: &Node,
    skeleton_root: Option<&Node>,
    config: &ExportConfig,
) -> ExportResult<Document> {
    let group = MergeGroup::from_node(scene, group_node)?;
    let attributes = validate_group(&group)?;

    let layout = plan_layout(&attributes, config.layout);
    let vertices = build_vertex_buffer(&group, &attributes, &layout)?;

    let bases = VertexBases::compute(&group)?;
    for (position, mesh) in group.meshes.iter().enumerate() {
        tracing::debug!(
            "Mesh #{} '{}': vertex base {}, {} vertices",
            position,
            mesh.name,
            bases.base(position),
            mesh.vertex_count
        );
    }
    let merged = merge_indices(&group, &bases, config.index_width)?;

    let bones = match skeleton_root {
        Some(root) => aggregate_skeleton(&group, &bases, root)?,
        None => {
            require_unskinned(&group)?;
            Vec::new()
        }
    };

    let animations = if config.include_animations {
        encode_animations(&scene.animations)
    } else {
        Vec::new()
    };

    let submeshes = submesh_table(&group, &bases, &merged.ranges);

    tracing::info!(
        "Exported '{}': {} vertices, {} indices, {} submeshes, {} bones, {} animations ({:?}, stride {} bytes)",
        group.name,
        bases.total(),
        merged.indices.len(),
        submeshes.len(),
        bones.len(),
        animations.len(),
        layout.mode,
        layout.stride
    );

    Ok(assemble(DocumentParts {
        layout,
        index_width: config.index_width,
        submeshes,
        vertices,
        indices: merged.indices,
        bones,
        animations,
    }))
}

/// Export a scene, selecting the merge group and skeleton root from `config`
///
/// Unset selections fall back to the first node (pre-order) that references
/// meshes, and the first node named by one of the group's bones.
pub fn export_scene(scene: &Scene, config: &ExportConfig) -> ExportResult<Document> {
    let group_node = match &config.mesh_node {
        Some(name) => find_named(scene, name)?,
        None => find_merge_node(scene).ok_or(ExportError::NoMergeGroup)?,
    };

    let skeleton_root = match &config.skeleton_root {
        Some(name) => Some(find_named(scene, name)?),
        None => {
            let group = MergeGroup::from_node(scene, group_node)?;
            find_skeleton_root(&scene.root, &group)
        }
    };

    tracing::debug!(
        "Merge group '{}', skeleton root {:?}",
        group_node.name,
        skeleton_root.map(|node| node.name.as_str())
    );

    export_group(scene, group_node, skeleton_root, config)
}

/// First node in scene pre-order that references meshes
pub fn find_merge_node(scene: &Scene) -> Option<&Node> {
    scene.root.descendants().find(|node| !node.meshes.is_empty())
}

/// Log every node that references meshes
pub fn list_merge_groups(scene: &Scene) {
    let groups: Vec<_> = scene
        .root
        .descendants()
        .filter(|node| !node.meshes.is_empty())
        .collect();
    if groups.is_empty() {
        tracing::info!("No merge groups found");
        return;
    }

    tracing::info!("Merge groups:");
    for node in groups {
        let vertex_count: u64 = node
            .meshes
            .iter()
            .filter_map(|&index| scene.mesh(index))
            .map(|mesh| mesh.vertex_count as u64)
            .sum();
        tracing::info!(
            "  '{}': {} meshes, {} vertices",
            node.name,
            node.meshes.len(),
            vertex_count
        );
    }
}

fn find_named<'s>(scene: &'s Scene, name: &str) -> ExportResult<&'s Node> {
    scene
        .find_node(name)
        .ok_or_else(|| ExportError::NodeNotFound {
            name: name.to_string(),
        })
}

/// Without a hierarchy every bone is unresolved
fn require_unskinned(group: &MergeGroup) -> ExportResult<()> {
    for (position, mesh) in group.meshes.iter().enumerate() {
        if let Some(bone) = mesh.bones.first() {
            return Err(ExportError::UnresolvedBoneReference {
                group: group.name.to_string(),
                mesh: position,
                bone: bone.name.clone(),
            });
        }
    }
    Ok(())
}
