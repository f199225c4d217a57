//! Skeleton weight aggregation
//!
//! The hierarchy below the skeleton root is flattened into an arena in
//! depth-first pre-order, so emitting records in arena order puts every
//! parent before its children. Mesh bones are linked to arena nodes by name
//! once, up front; aggregation then only walks indices.
//!
//! Bone record per hierarchy node:
//! - name, local transform, child names
//! - offset matrix: inverse of the local transform for the root, otherwise
//!   the first matching mesh bone's offset (identity when no mesh matches)
//! - vertex ids rebased onto the merged vertex buffer, with their weights

use glam::Mat4;
use hashbrown::HashMap;
use smallvec::SmallVec;
use spectre_common::{Bone, BoneRecord, Node};

use crate::error::{ExportError, ExportResult};
use crate::mesh::{MergeGroup, VertexBases};

/// Tolerance when comparing offset matrices of the same bone across meshes
const OFFSET_EPSILON: f32 = 1e-5;

// ============================================================================
// Hierarchy arena
// ============================================================================

/// One hierarchy node with index-based links
#[derive(Debug, Clone)]
pub struct HierarchyNode<'a> {
    pub node: &'a Node,
    pub parent: Option<usize>,
    pub children: SmallVec<[usize; 4]>,
    pub depth: u32,
}

/// Skeleton hierarchy flattened in pre-order (index 0 is the root)
#[derive(Debug, Clone)]
pub struct Hierarchy<'a> {
    nodes: Vec<HierarchyNode<'a>>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> Hierarchy<'a> {
    /// Flatten the subtree under `root`
    ///
    /// Node names must be unique: bones link to nodes by name.
    pub fn build(root: &'a Node) -> ExportResult<Self> {
        let mut nodes: Vec<HierarchyNode<'a>> = Vec::new();
        let mut by_name = HashMap::new();
        let mut stack: Vec<(&'a Node, Option<usize>, u32)> = vec![(root, None, 0)];

        while let Some((node, parent, depth)) = stack.pop() {
            let index = nodes.len();
            if by_name.insert(node.name.as_str(), index).is_some() {
                return Err(ExportError::DuplicateNodeName {
                    name: node.name.clone(),
                });
            }
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }
            nodes.push(HierarchyNode {
                node,
                parent,
                children: SmallVec::new(),
                depth,
            });
            for child in node.children.iter().rev() {
                stack.push((child, Some(index), depth + 1));
            }
        }

        Ok(Self { nodes, by_name })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena index of the node named `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&HierarchyNode<'a>> {
        self.nodes.get(index)
    }

    /// Nodes in pre-order
    pub fn iter(&self) -> impl Iterator<Item = &HierarchyNode<'a>> {
        self.nodes.iter()
    }
}

// ============================================================================
// Bone resolution
// ============================================================================

/// A mesh bone linked to a hierarchy node
#[derive(Debug, Clone, Copy)]
struct BoneMatch<'a> {
    /// Position of the mesh in the group
    mesh: usize,
    bone: &'a Bone,
}

/// Mesh bones grouped by hierarchy node, in mesh order
struct BoneBindings<'a> {
    per_node: Vec<SmallVec<[BoneMatch<'a>; 2]>>,
}

/// Link every mesh bone of `group` to its hierarchy node
///
/// Fails on a bone that names no node, or a weight on a vertex the mesh
/// does not have.
fn resolve_bones<'a>(
    group: &MergeGroup<'a>,
    hierarchy: &Hierarchy,
) -> ExportResult<BoneBindings<'a>> {
    let mut per_node: Vec<SmallVec<[BoneMatch<'a>; 2]>> = vec![SmallVec::new(); hierarchy.len()];

    for (position, &mesh) in group.meshes.iter().enumerate() {
        for bone in &mesh.bones {
            let node = hierarchy.index_of(&bone.name).ok_or_else(|| {
                ExportError::UnresolvedBoneReference {
                    group: group.name.to_string(),
                    mesh: position,
                    bone: bone.name.clone(),
                }
            })?;

            if let Some(weight) = bone
                .weights
                .iter()
                .find(|w| w.vertex_id >= mesh.vertex_count)
            {
                return Err(ExportError::BoneVertexOutOfRange {
                    group: group.name.to_string(),
                    mesh: position,
                    bone: bone.name.clone(),
                    index: weight.vertex_id,
                    vertex_count: mesh.vertex_count,
                });
            }

            let matches = &mut per_node[node];
            if matches.last().is_some_and(|m| m.mesh == position) {
                tracing::warn!(
                    "Group '{}': mesh #{} has more than one bone named '{}', ignoring the extra",
                    group.name,
                    position,
                    bone.name
                );
                continue;
            }
            matches.push(BoneMatch {
                mesh: position,
                bone,
            });
        }
    }

    Ok(BoneBindings { per_node })
}

// ============================================================================
// Aggregation
// ============================================================================

/// Build one bone record per hierarchy node under `root`, in pre-order
///
/// Vertex ids are rebased with `bases`, the same values the index merger
/// used, so skin weights and indices address the same merged vertices.
pub fn aggregate_skeleton(
    group: &MergeGroup,
    bases: &VertexBases,
    root: &Node,
) -> ExportResult<Vec<BoneRecord>> {
    let hierarchy = Hierarchy::build(root)?;
    let bindings = resolve_bones(group, &hierarchy)?;

    if group.meshes.iter().any(|m| !m.bones.is_empty()) {
        for (position, mesh) in group.meshes.iter().enumerate() {
            if mesh.bones.is_empty() {
                tracing::warn!(
                    "Group '{}': mesh #{} ('{}') has no bone weights in a skinned group",
                    group.name,
                    position,
                    mesh.name
                );
            }
        }
    }

    let mut records = Vec::with_capacity(hierarchy.len());
    for (index, entry) in hierarchy.iter().enumerate() {
        let matches = &bindings.per_node[index];
        let node = entry.node;

        let weight_count: usize = matches.iter().map(|m| m.bone.weights.len()).sum();
        let mut vertices = Vec::with_capacity(weight_count);
        let mut weights = Vec::with_capacity(weight_count);
        for m in matches {
            let base = bases.base(m.mesh);
            for w in &m.bone.weights {
                vertices.push(base + w.vertex_id);
                weights.push(w.weight);
            }
        }

        let offset_transform = if index == 0 {
            root_offset(node)?
        } else {
            bone_offset(group.name, node, matches)
        };

        tracing::debug!(
            "{:indent$}Bone '{}': {} weights from {} meshes",
            "",
            node.name,
            weights.len(),
            matches.len(),
            indent = entry.depth as usize * 2
        );

        records.push(BoneRecord {
            name: node.name.clone(),
            transform: node.transform,
            offset_transform,
            vertices,
            weights,
            children: entry
                .children
                .iter()
                .map(|&child| hierarchy.nodes[child].node.name.clone())
                .collect(),
        });
    }

    Ok(records)
}

/// Offset of the skeleton root: inverse of its local transform
fn root_offset(root: &Node) -> ExportResult<Mat4> {
    let singular = || ExportError::SingularRootTransform {
        name: root.name.clone(),
    };

    let det = root.transform.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(singular());
    }
    let inverse = root.transform.inverse();
    if !inverse.is_finite() {
        return Err(singular());
    }
    Ok(inverse)
}

/// Offset of a non-root node: first matching bone, identity when unmatched
fn bone_offset(group: &str, node: &Node, matches: &[BoneMatch]) -> Mat4 {
    let Some(first) = matches.first() else {
        return Mat4::IDENTITY;
    };

    for other in &matches[1..] {
        if !first
            .bone
            .offset_matrix
            .abs_diff_eq(other.bone.offset_matrix, OFFSET_EPSILON)
        {
            tracing::warn!(
                "Group '{}': bone '{}' offset in mesh #{} differs from mesh #{}, using mesh #{}",
                group,
                node.name,
                other.mesh,
                first.mesh,
                first.mesh
            );
        }
    }

    first.bone.offset_matrix
}

/// Deepest node under `scene_root` whose subtree holds every node named by a
/// bone in `group`
///
/// When the first bone-named node (pre-order) contains all the others it is
/// the root itself. `None` when no node matches a bone.
pub fn find_skeleton_root<'s>(scene_root: &'s Node, group: &MergeGroup) -> Option<&'s Node> {
    let is_bone = |node: &Node| {
        group
            .meshes
            .iter()
            .any(|mesh| mesh.bone(&node.name).is_some())
    };

    // Path from scene_root to the current node, and the shared prefix of the
    // paths to every bone node seen so far
    let mut path: Vec<&'s Node> = Vec::new();
    let mut common: Option<Vec<&'s Node>> = None;
    let mut stack = vec![(scene_root, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        path.truncate(depth);
        path.push(node);

        if is_bone(node) {
            if let Some(prefix) = common.as_mut() {
                let shared = prefix
                    .iter()
                    .zip(&path)
                    .take_while(|(a, b)| std::ptr::eq(**a, **b))
                    .count();
                prefix.truncate(shared);
            } else {
                common = Some(path.clone());
            }
        }

        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    common.and_then(|prefix| prefix.last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use spectre_common::Mesh;

    fn group_of<'a>(meshes: &[&'a Mesh]) -> MergeGroup<'a> {
        MergeGroup::new("body", meshes.to_vec())
    }

    fn aggregate(meshes: &[&Mesh], root: &Node) -> ExportResult<Vec<BoneRecord>> {
        let group = group_of(meshes);
        let bases = VertexBases::compute(&group)?;
        aggregate_skeleton(&group, &bases, root)
    }

    fn quad() -> Mesh {
        Mesh::new("a", vec![[0.0; 3]; 4]).with_faces(&[[0, 1, 2], [0, 2, 3]])
    }

    fn tri() -> Mesh {
        Mesh::new("b", vec![[0.0; 3]; 3]).with_faces(&[[0, 1, 2]])
    }

    #[test]
    fn test_hierarchy_is_pre_order() {
        let root = Node::new("r")
            .with_child(Node::new("a").with_child(Node::new("a1")))
            .with_child(Node::new("b"));
        let hierarchy = Hierarchy::build(&root).unwrap();
        let names: Vec<_> = hierarchy.iter().map(|n| n.node.name.as_str()).collect();
        assert_eq!(names, ["r", "a", "a1", "b"]);
        assert_eq!(hierarchy.get(2).unwrap().parent, Some(1));
        assert_eq!(hierarchy.get(2).unwrap().depth, 2);
        assert_eq!(hierarchy.get(0).unwrap().children.as_slice(), &[1, 3]);
        assert_eq!(hierarchy.index_of("b"), Some(3));
    }

    #[test]
    fn test_duplicate_node_name_rejected() {
        let root = Node::new("r")
            .with_child(Node::new("x"))
            .with_child(Node::new("x"));
        assert_eq!(
            Hierarchy::build(&root).unwrap_err(),
            ExportError::DuplicateNodeName {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn test_weights_rebased_across_meshes() {
        let a = quad().with_bone(Bone::new("C", Mat4::IDENTITY).with_weights(&[(0, 1.0), (1, 0.5)]));
        let b = tri().with_bone(Bone::new("C", Mat4::IDENTITY).with_weights(&[(2, 0.25)]));
        let root = Node::new("R").with_child(Node::new("C"));

        let bones = aggregate(&[&a, &b], &root).unwrap();
        assert_eq!(bones.len(), 2);
        let c = &bones[1];
        assert_eq!(c.name, "C");
        assert_eq!(c.vertices, vec![0, 1, 6]);
        assert_eq!(c.weights, vec![1.0, 0.5, 0.25]);
        assert_eq!(bones[0].children, vec!["C".to_string()]);
    }

    #[test]
    fn test_root_offset_is_inverse_transform() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let root = Node::new("R").with_transform(transform);
        let mesh = quad();
        let bones = aggregate(&[&mesh], &root).unwrap();
        assert!(bones[0]
            .offset_transform
            .abs_diff_eq(Mat4::from_translation(Vec3::new(-1.0, -2.0, -3.0)), 1e-6));
        assert_eq!(bones[0].transform, transform);
    }

    #[test]
    fn test_unmatched_node_is_attachment_point() {
        let mesh = quad().with_bone(Bone::new("arm", Mat4::from_scale(Vec3::splat(2.0))));
        let root = Node::new("R")
            .with_child(Node::new("arm").with_child(Node::new("socket")));
        let bones = aggregate(&[&mesh], &root).unwrap();

        let socket = &bones[2];
        assert_eq!(socket.name, "socket");
        assert!(socket.vertices.is_empty());
        assert!(socket.weights.is_empty());
        assert_eq!(socket.offset_transform, Mat4::IDENTITY);
        assert_eq!(bones[1].offset_transform, Mat4::from_scale(Vec3::splat(2.0)));
    }

    #[test]
    fn test_first_matching_offset_wins() {
        let a = quad().with_bone(Bone::new("C", Mat4::from_scale(Vec3::splat(2.0))));
        let b = tri().with_bone(Bone::new("C", Mat4::from_scale(Vec3::splat(3.0))));
        let root = Node::new("R").with_child(Node::new("C"));
        let bones = aggregate(&[&a, &b], &root).unwrap();
        assert_eq!(bones[1].offset_transform, Mat4::from_scale(Vec3::splat(2.0)));
    }

    #[test]
    fn test_orphan_bone_rejected() {
        let mesh = quad().with_bone(Bone::new("tail", Mat4::IDENTITY));
        let root = Node::new("R").with_child(Node::new("C"));
        assert_eq!(
            aggregate(&[&mesh], &root).unwrap_err(),
            ExportError::UnresolvedBoneReference {
                group: "body".to_string(),
                mesh: 0,
                bone: "tail".to_string(),
            }
        );
    }

    #[test]
    fn test_weight_vertex_out_of_range() {
        let mesh = tri().with_bone(Bone::new("R", Mat4::IDENTITY).with_weights(&[(3, 1.0)]));
        let root = Node::new("R");
        assert!(matches!(
            aggregate(&[&mesh], &root),
            Err(ExportError::BoneVertexOutOfRange {
                index: 3,
                vertex_count: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_children_follow_parents() {
        let root = Node::new("R")
            .with_child(
                Node::new("spine")
                    .with_child(Node::new("neck").with_child(Node::new("head")))
                    .with_child(Node::new("arm")),
            )
            .with_child(Node::new("leg"));
        let mesh = quad();
        let bones = aggregate(&[&mesh], &root).unwrap();

        for (i, bone) in bones.iter().enumerate() {
            for child in &bone.children {
                let j = bones.iter().position(|b| &b.name == child).unwrap();
                assert!(j > i, "child '{}' emitted before parent '{}'", child, bone.name);
            }
        }
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let a = quad().with_bone(Bone::new("C", Mat4::IDENTITY).with_weights(&[(3, 0.5), (0, 1.0)]));
        let b = tri().with_bone(Bone::new("D", Mat4::IDENTITY).with_weights(&[(1, 0.75)]));
        let root = Node::new("R")
            .with_child(Node::new("C"))
            .with_child(Node::new("D"));
        assert_eq!(
            aggregate(&[&a, &b], &root).unwrap(),
            aggregate(&[&a, &b], &root).unwrap()
        );
    }

    #[test]
    fn test_find_skeleton_root() {
        let scene_root = Node::new("scene")
            .with_child(Node::new("mesh_node"))
            .with_child(Node::new("hips").with_child(Node::new("spine")));
        let mesh = quad().with_bone(Bone::new("spine", Mat4::IDENTITY));
        let group = group_of(&[&mesh]);
        assert_eq!(find_skeleton_root(&scene_root, &group).unwrap().name, "spine");

        let bare = quad();
        assert!(find_skeleton_root(&scene_root, &group_of(&[&bare])).is_none());
    }

    #[test]
    fn test_skeleton_root_spans_sibling_bones() {
        let scene_root = Node::new("scene")
            .with_child(Node::new("mesh_node"))
            .with_child(
                Node::new("hips")
                    .with_child(Node::new("leg_l"))
                    .with_child(Node::new("leg_r")),
            );
        let mesh = quad()
            .with_bone(Bone::new("leg_l", Mat4::IDENTITY))
            .with_bone(Bone::new("leg_r", Mat4::IDENTITY));
        let group = group_of(&[&mesh]);
        assert_eq!(find_skeleton_root(&scene_root, &group).unwrap().name, "hips");
    }

    #[test]
    fn test_skeleton_root_spans_bones_across_meshes() {
        // chest is three levels down, leg one; only hips holds both
        let scene_root = Node::new("scene").with_child(
            Node::new("hips")
                .with_child(Node::new("spine").with_child(Node::new("chest")))
                .with_child(Node::new("leg")),
        );
        let upper = quad().with_bone(Bone::new("chest", Mat4::IDENTITY));
        let lower = tri().with_bone(Bone::new("leg", Mat4::IDENTITY));
        let group = group_of(&[&upper, &lower]);
        assert_eq!(find_skeleton_root(&scene_root, &group).unwrap().name, "hips");
    }

    #[test]
    fn test_skeleton_root_keeps_enclosing_bone() {
        let scene_root = Node::new("scene").with_child(
            Node::new("hips").with_child(Node::new("spine").with_child(Node::new("chest"))),
        );
        let mesh = quad()
            .with_bone(Bone::new("chest", Mat4::IDENTITY))
            .with_bone(Bone::new("spine", Mat4::IDENTITY));
        let group = group_of(&[&mesh]);
        assert_eq!(find_skeleton_root(&scene_root, &group).unwrap().name, "spine");
    }

    #[test]
    fn test_singular_root_transform_rejected() {
        let root = Node::new("R")
            .with_transform(Mat4::from_scale(Vec3::ZERO))
            .with_child(Node::new("C"));
        let mesh = quad().with_bone(Bone::new("C", Mat4::IDENTITY).with_weights(&[(0, 1.0)]));
        assert_eq!(
            aggregate(&[&mesh], &root).unwrap_err(),
            ExportError::SingularRootTransform {
                name: "R".to_string()
            }
        );
    }
}
