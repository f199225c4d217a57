//! Shared scene builders for integration tests

#![allow(dead_code)]

use glam::{Mat4, Vec3};
use spectre_common::{Bone, Mesh, Node, Scene, UvChannel};

/// Unit quad in the XY plane: 4 vertices, faces (0,1,2),(0,2,3)
pub fn quad(name: &str) -> Mesh {
    Mesh::new(
        name,
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
    )
    .with_faces(&[[0, 1, 2], [0, 2, 3]])
}

/// Triangle offset along +X: 3 vertices, face (0,1,2)
pub fn triangle(name: &str) -> Mesh {
    Mesh::new(
        name,
        vec![[2.0, 0.0, 0.0], [3.0, 0.0, 0.0], [2.0, 1.5, -1.0]],
    )
    .with_faces(&[[0, 1, 2]])
}

/// Position + normal + one 2-component UV channel
pub fn textured(mesh: Mesh) -> Mesh {
    let count = mesh.vertex_count as usize;
    let uvs: Vec<[f32; 2]> = (0..count)
        .map(|i| [i as f32 * 0.25, 1.0 - i as f32 * 0.125])
        .collect();
    mesh.with_normals(vec![[0.0, 0.0, 1.0]; count])
        .with_uv_channel(UvChannel::from_uv(&uvs))
}

/// Every attribute kind with distinct values per vertex
pub fn fully_attributed(mesh: Mesh) -> Mesh {
    let count = mesh.vertex_count as usize;
    let f = |i: usize, k: f32| i as f32 + k;
    mesh.with_normals((0..count).map(|i| [f(i, 0.1), f(i, 0.2), f(i, 0.3)]).collect())
        .with_tangent_frame(
            (0..count).map(|i| [f(i, 1.1), f(i, 1.2), f(i, 1.3)]).collect(),
            (0..count).map(|i| [f(i, 2.1), f(i, 2.2), f(i, 2.3)]).collect(),
        )
        .with_uv_channel(UvChannel::from_uv(
            &(0..count).map(|i| [f(i, 3.1), f(i, 3.2)]).collect::<Vec<_>>(),
        ))
        .with_uv_channel(UvChannel {
            components: 3,
            coords: (0..count)
                .map(|i| [f(i, 4.1), f(i, 4.2), f(i, 4.3), 0.0])
                .collect(),
        })
        .with_color_channel(
            (0..count)
                .map(|i| [f(i, 5.1), f(i, 5.2), f(i, 5.3), f(i, 5.4)])
                .collect(),
        )
}

/// Scene: `scene` -> { `body` (meshes 0..n), `R` -> `C` }
pub fn skinned_scene(meshes: Vec<Mesh>) -> Scene {
    let count = meshes.len();
    let mut scene = Scene::new(
        Node::new("scene")
            .with_child(Node::new("body").with_meshes(0..count))
            .with_child(
                Node::new("R")
                    .with_transform(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
                    .with_child(Node::new("C")),
            ),
    );
    scene.meshes = meshes;
    scene
}

/// Bone named `C` with identity offset and the given weights
pub fn bone_c(weights: &[(u32, f32)]) -> Bone {
    Bone::new("C", Mat4::IDENTITY).with_weights(weights)
}
