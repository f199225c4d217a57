use spectre_common::{Bounds, Mesh};

/// Axis-aligned bounds of a mesh's own positions
///
/// A mesh without positions yields [`Bounds::EMPTY`]; validated groups
/// never contain one.
pub fn submesh_bounds(mesh: &Mesh) -> Bounds {
    match &mesh.positions {
        Some(positions) => Bounds::from_points(positions.iter()),
        None => Bounds::EMPTY,
    }
}
