//! Explicit-storage finite-volume mesh and structured grid generators

use super::Mesh;
use crate::error::{FvmError, Result};
use std::collections::BTreeMap;

/// Raw mesh arrays, validated by [`FvMesh::from_parts`]
///
/// All face arrays have one entry per face, all cell arrays one entry per cell.
#[derive(Debug, Clone, Default)]
pub struct MeshParts {
    pub dim: usize,
    pub cell_volumes: Vec<f64>,
    pub cell_centers: Vec<[f64; 3]>,
    pub owners: Vec<usize>,
    pub neighbours: Vec<Option<usize>>,
    pub face_areas: Vec<f64>,
    pub face_normals: Vec<[f64; 3]>,
    pub face_centers: Vec<[f64; 3]>,
    pub owner_distances: Vec<f64>,
    pub neighbour_distances: Vec<Option<f64>>,
    pub face_sets: BTreeMap<String, Vec<usize>>,
}

impl MeshParts {
    fn push_face(
        &mut self,
        owner: usize,
        neighbour: Option<usize>,
        area: f64,
        normal: [f64; 3],
        center: [f64; 3],
        d_pf: f64,
    ) -> usize {
        self.owners.push(owner);
        self.neighbours.push(neighbour);
        self.face_areas.push(area);
        self.face_normals.push(normal);
        self.face_centers.push(center);
        self.owner_distances.push(d_pf);
        self.neighbour_distances.push(neighbour.map(|_| d_pf));
        self.owners.len() - 1
    }

    fn add_to_set(&mut self, name: &str, face: usize) {
        self.face_sets.entry(name.to_string()).or_default().push(face);
    }
}

/// Finite-volume mesh with explicit topology and geometry arrays
#[derive(Debug, Clone)]
pub struct FvMesh {
    parts: MeshParts,
}

impl FvMesh {
    /// Build a mesh from raw arrays, checking the mesh invariants
    pub fn from_parts(parts: MeshParts) -> Result<Self> {
        validate(&parts)?;
        log::debug!(
            "Mesh: dim {}, {} cells, {} faces, {} face sets",
            parts.dim,
            parts.cell_volumes.len(),
            parts.owners.len(),
            parts.face_sets.len()
        );
        Ok(Self { parts })
    }

    /// Uniform 1-D grid of `nx` cells of width `dx` starting at x = 0
    ///
    /// Face `i` sits at `x = i dx` and has unit area. Face 0 forms the
    /// `left` set, face `nx` the `right` set.
    pub fn grid_1d(nx: usize, dx: f64) -> Result<Self> {
        if nx == 0 || !positive(dx) {
            return Err(FvmError::InvalidMesh(format!(
                "1-D grid needs nx > 0 and dx > 0 (nx = {nx}, dx = {dx})"
            )));
        }

        let mut parts = MeshParts {
            dim: 1,
            cell_volumes: vec![dx; nx],
            cell_centers: (0..nx).map(|i| [(i as f64 + 0.5) * dx, 0.0, 0.0]).collect(),
            ..Default::default()
        };

        let half = 0.5 * dx;
        let left = parts.push_face(0, None, 1.0, [-1.0, 0.0, 0.0], [0.0, 0.0, 0.0], half);
        parts.add_to_set("left", left);
        for i in 1..nx {
            parts.push_face(
                i - 1,
                Some(i),
                1.0,
                [1.0, 0.0, 0.0],
                [i as f64 * dx, 0.0, 0.0],
                half,
            );
        }
        let right = parts.push_face(
            nx - 1,
            None,
            1.0,
            [1.0, 0.0, 0.0],
            [nx as f64 * dx, 0.0, 0.0],
            half,
        );
        parts.add_to_set("right", right);

        Self::from_parts(parts)
    }

    /// Uniform 2-D grid of `nx × ny` cells (unit depth)
    ///
    /// Cell `(i, j)` has index `i + j nx`. Faces normal to x come first,
    /// row by row, followed by faces normal to y. Boundary faces form the
    /// `left`, `right`, `bottom` and `top` sets.
    pub fn grid_2d(nx: usize, ny: usize, dx: f64, dy: f64) -> Result<Self> {
        if nx == 0 || ny == 0 || !positive(dx) || !positive(dy) {
            return Err(FvmError::InvalidMesh(format!(
                "2-D grid needs positive sizes (nx = {nx}, ny = {ny}, dx = {dx}, dy = {dy})"
            )));
        }

        let cell = |i: usize, j: usize| i + j * nx;
        let mut parts = MeshParts {
            dim: 2,
            cell_volumes: vec![dx * dy; nx * ny],
            cell_centers: (0..ny)
                .flat_map(|j| {
                    (0..nx).map(move |i| [(i as f64 + 0.5) * dx, (j as f64 + 0.5) * dy, 0.0])
                })
                .collect(),
            ..Default::default()
        };

        // Faces normal to x
        for j in 0..ny {
            let y = (j as f64 + 0.5) * dy;
            for i in 0..=nx {
                let center = [i as f64 * dx, y, 0.0];
                if i == 0 {
                    let f = parts.push_face(cell(0, j), None, dy, [-1.0, 0.0, 0.0], center, 0.5 * dx);
                    parts.add_to_set("left", f);
                } else if i == nx {
                    let f =
                        parts.push_face(cell(nx - 1, j), None, dy, [1.0, 0.0, 0.0], center, 0.5 * dx);
                    parts.add_to_set("right", f);
                } else {
                    parts.push_face(
                        cell(i - 1, j),
                        Some(cell(i, j)),
                        dy,
                        [1.0, 0.0, 0.0],
                        center,
                        0.5 * dx,
                    );
                }
            }
        }

        // Faces normal to y
        for j in 0..=ny {
            let y = j as f64 * dy;
            for i in 0..nx {
                let center = [(i as f64 + 0.5) * dx, y, 0.0];
                if j == 0 {
                    let f = parts.push_face(cell(i, 0), None, dx, [0.0, -1.0, 0.0], center, 0.5 * dy);
                    parts.add_to_set("bottom", f);
                } else if j == ny {
                    let f =
                        parts.push_face(cell(i, ny - 1), None, dx, [0.0, 1.0, 0.0], center, 0.5 * dy);
                    parts.add_to_set("top", f);
                } else {
                    parts.push_face(
                        cell(i, j - 1),
                        Some(cell(i, j)),
                        dx,
                        [0.0, 1.0, 0.0],
                        center,
                        0.5 * dy,
                    );
                }
            }
        }

        Self::from_parts(parts)
    }

    /// Faces of the `left` set (empty if absent)
    pub fn faces_left(&self) -> &[usize] {
        self.named("left")
    }

    /// Faces of the `right` set (empty if absent)
    pub fn faces_right(&self) -> &[usize] {
        self.named("right")
    }

    /// Faces of the `bottom` set (empty if absent)
    pub fn faces_bottom(&self) -> &[usize] {
        self.named("bottom")
    }

    /// Faces of the `top` set (empty if absent)
    pub fn faces_top(&self) -> &[usize] {
        self.named("top")
    }

    fn named(&self, name: &str) -> &[usize] {
        self.parts
            .face_sets
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Mesh for FvMesh {
    fn dim(&self) -> usize {
        self.parts.dim
    }

    fn num_cells(&self) -> usize {
        self.parts.cell_volumes.len()
    }

    fn num_faces(&self) -> usize {
        self.parts.owners.len()
    }

    fn owner(&self, face: usize) -> usize {
        self.parts.owners[face]
    }

    fn neighbour(&self, face: usize) -> Option<usize> {
        self.parts.neighbours[face]
    }

    fn cell_volume(&self, cell: usize) -> f64 {
        self.parts.cell_volumes[cell]
    }

    fn cell_center(&self, cell: usize) -> [f64; 3] {
        self.parts.cell_centers[cell]
    }

    fn face_area(&self, face: usize) -> f64 {
        self.parts.face_areas[face]
    }

    fn face_normal(&self, face: usize) -> [f64; 3] {
        self.parts.face_normals[face]
    }

    fn face_center(&self, face: usize) -> [f64; 3] {
        self.parts.face_centers[face]
    }

    fn owner_distance(&self, face: usize) -> f64 {
        self.parts.owner_distances[face]
    }

    fn neighbour_distance(&self, face: usize) -> Option<f64> {
        self.parts.neighbour_distances[face]
    }

    fn face_set(&self, name: &str) -> Option<&[usize]> {
        self.parts.face_sets.get(name).map(Vec::as_slice)
    }

    fn face_set_names(&self) -> Vec<String> {
        self.parts.face_sets.keys().cloned().collect()
    }
}

fn invalid(msg: String) -> FvmError {
    FvmError::InvalidMesh(msg)
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn validate(parts: &MeshParts) -> Result<()> {
    if !(1..=3).contains(&parts.dim) {
        return Err(invalid(format!("dimension must be 1, 2 or 3, got {}", parts.dim)));
    }

    let num_cells = parts.cell_volumes.len();
    if parts.cell_centers.len() != num_cells {
        return Err(invalid(format!(
            "{} cell volumes but {} cell centres",
            num_cells,
            parts.cell_centers.len()
        )));
    }

    let num_faces = parts.owners.len();
    let face_lengths = [
        ("neighbours", parts.neighbours.len()),
        ("face areas", parts.face_areas.len()),
        ("face normals", parts.face_normals.len()),
        ("face centres", parts.face_centers.len()),
        ("owner distances", parts.owner_distances.len()),
        ("neighbour distances", parts.neighbour_distances.len()),
    ];
    for (what, len) in face_lengths {
        if len != num_faces {
            return Err(invalid(format!("{num_faces} owners but {len} {what}")));
        }
    }

    if let Some(cell) = parts.cell_volumes.iter().position(|&v| !positive(v)) {
        return Err(invalid(format!("cell {cell} has non-positive volume")));
    }

    for face in 0..num_faces {
        let owner = parts.owners[face];
        if owner >= num_cells {
            return Err(invalid(format!("face {face} owner {owner} out of range")));
        }
        match (parts.neighbours[face], parts.neighbour_distances[face]) {
            (Some(n), Some(d)) => {
                if n >= num_cells {
                    return Err(invalid(format!("face {face} neighbour {n} out of range")));
                }
                if n == owner {
                    return Err(invalid(format!("face {face} has owner == neighbour ({n})")));
                }
                if !positive(d) {
                    return Err(invalid(format!(
                        "face {face} has non-positive neighbour distance"
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(invalid(format!(
                    "face {face}: neighbour and neighbour distance must both be set or both absent"
                )));
            }
        }
        if !positive(parts.face_areas[face]) {
            return Err(invalid(format!("face {face} has non-positive area")));
        }
        if !positive(parts.owner_distances[face]) {
            return Err(invalid(format!("face {face} has non-positive owner distance")));
        }
        let n = parts.face_normals[face];
        let len = n.iter().map(|c| c * c).sum::<f64>().sqrt();
        if (len - 1.0).abs() > 1e-10 {
            return Err(invalid(format!("face {face} normal has length {len}")));
        }
    }

    // Each boundary face in exactly one set, no interior face in any set
    let mut membership = vec![0usize; num_faces];
    for (name, faces) in &parts.face_sets {
        for &face in faces {
            if face >= num_faces {
                return Err(invalid(format!("face set '{name}' lists face {face} out of range")));
            }
            if parts.neighbours[face].is_some() {
                return Err(invalid(format!(
                    "face set '{name}' lists interior face {face}"
                )));
            }
            membership[face] += 1;
        }
    }
    for face in 0..num_faces {
        if parts.neighbours[face].is_none() && membership[face] != 1 {
            return Err(invalid(format!(
                "boundary face {face} belongs to {} face sets (expected exactly one)",
                membership[face]
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_1d_topology() {
        let mesh = FvMesh::grid_1d(3, 2.0).unwrap();
        assert_eq!(mesh.num_cells(), 3);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.faces_left(), &[0]);
        assert_eq!(mesh.faces_right(), &[3]);
        assert_eq!(mesh.owner(1), 0);
        assert_eq!(mesh.neighbour(1), Some(1));
        assert_eq!(mesh.neighbour(3), None);
        assert_eq!(mesh.face_normal(0), [-1.0, 0.0, 0.0]);
        assert_relative_eq!(mesh.cell_center(2)[0], 5.0);
        assert_relative_eq!(mesh.face_center(3)[0], 6.0);
        assert_relative_eq!(mesh.cell_distance(1), 2.0);
        assert_relative_eq!(mesh.owner_distance(0), 1.0);
    }

    #[test]
    fn test_grid_2d_topology() {
        let mesh = FvMesh::grid_2d(3, 2, 1.0, 0.5).unwrap();
        assert_eq!(mesh.num_cells(), 6);
        // 4 x-faces per row * 2 rows + 3 y-faces per row * 3 rows
        assert_eq!(mesh.num_faces(), 17);
        assert_eq!(mesh.faces_left().len(), 2);
        assert_eq!(mesh.faces_right().len(), 2);
        assert_eq!(mesh.faces_bottom().len(), 3);
        assert_eq!(mesh.faces_top().len(), 3);
        assert_eq!(mesh.boundary_faces().len(), 10);

        let total_volume: f64 = (0..mesh.num_cells()).map(|c| mesh.cell_volume(c)).sum();
        assert_relative_eq!(total_volume, 3.0);

        // First interior y-face joins cell 0 to the cell above it
        let f = 8 + 3;
        assert_eq!(mesh.owner(f), 0);
        assert_eq!(mesh.neighbour(f), Some(3));
        assert_relative_eq!(mesh.face_area(f), 1.0);
        assert_relative_eq!(mesh.cell_distance(f), 0.5);
    }

    #[test]
    fn test_grid_rejects_bad_sizes() {
        assert!(matches!(
            FvMesh::grid_1d(0, 1.0),
            Err(FvmError::InvalidMesh(_))
        ));
        assert!(matches!(
            FvMesh::grid_2d(2, 2, 1.0, -1.0),
            Err(FvmError::InvalidMesh(_))
        ));
    }

    fn two_cell_parts() -> MeshParts {
        let mut parts = MeshParts {
            dim: 1,
            cell_volumes: vec![1.0, 1.0],
            cell_centers: vec![[0.5, 0.0, 0.0], [1.5, 0.0, 0.0]],
            ..Default::default()
        };
        let l = parts.push_face(0, None, 1.0, [-1.0, 0.0, 0.0], [0.0; 3], 0.5);
        parts.push_face(0, Some(1), 1.0, [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.5);
        let r = parts.push_face(1, None, 1.0, [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], 0.5);
        parts.add_to_set("left", l);
        parts.add_to_set("right", r);
        parts
    }

    #[test]
    fn test_from_parts_accepts_valid_mesh() {
        assert!(FvMesh::from_parts(two_cell_parts()).is_ok());
    }

    #[test]
    fn test_from_parts_rejects_self_neighbour() {
        let mut parts = two_cell_parts();
        parts.neighbours[1] = Some(0);
        assert!(matches!(
            FvMesh::from_parts(parts),
            Err(FvmError::InvalidMesh(_))
        ));
    }

    #[test]
    fn test_from_parts_rejects_orphan_boundary_face() {
        let mut parts = two_cell_parts();
        parts.face_sets.remove("right");
        let err = FvMesh::from_parts(parts).unwrap_err();
        assert!(err.to_string().contains("boundary face 2"));
    }

    #[test]
    fn test_from_parts_rejects_interior_face_in_set() {
        let mut parts = two_cell_parts();
        parts.add_to_set("middle", 1);
        assert!(FvMesh::from_parts(parts).is_err());
    }

    #[test]
    fn test_from_parts_rejects_non_unit_normal() {
        let mut parts = two_cell_parts();
        parts.face_normals[1] = [2.0, 0.0, 0.0];
        assert!(FvMesh::from_parts(parts).is_err());
    }
}
