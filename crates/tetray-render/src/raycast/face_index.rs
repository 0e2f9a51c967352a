//! Deduplicated triangular faces of a tetrahedral mesh and their owners.
//!
//! Each tetrahedron contributes 4 faces. Faces are keyed by their vertex ids
//! in ascending order, so the two tetrahedra sharing a wall map to the same
//! [`Face`]. A face with one owner lies on the mesh boundary; a face with two
//! is interior. The index also records, per tetrahedron, its 4 face ids, which
//! is all the topology the ray marcher needs to walk from cell to cell.

use std::collections::HashMap;

use tetray_core::{Result, Stamp, TetrayError, TopologyPolicy, Tracked};
use tetray_structures::{TetMesh, TET_FACE_STENCIL};

/// Index of a face in a [`FaceIndex`].
pub type FaceId = u32;

/// Index of a tetrahedron (its cell index in the mesh).
pub type TetraId = u32;

/// A unique triangular face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Vertex ids in ascending order.
    pub vertices: [u32; 3],
    /// The first tetrahedron that referenced this face.
    pub first_owner: TetraId,
    /// The second tetrahedron, `None` for boundary faces.
    pub second_owner: Option<TetraId>,
}

impl Face {
    /// Whether exactly one tetrahedron owns this face.
    pub fn is_boundary(&self) -> bool {
        self.second_owner.is_none()
    }

    /// The tetrahedron on the other side of this face from `current`.
    ///
    /// Returns `None` for boundary faces.
    pub fn other_owner(&self, current: TetraId) -> Option<TetraId> {
        let second = self.second_owner?;
        Some(if self.first_owner == current {
            second
        } else {
            self.first_owner
        })
    }
}

/// Faces of a mesh plus the face ids of every tetrahedron.
#[derive(Debug, Clone)]
pub struct FaceIndex {
    faces: Vec<Face>,
    tetra_faces: Vec<Option<[FaceId; 4]>>,
    source: Stamp,
    skipped_cells: usize,
    overshared_faces: usize,
}

impl FaceIndex {
    /// Builds the index for a mesh.
    ///
    /// Non-tetrahedral cells are skipped with a single warning. A face
    /// referenced by more than two tetrahedra keeps its first two owners under
    /// [`TopologyPolicy::Lenient`] and fails the build under
    /// [`TopologyPolicy::Strict`].
    pub fn build(mesh: &TetMesh, policy: TopologyPolicy) -> Result<Self> {
        let num_points = mesh.num_points();
        let mut lookup: HashMap<[u32; 3], FaceId> = HashMap::with_capacity(mesh.num_cells() * 2);
        let mut faces: Vec<Face> = Vec::with_capacity(mesh.num_cells() * 2);
        let mut owner_counts: Vec<u8> = Vec::with_capacity(mesh.num_cells() * 2);
        let mut tetra_faces = Vec::with_capacity(mesh.num_cells());
        let mut skipped_cells = 0;
        let mut overshared_faces = 0;

        for cell_idx in 0..mesh.num_cells() {
            let Some(tet) = mesh.tet(cell_idx) else {
                skipped_cells += 1;
                tetra_faces.push(None);
                continue;
            };
            if let Some(&v) = tet.iter().find(|&&v| v as usize >= num_points) {
                return Err(TetrayError::InvalidParameter(format!(
                    "cell {cell_idx} references vertex {v} but the mesh has {num_points} points"
                )));
            }

            let tetra = cell_idx as TetraId;
            let mut ids = [0; 4];
            for (slot, [a, b, c]) in TET_FACE_STENCIL.iter().enumerate() {
                let key = canonical_face_key(tet[*a], tet[*b], tet[*c]);
                let id = match lookup.get(&key) {
                    Some(&id) => {
                        let count = &mut owner_counts[id as usize];
                        *count = count.saturating_add(1);
                        let face = &mut faces[id as usize];
                        if face.second_owner.is_none() {
                            face.second_owner = Some(tetra);
                        } else {
                            if *count == 3 {
                                overshared_faces += 1;
                                log::error!(
                                    "face {key:?} is shared by more than two tetrahedra \
                                     (owners {}, {:?}, {tetra}); extra owners are ignored",
                                    face.first_owner,
                                    face.second_owner
                                );
                            }
                            if policy == TopologyPolicy::Strict {
                                return Err(TetrayError::DegenerateTopology {
                                    face: key,
                                    owners: usize::from(*count),
                                });
                            }
                        }
                        id
                    }
                    None => {
                        let id = faces.len() as FaceId;
                        faces.push(Face {
                            vertices: key,
                            first_owner: tetra,
                            second_owner: None,
                        });
                        owner_counts.push(1);
                        lookup.insert(key, id);
                        id
                    }
                };
                ids[slot] = id;
            }
            tetra_faces.push(Some(ids));
        }

        if skipped_cells > 0 {
            log::warn!(
                "mesh contains {skipped_cells} non-tetrahedral cells; they are not rendered"
            );
        }
        log::debug!(
            "face index: {} faces from {} cells",
            faces.len(),
            mesh.num_cells()
        );

        Ok(Self {
            faces,
            tetra_faces,
            source: mesh.stamp(),
            skipped_cells,
            overshared_faces,
        })
    }

    /// Whether this index was built from the mesh in its current state.
    pub fn is_current(&self, mesh: &TetMesh) -> bool {
        self.source == mesh.stamp()
    }

    /// All faces, in order of first appearance.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// One face.
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id as usize]
    }

    /// Number of unique faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of faces with a single owner.
    pub fn num_boundary_faces(&self) -> usize {
        self.faces.iter().filter(|f| f.is_boundary()).count()
    }

    /// Number of faces with two owners.
    pub fn num_interior_faces(&self) -> usize {
        self.faces.len() - self.num_boundary_faces()
    }

    /// The 4 face ids of a tetrahedron, `None` for skipped cells.
    pub fn tetra_faces(&self, tetra: TetraId) -> Option<&[FaceId; 4]> {
        self.tetra_faces.get(tetra as usize)?.as_ref()
    }

    /// Number of non-tetrahedral cells that were skipped.
    pub fn num_skipped_cells(&self) -> usize {
        self.skipped_cells
    }

    /// Number of faces that had more than two owners.
    pub fn num_overshared_faces(&self) -> usize {
        self.overshared_faces
    }
}

fn canonical_face_key(v0: u32, v1: u32, v2: u32) -> [u32; 3] {
    let mut key = [v0, v1, v2];
    key.sort_unstable();
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use proptest::prelude::*;

    fn two_tets() -> TetMesh {
        let points = vec![
            DVec3::new(0.0, 0.0, 0.0),  // 0
            DVec3::new(1.0, 0.0, 0.0),  // 1
            DVec3::new(0.5, 1.0, 0.0),  // 2
            DVec3::new(0.5, 0.5, 1.0),  // 3 - apex of first tet
            DVec3::new(0.5, 0.5, -1.0), // 4 - apex of second tet
        ];
        TetMesh::new_tet_mesh(points, vec![[0, 1, 2, 3], [0, 2, 1, 4]])
    }

    #[test]
    fn test_shared_face_has_two_owners() {
        let index = FaceIndex::build(&two_tets(), TopologyPolicy::Lenient).unwrap();
        assert_eq!(index.num_faces(), 7);
        assert_eq!(index.num_interior_faces(), 1);
        assert_eq!(index.num_boundary_faces(), 6);

        let shared = index
            .faces()
            .iter()
            .find(|f| !f.is_boundary())
            .unwrap();
        assert_eq!(shared.vertices, [0, 1, 2]);
        assert_eq!(shared.first_owner, 0);
        assert_eq!(shared.second_owner, Some(1));
        assert_eq!(shared.other_owner(0), Some(1));
        assert_eq!(shared.other_owner(1), Some(0));
    }

    #[test]
    fn test_tetra_faces_reference_shared_face() {
        let index = FaceIndex::build(&two_tets(), TopologyPolicy::Lenient).unwrap();
        let a = index.tetra_faces(0).unwrap();
        let b = index.tetra_faces(1).unwrap();
        let common: Vec<_> = a.iter().filter(|id| b.contains(id)).collect();
        assert_eq!(common.len(), 1);
        assert!(index.tetra_faces(2).is_none());
    }

    #[test]
    fn test_non_tet_cells_are_skipped() {
        let mut cells = vec![[0, 1, 2, 3, 4, 5, 6, 7]];
        cells.push([0, 1, 3, 4, u32::MAX, u32::MAX, u32::MAX, u32::MAX]);
        let points = (0..8).map(|i| DVec3::splat(f64::from(i))).collect();
        let mesh = TetMesh::new(points, cells);

        let index = FaceIndex::build(&mesh, TopologyPolicy::Lenient).unwrap();
        assert_eq!(index.num_skipped_cells(), 1);
        assert!(index.tetra_faces(0).is_none());
        assert!(index.tetra_faces(1).is_some());
        assert_eq!(index.num_faces(), 4);
    }

    fn three_tets_on_one_face() -> TetMesh {
        let points = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::new(0.2, 0.2, 2.0),
        ];
        TetMesh::new_tet_mesh(points, vec![[0, 1, 2, 3], [0, 1, 2, 4], [0, 1, 2, 5]])
    }

    #[test]
    fn test_overshared_face_lenient_keeps_first_two() {
        let index = FaceIndex::build(&three_tets_on_one_face(), TopologyPolicy::Lenient).unwrap();
        assert_eq!(index.num_overshared_faces(), 1);
        let face = index.faces().iter().find(|f| f.vertices == [0, 1, 2]).unwrap();
        assert_eq!(face.first_owner, 0);
        assert_eq!(face.second_owner, Some(1));
    }

    #[test]
    fn test_overshared_face_strict_rejects() {
        let result = FaceIndex::build(&three_tets_on_one_face(), TopologyPolicy::Strict);
        assert!(matches!(
            result,
            Err(TetrayError::DegenerateTopology {
                face: [0, 1, 2],
                owners: 3
            })
        ));
    }

    #[test]
    fn test_out_of_range_vertex_rejected() {
        let mesh = TetMesh::new_tet_mesh(vec![DVec3::ZERO; 3], vec![[0, 1, 2, 3]]);
        assert!(matches!(
            FaceIndex::build(&mesh, TopologyPolicy::Lenient),
            Err(TetrayError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_is_current_tracks_mesh() {
        let mut mesh = two_tets();
        let index = FaceIndex::build(&mesh, TopologyPolicy::Lenient).unwrap();
        assert!(index.is_current(&mesh));
        mesh.modified();
        assert!(!index.is_current(&mesh));
    }

    #[test]
    fn test_split_hexes_share_wall_faces() {
        let point = |i: usize, j: usize, k: usize| i + 3 * j + 6 * k;
        let points = (0..12)
            .map(|n| DVec3::new((n % 3) as f64, ((n / 3) % 2) as f64, (n / 6) as f64))
            .collect();
        let hex = |i: usize| {
            [
                point(i, 0, 0),
                point(i + 1, 0, 0),
                point(i + 1, 1, 0),
                point(i, 1, 0),
                point(i, 0, 1),
                point(i + 1, 0, 1),
                point(i + 1, 1, 1),
                point(i, 1, 1),
            ]
            .map(|v| v as u32)
        };
        let mesh = TetMesh::new_hex_mesh(points, vec![hex(0), hex(1)]).tetrahedralize();

        let index = FaceIndex::build(&mesh, TopologyPolicy::Lenient).unwrap();
        assert_eq!(index.num_overshared_faces(), 0);
        // 10 outer quads, 2 triangles each.
        assert_eq!(index.num_boundary_faces(), 20);
        // 6 inside each hex plus 2 on the shared wall.
        assert_eq!(index.num_interior_faces(), 14);
    }

    proptest! {
        #[test]
        fn prop_disjoint_tets_have_only_boundary_faces(n in 1usize..20) {
            let mut points = Vec::new();
            let mut tets = Vec::new();
            for i in 0..n {
                let base = points.len() as u32;
                let o = DVec3::new(3.0 * i as f64, 0.0, 0.0);
                points.extend([o, o + DVec3::X, o + DVec3::Y, o + DVec3::Z]);
                tets.push([base, base + 1, base + 2, base + 3]);
            }
            let index = FaceIndex::build(&TetMesh::new_tet_mesh(points, tets), TopologyPolicy::Lenient).unwrap();
            prop_assert_eq!(index.num_faces(), 4 * n);
            prop_assert!(index.faces().iter().all(Face::is_boundary));
        }

        #[test]
        fn prop_dedup_matches_key_counts(
            tets in proptest::collection::vec(
                proptest::sample::subsequence((0u32..7).collect::<Vec<_>>(), 4),
                1..12,
            )
        ) {
            let tets: Vec<[u32; 4]> = tets.into_iter().map(|t| [t[0], t[1], t[2], t[3]]).collect();
            let points = (0..7).map(|i| DVec3::new(f64::from(i), f64::from(i * i), 0.0)).collect();
            let mesh = TetMesh::new_tet_mesh(points, tets.clone());
            let index = FaceIndex::build(&mesh, TopologyPolicy::Lenient).unwrap();

            let mut counts: HashMap<[u32; 3], usize> = HashMap::new();
            for t in &tets {
                for [a, b, c] in TET_FACE_STENCIL {
                    *counts.entry(canonical_face_key(t[a], t[b], t[c])).or_insert(0) += 1;
                }
            }
            prop_assert_eq!(index.num_faces(), counts.len());
            for face in index.faces() {
                let count = counts[&face.vertices];
                prop_assert_eq!(face.is_boundary(), count == 1);
                prop_assert!(face.vertices[0] < face.vertices[1] && face.vertices[1] < face.vertices[2]);
            }
        }
    }
}
