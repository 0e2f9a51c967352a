//! Tetrahedral mesh structure.
//!
//! # Overview
//!
//! `TetMesh` stores object-space points and a cell list. Cells are stored as
//! arrays of 8 vertex indices; tetrahedra use the first 4 slots and set the
//! rest to `u32::MAX`. Hexahedra may be present in the cell list (they are what
//! callers typically receive from readers) but the ray caster only renders
//! tetrahedra: use [`TetMesh::tetrahedralize`] to split hexahedra first.
//!
//! # Change tracking
//!
//! Every mutation bumps the mesh's [`ModifiedTime`]. Render caches keyed on
//! the mesh compare `(ObjectId, ModifiedTime)` to decide whether to rebuild.
//!
//! # Example
//!
//! ```rust
//! use glam::DVec3;
//! use tetray_structures::TetMesh;
//!
//! let points = vec![
//!     DVec3::new(0.0, 0.0, 0.0),
//!     DVec3::new(1.0, 0.0, 0.0),
//!     DVec3::new(0.5, 1.0, 0.0),
//!     DVec3::new(0.5, 0.5, 1.0),
//! ];
//! let mesh = TetMesh::new_tet_mesh(points, vec![[0, 1, 2, 3]]);
//! assert_eq!(mesh.num_cells(), 1);
//! ```

mod stencils;

pub use stencils::{HEX_TO_TET_PATTERN, TET_FACE_STENCIL};

use glam::DVec3;
use tetray_core::{ModifiedTime, ObjectId, Tracked};

/// Marker stored in unused cell slots.
pub const UNUSED_SLOT: u32 = u32::MAX;

/// Cell type of a mesh cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    /// Tetrahedron (4 vertices)
    Tet,
    /// Hexahedron (8 vertices)
    Hex,
}

/// An unstructured volume mesh made of tetrahedra (and, before decomposition,
/// hexahedra).
#[derive(Debug, Clone)]
pub struct TetMesh {
    id: ObjectId,
    mtime: ModifiedTime,
    points: Vec<DVec3>,
    cells: Vec<[u32; 8]>, // 8 indices per cell, unused slots hold u32::MAX
}

impl TetMesh {
    /// Creates a mesh from points and 8-slot cells.
    pub fn new(points: Vec<DVec3>, cells: Vec<[u32; 8]>) -> Self {
        Self {
            id: ObjectId::new(),
            mtime: ModifiedTime::now(),
            points,
            cells,
        }
    }

    /// Creates a purely tetrahedral mesh.
    pub fn new_tet_mesh(points: Vec<DVec3>, tets: Vec<[u32; 4]>) -> Self {
        let cells = tets.into_iter().map(tet_cell).collect();
        Self::new(points, cells)
    }

    /// Creates a hexahedral mesh.
    pub fn new_hex_mesh(points: Vec<DVec3>, hexes: Vec<[u32; 8]>) -> Self {
        Self::new(points, hexes)
    }

    /// Returns the number of points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of cells of any type.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns the points.
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Returns the raw 8-slot cells.
    pub fn cells(&self) -> &[[u32; 8]] {
        &self.cells
    }

    /// Returns the cell type of the given cell.
    pub fn cell_type(&self, cell_idx: usize) -> CellType {
        if self.cells[cell_idx][4] == UNUSED_SLOT {
            CellType::Tet
        } else {
            CellType::Hex
        }
    }

    /// Returns the 4 vertex ids of a cell if it is a tetrahedron.
    pub fn tet(&self, cell_idx: usize) -> Option<[u32; 4]> {
        let cell = self.cells.get(cell_idx)?;
        (cell[4] == UNUSED_SLOT).then(|| [cell[0], cell[1], cell[2], cell[3]])
    }

    /// Returns the number of cells that are not tetrahedra.
    pub fn num_non_tet_cells(&self) -> usize {
        self.cells.iter().filter(|c| c[4] != UNUSED_SLOT).count()
    }

    /// Appends a tetrahedron.
    pub fn push_tet(&mut self, tet: [u32; 4]) -> &mut Self {
        self.cells.push(tet_cell(tet));
        self.mtime.touch();
        self
    }

    /// Appends a point and returns its index.
    pub fn push_point(&mut self, point: DVec3) -> u32 {
        self.points.push(point);
        self.mtime.touch();
        (self.points.len() - 1) as u32
    }

    /// Moves a point.
    pub fn set_point(&mut self, idx: usize, point: DVec3) -> &mut Self {
        self.points[idx] = point;
        self.mtime.touch();
        self
    }

    /// Marks the mesh as modified without changing it.
    pub fn modified(&mut self) {
        self.mtime.touch();
    }

    /// Returns a new mesh in which every hexahedron is split into 6 tetrahedra.
    /// Tetrahedra pass through unchanged.
    ///
    /// Hexahedra that share a wall with consistent local vertex ordering get
    /// matching triangles on that wall, so the wall becomes interior faces.
    pub fn tetrahedralize(&self) -> Self {
        let mut tets = Vec::with_capacity(self.cells.len());

        for cell in &self.cells {
            if cell[4] == UNUSED_SLOT {
                tets.push([cell[0], cell[1], cell[2], cell[3]]);
            } else {
                for local in &HEX_TO_TET_PATTERN {
                    tets.push([
                        cell[local[0]],
                        cell[local[1]],
                        cell[local[2]],
                        cell[local[3]],
                    ]);
                }
            }
        }

        Self::new_tet_mesh(self.points.clone(), tets)
    }

    /// Axis-aligned bounds of the points.
    pub fn bounding_box(&self) -> Option<(DVec3, DVec3)> {
        if self.points.is_empty() {
            return None;
        }

        let mut min = DVec3::splat(f64::MAX);
        let mut max = DVec3::splat(f64::MIN);

        for &p in &self.points {
            min = min.min(p);
            max = max.max(p);
        }

        Some((min, max))
    }

    /// Length of the bounding-box diagonal.
    pub fn length_scale(&self) -> f64 {
        self.bounding_box()
            .map_or(1.0, |(min, max)| (max - min).length())
    }
}

impl Tracked for TetMesh {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn mtime(&self) -> ModifiedTime {
        self.mtime
    }
}

fn tet_cell(t: [u32; 4]) -> [u32; 8] {
    [
        t[0],
        t[1],
        t[2],
        t[3],
        UNUSED_SLOT,
        UNUSED_SLOT,
        UNUSED_SLOT,
        UNUSED_SLOT,
    ]
}
