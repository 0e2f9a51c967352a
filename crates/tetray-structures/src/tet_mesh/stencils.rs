//! Local vertex stencils for cell faces and decomposition.

/// The 4 triangular faces of a tetrahedron, each omitting one local vertex.
/// Face `i` omits local vertex `3 - i`.
pub const TET_FACE_STENCIL: [[usize; 3]; 4] = [
    [0, 1, 2],
    [0, 1, 3],
    [0, 2, 3],
    [1, 2, 3],
];

/// Decomposition of a hexahedron into 6 tetrahedra around the diagonal 0-6.
///
/// Each quad face is cut along the diagonal touching vertex 0 or vertex 6, so
/// neighbouring hexahedra with the same local ordering cut their shared wall
/// the same way.
pub const HEX_TO_TET_PATTERN: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 1, 5, 6],
    [0, 3, 2, 6],
    [0, 3, 7, 6],
    [0, 4, 5, 6],
    [0, 4, 7, 6],
];
