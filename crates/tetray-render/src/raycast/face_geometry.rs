//! Screen-space plane and barycentric basis of every face.
//!
//! Recomputed each render from the projected vertices. The winding is made
//! canonical so the basis denominator is never negative; the plane normal
//! then points toward increasing depth.

use glam::{DVec2, DVec3};

use super::face_index::FaceIndex;
use super::projector::ViewProjection;

/// View-dependent geometry of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    /// Vertex ids in canonical winding. The first one is the reference vertex.
    pub vertices: [u32; 3],
    /// Screen position of the reference vertex.
    pub origin: DVec3,
    /// Edge from the reference vertex to the second vertex.
    pub p1: DVec2,
    /// Edge from the reference vertex to the third vertex.
    pub p2: DVec2,
    /// `p1.x * p2.y - p2.x * p1.y`, non-negative.
    pub denominator: f64,
    /// Plane `(A, B, C, D)` with `A x + B y + C z + D = 0`.
    pub plane: [f64; 4],
}

impl FaceGeometry {
    /// Builds the geometry of a triangle from its vertex ids and screen positions.
    pub fn new(vertices: [u32; 3], screen: [DVec3; 3]) -> Self {
        let [a, b, c] = screen;
        let mut ordered = vertices;
        let mut e1 = b - a;
        let mut e2 = c - a;
        let mut denominator = e1.x * e2.y - e2.x * e1.y;
        if denominator < 0.0 {
            std::mem::swap(&mut e1, &mut e2);
            ordered.swap(1, 2);
            denominator = -denominator;
        }
        let normal = e1.cross(e2);
        let d = -a.dot(normal);
        Self {
            vertices: ordered,
            origin: a,
            p1: e1.truncate(),
            p2: e2.truncate(),
            denominator,
            plane: [normal.x, normal.y, normal.z, d],
        }
    }

    /// Barycentric weights of the second and third vertex at `(x, y)`, if the
    /// point lies inside the triangle (edges included).
    #[inline]
    pub fn weights(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.denominator == 0.0 {
            return None;
        }
        let qx = x - self.origin.x;
        let qy = y - self.origin.y;
        let q1 = (qx * self.p2.y - qy * self.p2.x) / self.denominator;
        let q2 = (qy * self.p1.x - qx * self.p1.y) / self.denominator;
        (q1 >= 0.0 && q2 >= 0.0 && q1 + q2 <= 1.0).then_some((q1, q2))
    }

    /// Whether `(x, y)` lies inside the triangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.weights(x, y).is_some()
    }

    /// Depth of the face plane at `(x, y)`.
    #[inline]
    pub fn depth_at(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d] = self.plane;
        -(a * x + b * y + d) / c
    }

    /// Signed plane evaluation. Positive values lie behind the face.
    #[inline]
    pub fn evaluate(&self, p: DVec3) -> f64 {
        let [a, b, c, d] = self.plane;
        a * p.x + b * p.y + c * p.z + d
    }

    /// Interpolates per-vertex values with weights from [`Self::weights`].
    #[inline]
    pub fn interpolate(&self, (q1, q2): (f64, f64), values: [f64; 3]) -> f64 {
        (1.0 - q1 - q2) * values[0] + q1 * values[1] + q2 * values[2]
    }
}

/// Geometry of every face of a [`FaceIndex`], indexed by face id.
#[derive(Debug, Clone, Default)]
pub struct FaceGeometryCache {
    geometry: Vec<FaceGeometry>,
}

impl FaceGeometryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the geometry of all faces, reusing storage.
    pub fn compute(&mut self, faces: &FaceIndex, projection: &ViewProjection) {
        self.geometry.clear();
        self.geometry.extend(faces.faces().iter().map(|face| {
            let [a, b, c] = face.vertices;
            FaceGeometry::new(
                face.vertices,
                [projection.screen(a), projection.screen(b), projection.screen(c)],
            )
        }));
    }

    /// Geometry of one face.
    #[inline]
    pub fn get(&self, face: u32) -> &FaceGeometry {
        &self.geometry[face as usize]
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }
}
