//! Scan conversion of front-facing boundary faces into per-pixel lists.

use glam::DVec3;
use tetray_structures::TetMesh;

use super::face_geometry::{FaceGeometry, FaceGeometryCache};
use super::face_index::{Face, FaceIndex};
use super::intersection::PixelLists;
use super::projector::ViewProjection;

/// Counters from one rasterization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Faces with a single owner.
    pub boundary_faces: usize,
    /// Boundary faces facing the viewer.
    pub front_faces: usize,
    /// Front faces rejected for touching the near plane or missing the image.
    pub culled_faces: usize,
    /// Nodes stored.
    pub intersections: usize,
    /// Nodes dropped on pool overflow.
    pub dropped: usize,
}

/// The vertex of the owning tetrahedron that is not on `face`.
fn opposite_vertex(face: &Face, mesh: &TetMesh) -> Option<u32> {
    let tet = mesh.tet(face.first_owner as usize)?;
    tet.into_iter().find(|v| !face.vertices.contains(v))
}

/// Whether a boundary face looks toward the viewer: the rest of its
/// tetrahedron lies behind it.
pub fn is_front_facing(geometry: &FaceGeometry, opposite: DVec3) -> bool {
    geometry.evaluate(opposite) > 0.0
}

/// Inclusive pixel bounding box of a face clamped to the image, or `None` if
/// the face misses the image entirely.
fn pixel_bounds(screen: [DVec3; 3], width: usize, height: usize) -> Option<[usize; 4]> {
    let min = screen[0].min(screen[1]).min(screen[2]);
    let max = screen[0].max(screen[1]).max(screen[2]);
    let (w, h) = ((width - 1) as f64, (height - 1) as f64);
    if max.x < 0.0 || max.y < 0.0 || min.x > w || min.y > h {
        return None;
    }
    let x0 = min.x.floor().max(0.0) as usize;
    let y0 = min.y.floor().max(0.0) as usize;
    let x1 = max.x.ceil().min(w) as usize;
    let y1 = max.y.ceil().min(h) as usize;
    Some([x0, y0, x1, y1])
}

/// Inserts an intersection for every pixel covered by a front-facing boundary
/// face. `lists` must already be reset to the in-use image size.
pub fn rasterize_boundary_faces(
    faces: &FaceIndex,
    mesh: &TetMesh,
    projection: &ViewProjection,
    geometry: &FaceGeometryCache,
    lists: &mut PixelLists,
) -> RasterStats {
    let mut stats = RasterStats::default();
    let (width, height) = (lists.width(), lists.height());
    if width == 0 || height == 0 {
        return stats;
    }

    for (id, face) in faces.faces().iter().enumerate() {
        if !face.is_boundary() {
            continue;
        }
        stats.boundary_faces += 1;

        let g = geometry.get(id as u32);
        let Some(opposite) = opposite_vertex(face, mesh) else {
            continue;
        };
        if !is_front_facing(g, projection.screen(opposite)) {
            continue;
        }
        stats.front_faces += 1;

        let screen = face.vertices.map(|v| projection.screen(v));
        let min_z = screen[0].z.min(screen[1].z).min(screen[2].z);
        if min_z <= 0.0 {
            stats.culled_faces += 1;
            continue;
        }
        let Some([x0, y0, x1, y1]) = pixel_bounds(screen, width, height) else {
            stats.culled_faces += 1;
            continue;
        };

        let z = g.origin.z;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if !g.contains(x as f64, y as f64) {
                    continue;
                }
                if lists.insert(x, y, id as u32, z) {
                    stats.intersections += 1;
                } else {
                    stats.dropped += 1;
                }
            }
        }
    }

    log::debug!(
        "rasterized {} of {} boundary faces: {} intersections, {} dropped, {} culled",
        stats.front_faces - stats.culled_faces,
        stats.boundary_faces,
        stats.intersections,
        stats.dropped,
        stats.culled_faces
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, ImageGeometry};
    use tetray_core::TopologyPolicy;

    struct Scene {
        mesh: TetMesh,
        faces: FaceIndex,
        projection: ViewProjection,
        geometry: FaceGeometryCache,
    }

    fn scene(mesh: TetMesh, image: &ImageGeometry) -> Scene {
        let mut camera = Camera::new();
        camera.look_at(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Y);
        camera.near = 1.0;
        camera.far = 10.0;

        let faces = FaceIndex::build(&mesh, TopologyPolicy::Lenient).unwrap();
        let mut projection = ViewProjection::new();
        projection.update(mesh.points(), &camera, image);
        let mut geometry = FaceGeometryCache::new();
        geometry.compute(&faces, &projection);
        Scene {
            mesh,
            faces,
            projection,
            geometry,
        }
    }

    fn single_tet() -> TetMesh {
        TetMesh::new_tet_mesh(
            vec![
                DVec3::new(-1.0, -1.0, 0.0),
                DVec3::new(1.0, -1.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(0.0, 0.0, -1.0),
            ],
            vec![[0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_only_front_faces_are_rasterized() {
        let image = ImageGeometry::full(64, 64);
        let s = scene(single_tet(), &image);
        let mut lists = PixelLists::new(1024, 16);
        lists.reset(64, 64);
        let stats = rasterize_boundary_faces(&s.faces, &s.mesh, &s.projection, &s.geometry, &mut lists);

        assert_eq!(stats.boundary_faces, 4);
        // Seen from +z only the base at z = 0 faces the camera; the apex
        // projects inside it, so every side face is turned away.
        assert_eq!(stats.front_faces, 1);
        assert!(stats.intersections > 0);

        // The image center lies inside the base triangle.
        let centre: Vec<_> = lists.iter(32, 32).collect();
        assert!(!centre.is_empty());
        assert!(lists.iter(0, 63).next().is_none());
    }

    #[test]
    fn test_each_covered_pixel_gets_one_entry() {
        let image = ImageGeometry::full(64, 64);
        let s = scene(single_tet(), &image);
        let mut lists = PixelLists::new(1024, 16);
        lists.reset(64, 64);
        rasterize_boundary_faces(&s.faces, &s.mesh, &s.projection, &s.geometry, &mut lists);

        for y in 0..64 {
            for x in 0..64 {
                assert!(lists.iter(x, y).count() <= 1, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_faces_behind_camera_are_culled() {
        let image = ImageGeometry::full(32, 32);
        let mesh = TetMesh::new_tet_mesh(
            vec![
                DVec3::new(-1.0, -1.0, 4.5),
                DVec3::new(1.0, -1.0, 4.5),
                DVec3::new(0.0, 1.0, 4.5),
                DVec3::new(0.0, 0.0, 6.0),
            ],
            vec![[0, 1, 2, 3]],
        );
        let s = scene(mesh, &image);
        let mut lists = PixelLists::new(1024, 16);
        lists.reset(32, 32);
        let stats = rasterize_boundary_faces(&s.faces, &s.mesh, &s.projection, &s.geometry, &mut lists);
        assert_eq!(stats.intersections, 0);
    }

    #[test]
    fn test_pixel_bounds_clamped() {
        let screen = [
            DVec3::new(-5.0, 2.2, 0.5),
            DVec3::new(10.4, 3.0, 0.5),
            DVec3::new(3.0, 40.0, 0.5),
        ];
        assert_eq!(pixel_bounds(screen, 8, 8), Some([0, 2, 7, 7]));
        let outside = screen.map(|p| p + DVec3::new(100.0, 0.0, 0.0));
        assert_eq!(pixel_bounds(outside, 8, 8), None);
    }
}
