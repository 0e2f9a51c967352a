//! Projection of mesh points into image space.
//!
//! Screen positions are `(x, y, z)` with `x, y` in pixels relative to the
//! image origin and `z` the projected depth (0 at the near plane, 1 at the far
//! plane). The inverse of the combined matrix is kept so ray samples can be
//! mapped back to world space for distance computations.

use glam::{DMat4, DVec3, DVec4};

use crate::camera::{Camera, ImageGeometry};

/// Depth given to points at or behind the eye. Negative, so faces touching
/// them fail the near-plane reject.
const BEHIND_EYE_DEPTH: f64 = -1.0;

/// Screen-space positions of the mesh points for one render.
#[derive(Debug, Clone)]
pub struct ViewProjection {
    screen: Vec<DVec3>,
    world_to_screen: DMat4,
    screen_to_world: DMat4,
    image: ImageGeometry,
}

impl ViewProjection {
    /// An empty projection.
    pub fn new() -> Self {
        Self {
            screen: Vec::new(),
            world_to_screen: DMat4::IDENTITY,
            screen_to_world: DMat4::IDENTITY,
            image: ImageGeometry::full(2, 2),
        }
    }

    /// Projects `points` for the given camera and image, reusing storage.
    pub fn update(&mut self, points: &[DVec3], camera: &Camera, image: &ImageGeometry) {
        let matrix = camera.view_projection_matrix(image.aspect_ratio());
        self.world_to_screen = matrix;
        self.screen_to_world = matrix.inverse();
        self.image = *image;

        let half_w = (image.viewport_size[0] - 1) as f64 * 0.5;
        let half_h = (image.viewport_size[1] - 1) as f64 * 0.5;
        let origin_x = image.origin[0] as f64;
        let origin_y = image.origin[1] as f64;

        self.screen.clear();
        self.screen.extend(points.iter().map(|p| {
            let clip = matrix * p.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            let z = if clip.w > 0.0 { ndc.z } else { BEHIND_EYE_DEPTH };
            DVec3::new(
                (ndc.x + 1.0) * half_w - origin_x,
                (ndc.y + 1.0) * half_h - origin_y,
                z,
            )
        }));
    }

    /// All projected points.
    pub fn screen_points(&self) -> &[DVec3] {
        &self.screen
    }

    /// One projected point.
    #[inline]
    pub fn screen(&self, vertex: u32) -> DVec3 {
        self.screen[vertex as usize]
    }

    /// The combined projection * view matrix used for this render.
    pub fn world_to_screen(&self) -> DMat4 {
        self.world_to_screen
    }

    /// Maps an image-space point `(x, y)` at depth `z` back to world space.
    pub fn to_world(&self, x: f64, y: f64, z: f64) -> DVec3 {
        let vx = (x + self.image.origin[0] as f64) / (self.image.viewport_size[0] - 1) as f64;
        let vy = (y + self.image.origin[1] as f64) / (self.image.viewport_size[1] - 1) as f64;
        let ndc = DVec4::new(vx * 2.0 - 1.0, vy * 2.0 - 1.0, z, 1.0);
        let world = self.screen_to_world * ndc;
        world.truncate() / world.w
    }
}

impl Default for ViewProjection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_on_z() -> Camera {
        let mut camera = Camera::new();
        camera.look_at(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Y);
        camera.near = 1.0;
        camera.far = 10.0;
        camera
    }

    #[test]
    fn test_target_projects_to_image_center() {
        let mut projection = ViewProjection::new();
        let image = ImageGeometry::full(101, 101);
        projection.update(&[DVec3::ZERO], &camera_on_z(), &image);

        let p = projection.screen(0);
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn test_image_origin_offsets_pixels() {
        let mut projection = ViewProjection::new();
        let image = ImageGeometry::sub_region([20, 10], [40, 40], [101, 101]);
        projection.update(&[DVec3::ZERO], &camera_on_z(), &image);

        let p = projection.screen(0);
        assert!((p.x - 30.0).abs() < 1e-9);
        assert!((p.y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_world_inverts_projection() {
        let mut projection = ViewProjection::new();
        let image = ImageGeometry::sub_region([3, 7], [50, 40], [80, 60]);
        let points = [DVec3::new(0.3, -0.2, 0.5), DVec3::new(-1.0, 0.4, -2.0)];
        projection.update(&points, &camera_on_z(), &image);

        for (i, p) in points.iter().enumerate() {
            let s = projection.screen(i as u32);
            let back = projection.to_world(s.x, s.y, s.z);
            assert!((back - *p).length() < 1e-9, "{back:?} != {p:?}");
        }
    }

    #[test]
    fn test_depth_increases_away_from_camera() {
        let mut projection = ViewProjection::new();
        let image = ImageGeometry::full(64, 64);
        let points = [DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 0.0, -1.0)];
        projection.update(&points, &camera_on_z(), &image);
        assert!(projection.screen(0).z < projection.screen(1).z);
    }

    #[test]
    fn test_points_behind_eye_get_negative_depth() {
        let mut projection = ViewProjection::new();
        let image = ImageGeometry::full(64, 64);
        projection.update(&[DVec3::new(0.0, 0.0, 8.0)], &camera_on_z(), &image);
        assert!(projection.screen(0).z < 0.0);
    }
}
