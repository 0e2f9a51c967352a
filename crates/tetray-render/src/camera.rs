//! Camera and image-plane geometry.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};
use tetray_core::{Result, TetrayError};

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// A camera viewing the volume.
///
/// Projection matrices map the near plane to depth 0 and the far plane to
/// depth 1, so projected depths of visible points lie in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Camera position in world space.
    pub position: DVec3,
    /// Point the camera is looking at.
    pub target: DVec3,
    /// Up vector.
    pub up: DVec3,
    /// Vertical field of view in radians.
    pub fov: f64,
    /// Near clipping plane.
    pub near: f64,
    /// Far clipping plane.
    pub far: f64,
    /// Projection mode.
    pub projection_mode: ProjectionMode,
    /// Half-height of the view volume (used when `projection_mode` is Orthographic).
    pub ortho_scale: f64,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, 3.0),
            target: DVec3::ZERO,
            up: DVec3::Y,
            fov: std::f64::consts::FRAC_PI_4, // 45 degrees
            near: 0.01,
            far: 1000.0,
            projection_mode: ProjectionMode::Perspective,
            ortho_scale: 1.0,
        }
    }

    /// Places the camera.
    pub fn look_at(&mut self, position: DVec3, target: DVec3, up: DVec3) -> &mut Self {
        self.position = position;
        self.target = target;
        self.up = up;
        self
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix for the given aspect ratio (width / height).
    #[must_use]
    pub fn projection_matrix(&self, aspect_ratio: f64) -> DMat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                DMat4::perspective_rh(self.fov, aspect_ratio, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.ortho_scale;
                let half_width = half_height * aspect_ratio;
                DMat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Returns the combined projection * view matrix.
    #[must_use]
    pub fn view_projection_matrix(&self, aspect_ratio: f64) -> DMat4 {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> DVec3 {
        (self.target - self.position).normalize()
    }

    /// Resets the camera to look at the given bounding box along -Z.
    pub fn look_at_box(&mut self, min: DVec3, max: DVec3) {
        let center = (min + max) * 0.5;
        let size = (max - min).length();
        let extents = max - min;

        self.target = center;
        self.position = center + DVec3::new(0.0, 0.0, size * 1.5);
        self.up = DVec3::Y;
        self.near = size * 0.001;
        self.far = size * 100.0;

        let half_height = extents.y.max(extents.x) * 0.6;
        self.ortho_scale = half_height.max(0.1);
    }

    /// Sets the projection mode.
    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.projection_mode = mode;
    }

    /// Sets the orthographic scale.
    pub fn set_ortho_scale(&mut self, scale: f64) {
        self.ortho_scale = scale.max(0.01);
    }

    /// Sets the field of view in radians.
    pub fn set_fov(&mut self, fov: f64) {
        self.fov = fov.clamp(0.1, std::f64::consts::PI - 0.1);
    }

    /// Sets the near clipping plane.
    pub fn set_near(&mut self, near: f64) {
        self.near = near.max(1e-6);
    }

    /// Sets the far clipping plane.
    pub fn set_far(&mut self, far: f64) {
        self.far = far.max(self.near * 2.0);
    }

    /// Returns FOV in degrees.
    #[must_use]
    pub fn fov_degrees(&self) -> f64 {
        self.fov.to_degrees()
    }

    /// Sets FOV from degrees.
    pub fn set_fov_degrees(&mut self, degrees: f64) {
        self.set_fov(degrees.to_radians());
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the rendered image sits inside the viewport.
///
/// Pixel `(x, y)` of the image corresponds to viewport pixel
/// `(x + origin[0], y + origin[1])`; `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGeometry {
    /// Size of the region actually rendered.
    pub in_use_size: [usize; 2],
    /// Offset of that region inside the viewport.
    pub origin: [usize; 2],
    /// Full viewport size.
    pub viewport_size: [usize; 2],
}

impl ImageGeometry {
    /// An image covering the whole viewport.
    #[must_use]
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            in_use_size: [width, height],
            origin: [0, 0],
            viewport_size: [width, height],
        }
    }

    /// A sub-region of a larger viewport.
    #[must_use]
    pub fn sub_region(origin: [usize; 2], size: [usize; 2], viewport_size: [usize; 2]) -> Self {
        Self {
            in_use_size: size,
            origin,
            viewport_size,
        }
    }

    /// Width over height of the viewport.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.viewport_size[0] as f64 / self.viewport_size[1] as f64
    }

    /// Number of pixels in the rendered region.
    #[must_use]
    pub fn num_pixels(&self) -> usize {
        self.in_use_size[0] * self.in_use_size[1]
    }

    /// Checks that the region can be rendered.
    pub fn validate(&self) -> Result<()> {
        let [vw, vh] = self.viewport_size;
        if vw < 2 || vh < 2 {
            return Err(TetrayError::InvalidImage(format!(
                "viewport {vw}x{vh} must be at least 2x2"
            )));
        }
        let [w, h] = self.in_use_size;
        if w == 0 || h == 0 {
            return Err(TetrayError::InvalidImage(format!("image size {w}x{h} is empty")));
        }
        if self.origin[0] + w > vw || self.origin[1] + h > vh {
            return Err(TetrayError::InvalidImage(format!(
                "image {w}x{h} at {:?} exceeds viewport {vw}x{vh}",
                self.origin
            )));
        }
        Ok(())
    }
}
