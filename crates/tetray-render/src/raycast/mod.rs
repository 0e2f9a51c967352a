//! Ray casting of tetrahedral meshes.
//!
//! A [`RayCaster`] owns everything that survives between renders: the face
//! index (rebuilt when the mesh changes), the per-render scratch buffers, and
//! the memoized color/opacity tables. Each render is a [`RenderPass`]:
//!
//! ```text
//! let mut pass = caster.initialize(inputs);   // validate, project, rasterize
//! let rgba = pass.cast_ray(x, y, [0.0, 1.0]);  // once per pixel
//! let stats = pass.finalize();
//! ```
//!
//! A pass only borrows the caster and its inputs immutably, so rays may be
//! cast from several threads at once.

pub mod color_table;
pub mod face_geometry;
pub mod face_index;
pub mod intersection;
pub mod projector;
pub mod rasterizer;
pub mod ray_march;

use glam::DVec4;
use tetray_core::{RenderOptions, Result, TetrayError, TopologyPolicy};
use tetray_structures::{dispatch_scalars, ScalarField, TetMesh};

use crate::camera::{Camera, ImageGeometry};
use crate::volume_property::{BlendMode, VolumeProperty, MAX_COMPONENTS};

pub use color_table::{ColorOpacityTable, ComponentTable, MAX_TABLE_SIZE};
pub use face_geometry::{FaceGeometry, FaceGeometryCache};
pub use face_index::{Face, FaceId, FaceIndex, TetraId};
pub use intersection::{Intersection, IntersectionPool, PixelLists};
pub use projector::ViewProjection;
pub use rasterizer::RasterStats;
pub use ray_march::{composite_segment, MarchContext, RayOutcome};

/// Everything one render reads.
#[derive(Debug, Clone, Copy)]
pub struct RenderInputs<'a> {
    pub mesh: &'a TetMesh,
    pub scalars: Option<&'a ScalarField>,
    pub camera: &'a Camera,
    pub property: &'a VolumeProperty,
    pub image: ImageGeometry,
    /// World-space step the opacity tables are corrected for.
    pub sample_distance: f64,
    pub blend_mode: BlendMode,
}

impl<'a> RenderInputs<'a> {
    /// Inputs with a sample distance of 1 and composite blending.
    pub fn new(
        mesh: &'a TetMesh,
        scalars: Option<&'a ScalarField>,
        camera: &'a Camera,
        property: &'a VolumeProperty,
        image: ImageGeometry,
    ) -> Self {
        Self {
            mesh,
            scalars,
            camera,
            property,
            image,
            sample_distance: 1.0,
            blend_mode: BlendMode::Composite,
        }
    }

    /// Sets the sample distance.
    pub fn with_sample_distance(mut self, distance: f64) -> Self {
        self.sample_distance = distance;
        self
    }

    /// Sets the blend mode.
    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Checks that the inputs can be rendered.
    pub fn validate(&self) -> Result<()> {
        let (points, cells) = (self.mesh.num_points(), self.mesh.num_cells());
        if points == 0 || cells == 0 {
            return Err(TetrayError::EmptyMesh { points, cells });
        }
        let scalars = self.scalars.ok_or(TetrayError::MissingScalars)?;
        if scalars.num_tuples() < points {
            return Err(TetrayError::SizeMismatch {
                expected: points,
                actual: scalars.num_tuples(),
            });
        }
        let components = scalars.num_components();
        if components > MAX_COMPONENTS {
            return Err(TetrayError::InvalidComponent(format!(
                "{components} scalar components, at most {MAX_COMPONENTS} are supported"
            )));
        }
        if self.property.num_components() < components {
            return Err(TetrayError::InvalidComponent(format!(
                "volume property has {} components but the scalars have {components}",
                self.property.num_components()
            )));
        }
        if !(self.sample_distance.is_finite() && self.sample_distance > 0.0) {
            return Err(TetrayError::InvalidParameter(format!(
                "sample distance must be positive, got {}",
                self.sample_distance
            )));
        }
        if let Some(c) = self
            .property
            .components()
            .iter()
            .position(|c| c.scalar_opacity_unit_distance <= 0.0)
        {
            return Err(TetrayError::InvalidParameter(format!(
                "component {c} has a non-positive opacity unit distance"
            )));
        }
        self.image.validate()
    }
}

/// What one initialization did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// The face index was rebuilt for this render.
    pub face_index_rebuilt: bool,
    /// The color/opacity tables were rebuilt for this render.
    pub table_rebuilt: bool,
    /// Unique faces in the index.
    pub faces: usize,
    /// Rasterization counters.
    pub raster: RasterStats,
}

/// Persistent state of the ray caster.
#[derive(Debug, Clone)]
pub struct RayCaster {
    options: RenderOptions,
    face_index: Option<FaceIndex>,
    face_policy: TopologyPolicy,
    projection: ViewProjection,
    geometry: FaceGeometryCache,
    lists: PixelLists,
    table: ColorOpacityTable,
    stats: RenderStats,
}

impl RayCaster {
    /// Creates a ray caster.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            lists: PixelLists::new(options.intersection_block_size, options.max_intersection_blocks),
            face_policy: options.topology_policy,
            options,
            face_index: None,
            projection: ViewProjection::new(),
            geometry: FaceGeometryCache::new(),
            table: ColorOpacityTable::new(),
            stats: RenderStats::default(),
        }
    }

    /// Current options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Replaces the options; they apply from the next render.
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// The face index of the last rendered mesh.
    pub fn face_index(&self) -> Option<&FaceIndex> {
        self.face_index.as_ref()
    }

    /// Statistics of the last initialization.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Prepares a render: validates `inputs`, rebuilds the face index if the
    /// mesh changed, projects the mesh, computes face geometry, rasterizes the
    /// boundary, and updates the color/opacity tables.
    ///
    /// Never fails. On error the returned pass is invalid and every ray is
    /// transparent; the error is logged and available from the pass.
    pub fn initialize<'a>(&'a mut self, inputs: RenderInputs<'a>) -> RenderPass<'a> {
        let error = self.prepare(&inputs).err();
        if let Some(e) = &error {
            log::error!("render initialization failed: {e}");
        }
        RenderPass {
            caster: self,
            inputs,
            valid: error.is_none(),
            error,
        }
    }

    fn prepare(&mut self, inputs: &RenderInputs<'_>) -> Result<()> {
        self.stats = RenderStats::default();
        inputs.validate()?;
        let scalars = inputs.scalars.ok_or(TetrayError::MissingScalars)?;

        let stale = self.face_policy != self.options.topology_policy
            || !self
                .face_index
                .as_ref()
                .is_some_and(|index| index.is_current(inputs.mesh));
        if stale {
            self.face_index = None;
            self.face_policy = self.options.topology_policy;
            self.face_index = Some(FaceIndex::build(inputs.mesh, self.face_policy)?);
            self.stats.face_index_rebuilt = true;
        }
        let Some(faces) = self.face_index.as_ref() else {
            return Err(TetrayError::InvalidParameter("face index unavailable".into()));
        };

        self.projection
            .update(inputs.mesh.points(), inputs.camera, &inputs.image);
        self.geometry.compute(faces, &self.projection);

        let [width, height] = inputs.image.in_use_size;
        self.lists.set_limits(
            self.options.intersection_block_size,
            self.options.max_intersection_blocks,
        );
        self.lists.reset(width, height);
        self.stats.raster = rasterizer::rasterize_boundary_faces(
            faces,
            inputs.mesh,
            &self.projection,
            &self.geometry,
            &mut self.lists,
        );

        self.stats.table_rebuilt = self.table.update(
            scalars,
            inputs.property,
            inputs.sample_distance,
            inputs.blend_mode,
        );
        self.stats.faces = faces.num_faces();

        log::debug!(
            "render prepared: {width}x{height}, {} faces, {} intersections, \
             face index rebuilt: {}, tables rebuilt: {}",
            self.stats.faces,
            self.stats.raster.intersections,
            self.stats.face_index_rebuilt,
            self.stats.table_rebuilt
        );
        Ok(())
    }
}

impl Default for RayCaster {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

/// One render of a [`RayCaster`].
#[derive(Debug)]
pub struct RenderPass<'a> {
    caster: &'a RayCaster,
    inputs: RenderInputs<'a>,
    valid: bool,
    error: Option<TetrayError>,
}

impl<'a> RenderPass<'a> {
    /// Whether initialization succeeded.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The initialization error, if any.
    pub fn error(&self) -> Option<&TetrayError> {
        self.error.as_ref()
    }

    /// Takes the initialization error out of the pass. The pass stays invalid.
    pub fn take_error(&mut self) -> Option<TetrayError> {
        self.error.take()
    }

    /// Image geometry of this render.
    pub fn image(&self) -> &ImageGeometry {
        &self.inputs.image
    }

    /// Initialization statistics.
    pub fn stats(&self) -> RenderStats {
        self.caster.stats
    }

    /// Premultiplied RGBA of pixel `(x, y)` of the in-use image.
    ///
    /// `bounds` are the near and far depth limits of the ray. Invalid passes
    /// and pixels outside the image are transparent black.
    pub fn cast_ray(&self, x: usize, y: usize, bounds: [f64; 2]) -> DVec4 {
        self.trace(x, y, bounds).color
    }

    /// Like [`Self::cast_ray`], also reporting how the ray travelled.
    pub fn trace(&self, x: usize, y: usize, bounds: [f64; 2]) -> RayOutcome {
        let [width, height] = self.inputs.image.in_use_size;
        if !self.valid || x >= width || y >= height {
            return RayOutcome::default();
        }
        let (Some(faces), Some(scalars)) = (self.caster.face_index.as_ref(), self.inputs.scalars)
        else {
            return RayOutcome::default();
        };
        let ctx = MarchContext {
            faces,
            geometry: &self.caster.geometry,
            projection: &self.caster.projection,
            table: &self.caster.table,
            lists: &self.caster.lists,
            opacity_termination: self.caster.options.opacity_termination,
        };
        dispatch_scalars!(scalars.data(), array => ray_march::march(&ctx, array, x, y, bounds))
    }

    /// Intersections stored for pixel `(x, y)`, nearest first.
    pub fn intersections(&self, x: usize, y: usize) -> impl Iterator<Item = &Intersection> + '_ {
        self.caster.lists.iter(x, y)
    }

    /// Ends the render. Pooled memory is kept for the next one.
    pub fn finalize(self) -> RenderStats {
        self.caster.stats
    }
}
