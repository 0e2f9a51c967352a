//! Cell-to-cell ray traversal and segment compositing.
//!
//! A ray starts at each boundary face in its pixel's intersection list and
//! walks through the mesh one tetrahedron at a time. Inside a tetrahedron the
//! exit face is the nearest other face the ray crosses; the segment between
//! entry and exit is composited with a closed-form integral of the linearly
//! varying color and opacity.

use glam::{DVec3, DVec4};
use tetray_structures::ScalarAccess;

use super::color_table::ColorOpacityTable;
use super::face_geometry::FaceGeometryCache;
use super::face_index::{FaceId, FaceIndex, TetraId};
use super::intersection::PixelLists;
use super::projector::ViewProjection;
use crate::volume_property::MAX_COMPONENTS;

/// Read-only render state shared by every ray of a pass.
#[derive(Clone, Copy)]
pub struct MarchContext<'a> {
    pub faces: &'a FaceIndex,
    pub geometry: &'a FaceGeometryCache,
    pub projection: &'a ViewProjection,
    pub table: &'a ColorOpacityTable,
    pub lists: &'a PixelLists,
    /// Accumulated opacity at which a ray stops.
    pub opacity_termination: f64,
}

/// Result of marching one ray.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RayOutcome {
    /// Premultiplied RGBA, every channel in `[0, 1]`.
    pub color: DVec4,
    /// Tetrahedra crossed.
    pub segments: usize,
    /// Intersection-list entries the ray started from.
    pub entries: usize,
}

/// Where the ray is inside the mesh.
#[derive(Debug, Clone, Copy)]
struct Position {
    tetra: TetraId,
    face: FaceId,
    z: f64,
    point: DVec3,
    sample: DVec4,
}

#[derive(Debug, Clone, Copy)]
enum MarchState {
    /// Looking for the next entry point in the pixel's list.
    Seeking,
    /// Inside a tetrahedron, having entered through `Position::face`.
    Traversing(Position),
    /// Nothing more to accumulate for this pixel.
    Terminated,
}

/// Running premultiplied color and opacity.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    color: DVec3,
    alpha: f64,
}

impl Accumulator {
    fn add_segment(&mut self, front: DVec4, back: DVec4, dist: f64) {
        let (c, a) = composite_segment(self.color, self.alpha, front, back, dist);
        self.color = c;
        self.alpha = a;
    }
}

/// Composites one segment of length `dist` whose premultiplied end samples
/// are `front` (entry) and `back` (exit) onto the accumulated `(color, alpha)`.
pub fn composite_segment(
    color: DVec3,
    alpha: f64,
    front: DVec4,
    back: DVec4,
    dist: f64,
) -> (DVec3, f64) {
    let (c1, a1) = (front.truncate(), front.w);
    let (c2, a2) = (back.truncate(), back.w);
    let color = color + 0.5 * (c1 + c2) * (1.0 - alpha) * dist
        - (3.0 * c1 * a1 + 5.0 * c2 * a1 + c1 * a2 + 3.0 * c2 * a2) * (dist * dist / 24.0);
    let alpha = (alpha + (1.0 - alpha) * 0.5 * (a1 + a2) * dist).min(1.0);
    (color, alpha)
}

/// Classifies the scalar field at `(x, y)` on a face.
///
/// Returns the plane depth and the premultiplied sample, or `None` if the
/// point is outside the face.
fn sample_face<S: ScalarAccess + ?Sized>(
    ctx: &MarchContext<'_>,
    scalars: &S,
    face: FaceId,
    x: f64,
    y: f64,
) -> Option<(f64, DVec4)> {
    let g = ctx.geometry.get(face);
    let weights = g.weights(x, y)?;
    let n = ctx.table.num_components().min(MAX_COMPONENTS);
    let [v0, v1, v2] = g.vertices.map(|v| v as usize);
    let mut values = [0.0; MAX_COMPONENTS];
    for (c, value) in values.iter_mut().enumerate().take(n) {
        *value = g.interpolate(
            weights,
            [scalars.value(v0, c), scalars.value(v1, c), scalars.value(v2, c)],
        );
    }
    Some((g.depth_at(x, y), ctx.table.classify(&values[..n])))
}

/// The face through which the ray leaves `tetra`, with its depth.
///
/// Candidates are the tetrahedron's faces other than `entry`; the nearest
/// one containing `(x, y)` deeper than `near_z` wins, ties going to the
/// first candidate.
fn exit_face(
    ctx: &MarchContext<'_>,
    tetra: TetraId,
    entry: FaceId,
    x: f64,
    y: f64,
    near_z: f64,
) -> Option<(FaceId, f64)> {
    let faces = ctx.faces.tetra_faces(tetra)?;
    let candidates = faces.iter().filter(|&&f| f != entry);
    if candidates.clone().count() > 3 {
        log::error!("tetrahedron {tetra} has more than 3 exit candidates; using the first 3");
    }

    let mut best: Option<(FaceId, f64)> = None;
    for &face in candidates.take(3) {
        let g = ctx.geometry.get(face);
        if !g.contains(x, y) {
            continue;
        }
        let z = g.depth_at(x, y);
        if z > near_z && best.map_or(true, |(_, best_z)| z < best_z) {
            best = Some((face, z));
        }
    }
    best
}

/// Mutable state of one ray.
struct Ray<'c, 'a, S: ?Sized> {
    ctx: &'c MarchContext<'a>,
    scalars: &'c S,
    x: f64,
    y: f64,
    bounds: [f64; 2],
    acc: Accumulator,
    outcome: RayOutcome,
    // Depth already covered by earlier traversals.
    consumed_z: f64,
}

impl<S: ScalarAccess + ?Sized> Ray<'_, '_, S> {
    fn enter(&self, face: FaceId) -> Option<Position> {
        let (z, sample) = sample_face(self.ctx, self.scalars, face, self.x, self.y)?;
        if z < self.bounds[0] || z < self.consumed_z {
            return None;
        }
        Some(Position {
            tetra: self.ctx.faces.face(face).first_owner,
            face,
            z,
            point: self.ctx.projection.to_world(self.x, self.y, z),
            sample,
        })
    }

    fn traverse(&mut self, from: Position) -> MarchState {
        let ctx = self.ctx;
        let Some((exit, far_z)) = exit_face(ctx, from.tetra, from.face, self.x, self.y, from.z)
        else {
            self.consumed_z = from.z;
            return MarchState::Seeking;
        };
        if far_z > self.bounds[1] {
            return MarchState::Terminated;
        }
        let Some((_, back)) = sample_face(ctx, self.scalars, exit, self.x, self.y) else {
            self.consumed_z = from.z;
            return MarchState::Seeking;
        };

        let point = ctx.projection.to_world(self.x, self.y, far_z);
        self.acc
            .add_segment(from.sample, back, from.point.distance(point));
        self.outcome.segments += 1;
        self.consumed_z = far_z;

        if self.acc.alpha >= ctx.opacity_termination {
            return MarchState::Terminated;
        }
        match ctx.faces.face(exit).other_owner(from.tetra) {
            Some(next) => MarchState::Traversing(Position {
                tetra: next,
                face: exit,
                z: far_z,
                point,
                sample: back,
            }),
            None => MarchState::Seeking,
        }
    }
}

/// Marches the ray of pixel `(x, y)` through the mesh.
///
/// Entries in front of `bounds[0]` are skipped and the ray stops once an
/// exit lies beyond `bounds[1]`.
pub fn march<S: ScalarAccess + ?Sized>(
    ctx: &MarchContext<'_>,
    scalars: &S,
    x: usize,
    y: usize,
    bounds: [f64; 2],
) -> RayOutcome {
    let mut nodes = ctx.lists.iter(x, y);
    let mut ray = Ray {
        ctx,
        scalars,
        x: x as f64,
        y: y as f64,
        bounds,
        acc: Accumulator::default(),
        outcome: RayOutcome::default(),
        consumed_z: f64::NEG_INFINITY,
    };

    let mut state = MarchState::Seeking;
    loop {
        state = match state {
            MarchState::Seeking => match nodes.by_ref().find_map(|node| ray.enter(node.face)) {
                Some(position) => {
                    ray.outcome.entries += 1;
                    MarchState::Traversing(position)
                }
                None => MarchState::Terminated,
            },
            MarchState::Traversing(from) => ray.traverse(from),
            MarchState::Terminated => break,
        };
    }

    let mut outcome = ray.outcome;
    outcome.color = ray
        .acc
        .color
        .clamp(DVec3::ZERO, DVec3::ONE)
        .extend(ray.acc.alpha.clamp(0.0, 1.0));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_is_identity() {
        let color = DVec3::new(0.2, 0.3, 0.4);
        let front = DVec4::new(0.5, 0.1, 0.0, 0.7);
        let back = DVec4::new(0.9, 0.9, 0.9, 1.0);
        let (c, a) = composite_segment(color, 0.35, front, back, 0.0);
        assert_eq!(c, color);
        assert_eq!(a, 0.35);
    }

    #[test]
    fn test_transparent_samples_add_nothing() {
        let (c, a) = composite_segment(DVec3::ZERO, 0.0, DVec4::ZERO, DVec4::ZERO, 3.0);
        assert_eq!(c, DVec3::ZERO);
        assert_eq!(a, 0.0);
    }

    #[test]
    fn test_unit_segment_of_opaque_white() {
        let white = DVec4::ONE;
        let (c, a) = composite_segment(DVec3::ZERO, 0.0, white, white, 1.0);
        assert_eq!(a, 1.0);
        // 1 - 12/24
        assert!((c - DVec3::splat(0.5)).length() < 1e-12);
    }

    #[test]
    fn test_alpha_is_clamped() {
        let white = DVec4::ONE;
        let (_, a) = composite_segment(DVec3::ZERO, 0.5, white, white, 10.0);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn test_accumulated_opacity_damps_color() {
        let sample = DVec4::new(0.1, 0.1, 0.1, 0.1);
        let (c0, _) = composite_segment(DVec3::ZERO, 0.0, sample, sample, 0.5);
        let (c1, _) = composite_segment(DVec3::ZERO, 0.8, sample, sample, 0.5);
        assert!(c1.x < c0.x);
    }
}
