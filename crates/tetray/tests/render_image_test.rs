//! Whole-image rendering and intersection-list properties.

use proptest::prelude::*;
use tetray::*;

fn camera() -> Camera {
    let mut camera = Camera::new();
    camera.look_at(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Y);
    camera.near = 1.0;
    camera.far = 10.0;
    camera
}

fn tet_at(mesh: &mut TetMesh, offset: DVec3, scale: f64) {
    let corners = [
        DVec3::new(-1.0, -1.0, 0.0),
        DVec3::new(1.0, -1.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.1, -0.1, -1.0),
    ];
    let ids = corners.map(|c| mesh.push_point(offset + c * scale));
    mesh.push_tet(ids);
}

#[test]
fn test_render_image_covers_projection() {
    let mut mesh = TetMesh::new_tet_mesh(Vec::new(), Vec::new());
    tet_at(&mut mesh, DVec3::ZERO, 1.5);
    let scalars = ScalarField::new(vec![0.0f32, 0.5, 1.0, 1.0], 1).unwrap();
    let camera = camera();
    let property = VolumeProperty::default();

    let mut caster = RayCaster::default();
    let (image, stats) = render_image_with_stats(
        &mut caster,
        RenderInputs::new(
            &mesh,
            Some(&scalars),
            &camera,
            &property,
            ImageGeometry::full(48, 40),
        ),
    )
    .unwrap();

    assert_eq!((image.width(), image.height()), (48, 40));
    assert_eq!(image.pixels().len(), 48 * 40);
    assert!(image.coverage() > 0);
    assert!(image.coverage() <= stats.raster.intersections);
    assert_eq!(image.pixel(0, 0), Rgba::TRANSPARENT);
    assert_eq!(image.pixel(47, 39), Rgba::TRANSPARENT);
    for p in image.pixels() {
        assert!(p.a >= 0.0 && p.a <= 1.0);
        assert!(p.r >= 0.0 && p.r <= 1.0);
    }

    let png = image.to_png_bytes().unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

    let path = std::env::temp_dir().join("tetray_render_image_test.png");
    image.save(&path).unwrap();
    assert!(path.exists());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_sub_region_matches_full_render() {
    let mut mesh = TetMesh::new_tet_mesh(Vec::new(), Vec::new());
    tet_at(&mut mesh, DVec3::ZERO, 1.5);
    let scalars = ScalarField::new(vec![0.2f32, 0.4, 0.6, 0.8], 1).unwrap();
    let camera = camera();
    let property = VolumeProperty::default();
    let mut caster = RayCaster::default();

    let full = render_image(
        &mut caster,
        RenderInputs::new(
            &mesh,
            Some(&scalars),
            &camera,
            &property,
            ImageGeometry::full(40, 40),
        ),
    )
    .unwrap();
    let sub = render_image(
        &mut caster,
        RenderInputs::new(
            &mesh,
            Some(&scalars),
            &camera,
            &property,
            ImageGeometry::sub_region([10, 12], [16, 16], [40, 40]),
        ),
    )
    .unwrap();

    for y in 0..16 {
        for x in 0..16 {
            let a = sub.pixel(x, y);
            let b = full.pixel(x + 10, y + 12);
            assert!((a.a - b.a).abs() < 1e-5, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_invalid_inputs_report_error() {
    let mesh = TetMesh::new_tet_mesh(Vec::new(), Vec::new());
    let scalars = ScalarField::new(vec![0.0f32], 1).unwrap();
    let camera = camera();
    let property = VolumeProperty::default();
    let mut caster = RayCaster::default();
    let result = render_image(
        &mut caster,
        RenderInputs::new(
            &mesh,
            Some(&scalars),
            &camera,
            &property,
            ImageGeometry::full(8, 8),
        ),
    );
    assert!(matches!(result, Err(TetrayError::EmptyMesh { .. })));
}

#[test]
fn test_pool_overflow_drops_intersections() {
    let mut mesh = TetMesh::new_tet_mesh(Vec::new(), Vec::new());
    tet_at(&mut mesh, DVec3::ZERO, 1.5);
    let scalars = ScalarField::new(vec![0.5f32; 4], 1).unwrap();
    let camera = camera();
    let property = VolumeProperty::default();

    let options = RenderOptions::new()
        .with_intersection_block_size(8)
        .with_max_intersection_blocks(2);
    let mut caster = RayCaster::new(options);
    let (image, stats) = render_image_with_stats(
        &mut caster,
        RenderInputs::new(
            &mesh,
            Some(&scalars),
            &camera,
            &property,
            ImageGeometry::full(32, 32),
        ),
    )
    .unwrap();
    assert_eq!(stats.raster.intersections, 16);
    assert!(stats.raster.dropped > 0);
    assert!(image.coverage() <= 16);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_pixel_lists_sorted_by_depth(
        offsets in prop::collection::vec((-0.5f64..0.5, -0.5f64..0.5, -2.0f64..1.0), 1..6)
    ) {
        let mut mesh = TetMesh::new_tet_mesh(Vec::new(), Vec::new());
        for (x, y, z) in &offsets {
            tet_at(&mut mesh, DVec3::new(*x, *y, *z), 1.0);
        }
        let scalars = ScalarField::new(vec![0.5f32; mesh.num_points()], 1).unwrap();
        let camera = camera();
        let property = VolumeProperty::default();

        let mut caster = RayCaster::default();
        let pass = caster.initialize(RenderInputs::new(
            &mesh,
            Some(&scalars),
            &camera,
            &property,
            ImageGeometry::full(24, 24),
        ));
        prop_assert!(pass.is_valid());
        prop_assert!(pass.stats().raster.intersections > 0);

        for y in 0..24 {
            for x in 0..24 {
                let zs: Vec<f64> = pass.intersections(x, y).map(|n| n.z).collect();
                prop_assert!(zs.windows(2).all(|w| w[0] <= w[1]), "pixel ({}, {}): {:?}", x, y, zs);
            }
        }
    }
}
