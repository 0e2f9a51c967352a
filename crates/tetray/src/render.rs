//! Whole-image rendering.

use tetray_core::{Result, TetrayError};
use tetray_render::{RayCaster, RenderInputs, RenderStats};

use crate::rendered_image::{RenderedImage, Rgba};

/// Renders every pixel of the in-use image.
///
/// Each ray runs from depth 0 to the caster's `far_bound` option. Returns the
/// initialization error if the inputs cannot be rendered.
pub fn render_image(caster: &mut RayCaster, inputs: RenderInputs<'_>) -> Result<RenderedImage> {
    render_image_with_stats(caster, inputs).map(|(image, _)| image)
}

/// Like [`render_image`], also returning the initialization statistics.
pub fn render_image_with_stats(
    caster: &mut RayCaster,
    inputs: RenderInputs<'_>,
) -> Result<(RenderedImage, RenderStats)> {
    let bounds = [0.0, caster.options().far_bound];
    let mut pass = caster.initialize(inputs);
    if !pass.is_valid() {
        return Err(pass.take_error().unwrap_or(TetrayError::InvalidParameter(
            "render pass is invalid".into(),
        )));
    }

    let [width, height] = pass.image().in_use_size;
    let mut image = RenderedImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            image.set_pixel(x, y, Rgba::from(pass.cast_ray(x, y, bounds)));
        }
    }

    let stats = pass.finalize();
    log::debug!(
        "rendered {width}x{height} image, {} pixels covered",
        image.coverage()
    );
    Ok((image, stats))
}
