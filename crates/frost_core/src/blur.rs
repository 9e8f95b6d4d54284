//! Background capture and the two-pass separable blur
//!
//! Capture copies the host pixels behind the region into the capture texture. The
//! blur then runs the horizontal program from capture into intermediate and the
//! vertical program from intermediate into final. The host's render target and viewport
//! are saved before the passes and restored afterwards, failed pass included, and the
//! shader input slot is cleared so no later frame samples a texture it also renders to.

use crate::error::{BlurError, GpuError};
use crate::geometry::{Point, Size};
use crate::gpu::{CopyRegion, GpuContext, GpuDevice, Topology, Viewport};
use crate::pipeline::{BlurConstants, PipelineObjects, VERTEX_STRIDE};
use crate::shaders::{CONSTANTS_SLOT, SAMPLER_SLOT, TEXTURE_SLOT};
use crate::targets::TextureSet;

/// Vertices in the full-target quad
const QUAD_VERTEX_COUNT: u32 = 4;

/// Source rectangle of the capture copy
///
/// Left/top are clamped to zero; the extent is clamped to the capture texture so the
/// copy never writes past it.
pub fn capture_region(
    position: Point,
    size: Size,
    max_width: u32,
    max_height: u32,
) -> CopyRegion {
    let left = position.x.max(0.0) as u32;
    let top = position.y.max(0.0) as u32;
    let right = (position.x + size.width).max(0.0) as u32;
    let bottom = (position.y + size.height).max(0.0) as u32;

    CopyRegion {
        left,
        top,
        right: right.min(left.saturating_add(max_width)),
        bottom: bottom.min(top.saturating_add(max_height)),
    }
}

/// Copy the pixels behind the region out of the host's bound render target
pub fn capture_background<D: GpuDevice>(
    context: &mut D::Context,
    targets: &TextureSet<D>,
    position: Point,
    size: Size,
) -> Result<(), BlurError> {
    let region = capture_region(position, size, targets.width(), targets.height());
    if region.is_empty() {
        return Err(BlurError::EmptyCaptureRegion);
    }

    context
        .copy_from_bound_target(&targets.capture, region)
        .map_err(BlurError::Capture)?;

    tracing::debug!(
        "background captured: ({}, {})..({}, {})",
        region.left,
        region.top,
        region.right,
        region.bottom
    );
    Ok(())
}

/// Run both blur passes from the capture texture into the final texture
pub fn process<D: GpuDevice>(
    context: &mut D::Context,
    pipeline: &PipelineObjects<D>,
    targets: &TextureSet<D>,
    strength: f32,
) -> Result<(), BlurError> {
    let (width, height) = targets.dimensions();
    let constants = BlurConstants::new(width, height, strength);
    context
        .write_constants(&pipeline.constant_buffer, bytemuck::bytes_of(&constants))
        .map_err(BlurError::Process)?;

    let saved = context.save_output_state();

    let result = run_passes(context, pipeline, targets);

    context.restore_output_state(saved);
    context.set_shader_input(TEXTURE_SLOT, None);

    result.map_err(BlurError::Process)
}

fn run_passes<D: GpuDevice>(
    context: &mut D::Context,
    pipeline: &PipelineObjects<D>,
    targets: &TextureSet<D>,
) -> Result<(), GpuError> {
    let (width, height) = targets.dimensions();

    context.set_vertex_buffer(
        &pipeline.vertex_buffer,
        VERTEX_STRIDE,
        &pipeline.input_layout,
        Topology::TriangleStrip,
    );
    context.set_vertex_program(&pipeline.vertex_program);
    context.set_constant_buffer(CONSTANTS_SLOT, &pipeline.constant_buffer);
    context.set_sampler(SAMPLER_SLOT, &pipeline.sampler);
    context.set_rasterizer_state(&pipeline.rasterizer_state);
    context.set_blend_state(&pipeline.blend_state);
    context.set_viewport(Viewport::full(width, height));

    // Horizontal: capture -> intermediate
    context.set_render_target(&targets.intermediate.write_view);
    context.set_fragment_program(&pipeline.horizontal_program);
    context.set_shader_input(TEXTURE_SLOT, Some(&targets.capture_view));
    context.draw(QUAD_VERTEX_COUNT, 0)?;
    tracing::trace!("horizontal blur pass: {}x{}", width, height);

    // Vertical: intermediate -> final
    context.set_render_target(&targets.output.write_view);
    context.set_fragment_program(&pipeline.vertical_program);
    context.set_shader_input(TEXTURE_SLOT, Some(&targets.intermediate.read_view));
    context.draw(QUAD_VERTEX_COUNT, 0)?;
    tracing::trace!("vertical blur pass: {}x{}", width, height);

    Ok(())
}
