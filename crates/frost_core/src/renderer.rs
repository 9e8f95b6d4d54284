//! Per-frame blur orchestration
//!
//! [`BlurRenderer::render`] is the single entry point a host calls once per frame,
//! on the thread that owns the graphics context. Within one call capture strictly
//! precedes blur, which strictly precedes the composite draw.

use crate::activation::{ActivationAction, ActivationState, ActivationStateMachine};
use crate::blur;
use crate::config::BlurSettings;
use crate::draw::DrawList;
use crate::error::{BlurError, GpuError, Result};
use crate::geometry::{Color, Point, Rect, Size};
use crate::gpu::{DeviceId, GpuDevice};
use crate::pipeline::PipelineObjects;
use crate::targets::RenderTargetPool;

/// Everything the host hands over for one frame
///
/// Not retained past the call.
pub struct RenderRequest<'a, D: GpuDevice> {
    pub device: Option<&'a D>,
    pub draw_list: Option<&'a mut dyn DrawList<D::ReadView>>,
    /// Top-left of the blurred region, in screen pixels
    pub position: Point,
    /// Size of the blurred region, in screen pixels
    pub size: Size,
    /// Kernel spread in [0, 1]
    pub strength: f32,
    pub corner_radius: f32,
    /// Seconds the intent must be held before the first capture
    pub activation_delay: f64,
    /// Host monotonic clock, in seconds
    pub time: f64,
}

impl<'a, D: GpuDevice> RenderRequest<'a, D> {
    /// Request with the default [`BlurSettings`]
    pub fn new(
        device: &'a D,
        draw_list: &'a mut dyn DrawList<D::ReadView>,
        position: Point,
        size: Size,
        time: f64,
    ) -> Self {
        let settings = BlurSettings::default();
        Self {
            device: Some(device),
            draw_list: Some(draw_list),
            position,
            size,
            strength: settings.strength,
            corner_radius: settings.corner_radius,
            activation_delay: settings.activation_delay,
            time,
        }
    }

    pub fn with_settings(mut self, settings: BlurSettings) -> Self {
        self.strength = settings.strength;
        self.corner_radius = settings.corner_radius;
        self.activation_delay = settings.activation_delay;
        self
    }
}

/// What a successful frame ended up doing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Blur not requested
    Idle,
    /// Requested, still inside the activation delay or retrying a failed capture
    Pending,
    /// Blurred image appended to the draw list
    Drawn,
}

/// Lifetime counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Pipeline object sets created (first use + device changes)
    pub pipeline_builds: u64,
    /// Render target sets allocated
    pub target_allocations: u64,
    /// Successful background captures
    pub captures: u64,
    /// Successful two-pass blur runs
    pub blur_passes: u64,
    /// Composite draw commands issued
    pub composites: u64,
}

/// Device-scoped state; present only when fully initialized
struct DeviceState<D: GpuDevice> {
    id: DeviceId,
    pipeline: PipelineObjects<D>,
    context: D::Context,
}

/// Backdrop blur for one UI region
///
/// Owns every GPU object it creates. Independent regions use independent renderers.
pub struct BlurRenderer<D: GpuDevice> {
    targets: RenderTargetPool<D>,
    device: Option<DeviceState<D>>,
    activation: ActivationStateMachine,
    /// Whole-pixel size of the previous frame's region
    size: Option<(u32, u32)>,
    /// A capture already failed during the current activation
    capture_failing: bool,
    stats: RenderStats,
}

impl<D: GpuDevice> BlurRenderer<D> {
    pub fn new() -> Self {
        Self {
            targets: RenderTargetPool::new(),
            device: None,
            activation: ActivationStateMachine::new(),
            size: None,
            capture_failing: false,
            stats: RenderStats::default(),
        }
    }

    /// Render one frame
    ///
    /// Returns `false` when the request is malformed or the pipeline could not be
    /// initialized; the host should skip the overlay for this frame. A blur that is not
    /// yet visible is still a `true` frame.
    pub fn render(&mut self, request: RenderRequest<'_, D>, should_blur: bool) -> bool {
        match self.try_render(request, should_blur) {
            Ok(_) => true,
            Err(
                err @ (BlurError::MissingDevice
                | BlurError::MissingDrawList
                | BlurError::DegenerateSize { .. }),
            ) => {
                tracing::debug!("blur request rejected: {}", err);
                false
            }
            Err(err) => {
                tracing::warn!("blur frame failed: {}", err);
                false
            }
        }
    }

    /// Render one frame, reporting what happened
    pub fn try_render(
        &mut self,
        request: RenderRequest<'_, D>,
        should_blur: bool,
    ) -> Result<FrameOutcome> {
        let RenderRequest {
            device,
            draw_list,
            position,
            size,
            strength,
            corner_radius,
            activation_delay,
            time,
        } = request;

        let device = device.ok_or(BlurError::MissingDevice)?;
        let draw_list = draw_list.ok_or(BlurError::MissingDrawList)?;

        let (width, height) = size.truncated();
        if width <= 0 || height <= 0 {
            return Err(BlurError::DegenerateSize { width, height });
        }
        let dimensions = (clamp_to_u32(width), clamp_to_u32(height));

        self.ensure_pipeline(device)?;

        if self.size != Some(dimensions) {
            if let Some((old_width, old_height)) = self.size {
                tracing::debug!(
                    "blur region resized: {}x{} -> {}x{}",
                    old_width,
                    old_height,
                    dimensions.0,
                    dimensions.1
                );
            }
            self.targets.release();
            self.activation.reset();
            self.capture_failing = false;
            self.size = Some(dimensions);
        }

        match self.activation.advance(should_blur, time, activation_delay) {
            ActivationAction::Capture => {
                match self.capture_and_blur(device, dimensions, position, size, strength) {
                    Ok(()) => {
                        self.activation.mark_captured();
                        self.capture_failing = false;
                    }
                    Err(err) if self.capture_failing => {
                        tracing::debug!("blur capture still failing: {}", err);
                    }
                    Err(err) => {
                        tracing::warn!("blur capture skipped this frame: {}", err);
                        self.capture_failing = true;
                    }
                }
            }
            ActivationAction::None if self.activation.state() == ActivationState::Idle => {
                self.capture_failing = false;
            }
            ActivationAction::None => {}
        }

        if self.activation.is_captured() {
            if let Some(set) = self.targets.current() {
                let rect = Rect::from_origin_size(position, size);
                draw_list.add_image_rounded(
                    &set.output.read_view,
                    rect.min(),
                    rect.max(),
                    Point::ZERO,
                    Point::ONE,
                    Color::WHITE,
                    corner_radius,
                );
                self.stats.composites += 1;
                return Ok(FrameOutcome::Drawn);
            }
        }

        Ok(match self.activation.state() {
            ActivationState::Idle => FrameOutcome::Idle,
            _ => FrameOutcome::Pending,
        })
    }

    /// Release every device resource and return to `Idle`
    ///
    /// The next [`render`](Self::render) rebuilds from scratch.
    pub fn reset(&mut self) {
        self.targets.release();
        self.device = None;
        self.activation.reset();
        self.size = None;
        self.capture_failing = false;
    }

    pub fn activation_state(&self) -> ActivationState {
        self.activation.state()
    }

    /// Whether pipeline objects exist for some device
    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Device the pipeline objects were built for
    pub fn device_id(&self) -> Option<DeviceId> {
        self.device.as_ref().map(|state| state.id)
    }

    /// Size of the live render target set, if any
    pub fn target_dimensions(&self) -> Option<(u32, u32)> {
        self.targets.current().map(|set| set.dimensions())
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            target_allocations: self.targets.allocations(),
            ..self.stats
        }
    }

    /// Build pipeline objects for `device` unless they already exist for it
    ///
    /// A device change tears down all pipeline and texture state first. On failure the
    /// renderer stays uninitialized and the next call tries again.
    fn ensure_pipeline(&mut self, device: &D) -> Result<()> {
        let id = device.id();
        match self.device.as_ref() {
            Some(state) if state.id == id => return Ok(()),
            Some(state) => {
                tracing::info!(
                    "graphics device changed ({:?} -> {:?}), rebuilding blur resources",
                    state.id,
                    id
                );
            }
            None => {}
        }

        self.reset();

        let pipeline = PipelineObjects::create(device).map_err(|err| {
            tracing::warn!("blur pipeline initialization failed: {}", err);
            BlurError::PipelineInit(err)
        })?;
        let context = device.immediate_context();

        self.device = Some(DeviceState {
            id,
            pipeline,
            context,
        });
        self.stats.pipeline_builds += 1;
        Ok(())
    }

    fn capture_and_blur(
        &mut self,
        device: &D,
        (width, height): (u32, u32),
        position: Point,
        size: Size,
        strength: f32,
    ) -> Result<()> {
        let Some(state) = self.device.as_mut() else {
            return Err(BlurError::PipelineInit(GpuError::MissingBinding(
                "pipeline objects",
            )));
        };
        let set = self.targets.ensure(device, width, height)?;

        blur::capture_background(&mut state.context, set, position, size)?;
        self.stats.captures += 1;

        blur::process(&mut state.context, &state.pipeline, set, strength)?;
        self.stats.blur_passes += 1;

        Ok(())
    }
}

impl<D: GpuDevice> Default for BlurRenderer<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
