//! Frost Core
//!
//! Backdrop blur overlay engine for immediate-mode UI regions.
//!
//! Each frame the host hands a [`RenderRequest`] to a [`BlurRenderer`]. Once the
//! caller's "should blur" intent has been held for the activation delay, the renderer
//! copies the pixels behind the region out of the host's bound render target, runs a
//! two-pass separable Gaussian blur on the GPU and composites the result back into the
//! host's draw list as a rounded image.
//!
//! - **Backend traits** ([`gpu`]): the device/context vocabulary the engine needs
//! - **Pipeline objects** ([`pipeline`]): device-scoped programs and fixed-function state
//! - **Render target pool** ([`targets`]): size-scoped capture/intermediate/final textures
//! - **Activation** ([`activation`]): debounce state machine
//! - **Blur pipeline** ([`blur`]): background capture and the two convolution passes
//! - **Renderer** ([`renderer`]): the per-frame orchestrator
//!
//! # Example
//!
//! ```rust,ignore
//! use frost_core::{BlurRenderer, CommandList, Point, RenderRequest, Size};
//!
//! let mut blur = BlurRenderer::new();
//! let mut draw_list = CommandList::new();
//!
//! let request = RenderRequest::new(&device, &mut draw_list, Point::new(40.0, 40.0), Size::new(200.0, 100.0), now);
//! if !blur.render(request, menu_open) {
//!     // skip the overlay this frame
//! }
//! ```

pub mod activation;
pub mod blur;
pub mod config;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod kernel;
pub mod pipeline;
pub mod renderer;
pub mod shaders;
pub mod targets;

pub use activation::{ActivationAction, ActivationState, ActivationStateMachine};
pub use config::BlurSettings;
pub use draw::{CommandList, DrawCommand, DrawList};
pub use error::{BlurError, GpuError, TargetAllocError};
pub use geometry::{Color, Point, Rect, Size};
pub use gpu::{DeviceId, GpuContext, GpuDevice};
pub use renderer::{BlurRenderer, FrameOutcome, RenderRequest, RenderStats};
