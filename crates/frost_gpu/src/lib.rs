//! Frost GPU Backend
//!
//! wgpu implementation of the `frost_core` device and context traits.
//!
//! # Example
//!
//! ```ignore
//! use frost_core::{CommandList, Point, RenderRequest, Size};
//! use frost_gpu::{WgpuBlurRenderer, WgpuDevice, WgpuRenderTarget};
//!
//! let device = WgpuDevice::new(gpu_device, gpu_queue, wgpu::TextureFormat::Bgra8Unorm);
//! let mut blur = WgpuBlurRenderer::new();
//! let mut draw_list = CommandList::new();
//!
//! // Each frame, with the host's color target bound
//! device.bind_render_target(WgpuRenderTarget::new(frame_texture));
//! let request = RenderRequest::new(&device, &mut draw_list, origin, size, now);
//! blur.render(request, menu_open);
//! ```
//!
//! The host's targets must be created with `COPY_SRC` usage so the background can be
//! captured, in a format copy compatible with the device's color format.
//!
//! Capture records its copy on its own encoder and submits it to the queue right away.
//! Submit the command buffers that draw the content behind the region before calling
//! `render`, or the capture reads whatever the target held before them.

mod context;
mod convert;
mod device;

pub use context::WgpuContext;
pub use device::{
    DeviceError, OutputBinding, WgpuBlendState, WgpuBuffer, WgpuDevice, WgpuInputLayout,
    WgpuProgram, WgpuRasterizerState, WgpuRenderTarget, WgpuSampler, WgpuTexture,
};

/// Blur renderer bound to the wgpu backend
pub type WgpuBlurRenderer = frost_core::BlurRenderer<WgpuDevice>;
