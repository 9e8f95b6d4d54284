//! wgpu implementation of [`GpuDevice`]

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use frost_core::gpu::{
    BlendDesc, DeviceId, GpuDevice, RasterizerDesc, SamplerDesc, TextureDesc, TextureUsage,
    VertexElement, Viewport,
};
use frost_core::shaders::{
    ProgramSource, ShaderDialect, ShaderStage, WGSL_CONSTANTS_BINDING, WGSL_SAMPLER_BINDING,
    WGSL_TEXTURE_BINDING,
};
use frost_core::GpuError;
use wgpu::util::DeviceExt;

use crate::context::WgpuContext;
use crate::convert;

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Error creating a standalone device
#[derive(Debug)]
pub enum DeviceError {
    /// Failed to request GPU adapter
    AdapterNotFound,
    /// Failed to request GPU device
    Device(wgpu::RequestDeviceError),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::AdapterNotFound => write!(f, "No suitable GPU adapter found"),
            DeviceError::Device(e) => write!(f, "Failed to request GPU device: {}", e),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Run `f` inside a validation error scope
pub(crate) fn validated<T>(
    device: &wgpu::Device,
    f: impl FnOnce() -> T,
) -> Result<T, wgpu::Error> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct WgpuProgram {
    pub(crate) id: u64,
    pub(crate) label: &'static str,
    pub(crate) stage: ShaderStage,
    pub(crate) entry_point: &'static str,
    pub(crate) module: Arc<wgpu::ShaderModule>,
}

#[derive(Clone, Debug)]
pub struct WgpuInputLayout {
    pub(crate) id: u64,
    pub(crate) stride: u32,
    pub(crate) attributes: Arc<[wgpu::VertexAttribute]>,
}

#[derive(Clone, Debug)]
pub struct WgpuBuffer {
    pub(crate) buffer: Arc<wgpu::Buffer>,
}

#[derive(Clone, Debug)]
pub struct WgpuSampler {
    pub(crate) sampler: Arc<wgpu::Sampler>,
}

#[derive(Clone, Debug)]
pub struct WgpuBlendState {
    pub(crate) id: u64,
    pub(crate) blend: Option<wgpu::BlendState>,
}

#[derive(Clone, Debug)]
pub struct WgpuRasterizerState {
    pub(crate) id: u64,
    pub(crate) polygon_mode: wgpu::PolygonMode,
    pub(crate) cull_mode: Option<wgpu::Face>,
    pub(crate) unclipped_depth: bool,
}

#[derive(Debug)]
pub struct WgpuTexture {
    pub(crate) texture: Arc<wgpu::Texture>,
    pub(crate) usage: TextureUsage,
}

impl WgpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

/// A color texture that can be rendered into
///
/// Used both for the blur's own write views and for the host target the blur
/// captures from.
#[derive(Clone, Debug)]
pub struct WgpuRenderTarget {
    pub texture: Arc<wgpu::Texture>,
    pub view: Arc<wgpu::TextureView>,
}

impl WgpuRenderTarget {
    pub fn new(texture: Arc<wgpu::Texture>) -> Self {
        let view = Arc::new(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        Self { texture, view }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Color target and viewport currently bound for output
#[derive(Clone, Debug, Default)]
pub struct OutputBinding {
    pub target: Option<WgpuRenderTarget>,
    /// `None` covers the whole target
    pub viewport: Option<Viewport>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Device
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct Shared {
    pub(crate) id: DeviceId,
    pub(crate) device: Arc<wgpu::Device>,
    pub(crate) queue: Arc<wgpu::Queue>,
    pub(crate) color_format: wgpu::TextureFormat,
    pub(crate) bind_group_layout: wgpu::BindGroupLayout,
    pub(crate) pipeline_layout: wgpu::PipelineLayout,
    output: Mutex<OutputBinding>,
}

impl Shared {
    pub(crate) fn output(&self) -> MutexGuard<'_, OutputBinding> {
        self.output.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A wgpu device and queue exposed to the blur engine
///
/// Clones share one identity. The host binds the render target it is drawing into
/// with [`WgpuDevice::bind_render_target`] before calling the renderer; capture reads
/// from it and the blur passes leave it bound afterwards.
#[derive(Clone)]
pub struct WgpuDevice {
    shared: Arc<Shared>,
}

impl WgpuDevice {
    /// Wrap an existing device
    ///
    /// `color_format` is the storage format of the blur's textures. It must be copy
    /// compatible with the host targets that will be captured, e.g. the surface
    /// format without its sRGB suffix.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blur Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: WGSL_CONSTANTS_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: WGSL_TEXTURE_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: WGSL_SAMPLER_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blur Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let id = DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!("blur device wrapped: id={:?}, format={:?}", id, color_format);

        Self {
            shared: Arc::new(Shared {
                id,
                device,
                queue,
                color_format,
                bind_group_layout,
                pipeline_layout,
                output: Mutex::new(OutputBinding::default()),
            }),
        }
    }

    /// Create a standalone device without a surface
    pub async fn request_headless(color_format: wgpu::TextureFormat) -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DeviceError::AdapterNotFound)?;

        let info = adapter.get_info();
        tracing::info!("blur adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Frost Blur Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(DeviceError::Device)?;

        Ok(Self::new(Arc::new(device), Arc::new(queue), color_format))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.shared.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.shared.queue
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.shared.color_format
    }

    /// Bind the host's render target with a full-target viewport
    pub fn bind_render_target(&self, target: WgpuRenderTarget) {
        let mut output = self.shared.output();
        output.target = Some(target);
        output.viewport = None;
    }

    pub fn unbind_render_target(&self) {
        *self.shared.output() = OutputBinding::default();
    }

    /// Currently bound output, as left by the host or restored by the blur
    pub fn output_binding(&self) -> OutputBinding {
        self.shared.output().clone()
    }

    fn creation_error(what: &'static str, err: impl std::fmt::Display) -> GpuError {
        GpuError::Creation {
            what,
            message: err.to_string(),
        }
    }
}

impl GpuDevice for WgpuDevice {
    type Program = WgpuProgram;
    type InputLayout = WgpuInputLayout;
    type Buffer = WgpuBuffer;
    type Sampler = WgpuSampler;
    type BlendState = WgpuBlendState;
    type RasterizerState = WgpuRasterizerState;
    type Texture = WgpuTexture;
    type ReadView = Arc<wgpu::TextureView>;
    type WriteView = WgpuRenderTarget;
    type Context = WgpuContext;

    fn id(&self) -> DeviceId {
        self.shared.id
    }

    fn dialect(&self) -> ShaderDialect {
        ShaderDialect::Wgsl
    }

    fn immediate_context(&self) -> WgpuContext {
        WgpuContext::new(Arc::clone(&self.shared))
    }

    fn compile_program(&self, source: &ProgramSource) -> Result<WgpuProgram, GpuError> {
        if source.dialect != ShaderDialect::Wgsl {
            return Err(GpuError::Compile {
                label: source.label.to_string(),
                message: format!("{:?} programs are not supported", source.dialect),
            });
        }

        let module = validated(&self.shared.device, || {
            self.shared
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(source.label),
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source.source)),
                })
        })
        .map_err(|err| GpuError::Compile {
            label: source.label.to_string(),
            message: err.to_string(),
        })?;

        tracing::debug!("blur program compiled: {}", source.label);
        Ok(WgpuProgram {
            id: next_resource_id(),
            label: source.label,
            stage: source.stage,
            entry_point: source.entry_point,
            module: Arc::new(module),
        })
    }

    fn create_input_layout(
        &self,
        elements: &[VertexElement],
        stride: u32,
        vertex_program: &WgpuProgram,
    ) -> Result<WgpuInputLayout, GpuError> {
        if vertex_program.stage != ShaderStage::Vertex {
            return Err(GpuError::Creation {
                what: "input layout",
                message: format!("{} is not a vertex program", vertex_program.label),
            });
        }

        Ok(WgpuInputLayout {
            id: next_resource_id(),
            stride,
            attributes: convert::vertex_attributes(elements).into(),
        })
    }

    fn create_vertex_buffer(
        &self,
        label: &'static str,
        contents: &[u8],
    ) -> Result<WgpuBuffer, GpuError> {
        let buffer = self
            .shared
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(WgpuBuffer {
            buffer: Arc::new(buffer),
        })
    }

    fn create_constant_buffer(&self, label: &'static str, size: u64) -> Result<WgpuBuffer, GpuError> {
        let buffer = self.shared.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(WgpuBuffer {
            buffer: Arc::new(buffer),
        })
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<WgpuSampler, GpuError> {
        let filter = convert::filter_mode(desc.filter);
        let address_mode = convert::address_mode(desc.address_mode);
        let sampler = self.shared.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(desc.label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: filter,
            ..Default::default()
        });
        Ok(WgpuSampler {
            sampler: Arc::new(sampler),
        })
    }

    fn create_blend_state(&self, desc: &BlendDesc) -> Result<WgpuBlendState, GpuError> {
        Ok(WgpuBlendState {
            id: next_resource_id(),
            blend: convert::blend_state(desc),
        })
    }

    fn create_rasterizer_state(
        &self,
        desc: &RasterizerDesc,
    ) -> Result<WgpuRasterizerState, GpuError> {
        let features = self.shared.device.features();
        let polygon_mode = convert::polygon_mode(desc.fill);
        if polygon_mode == wgpu::PolygonMode::Line
            && !features.contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            return Err(GpuError::Creation {
                what: "rasterizer state",
                message: "wireframe fill needs POLYGON_MODE_LINE".into(),
            });
        }

        let unclipped_depth = !desc.depth_clip;
        if unclipped_depth && !features.contains(wgpu::Features::DEPTH_CLIP_CONTROL) {
            return Err(GpuError::Creation {
                what: "rasterizer state",
                message: "disabling depth clip needs DEPTH_CLIP_CONTROL".into(),
            });
        }

        Ok(WgpuRasterizerState {
            id: next_resource_id(),
            polygon_mode,
            cull_mode: convert::cull_mode(desc.cull),
            unclipped_depth,
        })
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<WgpuTexture, GpuError> {
        let max = self.shared.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(GpuError::Creation {
                what: desc.label,
                message: format!("{}x{} outside 1..={}", desc.width, desc.height, max),
            });
        }

        let texture = validated(&self.shared.device, || {
            self.shared.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(desc.label),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: self.shared.color_format,
                usage: convert::texture_usages(desc.usage),
                view_formats: &[],
            })
        })
        .map_err(|err| Self::creation_error(desc.label, err))?;

        Ok(WgpuTexture {
            texture: Arc::new(texture),
            usage: desc.usage,
        })
    }

    fn create_read_view(&self, texture: &WgpuTexture) -> Result<Arc<wgpu::TextureView>, GpuError> {
        if !texture.usage.sampled {
            return Err(GpuError::Creation {
                what: "shader resource view",
                message: "texture is not sampled".into(),
            });
        }
        Ok(Arc::new(
            texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        ))
    }

    fn create_write_view(&self, texture: &WgpuTexture) -> Result<WgpuRenderTarget, GpuError> {
        if !texture.usage.render_target {
            return Err(GpuError::Creation {
                what: "render target view",
                message: "texture is not a render target".into(),
            });
        }
        Ok(WgpuRenderTarget::new(Arc::clone(&texture.texture)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless() -> WgpuDevice {
        pollster::block_on(WgpuDevice::request_headless(wgpu::TextureFormat::Rgba8Unorm))
            .expect("GPU adapter")
    }

    // These tests require a GPU and are marked as ignored by default
    // Run with: cargo test -p frost_gpu -- --ignored

    #[test]
    #[ignore]
    fn test_devices_get_distinct_ids() {
        let a = headless();
        let b = headless();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    #[ignore]
    fn test_invalid_wgsl_is_compile_error() {
        let device = headless();
        let source = ProgramSource {
            label: "Broken Shader",
            dialect: ShaderDialect::Wgsl,
            stage: ShaderStage::Fragment,
            entry_point: "main",
            profile: "fragment",
            source: "@fragment fn main( -> {",
        };
        assert!(matches!(
            device.compile_program(&source),
            Err(GpuError::Compile { .. })
        ));
    }

    #[test]
    #[ignore]
    fn test_hlsl_is_rejected() {
        let device = headless();
        let library = frost_core::shaders::ShaderLibrary::for_dialect(ShaderDialect::Hlsl);
        assert!(device.compile_program(&library.vertex).is_err());
    }

    #[test]
    #[ignore]
    fn test_capture_texture_has_no_write_view() {
        let device = headless();
        let texture = device
            .create_texture(&TextureDesc {
                label: "Capture",
                width: 16,
                height: 16,
                format: frost_core::gpu::TextureFormat::Rgba8Unorm,
                usage: TextureUsage::CAPTURE,
            })
            .expect("texture");
        assert!(device.create_read_view(&texture).is_ok());
        assert!(device.create_write_view(&texture).is_err());
    }

    #[test]
    #[ignore]
    fn test_zero_sized_texture_is_rejected() {
        let device = headless();
        let result = device.create_texture(&TextureDesc {
            label: "Empty",
            width: 0,
            height: 16,
            format: frost_core::gpu::TextureFormat::Rgba8Unorm,
            usage: TextureUsage::RENDER_TARGET,
        });
        assert!(matches!(result, Err(GpuError::Creation { .. })));
    }
}
