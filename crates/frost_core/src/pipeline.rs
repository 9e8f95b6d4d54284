//! Device-scoped pipeline objects
//!
//! Programs, input layout, the static quad, the constant buffer and fixed-function
//! state are created together once per device. [`PipelineObjects`] only exists when
//! every member was created; a failure part way drops whatever was already built.

use crate::error::GpuError;
use crate::gpu::{
    AddressMode, BlendDesc, CullMode, FillMode, FilterMode, GpuDevice, RasterizerDesc,
    SamplerDesc, VertexElement, VertexFormat,
};
use crate::shaders::ShaderLibrary;

/// Vertex of the full-target quad
///
/// Memory layout (20 bytes total):
/// - position: `vec3<f32>` (12 bytes) - clip-space position
/// - uv: `vec2<f32>` (8 bytes) - texture coordinate
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

pub const VERTEX_STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

/// Triangle strip covering clip space; V runs opposite to Y
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex {
        position: [-1.0, -1.0, 0.0],
        uv: [0.0, 1.0],
    },
    Vertex {
        position: [-1.0, 1.0, 0.0],
        uv: [0.0, 0.0],
    },
    Vertex {
        position: [1.0, -1.0, 0.0],
        uv: [1.0, 1.0],
    },
    Vertex {
        position: [1.0, 1.0, 0.0],
        uv: [1.0, 0.0],
    },
];

/// Input layout matching [`Vertex`]
pub const VERTEX_ELEMENTS: [VertexElement; 2] = [
    VertexElement {
        semantic: "POSITION",
        location: 0,
        format: VertexFormat::Float32x3,
        offset: 0,
    },
    VertexElement {
        semantic: "TEXCOORD",
        location: 1,
        format: VertexFormat::Float32x2,
        offset: VertexFormat::Float32x3.size(),
    },
];

/// Constants read by both blur passes
///
/// Memory layout (16 bytes total):
/// - texture_size: `vec2<f32>` (8 bytes) - width, height in pixels
/// - blur_strength: `f32` (4 bytes) - tap spread multiplier
/// - padding: `f32` (4 bytes) - padding to 16 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurConstants {
    pub texture_size: [f32; 2],
    pub blur_strength: f32,
    pub padding: f32,
}

impl BlurConstants {
    pub fn new(width: u32, height: u32, strength: f32) -> Self {
        Self {
            texture_size: [width as f32, height as f32],
            blur_strength: strength,
            padding: 0.0,
        }
    }
}

pub const SAMPLER_DESC: SamplerDesc = SamplerDesc {
    label: "Blur Sampler",
    filter: FilterMode::Linear,
    address_mode: AddressMode::ClampToEdge,
};

pub const RASTERIZER_DESC: RasterizerDesc = RasterizerDesc {
    label: "Blur Rasterizer State",
    fill: FillMode::Solid,
    cull: CullMode::None,
    depth_clip: true,
};

/// Everything the blur passes bind that does not depend on the target size
pub struct PipelineObjects<D: GpuDevice> {
    pub vertex_program: D::Program,
    pub horizontal_program: D::Program,
    pub vertical_program: D::Program,
    pub input_layout: D::InputLayout,
    pub vertex_buffer: D::Buffer,
    pub constant_buffer: D::Buffer,
    pub sampler: D::Sampler,
    pub blend_state: D::BlendState,
    pub rasterizer_state: D::RasterizerState,
}

impl<D: GpuDevice> PipelineObjects<D> {
    /// Compile the programs for the device's dialect and create the fixed state
    pub fn create(device: &D) -> Result<Self, GpuError> {
        let library = ShaderLibrary::for_dialect(device.dialect());

        let vertex_program = device.compile_program(&library.vertex)?;
        let horizontal_program = device.compile_program(&library.horizontal)?;
        let vertical_program = device.compile_program(&library.vertical)?;

        let input_layout =
            device.create_input_layout(&VERTEX_ELEMENTS, VERTEX_STRIDE, &vertex_program)?;

        let vertex_buffer = device.create_vertex_buffer(
            "Blur Quad Vertices",
            bytemuck::cast_slice(&QUAD_VERTICES[..]),
        )?;
        let constant_buffer = device.create_constant_buffer(
            "Blur Constants",
            std::mem::size_of::<BlurConstants>() as u64,
        )?;

        let sampler = device.create_sampler(&SAMPLER_DESC)?;
        let blend_state = device.create_blend_state(&BlendDesc::ALPHA_BLENDING)?;
        let rasterizer_state = device.create_rasterizer_state(&RASTERIZER_DESC)?;

        tracing::info!(
            "blur pipeline created: device={:?}, dialect={:?}",
            device.id(),
            device.dialect()
        );

        Ok(Self {
            vertex_program,
            horizontal_program,
            vertical_program,
            input_layout,
            vertex_buffer,
            constant_buffer,
            sampler,
            blend_state,
            rasterizer_state,
        })
    }
}
