//! Embedded blur programs
//!
//! Three programs make up the effect:
//! - a vertex program passing clip-space position and UV through unchanged
//! - a horizontal and a vertical 9-tap Gaussian fragment program
//!
//! The programs are shipped in two dialects that share one interface contract, so a
//! backend picks its dialect without the pipeline logic changing:
//!
//! | Input | Layout | HLSL | WGSL |
//! |---|---|---|---|
//! | vertex | `float3 position, float2 uv` | `POSITION`, `TEXCOORD0` | `@location(0)`, `@location(1)` |
//! | constants | `{ texture_size: vec2, blur_strength, padding }` | `b0` | `@group(0) @binding(0)` |
//! | texture | 2D float texture | `t0` | `@group(0) @binding(1)` |
//! | sampler | filtering sampler | `s0` | `@group(0) @binding(2)` |
//!
//! Bump [`SHADER_LIBRARY_VERSION`] whenever this contract changes.

/// Version of the program interface contract
pub const SHADER_LIBRARY_VERSION: u32 = 1;

/// Entry symbol every program is compiled against
pub const ENTRY_POINT: &str = "main";

/// Constant buffer slot read by the fragment programs
pub const CONSTANTS_SLOT: u32 = 0;
/// Texture slot read by the fragment programs
pub const TEXTURE_SLOT: u32 = 0;
/// Sampler slot read by the fragment programs
pub const SAMPLER_SLOT: u32 = 0;

/// WGSL bind group holding all three inputs
pub const WGSL_BIND_GROUP: u32 = 0;
/// WGSL binding of the constant block
pub const WGSL_CONSTANTS_BINDING: u32 = 0;
/// WGSL binding of the source texture
pub const WGSL_TEXTURE_BINDING: u32 = 1;
/// WGSL binding of the sampler
pub const WGSL_SAMPLER_BINDING: u32 = 2;

/// Shading language a backend compiles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderDialect {
    Wgsl,
    Hlsl,
}

/// Pipeline stage a program runs in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Program source handed to a device's compiler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramSource {
    pub label: &'static str,
    pub dialect: ShaderDialect,
    pub stage: ShaderStage,
    pub entry_point: &'static str,
    /// Target profile (`vs_5_0`/`ps_5_0` for HLSL, the stage name for WGSL)
    pub profile: &'static str,
    pub source: &'static str,
}

/// The three blur programs in one dialect
#[derive(Clone, Copy, Debug)]
pub struct ShaderLibrary {
    pub vertex: ProgramSource,
    pub horizontal: ProgramSource,
    pub vertical: ProgramSource,
}

impl ShaderLibrary {
    pub fn for_dialect(dialect: ShaderDialect) -> Self {
        match dialect {
            ShaderDialect::Wgsl => Self {
                vertex: ProgramSource {
                    label: "Blur Vertex Shader",
                    dialect,
                    stage: ShaderStage::Vertex,
                    entry_point: ENTRY_POINT,
                    profile: "vertex",
                    source: WGSL_VERTEX_SHADER,
                },
                horizontal: ProgramSource {
                    label: "Horizontal Blur Shader",
                    dialect,
                    stage: ShaderStage::Fragment,
                    entry_point: ENTRY_POINT,
                    profile: "fragment",
                    source: WGSL_HORIZONTAL_BLUR_SHADER,
                },
                vertical: ProgramSource {
                    label: "Vertical Blur Shader",
                    dialect,
                    stage: ShaderStage::Fragment,
                    entry_point: ENTRY_POINT,
                    profile: "fragment",
                    source: WGSL_VERTICAL_BLUR_SHADER,
                },
            },
            ShaderDialect::Hlsl => Self {
                vertex: ProgramSource {
                    label: "Blur Vertex Shader",
                    dialect,
                    stage: ShaderStage::Vertex,
                    entry_point: ENTRY_POINT,
                    profile: "vs_5_0",
                    source: HLSL_VERTEX_SHADER,
                },
                horizontal: ProgramSource {
                    label: "Horizontal Blur Shader",
                    dialect,
                    stage: ShaderStage::Fragment,
                    entry_point: ENTRY_POINT,
                    profile: "ps_5_0",
                    source: HLSL_HORIZONTAL_BLUR_SHADER,
                },
                vertical: ProgramSource {
                    label: "Vertical Blur Shader",
                    dialect,
                    stage: ShaderStage::Fragment,
                    entry_point: ENTRY_POINT,
                    profile: "ps_5_0",
                    source: HLSL_VERTICAL_BLUR_SHADER,
                },
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WGSL
// ─────────────────────────────────────────────────────────────────────────────

/// WGSL passthrough vertex program
pub const WGSL_VERTEX_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.position = vec4<f32>(input.position, 1.0);
    output.uv = input.uv;
    return output;
}
"#;

/// WGSL horizontal 9-tap Gaussian
pub const WGSL_HORIZONTAL_BLUR_SHADER: &str = r#"
struct BlurConstants {
    texture_size: vec2<f32>,
    blur_strength: f32,
    padding: f32,
}

@group(0) @binding(0) var<uniform> constants: BlurConstants;
@group(0) @binding(1) var source_texture: texture_2d<f32>;
@group(0) @binding(2) var texture_sampler: sampler;

struct FragmentInput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@fragment
fn main(input: FragmentInput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(0.0);
    let pixel_size = 1.0 / constants.texture_size.x;
    var total_weight = 0.0;
    let radius = 4;
    for (var i = -radius; i <= radius; i++) {
        let tap = f32(i);
        var sample_uv = input.uv + vec2<f32>(pixel_size * tap * constants.blur_strength, 0.0);
        sample_uv = clamp(sample_uv, vec2<f32>(0.0), vec2<f32>(1.0));
        let weight = exp(-0.5 * tap * tap / (f32(radius * radius) * 0.5));
        color += textureSample(source_texture, texture_sampler, sample_uv) * weight;
        total_weight += weight;
    }
    return color / total_weight;
}
"#;

/// WGSL vertical 9-tap Gaussian
pub const WGSL_VERTICAL_BLUR_SHADER: &str = r#"
struct BlurConstants {
    texture_size: vec2<f32>,
    blur_strength: f32,
    padding: f32,
}

@group(0) @binding(0) var<uniform> constants: BlurConstants;
@group(0) @binding(1) var source_texture: texture_2d<f32>;
@group(0) @binding(2) var texture_sampler: sampler;

struct FragmentInput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@fragment
fn main(input: FragmentInput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(0.0);
    let pixel_size = 1.0 / constants.texture_size.y;
    var total_weight = 0.0;
    let radius = 4;
    for (var i = -radius; i <= radius; i++) {
        let tap = f32(i);
        var sample_uv = input.uv + vec2<f32>(0.0, pixel_size * tap * constants.blur_strength);
        sample_uv = clamp(sample_uv, vec2<f32>(0.0), vec2<f32>(1.0));
        let weight = exp(-0.5 * tap * tap / (f32(radius * radius) * 0.5));
        color += textureSample(source_texture, texture_sampler, sample_uv) * weight;
        total_weight += weight;
    }
    return color / total_weight;
}
"#;

// ─────────────────────────────────────────────────────────────────────────────
// HLSL (shader model 5)
// ─────────────────────────────────────────────────────────────────────────────

/// HLSL passthrough vertex program
pub const HLSL_VERTEX_SHADER: &str = r#"
struct VS_INPUT { float3 position : POSITION; float2 uv : TEXCOORD0; };
struct VS_OUTPUT { float4 position : SV_POSITION; float2 uv : TEXCOORD0; };

VS_OUTPUT main(VS_INPUT input) {
    VS_OUTPUT output;
    output.position = float4(input.position, 1.0f);
    output.uv = input.uv;
    return output;
}
"#;

/// HLSL horizontal 9-tap Gaussian
pub const HLSL_HORIZONTAL_BLUR_SHADER: &str = r#"
cbuffer BlurConstants : register(b0) { float2 texture_size; float blur_strength; float padding; };
Texture2D source_texture : register(t0);
SamplerState texture_sampler : register(s0);
struct PS_INPUT { float4 position : SV_POSITION; float2 uv : TEXCOORD0; };

float4 main(PS_INPUT input) : SV_Target {
    float4 color = float4(0.0f, 0.0f, 0.0f, 0.0f);
    float pixel_size = 1.0f / texture_size.x;
    float total_weight = 0.0f;
    int radius = 4;
    for (int i = -radius; i <= radius; i++) {
        float2 sample_uv = input.uv + float2(pixel_size * i * blur_strength, 0.0f);
        sample_uv = clamp(sample_uv, float2(0.0f, 0.0f), float2(1.0f, 1.0f));
        float weight = exp(-0.5f * (i * i) / (radius * radius * 0.5f));
        color += source_texture.Sample(texture_sampler, sample_uv) * weight;
        total_weight += weight;
    }
    return color / total_weight;
}
"#;

/// HLSL vertical 9-tap Gaussian
pub const HLSL_VERTICAL_BLUR_SHADER: &str = r#"
cbuffer BlurConstants : register(b0) { float2 texture_size; float blur_strength; float padding; };
Texture2D source_texture : register(t0);
SamplerState texture_sampler : register(s0);
struct PS_INPUT { float4 position : SV_POSITION; float2 uv : TEXCOORD0; };

float4 main(PS_INPUT input) : SV_Target {
    float4 color = float4(0.0f, 0.0f, 0.0f, 0.0f);
    float pixel_size = 1.0f / texture_size.y;
    float total_weight = 0.0f;
    int radius = 4;
    for (int i = -radius; i <= radius; i++) {
        float2 sample_uv = input.uv + float2(0.0f, pixel_size * i * blur_strength);
        sample_uv = clamp(sample_uv, float2(0.0f, 0.0f), float2(1.0f, 1.0f));
        float weight = exp(-0.5f * (i * i) / (radius * radius * 0.5f));
        color += source_texture.Sample(texture_sampler, sample_uv) * weight;
        total_weight += weight;
    }
    return color / total_weight;
}
"#;
