//! wgpu implementation of [`GpuContext`]
//!
//! wgpu has no immediate context, so this one records the bound state and turns each
//! `draw` into its own render pass, with the pipeline built on demand and cached by
//! the combination of programs, layout, fixed state and target format.

use std::collections::HashMap;
use std::sync::Arc;

use frost_core::gpu::{CopyRegion, GpuContext, Topology, Viewport};
use frost_core::GpuError;

use crate::convert;
use crate::device::{
    validated, OutputBinding, Shared, WgpuBlendState, WgpuBuffer, WgpuDevice, WgpuInputLayout,
    WgpuProgram, WgpuRasterizerState, WgpuRenderTarget, WgpuSampler, WgpuTexture,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    vertex_program: u64,
    fragment_program: u64,
    input_layout: u64,
    topology: Topology,
    blend: u64,
    rasterizer: u64,
    format: wgpu::TextureFormat,
}

struct VertexBinding {
    buffer: WgpuBuffer,
    layout: WgpuInputLayout,
    topology: Topology,
}

/// Non-output state set since the context was created
#[derive(Default)]
struct Bindings {
    vertex: Option<VertexBinding>,
    vertex_program: Option<WgpuProgram>,
    fragment_program: Option<WgpuProgram>,
    constants: Option<WgpuBuffer>,
    sampler: Option<WgpuSampler>,
    blend: Option<WgpuBlendState>,
    rasterizer: Option<WgpuRasterizerState>,
    texture: Option<Arc<wgpu::TextureView>>,
}

pub struct WgpuContext {
    shared: Arc<Shared>,
    bindings: Bindings,
    pipelines: HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>,
}

impl WgpuContext {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            bindings: Bindings::default(),
            pipelines: HashMap::new(),
        }
    }

    /// Number of distinct render pipelines built so far
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Zero every texel of a `COPY_DST` texture
    fn clear_texture(&self, dst: &WgpuTexture) {
        let (width, height) = (dst.texture.width(), dst.texture.height());
        let texel_size = dst.texture.format().block_copy_size(None).unwrap_or(4);
        let zeros = vec![0u8; (width * height * texel_size) as usize];
        self.shared.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &dst.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &zeros,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * texel_size),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn check_slot(slot: u32, what: &'static str) -> bool {
        if slot != 0 {
            tracing::warn!("{} slot {} ignored; only slot 0 is bound", what, slot);
        }
        slot == 0
    }

    fn pipeline(
        &mut self,
        key: PipelineKey,
        vertex: &VertexBinding,
        vertex_program: &WgpuProgram,
        fragment_program: &WgpuProgram,
        blend: &WgpuBlendState,
        rasterizer: &WgpuRasterizerState,
    ) -> Result<Arc<wgpu::RenderPipeline>, GpuError> {
        if !self.pipelines.contains_key(&key) {
            let device = &self.shared.device;
            let pipeline = validated(device, || {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(fragment_program.label),
                    layout: Some(&self.shared.pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &vertex_program.module,
                        entry_point: Some(vertex_program.entry_point),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: vertex.layout.stride as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &vertex.layout.attributes,
                        }],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &fragment_program.module,
                        entry_point: Some(fragment_program.entry_point),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: key.format,
                            blend: blend.blend,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: convert::topology(vertex.topology),
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: rasterizer.cull_mode,
                        unclipped_depth: rasterizer.unclipped_depth,
                        polygon_mode: rasterizer.polygon_mode,
                        conservative: false,
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|err| GpuError::Backend(err.to_string()))?;

            tracing::debug!(
                "blur render pipeline created: {} -> {:?}",
                fragment_program.label,
                key.format
            );
            self.pipelines.insert(key, Arc::new(pipeline));
        }

        self.pipelines
            .get(&key)
            .cloned()
            .ok_or(GpuError::MissingBinding("render pipeline"))
    }
}

impl GpuContext<WgpuDevice> for WgpuContext {
    type OutputState = OutputBinding;

    fn save_output_state(&mut self) -> OutputBinding {
        self.shared.output().clone()
    }

    fn restore_output_state(&mut self, state: OutputBinding) {
        *self.shared.output() = state;
    }

    fn copy_from_bound_target(
        &mut self,
        dst: &WgpuTexture,
        region: CopyRegion,
    ) -> Result<(), GpuError> {
        let source = self
            .shared
            .output()
            .target
            .clone()
            .ok_or(GpuError::NoBoundTarget)?;

        if !convert::copy_compatible(source.format(), dst.texture.format()) {
            return Err(GpuError::IncompatibleFormat(format!(
                "{:?} -> {:?}",
                source.format(),
                dst.texture.format()
            )));
        }
        if !source
            .texture
            .usage()
            .contains(wgpu::TextureUsages::COPY_SRC)
        {
            return Err(GpuError::Backend(
                "bound render target lacks COPY_SRC usage".into(),
            ));
        }

        let (src_width, src_height) = source.dimensions();
        let width = region
            .right
            .min(src_width)
            .saturating_sub(region.left)
            .min(dst.texture.width());
        let height = region
            .bottom
            .min(src_height)
            .saturating_sub(region.top)
            .min(dst.texture.height());
        if width == 0 || height == 0 {
            return Err(GpuError::RegionOutsideTarget {
                left: region.left,
                top: region.top,
                width: src_width,
                height: src_height,
            });
        }

        // Texels the copy does not reach would otherwise keep the previous capture
        if width < dst.texture.width() || height < dst.texture.height() {
            self.clear_texture(dst);
        }

        let device = &self.shared.device;
        validated(device, || {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blur Capture Encoder"),
            });
            encoder.copy_texture_to_texture(
                wgpu::ImageCopyTexture {
                    texture: &source.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: region.left,
                        y: region.top,
                        z: 0,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::ImageCopyTexture {
                    texture: &dst.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
            self.shared.queue.submit(std::iter::once(encoder.finish()));
        })
        .map_err(|err| GpuError::Backend(err.to_string()))
    }

    fn write_constants(&mut self, buffer: &WgpuBuffer, data: &[u8]) -> Result<(), GpuError> {
        if data.len() as u64 > buffer.buffer.size() {
            return Err(GpuError::Backend(format!(
                "{} bytes written to a {} byte constant buffer",
                data.len(),
                buffer.buffer.size()
            )));
        }
        self.shared.queue.write_buffer(&buffer.buffer, 0, data);
        Ok(())
    }

    fn set_vertex_buffer(
        &mut self,
        buffer: &WgpuBuffer,
        _stride: u32,
        layout: &WgpuInputLayout,
        topology: Topology,
    ) {
        self.bindings.vertex = Some(VertexBinding {
            buffer: buffer.clone(),
            layout: layout.clone(),
            topology,
        });
    }

    fn set_vertex_program(&mut self, program: &WgpuProgram) {
        self.bindings.vertex_program = Some(program.clone());
    }

    fn set_fragment_program(&mut self, program: &WgpuProgram) {
        self.bindings.fragment_program = Some(program.clone());
    }

    fn set_constant_buffer(&mut self, slot: u32, buffer: &WgpuBuffer) {
        if Self::check_slot(slot, "constant buffer") {
            self.bindings.constants = Some(buffer.clone());
        }
    }

    fn set_sampler(&mut self, slot: u32, sampler: &WgpuSampler) {
        if Self::check_slot(slot, "sampler") {
            self.bindings.sampler = Some(sampler.clone());
        }
    }

    fn set_rasterizer_state(&mut self, state: &WgpuRasterizerState) {
        self.bindings.rasterizer = Some(state.clone());
    }

    fn set_blend_state(&mut self, state: &WgpuBlendState) {
        self.bindings.blend = Some(state.clone());
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.shared.output().viewport = Some(viewport);
    }

    fn set_render_target(&mut self, target: &WgpuRenderTarget) {
        self.shared.output().target = Some(target.clone());
    }

    fn set_shader_input(&mut self, slot: u32, view: Option<&Arc<wgpu::TextureView>>) {
        if Self::check_slot(slot, "shader input") {
            self.bindings.texture = view.cloned();
        }
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<(), GpuError> {
        let output = self.shared.output().clone();
        let target = output.target.ok_or(GpuError::NoBoundTarget)?;

        let bindings = std::mem::take(&mut self.bindings);
        let result = self.encode_draw(
            &bindings,
            &target,
            output.viewport,
            vertex_count,
            first_vertex,
        );
        self.bindings = bindings;
        result
    }
}

impl WgpuContext {
    fn encode_draw(
        &mut self,
        bindings: &Bindings,
        target: &WgpuRenderTarget,
        viewport: Option<Viewport>,
        vertex_count: u32,
        first_vertex: u32,
    ) -> Result<(), GpuError> {
        let vertex = bindings
            .vertex
            .as_ref()
            .ok_or(GpuError::MissingBinding("vertex buffer"))?;
        let vertex_program = bindings
            .vertex_program
            .as_ref()
            .ok_or(GpuError::MissingBinding("vertex program"))?;
        let fragment_program = bindings
            .fragment_program
            .as_ref()
            .ok_or(GpuError::MissingBinding("fragment program"))?;
        let constants = bindings
            .constants
            .as_ref()
            .ok_or(GpuError::MissingBinding("constant buffer"))?;
        let sampler = bindings
            .sampler
            .as_ref()
            .ok_or(GpuError::MissingBinding("sampler"))?;
        let texture = bindings
            .texture
            .as_ref()
            .ok_or(GpuError::MissingBinding("shader input"))?;
        let blend = bindings
            .blend
            .as_ref()
            .ok_or(GpuError::MissingBinding("blend state"))?;
        let rasterizer = bindings
            .rasterizer
            .as_ref()
            .ok_or(GpuError::MissingBinding("rasterizer state"))?;

        let key = PipelineKey {
            vertex_program: vertex_program.id,
            fragment_program: fragment_program.id,
            input_layout: vertex.layout.id,
            topology: vertex.topology,
            blend: blend.id,
            rasterizer: rasterizer.id,
            format: target.format(),
        };
        let pipeline =
            self.pipeline(key, vertex, vertex_program, fragment_program, blend, rasterizer)?;

        let (width, height) = target.dimensions();
        let viewport = viewport.unwrap_or_else(|| Viewport::full(width, height));

        let device = &self.shared.device;
        validated(device, || {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Blur Bind Group"),
                layout: &self.shared.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: frost_core::shaders::WGSL_CONSTANTS_BINDING,
                        resource: constants.buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: frost_core::shaders::WGSL_TEXTURE_BINDING,
                        resource: wgpu::BindingResource::TextureView(texture),
                    },
                    wgpu::BindGroupEntry {
                        binding: frost_core::shaders::WGSL_SAMPLER_BINDING,
                        resource: wgpu::BindingResource::Sampler(&sampler.sampler),
                    },
                ],
            });

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blur Pass Encoder"),
            });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(fragment_program.label),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(&pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.set_vertex_buffer(0, vertex.buffer.buffer.slice(..));
                pass.set_viewport(
                    viewport.x,
                    viewport.y,
                    viewport.width,
                    viewport.height,
                    viewport.min_depth,
                    viewport.max_depth,
                );
                pass.draw(first_vertex..first_vertex + vertex_count, 0..1);
            }
            self.shared.queue.submit(std::iter::once(encoder.finish()));
        })
        .map_err(|err| GpuError::Backend(err.to_string()))
    }
}
