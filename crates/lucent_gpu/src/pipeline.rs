//! Glass pipeline
//!
//! Owns the compiled glass shader, its uniform buffer and sampler, and the
//! optional blur pass. Each rendered frame writes the uniforms, optionally
//! blurs the backdrop, draws one full-surface quad and presents.

use std::sync::Arc;

use bytemuck::bytes_of;
use lucent_core::{EffectConfiguration, PixelSize};

use crate::blur::BlurPass;
use crate::capture::SharedTexture;
use crate::context::{with_error_scopes, GpuContext};
use crate::error::PipelineError;
use crate::primitives::{RenderUniforms, BLUR_EPSILON};
use crate::shaders::GLASS_SHADER;
use crate::surface::{PresentationSurface, SURFACE_FORMAT};

/// Why a frame was not drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No backdrop texture was available
    NoSource,
    /// The GPU path is unavailable
    Disabled,
}

/// Result of one render attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    Skipped(SkipReason),
    /// The surface had no drawable; nothing was submitted
    Dropped,
}

impl FrameOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, FrameOutcome::Rendered)
    }
}

/// Something that composites glass over a backdrop texture
pub trait GlassRenderer {
    type Texture;

    /// Store the configuration for subsequent frames. No GPU work.
    fn update_configuration(&mut self, cfg: &EffectConfiguration, scale: f32);

    /// Draw one frame into `surface`
    fn render(
        &mut self,
        surface: &mut dyn PresentationSurface,
        source: Option<&Self::Texture>,
    ) -> FrameOutcome;
}

/// The wgpu glass renderer
pub struct GlassPipeline {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    /// One render pipeline per drawable format seen so far
    pipelines: Vec<(wgpu::TextureFormat, wgpu::RenderPipeline)>,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    blur: BlurPass,
    config: EffectConfiguration,
    scale: f32,
}

impl GlassPipeline {
    /// Compile the shaders and build the pipeline state.
    ///
    /// A bad shader surfaces as [`PipelineError::Shader`]; a buffer, sampler
    /// or pipeline object that cannot be allocated as
    /// [`PipelineError::Resource`].
    pub fn new(gpu: &GpuContext) -> Result<Self, PipelineError> {
        let device = Arc::clone(gpu.device());
        let queue = Arc::clone(gpu.queue());

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lucent Glass Shader"),
            source: wgpu::ShaderSource::Wgsl(GLASS_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lucent Glass Bind Group Layout"),
            entries: &[
                // GlassUniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Backdrop texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Backdrop sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lucent Glass Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_glass_pipeline(&device, &layout, &shader, SURFACE_FORMAT);
        let blur = BlurPass::new(&device);

        let validation = pollster::block_on(device.pop_error_scope());
        let oom = pollster::block_on(device.pop_error_scope());
        if let Some(err) = validation {
            tracing::warn!("glass pipeline creation failed: {}", err);
            return Err(PipelineError::Shader(err.to_string()));
        }
        if let Some(err) = oom {
            tracing::warn!("glass pipeline objects could not be allocated: {}", err);
            return Err(PipelineError::Resource(err.to_string()));
        }

        let (uniform_buffer, sampler) = with_error_scopes(&device, || {
            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Lucent Glass Uniforms"),
                size: std::mem::size_of::<RenderUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Lucent Backdrop Sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            });
            (uniform_buffer, sampler)
        })
        .map_err(|err| {
            tracing::warn!("glass uniforms or sampler could not be allocated: {}", err);
            PipelineError::Resource(err.to_string())
        })?;

        tracing::info!("glass pipeline ready ({:?})", SURFACE_FORMAT);

        Ok(Self {
            device,
            queue,
            shader,
            layout,
            bind_group_layout,
            pipelines: vec![(SURFACE_FORMAT, pipeline)],
            uniform_buffer,
            sampler,
            blur,
            config: EffectConfiguration::default(),
            scale: 1.0,
        })
    }

    pub fn configuration(&self) -> &EffectConfiguration {
        &self.config
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Store the configuration and pixel scale used by the next frame
    pub fn update_configuration(&mut self, cfg: &EffectConfiguration, scale: f32) {
        self.config = cfg.sanitized();
        self.scale = scale;
    }

    /// Composite glass over `source` into the next drawable of `surface`
    pub fn render(
        &mut self,
        surface: &mut dyn PresentationSurface,
        source: Option<&wgpu::Texture>,
    ) -> FrameOutcome {
        let Some(source) = source else {
            tracing::trace!("no backdrop texture, skipping frame");
            return FrameOutcome::Skipped(SkipReason::NoSource);
        };

        let drawable = match surface.acquire() {
            Ok(drawable) => drawable,
            Err(err) => {
                tracing::debug!("dropping frame: {}", err);
                return FrameOutcome::Dropped;
            }
        };

        let uniforms = RenderUniforms::new(&self.config, self.scale, drawable.size());
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytes_of(&uniforms));

        let pipeline_index = self.pipeline_index(drawable.format());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lucent Glass Encoder"),
            });

        let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());
        let blurred = if self.config.blur_radius > BLUR_EPSILON {
            self.blur.encode(
                &self.device,
                &self.queue,
                &mut encoder,
                &source_view,
                PixelSize::new(source.width(), source.height()),
                &self.sampler,
                self.config.blur_radius,
            )
        } else {
            None
        };
        let backdrop = blurred.unwrap_or(&source_view);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lucent Glass Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(backdrop),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lucent Glass Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: drawable.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines[pipeline_index].1);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }

        let size = drawable.size();
        self.queue.submit(std::iter::once(encoder.finish()));
        drawable.present();

        tracing::trace!("glass frame rendered ({})", size);
        FrameOutcome::Rendered
    }

    /// Index of the render pipeline for `format`, building it on first use
    fn pipeline_index(&mut self, format: wgpu::TextureFormat) -> usize {
        if let Some(index) = self.pipelines.iter().position(|(f, _)| *f == format) {
            return index;
        }
        tracing::debug!("building glass pipeline for {:?}", format);
        let pipeline = create_glass_pipeline(&self.device, &self.layout, &self.shader, format);
        self.pipelines.push((format, pipeline));
        self.pipelines.len() - 1
    }
}

impl GlassRenderer for GlassPipeline {
    type Texture = SharedTexture;

    fn update_configuration(&mut self, cfg: &EffectConfiguration, scale: f32) {
        GlassPipeline::update_configuration(self, cfg, scale);
    }

    fn render(
        &mut self,
        surface: &mut dyn PresentationSurface,
        source: Option<&SharedTexture>,
    ) -> FrameOutcome {
        GlassPipeline::render(self, surface, source.map(|t| t.as_ref()))
    }
}

fn create_glass_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Lucent Glass Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
