//! Separable Gaussian backdrop blur
//!
//! Two passes per frame: horizontal from the source into the first
//! intermediate texture, then vertical into the second. The intermediates
//! are sized to the source and only rebuilt when the source size changes.

use bytemuck::bytes_of;
use lucent_core::PixelSize;

use crate::context::with_error_scopes;
use crate::primitives::BlurUniforms;
use crate::shaders::BLUR_SHADER;

/// Format of the intermediate blur targets (same as captured backdrops)
pub const BLUR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

struct BlurTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct BlurTargets {
    size: PixelSize,
    horizontal: BlurTarget,
    vertical: BlurTarget,
    /// Second pass always reads the first pass's output
    vertical_bind_group: wgpu::BindGroup,
}

/// Pipeline and scratch textures for the blur passes
pub struct BlurPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    horizontal_uniforms: wgpu::Buffer,
    vertical_uniforms: wgpu::Buffer,
    targets: Option<BlurTargets>,
}

impl BlurPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lucent Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(BLUR_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lucent Blur Bind Group Layout"),
            entries: &[
                // BlurUniforms
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
                // Input texture
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
                // Input sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lucent Blur Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Blur writes premultiplied texels directly, no blending
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Lucent Blur Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_gaussian"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: BLUR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<BlurUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Self {
            pipeline,
            bind_group_layout,
            horizontal_uniforms: uniform_buffer("Lucent Blur Uniforms (H)"),
            vertical_uniforms: uniform_buffer("Lucent Blur Uniforms (V)"),
            targets: None,
        }
    }

    /// Size of the current intermediates, if any
    pub fn target_size(&self) -> Option<PixelSize> {
        self.targets.as_ref().map(|t| t.size)
    }

    /// Encode both passes over `source` and return the blurred view.
    ///
    /// `sigma` is in source pixels. Returns `None` without encoding anything
    /// when the intermediates cannot be allocated; the caller composites the
    /// unblurred source instead.
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::TextureView,
        source_size: PixelSize,
        sampler: &wgpu::Sampler,
        sigma: f32,
    ) -> Option<&wgpu::TextureView> {
        let targets = match self.targets.take() {
            Some(targets) if targets.size == source_size => targets,
            _ => {
                tracing::debug!("allocating blur targets {}", source_size);
                match self.allocate_targets(device, source_size, sampler) {
                    Ok(targets) => targets,
                    Err(err) => {
                        tracing::warn!(
                            "blur targets for {} unavailable, skipping blur: {}",
                            source_size,
                            err
                        );
                        return None;
                    }
                }
            }
        };

        queue.write_buffer(
            &self.horizontal_uniforms,
            0,
            bytes_of(&BlurUniforms::horizontal(source_size, sigma)),
        );
        queue.write_buffer(
            &self.vertical_uniforms,
            0,
            bytes_of(&BlurUniforms::vertical(source_size, sigma)),
        );

        let horizontal_bind_group = create_bind_group(
            device,
            &self.bind_group_layout,
            &self.horizontal_uniforms,
            source,
            sampler,
        );

        for (label, output, bind_group) in [
            ("Lucent Blur Pass (H)", &targets.horizontal.view, &horizontal_bind_group),
            ("Lucent Blur Pass (V)", &targets.vertical.view, &targets.vertical_bind_group),
        ] {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output,
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
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..4, 0..1);
        }

        Some(&self.targets.insert(targets).vertical.view)
    }

    fn allocate_targets(
        &self,
        device: &wgpu::Device,
        size: PixelSize,
        sampler: &wgpu::Sampler,
    ) -> Result<BlurTargets, wgpu::Error> {
        with_error_scopes(device, || {
            let horizontal = create_target(device, size, "Lucent Blur Target (H)");
            let vertical = create_target(device, size, "Lucent Blur Target (V)");
            let vertical_bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.vertical_uniforms,
                &horizontal.view,
                sampler,
            );
            BlurTargets {
                size,
                horizontal,
                vertical,
                vertical_bind_group,
            }
        })
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    input: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Lucent Blur Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(input),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_target(device: &wgpu::Device, size: PixelSize, label: &str) -> BlurTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: BLUR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    BlurTarget {
        _texture: texture,
        view,
    }
}
