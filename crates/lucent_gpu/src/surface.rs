//! Presentation surfaces
//!
//! The pipeline draws into whatever [`PresentationSurface`] it is handed:
//! a window-backed swapchain for real hosts, or an offscreen render target
//! for headless use and tests.

use std::sync::Arc;

use lucent_core::{CaptureSettings, PixelSize};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use thiserror::Error;

use crate::context::GpuContext;
use crate::error::PipelineError;

/// Preferred drawable format; the glass shader writes sRGB-encoded values
pub const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// Why no drawable was available this frame. Never fatal; the frame is
/// dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("surface has no drawable size")]
    NotReady,
    #[error("timed out waiting for a drawable")]
    Timeout,
    #[error("surface is outdated and was reconfigured")]
    Outdated,
    #[error("surface was lost and was reconfigured")]
    Lost,
    #[error("out of memory acquiring a drawable")]
    OutOfMemory,
}

/// One frame's render target
pub struct Drawable {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    size: PixelSize,
    frame: Option<wgpu::SurfaceTexture>,
}

impl Drawable {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Queue the frame for display (no-op for offscreen targets)
    pub fn present(self) {
        if let Some(frame) = self.frame {
            frame.present();
        }
    }
}

/// A target the glass pipeline can present into
pub trait PresentationSurface {
    /// Drawable size in pixels
    fn size(&self) -> PixelSize;

    /// Resize the drawable; an empty size suspends acquisition
    fn resize(&mut self, size: PixelSize);

    /// Next drawable, or why there is none this frame
    fn acquire(&mut self) -> Result<Drawable, AcquireError>;
}

/// Swapchain-backed surface for a native window or layer
pub struct WindowSurface {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    config: wgpu::SurfaceConfiguration,
    view_format: wgpu::TextureFormat,
    configured: bool,
}

impl WindowSurface {
    /// Create a surface for `window`.
    ///
    /// `settings.max_frame_latency` bounds queued frames (2 keeps three
    /// drawables in rotation).
    pub fn new<W>(
        gpu: &GpuContext,
        window: W,
        size: PixelSize,
        settings: &CaptureSettings,
    ) -> Result<Self, PipelineError>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let surface = gpu.instance().create_surface(window)?;
        let caps = surface.get_capabilities(gpu.adapter());

        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| *f == SURFACE_FORMAT)
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                PipelineError::Resource("surface is not supported by the adapter".to_string())
            })?;
        let view_format = format.remove_srgb_suffix();

        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PostMultiplied)
        {
            wgpu::CompositeAlphaMode::PostMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: settings.max_frame_latency.clamp(1, 3),
            alpha_mode,
            view_formats: if view_format != format {
                vec![view_format]
            } else {
                vec![]
            },
        };

        tracing::info!(
            "window surface: {:?} {} (latency {})",
            format,
            size,
            config.desired_maximum_frame_latency
        );

        let mut this = Self {
            surface,
            device: Arc::clone(gpu.device()),
            config,
            view_format,
            configured: false,
        };
        this.resize(size);
        Ok(this)
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.configured = true;
    }
}

impl PresentationSurface for WindowSurface {
    fn size(&self) -> PixelSize {
        PixelSize::new(self.config.width, self.config.height)
    }

    fn resize(&mut self, size: PixelSize) {
        self.config.width = size.width;
        self.config.height = size.height;
        if size.is_empty() {
            self.configured = false;
            return;
        }
        self.reconfigure();
    }

    fn acquire(&mut self) -> Result<Drawable, AcquireError> {
        if !self.configured {
            return Err(AcquireError::NotReady);
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(AcquireError::Outdated);
            }
            Err(wgpu::SurfaceError::Lost) => {
                self.reconfigure();
                return Err(AcquireError::Lost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(AcquireError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(AcquireError::OutOfMemory),
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.view_format),
            ..Default::default()
        });

        Ok(Drawable {
            view,
            format: self.view_format,
            size: self.size(),
            frame: Some(frame),
        })
    }
}

/// Offscreen render target for headless rendering and tests
pub struct OffscreenSurface {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    size: PixelSize,
    texture: Option<wgpu::Texture>,
}

impl OffscreenSurface {
    pub fn new(gpu: &GpuContext, size: PixelSize) -> Self {
        let mut this = Self {
            device: Arc::clone(gpu.device()),
            queue: Arc::clone(gpu.queue()),
            size: PixelSize::default(),
            texture: None,
        };
        this.resize(size);
        this
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.texture.as_ref()
    }

    /// Read the target back as tightly packed BGRA8 rows (blocks on the GPU)
    pub fn read_pixels(&self) -> Option<Vec<u8>> {
        let texture = self.texture.as_ref()?;
        let PixelSize { width, height } = self.size;
        let bytes_per_row = lucent_core::paint::padded_bytes_per_row(width);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lucent Offscreen Readback"),
            size: bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lucent Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv().ok()?.ok()?;

        let data = slice.get_mapped_range();
        let row_bytes = (width * 4) as usize;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in data.chunks_exact(bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..row_bytes]);
        }
        drop(data);
        buffer.unmap();
        Some(pixels)
    }
}

impl PresentationSurface for OffscreenSurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn resize(&mut self, size: PixelSize) {
        if size == self.size && (self.texture.is_some() || size.is_empty()) {
            return;
        }
        self.size = size;
        self.texture = (!size.is_empty()).then(|| {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Lucent Offscreen Target"),
                size: wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SURFACE_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
        });
    }

    fn acquire(&mut self) -> Result<Drawable, AcquireError> {
        let texture = self.texture.as_ref().ok_or(AcquireError::NotReady)?;
        Ok(Drawable {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            format: SURFACE_FORMAT,
            size: self.size,
            frame: None,
        })
    }
}
