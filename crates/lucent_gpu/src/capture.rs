//! Backdrop capture
//!
//! [`BackdropCapturer`] turns "whatever is behind this view" into a GPU
//! texture once per frame:
//!
//! 1. resolve the view's bounds to a pixel region (scale x downsample)
//! 2. (re)allocate the paint buffer, texture and staging buffers as one set,
//!    only when the pixel size changes
//! 3. hide the view, rasterize what is behind it, restore the view
//! 4. claim an in-flight slot and upload through that slot's staging buffer
//!
//! When every slot is busy the previous texture is returned unchanged, so the
//! glass shows content one frame old instead of stalling the UI thread.

use std::sync::{Arc, Weak};
use std::thread::ThreadId;

use lucent_core::config::clamp_downsample;
use lucent_core::{CaptureRegion, CaptureSource, PaintBuffer, PixelSize};

use crate::context::{with_error_scopes, GpuContext};
use crate::error::CaptureError;
use crate::limiter::{InFlightLimiter, MAX_IN_FLIGHT};

/// Format of captured backdrop textures
pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// A captured backdrop texture shared between the capturer and the pipeline
pub type SharedTexture = Arc<wgpu::Texture>;

/// Called once the GPU has finished an upload. May run on any thread.
pub type UploadComplete = Box<dyn FnOnce() + Send + 'static>;

/// GPU operations the capturer needs
pub trait CaptureDevice {
    /// Persistent texture the backdrop lands in
    type Texture: Clone;
    /// CPU-writable buffer an upload is copied from
    type Staging;

    fn create_texture(&self, size: PixelSize) -> Result<Self::Texture, CaptureError>;

    /// A staging buffer holding `size.height` rows of `stride` bytes
    fn create_staging(&self, size: PixelSize, stride: u32) -> Result<Self::Staging, CaptureError>;

    /// Write `paint` into `staging`, copy it into `texture`, submit, and call
    /// `on_complete` when the GPU is done with `staging`
    fn upload(
        &self,
        paint: &PaintBuffer,
        staging: &Self::Staging,
        texture: &Self::Texture,
        on_complete: UploadComplete,
    );
}

/// Capture counters, cumulative since creation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Buffer sets allocated
    pub allocations: u64,
    /// Uploads submitted to the GPU
    pub uploads: u64,
    /// Captures that reused the previous texture because no slot was free
    pub skipped_uploads: u64,
    /// Captures that produced no fresh texture at all
    pub misses: u64,
}

/// Persistent per-size resources, replaced together
struct CaptureBuffers<D: CaptureDevice> {
    size: PixelSize,
    paint: PaintBuffer,
    staging: Vec<D::Staging>,
    texture: D::Texture,
}

impl<D: CaptureDevice> CaptureBuffers<D> {
    fn allocate(device: &D, size: PixelSize) -> Result<Self, CaptureError> {
        let paint = PaintBuffer::new(size).ok_or_else(|| CaptureError::Allocation {
            size,
            reason: "paint buffer".to_string(),
        })?;
        let texture = device.create_texture(size)?;
        let staging = (0..MAX_IN_FLIGHT)
            .map(|_| device.create_staging(size, paint.stride()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            size,
            paint,
            staging,
            texture,
        })
    }
}

/// Hides the source for its lifetime
struct HiddenGuard<'a, S: CaptureSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: CaptureSource + ?Sized> HiddenGuard<'a, S> {
    fn new(source: &'a S) -> Self {
        source.set_capture_hidden(true);
        Self { source }
    }
}

impl<S: CaptureSource + ?Sized> Drop for HiddenGuard<'_, S> {
    fn drop(&mut self) {
        self.source.set_capture_hidden(false);
    }
}

/// Captures the backdrop of one view into a persistent texture
///
/// Must be driven from the thread that created it.
pub struct BackdropCapturer<S: CaptureSource + ?Sized, D: CaptureDevice> {
    source: Weak<S>,
    device: D,
    downsample: f32,
    buffers: Option<CaptureBuffers<D>>,
    /// Texture of the last set that failed to be replaced. The shader samples
    /// in UV space, so it stays usable at any later size.
    stale: Option<D::Texture>,
    limiter: InFlightLimiter,
    stats: CaptureStats,
    owner: ThreadId,
}

impl<S: CaptureSource + ?Sized, D: CaptureDevice> BackdropCapturer<S, D> {
    pub fn new(source: Weak<S>, device: D) -> Self {
        Self {
            source,
            device,
            downsample: 1.0,
            buffers: None,
            stale: None,
            limiter: InFlightLimiter::new(MAX_IN_FLIGHT),
            stats: CaptureStats::default(),
            owner: std::thread::current().id(),
        }
    }

    /// Resolution multiplier, clamped to `[0.1, 1.0]`
    pub fn with_downsample(mut self, factor: f32) -> Self {
        self.set_downsample(factor);
        self
    }

    pub fn set_downsample(&mut self, factor: f32) {
        self.downsample = clamp_downsample(factor);
    }

    pub fn downsample(&self) -> f32 {
        self.downsample
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Pixel size of the current buffer set
    pub fn buffer_size(&self) -> Option<PixelSize> {
        self.buffers.as_ref().map(|b| b.size)
    }

    /// Uploads not yet retired by the GPU
    pub fn in_flight(&self) -> usize {
        self.limiter.in_flight()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Resolve the source's current bounds to a capture region
    pub fn region(&self) -> Result<CaptureRegion, CaptureError> {
        let source = self.source.upgrade().ok_or(CaptureError::Detached)?;
        self.resolve_region(&*source)
    }

    /// Capture the current backdrop and return the texture holding it.
    ///
    /// Returns `None` when the source is gone, detached or degenerate, or
    /// when buffers for the new size could not be allocated.
    ///
    /// # Panics
    ///
    /// Panics when called from a thread other than the one that created the
    /// capturer.
    pub fn capture_backdrop(&mut self) -> Option<D::Texture> {
        self.assert_owner_thread();

        let Some(source) = self.source.upgrade() else {
            return self.miss(CaptureError::Detached);
        };
        let region = match self.resolve_region(&*source) {
            Ok(region) => region,
            Err(err) => return self.miss(err),
        };

        if let Err(err) = self.ensure_buffers(region.pixel_size) {
            tracing::warn!("backdrop capture degraded: {}", err);
            self.stats.misses += 1;
            return self.stale.clone();
        }
        let buffers = self.buffers.as_mut()?;

        buffers.paint.clear();
        {
            let _hidden = HiddenGuard::new(&*source);
            source.rasterize(&mut buffers.paint, &region);
        }

        let Some(slot) = self.limiter.try_acquire() else {
            self.stats.skipped_uploads += 1;
            tracing::trace!(
                "all {} upload slots busy, reusing previous backdrop",
                MAX_IN_FLIGHT
            );
            return Some(buffers.texture.clone());
        };

        let staging = &buffers.staging[slot.index()];
        self.device.upload(
            &buffers.paint,
            staging,
            &buffers.texture,
            Box::new(move || drop(slot)),
        );
        self.stats.uploads += 1;

        tracing::trace!(
            uploads = self.stats.uploads,
            skipped = self.stats.skipped_uploads,
            misses = self.stats.misses,
            "backdrop captured ({})",
            region.pixel_size
        );

        Some(buffers.texture.clone())
    }

    fn assert_owner_thread(&self) {
        let current = std::thread::current().id();
        assert!(
            current == self.owner,
            "BackdropCapturer used from {:?} but is bound to {:?}; capture must run on the UI thread",
            current,
            self.owner
        );
    }

    fn miss(&mut self, err: CaptureError) -> Option<D::Texture> {
        self.stats.misses += 1;
        tracing::trace!("backdrop capture skipped: {}", err);
        None
    }

    fn resolve_region(&self, source: &S) -> Result<CaptureRegion, CaptureError> {
        if !source.is_attached() {
            return Err(CaptureError::Detached);
        }
        let bounds = source.bounds();
        let pixels_per_point = source.scale_factor() * self.downsample;
        let pixel_size = bounds.size.to_pixels(pixels_per_point);
        if bounds.is_degenerate() || pixel_size.is_empty() {
            return Err(CaptureError::Degenerate { size: pixel_size });
        }
        Ok(CaptureRegion {
            global_rect: source.transform().map_rect(bounds),
            pixel_size,
            pixels_per_point,
        })
    }

    fn ensure_buffers(&mut self, size: PixelSize) -> Result<(), CaptureError> {
        if self.buffer_size() == Some(size) {
            return Ok(());
        }

        match CaptureBuffers::allocate(&self.device, size) {
            Ok(buffers) => {
                tracing::debug!(
                    "capture buffers {} -> {}",
                    self.buffer_size()
                        .map_or_else(|| "none".to_string(), |s| s.to_string()),
                    size
                );
                self.buffers = Some(buffers);
                self.stale = None;
                self.stats.allocations += 1;
                Ok(())
            }
            Err(err) => {
                if let Some(old) = self.buffers.take() {
                    self.stale = Some(old.texture);
                }
                Err(err)
            }
        }
    }
}

/// wgpu implementation of [`CaptureDevice`]
#[derive(Clone, Debug)]
pub struct WgpuCaptureDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl WgpuCaptureDevice {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            device: Arc::clone(gpu.device()),
            queue: Arc::clone(gpu.queue()),
        }
    }

    /// Run `create` inside out-of-memory and validation error scopes
    fn scoped<T>(&self, size: PixelSize, what: &str, create: impl FnOnce() -> T) -> Result<T, CaptureError> {
        with_error_scopes(&self.device, create).map_err(|err| CaptureError::Allocation {
            size,
            reason: format!("{what}: {err}"),
        })
    }
}

impl CaptureDevice for WgpuCaptureDevice {
    type Texture = SharedTexture;
    type Staging = wgpu::Buffer;

    fn create_texture(&self, size: PixelSize) -> Result<SharedTexture, CaptureError> {
        let texture = self.scoped(size, "backdrop texture", || {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Lucent Backdrop Texture"),
                size: wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: CAPTURE_FORMAT,
                usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        })?;
        Ok(Arc::new(texture))
    }

    fn create_staging(&self, size: PixelSize, stride: u32) -> Result<wgpu::Buffer, CaptureError> {
        self.scoped(size, "staging buffer", || {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Lucent Capture Staging"),
                size: stride as u64 * size.height as u64,
                usage: wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
    }

    fn upload(
        &self,
        paint: &PaintBuffer,
        staging: &wgpu::Buffer,
        texture: &SharedTexture,
        on_complete: UploadComplete,
    ) {
        let size = paint.size();
        self.queue.write_buffer(staging, 0, paint.as_bytes());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lucent Capture Upload Encoder"),
            });
        encoder.copy_buffer_to_texture(
            wgpu::ImageCopyBuffer {
                buffer: staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(paint.stride()),
                    rows_per_image: Some(size.height),
                },
            },
            texture.as_image_copy(),
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        self.queue.on_submitted_work_done(on_complete);
    }
}
