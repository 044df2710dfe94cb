//! End-to-end tests against a real GPU adapter
//!
//! Ignored by default; run with `cargo test -p lucent_gpu -- --ignored` on a
//! machine with a GPU.

use std::sync::Arc;

use lucent_core::{CaptureRegion, CaptureSource, EffectConfiguration, PaintBuffer, PixelSize, Rect, Transform};
use lucent_gpu::blur::BlurPass;
use lucent_gpu::{
    BackdropCapturer, FrameOutcome, GlassPipeline, GpuContext, OffscreenSurface,
    PresentationSurface, SkipReason, WgpuCaptureDevice,
};

struct SolidView {
    bgra: [u8; 4],
}

impl CaptureSource for SolidView {
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, 100.0, 40.0)
    }

    fn transform(&self) -> Transform {
        Transform::IDENTITY
    }

    fn scale_factor(&self) -> f32 {
        1.0
    }

    fn is_attached(&self) -> bool {
        true
    }

    fn set_capture_hidden(&self, _hidden: bool) {}

    fn rasterize(&self, target: &mut PaintBuffer, _region: &CaptureRegion) {
        target.fill_bgra(self.bgra);
    }
}

fn gpu() -> GpuContext {
    GpuContext::new().expect("GPU adapter required")
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_pipeline_compiles() {
    let gpu = gpu();
    assert!(GlassPipeline::new(&gpu).is_ok());
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_render_without_source_is_skipped() {
    let gpu = gpu();
    let mut pipeline = GlassPipeline::new(&gpu).unwrap();
    let mut surface = OffscreenSurface::new(&gpu, PixelSize::new(100, 40));
    assert_eq!(
        pipeline.render(&mut surface, None),
        FrameOutcome::Skipped(SkipReason::NoSource)
    );
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_empty_surface_drops_frame() {
    let gpu = gpu();
    let mut pipeline = GlassPipeline::new(&gpu).unwrap();
    let mut surface = OffscreenSurface::new(&gpu, PixelSize::new(0, 0));
    let device = WgpuCaptureDevice::new(&gpu);
    let texture = lucent_gpu::CaptureDevice::create_texture(&device, PixelSize::new(4, 4)).unwrap();
    assert_eq!(
        pipeline.render(&mut surface, Some(texture.as_ref())),
        FrameOutcome::Dropped
    );
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_capture_and_composite() {
    let gpu = gpu();
    let view = Arc::new(SolidView {
        bgra: [200, 100, 50, 255],
    });
    let mut capturer = BackdropCapturer::new(Arc::downgrade(&view), WgpuCaptureDevice::new(&gpu));
    let texture = capturer.capture_backdrop().unwrap();
    assert_eq!(texture.width(), 100);
    assert_eq!(texture.height(), 40);

    let mut pipeline = GlassPipeline::new(&gpu).unwrap();
    pipeline.update_configuration(
        &EffectConfiguration::default()
            .with_corner_radius(20.0)
            .with_blur_radius(2.0),
        1.0,
    );
    let mut surface = OffscreenSurface::new(&gpu, PixelSize::new(100, 40));
    assert!(pipeline.render(&mut surface, Some(texture.as_ref())).is_rendered());

    let pixels = surface.read_pixels().unwrap();
    let center = ((20 * 100 + 50) * 4) as usize;
    // Opaque glass over the backdrop at the center
    assert_eq!(pixels[center + 3], 255);
    // Corners are outside the rounded rect and left transparent
    assert_eq!(pixels[3], 0);
    assert_eq!(surface.size(), PixelSize::new(100, 40));
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_oversized_blur_targets_fall_back_to_source() {
    let gpu = gpu();
    let device = gpu.device();
    let mut blur = BlurPass::new(device);
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor::default());
    let source = lucent_gpu::CaptureDevice::create_texture(
        &WgpuCaptureDevice::new(&gpu),
        PixelSize::new(4, 4),
    )
    .unwrap();
    let view = source.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

    let too_wide = device.limits().max_texture_dimension_2d + 1;
    let blurred = blur.encode(
        device,
        gpu.queue(),
        &mut encoder,
        &view,
        PixelSize::new(too_wide, 4),
        &sampler,
        2.0,
    );
    assert!(blurred.is_none());
    assert_eq!(blur.target_size(), None);

    let blurred = blur.encode(
        device,
        gpu.queue(),
        &mut encoder,
        &view,
        PixelSize::new(4, 4),
        &sampler,
        2.0,
    );
    assert!(blurred.is_some());
    assert_eq!(blur.target_size(), Some(PixelSize::new(4, 4)));
    gpu.queue().submit(std::iter::once(encoder.finish()));
}
