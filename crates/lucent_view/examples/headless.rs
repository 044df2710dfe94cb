//! Headless glass render
//!
//! Captures a gradient "backdrop", composites a glass capsule over it into an
//! offscreen target and prints a few pixels.
//!
//! Run with: cargo run -p lucent_view --example headless --features desktop

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lucent_core::{
    CaptureRegion, CaptureSource, CompositorHost, LayerChange, PaintBuffer, PixelSize, Rect,
    Settings, Transform,
};
use lucent_gpu::{AcquireError, Drawable, GpuContext, OffscreenSurface, PresentationSurface};
use lucent_view::{logging, WgpuEffectSurface};

const PRESET: &str = r#"
[effect]
corner_radius = 22.0
edge_width = 12.0
distortion_strength = 0.8
blur_radius = 3.0
aux = [6.0, 0.25, 1.0, 1.0]

[capture]
downsample = 1.0
target_fps = 60
"#;

struct GradientView {
    bounds: Rect,
}

impl CaptureSource for GradientView {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn transform(&self) -> Transform {
        Transform::translation(40.0, 120.0)
    }

    fn scale_factor(&self) -> f32 {
        2.0
    }

    fn is_attached(&self) -> bool {
        true
    }

    fn set_capture_hidden(&self, hidden: bool) {
        tracing::trace!("capture hidden: {}", hidden);
    }

    fn rasterize(&self, target: &mut PaintBuffer, _region: &CaptureRegion) {
        let size = target.size();
        for y in 0..size.height {
            for x in 0..size.width {
                let u = x as f32 / size.width.max(1) as f32;
                let v = y as f32 / size.height.max(1) as f32;
                target.put_pixel(x, y, [u, 0.3, 1.0 - v, 1.0]);
            }
        }
    }
}

struct LogHost;

impl CompositorHost for LogHost {
    fn apply_layout(&self, changes: &[LayerChange]) {
        for change in changes {
            tracing::info!("layout: {:?}", change);
        }
    }
}

/// Lets the example read back pixels after the controller presents
#[derive(Clone)]
struct SharedOffscreen(Rc<RefCell<OffscreenSurface>>);

impl PresentationSurface for SharedOffscreen {
    fn size(&self) -> PixelSize {
        self.0.borrow().size()
    }

    fn resize(&mut self, size: PixelSize) {
        self.0.borrow_mut().resize(size);
    }

    fn acquire(&mut self) -> Result<Drawable, AcquireError> {
        self.0.borrow_mut().acquire()
    }
}

fn main() -> Result<()> {
    logging::init();

    let settings = Settings::from_toml_str(PRESET).context("parsing preset")?;
    let capture = settings.capture.with_env_overrides();

    let gpu = GpuContext::new().context("no usable GPU adapter")?;

    let bounds = Rect::new(0.0, 0.0, 200.0, 44.0);
    let view = Arc::new(GradientView { bounds });
    let offscreen = SharedOffscreen(Rc::new(RefCell::new(OffscreenSurface::new(
        &gpu,
        PixelSize::default(),
    ))));

    let mut glass = WgpuEffectSurface::with_gpu(
        &gpu,
        Arc::downgrade(&view),
        Box::new(offscreen.clone()),
        Box::new(LogHost),
        &capture,
    );
    anyhow::ensure!(glass.is_enabled(), "glass pipeline failed to build");

    glass.update_configuration(settings.effect);
    glass.attach();
    glass.layout(bounds);
    glass.start_rendering();

    let start = Instant::now();
    let mut rendered = 0;
    for frame in 0..10u32 {
        let now = start + Duration::from_millis(17 * u64::from(frame));
        if glass.on_frame(now).is_some_and(|outcome| outcome.is_rendered()) {
            rendered += 1;
        }
    }
    glass.stop_rendering();

    if let Some(capturer) = glass.capturer() {
        tracing::info!("rendered {} frames, capture stats {:?}", rendered, capturer.stats());
    }

    let surface = offscreen.0.borrow();
    let size = surface.size();
    let pixels = surface.read_pixels().context("reading back the glass")?;
    for (label, x, y) in [
        ("center", size.width / 2, size.height / 2),
        ("edge", 4, size.height / 2),
        ("corner", 0, 0),
    ] {
        let offset = ((y * size.width + x) * 4) as usize;
        println!("{label:>6}: bgra {:?}", &pixels[offset..offset + 4]);
    }

    Ok(())
}
