//! Recording doubles for the host, surface, device and renderer seams

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use lucent_core::{
    CaptureRegion, CaptureSource, CompositorHost, EffectConfiguration, LayerChange, PaintBuffer,
    PixelSize, Rect, Transform,
};
use lucent_gpu::capture::UploadComplete;
use lucent_gpu::{
    AcquireError, BackdropCapturer, CaptureDevice, CaptureError, Drawable, FrameOutcome,
    GlassRenderer, PresentationSurface, SkipReason,
};
use lucent_view::{EffectSurface, GlassKnob};

pub struct TestView {
    pub bounds: Cell<Rect>,
    pub scale: f32,
}

impl TestView {
    pub fn new(width: f32, height: f32, scale: f32) -> Arc<Self> {
        Arc::new(Self {
            bounds: Cell::new(Rect::new(0.0, 0.0, width, height)),
            scale,
        })
    }
}

impl CaptureSource for TestView {
    fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    fn transform(&self) -> Transform {
        Transform::IDENTITY
    }

    fn scale_factor(&self) -> f32 {
        self.scale
    }

    fn is_attached(&self) -> bool {
        true
    }

    fn set_capture_hidden(&self, _hidden: bool) {}

    fn rasterize(&self, target: &mut PaintBuffer, _region: &CaptureRegion) {
        target.fill_bgra([40, 80, 120, 255]);
    }
}

/// Identifies where a backdrop texture came from
#[derive(Clone, Debug, PartialEq)]
pub enum FakeTexture {
    Captured(PixelSize),
    Provided(PixelSize),
}

/// Device whose uploads retire immediately
#[derive(Clone, Default)]
pub struct InstantDevice {
    pub uploads: Rc<Cell<usize>>,
}

impl CaptureDevice for InstantDevice {
    type Texture = FakeTexture;
    type Staging = ();

    fn create_texture(&self, size: PixelSize) -> Result<FakeTexture, CaptureError> {
        Ok(FakeTexture::Captured(size))
    }

    fn create_staging(&self, _size: PixelSize, _stride: u32) -> Result<(), CaptureError> {
        Ok(())
    }

    fn upload(
        &self,
        _paint: &PaintBuffer,
        _staging: &(),
        _texture: &FakeTexture,
        on_complete: UploadComplete,
    ) {
        self.uploads.set(self.uploads.get() + 1);
        on_complete();
    }
}

#[derive(Default)]
pub struct RendererLog {
    pub configs: Vec<(EffectConfiguration, f32)>,
    pub frames: Vec<Option<FakeTexture>>,
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub log: Rc<RefCell<RendererLog>>,
}

impl GlassRenderer for RecordingRenderer {
    type Texture = FakeTexture;

    fn update_configuration(&mut self, cfg: &EffectConfiguration, scale: f32) {
        self.log.borrow_mut().configs.push((*cfg, scale));
    }

    fn render(
        &mut self,
        _surface: &mut dyn PresentationSurface,
        source: Option<&FakeTexture>,
    ) -> FrameOutcome {
        self.log.borrow_mut().frames.push(source.cloned());
        match source {
            Some(_) => FrameOutcome::Rendered,
            None => FrameOutcome::Skipped(SkipReason::NoSource),
        }
    }
}

#[derive(Clone, Default)]
pub struct TestSurface {
    pub size: Rc<Cell<PixelSize>>,
    pub resizes: Rc<RefCell<Vec<PixelSize>>>,
}

impl PresentationSurface for TestSurface {
    fn size(&self) -> PixelSize {
        self.size.get()
    }

    fn resize(&mut self, size: PixelSize) {
        self.size.set(size);
        self.resizes.borrow_mut().push(size);
    }

    fn acquire(&mut self) -> Result<Drawable, AcquireError> {
        Err(AcquireError::NotReady)
    }
}

#[derive(Clone, Default)]
pub struct RecordingHost {
    pub batches: Rc<RefCell<Vec<Vec<LayerChange>>>>,
}

impl RecordingHost {
    pub fn last_batch(&self) -> Vec<LayerChange> {
        self.batches.borrow().last().cloned().unwrap_or_default()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.borrow().len()
    }
}

impl CompositorHost for RecordingHost {
    fn apply_layout(&self, changes: &[LayerChange]) {
        self.batches.borrow_mut().push(changes.to_vec());
    }
}

pub type TestSurfaceController = EffectSurface<TestView, InstantDevice, RecordingRenderer>;
pub type TestKnob = GlassKnob<TestView, InstantDevice, RecordingRenderer>;

/// Handles onto everything a test controller records
pub struct Harness {
    pub view: Arc<TestView>,
    pub device: InstantDevice,
    pub renderer: RecordingRenderer,
    pub surface: TestSurface,
    pub host: RecordingHost,
}

impl Harness {
    pub fn new(width: f32, height: f32, scale: f32) -> Self {
        Self {
            view: TestView::new(width, height, scale),
            device: InstantDevice::default(),
            renderer: RecordingRenderer::default(),
            surface: TestSurface::default(),
            host: RecordingHost::default(),
        }
    }

    pub fn controller(&self) -> TestSurfaceController {
        let capturer = BackdropCapturer::new(Arc::downgrade(&self.view), self.device.clone());
        EffectSurface::new(
            capturer,
            self.renderer.clone(),
            Box::new(self.surface.clone()),
            Box::new(self.host.clone()),
        )
    }

    pub fn disabled(&self) -> TestSurfaceController {
        EffectSurface::disabled(Box::new(self.surface.clone()), Box::new(self.host.clone()))
    }

    pub fn frames(&self) -> Vec<Option<FakeTexture>> {
        self.renderer.log.borrow().frames.clone()
    }

    pub fn config_updates(&self) -> usize {
        self.renderer.log.borrow().configs.len()
    }
}
