//! Backdrop capturer behaviour against a recording device
//!
//! These tests verify that:
//! - Buffers are sized from bounds x scale x downsample and reused across frames
//! - A resize reallocates exactly once
//! - No more than three uploads are ever outstanding
//! - Failures degrade to misses or the previous texture, never errors

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use lucent_core::{CaptureRegion, CaptureSource, PaintBuffer, PixelSize, Rect, Transform};
use lucent_gpu::capture::UploadComplete;
use lucent_gpu::{BackdropCapturer, CaptureDevice, CaptureError, MAX_IN_FLIGHT};

#[derive(Clone, Debug, PartialEq)]
struct FakeTexture {
    id: usize,
    size: PixelSize,
}

struct Upload {
    bytes: Vec<u8>,
    staging: usize,
    texture: usize,
}

#[derive(Default)]
struct DeviceLog {
    textures: Vec<PixelSize>,
    staging: Vec<(PixelSize, u32)>,
    uploads: Vec<Upload>,
    pending: Vec<UploadComplete>,
}

#[derive(Clone, Default)]
struct RecordingDevice {
    log: Arc<Mutex<DeviceLog>>,
    hold_completions: Arc<AtomicBool>,
    fail_allocations: Arc<AtomicBool>,
}

impl RecordingDevice {
    fn complete_all(&self) {
        let pending = std::mem::take(&mut self.log.lock().unwrap().pending);
        for done in pending {
            done();
        }
    }

    fn texture_sizes(&self) -> Vec<PixelSize> {
        self.log.lock().unwrap().textures.clone()
    }
}

impl CaptureDevice for RecordingDevice {
    type Texture = FakeTexture;
    type Staging = usize;

    fn create_texture(&self, size: PixelSize) -> Result<FakeTexture, CaptureError> {
        if self.fail_allocations.load(Ordering::SeqCst) {
            return Err(CaptureError::Allocation {
                size,
                reason: "injected".to_string(),
            });
        }
        let mut log = self.log.lock().unwrap();
        log.textures.push(size);
        Ok(FakeTexture {
            id: log.textures.len() - 1,
            size,
        })
    }

    fn create_staging(&self, size: PixelSize, stride: u32) -> Result<usize, CaptureError> {
        let mut log = self.log.lock().unwrap();
        log.staging.push((size, stride));
        Ok(log.staging.len() - 1)
    }

    fn upload(
        &self,
        paint: &PaintBuffer,
        staging: &usize,
        texture: &FakeTexture,
        on_complete: UploadComplete,
    ) {
        assert_eq!(paint.size(), texture.size);
        let mut log = self.log.lock().unwrap();
        log.uploads.push(Upload {
            bytes: paint.as_bytes().to_vec(),
            staging: *staging,
            texture: texture.id,
        });
        if self.hold_completions.load(Ordering::SeqCst) {
            log.pending.push(on_complete);
        } else {
            drop(log);
            on_complete();
        }
    }
}

struct TestView {
    bounds: Mutex<Rect>,
    scale: f32,
    attached: AtomicBool,
    hidden: AtomicBool,
    hidden_during_paint: Mutex<Vec<bool>>,
    fill: Mutex<[u8; 4]>,
    panic_on_paint: AtomicBool,
}

impl TestView {
    fn new(width: f32, height: f32, scale: f32) -> Arc<Self> {
        Arc::new(Self {
            bounds: Mutex::new(Rect::new(0.0, 0.0, width, height)),
            scale,
            attached: AtomicBool::new(true),
            hidden: AtomicBool::new(false),
            hidden_during_paint: Mutex::new(Vec::new()),
            fill: Mutex::new([40, 80, 120, 255]),
            panic_on_paint: AtomicBool::new(false),
        })
    }

    fn resize(&self, width: f32, height: f32) {
        *self.bounds.lock().unwrap() = Rect::new(0.0, 0.0, width, height);
    }
}

impl CaptureSource for TestView {
    fn bounds(&self) -> Rect {
        *self.bounds.lock().unwrap()
    }

    fn transform(&self) -> Transform {
        Transform::translation(10.0, 20.0)
    }

    fn scale_factor(&self) -> f32 {
        self.scale
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn set_capture_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::SeqCst);
    }

    fn rasterize(&self, target: &mut PaintBuffer, region: &CaptureRegion) {
        assert_eq!(target.size(), region.pixel_size);
        self.hidden_during_paint
            .lock()
            .unwrap()
            .push(self.hidden.load(Ordering::SeqCst));
        if self.panic_on_paint.load(Ordering::SeqCst) {
            panic!("rasterization failed");
        }
        target.fill_bgra(*self.fill.lock().unwrap());
    }
}

fn capturer(
    view: &Arc<TestView>,
) -> (BackdropCapturer<TestView, RecordingDevice>, RecordingDevice) {
    let device = RecordingDevice::default();
    (
        BackdropCapturer::new(Arc::downgrade(view), device.clone()),
        device,
    )
}

#[test]
fn test_region_follows_scale_and_resize() {
    let view = TestView::new(200.0, 44.0, 3.0);
    let (mut capturer, device) = capturer(&view);

    let texture = capturer.capture_backdrop().unwrap();
    assert_eq!(texture.size, PixelSize::new(600, 132));
    assert_eq!(capturer.buffer_size(), Some(PixelSize::new(600, 132)));

    view.resize(300.0, 44.0);
    let texture = capturer.capture_backdrop().unwrap();
    assert_eq!(texture.size, PixelSize::new(900, 132));
    assert_eq!(capturer.stats().allocations, 2);
    assert_eq!(
        device.texture_sizes(),
        vec![PixelSize::new(600, 132), PixelSize::new(900, 132)]
    );
}

#[test]
fn test_region_maps_to_global_points() {
    let view = TestView::new(200.0, 44.0, 2.0);
    let (capturer, _) = capturer(&view);
    let region = capturer.region().unwrap();
    assert_eq!(region.global_rect, Rect::new(10.0, 20.0, 200.0, 44.0));
    assert_eq!(region.pixels_per_point, 2.0);
}

#[test]
fn test_fixed_size_allocates_once() {
    let view = TestView::new(120.0, 40.0, 2.0);
    let (mut capturer, device) = capturer(&view);

    for _ in 0..10 {
        assert!(capturer.capture_backdrop().is_some());
    }

    let stats = capturer.stats();
    assert_eq!(stats.allocations, 1);
    assert_eq!(stats.uploads, 10);
    let log = device.log.lock().unwrap();
    assert_eq!(log.textures.len(), 1);
    assert_eq!(log.staging.len(), MAX_IN_FLIGHT);
    assert!(log.uploads.iter().all(|u| u.texture == 0));
}

#[test]
fn test_unchanged_content_uploads_identical_bytes() {
    let view = TestView::new(64.0, 32.0, 1.0);
    let (mut capturer, device) = capturer(&view);

    capturer.capture_backdrop();
    capturer.capture_backdrop();

    let log = device.log.lock().unwrap();
    assert_eq!(log.uploads.len(), 2);
    assert_eq!(log.uploads[0].bytes, log.uploads[1].bytes);
    // Stride is padded for the buffer-to-texture copy
    assert_eq!(log.staging[0].1, 256);
}

#[test]
fn test_changed_content_is_uploaded() {
    let view = TestView::new(64.0, 32.0, 1.0);
    let (mut capturer, device) = capturer(&view);

    capturer.capture_backdrop();
    *view.fill.lock().unwrap() = [0, 0, 255, 255];
    capturer.capture_backdrop();

    let log = device.log.lock().unwrap();
    assert_ne!(log.uploads[0].bytes, log.uploads[1].bytes);
}

#[test]
fn test_in_flight_bound_degrades_to_previous_texture() {
    let view = TestView::new(100.0, 40.0, 2.0);
    let (mut capturer, device) = capturer(&view);
    device.hold_completions.store(true, Ordering::SeqCst);

    let textures: Vec<_> = (0..5).map(|_| capturer.capture_backdrop().unwrap()).collect();
    assert!(textures.iter().all(|t| *t == textures[0]));

    let stats = capturer.stats();
    assert_eq!(stats.uploads, 3);
    assert_eq!(stats.skipped_uploads, 2);
    assert_eq!(capturer.in_flight(), MAX_IN_FLIGHT);

    let staging: BTreeSet<_> = device
        .log
        .lock()
        .unwrap()
        .uploads
        .iter()
        .map(|u| u.staging)
        .collect();
    assert_eq!(staging.len(), MAX_IN_FLIGHT);

    device.complete_all();
    assert_eq!(capturer.in_flight(), 0);

    capturer.capture_backdrop();
    assert_eq!(capturer.stats().uploads, 4);
}

#[test]
fn test_completion_on_another_thread_frees_slot() {
    let view = TestView::new(100.0, 40.0, 1.0);
    let (mut capturer, device) = capturer(&view);
    device.hold_completions.store(true, Ordering::SeqCst);

    for _ in 0..MAX_IN_FLIGHT {
        capturer.capture_backdrop();
    }
    assert_eq!(capturer.in_flight(), MAX_IN_FLIGHT);

    let remote = device.clone();
    std::thread::spawn(move || remote.complete_all())
        .join()
        .unwrap();
    assert_eq!(capturer.in_flight(), 0);
}

#[test]
fn test_detached_or_dropped_source_misses() {
    let view = TestView::new(100.0, 40.0, 1.0);
    let (mut capturer, device) = capturer(&view);

    view.attached.store(false, Ordering::SeqCst);
    assert!(capturer.capture_backdrop().is_none());

    view.attached.store(true, Ordering::SeqCst);
    assert!(capturer.capture_backdrop().is_some());

    drop(view);
    assert!(capturer.capture_backdrop().is_none());
    assert_eq!(capturer.stats().misses, 2);
    assert_eq!(device.log.lock().unwrap().uploads.len(), 1);
}

#[test]
fn test_degenerate_bounds_miss_without_allocating() {
    let view = TestView::new(0.0, 44.0, 3.0);
    let (mut capturer, device) = capturer(&view);

    assert!(capturer.capture_backdrop().is_none());
    assert!(matches!(
        capturer.region(),
        Err(CaptureError::Degenerate { .. })
    ));
    assert_eq!(capturer.stats().allocations, 0);
    assert!(device.texture_sizes().is_empty());
}

#[test]
fn test_allocation_failure_falls_back() {
    let view = TestView::new(100.0, 40.0, 1.0);
    let (mut capturer, device) = capturer(&view);
    let original = capturer.capture_backdrop().unwrap();

    device.fail_allocations.store(true, Ordering::SeqCst);
    view.resize(120.0, 40.0);
    // The last good texture is reused even though the region grew
    assert_eq!(capturer.capture_backdrop(), Some(original.clone()));
    assert_eq!(capturer.buffer_size(), None);
    assert_eq!(capturer.stats().misses, 1);

    view.resize(100.0, 40.0);
    assert_eq!(capturer.capture_backdrop(), Some(original));

    device.fail_allocations.store(false, Ordering::SeqCst);
    let fresh = capturer.capture_backdrop().unwrap();
    assert_eq!(fresh.size, PixelSize::new(100, 40));
    assert_eq!(capturer.stats().allocations, 2);
}

#[test]
fn test_downsample_is_clamped() {
    let view = TestView::new(200.0, 44.0, 3.0);
    let (capturer, _) = capturer(&view);

    let mut capturer = capturer.with_downsample(0.5);
    assert_eq!(
        capturer.capture_backdrop().unwrap().size,
        PixelSize::new(300, 66)
    );

    capturer.set_downsample(0.01);
    assert_eq!(capturer.downsample(), 0.1);
    assert_eq!(
        capturer.capture_backdrop().unwrap().size,
        PixelSize::new(60, 13)
    );
}

#[test]
fn test_source_hidden_only_while_painting() {
    let view = TestView::new(50.0, 20.0, 1.0);
    let (mut capturer, _) = capturer(&view);

    capturer.capture_backdrop();
    assert_eq!(*view.hidden_during_paint.lock().unwrap(), vec![true]);
    assert!(!view.hidden.load(Ordering::SeqCst));

    view.panic_on_paint.store(true, Ordering::SeqCst);
    let result = catch_unwind(AssertUnwindSafe(|| capturer.capture_backdrop()));
    assert!(result.is_err());
    assert!(!view.hidden.load(Ordering::SeqCst));
}

#[test]
fn test_capture_off_owner_thread_panics() {
    let view = TestView::new(50.0, 20.0, 1.0);
    let (mut capturer, _) = capturer(&view);

    let result = std::thread::spawn(move || capturer.capture_backdrop()).join();
    assert!(result.is_err());
}
