//! Effect surface controller
//!
//! [`EffectSurface`] is what a glass-bearing view owns. It tracks the view's
//! lifecycle through the surface state machine, lays out the glass layer in
//! non-animated transactions, paces frames with a [`FrameTicker`], and on each
//! due frame pulls a backdrop texture (fast-path provider first, then the
//! capturer) and hands it to the renderer.
//!
//! Without a GPU the controller still tracks state and layout; only the
//! render calls become no-ops.

use std::sync::Weak;
use std::time::Instant;

use lucent_core::{
    CaptureSettings, CaptureSource, CompositorHost, EffectConfiguration, FrameTicker, LayerChange,
    LayerRole, LayoutTransaction, Rect, StateMachine, SurfaceEvent, SurfaceState,
};
use lucent_gpu::{
    BackdropCapturer, CaptureDevice, FrameOutcome, GlassPipeline, GlassRenderer, GpuContext,
    PresentationSurface, SkipReason, WgpuCaptureDevice,
};

use crate::provider::BackdropProvider;

/// Scale changes smaller than this are ignored
const SCALE_EPSILON: f32 = 1e-4;

/// The controller as hosts use it, backed by wgpu
pub type WgpuEffectSurface<S> = EffectSurface<S, WgpuCaptureDevice, GlassPipeline>;

type Provider<T> = Box<dyn BackdropProvider<Texture = T>>;

struct GpuParts<S: CaptureSource + ?Sized, D: CaptureDevice, R> {
    capturer: BackdropCapturer<S, D>,
    renderer: R,
}

/// Lifecycle, layout and frame pacing for one glass view
pub struct EffectSurface<S, D, R>
where
    S: CaptureSource + ?Sized,
    D: CaptureDevice,
    R: GlassRenderer<Texture = D::Texture>,
{
    /// `None` when the GPU path is unavailable
    gpu: Option<GpuParts<S, D, R>>,
    surface: Box<dyn PresentationSurface>,
    host: Box<dyn CompositorHost>,
    provider: Option<Provider<D::Texture>>,
    state: StateMachine<SurfaceState, SurfaceEvent>,
    /// A start requested while detached, applied on attach
    pending_start: bool,
    needs_redraw: bool,
    ticker: FrameTicker,
    config: EffectConfiguration,
    mutations: u64,
    bounds: Rect,
    scale: f32,
}

impl<S, D, R> EffectSurface<S, D, R>
where
    S: CaptureSource + ?Sized,
    D: CaptureDevice,
    R: GlassRenderer<Texture = D::Texture>,
{
    pub fn new(
        capturer: BackdropCapturer<S, D>,
        renderer: R,
        surface: Box<dyn PresentationSurface>,
        host: Box<dyn CompositorHost>,
    ) -> Self {
        Self::build(Some(GpuParts { capturer, renderer }), surface, host)
    }

    /// A controller with no GPU path. State and layout work as usual;
    /// rendering reports [`SkipReason::Disabled`].
    pub fn disabled(surface: Box<dyn PresentationSurface>, host: Box<dyn CompositorHost>) -> Self {
        Self::build(None, surface, host)
    }

    fn build(
        mut gpu: Option<GpuParts<S, D, R>>,
        surface: Box<dyn PresentationSurface>,
        host: Box<dyn CompositorHost>,
    ) -> Self {
        let config = EffectConfiguration::default();
        let scale = 1.0;
        if let Some(gpu) = gpu.as_mut() {
            gpu.renderer.update_configuration(&config, scale);
        }
        Self {
            gpu,
            surface,
            host,
            provider: None,
            state: StateMachine::surface(),
            pending_start: false,
            needs_redraw: false,
            ticker: FrameTicker::default(),
            config,
            mutations: 0,
            bounds: Rect::ZERO,
            scale,
        }
    }

    pub fn with_settings(mut self, settings: &CaptureSettings) -> Self {
        self.apply_settings(settings);
        self
    }

    /// Apply capture downsample and frame rate
    pub fn apply_settings(&mut self, settings: &CaptureSettings) {
        self.ticker.set_target_fps(settings.target_fps);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.capturer.set_downsample(settings.downsample());
        }
    }

    /// Install (or remove) the zero-copy backdrop fast path
    pub fn set_backdrop_provider(&mut self, provider: Option<Provider<D::Texture>>) {
        self.provider = provider;
        self.request_redraw();
    }

    pub fn state(&self) -> SurfaceState {
        self.state.current_state()
    }

    pub fn is_attached(&self) -> bool {
        !self.state.is_in(SurfaceState::Detached)
    }

    pub fn is_active(&self) -> bool {
        self.state.is_in(SurfaceState::Active)
    }

    /// Whether the GPU path is available
    pub fn is_enabled(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn configuration(&self) -> &EffectConfiguration {
        &self.config
    }

    /// Number of configuration updates that changed something
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale
    }

    pub fn target_fps(&self) -> u32 {
        self.ticker.target_fps()
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn capturer(&self) -> Option<&BackdropCapturer<S, D>> {
        self.gpu.as_ref().map(|gpu| &gpu.capturer)
    }

    pub fn renderer(&self) -> Option<&R> {
        self.gpu.as_ref().map(|gpu| &gpu.renderer)
    }

    pub fn surface(&self) -> &dyn PresentationSurface {
        self.surface.as_ref()
    }

    pub fn host(&self) -> &dyn CompositorHost {
        self.host.as_ref()
    }

    /// The view entered a displayed hierarchy
    pub fn attach(&mut self) {
        if !self.transition(SurfaceEvent::Attach) {
            return;
        }
        self.needs_redraw = true;
        if std::mem::take(&mut self.pending_start) {
            self.start_rendering();
        }
    }

    /// The view left its hierarchy. Rendering stops; an active surface
    /// resumes on the next attach.
    pub fn detach(&mut self) {
        let was_active = self.is_active();
        if self.transition(SurfaceEvent::Detach) {
            self.ticker.stop();
            self.pending_start = was_active;
        }
    }

    /// Redraw on every frame tick. Deferred until attach when detached.
    pub fn start_rendering(&mut self) {
        match self.state() {
            SurfaceState::Detached => {
                tracing::debug!("start requested while detached, deferring");
                self.pending_start = true;
            }
            SurfaceState::Idle => {
                self.transition(SurfaceEvent::Start);
                self.ticker.start();
                self.needs_redraw = true;
            }
            SurfaceState::Active => {}
        }
    }

    /// Stop redrawing. Takes effect immediately and drops any pending redraw
    /// request; submitted GPU work is not awaited.
    pub fn stop_rendering(&mut self) {
        self.pending_start = false;
        self.needs_redraw = false;
        if self.transition(SurfaceEvent::Stop) {
            self.ticker.stop();
        }
    }

    pub fn set_active(&mut self, active: bool) {
        if active {
            self.start_rendering();
        } else {
            self.stop_rendering();
        }
    }

    /// Mark the glass stale; an idle surface redraws on the next frame
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Per-frame callback from the host.
    ///
    /// Active surfaces render when the target frame interval has elapsed;
    /// idle ones only when a redraw was requested. Returns `None` when
    /// nothing was attempted.
    pub fn on_frame(&mut self, now: Instant) -> Option<FrameOutcome> {
        match self.state() {
            SurfaceState::Active => {
                if !self.ticker.tick(now) {
                    return None;
                }
            }
            SurfaceState::Idle if self.needs_redraw => self.ticker.mark_rendered(now),
            _ => return None,
        }
        Some(self.render_now())
    }

    /// Capture and render one frame immediately, whatever the state
    pub fn render_now(&mut self) -> FrameOutcome {
        let Some(gpu) = self.gpu.as_mut() else {
            return FrameOutcome::Skipped(SkipReason::Disabled);
        };
        let backdrop = next_backdrop(&mut gpu.capturer, &mut self.provider);
        let outcome = gpu.renderer.render(self.surface.as_mut(), backdrop.as_ref());
        if outcome.is_rendered() {
            self.needs_redraw = false;
        }
        tracing::trace!("effect surface frame: {:?}", outcome);
        outcome
    }

    /// Lay out the glass layer for new view bounds
    pub fn layout(&mut self, bounds: Rect) {
        self.layout_with(bounds, std::iter::empty());
    }

    /// Lay out the glass layer plus `extra` changes in the same transaction
    pub fn layout_with(&mut self, bounds: Rect, extra: impl IntoIterator<Item = LayerChange>) {
        self.bounds = bounds;
        let size = bounds.size.to_pixels(self.scale);

        let mut transaction = LayoutTransaction::begin(self.host.as_ref());
        transaction
            .push(LayerChange::Frame {
                layer: LayerRole::Glass,
                frame: bounds.size.to_rect(),
            })
            .push(LayerChange::DrawableSize {
                layer: LayerRole::Glass,
                size,
            });
        for change in extra {
            transaction.push(change);
        }
        transaction.commit();

        if self.surface.size() != size {
            tracing::debug!("resizing glass drawable to {}", size);
            self.surface.resize(size);
        }
        self.request_redraw();
    }

    /// Replace the configuration. Returns whether anything changed.
    pub fn update_configuration(&mut self, config: EffectConfiguration) -> bool {
        let config = config.sanitized();
        if config == self.config {
            return false;
        }
        self.config = config;
        self.mutations += 1;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.renderer.update_configuration(&self.config, self.scale);
        }
        self.request_redraw();
        true
    }

    /// Display density changed (moved to another screen)
    pub fn set_scale_factor(&mut self, scale: f32) {
        if !(scale.is_finite() && scale > 0.0) || (scale - self.scale).abs() < SCALE_EPSILON {
            return;
        }
        self.scale = scale;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.renderer.update_configuration(&self.config, scale);
        }
        self.layout(self.bounds);
    }

    fn transition(&mut self, event: SurfaceEvent) -> bool {
        if !self.state.can_send(event) {
            tracing::trace!("ignoring {:?} in {:?}", event, self.state.current_state());
            return false;
        }
        self.state.send(event);
        true
    }
}

impl<S: CaptureSource + ?Sized> EffectSurface<S, WgpuCaptureDevice, GlassPipeline> {
    /// Build the wgpu-backed controller for `source`.
    ///
    /// A pipeline that fails to build yields a disabled controller.
    pub fn with_gpu(
        gpu: &GpuContext,
        source: Weak<S>,
        surface: Box<dyn PresentationSurface>,
        host: Box<dyn CompositorHost>,
        settings: &CaptureSettings,
    ) -> Self {
        let scale = source.upgrade().map_or(1.0, |view| view.scale_factor());
        let controller = match GlassPipeline::new(gpu) {
            Ok(pipeline) => {
                let capturer = BackdropCapturer::new(source, WgpuCaptureDevice::new(gpu));
                Self::new(capturer, pipeline, surface, host)
            }
            Err(err) => {
                tracing::warn!("glass rendering unavailable: {}", err);
                Self::disabled(surface, host)
            }
        };
        let mut controller = controller.with_settings(settings);
        controller.set_scale_factor(scale);
        controller
    }
}

fn next_backdrop<S, D>(
    capturer: &mut BackdropCapturer<S, D>,
    provider: &mut Option<Provider<D::Texture>>,
) -> Option<D::Texture>
where
    S: CaptureSource + ?Sized,
    D: CaptureDevice,
{
    if let Some(provider) = provider {
        if let Ok(region) = capturer.region() {
            if let Some(texture) = provider.backdrop(&region) {
                return Some(texture);
            }
        }
        tracing::trace!("backdrop provider declined, capturing");
    }
    capturer.capture_backdrop()
}
