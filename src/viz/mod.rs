use tracing::{debug, trace};

use crate::render::BarRenderer;
use crate::spectrum::SpectrumSource;
use crate::surface::RenderSurface;

/// Frame-synchronized scheduler for the bar visualization.
///
/// The host's frame loop calls `tick` once per display refresh; whether that
/// tick renders is decided here, by reading the active flag fresh on every
/// call. A loop that has been stopped therefore cannot draw one more stale
/// frame, even if a tick was already queued when `stop` was called.
///
/// `start` does not render synchronously; the first frame appears on the
/// first tick after it.
pub struct VisualizationLoop {
    renderer: BarRenderer,
    source: Option<SpectrumSource>,
    active: bool,
}

impl VisualizationLoop {
    pub fn new(renderer: BarRenderer) -> Self {
        Self {
            renderer,
            source: None,
            active: false,
        }
    }

    /// Activate the loop against a spectrum source.
    ///
    /// Idempotent-guarded: starting while already active keeps the existing
    /// binding and does not create a second tick chain.
    pub fn start(&mut self, source: SpectrumSource) {
        if self.active {
            trace!("visualization loop already active, ignoring start");
            return;
        }
        debug!(bins = source.bin_count(), "starting visualization loop");
        self.source = Some(source);
        self.active = true;
    }

    /// Deactivate and unbind the source. Safe to call redundantly; after it
    /// returns no further ticks render.
    pub fn stop(&mut self) {
        if self.active {
            debug!("stopping visualization loop");
        }
        self.active = false;
        self.source = None;
    }

    /// Stop and leave a blank frame instead of a frozen last one.
    /// Used on terminal playback events (track end).
    pub fn stop_and_clear(&mut self, surface: &mut impl RenderSurface) {
        self.stop();
        surface.clear_region(0.0, 0.0, surface.width(), surface.height());
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Render one frame from a freshly pulled snapshot, if active.
    pub fn tick(&mut self, surface: &mut impl RenderSurface) {
        if !self.active {
            return;
        }
        let Some(source) = &self.source else {
            return;
        };
        let snapshot = source.snapshot();
        self.renderer.render(surface, &snapshot);
    }
}
