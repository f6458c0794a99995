use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{AudioEngine, EngineEvent, EngineFactory};
use crate::error::PlayerError;
use crate::spectrum::SpectrumSource;
use crate::surface::RenderSurface;
use crate::viz::VisualizationLoop;

/// Playback lifecycle states. Exactly one controller owns this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
    Ended,
}

/// A playable track, identified by its source URL. Immutable once assigned;
/// switching tracks replaces the whole engine binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    url: String,
}

impl Track {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Human-readable name for list display: the file stem when the URL
    /// looks like a path, otherwise the URL itself.
    pub fn display_name(&self) -> &str {
        Path::new(&self.url)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.url)
    }
}

/// Notifications from the controller to the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The current track completed naturally.
    TrackFinished,
    /// Playback engine construction failed; the controller stayed `Idle`.
    Error(String),
}

/// Owns the current track, the engine instance, the render surface and the
/// visualization loop, and keeps them consistent across user intent and
/// asynchronous engine events.
///
/// Engine events arrive on a per-engine channel and are only applied by
/// `pump_events` on the render thread, so transitions and ticks never race.
/// Replacing the engine replaces the channel and the spectrum source, which
/// is what discards late events and late snapshots from a previous track.
pub struct PlaybackController<F: EngineFactory, S: RenderSurface> {
    factory: F,
    surface: S,
    viz: VisualizationLoop,
    state: PlaybackState,
    track: Option<Track>,
    engine: Option<F::Engine>,
    source: Option<SpectrumSource>,
    engine_rx: Option<mpsc::UnboundedReceiver<EngineEvent>>,
    host_tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl<F: EngineFactory, S: RenderSurface> PlaybackController<F, S> {
    pub fn new(
        factory: F,
        surface: S,
        viz: VisualizationLoop,
        host_tx: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            factory,
            surface,
            viz,
            state: PlaybackState::Idle,
            track: None,
            engine: None,
            source: None,
            engine_rx: None,
            host_tx,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Tear down the current engine binding and rebuild against a new track.
    ///
    /// Always lands in `Idle`. On engine construction failure the controller
    /// keeps no engine, reports the error to the host, and stays recoverable
    /// through another `assign_track` or `request_play` of a later track.
    pub fn assign_track(&mut self, url: &str) {
        self.viz.stop();
        self.engine = None;
        self.source = None;
        self.engine_rx = None;
        self.state = PlaybackState::Idle;

        let track = Track::new(url);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        match self.factory.build(&track, events_tx) {
            Ok((engine, source)) => {
                info!(track = track.url(), "engine bound to track");
                self.engine = Some(engine);
                self.source = Some(source);
                self.engine_rx = Some(events_rx);
            }
            Err(e) => {
                warn!(track = track.url(), error = %e, "engine construction failed");
                self.emit(PlayerEvent::Error(e.to_string()));
            }
        }
        self.track = Some(track);
    }

    /// User intent: start or resume playback. No-op while already `Playing`
    /// or without a bound engine.
    pub fn request_play(&mut self) {
        if self.state == PlaybackState::Playing {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            debug!("play requested with no engine bound");
            return;
        };
        engine.play();
        self.enter_playing();
    }

    /// User intent: pause. Defined from `Playing` only; leaves the last
    /// frame on the surface.
    pub fn request_pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.pause();
        }
        self.state = PlaybackState::Paused;
        self.viz.stop();
    }

    /// Toggle between play and pause.
    pub fn request_toggle(&mut self) {
        if self.state == PlaybackState::Playing {
            self.request_pause();
        } else {
            self.request_play();
        }
    }

    /// Drain engine events and apply them as state transitions. Called from
    /// the host's frame loop, which marshals engine callbacks onto the same
    /// execution context as render ticks.
    pub fn pump_events(&mut self) {
        let mut drained = Vec::new();
        if let Some(rx) = self.engine_rx.as_mut() {
            while let Ok(event) = rx.try_recv() {
                drained.push(event);
            }
        }
        for event in drained {
            self.apply_engine_event(event);
        }
    }

    /// Render one visualization frame if the loop is active.
    pub fn tick(&mut self) {
        self.viz.tick(&mut self.surface);
    }

    fn apply_engine_event(&mut self, event: EngineEvent) {
        debug!(?event, state = ?self.state, "engine event");
        match event {
            EngineEvent::Play => {
                // Engine-initiated resume; already-playing is a no-op.
                if self.state != PlaybackState::Playing && self.engine.is_some() {
                    self.enter_playing();
                }
            }
            EngineEvent::Pause => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                    self.viz.stop();
                }
            }
            EngineEvent::Stop => {
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                    self.state = PlaybackState::Stopped;
                    self.viz.stop();
                }
            }
            EngineEvent::End => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Ended;
                    self.viz.stop_and_clear(&mut self.surface);
                    self.emit(PlayerEvent::TrackFinished);
                }
            }
        }
    }

    fn enter_playing(&mut self) {
        self.state = PlaybackState::Playing;
        if let Some(source) = &self.source {
            self.viz.start(source.clone());
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // A dropped host receiver just means the page is going away.
        let _ = self.host_tx.send(event);
    }
}
