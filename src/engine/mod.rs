mod analysis;
mod playback;

pub use playback::RodioEngineFactory;

use tokio::sync::mpsc;

use crate::error::PlayerError;
use crate::player::Track;
use crate::spectrum::SpectrumSource;

/// Lifecycle events reported by an engine instance.
///
/// Emitted at most once per corresponding action. Engines may emit from any
/// thread; the controller pumps them on the render thread before they touch
/// playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Play,
    Pause,
    Stop,
    /// The track finished playing naturally.
    End,
}

/// The external audio playback subsystem, seen from the core.
///
/// Decode, output and mixing are opaque; the core only drives transport and
/// observes lifecycle events.
pub trait AudioEngine {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// Builds an engine bound to one track, wired to an event channel, together
/// with the spectrum source tapping that engine's output.
///
/// This is the seam the controller is generic over; tests script it.
pub trait EngineFactory {
    type Engine: AudioEngine;

    fn build(
        &self,
        track: &Track,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<(Self::Engine, SpectrumSource), PlayerError>;
}
