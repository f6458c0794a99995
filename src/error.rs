use thiserror::Error;

/// Errors surfaced by the playback core.
///
/// None of these are fatal to the host: an engine that fails to build leaves
/// the controller in `Idle`, and a retry is a fresh `assign_track`.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The playback engine could not be constructed for a track (unreadable
    /// file, unsupported codec, ...).
    #[error("failed to build playback engine for {track}: {reason}")]
    EngineConstruction { track: String, reason: String },

    /// No usable audio output device.
    #[error("audio output unavailable: {0}")]
    OutputDevice(String),
}

impl PlayerError {
    pub fn engine_construction(track: &str, reason: impl ToString) -> Self {
        Self::EngineConstruction {
            track: track.to_string(),
            reason: reason.to_string(),
        }
    }
}
