use anyhow::{anyhow, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::analysis::SpectrumAnalyzer;
use super::{AudioEngine, EngineEvent, EngineFactory};
use crate::config::AudioConfig;
use crate::error::PlayerError;
use crate::player::Track;
use crate::spectrum::{self, SpectrumSource};

/// Fully decoded track audio: mono samples, ready for both the sink and the
/// analysis window reads.
struct Pcm {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// State shared between the sink's tap source, the analysis thread and the
/// engine's transport methods.
struct EngineShared {
    /// Samples handed to the output so far; the analysis window trails this.
    playhead: AtomicUsize,
    playing: AtomicBool,
    ended: AtomicBool,
}

impl EngineShared {
    fn new() -> Self {
        Self {
            playhead: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        }
    }

    fn rewind(&self) {
        self.playhead.store(0, Ordering::SeqCst);
        self.ended.store(false, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }
}

/// Source wrapper that tracks the playhead as rodio pulls samples and fires
/// `End` exactly once when the track drains naturally.
struct TapSource {
    pcm: Arc<Pcm>,
    pos: usize,
    shared: Arc<EngineShared>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl TapSource {
    fn new(
        pcm: Arc<Pcm>,
        shared: Arc<EngineShared>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            pcm,
            pos: 0,
            shared,
            events,
        }
    }
}

impl Iterator for TapSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        match self.pcm.samples.get(self.pos) {
            Some(&sample) => {
                self.pos += 1;
                self.shared.playhead.store(self.pos, Ordering::Relaxed);
                Some(sample)
            }
            None => {
                if !self.shared.ended.swap(true, Ordering::SeqCst) {
                    self.shared.playing.store(false, Ordering::SeqCst);
                    let _ = self.events.send(EngineEvent::End);
                }
                None
            }
        }
    }
}

impl Source for TapSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.pcm.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.pcm.samples.len() as f64 / f64::from(self.pcm.sample_rate),
        ))
    }
}

/// Playback engine backed by rodio, bound to exactly one track.
///
/// The whole track is decoded up front; playback goes through a `Sink` while
/// an analysis thread windows the same PCM at the playhead and publishes
/// spectrum snapshots.
pub struct RodioEngine {
    shared: Arc<EngineShared>,
    pcm: Arc<Pcm>,
    sink: Sink,
    events: mpsc::UnboundedSender<EngineEvent>,
    stop_flag: Arc<AtomicBool>,
    // Keep the output stream alive for the sink's lifetime.
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    _analysis_thread: thread::JoinHandle<()>,
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl AudioEngine for RodioEngine {
    fn play(&mut self) {
        if self.shared.ended.swap(false, Ordering::SeqCst) {
            // Fresh play of an ended track restarts from the beginning.
            self.shared.playhead.store(0, Ordering::SeqCst);
            self.sink.append(TapSource::new(
                self.pcm.clone(),
                self.shared.clone(),
                self.events.clone(),
            ));
        }
        if self.shared.playing.load(Ordering::SeqCst) {
            return;
        }
        self.sink.play();
        self.shared.playing.store(true, Ordering::SeqCst);
        let _ = self.events.send(EngineEvent::Play);
    }

    fn pause(&mut self) {
        if !self.shared.playing.load(Ordering::SeqCst) {
            return;
        }
        self.sink.pause();
        self.shared.playing.store(false, Ordering::SeqCst);
        let _ = self.events.send(EngineEvent::Pause);
    }

    fn stop(&mut self) {
        // Clear pauses the sink and drops the queued source, so the old tap
        // can never fire a late End.
        self.sink.clear();
        self.shared.rewind();
        self.sink.append(TapSource::new(
            self.pcm.clone(),
            self.shared.clone(),
            self.events.clone(),
        ));
        let _ = self.events.send(EngineEvent::Stop);
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::SeqCst)
    }
}

/// Builds `RodioEngine` instances from the audio configuration.
pub struct RodioEngineFactory {
    fft_size: usize,
    gain: f32,
    publish_interval: Duration,
}

impl RodioEngineFactory {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            fft_size: config.fft_size,
            gain: config.gain,
            publish_interval: Duration::from_millis(config.publish_interval_ms),
        }
    }
}

impl EngineFactory for RodioEngineFactory {
    type Engine = RodioEngine;

    fn build(
        &self,
        track: &Track,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<(RodioEngine, SpectrumSource), PlayerError> {
        let pcm = Arc::new(
            decode_track(Path::new(track.url()))
                .map_err(|e| PlayerError::engine_construction(track.url(), e))?,
        );
        info!(
            track = track.url(),
            samples = pcm.samples.len(),
            sample_rate = pcm.sample_rate,
            "decoded track"
        );

        let (stream, handle) =
            OutputStream::try_default().map_err(|e| PlayerError::OutputDevice(e.to_string()))?;
        let sink =
            Sink::try_new(&handle).map_err(|e| PlayerError::OutputDevice(e.to_string()))?;
        sink.pause();

        let shared = Arc::new(EngineShared::new());
        sink.append(TapSource::new(pcm.clone(), shared.clone(), events.clone()));

        let analyzer = SpectrumAnalyzer::new(self.fft_size, self.gain);
        let (publisher, source) = spectrum::channel(analyzer.bin_count());

        let stop_flag = Arc::new(AtomicBool::new(false));
        let analysis_thread = {
            let pcm = pcm.clone();
            let shared = shared.clone();
            let stop_flag = stop_flag.clone();
            let interval = self.publish_interval;
            let fft_size = self.fft_size;
            thread::spawn(move || {
                let mut analyzer = analyzer;
                loop {
                    if stop_flag.load(Ordering::Relaxed) {
                        debug!("stop flag set, ending analysis loop");
                        break;
                    }
                    if shared.playing.load(Ordering::Relaxed) {
                        let end = shared.playhead.load(Ordering::Relaxed).min(pcm.samples.len());
                        let start = end.saturating_sub(fft_size);
                        publisher.publish(analyzer.process(&pcm.samples[start..end]));
                    }
                    thread::sleep(interval);
                }
            })
        };

        Ok((
            RodioEngine {
                shared,
                pcm,
                sink,
                events,
                stop_flag,
                _stream: stream,
                _handle: handle,
                _analysis_thread: analysis_thread,
            },
            source,
        ))
    }
}

fn decode_track(path: &Path) -> Result<Pcm> {
    let file = File::open(path).map_err(|e| anyhow!("cannot open {}: {}", path.display(), e))?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| anyhow!("cannot decode {}: {}", path.display(), e))?;

    let channels = decoder.channels() as usize;
    let sample_rate = decoder.sample_rate();
    let interleaved: Vec<f32> = decoder.convert_samples().collect();
    if interleaved.is_empty() {
        warn!(track = %path.display(), "decoded zero samples");
    }

    Ok(Pcm {
        samples: downmix_to_mono(&interleaved, channels),
        sample_rate,
    })
}

fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
