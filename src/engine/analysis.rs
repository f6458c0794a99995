use rustfft::{num_complex::Complex, FftPlanner};

use crate::spectrum::SpectrumSnapshot;

/// Turns a window of mono samples into per-bin byte magnitudes.
///
/// The window size fixes the spectral resolution vs. responsiveness trade-off
/// and therefore the snapshot length (`fft_size / 2` positive-frequency
/// bins), which stays constant for the analyzer's lifetime.
pub struct SpectrumAnalyzer {
    fft_size: usize,
    gain: f32,
    planner: FftPlanner<f32>,
    buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, gain: f32) -> Self {
        let planner = FftPlanner::new();

        // Hann window for smoother frequency response
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (fft_size - 1) as f32).cos())
            })
            .collect();

        Self {
            fft_size,
            gain,
            planner,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            window,
        }
    }

    /// Number of frequency bins per snapshot.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyze one window of samples. Shorter inputs are zero-padded.
    pub fn process(&mut self, samples: &[f32]) -> SpectrumSnapshot {
        for i in 0..self.fft_size {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            self.buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }

        let fft = self.planner.plan_fft_forward(self.fft_size);
        fft.process(&mut self.buffer);

        // Positive frequencies only; normalize magnitudes to amplitude and
        // clamp into the byte range the renderer expects.
        let scale = 2.0 / self.fft_size as f32;
        let bins = (0..self.bin_count())
            .map(|bin| {
                let amplitude = self.buffer[bin].norm() * scale * self.gain;
                (amplitude.clamp(0.0, 1.0) * 255.0) as u8
            })
            .collect();

        SpectrumSnapshot::from_bins(bins)
    }
}
