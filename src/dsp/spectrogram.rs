use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Canonical sample rate. Everything past the resampler assumes this.
pub const SAMPLE_RATE: u32 = 11_200;
pub const WINDOW_SIZE: usize = 2048;
/// 50% overlap between successive windows.
pub const HOP_SIZE: usize = WINDOW_SIZE / 2;
/// Magnitudes are kept up to Nyquist only.
pub const BIN_COUNT: usize = WINDOW_SIZE / 2;

/// Width of one DFT bin in Hz.
pub const BIN_SIZE: f64 = SAMPLE_RATE as f64 / WINDOW_SIZE as f64;

/// One windowed DFT over `WINDOW_SIZE` samples.
pub struct Frame {
    /// Start of the window in seconds.
    pub time_offset: f64,
    /// `|X[k]|` for `k < BIN_COUNT`, in bin order.
    pub magnitudes: Vec<f32>,
}

/// Frequency of bin `k` in Hz.
pub fn bin_frequency(bin: usize) -> f64 {
    bin as f64 * BIN_SIZE
}

fn hamming_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / (n - 1) as f32).cos())
        .collect()
}

/// Lazy STFT over a sample buffer at the canonical rate. Windows that would
/// run past the end of the buffer are discarded.
pub struct Spectrogram<'a> {
    samples: &'a [f32],
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    position: usize,
}

impl<'a> Spectrogram<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            samples,
            window: hamming_window(WINDOW_SIZE),
            fft: planner.plan_fft_forward(WINDOW_SIZE),
            position: 0,
        }
    }
}

impl Iterator for Spectrogram<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.position + WINDOW_SIZE > self.samples.len() {
            return None;
        }
        let chunk = &self.samples[self.position..self.position + WINDOW_SIZE];

        let mut buffer: Vec<Complex<f32>> = chunk
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let magnitudes = buffer[..BIN_COUNT].iter().map(|c| c.norm()).collect();
        let time_offset = self.position as f64 / SAMPLE_RATE as f64;
        self.position += HOP_SIZE;

        Some(Frame {
            time_offset,
            magnitudes,
        })
    }
}
