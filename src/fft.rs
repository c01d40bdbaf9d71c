use realfft::num_complex::Complex;
use realfft::RealFftPlanner;
use std::sync::Arc;

use crate::error::{OnsetError, Result};
use crate::window::hann_window_of;

/// Thin contract over a real-to-complex DFT: `frame_size` real samples in,
/// `frame_size/2 + 1` complex bins out. Owns its plan and scratch buffers;
/// nothing is shared across instances.
pub(crate) struct FftProcessor {
    fft: Arc<dyn realfft::RealToComplex<f64>>,
    input: Vec<f64>,
    output: Vec<Complex<f64>>,
}

impl FftProcessor {
    pub fn new(frame_size: usize) -> Result<Self> {
        if frame_size == 0 {
            return Err(OnsetError::InvalidFrameSize(frame_size));
        }
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let input = fft.make_input_vec();
        let output = fft.make_output_vec();
        Ok(Self { fft, input, output })
    }

    pub fn num_bins(&self) -> usize {
        self.output.len()
    }

    /// `windowed` must already have the window applied; this function is
    /// allowed to, and does, clobber its internal input scratch buffer.
    pub fn process(&mut self, windowed: &[f64]) -> Result<&[Complex<f64>]> {
        self.input.copy_from_slice(windowed);
        self.fft
            .process(&mut self.input, &mut self.output)
            .map_err(|_| OnsetError::FftPlanFailure(self.input.len()))?;
        Ok(&self.output)
    }
}

/// Composes the Hann window and the FFT adapter: copy -> window -> FFT.
/// Rebuilt wholesale whenever `frame_size` changes.
pub(crate) struct SpectralAnalyzer {
    window: Vec<f64>,
    scratch: Vec<f64>,
    fft: FftProcessor,
}

impl SpectralAnalyzer {
    pub fn new(frame_size: usize) -> Result<Self> {
        Ok(Self {
            window: hann_window_of(frame_size),
            scratch: vec![0.0; frame_size],
            fft: FftProcessor::new(frame_size)?,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.fft.num_bins()
    }

    pub fn analyze(&mut self, frame: &[f64]) -> Result<&[Complex<f64>]> {
        if frame.len() != self.scratch.len() {
            return Err(OnsetError::ShortFrame {
                expected: self.scratch.len(),
                actual: frame.len(),
            });
        }
        for ((s, &x), &w) in self.scratch.iter_mut().zip(frame).zip(self.window.iter()) {
            *s = x * w;
        }
        self.fft.process(&self.scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn detects_peak_bin_of_a_pure_tone() {
        let sample_rate = 44100.0;
        let freq = 1000.0;
        let frame_size = 1024;
        let signal: Vec<f64> = (0..frame_size)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect();

        let mut analyzer = SpectralAnalyzer::new(frame_size).unwrap();
        let spectrum = analyzer.analyze(&signal).unwrap();
        assert_eq!(spectrum.len(), frame_size / 2 + 1);

        let (peak_bin, _) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .unwrap();
        let fundamental = sample_rate / frame_size as f64;
        let peak_freq = peak_bin as f64 * fundamental;
        assert!((peak_freq - freq).abs() < fundamental * 2.0);
    }

    #[test]
    fn rejects_zero_frame_size() {
        assert!(SpectralAnalyzer::new(0).is_err());
    }

    #[test]
    fn rejects_mismatched_frame_length() {
        let mut analyzer = SpectralAnalyzer::new(64).unwrap();
        assert!(analyzer.analyze(&[0.0; 32]).is_err());
    }
}
