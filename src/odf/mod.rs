pub mod complex;
pub mod energy;
pub mod lp_complex;
pub mod lp_energy;
pub mod lp_spectral_difference;
pub mod peak_odf;
pub mod spectral_difference;

use crate::config::OdfConfig;
use crate::error::Result;

/// Common contract shared by every onset detection function variant: each
/// owns its configuration, processes one windowed frame at a time, and can
/// be reset to a fresh state without reallocating.
pub trait OnsetDetectionFunction {
    fn config(&self) -> &OdfConfig;

    fn sampling_rate(&self) -> u32 {
        self.config().sampling_rate
    }

    fn frame_size(&self) -> usize {
        self.config().frame_size
    }

    fn hop_size(&self) -> usize {
        self.config().hop_size
    }

    fn set_sampling_rate(&mut self, sampling_rate: u32);

    fn set_frame_size(&mut self, frame_size: usize) -> Result<()>;

    fn set_hop_size(&mut self, hop_size: usize) -> Result<()>;

    /// Compute the detection function's value for one frame of exactly
    /// `frame_size` samples.
    fn process_frame(&mut self, frame: &[f64]) -> Result<f64>;

    /// Run `process_frame` over `signal` in `hop_size` steps, returning one
    /// value per hop, normalized so the largest value is 1 (left all-zero
    /// if every value is zero). The final partial frame, if any, is
    /// dropped.
    fn process(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        let frame_size = self.frame_size();
        let hop_size = self.hop_size();
        if signal.len() < frame_size {
            return Ok(Vec::new());
        }

        let mut values = Vec::with_capacity((signal.len() - frame_size) / hop_size + 1);
        let mut start = 0;
        let mut max = 0.0f64;
        while start + frame_size <= signal.len() {
            let value = self.process_frame(&signal[start..start + frame_size])?;
            if value > max {
                max = value;
            }
            values.push(value);
            start += hop_size;
        }

        if max != 0.0 {
            for value in values.iter_mut() {
                *value /= max;
            }
        }

        Ok(values)
    }

    /// Discard any accumulated history (FFT scratch buffers are kept; only
    /// frame-to-frame state such as previous spectra or LP history resets).
    fn reset(&mut self);
}

/// Implemented by the linear-prediction ODF variants, which carry an
/// autoregressive order distinct from their frame/hop configuration.
pub trait LinearPredictionOrder {
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize) -> Result<()>;
}

/// Implemented by the peak-based ODF variants, which cap how many spectral
/// peaks are tracked per frame.
pub trait PeakCapacity {
    fn max_peaks(&self) -> usize;
    fn set_max_peaks(&mut self, max_peaks: usize) -> Result<()>;
}
