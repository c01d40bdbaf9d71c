use realfft::num_complex::Complex;
use std::f64::consts::PI;

use super::{LinearPredictionOrder, OnsetDetectionFunction};
use crate::config::OdfConfig;
use crate::error::{OnsetError, Result};
use crate::fft::SpectralAnalyzer;
use crate::linear_prediction::{burg, linear_prediction, SlidingHistory};

/// Complex-domain deviation with a Burg-predicted magnitude per bin in
/// place of [`crate::odf::complex::ComplexODF`]'s "same as last frame"
/// magnitude estimate. Phase is still linearly predicted from the last
/// two frames.
pub struct LPComplexODF {
    config: OdfConfig,
    order: usize,
    analyzer: SpectralAnalyzer,
    magnitude_histories: Vec<SlidingHistory>,
    coefs: Vec<f64>,
    prev_phase: Vec<f64>,
    prev_prev_phase: Vec<f64>,
}

impl LPComplexODF {
    pub fn new(config: OdfConfig, order: usize) -> Result<Self> {
        OdfConfig::validate_frame_size(config.frame_size)?;
        OdfConfig::validate_hop_size(config.hop_size, config.frame_size)?;
        if order == 0 {
            return Err(OnsetError::InvalidOrder(order));
        }
        let analyzer = SpectralAnalyzer::new(config.frame_size)?;
        let num_bins = analyzer.num_bins();
        Ok(Self {
            config,
            order,
            analyzer,
            magnitude_histories: (0..num_bins).map(|_| SlidingHistory::new(order)).collect(),
            coefs: vec![0.0; order],
            prev_phase: vec![0.0; num_bins],
            prev_prev_phase: vec![0.0; num_bins],
        })
    }
}

fn wrap_phase(phase: f64) -> f64 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}

impl OnsetDetectionFunction for LPComplexODF {
    fn config(&self) -> &OdfConfig {
        &self.config
    }

    fn set_sampling_rate(&mut self, sampling_rate: u32) {
        self.config.sampling_rate = sampling_rate;
    }

    fn set_frame_size(&mut self, frame_size: usize) -> Result<()> {
        OdfConfig::validate_frame_size(frame_size)?;
        OdfConfig::validate_hop_size(self.config.hop_size.min(frame_size), frame_size)?;
        self.analyzer = SpectralAnalyzer::new(frame_size)?;
        let num_bins = self.analyzer.num_bins();
        self.magnitude_histories =
            (0..num_bins).map(|_| SlidingHistory::new(self.order)).collect();
        self.prev_phase = vec![0.0; num_bins];
        self.prev_prev_phase = vec![0.0; num_bins];
        self.config.frame_size = frame_size;
        self.config.hop_size = self.config.hop_size.min(frame_size);
        log::debug!("LPComplexODF reconfigured to frame_size={frame_size}");
        Ok(())
    }

    fn set_hop_size(&mut self, hop_size: usize) -> Result<()> {
        OdfConfig::validate_hop_size(hop_size, self.config.frame_size)?;
        self.config.hop_size = hop_size;
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f64]) -> Result<f64> {
        let spectrum = self.analyzer.analyze(frame)?.to_vec();

        let mut sum = 0.0;
        for (bin, x) in spectrum.iter().enumerate() {
            let magnitude = x.norm();
            let phase = x.arg();
            let history = &mut self.magnitude_histories[bin];

            burg(history.as_slice(), self.order, &mut self.coefs);
            let predicted_magnitude = linear_prediction(history.as_slice(), &self.coefs, 1)[0];

            let predicted_phase =
                wrap_phase(2.0 * self.prev_phase[bin] - self.prev_prev_phase[bin]);
            let predicted = Complex::from_polar(predicted_magnitude, predicted_phase);

            sum += (x - predicted).norm();

            history.push(magnitude);
            self.prev_prev_phase[bin] = self.prev_phase[bin];
            self.prev_phase[bin] = phase;
        }
        Ok(sum)
    }

    fn reset(&mut self) {
        self.magnitude_histories.iter_mut().for_each(SlidingHistory::reset);
        self.prev_phase.iter_mut().for_each(|v| *v = 0.0);
        self.prev_prev_phase.iter_mut().for_each(|v| *v = 0.0);
    }
}

impl LinearPredictionOrder for LPComplexODF {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) -> Result<()> {
        if order == 0 {
            return Err(OnsetError::InvalidOrder(order));
        }
        self.order = order;
        let num_bins = self.analyzer.num_bins();
        self.magnitude_histories = (0..num_bins).map(|_| SlidingHistory::new(order)).collect();
        self.coefs = vec![0.0; order];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_makes_replay_deterministic() {
        let frame_size = 32;
        let mut odf = LPComplexODF::new(
            OdfConfig {
                sampling_rate: 44100,
                frame_size,
                hop_size: frame_size,
            },
            3,
        )
        .unwrap();
        let signal: Vec<f64> = (0..frame_size * 3).map(|i| (i as f64 * 0.05).sin()).collect();

        let first = odf.process(&signal).unwrap();
        odf.reset();
        let second = odf.process(&signal).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_zero_order() {
        let config = OdfConfig {
            sampling_rate: 44100,
            frame_size: 16,
            hop_size: 16,
        };
        assert!(LPComplexODF::new(config, 0).is_err());
    }
}
