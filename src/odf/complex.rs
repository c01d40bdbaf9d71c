use realfft::num_complex::Complex;
use std::f64::consts::PI;

use super::OnsetDetectionFunction;
use crate::config::OdfConfig;
use crate::error::Result;
use crate::fft::SpectralAnalyzer;

/// Complex-domain deviation: each bin's phase is linearly predicted from
/// the previous two frames and its magnitude from the previous frame; the
/// detection value is the summed magnitude of the prediction error.
pub struct ComplexODF {
    config: OdfConfig,
    analyzer: SpectralAnalyzer,
    prev_magnitude: Vec<f64>,
    prev_phase: Vec<f64>,
    prev_prev_phase: Vec<f64>,
}

impl ComplexODF {
    pub fn new(config: OdfConfig) -> Result<Self> {
        OdfConfig::validate_frame_size(config.frame_size)?;
        OdfConfig::validate_hop_size(config.hop_size, config.frame_size)?;
        let analyzer = SpectralAnalyzer::new(config.frame_size)?;
        let num_bins = analyzer.num_bins();
        Ok(Self {
            config,
            analyzer,
            prev_magnitude: vec![0.0; num_bins],
            prev_phase: vec![0.0; num_bins],
            prev_prev_phase: vec![0.0; num_bins],
        })
    }
}

/// Wrap a phase into (-pi, pi], without carrying over the source's
/// iterative wrap loop.
fn wrap_phase(phase: f64) -> f64 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}

impl OnsetDetectionFunction for ComplexODF {
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
        self.prev_magnitude = vec![0.0; num_bins];
        self.prev_phase = vec![0.0; num_bins];
        self.prev_prev_phase = vec![0.0; num_bins];
        self.config.frame_size = frame_size;
        self.config.hop_size = self.config.hop_size.min(frame_size);
        log::debug!("ComplexODF reconfigured to frame_size={frame_size}");
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

            let predicted_phase =
                wrap_phase(2.0 * self.prev_phase[bin] - self.prev_prev_phase[bin]);
            let predicted = Complex::from_polar(self.prev_magnitude[bin], predicted_phase);

            sum += (x - predicted).norm();

            self.prev_prev_phase[bin] = self.prev_phase[bin];
            self.prev_phase[bin] = phase;
            self.prev_magnitude[bin] = magnitude;
        }
        Ok(sum)
    }

    fn reset(&mut self) {
        self.prev_magnitude.iter_mut().for_each(|v| *v = 0.0);
        self.prev_phase.iter_mut().for_each(|v| *v = 0.0);
        self.prev_prev_phase.iter_mut().for_each(|v| *v = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_phase_stays_in_range() {
        assert!((wrap_phase(0.0)).abs() < 1e-12);
        let wrapped = wrap_phase(4.0 * PI + 0.1);
        assert!(wrapped > -PI && wrapped <= PI);
        assert!((wrapped - 0.1).abs() < 1e-9);
    }

    #[test]
    fn steady_tone_settles_to_a_small_value() {
        let frame_size = 64;
        let mut odf = ComplexODF::new(OdfConfig {
            sampling_rate: 44100,
            frame_size,
            hop_size: frame_size,
        })
        .unwrap();

        let signal: Vec<f64> = (0..frame_size * 8)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / 44100.0).sin())
            .collect();
        let values = odf.process(&signal).unwrap();

        assert!(values.last().unwrap() < &values[0]);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let frame_size = 32;
        let mut odf = ComplexODF::new(OdfConfig {
            sampling_rate: 44100,
            frame_size,
            hop_size: frame_size,
        })
        .unwrap();
        let signal: Vec<f64> = (0..frame_size * 2).map(|i| (i as f64 * 0.05).sin()).collect();

        let first = odf.process(&signal).unwrap();
        odf.reset();
        let second = odf.process(&signal).unwrap();
        assert_eq!(first, second);
    }
}
