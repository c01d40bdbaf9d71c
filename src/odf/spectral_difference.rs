use super::OnsetDetectionFunction;
use crate::config::OdfConfig;
use crate::error::Result;
use crate::fft::SpectralAnalyzer;

/// Sum of absolute bin-by-bin magnitude changes between consecutive
/// frames. Rises on spectral change in either direction.
pub struct SpectralDifferenceODF {
    config: OdfConfig,
    analyzer: SpectralAnalyzer,
    previous_magnitudes: Vec<f64>,
}

impl SpectralDifferenceODF {
    pub fn new(config: OdfConfig) -> Result<Self> {
        OdfConfig::validate_frame_size(config.frame_size)?;
        OdfConfig::validate_hop_size(config.hop_size, config.frame_size)?;
        let analyzer = SpectralAnalyzer::new(config.frame_size)?;
        let num_bins = analyzer.num_bins();
        Ok(Self {
            config,
            analyzer,
            previous_magnitudes: vec![0.0; num_bins],
        })
    }
}

impl OnsetDetectionFunction for SpectralDifferenceODF {
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
        self.previous_magnitudes = vec![0.0; self.analyzer.num_bins()];
        self.config.frame_size = frame_size;
        self.config.hop_size = self.config.hop_size.min(frame_size);
        log::debug!("SpectralDifferenceODF reconfigured to frame_size={frame_size}");
        Ok(())
    }

    fn set_hop_size(&mut self, hop_size: usize) -> Result<()> {
        OdfConfig::validate_hop_size(hop_size, self.config.frame_size)?;
        self.config.hop_size = hop_size;
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f64]) -> Result<f64> {
        let spectrum = self.analyzer.analyze(frame)?;
        let mut sum = 0.0;
        for (bin, x) in spectrum.iter().enumerate() {
            let magnitude = x.norm();
            sum += (magnitude - self.previous_magnitudes[bin]).abs();
            self.previous_magnitudes[bin] = magnitude;
        }
        Ok(sum)
    }

    fn reset(&mut self) {
        self.previous_magnitudes.iter_mut().for_each(|m| *m = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn silence_then_click_peaks_near_the_onset() {
        let frame_size = 64;
        let mut odf = SpectralDifferenceODF::new(OdfConfig {
            sampling_rate: 44100,
            frame_size,
            hop_size: frame_size,
        })
        .unwrap();

        let mut signal = vec![0.0; frame_size * 6];
        for i in 0..frame_size {
            let t = i as f64 / 44100.0;
            signal[frame_size * 3 + i] = (2.0 * PI * 2000.0 * t).sin();
        }

        let values = odf.process(&signal).unwrap();
        let (loudest, _) = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert!(loudest == 3 || loudest == 4);
    }

    #[test]
    fn reset_clears_previous_magnitudes_so_replay_is_deterministic() {
        let frame_size = 32;
        let mut odf = SpectralDifferenceODF::new(OdfConfig {
            sampling_rate: 44100,
            frame_size,
            hop_size: frame_size,
        })
        .unwrap();
        let signal: Vec<f64> = (0..frame_size * 3)
            .map(|i| ((i as f64) * 0.1).sin())
            .collect();

        let first = odf.process(&signal).unwrap();
        odf.reset();
        let second = odf.process(&signal).unwrap();
        assert_eq!(first, second);
    }
}
