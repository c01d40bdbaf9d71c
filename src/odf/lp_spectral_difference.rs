use super::{LinearPredictionOrder, OnsetDetectionFunction};
use crate::config::OdfConfig;
use crate::error::{OnsetError, Result};
use crate::fft::SpectralAnalyzer;
use crate::linear_prediction::{burg, linear_prediction, SlidingHistory};

/// Spectral difference with each bin's magnitude predicted by its own
/// Burg model over the last `order` frames, instead of compared to only
/// the immediately previous frame.
pub struct LPSpectralDifferenceODF {
    config: OdfConfig,
    order: usize,
    analyzer: SpectralAnalyzer,
    histories: Vec<SlidingHistory>,
    coefs: Vec<f64>,
}

impl LPSpectralDifferenceODF {
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
            histories: (0..num_bins).map(|_| SlidingHistory::new(order)).collect(),
            coefs: vec![0.0; order],
        })
    }
}

impl OnsetDetectionFunction for LPSpectralDifferenceODF {
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
        self.histories = (0..num_bins).map(|_| SlidingHistory::new(self.order)).collect();
        self.config.frame_size = frame_size;
        self.config.hop_size = self.config.hop_size.min(frame_size);
        log::debug!("LPSpectralDifferenceODF reconfigured to frame_size={frame_size}");
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
            let history = &mut self.histories[bin];

            burg(history.as_slice(), self.order, &mut self.coefs);
            let predicted = linear_prediction(history.as_slice(), &self.coefs, 1)[0];

            let diff = magnitude - predicted;
            if diff > 0.0 {
                sum += diff;
            }
            history.push(magnitude);
        }
        Ok(sum)
    }

    fn reset(&mut self) {
        self.histories.iter_mut().for_each(SlidingHistory::reset);
    }
}

impl LinearPredictionOrder for LPSpectralDifferenceODF {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) -> Result<()> {
        if order == 0 {
            return Err(OnsetError::InvalidOrder(order));
        }
        self.order = order;
        let num_bins = self.analyzer.num_bins();
        self.histories = (0..num_bins).map(|_| SlidingHistory::new(order)).collect();
        self.coefs = vec![0.0; order];
        Ok(())
    }
}
