use super::{LinearPredictionOrder, OnsetDetectionFunction};
use crate::config::OdfConfig;
use crate::error::{OnsetError, Result};
use crate::linear_prediction::{burg, linear_prediction, SlidingHistory};

/// Energy detection with a linear-prediction twist: instead of reacting to
/// the raw energy, this predicts the next frame's energy from the last
/// `order` frames via Burg's method and reports the prediction error.
#[derive(Debug)]
pub struct LPEnergyODF {
    config: OdfConfig,
    order: usize,
    window: Vec<f64>,
    scratch: Vec<f64>,
    history: SlidingHistory,
    coefs: Vec<f64>,
}

impl LPEnergyODF {
    pub fn new(config: OdfConfig, order: usize) -> Result<Self> {
        OdfConfig::validate_frame_size(config.frame_size)?;
        OdfConfig::validate_hop_size(config.hop_size, config.frame_size)?;
        if order == 0 {
            return Err(OnsetError::InvalidOrder(order));
        }
        Ok(Self {
            window: crate::window::hann_window_of(config.frame_size),
            scratch: vec![0.0; config.frame_size],
            history: SlidingHistory::new(order),
            coefs: vec![0.0; order],
            order,
            config,
        })
    }
}

impl OnsetDetectionFunction for LPEnergyODF {
    fn config(&self) -> &OdfConfig {
        &self.config
    }

    fn set_sampling_rate(&mut self, sampling_rate: u32) {
        self.config.sampling_rate = sampling_rate;
    }

    fn set_frame_size(&mut self, frame_size: usize) -> Result<()> {
        OdfConfig::validate_frame_size(frame_size)?;
        OdfConfig::validate_hop_size(self.config.hop_size.min(frame_size), frame_size)?;
        self.window = crate::window::hann_window_of(frame_size);
        self.scratch = vec![0.0; frame_size];
        self.config.frame_size = frame_size;
        self.config.hop_size = self.config.hop_size.min(frame_size);
        log::debug!("LPEnergyODF reconfigured to frame_size={frame_size}");
        Ok(())
    }

    fn set_hop_size(&mut self, hop_size: usize) -> Result<()> {
        OdfConfig::validate_hop_size(hop_size, self.config.frame_size)?;
        self.config.hop_size = hop_size;
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f64]) -> Result<f64> {
        if frame.len() != self.config.frame_size {
            return Err(OnsetError::ShortFrame {
                expected: self.config.frame_size,
                actual: frame.len(),
            });
        }
        for ((s, &x), &w) in self.scratch.iter_mut().zip(frame).zip(self.window.iter()) {
            *s = x * w;
        }
        let energy: f64 = self.scratch.iter().map(|x| x * x).sum();

        burg(self.history.as_slice(), self.order, &mut self.coefs);
        let predicted = linear_prediction(self.history.as_slice(), &self.coefs, 1)[0];

        self.history.push(energy);

        Ok((energy - predicted).abs())
    }

    fn reset(&mut self) {
        self.history.reset();
    }
}

impl LinearPredictionOrder for LPEnergyODF {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) -> Result<()> {
        if order == 0 {
            return Err(OnsetError::InvalidOrder(order));
        }
        self.order = order;
        self.history = SlidingHistory::new(order);
        self.coefs = vec![0.0; order];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_then_a_click_produces_a_detectable_rise() {
        let mut odf = LPEnergyODF::new(
            OdfConfig {
                sampling_rate: 44100,
                frame_size: 16,
                hop_size: 16,
            },
            3,
        )
        .unwrap();
        let mut signal = vec![0.0; 16 * 8];
        for i in 0..16 {
            signal[16 * 4 + i] = 1.0;
        }
        let values = odf.process(&signal).unwrap();
        let (loudest, _) = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(loudest, 4);
    }

    #[test]
    fn rejects_zero_order() {
        let config = OdfConfig {
            sampling_rate: 44100,
            frame_size: 16,
            hop_size: 16,
        };
        assert!(LPEnergyODF::new(config, 0).is_err());
    }
}
