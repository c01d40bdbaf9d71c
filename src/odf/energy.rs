use super::OnsetDetectionFunction;
use crate::config::OdfConfig;
use crate::error::Result;

/// Local energy of each frame: sum of squared samples after windowing.
/// Simplest of the detection functions, and the cheapest to compute.
#[derive(Debug, Clone)]
pub struct EnergyODF {
    config: OdfConfig,
    window: Vec<f64>,
    scratch: Vec<f64>,
}

impl EnergyODF {
    pub fn new(config: OdfConfig) -> Result<Self> {
        OdfConfig::validate_frame_size(config.frame_size)?;
        OdfConfig::validate_hop_size(config.hop_size, config.frame_size)?;
        Ok(Self {
            window: crate::window::hann_window_of(config.frame_size),
            scratch: vec![0.0; config.frame_size],
            config,
        })
    }
}

impl OnsetDetectionFunction for EnergyODF {
    fn config(&self) -> &OdfConfig {
        &self.config
    }

    fn set_sampling_rate(&mut self, sampling_rate: u32) {
        self.config.sampling_rate = sampling_rate;
    }

    fn set_frame_size(&mut self, frame_size: usize) -> Result<()> {
        OdfConfig::validate_frame_size(frame_size)?;
        OdfConfig::validate_hop_size(self.config.hop_size.min(frame_size), frame_size)?;
        self.config.frame_size = frame_size;
        self.config.hop_size = self.config.hop_size.min(frame_size);
        self.window = crate::window::hann_window_of(frame_size);
        self.scratch = vec![0.0; frame_size];
        log::debug!("EnergyODF reconfigured to frame_size={frame_size}");
        Ok(())
    }

    fn set_hop_size(&mut self, hop_size: usize) -> Result<()> {
        OdfConfig::validate_hop_size(hop_size, self.config.frame_size)?;
        self.config.hop_size = hop_size;
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f64]) -> Result<f64> {
        if frame.len() != self.config.frame_size {
            return Err(crate::error::OnsetError::ShortFrame {
                expected: self.config.frame_size,
                actual: frame.len(),
            });
        }
        for ((s, &x), &w) in self.scratch.iter_mut().zip(frame).zip(self.window.iter()) {
            *s = x * w;
        }
        Ok(self.scratch.iter().map(|x| x * x).sum())
    }

    fn reset(&mut self) {}
}
