use std::marker::PhantomData;

use super::{OnsetDetectionFunction, PeakCapacity};
use crate::config::OdfConfig;
use crate::error::{OnsetError, Result};
use crate::fft::SpectralAnalyzer;
use crate::peak::{extract_peaks, MqParams, Peak};
use crate::tracker::PeakTracker;

/// How a single tracked peak contributes to the frame's detection value.
pub trait PeakDistance {
    fn distance(peak: &Peak, matched_previous: Option<&Peak>) -> f64;
}

/// Counts peaks with no match in the previous frame: new partials appearing
/// mid-signal are a strong onset cue on their own.
#[derive(Debug, Clone, Copy)]
pub struct UnmatchedDistance;

impl PeakDistance for UnmatchedDistance {
    fn distance(_peak: &Peak, matched_previous: Option<&Peak>) -> f64 {
        if matched_previous.is_none() {
            1.0
        } else {
            0.0
        }
    }
}

/// Absolute amplitude change of matched partials; unmatched (newly
/// appeared) peaks contribute their full amplitude.
#[derive(Debug, Clone, Copy)]
pub struct AmpDifferenceDistance;

impl PeakDistance for AmpDifferenceDistance {
    fn distance(peak: &Peak, matched_previous: Option<&Peak>) -> f64 {
        match matched_previous {
            Some(prev) => (peak.amplitude - prev.amplitude).abs(),
            None => peak.amplitude,
        }
    }
}

/// Detection function family built on McAulay-Quatreay peak tracking: both
/// [`UnmatchedPeaksOdf`] and [`PeakAmpDifferenceOdf`] extract and match
/// peaks the same way and differ only in how a tracked peak is scored.
pub struct PeakOdf<D> {
    config: OdfConfig,
    analyzer: SpectralAnalyzer,
    tracker: PeakTracker,
    max_peaks: usize,
    peak_threshold: f64,
    matching_interval: f64,
    _distance: PhantomData<D>,
}

pub type UnmatchedPeaksOdf = PeakOdf<UnmatchedDistance>;
pub type PeakAmpDifferenceOdf = PeakOdf<AmpDifferenceDistance>;

impl<D: PeakDistance> PeakOdf<D> {
    pub fn new(
        config: OdfConfig,
        max_peaks: usize,
        peak_threshold: f64,
        matching_interval: f64,
    ) -> Result<Self> {
        OdfConfig::validate_frame_size(config.frame_size)?;
        OdfConfig::validate_hop_size(config.hop_size, config.frame_size)?;
        if max_peaks == 0 {
            return Err(OnsetError::InvalidMaxPeaks(max_peaks));
        }
        let analyzer = SpectralAnalyzer::new(config.frame_size)?;
        Ok(Self {
            tracker: PeakTracker::new(config.sampling_rate as f64),
            analyzer,
            config,
            max_peaks,
            peak_threshold,
            matching_interval,
            _distance: PhantomData,
        })
    }

    fn params(&self) -> MqParams {
        MqParams::new(
            self.config.sampling_rate,
            self.config.frame_size,
            self.max_peaks,
            self.peak_threshold,
            self.matching_interval,
        )
    }
}

impl<D: PeakDistance> OnsetDetectionFunction for PeakOdf<D> {
    fn config(&self) -> &OdfConfig {
        &self.config
    }

    fn set_sampling_rate(&mut self, sampling_rate: u32) {
        self.config.sampling_rate = sampling_rate;
        self.tracker = PeakTracker::new(sampling_rate as f64);
    }

    fn set_frame_size(&mut self, frame_size: usize) -> Result<()> {
        OdfConfig::validate_frame_size(frame_size)?;
        OdfConfig::validate_hop_size(self.config.hop_size.min(frame_size), frame_size)?;
        self.analyzer = SpectralAnalyzer::new(frame_size)?;
        self.tracker.reset();
        self.config.frame_size = frame_size;
        self.config.hop_size = self.config.hop_size.min(frame_size);
        log::debug!("PeakOdf reconfigured to frame_size={frame_size}");
        Ok(())
    }

    fn set_hop_size(&mut self, hop_size: usize) -> Result<()> {
        OdfConfig::validate_hop_size(hop_size, self.config.frame_size)?;
        self.config.hop_size = hop_size;
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f64]) -> Result<f64> {
        let params = self.params();
        let spectrum = self.analyzer.analyze(frame)?;
        let peaks = extract_peaks(spectrum, &params);
        let matched = self.tracker.track(peaks);

        let sum = matched
            .iter()
            .map(|peak| {
                let matched_previous = peak.prev.and_then(|idx| {
                    self.tracker
                        .last_matched_previous()
                        .and_then(|prev_list| prev_list.get(idx))
                });
                D::distance(peak, matched_previous)
            })
            .sum();

        Ok(sum)
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}

impl<D> PeakCapacity for PeakOdf<D> {
    fn max_peaks(&self) -> usize {
        self.max_peaks
    }

    fn set_max_peaks(&mut self, max_peaks: usize) -> Result<()> {
        if max_peaks == 0 {
            return Err(OnsetError::InvalidMaxPeaks(max_peaks));
        }
        self.max_peaks = max_peaks;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn config(frame_size: usize) -> OdfConfig {
        OdfConfig {
            sampling_rate: 44100,
            frame_size,
            hop_size: frame_size,
        }
    }

    #[test]
    fn stable_partial_tracks_across_frames_without_growing() {
        let frame_size = 512;
        let mut odf: PeakAmpDifferenceOdf =
            PeakOdf::new(config(frame_size), 10, 0.01, 200.0).unwrap();

        let make_frame = |phase_offset: f64| -> Vec<f64> {
            (0..frame_size)
                .map(|i| {
                    let t = i as f64 / 44100.0;
                    (2.0 * PI * 1000.0 * t + phase_offset).sin()
                })
                .collect()
        };

        let first = odf.process_frame(&make_frame(0.0)).unwrap();
        let second = odf.process_frame(&make_frame(0.3)).unwrap();

        assert!(second <= first + 1e-6);
    }

    #[test]
    fn rejects_zero_max_peaks() {
        assert!(UnmatchedPeaksOdf::new(config(64), 0, 0.01, 200.0).is_err());
    }

    #[test]
    fn reconfiguring_frame_size_changes_output_length() {
        let mut odf: UnmatchedPeaksOdf = PeakOdf::new(config(32), 10, 0.01, 200.0).unwrap();
        let signal = vec![0.1; 128];
        assert_eq!(odf.process(&signal).unwrap().len(), 4);

        odf.set_frame_size(16).unwrap();
        assert_eq!(odf.process(&signal).unwrap().len(), 8);
    }
}
