//! Frame-based onset detection functions and a realtime onset picker for
//! monaural audio.
//!
//! The detection function family (`EnergyODF`, `SpectralDifferenceODF`,
//! `ComplexODF`, their linear-prediction variants, and the peak-tracking
//! variants) all implement [`OnsetDetectionFunction`]; [`RealtimeOnsetPicker`]
//! turns a stream of detection values into onset/no-onset decisions.

pub mod config;
pub mod error;
mod fft;
mod linear_prediction;
pub mod odf;
mod peak;
pub mod realtime;
mod tracker;
mod window;

pub use config::OdfConfig;
pub use error::{OnsetError, Result};
pub use odf::{
    complex::ComplexODF,
    energy::EnergyODF,
    lp_complex::LPComplexODF,
    lp_energy::LPEnergyODF,
    lp_spectral_difference::LPSpectralDifferenceODF,
    peak_odf::{AmpDifferenceDistance, PeakAmpDifferenceOdf, PeakDistance, PeakOdf, UnmatchedDistance, UnmatchedPeaksOdf},
    spectral_difference::SpectralDifferenceODF,
    LinearPredictionOrder, OnsetDetectionFunction, PeakCapacity,
};
pub use peak::{extract_peaks, MqParams, Peak, PeakList};
pub use realtime::RealtimeOnsetPicker;
pub use tracker::PeakTracker;

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn picker_flags_a_sustained_tone_after_silence() {
        let frame_size = 64;
        let config = OdfConfig {
            sampling_rate: 44100,
            frame_size,
            hop_size: frame_size,
        };
        let mut odf = EnergyODF::new(config).unwrap();
        let mut picker = RealtimeOnsetPicker::new();

        let mut signal = vec![0.0; frame_size * 9];
        for i in 0..frame_size * 2 {
            let t = i as f64 / 44100.0;
            signal[frame_size * 5 + i] = (2.0 * PI * 1000.0 * t).sin();
        }

        let values = odf.process(&signal).unwrap();
        let onsets: Vec<bool> = values.iter().map(|&v| picker.is_onset(v)).collect();
        assert!(onsets.iter().any(|&b| b));
    }
}
