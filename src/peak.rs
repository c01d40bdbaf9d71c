use realfft::num_complex::Complex;

/// One spectral peak, with optional cross-frame links established by
/// [`crate::tracker::PeakTracker`]. `prev`/`next` are indices into the
/// neighboring frame's peak list, not raw pointers — the tracker owns at
/// most two such lists (previous and current) and swaps them each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
    pub bin: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// A frame's peaks, ordered by ascending frequency.
pub type PeakList = Vec<Peak>;

/// Parameters governing peak extraction and cross-frame matching.
#[derive(Debug, Clone, Copy)]
pub struct MqParams {
    pub frame_size: usize,
    pub num_bins: usize,
    pub max_peaks: usize,
    pub peak_threshold: f64,
    pub fundamental: f64,
    pub matching_interval: f64,
}

impl MqParams {
    pub fn new(
        sampling_rate: u32,
        frame_size: usize,
        max_peaks: usize,
        peak_threshold: f64,
        matching_interval: f64,
    ) -> Self {
        Self {
            frame_size,
            num_bins: frame_size / 2 + 1,
            max_peaks,
            peak_threshold,
            fundamental: sampling_rate as f64 / frame_size as f64,
            matching_interval,
        }
    }
}

/// Extract the peaks of one frame's spectrum: local maxima above
/// `params.peak_threshold`, never at bin 0 or the last bin, capped at
/// `params.max_peaks` (smallest-amplitude peaks dropped first), returned
/// sorted by ascending frequency.
pub fn extract_peaks(spectrum: &[Complex<f64>], params: &MqParams) -> PeakList {
    let mut peaks = Vec::new();
    if spectrum.len() < 3 {
        return peaks;
    }

    for bin in 1..spectrum.len() - 1 {
        let amplitude = spectrum[bin].norm();
        let prev_amp = spectrum[bin - 1].norm();
        let next_amp = spectrum[bin + 1].norm();

        if amplitude > prev_amp && amplitude > next_amp && amplitude > params.peak_threshold {
            peaks.push(Peak {
                amplitude,
                frequency: bin as f64 * params.fundamental,
                phase: spectrum[bin].arg(),
                bin,
                prev: None,
                next: None,
            });
        }
    }

    // Largest amplitude first (stable), so capping drops the smallest.
    peaks.sort_by(|a, b| b.amplitude.total_cmp(&a.amplitude));
    if peaks.len() > params.max_peaks {
        peaks.truncate(params.max_peaks);
    }
    // Final contractual order: ascending frequency (stable).
    peaks.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));

    log::trace!("extracted {} peaks", peaks.len());
    peaks
}
