use thiserror::Error;

/// Errors surfaced by the onset detection core.
///
/// Configuration errors are reported eagerly from setters and leave the
/// object unchanged. Resource exhaustion is reported from constructors
/// and `set_frame_size`. Precondition violations are reported from
/// `process_frame` without mutating any history.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OnsetError {
    #[error("frame size must be greater than zero, got {0}")]
    InvalidFrameSize(usize),

    #[error("hop size {hop} must satisfy 0 < hop_size <= frame_size ({frame_size})")]
    InvalidHopSize { hop: usize, frame_size: usize },

    #[error("linear prediction order must be at least 1, got {0}")]
    InvalidOrder(usize),

    #[error("max_peaks must be at least 1, got {0}")]
    InvalidMaxPeaks(usize),

    #[error("failed to build an FFT plan for frame size {0}")]
    FftPlanFailure(usize),

    #[error("frame too short: expected at least {expected} samples, got {actual}")]
    ShortFrame { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, OnsetError>;
