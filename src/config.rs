use serde::{Deserialize, Serialize};

use crate::error::{OnsetError, Result};

/// Shared sampling-rate/frame/hop plumbing composed into every ODF variant.
///
/// This is the "shared plumbing" referred to throughout the detection
/// function family: every variant embeds one of these rather than
/// inheriting it, and delegates its `sampling_rate`/`frame_size`/`hop_size`
/// accessors to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdfConfig {
    pub sampling_rate: u32,
    pub frame_size: usize,
    pub hop_size: usize,
}

impl Default for OdfConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 44100,
            frame_size: 512,
            hop_size: 256,
        }
    }
}

impl OdfConfig {
    pub fn validate_frame_size(frame_size: usize) -> Result<()> {
        if frame_size == 0 {
            return Err(OnsetError::InvalidFrameSize(frame_size));
        }
        Ok(())
    }

    pub fn validate_hop_size(hop_size: usize, frame_size: usize) -> Result<()> {
        if hop_size == 0 || hop_size > frame_size {
            return Err(OnsetError::InvalidHopSize {
                hop: hop_size,
                frame_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec() {
        let c = OdfConfig::default();
        assert_eq!(c.sampling_rate, 44100);
        assert_eq!(c.frame_size, 512);
        assert_eq!(c.hop_size, 256);
    }

    #[test]
    fn rejects_zero_frame_size() {
        assert!(OdfConfig::validate_frame_size(0).is_err());
    }

    #[test]
    fn rejects_hop_larger_than_frame() {
        assert!(OdfConfig::validate_hop_size(600, 512).is_err());
        assert!(OdfConfig::validate_hop_size(0, 512).is_err());
        assert!(OdfConfig::validate_hop_size(512, 512).is_ok());
    }
}
