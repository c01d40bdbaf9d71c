use crate::peak::{Peak, PeakList};

/// McAulay-Quatreay style cross-frame peak matching.
///
/// Owns the previous frame's peak list and swaps it in on each call, so a
/// caller never holds raw pointers between frames: peaks refer to each
/// other purely through indices in the list the tracker itself owns.
#[derive(Debug, Clone)]
pub struct PeakTracker {
    previous: Option<PeakList>,
    last_matched_previous: Option<PeakList>,
    seed_distance: f64,
}

impl PeakTracker {
    pub fn new(seed_distance: f64) -> Self {
        Self {
            previous: None,
            last_matched_previous: None,
            seed_distance,
        }
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.last_matched_previous = None;
    }

    /// The previous frame's peaks as matched against `current` by the most
    /// recent `track` call (so `prev`/`next` links can be followed both
    /// ways). `None` before the first call or right after a `reset`.
    pub fn last_matched_previous(&self) -> Option<&PeakList> {
        self.last_matched_previous.as_ref()
    }

    /// Match `current` against the previously tracked frame, link
    /// corresponding peaks symmetrically, and adopt `current` as the new
    /// previous frame. On the first call after construction or a reset,
    /// `current` passes through unlinked.
    pub fn track(&mut self, current: PeakList) -> PeakList {
        let Some(prev) = self.previous.take() else {
            self.previous = Some(current.clone());
            self.last_matched_previous = None;
            return current;
        };

        let (matched_prev, matched_current) =
            match_frames(prev, current, self.seed_distance);
        self.previous = Some(matched_current.clone());
        self.last_matched_previous = Some(matched_prev);
        matched_current
    }
}

/// Pure matching step: for every unmatched previous peak, find the closest
/// unmatched current peak within `matching_interval`; confirm the match by
/// checking it is also the previous peak's closest candidate from the
/// other direction. Unconfirmed previous peaks fall back to the closest
/// *lower*-frequency unmatched candidate within the interval.
fn match_frames(
    mut prev: PeakList,
    mut current: PeakList,
    matching_interval: f64,
) -> (PeakList, PeakList) {
    for i in 0..prev.len() {
        if prev[i].next.is_some() {
            continue;
        }

        let Some(candidate) = find_closest_unclaimed(&current, prev[i].frequency, matching_interval)
        else {
            continue;
        };

        let confirmed =
            find_closest_unlinked(&prev, current[candidate].frequency, matching_interval)
                .map(|back| back == i)
                .unwrap_or(false);

        if confirmed {
            prev[i].next = Some(candidate);
            current[candidate].prev = Some(i);
        } else if let Some(lower) =
            find_closest_below(&current, prev[i].frequency, matching_interval)
        {
            prev[i].next = Some(lower);
            current[lower].prev = Some(i);
        }
    }

    (prev, current)
}

/// Closest candidate in `peaks` not yet claimed by a match in this round,
/// where "claimed" is tracked through `prev` — used to search the
/// *current* frame's peak list for a match to a previous-frame peak.
fn find_closest_unclaimed(peaks: &PeakList, frequency: f64, matching_interval: f64) -> Option<usize> {
    peaks
        .iter()
        .enumerate()
        .filter(|(_, p)| p.prev.is_none())
        .map(|(i, p)| (i, (p.frequency - frequency).abs()))
        .filter(|&(_, dist)| dist <= matching_interval)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Closest candidate in `peaks` not yet linked forward in this round,
/// where that's tracked through `next` — used to search the *previous*
/// frame's peak list when confirming a candidate match. A previous-frame
/// peak's own `prev` link (set two frames back) is irrelevant here.
fn find_closest_unlinked(peaks: &PeakList, frequency: f64, matching_interval: f64) -> Option<usize> {
    peaks
        .iter()
        .enumerate()
        .filter(|(_, p)| p.next.is_none())
        .map(|(i, p)| (i, (p.frequency - frequency).abs()))
        .filter(|&(_, dist)| dist <= matching_interval)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Closest candidate in `peaks` with lower frequency than `frequency`,
/// not yet claimed by a match in this round. Fallback used when the
/// normal closest-candidate match fails confirmation.
fn find_closest_below(peaks: &PeakList, frequency: f64, matching_interval: f64) -> Option<usize> {
    peaks
        .iter()
        .enumerate()
        .filter(|(_, p)| p.prev.is_none() && p.frequency < frequency)
        .map(|(i, p)| (i, frequency - p.frequency))
        .filter(|&(_, dist)| dist <= matching_interval)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_at(frequency: f64, amplitude: f64) -> Peak {
        Peak {
            amplitude,
            frequency,
            phase: 0.0,
            bin: 0,
            prev: None,
            next: None,
        }
    }

    #[test]
    fn first_frame_passes_through_unlinked() {
        let mut tracker = PeakTracker::new(44100.0);
        let frame = vec![peak_at(440.0, 1.0)];
        let out = tracker.track(frame.clone());
        assert_eq!(out, frame);
        assert!(tracker.last_matched_previous().is_none());
    }

    #[test]
    fn stable_partial_links_symmetrically() {
        let mut tracker = PeakTracker::new(100.0);
        tracker.track(vec![peak_at(440.0, 1.0)]);
        let out = tracker.track(vec![peak_at(441.0, 1.0)]);

        let matched_prev = tracker.last_matched_previous().unwrap();
        assert_eq!(matched_prev[0].next, Some(0));
        assert_eq!(out[0].prev, Some(0));
    }

    #[test]
    fn peak_outside_interval_goes_unmatched() {
        let mut tracker = PeakTracker::new(10.0);
        tracker.track(vec![peak_at(440.0, 1.0)]);
        let out = tracker.track(vec![peak_at(900.0, 1.0)]);

        let matched_prev = tracker.last_matched_previous().unwrap();
        assert_eq!(matched_prev[0].next, None);
        assert_eq!(out[0].prev, None);
    }

    #[test]
    fn reset_forgets_history() {
        let mut tracker = PeakTracker::new(100.0);
        tracker.track(vec![peak_at(440.0, 1.0)]);
        tracker.reset();
        let out = tracker.track(vec![peak_at(441.0, 1.0)]);
        assert_eq!(out[0].prev, None);
        assert!(tracker.last_matched_previous().is_none());
    }
}
