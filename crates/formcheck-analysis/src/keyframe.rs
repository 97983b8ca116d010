//! Key-frame extraction from a per-frame joint-angle series.
//!
//! The tracked joint angle of a repeated movement dips once per repetition.
//! The extractor fits a sinusoid to the observed angles, takes the fitted
//! trough level as a candidate threshold, and walks the original series to
//! pick one representative frame per run of consecutive sub-threshold
//! frames: the repetition extrema.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::sine_fit::fit_sine;

/// Per-frame tracked joint angles, in radians.
///
/// Frame indices are capture-order frame numbers; `None` records a frame
/// where the pose was detected but the tracked angle could not be computed
/// (a required landmark was invisible). Frames with no pose at all are
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleSeries {
    samples: BTreeMap<u32, Option<f64>>,
}

impl AngleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tracked angle for a frame.
    pub fn insert(&mut self, frame: u32, angle: Option<f64>) {
        self.samples.insert(frame, angle);
    }

    /// Number of recorded frames, including `None` entries.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All entries in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<f64>)> + '_ {
        self.samples.iter().map(|(frame, angle)| (*frame, *angle))
    }

    /// Observed angles only, in frame order. This is the densified `0..n-1`
    /// sample sequence the sinusoid fit runs on; the fit needs evenly spaced
    /// samples, so gaps are closed up rather than preserved.
    pub fn dense_values(&self) -> Vec<f64> {
        self.samples.values().filter_map(|angle| *angle).collect()
    }
}

impl FromIterator<(u32, Option<f64>)> for AngleSeries {
    fn from_iter<I: IntoIterator<Item = (u32, Option<f64>)>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Extract one representative frame index per repetition minimum.
///
/// Returns `None` when no key frame could be determined -- an empty series,
/// or no qualifying frames at all. The caller must check; absence of key
/// frames is a real outcome, not success with an empty list.
///
/// The walk over the original series keeps a run of consecutive qualifying
/// frames (each index exactly one past the previous) and tracks the run's
/// smallest value as its representative. A run boundary emits the finished
/// run's representative; a run that never recorded one (degenerate
/// single-frame run) emits the first qualifying frame of the new run
/// instead. The final run's representative is emitted when the series ends.
pub fn extract_key_frames(series: &AngleSeries) -> Option<Vec<u32>> {
    let values = series.dense_values();
    if values.is_empty() {
        return None;
    }

    let min_values = candidate_values(&values);
    let key_frames = select_run_representatives(series, &min_values);

    if key_frames.is_empty() {
        debug!("no qualifying frames, no key frame found");
        None
    } else {
        debug!(key_frames = ?key_frames, "extracted key frames");
        Some(key_frames)
    }
}

/// Walk the original series and emit one representative per run of
/// consecutive qualifying frames.
fn select_run_representatives(series: &AngleSeries, min_values: &[f64]) -> Vec<u32> {
    let mut key_frames: Vec<u32> = Vec::new();
    let mut run_min: Option<(u32, f64)> = None;
    // Matches the run walk's historical initial state: a qualifying frame 1
    // is treated as continuing a run that began at frame 0.
    let mut prev_frame: i64 = 0;

    for (frame, angle) in series.iter() {
        let Some(angle) = angle else { continue };
        if !min_values.iter().any(|&v| v == angle) {
            continue;
        }

        if frame as i64 - 1 != prev_frame {
            // Run boundary: emit the finished run's representative, or this
            // frame itself when the previous run never recorded one.
            match run_min.take() {
                Some((rep, _)) => key_frames.push(rep),
                None => key_frames.push(frame),
            }
        } else {
            let current_min = run_min.map(|(_, v)| v).unwrap_or(f64::INFINITY);
            if angle < current_min {
                run_min = Some((frame, angle));
            }
        }
        prev_frame = frame as i64;
    }

    // Flush the final run.
    if let Some((rep, _)) = run_min {
        key_frames.push(rep);
    }
    key_frames
}

/// The set of observed values that count as repetition minima.
///
/// Values at or below the fitted sinusoid's trough level qualify. When the
/// fit fails outright, or represents the data so poorly that nothing falls
/// at or below its trough (too few cycles, noisy signal), fall back to the
/// single global minimum.
fn candidate_values(values: &[f64]) -> Vec<f64> {
    let trough = match fit_sine(values) {
        Ok(fit) => Some(fit.trough_level()),
        Err(err) => {
            warn!(error = %err, "sine fit failed, falling back to global minimum");
            None
        }
    };

    if let Some(trough) = trough {
        let candidates: Vec<f64> = values.iter().copied().filter(|&v| v <= trough).collect();
        if !candidates.is_empty() {
            return candidates;
        }
        debug!(trough, "no values at or below fitted trough, falling back to global minimum");
    }

    let global_min = values.iter().copied().fold(f64::INFINITY, f64::min);
    vec![global_min]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(entries: &[(u32, f64)]) -> AngleSeries {
        entries.iter().map(|(f, a)| (*f, Some(*a))).collect()
    }

    #[test]
    fn empty_series_has_no_key_frames() {
        assert_eq!(extract_key_frames(&AngleSeries::new()), None);
    }

    #[test]
    fn period_four_pattern_yields_one_key_frame_per_rep() {
        let s = series(&[
            (0, 1.2),
            (1, 0.9),
            (2, 0.3),
            (3, 0.9),
            (4, 1.2),
            (5, 0.9),
            (6, 0.3),
            (7, 0.9),
            (8, 1.2),
        ]);
        assert_eq!(extract_key_frames(&s), Some(vec![2, 6]));
    }

    #[test]
    fn noiseless_sinusoid_finds_every_trough() {
        // Period 8, troughs at t = 6, 14, 22 (sin minimum at 3/4 period).
        // The trough samples sit a hair below the ideal curve so that the
        // fitted trough level cannot lose them to rounding in the last bit.
        let w = 2.0 * std::f64::consts::PI / 8.0;
        let s: AngleSeries = (0..24)
            .map(|t| {
                let mut v = 0.5 * (w * t as f64).sin() + 1.0;
                if t % 8 == 6 {
                    v -= 1e-6;
                }
                (t, Some(v))
            })
            .collect();
        let key_frames = extract_key_frames(&s).unwrap();
        assert_eq!(key_frames, vec![6, 14, 22]);
    }

    #[test]
    fn monotonic_series_falls_back_to_global_minimum() {
        let s: AngleSeries = (0..20).map(|t| (t, Some(2.0 - 0.05 * t as f64))).collect();
        assert_eq!(extract_key_frames(&s), Some(vec![19]));
    }

    #[test]
    fn null_entries_are_skipped_but_frame_indices_are_preserved() {
        let mut s = series(&[
            (0, 1.2),
            (1, 0.9),
            (2, 0.3),
            (4, 1.2),
            (5, 0.9),
            (6, 0.3),
            (7, 0.9),
            (8, 1.2),
        ]);
        s.insert(3, None);
        let key_frames = extract_key_frames(&s).unwrap();
        assert_eq!(key_frames, vec![2, 6]);
    }

    #[test]
    fn consecutive_minima_keep_the_run_minimum() {
        // Two runs: {2,3,4} with its minimum at 3, then {8,9}. The first
        // boundary emits frame 2 itself (no representative recorded yet);
        // the boundary at 8 emits the first run's minimum; the series end
        // flushes the final run's minimum.
        let s = series(&[
            (0, 1.0),
            (2, 0.20),
            (3, 0.10),
            (4, 0.20),
            (6, 1.0),
            (8, 0.15),
            (9, 0.25),
        ]);
        let key_frames = select_run_representatives(&s, &[0.10, 0.15, 0.20, 0.25]);
        assert_eq!(key_frames, vec![2, 3, 9]);
    }

    #[test]
    fn first_qualifying_frame_one_continues_the_implicit_run() {
        // prev starts at 0, so frame 1 is treated as a continuation and only
        // recorded as the run minimum, emitted by the end-of-series flush.
        let s = series(&[(1, 0.1), (5, 0.9)]);
        let key_frames = select_run_representatives(&s, &[0.1]);
        assert_eq!(key_frames, vec![1]);
    }

    #[test]
    fn degenerate_single_frame_runs_emit_the_next_runs_first_frame() {
        // Run {3} records no representative (the boundary resets state), so
        // the boundary at frame 6 emits 6 itself before starting its run.
        let s = series(&[(3, 0.2), (6, 0.3), (7, 0.1)]);
        let key_frames = select_run_representatives(&s, &[0.1, 0.2, 0.3]);
        assert_eq!(key_frames, vec![3, 6, 7]);
    }

    #[test]
    fn dense_values_drop_nulls_in_order() {
        let mut s = AngleSeries::new();
        s.insert(2, Some(0.5));
        s.insert(0, Some(1.0));
        s.insert(1, None);
        assert_eq!(s.dense_values(), vec![1.0, 0.5]);
        assert_eq!(s.len(), 3);
    }
}
