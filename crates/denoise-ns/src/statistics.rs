//! Per-band noise statistics gathered by the profile pass.

use crate::config::WindowTypes;

/// Running per-band power statistics of the profiled noise.
///
/// A plain value record: the facade owns one for convenience, but callers
/// may take it out and install it elsewhere. Reductions must be given
/// statistics whose rate and window size match the pass exactly.
#[derive(Debug, Clone)]
pub struct NoiseStats {
    rate: f64,
    window_size: usize,
    window_types: WindowTypes,
    total_windows: u32,
    track_windows: u32,
    sums: Vec<f32>,
    means: Vec<f32>,
}

impl NoiseStats {
    /// Create empty statistics for a spectrum of `spectrum_size` bins.
    pub fn new(spectrum_size: usize, rate: f64, window_types: WindowTypes) -> Self {
        Self {
            rate,
            window_size: (spectrum_size - 1) * 2,
            window_types,
            total_windows: 0,
            track_windows: 0,
            sums: vec![0.0; spectrum_size],
            means: vec![0.0; spectrum_size],
        }
    }

    /// Sample rate of the profiled track(s). Processed tracks must match.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Window size the profile was gathered with.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Window pairing the profile was gathered with. A mismatch during
    /// reduction is tolerable; normalization differences are small.
    pub fn window_types(&self) -> WindowTypes {
        self.window_types
    }

    /// Frames contributed by finished tracks.
    pub fn total_windows(&self) -> u32 {
        self.total_windows
    }

    /// Frames contributed by the current, unfinished track.
    pub fn track_windows(&self) -> u32 {
        self.track_windows
    }

    /// Per-band mean noise power. Meaningful once at least one track has
    /// been finished.
    pub fn means(&self) -> &[f32] {
        &self.means
    }

    /// Add one profile frame's power spectrum to the current track's sums.
    pub fn accumulate(&mut self, power: &[f32]) {
        debug_assert_eq!(power.len(), self.sums.len());
        self.track_windows += 1;
        for (sum, &p) in self.sums.iter_mut().zip(power) {
            *sum += p;
        }
    }

    /// Fold the current track's sums into the running means, weighted by
    /// frame counts, and reset for the next track. Must run once per track,
    /// before any reduction consumes the means.
    pub fn finish_track(&mut self) {
        let windows = self.track_windows;
        let prior = self.total_windows;
        if windows > 0 {
            let denom = (windows + prior) as f32;
            for (mean, sum) in self.means.iter_mut().zip(&mut self.sums) {
                *mean = (*mean * prior as f32 + *sum) / denom;
                *sum = 0.0;
            }
        }
        self.total_windows += windows;
        self.track_windows = 0;
    }
}
