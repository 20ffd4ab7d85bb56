//! Public two-pass noise reduction API.
//!
//! [`NoiseReducer::profile`] gathers per-band noise statistics over a
//! region presumed to contain only noise; [`NoiseReducer::reduce`] rewrites
//! a region with noise-classified bands attenuated. Statistics persist on
//! the facade between invocations and can be taken out and installed
//! elsewhere; they are plain value records.

use denoise_audio::{MemorySink, SampleSink, SampleSource, Splice};

use crate::config::Settings;
use crate::statistics::NoiseStats;
use crate::stft_pipeline::StftPipeline;

/// Errors returned by profile and reduce operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Window size, steps per window and method are not a workable
    /// combination.
    ConfigInvalid(&'static str),
    /// The track's sample rate differs from the noise profile's.
    RateMismatch,
    /// The window size differs from the one the noise profile was gathered
    /// with.
    WindowSizeMismatch,
    /// The profile region produced no complete analysis window, or no
    /// profile has been gathered yet.
    ProfileEmpty,
    /// The sample source failed to deliver requested samples.
    SourceUnavailable,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigInvalid(reason) => write!(f, "invalid configuration: {reason}"),
            Self::RateMismatch => {
                write!(f, "sample rate does not match the noise profile")
            }
            Self::WindowSizeMismatch => {
                write!(f, "window size does not match the noise profile")
            }
            Self::ProfileEmpty => write!(f, "noise profile is empty or too short"),
            Self::SourceUnavailable => write!(f, "sample source returned a short read"),
        }
    }
}

impl std::error::Error for Error {}

/// Two-pass spectral noise reduction effect.
#[derive(Debug)]
pub struct NoiseReducer {
    settings: Settings,
    statistics: Option<NoiseStats>,
}

impl Default for NoiseReducer {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            statistics: None,
        }
    }
}

impl NoiseReducer {
    /// Create a reducer with validated settings.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        settings.validate()?;
        Ok(Self {
            settings,
            statistics: None,
        })
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings, validating the new combination. Statistics are
    /// kept: a changed window size is caught when the next reduction runs.
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), Error> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Whether a usable noise profile is present.
    pub fn has_profile(&self) -> bool {
        self.statistics.is_some()
    }

    /// The gathered noise statistics, if any.
    pub fn statistics(&self) -> Option<&NoiseStats> {
        self.statistics.as_ref()
    }

    /// Remove and return the gathered statistics.
    pub fn take_statistics(&mut self) -> Option<NoiseStats> {
        self.statistics.take()
    }

    /// Install statistics gathered elsewhere, for example by another facade
    /// instance.
    pub fn install_statistics(&mut self, statistics: NoiseStats) {
        self.statistics = Some(statistics);
    }

    /// Gather a fresh noise profile from `[t0, t1]` of `track`, replacing
    /// any previous statistics.
    ///
    /// On failure the statistics are discarded, so a later reduction cannot
    /// run against partial data.
    pub fn profile<S>(&mut self, track: &S, t0: f64, t1: f64) -> Result<(), Error>
    where
        S: SampleSource + ?Sized,
    {
        self.settings.validate()?;
        self.statistics = None;

        let mut stats = NoiseStats::new(
            self.settings.spectrum_size(),
            track.rate(),
            self.settings.window_types,
        );
        self.profile_into(&mut stats, track, t0, t1)?;
        self.statistics = Some(stats);
        Ok(())
    }

    /// Fold another track's noise into the existing profile. All profile
    /// tracks must share one sample rate and window size.
    pub fn extend_profile<S>(&mut self, track: &S, t0: f64, t1: f64) -> Result<(), Error>
    where
        S: SampleSource + ?Sized,
    {
        self.settings.validate()?;
        let mut stats = self.statistics.take().ok_or(Error::ProfileEmpty)?;
        if stats.rate() != track.rate() {
            return Err(Error::RateMismatch);
        }
        if stats.window_size() != self.settings.window_size() {
            return Err(Error::WindowSizeMismatch);
        }
        self.profile_into(&mut stats, track, t0, t1)?;
        self.statistics = Some(stats);
        Ok(())
    }

    fn profile_into<S>(
        &self,
        stats: &mut NoiseStats,
        track: &S,
        t0: f64,
        t1: f64,
    ) -> Result<(), Error>
    where
        S: SampleSource + ?Sized,
    {
        if let Some((start, len)) = clamp_region(track, t0, t1) {
            let mut pipeline = StftPipeline::for_profiling(&self.settings, track.rate());
            let mut buffer = vec![0.0f32; track.max_block_size()];
            let end = start + len;
            let mut pos = start;
            while pos < end {
                let block = track
                    .best_block_size(pos)
                    .min((end - pos) as usize)
                    .min(buffer.len());
                track
                    .read(&mut buffer[..block], pos)
                    .map_err(|_| Error::SourceUnavailable)?;
                pipeline.feed_profile(&buffer[..block], stats);
                pos += block as u64;
            }
        }

        stats.finish_track();
        if stats.total_windows() == 0 {
            return Err(Error::ProfileEmpty);
        }
        Ok(())
    }

    /// Rewrite `[t0, t1]` of `track` with the configured reduction applied,
    /// splicing the processed samples back over the region.
    ///
    /// Requires statistics whose rate and window size match exactly; a
    /// window-type mismatch is tolerated with a warning, since the
    /// statistics remain meaningful and normalization differences are
    /// small. On failure the output is abandoned and the track untouched.
    pub fn reduce<T>(&mut self, track: &mut T, t0: f64, t1: f64) -> Result<(), Error>
    where
        T: SampleSource + Splice,
    {
        self.settings.validate()?;
        let stats = self.statistics.as_ref().ok_or(Error::ProfileEmpty)?;
        if stats.rate() != track.rate() {
            return Err(Error::RateMismatch);
        }
        if stats.window_size() != self.settings.window_size() {
            return Err(Error::WindowSizeMismatch);
        }
        if stats.window_types() != self.settings.window_types {
            tracing::warn!(
                profiled = ?stats.window_types(),
                configured = ?self.settings.window_types,
                "window types differ from the noise profile"
            );
        }

        let Some((start, len)) = clamp_region(track, t0, t1) else {
            return Ok(());
        };

        let mut pipeline = StftPipeline::for_reduction(&self.settings, track.rate());
        let mut sink = MemorySink::new();
        let mut buffer = vec![0.0f32; track.max_block_size()];
        let end = start + len;
        let mut pos = start;
        while pos < end {
            let block = track
                .best_block_size(pos)
                .min((end - pos) as usize)
                .min(buffer.len());
            track
                .read(&mut buffer[..block], pos)
                .map_err(|_| Error::SourceUnavailable)?;
            pipeline.feed_reduce(&buffer[..block], stats, &mut sink);
            pos += block as u64;
        }
        pipeline.finish_reduce(stats, &mut sink);
        sink.flush();

        // Overlap-add runs at most one hop past the region; trim the tail
        // and splice the result over the processed range.
        sink.trim(len as usize);
        track.splice(start, len, sink.samples());
        Ok(())
    }
}

/// Clamp `[t0, t1]` to the track and convert to a sample range.
fn clamp_region<S>(track: &S, t0: f64, t1: f64) -> Option<(u64, u64)>
where
    S: SampleSource + ?Sized,
{
    let t0 = t0.max(track.start_time());
    let t1 = t1.min(track.end_time());
    if t1 <= t0 {
        return None;
    }
    let start = track.time_to_sample(t0);
    let end = track.time_to_sample(t1);
    (end > start).then_some((start, end - start))
}
