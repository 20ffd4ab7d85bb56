//! Block-wise sample reader.

/// Underlying storage format of a track.
///
/// Processing is always done in 32-bit float; this only describes what a
/// source stores, so a consumer can decide how to write results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// 16-bit signed integer PCM.
    I16,
    /// 24-bit signed integer PCM.
    I24,
    /// 32-bit float PCM.
    #[default]
    F32,
}

/// Error returned when a source cannot deliver the requested samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    /// Number of samples the caller asked for.
    pub requested: usize,
    /// Number of samples actually available at the read position.
    pub available: usize,
}

impl std::fmt::Display for ShortRead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "short read: requested {} samples, {} available",
            self.requested, self.available
        )
    }
}

impl std::error::Error for ShortRead {}

/// Ordered, blocking reader of floating-point PCM at a known sample rate.
///
/// Reads are positioned, so a consumer may re-read a region, but effects in
/// this workspace read strictly forward: overlap-add output depends on hop
/// alignment, never on read order tricks.
pub trait SampleSource {
    /// Sample rate in Hz.
    fn rate(&self) -> f64;

    /// Storage format of the underlying data.
    fn sample_format(&self) -> SampleFormat {
        SampleFormat::F32
    }

    /// Start of the track on its timeline, in seconds.
    fn start_time(&self) -> f64 {
        0.0
    }

    /// End of the track on its timeline, in seconds.
    fn end_time(&self) -> f64;

    /// Convert a time on the timeline to a sample offset, rounding to the
    /// nearest sample boundary.
    fn time_to_sample(&self, t: f64) -> u64 {
        let s = (t - self.start_time()) * self.rate() + 0.5;
        if s <= 0.0 {
            0
        } else {
            s as u64
        }
    }

    /// Convert a sample offset back to a time on the timeline.
    fn sample_to_time(&self, n: u64) -> f64 {
        self.start_time() + n as f64 / self.rate()
    }

    /// Largest block a single `read` call should request.
    fn max_block_size(&self) -> usize;

    /// Preferred block size for a read starting at `pos`. Defaults to
    /// [`max_block_size`](Self::max_block_size).
    fn best_block_size(&self, _pos: u64) -> usize {
        self.max_block_size()
    }

    /// Read `dst.len()` samples starting at sample offset `pos` into `dst`
    /// as 32-bit float.
    fn read(&self, dst: &mut [f32], pos: u64) -> Result<(), ShortRead>;
}
