//! In-memory mono track.

use derive_more::Debug;

use crate::source::{SampleFormat, SampleSource, ShortRead};

/// Replacement of a time range on a timeline.
pub trait Splice {
    /// Atomically replace `len` samples starting at `start` with
    /// `replacement` (which may have a different length).
    fn splice(&mut self, start: u64, len: u64, replacement: &[f32]);
}

/// A mono track held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryTrack {
    rate: f64,
    #[debug(skip)]
    samples: Vec<f32>,
}

impl MemoryTrack {
    /// Default read block size. Large enough that per-block overhead is
    /// negligible for any realistic window size.
    const BLOCK_SIZE: usize = 65536;

    /// Create an empty track at the given sample rate.
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            samples: Vec::new(),
        }
    }

    /// Create a track from existing samples.
    pub fn from_samples(rate: f64, samples: Vec<f32>) -> Self {
        Self { rate, samples }
    }

    /// Number of samples in the track.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the track holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The track's samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl SampleSource for MemoryTrack {
    fn rate(&self) -> f64 {
        self.rate
    }

    fn sample_format(&self) -> SampleFormat {
        SampleFormat::F32
    }

    fn end_time(&self) -> f64 {
        self.samples.len() as f64 / self.rate
    }

    fn max_block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }

    fn read(&self, dst: &mut [f32], pos: u64) -> Result<(), ShortRead> {
        let pos = pos as usize;
        let available = self.samples.len().saturating_sub(pos);
        if available < dst.len() {
            return Err(ShortRead {
                requested: dst.len(),
                available,
            });
        }
        dst.copy_from_slice(&self.samples[pos..pos + dst.len()]);
        Ok(())
    }
}

impl Splice for MemoryTrack {
    fn splice(&mut self, start: u64, len: u64, replacement: &[f32]) {
        let start = (start as usize).min(self.samples.len());
        let end = (start + len as usize).min(self.samples.len());
        self.samples.splice(start..end, replacement.iter().copied());
    }
}
