//! Block-wise sample writer.

use derive_more::Debug;

/// Ordered, blocking writer of floating-point PCM.
///
/// `append` calls must arrive in timeline order; a sink may buffer
/// internally until [`flush`](SampleSink::flush).
pub trait SampleSink {
    /// Append `samples` after everything written so far.
    fn append(&mut self, samples: &[f32]);

    /// Commit any internal buffering.
    fn flush(&mut self);
}

/// Growable in-memory sink.
///
/// Collects the output of an effect pass; the caller trims any overrun past
/// the requested region with [`trim`](MemorySink::trim) and then splices the
/// samples back onto a timeline.
#[derive(Debug, Default)]
pub struct MemorySink {
    #[debug(skip)]
    samples: Vec<f32>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples written so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Discard all samples past `len`.
    ///
    /// Overlap-add effects emit in whole hops and may run at most one hop
    /// past the requested region; this trims that tail.
    pub fn trim(&mut self, len: usize) {
        self.samples.truncate(len);
    }

    /// The collected samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the sink, returning the collected samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl SampleSink for MemorySink {
    fn append(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    fn flush(&mut self) {}
}
